use std::str::FromStr;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    errors::{Error, Result},
    libs::{
        dser::{deser_empty_to_none, deser_empty_to_none_of},
        gen_id,
        time::{days_until, format_date, format_datetime, now, parse_loose, thai_date},
    },
    AppState, Response, ResponseResult,
};

pub fn job_router() -> Router<AppState> {
    Router::new()
        .route("/job/classify", post(classify_job))
        .route("/job/update/:job_id", post(update_job))
        .route("/job/action/:job_id", post(job_action))
        .route("/job/events/:job_id", get(job_events))
}

static METAL_COIN: [&str; 3] = ["เหรียญซิงค์อัลลอย", "PVC", "เหรียญไม้"];
static EXTERNAL_PRODUCTION: [&str; 4] = ["โล่สั่งผลิต", "เหรียญอะคริลิก", "เสื้อ", "บิบ"];
static INTERNAL_PRODUCTION: [&str; 2] = ["ป้ายจารึก", "สติกเกอร์"];

/// Which checks a job goes through, derived from its free-text job type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    MetalCoin,
    ExternalProduction,
    InternalProduction,
    Other,
}

impl JobKind {
    /// Case-insensitive substring match, first group wins.
    pub fn classify(job_type: &str) -> Self {
        let job_type = job_type.to_lowercase();
        let hit = |names: &[&str]| names.iter().any(|n| job_type.contains(&n.to_lowercase()));
        if hit(&METAL_COIN) {
            Self::MetalCoin
        } else if hit(&EXTERNAL_PRODUCTION) {
            Self::ExternalProduction
        } else if hit(&INTERNAL_PRODUCTION) {
            Self::InternalProduction
        } else {
            Self::Other
        }
    }

    pub fn has_cnc_check(&self) -> bool {
        matches!(self, Self::MetalCoin)
    }

    pub fn has_physical_check(&self) -> bool {
        !matches!(self, Self::Other)
    }

    pub fn completed_image_label(&self) -> &'static str {
        match self {
            Self::MetalCoin => "แนบภาพงานหลังตรวจเสร็จสมบูรณ์",
            _ => "แนบภาพงานเสร็จสมบูรณ์",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkStatus {
    #[default]
    #[serde(rename = "กำลังดำเนินการ")]
    InProgress,
    #[serde(rename = "รอตรวจสอบ")]
    PendingReview,
    #[serde(rename = "เสร็จสิ้น")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Approval {
    Approved,
    Rejected,
}

impl FromStr for Approval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(Error::InvalidValue(format!("ไม่รู้จักผลการตรวจ {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub id: String,
    pub detail: String,
    pub reason: String,
    pub date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RevisionForm {
    #[serde(deserialize_with = "deser_empty_to_none")]
    id: Option<String>,
    detail: String,
    reason: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefectReasons {
    pub wrong_color: bool,
    pub scratches: bool,
    pub wrong_size: bool,
    pub insufficient_quantity: bool,
    pub other: bool,
    pub other_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub approval: Approval,
    pub notes: String,
}

/// Body of `POST /job/update/:job_id`. Uploads arrive as file names only.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobUpdateForm {
    job_type: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    quantity: Option<String>,
    work_status: WorkStatus,
    #[serde(deserialize_with = "deser_empty_to_none")]
    google_drive_link: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    layout_image: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    artwork_image: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    first_draft_date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    final_file_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    completed_image: Option<String>,
    revisions: Vec<RevisionForm>,
    #[serde(deserialize_with = "deser_empty_to_none_of")]
    cnc_approval: Option<Approval>,
    cnc_notes: String,
    #[serde(deserialize_with = "deser_empty_to_none_of")]
    physical_check_approval: Option<Approval>,
    physical_check_notes: String,
    defect_reasons: DefectReasons,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub job_type: String,
    pub kind: JobKind,
    pub quantity: Option<u32>,
    pub work_status: WorkStatus,
    pub google_drive_link: Option<String>,
    pub layout_image: Option<String>,
    pub artwork_image: Option<String>,
    pub first_draft_date: Option<String>,
    pub final_file_name: Option<String>,
    pub completed_image: Option<String>,
    pub revisions: Vec<Revision>,
    pub cnc: Option<Check>,
    pub physical_check: Option<Check>,
    pub defect_reasons: Option<DefectReasons>,
}

impl JobUpdateForm {
    pub fn into_update(self) -> Result<JobUpdate> {
        let kind = JobKind::classify(&self.job_type);
        let quantity = match self.quantity.as_deref() {
            None => None,
            Some(q) => Some(
                q.trim()
                    .parse::<u32>()
                    .map_err(|_| Error::field("quantity", "จำนวนชิ้นงานต้องเป็นตัวเลข"))?,
            ),
        };
        let first_draft_date = self
            .first_draft_date
            .as_deref()
            .map(|d| parse_loose(d).map(|t| format_date(&t.date())))
            .transpose()?;

        let today = format_date(&now().date());
        let revisions = self
            .revisions
            .into_iter()
            .filter(|r| !r.detail.trim().is_empty() || !r.reason.trim().is_empty())
            .map(|r| Revision {
                id: r.id.unwrap_or_else(|| gen_id("REV")),
                detail: r.detail.trim().to_owned(),
                reason: r.reason.trim().to_owned(),
                date: r.date.unwrap_or_else(|| today.clone()),
            })
            .collect();

        let cnc = match (kind.has_cnc_check(), self.cnc_approval) {
            (true, Some(approval)) => Some(Check {
                approval,
                notes: self.cnc_notes,
            }),
            _ => None,
        };
        let physical_check = match (kind.has_physical_check(), self.physical_check_approval) {
            (true, Some(approval)) => Some(Check {
                approval,
                notes: self.physical_check_notes,
            }),
            _ => None,
        };
        let defect_reasons = match &physical_check {
            Some(Check {
                approval: Approval::Rejected,
                ..
            }) => {
                let mut reasons = self.defect_reasons;
                if !reasons.other {
                    reasons.other_reason.clear();
                }
                if reasons.other && reasons.other_reason.trim().is_empty() {
                    return Err(Error::field("otherReason", "กรุณาระบุสาเหตุอื่นๆ"));
                }
                Some(reasons)
            }
            _ => None,
        };

        Ok(JobUpdate {
            job_type: self.job_type,
            kind,
            quantity,
            work_status: self.work_status,
            google_drive_link: self.google_drive_link,
            layout_image: self.layout_image,
            artwork_image: self.artwork_image,
            first_draft_date,
            final_file_name: self.final_file_name,
            completed_image: self.completed_image,
            revisions,
            cnc,
            physical_check,
            defect_reasons,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: &'static str,
    pub name: &'static str,
}

pub static ROSTER: [Employee; 4] = [
    Employee {
        id: "1",
        name: "สมชาย ใจดี",
    },
    Employee {
        id: "2",
        name: "สมหญิง รักงาน",
    },
    Employee {
        id: "3",
        name: "วิชัย มีฝีมือ",
    },
    Employee {
        id: "4",
        name: "สุดา ออกแบบดี",
    },
];

/// Action taken from the job drawer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DrawerAction {
    Assign {
        #[serde(default, deserialize_with = "deser_empty_to_none")]
        employee: Option<String>,
        #[serde(default)]
        random: bool,
    },
    Start,
    Reject {
        #[serde(default)]
        reason: String,
    },
}

impl DrawerAction {
    /// Resolves the action to the stored event kind and body.
    pub fn resolve(self) -> Result<(&'static str, Value)> {
        match self {
            Self::Assign { random: true, .. } => {
                let pick = ROSTER
                    .choose(&mut rand::thread_rng())
                    .ok_or_else(|| Error::InvalidValue("ไม่มีพนักงานให้เลือก".into()))?;
                Ok(("assign", json!({ "employee": pick.name })))
            }
            Self::Assign {
                employee: Some(name),
                ..
            } => {
                let known = ROSTER.iter().any(|e| e.name == name || e.id == name);
                if !known {
                    return Err(Error::InvalidValue(format!("ไม่รู้จักพนักงาน {name}")));
                }
                let name = ROSTER
                    .iter()
                    .find(|e| e.id == name)
                    .map_or(name.clone(), |e| e.name.to_owned());
                Ok(("assign", json!({ "employee": name })))
            }
            Self::Assign { employee: None, .. } => {
                Err(Error::field("employee", "กรุณาเลือกพนักงาน"))
            }
            Self::Start => Ok(("start", json!({}))),
            Self::Reject { reason } => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(Error::field("reason", "กรุณาระบุเหตุผลในการปฏิเสธงาน"));
                }
                Ok(("reject", json!({ "reason": reason })))
            }
        }
    }
}

/// A stored job update or drawer action, kept in `job_updates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub id: String,
    pub job_id: String,
    pub kind: String,
    pub body: Value,
    pub created_at: String,
}

impl JobEvent {
    fn new(job_id: String, kind: &str, body: Value) -> Self {
        Self {
            id: gen_id("JOB"),
            job_id,
            kind: kind.to_owned(),
            body,
            created_at: format_datetime(&now()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ClassifyRequest {
    job_type: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    order_date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    due_date: Option<String>,
}

/// "n วัน" or "เกิน n วัน" once overdue.
pub fn due_label(days: i64) -> String {
    op::ternary!(days < 0 => format!("เกิน {} วัน", days.abs()); format!("{days} วัน"))
}

async fn classify_job(Json(value): Json<Value>) -> ResponseResult {
    let req: ClassifyRequest = serde_json::from_value(value)?;
    let kind = JobKind::classify(&req.job_type);
    let mut data = json!({
        "kind": kind,
        "showCnc": kind.has_cnc_check(),
        "showPhysicalCheck": kind.has_physical_check(),
        "completedImageLabel": kind.completed_image_label(),
        "roster": ROSTER,
    });
    if let Some(order_date) = req.order_date.as_deref() {
        data["orderDate"] = json!(thai_date(&parse_loose(order_date)?.date()));
    }
    if let Some(due_date) = req.due_date.as_deref() {
        let due = parse_loose(due_date)?.date();
        let days = days_until(&due, &now());
        data["dueDate"] = json!(thai_date(&due));
        data["daysLeft"] = json!(days);
        data["dueLabel"] = json!(due_label(days));
    }
    Ok(Response::ok(data))
}

async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    let form: JobUpdateForm = serde_json::from_value(value)?;
    let update = form.into_update()?;
    let event = JobEvent::new(job_id, "update", json!(update));
    state
        .store
        .insert_job_event(&event)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกการอัปเดตงานได้"))?;
    info!("Job {} updated ({:?})", event.job_id, update.work_status);
    Ok(Response::ok(json!(event)))
}

async fn job_action(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    let action: DrawerAction = serde_json::from_value(value)?;
    let (kind, body) = action.resolve()?;
    let event = JobEvent::new(job_id, kind, body);
    state
        .store
        .insert_job_event(&event)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกการดำเนินการได้"))?;
    info!("Job {}: {kind}", event.job_id);
    Ok(Response::ok(json!(event)))
}

async fn job_events(State(state): State<AppState>, Path(job_id): Path<String>) -> ResponseResult {
    let events = state
        .store
        .job_events(&job_id)
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงประวัติงานได้"))?;
    Ok(Response::ok(json!(events)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(value: Value) -> JobUpdateForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(JobKind::classify("เหรียญซิงค์อัลลอย 5 ซม."), JobKind::MetalCoin);
        assert_eq!(JobKind::classify("พวงกุญแจ pvc"), JobKind::MetalCoin);
        assert_eq!(JobKind::classify("เสื้อวิ่ง"), JobKind::ExternalProduction);
        assert_eq!(JobKind::classify("สติกเกอร์ติดรถ"), JobKind::InternalProduction);
        assert_eq!(JobKind::classify("ออกแบบโลโก้"), JobKind::Other);
        assert!(!JobKind::Other.has_physical_check());
        assert!(!JobKind::InternalProduction.has_cnc_check());
    }

    #[test]
    fn blank_revisions_are_dropped_and_ids_filled() {
        let update = form(json!({
            "jobType": "ป้ายจารึก",
            "revisions": [
                {"detail": "เปลี่ยนสีพื้น", "reason": "ลูกค้าขอ", "date": "2024-11-29"},
                {"id": "", "detail": " ", "reason": ""},
                {"id": "r-3", "detail": "", "reason": "สะกดผิด"}
            ]
        }))
        .into_update()
        .unwrap();
        assert_eq!(update.revisions.len(), 2);
        assert!(update.revisions[0].id.starts_with("REV"));
        assert_eq!(update.revisions[0].date, "2024-11-29");
        assert_eq!(update.revisions[1].id, "r-3");
    }

    #[test]
    fn defects_only_follow_a_rejected_check() {
        let rejected = form(json!({
            "jobType": "เหรียญไม้",
            "cncApproval": "approved",
            "physicalCheckApproval": "rejected",
            "defectReasons": {"scratches": true, "otherReason": "ไม่ควรเก็บ"}
        }))
        .into_update()
        .unwrap();
        let reasons = rejected.defect_reasons.unwrap();
        assert!(reasons.scratches);
        assert_eq!(reasons.other_reason, "");
        assert_eq!(rejected.cnc.unwrap().approval, Approval::Approved);

        let approved = form(json!({
            "jobType": "บิบ",
            "cncApproval": "approved",
            "physicalCheckApproval": "approved",
            "defectReasons": {"scratches": true}
        }))
        .into_update()
        .unwrap();
        assert!(approved.defect_reasons.is_none());
        assert!(approved.cnc.is_none());
    }

    #[test]
    fn other_defect_needs_a_reason() {
        let err = form(json!({
            "jobType": "เสื้อ",
            "physicalCheckApproval": "rejected",
            "defectReasons": {"other": true}
        }))
        .into_update()
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn unset_approvals_may_be_blank() {
        let update = form(json!({
            "jobType": "เหรียญไม้",
            "cncApproval": "",
            "physicalCheckApproval": ""
        }))
        .into_update()
        .unwrap();
        assert!(update.cnc.is_none());
        assert!(update.physical_check.is_none());
    }

    #[test]
    fn quantity_must_be_numeric() {
        let err = form(json!({"jobType": "เสื้อ", "quantity": "สิบ"}))
            .into_update()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let ok = form(json!({"jobType": "เสื้อ", "quantity": "120"}))
            .into_update()
            .unwrap();
        assert_eq!(ok.quantity, Some(120));
        assert_eq!(ok.work_status, WorkStatus::InProgress);
    }

    #[test]
    fn drawer_actions() {
        let (kind, body) = DrawerAction::Assign {
            employee: Some("3".into()),
            random: false,
        }
        .resolve()
        .unwrap();
        assert_eq!(kind, "assign");
        assert_eq!(body["employee"], "วิชัย มีฝีมือ");

        let (_, body) = DrawerAction::Assign {
            employee: None,
            random: true,
        }
        .resolve()
        .unwrap();
        let name = body["employee"].as_str().unwrap();
        assert!(ROSTER.iter().any(|e| e.name == name));

        assert!(DrawerAction::Reject { reason: "  ".into() }.resolve().is_err());
        assert!(DrawerAction::Assign {
            employee: Some("คนนอก".into()),
            random: false
        }
        .resolve()
        .is_err());

        let action: DrawerAction = serde_json::from_value(json!({"action": "start"})).unwrap();
        assert_eq!(action, DrawerAction::Start);
    }

    #[test]
    fn due_labels() {
        assert_eq!(due_label(3), "3 วัน");
        assert_eq!(due_label(-2), "เกิน 2 วัน");
    }
}
