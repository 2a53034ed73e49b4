use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use mysql_common::prelude::FromRow;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    errors::{Error, FieldError, Result},
    libs::{
        dser::deser_empty_to_none,
        gen_id, merge_patch,
        time::{format_datetime, now, parse_loose},
    },
    AppState, Response, ResponseResult,
};

pub fn activity_router() -> Router<AppState> {
    Router::new()
        .route("/customer/activity/list/:customer_id", get(list_activities))
        .route("/customer/activity/add", post(add_activity))
        .route("/customer/activity/update/:id", post(update_activity))
        .route("/customer/activity/delete/:id", delete(delete_activity))
}

pub static ACTIVITY_TYPES: [&str; 4] = ["โทรศัพท์", "อีเมล", "การประชุม", "เยี่ยมชม"];
pub static PRIORITIES: [&str; 3] = ["สูง", "ปานกลาง", "ต่ำ"];

/// Timeline entry of a customer. Status is a free label, there is no state
/// machine behind it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub customer_id: String,
    pub activity_type: String,
    pub title: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub description: Option<String>,
    pub start_datetime: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub end_datetime: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub responsible_person: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub reminder_type: Option<String>,
    pub created_at: String,
}

impl Activity {
    pub fn icon(&self) -> &'static str {
        match self.activity_type.as_str() {
            "โทรศัพท์" => "phone",
            "อีเมล" => "mail",
            "การประชุม" => "calendar",
            "เยี่ยมชม" => "user",
            _ => "message",
        }
    }

    fn check(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.customer_id.trim().is_empty() {
            errors.push(FieldError::new("customerId", "กรุณาระบุลูกค้า"));
        }
        if self.activity_type.trim().is_empty() {
            errors.push(FieldError::new("activityType", "กรุณาเลือกประเภทกิจกรรม"));
        }
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "กรุณาระบุหัวข้อ"));
        }
        if self.start_datetime.trim().is_empty() {
            errors.push(FieldError::new("startDatetime", "กรุณาระบุวันเวลาเริ่มต้น"));
        }
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }
        if let Some(priority) = &self.priority {
            if !PRIORITIES.contains(&priority.as_str()) {
                return Err(Error::InvalidValue(format!("ไม่รู้จักความสำคัญ {priority}")));
            }
        }
        Ok(())
    }

    /// Normalises the two timestamps to the stored format.
    fn normalize(mut self) -> Result<Self> {
        self.start_datetime = format_datetime(&parse_loose(&self.start_datetime)?);
        if let Some(end) = self.end_datetime.take() {
            self.end_datetime = Some(format_datetime(&parse_loose(&end)?));
        }
        Ok(self)
    }
}

/// Newest start first, the order of the timeline tab.
pub fn sort_timeline(activities: &mut [Activity]) {
    activities.sort_by(|a, b| b.start_datetime.cmp(&a.start_datetime));
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityForm {
    #[serde(default)]
    customer_id: String,
    #[serde(default)]
    activity_type: String,
    #[serde(default)]
    title: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    description: Option<String>,
    #[serde(default)]
    start_datetime: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    end_datetime: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    priority: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    contact_person: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    responsible_person: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    reminder_type: Option<String>,
}

impl ActivityForm {
    pub fn into_activity(self, id: String, created_at: String) -> Result<Activity> {
        let activity = Activity {
            id,
            customer_id: self.customer_id,
            activity_type: self.activity_type,
            title: self.title,
            description: self.description,
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            priority: self.priority,
            status: self.status,
            contact_person: self.contact_person,
            responsible_person: self.responsible_person,
            reminder_type: self.reminder_type,
            created_at,
        };
        activity.check()?;
        activity.normalize()
    }
}

/// Applies an edit. The id, the owning customer and the creation time are
/// never changed.
pub fn edit_activity(current: &Activity, patch: Value) -> Result<Activity> {
    let mut next: Activity = merge_patch(current, patch)?;
    next.id.clone_from(&current.id);
    next.customer_id.clone_from(&current.customer_id);
    next.created_at.clone_from(&current.created_at);
    next.check()?;
    next.normalize()
}

async fn list_activities(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ResponseResult {
    let activities = state
        .store
        .activities(&customer_id)
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงข้อมูลกิจกรรมได้"))?;
    let data: Vec<Value> = activities
        .iter()
        .map(|a| {
            let mut value = json!(a);
            value["icon"] = json!(a.icon());
            value
        })
        .collect();
    Ok(Response::ok(json!(data)))
}

async fn add_activity(State(state): State<AppState>, Json(value): Json<Value>) -> ResponseResult {
    let form: ActivityForm = serde_json::from_value(value)?;
    let activity = form.into_activity(gen_id("ACT"), format_datetime(&now()))?;
    state
        .store
        .insert_activity(&activity)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกกิจกรรมได้"))?;
    info!("Added activity {} for customer {}", activity.id, activity.customer_id);
    Ok(Response::ok(json!({"id": activity.id})))
}

async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    let Some(current) = state.store.activity(&id)? else {
        return Err(Error::NotFound(format!("กิจกรรม {id}")).into());
    };
    let next = edit_activity(&current, value)?;
    state
        .store
        .update_activity(&next)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกกิจกรรมได้"))?;
    info!("Updated activity {id}");
    Ok(Response::ok(json!(next)))
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    confirm: bool,
}

async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> ResponseResult {
    if !params.confirm {
        return Err(Error::ConfirmRequired("กรุณายืนยันการลบกิจกรรม".to_owned()).into());
    }
    let deleted = state
        .store
        .delete_activity(&id)
        .map_err(|e| Response::failed(e, "ไม่สามารถลบกิจกรรมได้"))?;
    if !deleted {
        return Err(Error::NotFound(format!("กิจกรรม {id}")).into());
    }
    info!("Deleted activity {id}");
    Ok(Response::ok(json!("ลบกิจกรรมเรียบร้อยแล้ว")))
}
