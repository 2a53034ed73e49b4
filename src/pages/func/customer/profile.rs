use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    errors::{Error, FieldError, Result},
    libs::{
        dser::{deser_empty_to_none, or_dash},
        gen_id, merge_patch, non_empty,
        time::{format_datetime, now, parse_loose},
    },
    pages::func::order::Order,
    AppState, Response, ResponseResult,
};

use super::{activity::Activity, Customer, CustomerContact, CustomerNote};

pub fn profile_router() -> Router<AppState> {
    Router::new()
        .route("/customer/profile/:id", get(get_profile))
        .route("/customer/update/:id", post(update_customer))
        .route("/customer/note/add/:customer_id", post(add_note))
}

/// Author recorded when the client does not name one.
pub const DEFAULT_AUTHOR: &str = "ผู้ใช้ปัจจุบัน";

pub static PROFILE_TABS: [&str; 5] = ["profile", "timeline", "orders", "documents", "notes"];

/// Header card of the profile page with `-` for missing values.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileCard<'a> {
    company_name: &'a str,
    contact_name: &'a str,
    phone: &'a str,
    email: &'a str,
    line_id: &'a str,
    address: String,
    tax_id: &'a str,
    customer_type: &'a str,
    business_type: &'a str,
    responsible_person: &'a str,
    last_contact: &'a str,
}

impl<'a> ProfileCard<'a> {
    fn new(c: &'a Customer) -> Self {
        let address = match (c.address.as_deref(), c.province.as_deref()) {
            (Some(address), Some(province)) => format!("{address} {province}"),
            (a, p) => or_dash(a.or(p)).to_owned(),
        };
        Self {
            company_name: &c.company_name,
            contact_name: &c.contact_name,
            phone: or_dash(c.phone_numbers.first().map(String::as_str)),
            email: or_dash(c.emails.first().map(String::as_str)),
            line_id: or_dash(c.line_id.as_deref()),
            address,
            tax_id: or_dash(c.tax_id.as_deref()),
            customer_type: or_dash(c.customer_type.as_deref()),
            business_type: or_dash(c.business_type.as_deref()),
            responsible_person: or_dash(c.responsible_person.as_deref()),
            last_contact: or_dash(Some(c.last_contact_day())),
        }
    }
}

/// One line of the orders tab.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,
    pub job_name: String,
    pub date: String,
    pub items: usize,
    pub action: &'static str,
}

impl From<&Order> for OrderLine {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            job_name: order.fields.job_name.clone().unwrap_or_default(),
            date: order.created_at.get(..10).unwrap_or_default().to_owned(),
            items: order.products.len(),
            action: order.action.label(),
        }
    }
}

/// Applies a profile edit. Identity, creation time and order totals are
/// owned by the system.
pub fn edit_customer(current: &Customer, patch: Value) -> Result<Customer> {
    let mut next: Customer = merge_patch(current, patch)?;
    next.id.clone_from(&current.id);
    next.created_at.clone_from(&current.created_at);
    next.total_orders = current.total_orders;
    next.total_value = current.total_value;
    next.phone_numbers = non_empty(next.phone_numbers);
    next.emails = non_empty(next.emails);
    if let Some(date) = next.last_contact_date.take() {
        next.last_contact_date = Some(format_datetime(&parse_loose(&date)?));
    }

    let mut errors = Vec::new();
    if next.company_name.trim().is_empty() {
        errors.push(FieldError::new("companyName", "กรุณาระบุชื่อบริษัท/องค์กร"));
    }
    if next.contact_name.trim().is_empty() {
        errors.push(FieldError::new("contactName", "กรุณาระบุชื่อผู้ติดต่อ"));
    }
    op::ternary!(errors.is_empty() => Ok(next); Err(Error::Validation(errors)))
}

#[derive(Debug, Deserialize)]
struct NoteForm {
    #[serde(default)]
    content: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    author: Option<String>,
}

impl NoteForm {
    fn into_note(self, customer_id: String) -> Result<CustomerNote> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(Error::field("content", "กรุณาระบุบันทึก"));
        }
        Ok(CustomerNote {
            id: gen_id("NOTE"),
            customer_id,
            content: content.to_owned(),
            author: self.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
            created_at: format_datetime(&now()),
        })
    }
}

fn load_customer(state: &AppState, id: &str) -> std::result::Result<Customer, Response> {
    state
        .store
        .customer(id)
        .map_err(|e| Response::failed(e, "ไม่สามารถโหลดข้อมูลลูกค้าได้"))?
        .ok_or_else(|| Error::NotFound(format!("ลูกค้า {id}")).into())
}

async fn get_profile(State(state): State<AppState>, Path(id): Path<String>) -> ResponseResult {
    let customer = load_customer(&state, &id)?;
    let fetch = |e: Error| Response::failed(e, "ไม่สามารถโหลดข้อมูลลูกค้าได้");
    let contacts: Vec<CustomerContact> = state.store.contacts(&id).map_err(fetch)?;
    let activities: Vec<Activity> = state.store.activities(&id).map_err(fetch)?;
    let orders: Vec<OrderLine> = state
        .store
        .customer_orders(&id)
        .map_err(fetch)?
        .iter()
        .map(OrderLine::from)
        .collect();
    let notes = state.store.notes(&id).map_err(fetch)?;
    Ok(Response::ok(json!({
        "tabs": PROFILE_TABS,
        "card": ProfileCard::new(&customer),
        "customer": customer,
        "contacts": contacts,
        "activities": activities,
        "orders": orders,
        "notes": notes,
    })))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    let current = load_customer(&state, &id)?;
    let next = edit_customer(&current, value)?;
    state
        .store
        .update_customer(&next)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกข้อมูลลูกค้าได้"))?;
    info!("Updated customer {id}");
    Ok(Response::ok(json!(next)))
}

async fn add_note(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    load_customer(&state, &customer_id)?;
    let form: NoteForm = serde_json::from_value(value)?;
    let note = form.into_note(customer_id)?;
    state
        .store
        .insert_note(&note)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกโน้ตได้"))?;
    Ok(Response::ok(json!(note)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::func::customer::CustomerStatus;

    fn customer() -> Customer {
        Customer {
            id: "CUS1".into(),
            company_name: "บริษัท เอบีซี จำกัด".into(),
            contact_name: "คุณเอ".into(),
            phone_numbers: vec!["021234567".into()],
            total_orders: 3,
            total_value: 48_000.0,
            created_at: "2024-01-01 09:00:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn edit_keeps_system_fields() {
        let next = edit_customer(
            &customer(),
            json!({
                "id": "HACK",
                "totalOrders": 0,
                "customerStatus": "ลูกค้า VIP",
                "emails": ["", "a@abc.co.th"],
                "lastContactDate": "2024-02-01"
            }),
        )
        .unwrap();
        assert_eq!(next.id, "CUS1");
        assert_eq!(next.total_orders, 3);
        assert_eq!(next.customer_status, CustomerStatus::Vip);
        assert_eq!(next.emails, ["a@abc.co.th"]);
        assert_eq!(next.last_contact_date.as_deref(), Some("2024-02-01 00:00:00"));
    }

    #[test]
    fn edit_cannot_blank_the_names() {
        let err = edit_customer(&customer(), json!({"companyName": " "})).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn notes_are_trimmed_and_attributed() {
        let form = NoteForm {
            content: "  ต้องการส่งด่วน ".into(),
            author: None,
        };
        let note = form.into_note("CUS1".into()).unwrap();
        assert_eq!(note.content, "ต้องการส่งด่วน");
        assert_eq!(note.author, DEFAULT_AUTHOR);
        let blank = NoteForm {
            content: "   ".into(),
            author: None,
        };
        assert!(blank.into_note("CUS1".into()).is_err());
    }

    #[test]
    fn card_uses_dash_for_missing_values() {
        let c = customer();
        let card = ProfileCard::new(&c);
        assert_eq!(card.email, "-");
        assert_eq!(card.address, "-");
        assert_eq!(card.phone, "021234567");
        assert_eq!(card.last_contact, "-");
    }
}
