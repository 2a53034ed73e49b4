use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    errors::{Error, FieldError, Result},
    libs::{
        dser::deser_empty_to_none,
        gen_id, non_empty,
        time::{format_datetime, now, parse_loose},
    },
    AppState, Response, ResponseResult,
};

use super::{Customer, CustomerContact, CustomerStatus};

pub fn insert_router() -> Router<AppState> {
    Router::new().route("/customer/add", post(insert_customer))
}

fn default_customer_type() -> String {
    "เจ้าของงาน".to_owned()
}
fn default_presentation_status() -> String {
    "เสนอขาย".to_owned()
}
fn default_contact_count() -> u32 {
    1
}
fn default_responsible_person() -> String {
    "พนักงานขายปัจจุบัน".to_owned()
}
fn default_how_found_us() -> String {
    "Facebook".to_owned()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContact {
    pub contact_name: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub line_id: Option<String>,
    pub phone_number: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub email: Option<String>,
}

/// The four-part "เพิ่มลูกค้าใหม่" form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[serde(default)]
    pub company_name: String,
    #[serde(default = "default_customer_type")]
    pub customer_type: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub tax_id: Option<String>,

    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub line_id: Option<String>,
    #[serde(default)]
    pub additional_contacts: Vec<NewContact>,

    #[serde(default = "default_presentation_status")]
    pub presentation_status: String,
    #[serde(default = "default_contact_count")]
    pub contact_count: u32,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub last_contact_date: Option<String>,
    #[serde(default)]
    pub interested_products: String,

    #[serde(default = "default_responsible_person")]
    pub responsible_person: String,
    #[serde(default)]
    pub customer_status: CustomerStatus,
    #[serde(default = "default_how_found_us")]
    pub how_found_us: String,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub other_channel: Option<String>,
    #[serde(default, deserialize_with = "deser_empty_to_none")]
    pub notes: Option<String>,
}

impl NewCustomer {
    fn check(&self) -> Result<()> {
        let first_phone = self.phone_numbers.first().map(|p| p.trim()).unwrap_or_default();
        let required = [
            (self.company_name.trim(), "companyName", "กรุณาระบุชื่อบริษัท/องค์กร"),
            (self.contact_name.trim(), "contactName", "กรุณาระบุชื่อผู้ติดต่อ"),
            (first_phone, "phoneNumbers", "กรุณาระบุเบอร์โทรศัพท์"),
            (self.interested_products.trim(), "interestedProducts", "กรุณาระบุสินค้าที่สนใจ"),
        ];
        let errors: Vec<FieldError> = required
            .into_iter()
            .filter(|(value, _, _)| value.is_empty())
            .map(|(_, field, message)| FieldError::new(field, message))
            .collect();
        op::ternary!(errors.is_empty() => Ok(()); Err(Error::Validation(errors)))
    }

    /// Validates the form and splits it into the customer row and the
    /// additional contacts worth keeping (both name and phone given).
    pub fn into_records(self, id: String) -> Result<(Customer, Vec<CustomerContact>)> {
        self.check()?;
        let now = now();
        let last_contact = match &self.last_contact_date {
            Some(value) => parse_loose(value)?,
            None => now,
        };
        let business_type = op::ternary!(self.customer_type == "เจ้าของงาน" => "องค์กร"; "ตัวแทน");
        let contacts = self
            .additional_contacts
            .into_iter()
            .filter(|c| !c.contact_name.trim().is_empty() && !c.phone_number.trim().is_empty())
            .enumerate()
            .map(|(i, c)| CustomerContact {
                id: format!("{id}-{}", i + 1),
                customer_id: id.clone(),
                contact_name: c.contact_name,
                line_id: c.line_id,
                phone_number: c.phone_number,
                email: c.email,
            })
            .collect();
        let customer = Customer {
            id,
            company_name: self.company_name,
            contact_name: self.contact_name,
            phone_numbers: non_empty(self.phone_numbers),
            emails: non_empty(self.emails),
            line_id: self.line_id,
            business_type: Some(business_type.to_owned()),
            customer_type: Some(self.customer_type),
            province: self.province,
            address: self.address,
            tax_id: self.tax_id,
            presentation_status: Some(self.presentation_status),
            contact_count: self.contact_count,
            last_contact_date: Some(format_datetime(&last_contact)),
            interested_products: Some(self.interested_products),
            responsible_person: Some(self.responsible_person),
            customer_status: self.customer_status,
            how_found_us: Some(self.how_found_us),
            other_channel: self.other_channel,
            notes: self.notes,
            total_orders: 0,
            total_value: 0.0,
            created_at: format_datetime(&now),
        };
        Ok((customer, contacts))
    }
}

async fn insert_customer(State(state): State<AppState>, Json(value): Json<Value>) -> ResponseResult {
    let form: NewCustomer = serde_json::from_value(value)?;
    let (customer, contacts) = form.into_records(gen_id("CUS"))?;
    state
        .store
        .insert_customer(&customer)
        .map_err(|e| Response::failed(e, "ไม่สามารถเพิ่มลูกค้าใหม่ได้"))?;
    if !contacts.is_empty() {
        // The customer is already saved; losing extra contacts is tolerated.
        if let Err(e) = state.store.insert_contacts(&contacts) {
            warn!("Failed to add contacts of customer {}: {e}", customer.id);
        }
    }
    info!("Added customer {} ({})", customer.id, customer.company_name);
    Ok(Response::ok(json!({
        "id": customer.id,
        "title": "เพิ่มลูกค้าใหม่สำเร็จ!",
        "description": format!("เพิ่มข้อมูลลูกค้า {} เรียบร้อยแล้ว", customer.company_name),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(value: Value) -> NewCustomer {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_required_fields_fail_together() {
        let err = form(json!({"companyName": "ABC", "phoneNumbers": ["", "0812345678"]}))
            .into_records("CUS1".into())
            .unwrap_err();
        let Error::Validation(fields) = err else {
            panic!("validation expected");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, ["contactName", "phoneNumbers", "interestedProducts"]);
    }

    #[test]
    fn defaults_and_derived_business_type() {
        let (customer, contacts) = form(json!({
            "companyName": "โรงเรียนสายรุ้ง",
            "contactName": "ครูสมศรี",
            "phoneNumbers": ["0891234567", " "],
            "emails": [""],
            "interestedProducts": "เหรียญรางวัล",
            "customerType": "ตัวแทน",
            "additionalContacts": [
                {"contactName": "ครูสมชาย", "phoneNumber": "0811111111"},
                {"contactName": "ไม่มีเบอร์", "phoneNumber": ""}
            ]
        }))
        .into_records("CUS1".into())
        .unwrap();
        assert_eq!(customer.business_type.as_deref(), Some("ตัวแทน"));
        assert_eq!(customer.phone_numbers, ["0891234567"]);
        assert!(customer.emails.is_empty());
        assert_eq!(customer.presentation_status.as_deref(), Some("เสนอขาย"));
        assert_eq!(customer.contact_count, 1);
        assert_eq!(customer.responsible_person.as_deref(), Some("พนักงานขายปัจจุบัน"));
        assert_eq!(customer.customer_status, CustomerStatus::New);
        assert_eq!(customer.how_found_us.as_deref(), Some("Facebook"));
        assert!(customer.last_contact_date.is_some());
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].customer_id, "CUS1");
    }

    #[test]
    fn owner_customers_are_organisations() {
        let (customer, _) = form(json!({
            "companyName": "บริษัท เอบีซี จำกัด",
            "contactName": "คุณเอ",
            "phoneNumbers": ["021234567"],
            "interestedProducts": "ถ้วยรางวัล",
            "lastContactDate": "2024-01-15T09:00:00.000Z"
        }))
        .into_records("CUS2".into())
        .unwrap();
        assert_eq!(customer.business_type.as_deref(), Some("องค์กร"));
        assert_eq!(customer.last_contact_date.as_deref(), Some("2024-01-15 09:00:00"));
    }
}
