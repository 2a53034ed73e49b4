pub mod activity;
mod insert;
mod profile;
mod query;

use std::{fmt::Display, str::FromStr};

use axum::Router;
use mysql_common::prelude::FromRow;
use serde::{Deserialize, Serialize};

use crate::{errors::Error, AppState};

pub use insert::NewCustomer;
pub use query::{CustomerFilter, CustomerKpis, CustomerRow};

pub fn customer_router() -> Router<AppState> {
    Router::new()
        .merge(insert::insert_router())
        .merge(query::query_router())
        .merge(profile::profile_router())
        .merge(activity::activity_router())
}

/// Customer relationship status. `ลูกค้าเก่า` is read as a regular customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerStatus {
    #[default]
    #[serde(rename = "ลูกค้าใหม่")]
    New,
    #[serde(rename = "ลูกค้าประจำ", alias = "ลูกค้าเก่า")]
    Regular,
    #[serde(rename = "ลูกค้า VIP")]
    Vip,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 3] = [Self::New, Self::Regular, Self::Vip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "ลูกค้าใหม่",
            Self::Regular => "ลูกค้าประจำ",
            Self::Vip => "ลูกค้า VIP",
        }
    }

    /// Badge style of the list view.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Vip => "accent",
            Self::Regular => "primary",
            Self::New => "secondary",
        }
    }
}

impl Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ลูกค้าใหม่" => Ok(Self::New),
            "ลูกค้าประจำ" | "ลูกค้าเก่า" => Ok(Self::Regular),
            "ลูกค้า VIP" => Ok(Self::Vip),
            _ => Err(Error::InvalidValue(format!("ไม่รู้จักสถานะลูกค้า {s}"))),
        }
    }
}

pub static CUSTOMER_TYPES: [&str; 3] = ["เจ้าของงาน", "ตัวแทน", "ออแกนไนเซอร์"];
pub static BUSINESS_TYPES: [&str; 3] = ["องค์กร", "โรงเรียน", "หน่วยงาน"];
pub static PRESENTATION_STATUSES: [&str; 3] = ["เสนอขาย", "ติดตาม", "ปิดการขาย"];
pub static HOW_FOUND_US: [&str; 4] = ["Facebook", "Google", "ลูกค้าแนะนำ", "อื่นๆ"];
pub static RESPONSIBLE_PERSONS: [&str; 4] = [
    "พนักงานขายปัจจุบัน",
    "สมชาย ใจดี",
    "สมหญิง รักลูกค้า",
    "วิเชียร ชนะใจ",
];

/// A row of the `customers` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone_numbers: Vec<String>,
    pub emails: Vec<String>,
    pub line_id: Option<String>,
    pub customer_type: Option<String>,
    pub business_type: Option<String>,
    pub province: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub presentation_status: Option<String>,
    pub contact_count: u32,
    pub last_contact_date: Option<String>,
    pub interested_products: Option<String>,
    pub responsible_person: Option<String>,
    pub customer_status: CustomerStatus,
    pub how_found_us: Option<String>,
    pub other_channel: Option<String>,
    pub notes: Option<String>,
    pub total_orders: u32,
    pub total_value: f64,
    pub created_at: String,
}

impl Customer {
    /// Date part of the last contact, empty when never contacted.
    pub fn last_contact_day(&self) -> &str {
        self.last_contact_date
            .as_deref()
            .and_then(|d| d.get(..10))
            .unwrap_or_default()
    }
}

/// Additional contact person, stored in `customer_contacts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub id: String,
    pub customer_id: String,
    pub contact_name: String,
    pub line_id: Option<String>,
    pub phone_number: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNote {
    pub id: String,
    pub customer_id: String,
    pub content: String,
    pub author: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn old_status_label_reads_as_regular() {
        let status: CustomerStatus = serde_json::from_value(json!("ลูกค้าเก่า")).unwrap();
        assert_eq!(status, CustomerStatus::Regular);
        assert_eq!(serde_json::to_value(status).unwrap(), json!("ลูกค้าประจำ"));
        assert_eq!("ลูกค้า VIP".parse::<CustomerStatus>().unwrap().badge(), "accent");
        assert!("ลูกค้าเป้าหมาย".parse::<CustomerStatus>().is_err());
    }

    #[test]
    fn last_contact_day_is_the_date_part() {
        let customer = Customer {
            last_contact_date: Some("2024-01-15 14:30:00".into()),
            ..Default::default()
        };
        assert_eq!(customer.last_contact_day(), "2024-01-15");
        assert_eq!(Customer::default().last_contact_day(), "");
    }
}
