use axum::{extract::State, routing::post, Json, Router};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    errors::Result,
    libs::{
        dser::{deser_empty_to_none, or_unspecified},
        time::{now, parse_date, parse_loose},
    },
    AppState, Response, ResponseResult,
};

use super::{Customer, CustomerStatus};

pub fn query_router() -> Router<AppState> {
    Router::new().route("/customer/infos", post(query_customers))
}

/// Filters of the customer list, combined with AND. `"all"` or an empty
/// value disables a selector.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerFilter {
    pub search: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub business_type: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub status: Option<String>,
    /// Inclusive bounds on the last contact day, `YYYY-MM-DD`.
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub date_from: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub date_to: Option<String>,
}

fn selector(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| *v != "all")
}

struct Matcher {
    needle: String,
    business_type: Option<String>,
    status: Option<CustomerStatus>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl Matcher {
    fn matches(&self, c: &Customer) -> bool {
        let text = self.needle.is_empty()
            || c.company_name.to_lowercase().contains(&self.needle)
            || c.contact_name.to_lowercase().contains(&self.needle)
            || c.phone_numbers
                .first()
                .is_some_and(|p| p.contains(&self.needle));
        let business = self.business_type.as_ref().map_or(true, |b| {
            or_unspecified(c.business_type.as_deref()) == b.as_str()
        });
        let status = self.status.map_or(true, |s| c.customer_status == s);
        let date = if self.from.is_none() && self.to.is_none() {
            true
        } else {
            match parse_date(c.last_contact_day()) {
                Ok(day) => {
                    self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
                }
                Err(_) => false,
            }
        };
        text && business && status && date
    }
}

impl CustomerFilter {
    fn matcher(&self) -> Result<Matcher> {
        let bound = |value: &Option<String>| -> Result<Option<NaiveDate>> {
            value.as_deref().map(|v| parse_loose(v).map(|t| t.date())).transpose()
        };
        Ok(Matcher {
            needle: self.search.trim().to_lowercase(),
            business_type: selector(&self.business_type).map(str::to_owned),
            status: selector(&self.status).map(str::parse::<CustomerStatus>).transpose()?,
            from: bound(&self.date_from)?,
            to: bound(&self.date_to)?,
        })
    }

    /// Customers passing every filter, keeping list order.
    pub fn apply<'a>(&self, customers: &'a [Customer]) -> Result<Vec<&'a Customer>> {
        let matcher = self.matcher()?;
        Ok(customers.iter().filter(|c| matcher.matches(c)).collect())
    }
}

/// One line of the customer table. Missing values are filled at render time.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub business_type: String,
    pub total_orders: u32,
    pub total_value: f64,
    pub last_contact: String,
    pub status: CustomerStatus,
    pub badge: &'static str,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id.clone(),
            name: c.company_name.clone(),
            contact: c.contact_name.clone(),
            phone: c.phone_numbers.first().cloned().unwrap_or_default(),
            email: c.emails.first().cloned().unwrap_or_default(),
            address: c.province.clone().unwrap_or_default(),
            business_type: or_unspecified(c.business_type.as_deref()).to_owned(),
            total_orders: c.total_orders,
            total_value: c.total_value,
            last_contact: c.last_contact_day().to_owned(),
            status: c.customer_status,
            badge: c.customer_status.badge(),
        }
    }
}

/// Inactive means no contact for more than this many days.
pub const INACTIVE_DAYS: u64 = 30;

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerKpis {
    pub new_customers_this_month: usize,
    pub outstanding_quotes: usize,
    pub inactive_customers: usize,
}

impl CustomerKpis {
    pub fn compute(customers: &[Customer], now: NaiveDateTime) -> Self {
        let today = now.date();
        let cutoff = today.checked_sub_days(Days::new(INACTIVE_DAYS)).unwrap_or(today);
        let same_month = |stamp: &str| {
            parse_loose(stamp)
                .map(|t| t.year() == today.year() && t.month() == today.month())
                .unwrap_or(false)
        };
        Self {
            new_customers_this_month: customers.iter().filter(|c| same_month(&c.created_at)).count(),
            outstanding_quotes: customers
                .iter()
                .filter(|c| {
                    c.customer_status == CustomerStatus::New
                        || c.presentation_status.as_deref() == Some("เสนอขาย")
                })
                .count(),
            inactive_customers: customers
                .iter()
                .filter(|c| parse_date(c.last_contact_day()).is_ok_and(|d| d < cutoff))
                .count(),
        }
    }
}

async fn query_customers(State(state): State<AppState>, Json(value): Json<Value>) -> ResponseResult {
    let filter: CustomerFilter = serde_json::from_value(value)?;
    let customers = state
        .store
        .customers()
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงข้อมูลลูกค้าได้"))?;
    let rows: Vec<CustomerRow> = filter
        .apply(&customers)?
        .into_iter()
        .map(CustomerRow::from)
        .collect();
    Ok(Response::ok(json!({
        "total": rows.len(),
        "rows": rows,
        "kpis": CustomerKpis::compute(&customers, now()),
    })))
}

#[cfg(test)]
mod tests {
    use crate::libs::time::parse_datetime;

    use super::*;

    fn customer(id: &str, name: &str, status: CustomerStatus, last: &str, created: &str) -> Customer {
        Customer {
            id: id.into(),
            company_name: name.into(),
            contact_name: format!("ผู้ติดต่อ {id}"),
            phone_numbers: vec![format!("08{id}")],
            business_type: Some("องค์กร".into()),
            customer_status: status,
            presentation_status: Some("ติดตาม".into()),
            last_contact_date: Some(last.into()),
            created_at: created.into(),
            ..Default::default()
        }
    }

    fn list() -> Vec<Customer> {
        vec![
            customer("1", "บริษัท ABC จำกัด", CustomerStatus::Vip, "2024-03-02 10:00:00", "2024-03-01 09:00:00"),
            customer("2", "โรงเรียนสายรุ้ง", CustomerStatus::New, "2024-01-10 10:00:00", "2024-01-05 09:00:00"),
            Customer {
                business_type: None,
                ..customer("3", "ABC Sports", CustomerStatus::Regular, "2024-02-20 10:00:00", "2024-02-20 09:00:00")
            },
        ]
    }

    fn ids(filter: CustomerFilter, list: &[Customer]) -> Vec<String> {
        filter.apply(list).unwrap().into_iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn filters_combine_with_and() {
        let list = list();
        let search = |s: &str| CustomerFilter {
            search: s.into(),
            ..Default::default()
        };
        assert_eq!(ids(search("abc"), &list), ["1", "3"]);
        assert_eq!(ids(search("082"), &list), ["2"]);
        assert_eq!(
            ids(
                CustomerFilter {
                    search: "abc".into(),
                    business_type: Some("ไม่ระบุ".into()),
                    ..Default::default()
                },
                &list
            ),
            ["3"]
        );
        assert_eq!(
            ids(
                CustomerFilter {
                    status: Some("ลูกค้าเก่า".into()),
                    business_type: Some("all".into()),
                    ..Default::default()
                },
                &list
            ),
            ["3"]
        );
    }

    #[test]
    fn date_range_applies_to_last_contact_day() {
        let list = list();
        let filter = CustomerFilter {
            date_from: Some("2024-02-01".into()),
            date_to: Some("2024-03-02".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter, &list), ["1", "3"]);
        let filter = CustomerFilter {
            date_to: Some("2024-01-31".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter, &list), ["2"]);
    }

    #[test]
    fn unknown_status_filter_is_an_error() {
        let filter = CustomerFilter {
            status: Some("ลูกค้าเป้าหมาย".into()),
            ..Default::default()
        };
        assert!(filter.apply(&list()).is_err());
    }

    #[test]
    fn rows_fall_back_to_unspecified() {
        let list = list();
        let row = CustomerRow::from(&list[2]);
        assert_eq!(row.business_type, "ไม่ระบุ");
        assert_eq!(row.email, "");
        assert_eq!(row.last_contact, "2024-02-20");
        assert_eq!(row.badge, "primary");
    }

    #[test]
    fn kpis_use_creation_date_and_thirty_days() {
        let now = parse_datetime("2024-03-15 12:00:00").unwrap();
        assert_eq!(
            CustomerKpis::compute(&list(), now),
            CustomerKpis {
                new_customers_this_month: 1,
                outstanding_quotes: 1,
                inactive_customers: 1,
            }
        );
    }
}
