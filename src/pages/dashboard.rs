use axum::{extract::State, routing::get, Router};
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use serde_json::json;

use crate::{
    errors::Error,
    libs::time::{days_until, now, parse_loose},
    pages::func::{
        customer::CustomerKpis,
        tracking::{status_badge, TrackedOrder, STATUS_TABLE},
    },
    AppState, Response, ResponseResult,
};

pub fn dashboard_router() -> Router<AppState> {
    Router::new().route("/dashboard/sales", get(sales_dashboard))
}

/// Orders due within this many days are listed as urgent.
pub const URGENT_WITHIN_DAYS: i64 = 2;

#[derive(Debug, PartialEq, Serialize)]
pub struct MonthlySales {
    pub current: f64,
    pub target: f64,
    pub percentage: u32,
    pub remaining: f64,
}

impl MonthlySales {
    pub fn compute(orders: &[TrackedOrder], target: f64, now: NaiveDateTime) -> Self {
        let current: f64 = orders
            .iter()
            .filter(|o| {
                parse_loose(&o.order_date)
                    .is_ok_and(|t| t.year() == now.year() && t.month() == now.month())
            })
            .map(|o| o.value)
            .sum();
        let percentage = if target > 0.0 {
            (current / target * 100.0).round() as u32
        } else {
            0
        };
        Self {
            current,
            target,
            percentage,
            remaining: (target - current).max(0.0),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct StatusCount {
    pub key: &'static str,
    pub label: &'static str,
    pub count: usize,
}

pub fn status_counts(orders: &[TrackedOrder]) -> Vec<StatusCount> {
    STATUS_TABLE
        .iter()
        .map(|s| StatusCount {
            key: s.key,
            label: s.label,
            count: orders.iter().filter(|o| o.status == s.key).count(),
        })
        .collect()
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentOrder {
    pub id: String,
    pub customer: String,
    pub item: String,
    pub due_label: String,
    pub days_left: Option<i64>,
    pub status: String,
    pub priority: &'static str,
}

pub fn due_label(days: i64) -> String {
    match days {
        0 => "วันนี้".to_owned(),
        1 => "พรุ่งนี้".to_owned(),
        d if d < 0 => format!("เลยกำหนด {} วัน", -d),
        d => format!("{d} วัน"),
    }
}

/// Unshipped orders marked urgent or due soon, soonest first.
pub fn urgent_orders(orders: &[TrackedOrder], now: NaiveDateTime) -> Vec<UrgentOrder> {
    let mut list: Vec<UrgentOrder> = orders
        .iter()
        .filter(|o| o.status != "shipped")
        .filter_map(|o| {
            let days = parse_loose(&o.due_date)
                .ok()
                .map(|due| days_until(&due.date(), &now));
            let soon = days.is_some_and(|d| d <= URGENT_WITHIN_DAYS);
            if o.status != "urgent" && !soon {
                return None;
            }
            let high = o.status == "urgent" || days.is_some_and(|d| d <= 0);
            Some(UrgentOrder {
                id: o.id.clone(),
                customer: o.customer.clone(),
                item: o.items.clone(),
                due_label: days.map_or_else(|| o.due_date.clone(), due_label),
                days_left: days,
                status: status_badge(&o.status).label,
                priority: op::ternary!(high => "สูง"; "กลาง"),
            })
        })
        .collect();
    list.sort_by_key(|o| o.days_left.unwrap_or(i64::MAX));
    list
}

async fn sales_dashboard(State(state): State<AppState>) -> ResponseResult {
    let fetch = |e: Error| Response::failed(e, "ไม่สามารถดึงข้อมูลแดชบอร์ดได้");
    let orders = state.store.tracked_orders().map_err(fetch)?;
    let customers = state.store.customers().map_err(fetch)?;
    let now = now();
    Ok(Response::ok(json!({
        "monthly": MonthlySales::compute(&orders, state.config.sales_target(), now),
        "jobStatus": status_counts(&orders),
        "urgentOrders": urgent_orders(&orders, now),
        "customers": CustomerKpis::compute(&customers, now),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{libs::time::parse_datetime, pages::func::tracking::demo_orders};

    fn at(stamp: &str) -> NaiveDateTime {
        parse_datetime(stamp).unwrap()
    }

    #[test]
    fn monthly_sales_against_target() {
        let sales = MonthlySales::compute(&demo_orders(), 100_000.0, at("2024-01-20 09:00:00"));
        assert_eq!(sales.current, 78_400.0);
        assert_eq!(sales.percentage, 78);
        assert_eq!(sales.remaining, 21_600.0);

        let over = MonthlySales::compute(&demo_orders(), 50_000.0, at("2024-01-20 09:00:00"));
        assert_eq!(over.remaining, 0.0);
        assert_eq!(over.percentage, 157);

        let empty = MonthlySales::compute(&demo_orders(), 100_000.0, at("2024-02-01 09:00:00"));
        assert_eq!(empty.current, 0.0);
    }

    #[test]
    fn every_status_is_counted() {
        let counts = status_counts(&demo_orders());
        assert_eq!(counts.len(), 5);
        assert!(counts.iter().all(|c| c.count == 1));
    }

    #[test]
    fn urgent_orders_skip_shipped_and_sort_by_due() {
        let list = urgent_orders(&demo_orders(), at("2024-01-17 09:00:00"));
        let ids: Vec<&str> = list.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["ORD003", "ORD002", "ORD005"]);
        assert_eq!(list[0].due_label, "เลยกำหนด 2 วัน");
        assert_eq!(list[1].due_label, "พรุ่งนี้");
        assert_eq!(list[1].priority, "กลาง");
        assert_eq!(list[2].priority, "สูง");
        assert_eq!(list[2].status, "เร่งด่วน");
    }

    #[test]
    fn due_labels() {
        assert_eq!(due_label(0), "วันนี้");
        assert_eq!(due_label(1), "พรุ่งนี้");
        assert_eq!(due_label(5), "5 วัน");
        assert_eq!(due_label(-1), "เลยกำหนด 1 วัน");
    }
}
