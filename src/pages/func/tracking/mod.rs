use std::str::FromStr;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    errors::Error,
    libs::dser::{deser_empty_to_none, deser_empty_to_none_of, serialize_null_to_default},
    AppState, Response, ResponseResult,
};

pub fn tracking_router() -> Router<AppState> {
    Router::new()
        .route("/tracking/board", post(query_board))
        .route("/tracking/status", get(status_table))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Internal,
    External,
}

impl OrderKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Internal => "ออเดอร์ภายใน",
            Self::External => "ออเดอร์ภายนอก",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Domestic,
    International,
}

impl Location {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Domestic => "ในประเทศ",
            Self::International => "ต่างประเทศ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Graphics,
    Production,
    Shipping,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graphics => "graphics",
            Self::Production => "production",
            Self::Shipping => "shipping",
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Self::Graphics => "แผนกกราฟฟิค",
            Self::Production => "แผนกผลิต",
            Self::Shipping => "แผนกจัดส่ง",
        }
    }
}

impl FromStr for Department {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graphics" => Ok(Self::Graphics),
            "production" => Ok(Self::Production),
            "shipping" => Ok(Self::Shipping),
            _ => Err(Error::InvalidValue(format!("ไม่รู้จักแผนก {s}"))),
        }
    }
}

/// An order on the tracking board. `status` is an opaque key looked up in
/// [`STATUS_TABLE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    pub id: String,
    pub customer: String,
    pub items: String,
    pub order_date: String,
    pub due_date: String,
    pub status: String,
    pub value: f64,
    pub progress: u8,
    #[serde(rename = "type")]
    pub kind: OrderKind,
    pub location: Location,
    #[serde(default, deserialize_with = "deser_empty_to_none_of")]
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub static STATUS_TABLE: [StatusInfo; 5] = [
    StatusInfo {
        key: "pending_approval",
        label: "รออนุมัติ",
        color: "amber",
        icon: "Clock",
    },
    StatusInfo {
        key: "in_production",
        label: "กำลังผลิต",
        color: "blue",
        icon: "Package",
    },
    StatusInfo {
        key: "ready_to_ship",
        label: "พร้อมส่ง",
        color: "purple",
        icon: "Truck",
    },
    StatusInfo {
        key: "shipped",
        label: "จัดส่งแล้ว",
        color: "green",
        icon: "CheckCircle",
    },
    StatusInfo {
        key: "urgent",
        label: "เร่งด่วน",
        color: "red",
        icon: "AlertTriangle",
    },
];

/// Badge of a status key. Keys missing from the table show the raw key on a
/// gray badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: String,
    pub color: &'static str,
    pub icon: Option<&'static str>,
}

pub fn status_badge(status: &str) -> StatusBadge {
    match STATUS_TABLE.iter().find(|s| s.key == status) {
        Some(info) => StatusBadge {
            label: info.label.to_owned(),
            color: info.color,
            icon: Some(info.icon),
        },
        None => StatusBadge {
            label: status.to_owned(),
            color: "gray",
            icon: None,
        },
    }
}

pub fn progress_color(progress: u8, status: &str) -> &'static str {
    match progress {
        _ if status == "urgent" => "red",
        100 => "green",
        60..=255 => "blue",
        30..=59 => "amber",
        _ => "gray",
    }
}

/// Search box and status selector of the board.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BoardFilter {
    pub search: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub status: Option<String>,
}

impl BoardFilter {
    pub fn matches(&self, order: &TrackedOrder) -> bool {
        let needle = self.search.trim().to_lowercase();
        let text = order.id.to_lowercase().contains(&needle)
            || order.customer.to_lowercase().contains(&needle)
            || order.items.to_lowercase().contains(&needle);
        let status = match self.status.as_deref() {
            None | Some("all") => true,
            Some(s) => order.status == s,
        };
        text && status
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCard<'a> {
    #[serde(flatten)]
    pub order: &'a TrackedOrder,
    pub badge: StatusBadge,
    pub progress_color: &'static str,
    pub type_label: &'static str,
    /// Department for internal orders, location for external ones.
    pub place_label: &'static str,
}

impl<'a> From<&'a TrackedOrder> for OrderCard<'a> {
    fn from(order: &'a TrackedOrder) -> Self {
        let place_label = match order.kind {
            // Anything that is not graphics or production is shown as shipping.
            OrderKind::Internal => order.department.unwrap_or(Department::Shipping).label(),
            OrderKind::External => order.location.label(),
        };
        Self {
            order,
            badge: status_badge(&order.status),
            progress_color: progress_color(order.progress, &order.status),
            type_label: order.kind.label(),
            place_label,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category<'a> {
    pub key: &'static str,
    pub label: &'static str,
    pub orders: Vec<OrderCard<'a>>,
    #[serde(serialize_with = "serialize_null_to_default")]
    pub empty_message: Option<String>,
}

impl<'a> Category<'a> {
    fn new(
        key: &'static str,
        label: &'static str,
        empty: &str,
        orders: Vec<&'a TrackedOrder>,
    ) -> Self {
        let empty_message = op::ternary!(orders.is_empty() =>
            Some(format!("ไม่พบออเดอร์{empty}ที่ตรงกับเงื่อนไขการค้นหา"));
            None
        );
        Self {
            key,
            label,
            orders: orders.into_iter().map(OrderCard::from).collect(),
            empty_message,
        }
    }
}

/// The two-level tab layout: external by location, internal by department.
#[derive(Debug, Serialize)]
pub struct Board<'a> {
    pub external: Vec<Category<'a>>,
    pub internal: Vec<Category<'a>>,
}

impl<'a> Board<'a> {
    pub fn build(orders: &'a [TrackedOrder], filter: &BoardFilter) -> Self {
        let pick = |pred: &dyn Fn(&TrackedOrder) -> bool| -> Vec<&'a TrackedOrder> {
            orders
                .iter()
                .filter(|&o| filter.matches(o) && pred(o))
                .collect()
        };
        let external = |loc: Location| {
            pick(&|o: &TrackedOrder| o.kind == OrderKind::External && o.location == loc)
        };
        let internal = |dep: Department| {
            pick(&|o: &TrackedOrder| o.kind == OrderKind::Internal && o.department == Some(dep))
        };
        Self {
            external: vec![
                Category::new(
                    "international",
                    Location::International.label(),
                    "ต่างประเทศ",
                    external(Location::International),
                ),
                Category::new(
                    "domestic",
                    Location::Domestic.label(),
                    "ในประเทศ",
                    external(Location::Domestic),
                ),
            ],
            internal: vec![
                Category::new(
                    Department::Graphics.as_str(),
                    Department::Graphics.label(),
                    "ในแผนกกราฟฟิค",
                    internal(Department::Graphics),
                ),
                Category::new(
                    Department::Production.as_str(),
                    Department::Production.label(),
                    "ในแผนกผลิต",
                    internal(Department::Production),
                ),
                Category::new(
                    Department::Shipping.as_str(),
                    Department::Shipping.label(),
                    "ในการจัดส่ง",
                    internal(Department::Shipping),
                ),
            ],
        }
    }
}

/// Demo board loaded into the in-memory store.
pub fn demo_orders() -> Vec<TrackedOrder> {
    let order = |id: &str,
                 customer: &str,
                 items: &str,
                 dates: (&str, &str),
                 status: &str,
                 value: f64,
                 progress: u8,
                 kind: OrderKind,
                 location: Location,
                 department: Option<Department>| TrackedOrder {
        id: id.to_owned(),
        customer: customer.to_owned(),
        items: items.to_owned(),
        order_date: dates.0.to_owned(),
        due_date: dates.1.to_owned(),
        status: status.to_owned(),
        value,
        progress,
        kind,
        location,
        department,
    };
    use Department::*;
    use Location::*;
    use OrderKind::*;
    vec![
        order("ORD001", "บริษัท เอบีซี จำกัด", "ถ้วยรางวัลทอง 50 ใบ", ("2024-01-10", "2024-01-20"), "pending_approval", 25_000.0, 25, Internal, Domestic, Some(Graphics)),
        order("ORD002", "โรงเรียนสายรุ้ง", "เหรียญรางวัล 100 เหรียญ", ("2024-01-08", "2024-01-18"), "in_production", 12_000.0, 60, Internal, Domestic, Some(Production)),
        order("ORD003", "สมาคมนักกีฬา", "ถ้วยคริสตัล 20 ใบ", ("2024-01-05", "2024-01-15"), "ready_to_ship", 15_000.0, 90, Internal, Domestic, Some(Shipping)),
        order("ORD004", "บริษัท XYZ จำกัด", "โล่รางวัลไม้ 30 ใบ", ("2024-01-03", "2024-01-13"), "shipped", 8_400.0, 100, External, Domestic, None),
        order("ORD005", "International Sports Club", "Crystal Trophies 15 pcs", ("2024-01-12", "2024-01-25"), "urgent", 18_000.0, 15, External, International, None),
    ]
}

async fn query_board(State(state): State<AppState>, Json(value): Json<Value>) -> ResponseResult {
    let filter: BoardFilter = serde_json::from_value(value)?;
    let orders = state
        .store
        .tracked_orders()
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงข้อมูลออเดอร์ได้"))?;
    let board = Board::build(&orders, &filter);
    Ok(Response::ok(json!(board)))
}

async fn status_table() -> ResponseResult {
    Ok(Response::ok(json!(STATUS_TABLE)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(category: &Category) -> Vec<String> {
        category.orders.iter().map(|c| c.order.id.clone()).collect()
    }

    #[test]
    fn every_order_lands_in_its_tab() {
        let orders = demo_orders();
        let board = Board::build(&orders, &BoardFilter::default());
        let external: Vec<Vec<String>> = board.external.iter().map(ids).collect();
        let internal: Vec<Vec<String>> = board.internal.iter().map(ids).collect();
        assert_eq!(external, [vec!["ORD005"], vec!["ORD004"]]);
        assert_eq!(internal, [vec!["ORD001"], vec!["ORD002"], vec!["ORD003"]]);
        assert!(board.internal.iter().all(|c| c.empty_message.is_none()));
    }

    #[test]
    fn search_and_status_narrow_every_tab() {
        let orders = demo_orders();
        let filter = BoardFilter {
            search: "crystal".into(),
            status: Some("all".into()),
        };
        let board = Board::build(&orders, &filter);
        assert_eq!(ids(&board.external[0]), ["ORD005"]);
        assert_eq!(
            board.external[1].empty_message.as_deref(),
            Some("ไม่พบออเดอร์ในประเทศที่ตรงกับเงื่อนไขการค้นหา")
        );

        let filter = BoardFilter {
            search: String::new(),
            status: Some("in_production".into()),
        };
        let board = Board::build(&orders, &filter);
        assert_eq!(ids(&board.internal[1]), ["ORD002"]);
        assert_eq!(
            board.internal[2].empty_message.as_deref(),
            Some("ไม่พบออเดอร์ในการจัดส่งที่ตรงกับเงื่อนไขการค้นหา")
        );
    }

    #[test]
    fn unknown_status_gets_a_gray_badge() {
        assert_eq!(status_badge("urgent").label, "เร่งด่วน");
        let badge = status_badge("on_hold");
        assert_eq!(badge.label, "on_hold");
        assert_eq!(badge.color, "gray");
        assert!(badge.icon.is_none());
    }

    #[test]
    fn progress_colours() {
        assert_eq!(progress_color(100, "urgent"), "red");
        assert_eq!(progress_color(100, "shipped"), "green");
        assert_eq!(progress_color(60, "in_production"), "blue");
        assert_eq!(progress_color(30, "pending_approval"), "amber");
        assert_eq!(progress_color(29, "pending_approval"), "gray");
    }

    #[test]
    fn blank_department_reads_as_none() {
        let order: TrackedOrder = serde_json::from_value(json!({
            "id": "X", "customer": "c", "items": "i",
            "orderDate": "2024-01-01", "dueDate": "2024-01-02",
            "status": "shipped", "value": 1.0, "progress": 100,
            "type": "external", "location": "domestic", "department": ""
        }))
        .unwrap();
        assert!(order.department.is_none());
        let card = OrderCard::from(&order);
        assert_eq!(card.place_label, "ในประเทศ");
        assert_eq!(card.type_label, "ออเดอร์ภายนอก");
    }
}
