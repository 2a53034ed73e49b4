use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    errors::{Error, FieldError, Result},
    libs::{
        dser::{deser_empty_to_none, deser_empty_to_none_of},
        gen_id,
        time::{format_date, format_datetime, now, parse_loose},
    },
    pages::func::order::product::{ProductType, DETAIL_OPTIONS, LANYARD_SIZES, MEDAL_COLORS},
    AppState, Response, ResponseResult,
};

pub fn estimation_router() -> Router<AppState> {
    Router::new()
        .route("/estimation/list", post(list_estimations))
        .route("/estimation/add", post(add_estimation))
}

pub const PENDING: &str = "รอการอนุมัติ";

pub static SALESPERSONS: [(&str, &str); 3] = [
    ("sales1", "พนักงานขาย 1"),
    ("sales2", "พนักงานขาย 2"),
    ("sales3", "พนักงานขาย 3"),
];

pub fn status_color(status: &str) -> &'static str {
    match status {
        "อนุมัติแล้ว" => "green",
        PENDING => "yellow",
        "ยกเลิก" => "red",
        _ => "gray",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimation {
    pub id: String,
    pub date: String,
    pub salesperson: Option<String>,
    pub customer_name: Option<String>,
    pub line_name: String,
    pub job_name: Option<String>,
    pub product_type: ProductType,
    pub material: Option<String>,
    pub usage_date: Option<String>,
    pub width: Option<String>,
    pub length: Option<String>,
    pub height: Option<String>,
    pub thickness: Option<String>,
    pub quantity: u32,
    pub colors: Vec<String>,
    pub front_details: Vec<String>,
    pub back_details: Vec<String>,
    pub lanyard_size: Option<String>,
    pub lanyard_patterns: Option<String>,
    pub mold_cost: Option<String>,
    pub model: Option<String>,
    pub notes: Option<String>,
    pub budget: Option<String>,
    pub price: f64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationRow<'a> {
    pub id: &'a str,
    pub date: &'a str,
    pub line_name: &'a str,
    pub product_type: &'static str,
    pub quantity: u32,
    pub price: f64,
    pub status: &'a str,
    pub status_color: &'static str,
}

impl<'a> From<&'a Estimation> for EstimationRow<'a> {
    fn from(e: &'a Estimation) -> Self {
        Self {
            id: &e.id,
            date: &e.date,
            line_name: &e.line_name,
            product_type: e.product_type.label(),
            quantity: e.quantity,
            price: e.price,
            status: &e.status,
            status_color: status_color(&e.status),
        }
    }
}

/// Case-insensitive match over the LINE name and the product type label.
pub fn search<'a>(list: &'a [Estimation], term: &str) -> Vec<EstimationRow<'a>> {
    let needle = term.trim().to_lowercase();
    list.iter()
        .filter(|e| {
            e.line_name.to_lowercase().contains(&needle)
                || e.product_type.label().to_lowercase().contains(&needle)
        })
        .map(EstimationRow::from)
        .collect()
}

/// Flips `value` in a checkbox group.
pub fn toggle(list: &mut Vec<String>, value: &str) {
    match list.iter().position(|v| v == value) {
        Some(i) => {
            list.remove(i);
        }
        None => list.push(value.to_owned()),
    }
}

/// Replays the clicks of a checkbox group; a value clicked twice ends up
/// unchecked.
fn replay(clicks: Vec<String>, allowed: impl Fn(&str) -> bool, what: &str) -> Result<Vec<String>> {
    let mut checked = Vec::new();
    for value in clicks {
        if !allowed(&value) {
            return Err(Error::InvalidValue(format!("{what} {value} ไม่ถูกต้อง")));
        }
        toggle(&mut checked, &value);
    }
    Ok(checked)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EstimationForm {
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub salesperson: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub customer_name: Option<String>,
    pub line_name: String,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub job_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none_of")]
    pub product_type: Option<ProductType>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub material: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub usage_date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub width: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub length: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub height: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub thickness: Option<String>,
    pub quantity: Option<u32>,
    pub colors: Vec<String>,
    pub front_details: Vec<String>,
    pub back_details: Vec<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub lanyard_size: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub lanyard_patterns: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub mold_cost: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub model: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub budget: Option<String>,
    pub price: Option<f64>,
}

impl EstimationForm {
    pub fn into_estimation(self, id: String) -> Result<Estimation> {
        let mut errors = Vec::new();
        if self.line_name.trim().is_empty() {
            errors.push(FieldError::new("lineName", "กรุณาระบุชื่อ LINE"));
        }
        if self.product_type.is_none() {
            errors.push(FieldError::new("productType", "กรุณาเลือกประเภทสินค้า"));
        }
        if self.quantity.unwrap_or(0) == 0 {
            errors.push(FieldError::new("quantity", "กรุณาระบุจำนวน"));
        }
        let (Some(product_type), Some(quantity), true) =
            (self.product_type, self.quantity, errors.is_empty())
        else {
            return Err(Error::Validation(errors));
        };

        if let Some(material) = &self.material {
            if !product_type.materials().contains(&material.as_str()) {
                return Err(Error::InvalidValue(format!(
                    "วัสดุ {material} ใช้กับ {product_type} ไม่ได้"
                )));
            }
        }
        if let Some(person) = &self.salesperson {
            if !SALESPERSONS.iter().any(|(k, _)| *k == person.as_str()) {
                return Err(Error::InvalidValue(format!("ไม่รู้จักพนักงานขาย {person}")));
            }
        }

        // Medal and award sections only exist for their own product types.
        let medal = product_type == ProductType::Medal;
        let award = matches!(product_type, ProductType::Trophy | ProductType::Award);
        let colors = replay(self.colors, |c| MEDAL_COLORS.iter().any(|(k, _)| *k == c), "สี")?;
        let is_detail = |d: &str| DETAIL_OPTIONS.contains(&d);
        let front_details = replay(self.front_details, is_detail, "รายละเอียด")?;
        let back_details = replay(self.back_details, is_detail, "รายละเอียด")?;
        if let Some(size) = &self.lanyard_size {
            if !LANYARD_SIZES.iter().any(|(k, _)| *k == size.as_str()) {
                return Err(Error::InvalidValue(format!("ขนาดสายคล้อง {size} ไม่ถูกต้อง")));
            }
        }

        let now = now();
        let date = match &self.date {
            Some(date) => parse_loose(date)?.date(),
            None => now.date(),
        };
        let medal_only = |v: Option<String>| v.filter(|_| medal);
        let medal_list = |v: Vec<String>| op::ternary!(medal => v; Vec::new());
        Ok(Estimation {
            id,
            date: format_date(&date),
            salesperson: self.salesperson,
            customer_name: self.customer_name,
            line_name: self.line_name.trim().to_owned(),
            job_name: self.job_name,
            product_type,
            material: self.material,
            usage_date: self.usage_date,
            width: self.width,
            length: self.length,
            height: self.height,
            thickness: self.thickness,
            quantity,
            colors: medal_list(colors),
            front_details: medal_list(front_details),
            back_details: medal_list(back_details),
            lanyard_size: medal_only(self.lanyard_size),
            lanyard_patterns: medal_only(self.lanyard_patterns),
            mold_cost: medal_only(self.mold_cost),
            model: self.model.filter(|_| award),
            notes: op::ternary!(medal || award => self.notes; None),
            budget: self.budget,
            price: self.price.unwrap_or(0.0),
            status: PENDING.to_owned(),
            created_at: format_datetime(&now),
        })
    }
}

/// Demo estimations loaded into the in-memory store.
pub fn demo_estimations() -> Vec<Estimation> {
    let entry = |id: &str, date: &str, line: &str, ty: ProductType, quantity: u32, price: f64, status: &str| {
        Estimation {
            id: id.to_owned(),
            date: date.to_owned(),
            salesperson: None,
            customer_name: None,
            line_name: line.to_owned(),
            job_name: None,
            product_type: ty,
            material: None,
            usage_date: None,
            width: None,
            length: None,
            height: None,
            thickness: None,
            quantity,
            colors: Vec::new(),
            front_details: Vec::new(),
            back_details: Vec::new(),
            lanyard_size: None,
            lanyard_patterns: None,
            mold_cost: None,
            model: None,
            notes: None,
            budget: None,
            price,
            status: status.to_owned(),
            created_at: format!("{date} 09:00:00"),
        }
    };
    vec![
        entry("1", "2024-01-15", "customer_line_001", ProductType::Medal, 100, 15_000.0, PENDING),
        entry("2", "2024-01-14", "customer_line_002", ProductType::Trophy, 50, 25_000.0, "อนุมัติแล้ว"),
        entry("3", "2024-01-13", "customer_line_003", ProductType::Shirt, 200, 8_000.0, "ยกเลิก"),
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListParams {
    search: String,
}

async fn list_estimations(State(state): State<AppState>, Json(value): Json<Value>) -> ResponseResult {
    let params: ListParams = serde_json::from_value(value)?;
    let list = state
        .store
        .estimations()
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงข้อมูลประเมินราคาได้"))?;
    Ok(Response::ok(json!(search(&list, &params.search))))
}

async fn add_estimation(State(state): State<AppState>, Json(value): Json<Value>) -> ResponseResult {
    let form: EstimationForm = serde_json::from_value(value)?;
    let estimation = form.into_estimation(gen_id("EST"))?;
    state
        .store
        .insert_estimation(&estimation)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกประเมินราคาได้"))?;
    info!(
        "Added price estimation {} for {}",
        estimation.id, estimation.line_name
    );
    Ok(Response::ok(json!({"id": estimation.id})))
}
