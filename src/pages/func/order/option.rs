use axum::extract::Path;
use serde::Serialize;
use serde_json::json;

use crate::{Response, ResponseResult};

use super::{
    delivery::{DELIVERY_METHODS, DISTRICTS, PAYMENT_METHODS, PROVINCES, SUBDISTRICTS},
    product::{ProductType, DETAIL_OPTIONS, LANYARD_SIZES, MEDAL_COLORS, MEDAL_SIZES},
    Urgency,
};

/// One entry of a dropdown: what is shown and what is sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInfos {
    pub display: &'static str,
    pub value: &'static str,
}

impl TextInfos {
    fn list(pairs: &[(&'static str, &'static str)]) -> Vec<TextInfos> {
        pairs
            .iter()
            .map(|&(value, display)| TextInfos { display, value })
            .collect()
    }
}

pub static EMPLOYEES: [(&str, &str); 5] = [
    ("employee1", "พนักงาน 1"),
    ("employee2", "พนักงาน 2"),
    ("employee3", "พนักงาน 3"),
    ("employee4", "พนักงาน 4"),
    ("employee5", "พนักงาน 5"),
];

fn product_types() -> Vec<TextInfos> {
    ProductType::ALL
        .iter()
        .map(|t| TextInfos {
            display: t.label(),
            value: t.as_str(),
        })
        .collect()
}

fn materials(ty: ProductType) -> Vec<TextInfos> {
    ty.materials()
        .iter()
        .map(|&m| TextInfos { display: m, value: m })
        .collect()
}

pub async fn order_options() -> ResponseResult {
    let urgency: Vec<TextInfos> = Urgency::ALL
        .iter()
        .map(|u| TextInfos {
            display: u.label(),
            value: u.as_str(),
        })
        .collect();
    let materials: serde_json::Map<String, serde_json::Value> = ProductType::ALL
        .iter()
        .filter(|t| t.has_materials())
        .map(|t| (t.as_str().to_owned(), json!(materials(*t))))
        .collect();
    Ok(Response::ok(json!({
        "productTypes": product_types(),
        "materials": materials,
        "urgency": urgency,
        "medalSizes": TextInfos::list(&MEDAL_SIZES),
        "medalColors": TextInfos::list(&MEDAL_COLORS),
        "lanyardSizes": TextInfos::list(&LANYARD_SIZES),
        "detailOptions": DETAIL_OPTIONS,
        "provinces": TextInfos::list(&PROVINCES),
        "districts": TextInfos::list(&DISTRICTS),
        "subdistricts": TextInfos::list(&SUBDISTRICTS),
        "deliveryMethods": TextInfos::list(&DELIVERY_METHODS),
        "paymentMethods": TextInfos::list(&PAYMENT_METHODS),
        "employees": TextInfos::list(&EMPLOYEES),
    })))
}

/// Materials of one product type; empty for types without a material step.
pub async fn product_materials(Path(product_type): Path<String>) -> ResponseResult {
    let ty: ProductType = product_type.parse()?;
    Ok(Response::ok(json!(materials(ty))))
}
