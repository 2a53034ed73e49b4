pub mod delivery;
mod form;
mod lookup;
mod option;
pub mod product;
mod staged;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    errors::{Error, Result},
    libs::{cache::DRAFT_CACHE, gen_id, time::now_millis},
    AppState, Response, ResponseResult,
};

pub use delivery::DeliveryInfo;
pub use form::{DeliveryPatch, OrderFields, OrderForm, ProductPatch, Urgency};
pub use product::{ProductType, SubmitAction};
pub use staged::StagedProduct;

pub fn order_router() -> Router<AppState> {
    Router::new()
        .route("/order/options", get(option::order_options))
        .route("/order/materials/:product_type", get(option::product_materials))
        .route("/order/draft/new", post(new_draft))
        .route("/order/draft/:id", get(get_draft).delete(cancel_draft))
        .route("/order/draft/:id/fields", post(patch_fields))
        .route("/order/draft/:id/product", post(patch_product))
        .route("/order/draft/:id/product/save", post(save_product))
        .route("/order/draft/:id/product/:pid", delete(remove_product))
        .route("/order/draft/:id/delivery", post(patch_delivery))
        .route("/order/draft/:id/recipient/copy", post(copy_recipient))
        .route("/order/draft/:id/search", post(search_customer))
        .route("/order/draft/:id/select/:customer_id", post(select_customer))
        .route("/order/draft/:id/submit", post(submit_order))
        .route("/order/list", get(list_orders))
}

/// A submitted order as persisted in `orders` and `order_products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub draft_id: String,
    pub created_at: String,
    pub customer_id: Option<String>,
    pub fields: OrderFields,
    pub products: Vec<StagedProduct>,
    pub delivery: DeliveryInfo,
    pub action: SubmitAction,
}

impl Order {
    /// Budget in baht, zero when missing or not a number.
    pub fn value(&self) -> f64 {
        self.fields
            .budget
            .as_deref()
            .map(|b| b.replace(',', ""))
            .and_then(|b| b.trim().parse().ok())
            .unwrap_or(0.0)
    }
}

/// Drafts idle this long are dropped when the next draft opens.
pub const DRAFT_IDLE_MILLIS: u64 = 12 * 60 * 60 * 1000;

/// Runs `f` on the draft `id`, holding its cache entry for the duration.
fn with_draft<T>(id: &str, f: impl FnOnce(&mut OrderForm) -> Result<T>) -> Result<T> {
    let mut form = DRAFT_CACHE
        .get_mut(id)
        .ok_or_else(|| Error::NotFound(format!("ฟอร์มสั่งซื้อ {id}")))?;
    form.touch(now_millis());
    f(form.value_mut())
}

/// Like [`with_draft`] and answers with the updated form. `f` works on a
/// copy; the draft only changes when it succeeds.
fn update_draft(id: &str, f: impl FnOnce(&mut OrderForm) -> Result<()>) -> ResponseResult {
    let view = with_draft(id, |form| {
        let mut next = form.clone();
        f(&mut next)?;
        let view = json!(next.view());
        *form = next;
        Ok(view)
    })?;
    Ok(Response::ok(view))
}

/// Removes drafts not touched within [`DRAFT_IDLE_MILLIS`] of `now`.
fn evict_idle_drafts(now: u64) -> usize {
    let mut evicted = 0;
    DRAFT_CACHE.retain(|_, form| {
        let keep = now.saturating_sub(form.touched_at()) < DRAFT_IDLE_MILLIS;
        if !keep {
            evicted += 1;
        }
        keep
    });
    evicted
}

async fn new_draft(State(state): State<AppState>) -> ResponseResult {
    let evicted = evict_idle_drafts(now_millis());
    if evicted > 0 {
        debug!("Dropped {evicted} idle order draft(s)");
    }
    let customers = state
        .store
        .customers()
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงข้อมูลลูกค้าได้"))?;
    let id = gen_id("DRAFT");
    let form = OrderForm::new(id.clone(), customers);
    let view = json!(form.view());
    DRAFT_CACHE.insert(id.clone(), form);
    debug!("Opened order draft {id}");
    Ok(Response::ok(view))
}

async fn get_draft(Path(id): Path<String>) -> ResponseResult {
    update_draft(&id, |_| Ok(()))
}

async fn cancel_draft(Path(id): Path<String>) -> ResponseResult {
    match DRAFT_CACHE.remove(&id) {
        Some(_) => Ok(Response::empty()),
        None => Err(Error::NotFound(format!("ฟอร์มสั่งซื้อ {id}")).into()),
    }
}

async fn patch_fields(Path(id): Path<String>, Json(value): Json<Value>) -> ResponseResult {
    update_draft(&id, |form| form.patch_fields(value))
}

async fn patch_product(Path(id): Path<String>, Json(value): Json<Value>) -> ResponseResult {
    let patch: ProductPatch = serde_json::from_value(value)?;
    update_draft(&id, |form| form.apply_product(patch))
}

async fn save_product(Path(id): Path<String>) -> ResponseResult {
    update_draft(&id, |form| form.save_product().map(|_| ()))
}

async fn remove_product(Path((id, pid)): Path<(String, u64)>) -> ResponseResult {
    update_draft(&id, |form| form.remove_product(pid).map(|_| ()))
}

async fn patch_delivery(Path(id): Path<String>, Json(value): Json<Value>) -> ResponseResult {
    let patch: DeliveryPatch = serde_json::from_value(value)?;
    update_draft(&id, |form| form.apply_delivery(patch))
}

async fn copy_recipient(Path(id): Path<String>) -> ResponseResult {
    update_draft(&id, |form| form.copy_recipient())
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn search_customer(Path(id): Path<String>, Json(value): Json<Value>) -> ResponseResult {
    let params: SearchParams = serde_json::from_value(value)?;
    let hits = with_draft(&id, |form| Ok(form.search(&params.query)))?;
    Ok(Response::ok(json!(hits)))
}

async fn select_customer(Path((id, customer_id)): Path<(String, String)>) -> ResponseResult {
    update_draft(&id, |form| form.select_customer(&customer_id))
}

async fn submit_order(State(state): State<AppState>, Path(id): Path<String>) -> ResponseResult {
    // Validate on a copy so the cache entry is not held across the store call.
    let form = with_draft(&id, |form| Ok(form.clone()))?;
    let order = form.submit(gen_id("ORD"))?;
    state
        .store
        .insert_order(&order)
        .map_err(|e| Response::failed(e, "ไม่สามารถบันทึกออเดอร์ได้"))?;
    DRAFT_CACHE.remove(&id);
    info!(
        "Order {} submitted from draft {id}: {} product(s), action {}",
        order.id,
        order.products.len(),
        order.action.as_str()
    );
    Ok(Response::ok(json!({
        "id": order.id,
        "action": order.action,
        "actionLabel": order.action.label(),
    })))
}

async fn list_orders(State(state): State<AppState>) -> ResponseResult {
    let orders = state
        .store
        .orders()
        .map_err(|e| Response::failed(e, "ไม่สามารถดึงข้อมูลออเดอร์ได้"))?;
    Ok(Response::ok(json!(orders)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(budget: Option<&str>) -> Order {
        Order {
            id: "ORD1".into(),
            draft_id: "DRAFT1".into(),
            created_at: "2024-01-15 10:00:00".into(),
            customer_id: None,
            fields: OrderFields {
                budget: budget.map(str::to_owned),
                ..Default::default()
            },
            products: Vec::new(),
            delivery: DeliveryInfo::empty(delivery::DeliveryType::Pickup),
            action: SubmitAction::EstimatePrice,
        }
    }

    #[test]
    fn value_reads_the_budget() {
        assert_eq!(order(Some("15,000")).value(), 15_000.0);
        assert_eq!(order(Some("ประมาณหมื่น")).value(), 0.0);
        assert_eq!(order(None).value(), 0.0);
    }

    #[test]
    fn stored_order_reads_back() {
        let mut order = order(Some("500"));
        order.fields.urgency_level = Some(Urgency::Urgent1Day);
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["fields"]["urgencyLevel"], json!("urgent_1day"));
        assert_eq!(value["delivery"]["deliveryType"], json!("pickup"));
        let back: Order = serde_json::from_value(value).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn missing_draft_is_not_found() {
        let err = with_draft("DRAFT-missing", |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn rejected_patch_leaves_the_draft_unchanged() {
        let mut form = OrderForm::new("DRAFT-rejected".into(), Vec::new());
        form.set_product_type(Some(ProductType::Medal));
        form.set_material(Some("PVC".into())).unwrap();
        form.patch_details(json!({"quantity": "10"})).unwrap();
        DRAFT_CACHE.insert("DRAFT-rejected".into(), form);

        let patch: ProductPatch =
            serde_json::from_value(json!({"productType": "Award", "material": "PVC"})).unwrap();
        assert!(update_draft("DRAFT-rejected", |form| form.apply_product(patch)).is_err());

        let (product_type, material, quantity) = with_draft("DRAFT-rejected", |form| {
            Ok((
                form.product_type(),
                form.material().map(str::to_owned),
                form.job_details().quantity.clone(),
            ))
        })
        .unwrap();
        DRAFT_CACHE.remove("DRAFT-rejected");
        assert_eq!(product_type, Some(ProductType::Medal));
        assert_eq!(material.as_deref(), Some("PVC"));
        assert_eq!(quantity.as_deref(), Some("10"));
    }

    #[test]
    fn idle_drafts_are_evicted() {
        let mut idle = OrderForm::new("DRAFT-idle".into(), Vec::new());
        idle.touch(1_000);
        DRAFT_CACHE.insert("DRAFT-idle".into(), idle);
        let mut fresh = OrderForm::new("DRAFT-fresh".into(), Vec::new());
        fresh.touch(1_000 + DRAFT_IDLE_MILLIS);
        DRAFT_CACHE.insert("DRAFT-fresh".into(), fresh);
        let mut read = OrderForm::new("DRAFT-read".into(), Vec::new());
        read.touch(1_000);
        DRAFT_CACHE.insert("DRAFT-read".into(), read);
        with_draft("DRAFT-read", |_| Ok(())).unwrap();

        assert!(evict_idle_drafts(1_000 + DRAFT_IDLE_MILLIS + 1) >= 1);
        assert!(!DRAFT_CACHE.contains_key("DRAFT-idle"));
        assert!(DRAFT_CACHE.contains_key("DRAFT-fresh"));
        assert!(DRAFT_CACHE.contains_key("DRAFT-read"));
        DRAFT_CACHE.remove("DRAFT-fresh");
        DRAFT_CACHE.remove("DRAFT-read");
    }
}
