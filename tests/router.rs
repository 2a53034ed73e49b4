use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use erp_rust::{app_router, database::MemoryStore, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::seeded()), Config::default());
    app_router(state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK, "{uri}");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post(app: &Router, uri: &str, body: Value) -> Value {
    call(app, Method::POST, uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> Value {
    call(app, Method::GET, uri, None).await
}

#[tokio::test]
async fn order_draft_from_lookup_to_submit() {
    let app = app();
    let draft = post(&app, "/order/draft/new", json!({})).await;
    assert_eq!(draft["status"], 0);
    let id = draft["data"]["id"].as_str().unwrap().to_owned();
    assert_eq!(draft["data"]["deliveryVisible"], false);

    let hits = post(&app, &format!("/order/draft/{id}/search"), json!({"query": "เอ"})).await;
    assert_eq!(hits["data"], json!([]));
    let hits = post(&app, &format!("/order/draft/{id}/search"), json!({"query": "เอบีซี"})).await;
    assert_eq!(hits["data"][0]["id"], "CUS001");

    let view = post(&app, &format!("/order/draft/{id}/select/CUS001"), json!({})).await;
    assert_eq!(view["data"]["fields"]["customerName"], "คุณสมชาย ใจดี");
    assert_eq!(view["data"]["customerSearch"], "");

    post(
        &app,
        &format!("/order/draft/{id}/fields"),
        json!({
            "responsiblePerson": "employee2",
            "urgencyLevel": "urgent_2days",
            "jobName": "งานวิ่งการกุศล",
            "budget": "20,000"
        }),
    )
    .await;

    let view = post(
        &app,
        &format!("/order/draft/{id}/product"),
        json!({"productType": "Medal", "material": "ซิงค์อัลลอย"}),
    )
    .await;
    assert_eq!(view["data"]["detailsVisible"], true);
    let fields = view["data"]["detailFields"].as_array().unwrap();
    assert!(fields.contains(&json!("lanyardSize")));

    post(
        &app,
        &format!("/order/draft/{id}/product"),
        json!({"jobDetails": {"quantity": "10"}}),
    )
    .await;
    let view = post(&app, &format!("/order/draft/{id}/product/save"), json!({})).await;
    let rows = view["data"]["savedProducts"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["productType"], "Medal");
    assert_eq!(rows[0]["quantity"], "10");
    assert_eq!(view["data"]["productType"], Value::Null);

    let incomplete = post(&app, &format!("/order/draft/{id}/submit"), json!({})).await;
    assert_eq!(incomplete["status"], 1);
    assert_eq!(incomplete["data"]["fields"][0]["field"], "deliveryType");

    post(
        &app,
        &format!("/order/draft/{id}/delivery"),
        json!({"deliveryType": "pickup", "deliveryInfo": {"pickupTime": "15:30"}}),
    )
    .await;
    let submitted = post(&app, &format!("/order/draft/{id}/submit"), json!({})).await;
    assert_eq!(submitted["status"], 0);
    assert_eq!(submitted["data"]["action"], "estimate_price");

    let gone = get(&app, &format!("/order/draft/{id}")).await;
    assert_eq!(gone["status"], 2);

    let orders = get(&app, "/order/list").await;
    assert_eq!(orders["data"].as_array().unwrap().len(), 1);
    let profile = get(&app, "/customer/profile/CUS001").await;
    assert_eq!(profile["data"]["customer"]["totalOrders"], 1);
    assert_eq!(profile["data"]["customer"]["totalValue"], 20_000.0);
    assert_eq!(profile["data"]["orders"][0]["jobName"], "งานวิ่งการกุศล");
}

#[tokio::test]
async fn retyped_contact_is_not_linked_to_the_looked_up_customer() {
    let app = app();
    let draft = post(&app, "/order/draft/new", json!({})).await;
    let id = draft["data"]["id"].as_str().unwrap().to_owned();
    post(&app, &format!("/order/draft/{id}/select/CUS001"), json!({})).await;
    let view = post(
        &app,
        &format!("/order/draft/{id}/fields"),
        json!({
            "customerName": "บุคคลอื่น",
            "customerPhone": "0800000000",
            "responsiblePerson": "employee1",
            "urgencyLevel": "normal",
            "jobName": "งานเลี้ยงรุ่น",
            "budget": "5000"
        }),
    )
    .await;
    assert_eq!(view["data"]["customerId"], Value::Null);

    post(&app, &format!("/order/draft/{id}/product"), json!({"productType": "Shirt"})).await;
    post(
        &app,
        &format!("/order/draft/{id}/delivery"),
        json!({"deliveryType": "pickup", "deliveryInfo": {"pickupTime": "10:00"}}),
    )
    .await;
    let submitted = post(&app, &format!("/order/draft/{id}/submit"), json!({})).await;
    assert_eq!(submitted["status"], 0);

    let orders = get(&app, "/order/list").await;
    assert_eq!(orders["data"][0]["customerId"], Value::Null);
    let profile = get(&app, "/customer/profile/CUS001").await;
    assert_eq!(profile["data"]["customer"]["totalOrders"], 0);
}

#[tokio::test]
async fn rejected_material_keeps_the_product_section() {
    let app = app();
    let draft = post(&app, "/order/draft/new", json!({})).await;
    let id = draft["data"]["id"].as_str().unwrap().to_owned();
    post(
        &app,
        &format!("/order/draft/{id}/product"),
        json!({"productType": "Medal", "material": "PVC", "jobDetails": {"quantity": "10"}}),
    )
    .await;
    let rejected = post(
        &app,
        &format!("/order/draft/{id}/product"),
        json!({"productType": "Award", "material": "PVC"}),
    )
    .await;
    assert_eq!(rejected["status"], 7);

    let view = get(&app, &format!("/order/draft/{id}")).await;
    assert_eq!(view["data"]["productType"], "Medal");
    assert_eq!(view["data"]["material"], "PVC");
    assert_eq!(view["data"]["jobDetails"]["quantity"], "10");
}

#[tokio::test]
async fn customers_are_added_and_filtered() {
    let app = app();
    let missing = post(&app, "/customer/add", json!({"companyName": "ร้านถ้วยทอง"})).await;
    assert_eq!(missing["status"], 1);

    let added = post(
        &app,
        "/customer/add",
        json!({
            "companyName": "ร้านถ้วยทอง",
            "customerType": "ตัวแทน",
            "contactName": "คุณทอง",
            "phoneNumbers": ["0812223333", ""],
            "interestedProducts": "ถ้วยรางวัล",
            "additionalContacts": [{"contactName": "คุณเงิน", "phoneNumber": "0819998888"}]
        }),
    )
    .await;
    assert_eq!(added["status"], 0);
    let id = added["data"]["id"].as_str().unwrap().to_owned();

    let list = post(&app, "/customer/infos", json!({"search": "ถ้วยทอง"})).await;
    assert_eq!(list["data"]["total"], 1);
    assert_eq!(list["data"]["rows"][0]["businessType"], "ตัวแทน");

    let all = post(&app, "/customer/infos", json!({"status": "all"})).await;
    assert_eq!(all["data"]["total"], 4);

    let profile = get(&app, &format!("/customer/profile/{id}")).await;
    assert_eq!(profile["data"]["contacts"][0]["contactName"], "คุณเงิน");
    assert_eq!(profile["data"]["card"]["email"], "-");
}

#[tokio::test]
async fn activity_delete_needs_confirmation() {
    let app = app();
    let added = post(
        &app,
        "/customer/activity/add",
        json!({
            "customerId": "CUS002",
            "activityType": "โทรศัพท์",
            "title": "โทรยืนยันแบบเหรียญ",
            "startDatetime": "2024-02-01T10:00"
        }),
    )
    .await;
    assert_eq!(added["status"], 0);
    let id = added["data"]["id"].as_str().unwrap().to_owned();

    let refused = call(&app, Method::DELETE, &format!("/customer/activity/delete/{id}"), None).await;
    assert_eq!(refused["status"], 8);
    let list = get(&app, "/customer/activity/list/CUS002").await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let done = call(
        &app,
        Method::DELETE,
        &format!("/customer/activity/delete/{id}?confirm=true"),
        None,
    )
    .await;
    assert_eq!(done["status"], 0);
    let list = get(&app, "/customer/activity/list/CUS002").await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn tracking_board_groups_the_demo_orders() {
    let app = app();
    let board = post(&app, "/tracking/board", json!({"search": "", "status": "all"})).await;
    let external = &board["data"]["external"];
    assert_eq!(external[0]["key"], "international");
    assert_eq!(external[0]["orders"][0]["id"], "ORD005");
    assert_eq!(board["data"]["internal"][2]["orders"][0]["id"], "ORD003");

    let filtered = post(&app, "/tracking/board", json!({"status": "shipped"})).await;
    assert_eq!(filtered["data"]["external"][1]["orders"][0]["id"], "ORD004");
    assert_eq!(
        filtered["data"]["internal"][0]["emptyMessage"],
        "ไม่พบออเดอร์ในแผนกกราฟฟิคที่ตรงกับเงื่อนไขการค้นหา"
    );
}

#[tokio::test]
async fn job_events_are_recorded() {
    let app = app();
    let classified = post(&app, "/job/classify", json!({"jobType": "เหรียญซิงค์อัลลอย"})).await;
    assert_eq!(classified["data"]["showCnc"], true);

    let rejected = post(&app, "/job/action/JOB-1", json!({"action": "reject", "reason": ""})).await;
    assert_eq!(rejected["status"], 1);
    post(&app, "/job/action/JOB-1", json!({"action": "start"})).await;
    post(
        &app,
        "/job/update/JOB-1",
        json!({"jobType": "ป้ายจารึก", "workStatus": "รอตรวจสอบ", "quantity": "40"}),
    )
    .await;
    let events = get(&app, "/job/events/JOB-1").await;
    let kinds: Vec<&str> = events["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&"start") && kinds.contains(&"update"));
}

#[tokio::test]
async fn options_and_dashboard() {
    let app = app();
    let options = get(&app, "/order/options").await;
    assert_eq!(options["data"]["productTypes"].as_array().unwrap().len(), 12);
    assert_eq!(options["data"]["employees"][0]["value"], "employee1");

    let materials = get(&app, "/order/materials/Trophy").await;
    assert_eq!(materials["data"][0]["value"], "ถ้วยดีบุก");
    let unknown = get(&app, "/order/materials/Rocket").await;
    assert_eq!(unknown["status"], 7);

    let dashboard = get(&app, "/dashboard/sales").await;
    assert_eq!(dashboard["data"]["monthly"]["target"], 300_000.0);
    assert_eq!(dashboard["data"]["jobStatus"].as_array().unwrap().len(), 5);
}
