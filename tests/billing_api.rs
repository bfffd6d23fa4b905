//! HTTP surface tests: resolution, statements, and import over the
//! in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use clinic_billing::billing::service::NO_RATE_CONFIGURED;
use clinic_billing::billing::{
    billing_router, Appointment, Assignment, BillingMonth, BillingService, ClientCharge, Contract,
    ContractTherapist, ContractType, MemoryStore, OrganizationId, RateCondition, ScheduleWindows,
    TherapistPay, TracingAuditSink,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(BillingService::new(
        store.clone(),
        Arc::new(TracingAuditSink),
        ScheduleWindows::default(),
    ));
    (store, billing_router(service))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

fn seeded_assignment() -> Assignment {
    Assignment {
        id: None,
        organization_id: OrganizationId("org-1".to_string()),
        client_id: None,
        client_name: "Ana Torres".to_string(),
        therapist_id: None,
        therapist_name: "Luis Vega".to_string(),
        secondary_therapist_name: None,
        secondary_therapist_pay: None,
        client_price: 350.0,
        therapist_pay: 200.0,
        condition: RateCondition::Always,
        active: true,
    }
}

fn seeded_contract() -> Contract {
    Contract {
        id: "ctr-1".to_string(),
        organization_id: OrganizationId("org-1".to_string()),
        client_id: None,
        client_name: "Ana Torres".to_string(),
        contract_type: ContractType::Hybrid,
        client_charge: ClientCharge::Monthly { amount: 24000.0 },
        base_monthly_amount: None,
        therapists: vec![ContractTherapist {
            id: None,
            name: "Luis Vega".to_string(),
            pay: TherapistPay::Hourly { rate: 100.0 },
        }],
        estimated_monthly_hours: 120.0,
        receipt_description: None,
        service_label: "Home therapy".to_string(),
        active: true,
    }
}

#[tokio::test]
async fn resolve_returns_the_matching_assignment() {
    let (store, app) = app();
    store.seed_assignment(seeded_assignment());

    let request = post(
        "/api/v1/billing/assignments/resolve",
        json!({
            "organization_id": "org-1",
            "client_name": "Ana Torres",
            "therapist_name": "Luis Vega"
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["client_price"], json!(350.0));
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn resolve_miss_is_a_named_404() {
    let (_store, app) = app();

    let request = post(
        "/api/v1/billing/assignments/resolve",
        json!({
            "organization_id": "org-1",
            "client_name": "Nobody",
            "therapist_name": "No One"
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], json!(NO_RATE_CONFIGURED));
}

#[tokio::test]
async fn resolve_without_tenant_context_misses_instead_of_failing() {
    let (store, app) = app();
    store.seed_assignment(seeded_assignment());

    let request = post(
        "/api/v1/billing/assignments/resolve",
        json!({
            "client_name": "Ana Torres",
            "therapist_name": "Luis Vega"
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn statement_settles_the_month_and_prices_the_receipt() {
    let (store, app) = app();
    store.seed_contract(seeded_contract());
    let month = BillingMonth {
        year: 2026,
        month: 3,
    };
    store.seed_appointments(
        "ctr-1",
        month,
        vec![
            Appointment {
                therapist_id: None,
                therapist_name: Some("Luis Vega".to_string()),
                duration_hours: 5.0,
            },
            Appointment {
                therapist_id: None,
                therapist_name: Some("Luis Vega".to_string()),
                duration_hours: 3.0,
            },
        ],
    );

    let request = post(
        "/api/v1/billing/statements",
        json!({
            "organization_id": "org-1",
            "client_name": "Ana Torres",
            "therapist_name": "Luis Vega",
            "month": { "year": 2026, "month": 3 }
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["contract_id"], json!("ctr-1"));
    assert_eq!(body["settlement"]["hours_worked"], json!(8.0));
    assert_eq!(body["settlement"]["therapist_pay"], json!(800.0));
    assert_eq!(body["settlement"]["profit"], json!(23200.0));
    assert_eq!(body["receipt_line"]["subtotal"], json!(24000.0));
    assert_eq!(body["receipt_line"]["unit_price"], json!(3000.0));
}

#[tokio::test]
async fn import_endpoint_returns_the_batch_tally() {
    let (_store, app) = app();

    let csv = "Cliente,Terapeuta,Precio,Pago,Horario\n\
Ana Torres,Luis Vega,350,200,fija\n\
,Luis Vega,350,200,fija\n";
    let request = post(
        "/api/v1/billing/imports/assignments",
        json!({
            "organization_id": "org-1",
            "csv": csv
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["succeeded"], json!(1));
    assert_eq!(body["failed"], json!(1));
    assert_eq!(body["errors"][0]["row"], json!(2));
}

#[tokio::test]
async fn import_without_a_tenant_is_rejected() {
    let (_store, app) = app();

    let request = post(
        "/api/v1/billing/imports/assignments",
        json!({
            "organization_id": "   ",
            "csv": "Cliente,Terapeuta\nAna,Luis\n"
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn contract_resolution_matches_roster_names_loosely() {
    let (store, app) = app();
    let mut contract = seeded_contract();
    contract.therapists[0].name = "Luis Vega Montes".to_string();
    store.seed_contract(contract);

    let request = post(
        "/api/v1/billing/contracts/resolve",
        json!({
            "organization_id": "org-1",
            "client_name": "Ana Torres",
            "therapist_name": "luis vega"
        }),
    );
    let response = app.oneshot(request).await.expect("handler runs");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], json!("ctr-1"));
}
