use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::OrganizationId;
use super::repository::{AuditSink, BillingStore, StoreError};
use super::service::{
    BillingService, BillingServiceError, ContractLookup, RateLookup, StatementRequest,
    NO_RATE_CONFIGURED,
};

/// HTTP surface for rate resolution, monthly statements, and bulk import.
pub fn billing_router<S, A>(service: Arc<BillingService<S, A>>) -> Router
where
    S: BillingStore + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/billing/assignments/resolve",
            post(resolve_assignment_handler::<S, A>),
        )
        .route(
            "/api/v1/billing/contracts/resolve",
            post(resolve_contract_handler::<S, A>),
        )
        .route(
            "/api/v1/billing/statements",
            post(statement_handler::<S, A>),
        )
        .route(
            "/api/v1/billing/imports/assignments",
            post(import_handler::<S, A>),
        )
        .with_state(service)
}

async fn resolve_assignment_handler<S, A>(
    State(service): State<Arc<BillingService<S, A>>>,
    axum::Json(lookup): axum::Json<RateLookup>,
) -> Response
where
    S: BillingStore + 'static,
    A: AuditSink + 'static,
{
    match service.resolve_assignment(&lookup) {
        Ok(Some(assignment)) => (StatusCode::OK, axum::Json(assignment)).into_response(),
        Ok(None) => miss_response(),
        Err(err) => store_error_response(err),
    }
}

async fn resolve_contract_handler<S, A>(
    State(service): State<Arc<BillingService<S, A>>>,
    axum::Json(lookup): axum::Json<ContractLookup>,
) -> Response
where
    S: BillingStore + 'static,
    A: AuditSink + 'static,
{
    match service.resolve_contract(&lookup) {
        Ok(Some(contract)) => (StatusCode::OK, axum::Json(contract)).into_response(),
        Ok(None) => miss_response(),
        Err(err) => store_error_response(err),
    }
}

async fn statement_handler<S, A>(
    State(service): State<Arc<BillingService<S, A>>>,
    axum::Json(request): axum::Json<StatementRequest>,
) -> Response
where
    S: BillingStore + 'static,
    A: AuditSink + 'static,
{
    match service.monthly_statement(&request) {
        Ok(Some(statement)) => (StatusCode::OK, axum::Json(statement)).into_response(),
        Ok(None) => miss_response(),
        Err(err) => store_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct ImportRequest {
    organization_id: String,
    csv: String,
    #[serde(default)]
    actor: Option<String>,
}

async fn import_handler<S, A>(
    State(service): State<Arc<BillingService<S, A>>>,
    axum::Json(request): axum::Json<ImportRequest>,
) -> Response
where
    S: BillingStore + 'static,
    A: AuditSink + 'static,
{
    let organization_id = request.organization_id.trim();
    if organization_id.is_empty() {
        let payload = json!({ "error": "organization_id is required for imports" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let organization_id = OrganizationId(organization_id.to_string());
    let actor = request.actor.as_deref().unwrap_or("import-api");
    let reader = Cursor::new(request.csv.into_bytes());

    match service.import_assignments(reader, &organization_id, actor) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => store_error_response(err),
    }
}

fn miss_response() -> Response {
    let payload = json!({ "error": NO_RATE_CONFIGURED });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn store_error_response(err: BillingServiceError) -> Response {
    let BillingServiceError::Store(store_err) = &err;
    let status = match store_err {
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::PermissionDenied => StatusCode::FORBIDDEN,
        StoreError::Unavailable(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
