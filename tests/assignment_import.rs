//! Service-level import behavior: per-row independence across parse,
//! persistence, and audit failures.

use std::io::Cursor;
use std::sync::Arc;

use clinic_billing::billing::repository::{AuditError, AuditEvent, AuditSink};
use clinic_billing::billing::{
    Appointment, Assignment, BillingMonth, BillingService, BillingStore, Contract, MemoryStore,
    OrganizationId, RateLookup, ScheduleWindows, StoreError, TracingAuditSink,
};

fn org() -> OrganizationId {
    OrganizationId("org-1".to_string())
}

fn lookup(client: &str, therapist: &str) -> RateLookup {
    RateLookup {
        organization_id: Some("org-1".to_string()),
        client_name: client.to_string(),
        therapist_name: therapist.to_string(),
        client_id: None,
        therapist_id: None,
        at: None,
    }
}

const EXPORT: &str = "Cliente,Terapeuta,Precio,Pago,Horario\n\
Ana Torres,Luis Vega,350,200,fija\n\
,Luis Vega,350,200,fija\n\
Marta Ruiz,Elena Paz,400,250,tarde\n";

#[test]
fn imported_rows_are_persisted_and_resolvable() {
    let store = Arc::new(MemoryStore::new());
    let service = BillingService::new(
        store.clone(),
        Arc::new(TracingAuditSink),
        ScheduleWindows::default(),
    );

    let outcome = service
        .import_assignments(Cursor::new(EXPORT), &org(), "tester")
        .expect("import runs");

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors[0].row, 2);

    let resolved = service
        .resolve_assignment(&lookup("Ana Torres", "Luis Vega"))
        .expect("store reachable")
        .expect("rate found");
    assert!(resolved.id.is_some());
    assert_eq!(resolved.client_price, 350.0);
}

/// Store that rejects writes for one client, standing in for a per-document
/// permission failure in the hosted store.
struct RejectingStore {
    inner: MemoryStore,
    rejected_client: String,
}

impl BillingStore for RejectingStore {
    fn assignments_for_client(
        &self,
        organization_id: &OrganizationId,
        client_name: &str,
    ) -> Result<Vec<Assignment>, StoreError> {
        self.inner.assignments_for_client(organization_id, client_name)
    }

    fn contracts_for_client(
        &self,
        organization_id: &OrganizationId,
        client_name: &str,
    ) -> Result<Vec<Contract>, StoreError> {
        self.inner.contracts_for_client(organization_id, client_name)
    }

    fn appointments_for_month(
        &self,
        organization_id: &OrganizationId,
        contract_id: &str,
        month: BillingMonth,
    ) -> Result<Vec<Appointment>, StoreError> {
        self.inner
            .appointments_for_month(organization_id, contract_id, month)
    }

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, StoreError> {
        if assignment.client_name == self.rejected_client {
            return Err(StoreError::PermissionDenied);
        }
        self.inner.insert_assignment(assignment)
    }
}

#[test]
fn persistence_failures_are_tallied_against_the_source_row() {
    let store = Arc::new(RejectingStore {
        inner: MemoryStore::new(),
        rejected_client: "Marta Ruiz".to_string(),
    });
    let service = BillingService::new(
        store,
        Arc::new(TracingAuditSink),
        ScheduleWindows::default(),
    );

    let outcome = service
        .import_assignments(Cursor::new(EXPORT), &org(), "tester")
        .expect("import runs");

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 2);
    // Row numbers refer to the spreadsheet, not the post-filter index.
    let rows: Vec<usize> = outcome.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![2, 3]);
    assert!(outcome.errors[1].reason.contains("permission denied"));
}

struct BrokenAuditSink;

impl AuditSink for BrokenAuditSink {
    fn publish(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::Transport("sink offline".to_string()))
    }
}

#[test]
fn audit_failures_never_fail_the_import() {
    let store = Arc::new(MemoryStore::new());
    let service = BillingService::new(
        store.clone(),
        Arc::new(BrokenAuditSink),
        ScheduleWindows::default(),
    );

    let outcome = service
        .import_assignments(Cursor::new(EXPORT), &org(), "tester")
        .expect("import runs despite audit sink");

    assert_eq!(outcome.succeeded, 2);
    // The primary writes landed even though no audit event did.
    assert!(service
        .resolve_assignment(&lookup("Marta Ruiz", "Elena Paz"))
        .expect("store reachable")
        .is_some());
}
