use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

use super::domain::{Appointment, Assignment, BillingMonth, Contract, OrganizationId};

/// The external document store, reduced to the tenant-scoped queries and
/// writes the billing core needs. Every call is scoped by organization;
/// there is no unscoped access path.
pub trait BillingStore: Send + Sync {
    fn assignments_for_client(
        &self,
        organization_id: &OrganizationId,
        client_name: &str,
    ) -> Result<Vec<Assignment>, StoreError>;

    fn contracts_for_client(
        &self,
        organization_id: &OrganizationId,
        client_name: &str,
    ) -> Result<Vec<Contract>, StoreError>;

    fn appointments_for_month(
        &self,
        organization_id: &OrganizationId,
        contract_id: &str,
        month: BillingMonth,
    ) -> Result<Vec<Appointment>, StoreError>;

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, StoreError>;
}

/// Hard store failures. These propagate to the caller untouched; only the
/// documented soft-fail business rules are handled inside the core.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record conflict")]
    Conflict,
    #[error("permission denied")]
    PermissionDenied,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Post-commit audit event. Published after the primary write lands, never
/// inline with it.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub entity_type: &'static str,
    pub entity_id: String,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    pub actor: String,
    pub organization_id: OrganizationId,
}

/// Outbound audit hook. Failures must never abort the caller's primary
/// write; the service logs and moves on.
pub trait AuditSink: Send + Sync {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}

/// Audit sink that emits events to the tracing pipeline. Good enough for the
/// CLI demo wiring; production deployments plug in the platform's audit-log
/// writer instead.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn publish(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            target: "audit",
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            action = event.action,
            organization = %event.organization_id.0,
            actor = %event.actor,
            "audit event"
        );
        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    assignments: Vec<Assignment>,
    contracts: Vec<Contract>,
    appointments: HashMap<(String, BillingMonth), Vec<Appointment>>,
    next_id: u64,
}

/// Seedable in-memory store backing the CLI demo and the test suites. Not a
/// persistence layer; last write wins, like the hosted store it stands in
/// for.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_assignment(&self, assignment: Assignment) {
        if let Ok(mut state) = self.state.lock() {
            let mut assignment = assignment;
            if assignment.id.is_none() {
                state.next_id += 1;
                assignment.id = Some(format!("asg-{:06}", state.next_id));
            }
            state.assignments.push(assignment);
        }
    }

    pub fn seed_contract(&self, contract: Contract) {
        if let Ok(mut state) = self.state.lock() {
            state.contracts.push(contract);
        }
    }

    pub fn seed_appointments(
        &self,
        contract_id: &str,
        month: BillingMonth,
        appointments: Vec<Appointment>,
    ) {
        if let Ok(mut state) = self.state.lock() {
            state
                .appointments
                .insert((contract_id.to_string(), month), appointments);
        }
    }
}

impl BillingStore for MemoryStore {
    fn assignments_for_client(
        &self,
        organization_id: &OrganizationId,
        client_name: &str,
    ) -> Result<Vec<Assignment>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| {
                &assignment.organization_id == organization_id
                    && assignment.client_name == client_name
            })
            .cloned()
            .collect())
    }

    fn contracts_for_client(
        &self,
        organization_id: &OrganizationId,
        client_name: &str,
    ) -> Result<Vec<Contract>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(state
            .contracts
            .iter()
            .filter(|contract| {
                &contract.organization_id == organization_id
                    && contract.client_name == client_name
            })
            .cloned()
            .collect())
    }

    fn appointments_for_month(
        &self,
        _organization_id: &OrganizationId,
        contract_id: &str,
        month: BillingMonth,
    ) -> Result<Vec<Appointment>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(state
            .appointments
            .get(&(contract_id.to_string(), month))
            .cloned()
            .unwrap_or_default())
    }

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let mut assignment = assignment;
        if assignment.id.is_none() {
            state.next_id += 1;
            assignment.id = Some(format!("asg-{:06}", state.next_id));
        }
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }
}
