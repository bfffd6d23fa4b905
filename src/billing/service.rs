use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    Assignment, BillingMonth, Contract, OrganizationId, ReceiptLine, Settlement,
};
use super::import::{AssignmentImporter, ImportOutcome, ScheduleWindows};
use super::repository::{AuditEvent, AuditSink, BillingStore, StoreError};
use super::resolution::{resolve_assignment, resolve_contract, ContractQuery, RateQuery};
use super::settlement::{build_line, settle};

/// Operator-facing message for a resolution miss, surfaced instead of a
/// generic error so the missing record can be created.
pub const NO_RATE_CONFIGURED: &str =
    "no applicable rate configured for this client/therapist";

/// Rate lookup as received from callers (receipt generator, scheduling UI).
/// `organization_id` is optional on purpose: missing tenant context resolves
/// to "no rate" rather than failing a billing run.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLookup {
    #[serde(default)]
    pub organization_id: Option<String>,
    pub client_name: String,
    pub therapist_name: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub therapist_id: Option<String>,
    #[serde(default)]
    pub at: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractLookup {
    #[serde(default)]
    pub organization_id: Option<String>,
    pub client_name: String,
    pub therapist_name: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub therapist_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementRequest {
    #[serde(flatten)]
    pub lookup: ContractLookup,
    pub month: BillingMonth,
}

/// Everything a receipt generator needs from one contract month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementStatement {
    pub contract_id: String,
    pub settlement: Settlement,
    pub receipt_line: ReceiptLine,
}

/// Error raised by the billing service. Hard store failures pass through;
/// business-rule misses are `Ok(None)`, never errors.
#[derive(Debug, thiserror::Error)]
pub enum BillingServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Facade composing the document store, the audit sink, and the pure
/// resolution/settlement core.
pub struct BillingService<S, A> {
    store: Arc<S>,
    audit: Arc<A>,
    windows: ScheduleWindows,
}

impl<S, A> BillingService<S, A>
where
    S: BillingStore + 'static,
    A: AuditSink + 'static,
{
    pub fn new(store: Arc<S>, audit: Arc<A>, windows: ScheduleWindows) -> Self {
        Self {
            store,
            audit,
            windows,
        }
    }

    /// Select the applicable per-visit rate for a client/therapist pair at
    /// an optional appointment time.
    pub fn resolve_assignment(
        &self,
        lookup: &RateLookup,
    ) -> Result<Option<Assignment>, BillingServiceError> {
        let Some(organization_id) = tenant(&lookup.organization_id) else {
            warn!(
                client = %lookup.client_name,
                "assignment resolution without tenant context"
            );
            return Ok(None);
        };

        let book = self
            .store
            .assignments_for_client(&organization_id, &lookup.client_name)?;

        let query = RateQuery {
            organization_id: Some(&organization_id),
            client_name: &lookup.client_name,
            therapist_name: &lookup.therapist_name,
            client_id: lookup.client_id.as_deref(),
            therapist_id: lookup.therapist_id.as_deref(),
            at: lookup.at,
        };

        Ok(resolve_assignment(&book, &query).cloned())
    }

    /// Find the monthly contract covering a client/therapist pair.
    pub fn resolve_contract(
        &self,
        lookup: &ContractLookup,
    ) -> Result<Option<Contract>, BillingServiceError> {
        let Some(organization_id) = tenant(&lookup.organization_id) else {
            warn!(
                client = %lookup.client_name,
                "contract resolution without tenant context"
            );
            return Ok(None);
        };

        let contracts = self
            .store
            .contracts_for_client(&organization_id, &lookup.client_name)?;

        let query = ContractQuery {
            organization_id: Some(&organization_id),
            client_name: &lookup.client_name,
            therapist_name: &lookup.therapist_name,
            client_id: lookup.client_id.as_deref(),
            therapist_id: lookup.therapist_id.as_deref(),
        };

        Ok(resolve_contract(&contracts, &query).cloned())
    }

    /// Resolve the contract, settle the month's appointments against it, and
    /// derive the receipt line.
    pub fn monthly_statement(
        &self,
        request: &StatementRequest,
    ) -> Result<Option<SettlementStatement>, BillingServiceError> {
        let Some(contract) = self.resolve_contract(&request.lookup)? else {
            return Ok(None);
        };

        let appointments = self.store.appointments_for_month(
            &contract.organization_id,
            &contract.id,
            request.month,
        )?;

        let settlement = settle(&contract, &appointments);
        let receipt_line = build_line(&contract, settlement.hours_worked);

        Ok(Some(SettlementStatement {
            contract_id: contract.id,
            settlement,
            receipt_line,
        }))
    }

    /// Bulk-import assignment rows. Rows are independent: parse failures,
    /// unusable rows, and per-row persistence failures all land in the tally
    /// without aborting the batch. Each persisted record publishes a
    /// post-commit audit event; audit failures are logged and swallowed.
    pub fn import_assignments<R: Read>(
        &self,
        reader: R,
        organization_id: &OrganizationId,
        actor: &str,
    ) -> Result<ImportOutcome, BillingServiceError> {
        let (rows, mut outcome) =
            AssignmentImporter::from_reader(reader, &self.windows, organization_id);

        for normalized in rows {
            match self.store.insert_assignment(normalized.assignment) {
                Ok(stored) => {
                    outcome.success();
                    self.publish_audit(AuditEvent {
                        entity_type: "assignment",
                        entity_id: stored.id.clone().unwrap_or_default(),
                        action: "import",
                        before: None,
                        after: serde_json::to_value(&stored).ok(),
                        actor: actor.to_string(),
                        organization_id: organization_id.clone(),
                    });
                }
                Err(err) => outcome.failure(normalized.row, err.to_string()),
            }
        }

        Ok(outcome)
    }

    fn publish_audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.publish(event) {
            warn!(error = %err, "audit publish failed; continuing");
        }
    }
}

fn tenant(raw: &Option<String>) -> Option<OrganizationId> {
    raw.as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| OrganizationId(value.to_string()))
}
