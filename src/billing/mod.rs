pub mod domain;
pub mod import;
pub mod repository;
pub mod resolution;
pub mod router;
pub mod service;
pub mod settlement;

pub use domain::{
    Appointment, Assignment, BillingMonth, ClientCharge, Contract, ContractTherapist,
    ContractType, OrganizationId, PayBasis, RateCondition, ReceiptLine, Settlement, TherapistPay,
    TherapistPayout,
};
pub use import::{AssignmentImporter, ImportOutcome, ScheduleWindows};
pub use repository::{
    AuditEvent, AuditSink, BillingStore, MemoryStore, StoreError, TracingAuditSink,
};
pub use router::billing_router;
pub use service::{
    BillingService, BillingServiceError, ContractLookup, RateLookup, SettlementStatement,
    StatementRequest,
};
