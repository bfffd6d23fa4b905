use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Tenant isolation key. Every query and record in the billing core is scoped
/// by this; resolution without it soft-fails instead of crossing tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

/// Condition restricting when a negotiated per-visit rate applies.
///
/// Hour granularity only: minutes on the appointment clock are discarded
/// before matching, an accepted precision loss carried over from the
/// original rate book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RateCondition {
    Always,
    TimeWindow { start_hour: u8, end_hour: u8 },
    DayOfWeek { day: Weekday },
}

impl RateCondition {
    /// Half-open interval test on the hour component.
    pub fn covers_hour(&self, hour: u32) -> bool {
        match self {
            RateCondition::Always => true,
            RateCondition::TimeWindow {
                start_hour,
                end_hour,
            } => u32::from(*start_hour) <= hour && hour < u32::from(*end_hour),
            RateCondition::DayOfWeek { .. } => false,
        }
    }
}

/// A negotiated per-visit rate for one (client, therapist) pair.
///
/// Several active assignments may exist for the same pair, distinguished only
/// by `condition`; the resolver picks exactly one for a given appointment
/// time. Rows are soft-deleted via `active`, never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned by the document store on first write; `None` for rows that
    /// have only been normalized, not yet persisted.
    pub id: Option<String>,
    pub organization_id: OrganizationId,
    pub client_id: Option<String>,
    pub client_name: String,
    pub therapist_id: Option<String>,
    pub therapist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_therapist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_therapist_pay: Option<f64>,
    /// Amount per hour charged to the client.
    pub client_price: f64,
    /// Amount per hour paid to the primary therapist.
    pub therapist_pay: f64,
    pub condition: RateCondition,
    pub active: bool,
}

/// The four billing-structure variants a monthly contract can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractType {
    /// Client charge and therapist pay are both flat monthly amounts.
    FixedMonthly,
    /// Flat monthly client charge, hourly therapist pay.
    Hybrid,
    /// Flat monthly charge for a bundle of hours, hourly therapist pay.
    Package,
    /// Hourly on both sides; the invoice additionally carries a flat
    /// insurer-facing base amount before deductions.
    Itemized,
}

impl ContractType {
    pub const fn label(self) -> &'static str {
        match self {
            ContractType::FixedMonthly => "fixed_monthly",
            ContractType::Hybrid => "hybrid",
            ContractType::Package => "package",
            ContractType::Itemized => "itemized",
        }
    }
}

/// How the client side of a contract is billed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClientCharge {
    Monthly { amount: f64 },
    Hourly { rate: f64 },
}

/// How a therapist on a contract is paid. Each roster entry carries its own
/// structure; a single contract can mix flat-monthly and hourly therapists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TherapistPay {
    Monthly { amount: f64 },
    Hourly { rate: f64 },
}

/// One therapist on a contract roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTherapist {
    pub id: Option<String>,
    pub name: String,
    pub pay: TherapistPay,
}

impl ContractTherapist {
    /// Whether this roster entry covers the queried therapist. Id equality
    /// wins when both sides carry ids; otherwise names are compared with
    /// case-insensitive either-direction containment, accepting the risk of
    /// false positives on near-duplicate names.
    pub fn matches(&self, therapist_id: Option<&str>, therapist_name: Option<&str>) -> bool {
        if let (Some(own), Some(queried)) = (self.id.as_deref(), therapist_id) {
            return own == queried;
        }

        let Some(queried) = therapist_name else {
            return false;
        };
        let own = self.name.trim().to_lowercase();
        let queried = queried.trim().to_lowercase();
        if own.is_empty() || queried.is_empty() {
            return false;
        }
        own.contains(&queried) || queried.contains(&own)
    }
}

/// A fixed monthly billing arrangement for a client, covering one or more
/// therapists with independent pay structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub organization_id: OrganizationId,
    pub client_id: Option<String>,
    pub client_name: String,
    pub contract_type: ContractType,
    pub client_charge: ClientCharge,
    /// Pre-deduction flat figure quoted to the insurer. Itemized contracts
    /// only; never used for the receipt line itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_monthly_amount: Option<f64>,
    pub therapists: Vec<ContractTherapist>,
    /// Planning figure used to allocate hours across hourly-paid therapists
    /// when no per-therapist attendance breakdown exists.
    pub estimated_monthly_hours: f64,
    /// Free-text label merged into generated receipts in place of the
    /// default description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_description: Option<String>,
    pub service_label: String,
    pub active: bool,
}

/// Realized visit snapshot for a month, consumed by the settlement
/// calculator. Owned by the scheduling subsystem, not the billing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub therapist_id: Option<String>,
    pub therapist_name: Option<String>,
    pub duration_hours: f64,
}

/// Calendar month a settlement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u32,
}

/// What a therapist payout was computed from, so callers can tell a
/// measured figure from a planning approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PayBasis {
    FlatMonthly,
    MeasuredHours { hours: f64 },
    AllocatedHours { hours: f64 },
}

/// Per-therapist share of a settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapistPayout {
    pub therapist_name: String,
    pub amount: f64,
    pub basis: PayBasis,
}

/// Computed hours/charge/pay/profit for one contract over one month.
/// `profit` may be negative; it is surfaced as-is, never clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub hours_worked: f64,
    pub client_charge: f64,
    pub therapist_pay: f64,
    pub per_therapist: Vec<TherapistPayout>,
    pub profit: f64,
}

/// Descriptive priced row merged into a client's periodic invoice.
/// `contract_id`/`contract_type` let downstream receipt assembly group
/// contract-derived lines apart from per-visit lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub contract_id: String,
    pub contract_type: ContractType,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub subtotal: f64,
}
