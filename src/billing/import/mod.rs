mod mapping;
mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use chrono::Weekday;
use serde::Serialize;

use super::domain::{Assignment, OrganizationId, RateCondition};

pub use mapping::ScheduleTag;
pub use parser::RawAssignmentRow;

/// Time-of-day bounds applied when a row's schedule tag selects a window.
/// The tag itself never carries bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindows {
    pub morning: (u8, u8),
    pub afternoon: (u8, u8),
}

impl Default for ScheduleWindows {
    fn default() -> Self {
        Self {
            morning: (8, 13),
            afternoon: (13, 20),
        }
    }
}

/// Per-row import error kept in the batch tally.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRowError {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub reason: String,
}

/// Batch tally: rows are independent, so failures accumulate here instead of
/// aborting the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportOutcome {
    pub fn success(&mut self) {
        self.succeeded += 1;
    }

    pub fn failure(&mut self, row: usize, reason: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ImportRowError {
            row,
            reason: reason.into(),
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read assignment export: {0}")]
    Io(#[from] std::io::Error),
}

/// A normalized assignment still tied to its 1-based source row, so
/// persistence failures can be reported against the original spreadsheet
/// line.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub row: usize,
    pub assignment: Assignment,
}

/// Normalize one raw row into an assignment record.
///
/// Pure and deterministic: no timestamps, no generated ids, so re-running an
/// import over the same rows yields structurally identical records. The
/// store assigns ids on first write.
pub fn normalize_row(
    row: &RawAssignmentRow,
    windows: &ScheduleWindows,
    organization_id: &OrganizationId,
) -> Assignment {
    let tag = row.schedule_type.as_deref().and_then(mapping::tag_for);

    Assignment {
        id: None,
        organization_id: organization_id.clone(),
        client_id: row.client_id.clone(),
        client_name: normalizer::clean_name(&row.client_name),
        therapist_id: row.therapist_id.clone(),
        therapist_name: normalizer::clean_name(&row.therapist_name),
        secondary_therapist_name: row
            .secondary_therapist_name
            .as_deref()
            .map(normalizer::clean_name),
        secondary_therapist_pay: row
            .secondary_therapist_pay
            .as_deref()
            .map(|raw| normalizer::parse_amount(Some(raw))),
        client_price: normalizer::parse_amount(row.client_price.as_deref()),
        therapist_pay: normalizer::parse_amount(row.therapist_pay.as_deref()),
        condition: condition_for_tag(tag, windows),
        active: true,
    }
}

/// Map a schedule tag to the condition kind. Unrecognized or absent tags
/// default to an unconditioned rate.
pub fn condition_for_tag(tag: Option<ScheduleTag>, windows: &ScheduleWindows) -> RateCondition {
    match tag {
        None | Some(ScheduleTag::Fixed) => RateCondition::Always,
        Some(ScheduleTag::Morning) => RateCondition::TimeWindow {
            start_hour: windows.morning.0,
            end_hour: windows.morning.1,
        },
        Some(ScheduleTag::Afternoon) => RateCondition::TimeWindow {
            start_hour: windows.afternoon.0,
            end_hour: windows.afternoon.1,
        },
        Some(ScheduleTag::Saturday) => RateCondition::DayOfWeek { day: Weekday::Sat },
    }
}

/// Bulk loader turning spreadsheet exports into normalized assignments.
pub struct AssignmentImporter;

impl AssignmentImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        windows: &ScheduleWindows,
        organization_id: &OrganizationId,
    ) -> Result<(Vec<NormalizedRow>, ImportOutcome), ImportError> {
        let file = std::fs::File::open(path)?;
        Ok(Self::from_reader(file, windows, organization_id))
    }

    /// Parse and normalize every row. csv-level row failures and rows with
    /// no usable names land in the tally; valid rows come back ready to
    /// persist. Successes are recorded by the caller once each write lands.
    pub fn from_reader<R: Read>(
        reader: R,
        windows: &ScheduleWindows,
        organization_id: &OrganizationId,
    ) -> (Vec<NormalizedRow>, ImportOutcome) {
        let mut outcome = ImportOutcome::default();
        let mut rows = Vec::new();

        for (index, row) in parser::read_rows(reader).into_iter().enumerate() {
            let row_number = index + 1;
            match row {
                Ok(raw) => {
                    let assignment = normalize_row(&raw, windows, organization_id);
                    if assignment.client_name.is_empty() || assignment.therapist_name.is_empty() {
                        outcome.failure(row_number, "missing client or therapist name");
                        continue;
                    }
                    rows.push(NormalizedRow {
                        row: row_number,
                        assignment,
                    });
                }
                Err(err) => outcome.failure(row_number, err.to_string()),
            }
        }

        (rows, outcome)
    }
}
