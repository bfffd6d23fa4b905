use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::warn;

use super::super::domain::{Assignment, OrganizationId, RateCondition};

/// Lookup parameters for a per-visit rate. Ids are preferred for matching
/// when both the query and the stored row carry them; the production data
/// model still falls back to exact name equality otherwise.
#[derive(Debug, Clone)]
pub struct RateQuery<'a> {
    pub organization_id: Option<&'a OrganizationId>,
    pub client_name: &'a str,
    pub therapist_name: &'a str,
    pub client_id: Option<&'a str>,
    pub therapist_id: Option<&'a str>,
    pub at: Option<NaiveDateTime>,
}

/// Select the single applicable assignment from the rate book.
///
/// Clients frequently carry a morning/afternoon/Saturday rate split, so
/// selection is layered: conditioned match first, then any unconditioned
/// rate, then the first candidate as a last resort. That guarantees a rate
/// is found whenever any active assignment exists for the pair.
pub fn resolve_assignment<'a>(
    book: &'a [Assignment],
    query: &RateQuery<'_>,
) -> Option<&'a Assignment> {
    let Some(organization_id) = query.organization_id else {
        warn!(
            client = query.client_name,
            therapist = query.therapist_name,
            "rate lookup without tenant context, returning no rate"
        );
        return None;
    };

    let candidates: Vec<&Assignment> = book
        .iter()
        .filter(|assignment| assignment.active && &assignment.organization_id == organization_id)
        .filter(|assignment| covers_pair(assignment, query))
        .collect();

    select(&candidates, query.at)
}

fn covers_pair(assignment: &Assignment, query: &RateQuery<'_>) -> bool {
    let client_matches = match (assignment.client_id.as_deref(), query.client_id) {
        (Some(own), Some(queried)) => own == queried,
        _ => assignment.client_name == query.client_name,
    };
    let therapist_matches = match (assignment.therapist_id.as_deref(), query.therapist_id) {
        (Some(own), Some(queried)) => own == queried,
        _ => assignment.therapist_name == query.therapist_name,
    };
    client_matches && therapist_matches
}

fn select<'a>(candidates: &[&'a Assignment], at: Option<NaiveDateTime>) -> Option<&'a Assignment> {
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => {
            if let Some(at) = at {
                // The rate book only has hour granularity; minutes are
                // discarded.
                let hour = at.hour();
                let weekday = at.weekday();

                for candidate in candidates {
                    let conditioned_hit = match candidate.condition {
                        RateCondition::Always => false,
                        RateCondition::TimeWindow { .. } => candidate.condition.covers_hour(hour),
                        RateCondition::DayOfWeek { day } => day == weekday,
                    };
                    if conditioned_hit {
                        return Some(candidate);
                    }
                }
            }

            if let Some(unconditioned) = candidates
                .iter()
                .find(|candidate| matches!(candidate.condition, RateCondition::Always))
            {
                return Some(unconditioned);
            }

            // Multiple conditioned rows and none matched. Picking the first
            // keeps billing available, but overlapping active assignments are
            // a data-quality problem operators should clean up.
            warn!(
                candidates = candidates.len(),
                "no assignment condition matched; falling back to first candidate"
            );
            candidates.first().copied()
        }
    }
}
