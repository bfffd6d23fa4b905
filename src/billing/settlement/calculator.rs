use std::collections::HashMap;

use super::super::domain::{
    Appointment, ClientCharge, Contract, PayBasis, Settlement, TherapistPay, TherapistPayout,
};

/// Compute the monthly settlement for a contract from the realized
/// appointments of that month.
///
/// A malformed contract with an empty roster does not fail: therapist pay is
/// zero and profit equals the client charge, which is what a receipt built
/// from it should show.
pub fn settle(contract: &Contract, appointments: &[Appointment]) -> Settlement {
    let hours_worked: f64 = appointments
        .iter()
        .map(|appointment| appointment.duration_hours.max(0.0))
        .sum();

    let client_charge = match contract.client_charge {
        // Fixed contracts bill the flat amount regardless of attendance.
        ClientCharge::Monthly { amount } => amount,
        ClientCharge::Hourly { rate } => hours_worked * rate,
    };

    let measured = measured_hours_by_roster(contract, appointments);
    let roster_size = contract.therapists.len();

    let per_therapist: Vec<TherapistPayout> = contract
        .therapists
        .iter()
        .enumerate()
        .map(|(slot, therapist)| {
            let (amount, basis) = match therapist.pay {
                TherapistPay::Monthly { amount } => (amount, PayBasis::FlatMonthly),
                TherapistPay::Hourly { rate } => {
                    if roster_size == 1 {
                        (
                            hours_worked * rate,
                            PayBasis::MeasuredHours {
                                hours: hours_worked,
                            },
                        )
                    } else if let Some(by_slot) = &measured {
                        let hours = by_slot.get(&slot).copied().unwrap_or(0.0);
                        (hours * rate, PayBasis::MeasuredHours { hours })
                    } else {
                        // Planning approximation: without a per-therapist
                        // attendance breakdown the estimated monthly hours
                        // are split equally across the roster.
                        let hours = contract.estimated_monthly_hours / roster_size as f64;
                        (hours * rate, PayBasis::AllocatedHours { hours })
                    }
                }
            };
            TherapistPayout {
                therapist_name: therapist.name.clone(),
                amount,
                basis,
            }
        })
        .collect();

    let therapist_pay: f64 = per_therapist.iter().map(|payout| payout.amount).sum();

    Settlement {
        hours_worked,
        client_charge,
        therapist_pay,
        per_therapist,
        profit: client_charge - therapist_pay,
    }
}

/// Per-roster-slot measured hours, available only when every appointment in
/// the month can be attributed to a roster therapist. Partial attribution is
/// treated as no attribution so a settlement never mixes measured and
/// guessed figures.
fn measured_hours_by_roster(
    contract: &Contract,
    appointments: &[Appointment],
) -> Option<HashMap<usize, f64>> {
    if appointments.is_empty() {
        return None;
    }

    let mut by_slot: HashMap<usize, f64> = HashMap::new();
    for appointment in appointments {
        let slot = contract.therapists.iter().position(|therapist| {
            therapist.matches(
                appointment.therapist_id.as_deref(),
                appointment.therapist_name.as_deref(),
            )
        })?;
        *by_slot.entry(slot).or_insert(0.0) += appointment.duration_hours.max(0.0);
    }

    Some(by_slot)
}
