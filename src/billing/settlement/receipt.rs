use super::super::domain::{ClientCharge, Contract, ContractType, ReceiptLine};

/// Build the receipt line item for a contract given the hours worked that
/// month.
///
/// Itemized contracts bill the hourly total on the receipt; their flat
/// `base_monthly_amount` only feeds the insurer-facing summary and never
/// appears here. The other three categories bill the flat monthly amount.
pub fn build_line(contract: &Contract, hours_worked: f64) -> ReceiptLine {
    let subtotal = match (contract.contract_type, contract.client_charge) {
        (ContractType::Itemized, ClientCharge::Hourly { rate }) => hours_worked * rate,
        // Charge-kind mismatches degrade to whatever kind the record
        // actually carries instead of failing the receipt.
        (ContractType::Itemized, ClientCharge::Monthly { amount }) => amount,
        (_, ClientCharge::Monthly { amount }) => amount,
        (_, ClientCharge::Hourly { rate }) => hours_worked * rate,
    };

    let description = match &contract.receipt_description {
        Some(text) => text.clone(),
        None => match contract.contract_type {
            ContractType::Itemized => contract.service_label.clone(),
            _ => format!("{} - {} hrs", contract.service_label, hours_worked),
        },
    };

    // Guarded so a zero-hour month never produces NaN or infinity.
    let unit_price = if hours_worked > 0.0 {
        subtotal / hours_worked
    } else {
        0.0
    };

    ReceiptLine {
        contract_id: contract.id.clone(),
        contract_type: contract.contract_type,
        description,
        quantity: hours_worked,
        unit_price,
        subtotal,
    }
}
