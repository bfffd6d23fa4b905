use tracing::warn;

use super::super::domain::{Contract, OrganizationId};

/// Lookup parameters for a monthly contract covering a client/therapist pair.
#[derive(Debug, Clone)]
pub struct ContractQuery<'a> {
    pub organization_id: Option<&'a OrganizationId>,
    pub client_name: &'a str,
    pub therapist_name: &'a str,
    pub client_id: Option<&'a str>,
    pub therapist_id: Option<&'a str>,
}

/// Find the contract whose roster covers the queried therapist.
///
/// Roster names and scheduling names are entered independently and may
/// include or omit middle names, so matching is permissive:
/// id equality when both sides carry ids, otherwise case-insensitive
/// either-direction containment. First match wins.
pub fn resolve_contract<'a>(
    contracts: &'a [Contract],
    query: &ContractQuery<'_>,
) -> Option<&'a Contract> {
    let Some(organization_id) = query.organization_id else {
        warn!(
            client = query.client_name,
            "contract lookup without tenant context, returning no contract"
        );
        return None;
    };

    contracts
        .iter()
        .filter(|contract| contract.active && &contract.organization_id == organization_id)
        .filter(|contract| covers_client(contract, query))
        .find(|contract| {
            contract
                .therapists
                .iter()
                .any(|therapist| therapist.matches(query.therapist_id, Some(query.therapist_name)))
        })
}

fn covers_client(contract: &Contract, query: &ContractQuery<'_>) -> bool {
    match (contract.client_id.as_deref(), query.client_id) {
        (Some(own), Some(queried)) => own == queried,
        _ => contract.client_name == query.client_name,
    }
}
