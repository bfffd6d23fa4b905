mod assignment;
mod contract;

pub use assignment::{resolve_assignment, RateQuery};
pub use contract::{resolve_contract, ContractQuery};
