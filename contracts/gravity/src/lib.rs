mod abci;
mod attestation;
mod claims;
mod orchestrator;
mod outgoing;
mod pruning;
mod slashing;
mod valset;

pub mod contract;
pub mod error;
pub mod keeper;
pub mod msg;
pub mod queries;
pub mod state;

#[cfg(test)]
mod multitest;
#[cfg(test)]
mod test_utils;
