pub mod attestation;
pub mod config;
pub mod orchestrator;
pub mod outgoing;
pub mod valset;
