pub mod msg;
pub mod query;

pub use msg::{GravityMsg, GravitySudoMsg};
pub use query::{BondStatus, GravityQuerier, GravityQuery, ValidatorInfo};
