// Storage contract for the member/team model
// Implemented by the adapters in crate::infrastructure

pub mod unit_of_work;

pub use unit_of_work::{Store, StoreError, StoreResult, UnitOfWork};
