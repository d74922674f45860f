//! Infrastructure layer - Stateful services, storage adapters and observability

pub mod logging;
pub mod observability;
pub mod services;
pub mod storage;
