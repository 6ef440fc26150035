//! API exposure modules
//!
//! Each exposure consumes a `SalesService` and produces a Router for its
//! protocol.

pub mod rest;

pub use rest::RestExposure;
