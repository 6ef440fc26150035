//! Server module: service state, builder and HTTP exposure

pub mod builder;
pub mod exposure;
pub mod host;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::SalesService;
