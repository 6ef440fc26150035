//! Data sources: the local CSV snapshot and the remote store

pub mod csv_loader;
pub mod remote;
pub mod table;

#[cfg(feature = "remote")]
pub use remote::PostgrestClient;
pub use remote::{CountStrategy, RemoteOptions, RemoteSource, RemoteStore, SelectRequest};
pub use table::TableSource;
