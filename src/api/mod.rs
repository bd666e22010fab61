pub mod client;
pub mod offline;
pub mod snapshot;
