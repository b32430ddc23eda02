//! Message name database
//!
//! Reads message declarations from DBC files so that symbolic identifiers in
//! ASC traces can be resolved.

mod dbc;
pub mod message_table;

pub use message_table::MessageTable;
