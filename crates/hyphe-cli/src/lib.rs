/*
[INPUT]:  Config module and command handlers
[OUTPUT]: Library surface shared by the binary and its tests
[POS]:    Crate root - module wiring
[UPDATE]: When adding new modules
*/

pub mod commands;
pub mod config;

pub use commands::{OrderRequest, book_snapshot, place_order, prices};
pub use config::CliConfig;
