//! Error types

mod config;
mod edit;
mod field;
mod sort;
mod source;
mod table;

pub use config::*;
pub use edit::*;
pub use field::*;
pub use sort::*;
pub use source::*;
pub use table::*;
