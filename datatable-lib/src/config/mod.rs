//! Declarative table, column and timing configuration

mod column;
mod table;
mod timing;

pub use column::*;
pub use table::*;
pub use timing::*;
