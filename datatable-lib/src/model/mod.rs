//! Row data model

mod range;
mod row;
mod value;

pub use range::*;
pub use row::*;
pub use value::*;
