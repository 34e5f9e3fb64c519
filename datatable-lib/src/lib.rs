//! Windowed data table engine
//!
//! Keeps a windowed view of a large, remote, asynchronously read data set
//! correct and responsive while the user scrolls faster than the network,
//! changes sort and filter mid-flight, searches incrementally and edits rows.
//! Rendering is left to a [`Viewport`](source::Viewport) implementation; data
//! comes from a [`RowSource`](source::RowSource).

pub mod cache;
pub mod config;
pub mod deferred;
pub mod edit;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod find;
pub mod model;
pub mod navigation;
pub mod notice;
pub mod sort;
pub mod source;

mod table;

pub use table::*;
