//! Dense tensor implementation and operations
//!
//! The core type lives in [`types`]; operations are grouped by concern in
//! the sibling modules and implemented as inherent methods on [`DenseND`].

pub mod types;

mod creation;
mod shape_ops;
mod statistics;

pub mod densend_traits;

pub use types::DenseND;
