//! Core types shared across the GridPort engine and its values backends.
//!
//! Everything here is pure: column letter/number conversion, sheet-qualified
//! A1 range references, header label normalization, and the closed cell-value
//! variant used at the remote boundary. No I/O, no dependencies on any
//! backend.

pub mod addr;
pub mod label;
pub mod value;

pub use addr::*;
pub use label::*;
pub use value::*;
