//! bp-core: stable foundation for boilerplot.
//!
//! Contains:
//! - units (uom SI constructors + display converters for the report)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
