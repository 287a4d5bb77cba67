//! Unit algebra and canonicalization
//!
//! A [`UnitRegistry`] is built from the unit and canonical-unit tables and
//! owned by one conversion session. It normalizes raw unit text, resolves it
//! to a [`Unit`] and names the canonical unit for a [`Dimensionality`].

pub mod dimension;
pub mod normalize;
pub mod quantity;
pub mod registry;
pub mod unit;

pub use dimension::Dimensionality;
pub use quantity::Quantity;
pub use registry::UnitRegistry;
pub use unit::Unit;
