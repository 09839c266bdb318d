//! Core types and parsers for design-storm hyetographs.
//!
//! - [`category`]: distribution families and what each one supports
//! - [`distribution_table`]: reference tables to normalized curves
//! - [`curve_store`]: the read-only curve lookup used by calculations
//! - [`frequency`]: precipitation-frequency table parsing

pub mod category;
pub mod curve;
pub mod curve_store;
pub mod distribution_table;
pub mod frequency;
#[cfg(feature = "api")]
pub mod frequency_client;
