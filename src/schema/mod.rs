//! health.indicators.v1 input schema
//!
//! This module defines the UI-agnostic input schema for national health
//! indicators. Range validation lives here, at the boundary, so the same
//! contract holds no matter which surface collected the values.

mod indicators;

pub use indicators::*;
