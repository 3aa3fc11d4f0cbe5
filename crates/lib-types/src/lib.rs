//! # lib-types
//!
//! Core type definitions for slipsynth forward modelling.
//!
//! This crate provides foundational types used throughout the workspace:
//! - Physical units with compile-time safety
//! - Time series representation for unit responses and synthetics
//! - Subfault, rupture and station records
//! - Layered velocity models

pub mod units;
pub mod timeseries;
pub mod fault;
pub mod structure;

pub use units::*;
pub use timeseries::*;
pub use fault::*;
pub use structure::VelocityModel;
