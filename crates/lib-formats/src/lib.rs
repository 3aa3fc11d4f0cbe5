//! # lib-formats
//!
//! Readers and writers for the files a forward-synthesis run touches:
//!
//! - rupture models (`.rupt`), station lists and layered velocity models
//! - SAC binary traces, the storage format of dynamic Green's functions and
//!   synthesized waveforms
//! - static offset records (`.neu`)
//! - the Green's function store itself, behind [`GreensFunctionSource`]
//!
//! Text formats are parsed with `nom`.

pub mod error;
pub mod greens;
pub mod neu;
pub mod rupture;
pub mod sac;
pub mod station;
pub mod velocity;

mod table;

pub use error::ParseError;
pub use greens::{GreensFunctionLibrary, GreensFunctionSource, GreensKind, StaticUnitOffsets, UnitResponses};
pub use rupture::{parse_rupture, read_rupture};
pub use sac::{read_sac, write_sac};
pub use station::{parse_stations, read_stations};
pub use velocity::{parse_velocity_model, read_velocity_model};
