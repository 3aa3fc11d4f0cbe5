//! Green's function store.
//!
//! Unit responses are precomputed per (station, subfault, slip type,
//! component) and laid out under the project directory:
//!
//! ```text
//! <project>/GFs/dynamic/<model>_<depth>.sub<id>/<sta>.subfault<id>.<SS|DS>.<vel|disp>.<e|n|z>
//! <project>/GFs/tsunami/...                       (same layout, tsunami runs)
//! <project>/GFs/static/<sta>.subfault<id>.<SS|DS>.static.neu
//! ```
//!
//! with `<depth>` printed to four decimals and `<id>` zero-padded to four
//! digits.

use crate::error::ParseError;
use crate::neu::parse_neu;
use crate::sac::decode_sac;
use lib_types::fault::{
    subfault_tag, Component, Quantity, SlipType, StaticOffset, Station, Subfault, ThreeComponent,
};
use lib_types::timeseries::TimeSeries;
use lib_types::units::Seconds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which family of dynamic Green's functions to read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreensKind {
    /// Onshore seismic/geodetic responses (`GFs/dynamic`).
    #[default]
    Onshore,
    /// Seafloor responses for tsunami runs (`GFs/tsunami`).
    Tsunami,
}

impl GreensKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Onshore => "dynamic",
            Self::Tsunami => "tsunami",
        }
    }
}

/// The six unit-slip responses of one subfault at one station.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitResponses {
    pub strike_slip: ThreeComponent<TimeSeries>,
    pub dip_slip: ThreeComponent<TimeSeries>,
}

impl UnitResponses {
    pub fn get(&self, slip: SlipType) -> &ThreeComponent<TimeSeries> {
        match slip {
            SlipType::StrikeSlip => &self.strike_slip,
            SlipType::DipSlip => &self.dip_slip,
        }
    }

    /// Interval of the strike-slip east response.
    pub fn native_dt(&self) -> Seconds {
        self.strike_slip.east.dt
    }

    /// Apply a fallible transform to all six series.
    pub fn try_map<E>(self, mut f: impl FnMut(TimeSeries) -> Result<TimeSeries, E>) -> Result<Self, E> {
        Ok(Self {
            strike_slip: self.strike_slip.try_map(&mut f)?,
            dip_slip: self.dip_slip.try_map(&mut f)?,
        })
    }

    /// Apply an in-place transform to all six series.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut TimeSeries)) {
        for record in [&mut self.strike_slip, &mut self.dip_slip] {
            f(&mut record.east);
            f(&mut record.north);
            f(&mut record.up);
        }
    }
}

/// Static unit-slip offsets of one subfault at one station.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticUnitOffsets {
    pub strike_slip: StaticOffset,
    pub dip_slip: StaticOffset,
}

/// Anything that can hand out unit responses.
///
/// Implementations are shared read-only across station workers.
pub trait GreensFunctionSource: Sync {
    /// The six dynamic unit responses for `subfault` at `station`.
    fn unit_responses(&self, station: &Station, subfault: &Subfault) -> Result<UnitResponses, ParseError>;

    /// The static unit offsets for subfault `subfault_id` at `station`.
    fn static_offsets(&self, station: &Station, subfault_id: u32) -> Result<StaticUnitOffsets, ParseError>;
}

/// Green's functions read from a project's `GFs/` tree.
#[derive(Clone, Debug)]
pub struct GreensFunctionLibrary {
    project_dir: PathBuf,
    model_name: String,
    kind: GreensKind,
    quantity: Quantity,
}

impl GreensFunctionLibrary {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        model_name: impl Into<String>,
        kind: GreensKind,
        quantity: Quantity,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            model_name: model_name.into(),
            kind,
            quantity,
        }
    }

    /// Directory holding every dynamic response of `subfault`.
    pub fn dynamic_dir(&self, subfault: &Subfault) -> PathBuf {
        self.project_dir
            .join("GFs")
            .join(self.kind.dir_name())
            .join(format!("{}_{:.4}.sub{:04}", self.model_name, subfault.depth.0, subfault.id))
    }

    /// Path of one dynamic response file.
    pub fn dynamic_path(
        &self,
        station: &Station,
        subfault: &Subfault,
        slip: SlipType,
        component: Component,
    ) -> PathBuf {
        self.dynamic_dir(subfault).join(format!(
            "{}.{}.{}.{}.{}",
            station.code,
            subfault.tag(),
            slip.tag(),
            self.quantity.tag(),
            component.greens_suffix()
        ))
    }

    /// Path of one static offset file.
    pub fn static_path(&self, station: &Station, subfault_id: u32, slip: SlipType) -> PathBuf {
        self.project_dir.join("GFs").join("static").join(format!(
            "{}.{}.{}.static.neu",
            station.code,
            subfault_tag(subfault_id),
            slip.tag()
        ))
    }

    fn load_trace(&self, path: &Path) -> Result<TimeSeries, ParseError> {
        let bytes = std::fs::read(path).map_err(|e| ParseError::greens_io(e, path))?;
        decode_sac(&bytes)
    }

    fn load_static(&self, path: &Path) -> Result<StaticOffset, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseError::greens_io(e, path))?;
        parse_neu(&content)
    }
}

impl GreensFunctionSource for GreensFunctionLibrary {
    fn unit_responses(&self, station: &Station, subfault: &Subfault) -> Result<UnitResponses, ParseError> {
        let load = |slip: SlipType| {
            ThreeComponent::try_from_fn(|component| {
                self.load_trace(&self.dynamic_path(station, subfault, slip, component))
            })
        };
        Ok(UnitResponses {
            strike_slip: load(SlipType::StrikeSlip)?,
            dip_slip: load(SlipType::DipSlip)?,
        })
    }

    fn static_offsets(&self, station: &Station, subfault_id: u32) -> Result<StaticUnitOffsets, ParseError> {
        Ok(StaticUnitOffsets {
            strike_slip: self.load_static(&self.static_path(station, subfault_id, SlipType::StrikeSlip))?,
            dip_slip: self.load_static(&self.static_path(station, subfault_id, SlipType::DipSlip))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neu::write_neu;
    use crate::sac::write_sac;
    use lib_types::units::{Degrees, Kilometers, Meters};

    fn subfault(id: u32, depth: f64) -> Subfault {
        Subfault {
            id,
            longitude: 0.0,
            latitude: 0.0,
            depth: Kilometers(depth),
            strike: Degrees(0.0),
            dip: Degrees(45.0),
            stf_shape: 0.5,
            rise_time: Seconds(1.0),
            strike_slip: Meters(1.0),
            dip_slip: Meters(0.0),
            length: Meters(1000.0),
            width: Meters(1000.0),
            rupture_time: Seconds::ZERO,
            rigidity: None,
        }
    }

    #[test]
    fn test_dynamic_path_layout() {
        let lib = GreensFunctionLibrary::new("/proj", "maule", GreensKind::Onshore, Quantity::Velocity);
        let path = lib.dynamic_path(&Station::new("PTRO"), &subfault(7, 18.5), SlipType::DipSlip, Component::Up);

        assert_eq!(
            path,
            PathBuf::from("/proj/GFs/dynamic/maule_18.5000.sub0007/PTRO.subfault0007.DS.vel.z")
        );

        let tsunami = GreensFunctionLibrary::new("/proj", "maule", GreensKind::Tsunami, Quantity::Displacement);
        let path = tsunami.dynamic_path(&Station::new("DART"), &subfault(12, 3.25), SlipType::StrikeSlip, Component::East);
        assert_eq!(
            path,
            PathBuf::from("/proj/GFs/tsunami/maule_3.2500.sub0012/DART.subfault0012.SS.disp.e")
        );
    }

    #[test]
    fn test_static_path_layout() {
        let lib = GreensFunctionLibrary::new("/proj", "maule", GreensKind::Onshore, Quantity::Velocity);
        assert_eq!(
            lib.static_path(&Station::new("PTRO"), 3, SlipType::StrikeSlip),
            PathBuf::from("/proj/GFs/static/PTRO.subfault0003.SS.static.neu")
        );
    }

    #[test]
    fn test_missing_file_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let lib = GreensFunctionLibrary::new(dir.path(), "m", GreensKind::Onshore, Quantity::Velocity);

        match lib.unit_responses(&Station::new("PTRO"), &subfault(1, 10.0)) {
            Err(ParseError::MissingGreensFunction { path }) => {
                assert!(path.ends_with("PTRO.subfault0001.SS.vel.e"));
            }
            other => panic!("expected missing Green's function, got {:?}", other),
        }
        assert!(matches!(
            lib.static_offsets(&Station::new("PTRO"), 1),
            Err(ParseError::MissingGreensFunction { .. })
        ));
    }

    #[test]
    fn test_loads_six_responses_and_statics() {
        let dir = tempfile::tempdir().unwrap();
        let lib = GreensFunctionLibrary::new(dir.path(), "m", GreensKind::Onshore, Quantity::Velocity);
        let station = Station::new("PTRO");
        let sf = subfault(2, 10.0);

        std::fs::create_dir_all(lib.dynamic_dir(&sf)).unwrap();
        for (k, slip) in [SlipType::StrikeSlip, SlipType::DipSlip].into_iter().enumerate() {
            for (j, component) in Component::ALL.into_iter().enumerate() {
                let value = (10 * k + j) as f64;
                let trace = TimeSeries::new(vec![value; 4], Seconds(0.5), Seconds::ZERO);
                write_sac(&lib.dynamic_path(&station, &sf, slip, component), &trace).unwrap();
            }
        }

        let responses = lib.unit_responses(&station, &sf).unwrap();
        assert_eq!(responses.native_dt(), Seconds(0.5));
        assert_eq!(responses.strike_slip.north.samples, vec![1.0; 4]);
        assert_eq!(responses.get(SlipType::DipSlip).up.samples, vec![12.0; 4]);

        std::fs::create_dir_all(dir.path().join("GFs/static")).unwrap();
        let ss = StaticOffset { east: 1.0, north: 2.0, up: 3.0 };
        let ds = StaticOffset { east: -1.0, north: 0.5, up: 0.0 };
        write_neu(&lib.static_path(&station, 2, SlipType::StrikeSlip), &ss).unwrap();
        write_neu(&lib.static_path(&station, 2, SlipType::DipSlip), &ds).unwrap();

        let offsets = lib.static_offsets(&station, 2).unwrap();
        assert_eq!(offsets.strike_slip, ss);
        assert_eq!(offsets.dip_slip, ds);
    }
}
