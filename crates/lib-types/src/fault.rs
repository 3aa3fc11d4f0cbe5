//! Rupture, station and per-component records.

use crate::units::{Degrees, Kilometers, Meters, Pascals, Seconds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of a rupture file: a subfault during one time window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subfault {
    /// Subfault number. Rows sharing an id are time windows of one patch.
    pub id: u32,

    pub longitude: f64,
    pub latitude: f64,
    pub depth: Kilometers,
    pub strike: Degrees,
    pub dip: Degrees,

    /// Source-time-function shape column (0.5 for a symmetric triangle).
    pub stf_shape: f64,

    /// Rise time: how long slip on this subfault lasts.
    pub rise_time: Seconds,

    pub strike_slip: Meters,
    pub dip_slip: Meters,

    /// Along-strike length.
    pub length: Meters,

    /// Along-dip width.
    pub width: Meters,

    /// Rupture onset relative to the origin time.
    pub rupture_time: Seconds,

    /// Rigidity column, when the file carries one.
    pub rigidity: Option<Pascals>,
}

impl Subfault {
    /// Patch area in square meters.
    pub fn area(&self) -> f64 {
        self.length.0 * self.width.0
    }

    /// Total slip magnitude.
    pub fn slip(&self) -> Meters {
        Meters(self.strike_slip.0.hypot(self.dip_slip.0))
    }

    /// Zero-padded tag used by Green's function file names (`subfault0007`).
    pub fn tag(&self) -> String {
        subfault_tag(self.id)
    }
}

/// `subfault` followed by the id padded to four digits.
pub fn subfault_tag(id: u32) -> String {
    format!("subfault{:04}", id)
}

/// Slip summed over every time window of one subfault.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSlip {
    pub id: u32,
    pub strike_slip: Meters,
    pub dip_slip: Meters,
}

/// Parsed rupture model, rows kept in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuptureModel {
    pub subfaults: Vec<Subfault>,
}

impl RuptureModel {
    pub fn new(subfaults: Vec<Subfault>) -> Self {
        Self { subfaults }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subfaults.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subfaults.is_empty()
    }

    /// Sum strike-slip and dip-slip per subfault id, ascending by id.
    pub fn aggregate_by_id(&self) -> Vec<AggregatedSlip> {
        let mut totals: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
        for sf in &self.subfaults {
            let entry = totals.entry(sf.id).or_insert((0.0, 0.0));
            entry.0 += sf.strike_slip.0;
            entry.1 += sf.dip_slip.0;
        }
        totals
            .into_iter()
            .map(|(id, (ss, ds))| AggregatedSlip {
                id,
                strike_slip: Meters(ss),
                dip_slip: Meters(ds),
            })
            .collect()
    }

    /// Number of distinct subfault ids.
    pub fn unique_ids(&self) -> usize {
        self.aggregate_by_id().len()
    }
}

/// A recording site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station code, at most six characters.
    pub code: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl Station {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            longitude: None,
            latitude: None,
        }
    }
}

/// Unit-slip mechanism a Green's function was computed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlipType {
    StrikeSlip,
    DipSlip,
}

impl SlipType {
    /// File-name tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::StrikeSlip => "SS",
            Self::DipSlip => "DS",
        }
    }
}

/// Physical quantity of synthesized waveforms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    #[default]
    Velocity,
    Displacement,
}

impl Quantity {
    /// File-name tag (`vel` or `disp`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Velocity => "vel",
            Self::Displacement => "disp",
        }
    }
}

/// Direction of motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    East,
    North,
    Up,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::East, Component::North, Component::Up];

    /// Suffix of Green's function files (`z` for the vertical).
    pub fn greens_suffix(&self) -> &'static str {
        match self {
            Self::East => "e",
            Self::North => "n",
            Self::Up => "z",
        }
    }

    /// Suffix of synthesized output files (`u` for the vertical).
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Self::East => "e",
            Self::North => "n",
            Self::Up => "u",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_suffix())
    }
}

/// East, north and vertical values of anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeComponent<T> {
    pub east: T,
    pub north: T,
    pub up: T,
}

impl<T> ThreeComponent<T> {
    pub fn new(east: T, north: T, up: T) -> Self {
        Self { east, north, up }
    }

    /// Build each component from a function of its direction.
    pub fn from_fn(mut f: impl FnMut(Component) -> T) -> Self {
        Self {
            east: f(Component::East),
            north: f(Component::North),
            up: f(Component::Up),
        }
    }

    /// Fallible variant of [`ThreeComponent::from_fn`].
    pub fn try_from_fn<E>(mut f: impl FnMut(Component) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            east: f(Component::East)?,
            north: f(Component::North)?,
            up: f(Component::Up)?,
        })
    }

    pub fn get(&self, component: Component) -> &T {
        match component {
            Component::East => &self.east,
            Component::North => &self.north,
            Component::Up => &self.up,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ThreeComponent<U> {
        ThreeComponent {
            east: f(self.east),
            north: f(self.north),
            up: f(self.up),
        }
    }

    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<ThreeComponent<U>, E> {
        Ok(ThreeComponent {
            east: f(self.east)?,
            north: f(self.north)?,
            up: f(self.up)?,
        })
    }

    /// Pairwise combination of two records.
    pub fn try_zip_with<U, V, E>(
        self,
        other: ThreeComponent<U>,
        mut f: impl FnMut(T, U) -> Result<V, E>,
    ) -> Result<ThreeComponent<V>, E> {
        Ok(ThreeComponent {
            east: f(self.east, other.east)?,
            north: f(self.north, other.north)?,
            up: f(self.up, other.up)?,
        })
    }

    /// Iterate in east, north, up order with the direction attached.
    pub fn iter(&self) -> impl Iterator<Item = (Component, &T)> {
        [
            (Component::East, &self.east),
            (Component::North, &self.north),
            (Component::Up, &self.up),
        ]
        .into_iter()
    }
}

/// Permanent surface offset at a station, in meters.
pub type StaticOffset = ThreeComponent<f64>;

impl ThreeComponent<f64> {
    /// `self + weight * other`, component-wise.
    pub fn add_scaled(&self, other: &Self, weight: f64) -> Self {
        Self {
            east: self.east + weight * other.east,
            north: self.north + weight * other.north,
            up: self.up + weight * other.up,
        }
    }
}
