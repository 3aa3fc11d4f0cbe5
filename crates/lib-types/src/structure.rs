//! Layered Earth structure.

use crate::units::Kilometers;
use ndarray::{Array1, Array2, ArrayView1};

/// Column holding layer thickness (km).
pub const COL_THICKNESS: usize = 0;
/// Column holding shear-wave velocity (km/s).
pub const COL_VS: usize = 1;
/// Column holding compressional-wave velocity (km/s).
pub const COL_VP: usize = 2;
/// Column holding density (g/cm³).
pub const COL_DENSITY: usize = 3;

/// Minimum number of columns a layer row must carry.
pub const MIN_COLUMNS: usize = 4;

/// One-dimensional velocity model, one row per layer from the surface down.
///
/// The last row is the halfspace; its thickness is ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityModel {
    layers: Array2<f64>,
}

impl VelocityModel {
    /// Wrap a layer matrix. Returns `None` if it has no rows or too few columns.
    pub fn new(layers: Array2<f64>) -> Option<Self> {
        if layers.nrows() == 0 || layers.ncols() < MIN_COLUMNS {
            return None;
        }
        Some(Self { layers })
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.nrows()
    }

    /// Single-layer models are a halfspace.
    #[inline]
    pub fn is_halfspace(&self) -> bool {
        self.layers.nrows() == 1
    }

    /// Depth of the bottom of each layer.
    pub fn layer_bottoms(&self) -> Array1<f64> {
        let mut acc = 0.0;
        self.layers
            .column(COL_THICKNESS)
            .iter()
            .map(|h| {
                acc += h;
                acc
            })
            .collect()
    }

    /// Index of the layer containing `depth`.
    ///
    /// A depth exactly on a boundary belongs to the layer above it; anything
    /// deeper than every boundary falls in the last layer.
    pub fn layer_index(&self, depth: Kilometers) -> usize {
        if self.is_halfspace() {
            return 0;
        }
        let below = self
            .layer_bottoms()
            .iter()
            .filter(|&&bottom| depth.0 > bottom)
            .count();
        below.min(self.num_layers() - 1)
    }

    pub fn layer(&self, index: usize) -> ArrayView1<'_, f64> {
        self.layers.row(index)
    }

    pub fn shear_velocity(&self, index: usize) -> f64 {
        self.layers[[index, COL_VS]]
    }

    pub fn density(&self, index: usize) -> f64 {
        self.layers[[index, COL_DENSITY]]
    }
}
