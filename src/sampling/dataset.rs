use chrono::{DateTime, Utc};
use ndarray::{Array1, Array3, Array4};

use super::{DimLabel, SamplingType};

/// A decoded plane-sampler group: labeled 4-D fields over the three spatial
/// axes plus the sampling-time-step axis.
///
/// The arrays are always laid out as `(nx, ny, nz, time)` where `(nx, ny,
/// nz)` are the grid dimensions of the group; `dims` records which physical
/// axis each array axis is labeled with, which depends on the plane normal.
/// Consumers address values by coordinate, never by raw index.
///
/// Created fresh per `read_single_group` call and not mutated afterwards.
#[derive(Debug, Clone)]
pub struct PlaneDataset {
    pub group: String,
    pub sampling_type: SamplingType,
    /// Dimension labels of the four array axes.
    pub dims: [DimLabel; 4],
    /// Physical coordinate values along each axis.
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array1<f64>,
    /// Stored time-step index of each sample.
    pub samplingtimestep: Vec<i64>,
    pub u: Array4<f64>,
    pub v: Array4<f64>,
    pub w: Array4<f64>,
    pub temperature: Option<Array4<f64>>,
    pub tke: Option<Array4<f64>>,
    /// Temporal means carried over from a chunked store, when present.
    /// Consumed (and cleared) by `attach_time`.
    pub umean: Option<Array3<f64>>,
    pub vmean: Option<Array3<f64>>,
    pub wmean: Option<Array3<f64>>,
}

impl PlaneDataset {
    /// Number of selected time steps.
    pub fn ndt(&self) -> usize {
        self.samplingtimestep.len()
    }

    /// Grid dimensions (nx, ny, nz) of the underlying arrays.
    pub fn grid_dims(&self) -> (usize, usize, usize) {
        let shape = self.u.shape();
        (shape[0], shape[1], shape[2])
    }

    /// Coordinate array attached to a spatial dimension label.
    pub fn coord(&self, label: DimLabel) -> &Array1<f64> {
        match label {
            DimLabel::X => &self.x,
            DimLabel::Y => &self.y,
            DimLabel::Z => &self.z,
            DimLabel::SamplingTimeStep => unreachable!("samplingtimestep is not a spatial axis"),
        }
    }

    /// Map physical coordinate indices (into `x`, `y`, `z`) to the array
    /// index tuple, resolving the label permutation.
    fn array_index(&self, ix: usize, iy: usize, iz: usize, it: usize) -> [usize; 4] {
        let mut idx = [0usize; 4];
        for (axis, label) in self.dims.iter().take(3).enumerate() {
            idx[axis] = match label {
                DimLabel::X => ix,
                DimLabel::Y => iy,
                DimLabel::Z => iz,
                DimLabel::SamplingTimeStep => 0,
            };
        }
        idx[3] = it;
        idx
    }

    /// Field value at physical coordinate indices.
    pub fn value_at(&self, field: &Array4<f64>, ix: usize, iy: usize, iz: usize, it: usize) -> f64 {
        field[self.array_index(ix, iy, iz, it)]
    }

    /// (u, v, w) at physical coordinate indices.
    pub fn velocity_at(&self, ix: usize, iy: usize, iz: usize, it: usize) -> (f64, f64, f64) {
        let idx = self.array_index(ix, iy, iz, it);
        (self.u[idx], self.v[idx], self.w[idx])
    }

    /// All 4-D fields in a stable order, for persistence.
    pub fn fields(&self) -> Vec<(&'static str, &Array4<f64>)> {
        let mut fields = vec![("u", &self.u), ("v", &self.v), ("w", &self.w)];
        if let Some(t) = &self.temperature {
            fields.push(("temperature", t));
        }
        if let Some(k) = &self.tke {
            fields.push(("tke", k));
        }
        fields
    }

    /// The 3-D mean fields, when the dataset carries them.
    pub fn mean_fields(&self) -> Vec<(&'static str, &Array3<f64>)> {
        let mut fields = Vec::new();
        if let Some(m) = &self.umean {
            fields.push(("umean", m));
        }
        if let Some(m) = &self.vmean {
            fields.push(("vmean", m));
        }
        if let Some(m) = &self.wmean {
            fields.push(("wmean", m));
        }
        fields
    }
}

/// A [`PlaneDataset`] with a physical time axis and velocity fluctuations.
#[derive(Debug, Clone)]
pub struct TimeAlignedDataset {
    /// The source dataset with any precomputed means consumed.
    pub dataset: PlaneDataset,
    /// Physical time of each sample, seconds since the origin.
    pub time: Array1<f64>,
    /// Absolute datetime axis.
    pub datetime: Vec<DateTime<Utc>>,
    /// Velocity fluctuations about the temporal mean.
    pub up: Array4<f64>,
    pub vp: Array4<f64>,
    pub wp: Array4<f64>,
}
