//! Readers for flow-field sampling output.
//!
//! A sampling file contains one NetCDF group per sampler. Each group carries
//! the attributes `sampling_type`, `ijk_dims` and `axis3`, a `coordinates`
//! variable of shape (num_points, 3), and per-field arrays flattened along a
//! `num_time_steps` dimension. Only plane samplers can be decoded; the other
//! sampler kinds are recognized but report an explicit unsupported error.

pub mod catalog;
pub mod dataset;
pub mod metadata;
pub mod plane;
pub mod time_align;

pub use catalog::SamplingReader;
pub use dataset::{PlaneDataset, TimeAlignedDataset};
pub use time_align::{attach_time, default_origin};

use ndarray::Array1;
use std::path::PathBuf;

use crate::error::SamplingError;

/// Sampler kinds written by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingType {
    Plane,
    Line,
    Lidar,
    Probe,
}

impl SamplingType {
    /// Parse the `sampling_type` group attribute.
    pub fn from_attr(s: &str) -> Result<Self, SamplingError> {
        match s {
            "PlaneSampler" => Ok(Self::Plane),
            "LineSampler" => Ok(Self::Line),
            "LidarSampler" => Ok(Self::Lidar),
            "ProbeSampler" => Ok(Self::Probe),
            other => Err(SamplingError::Format(format!(
                "sampling type `{other}` not recognized"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plane => "PlaneSampler",
            Self::Line => "LineSampler",
            Self::Lidar => "LidarSampler",
            Self::Probe => "ProbeSampler",
        }
    }
}

/// Labels for the four dimensions of a decoded plane dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimLabel {
    X,
    Y,
    Z,
    SamplingTimeStep,
}

impl DimLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::SamplingTimeStep => "samplingtimestep",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, SamplingError> {
        match s {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            "samplingtimestep" => Ok(Self::SamplingTimeStep),
            other => Err(SamplingError::Format(format!(
                "unknown dimension label `{other}`"
            ))),
        }
    }
}

/// Spatial axis perpendicular to a sampled plane, decoded from the one-hot
/// `axis3` group attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneNormal {
    X,
    Y,
    Z,
}

impl PlaneNormal {
    /// Decode an `axis3` vector. Exactly one component must equal 1 with the
    /// others 0; anything else (wrong length, negations, several 1s) is a
    /// format error rather than a silent first-match.
    pub fn from_axis3(axis3: &[f64]) -> Result<Self, SamplingError> {
        if axis3.len() != 3 {
            return Err(SamplingError::Format(format!(
                "axis3 must have 3 components, got {}",
                axis3.len()
            )));
        }
        let ones: Vec<usize> = (0..3).filter(|&i| axis3[i] == 1.0).collect();
        let zeros = (0..3).filter(|&i| axis3[i] == 0.0).count();
        if ones.len() != 1 || zeros != 2 {
            return Err(SamplingError::Format(format!(
                "unknown plane normal: axis3 = {axis3:?}"
            )));
        }
        match ones[0] {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            _ => Ok(Self::Z),
        }
    }

    /// Dimension-label order of the decoded dataset for this normal.
    ///
    /// The underlying array layout is always (nx, ny, nz, time); the labels
    /// are reassigned so the third spatial slot is the normal axis.
    pub fn ordered_dims(&self) -> [DimLabel; 4] {
        use DimLabel::*;
        match self {
            Self::X => [Y, Z, X, SamplingTimeStep],
            Self::Y => [X, Z, Y, SamplingTimeStep],
            Self::Z => [X, Y, Z, SamplingTimeStep],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// Per-group geometry extracted from the group attributes and the raw
/// coordinate array. Immutable; produced once and passed explicitly to the
/// decode stages.
#[derive(Debug, Clone)]
pub struct SampleGroup {
    pub name: String,
    pub sampling_type: SamplingType,
    /// Grid dimensions from `ijk_dims`.
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Number of stored time steps.
    pub ndt: usize,
    /// First and last stored time-step indices.
    pub tdi: i64,
    pub tdf: i64,
    /// Plane normal; present for plane samplers only.
    pub normal: Option<PlaneNormal>,
    /// Sorted unique coordinate values along each axis.
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array1<f64>,
}

/// Which fields to decode from a sampled group.
#[derive(Debug, Clone, Default)]
pub enum VarSelection {
    /// The three velocity components (the default).
    #[default]
    Velocity,
    /// Velocity plus temperature and tke when the source carries them.
    All,
    /// An explicit list of field names; a named field missing from the source
    /// is an error.
    Named(Vec<String>),
}

/// One decodable field: its dataset name and the source variable it is read
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U,
    V,
    W,
    Temperature,
    Tke,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::U => "u",
            Self::V => "v",
            Self::W => "w",
            Self::Temperature => "temperature",
            Self::Tke => "tke",
        }
    }

    pub fn source_var(&self) -> &'static str {
        match self {
            Self::U => "velocityx",
            Self::V => "velocityy",
            Self::W => "velocityz",
            Self::Temperature => "temperature",
            Self::Tke => "tke",
        }
    }
}

/// Resolve a variable selection against the variables actually present in the
/// source group. The optional-field set is decided here, once, so the decode
/// loop never does ad hoc existence checks.
pub(crate) fn resolve_fields(
    vars: &VarSelection,
    available: &[String],
) -> Result<Vec<FieldKind>, SamplingError> {
    let present = |k: FieldKind| available.iter().any(|v| v == k.source_var());
    let mut fields = vec![FieldKind::U, FieldKind::V, FieldKind::W];
    match vars {
        VarSelection::Velocity => {}
        VarSelection::All => {
            for opt in [FieldKind::Temperature, FieldKind::Tke] {
                if present(opt) {
                    fields.push(opt);
                }
            }
        }
        VarSelection::Named(names) => {
            for name in names {
                let kind = match name.as_str() {
                    "u" | "v" | "w" => continue,
                    "temperature" => FieldKind::Temperature,
                    "tke" => FieldKind::Tke,
                    other => {
                        return Err(SamplingError::MissingVariable(other.to_string()));
                    }
                };
                if !present(kind) {
                    return Err(SamplingError::MissingVariable(name.clone()));
                }
                if !fields.contains(&kind) {
                    fields.push(kind);
                }
            }
        }
    }
    Ok(fields)
}

/// Options for decoding a single group.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// First time-step index to read.
    pub itime: usize,
    /// One past the last index; -1 means through the end.
    pub ftime: i64,
    /// Read every `step`-th stored time step. Useful when several samplers
    /// share one output frequency: save everything at the finest interval and
    /// decode the coarser sampler with a matching stride.
    pub step: usize,
    pub vars: VarSelection,
    /// Write the decoded dataset here: a `.zarr` path, a `.nc` path, or an
    /// existing directory that receives `<group>.zarr`.
    pub output: Option<PathBuf>,
    /// Caller contract stating the simulation is no longer writing the file.
    /// Reading a file that is still being written may clash with the writer;
    /// this flag is documentation of that contract, not something the reader
    /// can enforce.
    pub sim_completed: bool,
    pub verbose: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            itime: 0,
            ftime: -1,
            step: 1,
            vars: VarSelection::default(),
            output: None,
            sim_completed: false,
            verbose: false,
        }
    }
}
