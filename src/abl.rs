//! Reader for atmospheric-boundary-layer statistics output.
//!
//! The statistics file carries scalar time series at the root (one value per
//! output step) and, optionally, a `mean_profiles` group of time-height
//! planar averages. Loading is a straight relabeling: the time coordinate is
//! attached, and `h` becomes `height`.

use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::path::Path;

use crate::error::SamplingError;

/// ABL statistics: scalar time series plus optional mean profiles.
#[derive(Debug, Clone)]
pub struct AblStatistics {
    /// Simulation time of each output step, seconds.
    pub time: Array1<f64>,
    /// Absolute datetime axis, present when a start date was supplied.
    pub datetime: Option<Vec<DateTime<Utc>>>,
    /// Height levels of the mean profiles, present when profiles were loaded.
    pub heights: Option<Array1<f64>>,
    series: HashMap<String, Array1<f64>>,
    profiles: HashMap<String, Array2<f64>>,
}

impl AblStatistics {
    /// Load the statistics file. With `start_date`, the time axis is also
    /// expressed as absolute datetimes. With `mean_profiles`, the
    /// `mean_profiles` group is loaded as time-height arrays.
    pub fn open(
        path: impl AsRef<Path>,
        start_date: Option<DateTime<Utc>>,
        mean_profiles: bool,
    ) -> Result<Self, SamplingError> {
        let file = netcdf::open(path.as_ref())?;

        let time_var = file
            .variable("time")
            .ok_or_else(|| SamplingError::MissingVariable("time".to_string()))?;
        let time = Array1::from(time_var.get_values::<f64, _>(..)?);

        let datetime = start_date.map(|origin| {
            time.iter()
                .map(|&t| origin + Duration::milliseconds((t * 1000.0).round() as i64))
                .collect()
        });

        let mut series = HashMap::new();
        for var in file.variables() {
            let dims = var.dimensions();
            if dims.len() == 1 && dims[0].name() == "num_time_steps" && var.name() != "time" {
                series.insert(var.name(), Array1::from(var.get_values::<f64, _>(..)?));
            }
        }

        let (heights, profiles) = if mean_profiles {
            let grp = file
                .group("mean_profiles")?
                .ok_or_else(|| SamplingError::MissingGroup("mean_profiles".to_string()))?;
            let (h, p) = load_profiles(&grp, time.len())?;
            (Some(h), p)
        } else {
            (None, HashMap::new())
        };

        Ok(Self {
            time,
            datetime,
            heights,
            series,
            profiles,
        })
    }

    /// A scalar time series by name.
    pub fn series(&self, name: &str) -> Option<&Array1<f64>> {
        self.series.get(name)
    }

    /// A mean profile (time x height) by name.
    pub fn profile(&self, name: &str) -> Option<&Array2<f64>> {
        self.profiles.get(name)
    }

    pub fn series_names(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

fn load_profiles(
    grp: &netcdf::Group,
    ndt: usize,
) -> Result<(Array1<f64>, HashMap<String, Array2<f64>>), SamplingError> {
    let h_var = grp
        .variable("h")
        .ok_or_else(|| SamplingError::MissingVariable("h".to_string()))?;
    let heights = Array1::from(h_var.get_values::<f64, _>(..)?);
    let nlevels = heights.len();

    let mut profiles = HashMap::new();
    for var in grp.variables() {
        if var.name() == "h" || var.dimensions().len() != 2 {
            continue;
        }
        let raw: Vec<f64> = var.get_values(..)?;
        if raw.len() != ndt * nlevels {
            return Err(SamplingError::ShapeMismatch {
                expected: ndt * nlevels,
                actual: raw.len(),
                context: var.name(),
            });
        }
        let arr = Array2::from_shape_vec((ndt, nlevels), raw).map_err(|_| {
            SamplingError::ShapeMismatch {
                expected: ndt * nlevels,
                actual: 0,
                context: var.name(),
            }
        })?;
        profiles.insert(var.name(), arr);
    }
    Ok((heights, profiles))
}
