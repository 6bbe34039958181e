//! Attach a physical time axis and fluctuation fields to a decoded dataset.

use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array3, Array4, Axis};

use super::dataset::{PlaneDataset, TimeAlignedDataset};
use crate::error::SamplingError;

/// The conventional epoch for simulations without an absolute start date.
pub fn default_origin() -> DateTime<Utc> {
    // 2000-01-01 00:00:00 UTC
    DateTime::from_timestamp(946_684_800, 0).expect("valid epoch")
}

/// Attach a datetime axis derived from the sampling interval `dt` (seconds)
/// and compute velocity fluctuations about the temporal mean.
///
/// A pure transform: the input dataset is not mutated. The integer
/// `samplingtimestep` axis is preserved on the result alongside the derived
/// time and datetime axes. Means are taken from the dataset when a chunked
/// store supplied them (and are consumed), otherwise computed by reduction
/// over the time axis.
pub fn attach_time(
    ds: &PlaneDataset,
    dt: f64,
    origin: DateTime<Utc>,
) -> Result<TimeAlignedDataset, SamplingError> {
    if dt <= 0.0 {
        return Err(SamplingError::Precondition(format!(
            "the dt should be positive, received {dt}"
        )));
    }
    if ds.ndt() == 0 {
        return Err(SamplingError::Precondition(
            "dataset has no time steps".to_string(),
        ));
    }

    let time: Array1<f64> = ds
        .samplingtimestep
        .iter()
        .map(|&s| s as f64 * dt)
        .collect();
    let datetime: Vec<DateTime<Utc>> = time
        .iter()
        .map(|&t| origin + Duration::milliseconds((t * 1000.0).round() as i64))
        .collect();

    let mut dataset = ds.clone();
    let precomputed = (
        dataset.umean.take(),
        dataset.vmean.take(),
        dataset.wmean.take(),
    );
    let (umean, vmean, wmean) = match precomputed {
        (Some(u), Some(v), Some(w)) => (u, v, w),
        _ => (
            temporal_mean(&ds.u),
            temporal_mean(&ds.v),
            temporal_mean(&ds.w),
        ),
    };

    let up = &ds.u - &umean.insert_axis(Axis(3));
    let vp = &ds.v - &vmean.insert_axis(Axis(3));
    let wp = &ds.w - &wmean.insert_axis(Axis(3));

    Ok(TimeAlignedDataset {
        dataset,
        time,
        datetime,
        up,
        vp,
        wp,
    })
}

fn temporal_mean(field: &Array4<f64>) -> Array3<f64> {
    // ndt > 0 is checked by the caller, so the reduction is never empty
    field
        .mean_axis(Axis(3))
        .unwrap_or_else(|| Array3::zeros((field.shape()[0], field.shape()[1], field.shape()[2])))
}
