//! Per-group geometry extraction.

use ndarray::{Array1, Array2};
use netcdf::AttributeValue;

use super::{PlaneNormal, SampleGroup, SamplingReader, SamplingType};
use crate::error::SamplingError;

impl SamplingReader {
    /// Extract the geometry of a sampled group: sampler kind, grid
    /// dimensions, time-step range, plane normal and coordinate axes.
    pub fn group_properties(&self, group: &str) -> Result<SampleGroup, SamplingError> {
        let file = netcdf::open(self.path())?;
        let grp = file
            .group(group)?
            .ok_or_else(|| SamplingError::MissingGroup(group.to_string()))?;
        extract_properties(group, &grp)
    }
}

/// Build a [`SampleGroup`] from an opened group handle.
pub(crate) fn extract_properties(
    name: &str,
    grp: &netcdf::Group,
) -> Result<SampleGroup, SamplingError> {
    let sampling_type = SamplingType::from_attr(&attr_string(grp, "sampling_type")?)?;

    let ijk = attr_i64_vec(grp, "ijk_dims")?;
    if ijk.len() != 3 || ijk.iter().any(|&d| d <= 0) {
        return Err(SamplingError::Format(format!(
            "ijk_dims must be 3 positive integers, got {ijk:?}"
        )));
    }
    let (nx, ny, nz) = (ijk[0] as usize, ijk[1] as usize, ijk[2] as usize);

    let ndt = grp
        .dimension("num_time_steps")
        .ok_or_else(|| {
            SamplingError::Format(format!("group `{name}` has no num_time_steps dimension"))
        })?
        .len();

    // The stored time-step indices; absent in older files, where they are
    // simply 0..ndt.
    let (tdi, tdf) = match grp.variable("num_time_steps") {
        Some(var) => {
            let steps: Vec<i64> = var.get_values(..)?;
            match (steps.first(), steps.last()) {
                (Some(&first), Some(&last)) => (first, last),
                _ => (0, ndt as i64 - 1),
            }
        }
        None => (0, ndt.saturating_sub(1) as i64),
    };

    let normal = match sampling_type {
        SamplingType::Plane => Some(PlaneNormal::from_axis3(&attr_f64_vec(grp, "axis3")?)?),
        _ => None,
    };

    let (x, y, z) = coordinate_axes(grp)?;
    if sampling_type == SamplingType::Plane && x.len() * y.len() * z.len() != nx * ny * nz {
        return Err(SamplingError::Format(format!(
            "group `{name}`: {}x{}x{} unique coordinates do not form the declared {nx}x{ny}x{nz} grid",
            x.len(),
            y.len(),
            z.len()
        )));
    }

    Ok(SampleGroup {
        name: name.to_string(),
        sampling_type,
        nx,
        ny,
        nz,
        ndt,
        tdi,
        tdf,
        normal,
        x,
        y,
        z,
    })
}

/// Sorted unique values of each column of the (num_points, 3) coordinate
/// array.
fn coordinate_axes(
    grp: &netcdf::Group,
) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>), SamplingError> {
    let var = grp
        .variable("coordinates")
        .ok_or_else(|| SamplingError::MissingVariable("coordinates".to_string()))?;
    let raw: Vec<f64> = var.get_values(..)?;
    if raw.len() % 3 != 0 {
        return Err(SamplingError::ShapeMismatch {
            expected: raw.len() / 3 * 3,
            actual: raw.len(),
            context: "coordinates".to_string(),
        });
    }
    let npoints = raw.len() / 3;
    let coords = Array2::from_shape_vec((npoints, 3), raw).map_err(|_| {
        SamplingError::ShapeMismatch {
            expected: npoints * 3,
            actual: 0,
            context: "coordinates".to_string(),
        }
    })?;

    let axis = |col: usize| {
        let mut values: Vec<f64> = coords.column(col).to_vec();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Array1::from(values)
    };
    Ok((axis(0), axis(1), axis(2)))
}

pub(crate) fn attr_string(grp: &netcdf::Group, name: &str) -> Result<String, SamplingError> {
    match attr_value(grp, name)? {
        AttributeValue::Str(s) => Ok(s),
        AttributeValue::Strs(v) if v.len() == 1 => Ok(v.into_iter().next().unwrap_or_default()),
        other => Err(SamplingError::Format(format!(
            "attribute `{name}` is not a string: {other:?}"
        ))),
    }
}

pub(crate) fn attr_i64_vec(grp: &netcdf::Group, name: &str) -> Result<Vec<i64>, SamplingError> {
    match attr_value(grp, name)? {
        AttributeValue::Int(v) => Ok(vec![i64::from(v)]),
        AttributeValue::Ints(v) => Ok(v.into_iter().map(i64::from).collect()),
        AttributeValue::Longlong(v) => Ok(vec![v]),
        AttributeValue::Longlongs(v) => Ok(v),
        AttributeValue::Short(v) => Ok(vec![i64::from(v)]),
        AttributeValue::Shorts(v) => Ok(v.into_iter().map(i64::from).collect()),
        other => Err(SamplingError::Format(format!(
            "attribute `{name}` is not an integer vector: {other:?}"
        ))),
    }
}

pub(crate) fn attr_f64_vec(grp: &netcdf::Group, name: &str) -> Result<Vec<f64>, SamplingError> {
    match attr_value(grp, name)? {
        AttributeValue::Double(v) => Ok(vec![v]),
        AttributeValue::Doubles(v) => Ok(v),
        AttributeValue::Float(v) => Ok(vec![f64::from(v)]),
        AttributeValue::Floats(v) => Ok(v.into_iter().map(f64::from).collect()),
        // Integer-typed axis vectors appear in files written by older versions
        other => attr_i64_vec_from(other, name).map(|v| v.into_iter().map(|i| i as f64).collect()),
    }
}

fn attr_i64_vec_from(value: AttributeValue, name: &str) -> Result<Vec<i64>, SamplingError> {
    match value {
        AttributeValue::Int(v) => Ok(vec![i64::from(v)]),
        AttributeValue::Ints(v) => Ok(v.into_iter().map(i64::from).collect()),
        AttributeValue::Longlong(v) => Ok(vec![v]),
        AttributeValue::Longlongs(v) => Ok(v),
        AttributeValue::Short(v) => Ok(vec![i64::from(v)]),
        AttributeValue::Shorts(v) => Ok(v.into_iter().map(i64::from).collect()),
        other => Err(SamplingError::Format(format!(
            "attribute `{name}` is not numeric: {other:?}"
        ))),
    }
}

fn attr_value(grp: &netcdf::Group, name: &str) -> Result<AttributeValue, SamplingError> {
    let att = grp.attribute(name).ok_or_else(|| {
        SamplingError::Format(format!("group `{}` has no `{name}` attribute", grp.name()))
    })?;
    Ok(att.value()?)
}
