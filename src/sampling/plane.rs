//! Plane-sampler decoding: the reshape and coordinate-reconstruction
//! pipeline.
//!
//! The source stores each field as a flat array in slowest-to-fastest order
//! (time, z, y, x). Decoding reshapes the selected time window to
//! `(ndt, nz, ny, nx)`, reverses the axis order to `(nx, ny, nz, ndt)`, and
//! reassigns dimension labels according to the plane normal.

use ndarray::{Array2, Array4, Axis};
use std::path::Path;

use super::metadata::extract_properties;
use super::{resolve_fields, FieldKind, ReadOptions, SampleGroup, SamplingReader, SamplingType};
use crate::data_io::{netcdf_out, zarr};
use crate::error::SamplingError;
use crate::sampling::dataset::PlaneDataset;

impl SamplingReader {
    /// Decode one sampled group into a labeled dataset.
    ///
    /// Only plane samplers are supported; line, lidar and probe groups fail
    /// with an explicit unsupported error. When `opts.output` is set the
    /// decoded dataset is also persisted (see [`ReadOptions::output`]).
    pub fn read_single_group(
        &self,
        group: &str,
        opts: &ReadOptions,
    ) -> Result<PlaneDataset, SamplingError> {
        let file = netcdf::open(self.path())?;
        let grp = file
            .group(group)?
            .ok_or_else(|| SamplingError::MissingGroup(group.to_string()))?;
        let props = extract_properties(group, &grp)?;

        match props.sampling_type {
            SamplingType::Plane => self.read_plane_sampler(&grp, &props, opts),
            SamplingType::Line => Err(SamplingError::Unsupported(
                "LineSampler decoding is not implemented".to_string(),
            )),
            SamplingType::Lidar => Err(SamplingError::Unsupported(
                "LidarSampler decoding is not implemented".to_string(),
            )),
            SamplingType::Probe => Err(SamplingError::Unsupported(
                "ProbeSampler decoding is not implemented".to_string(),
            )),
        }
    }

    fn read_plane_sampler(
        &self,
        grp: &netcdf::Group,
        props: &SampleGroup,
        opts: &ReadOptions,
    ) -> Result<PlaneDataset, SamplingError> {
        let normal = props.normal.ok_or_else(|| {
            SamplingError::Format(format!("plane group `{}` has no normal", props.name))
        })?;
        let time_idx = resolve_time_window(opts.itime, opts.ftime, opts.step, props.ndt)?;

        let available: Vec<String> = grp.variables().map(|v| v.name()).collect();
        let fields = resolve_fields(&opts.vars, &available)?;

        let mut u = None;
        let mut v = None;
        let mut w = None;
        let mut temperature = None;
        let mut tke = None;
        for kind in fields {
            let arr = read_plane_field(grp, kind.source_var(), &time_idx, props)?;
            match kind {
                FieldKind::U => u = Some(arr),
                FieldKind::V => v = Some(arr),
                FieldKind::W => w = Some(arr),
                FieldKind::Temperature => temperature = Some(arr),
                FieldKind::Tke => tke = Some(arr),
            }
        }
        let missing = |name: &str| SamplingError::MissingVariable(name.to_string());

        let ds = PlaneDataset {
            group: props.name.clone(),
            sampling_type: props.sampling_type,
            dims: normal.ordered_dims(),
            x: props.x.clone(),
            y: props.y.clone(),
            z: props.z.clone(),
            samplingtimestep: time_idx.iter().map(|&i| i as i64).collect(),
            u: u.ok_or_else(|| missing("velocityx"))?,
            v: v.ok_or_else(|| missing("velocityy"))?,
            w: w.ok_or_else(|| missing("velocityz"))?,
            temperature,
            tke,
            umean: None,
            vmean: None,
            wmean: None,
        };

        if let Some(output) = &opts.output {
            write_output(&ds, output, opts.verbose)?;
        }

        Ok(ds)
    }
}

/// Resolve `[itime, ftime)` with stride `step` against the stored step count.
/// `ftime == -1` always means the full range `ndt`, whatever `itime` and
/// `step` are.
pub(crate) fn resolve_time_window(
    itime: usize,
    ftime: i64,
    step: usize,
    ndt: usize,
) -> Result<Vec<usize>, SamplingError> {
    if step == 0 {
        return Err(SamplingError::Precondition(
            "step must be a positive integer".to_string(),
        ));
    }
    let ftime = if ftime < 0 { ndt } else { ftime as usize };
    if ftime > ndt {
        return Err(SamplingError::Precondition(format!(
            "ftime {ftime} exceeds the {ndt} stored time steps"
        )));
    }
    if itime >= ftime {
        return Err(SamplingError::Precondition(format!(
            "empty time window [{itime}, {ftime})"
        )));
    }
    Ok((itime..ftime).step_by(step).collect())
}

/// Read one field for the selected time steps and decode it to the
/// `(nx, ny, nz, ndt)` layout.
fn read_plane_field(
    grp: &netcdf::Group,
    var_name: &str,
    time_idx: &[usize],
    props: &SampleGroup,
) -> Result<Array4<f64>, SamplingError> {
    let var = grp
        .variable(var_name)
        .ok_or_else(|| SamplingError::MissingVariable(var_name.to_string()))?;
    let raw: Vec<f64> = var.get_values(..)?;

    let ndt_total = var
        .dimensions()
        .first()
        .map(|d| d.len())
        .unwrap_or(raw.len());
    if ndt_total == 0 || raw.len() % ndt_total != 0 {
        return Err(SamplingError::ShapeMismatch {
            expected: ndt_total * props.nx * props.ny * props.nz,
            actual: raw.len(),
            context: var_name.to_string(),
        });
    }
    let npoints = raw.len() / ndt_total;
    let flat = Array2::from_shape_vec((ndt_total, npoints), raw).map_err(|_| {
        SamplingError::ShapeMismatch {
            expected: ndt_total * npoints,
            actual: 0,
            context: var_name.to_string(),
        }
    })?;
    let selected = flat.select(Axis(0), time_idx);

    reshape_plane_field(
        selected.iter().copied().collect(),
        time_idx.len(),
        props.nx,
        props.ny,
        props.nz,
        var_name,
    )
}

/// Decode a flat (time, z, y, x) row-major buffer into `(nx, ny, nz, ndt)`.
///
/// The element count is validated against the declared grid before
/// reshaping; any mismatch is fatal rather than silently truncated. The
/// result is a bijection: element `flat[((t*nz + k)*ny + j)*nx + i]` ends up
/// at `[i, j, k, t]`.
pub(crate) fn reshape_plane_field(
    flat: Vec<f64>,
    ndt: usize,
    nx: usize,
    ny: usize,
    nz: usize,
    context: &str,
) -> Result<Array4<f64>, SamplingError> {
    let expected = ndt * nx * ny * nz;
    if flat.len() != expected {
        return Err(SamplingError::ShapeMismatch {
            expected,
            actual: flat.len(),
            context: context.to_string(),
        });
    }
    let arr =
        Array4::from_shape_vec((ndt, nz, ny, nx), flat).map_err(|_| SamplingError::ShapeMismatch {
            expected,
            actual: 0,
            context: context.to_string(),
        })?;
    Ok(arr.reversed_axes().as_standard_layout().into_owned())
}

fn write_output(ds: &PlaneDataset, output: &Path, verbose: bool) -> Result<(), SamplingError> {
    let ext = output.extension().and_then(|e| e.to_str());
    let target = match ext {
        Some("zarr") | Some("nc") => output.to_path_buf(),
        _ => output.join(format!("{}.zarr", ds.group)),
    };
    if verbose {
        println!("Saving {}", target.display());
    }
    if ext == Some("nc") {
        netcdf_out::write_dataset(ds, &target)
    } else {
        zarr::write_dataset(ds, &target)
    }
}
