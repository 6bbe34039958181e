//! Legacy ASCII VTK export of decoded plane datasets.
//!
//! One `STRUCTURED_POINTS` file is written per time step, walking the grid
//! in z-outer, y-mid, x-inner order with one velocity triple per point.
//! Spacing is taken from the first two coordinate samples along each axis,
//! so non-uniform grids come out geometrically wrong; this mirrors the
//! historical format and is a known limitation, not something detected here.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::SamplingError;
use crate::sampling::dataset::PlaneDataset;

/// Write one `Amb.t{t}.vtk` file per selected time step into `output_path`.
///
/// `output_path` must already exist. `itime_f == -1` selects through the
/// last step. `offsetz` shifts the reported z origin. Each file is written
/// to a temporary sibling and renamed on success, so a failed export never
/// leaves a truncated `.vtk` behind.
pub fn to_vtk(
    ds: &PlaneDataset,
    output_path: &Path,
    offsetz: f64,
    itime_i: usize,
    itime_f: i64,
    verbose: bool,
) -> Result<(), SamplingError> {
    if !output_path.exists() {
        return Err(SamplingError::Precondition(format!(
            "the output path {} should exist",
            output_path.display()
        )));
    }

    let ndt = ds.ndt();
    let itime_f = if itime_f < 0 { ndt } else { itime_f as usize };
    if itime_f > ndt || itime_i >= itime_f {
        return Err(SamplingError::Precondition(format!(
            "invalid time range [{itime_i}, {itime_f}) for {ndt} steps"
        )));
    }

    for t in itime_i..itime_f {
        let target = output_path.join(format!("Amb.t{t}.vtk"));
        if verbose {
            println!("Saving {}", target.display());
        }
        let tmp = output_path.join(format!("Amb.t{t}.vtk.tmp"));
        write_time_step(ds, t, offsetz, &tmp)?;
        fs::rename(&tmp, &target)?;
    }
    Ok(())
}

fn write_time_step(
    ds: &PlaneDataset,
    t: usize,
    offsetz: f64,
    path: &Path,
) -> Result<(), SamplingError> {
    let (nx, ny, nz) = (ds.x.len(), ds.y.len(), ds.z.len());
    let npoints = nx * ny * nz;
    let mut out = BufWriter::new(File::create(path)?);

    writeln!(out, "# vtk DataFile Version 3.0")?;
    writeln!(
        out,
        "{} with offset in z of {}",
        ds.sampling_type.as_str(),
        offsetz
    )?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET STRUCTURED_POINTS")?;
    writeln!(out, "DIMENSIONS {nx} {ny} {nz}")?;
    writeln!(
        out,
        "ORIGIN {} {} {}",
        ds.x[0],
        ds.y[0],
        ds.z[0] + offsetz
    )?;
    writeln!(
        out,
        "SPACING {} {} {}",
        axis_spacing(&ds.x),
        axis_spacing(&ds.y),
        axis_spacing(&ds.z)
    )?;
    writeln!(out, "POINT_DATA {npoints}")?;
    writeln!(out, "FIELD attributes 1")?;
    writeln!(out, "U 3 {npoints} float")?;

    for iz in 0..nz {
        for iy in 0..ny {
            for ix in 0..nx {
                let (u, v, w) = ds.velocity_at(ix, iy, iz, t);
                writeln!(out, "{u:.5}\t{v:.5}\t{w:.5}")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

// Single-sample axes (a plane with one slice along its normal) have no
// measurable spacing; fall back to 1 so the header stays valid.
fn axis_spacing(coord: &ndarray::Array1<f64>) -> f64 {
    if coord.len() >= 2 {
        coord[1] - coord[0]
    } else {
        1.0
    }
}
