//! Single-file NetCDF archive output for decoded plane datasets.

use std::path::Path;

use crate::error::SamplingError;
use crate::sampling::dataset::PlaneDataset;
use crate::sampling::DimLabel;

/// Write a decoded dataset to a single NetCDF file.
///
/// Dimensions are created under the dataset's labels, coordinate variables
/// are attached under the same names, and every field shares the labeled
/// dimension tuple.
pub fn write_dataset(ds: &PlaneDataset, path: &Path) -> Result<(), SamplingError> {
    let mut file = netcdf::create(path)?;

    file.add_attribute("group", ds.group.as_str())?;
    file.add_attribute("sampling_type", ds.sampling_type.as_str())?;

    let shape = ds.u.shape().to_vec();
    for (label, &len) in ds.dims.iter().zip(&shape) {
        file.add_dimension(label.as_str(), len)?;
    }

    for label in [DimLabel::X, DimLabel::Y, DimLabel::Z] {
        let coord = ds.coord(label);
        let mut var = file.add_variable::<f64>(label.as_str(), &[label.as_str()])?;
        var.put_values(&coord.to_vec(), ..)?;
    }
    {
        let name = DimLabel::SamplingTimeStep.as_str();
        let mut var = file.add_variable::<i64>(name, &[name])?;
        var.put_values(&ds.samplingtimestep, ..)?;
    }

    let dim_names: Vec<&str> = ds.dims.iter().map(|d| d.as_str()).collect();
    for (name, field) in ds.fields() {
        let mut var = file.add_variable::<f64>(name, &dim_names)?;
        var.put_attribute("units", units_for(name))?;
        let values: Vec<f64> = field.iter().copied().collect();
        var.put_values(&values, ..)?;
    }

    Ok(())
}

fn units_for(field: &str) -> &'static str {
    match field {
        "u" | "v" | "w" => "m/s",
        "temperature" => "K",
        "tke" => "m2/s2",
        _ => "",
    }
}
