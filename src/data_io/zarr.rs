//! Chunked-array-store persistence for decoded plane datasets.
//!
//! The store is a Zarr v2 directory tree: a `.zgroup` marker, one
//! subdirectory per array with `.zarray` metadata and raw little-endian
//! chunks, and xarray-style `_ARRAY_DIMENSIONS` attributes so the dimension
//! labels survive a round trip. Fields are chunked one time step per chunk;
//! coordinates and means are written as a single chunk. No compression.

use ndarray::{Array1, Array3, Array4, ArrayD, Axis, IxDyn};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::error::SamplingError;
use crate::sampling::dataset::PlaneDataset;
use crate::sampling::DimLabel;

/// Write a decoded dataset as a Zarr store at `path`.
pub fn write_dataset(ds: &PlaneDataset, path: &Path) -> Result<(), SamplingError> {
    fs::create_dir_all(path)?;
    fs::write(path.join(".zgroup"), r#"{"zarr_format": 2}"#)?;
    let attrs = json!({
        "group": ds.group,
        "sampling_type": ds.sampling_type.as_str(),
    });
    fs::write(path.join(".zattrs"), serde_json::to_string_pretty(&attrs)?)?;

    for (label, coord) in [
        (DimLabel::X, &ds.x),
        (DimLabel::Y, &ds.y),
        (DimLabel::Z, &ds.z),
    ] {
        write_coord(path, label.as_str(), coord)?;
    }
    write_timesteps(path, &ds.samplingtimestep)?;

    let dims: Vec<&str> = ds.dims.iter().map(|d| d.as_str()).collect();
    for (name, field) in ds.fields() {
        write_field(path, name, field, &dims)?;
    }
    for (name, mean) in ds.mean_fields() {
        write_mean(path, name, mean, &dims[..3])?;
    }
    Ok(())
}

/// Read a dataset back from a Zarr store written by [`write_dataset`].
pub fn read_dataset(path: &Path) -> Result<PlaneDataset, SamplingError> {
    use crate::sampling::SamplingType;

    if !path.join(".zgroup").exists() {
        return Err(SamplingError::Format(format!(
            "{} is not a Zarr store (no .zgroup)",
            path.display()
        )));
    }
    let attrs: Value = serde_json::from_str(&fs::read_to_string(path.join(".zattrs"))?)?;
    let group = attrs["group"]
        .as_str()
        .ok_or_else(|| SamplingError::Format("store has no `group` attribute".to_string()))?
        .to_string();
    let sampling_type = SamplingType::from_attr(
        attrs["sampling_type"].as_str().ok_or_else(|| {
            SamplingError::Format("store has no `sampling_type` attribute".to_string())
        })?,
    )?;

    let u = read_array(path, "u")?;
    if u.dims.len() != 4 {
        return Err(SamplingError::Format(format!(
            "field `u` has {} dimensions, expected 4",
            u.dims.len()
        )));
    }
    let mut dims = [DimLabel::SamplingTimeStep; 4];
    for (slot, name) in dims.iter_mut().zip(&u.dims) {
        *slot = DimLabel::from_str(name)?;
    }

    let x = read_array(path, "x")?.into_array1()?;
    let y = read_array(path, "y")?.into_array1()?;
    let z = read_array(path, "z")?.into_array1()?;
    let samplingtimestep: Vec<i64> = read_array(path, "samplingtimestep")?
        .into_array1()?
        .iter()
        .map(|&v| v as i64)
        .collect();

    let optional = |name: &str| -> Result<Option<Array4<f64>>, SamplingError> {
        if path.join(name).join(".zarray").exists() {
            Ok(Some(read_array(path, name)?.into_array4()?))
        } else {
            Ok(None)
        }
    };
    let optional_mean = |name: &str| -> Result<Option<Array3<f64>>, SamplingError> {
        if path.join(name).join(".zarray").exists() {
            Ok(Some(read_array(path, name)?.into_array3()?))
        } else {
            Ok(None)
        }
    };

    Ok(PlaneDataset {
        group,
        sampling_type,
        dims,
        x,
        y,
        z,
        samplingtimestep,
        u: u.into_array4()?,
        v: read_array(path, "v")?.into_array4()?,
        w: read_array(path, "w")?.into_array4()?,
        temperature: optional("temperature")?,
        tke: optional("tke")?,
        umean: optional_mean("umean")?,
        vmean: optional_mean("vmean")?,
        wmean: optional_mean("wmean")?,
    })
}

fn write_coord(store: &Path, name: &str, coord: &Array1<f64>) -> Result<(), SamplingError> {
    let chunk = bytes_f64(coord.iter().copied());
    write_array(store, name, &[coord.len()], &[coord.len()], "<f8", &[name], vec![chunk])
}

fn write_timesteps(store: &Path, steps: &[i64]) -> Result<(), SamplingError> {
    let chunk: Vec<u8> = steps.iter().flat_map(|v| v.to_le_bytes()).collect();
    write_array(
        store,
        "samplingtimestep",
        &[steps.len()],
        &[steps.len()],
        "<i8",
        &["samplingtimestep"],
        vec![chunk],
    )
}

fn write_field(
    store: &Path,
    name: &str,
    field: &Array4<f64>,
    dims: &[&str],
) -> Result<(), SamplingError> {
    let shape = field.shape().to_vec();
    let chunks = vec![shape[0], shape[1], shape[2], 1];
    let chunk_data: Vec<Vec<u8>> = (0..shape[3])
        .map(|t| bytes_f64(field.index_axis(Axis(3), t).iter().copied()))
        .collect();
    write_array(store, name, &shape, &chunks, "<f8", dims, chunk_data)
}

fn write_mean(
    store: &Path,
    name: &str,
    mean: &Array3<f64>,
    dims: &[&str],
) -> Result<(), SamplingError> {
    let shape = mean.shape().to_vec();
    let chunk = bytes_f64(mean.iter().copied());
    write_array(store, name, &shape, &shape, "<f8", dims, vec![chunk])
}

/// Write one array: `.zarray` metadata, `_ARRAY_DIMENSIONS` attributes and
/// the chunk files. Chunks are provided in order along the last axis; all
/// other axes are single-chunk.
fn write_array(
    store: &Path,
    name: &str,
    shape: &[usize],
    chunks: &[usize],
    dtype: &str,
    dims: &[&str],
    chunk_data: Vec<Vec<u8>>,
) -> Result<(), SamplingError> {
    let dir = store.join(name);
    fs::create_dir_all(&dir)?;

    let meta = json!({
        "zarr_format": 2,
        "shape": shape,
        "chunks": chunks,
        "dtype": dtype,
        "compressor": Value::Null,
        "fill_value": Value::Null,
        "filters": Value::Null,
        "order": "C",
    });
    fs::write(dir.join(".zarray"), serde_json::to_string_pretty(&meta)?)?;
    let attrs = json!({ "_ARRAY_DIMENSIONS": dims });
    fs::write(dir.join(".zattrs"), serde_json::to_string_pretty(&attrs)?)?;

    let leading_zeros = vec!["0"; shape.len().saturating_sub(1)];
    for (t, data) in chunk_data.into_iter().enumerate() {
        let mut key: Vec<String> = leading_zeros.iter().map(|s| s.to_string()).collect();
        key.push(t.to_string());
        fs::write(dir.join(key.join(".")), data)?;
    }
    Ok(())
}

fn bytes_f64(values: impl Iterator<Item = f64>) -> Vec<u8> {
    values.flat_map(|v| v.to_le_bytes()).collect()
}

/// One array read from a store, with its dimension labels.
struct StoredArray {
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl StoredArray {
    fn into_array1(self) -> Result<Array1<f64>, SamplingError> {
        self.data
            .into_dimensionality()
            .map_err(|_| SamplingError::Format("expected a 1-D array".to_string()))
    }

    fn into_array3(self) -> Result<Array3<f64>, SamplingError> {
        self.data
            .into_dimensionality()
            .map_err(|_| SamplingError::Format("expected a 3-D array".to_string()))
    }

    fn into_array4(self) -> Result<Array4<f64>, SamplingError> {
        self.data
            .into_dimensionality()
            .map_err(|_| SamplingError::Format("expected a 4-D array".to_string()))
    }
}

fn read_array(store: &Path, name: &str) -> Result<StoredArray, SamplingError> {
    let dir = store.join(name);
    let meta: Value = serde_json::from_str(&fs::read_to_string(dir.join(".zarray"))?)?;
    let shape = usize_vec(&meta["shape"], name)?;
    let chunks = usize_vec(&meta["chunks"], name)?;
    let dtype = meta["dtype"].as_str().unwrap_or_default().to_string();
    if !meta["compressor"].is_null() {
        return Err(SamplingError::Format(format!(
            "array `{name}` is compressed; only uncompressed stores are supported"
        )));
    }
    if dtype != "<f8" && dtype != "<i8" {
        return Err(SamplingError::Format(format!(
            "array `{name}` has unsupported dtype `{dtype}`"
        )));
    }
    if shape.is_empty() || shape.len() != chunks.len() {
        return Err(SamplingError::Format(format!(
            "array `{name}` has inconsistent shape/chunks metadata"
        )));
    }
    // Chunking is only ever along the last axis in stores we write
    if shape[..shape.len() - 1] != chunks[..chunks.len() - 1] {
        return Err(SamplingError::Format(format!(
            "array `{name}` uses an unsupported chunk layout"
        )));
    }

    let attrs: Value = serde_json::from_str(&fs::read_to_string(dir.join(".zattrs"))?)?;
    let dims: Vec<String> = attrs["_ARRAY_DIMENSIONS"]
        .as_array()
        .map(|v| {
            v.iter()
                .filter_map(|d| d.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let last = shape.len() - 1;
    let chunk_len = chunks[last].max(1);
    let nchunks = shape[last].div_ceil(chunk_len);
    let leading_zeros = vec!["0"; last];

    let mut parts: Vec<ArrayD<f64>> = Vec::with_capacity(nchunks);
    for c in 0..nchunks {
        let mut key: Vec<String> = leading_zeros.iter().map(|s| s.to_string()).collect();
        key.push(c.to_string());
        let bytes = fs::read(dir.join(key.join(".")))?;
        let values = decode_values(&bytes, &dtype, name)?;
        let extent = (shape[last] - c * chunk_len).min(chunk_len);
        let mut chunk_shape = shape.clone();
        chunk_shape[last] = extent;
        let expected: usize = chunk_shape.iter().product();
        if values.len() != expected {
            return Err(SamplingError::ShapeMismatch {
                expected,
                actual: values.len(),
                context: format!("{name} chunk {c}"),
            });
        }
        let chunk = ArrayD::from_shape_vec(IxDyn(&chunk_shape), values).map_err(|_| {
            SamplingError::ShapeMismatch {
                expected,
                actual: 0,
                context: name.to_string(),
            }
        })?;
        parts.push(chunk);
    }
    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    let data = ndarray::concatenate(Axis(last), &views)
        .map_err(|_| SamplingError::Format(format!("array `{name}` chunks do not assemble")))?;
    Ok(StoredArray { dims, data })
}

fn decode_values(bytes: &[u8], dtype: &str, name: &str) -> Result<Vec<f64>, SamplingError> {
    if bytes.len() % 8 != 0 {
        return Err(SamplingError::Format(format!(
            "array `{name}` chunk is not a whole number of 8-byte values"
        )));
    }
    let values = bytes
        .chunks_exact(8)
        .map(|c| {
            let raw: [u8; 8] = c.try_into().expect("chunks_exact yields 8 bytes");
            if dtype == "<i8" {
                i64::from_le_bytes(raw) as f64
            } else {
                f64::from_le_bytes(raw)
            }
        })
        .collect();
    Ok(values)
}

fn usize_vec(value: &Value, name: &str) -> Result<Vec<usize>, SamplingError> {
    value
        .as_array()
        .map(|v| {
            v.iter()
                .map(|e| e.as_u64().map(|u| u as usize))
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or(None)
        .ok_or_else(|| SamplingError::Format(format!("array `{name}` has malformed metadata")))
}
