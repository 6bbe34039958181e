use ndarray::{Array1, Array3, Array4};
use tempfile::tempdir;
use windpost::data_io::zarr;
use windpost::sampling::{attach_time, default_origin, DimLabel, PlaneDataset};
use windpost::SamplingType;

fn make_dataset() -> PlaneDataset {
    let shape = (2, 3, 2, 4);
    let seq = |offset: f64| {
        Array4::from_shape_fn(shape, |(i, j, k, t)| {
            offset + (((t * 2 + k) * 3 + j) * 2 + i) as f64
        })
    };
    PlaneDataset {
        group: "T1".to_string(),
        sampling_type: SamplingType::Plane,
        dims: [
            DimLabel::X,
            DimLabel::Y,
            DimLabel::Z,
            DimLabel::SamplingTimeStep,
        ],
        x: Array1::from(vec![0.0, 5.0]),
        y: Array1::from(vec![0.0, 5.0, 10.0]),
        z: Array1::from(vec![90.0, 100.0]),
        samplingtimestep: vec![0, 2, 4, 6],
        u: seq(0.0),
        v: seq(1000.0),
        w: seq(2000.0),
        temperature: Some(seq(300.0)),
        tke: None,
        umean: None,
        vmean: None,
        wmean: None,
    }
}

#[test]
fn round_trip_is_exact() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("T1.zarr");
    let ds = make_dataset();

    zarr::write_dataset(&ds, &store).unwrap();
    let restored = zarr::read_dataset(&store).unwrap();

    assert_eq!(restored.group, ds.group);
    assert_eq!(restored.sampling_type, ds.sampling_type);
    assert_eq!(restored.dims, ds.dims);
    assert_eq!(restored.x, ds.x);
    assert_eq!(restored.y, ds.y);
    assert_eq!(restored.z, ds.z);
    assert_eq!(restored.samplingtimestep, ds.samplingtimestep);
    // No transformation is applied anywhere, so equality is exact
    assert_eq!(restored.u, ds.u);
    assert_eq!(restored.v, ds.v);
    assert_eq!(restored.w, ds.w);
    assert_eq!(restored.temperature, ds.temperature);
    assert_eq!(restored.tke, None);
    assert!(restored.umean.is_none());
}

#[test]
fn dimension_labels_survive_for_every_normal() {
    use DimLabel::*;
    for dims in [
        [Y, Z, X, SamplingTimeStep],
        [X, Z, Y, SamplingTimeStep],
        [X, Y, Z, SamplingTimeStep],
    ] {
        let dir = tempdir().unwrap();
        let store = dir.path().join("T1.zarr");
        let mut ds = make_dataset();
        ds.dims = dims;
        zarr::write_dataset(&ds, &store).unwrap();
        assert_eq!(zarr::read_dataset(&store).unwrap().dims, dims);
    }
}

#[test]
fn precomputed_means_round_trip_and_are_consumed() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("T1.zarr");
    let mut ds = make_dataset();
    let mean_shape = (2, 3, 2);
    ds.umean = Some(Array3::from_elem(mean_shape, 1.5));
    ds.vmean = Some(Array3::from_elem(mean_shape, 2.5));
    ds.wmean = Some(Array3::from_elem(mean_shape, 3.5));

    zarr::write_dataset(&ds, &store).unwrap();
    let restored = zarr::read_dataset(&store).unwrap();
    assert_eq!(restored.umean, ds.umean);

    let aligned = attach_time(&restored, 0.5, default_origin()).unwrap();
    // Means from the store are consumed, not recomputed
    assert!(aligned.dataset.umean.is_none());
    assert!(aligned.dataset.vmean.is_none());
    assert!(aligned.dataset.wmean.is_none());
    assert_eq!(aligned.up[[0, 0, 0, 0]], restored.u[[0, 0, 0, 0]] - 1.5);
    assert_eq!(aligned.vp[[1, 2, 1, 3]], restored.v[[1, 2, 1, 3]] - 2.5);
}

#[test]
fn reading_a_non_store_fails() {
    let dir = tempdir().unwrap();
    assert!(zarr::read_dataset(&dir.path().join("missing.zarr")).is_err());
}
