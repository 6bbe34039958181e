use ndarray::{Array1, Array4};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use windpost::data_io::vtk::to_vtk;
use windpost::sampling::{DimLabel, PlaneDataset};
use windpost::{SamplingError, SamplingType};

fn make_dataset(dims: [DimLabel; 4]) -> PlaneDataset {
    let shape = (2, 2, 2, 3);
    let seq = |offset: f64| {
        Array4::from_shape_fn(shape, |(i, j, k, t)| {
            offset + (((t * 2 + k) * 2 + j) * 2 + i) as f64
        })
    };
    PlaneDataset {
        group: "T1".to_string(),
        sampling_type: SamplingType::Plane,
        dims,
        x: Array1::from(vec![0.0, 5.0]),
        y: Array1::from(vec![0.0, 10.0]),
        z: Array1::from(vec![80.0, 120.0]),
        samplingtimestep: vec![0, 1, 2],
        u: seq(0.0),
        v: seq(100.0),
        w: seq(200.0),
        temperature: None,
        tke: None,
        umean: None,
        vmean: None,
        wmean: None,
    }
}

fn z_normal_dims() -> [DimLabel; 4] {
    [
        DimLabel::X,
        DimLabel::Y,
        DimLabel::Z,
        DimLabel::SamplingTimeStep,
    ]
}

#[test]
fn missing_output_path_fails_before_writing() {
    let ds = make_dataset(z_normal_dims());
    let result = to_vtk(&ds, Path::new("no/such/dir"), 0.0, 0, -1, false);
    assert!(matches!(result, Err(SamplingError::Precondition(_))));
}

#[test]
fn writes_one_file_per_time_step() {
    let ds = make_dataset(z_normal_dims());
    let dir = tempdir().unwrap();
    to_vtk(&ds, dir.path(), 0.0, 0, -1, false).unwrap();

    for t in 0..3 {
        assert!(dir.path().join(format!("Amb.t{t}.vtk")).exists());
    }
    // No temporary files left behind
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn header_and_records_match_the_format() {
    let ds = make_dataset(z_normal_dims());
    let dir = tempdir().unwrap();
    to_vtk(&ds, dir.path(), 5.0, 1, 2, false).unwrap();

    assert!(!dir.path().join("Amb.t0.vtk").exists());
    let content = fs::read_to_string(dir.path().join("Amb.t1.vtk")).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines[0], "# vtk DataFile Version 3.0");
    assert_eq!(lines[1], "PlaneSampler with offset in z of 5");
    assert_eq!(lines[2], "ASCII");
    assert_eq!(lines[3], "DATASET STRUCTURED_POINTS");
    assert_eq!(lines[4], "DIMENSIONS 2 2 2");
    assert_eq!(lines[5], "ORIGIN 0 0 85");
    assert_eq!(lines[6], "SPACING 5 10 40");
    assert_eq!(lines[7], "POINT_DATA 8");
    assert_eq!(lines[8], "FIELD attributes 1");
    assert_eq!(lines[9], "U 3 8 float");

    // 8 grid points, x innermost; first record is (x0, y0, z0) at t=1
    assert_eq!(lines.len(), 10 + 8);
    assert_eq!(lines[10], "8.00000\t108.00000\t208.00000");
    assert_eq!(lines[11], "9.00000\t109.00000\t209.00000");
    // second record row: y advances before z
    assert_eq!(lines[12], "10.00000\t110.00000\t210.00000");
}

#[test]
fn lookup_respects_the_label_permutation() {
    // x-normal labeling: array axes are (y, z, x, time)
    let dims = [
        DimLabel::Y,
        DimLabel::Z,
        DimLabel::X,
        DimLabel::SamplingTimeStep,
    ];
    let ds = make_dataset(dims);
    let dir = tempdir().unwrap();
    to_vtk(&ds, dir.path(), 0.0, 0, 1, false).unwrap();

    let content = fs::read_to_string(dir.path().join("Amb.t0.vtk")).unwrap();
    let first = content.lines().nth(10).unwrap();
    // (x0, y0, z0) maps to u[[0, 0, 0, 0]] either way, but the x step now
    // walks array axis 2: the second record is u[[0, 0, 1, 0]] = 4
    let second = content.lines().nth(11).unwrap();
    assert_eq!(first, "0.00000\t100.00000\t200.00000");
    assert_eq!(second, "4.00000\t104.00000\t204.00000");
}

#[test]
fn bad_time_range_is_rejected() {
    let ds = make_dataset(z_normal_dims());
    let dir = tempdir().unwrap();
    assert!(matches!(
        to_vtk(&ds, dir.path(), 0.0, 2, 2, false),
        Err(SamplingError::Precondition(_))
    ));
    assert!(matches!(
        to_vtk(&ds, dir.path(), 0.0, 0, 4, false),
        Err(SamplingError::Precondition(_))
    ));
}
