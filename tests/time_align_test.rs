use chrono::TimeZone;
use chrono::Utc;
use ndarray::{Array1, Array4, Axis};
use windpost::sampling::{attach_time, default_origin, DimLabel, PlaneDataset};
use windpost::{SamplingError, SamplingType};

fn make_dataset(samplingtimestep: Vec<i64>) -> PlaneDataset {
    let ndt = samplingtimestep.len();
    let shape = (2, 2, 1, ndt);
    let seq = |offset: f64| {
        Array4::from_shape_fn(shape, |(i, j, k, t)| {
            offset + (((t + k) * 2 + j) * 2 + i) as f64 * 0.25 + t as f64
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
        y: Array1::from(vec![0.0, 5.0]),
        z: Array1::from(vec![100.0]),
        samplingtimestep,
        u: seq(10.0),
        v: seq(-3.0),
        w: seq(0.5),
        temperature: None,
        tke: None,
        umean: None,
        vmean: None,
        wmean: None,
    }
}

#[test]
fn non_positive_dt_is_rejected() {
    let ds = make_dataset(vec![0, 1, 2]);
    for dt in [0.0, -1.0, -0.001] {
        let result = attach_time(&ds, dt, default_origin());
        assert!(
            matches!(result, Err(SamplingError::Precondition(_))),
            "dt = {dt} should be rejected"
        );
    }
}

#[test]
fn time_axis_scales_the_step_index() {
    let ds = make_dataset(vec![0, 2, 4]);
    let aligned = attach_time(&ds, 0.5, default_origin()).unwrap();
    assert_eq!(aligned.time.to_vec(), vec![0.0, 1.0, 2.0]);

    let origin = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(aligned.datetime[0], origin);
    assert_eq!(aligned.datetime[2], origin + chrono::Duration::seconds(2));
}

#[test]
fn sampling_time_step_is_preserved() {
    let ds = make_dataset(vec![3, 4, 5, 6]);
    let aligned = attach_time(&ds, 2.0, default_origin()).unwrap();
    assert_eq!(aligned.dataset.samplingtimestep, vec![3, 4, 5, 6]);
    assert_eq!(aligned.time.to_vec(), vec![6.0, 8.0, 10.0, 12.0]);
}

#[test]
fn fluctuations_recombine_to_the_field() {
    let ds = make_dataset(vec![0, 1, 2, 3, 4]);
    let aligned = attach_time(&ds, 1.0, default_origin()).unwrap();

    for (field, fluct) in [(&ds.u, &aligned.up), (&ds.v, &aligned.vp), (&ds.w, &aligned.wp)] {
        let mean = field.mean_axis(Axis(3)).unwrap();
        for ((i, j, k, t), &value) in field.indexed_iter() {
            let recombined = fluct[[i, j, k, t]] + mean[[i, j, k]];
            assert!(
                (recombined - value).abs() < 1e-12,
                "up + mean(u) must equal u at ({i},{j},{k},{t})"
            );
        }
    }
}

#[test]
fn input_dataset_is_not_mutated() {
    let ds = make_dataset(vec![0, 1, 2]);
    let before = ds.clone();
    let _ = attach_time(&ds, 1.0, default_origin()).unwrap();
    assert_eq!(ds.u, before.u);
    assert_eq!(ds.samplingtimestep, before.samplingtimestep);
}
