use approx::assert_abs_diff_eq;
use stream_math::{
    AggregationType, Interpolation, RecursiveLinearRegression, Resampler, RoundStart, TimeEma,
    WindowedAverage,
};

// Readings every 700ms, so resample buckets of 1s see one or two readings
fn irregular_readings(count: i64) -> Vec<(i64, f64)> {
    (0..count)
        .map(|i| {
            let t = 1_350 + i * 700;
            (t, (t as f64 / 5_000.0).sin())
        })
        .collect()
}

#[test]
fn test_resampler_emits_dense_ticks() {
    let mut resampler = Resampler::new(
        1_000,
        AggregationType::Avg,
        RoundStart::Second,
        Interpolation::Linear,
    )
    .unwrap();

    let mut starts = Vec::new();
    for (t, v) in irregular_readings(100) {
        for bucket in resampler.update(t, v).unwrap() {
            starts.push(bucket.start);
        }
    }

    assert_eq!(starts[0], 1_000);
    for pair in starts.windows(2) {
        assert_eq!(pair[1] - pair[0], 1_000);
    }
}

#[test]
fn test_slow_and_fast_ema_agree_on_flat_signal() {
    let mut fast = TimeEma::new(60_000, 10_000, Interpolation::Previous).unwrap();
    let mut slow = TimeEma::new(600_000, 10_000, Interpolation::Previous).unwrap();
    let mut window = WindowedAverage::new(10_000).unwrap();

    for i in 0..2_000 {
        let t = i * 1_000;
        fast.update(t, 42.0).unwrap();
        slow.update(t, 42.0).unwrap();
        window.update(t, 42.0).unwrap();
    }

    assert_abs_diff_eq!(fast.value().unwrap(), 42.0, epsilon = 1e-9);
    assert_abs_diff_eq!(slow.value().unwrap(), 42.0, epsilon = 1e-9);
    assert_abs_diff_eq!(window.value().unwrap(), 42.0, epsilon = 1e-9);
}

#[test]
fn test_regression_on_ema_features_stays_finite() {
    let mut ema = TimeEma::new(60_000, 10_000, Interpolation::Previous).unwrap();
    let mut model = RecursiveLinearRegression::new(2, 1.0, 1.0).unwrap();

    for (t, v) in irregular_readings(2_000) {
        if let Ok(e) = ema.value() {
            model.partial_fit(&[v, e], v).unwrap();
        }
        ema.update(t, v).unwrap();
    }

    assert!(model.updates() > 0);
    assert!(model.weights().iter().all(|w| w.is_finite()));
}
