use forecast_direct::utils::synthetic_ar1;
use forecast_direct::{
    BootstrapOptions, ForecastError, ForecasterDirect, Lags, LinearRegression, MeanRegressor,
    StandardScaler,
};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` and return the warnings it logged
fn captured_warnings(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

fn fitted_forecaster(n: usize) -> ForecasterDirect<LinearRegression> {
    let y = synthetic_ar1(n, 0.6, 1.0, 1.0, 11).unwrap();
    let mut forecaster =
        ForecasterDirect::new(LinearRegression::new(), 2, Lags::range(3).unwrap()).unwrap();
    forecaster.fit(&y, None).unwrap();
    forecaster
}

#[test]
fn test_in_sample_residuals_are_capped() {
    let forecaster = fitted_forecaster(1200);
    let store = forecaster.in_sample_residuals();

    assert_eq!(store.steps(), vec![1, 2]);
    assert_eq!(store.count(1), 1000);
    assert_eq!(store.count(2), 1000);
}

#[test]
fn test_in_sample_residual_sample_is_reproducible() {
    let a = fitted_forecaster(1200);
    let b = fitted_forecaster(1200);
    assert_eq!(a.in_sample_residuals(), b.in_sample_residuals());
}

#[test]
fn test_small_training_keeps_every_residual() {
    let forecaster = fitted_forecaster(100);
    // 100 - 3 - 2 + 1 training rows
    assert_eq!(forecaster.in_sample_residuals().count(1), 96);
}

#[test]
fn test_refit_replaces_in_sample_residuals() {
    let mut forecaster = fitted_forecaster(1200);
    let y = synthetic_ar1(50, 0.6, 1.0, 1.0, 12).unwrap();
    forecaster.fit(&y, None).unwrap();
    assert_eq!(forecaster.in_sample_residuals().count(1), 46);
}

#[test]
fn test_out_sample_append_never_exceeds_cap() {
    let mut forecaster = fitted_forecaster(100);
    for batch in 0..3 {
        let values: Vec<f64> = (0..600).map(|i| (batch * 1000 + i) as f64).collect();
        let residuals = BTreeMap::from([(1, values.clone()), (2, values)]);
        forecaster
            .set_out_sample_residuals(residuals, true, false, 123)
            .unwrap();

        let store = forecaster.out_sample_residuals().unwrap();
        assert!(store.count(1) <= 1000);
        assert!(store.count(2) <= 1000);
    }

    let store = forecaster.out_sample_residuals().unwrap();
    assert_eq!(store.count(1), 1000);
    let stored = store.get(1).unwrap();
    // The first batch is kept, the second only fills the free space
    assert_eq!(&stored[..600], (0..600).map(f64::from).collect::<Vec<_>>().as_slice());
    assert_eq!(stored[600], 1000.0);
    assert_eq!(stored[999], 1399.0);
}

#[test]
fn test_out_sample_overwrite_and_large_batches() {
    let mut forecaster = fitted_forecaster(100);
    let big: Vec<f64> = (0..2500).map(f64::from).collect();
    forecaster
        .set_out_sample_residuals(BTreeMap::from([(1, big)]), false, false, 7)
        .unwrap();
    assert_eq!(forecaster.out_sample_residuals().unwrap().count(1), 1000);

    forecaster
        .set_out_sample_residuals(BTreeMap::from([(1, vec![0.5, -0.5])]), false, false, 7)
        .unwrap();
    assert_eq!(
        forecaster.out_sample_residuals().unwrap().get(1).unwrap(),
        &[0.5, -0.5]
    );
}

#[test]
fn test_unknown_steps_are_ignored() {
    let mut forecaster = fitted_forecaster(100);
    let residuals = BTreeMap::from([(1, vec![1.0]), (5, vec![2.0])]);
    forecaster
        .set_out_sample_residuals(residuals, false, false, 123)
        .unwrap();

    let store = forecaster.out_sample_residuals().unwrap();
    assert_eq!(store.steps(), vec![1]);
}

#[test]
fn test_out_sample_residuals_are_transformed() {
    let y = synthetic_ar1(100, 0.6, 1.0, 1.0, 11).unwrap();
    let mut forecaster = ForecasterDirect::new(MeanRegressor::new(), 1, Lags::range(2).unwrap())
        .unwrap()
        .with_transformer_y(StandardScaler::new());

    let residuals = BTreeMap::from([(1, vec![y.mean().unwrap()])]);
    assert!(matches!(
        forecaster.set_out_sample_residuals(residuals.clone(), false, true, 123),
        Err(ForecastError::NotFitted(_))
    ));

    forecaster.fit(&y, None).unwrap();
    forecaster
        .set_out_sample_residuals(residuals, false, true, 123)
        .unwrap();
    let stored = forecaster.out_sample_residuals().unwrap().get(1).unwrap();
    assert!(stored[0].abs() < 1e-9);
}

#[test]
fn test_bootstrap_requires_out_sample_residuals() {
    let forecaster = fitted_forecaster(100);
    let options = BootstrapOptions::new(10).with_out_sample_residuals();

    assert!(matches!(
        forecaster.predict_bootstrapping(2, None, None, &options),
        Err(ForecastError::MissingResiduals(_))
    ));
}

#[test]
fn test_bootstrap_with_out_sample_residuals() {
    let mut forecaster = fitted_forecaster(100);
    forecaster
        .set_out_sample_residuals(
            BTreeMap::from([(1, vec![1.0]), (2, vec![-1.0])]),
            false,
            false,
            123,
        )
        .unwrap();
    let point = forecaster.predict(2, None, None).unwrap();
    let boot = forecaster
        .predict_bootstrapping(2, None, None, &BootstrapOptions::new(5).with_out_sample_residuals())
        .unwrap();

    for b in 0..5 {
        assert!((boot.samples[[0, b]] - (point.values[0] + 1.0)).abs() < 1e-9);
        assert!((boot.samples[[1, b]] - (point.values[1] - 1.0)).abs() < 1e-9);
    }
}

#[test]
fn test_out_sample_residuals_with_missing_step() {
    let mut forecaster = fitted_forecaster(100);
    forecaster
        .set_out_sample_residuals(BTreeMap::from([(1, vec![1.0])]), false, false, 123)
        .unwrap();
    let options = BootstrapOptions::new(5).with_out_sample_residuals();

    assert!(forecaster.predict_bootstrapping(1, None, None, &options).is_ok());
    assert!(matches!(
        forecaster.predict_bootstrapping(2, None, None, &options),
        Err(ForecastError::MissingResiduals(_))
    ));
}

#[test]
fn test_partial_residual_keys_are_reported() {
    let mut forecaster = fitted_forecaster(100);
    let residuals = BTreeMap::from([(1, vec![1.0]), (5, vec![2.0])]);
    let logs = captured_warnings(|| {
        forecaster
            .set_out_sample_residuals(residuals, false, false, 123)
            .unwrap();
    });
    assert!(logs.contains("WARN"));
    assert!(logs.contains("Only residuals of models (steps) [1] are stored."));

    let complete = BTreeMap::from([(1, vec![1.0]), (2, vec![2.0])]);
    let logs = captured_warnings(|| {
        forecaster
            .set_out_sample_residuals(complete, true, false, 123)
            .unwrap();
    });
    assert!(logs.is_empty());
}

#[test]
fn test_residual_scale_warnings() {
    let y = synthetic_ar1(100, 0.6, 1.0, 1.0, 11).unwrap();
    let mut forecaster = ForecasterDirect::new(MeanRegressor::new(), 1, Lags::range(2).unwrap())
        .unwrap()
        .with_transformer_y(StandardScaler::new());
    forecaster.fit(&y, None).unwrap();

    let logs = captured_warnings(|| {
        forecaster
            .set_out_sample_residuals(BTreeMap::from([(1, vec![0.1])]), false, false, 123)
            .unwrap();
    });
    assert!(logs.contains("Argument `transform` is false"));

    let logs = captured_warnings(|| {
        forecaster
            .set_out_sample_residuals(BTreeMap::from([(1, vec![0.1])]), false, true, 123)
            .unwrap();
    });
    assert!(logs.contains("Residuals will be transformed"));
}

#[test]
fn test_missing_importances_are_reported() {
    let y = synthetic_ar1(100, 0.6, 1.0, 1.0, 11).unwrap();
    let mut forecaster =
        ForecasterDirect::new(MeanRegressor::new(), 1, Lags::range(2).unwrap()).unwrap();
    forecaster.fit(&y, None).unwrap();

    let mut importance = Some(Vec::new());
    let logs = captured_warnings(|| {
        importance = forecaster.get_feature_importance(1).unwrap();
    });
    assert!(importance.is_none());
    assert!(logs.contains("Impossible to access feature importances"));
    assert!(logs.contains("MeanRegressor"));
}
