use forecast_direct::error::Result;
use forecast_direct::utils::{forecast_accuracy, synthetic_ar1, train_test_split};
use forecast_direct::{
    BootstrapOptions, DecisionTreeParams, DecisionTreeRegressor, DistributionFamily, ExogFrame,
    ForecasterDirect, Lags, Ridge, StandardScaler,
};

fn main() -> Result<()> {
    println!("Direct Multi-Step Forecasting Example");
    println!("=====================================\n");

    // Synthetic AR(1) series with a seasonal covariate
    let base = synthetic_ar1(400, 0.75, 5.0, 1.0, 42)?;
    let season: Vec<f64> = (0..base.len() + 10)
        .map(|t| (t as f64 * std::f64::consts::TAU / 12.0).sin())
        .collect();
    let y = base.with_values(
        base.values()
            .iter()
            .zip(&season)
            .map(|(v, s)| v + 3.0 * s)
            .collect(),
    )?;

    let (train, test) = train_test_split(&y, 0.05)?;
    let steps = test.len();
    println!("Training on {} observations, forecasting {} steps\n", train.len(), steps);

    let exog_train = ExogFrame::from_columns(
        train.index().clone(),
        vec![("season", season[..train.len()].to_vec())],
    )?;
    let exog_future = ExogFrame::from_columns(
        train.index().expand(steps),
        vec![("season", season[train.len()..train.len() + steps].to_vec())],
    )?;

    // Ridge regression with a scaled target
    let mut forecaster = ForecasterDirect::new(Ridge::new(0.5)?, steps, Lags::range(12)?)?
        .with_transformer_y(StandardScaler::new());
    forecaster.fit(&train, Some(&exog_train))?;
    println!("{}\n", forecaster);

    let prediction = forecaster.predict(steps, None, Some(&exog_future))?;
    let accuracy = forecast_accuracy(&prediction.values, test.values())?;
    println!("{}", accuracy);

    let interval = forecaster.predict_interval(
        steps,
        None,
        Some(&exog_future),
        [10.0, 90.0],
        &BootstrapOptions::new(500),
    )?;
    println!("80% prediction interval:");
    for i in 0..interval.len() {
        println!(
            "  {}  pred {:>8.3}  [{:>8.3}, {:>8.3}]  actual {:>8.3}",
            interval.index[i],
            interval.pred[i],
            interval.lower_bound[i],
            interval.upper_bound[i],
            test.values()[i]
        );
    }
    println!("Coverage: {:.1}%\n", interval.coverage(test.values())? * 100.0);

    let dist = forecaster.predict_dist(
        3,
        DistributionFamily::Normal,
        None,
        Some(&exog_future),
        &BootstrapOptions::new(500),
    )?;
    println!("Normal distribution per step (first 3 steps):");
    for (label, params) in dist.index.iter().zip(&dist.params) {
        println!("  {}  loc {:.3}  scale {:.3}", label, params[0], params[1]);
    }

    // Tree regressor: feature importances of the first step
    let tree = DecisionTreeRegressor::new(DecisionTreeParams {
        max_depth: 4,
        min_samples_leaf: 5,
    })?;
    let mut tree_forecaster = ForecasterDirect::new(tree, steps, Lags::new(vec![1, 2, 12])?)?;
    tree_forecaster.fit(&train, Some(&exog_train))?;
    if let Some(importance) = tree_forecaster.get_feature_importance(1)? {
        println!("\nTree feature importances (step 1):");
        for feature in importance {
            println!("  {:<10} {:.3}", feature.feature, feature.importance);
        }
    }

    Ok(())
}
