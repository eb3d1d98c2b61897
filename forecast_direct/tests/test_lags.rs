use forecast_direct::direct::exog::exog_to_direct;
use forecast_direct::direct::lags::create_lags;
use forecast_direct::{
    ExogFrame, ForecastError, ForecasterDirect, IndexLabel, Lags, LinearRegression, SeriesIndex,
    TimeSeries,
};
use ndarray::array;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn sequence(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

#[test]
fn test_lag_matrix_consecutive_lags() {
    let (x, y) = create_lags(&sequence(10), &Lags::range(3).unwrap(), 1).unwrap();

    assert_eq!(
        x,
        array![
            [2.0, 1.0, 0.0],
            [3.0, 2.0, 1.0],
            [4.0, 3.0, 2.0],
            [5.0, 4.0, 3.0],
            [6.0, 5.0, 4.0],
            [7.0, 6.0, 5.0],
            [8.0, 7.0, 6.0]
        ]
    );
    assert_eq!(y.column(0).to_vec(), vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
}

#[test]
fn test_lag_matrix_interspersed_lags() {
    let (x, y) = create_lags(&sequence(10), &Lags::new(vec![4, 7]).unwrap(), 1).unwrap();

    assert_eq!(x, array![[3.0, 0.0], [4.0, 1.0], [5.0, 2.0]]);
    assert_eq!(y.column(0).to_vec(), vec![7.0, 8.0, 9.0]);
}

#[test]
fn test_lag_matrix_keeps_lag_order() {
    let (x, _) = create_lags(&sequence(10), &Lags::new(vec![3, 1]).unwrap(), 1).unwrap();
    assert_eq!(x.row(0).to_vec(), vec![0.0, 2.0]);
}

#[rstest]
#[case(3, 2, 3)]
#[case(5, 3, 7)]
#[case(2, 1, 2)]
fn test_too_short_sequence(#[case] n_lags: usize, #[case] steps: usize, #[case] length: usize) {
    let result = create_lags(&sequence(length), &Lags::range(n_lags).unwrap(), steps);

    match result {
        Err(ForecastError::ValidationError(message)) => {
            assert!(message.contains(&format!("maximum lag ({})", n_lags)));
            assert!(message.contains(&format!(
                "Minimum length of the series is {}",
                n_lags + steps
            )));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_minimum_length_yields_one_row() {
    let (x, y) = create_lags(&sequence(5), &Lags::range(3).unwrap(), 2).unwrap();
    assert_eq!(x.nrows(), 1);
    assert_eq!(y, array![[3.0, 4.0]]);
}

#[test]
fn test_exog_expansion_follows_target_alignment() {
    let exog = array![[0.0, 100.0], [1.0, 101.0], [2.0, 102.0], [3.0, 103.0], [4.0, 104.0]];
    let expanded = exog_to_direct(exog.view(), 2).unwrap();

    assert_eq!(expanded.dim(), (4, 4));
    assert_eq!(expanded.row(3).to_vec(), vec![3.0, 4.0, 103.0, 104.0]);
}

#[test]
fn test_training_table_with_exog() {
    let y = TimeSeries::new("y", sequence(8));
    let exog = ExogFrame::from_columns(
        SeriesIndex::range(8),
        vec![("a", (100..108).map(f64::from).collect())],
    )
    .unwrap();
    let forecaster =
        ForecasterDirect::new(LinearRegression::new(), 2, Lags::range(3).unwrap()).unwrap();

    let table = forecaster.create_train_x_y(&y, Some(&exog)).unwrap();

    assert_eq!(
        table.x_names(),
        &["lag_1", "lag_2", "lag_3", "a_step_1", "a_step_2"]
    );
    assert_eq!(table.y_names(), &["y_step_1", "y_step_2"]);
    assert_eq!(table.n_rows(), 4);
    // Row labels start at max_lag + steps - 1
    assert_eq!(table.index()[0], IndexLabel::Position(4));
    assert_eq!(table.x().row(0).to_vec(), vec![2.0, 1.0, 0.0, 103.0, 104.0]);
    assert_eq!(table.y().row(0).to_vec(), vec![3.0, 4.0]);
    assert_eq!(table.x().row(3).to_vec(), vec![5.0, 4.0, 3.0, 106.0, 107.0]);

    let df = table.to_dataframe().unwrap();
    assert_eq!(df.shape(), (4, 8));
}

#[test]
fn test_training_table_rejects_misaligned_exog() {
    let y = TimeSeries::new("y", sequence(8));
    let shifted = ExogFrame::from_columns(
        SeriesIndex::range_with_step(1, 1, 8).unwrap(),
        vec![("a", sequence(8))],
    )
    .unwrap();
    let forecaster =
        ForecasterDirect::new(LinearRegression::new(), 2, Lags::range(3).unwrap()).unwrap();

    assert!(matches!(
        forecaster.create_train_x_y(&y, Some(&shifted)),
        Err(ForecastError::ValidationError(_))
    ));

    let short = ExogFrame::from_columns(SeriesIndex::range(7), vec![("a", sequence(7))]).unwrap();
    assert!(forecaster.create_train_x_y(&y, Some(&short)).is_err());
}
