//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Spacing between consecutive timestamps: a fixed number of seconds or a
/// number of calendar months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FrequencyRepr", into = "FrequencyRepr")]
pub enum Frequency {
    Seconds(i64),
    Months(u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum FrequencyRepr {
    Seconds(i64),
    Months(u32),
}

impl TryFrom<FrequencyRepr> for Frequency {
    type Error = ForecastError;

    fn try_from(raw: FrequencyRepr) -> Result<Self> {
        match raw {
            FrequencyRepr::Seconds(seconds) if seconds > 0 => Ok(Frequency::Seconds(seconds)),
            FrequencyRepr::Seconds(seconds) => Err(ForecastError::ValidationError(format!(
                "Frequency must be a positive duration. Got {} seconds.",
                seconds
            ))),
            FrequencyRepr::Months(months) => Frequency::months(months),
        }
    }
}

impl From<Frequency> for FrequencyRepr {
    fn from(freq: Frequency) -> Self {
        match freq {
            Frequency::Seconds(seconds) => FrequencyRepr::Seconds(seconds),
            Frequency::Months(months) => FrequencyRepr::Months(months),
        }
    }
}

impl Frequency {
    /// Frequency from a positive duration made of whole seconds
    pub fn from_duration(duration: Duration) -> Result<Self> {
        let seconds = duration.num_seconds();
        if duration != Duration::seconds(seconds) {
            return Err(ForecastError::ValidationError(format!(
                "Frequency must be a whole number of seconds. Got {} ms.",
                duration.num_milliseconds()
            )));
        }
        if seconds <= 0 {
            return Err(ForecastError::ValidationError(format!(
                "Frequency must be a positive duration. Got {} seconds.",
                seconds
            )));
        }
        Ok(Frequency::Seconds(seconds))
    }

    /// Calendar months
    pub fn months(months: u32) -> Result<Self> {
        if months == 0 {
            return Err(ForecastError::ValidationError(
                "Frequency must be at least one month.".to_string(),
            ));
        }
        Ok(Frequency::Months(months))
    }

    /// One day
    pub fn daily() -> Self {
        Frequency::Seconds(86_400)
    }

    /// One hour
    pub fn hourly() -> Self {
        Frequency::Seconds(3_600)
    }

    /// One calendar month
    pub fn monthly() -> Self {
        Frequency::Months(1)
    }

    /// Timestamp `periods` steps after `start`, saturating at the
    /// largest representable timestamp
    pub fn advance(&self, start: NaiveDateTime, periods: usize) -> NaiveDateTime {
        let shifted = match self {
            Frequency::Seconds(seconds) => i64::try_from(periods)
                .ok()
                .and_then(|p| seconds.checked_mul(p))
                .filter(|total| total.abs() < i64::MAX / 1_000)
                .and_then(|total| start.checked_add_signed(Duration::seconds(total))),
            Frequency::Months(months) => u32::try_from(periods)
                .ok()
                .and_then(|p| months.checked_mul(p))
                .and_then(|total| start.checked_add_months(Months::new(total))),
        };
        shifted.unwrap_or(NaiveDateTime::MAX)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Frequency::Seconds(s) if s % 86_400 == 0 => write!(f, "{}D", s / 86_400),
            Frequency::Seconds(s) if s % 3_600 == 0 => write!(f, "{}H", s / 3_600),
            Frequency::Seconds(s) if s % 60 == 0 => write!(f, "{}min", s / 60),
            Frequency::Seconds(s) => write!(f, "{}s", s),
            Frequency::Months(m) => write!(f, "{}M", m),
        }
    }
}

// Whole calendar months from `a` to `b`, when `b` is `a` shifted by them
fn month_gap(a: NaiveDateTime, b: NaiveDateTime) -> Option<u32> {
    let months = (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32;
    let months = u32::try_from(months).ok().filter(|&m| m > 0)?;
    (a.checked_add_months(Months::new(months)) == Some(b)).then_some(months)
}

/// Label of a single position in a series index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexLabel {
    /// Integer position of a range index
    Position(i64),
    /// Timestamp of a date/time index
    Timestamp(NaiveDateTime),
}

impl IndexLabel {
    /// Parse an integer or a date/time label
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(position) = raw.parse::<i64>() {
            return Ok(IndexLabel::Position(position));
        }
        for format in DATETIME_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(IndexLabel::Timestamp(ts));
            }
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(IndexLabel::Timestamp)
            .ok_or_else(|| {
                ForecastError::DataError(format!("Cannot parse index label '{}'", raw))
            })
    }
}

impl fmt::Display for IndexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexLabel::Position(p) => write!(f, "{}", p),
            IndexLabel::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Kind of index, compared between training and prediction inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Range,
    DateTime,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Range => write!(f, "RangeIndex"),
            IndexKind::DateTime => write!(f, "DatetimeIndex"),
        }
    }
}

/// Monotonic, equally spaced index of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeriesIndexRepr", into = "SeriesIndexRepr")]
pub enum SeriesIndex {
    /// Integer positions `start, start + step, ...`
    Range { start: i64, step: i64, len: usize },
    /// Timestamps `start, start + freq, ...`
    DateTime {
        start: NaiveDateTime,
        freq: Frequency,
        len: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SeriesIndexRepr {
    Range { start: i64, step: i64, len: usize },
    DateTime {
        start: NaiveDateTime,
        freq: Frequency,
        len: usize,
    },
}

impl TryFrom<SeriesIndexRepr> for SeriesIndex {
    type Error = ForecastError;

    fn try_from(raw: SeriesIndexRepr) -> Result<Self> {
        match raw {
            SeriesIndexRepr::Range { start, step, len } => Self::range_with_step(start, step, len),
            SeriesIndexRepr::DateTime { start, freq, len } => Ok(Self::datetime(start, freq, len)),
        }
    }
}

impl From<SeriesIndex> for SeriesIndexRepr {
    fn from(index: SeriesIndex) -> Self {
        match index {
            SeriesIndex::Range { start, step, len } => SeriesIndexRepr::Range { start, step, len },
            SeriesIndex::DateTime { start, freq, len } => {
                SeriesIndexRepr::DateTime { start, freq, len }
            }
        }
    }
}

impl SeriesIndex {
    /// Range index `0..len`
    pub fn range(len: usize) -> Self {
        SeriesIndex::Range {
            start: 0,
            step: 1,
            len,
        }
    }

    /// Range index with a custom start and positive step
    pub fn range_with_step(start: i64, step: i64, len: usize) -> Result<Self> {
        if step <= 0 {
            return Err(ForecastError::ValidationError(format!(
                "Index step must be positive. Got {}.",
                step
            )));
        }
        Ok(SeriesIndex::Range { start, step, len })
    }

    /// Date/time index starting at `start`
    pub fn datetime(start: NaiveDateTime, freq: Frequency, len: usize) -> Self {
        SeriesIndex::DateTime { start, freq, len }
    }

    /// Build an index from explicit integer positions
    pub fn from_positions(positions: &[i64]) -> Result<Self> {
        match positions {
            [] => Ok(Self::range(0)),
            [single] => Self::range_with_step(*single, 1, 1),
            [first, second, ..] => {
                let step = second - first;
                if positions.windows(2).any(|w| w[1] - w[0] != step) {
                    return Err(ForecastError::ValidationError(
                        "Index positions must be monotonic and equally spaced.".to_string(),
                    ));
                }
                Self::range_with_step(*first, step, positions.len())
            }
        }
    }

    /// Build an index from explicit timestamps, inferring the frequency
    pub fn from_timestamps(timestamps: &[NaiveDateTime]) -> Result<Self> {
        match timestamps {
            [] => Err(ForecastError::ValidationError(
                "Cannot infer a frequency from an empty list of timestamps.".to_string(),
            )),
            [_] => Err(ForecastError::ValidationError(
                "Cannot infer a frequency from a single timestamp.".to_string(),
            )),
            [first, second, ..] => {
                let spacing = *second - *first;
                if timestamps.windows(2).all(|w| w[1] - w[0] == spacing) {
                    return Ok(Self::datetime(
                        *first,
                        Frequency::from_duration(spacing)?,
                        timestamps.len(),
                    ));
                }
                // Calendar months are measured from the first timestamp
                let freq = month_gap(*first, *second).map(Frequency::Months);
                match freq {
                    Some(freq)
                        if timestamps
                            .iter()
                            .enumerate()
                            .all(|(i, ts)| freq.advance(*first, i) == *ts) =>
                    {
                        Ok(Self::datetime(*first, freq, timestamps.len()))
                    }
                    _ => Err(ForecastError::ValidationError(
                        "Timestamps must be monotonic and equally spaced.".to_string(),
                    )),
                }
            }
        }
    }

    /// Build an index from parsed labels of a single kind
    pub fn from_labels(labels: &[IndexLabel]) -> Result<Self> {
        let positions: Option<Vec<i64>> = labels
            .iter()
            .map(|label| match label {
                IndexLabel::Position(p) => Some(*p),
                IndexLabel::Timestamp(_) => None,
            })
            .collect();
        if let Some(positions) = positions {
            return Self::from_positions(&positions);
        }

        let timestamps: Option<Vec<NaiveDateTime>> = labels
            .iter()
            .map(|label| match label {
                IndexLabel::Timestamp(ts) => Some(*ts),
                IndexLabel::Position(_) => None,
            })
            .collect();
        match timestamps {
            Some(timestamps) => Self::from_timestamps(&timestamps),
            None => Err(ForecastError::ValidationError(
                "Index labels mix integer positions and timestamps.".to_string(),
            )),
        }
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        match self {
            SeriesIndex::Range { len, .. } | SeriesIndex::DateTime { len, .. } => *len,
        }
    }

    /// True when the index holds no labels
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Range or date/time
    pub fn kind(&self) -> IndexKind {
        match self {
            SeriesIndex::Range { .. } => IndexKind::Range,
            SeriesIndex::DateTime { .. } => IndexKind::DateTime,
        }
    }

    /// Step (range) or frequency (date/time) as text
    pub fn frequency(&self) -> String {
        match self {
            SeriesIndex::Range { step, .. } => step.to_string(),
            SeriesIndex::DateTime { freq, .. } => freq.to_string(),
        }
    }

    // Label at position `i`, which may lie past the end.
    fn label_unchecked(&self, i: usize) -> IndexLabel {
        match self {
            SeriesIndex::Range { start, step, .. } => IndexLabel::Position(start + step * i as i64),
            SeriesIndex::DateTime { start, freq, .. } => {
                IndexLabel::Timestamp(freq.advance(*start, i))
            }
        }
    }

    /// Label at position `i`
    pub fn label(&self, i: usize) -> Option<IndexLabel> {
        (i < self.len()).then(|| self.label_unchecked(i))
    }

    /// All labels in order
    pub fn labels(&self) -> Vec<IndexLabel> {
        (0..self.len()).map(|i| self.label_unchecked(i)).collect()
    }

    /// First label
    pub fn first(&self) -> Option<IndexLabel> {
        self.label(0)
    }

    /// Last label
    pub fn last(&self) -> Option<IndexLabel> {
        self.len().checked_sub(1).and_then(|i| self.label(i))
    }

    fn with_start_and_len(&self, offset: usize, len: usize) -> Self {
        match self {
            SeriesIndex::Range { start, step, .. } => SeriesIndex::Range {
                start: start + step * offset as i64,
                step: *step,
                len,
            },
            SeriesIndex::DateTime { start, freq, .. } => SeriesIndex::DateTime {
                start: freq.advance(*start, offset),
                freq: *freq,
                len,
            },
        }
    }

    /// Positions `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.len() {
            return Err(ForecastError::ValidationError(format!(
                "Invalid slice {}..{} of an index of length {}",
                start,
                end,
                self.len()
            )));
        }
        Ok(self.with_start_and_len(start, end - start))
    }

    /// Last `n` labels (or all of them when shorter)
    pub fn tail(&self, n: usize) -> Self {
        let n = n.min(self.len());
        self.with_start_and_len(self.len() - n, n)
    }

    /// The `steps` labels that follow the last one
    pub fn expand(&self, steps: usize) -> Self {
        self.with_start_and_len(self.len(), steps)
    }

    /// Same kind and same step/frequency
    pub fn same_layout(&self, other: &SeriesIndex) -> bool {
        match (self, other) {
            (SeriesIndex::Range { step: a, .. }, SeriesIndex::Range { step: b, .. }) => a == b,
            (SeriesIndex::DateTime { freq: a, .. }, SeriesIndex::DateTime { freq: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

/// Univariate series with an equally spaced index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    index: SeriesIndex,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Series with a `0..n` range index
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            index: SeriesIndex::range(values.len()),
            values,
        }
    }

    /// Series with an explicit index
    pub fn with_index(name: &str, index: SeriesIndex, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Index length ({}) doesn't match values length ({})",
                index.len(),
                values.len()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            index,
            values,
        })
    }

    /// Same name and index with new values
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        Self::with_index(&self.name, self.index.clone(), values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &SeriesIndex {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observations `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        let index = self.index.slice(start, end)?;
        Ok(Self {
            name: self.name.clone(),
            index,
            values: self.values[start..end].to_vec(),
        })
    }

    /// Last `n` observations
    pub fn tail(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self {
            name: self.name.clone(),
            index: self.index.tail(n),
            values: self.values[self.len() - n..].to_vec(),
        }
    }

    /// Mean of the values
    pub fn mean(&self) -> Result<f64> {
        Ok(forecast_math::mean(&self.values)?)
    }

    /// Sample standard deviation of the values
    pub fn std_dev(&self) -> Result<f64> {
        Ok(forecast_math::std_dev(&self.values, 1)?)
    }
}

/// Exogenous covariates: one column per variable, rows aligned to an index
#[derive(Debug, Clone, PartialEq)]
pub struct ExogFrame {
    index: SeriesIndex,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl ExogFrame {
    /// Frame from a `(rows, columns)` matrix
    pub fn new(index: SeriesIndex, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::ValidationError(
                "`exog` must have at least one column.".to_string(),
            ));
        }
        if values.ncols() != columns.len() {
            return Err(ForecastError::ValidationError(format!(
                "Number of column names ({}) doesn't match number of columns ({})",
                columns.len(),
                values.ncols()
            )));
        }
        if values.nrows() != index.len() {
            return Err(ForecastError::ValidationError(format!(
                "Index length ({}) doesn't match number of rows ({})",
                index.len(),
                values.nrows()
            )));
        }
        let unique: BTreeSet<&String> = columns.iter().collect();
        if unique.len() != columns.len() {
            return Err(ForecastError::ValidationError(format!(
                "`exog` column names must be unique. Got {:?}.",
                columns
            )));
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    /// Frame from named columns of equal length
    pub fn from_columns(index: SeriesIndex, columns: Vec<(&str, Vec<f64>)>) -> Result<Self> {
        let n_rows = index.len();
        let mut values = Array2::<f64>::zeros((n_rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, column)) in columns.into_iter().enumerate() {
            if column.len() != n_rows {
                return Err(ForecastError::ValidationError(format!(
                    "Column '{}' has {} values but the index has {} labels",
                    name,
                    column.len(),
                    n_rows
                )));
            }
            for (i, v) in column.into_iter().enumerate() {
                values[[i, j]] = v;
            }
            names.push(name.to_string());
        }
        Self::new(index, names, values)
    }

    /// Single column frame from a series
    pub fn from_series(series: &TimeSeries) -> Result<Self> {
        Self::from_columns(
            series.index().clone(),
            vec![(series.name(), series.values().to_vec())],
        )
    }

    /// Same index and columns with new values
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        Self::new(self.index.clone(), self.columns.clone(), values)
    }

    pub fn index(&self) -> &SeriesIndex {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Values of column `j`
    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Rows `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        let index = self.index.slice(start, end)?;
        Ok(Self {
            index,
            columns: self.columns.clone(),
            values: self.values.slice(s![start..end, ..]).to_owned(),
        })
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Result<Self> {
        self.slice(0, n.min(self.len()))
    }
}

/// Data loader for CSV files with an index column
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    fn read_columns<P: AsRef<Path>>(
        path: P,
        index_column: &str,
        value_columns: &[&str],
    ) -> Result<(SeriesIndex, Vec<Vec<f64>>)> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let position_of = |name: &str| {
            headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                ForecastError::DataError(format!("Column '{}' not found in data", name))
            })
        };
        let index_position = position_of(index_column)?;
        let value_positions = value_columns
            .iter()
            .map(|name| position_of(name))
            .collect::<Result<Vec<_>>>()?;

        let mut labels = Vec::new();
        let mut columns = vec![Vec::new(); value_columns.len()];
        for record in reader.records() {
            let record = record?;
            let raw_label = record.get(index_position).ok_or_else(|| {
                ForecastError::DataError(format!("Missing index value in row {}", labels.len() + 1))
            })?;
            labels.push(IndexLabel::parse(raw_label)?);

            for (column, &position) in columns.iter_mut().zip(value_positions.iter()) {
                let raw = record.get(position).map(str::trim).unwrap_or("");
                let value = if raw.is_empty() {
                    f64::NAN
                } else {
                    raw.parse::<f64>().map_err(|_| {
                        ForecastError::DataError(format!("Cannot parse '{}' as a number", raw))
                    })?
                };
                column.push(value);
            }
        }

        if labels.is_empty() {
            return Err(ForecastError::DataError("No rows found in data".to_string()));
        }

        Ok((SeriesIndex::from_labels(&labels)?, columns))
    }

    /// Load a univariate series from a CSV file
    pub fn series_from_csv<P: AsRef<Path>>(
        path: P,
        index_column: &str,
        value_column: &str,
    ) -> Result<TimeSeries> {
        let (index, mut columns) = Self::read_columns(path, index_column, &[value_column])?;
        let values = columns.pop().unwrap_or_default();
        TimeSeries::with_index(value_column, index, values)
    }

    /// Load exogenous columns from a CSV file
    pub fn exog_from_csv<P: AsRef<Path>>(
        path: P,
        index_column: &str,
        columns: &[&str],
    ) -> Result<ExogFrame> {
        let (index, values) = Self::read_columns(path, index_column, columns)?;
        ExogFrame::from_columns(index, columns.iter().copied().zip(values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_range_index_labels_and_expand() {
        let index = SeriesIndex::range_with_step(10, 2, 3).unwrap();
        assert_eq!(
            index.labels(),
            vec![
                IndexLabel::Position(10),
                IndexLabel::Position(12),
                IndexLabel::Position(14)
            ]
        );
        assert_eq!(index.expand(2).labels(), vec![IndexLabel::Position(16), IndexLabel::Position(18)]);
        assert_eq!(index.tail(1).first(), Some(IndexLabel::Position(14)));
        assert_eq!(index.slice(1, 3).unwrap().first(), Some(IndexLabel::Position(12)));
        assert!(index.slice(2, 4).is_err());
    }

    #[test]
    fn test_datetime_index_inference() {
        let index = SeriesIndex::from_timestamps(&[day(1), day(2), day(3)]).unwrap();
        assert_eq!(index.kind(), IndexKind::DateTime);
        assert_eq!(index.frequency(), "1D");
        assert_eq!(index.expand(1).first(), Some(IndexLabel::Timestamp(day(4))));

        assert!(SeriesIndex::from_timestamps(&[day(1), day(2), day(4)]).is_err());
        assert!(SeriesIndex::from_positions(&[0, 1, 3]).is_err());
    }

    fn month_start(year: i32, month: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_monthly_index_inference() {
        let timestamps: Vec<NaiveDateTime> = (1..=12).map(|m| month_start(2020, m)).collect();
        let index = SeriesIndex::from_timestamps(&timestamps).unwrap();
        assert_eq!(index.frequency(), "1M");
        assert_eq!(index.labels().last(), Some(&IndexLabel::Timestamp(month_start(2020, 12))));
        assert_eq!(
            index.expand(2).labels(),
            vec![
                IndexLabel::Timestamp(month_start(2021, 1)),
                IndexLabel::Timestamp(month_start(2021, 2))
            ]
        );
        assert_eq!(
            index.tail(3).first(),
            Some(IndexLabel::Timestamp(month_start(2020, 10)))
        );

        let quarterly = [month_start(2021, 1), month_start(2021, 4), month_start(2021, 7)];
        let index = SeriesIndex::from_timestamps(&quarterly).unwrap();
        assert_eq!(index.frequency(), "3M");
        assert!(!index.same_layout(&SeriesIndex::datetime(quarterly[0], Frequency::monthly(), 3)));

        let gap = [month_start(2020, 1), month_start(2020, 2), month_start(2020, 4)];
        assert!(SeriesIndex::from_timestamps(&gap).is_err());
    }

    #[test]
    fn test_month_end_anchor_is_kept() {
        let jan_31 = NaiveDate::from_ymd_opt(2021, 1, 31)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap();
        let index = SeriesIndex::datetime(jan_31, Frequency::monthly(), 3);
        let labels: Vec<String> = index.labels().iter().map(|l| l.to_string()).collect();
        assert_eq!(
            labels,
            vec!["2021-01-31 00:00:00", "2021-02-28 00:00:00", "2021-03-31 00:00:00"]
        );
        let two_points = [jan_31, jan_31 + Duration::days(28)];
        assert_eq!(SeriesIndex::from_timestamps(&two_points).unwrap().frequency(), "28D");
    }

    #[test]
    fn test_sub_second_spacing_is_rejected() {
        assert!(Frequency::from_duration(Duration::milliseconds(1_500)).is_err());
        assert!(Frequency::from_duration(Duration::seconds(0)).is_err());
        assert_eq!(
            Frequency::from_duration(Duration::seconds(90)).unwrap().to_string(),
            "90s"
        );

        let t0 = day(1);
        let spaced = [t0, t0 + Duration::milliseconds(1_500), t0 + Duration::milliseconds(3_000)];
        assert!(SeriesIndex::from_timestamps(&spaced).is_err());
    }

    #[test]
    fn test_deserialization_is_validated() {
        let index = SeriesIndex::datetime(day(1), Frequency::monthly(), 4);
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(serde_json::from_str::<SeriesIndex>(&json).unwrap(), index);

        let zero_step = r#"{"Range":{"start":0,"step":0,"len":3}}"#;
        assert!(serde_json::from_str::<SeriesIndex>(zero_step).is_err());
        assert!(serde_json::from_str::<Frequency>(r#"{"Seconds":-5}"#).is_err());
        assert!(serde_json::from_str::<Frequency>(r#"{"Months":0}"#).is_err());
        assert_eq!(
            serde_json::from_str::<Frequency>(r#"{"Seconds":3600}"#).unwrap(),
            Frequency::hourly()
        );
    }

    #[test]
    fn test_same_layout() {
        let a = SeriesIndex::range(5);
        let b = SeriesIndex::range_with_step(100, 1, 2).unwrap();
        let c = SeriesIndex::datetime(day(1), Frequency::daily(), 5);
        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
        assert!(!c.same_layout(&SeriesIndex::datetime(day(1), Frequency::hourly(), 5)));
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(IndexLabel::parse("42").unwrap(), IndexLabel::Position(42));
        assert_eq!(
            IndexLabel::parse("2023-01-02").unwrap(),
            IndexLabel::Timestamp(day(2))
        );
        assert!(IndexLabel::parse("not a date").is_err());
    }

    #[test]
    fn test_exog_frame_validation() {
        let index = SeriesIndex::range(3);
        let frame = ExogFrame::from_columns(
            index.clone(),
            vec![("a", vec![1.0, 2.0, 3.0]), ("b", vec![4.0, 5.0, 6.0])],
        )
        .unwrap();
        assert_eq!(frame.n_columns(), 2);
        assert_eq!(frame.head(2).unwrap().len(), 2);
        assert_eq!(frame.column(1).to_vec(), vec![4.0, 5.0, 6.0]);

        assert!(ExogFrame::from_columns(index.clone(), vec![("a", vec![1.0])]).is_err());
        assert!(ExogFrame::from_columns(
            index,
            vec![("a", vec![1.0, 2.0, 3.0]), ("a", vec![1.0, 2.0, 3.0])]
        )
        .is_err());
    }
}
