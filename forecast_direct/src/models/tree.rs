//! Regression tree with impurity based feature importances

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Hyperparameters of [`DecisionTreeRegressor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionTreeParams {
    /// Maximum depth of the tree
    pub max_depth: usize,
    /// Minimum number of samples in each leaf
    pub min_samples_leaf: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

/// Weighted sums needed to evaluate squared error impurity
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    count: usize,
    w: f64,
    wy: f64,
    wyy: f64,
}

impl Moments {
    fn add(&mut self, y: f64, w: f64) {
        self.count += 1;
        self.w += w;
        self.wy += w * y;
        self.wyy += w * y * y;
    }

    fn minus(&self, other: &Moments) -> Moments {
        Moments {
            count: self.count - other.count,
            w: self.w - other.w,
            wy: self.wy - other.wy,
            wyy: self.wyy - other.wyy,
        }
    }

    // Weighted sum of squared deviations from the weighted mean
    fn sse(&self) -> f64 {
        if self.w <= 0.0 {
            0.0
        } else {
            (self.wyy - self.wy * self.wy / self.w).max(0.0)
        }
    }

    fn mean(&self) -> f64 {
        if self.w <= 0.0 {
            0.0
        } else {
            self.wy / self.w
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// CART regression tree minimising weighted squared error
#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    params: DecisionTreeParams,
    root: Option<Node>,
    importances: Vec<f64>,
}

impl DecisionTreeRegressor {
    /// Create a new tree with explicit hyperparameters
    pub fn new(params: DecisionTreeParams) -> Result<Self> {
        Self::validate(&params)?;
        Ok(Self {
            params,
            root: None,
            importances: Vec::new(),
        })
    }

    fn validate(params: &DecisionTreeParams) -> Result<()> {
        if params.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn best_split(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        w: &[f64],
        rows: &[usize],
        total: &Moments,
    ) -> Option<Split> {
        let parent_sse = total.sse();
        let mut best: Option<Split> = None;

        for feature in 0..x.ncols() {
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left = Moments::default();
            for k in 0..sorted.len() - 1 {
                let row = sorted[k];
                left.add(y[row], w[row]);

                let current = x[[row, feature]];
                let next = x[[sorted[k + 1], feature]];
                if next <= current {
                    continue;
                }
                let right = total.minus(&left);
                if left.count < self.params.min_samples_leaf
                    || right.count < self.params.min_samples_leaf
                    || left.w <= 0.0
                    || right.w <= 0.0
                {
                    continue;
                }

                let gain = parent_sse - left.sse() - right.sse();
                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    fn build(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        w: &[f64],
        rows: Vec<usize>,
        depth: usize,
    ) -> Node {
        let mut total = Moments::default();
        for &row in &rows {
            total.add(y[row], w[row]);
        }

        if depth >= self.params.max_depth || rows.len() < 2 * self.params.min_samples_leaf {
            return Node::Leaf(total.mean());
        }

        match self.best_split(x, y, w, &rows, &total) {
            None => Node::Leaf(total.mean()),
            Some(split) => {
                self.importances[split.feature] += split.gain;
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&row| x[[row, split.feature]] <= split.threshold);
                let left = self.build(x, y, w, left_rows, depth + 1);
                let right = self.build(x, y, w, right_rows, depth + 1);
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self {
            params: DecisionTreeParams::default(),
            root: None,
            importances: Vec::new(),
        }
    }
}

impl Regressor for DecisionTreeRegressor {
    type Params = DecisionTreeParams;

    fn name(&self) -> &str {
        "DecisionTreeRegressor"
    }

    fn fit(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        sample_weight: Option<ArrayView1<f64>>,
    ) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(ForecastError::ValidationError(format!(
                "Cannot fit a tree on {} rows and {} targets",
                x.nrows(),
                y.len()
            )));
        }
        let w = match sample_weight {
            Some(w) if w.len() == y.len() => w.to_vec(),
            Some(w) => {
                return Err(ForecastError::ValidationError(format!(
                    "Weights length ({}) doesn't match number of rows ({})",
                    w.len(),
                    y.len()
                )))
            }
            None => vec![1.0; y.len()],
        };

        self.importances = vec![0.0; x.ncols()];
        let root = self.build(x, y, &w, (0..x.nrows()).collect(), 0);
        self.root = Some(root);

        let total: f64 = self.importances.iter().sum();
        if total > 0.0 {
            for importance in &mut self.importances {
                *importance /= total;
            }
        }
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or_else(|| {
            ForecastError::NotFitted("DecisionTreeRegressor has not been fitted to data".to_string())
        })?;
        Ok(x.rows().into_iter().map(|row| root.predict(row)).collect())
    }

    fn params(&self) -> Self::Params {
        self.params
    }

    fn set_params(&mut self, params: Self::Params) -> Result<()> {
        Self::validate(&params)?;
        self.params = params;
        self.root = None;
        self.importances.clear();
        Ok(())
    }

    fn clone_unfitted(&self) -> Self {
        Self {
            params: self.params,
            root: None,
            importances: Vec::new(),
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.root.as_ref().map(|_| self.importances.clone())
    }
}
