//! Gradient-boosted binary classifier.
//!
//! Depth-limited regression trees fit to the logistic-loss gradients, with
//! Newton leaf values and second-order split gain (L2-regularized). Boosting
//! stops early when the held-out logloss stops improving, which matters more
//! than raw accuracy here: the label sets this service trains on are small
//! and noisy, typically tens to low hundreds of rows.
//!
//! Each accepted split adds its gain to a per-feature accumulator, giving
//! the gain-style importance the weight adapter consumes.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};

/// Boosting hyperparameters. Defaults mirror the configuration the service
/// has been running with: 100 round cap, patience 10, learning rate 0.05.
#[derive(Debug, Clone)]
pub struct GradientBoostParameters {
    pub learning_rate: f64,
    pub max_rounds: usize,
    pub early_stopping_rounds: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub lambda: f64,
}

impl Default for GradientBoostParameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            max_rounds: 100,
            early_stopping_rounds: 10,
            max_depth: 3,
            min_samples_leaf: 2,
            lambda: 1.0,
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug)]
struct RegressionTree {
    root: Node,
    // Split gain accumulated per feature while this tree was grown.
    gain: Vec<f64>,
}

struct TreeContext<'a> {
    x: &'a Array2<f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a GradientBoostParameters,
}

impl RegressionTree {
    fn fit(ctx: &TreeContext<'_>, rows: &[usize]) -> Self {
        let mut gain = vec![0.0; ctx.x.ncols()];
        let root = Self::build_node(ctx, rows, 0, &mut gain);
        Self { root, gain }
    }

    fn build_node(
        ctx: &TreeContext<'_>,
        rows: &[usize],
        depth: usize,
        gain: &mut [f64],
    ) -> Node {
        let g_sum: f64 = rows.iter().map(|&i| ctx.grad[i]).sum();
        let h_sum: f64 = rows.iter().map(|&i| ctx.hess[i]).sum();
        let leaf = Node::Leaf {
            value: -g_sum / (h_sum + ctx.params.lambda),
        };

        if depth >= ctx.params.max_depth || rows.len() < 2 * ctx.params.min_samples_leaf {
            return leaf;
        }

        let Some((best_gain, feature, threshold)) =
            Self::best_split(ctx, rows, g_sum, h_sum)
        else {
            return leaf;
        };

        gain[feature] += best_gain;

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| ctx.x[[i, feature]] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(Self::build_node(ctx, &left_rows, depth + 1, gain)),
            right: Box::new(Self::build_node(ctx, &right_rows, depth + 1, gain)),
        }
    }

    /// Exact greedy split search over every feature. Returns the best
    /// positive-gain split, if any.
    fn best_split(
        ctx: &TreeContext<'_>,
        rows: &[usize],
        g_sum: f64,
        h_sum: f64,
    ) -> Option<(f64, usize, f64)> {
        let lambda = ctx.params.lambda;
        let min_leaf = ctx.params.min_samples_leaf;
        let parent_score = g_sum * g_sum / (h_sum + lambda);

        let mut best: Option<(f64, usize, f64)> = None;
        let mut order = rows.to_vec();

        for feature in 0..ctx.x.ncols() {
            order.sort_by(|&a, &b| {
                ctx.x[[a, feature]]
                    .partial_cmp(&ctx.x[[b, feature]])
                    .unwrap_or(Ordering::Equal)
            });

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            for i in 0..order.len() - 1 {
                g_left += ctx.grad[order[i]];
                h_left += ctx.hess[order[i]];

                let here = ctx.x[[order[i], feature]];
                let next = ctx.x[[order[i + 1], feature]];
                if here == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = order.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let g_right = g_sum - g_left;
                let h_right = h_sum - h_left;
                let split_gain = g_left * g_left / (h_left + lambda)
                    + g_right * g_right / (h_right + lambda)
                    - parent_score;

                if split_gain > 1e-12
                    && best.map(|(g, _, _)| split_gain > g).unwrap_or(true)
                {
                    best = Some((split_gain, feature, (here + next) / 2.0));
                }
            }
        }

        best
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct GradientBoostedClassifier {
    params: GradientBoostParameters,
    base_score: f64,
    trees: Vec<RegressionTree>,
    feature_gain: Vec<f64>,
}

impl GradientBoostedClassifier {
    /// Fits on the training partition, watching logloss on the validation
    /// partition for early stopping. Trees past the best round are dropped.
    pub fn fit(
        x_train: &Array2<f64>,
        y_train: &[u8],
        x_valid: &Array2<f64>,
        y_valid: &[u8],
        params: GradientBoostParameters,
    ) -> Self {
        let n = x_train.nrows();
        let positives = y_train.iter().filter(|&&y| y == 1).count();
        let rate = (positives as f64 / n as f64).clamp(1e-6, 1.0 - 1e-6);
        let base_score = (rate / (1.0 - rate)).ln();

        let mut f_train = vec![base_score; n];
        let mut f_valid = vec![base_score; x_valid.nrows()];
        let rows: Vec<usize> = (0..n).collect();

        let mut trees: Vec<RegressionTree> = Vec::new();
        let mut best_loss = f64::INFINITY;
        let mut best_round = 0usize;

        for round in 0..params.max_rounds {
            let mut grad = vec![0.0; n];
            let mut hess = vec![0.0; n];
            for i in 0..n {
                let p = sigmoid(f_train[i]);
                grad[i] = p - y_train[i] as f64;
                hess[i] = (p * (1.0 - p)).max(1e-12);
            }

            let tree = {
                let ctx = TreeContext {
                    x: x_train,
                    grad: &grad,
                    hess: &hess,
                    params: &params,
                };
                RegressionTree::fit(&ctx, &rows)
            };

            for i in 0..n {
                f_train[i] += params.learning_rate * tree.predict_row(x_train.row(i));
            }
            for i in 0..x_valid.nrows() {
                f_valid[i] += params.learning_rate * tree.predict_row(x_valid.row(i));
            }
            trees.push(tree);

            let loss = logloss(&f_valid, y_valid);
            if loss + 1e-9 < best_loss {
                best_loss = loss;
                best_round = round + 1;
            } else if round + 1 - best_round >= params.early_stopping_rounds {
                break;
            }
        }

        trees.truncate(best_round.max(1));

        let mut feature_gain = vec![0.0; x_train.ncols()];
        for tree in &trees {
            for (total, g) in feature_gain.iter_mut().zip(&tree.gain) {
                *total += g;
            }
        }

        Self {
            params,
            base_score,
            trees,
            feature_gain,
        }
    }

    /// Success probability per row, all retained boosting rounds applied.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                let score = self.base_score
                    + self.params.learning_rate
                        * self
                            .trees
                            .iter()
                            .map(|t| t.predict_row(row))
                            .sum::<f64>();
                sigmoid(score)
            })
            .collect()
    }

    /// Accumulated split gain per feature, in training column order.
    pub fn feature_gain(&self) -> &[f64] {
        &self.feature_gain
    }

    pub fn rounds(&self) -> usize {
        self.trees.len()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn logloss(scores: &[f64], y: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: f64 = scores
        .iter()
        .zip(y)
        .map(|(&z, &label)| {
            let p = sigmoid(z).clamp(1e-12, 1.0 - 1e-12);
            if label == 1 { -p.ln() } else { -(1.0 - p).ln() }
        })
        .sum();
    total / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// One informative feature, one pure-noise feature.
    fn separable_data(n: usize) -> (Array2<f64>, Vec<u8>) {
        let mut x = Array2::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let signal = if i % 2 == 0 { 1.0 } else { -1.0 };
            x[[i, 0]] = signal;
            x[[i, 1]] = (i as f64 * 0.37).sin();
            y.push(if signal > 0.0 { 1 } else { 0 });
        }
        (x, y)
    }

    #[test]
    fn test_learns_separable_signal() {
        let (x, y) = separable_data(40);
        let model =
            GradientBoostedClassifier::fit(&x, &y, &x, &y, GradientBoostParameters::default());

        let proba = model.predict_proba(&x);
        for (p, &label) in proba.iter().zip(&y) {
            assert_eq!((*p > 0.5) as u8, label);
        }
    }

    #[test]
    fn test_gain_concentrates_on_informative_feature() {
        let (x, y) = separable_data(40);
        let model =
            GradientBoostedClassifier::fit(&x, &y, &x, &y, GradientBoostParameters::default());

        let gain = model.feature_gain();
        assert!(gain[0] > 0.0);
        assert!(gain[0] > gain[1]);
    }

    #[test]
    fn test_single_class_input_yields_no_splits() {
        let x = Array2::zeros((24, 3));
        let y = vec![1u8; 24];
        let model =
            GradientBoostedClassifier::fit(&x, &y, &x, &y, GradientBoostParameters::default());

        assert!(model.feature_gain().iter().all(|&g| g == 0.0));
        let proba = model.predict_proba(&x);
        assert!(proba.iter().all(|&p| p > 0.5));
    }

    #[test]
    fn test_early_stopping_caps_rounds() {
        let (x, y) = separable_data(40);
        let params = GradientBoostParameters::default();
        let cap = params.max_rounds;
        let model = GradientBoostedClassifier::fit(&x, &y, &x, &y, params);
        assert!(model.rounds() >= 1);
        assert!(model.rounds() <= cap);
    }
}
