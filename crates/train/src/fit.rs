//! Ordinary least-squares fitting
//!
//! Solves the normal equations with Gaussian elimination. Deterministic: the
//! same dataset always produces the same coefficients.

use crate::dataset::Dataset;
use anyhow::Result;
use serving_lib::LinearModel;

/// A fitted model together with its training-set fit quality
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub model: LinearModel,
    pub r2_score: f64,
}

/// Fit an intercept plus one coefficient per feature.
pub fn fit_ols(dataset: &Dataset) -> Result<FittedModel> {
    let n_features = serving_lib::models::FEATURE_NAMES.len();
    let n_params = n_features + 1;
    let n_rows = dataset.records.len();
    if n_rows < n_params {
        anyhow::bail!(
            "need at least {} rows to fit {} parameters, got {}",
            n_params,
            n_params,
            n_rows
        );
    }

    // Normal equations: (X'X) beta = X'y with a leading intercept column
    let mut xtx = vec![vec![0.0f64; n_params]; n_params];
    let mut xty = vec![0.0f64; n_params];

    for (record, &target) in dataset.records.iter().zip(&dataset.targets) {
        let mut row = [0.0f64; 7];
        row[0] = 1.0;
        row[1..].copy_from_slice(record);

        for i in 0..n_params {
            for j in 0..n_params {
                xtx[i][j] += row[i] * row[j];
            }
            xty[i] += row[i] * target;
        }
    }

    let beta = solve(xtx, xty)?;
    let model = LinearModel::from_parameters(beta[0], beta[1..].to_vec());
    let r2_score = r_squared(dataset, &beta);

    Ok(FittedModel { model, r2_score })
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-10 {
            anyhow::bail!("normal equations are singular (collinear features?)");
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}

fn r_squared(dataset: &Dataset, beta: &[f64]) -> f64 {
    let n = dataset.targets.len() as f64;
    let mean = dataset.targets.iter().sum::<f64>() / n;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (record, &target) in dataset.records.iter().zip(&dataset.targets) {
        let mut predicted = beta[0];
        for (value, coefficient) in record.iter().zip(&beta[1..]) {
            predicted += value * coefficient;
        }
        ss_res += (target - predicted).powi(2);
        ss_tot += (target - mean).powi(2);
    }

    if ss_tot.abs() < f64::EPSILON {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}
