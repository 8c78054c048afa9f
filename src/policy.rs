//! Fixed-topology feed-forward policy: 8 inputs, 16 tanh hidden units, 4 raw
//! action scores.

use rand::Rng;
use rand_distr::StandardNormal;
use thiserror::Error;

pub const INPUTS: usize = 8;
pub const HIDDEN: usize = 16;
pub const OUTPUTS: usize = 4;

pub type Observation = [f64; INPUTS];
pub type Scores = [f64; OUTPUTS];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{layer} has {rows} rows, expected {expected}")]
    Rows { layer: &'static str, rows: usize, expected: usize },
    #[error("{layer} row {row} has {cols} columns, expected {expected}")]
    Cols { layer: &'static str, row: usize, cols: usize, expected: usize },
}

/// Two dense weight matrices stored row-major. Cloning copies the weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    w1: Vec<f64>,
    w2: Vec<f64>,
}

impl Policy {
    /// Every weight drawn independently from a standard normal.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let w1: Vec<f64> = (0..INPUTS * HIDDEN).map(|_| rng.sample(StandardNormal)).collect();
        let w2: Vec<f64> = (0..HIDDEN * OUTPUTS).map(|_| rng.sample(StandardNormal)).collect();
        Self { w1, w2 }
    }

    /// All weights zero: every score is 0, so the argmax always picks action 0.
    pub fn zeroed() -> Self {
        Self { w1: vec![0.0; INPUTS * HIDDEN], w2: vec![0.0; HIDDEN * OUTPUTS] }
    }

    pub fn forward(&self, x: &Observation) -> Scores {
        let mut hidden = [0.0; HIDDEN];
        for (j, h) in hidden.iter_mut().enumerate() {
            let sum: f64 = x.iter().enumerate().map(|(i, xi)| xi * self.w1[i * HIDDEN + j]).sum();
            *h = sum.tanh();
        }

        let mut out = [0.0; OUTPUTS];
        for (k, o) in out.iter_mut().enumerate() {
            *o = hidden.iter().enumerate().map(|(j, hj)| hj * self.w2[j * OUTPUTS + k]).sum();
        }
        out
    }

    /// With probability `rate` per weight, adds `N(0, 1) * magnitude`.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, rate: f64, magnitude: f64) {
        for w in self.w1.iter_mut().chain(self.w2.iter_mut()) {
            if rng.gen_bool(rate) {
                let noise: f64 = rng.sample(StandardNormal);
                *w += noise * magnitude;
            }
        }
    }

    /// Nested `[row][col]` copies of W1 (8x16) and W2 (16x4).
    pub fn matrices(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let w1 = self.w1.chunks(HIDDEN).map(<[f64]>::to_vec).collect();
        let w2 = self.w2.chunks(OUTPUTS).map(<[f64]>::to_vec).collect();
        (w1, w2)
    }

    pub fn from_matrices(w1: &[Vec<f64>], w2: &[Vec<f64>]) -> Result<Self, ShapeError> {
        Ok(Self {
            w1: flatten("w1", w1, INPUTS, HIDDEN)?,
            w2: flatten("w2", w2, HIDDEN, OUTPUTS)?,
        })
    }
}

fn flatten(
    layer: &'static str,
    rows: &[Vec<f64>],
    expected_rows: usize,
    expected_cols: usize,
) -> Result<Vec<f64>, ShapeError> {
    if rows.len() != expected_rows {
        return Err(ShapeError::Rows { layer, rows: rows.len(), expected: expected_rows });
    }
    let mut flat = Vec::with_capacity(expected_rows * expected_cols);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != expected_cols {
            return Err(ShapeError::Cols { layer, row, cols: values.len(), expected: expected_cols });
        }
        flat.extend_from_slice(values);
    }
    Ok(flat)
}

/// Index of the highest score; the first index wins ties.
pub fn argmax(scores: &Scores) -> usize {
    let mut best = 0;
    for (i, s) in scores.iter().enumerate().skip(1) {
        if *s > scores[best] {
            best = i;
        }
    }
    best
}
