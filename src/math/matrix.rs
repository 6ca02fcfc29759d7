use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map(|r| r.len()).unwrap_or(0),
            data,
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / rows)).
    ///
    /// `rows` is the fan-in here because projection weights are applied as
    /// `input * W` with `input` of width `rows`. The generator is passed in
    /// so that model construction is reproducible from a fixed seed.
    pub fn xavier<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (1.0 / rows as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        )
    }

    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!(
                "Matrices are of incorrect sizes for matmul: {}x{} * {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            );
        }
        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }
                res.data[i][j] = sum;
            }
        }
        res
    }

    pub fn add(&self, rhs: &Matrix) -> Matrix {
        self.zip_with(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Matrix {
        self.zip_with(rhs, |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Matrix) -> Matrix {
        self.zip_with(rhs, |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    fn zip_with<F>(&self, rhs: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!(
                "Matrices are of incorrect sizes: {}x{} vs {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            );
        }
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(ra, rb)| ra.iter().zip(rb.iter()).map(|(&a, &b)| f(a, b)).collect())
            .collect();
        Matrix::from_data(data)
    }

    /// Adds `row` to every row of the matrix (bias broadcast).
    pub fn add_row(&self, row: &[f64]) -> Matrix {
        assert_eq!(self.cols, row.len(), "bias width must match matrix width");
        Matrix::from_data(
            self.data
                .iter()
                .map(|r| r.iter().zip(row.iter()).map(|(&a, &b)| a + b).collect())
                .collect(),
        )
    }

    /// Sums each column into a single vector; used for bias gradients.
    pub fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for row in &self.data {
            for (s, &x) in sums.iter_mut().zip(row.iter()) {
                *s += x;
            }
        }
        sums
    }

    /// Row-wise softmax with the usual max-subtraction for stability.
    pub fn softmax_rows(&self) -> Matrix {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| {
                    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
                    let sum: f64 = exps.iter().sum();
                    exps.into_iter().map(|e| e / sum).collect()
                })
                .collect(),
        )
    }

    /// Concatenates matrices with equal row counts side by side.
    pub fn hcat(parts: &[Matrix]) -> Matrix {
        assert!(!parts.is_empty(), "hcat needs at least one matrix");
        let rows = parts[0].rows;
        assert!(
            parts.iter().all(|m| m.rows == rows),
            "hcat requires equal row counts"
        );
        let data = (0..rows)
            .map(|i| {
                parts
                    .iter()
                    .flat_map(|m| m.data[i].iter().cloned())
                    .collect()
            })
            .collect();
        Matrix::from_data(data)
    }

    /// Returns columns `[start, end)` as a new matrix.
    pub fn slice_cols(&self, start: usize, end: usize) -> Matrix {
        assert!(start <= end && end <= self.cols, "column slice out of range");
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row[start..end].to_vec())
                .collect(),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|row| row.iter().all(|x| x.is_finite()))
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_matches_hand_computation() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        let c = a.matmul(&b);
        assert_eq!(c.data, vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
    }

    #[test]
    fn softmax_rows_are_distributions() {
        let m = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![-10.0, 0.0, 10.0]]);
        let s = m.softmax_rows();
        for row in &s.data {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|&x| x > 0.0));
        }
        // Larger logits dominate.
        assert!(s.data[0][2] > s.data[0][1] && s.data[0][1] > s.data[0][0]);
    }

    #[test]
    fn hcat_and_slice_cols_are_inverse() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![5.0], vec![6.0]]);
        let joined = Matrix::hcat(&[a.clone(), b.clone()]);
        assert_eq!(joined.cols, 3);
        assert_eq!(joined.slice_cols(0, 2), a);
        assert_eq!(joined.slice_cols(2, 3), b);
    }

    #[test]
    fn col_sums_accumulate_per_column() {
        let m = Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 3.0]]);
        assert_eq!(m.col_sums(), vec![3.0, 2.0]);
    }
}
