// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Plain matrix multiplication to check accelerator results against.

use systolic_components::types::{Accumulator, Operand};

use crate::host::{Job, Tile};

/// `a × b` with exact integer accumulation.
#[must_use]
pub fn matmul(a: &[Vec<Operand>], b: &[Vec<Operand>]) -> Vec<Vec<Accumulator>> {
    let cols = b.first().map_or(0, Vec::len);
    a.iter()
        .map(|a_row| {
            (0..cols)
                .map(|col| {
                    a_row
                        .iter()
                        .zip(b)
                        .map(|(x, b_row)| Accumulator::from(*x) * Accumulator::from(b_row[col]))
                        .sum::<Accumulator>()
                })
                .collect()
        })
        .collect()
}

/// The tile an N×N grid produces for `job` when `rows` rows are unloaded.
///
/// Rows beyond the grid read back as zero.
#[must_use]
pub fn expected_tile(job: &Job, n: usize, rows: usize) -> Tile {
    (0..rows)
        .map(|r| {
            (0..n)
                .map(|c| {
                    if r >= n {
                        return 0;
                    }
                    job.rows()
                        .iter()
                        .map(|row| {
                            Accumulator::from(row.inputs[r]) * Accumulator::from(row.weights[c])
                        })
                        .sum::<Accumulator>()
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_product() {
        let a = vec![vec![1, 2], vec![3, 4]];
        let b = vec![vec![5, 6], vec![7, 8]];
        assert_eq!(matmul(&a, &b), vec![vec![19, 22], vec![43, 50]]);
    }

    #[test]
    fn tile_matches_matmul() {
        let a = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let b = vec![vec![7, 8], vec![9, 10], vec![11, 12]];
        let job = Job::from_matrices(&a, &b).unwrap();

        let mut expected = matmul(&a, &b);
        expected.push(vec![0, 0]);
        assert_eq!(expected_tile(&job, 2, 3), expected);
    }
}
