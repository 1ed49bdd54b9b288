#![allow(unused)]
use rand::Rng;

pub(crate) fn generate_random_matrix(rows: usize, cols: usize) -> Vec<Vec<f32>> {
    (0..rows)
        .map(|_| (0..cols).map(|_| rand::thread_rng().gen()).collect())
        .collect()
}

pub(crate) fn generate_random_vector(dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rand::thread_rng().gen()).collect()
}

/// Row-by-row `a[i][j] + b[j]` over plain vectors.
pub(crate) fn broadcast_add_cpu(a: &[Vec<f32>], b: &[f32]) -> Option<Vec<f32>> {
    if a.iter().any(|row| row.len() != b.len()) {
        return None;
    }

    Some(
        a.iter()
            .flat_map(|row| row.iter().zip(b).map(|(x, y)| x + y))
            .collect(),
    )
}
