//! Novelty scoring in embedding space.
//!
//! An artifact's novelty is the mean cosine distance from its embedding to
//! its `k` nearest neighbors in the current population. All arithmetic is
//! done in `f32`; callers holding `f64` embeddings convert explicitly through
//! [`EmbeddingMatrix::from_f64_rows`].

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

/// Distance assigned to self-comparisons.
///
/// Finite so that it stays sortable, and large enough that a row never picks
/// itself as a nearest neighbor.
pub const SELF_DISTANCE: f32 = f32::MAX / 2.0;

/// Lower bound on a row norm during normalization.
const NORM_EPSILON: f32 = 1e-12;

/// Malformed embedding input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("Embeddings must have at least one dimension")]
    ZeroDimension,
    #[error("Embedding row {row} has {found} dimensions, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Embedding row {row} contains a non-finite value at column {column}")]
    NonFinite { row: usize, column: usize },
    #[error("Embedding row {row} has a value at column {column} outside the f32 range")]
    OutOfRange { row: usize, column: usize },
    #[error("Artifact {0} has no embedding")]
    MissingEmbedding(crate::schema::ArtifactId),
    #[error("Embedding matrix has {rows} rows but the population has {population} members")]
    RowCountMismatch { rows: usize, population: usize },
}

/// Dense row-major matrix of embeddings, one row per population member.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Build from rows, validating shape and values.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, ShapeError> {
        let Some(first) = rows.first() else {
            return Ok(Self::empty());
        };
        let dim = first.as_ref().len();
        if dim == 0 {
            return Err(ShapeError::ZeroDimension);
        }

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != dim {
                return Err(ShapeError::Ragged {
                    row,
                    expected: dim,
                    found: values.len(),
                });
            }
            if let Some(column) = values.iter().position(|v| !v.is_finite()) {
                return Err(ShapeError::NonFinite { row, column });
            }
            data.extend_from_slice(values);
        }

        Ok(Self {
            rows: rows.len(),
            dim,
            data,
        })
    }

    /// Build from `f64` rows, converting every value to `f32`.
    ///
    /// Finite values beyond `f32::MAX` in magnitude are rejected with
    /// [`ShapeError::OutOfRange`] rather than rounded to infinity.
    pub fn from_f64_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ShapeError> {
        for (row, values) in rows.iter().enumerate() {
            let out_of_range = values
                .as_ref()
                .iter()
                .position(|v| v.is_finite() && v.abs() > f32::MAX as f64);
            if let Some(column) = out_of_range {
                return Err(ShapeError::OutOfRange { row, column });
            }
        }
        let converted: Vec<Vec<f32>> = rows
            .iter()
            .map(|r| r.as_ref().iter().map(|&v| v as f32).collect())
            .collect();
        Self::from_rows(&converted)
    }

    /// Matrix with no rows.
    pub fn empty() -> Self {
        Self {
            rows: 0,
            dim: 0,
            data: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Copy with every row scaled to unit L2 norm.
    ///
    /// Rows with norm below `1e-12` are divided by the epsilon instead, so a
    /// zero vector stays zero. The norm is accumulated in `f64` so large
    /// finite components cannot overflow it.
    pub fn normalize_rows(&self) -> Self {
        let mut data = self.data.clone();
        if self.dim > 0 {
            for row in data.chunks_exact_mut(self.dim) {
                let norm = row
                    .iter()
                    .map(|&v| f64::from(v) * f64::from(v))
                    .sum::<f64>()
                    .sqrt();
                let scale = 1.0 / norm.max(f64::from(NORM_EPSILON));
                for v in row.iter_mut() {
                    *v = (f64::from(*v) * scale) as f32;
                }
            }
        }
        Self {
            rows: self.rows,
            dim: self.dim,
            data,
        }
    }
}

/// Square pairwise distance matrix with self-distances preset.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f32>,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }
}

/// Cosine distance (`1 - cos`) between every pair of rows.
///
/// Returns a new matrix; the diagonal holds [`SELF_DISTANCE`].
pub fn cosine_distance_matrix(embeddings: &EmbeddingMatrix) -> DistanceMatrix {
    let n = embeddings.len();
    let normalized = embeddings.normalize_rows();
    let mut data = vec![0.0f32; n * n];

    let fill_row = |(i, row): (usize, &mut [f32])| {
        let a = normalized.row(i);
        for (j, out) in row.iter_mut().enumerate() {
            *out = if i == j {
                SELF_DISTANCE
            } else {
                1.0 - dot(a, normalized.row(j))
            };
        }
    };

    if n > 0 {
        #[cfg(not(target_arch = "wasm32"))]
        data.par_chunks_mut(n).enumerate().for_each(fill_row);

        #[cfg(target_arch = "wasm32")]
        data.chunks_mut(n).enumerate().for_each(fill_row);
    }

    DistanceMatrix { n, data }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Mean of the `k` smallest values in `row`.
fn mean_of_k_smallest(row: &[f32], k: usize) -> f32 {
    let mut sorted = row.to_vec();
    sorted.sort_by(f32::total_cmp);
    let k = k.min(sorted.len());
    if k == 0 {
        return 0.0;
    }
    sorted[..k].iter().sum::<f32>() / k as f32
}

/// Novelty score of every row: mean distance to its `k` nearest neighbors.
///
/// When there are no more rows than `k`, every score is zero.
pub fn novelty_scores(embeddings: &EmbeddingMatrix, k_neighbors: usize) -> Vec<f32> {
    let n = embeddings.len();
    let k = k_neighbors.max(1);
    if n <= k {
        return vec![0.0; n];
    }

    let distances = cosine_distance_matrix(embeddings);

    #[cfg(not(target_arch = "wasm32"))]
    let scores: Vec<f32> = (0..n)
        .into_par_iter()
        .map(|i| mean_of_k_smallest(distances.row(i), k))
        .collect();

    #[cfg(target_arch = "wasm32")]
    let scores: Vec<f32> = (0..n)
        .map(|i| mean_of_k_smallest(distances.row(i), k))
        .collect();

    scores
}

/// Population indices ranked by novelty.
#[derive(Debug, Clone, PartialEq)]
pub struct NoveltyRanking {
    /// Row indices, most novel first.
    pub order: Vec<usize>,
    /// Novelty score per row, in row order.
    pub scores: Vec<f32>,
    scored: bool,
}

impl NoveltyRanking {
    /// Whether the population was too small to score.
    ///
    /// A scored population whose scores are all zero (identical
    /// embeddings) is not uninformative.
    pub fn is_uninformative(&self) -> bool {
        !self.scored
    }

    /// Consume into the index order alone.
    pub fn into_order(self) -> Vec<usize> {
        self.order
    }
}

/// Rank rows of `embeddings` by novelty, highest first.
///
/// With `n <= k_neighbors` rows the ranking is the identity order with zero
/// scores. A `k_neighbors` of zero is treated as one. Equal scores keep row
/// order.
pub fn select_by_novelty(embeddings: &EmbeddingMatrix, k_neighbors: usize) -> NoveltyRanking {
    let n = embeddings.len();
    let k = k_neighbors.max(1);
    if n <= k {
        log::debug!(
            "Population of {} is too small for {}-neighbor novelty; using identity order",
            n,
            k
        );
        return NoveltyRanking {
            order: (0..n).collect(),
            scores: vec![0.0; n],
            scored: false,
        };
    }

    let scores = novelty_scores(embeddings, k);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    NoveltyRanking {
        order,
        scores,
        scored: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f32]]) -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_far_point_most_novel() {
        let m = matrix(&[&[1.0, 0.0], &[0.99, 0.01], &[0.0, 1.0]]);
        let ranking = select_by_novelty(&m, 1);
        assert_eq!(ranking.order[0], 2);
        assert!(ranking.scores[2] > ranking.scores[0]);
        assert!(ranking.scores[2] > ranking.scores[1]);
    }

    #[test]
    fn test_small_population_fallback() {
        let m = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[0.5, 0.5]]);
        let ranking = select_by_novelty(&m, 3);
        assert_eq!(ranking.order, vec![0, 1, 2]);
        assert_eq!(ranking.scores, vec![0.0; 3]);
        assert!(ranking.is_uninformative());

        let empty = select_by_novelty(&EmbeddingMatrix::empty(), 3);
        assert!(empty.order.is_empty());
        assert!(empty.scores.is_empty());
    }

    #[test]
    fn test_self_excluded() {
        let m = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[-1.0, 0.0]]);
        let distances = cosine_distance_matrix(&m);
        for i in 0..3 {
            assert_eq!(distances.get(i, i), SELF_DISTANCE);
        }
        let scores = novelty_scores(&m, 1);
        // Nearest neighbor of each row is orthogonal (distance 1), never itself (distance 0).
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!((scores[1] - 1.0).abs() < 1e-6);
        assert!((scores[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_magnitude_invariant() {
        let a = matrix(&[&[1.0, 0.0], &[2.0, 2.0], &[0.0, 3.0], &[-1.0, 1.0]]);
        let b = matrix(&[&[10.0, 0.0], &[0.5, 0.5], &[0.0, 0.1], &[-4.0, 4.0]]);
        let sa = novelty_scores(&a, 2);
        let sb = novelty_scores(&b, 2);
        for (x, y) in sa.iter().zip(&sb) {
            assert!((x - y).abs() < 1e-5);
        }

        let huge = matrix(&[&[1e20, 0.0], &[0.99e20, 0.01e20], &[0.0, 1e20]]);
        let ranking = select_by_novelty(&huge, 1);
        assert_eq!(ranking.order[0], 2);
        let small = select_by_novelty(&matrix(&[&[1.0, 0.0], &[0.99, 0.01], &[0.0, 1.0]]), 1);
        for (x, y) in ranking.scores.iter().zip(&small.scores) {
            assert!((x - y).abs() < 1e-5);
        }

        let extreme = matrix(&[&[f32::MAX, f32::MAX]]).normalize_rows();
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!(extreme.row(0).iter().all(|v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn test_identical_embeddings_are_scored() {
        let row: &[f32] = &[1.0, 0.0];
        let m = matrix(&[row; 5]);
        let ranking = select_by_novelty(&m, 1);
        assert_eq!(ranking.scores, vec![0.0; 5]);
        assert!(!ranking.is_uninformative());
        assert_eq!(ranking.order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_mean_of_k_nearest() {
        // Row 0 distances: to 1 = 0, to 2 = 1, to 3 = 2.
        let m = matrix(&[&[1.0, 0.0], &[1.0, 0.0], &[0.0, 1.0], &[-1.0, 0.0]]);
        let scores = novelty_scores(&m, 2);
        assert!((scores[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_finite() {
        let m = matrix(&[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]]);
        let scores = novelty_scores(&m, 1);
        assert!(scores.iter().all(|s| s.is_finite()));
        assert!((scores[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let m = matrix(&[&[1.0, 0.0], &[0.0, 1.0], &[-1.0, 0.0], &[0.0, -1.0]]);
        let ranking = select_by_novelty(&m, 1);
        assert_eq!(ranking.order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_k_treated_as_one() {
        let m = matrix(&[&[1.0, 0.0], &[0.99, 0.01], &[0.0, 1.0]]);
        assert_eq!(select_by_novelty(&m, 0), select_by_novelty(&m, 1));
    }

    #[test]
    fn test_shape_errors() {
        let ragged: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![1.0]];
        assert_eq!(
            EmbeddingMatrix::from_rows(&ragged),
            Err(ShapeError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            })
        );

        let empty_dim: Vec<Vec<f32>> = vec![vec![], vec![]];
        assert_eq!(
            EmbeddingMatrix::from_rows(&empty_dim),
            Err(ShapeError::ZeroDimension)
        );

        let nan: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![0.0, f32::NAN]];
        assert_eq!(
            EmbeddingMatrix::from_rows(&nan),
            Err(ShapeError::NonFinite { row: 1, column: 1 })
        );
    }

    #[test]
    fn test_f64_conversion() {
        let rows = vec![vec![1.0f64, 0.0], vec![0.0, 1.0]];
        let m = EmbeddingMatrix::from_f64_rows(&rows).unwrap();
        assert_eq!(m.dim(), 2);
        assert_eq!(m.row(1), &[0.0f32, 1.0]);

        let too_big = vec![vec![1.0f64, 0.0], vec![0.0, 1e300]];
        assert_eq!(
            EmbeddingMatrix::from_f64_rows(&too_big),
            Err(ShapeError::OutOfRange { row: 1, column: 1 })
        );
        let infinite = vec![vec![f64::INFINITY, 0.0]];
        assert_eq!(
            EmbeddingMatrix::from_f64_rows(&infinite),
            Err(ShapeError::NonFinite { row: 0, column: 0 })
        );
    }

    #[test]
    fn test_input_not_mutated() {
        let m = matrix(&[&[3.0, 4.0], &[1.0, 0.0], &[0.0, 2.0]]);
        let before = m.clone();
        let _ = select_by_novelty(&m, 1);
        assert_eq!(m, before);
    }
}
