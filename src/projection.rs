//! 2-D layout of embedding vectors for the projection plots

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ProjectionError {
    #[error("No embeddings to project")]
    Empty,

    #[error("Embedding {index} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionParams {
    pub n_neighbors: usize,
    pub metric: Metric,
}

impl ProjectionParams {
    /// Neighbourhood of `ceil(sqrt(n))` points under cosine distance
    pub fn for_points(n: usize) -> Self {
        Self {
            n_neighbors: (n as f64).sqrt().ceil() as usize,
            metric: Metric::Cosine,
        }
    }
}

/// Dimensionality reduction seam; the panel treats it as a black box
pub trait Projector: Send {
    fn project(
        &self,
        embeds: &[&[f32]],
        params: ProjectionParams,
    ) -> Result<Vec<[f32; 2]>, ProjectionError>;
}

/// Principal-axis projection of L2-normalized embeddings
///
/// Normalizing first makes euclidean geometry follow cosine similarity, so
/// speakers cluster the same way they do under a cosine metric. Axes are found
/// by power iteration from a fixed start vector, which keeps layouts stable
/// across redraws.
#[derive(Debug, Clone)]
pub struct CosinePca {
    iterations: usize,
}

impl Default for CosinePca {
    fn default() -> Self {
        Self { iterations: 100 }
    }
}

impl Projector for CosinePca {
    fn project(
        &self,
        embeds: &[&[f32]],
        params: ProjectionParams,
    ) -> Result<Vec<[f32; 2]>, ProjectionError> {
        let dim = embeds.first().ok_or(ProjectionError::Empty)?.len();
        for (index, embed) in embeds.iter().enumerate() {
            if embed.len() != dim {
                return Err(ProjectionError::DimensionMismatch {
                    index,
                    expected: dim,
                    actual: embed.len(),
                });
            }
        }

        log::debug!(
            "Projecting {} embeddings of dim {} ({:?}, n_neighbors={})",
            embeds.len(),
            dim,
            params.metric,
            params.n_neighbors
        );

        let normalized: Vec<Vec<f64>> = embeds.iter().map(|e| normalize(e)).collect();
        let centered = center(normalized, dim);

        let first = self.principal_axis(&centered, dim, None);
        let second = self.principal_axis(&centered, dim, first.as_deref());

        Ok(centered
            .iter()
            .map(|row| {
                [
                    first.as_deref().map(|axis| dot(row, axis)).unwrap_or(0.0) as f32,
                    second.as_deref().map(|axis| dot(row, axis)).unwrap_or(0.0) as f32,
                ]
            })
            .collect())
    }
}

impl CosinePca {
    /// Dominant axis of the covariance, orthogonal to `exclude` if given.
    /// None when the data has no variance left in that subspace.
    fn principal_axis(&self, rows: &[Vec<f64>], dim: usize, exclude: Option<&[f64]>) -> Option<Vec<f64>> {
        if dim == 0 {
            return None;
        }

        // Fixed, non-degenerate start vector
        let mut axis: Vec<f64> = (0..dim).map(|i| 1.0 + (i as f64) * 1e-3).collect();
        if let Some(ex) = exclude {
            remove_component(&mut axis, ex);
        }
        scale_to_unit(&mut axis)?;

        for _ in 0..self.iterations {
            // axis <- X^T X axis
            let mut next = vec![0.0; dim];
            for row in rows {
                let proj = dot(row, &axis);
                for (n, r) in next.iter_mut().zip(row) {
                    *n += proj * r;
                }
            }
            if let Some(ex) = exclude {
                remove_component(&mut next, ex);
            }
            scale_to_unit(&mut next)?;
            axis = next;
        }

        Some(axis)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(embed: &[f32]) -> Vec<f64> {
    let norm = embed.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>().sqrt();
    if norm == 0.0 {
        return vec![0.0; embed.len()];
    }
    embed.iter().map(|&v| v as f64 / norm).collect()
}

fn center(mut rows: Vec<Vec<f64>>, dim: usize) -> Vec<Vec<f64>> {
    let n = rows.len() as f64;
    let mut mean = vec![0.0; dim];
    for row in &rows {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v / n;
        }
    }
    for row in &mut rows {
        for (v, m) in row.iter_mut().zip(&mean) {
            *v -= m;
        }
    }
    rows
}

fn remove_component(v: &mut [f64], axis: &[f64]) {
    let proj = dot(v, axis);
    for (x, a) in v.iter_mut().zip(axis) {
        *x -= proj * a;
    }
}

fn scale_to_unit(v: &mut [f64]) -> Option<()> {
    let norm = dot(v, v).sqrt();
    if norm < 1e-12 {
        return None;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Some(())
}
