//! Seeded k-means with random initialisation and independent restarts
//!
//! Runs are bit-for-bit reproducible for a given seed: restart seeds are drawn
//! sequentially from one generator, per-point work is order-preserving, and
//! every floating-point accumulation happens in a fixed sequential order.
//! Empty clusters are relocated onto the farthest point, which leaves its
//! donor cluster, as scikit-learn does.

use crate::error::{Result, SkinToneError};
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    pub clusters: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    /// Relative to the mean per-feature variance of the data
    pub tolerance: f64,
    pub seed: u64,
}

/// Best partition found across all restarts
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    /// `clusters x features`
    pub centroids: Array2<f64>,
    /// Cluster index per input row
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    pub iterations: usize,
    /// Which restart produced this model
    pub restart: usize,
}

impl KMeansModel {
    pub fn cluster_count(&self) -> usize {
        self.centroids.nrows()
    }
}

fn squared_distance(point: ArrayView1<f32>, centroid: ArrayView1<f64>) -> f64 {
    point
        .iter()
        .zip(centroid.iter())
        .map(|(&p, &c)| {
            let d = f64::from(p) - c;
            d * d
        })
        .sum()
}

/// Nearest centroid per row; ties go to the lowest cluster index
fn assign(data: &Array2<f32>, centroids: &Array2<f64>) -> Vec<(usize, f64)> {
    (0..data.nrows())
        .into_par_iter()
        .map(|i| {
            let point = data.row(i);
            let mut best = (0, squared_distance(point, centroids.row(0)));
            for c in 1..centroids.nrows() {
                let d = squared_distance(point, centroids.row(c));
                if d < best.1 {
                    best = (c, d);
                }
            }
            best
        })
        .collect()
}

/// Mean of each cluster's members
///
/// A cluster left empty takes over the point farthest from its centroid; the
/// point leaves its donor cluster, and donors are never emptied. Should no
/// donor remain, the empty cluster keeps its previous centroid.
fn update(
    data: &Array2<f32>,
    assignment: &[(usize, f64)],
    previous: &Array2<f64>,
) -> Array2<f64> {
    let clusters = previous.nrows();
    let mut sums = Array2::<f64>::zeros((clusters, data.ncols()));
    let mut counts = vec![0usize; clusters];

    for (i, &(label, _)) in assignment.iter().enumerate() {
        counts[label] += 1;
        for (sum, &value) in sums.row_mut(label).iter_mut().zip(data.row(i).iter()) {
            *sum += f64::from(value);
        }
    }

    let empty: Vec<usize> = (0..clusters).filter(|&c| counts[c] == 0).collect();
    if !empty.is_empty() {
        let mut farthest: Vec<usize> = (0..data.nrows()).collect();
        // stable: equal distances keep row order
        farthest.sort_by(|&a, &b| assignment[b].1.total_cmp(&assignment[a].1));
        let mut candidates = farthest.into_iter();

        for &c in &empty {
            let Some(row) = candidates.find(|&row| counts[assignment[row].0] > 1) else {
                sums.row_mut(c).assign(&previous.row(c));
                continue;
            };
            let donor = assignment[row].0;
            let point = data.row(row).mapv(f64::from);
            sums.row_mut(donor).zip_mut_with(&point, |sum, &p| *sum -= p);
            counts[donor] -= 1;
            sums.row_mut(c).assign(&point);
            counts[c] = 1;
        }
    }

    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            sums.row_mut(c).mapv_inplace(|sum| sum / count as f64);
        }
    }
    sums
}

fn mean_feature_variance(data: &Array2<f32>) -> f64 {
    let n = data.nrows() as f64;
    let mut total = 0.0;
    for column in data.columns() {
        let mean = column.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = column
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        total += variance;
    }
    total / data.ncols() as f64
}

fn run_once(
    data: &Array2<f32>,
    config: &KMeansConfig,
    tolerance: f64,
    seed: u64,
    restart: usize,
) -> KMeansModel {
    let mut rng = StdRng::seed_from_u64(seed);
    let seeds = rand::seq::index::sample(&mut rng, data.nrows(), config.clusters);

    let mut centroids = Array2::<f64>::zeros((config.clusters, data.ncols()));
    for (c, row) in seeds.iter().enumerate() {
        centroids
            .row_mut(c)
            .assign(&data.row(row).mapv(f64::from));
    }

    let mut labels: Vec<usize> = Vec::new();
    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        let assignment = assign(data, &centroids);
        let next = update(data, &assignment, &centroids);
        let assigned: Vec<usize> = assignment.into_iter().map(|(c, _)| c).collect();

        let shift: f64 = (&next - &centroids).iter().map(|d| d * d).sum();
        centroids = next;

        let stable = assigned == labels;
        labels = assigned;
        if stable || shift <= tolerance {
            break;
        }
    }

    let final_assignment = assign(data, &centroids);
    let inertia = final_assignment.iter().map(|&(_, d)| d).sum();
    let labels = final_assignment.into_iter().map(|(c, _)| c).collect();

    KMeansModel {
        centroids,
        labels,
        inertia,
        iterations,
        restart,
    }
}

/// Partition the rows of `data` into `config.clusters` groups
///
/// # Errors
///
/// Returns `SkinToneError::Clustering` if there are no clusters to fit or
/// fewer rows than clusters.
pub fn fit(data: &Array2<f32>, config: &KMeansConfig) -> Result<KMeansModel> {
    let _span = tracing::debug_span!("kmeans").entered();

    if config.clusters == 0 || config.restarts == 0 {
        return Err(SkinToneError::clustering(format!(
            "{} clusters with {} restarts",
            config.clusters, config.restarts
        )));
    }
    if data.nrows() < config.clusters {
        return Err(SkinToneError::clustering(format!(
            "{} samples for {} clusters",
            data.nrows(),
            config.clusters
        )));
    }

    let tolerance = config.tolerance * mean_feature_variance(data);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.restarts).map(|_| rng.random()).collect();

    let runs: Vec<KMeansModel> = seeds
        .par_iter()
        .enumerate()
        .map(|(restart, &seed)| run_once(data, config, tolerance, seed, restart))
        .collect();

    let mut best: Option<KMeansModel> = None;
    for run in runs {
        tracing::debug!(
            "Restart {}: inertia={:.3}, iterations={}",
            run.restart,
            run.inertia,
            run.iterations
        );
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }

    best.ok_or_else(|| SkinToneError::clustering("no restart produced a model"))
}
