//! Best-response search over the probability simplex.
//!
//! Two searches share the [`BestResponseSearch`] interface:
//!
//! - [`MultiStartLocal`] runs a projected-gradient ascent from the caller's
//!   guess and from extra starts drawn uniformly from the simplex
//!   (Dirichlet(1, ..., 1)), keeping the best result.
//! - [`GlobalSearch`] samples the simplex with a low-discrepancy (Halton)
//!   sequence plus its vertices and centroid, then refines the most promising
//!   well-separated samples locally. Sampling rounds repeat until a round
//!   improves the incumbent by no more than the global tolerance.
//!
//! Both renormalise the final point and recompute its utility, so the
//! reported value is exactly the objective at the returned strategy.

use ndarray::Array2;
use rand::RngCore;
use rand_distr::{Dirichlet, Distribution};

use crate::game::{objective, Scalarization};
use crate::strategy::{normalize, uniform, Strategy};

/// Central-difference step for numerical gradients.
const FD_STEP: f64 = 1e-7;

/// Armijo sufficient-increase constant.
const ARMIJO: f64 = 1e-4;

/// Smallest step tried in the line search before giving up.
const MIN_STEP: f64 = 1e-18;

/// Global tolerance when no epsilon is requested.
const DEFAULT_F_TOL: f64 = 1e-12;

/// Result of one best-response search.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimum {
    /// Whether the underlying solver met its convergence criteria.
    pub success: bool,
    pub strategy: Strategy,
    pub utility: f64,
}

/// Finds a strategy maximising a scalarised objective over the simplex.
pub trait BestResponseSearch: Send + Sync {
    fn optimize(
        &self,
        expected_returns: &Array2<f64>,
        utility: &dyn Scalarization,
        epsilon: f64,
        init: Option<&[f64]>,
        rng: &mut dyn RngCore,
    ) -> Optimum;
}

/// Pick the global or the local search.
pub fn search_for(global_opt: bool) -> Box<dyn BestResponseSearch> {
    if global_opt {
        Box::new(GlobalSearch::default())
    } else {
        Box::new(MultiStartLocal::default())
    }
}

// ---------------------------------------------------------------------------
// Simplex geometry
// ---------------------------------------------------------------------------

/// Euclidean projection onto the probability simplex.
pub fn project_simplex(v: &[f64]) -> Vec<f64> {
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumsum = 0.0;
    let mut theta = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumsum += u;
        let t = (cumsum - 1.0) / (j + 1) as f64;
        if u - t > 0.0 {
            theta = t;
        }
    }
    v.iter().map(|&x| (x - theta).max(0.0)).collect()
}

/// A uniformly random point on the simplex.
pub fn sample_simplex(num_actions: usize, rng: &mut dyn RngCore) -> Vec<f64> {
    if num_actions < 2 {
        return uniform(num_actions);
    }
    match Dirichlet::new(&vec![1.0; num_actions]) {
        Ok(dirichlet) => dirichlet.sample(&mut *rng),
        Err(_) => uniform(num_actions),
    }
}

fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let mut result = 0.0;
    let mut scale = 1.0 / base as f64;
    while index > 0 {
        result += (index % base) as f64 * scale;
        index /= base;
        scale /= base as f64;
    }
    result
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2;
    while primes.len() < count {
        if primes.iter().all(|p| candidate % p != 0) {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Halton points mapped onto the simplex by sorted spacings.
///
/// `start` is the first sequence index, so successive rounds keep filling
/// the gaps left by earlier ones.
pub fn halton_simplex(num_actions: usize, start: u64, count: usize) -> Vec<Vec<f64>> {
    if num_actions < 2 {
        return vec![uniform(num_actions); count.min(1)];
    }
    let bases = first_primes(num_actions - 1);
    (start..start + count as u64)
        .map(|i| {
            let mut cuts: Vec<f64> = bases.iter().map(|&b| radical_inverse(i, b)).collect();
            cuts.sort_by(f64::total_cmp);
            let mut point = Vec::with_capacity(num_actions);
            let mut prev = 0.0;
            for c in cuts {
                point.push(c - prev);
                prev = c;
            }
            point.push(1.0 - prev);
            point
        })
        .collect()
}

fn vertices_and_centroid(num_actions: usize) -> Vec<Vec<f64>> {
    let mut points: Vec<Vec<f64>> = (0..num_actions)
        .map(|a| crate::strategy::pure_strategy(a, num_actions))
        .collect();
    points.push(uniform(num_actions));
    points
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

// ---------------------------------------------------------------------------
// Local ascent
// ---------------------------------------------------------------------------

struct Ascent {
    converged: bool,
    point: Vec<f64>,
    value: f64,
}

fn gradient(f: &dyn Fn(&[f64]) -> f64, x: &[f64], fx: f64) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            let mut up = x.to_vec();
            up[i] += FD_STEP;
            if x[i] >= FD_STEP {
                let mut down = x.to_vec();
                down[i] -= FD_STEP;
                (f(&up) - f(&down)) / (2.0 * FD_STEP)
            } else {
                (f(&up) - fx) / FD_STEP
            }
        })
        .collect()
}

/// Projected-gradient ascent with backtracking.
///
/// Stops when an accepted step gains no more than `tol` (relative to the
/// objective's magnitude) or when no ascent step exists at finite-difference
/// resolution. Running out of iterations reports non-convergence.
fn ascend(f: &dyn Fn(&[f64]) -> f64, start: &[f64], tol: f64, max_iter: usize) -> Ascent {
    let mut x = project_simplex(start);
    let mut fx = f(&x);
    if !fx.is_finite() {
        return Ascent {
            converged: false,
            point: x,
            value: fx,
        };
    }

    let mut last_step = f64::INFINITY;
    for _ in 0..max_iter {
        let g = gradient(f, &x, fx);
        let g_max = g.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
        if !g_max.is_finite() {
            return Ascent {
                converged: false,
                point: x,
                value: fx,
            };
        }
        if g_max == 0.0 {
            return Ascent {
                converged: true,
                point: x,
                value: fx,
            };
        }

        let mut step = (2.0 * last_step).min(1.0 / g_max);
        let mut accepted = None;
        while step > MIN_STEP {
            let trial: Vec<f64> = x.iter().zip(&g).map(|(xi, gi)| xi + step * gi).collect();
            let y = project_simplex(&trial);
            let gain: f64 = g.iter().zip(y.iter().zip(&x)).map(|(gi, (yi, xi))| gi * (yi - xi)).sum();
            if gain <= 0.0 {
                // The projected direction is not an ascent direction: x is stationary.
                break;
            }
            let fy = f(&y);
            if fy.is_finite() && fy >= fx + ARMIJO * gain {
                accepted = Some((y, fy));
                break;
            }
            step *= 0.5;
        }

        let Some((y, fy)) = accepted else {
            return Ascent {
                converged: true,
                point: x,
                value: fx,
            };
        };

        let improvement = fy - fx;
        let moved = max_abs_diff(&x, &y);
        last_step = step;
        x = y;
        fx = fy;
        if improvement <= tol * (1.0 + fx.abs()) || moved <= f64::EPSILON {
            return Ascent {
                converged: true,
                point: x,
                value: fx,
            };
        }
    }

    Ascent {
        converged: false,
        point: x,
        value: fx,
    }
}

/// Renormalise and recompute the utility at the exact returned point.
fn finish(success: bool, point: &[f64], expected_returns: &Array2<f64>, utility: &dyn Scalarization) -> Optimum {
    let strategy = normalize(&point.iter().map(|p| p.max(0.0)).collect::<Vec<_>>());
    let utility = objective(&strategy, expected_returns, utility);
    Optimum {
        success,
        strategy,
        utility,
    }
}

fn better(candidate: f64, incumbent: f64) -> bool {
    candidate.is_finite() && (!incumbent.is_finite() || candidate > incumbent)
}

// ---------------------------------------------------------------------------
// Multi-start local search
// ---------------------------------------------------------------------------

/// Local ascent from several starting points.
#[derive(Debug, Clone)]
pub struct MultiStartLocal {
    /// Number of starts, including the caller's guess. At least one is used.
    pub guesses: usize,
    pub max_iter: usize,
    /// Convergence tolerance when no epsilon is requested.
    pub tolerance: f64,
}

impl Default for MultiStartLocal {
    fn default() -> Self {
        MultiStartLocal {
            guesses: 5,
            max_iter: 1000,
            tolerance: 1e-9,
        }
    }
}

impl BestResponseSearch for MultiStartLocal {
    fn optimize(
        &self,
        expected_returns: &Array2<f64>,
        utility: &dyn Scalarization,
        epsilon: f64,
        init: Option<&[f64]>,
        rng: &mut dyn RngCore,
    ) -> Optimum {
        let num_actions = expected_returns.nrows();
        let tol = if epsilon > 0.0 { epsilon } else { self.tolerance };

        let mut starts: Vec<Vec<f64>> = Vec::with_capacity(self.guesses.max(1));
        if let Some(init) = init {
            starts.push(init.to_vec());
        }
        while starts.len() < self.guesses.max(1) {
            starts.push(sample_simplex(num_actions, rng));
        }

        let f = |x: &[f64]| objective(x, expected_returns, utility);
        let mut best: Option<Ascent> = None;
        for start in &starts {
            let result = ascend(&f, start, tol, self.max_iter);
            let improves = match &best {
                None => true,
                Some(b) => better(result.value, b.value),
            };
            if improves {
                best = Some(result);
            }
        }

        match best {
            Some(b) => finish(b.converged, &b.point, expected_returns, utility),
            None => finish(false, &uniform(num_actions), expected_returns, utility),
        }
    }
}

// ---------------------------------------------------------------------------
// Global search
// ---------------------------------------------------------------------------

/// Low-discrepancy sampling followed by local refinement.
#[derive(Debug, Clone)]
pub struct GlobalSearch {
    /// Halton samples per round.
    pub samples: usize,
    /// Samples refined locally per round.
    pub seeds: usize,
    /// Minimum sup-norm distance between two refined samples.
    pub seed_spacing: f64,
    pub max_rounds: usize,
    pub local_max_iter: usize,
    pub local_tolerance: f64,
}

impl Default for GlobalSearch {
    fn default() -> Self {
        GlobalSearch {
            samples: 128,
            seeds: 8,
            seed_spacing: 0.1,
            max_rounds: 3,
            local_max_iter: 1000,
            local_tolerance: 1e-12,
        }
    }
}

impl GlobalSearch {
    fn pick_seeds(&self, mut scored: Vec<(f64, Vec<f64>)>) -> Vec<Vec<f64>> {
        scored.retain(|(v, _)| v.is_finite());
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut seeds: Vec<Vec<f64>> = Vec::with_capacity(self.seeds);
        for (_, point) in scored {
            if seeds.len() >= self.seeds {
                break;
            }
            if seeds.iter().all(|s| max_abs_diff(s, &point) >= self.seed_spacing) {
                seeds.push(point);
            }
        }
        seeds
    }
}

impl BestResponseSearch for GlobalSearch {
    /// The global search is deterministic; `init` and `rng` are unused.
    fn optimize(
        &self,
        expected_returns: &Array2<f64>,
        utility: &dyn Scalarization,
        epsilon: f64,
        _init: Option<&[f64]>,
        _rng: &mut dyn RngCore,
    ) -> Optimum {
        let num_actions = expected_returns.nrows();
        let f_tol = if epsilon > 0.0 { epsilon } else { DEFAULT_F_TOL };
        let f = |x: &[f64]| objective(x, expected_returns, utility);

        let mut best: Option<Ascent> = None;
        let mut next_index = 1;
        for round in 0..self.max_rounds.max(1) {
            let mut points = halton_simplex(num_actions, next_index, self.samples);
            next_index += self.samples as u64;
            if round == 0 {
                points.extend(vertices_and_centroid(num_actions));
            }

            let scored: Vec<(f64, Vec<f64>)> = points.into_iter().map(|p| (f(&p), p)).collect();
            let previous = best.as_ref().map(|b| b.value);

            for seed in self.pick_seeds(scored) {
                let result = ascend(&f, &seed, self.local_tolerance, self.local_max_iter);
                let improves = match &best {
                    None => true,
                    Some(b) => better(result.value, b.value),
                };
                if improves {
                    best = Some(result);
                }
            }

            let current = best.as_ref().map(|b| b.value);
            if let (Some(prev), Some(cur)) = (previous, current) {
                if cur - prev <= f_tol {
                    break;
                }
            }
        }

        match best {
            Some(b) => finish(b.converged, &b.point, expected_returns, utility),
            None => finish(false, &uniform(num_actions), expected_returns, utility),
        }
    }
}
