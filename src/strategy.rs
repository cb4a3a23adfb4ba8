//! Probability vectors over a player's actions.
//!
//! A strategy is a plain `Vec<f64>` that sums to one. A joint strategy holds
//! one strategy per player, indexed by player id.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::error::{MonfgError, MonfgResult};

pub type Strategy = Vec<f64>;
pub type JointStrategy = Vec<Strategy>;

/// Probabilities at or below this are treated as zero by the support helpers.
pub const SUPPORT_TOL: f64 = 1e-15;

/// Tolerance used when checking that a strategy sums to one.
pub const SUM_TOL: f64 = 1e-9;

pub fn uniform(num_actions: usize) -> Strategy {
    vec![1.0 / num_actions as f64; num_actions]
}

/// Rescale to sum to one. A vector with no positive mass becomes uniform.
pub fn normalize(strat: &[f64]) -> Strategy {
    let total: f64 = strat.iter().sum();
    if total > 0.0 {
        strat.iter().map(|&p| p / total).collect()
    } else {
        uniform(strat.len())
    }
}

pub fn normalize_joint(joint: &[Strategy]) -> JointStrategy {
    joint.iter().map(|s| normalize(s)).collect()
}

pub fn pure_strategy(action: usize, num_actions: usize) -> Strategy {
    let mut strat = vec![0.0; num_actions];
    strat[action] = 1.0;
    strat
}

/// Check that `strat` is a probability vector of the given length.
pub fn validate(player: usize, strat: &[f64], num_actions: usize) -> MonfgResult<()> {
    if strat.len() != num_actions {
        return Err(MonfgError::StrategyLength {
            player,
            expected: num_actions,
            found: strat.len(),
        });
    }
    if let Some(p) = strat.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(MonfgError::InvalidStrategy {
            player,
            reason: format!("entry {p} is not a probability"),
        });
    }
    let total: f64 = strat.iter().sum();
    if (total - 1.0).abs() > SUM_TOL {
        return Err(MonfgError::InvalidStrategy {
            player,
            reason: format!("entries sum to {total}"),
        });
    }
    Ok(())
}

/// Split a flat vector into per-player strategies.
pub fn joint_from_flat(flat: &[f64], player_actions: &[usize]) -> MonfgResult<JointStrategy> {
    let expected: usize = player_actions.iter().sum();
    if flat.len() != expected {
        return Err(MonfgError::JointStrategyShape {
            expected,
            found: flat.len(),
        });
    }
    let mut joint = Vec::with_capacity(player_actions.len());
    let mut start = 0;
    for &n in player_actions {
        joint.push(flat[start..start + n].to_vec());
        start += n;
    }
    Ok(joint)
}

pub fn flatten_joint(joint: &[Strategy]) -> Vec<f64> {
    joint.iter().flatten().copied().collect()
}

/// Actions played with positive probability.
pub fn support(strat: &[f64], tol: f64) -> Vec<usize> {
    strat
        .iter()
        .enumerate()
        .filter(|(_, &p)| p > tol)
        .map(|(a, _)| a)
        .collect()
}

pub fn non_support(strat: &[f64], tol: f64) -> Vec<usize> {
    strat
        .iter()
        .enumerate()
        .filter(|(_, &p)| p < tol)
        .map(|(a, _)| a)
        .collect()
}

/// Actions in `a` but not in `b`.
pub fn supports_diff(a: &[usize], b: &[usize]) -> Vec<usize> {
    a.iter().copied().filter(|x| !b.contains(x)).collect()
}

/// All supports with between `min_size` and `max_size` actions, smallest first.
pub fn enumerate_supports(num_actions: usize, min_size: usize, max_size: Option<usize>) -> Vec<Vec<usize>> {
    let max_size = max_size.unwrap_or(num_actions).min(num_actions);
    (min_size.max(1)..=max_size)
        .flat_map(|k| (0..num_actions).combinations(k))
        .collect()
}

/// Every strictly larger support containing `base`, each kept sorted.
pub fn expand_support(base: &[usize], num_actions: usize) -> Vec<Vec<usize>> {
    let rest = supports_diff(&(0..num_actions).collect::<Vec<_>>(), base);
    (1..=rest.len())
        .flat_map(|k| rest.iter().copied().combinations(k).collect::<Vec<_>>())
        .map(|extra| base.iter().copied().chain(extra).sorted().collect())
        .collect()
}

/// The support containing every action, per player.
pub fn totally_mixed_supports(player_actions: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    player_actions
        .iter()
        .enumerate()
        .map(|(player, &n)| (player, (0..n).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rescales() {
        let s = normalize(&[2.0, 6.0]);
        assert!((s[0] - 0.25).abs() < 1e-12);
        assert!((s[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_normalizes_to_uniform() {
        let s = normalize(&[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(s, vec![0.25; 4]);
    }

    #[test]
    fn validate_rejects_negative_and_bad_sum() {
        assert!(validate(0, &[0.5, 0.5], 2).is_ok());
        assert!(validate(0, &[1.5, -0.5], 2).is_err());
        assert!(validate(0, &[0.5, 0.4], 2).is_err());
        assert!(matches!(
            validate(1, &[1.0], 2),
            Err(MonfgError::StrategyLength { player: 1, .. })
        ));
    }

    #[test]
    fn flat_split_and_join() {
        let joint = joint_from_flat(&[0.1, 0.9, 0.2, 0.3, 0.5], &[2, 3]).unwrap();
        assert_eq!(joint, vec![vec![0.1, 0.9], vec![0.2, 0.3, 0.5]]);
        assert_eq!(flatten_joint(&joint), vec![0.1, 0.9, 0.2, 0.3, 0.5]);
        assert!(joint_from_flat(&[1.0], &[2, 3]).is_err());
    }

    #[test]
    fn support_analysis() {
        let s = [0.5, 0.0, 0.5];
        assert_eq!(support(&s, SUPPORT_TOL), vec![0, 2]);
        assert_eq!(non_support(&s, SUPPORT_TOL), vec![1]);
        assert_eq!(supports_diff(&[0, 1, 2], &[1]), vec![0, 2]);
    }

    #[test]
    fn supports_enumerated_by_size() {
        let all = enumerate_supports(3, 1, None);
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], vec![0]);
        assert_eq!(all[6], vec![0, 1, 2]);
        assert_eq!(enumerate_supports(3, 2, Some(2)).len(), 3);
    }

    #[test]
    fn expanded_supports_contain_base() {
        let expanded = expand_support(&[1], 3);
        assert_eq!(expanded, vec![vec![0, 1], vec![1, 2], vec![0, 1, 2]]);
        let mixed = totally_mixed_supports(&[2, 3]);
        assert_eq!(mixed[&1], vec![0, 1, 2]);
    }
}
