//! Per-player best-response state.
//!
//! A [`Player`] owns its current strategy and moves only when a best
//! response is a strict improvement (beyond epsilon) over what it already
//! plays. [`FpPlayer`] adds the visitation counts fictitious play needs.

use ndarray::{Array2, ArrayD};
use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use crate::error::{MonfgError, MonfgResult};
use crate::game::{expected_returns, objective, Scalarization};
use crate::optimizer::BestResponseSearch;
use crate::strategy::{normalize, uniform, JointStrategy, Strategy};

/// Outcome of one best-response update.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// The stored strategy was already as good as the best response.
    pub converged: bool,
    /// The best response that was computed, whether or not it was adopted.
    pub best_response: Strategy,
}

pub struct Player<'g> {
    id: usize,
    payoffs: &'g ArrayD<f64>,
    utility: &'g dyn Scalarization,
    strategy: Strategy,
}

impl<'g> Player<'g> {
    /// A player starting from `init`, or from the uniform strategy.
    pub fn new(
        id: usize,
        payoffs: &'g ArrayD<f64>,
        utility: &'g dyn Scalarization,
        init: Option<Strategy>,
    ) -> Self {
        let strategy = init.unwrap_or_else(|| uniform(payoffs.shape()[id]));
        Player {
            id,
            payoffs,
            utility,
            strategy,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn num_actions(&self) -> usize {
        self.strategy.len()
    }

    pub fn strategy(&self) -> &[f64] {
        &self.strategy
    }

    /// Best-respond to `joint`, seeding the search with the current strategy.
    ///
    /// The stored strategy is replaced only when the best response beats it by
    /// more than `epsilon`. Both are scored against the same expected returns,
    /// which never depend on this player's own slot in `joint`.
    pub fn update(
        &mut self,
        joint: &[Strategy],
        epsilon: f64,
        search: &dyn BestResponseSearch,
        rng: &mut dyn RngCore,
    ) -> MonfgResult<Update> {
        let er = expected_returns(self.id, self.payoffs, joint)?;
        let optimum = search.optimize(&er, self.utility, epsilon, Some(&self.strategy), rng);
        if !optimum.success {
            log::warn!("best-response search for player {} did not converge", self.id);
        }

        let converged = self.check_converged(&optimum.strategy, &er, epsilon);
        if !converged {
            self.strategy = optimum.strategy.clone();
        }
        Ok(Update {
            converged,
            best_response: optimum.strategy,
        })
    }

    fn check_converged(&self, candidate: &[f64], er: &Array2<f64>, epsilon: f64) -> bool {
        let old = objective(&self.strategy, er, self.utility);
        let new = objective(candidate, er, self.utility);
        old + epsilon >= new
    }
}

/// A player learning from observed opponent play.
pub struct FpPlayer<'g> {
    player: Player<'g>,
    counts: Vec<Vec<u64>>,
}

impl<'g> FpPlayer<'g> {
    pub fn new(
        id: usize,
        payoffs: &'g ArrayD<f64>,
        utility: &'g dyn Scalarization,
        player_actions: &[usize],
        init: Option<Strategy>,
    ) -> Self {
        FpPlayer {
            player: Player::new(id, payoffs, utility, init),
            counts: player_actions.iter().map(|&n| vec![0; n]).collect(),
        }
    }

    pub fn id(&self) -> usize {
        self.player.id()
    }

    pub fn strategy(&self) -> &[f64] {
        self.player.strategy()
    }

    /// Visitation counts per player and action.
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Draw an action from the current strategy.
    pub fn select_action(&self, rng: &mut dyn RngCore) -> MonfgResult<usize> {
        let dist = WeightedIndex::new(self.player.strategy())
            .map_err(|e| MonfgError::Sampling(e.to_string()))?;
        Ok(dist.sample(&mut *rng))
    }

    pub fn update_empirical_strategy(&mut self, player: usize, action: usize) {
        self.counts[player][action] += 1;
    }

    /// Record one action per player.
    pub fn update_empirical_strategies(&mut self, actions: &[usize]) {
        for (player, &action) in actions.iter().enumerate() {
            self.update_empirical_strategy(player, action);
        }
    }

    /// Observed frequencies for everyone else, own strategy in own slot.
    pub fn empirical_joint(&self) -> JointStrategy {
        let mut joint: JointStrategy = self
            .counts
            .iter()
            .map(|c| normalize(&c.iter().map(|&n| n as f64).collect::<Vec<_>>()))
            .collect();
        joint[self.id()] = self.player.strategy().to_vec();
        joint
    }

    /// Best-respond to the empirical joint strategy.
    pub fn update(
        &mut self,
        epsilon: f64,
        search: &dyn BestResponseSearch,
        rng: &mut dyn RngCore,
    ) -> MonfgResult<Update> {
        let joint = self.empirical_joint();
        self.player.update(&joint, epsilon, search, rng)
    }
}
