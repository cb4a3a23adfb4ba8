//! Multi-objective normal-form games and the expected-return engine.
//!
//! A game is a list of payoff tensors, one per player. For `N` players each
//! tensor has `N + 1` axes: one action axis per player followed by the
//! objective axis.

use ndarray::{Array1, Array2, ArrayD, ArrayView, Axis, IxDyn};

use crate::error::{MonfgError, MonfgResult};
use crate::strategy::{normalize, validate, Strategy};

/// Maps an expected objective vector to a scalar utility.
///
/// Implementations must be pure: verification recomputes utilities and
/// expects the same answer every time.
pub trait Scalarization: Send + Sync {
    fn scalarize(&self, payoff: &[f64]) -> f64;
}

impl<F> Scalarization for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn scalarize(&self, payoff: &[f64]) -> f64 {
        self(payoff)
    }
}

/// One utility function per player.
pub type Utilities = Vec<Box<dyn Scalarization>>;

/// Box a closure as a utility function.
pub fn scalarization<F>(f: F) -> Box<dyn Scalarization>
where
    F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
{
    Box::new(f)
}

/// A validated multi-objective normal-form game.
#[derive(Debug, Clone)]
pub struct Monfg {
    payoffs: Vec<ArrayD<f64>>,
    player_actions: Vec<usize>,
}

impl Monfg {
    /// Build a game, checking that every tensor agrees on the action axes.
    pub fn new(payoffs: Vec<ArrayD<f64>>) -> MonfgResult<Self> {
        let first = payoffs.first().ok_or(MonfgError::EmptyGame)?;
        let num_players = payoffs.len();
        for (player, tensor) in payoffs.iter().enumerate() {
            if tensor.ndim() != num_players + 1 {
                return Err(MonfgError::Rank {
                    player,
                    expected: num_players + 1,
                    found: tensor.ndim(),
                });
            }
        }
        let player_actions = first.shape()[..num_players].to_vec();
        if let Some(player) = player_actions.iter().position(|&n| n == 0) {
            return Err(MonfgError::NoActions { player });
        }

        for (player, tensor) in payoffs.iter().enumerate() {
            let shape = tensor.shape();
            if shape[..num_players] != player_actions[..] {
                let mut expected = player_actions.clone();
                expected.push(*shape.last().unwrap_or(&0));
                return Err(MonfgError::ShapeMismatch {
                    player,
                    expected,
                    found: shape.to_vec(),
                });
            }
            if shape[num_players] == 0 {
                return Err(MonfgError::NoObjectives { player });
            }
        }

        Ok(Monfg {
            payoffs,
            player_actions,
        })
    }

    pub fn num_players(&self) -> usize {
        self.payoffs.len()
    }

    pub fn player_actions(&self) -> &[usize] {
        &self.player_actions
    }

    pub fn num_objectives(&self, player: usize) -> usize {
        self.payoffs[player].shape()[self.num_players()]
    }

    pub fn payoffs(&self) -> &[ArrayD<f64>] {
        &self.payoffs
    }

    pub fn payoff_tensor(&self, player: usize) -> &ArrayD<f64> {
        &self.payoffs[player]
    }

    /// Vector payoff of every player for one joint action.
    pub fn payoffs_for(&self, actions: &[usize]) -> Vec<Vec<f64>> {
        self.payoffs
            .iter()
            .map(|tensor| {
                let mut view = tensor.view();
                for &a in actions {
                    view = view.index_axis_move(Axis(0), a);
                }
                view.iter().copied().collect()
            })
            .collect()
    }

    /// Check a joint strategy against the game's action counts.
    pub fn check_joint(&self, joint: &[Strategy]) -> MonfgResult<()> {
        if joint.len() != self.num_players() {
            return Err(MonfgError::JointStrategyShape {
                expected: self.num_players(),
                found: joint.len(),
            });
        }
        for (player, (strat, &n)) in joint.iter().zip(&self.player_actions).enumerate() {
            validate(player, strat, n)?;
        }
        Ok(())
    }

    pub fn check_utilities(&self, utilities: &[Box<dyn Scalarization>]) -> MonfgResult<()> {
        if utilities.len() != self.num_players() {
            return Err(MonfgError::UtilityCount {
                expected: self.num_players(),
                found: utilities.len(),
            });
        }
        Ok(())
    }
}

/// Expected vector return of each of `player`'s actions while everyone else
/// plays their strategy in `joint`.
///
/// Each opponent axis is weighted by that opponent's strategy and summed out,
/// keeping a length-one axis so later opponents stay aligned. The result has
/// shape `(own actions, objectives)`. The player's own slot in `joint` is
/// never read.
pub fn expected_returns(
    player: usize,
    payoffs: &ArrayD<f64>,
    joint: &[Strategy],
) -> MonfgResult<Array2<f64>> {
    let ndim = payoffs.ndim();
    if joint.len() + 1 != ndim || player >= joint.len() {
        return Err(MonfgError::JointStrategyShape {
            expected: ndim.saturating_sub(1),
            found: joint.len(),
        });
    }

    let mut returns = payoffs.to_owned();
    for (opponent, strat) in joint.iter().enumerate().filter(|(o, _)| *o != player) {
        if strat.len() != payoffs.shape()[opponent] {
            return Err(MonfgError::StrategyLength {
                player: opponent,
                expected: payoffs.shape()[opponent],
                found: strat.len(),
            });
        }
        let mut shape = vec![1; ndim];
        shape[opponent] = strat.len();
        let weights = ArrayView::from_shape(IxDyn(&shape), strat.as_slice()).map_err(|_| {
            MonfgError::ShapeMismatch {
                player: opponent,
                expected: shape.clone(),
                found: vec![strat.len()],
            }
        })?;
        returns = (&returns * &weights)
            .sum_axis(Axis(opponent))
            .insert_axis(Axis(opponent));
    }

    let num_actions = payoffs.shape()[player];
    let num_objectives = payoffs.shape()[ndim - 1];
    let flat: Vec<f64> = returns.iter().copied().collect();
    Array2::from_shape_vec((num_actions, num_objectives), flat).map_err(|_| {
        MonfgError::ShapeMismatch {
            player,
            expected: vec![num_actions, num_objectives],
            found: returns.shape().to_vec(),
        }
    })
}

/// Expected objective vector of a (normalised) strategy.
pub fn expected_vector(strategy: &[f64], expected_returns: &Array2<f64>) -> Vec<f64> {
    let strategy = Array1::from(normalize(strategy));
    strategy.dot(expected_returns).to_vec()
}

/// The scalarised expected return of playing `strategy`.
pub fn objective(strategy: &[f64], expected_returns: &Array2<f64>, utility: &dyn Scalarization) -> f64 {
    utility.scalarize(&expected_vector(strategy, expected_returns))
}
