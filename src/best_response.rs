//! Best responses and Nash equilibrium verification.

use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::MonfgResult;
use crate::game::{expected_returns, objective, Monfg, Scalarization};
use crate::optimizer::{search_for, BestResponseSearch, GlobalSearch, Optimum};
use crate::strategy::Strategy;

/// Default tolerance on utility comparisons during verification.
pub const VERIFY_TOL: f64 = 1e-12;

/// Utility `player` gets from the joint strategy as it stands.
pub fn utility_from_joint(
    utility: &dyn Scalarization,
    player: usize,
    payoffs: &ArrayD<f64>,
    joint: &[Strategy],
) -> MonfgResult<f64> {
    let er = expected_returns(player, payoffs, joint)?;
    Ok(objective(&joint[player], &er, utility))
}

/// Best-response search for one player against the rest of `joint`.
#[allow(clippy::too_many_arguments)]
pub fn optimize_response(
    search: &dyn BestResponseSearch,
    utility: &dyn Scalarization,
    player: usize,
    payoffs: &ArrayD<f64>,
    joint: &[Strategy],
    epsilon: f64,
    init: Option<&[f64]>,
    rng: &mut dyn RngCore,
) -> MonfgResult<Optimum> {
    let er = expected_returns(player, payoffs, joint)?;
    let optimum = search.optimize(&er, utility, epsilon, init, rng);
    if !optimum.success {
        log::warn!("best-response search for player {player} did not converge");
    }
    Ok(optimum)
}

/// A best response for `player` to the other strategies in `joint`.
#[allow(clippy::too_many_arguments)]
pub fn best_response(
    utility: &dyn Scalarization,
    player: usize,
    payoffs: &ArrayD<f64>,
    joint: &[Strategy],
    epsilon: f64,
    global_opt: bool,
    init: Option<&[f64]>,
    rng: &mut dyn RngCore,
) -> MonfgResult<Strategy> {
    let search = search_for(global_opt);
    let optimum = optimize_response(search.as_ref(), utility, player, payoffs, joint, epsilon, init, rng)?;
    Ok(optimum.strategy)
}

/// Whether `joint` is an (epsilon, tol)-Nash equilibrium.
///
/// Every player's true best response is found with the global search. A
/// player who could gain more than `epsilon + tol` by deviating breaks the
/// equilibrium. With `strict`, a deviation only counts when the search
/// reported convergence.
pub fn verify_nash(
    game: &Monfg,
    utilities: &[Box<dyn Scalarization>],
    joint: &[Strategy],
    epsilon: f64,
    tol: f64,
    strict: bool,
) -> MonfgResult<bool> {
    verify_nash_with(&GlobalSearch::default(), game, utilities, joint, epsilon, tol, strict)
}

/// [`verify_nash`] with a caller-chosen search.
pub fn verify_nash_with(
    search: &dyn BestResponseSearch,
    game: &Monfg,
    utilities: &[Box<dyn Scalarization>],
    joint: &[Strategy],
    epsilon: f64,
    tol: f64,
    strict: bool,
) -> MonfgResult<bool> {
    game.check_utilities(utilities)?;
    game.check_joint(joint)?;

    let mut rng = StdRng::seed_from_u64(0);
    for (player, (payoffs, utility)) in game.payoffs().iter().zip(utilities).enumerate() {
        let er = expected_returns(player, payoffs, joint)?;
        let current = objective(&joint[player], &er, utility.as_ref());
        let br = search.optimize(&er, utility.as_ref(), 0.0, None, &mut rng);
        if !br.success {
            log::debug!("verification search for player {player} did not converge");
        }
        if (!strict || br.success) && current + epsilon + tol < br.utility {
            log::info!(
                "player {player} can deviate: {current:.6} -> {:.6}",
                br.utility
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether every joint strategy in the list is a Nash equilibrium.
pub fn verify_all_nash(
    game: &Monfg,
    utilities: &[Box<dyn Scalarization>],
    joints: &[Vec<Strategy>],
    epsilon: f64,
    tol: f64,
) -> MonfgResult<bool> {
    for joint in joints {
        if !verify_nash(game, utilities, joint, epsilon, tol, false)? {
            return Ok(false);
        }
    }
    Ok(true)
}
