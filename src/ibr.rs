//! Iterated best response.
//!
//! Every round each player best-responds to the current joint strategy. The
//! run stops at the first round in which no player moves, or after
//! `max_iter` rounds. Cycles are not detected.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;

use crate::best_response::{verify_nash, VERIFY_TOL};
use crate::config::{IbrConfig, Variant};
use crate::error::MonfgResult;
use crate::game::{Monfg, Scalarization};
use crate::optimizer::{search_for, BestResponseSearch};
use crate::player::{Player, Update};
use crate::strategy::JointStrategy;

#[derive(Debug, Clone)]
pub struct IbrOutcome {
    /// The final joint strategy is known to be a Nash equilibrium.
    pub nash_equilibrium: bool,
    pub joint_strategy: JointStrategy,
    /// Rounds played.
    pub iterations: usize,
}

pub fn iterated_best_response(
    game: &Monfg,
    utilities: &[Box<dyn Scalarization>],
    config: &IbrConfig,
) -> MonfgResult<IbrOutcome> {
    config.validate()?;
    game.check_utilities(utilities)?;
    if let Some(init) = &config.init_joint_strategy {
        game.check_joint(init)?;
    }

    let mut rng = config.rng();
    let search = search_for(config.global_opt);
    let mut players: Vec<Player> = game
        .payoffs()
        .iter()
        .zip(utilities)
        .enumerate()
        .map(|(id, (payoffs, utility))| {
            let init = config.init_joint_strategy.as_ref().map(|j| j[id].clone());
            Player::new(id, payoffs, utility.as_ref(), init)
        })
        .collect();
    let mut joint = committed(&players);

    for round in 0..config.max_iter {
        let (converged, staged) = match config.variant {
            Variant::Simultaneous => {
                simultaneous_round(&mut players, &joint, config.epsilon, search.as_ref(), &mut rng)?
            }
            Variant::Alternating => {
                alternating_round(&mut players, &joint, config.epsilon, search.as_ref(), &mut rng)?
            }
        };
        log::debug!("{:<32}{:<8}{}", "ibr round", round + 1, converged);

        if converged {
            let nash_equilibrium = if config.global_opt {
                true
            } else if config.verify {
                verify_nash(game, utilities, &joint, config.epsilon, VERIFY_TOL, false)?
            } else {
                false
            };
            log::info!("ibr converged after {} rounds (nash: {nash_equilibrium})", round + 1);
            return Ok(IbrOutcome {
                nash_equilibrium,
                joint_strategy: joint,
                iterations: round + 1,
            });
        }
        joint = staged;
    }

    log::info!("ibr did not converge within {} rounds", config.max_iter);
    Ok(IbrOutcome {
        nash_equilibrium: false,
        joint_strategy: joint,
        iterations: config.max_iter,
    })
}

fn committed(players: &[Player]) -> JointStrategy {
    players.iter().map(|p| p.strategy().to_vec()).collect()
}

/// All players respond to `snapshot` in parallel. Each gets a child generator
/// seeded from `rng` in player order, so results do not depend on scheduling.
fn simultaneous_round(
    players: &mut [Player],
    snapshot: &JointStrategy,
    epsilon: f64,
    search: &dyn BestResponseSearch,
    rng: &mut dyn RngCore,
) -> MonfgResult<(bool, JointStrategy)> {
    let seeds: Vec<u64> = players.iter().map(|_| rng.gen()).collect();
    let updates: Vec<Update> = players
        .par_iter_mut()
        .zip(seeds)
        .map(|(player, seed)| {
            let mut child = StdRng::seed_from_u64(seed);
            player.update(snapshot, epsilon, search, &mut child)
        })
        .collect::<MonfgResult<_>>()?;

    let converged = updates.iter().all(|u| u.converged);
    Ok((converged, committed(players)))
}

/// Players respond in order, each seeing the strategies committed before it.
fn alternating_round(
    players: &mut [Player],
    joint: &JointStrategy,
    epsilon: f64,
    search: &dyn BestResponseSearch,
    rng: &mut dyn RngCore,
) -> MonfgResult<(bool, JointStrategy)> {
    let mut staged = joint.clone();
    let mut converged = true;
    for player in players.iter_mut() {
        let update = player.update(&staged, epsilon, search, rng)?;
        converged &= update.converged;
        staged[player.id()] = player.strategy().to_vec();
    }
    Ok((converged, staged))
}
