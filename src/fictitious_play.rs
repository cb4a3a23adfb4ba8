//! Fictitious play.
//!
//! Players best-respond to the empirical frequencies of observed play rather
//! than to the exact strategies of their opponents. Each round every player
//! contributes one sampled action to everyone's visitation counts.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::best_response::{verify_nash, VERIFY_TOL};
use crate::config::{FpConfig, Variant};
use crate::error::{MonfgError, MonfgResult};
use crate::game::{Monfg, Scalarization};
use crate::games::one_simplex_coord_to_point;
use crate::optimizer::{search_for, BestResponseSearch};
use crate::player::{FpPlayer, Update};
use crate::strategy::{flatten_joint, JointStrategy};

/// The joint strategy after one round, flattened player by player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub joint: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct FpOutcome {
    pub nash_equilibrium: bool,
    pub joint_strategy: JointStrategy,
    /// Round 0 holds the initial joint strategy.
    pub log: Vec<IterationRecord>,
}

pub fn fictitious_play(
    game: &Monfg,
    utilities: &[Box<dyn Scalarization>],
    config: &FpConfig,
) -> MonfgResult<FpOutcome> {
    config.validate()?;
    game.check_utilities(utilities)?;
    if let Some(init) = &config.init_joint_strategy {
        game.check_joint(init)?;
    }

    let mut rng = config.rng();
    let search = search_for(config.global_opt);
    let mut players: Vec<FpPlayer> = game
        .payoffs()
        .iter()
        .zip(utilities)
        .enumerate()
        .map(|(id, (payoffs, utility))| {
            let init = config.init_joint_strategy.as_ref().map(|j| j[id].clone());
            FpPlayer::new(id, payoffs, utility.as_ref(), game.player_actions(), init)
        })
        .collect();

    let mut joint = committed(&players);
    let mut log = vec![IterationRecord {
        iteration: 0,
        joint: flatten_joint(&joint),
    }];
    let early_stop = config.early_stop();
    let mut streak = 0;

    for round in 0..config.max_iter {
        if streak >= early_stop {
            log::info!("fp stopped early after {round} rounds");
            break;
        }
        let converged = match config.variant {
            Variant::Simultaneous => {
                simultaneous_round(&mut players, config.epsilon, search.as_ref(), &mut rng)?
            }
            Variant::Alternating => {
                alternating_round(&mut players, config.epsilon, search.as_ref(), &mut rng)?
            }
        };
        joint = committed(&players);
        log.push(IterationRecord {
            iteration: round + 1,
            joint: flatten_joint(&joint),
        });

        streak = if converged { streak + 1 } else { 0 };
        log::debug!("{:<32}{:<8}{:<8}{}", "fp round", round + 1, converged, streak);
    }

    let nash_equilibrium = if config.verify {
        verify_nash(game, utilities, &joint, config.epsilon, VERIFY_TOL, false)?
    } else {
        false
    };
    log::info!("fp finished (nash: {nash_equilibrium})");

    Ok(FpOutcome {
        nash_equilibrium,
        joint_strategy: joint,
        log,
    })
}

fn committed(players: &[FpPlayer]) -> JointStrategy {
    players.iter().map(|p| p.strategy().to_vec()).collect()
}

/// Everyone plays, everyone observes, then everyone responds in parallel.
fn simultaneous_round(
    players: &mut [FpPlayer],
    epsilon: f64,
    search: &dyn BestResponseSearch,
    rng: &mut dyn RngCore,
) -> MonfgResult<bool> {
    let actions: Vec<usize> = players
        .iter()
        .map(|p| p.select_action(&mut *rng))
        .collect::<MonfgResult<_>>()?;
    for player in players.iter_mut() {
        player.update_empirical_strategies(&actions);
    }

    let seeds: Vec<u64> = players.iter().map(|_| rng.gen()).collect();
    let updates: Vec<Update> = players
        .par_iter_mut()
        .zip(seeds)
        .map(|(player, seed)| {
            let mut child = StdRng::seed_from_u64(seed);
            player.update(epsilon, search, &mut child)
        })
        .collect::<MonfgResult<_>>()?;
    Ok(updates.iter().all(|u| u.converged))
}

/// Each player in turn responds, then plays; its action is observed by all
/// before the next player responds.
fn alternating_round(
    players: &mut [FpPlayer],
    epsilon: f64,
    search: &dyn BestResponseSearch,
    rng: &mut dyn RngCore,
) -> MonfgResult<bool> {
    let mut converged = true;
    for id in 0..players.len() {
        let update = players[id].update(epsilon, search, rng)?;
        converged &= update.converged;
        let action = players[id].select_action(rng)?;
        for player in players.iter_mut() {
            player.update_empirical_strategy(id, action);
        }
    }
    Ok(converged)
}

/// A point in a continuous two-player game, recovered from a log record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousRecord {
    pub run: usize,
    pub iteration: usize,
    pub player1: f64,
    pub player2: f64,
}

/// Map a two-player, two-action log onto the interval `[min_x, max_x]`.
pub fn transform_log(
    run: usize,
    log: &[IterationRecord],
    min_x: f64,
    max_x: f64,
) -> MonfgResult<Vec<ContinuousRecord>> {
    log.iter()
        .map(|record| {
            if record.joint.len() != 4 {
                return Err(MonfgError::JointStrategyShape {
                    expected: 4,
                    found: record.joint.len(),
                });
            }
            Ok(ContinuousRecord {
                run,
                iteration: record.iteration,
                player1: one_simplex_coord_to_point(&record.joint[0..2], min_x, max_x),
                player2: one_simplex_coord_to_point(&record.joint[2..4], min_x, max_x),
            })
        })
        .collect()
}
