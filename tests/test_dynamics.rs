//! End-to-end runs of iterated best response and fictitious play.

use approx::assert_abs_diff_eq;
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use monfg_nash::game::{scalarization, Monfg, Scalarization};
use monfg_nash::games::{one_simplex_coord_to_point, one_simplex_point_to_coord, polynomial_game};
use monfg_nash::player::FpPlayer;
use monfg_nash::{
    fictitious_play, iterated_best_response, FpConfig, IbrConfig, MonfgError, Variant,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const VARIANTS: [Variant; 2] = [Variant::Simultaneous, Variant::Alternating];

fn linear_utilities(n: usize) -> Vec<Box<dyn Scalarization>> {
    (0..n).map(|_| scalarization(|v| v[0])).collect()
}

/// Single-objective prisoner's dilemma, action 1 is defect.
fn prisoners_dilemma() -> Monfg {
    let table = [[3.0, 0.0], [5.0, 1.0]];
    let p0 = ArrayD::from_shape_fn(IxDyn(&[2, 2, 1]), |ix| table[ix[0]][ix[1]]);
    let p1 = ArrayD::from_shape_fn(IxDyn(&[2, 2, 1]), |ix| table[ix[1]][ix[0]]);
    Monfg::new(vec![p0, p1]).unwrap()
}

/// Player 1 wants to match, player 2 wants to mismatch.
fn matching_pennies() -> Monfg {
    let p0 = ArrayD::from_shape_fn(IxDyn(&[2, 2, 1]), |ix| if ix[0] == ix[1] { 1.0 } else { -1.0 });
    let p1 = p0.mapv(|v| -v);
    Monfg::new(vec![p0, p1]).unwrap()
}

/// Player 1 has dominant action 1; player 2 wants to match player 1.
fn leader_follower() -> Monfg {
    let p0 = ArrayD::from_shape_fn(IxDyn(&[2, 2, 1]), |ix| ix[0] as f64);
    let p1 = ArrayD::from_shape_fn(IxDyn(&[2, 2, 1]), |ix| if ix[0] == ix[1] { 1.0 } else { 0.0 });
    Monfg::new(vec![p0, p1]).unwrap()
}

/// Player 1 wants to match player 2, who is indifferent.
fn matcher_and_bystander() -> Monfg {
    let p0 = ArrayD::from_shape_fn(IxDyn(&[2, 2, 1]), |ix| if ix[0] == ix[1] { 1.0 } else { 0.0 });
    let p1 = ArrayD::from_elem(IxDyn(&[2, 2, 1]), 1.0);
    Monfg::new(vec![p0, p1]).unwrap()
}

fn polynomial_equilibrium_joint() -> Vec<Vec<f64>> {
    let y = 0.25f64.powf(1.0 / 3.0);
    vec![
        one_simplex_point_to_coord(y * y, -1.0, 1.0),
        one_simplex_point_to_coord(y, -1.0, 1.0),
    ]
}

// ---------------------------------------------------------------------------
// Iterated best response
// ---------------------------------------------------------------------------

#[test]
fn ibr_holds_polynomial_equilibrium() {
    let (game, utilities) = polynomial_game(-1.0, 1.0).unwrap();
    for variant in VARIANTS {
        let config = IbrConfig {
            epsilon: 1e-6,
            init_joint_strategy: Some(polynomial_equilibrium_joint()),
            variant,
            global_opt: true,
            seed: Some(1),
            ..IbrConfig::default()
        };
        let outcome = iterated_best_response(&game, &utilities, &config).unwrap();
        assert!(outcome.nash_equilibrium, "{variant} did not converge");
        assert_eq!(outcome.iterations, 1);

        let x = one_simplex_coord_to_point(&outcome.joint_strategy[0], -1.0, 1.0);
        let y = one_simplex_coord_to_point(&outcome.joint_strategy[1], -1.0, 1.0);
        assert!((x - 0.3968).abs() < 1e-2, "x = {x}");
        assert!((y - 0.62996).abs() < 1e-2, "y = {y}");

        let verified = monfg_nash::verify_nash(
            &game,
            &utilities,
            &outcome.joint_strategy,
            1e-6,
            monfg_nash::best_response::VERIFY_TOL,
            false,
        )
        .unwrap();
        assert!(verified);
    }
}

#[test]
fn ibr_finds_dominant_equilibrium_with_local_search() {
    let game = prisoners_dilemma();
    let utilities = linear_utilities(2);
    for variant in VARIANTS {
        let config = IbrConfig {
            epsilon: 1e-9,
            variant,
            seed: Some(3),
            ..IbrConfig::default()
        };
        let outcome = iterated_best_response(&game, &utilities, &config).unwrap();
        assert!(outcome.nash_equilibrium);
        assert_eq!(outcome.iterations, 2);
        for strat in &outcome.joint_strategy {
            assert_abs_diff_eq!(strat[1], 1.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn ibr_handles_three_players() {
    // Own action 1 always pays one more; others playing 1 pays a little extra.
    let shape = [2, 2, 2, 1];
    let payoffs: Vec<ArrayD<f64>> = (0..3)
        .map(|player| {
            ArrayD::from_shape_fn(IxDyn(&shape), |ix| {
                let others: usize = (0..3).filter(|&p| p != player).map(|p| ix[p]).sum();
                ix[player] as f64 + 0.5 * others as f64
            })
        })
        .collect();
    let game = Monfg::new(payoffs).unwrap();
    let utilities = linear_utilities(3);
    for variant in VARIANTS {
        let config = IbrConfig {
            epsilon: 1e-9,
            variant,
            seed: Some(8),
            ..IbrConfig::default()
        };
        let outcome = iterated_best_response(&game, &utilities, &config).unwrap();
        assert!(outcome.nash_equilibrium);
        assert_eq!(outcome.joint_strategy.len(), 3);
        for strat in &outcome.joint_strategy {
            assert!(strat[1] > 0.999);
        }
    }
}

#[test]
fn ibr_cycles_until_max_iter_without_pure_equilibrium() {
    let game = matching_pennies();
    let utilities = linear_utilities(2);
    for variant in VARIANTS {
        let config = IbrConfig {
            epsilon: 1e-9,
            max_iter: 10,
            init_joint_strategy: Some(vec![vec![1.0, 0.0], vec![1.0, 0.0]]),
            variant,
            seed: Some(2),
            ..IbrConfig::default()
        };
        let outcome = iterated_best_response(&game, &utilities, &config).unwrap();
        assert!(!outcome.nash_equilibrium);
        assert_eq!(outcome.iterations, 10);
    }
}

#[test]
fn ibr_simultaneous_players_share_one_snapshot() {
    let game = leader_follower();
    let utilities = linear_utilities(2);
    let run = |variant| {
        let config = IbrConfig {
            epsilon: 1e-9,
            init_joint_strategy: Some(vec![vec![1.0, 0.0], vec![1.0, 0.0]]),
            variant,
            seed: Some(4),
            ..IbrConfig::default()
        };
        iterated_best_response(&game, &utilities, &config).unwrap()
    };

    // The follower only sees the leader's move one round later.
    let simultaneous = run(Variant::Simultaneous);
    assert_eq!(simultaneous.iterations, 3);
    // The follower sees the leader's move within the same round.
    let alternating = run(Variant::Alternating);
    assert_eq!(alternating.iterations, 2);

    for outcome in [simultaneous, alternating] {
        assert!(outcome.nash_equilibrium);
        for strat in &outcome.joint_strategy {
            assert!(strat[1] > 0.999);
        }
    }
}

#[test]
fn ibr_rejects_invalid_epsilon() {
    let game = prisoners_dilemma();
    for epsilon in [f64::NAN, -0.1] {
        let config = IbrConfig {
            epsilon,
            ..IbrConfig::default()
        };
        let result = iterated_best_response(&game, &linear_utilities(2), &config);
        assert!(matches!(result, Err(MonfgError::InvalidConfig(_))));
    }
}

#[test]
fn ibr_rejects_bad_inputs() {
    let game = prisoners_dilemma();
    let config = IbrConfig {
        init_joint_strategy: Some(vec![vec![1.0, 0.0]]),
        ..IbrConfig::default()
    };
    let result = iterated_best_response(&game, &linear_utilities(2), &config);
    assert!(matches!(result, Err(MonfgError::JointStrategyShape { expected: 2, found: 1 })));

    let result = iterated_best_response(&game, &linear_utilities(3), &IbrConfig::default());
    assert!(matches!(result, Err(MonfgError::UtilityCount { expected: 2, found: 3 })));
}

// ---------------------------------------------------------------------------
// Fictitious play
// ---------------------------------------------------------------------------

#[test]
fn fp_stops_early_on_dominant_strategies() {
    let game = prisoners_dilemma();
    let utilities = linear_utilities(2);
    for variant in VARIANTS {
        let config = FpConfig {
            epsilon: 1e-9,
            max_iter: 1000,
            variant,
            early_stop: Some(5),
            seed: Some(11),
            ..FpConfig::default()
        };
        let outcome = fictitious_play(&game, &utilities, &config).unwrap();
        assert!(outcome.log.len() < 1000);
        // One moving round, then five quiet ones, plus the initial record.
        assert_eq!(outcome.log.len(), 7);
        assert!(outcome.nash_equilibrium);
        for strat in &outcome.joint_strategy {
            assert!(strat[1] > 0.999);
        }
    }
}

#[test]
fn fp_alternating_responds_before_observing_own_play() {
    let game = matcher_and_bystander();
    let utilities = linear_utilities(2);
    let run = |variant| {
        let config = FpConfig {
            epsilon: 1e-9,
            max_iter: 2,
            init_joint_strategy: Some(vec![vec![0.0, 1.0], vec![1.0, 0.0]]),
            variant,
            verify: false,
            seed: Some(13),
            ..FpConfig::default()
        };
        fictitious_play(&game, &utilities, &config).unwrap()
    };

    // Everyone's first action is observed before anyone responds.
    let simultaneous = run(Variant::Simultaneous);
    assert!(simultaneous.log[1].joint[0] > 0.999);

    // Player 1 responds to empty counts, which read as uniform play, so it
    // has nothing to gain in round 1 and only matches in round 2.
    let alternating = run(Variant::Alternating);
    assert_eq!(alternating.log[1].joint[..2].to_vec(), vec![0.0, 1.0]);
    assert!(alternating.log[2].joint[0] > 0.999);
}

#[test]
fn fp_zero_early_stop_plays_no_rounds() {
    let game = prisoners_dilemma();
    let config = FpConfig {
        early_stop: Some(0),
        verify: false,
        seed: Some(5),
        ..FpConfig::default()
    };
    let outcome = fictitious_play(&game, &linear_utilities(2), &config).unwrap();
    assert_eq!(outcome.log.len(), 1);
    assert_eq!(outcome.joint_strategy, vec![vec![0.5, 0.5], vec![0.5, 0.5]]);
}

#[test]
fn fp_rejects_invalid_epsilon() {
    let game = prisoners_dilemma();
    let config = FpConfig {
        epsilon: f64::INFINITY,
        ..FpConfig::default()
    };
    let result = fictitious_play(&game, &linear_utilities(2), &config);
    assert!(matches!(result, Err(MonfgError::InvalidConfig(_))));
}

#[test]
fn fp_log_covers_every_round() {
    let (game, utilities) = polynomial_game(-1.0, 1.0).unwrap();
    let config = FpConfig {
        max_iter: 15,
        variant: Variant::Simultaneous,
        verify: false,
        seed: Some(21),
        ..FpConfig::default()
    };
    let outcome = fictitious_play(&game, &utilities, &config).unwrap();
    assert!(!outcome.nash_equilibrium);
    assert_eq!(outcome.log.len(), 16);
    assert_eq!(outcome.log[0].joint, vec![0.5, 0.5, 0.5, 0.5]);
    for (i, record) in outcome.log.iter().enumerate() {
        assert_eq!(record.iteration, i);
        assert_abs_diff_eq!(record.joint[0] + record.joint[1], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(record.joint[2] + record.joint[3], 1.0, epsilon = 1e-9);
    }
}

#[test]
fn fp_is_reproducible_from_a_seed() {
    let (game, utilities) = polynomial_game(-1.0, 1.0).unwrap();
    for variant in VARIANTS {
        let config = FpConfig {
            max_iter: 10,
            variant,
            verify: false,
            seed: Some(99),
            ..FpConfig::default()
        };
        let first = fictitious_play(&game, &utilities, &config).unwrap();
        let second = fictitious_play(&game, &utilities, &config).unwrap();
        assert_eq!(first.log, second.log);
    }
}

#[test]
fn empirical_counts_only_grow() {
    let game = prisoners_dilemma();
    let utilities = linear_utilities(2);
    let mut player = FpPlayer::new(
        0,
        game.payoff_tensor(0),
        utilities[0].as_ref(),
        game.player_actions(),
        None,
    );
    let mut rng = StdRng::seed_from_u64(6);
    let mut previous = player.counts().to_vec();

    for round in 1..=20u64 {
        let own = player.select_action(&mut rng).unwrap();
        player.update_empirical_strategies(&[own, (round % 2) as usize]);
        let counts = player.counts().to_vec();
        for (now, before) in counts.iter().zip(&previous) {
            assert!(now.iter().zip(before).all(|(n, b)| n >= b));
            assert_eq!(now.iter().sum::<u64>(), round);
        }
        let joint = player.empirical_joint();
        assert_abs_diff_eq!(joint[1].iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_eq!(joint[0], player.strategy().to_vec());
        previous = counts;
    }
    assert_eq!(player.counts()[1], vec![10, 10]);
}
