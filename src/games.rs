//! Example games built on the identity game.
//!
//! In an identity game every joint action pays its own one-hot encoding, so a
//! player's expected vector is the joint strategy itself. Utility functions
//! can then read strategies directly and treat each two-action mixed strategy
//! as a point on an interval.

use itertools::Itertools;
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::best_response::best_response;
use crate::error::MonfgResult;
use crate::game::{scalarization, Monfg, Scalarization};
use crate::strategy::Strategy;

/// Every player receives the one-hot encoding of the joint action.
pub fn identity_game(player_actions: &[usize]) -> MonfgResult<Monfg> {
    let length: usize = player_actions.iter().sum();
    let mut shape = player_actions.to_vec();
    shape.push(length);
    let mut payoffs = ArrayD::<f64>::zeros(IxDyn(&shape));

    for actions in player_actions.iter().map(|&n| 0..n).multi_cartesian_product() {
        let mut offset = 0;
        for (&action, &n) in actions.iter().zip(player_actions) {
            let mut index = actions.clone();
            index.push(offset + action);
            payoffs[IxDyn(&index)] = 1.0;
            offset += n;
        }
    }
    Monfg::new(vec![payoffs; player_actions.len()])
}

/// Map a one-simplex coordinate to a point in `[min_x, max_x]`.
pub fn one_simplex_coord_to_point(coord: &[f64], min_x: f64, max_x: f64) -> f64 {
    min_x + coord[0] * (max_x - min_x)
}

/// Map a point in `[min_x, max_x]` to a one-simplex coordinate.
pub fn one_simplex_point_to_coord(point: f64, min_x: f64, max_x: f64) -> Strategy {
    let x = (point - min_x) / (max_x - min_x);
    vec![x, 1.0 - x]
}

fn interval_points(payoff: &[f64], min_x: f64, max_x: f64) -> (f64, f64) {
    (
        one_simplex_coord_to_point(&payoff[0..2], min_x, max_x),
        one_simplex_coord_to_point(&payoff[2..4], min_x, max_x),
    )
}

// ---------------------------------------------------------------------------
// Polynomial game
// ---------------------------------------------------------------------------

pub fn polynomial_u1(x: f64, y: f64) -> f64 {
    2.0 * x * y * y - x * x - y
}

pub fn polynomial_u2(x: f64, y: f64) -> f64 {
    -polynomial_u1(x, y)
}

/// Zero-sum game with u1(x, y) = 2xy² − x² − y on `[min_x, max_x]`².
pub fn polynomial_game(min_x: f64, max_x: f64) -> MonfgResult<(Monfg, Vec<Box<dyn Scalarization>>)> {
    let game = identity_game(&[2, 2])?;
    let utilities = vec![
        scalarization(move |v| {
            let (x, y) = interval_points(v, min_x, max_x);
            polynomial_u1(x, y)
        }),
        scalarization(move |v| {
            let (x, y) = interval_points(v, min_x, max_x);
            polynomial_u2(x, y)
        }),
    ];
    Ok((game, utilities))
}

// ---------------------------------------------------------------------------
// Bertrand pricing game
// ---------------------------------------------------------------------------

/// Duopoly with three customer types: type 1 buys only x, type 3 only y and
/// type 2 buys a CES composite of both.
#[derive(Debug, Clone, Copy)]
pub struct BertrandParams {
    pub min_price: f64,
    pub max_price: f64,
    /// Elasticity of substitution between x and y.
    pub sigma: f64,
    /// Elasticity of demand for the composite good.
    pub gamma: f64,
    /// Number of type 2 customers.
    pub n: f64,
    /// Unit cost of production.
    pub m: f64,
    /// Demand factors other than price.
    pub a: f64,
}

impl Default for BertrandParams {
    fn default() -> Self {
        BertrandParams {
            min_price: 10.0,
            max_price: 25.0,
            sigma: 3.0,
            gamma: 2.0,
            n: 2700.0,
            m: 1.0,
            a: 50.0,
        }
    }
}

impl BertrandParams {
    /// Type 2 demand for the product priced at `own` against `other`.
    fn composite_demand(&self, own: f64, other: f64) -> f64 {
        let (s, g) = (self.sigma, self.gamma);
        self.n * own.powf(-s) * (own.powf(1.0 - s) + other.powf(1.0 - s)).powf((g - s) / (s - 1.0))
    }

    /// Total demand for the product priced at `own`. Types 1 and 3 are
    /// symmetric, so this serves both firms.
    pub fn demand(&self, own: f64, other: f64) -> f64 {
        (self.a - own) + self.composite_demand(own, other)
    }

    pub fn profit(&self, own: f64, other: f64) -> f64 {
        (own - self.m) * self.demand(own, other)
    }
}

pub fn bertrand_pricing_game(params: BertrandParams) -> MonfgResult<(Monfg, Vec<Box<dyn Scalarization>>)> {
    let game = identity_game(&[2, 2])?;
    let (lo, hi) = (params.min_price, params.max_price);
    let utilities = vec![
        scalarization(move |v| {
            let (px, py) = interval_points(v, lo, hi);
            params.profit(px, py)
        }),
        scalarization(move |v| {
            let (px, py) = interval_points(v, lo, hi);
            params.profit(py, px)
        }),
    ];
    Ok((game, utilities))
}

// ---------------------------------------------------------------------------
// Linear pricing game
// ---------------------------------------------------------------------------

/// Demand a − b·p_i + c·p_j with margin p_i − m. Positive `c` makes the
/// products substitutes, negative `c` complements.
#[derive(Debug, Clone, Copy)]
pub struct PricingParams {
    pub min_price: f64,
    pub max_price: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub m: f64,
}

impl Default for PricingParams {
    fn default() -> Self {
        PricingParams {
            min_price: 0.0,
            max_price: 1000.0,
            a: 3000.0,
            b: 4.0,
            c: 2.0,
            m: 200.0,
        }
    }
}

impl PricingParams {
    pub fn profit(&self, own: f64, other: f64) -> f64 {
        (own - self.m) * (self.a - self.b * own + self.c * other)
    }
}

pub fn pricing_game(params: PricingParams) -> MonfgResult<(Monfg, Vec<Box<dyn Scalarization>>)> {
    let game = identity_game(&[2, 2])?;
    let (lo, hi) = (params.min_price, params.max_price);
    let utilities = vec![
        scalarization(move |v| {
            let (pi, pj) = interval_points(v, lo, hi);
            params.profit(pi, pj)
        }),
        scalarization(move |v| {
            let (pj, pi) = interval_points(v, lo, hi);
            params.profit(pi, pj)
        }),
    ];
    Ok((game, utilities))
}

/// Globally optimal response of `player` in the underlying continuous game
/// when the opponent sits at `opponent_point`.
pub fn continuous_best_response(
    game: &Monfg,
    utilities: &[Box<dyn Scalarization>],
    player: usize,
    opponent_point: f64,
    min_x: f64,
    max_x: f64,
) -> MonfgResult<f64> {
    game.check_utilities(utilities)?;
    let own = vec![1.0, 0.0];
    let opponent = one_simplex_point_to_coord(opponent_point, min_x, max_x);
    let joint = if player == 0 {
        vec![own, opponent]
    } else {
        vec![opponent, own]
    };
    let mut rng = StdRng::seed_from_u64(0);
    let br = best_response(
        utilities[player].as_ref(),
        player,
        game.payoff_tensor(player),
        &joint,
        0.0,
        true,
        None,
        &mut rng,
    )?;
    Ok(one_simplex_coord_to_point(&br, min_x, max_x))
}
