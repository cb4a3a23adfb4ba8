//! Nash equilibria of multi-objective normal-form games under scalarised
//! expected returns, with iterated best response and fictitious play.

pub mod best_response;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod fictitious_play;
pub mod game;
pub mod games;
pub mod ibr;
pub mod optimizer;
pub mod player;
pub mod strategy;

pub use best_response::{best_response, utility_from_joint, verify_all_nash, verify_nash, verify_nash_with};
pub use config::{Algorithm, FpConfig, IbrConfig, Variant};
pub use error::{MonfgError, MonfgResult};
pub use fictitious_play::{fictitious_play, FpOutcome, IterationRecord};
pub use game::{expected_returns, objective, Monfg, Scalarization};
pub use ibr::{iterated_best_response, IbrOutcome};
