//! Run parameters for the learning dynamics.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{MonfgError, MonfgResult};
use crate::strategy::JointStrategy;

/// How players see each other's updates within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Everyone responds to the same snapshot; updates commit at round end.
    Simultaneous,
    /// Players update in order and see earlier updates from the same round.
    Alternating,
}

impl FromStr for Variant {
    type Err = MonfgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simultaneous" => Ok(Variant::Simultaneous),
            "alternating" => Ok(Variant::Alternating),
            _ => Err(MonfgError::UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Simultaneous => write!(f, "simultaneous"),
            Variant::Alternating => write!(f, "alternating"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Iterated best response.
    Ibr,
    /// Fictitious play.
    Fp,
}

impl FromStr for Algorithm {
    type Err = MonfgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ibr" => Ok(Algorithm::Ibr),
            "fp" => Ok(Algorithm::Fp),
            _ => Err(MonfgError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Ibr => write!(f, "IBR"),
            Algorithm::Fp => write!(f, "FP"),
        }
    }
}

fn check_epsilon(epsilon: f64) -> MonfgResult<()> {
    if epsilon.is_finite() && epsilon >= 0.0 {
        Ok(())
    } else {
        Err(MonfgError::InvalidConfig(format!(
            "epsilon must be finite and non-negative, got {epsilon}"
        )))
    }
}

fn run_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[derive(Debug, Clone)]
pub struct IbrConfig {
    pub epsilon: f64,
    pub max_iter: usize,
    pub init_joint_strategy: Option<JointStrategy>,
    pub variant: Variant,
    pub global_opt: bool,
    /// Verify a converged local-search result with the global search.
    pub verify: bool,
    pub seed: Option<u64>,
}

impl Default for IbrConfig {
    fn default() -> Self {
        IbrConfig {
            epsilon: 0.0,
            max_iter: 1000,
            init_joint_strategy: None,
            variant: Variant::Alternating,
            global_opt: false,
            verify: true,
            seed: None,
        }
    }
}

impl IbrConfig {
    pub fn rng(&self) -> StdRng {
        run_rng(self.seed)
    }

    pub fn validate(&self) -> MonfgResult<()> {
        check_epsilon(self.epsilon)
    }
}

#[derive(Debug, Clone)]
pub struct FpConfig {
    pub epsilon: f64,
    pub max_iter: usize,
    pub init_joint_strategy: Option<JointStrategy>,
    pub variant: Variant,
    pub global_opt: bool,
    pub verify: bool,
    /// Consecutive converged rounds needed to stop early. `None` means `max_iter`.
    pub early_stop: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for FpConfig {
    fn default() -> Self {
        FpConfig {
            epsilon: 0.0,
            max_iter: 1000,
            init_joint_strategy: None,
            variant: Variant::Alternating,
            global_opt: false,
            verify: true,
            early_stop: None,
            seed: None,
        }
    }
}

impl FpConfig {
    pub fn rng(&self) -> StdRng {
        run_rng(self.seed)
    }

    pub fn validate(&self) -> MonfgResult<()> {
        check_epsilon(self.epsilon)
    }

    pub fn early_stop(&self) -> usize {
        self.early_stop.unwrap_or(self.max_iter)
    }
}
