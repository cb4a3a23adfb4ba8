use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonfgError {
    #[error("game has no players")]
    EmptyGame,

    #[error("payoff tensor of player {player} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        player: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("payoff tensor of player {player} has {found} axes, expected {expected}")]
    Rank {
        player: usize,
        expected: usize,
        found: usize,
    },

    #[error("player {player} has no actions")]
    NoActions { player: usize },

    #[error("payoff tensor of player {player} has no objectives")]
    NoObjectives { player: usize },

    #[error("expected {expected} utility functions, got {found}")]
    UtilityCount { expected: usize, found: usize },

    #[error("joint strategy has {found} strategies, expected {expected}")]
    JointStrategyShape { expected: usize, found: usize },

    #[error("strategy of player {player} has {found} entries, expected {expected}")]
    StrategyLength {
        player: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid strategy for player {player}: {reason}")]
    InvalidStrategy { player: usize, reason: String },

    #[error("unknown variant '{0}' (expected simultaneous or alternating)")]
    UnknownVariant(String),

    #[error("unknown algorithm '{0}' (expected ibr or fp)")]
    UnknownAlgorithm(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not sample an action: {0}")]
    Sampling(String),
}

pub type MonfgResult<T> = Result<T, MonfgError>;
