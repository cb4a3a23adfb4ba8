use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use crate::best_response::{verify_nash, VERIFY_TOL};
use crate::config::{Algorithm, FpConfig, IbrConfig, Variant};
use crate::display::{nash_label, print_outcome, summary_table};
use crate::error::MonfgError;
use crate::fictitious_play::{fictitious_play, transform_log, ContinuousRecord, IterationRecord};
use crate::game::{Monfg, Scalarization};
use crate::games::{
    bertrand_pricing_game, one_simplex_coord_to_point, polynomial_game, pricing_game, BertrandParams,
    PricingParams,
};
use crate::ibr::iterated_best_response;
use crate::strategy::{joint_from_flat, JointStrategy};

#[derive(Parser)]
#[command(name = "monfg", about = "Nash equilibria of multi-objective normal-form games")]
struct Cli {
    /// Log every round.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run best-response dynamics on a continuous game.
    Run {
        #[arg(long, value_enum, default_value_t = GameKind::Polynomial)]
        game: GameKind,
        #[arg(long, value_enum, default_value_t = Algorithm::Fp)]
        algorithm: Algorithm,
        #[arg(long, value_enum, default_value_t = Variant::Alternating)]
        variant: Variant,
        /// Use the global search for every best response.
        #[arg(long)]
        global: bool,
        #[arg(long, default_value_t = 1000)]
        max_iter: usize,
        #[arg(long, default_value_t = 0.0)]
        epsilon: f64,
        /// Consecutive converged rounds before fictitious play stops.
        #[arg(long)]
        early_stop: Option<usize>,
        /// Skip verification of the final joint strategy.
        #[arg(long)]
        no_verify: bool,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1)]
        runs: usize,
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,
        /// Write run logs as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check whether a flat joint strategy is a Nash equilibrium.
    Verify {
        #[arg(long, value_enum, default_value_t = GameKind::Polynomial)]
        game: GameKind,
        /// Comma separated probabilities, player by player.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        strategy: Vec<f64>,
        #[arg(long, default_value_t = 0.0)]
        epsilon: f64,
        #[arg(long)]
        strict: bool,
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GameKind {
    Polynomial,
    Bertrand,
    Pricing,
}

impl GameKind {
    fn default_interval(self) -> (f64, f64) {
        match self {
            GameKind::Polynomial => (-1.0, 1.0),
            GameKind::Bertrand => (10.0, 25.0),
            GameKind::Pricing => (0.0, 1000.0),
        }
    }

    fn build(self, min: f64, max: f64) -> Result<(Monfg, Vec<Box<dyn Scalarization>>), MonfgError> {
        match self {
            GameKind::Polynomial => polynomial_game(min, max),
            GameKind::Bertrand => bertrand_pricing_game(BertrandParams {
                min_price: min,
                max_price: max,
                ..BertrandParams::default()
            }),
            GameKind::Pricing => pricing_game(PricingParams {
                min_price: min,
                max_price: max,
                ..PricingParams::default()
            }),
        }
    }
}

#[derive(Serialize)]
struct RunLog {
    run: usize,
    nash_equilibrium: bool,
    joint_strategy: JointStrategy,
    log: Vec<IterationRecord>,
    points: Vec<ContinuousRecord>,
}

pub fn run() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dispatch(cli.command) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn dispatch(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Run {
            game,
            algorithm,
            variant,
            global,
            max_iter,
            epsilon,
            early_stop,
            no_verify,
            seed,
            runs,
            min,
            max,
            output,
        } => {
            let (lo, hi) = interval(game, min, max);
            let (monfg, utilities) = game.build(lo, hi)?;
            let mut logs = Vec::with_capacity(runs);
            let mut rows = Vec::with_capacity(runs);

            for run in 0..runs {
                let seed_for_run = run_seed(seed, run);
                let (nash, joint, log) = match algorithm {
                    Algorithm::Ibr => {
                        let config = IbrConfig {
                            epsilon,
                            max_iter,
                            variant,
                            global_opt: global,
                            verify: !no_verify,
                            seed: seed_for_run,
                            ..IbrConfig::default()
                        };
                        let outcome = iterated_best_response(&monfg, &utilities, &config)?;
                        let log = vec![IterationRecord {
                            iteration: outcome.iterations,
                            joint: outcome.joint_strategy.concat(),
                        }];
                        (outcome.nash_equilibrium, outcome.joint_strategy, log)
                    }
                    Algorithm::Fp => {
                        let config = FpConfig {
                            epsilon,
                            max_iter,
                            variant,
                            global_opt: global,
                            verify: !no_verify,
                            early_stop,
                            seed: seed_for_run,
                            ..FpConfig::default()
                        };
                        let outcome = fictitious_play(&monfg, &utilities, &config)?;
                        (outcome.nash_equilibrium, outcome.joint_strategy, outcome.log)
                    }
                };

                let iterations = log.last().map(|r| r.iteration).unwrap_or(0);
                let point = format!(
                    "({:.4}, {:.4})",
                    one_simplex_coord_to_point(&joint[0], lo, hi),
                    one_simplex_coord_to_point(&joint[1], lo, hi)
                );
                if runs == 1 {
                    print_outcome(&format!("{algorithm} {variant}"), nash, &joint, iterations);
                    println!("  Point: {point}");
                }
                rows.push((run, nash, iterations, point));
                let points = transform_log(run, &log, lo, hi)?;
                logs.push(RunLog {
                    run,
                    nash_equilibrium: nash,
                    joint_strategy: joint,
                    log,
                    points,
                });
            }

            if runs > 1 {
                println!("{}", summary_table(&rows));
            }
            if let Some(path) = output {
                let writer = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(writer, &logs)?;
                log::info!("wrote {} runs to {}", logs.len(), path.display());
            }
            Ok(())
        }
        Command::Verify {
            game,
            strategy,
            epsilon,
            strict,
            min,
            max,
        } => {
            let (lo, hi) = interval(game, min, max);
            let (monfg, utilities) = game.build(lo, hi)?;
            let joint = joint_from_flat(&strategy, monfg.player_actions())?;
            let nash = verify_nash(&monfg, &utilities, &joint, epsilon, VERIFY_TOL, strict)?;
            println!("  {}", nash_label(nash));
            Ok(())
        }
    }
}

/// Seed for one of several runs; successive runs use successive seeds.
fn run_seed(seed: Option<u64>, run: usize) -> Option<u64> {
    seed.map(|s| s.wrapping_add(run as u64))
}

fn interval(game: GameKind, min: Option<f64>, max: Option<f64>) -> (f64, f64) {
    let (lo, hi) = game.default_interval();
    (min.unwrap_or(lo), max.unwrap_or(hi))
}
