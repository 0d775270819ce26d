//! Headless build-order bot runner.
//!
//! # Usage
//!
//! ```bash
//! # Print the opening chosen against an opponent
//! cargo run -p bob_headless -- select --opponent zerg_rush
//!
//! # Play one sandbox match
//! cargo run -p bob_headless -- run --opponent zerg_macro --max-frames 20000
//!
//! # Learn openings over a batch of matches
//! cargo run -p bob_headless -- batch --opponent zerg_rush --count 50 --output results/
//! ```
//!
//! Logs go to stderr, reports to stdout as JSON.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bob_core::race::Race;
use bob_headless::{
    batch::{run_batch, BatchConfig},
    runner::{play_match, MatchSettings, MatchSetup},
    sandbox::OpponentProfile,
    storage::{DataPaths, FileOutcomeStore},
};

#[derive(Parser)]
#[command(name = "bob_headless")]
#[command(about = "Headless runner for the build-order bot planner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory with openings, attack timings and unit data
    #[arg(long, global = true, default_value = "assets/data")]
    data: PathBuf,

    /// Two-line settings file naming the outcome read and write directories
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Race the bot plays
    #[arg(long, global = true, default_value = "Protoss")]
    race: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the opening that would be played against an opponent
    Select {
        /// Opponent name, used as the outcome record key
        #[arg(short, long)]
        opponent: String,
    },

    /// Play one sandbox match
    Run {
        /// Built-in opponent profile
        #[arg(short, long, default_value = "zerg_rush")]
        opponent: String,

        /// Stop the match at this frame (default: the game end frame)
        #[arg(long)]
        max_frames: Option<u32>,
    },

    /// Play a batch of sandbox matches, learning across them
    Batch {
        /// Built-in opponent profile
        #[arg(short, long, default_value = "zerg_rush")]
        opponent: String,

        /// Number of matches to play
        #[arg(short, long, default_value = "20")]
        count: u32,

        /// Output directory for results
        #[arg(short = 'O', long, default_value = "results")]
        output: PathBuf,

        /// Outcome record directory (default: the write directory)
        #[arg(long)]
        outcome_dir: Option<PathBuf>,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Stop each match at this frame (default: the game end frame)
        #[arg(long)]
        max_frames: Option<u32>,
    },
}

#[derive(Serialize)]
struct Selection<'a> {
    opponent: &'a str,
    index: Option<usize>,
    opening: Option<&'a str>,
}

fn main() {
    let cli = Cli::parse();

    // Logs on stderr, reports on stdout
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let Some(race) = Race::from_name(&cli.race) else {
        tracing::error!("Unknown race: {}", cli.race);
        std::process::exit(2);
    };
    let paths = match &cli.settings {
        Some(settings) => DataPaths::with_settings(&cli.data, settings),
        None => DataPaths::new(&cli.data),
    };

    match cli.command {
        Commands::Select { opponent } => cmd_select(&paths, race, &opponent),
        Commands::Run {
            opponent,
            max_frames,
        } => cmd_run(&paths, race, &opponent, max_frames),
        Commands::Batch {
            opponent,
            count,
            output,
            outcome_dir,
            seed,
            max_frames,
        } => cmd_batch(
            paths,
            race,
            &opponent,
            count,
            &output,
            outcome_dir,
            seed,
            max_frames,
        ),
    }
}

fn opponent_profile(name: &str) -> OpponentProfile {
    OpponentProfile::named(name).unwrap_or_else(|| {
        tracing::error!(
            "Unknown opponent profile '{name}', expected one of {:?}",
            OpponentProfile::NAMES
        );
        std::process::exit(2);
    })
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to encode report: {e}"),
    }
}

/// Print the opening the selector picks.
fn cmd_select(paths: &DataPaths, race: Race, opponent: &str) {
    let setup = MatchSetup::load(paths, race);
    let mut store = FileOutcomeStore::new(paths);
    let mut planner = setup.planner(opponent);
    let index = planner.on_start(&mut store);

    print_json(&Selection {
        opponent,
        index,
        opening: planner.opening(),
    });
}

/// Play one match and print its report.
fn cmd_run(paths: &DataPaths, race: Race, opponent: &str, max_frames: Option<u32>) {
    let profile = opponent_profile(opponent);
    let setup = MatchSetup::load(paths, race);
    let settings = MatchSettings {
        max_frames: max_frames.unwrap_or(setup.config.game_end_frame),
        ..MatchSettings::default()
    };
    let mut store = FileOutcomeStore::new(paths);

    tracing::info!("Playing {} as {race}", profile.name);
    let mut planner = setup.planner(&profile.name);
    let mut world = setup.world(profile);
    let report = play_match(&mut planner, &mut world, &settings, &mut store);
    print_json(&report);
}

/// Play a batch and save its results.
fn cmd_batch(
    paths: DataPaths,
    race: Race,
    opponent: &str,
    count: u32,
    output: &Path,
    outcome_dir: Option<PathBuf>,
    seed: u64,
    max_frames: Option<u32>,
) {
    let profile = opponent_profile(opponent);
    // Matches must read back what earlier matches wrote.
    let dir = outcome_dir.unwrap_or_else(|| paths.write_dir.clone());
    let paths = paths.with_outcome_dir(dir);
    let setup = MatchSetup::load(&paths, race);
    let config = BatchConfig::new(profile, count)
        .with_seed(seed)
        .with_max_frames(max_frames.unwrap_or(setup.config.game_end_frame));
    let mut store = FileOutcomeStore::new(&paths);

    let results = run_batch(&setup, &config, &mut store);

    let output_file = output.join(format!("batch_{}.json", config.opponent.name));
    if let Err(e) = results.save(&output_file) {
        tracing::error!("Failed to save results: {e}");
        std::process::exit(1);
    }
    tracing::info!("Results saved to {}", output_file.display());

    for opening in &results.openings {
        println!(
            "{:>2}  {:>3}/{:<3}  {}",
            opening.index, opening.won, opening.played, opening.label
        );
    }
}
