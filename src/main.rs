use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use vigil::domain::{DifficultyLevel, GameKind, GameResult, ResponseTarget};
use vigil::engine::{GameSession, RandomSource};
use vigil::runner::{SessionRunner, SimulatedParticipant};
use vigil::storage::{JsonlResultStore, ResultQuery, ResultStore, summarize};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vigil")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("vigil.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None | Some(Commands::Games) => handle_games_command(config),
        Some(Commands::Play {
            game,
            difficulty,
            duration,
            seed,
            accuracy,
            realtime,
        }) => {
            let options = PlayOptions {
                game: *game,
                difficulty: difficulty.unwrap_or(config.engine.default_difficulty),
                duration: duration.or(config.engine.duration_sec),
                seed: *seed,
                accuracy: accuracy.unwrap_or(config.participant.accuracy),
                realtime: *realtime,
            };
            handle_play_command(&options, config)
        }
        Some(Commands::Results { game, limit }) => handle_results_command(game.as_deref(), *limit, config),
    }
}

fn handle_games_command(config: &Config) -> Result<()> {
    println!("{}", "Available games:".bold());
    for kind in GameKind::ALL {
        let params = config.difficulty.game_config(kind, config.engine.default_difficulty);
        println!(
            "  {:<16} {:<16} {:<16} {}s",
            kind.id().cyan(),
            kind.title(),
            kind.family().to_string().dimmed(),
            params.duration_sec
        );
    }
    Ok(())
}

struct PlayOptions {
    game: GameKind,
    difficulty: DifficultyLevel,
    duration: Option<u64>,
    seed: Option<u64>,
    accuracy: f64,
    realtime: bool,
}

fn build_session(options: &PlayOptions, config: &Config) -> Result<GameSession> {
    let mut game_config = config.difficulty.game_config(options.game, options.difficulty);
    if let Some(duration) = options.duration {
        game_config = game_config.with_duration_sec(duration);
    }

    let random: Box<dyn RandomSource> = match options.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_os_rng()),
    };

    let session = GameSession::new(game_config, random)
        .and_then(|s| s.with_scoring(config.scoring.strategy_for(options.game.family())))
        .and_then(|s| s.with_tick_ms(config.engine.tick_ms))
        .context("Failed to create session")?;
    Ok(session)
}

fn handle_play_command(options: &PlayOptions, config: &Config) -> Result<()> {
    info!(
        "Playing {} at {} (seed: {:?}, realtime: {})",
        options.game, options.difficulty, options.seed, options.realtime
    );

    let session = build_session(options, config)?;
    let participant = SimulatedParticipant::new(
        options.accuracy,
        config.participant.reaction_ms,
        options.seed.map(|seed| seed.wrapping_add(1)),
    );
    let store = Arc::new(JsonlResultStore::new(&config.storage.results_dir).context("Failed to open result store")?);

    println!(
        "{} {} ({}, {}s)",
        "Playing:".green(),
        options.game.title(),
        options.difficulty,
        session.config().duration_sec
    );

    let result = if options.realtime {
        play_realtime(session, participant, store.clone())?
    } else {
        play_logical(session, participant, store.as_ref())?
    };

    print_result(&result);
    println!("{} {}", "Saved to:".dimmed(), store.path().display());
    Ok(())
}

fn play_logical(mut session: GameSession, mut participant: SimulatedParticipant, store: &dyn ResultStore) -> Result<GameResult> {
    let result = participant.play(&mut session).context("Session failed")?;
    store.save(&result).context("Failed to save result")?;
    Ok(result)
}

fn play_realtime(
    session: GameSession,
    mut participant: SimulatedParticipant,
    store: Arc<JsonlResultStore>,
) -> Result<GameResult> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    runtime.block_on(async move {
        let (runner, handle) = SessionRunner::new(session, store);
        let task = tokio::spawn(runner.run());
        let mut snapshots = handle.subscribe();
        let mut last_remaining = None;

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if snapshot.state.is_terminal() {
                        break;
                    }
                    if last_remaining != Some(snapshot.remaining_sec) {
                        last_remaining = Some(snapshot.remaining_sec);
                        print!(
                            "\r  {:>3}s left  active {}  resolved {}   ",
                            snapshot.remaining_sec,
                            snapshot.active_stimuli.len(),
                            snapshot.live_stats.resolved()
                        );
                        let _ = std::io::stdout().flush();
                    }
                    for id in participant.respond_to(&snapshot) {
                        if handle.respond(ResponseTarget::Stimulus(id)).await.is_err() {
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    println!("{}", "Stopping session...".yellow());
                    handle.stop().await.context("Failed to stop session")?;
                }
            }
        }
        println!();

        let result = task.await.context("Runner task failed")?.context("Session failed")?;
        Ok::<_, eyre::Report>(result)
    })
}

fn print_result(result: &GameResult) {
    println!("{}", "Result".bold());
    println!("  {:<22} {}", "Game:", result.game_id.cyan());
    println!("  {:<22} {}s", "Duration:", result.duration_sec);
    println!(
        "  {:<22} {} ({} targets, {} non-targets)",
        "Stimuli:", result.total_stimuli, result.total_targets, result.total_non_targets
    );
    println!("  {:<22} {}", "Hits:", result.hits.to_string().green());
    println!("  {:<22} {}", "Misses:", result.misses.to_string().yellow());
    println!("  {:<22} {}", "False alarms:", result.false_alarms.to_string().red());
    println!("  {:<22} {}", "Correct rejections:", result.correct_rejections);
    println!("  {:<22} {}ms", "Avg reaction time:", result.average_reaction_time_ms);
    println!("  {:<22} {}%", "Accuracy:", result.accuracy_pct);
    println!("  {:<22} {}%", "Sensitivity:", result.sensitivity_pct);
    println!("  {:<22} {}", "Score:", result.score.to_string().bold());
}

fn handle_results_command(game: Option<&str>, limit: usize, config: &Config) -> Result<()> {
    info!("Listing results - game: {:?}, limit: {}", game, limit);
    let store = JsonlResultStore::new(&config.storage.results_dir).context("Failed to open result store")?;

    let query = match game {
        Some(game) => ResultQuery::for_game(game),
        None => ResultQuery::default(),
    }
    .with_limit(limit);
    let records = store.query(&query).context("Failed to read results")?;

    if records.is_empty() {
        println!("{}", "No results yet".dimmed());
        return Ok(());
    }

    println!("{}", "Recent results:".bold());
    for record in &records {
        let r = &record.result;
        println!(
            "  {}  {:<16} score {:>4}  accuracy {:>3}%  sensitivity {:>3}%  rt {}ms",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            r.game_id.cyan(),
            r.score,
            r.accuracy_pct,
            r.sensitivity_pct,
            r.average_reaction_time_ms
        );
    }

    let all = store.list().context("Failed to read results")?;
    let scoped: Vec<_> = all
        .into_iter()
        .filter(|record| game.is_none_or(|g| record.result.game_id == g))
        .collect();
    println!();
    println!("{}", "Summary:".bold());
    for summary in summarize(&scoped) {
        println!(
            "  {:<16} sessions {:>3}  best {:>4}  avg {:>6.1}  accuracy {:>5.1}%  rt {}ms",
            summary.game_id.cyan(),
            summary.sessions,
            summary.best_score.to_string().green(),
            summary.average_score,
            summary.average_accuracy,
            summary.average_reaction_time_ms
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
