use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use court_stats::config::{StatsConfig, parse_db_path_arg};
use court_stats::dataset::load_dataset;
use court_stats::{SqliteRepository, StatsEngine};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("court_stats=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let input = parse_input_arg(&args).ok_or_else(|| anyhow!("usage: ingest --input FILE [--db PATH]"))?;
    let config = StatsConfig::from_env().with_db_path(parse_db_path_arg(&args));
    let db_path = config
        .db_path
        .clone()
        .context("unable to resolve sqlite path")?;

    let dataset = load_dataset(&input)?;
    let repo = SqliteRepository::open(&db_path)?;
    let summary = repo.import_dataset(&dataset, &input.display().to_string())?;

    let engine = StatsEngine::new(&repo, &config);
    let aggregates = engine.recompute_game_aggregates()?;
    let stored = repo.upsert_game_aggregates(&aggregates)?;

    println!("Import complete");
    println!("DB: {}", db_path.display());
    println!("Teams: {}", summary.teams_upserted);
    println!("Players: {}", summary.players_upserted);
    println!(
        "Events: shots={} passes={} turnovers={}",
        summary.shots_upserted, summary.passes_upserted, summary.turnovers_upserted
    );
    println!("Game aggregates stored: {stored}");
    Ok(())
}

fn parse_input_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--input=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--input" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
