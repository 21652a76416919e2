use std::env;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use court_stats::config::{StatsConfig, parse_db_path_arg};
use court_stats::error::{StatsResult, parse_player_id};
use court_stats::{SqliteRepository, StatsEngine};

const USAGE: &str = "usage: court_stats [--db PATH] <command>

commands:
  summary <player_id>              career summary with play-type breakdowns
  ranks <player_id>                league ranks and percentiles
  compare <player_id>...           side-by-side comparison (first 4 ids)
  game <player_id> <game_id>       single-game aggregate, stored
  recompute                        rebuild and store every game aggregate";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let config = StatsConfig::from_env().with_db_path(parse_db_path_arg(&args));
    let positional = positional_args(&args);
    let Some((command, rest)) = positional.split_first() else {
        eprintln!("{USAGE}");
        return Err(anyhow!("no command given"));
    };

    let db_path = config
        .db_path
        .clone()
        .context("unable to resolve sqlite path")?;
    let repo = SqliteRepository::open(&db_path)?;
    let engine = StatsEngine::new(&repo, &config);
    info!(db = %db_path.display(), command = command.as_str(), "running");

    match command.as_str() {
        "summary" => {
            let player_id = parse_player_id(required(rest, 0, "player_id")?)?;
            emit(engine.build_player_summary(player_id))
        }
        "ranks" => {
            let player_id = parse_player_id(required(rest, 0, "player_id")?)?;
            emit(engine.rank_player_in_league(player_id))
        }
        "compare" => emit(engine.compare_players(rest)),
        "game" => {
            let player_id = parse_player_id(required(rest, 0, "player_id")?)?;
            let game_id = required(rest, 1, "game_id")?
                .trim()
                .parse::<u32>()
                .map_err(|_| anyhow!("game_id must be a non-negative integer"))?;
            let aggregate = engine.compute_game_aggregate(player_id, game_id);
            if let Ok(aggregate) = &aggregate {
                repo.upsert_game_aggregate(aggregate)?;
            }
            emit(aggregate)
        }
        "recompute" => {
            let aggregates = engine.recompute_game_aggregates()?;
            let stored = repo.upsert_game_aggregates(&aggregates)?;
            println!("Recomputed {stored} player-game aggregates");
            Ok(())
        }
        other => {
            eprintln!("{USAGE}");
            Err(anyhow!("unknown command: {other}"))
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("court_stats=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Arguments with `--db` and its value removed.
fn positional_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--db=") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn required<'a>(rest: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    rest.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument <{name}>\n\n{USAGE}"))
}

/// Pretty JSON on stdout; a failed lookup prints its error report and exits non-zero.
fn emit<T: Serialize>(result: StatsResult<T>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            let report = serde_json::json!({ "error": err.report() });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Err(err.into())
        }
    }
}
