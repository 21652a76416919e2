use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "court_stats";
const DB_FILE: &str = "events.sqlite";
const DEFAULT_PARALLELISM: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    pub db_path: Option<PathBuf>,
    /// Worker threads for snapshot builds, comparisons and bulk recomputes.
    pub parallelism: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl StatsConfig {
    /// Reads `COURT_STATS_DB` and `STATS_PARALLELISM`. Call `dotenvy` first to pick up `.env` files.
    pub fn from_env() -> Self {
        let db_path = env::var("COURT_STATS_DB")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .or_else(default_db_path);
        Self {
            db_path,
            parallelism: parse_parallelism(env::var("STATS_PARALLELISM").ok().as_deref()),
        }
    }

    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.db_path = path;
        }
        self
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.clamp(1, 32);
        self
    }
}

fn parse_parallelism(raw: Option<&str>) -> usize {
    raw.and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_PARALLELISM)
        .clamp(1, 32)
}

pub fn default_db_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR).join(DB_FILE));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR).join(DB_FILE))
}

/// `--db PATH` or `--db=PATH` from the process arguments.
pub fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}
