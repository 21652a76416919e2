use std::fs;
use std::path::PathBuf;

use court_stats::config::StatsConfig;
use court_stats::dataset::{load_dataset, parse_dataset_json};
use court_stats::{EventRepository, SqliteRepository, StatsEngine};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn config() -> StatsConfig {
    StatsConfig {
        db_path: None,
        parallelism: 2,
    }
}

#[test]
fn sqlite_and_memory_repositories_agree() {
    let dataset = load_dataset(&fixture_path("league.json")).expect("fixture should load");
    let sqlite = SqliteRepository::in_memory().unwrap();
    let summary = sqlite.import_dataset(&dataset, "league.json").unwrap();
    assert_eq!(summary.teams_upserted, 2);
    assert_eq!(summary.players_upserted, 4);
    assert_eq!(summary.shots_upserted, 11);
    assert_eq!(summary.passes_upserted, 4);
    assert_eq!(summary.turnovers_upserted, 3);

    let memory = dataset.into_repository();
    assert_eq!(sqlite.all_players().unwrap(), memory.all_players().unwrap());

    let from_sqlite = StatsEngine::new(&sqlite, &config());
    let from_memory = StatsEngine::new(&memory, &config());
    for player_id in 1..=4 {
        let a = serde_json::to_value(from_sqlite.build_player_summary(player_id).unwrap()).unwrap();
        let b = serde_json::to_value(from_memory.build_player_summary(player_id).unwrap()).unwrap();
        assert_eq!(a, b, "summary for player {player_id}");

        let a = serde_json::to_value(from_sqlite.rank_player_in_league(player_id).unwrap()).unwrap();
        let b = serde_json::to_value(from_memory.rank_player_in_league(player_id).unwrap()).unwrap();
        assert_eq!(a, b, "ranks for player {player_id}");
    }
}

#[test]
fn recomputed_aggregates_persist_across_reopen() {
    let dir = std::env::temp_dir().join(format!("court_stats_store_{}", std::process::id()));
    let db_path = dir.join("events.sqlite");
    let raw = fs::read_to_string(fixture_path("league.json")).unwrap();
    let dataset = parse_dataset_json(&raw).unwrap();

    {
        let repo = SqliteRepository::open(&db_path).unwrap();
        repo.import_dataset(&dataset, "league.json").unwrap();
        let engine = StatsEngine::new(&repo, &config());
        let aggregates = engine.recompute_game_aggregates().unwrap();
        assert_eq!(repo.upsert_game_aggregates(&aggregates).unwrap(), 4);
    }

    let reopened = SqliteRepository::open(&db_path).unwrap();
    assert_eq!(reopened.path(), Some(db_path.as_path()));
    let stored = reopened.load_game_aggregate(2, 100).unwrap().unwrap();
    assert_eq!(stored.total_points, 4);
    assert_eq!(stored.total_turnovers, 2);
    assert_eq!(stored.post_up_count, 2);
    assert!(reopened.load_game_aggregate(4, 100).unwrap().is_none());

    let _ = fs::remove_dir_all(&dir);
}
