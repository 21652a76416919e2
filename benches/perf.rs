use criterion::{Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use court_stats::config::StatsConfig;
use court_stats::dataset::parse_dataset_json;
use court_stats::events::{
    ClockContext, CourtPoint, PassEvent, PlayType, PlayerIdentity, ShotEvent, TurnoverEvent,
};
use court_stats::{InMemoryRepository, StatsEngine};

const PLAYERS: u32 = 450;

const PLAY_TYPES: [PlayType; 4] = [
    PlayType::PickAndRoll,
    PlayType::Isolation,
    PlayType::PostUp,
    PlayType::OffBallScreen,
];

fn synthetic_league() -> InMemoryRepository {
    let mut rng = StdRng::seed_from_u64(42);
    let mut repo = InMemoryRepository::new();
    for player_id in 1..=PLAYERS {
        repo.add_player(PlayerIdentity {
            player_id,
            name: format!("Player {player_id}"),
            team_id: player_id % 30,
            team_name: format!("Team {}", player_id % 30),
            position: Some("G".to_string()),
            jersey_number: Some(player_id % 99),
        });
        for id in 0..60u64 {
            let clock = ClockContext {
                quarter: Some(rng.gen_range(1..5)),
                time_remaining: Some(rng.gen_range(0.0..720.0)),
                shot_clock: None,
            };
            repo.add_shot(ShotEvent::new(
                id,
                player_id,
                rng.gen_range(1..41),
                PLAY_TYPES[rng.gen_range(0..4)],
                [0u8, 0, 2, 3][rng.gen_range(0..4)],
                CourtPoint::new(rng.gen_range(-25.0..25.0), rng.gen_range(0.0..30.0)),
                false,
                clock,
            ));
            repo.add_pass(PassEvent::new(
                id,
                player_id,
                rng.gen_range(1..41),
                PLAY_TYPES[rng.gen_range(0..4)],
                CourtPoint::new(0.0, 25.0),
                CourtPoint::new(rng.gen_range(-20.0..20.0), rng.gen_range(0.0..20.0)),
                rng.gen_bool(0.9),
                rng.gen_bool(0.2),
                rng.gen_bool(0.05),
                None,
                clock,
            ));
            if id % 6 == 0 {
                repo.add_turnover(TurnoverEvent {
                    id,
                    player_id,
                    game_id: rng.gen_range(1..41),
                    play_type: PLAY_TYPES[rng.gen_range(0..4)],
                    location: CourtPoint::new(0.0, 12.0),
                    turnover_type: Some("badPass".to_string()),
                    forced_by: None,
                    clock,
                });
            }
        }
    }
    repo
}

fn config() -> StatsConfig {
    StatsConfig {
        db_path: None,
        parallelism: 6,
    }
}

fn bench_snapshot_build(c: &mut Criterion) {
    let repo = synthetic_league();
    let engine = StatsEngine::new(&repo, &config());
    c.bench_function("league_snapshot_build", |b| {
        b.iter(|| {
            let snapshot = engine.build_snapshot().unwrap();
            black_box(snapshot.len());
        })
    });
}

fn bench_rank_player(c: &mut Criterion) {
    let repo = synthetic_league();
    let engine = StatsEngine::new(&repo, &config());
    let snapshot = engine.build_snapshot().unwrap();
    c.bench_function("rank_player", |b| {
        b.iter(|| {
            let report = engine.rank_player(black_box(PLAYERS / 2), &snapshot).unwrap();
            black_box(report.population);
        })
    });
}

fn bench_player_summary(c: &mut Criterion) {
    let repo = synthetic_league();
    let engine = StatsEngine::new(&repo, &config());
    c.bench_function("player_summary", |b| {
        b.iter(|| {
            let summary = engine.build_player_summary(black_box(17)).unwrap();
            black_box(summary.total_points);
        })
    });
}

fn bench_compare_players(c: &mut Criterion) {
    let repo = synthetic_league();
    let engine = StatsEngine::new(&repo, &config());
    let ids = ["3", "99", "250", "401"];
    c.bench_function("compare_four_players", |b| {
        b.iter(|| {
            let comparison = engine.compare_players(black_box(&ids)).unwrap();
            black_box(comparison.players.len());
        })
    });
}

fn bench_recompute(c: &mut Criterion) {
    let repo = synthetic_league();
    let engine = StatsEngine::new(&repo, &config());
    c.bench_function("recompute_game_aggregates", |b| {
        b.iter(|| {
            let aggregates = engine.recompute_game_aggregates().unwrap();
            black_box(aggregates.len());
        })
    });
}

fn bench_dataset_parse(c: &mut Criterion) {
    c.bench_function("dataset_parse", |b| {
        b.iter(|| {
            let dataset = parse_dataset_json(black_box(DATASET_JSON)).unwrap();
            black_box(dataset.players.len());
        })
    });
}

criterion_group!(
    perf,
    bench_snapshot_build,
    bench_rank_player,
    bench_player_summary,
    bench_compare_players,
    bench_recompute,
    bench_dataset_parse
);
criterion_main!(perf);

static DATASET_JSON: &str = include_str!("../tests/fixtures/league.json");
