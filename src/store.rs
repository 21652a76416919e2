use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{StatsError, StatsResult};
use crate::events::{
    ClockContext, CourtPoint, EventSet, GameId, PassEvent, PlayType, PlayerId, PlayerIdentity,
    ShotEvent, TeamId, TurnoverEvent,
};
use crate::game_stats::PlayerGameAggregate;
use crate::repository::EventRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub db_path: Option<PathBuf>,
    pub teams_upserted: usize,
    pub players_upserted: usize,
    pub shots_upserted: usize,
    pub passes_upserted: usize,
    pub turnovers_upserted: usize,
}

/// Event store backed by one SQLite connection.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }

    /// Upserts every team, player and event of the dataset in one transaction and records the run.
    pub fn import_dataset(&self, dataset: &Dataset, source: &str) -> Result<ImportSummary> {
        let mut conn = self.lock()?;
        let started_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO import_runs(started_at, finished_at, source, events_upserted)
             VALUES (?1, NULL, ?2, 0)",
            params![started_at, source],
        )
        .context("insert import run")?;
        let run_id = conn.last_insert_rowid();

        let mut summary = ImportSummary {
            db_path: self.path.clone(),
            teams_upserted: 0,
            players_upserted: 0,
            shots_upserted: 0,
            passes_upserted: 0,
            turnovers_upserted: 0,
        };

        let tx = conn.transaction().context("begin import transaction")?;
        for team in &dataset.teams {
            tx.execute(
                "INSERT INTO teams(team_id, name, abbreviation) VALUES (?1, ?2, ?3)
                 ON CONFLICT(team_id) DO UPDATE SET
                    name = excluded.name,
                    abbreviation = excluded.abbreviation",
                params![team.team_id, team.name, team.abbreviation],
            )
            .context("upsert team")?;
            summary.teams_upserted += 1;
        }
        for identity in dataset.identities() {
            upsert_player(&tx, &identity)?;
            summary.players_upserted += 1;
        }
        for player in &dataset.players {
            for shot in &player.shots {
                upsert_shot(&tx, &shot.to_event(player.player_id))?;
                summary.shots_upserted += 1;
            }
            for pass in &player.passes {
                upsert_pass(&tx, &pass.to_event(player.player_id))?;
                summary.passes_upserted += 1;
            }
            for turnover in &player.turnovers {
                upsert_turnover(&tx, &turnover.to_event(player.player_id))?;
                summary.turnovers_upserted += 1;
            }
        }
        tx.commit().context("commit import transaction")?;

        let events = summary.shots_upserted + summary.passes_upserted + summary.turnovers_upserted;
        conn.execute(
            "UPDATE import_runs SET finished_at = ?1, events_upserted = ?2 WHERE run_id = ?3",
            params![Utc::now().to_rfc3339(), events as i64, run_id],
        )
        .context("update import run")?;

        info!(
            source,
            players = summary.players_upserted,
            events,
            "dataset imported"
        );
        Ok(summary)
    }

    pub fn upsert_game_aggregate(&self, aggregate: &PlayerGameAggregate) -> Result<()> {
        self.upsert_game_aggregates(std::slice::from_ref(aggregate))?;
        Ok(())
    }

    pub fn upsert_game_aggregates(&self, aggregates: &[PlayerGameAggregate]) -> Result<usize> {
        let mut conn = self.lock()?;
        let updated_at = Utc::now().to_rfc3339();
        let tx = conn.transaction().context("begin aggregate transaction")?;
        for aggregate in aggregates {
            let payload = serde_json::to_string(aggregate).context("encode aggregate")?;
            tx.execute(
                "INSERT INTO player_game_stats(player_id, game_id, total_points, payload_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(player_id, game_id) DO UPDATE SET
                    total_points = excluded.total_points,
                    payload_json = excluded.payload_json,
                    updated_at = excluded.updated_at",
                params![
                    aggregate.player_id,
                    aggregate.game_id,
                    aggregate.total_points,
                    payload,
                    updated_at
                ],
            )
            .context("upsert player game stats")?;
        }
        tx.commit().context("commit aggregate transaction")?;
        debug!(rows = aggregates.len(), "stored game aggregates");
        Ok(aggregates.len())
    }

    /// Every (player, game) pair with at least one recorded event, ascending.
    pub fn player_game_pairs(&self) -> Result<Vec<(PlayerId, GameId)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT player_id, game_id FROM shots
                 UNION SELECT player_id, game_id FROM passes
                 UNION SELECT player_id, game_id FROM turnovers
                 ORDER BY 1 ASC, 2 ASC",
            )
            .context("prepare player game pairs query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)))
            .context("query player game pairs")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player game pair")?);
        }
        Ok(out)
    }

    pub fn load_game_aggregate(
        &self,
        player_id: PlayerId,
        game_id: GameId,
    ) -> Result<Option<PlayerGameAggregate>> {
        let conn = self.lock()?;
        let payload = conn
            .query_row(
                "SELECT payload_json FROM player_game_stats WHERE player_id = ?1 AND game_id = ?2",
                params![player_id, game_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("query player game stats")?;
        payload
            .map(|raw| serde_json::from_str(&raw).context("decode stored aggregate"))
            .transpose()
    }

    fn load_events(&self, player_id: PlayerId, game_id: Option<GameId>) -> Result<EventSet> {
        let conn = self.lock()?;
        let game_filter = game_id.map(i64::from);
        let mut events = EventSet::default();

        let mut stmt = conn
            .prepare(
                "SELECT id, player_id, game_id, play_type, points, loc_x, loc_y, foul_drawn,
                        quarter, time_remaining, shot_clock
                 FROM shots
                 WHERE player_id = ?1 AND (?2 IS NULL OR game_id = ?2)
                 ORDER BY game_id ASC, id ASC",
            )
            .context("prepare shots query")?;
        let rows = stmt
            .query_map(params![player_id, game_filter], shot_from_row)
            .context("query shots")?;
        for row in rows {
            events.shots.push(row.context("decode shot row")?);
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, player_id, game_id, play_type, start_x, start_y, end_x, end_y,
                        completed, potential_assist, turnover, receiver_id, quarter, time_remaining
                 FROM passes
                 WHERE player_id = ?1 AND (?2 IS NULL OR game_id = ?2)
                 ORDER BY game_id ASC, id ASC",
            )
            .context("prepare passes query")?;
        let rows = stmt
            .query_map(params![player_id, game_filter], pass_from_row)
            .context("query passes")?;
        for row in rows {
            events.passes.push(row.context("decode pass row")?);
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, player_id, game_id, play_type, loc_x, loc_y, turnover_type, forced_by,
                        quarter, time_remaining
                 FROM turnovers
                 WHERE player_id = ?1 AND (?2 IS NULL OR game_id = ?2)
                 ORDER BY game_id ASC, id ASC",
            )
            .context("prepare turnovers query")?;
        let rows = stmt
            .query_map(params![player_id, game_filter], turnover_from_row)
            .context("query turnovers")?;
        for row in rows {
            events.turnovers.push(row.context("decode turnover row")?);
        }

        Ok(events)
    }

    fn load_player_ids(&self, team_id: Option<TeamId>) -> Result<Vec<PlayerId>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT player_id FROM players
                 WHERE (?1 IS NULL OR team_id = ?1)
                 ORDER BY player_id ASC",
            )
            .context("prepare players query")?;
        let rows = stmt
            .query_map(params![team_id.map(i64::from)], |row| row.get::<_, u32>(0))
            .context("query players")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode player id")?);
        }
        Ok(out)
    }

    fn load_identity(&self, player_id: PlayerId) -> Result<Option<PlayerIdentity>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT p.player_id, p.name, p.team_id, COALESCE(t.name, 'Team ' || p.team_id),
                    p.position, p.jersey_number
             FROM players p
             LEFT JOIN teams t ON t.team_id = p.team_id
             WHERE p.player_id = ?1",
            params![player_id],
            |row| {
                Ok(PlayerIdentity {
                    player_id: row.get(0)?,
                    name: row.get(1)?,
                    team_id: row.get(2)?,
                    team_name: row.get(3)?,
                    position: row.get(4)?,
                    jersey_number: row.get(5)?,
                })
            },
        )
        .optional()
        .context("query player identity")
    }
}

impl EventRepository for SqliteRepository {
    fn events_for(&self, player_id: PlayerId, game_id: Option<GameId>) -> StatsResult<EventSet> {
        Ok(self.load_events(player_id, game_id)?)
    }

    fn all_players(&self) -> StatsResult<Vec<PlayerId>> {
        Ok(self.load_player_ids(None)?)
    }

    fn player_identity(&self, player_id: PlayerId) -> StatsResult<PlayerIdentity> {
        self.load_identity(player_id)?
            .ok_or_else(|| StatsError::player_not_found(player_id))
    }

    fn team_roster(&self, team_id: TeamId) -> StatsResult<Vec<PlayerId>> {
        Ok(self.load_player_ids(Some(team_id))?)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            abbreviation TEXT NULL
        );
        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            position TEXT NULL,
            jersey_number INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);

        CREATE TABLE IF NOT EXISTS shots (
            id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            play_type TEXT NOT NULL,
            points INTEGER NOT NULL,
            loc_x REAL NOT NULL,
            loc_y REAL NOT NULL,
            foul_drawn INTEGER NOT NULL,
            quarter INTEGER NULL,
            time_remaining REAL NULL,
            shot_clock REAL NULL,
            PRIMARY KEY (player_id, id)
        );
        CREATE INDEX IF NOT EXISTS idx_shots_player_game ON shots(player_id, game_id);

        CREATE TABLE IF NOT EXISTS passes (
            id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            play_type TEXT NOT NULL,
            start_x REAL NOT NULL,
            start_y REAL NOT NULL,
            end_x REAL NOT NULL,
            end_y REAL NOT NULL,
            completed INTEGER NOT NULL,
            potential_assist INTEGER NOT NULL,
            turnover INTEGER NOT NULL,
            receiver_id INTEGER NULL,
            quarter INTEGER NULL,
            time_remaining REAL NULL,
            PRIMARY KEY (player_id, id)
        );
        CREATE INDEX IF NOT EXISTS idx_passes_player_game ON passes(player_id, game_id);

        CREATE TABLE IF NOT EXISTS turnovers (
            id INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            play_type TEXT NOT NULL,
            loc_x REAL NOT NULL,
            loc_y REAL NOT NULL,
            turnover_type TEXT NULL,
            forced_by INTEGER NULL,
            quarter INTEGER NULL,
            time_remaining REAL NULL,
            PRIMARY KEY (player_id, id)
        );
        CREATE INDEX IF NOT EXISTS idx_turnovers_player_game ON turnovers(player_id, game_id);

        CREATE TABLE IF NOT EXISTS player_game_stats (
            player_id INTEGER NOT NULL,
            game_id INTEGER NOT NULL,
            total_points INTEGER NOT NULL,
            payload_json TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(player_id, game_id)
        );

        CREATE TABLE IF NOT EXISTS import_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            source TEXT NOT NULL,
            events_upserted INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn upsert_player(tx: &rusqlite::Transaction<'_>, p: &PlayerIdentity) -> Result<()> {
    tx.execute(
        "INSERT INTO players(player_id, name, team_id, position, jersey_number)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(player_id) DO UPDATE SET
            name = excluded.name,
            team_id = excluded.team_id,
            position = excluded.position,
            jersey_number = excluded.jersey_number",
        params![p.player_id, p.name, p.team_id, p.position, p.jersey_number],
    )
    .context("upsert player")?;
    Ok(())
}

fn upsert_shot(tx: &rusqlite::Transaction<'_>, s: &ShotEvent) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO shots(
            id, player_id, game_id, play_type, points, loc_x, loc_y, foul_drawn,
            quarter, time_remaining, shot_clock
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            s.id as i64,
            s.player_id,
            s.game_id,
            s.play_type.tag(),
            s.points,
            s.location.x,
            s.location.y,
            bool_to_i64(s.foul_drawn),
            s.clock.quarter,
            s.clock.time_remaining,
            s.clock.shot_clock
        ],
    )
    .context("upsert shot")?;
    Ok(())
}

fn upsert_pass(tx: &rusqlite::Transaction<'_>, p: &PassEvent) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO passes(
            id, player_id, game_id, play_type, start_x, start_y, end_x, end_y,
            completed, potential_assist, turnover, receiver_id, quarter, time_remaining
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            p.id as i64,
            p.player_id,
            p.game_id,
            p.play_type.tag(),
            p.start.x,
            p.start.y,
            p.end.x,
            p.end.y,
            bool_to_i64(p.completed),
            bool_to_i64(p.potential_assist),
            bool_to_i64(p.turnover),
            p.receiver_id,
            p.clock.quarter,
            p.clock.time_remaining
        ],
    )
    .context("upsert pass")?;
    Ok(())
}

fn upsert_turnover(tx: &rusqlite::Transaction<'_>, t: &TurnoverEvent) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO turnovers(
            id, player_id, game_id, play_type, loc_x, loc_y, turnover_type, forced_by,
            quarter, time_remaining
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            t.id as i64,
            t.player_id,
            t.game_id,
            t.play_type.tag(),
            t.location.x,
            t.location.y,
            t.turnover_type,
            t.forced_by,
            t.clock.quarter,
            t.clock.time_remaining
        ],
    )
    .context("upsert turnover")?;
    Ok(())
}

fn shot_from_row(row: &Row<'_>) -> rusqlite::Result<ShotEvent> {
    Ok(ShotEvent::new(
        row.get::<_, i64>(0)? as u64,
        row.get(1)?,
        row.get(2)?,
        PlayType::from_tag(&row.get::<_, String>(3)?),
        row.get(4)?,
        CourtPoint::new(row.get(5)?, row.get(6)?),
        row.get::<_, i64>(7)? != 0,
        ClockContext {
            quarter: row.get(8)?,
            time_remaining: row.get(9)?,
            shot_clock: row.get(10)?,
        },
    ))
}

fn pass_from_row(row: &Row<'_>) -> rusqlite::Result<PassEvent> {
    Ok(PassEvent::new(
        row.get::<_, i64>(0)? as u64,
        row.get(1)?,
        row.get(2)?,
        PlayType::from_tag(&row.get::<_, String>(3)?),
        CourtPoint::new(row.get(4)?, row.get(5)?),
        CourtPoint::new(row.get(6)?, row.get(7)?),
        row.get::<_, i64>(8)? != 0,
        row.get::<_, i64>(9)? != 0,
        row.get::<_, i64>(10)? != 0,
        row.get(11)?,
        ClockContext {
            quarter: row.get(12)?,
            time_remaining: row.get(13)?,
            shot_clock: None,
        },
    ))
}

fn turnover_from_row(row: &Row<'_>) -> rusqlite::Result<TurnoverEvent> {
    Ok(TurnoverEvent {
        id: row.get::<_, i64>(0)? as u64,
        player_id: row.get(1)?,
        game_id: row.get(2)?,
        play_type: PlayType::from_tag(&row.get::<_, String>(3)?),
        location: CourtPoint::new(row.get(4)?, row.get(5)?),
        turnover_type: row.get(6)?,
        forced_by: row.get(7)?,
        clock: ClockContext {
            quarter: row.get(8)?,
            time_remaining: row.get(9)?,
            shot_clock: None,
        },
    })
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_dataset_json;
    use crate::engine::compute_game_aggregate;

    const SAMPLE: &str = r#"{
        "teams": [{"team_id": 10, "name": "Harbor Hawks"}],
        "players": [
            {
                "player_id": 1, "name": "Ada", "team_id": 10, "position": "PG", "jersey_number": 3,
                "shots": [
                    {"id": 1, "game_id": 100, "action_type": "pickAndRoll", "points": 3, "shot_loc_x": 24.0, "shot_loc_y": 1.0, "quarter": 4, "time_remaining": 120.0},
                    {"id": 2, "game_id": 100, "action_type": "isolation", "points": 0, "shot_loc_x": 2.0, "shot_loc_y": 3.0},
                    {"id": 3, "game_id": 101, "action_type": "postUp", "points": 2, "shot_loc_x": 1.0, "shot_loc_y": 1.0}
                ],
                "passes": [
                    {"id": 1, "game_id": 100, "action_type": "pickAndRoll", "potential_assist": true, "receiver_id": 2}
                ],
                "turnovers": [
                    {"id": 1, "game_id": 101, "action_type": "isolation", "turnover_type": "travel"}
                ]
            },
            {"player_id": 2, "name": "Bo", "team_id": 11}
        ]
    }"#;

    fn seeded() -> SqliteRepository {
        let repo = SqliteRepository::in_memory().unwrap();
        let dataset = parse_dataset_json(SAMPLE).unwrap();
        repo.import_dataset(&dataset, "sample").unwrap();
        repo
    }

    #[test]
    fn import_round_trips_events_and_identities() {
        let repo = seeded();
        assert_eq!(repo.all_players().unwrap(), vec![1, 2]);

        let ada = repo.player_identity(1).unwrap();
        assert_eq!(ada.team_name, "Harbor Hawks");
        assert_eq!(ada.jersey_number, Some(3));
        let bo = repo.player_identity(2).unwrap();
        assert_eq!(bo.team_name, "Team 11");

        let all = repo.events_for(1, None).unwrap();
        assert_eq!(all.shots.len(), 3);
        assert_eq!(all.passes.len(), 1);
        assert!(all.passes[0].completed);
        assert_eq!(all.shots[0].clock.quarter, Some(4));

        let game = repo.events_for(1, Some(100)).unwrap();
        assert_eq!(game.shots.len(), 2);
        assert!(game.turnovers.is_empty());

        assert!(matches!(
            repo.player_identity(99),
            Err(StatsError::NotFound { .. })
        ));
        assert_eq!(repo.team_roster(10).unwrap(), vec![1]);
        assert_eq!(repo.player_game_pairs().unwrap(), vec![(1, 100), (1, 101)]);
    }

    #[test]
    fn reimport_does_not_duplicate_rows() {
        let repo = seeded();
        let dataset = parse_dataset_json(SAMPLE).unwrap();
        let summary = repo.import_dataset(&dataset, "sample").unwrap();
        assert_eq!(summary.shots_upserted, 3);
        assert_eq!(repo.events_for(1, None).unwrap().shots.len(), 3);
    }

    #[test]
    fn stored_aggregate_matches_recomputed_one() {
        let repo = seeded();
        let aggregate = compute_game_aggregate(&repo, 1, 100).unwrap();
        repo.upsert_game_aggregate(&aggregate).unwrap();
        repo.upsert_game_aggregate(&aggregate).unwrap();
        let loaded = repo.load_game_aggregate(1, 100).unwrap().unwrap();
        assert_eq!(loaded.total_shots, aggregate.total_shots);
        assert_eq!(loaded.total_points, 3);
        assert_eq!(loaded.pick_and_roll_count, aggregate.pick_and_roll_count);
        assert!((loaded.field_goal_percentage - aggregate.field_goal_percentage).abs() < 1e-9);
        assert_eq!(repo.load_game_aggregate(1, 999).unwrap(), None);
    }
}
