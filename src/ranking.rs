use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::{debug, info};

use crate::error::{StatsError, StatsResult};
use crate::events::{EventSet, PlayType, PlayerId};
use crate::repository::EventRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKey {
    TotalShotAttempts,
    TotalPoints,
    TotalPasses,
    TotalPotentialAssists,
    TotalTurnovers,
    TotalPassingTurnovers,
    PickAndRollCount,
    IsolationCount,
    PostUpCount,
    OffBallScreenCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

pub const STAT_COUNT: usize = 10;

pub const STAT_KEYS: [StatKey; STAT_COUNT] = [
    StatKey::TotalShotAttempts,
    StatKey::TotalPoints,
    StatKey::TotalPasses,
    StatKey::TotalPotentialAssists,
    StatKey::TotalTurnovers,
    StatKey::TotalPassingTurnovers,
    StatKey::PickAndRollCount,
    StatKey::IsolationCount,
    StatKey::PostUpCount,
    StatKey::OffBallScreenCount,
];

impl StatKey {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn direction(self) -> Direction {
        match self {
            StatKey::TotalTurnovers | StatKey::TotalPassingTurnovers => Direction::LowerBetter,
            _ => Direction::HigherBetter,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            StatKey::TotalShotAttempts => "totalShotAttempts",
            StatKey::TotalPoints => "totalPoints",
            StatKey::TotalPasses => "totalPasses",
            StatKey::TotalPotentialAssists => "totalPotentialAssists",
            StatKey::TotalTurnovers => "totalTurnovers",
            StatKey::TotalPassingTurnovers => "totalPassingTurnovers",
            StatKey::PickAndRollCount => "pickAndRollCount",
            StatKey::IsolationCount => "isolationCount",
            StatKey::PostUpCount => "postUpCount",
            StatKey::OffBallScreenCount => "offBallScreenCount",
        }
    }
}

/// One player's career counting stats, indexed by `StatKey::index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatLine {
    pub player_id: PlayerId,
    pub values: [u32; STAT_COUNT],
}

impl StatLine {
    pub fn from_events(player_id: PlayerId, events: &EventSet) -> Self {
        let mut values = [0u32; STAT_COUNT];
        values[StatKey::TotalShotAttempts.index()] = events.shots.len() as u32;
        values[StatKey::TotalPoints.index()] = events.shots.iter().map(|s| s.points as u32).sum();
        values[StatKey::TotalPasses.index()] = events.passes.len() as u32;
        values[StatKey::TotalPotentialAssists.index()] =
            events.passes.iter().filter(|p| p.potential_assist).count() as u32;
        values[StatKey::TotalTurnovers.index()] = events.turnovers.len() as u32;
        values[StatKey::TotalPassingTurnovers.index()] =
            events.passes.iter().filter(|p| p.turnover).count() as u32;
        values[StatKey::PickAndRollCount.index()] = events.play_type_count(PlayType::PickAndRoll);
        values[StatKey::IsolationCount.index()] = events.play_type_count(PlayType::Isolation);
        values[StatKey::PostUpCount.index()] = events.play_type_count(PlayType::PostUp);
        values[StatKey::OffBallScreenCount.index()] =
            events.play_type_count(PlayType::OffBallScreen);
        Self { player_id, values }
    }

    pub fn get(&self, stat: StatKey) -> u32 {
        self.values[stat.index()]
    }
}

/// Stat lines for the whole population at one point in time. Built per request, never cached.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    lines: Vec<StatLine>,
}

impl LeagueSnapshot {
    /// Lines keep the order given; a repeated player id keeps its first line.
    pub fn from_lines(lines: Vec<StatLine>) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(lines.len());
        let lines = lines
            .into_iter()
            .filter(|line| seen.insert(line.player_id))
            .collect();
        Self { lines }
    }

    /// Materialize every player's line. Per-player reads run on the current rayon pool.
    pub fn build<R: EventRepository + ?Sized>(repo: &R) -> StatsResult<Self> {
        let started = Instant::now();
        let players = repo.all_players()?;
        let lines = players
            .par_iter()
            .map(|player_id| {
                let events = repo.events_for(*player_id, None)?;
                Ok(StatLine::from_events(*player_id, &events))
            })
            .collect::<StatsResult<Vec<_>>>()?;
        info!(
            population = lines.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "league snapshot built"
        );
        Ok(Self::from_lines(lines))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[StatLine] {
        &self.lines
    }

    pub fn line_for(&self, player_id: PlayerId) -> Option<&StatLine> {
        self.lines.iter().find(|line| line.player_id == player_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatRank {
    pub stat: StatKey,
    /// 1 is best, `population` is worst.
    pub rank: usize,
    /// Share of the population the player matches or beats, 0 to 100; `None` when unranked.
    pub percentile: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankReport {
    pub player_id: PlayerId,
    pub population: usize,
    /// False when the player has no line in the snapshot and every rank defaulted to last.
    pub ranked: bool,
    pub stats: Vec<StatRank>,
}

impl RankReport {
    pub fn get(&self, stat: StatKey) -> Option<&StatRank> {
        self.stats.iter().find(|s| s.stat == stat)
    }

    pub fn rank(&self, stat: StatKey) -> Option<usize> {
        self.get(stat).map(|s| s.rank)
    }

    pub fn percentile(&self, stat: StatKey) -> Option<f64> {
        self.get(stat).and_then(|s| s.percentile)
    }
}

// Flat `<stat>Rank` keys plus a nested `percentileRanks` map of `<stat>Percentile`.
impl Serialize for RankReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("playerID", &self.player_id)?;
        map.serialize_entry("populationSize", &self.population)?;
        map.serialize_entry("ranked", &self.ranked)?;
        for entry in &self.stats {
            map.serialize_entry(&format!("{}Rank", entry.stat.wire_name()), &entry.rank)?;
        }
        let percentiles: Vec<(String, f64)> = self
            .stats
            .iter()
            .filter_map(|e| {
                e.percentile
                    .map(|p| (format!("{}Percentile", e.stat.wire_name()), p))
            })
            .collect();
        map.serialize_entry("percentileRanks", &PercentileMap(&percentiles))?;
        map.end()
    }
}

struct PercentileMap<'a>(&'a [(String, f64)]);

impl Serialize for PercentileMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Rank one player against the snapshot on every statistic.
///
/// Ties are broken by player id ascending, so ranks over a population form a permutation of 1..=N.
/// A player missing from the snapshot is placed last on every statistic.
pub fn rank_player(player_id: PlayerId, snapshot: &LeagueSnapshot) -> StatsResult<RankReport> {
    if snapshot.is_empty() {
        return Err(StatsError::EmptyPopulation);
    }
    let population = snapshot.len();
    let Some(target) = snapshot.line_for(player_id) else {
        debug!(player_id, population, "player absent from snapshot, ranking last");
        return Ok(RankReport {
            player_id,
            population,
            ranked: false,
            stats: STAT_KEYS
                .iter()
                .map(|stat| StatRank {
                    stat: *stat,
                    rank: population,
                    percentile: None,
                })
                .collect(),
        });
    };

    let stats = STAT_KEYS
        .iter()
        .map(|stat| StatRank {
            stat: *stat,
            rank: ordinal_rank(target, *stat, snapshot.lines()),
            percentile: Some(percentile_rank(target.get(*stat), *stat, snapshot.lines())),
        })
        .collect();

    Ok(RankReport {
        player_id,
        population,
        ranked: true,
        stats,
    })
}

/// Ordering of two lines on one statistic, best first.
pub fn compare_lines(a: &StatLine, b: &StatLine, stat: StatKey) -> Ordering {
    let by_value = match stat.direction() {
        Direction::HigherBetter => b.get(stat).cmp(&a.get(stat)),
        Direction::LowerBetter => a.get(stat).cmp(&b.get(stat)),
    };
    by_value.then(a.player_id.cmp(&b.player_id))
}

fn ordinal_rank(target: &StatLine, stat: StatKey, lines: &[StatLine]) -> usize {
    let ahead = lines
        .iter()
        .filter(|other| compare_lines(other, target, stat) == Ordering::Less)
        .count();
    ahead + 1
}

/// Higher-better: share of the population at or below the value.
/// Lower-better: share at or above it (100 minus the share strictly below).
pub fn percentile_rank(value: u32, stat: StatKey, lines: &[StatLine]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let n = lines.len() as f64;
    let pct = match stat.direction() {
        Direction::HigherBetter => {
            let at_or_below = lines.iter().filter(|l| l.get(stat) <= value).count();
            at_or_below as f64 / n * 100.0
        }
        Direction::LowerBetter => {
            let below = lines.iter().filter(|l| l.get(stat) < value).count();
            100.0 - below as f64 / n * 100.0
        }
    };
    crate::ratio::round_to(pct, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(player_id: PlayerId, points: u32, turnovers: u32) -> StatLine {
        let mut values = [0u32; STAT_COUNT];
        values[StatKey::TotalPoints.index()] = points;
        values[StatKey::TotalTurnovers.index()] = turnovers;
        StatLine { player_id, values }
    }

    #[test]
    fn empty_snapshot_is_unavailable() {
        let err = rank_player(1, &LeagueSnapshot::default()).unwrap_err();
        assert!(matches!(err, StatsError::EmptyPopulation));
    }

    #[test]
    fn best_value_ranks_first_in_each_direction() {
        let snapshot = LeagueSnapshot::from_lines(vec![
            line(1, 10, 5),
            line(2, 30, 1),
            line(3, 20, 3),
        ]);
        let top = rank_player(2, &snapshot).unwrap();
        assert_eq!(top.rank(StatKey::TotalPoints), Some(1));
        assert_eq!(top.rank(StatKey::TotalTurnovers), Some(1));
        assert_eq!(top.percentile(StatKey::TotalPoints), Some(100.0));
        assert_eq!(top.percentile(StatKey::TotalTurnovers), Some(100.0));

        let bottom = rank_player(1, &snapshot).unwrap();
        assert_eq!(bottom.rank(StatKey::TotalPoints), Some(3));
        assert_eq!(bottom.rank(StatKey::TotalTurnovers), Some(3));
        assert_eq!(bottom.percentile(StatKey::TotalPoints), Some(33.3));
        assert_eq!(bottom.percentile(StatKey::TotalTurnovers), Some(33.3));
    }

    #[test]
    fn ties_break_by_player_id() {
        let snapshot = LeagueSnapshot::from_lines(vec![line(9, 10, 0), line(4, 10, 0), line(6, 10, 0)]);
        assert_eq!(rank_player(4, &snapshot).unwrap().rank(StatKey::TotalPoints), Some(1));
        assert_eq!(rank_player(6, &snapshot).unwrap().rank(StatKey::TotalPoints), Some(2));
        assert_eq!(rank_player(9, &snapshot).unwrap().rank(StatKey::TotalPoints), Some(3));
        // Everyone shares the value, so everyone is at the 100th percentile.
        assert_eq!(rank_player(9, &snapshot).unwrap().percentile(StatKey::TotalPoints), Some(100.0));
    }

    #[test]
    fn absent_player_ranks_last_without_percentiles() {
        let snapshot = LeagueSnapshot::from_lines(vec![line(1, 5, 1), line(2, 7, 2)]);
        let report = rank_player(42, &snapshot).unwrap();
        assert!(!report.ranked);
        assert_eq!(report.stats.len(), STAT_KEYS.len());
        assert!(report.stats.iter().all(|s| s.rank == 2 && s.percentile.is_none()));
    }

    #[test]
    fn duplicate_lines_keep_the_first() {
        let snapshot = LeagueSnapshot::from_lines(vec![line(1, 5, 1), line(1, 50, 1), line(2, 7, 2)]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.line_for(1).unwrap().get(StatKey::TotalPoints), 5);
    }

    #[test]
    fn report_serializes_flat_ranks_and_nested_percentiles() {
        let snapshot = LeagueSnapshot::from_lines(vec![line(1, 5, 1), line(2, 7, 2)]);
        let json = serde_json::to_value(rank_player(2, &snapshot).unwrap()).unwrap();
        assert_eq!(json["playerID"], 2);
        assert_eq!(json["populationSize"], 2);
        assert_eq!(json["ranked"], true);
        assert_eq!(json["totalPointsRank"], 1);
        assert_eq!(json["totalTurnoversRank"], 2);
        assert_eq!(json["percentileRanks"]["totalPointsPercentile"], 100.0);
        assert_eq!(json["percentileRanks"]["totalTurnoversPercentile"], 50.0);
    }
}
