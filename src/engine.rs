use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use once_cell::sync::OnceCell;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::comparison::{self, PlayerComparison};
use crate::config::StatsConfig;
use crate::error::StatsResult;
use crate::events::{EventSet, GameId, PlayerId, PlayerIdentity, TeamId};
use crate::game_stats::{PlayerGameAggregate, aggregate_game};
use crate::ranking::{self, LeagueSnapshot, RankReport};
use crate::repository::EventRepository;
use crate::summary::{PlayerCareerSummary, build_summary};

/// Entry point for callers: wires a repository to the aggregation, summary, ranking
/// and comparison steps. Holds no state between calls apart from a lazily built worker pool.
pub struct StatsEngine<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
    parallelism: usize,
    pool: OnceCell<Option<rayon::ThreadPool>>,
}

impl<'a, R: EventRepository + ?Sized> StatsEngine<'a, R> {
    pub fn new(repo: &'a R, config: &StatsConfig) -> Self {
        Self {
            repo,
            parallelism: config.parallelism.max(1),
            pool: OnceCell::new(),
        }
    }

    pub fn compute_game_aggregate(
        &self,
        player_id: PlayerId,
        game_id: GameId,
    ) -> StatsResult<PlayerGameAggregate> {
        compute_game_aggregate(self.repo, player_id, game_id)
    }

    pub fn build_player_summary(&self, player_id: PlayerId) -> StatsResult<PlayerCareerSummary> {
        build_player_summary(self.repo, player_id)
    }

    pub fn build_snapshot(&self) -> StatsResult<LeagueSnapshot> {
        self.install(|| LeagueSnapshot::build(self.repo))
    }

    pub fn rank_player(
        &self,
        player_id: PlayerId,
        snapshot: &LeagueSnapshot,
    ) -> StatsResult<RankReport> {
        ranking::rank_player(player_id, snapshot)
    }

    /// Build a fresh snapshot and rank one player against it.
    pub fn rank_player_in_league(&self, player_id: PlayerId) -> StatsResult<RankReport> {
        let snapshot = self.build_snapshot()?;
        ranking::rank_player(player_id, &snapshot)
    }

    pub fn compare_players<S: AsRef<str> + Sync>(
        &self,
        player_ids: &[S],
    ) -> StatsResult<PlayerComparison> {
        self.install(|| comparison::compare_players(self.repo, player_ids))
    }

    /// Recompute the aggregate of every (player, game) pair with any recorded activity.
    pub fn recompute_game_aggregates(&self) -> StatsResult<Vec<PlayerGameAggregate>> {
        self.install(|| recompute_all(self.repo))
    }

    fn install<T: Send>(&self, action: impl FnOnce() -> T + Send) -> T {
        let pool = self.pool.get_or_init(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.parallelism)
                .build()
                .ok()
        });
        match pool {
            Some(pool) => pool.install(action),
            None => action(),
        }
    }
}

pub fn compute_game_aggregate<R: EventRepository + ?Sized>(
    repo: &R,
    player_id: PlayerId,
    game_id: GameId,
) -> StatsResult<PlayerGameAggregate> {
    let identity = repo.player_identity(player_id)?;
    let events = repo.events_for(player_id, Some(game_id))?;
    let team_possessions = team_possessions(repo, identity.team_id, Some(game_id))?;
    debug!(
        player_id,
        game_id,
        shots = events.shots.len(),
        passes = events.passes.len(),
        turnovers = events.turnovers.len(),
        "aggregating game"
    );
    Ok(aggregate_game(player_id, game_id, &events, team_possessions))
}

/// Fails with `NotFound` when the player has no identity record; no placeholder data is substituted.
pub fn build_player_summary<R: EventRepository + ?Sized>(
    repo: &R,
    player_id: PlayerId,
) -> StatsResult<PlayerCareerSummary> {
    let identity = repo.player_identity(player_id)?;
    let events = repo.events_for(player_id, None)?;
    let team_possessions = team_possessions(repo, identity.team_id, None)?;
    Ok(build_summary(&identity, &events, team_possessions))
}

/// Shots plus turnovers of every rostered player, optionally within one game.
pub fn team_possessions<R: EventRepository + ?Sized>(
    repo: &R,
    team_id: TeamId,
    game_id: Option<GameId>,
) -> StatsResult<u32> {
    let mut total = 0u32;
    for member in repo.team_roster(team_id)? {
        total += repo.events_for(member, game_id)?.possessions();
    }
    Ok(total)
}

fn recompute_all<R: EventRepository + ?Sized>(repo: &R) -> StatsResult<Vec<PlayerGameAggregate>> {
    let started = Instant::now();
    let players = repo.all_players()?;
    let loaded: Vec<(PlayerIdentity, EventSet)> = players
        .par_iter()
        .map(|player_id| Ok((repo.player_identity(*player_id)?, repo.events_for(*player_id, None)?)))
        .collect::<StatsResult<Vec<_>>>()?;

    let mut team_game_possessions: HashMap<(TeamId, GameId), u32> = HashMap::new();
    for (identity, events) in &loaded {
        for shot in &events.shots {
            *team_game_possessions
                .entry((identity.team_id, shot.game_id))
                .or_insert(0) += 1;
        }
        for turnover in &events.turnovers {
            *team_game_possessions
                .entry((identity.team_id, turnover.game_id))
                .or_insert(0) += 1;
        }
    }

    let mut aggregates: Vec<PlayerGameAggregate> = loaded
        .par_iter()
        .flat_map_iter(|(identity, events)| {
            let games = games_played(events);
            let possessions = &team_game_possessions;
            games.into_iter().map(move |game_id| {
                let scoped = events.filter_game(game_id);
                let team = possessions
                    .get(&(identity.team_id, game_id))
                    .copied()
                    .unwrap_or(0);
                aggregate_game(identity.player_id, game_id, &scoped, team)
            })
        })
        .collect();
    aggregates.sort_by_key(|a| (a.player_id, a.game_id));

    info!(
        players = loaded.len(),
        aggregates = aggregates.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "recomputed game aggregates"
    );
    Ok(aggregates)
}

/// Every game in which the player has a shot, pass or turnover, ascending.
pub fn games_played(events: &EventSet) -> BTreeSet<GameId> {
    events
        .shots
        .iter()
        .map(|s| s.game_id)
        .chain(events.passes.iter().map(|p| p.game_id))
        .chain(events.turnovers.iter().map(|t| t.game_id))
        .collect()
}
