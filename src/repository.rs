use std::collections::BTreeMap;

use crate::error::{StatsError, StatsResult};
use crate::events::{
    EventSet, GameId, PassEvent, PlayerId, PlayerIdentity, ShotEvent, TeamId, TurnoverEvent,
};

/// Read-only access to raw play-by-play events and player identities.
///
/// Implementations return empty collections, never errors, when a player simply has no events.
pub trait EventRepository: Sync {
    fn events_for(&self, player_id: PlayerId, game_id: Option<GameId>) -> StatsResult<EventSet>;

    /// Every known player id, ascending.
    fn all_players(&self) -> StatsResult<Vec<PlayerId>>;

    fn player_identity(&self, player_id: PlayerId) -> StatsResult<PlayerIdentity>;

    fn team_roster(&self, team_id: TeamId) -> StatsResult<Vec<PlayerId>> {
        let mut out = Vec::new();
        for player_id in self.all_players()? {
            let identity = self.player_identity(player_id)?;
            if identity.team_id == team_id {
                out.push(player_id);
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    identities: BTreeMap<PlayerId, PlayerIdentity>,
    events: BTreeMap<PlayerId, EventSet>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, identity: PlayerIdentity) {
        self.events.entry(identity.player_id).or_default();
        self.identities.insert(identity.player_id, identity);
    }

    pub fn add_shot(&mut self, shot: ShotEvent) {
        self.events.entry(shot.player_id).or_default().shots.push(shot);
    }

    pub fn add_pass(&mut self, pass: PassEvent) {
        self.events.entry(pass.player_id).or_default().passes.push(pass);
    }

    pub fn add_turnover(&mut self, turnover: TurnoverEvent) {
        self.events
            .entry(turnover.player_id)
            .or_default()
            .turnovers
            .push(turnover);
    }
}

impl EventRepository for InMemoryRepository {
    fn events_for(&self, player_id: PlayerId, game_id: Option<GameId>) -> StatsResult<EventSet> {
        let Some(events) = self.events.get(&player_id) else {
            return Ok(EventSet::default());
        };
        Ok(match game_id {
            Some(game_id) => events.filter_game(game_id),
            None => events.clone(),
        })
    }

    fn all_players(&self) -> StatsResult<Vec<PlayerId>> {
        Ok(self.identities.keys().copied().collect())
    }

    fn player_identity(&self, player_id: PlayerId) -> StatsResult<PlayerIdentity> {
        self.identities
            .get(&player_id)
            .cloned()
            .ok_or_else(|| StatsError::player_not_found(player_id))
    }

    fn team_roster(&self, team_id: TeamId) -> StatsResult<Vec<PlayerId>> {
        Ok(self
            .identities
            .values()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.player_id)
            .collect())
    }
}
