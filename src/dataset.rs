use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::events::{
    ClockContext, CourtPoint, PassEvent, PlayType, PlayerIdentity, ShotEvent, TeamId,
    TurnoverEvent,
};
use crate::repository::InMemoryRepository;

/// Raw play-by-play export: teams plus players with their nested events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub teams: Vec<RawTeam>,
    #[serde(default)]
    pub players: Vec<RawPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTeam {
    pub team_id: TeamId,
    pub name: String,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlayer {
    pub player_id: u32,
    pub name: String,
    pub team_id: TeamId,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub shots: Vec<RawShot>,
    #[serde(default)]
    pub passes: Vec<RawPass>,
    #[serde(default)]
    pub turnovers: Vec<RawTurnover>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShot {
    pub id: u64,
    pub game_id: u32,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub points: u8,
    #[serde(default)]
    pub shot_loc_x: f64,
    #[serde(default)]
    pub shot_loc_y: f64,
    #[serde(default)]
    pub shooting_foul_drawn: bool,
    #[serde(default)]
    pub quarter: Option<u8>,
    #[serde(default)]
    pub time_remaining: Option<f64>,
    #[serde(default)]
    pub shot_clock: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPass {
    pub id: u64,
    pub game_id: u32,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub ball_start_loc_x: f64,
    #[serde(default)]
    pub ball_start_loc_y: f64,
    #[serde(default)]
    pub ball_end_loc_x: f64,
    #[serde(default)]
    pub ball_end_loc_y: f64,
    #[serde(default = "default_true")]
    pub completed_pass: bool,
    #[serde(default)]
    pub potential_assist: bool,
    #[serde(default)]
    pub turnover: bool,
    #[serde(default)]
    pub receiver_id: Option<u32>,
    #[serde(default)]
    pub quarter: Option<u8>,
    #[serde(default)]
    pub time_remaining: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTurnover {
    pub id: u64,
    pub game_id: u32,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub tov_loc_x: f64,
    #[serde(default)]
    pub tov_loc_y: f64,
    #[serde(default)]
    pub turnover_type: Option<String>,
    #[serde(default)]
    pub forced_by: Option<u32>,
    #[serde(default)]
    pub quarter: Option<u8>,
    #[serde(default)]
    pub time_remaining: Option<f64>,
}

fn default_true() -> bool {
    true
}

pub fn parse_dataset_json(raw: &str) -> Result<Dataset> {
    serde_json::from_str(raw).context("parse dataset json")
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read dataset {}", path.display()))?;
    parse_dataset_json(&raw).with_context(|| format!("decode dataset {}", path.display()))
}

fn play_type(raw: &Option<String>) -> PlayType {
    raw.as_deref().map(PlayType::from_tag).unwrap_or(PlayType::Unknown)
}

impl Dataset {
    /// Players whose team is not listed get a generated `Team <id>` name.
    pub fn team_name(&self, team_id: TeamId) -> String {
        self.teams
            .iter()
            .find(|t| t.team_id == team_id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("Team {team_id}"))
    }

    pub fn identities(&self) -> Vec<PlayerIdentity> {
        self.players
            .iter()
            .map(|p| PlayerIdentity {
                player_id: p.player_id,
                name: p.name.clone(),
                team_id: p.team_id,
                team_name: self.team_name(p.team_id),
                position: p.position.clone(),
                jersey_number: p.jersey_number,
            })
            .collect()
    }

    pub fn into_repository(self) -> InMemoryRepository {
        let mut repo = InMemoryRepository::new();
        for identity in self.identities() {
            repo.add_player(identity);
        }
        for player in &self.players {
            for shot in &player.shots {
                repo.add_shot(shot.to_event(player.player_id));
            }
            for pass in &player.passes {
                repo.add_pass(pass.to_event(player.player_id));
            }
            for turnover in &player.turnovers {
                repo.add_turnover(turnover.to_event(player.player_id));
            }
        }
        repo
    }
}

impl RawShot {
    pub fn to_event(&self, player_id: u32) -> ShotEvent {
        ShotEvent::new(
            self.id,
            player_id,
            self.game_id,
            play_type(&self.action_type),
            self.points,
            CourtPoint::new(self.shot_loc_x, self.shot_loc_y),
            self.shooting_foul_drawn,
            ClockContext {
                quarter: self.quarter,
                time_remaining: self.time_remaining,
                shot_clock: self.shot_clock,
            },
        )
    }
}

impl RawPass {
    pub fn to_event(&self, player_id: u32) -> PassEvent {
        PassEvent::new(
            self.id,
            player_id,
            self.game_id,
            play_type(&self.action_type),
            CourtPoint::new(self.ball_start_loc_x, self.ball_start_loc_y),
            CourtPoint::new(self.ball_end_loc_x, self.ball_end_loc_y),
            self.completed_pass,
            self.potential_assist,
            self.turnover,
            self.receiver_id,
            ClockContext {
                quarter: self.quarter,
                time_remaining: self.time_remaining,
                shot_clock: None,
            },
        )
    }
}

impl RawTurnover {
    pub fn to_event(&self, player_id: u32) -> TurnoverEvent {
        TurnoverEvent {
            id: self.id,
            player_id,
            game_id: self.game_id,
            play_type: play_type(&self.action_type),
            location: CourtPoint::new(self.tov_loc_x, self.tov_loc_y),
            turnover_type: self.turnover_type.clone(),
            forced_by: self.forced_by,
            clock: ClockContext {
                quarter: self.quarter,
                time_remaining: self.time_remaining,
                shot_clock: None,
            },
        }
    }
}
