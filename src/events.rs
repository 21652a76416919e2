use serde::{Deserialize, Serialize};

pub type PlayerId = u32;
pub type GameId = u32;
pub type TeamId = u32;

/// Seconds left in the fourth quarter (or any overtime) that count as clutch time.
pub const CLUTCH_SECONDS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayType {
    PickAndRoll,
    Isolation,
    PostUp,
    OffBallScreen,
    Transition,
    Putback,
    SpotUp,
    #[serde(other)]
    Unknown,
}

/// Play types that get their own count and breakdown in aggregates.
pub const TRACKED_PLAY_TYPES: [PlayType; 4] = [
    PlayType::PickAndRoll,
    PlayType::Isolation,
    PlayType::PostUp,
    PlayType::OffBallScreen,
];

impl PlayType {
    pub fn from_tag(raw: &str) -> Self {
        match raw.trim() {
            "pickAndRoll" => PlayType::PickAndRoll,
            "isolation" => PlayType::Isolation,
            "postUp" => PlayType::PostUp,
            "offBallScreen" => PlayType::OffBallScreen,
            "transition" => PlayType::Transition,
            "putback" => PlayType::Putback,
            "spotUp" => PlayType::SpotUp,
            _ => PlayType::Unknown,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            PlayType::PickAndRoll => "pickAndRoll",
            PlayType::Isolation => "isolation",
            PlayType::PostUp => "postUp",
            PlayType::OffBallScreen => "offBallScreen",
            PlayType::Transition => "transition",
            PlayType::Putback => "putback",
            PlayType::SpotUp => "spotUp",
            PlayType::Unknown => "unknown",
        }
    }
}

/// Court coordinates in feet, origin at the basket center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CourtPoint {
    pub x: f64,
    pub y: f64,
}

impl CourtPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: CourtPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn distance_from_basket(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn angle_degrees(self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClockContext {
    pub quarter: Option<u8>,
    pub time_remaining: Option<f64>,
    pub shot_clock: Option<f64>,
}

impl ClockContext {
    pub fn is_clutch(&self) -> bool {
        match (self.quarter, self.time_remaining) {
            (Some(q), Some(t)) => q >= 4 && t <= CLUTCH_SECONDS,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotEvent {
    pub id: u64,
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub play_type: PlayType,
    pub points: u8,
    pub location: CourtPoint,
    pub shot_made: bool,
    pub shot_distance: f64,
    pub shot_angle: f64,
    pub foul_drawn: bool,
    pub clock: ClockContext,
}

impl ShotEvent {
    /// Derived fields (made flag, distance, angle) are computed here and never stored independently.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        player_id: PlayerId,
        game_id: GameId,
        play_type: PlayType,
        points: u8,
        location: CourtPoint,
        foul_drawn: bool,
        clock: ClockContext,
    ) -> Self {
        Self {
            id,
            player_id,
            game_id,
            play_type,
            points,
            location,
            shot_made: points > 0,
            shot_distance: location.distance_from_basket(),
            shot_angle: location.angle_degrees(),
            foul_drawn,
            clock,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassEvent {
    pub id: u64,
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub play_type: PlayType,
    pub start: CourtPoint,
    pub end: CourtPoint,
    pub completed: bool,
    pub potential_assist: bool,
    pub turnover: bool,
    pub receiver_id: Option<PlayerId>,
    pub pass_distance: f64,
    pub clock: ClockContext,
}

impl PassEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        player_id: PlayerId,
        game_id: GameId,
        play_type: PlayType,
        start: CourtPoint,
        end: CourtPoint,
        completed: bool,
        potential_assist: bool,
        turnover: bool,
        receiver_id: Option<PlayerId>,
        clock: ClockContext,
    ) -> Self {
        Self {
            id,
            player_id,
            game_id,
            play_type,
            start,
            end,
            completed,
            potential_assist,
            turnover,
            receiver_id,
            pass_distance: start.distance_to(end),
            clock,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnoverEvent {
    pub id: u64,
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub play_type: PlayType,
    pub location: CourtPoint,
    pub turnover_type: Option<String>,
    pub forced_by: Option<PlayerId>,
    pub clock: ClockContext,
}

/// Shots, passes and turnovers for one player, optionally narrowed to one game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    pub shots: Vec<ShotEvent>,
    pub passes: Vec<PassEvent>,
    pub turnovers: Vec<TurnoverEvent>,
}

impl EventSet {
    pub fn is_empty(&self) -> bool {
        self.shots.is_empty() && self.passes.is_empty() && self.turnovers.is_empty()
    }

    pub fn filter_play_type(&self, play_type: PlayType) -> EventSet {
        EventSet {
            shots: self
                .shots
                .iter()
                .filter(|s| s.play_type == play_type)
                .cloned()
                .collect(),
            passes: self
                .passes
                .iter()
                .filter(|p| p.play_type == play_type)
                .cloned()
                .collect(),
            turnovers: self
                .turnovers
                .iter()
                .filter(|t| t.play_type == play_type)
                .cloned()
                .collect(),
        }
    }

    pub fn filter_game(&self, game_id: GameId) -> EventSet {
        EventSet {
            shots: self.shots.iter().filter(|s| s.game_id == game_id).cloned().collect(),
            passes: self.passes.iter().filter(|p| p.game_id == game_id).cloned().collect(),
            turnovers: self
                .turnovers
                .iter()
                .filter(|t| t.game_id == game_id)
                .cloned()
                .collect(),
        }
    }

    /// Possessions ended by this player: shot attempts plus turnovers.
    pub fn possessions(&self) -> u32 {
        (self.shots.len() + self.turnovers.len()) as u32
    }

    /// Shots and passes tagged with the play type; turnovers are not part of the tally.
    pub fn play_type_count(&self, play_type: PlayType) -> u32 {
        let shots = self.shots.iter().filter(|s| s.play_type == play_type).count();
        let passes = self.passes.iter().filter(|p| p.play_type == play_type).count();
        (shots + passes) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub player_id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
    pub team_name: String,
    pub position: Option<String>,
    pub jersey_number: Option<u32>,
}
