use serde::Serialize;

use crate::events::{
    EventSet, GameId, PassEvent, PlayType, PlayerId, PlayerIdentity, ShotEvent, TeamId,
    TurnoverEvent,
};
use crate::game_stats::aggregate_game;
use crate::hot_zones::{HotZone, hot_zones};
use crate::ratio::{AssistTurnoverRatio, percentage, round_to};

/// Career-level view of one player across every game on record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCareerSummary {
    pub name: String,
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    pub team_name: String,
    #[serde(rename = "teamID")]
    pub team_id: TeamId,
    pub position: String,
    pub jersey_number: u32,

    pub total_shot_attempts: u32,
    pub total_points: u32,
    pub total_passes: u32,
    pub total_potential_assists: u32,
    pub total_turnovers: u32,
    pub total_passing_turnovers: u32,
    pub field_goal_percentage: f64,
    pub effective_field_goal_percentage: f64,
    pub pass_completion_rate: f64,

    pub pick_and_roll_count: u32,
    pub isolation_count: u32,
    pub post_up_count: u32,
    pub off_ball_screen_count: u32,

    pub pick_and_roll: PlayTypeBreakdown,
    pub isolation: PlayTypeBreakdown,
    pub post_up: PlayTypeBreakdown,
    pub off_ball_screen: PlayTypeBreakdown,

    pub advanced_metrics: AdvancedMetrics,
}

impl PlayerCareerSummary {
    pub fn breakdown(&self, play_type: PlayType) -> Option<&PlayTypeBreakdown> {
        match play_type {
            PlayType::PickAndRoll => Some(&self.pick_and_roll),
            PlayType::Isolation => Some(&self.isolation),
            PlayType::PostUp => Some(&self.post_up),
            PlayType::OffBallScreen => Some(&self.off_ball_screen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayTypeBreakdown {
    pub total_shot_attempts: u32,
    pub total_points: u32,
    pub total_passes: u32,
    pub total_potential_assists: u32,
    pub total_turnovers: u32,
    pub total_passing_turnovers: u32,
    pub field_goal_percentage: f64,
    pub assist_to_turnover_ratio: AssistTurnoverRatio,
    pub shots: Vec<ShotDetail>,
    pub passes: Vec<PassDetail>,
    pub turnovers: Vec<TurnoverDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotDetail {
    pub loc: [f64; 2],
    pub points: u8,
    pub shot_distance: f64,
    pub shot_angle: f64,
    pub foul_drawn: bool,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDetail {
    pub start_loc: [f64; 2],
    pub end_loc: [f64; 2],
    pub is_completed: bool,
    pub is_potential_assist: bool,
    pub is_turnover: bool,
    pub pass_distance: f64,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverDetail {
    pub loc: [f64; 2],
    pub turnover_type: String,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedMetrics {
    pub true_shooting_percentage: f64,
    pub player_efficiency_rating: f64,
    pub usage_rate: f64,
    pub points_per_shot: f64,
    pub assist_to_turnover_ratio: AssistTurnoverRatio,
    pub hot_zones: Vec<HotZone>,
    pub clutch_stats: ClutchStats,
}

/// Shooting and ball security in the last five minutes of the fourth quarter and overtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClutchStats {
    pub clutch_shot_attempts: u32,
    pub clutch_shooting_percentage: f64,
    pub clutch_assists: u32,
    pub clutch_turnovers: u32,
}

/// Build the summary from a player's full event history.
///
/// `team_possessions` is shots plus turnovers summed over every player on the same team,
/// this player included.
pub fn build_summary(
    identity: &PlayerIdentity,
    events: &EventSet,
    team_possessions: u32,
) -> PlayerCareerSummary {
    // Career totals share the per-game reduction, just over every game at once.
    let totals = aggregate_game(identity.player_id, 0, events, team_possessions);

    PlayerCareerSummary {
        name: identity.name.clone(),
        player_id: identity.player_id,
        team_name: identity.team_name.clone(),
        team_id: identity.team_id,
        position: identity
            .position
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "N/A".to_string()),
        jersey_number: identity.jersey_number.unwrap_or(0),
        total_shot_attempts: totals.total_shots,
        total_points: totals.total_points,
        total_passes: totals.total_passes,
        total_potential_assists: totals.potential_assists,
        total_turnovers: totals.total_turnovers,
        total_passing_turnovers: totals.passing_turnovers,
        field_goal_percentage: round_to(totals.field_goal_percentage, 1),
        effective_field_goal_percentage: round_to(totals.effective_field_goal_percentage, 1),
        pass_completion_rate: round_to(totals.pass_completion_rate, 1),
        pick_and_roll_count: totals.pick_and_roll_count,
        isolation_count: totals.isolation_count,
        post_up_count: totals.post_up_count,
        off_ball_screen_count: totals.off_ball_screen_count,
        pick_and_roll: build_breakdown(&events.filter_play_type(PlayType::PickAndRoll)),
        isolation: build_breakdown(&events.filter_play_type(PlayType::Isolation)),
        post_up: build_breakdown(&events.filter_play_type(PlayType::PostUp)),
        off_ball_screen: build_breakdown(&events.filter_play_type(PlayType::OffBallScreen)),
        advanced_metrics: advanced_metrics(events, team_possessions),
    }
}

pub fn build_breakdown(events: &EventSet) -> PlayTypeBreakdown {
    let attempts = events.shots.len() as u32;
    let made = events.shots.iter().filter(|s| s.points > 0).count() as u32;
    let assists = events.passes.iter().filter(|p| p.potential_assist).count() as u32;
    let turnovers = events.turnovers.len() as u32;

    PlayTypeBreakdown {
        total_shot_attempts: attempts,
        total_points: events.shots.iter().map(|s| s.points as u32).sum(),
        total_passes: events.passes.len() as u32,
        total_potential_assists: assists,
        total_turnovers: turnovers,
        total_passing_turnovers: events.passes.iter().filter(|p| p.turnover).count() as u32,
        field_goal_percentage: round_to(percentage(made as f64, attempts as f64), 1),
        assist_to_turnover_ratio: AssistTurnoverRatio::from_counts(assists, turnovers),
        shots: events.shots.iter().map(shot_detail).collect(),
        passes: events.passes.iter().map(pass_detail).collect(),
        turnovers: events.turnovers.iter().map(turnover_detail).collect(),
    }
}

pub fn advanced_metrics(events: &EventSet, team_possessions: u32) -> AdvancedMetrics {
    let total_shots = events.shots.len() as u32;
    let shots_made = events.shots.iter().filter(|s| s.points > 0).count() as u32;
    let total_points: u32 = events.shots.iter().map(|s| s.points as u32).sum();
    let assists = events.passes.iter().filter(|p| p.potential_assist).count() as u32;
    let turnovers = events.turnovers.len() as u32;
    let missed = total_shots - shots_made;

    let efficiency = (total_points as f64 + 2.0 * assists as f64 - missed as f64 - turnovers as f64)
        / total_shots.max(1) as f64;
    let points_per_shot = if total_shots > 0 {
        round_to(total_points as f64 / total_shots as f64, 2)
    } else {
        0.0
    };

    AdvancedMetrics {
        true_shooting_percentage: round_to(
            percentage(total_points as f64, 2.0 * total_shots as f64),
            1,
        ),
        player_efficiency_rating: round_to(efficiency, 1),
        usage_rate: round_to(
            percentage(events.possessions() as f64, team_possessions as f64),
            1,
        ),
        points_per_shot,
        assist_to_turnover_ratio: AssistTurnoverRatio::from_counts(assists, turnovers),
        hot_zones: hot_zones(&events.shots),
        clutch_stats: clutch_stats(events),
    }
}

pub fn clutch_stats(events: &EventSet) -> ClutchStats {
    let clutch_shots: Vec<&ShotEvent> = events.shots.iter().filter(|s| s.clock.is_clutch()).collect();
    let made = clutch_shots.iter().filter(|s| s.points > 0).count();
    ClutchStats {
        clutch_shot_attempts: clutch_shots.len() as u32,
        clutch_shooting_percentage: round_to(
            percentage(made as f64, clutch_shots.len() as f64),
            1,
        ),
        clutch_assists: events
            .passes
            .iter()
            .filter(|p| p.potential_assist && p.clock.is_clutch())
            .count() as u32,
        clutch_turnovers: events.turnovers.iter().filter(|t| t.clock.is_clutch()).count() as u32,
    }
}

fn shot_detail(shot: &ShotEvent) -> ShotDetail {
    ShotDetail {
        loc: [round_to(shot.location.x, 2), round_to(shot.location.y, 2)],
        points: shot.points,
        shot_distance: round_to(shot.shot_distance, 2),
        shot_angle: round_to(shot.shot_angle, 1),
        foul_drawn: shot.foul_drawn,
        game_id: shot.game_id,
    }
}

fn pass_detail(pass: &PassEvent) -> PassDetail {
    PassDetail {
        start_loc: [round_to(pass.start.x, 2), round_to(pass.start.y, 2)],
        end_loc: [round_to(pass.end.x, 2), round_to(pass.end.y, 2)],
        is_completed: pass.completed,
        is_potential_assist: pass.potential_assist,
        is_turnover: pass.turnover,
        pass_distance: round_to(pass.pass_distance, 2),
        game_id: pass.game_id,
    }
}

fn turnover_detail(turnover: &TurnoverEvent) -> TurnoverDetail {
    TurnoverDetail {
        loc: [round_to(turnover.location.x, 2), round_to(turnover.location.y, 2)],
        turnover_type: turnover
            .turnover_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        game_id: turnover.game_id,
    }
}
