use serde::{Deserialize, Serialize};

use crate::events::{EventSet, GameId, PlayType, PlayerId, ShotEvent};
use crate::ratio::percentage;

/// Distance (feet) at or beyond which a missed shot is treated as a three-point attempt.
pub const THREE_POINT_DISTANCE: f64 = 23.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotTier {
    Two,
    Three,
}

impl ShotTier {
    /// Events carry no explicit attempt-type tag, so the tier is inferred.
    ///
    /// A make is tiered by its scored value: 1 or 2 is a two, 3 or more a three
    /// (a 4 is a made three plus the and-one). Only misses fall back to the distance
    /// threshold, so a missed long two or a short three is misfiled; that is a known approximation.
    pub fn classify(shot: &ShotEvent) -> Self {
        match shot.points {
            0 if shot.shot_distance >= THREE_POINT_DISTANCE => ShotTier::Three,
            0 => ShotTier::Two,
            1 | 2 => ShotTier::Two,
            _ => ShotTier::Three,
        }
    }
}

/// Per (player, game) statistics. Recomputed from scratch on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerGameAggregate {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "gameID")]
    pub game_id: GameId,

    pub total_shots: u32,
    pub shots_made: u32,
    pub total_points: u32,
    pub field_goal_percentage: f64,
    pub three_pointers_made: u32,
    pub three_pointers_attempted: u32,
    pub two_pointers_made: u32,
    pub two_pointers_attempted: u32,

    pub total_passes: u32,
    pub completed_passes: u32,
    pub potential_assists: u32,
    pub pass_completion_rate: f64,

    pub total_turnovers: u32,
    pub passing_turnovers: u32,

    pub pick_and_roll_count: u32,
    pub isolation_count: u32,
    pub post_up_count: u32,
    pub off_ball_screen_count: u32,

    pub true_shooting_percentage: f64,
    pub effective_field_goal_percentage: f64,
    /// Saturates to 0 when there are no turnovers; summaries use an unbounded sentinel instead.
    pub assist_to_turnover_ratio: f64,
    pub usage_rate: f64,
}

impl PlayerGameAggregate {
    pub fn play_type_count(&self, play_type: PlayType) -> u32 {
        match play_type {
            PlayType::PickAndRoll => self.pick_and_roll_count,
            PlayType::Isolation => self.isolation_count,
            PlayType::PostUp => self.post_up_count,
            PlayType::OffBallScreen => self.off_ball_screen_count,
            _ => 0,
        }
    }
}

/// Reduce one player's events in one game. `events` must already be scoped to that pair.
///
/// `team_possessions` is the shots plus turnovers of the player's whole team in the same game.
pub fn aggregate_game(
    player_id: PlayerId,
    game_id: GameId,
    events: &EventSet,
    team_possessions: u32,
) -> PlayerGameAggregate {
    let shots = &events.shots;
    let passes = &events.passes;

    // Counting fields first; every derived percentage below reads them.
    let total_shots = shots.len() as u32;
    let shots_made = shots.iter().filter(|s| s.points > 0).count() as u32;
    let total_points: u32 = shots.iter().map(|s| s.points as u32).sum();

    let mut three_pointers_made = 0u32;
    let mut three_pointers_attempted = 0u32;
    let mut two_pointers_made = 0u32;
    let mut two_pointers_attempted = 0u32;
    for shot in shots {
        match ShotTier::classify(shot) {
            ShotTier::Three => {
                three_pointers_attempted += 1;
                if shot.shot_made {
                    three_pointers_made += 1;
                }
            }
            ShotTier::Two => {
                two_pointers_attempted += 1;
                if shot.shot_made {
                    two_pointers_made += 1;
                }
            }
        }
    }

    let total_passes = passes.len() as u32;
    let completed_passes = passes.iter().filter(|p| p.completed).count() as u32;
    let potential_assists = passes.iter().filter(|p| p.potential_assist).count() as u32;
    let total_turnovers = events.turnovers.len() as u32;
    let passing_turnovers = passes.iter().filter(|p| p.turnover).count() as u32;

    let shots_f = total_shots as f64;
    let field_goal_percentage = percentage(shots_made as f64, shots_f);
    // No free-throw attempts are modeled, so the usual 0.44 * FTA term is dropped.
    let true_shooting_percentage = percentage(total_points as f64, 2.0 * shots_f);
    let effective_field_goal_percentage =
        percentage(shots_made as f64 + 0.5 * three_pointers_made as f64, shots_f);
    let assist_to_turnover_ratio = if total_turnovers > 0 {
        potential_assists as f64 / total_turnovers as f64
    } else {
        0.0
    };

    PlayerGameAggregate {
        player_id,
        game_id,
        total_shots,
        shots_made,
        total_points,
        field_goal_percentage,
        three_pointers_made,
        three_pointers_attempted,
        two_pointers_made,
        two_pointers_attempted,
        total_passes,
        completed_passes,
        potential_assists,
        pass_completion_rate: percentage(completed_passes as f64, total_passes as f64),
        total_turnovers,
        passing_turnovers,
        pick_and_roll_count: events.play_type_count(PlayType::PickAndRoll),
        isolation_count: events.play_type_count(PlayType::Isolation),
        post_up_count: events.play_type_count(PlayType::PostUp),
        off_ball_screen_count: events.play_type_count(PlayType::OffBallScreen),
        true_shooting_percentage,
        effective_field_goal_percentage,
        assist_to_turnover_ratio,
        usage_rate: percentage(events.possessions() as f64, team_possessions as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ClockContext, CourtPoint, PassEvent, TurnoverEvent};

    fn shot(id: u64, points: u8, x: f64, y: f64, play_type: PlayType) -> ShotEvent {
        ShotEvent::new(
            id,
            1,
            10,
            play_type,
            points,
            CourtPoint::new(x, y),
            false,
            ClockContext::default(),
        )
    }

    fn pass(id: u64, completed: bool, assist: bool, turnover: bool, play_type: PlayType) -> PassEvent {
        PassEvent::new(
            id,
            1,
            10,
            play_type,
            CourtPoint::new(0.0, 20.0),
            CourtPoint::new(5.0, 10.0),
            completed,
            assist,
            turnover,
            None,
            ClockContext::default(),
        )
    }

    fn turnover(id: u64, play_type: PlayType) -> TurnoverEvent {
        TurnoverEvent {
            id,
            player_id: 1,
            game_id: 10,
            play_type,
            location: CourtPoint::new(2.0, 2.0),
            turnover_type: Some("travel".to_string()),
            forced_by: None,
            clock: ClockContext::default(),
        }
    }

    #[test]
    fn empty_game_defaults_every_rate_to_zero() {
        let agg = aggregate_game(1, 10, &EventSet::default(), 0);
        assert_eq!(agg.total_shots, 0);
        assert_eq!(agg.field_goal_percentage, 0.0);
        assert_eq!(agg.pass_completion_rate, 0.0);
        assert_eq!(agg.true_shooting_percentage, 0.0);
        assert_eq!(agg.effective_field_goal_percentage, 0.0);
        assert_eq!(agg.assist_to_turnover_ratio, 0.0);
        assert_eq!(agg.usage_rate, 0.0);
        assert!(!agg.field_goal_percentage.is_nan());
    }

    #[test]
    fn ten_shots_six_makes_two_threes() {
        let mut shots = Vec::new();
        shots.push(shot(1, 3, 24.0, 2.0, PlayType::SpotUp));
        shots.push(shot(2, 3, 0.0, 25.0, PlayType::SpotUp));
        for id in 3..7 {
            shots.push(shot(id, 2, 5.0, 5.0, PlayType::Isolation));
        }
        for id in 7..11 {
            shots.push(shot(id, 0, 5.0, 5.0, PlayType::Isolation));
        }
        let events = EventSet { shots, ..Default::default() };
        let agg = aggregate_game(1, 10, &events, 20);

        assert_eq!(agg.total_shots, 10);
        assert_eq!(agg.shots_made, 6);
        assert_eq!(agg.total_points, 14);
        assert!((agg.field_goal_percentage - 60.0).abs() < 1e-9);
        assert!((agg.effective_field_goal_percentage - 70.0).abs() < 1e-9);
        assert!((agg.true_shooting_percentage - 70.0).abs() < 1e-9);
        assert_eq!(agg.three_pointers_made, 2);
        assert_eq!(agg.isolation_count, 8);
        assert!((agg.usage_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn every_shot_lands_in_exactly_one_tier() {
        let mut shots = Vec::new();
        let mut id = 0;
        for points in 0..=4u8 {
            for distance in [0.0, 10.0, 23.7, 23.75, 30.0] {
                id += 1;
                shots.push(shot(id, points, 0.0, distance, PlayType::Unknown));
            }
        }
        let events = EventSet { shots, ..Default::default() };
        let agg = aggregate_game(1, 10, &events, 0);
        assert_eq!(
            agg.two_pointers_attempted + agg.three_pointers_attempted,
            agg.total_shots
        );
        assert!(agg.three_pointers_made <= agg.three_pointers_attempted);
        assert!(agg.two_pointers_made <= agg.two_pointers_attempted);
    }

    #[test]
    fn missed_shots_are_tiered_by_distance() {
        let long_miss = shot(1, 0, 0.0, 23.75, PlayType::Unknown);
        let short_miss = shot(2, 0, 0.0, 23.74, PlayType::Unknown);
        let made_two_far = shot(3, 2, 0.0, 26.0, PlayType::Unknown);
        assert_eq!(ShotTier::classify(&long_miss), ShotTier::Three);
        assert_eq!(ShotTier::classify(&short_miss), ShotTier::Two);
        assert_eq!(ShotTier::classify(&made_two_far), ShotTier::Two);
    }

    #[test]
    fn one_point_makes_never_count_as_threes() {
        let events = EventSet {
            shots: vec![
                shot(1, 4, 0.0, 25.0, PlayType::SpotUp),
                shot(2, 1, 0.0, 5.0, PlayType::Isolation),
                shot(3, 1, 0.0, 25.0, PlayType::Isolation),
            ],
            ..Default::default()
        };
        let agg = aggregate_game(1, 10, &events, 0);
        assert_eq!(agg.three_pointers_attempted, 1);
        assert_eq!(agg.three_pointers_made, 1);
        assert_eq!(agg.two_pointers_attempted, 2);
        assert_eq!(agg.two_pointers_made, 2);
        // (3 + 0.5 * 1) / 3
        assert!((agg.effective_field_goal_percentage - 350.0 / 3.0).abs() < 1e-9);
        assert!(agg.effective_field_goal_percentage <= 150.0);
        assert_eq!(ShotTier::classify(&shot(4, 1, 0.0, 30.0, PlayType::Unknown)), ShotTier::Two);
    }

    #[test]
    fn passing_and_turnover_fields() {
        let events = EventSet {
            shots: vec![shot(1, 2, 1.0, 1.0, PlayType::PickAndRoll)],
            passes: vec![
                pass(1, true, true, false, PlayType::PickAndRoll),
                pass(2, true, true, false, PlayType::PostUp),
                pass(3, false, false, true, PlayType::OffBallScreen),
                pass(4, true, false, false, PlayType::PickAndRoll),
            ],
            turnovers: vec![turnover(1, PlayType::PickAndRoll)],
        };
        let agg = aggregate_game(1, 10, &events, 0);
        assert_eq!(agg.total_passes, 4);
        assert_eq!(agg.completed_passes, 3);
        assert!((agg.pass_completion_rate - 75.0).abs() < 1e-9);
        assert_eq!(agg.potential_assists, 2);
        assert_eq!(agg.passing_turnovers, 1);
        assert_eq!(agg.total_turnovers, 1);
        assert!((agg.assist_to_turnover_ratio - 2.0).abs() < 1e-9);
        // Turnovers do not count toward play-type tallies.
        assert_eq!(agg.pick_and_roll_count, 3);
        assert_eq!(agg.post_up_count, 1);
        assert_eq!(agg.off_ball_screen_count, 1);
        assert_eq!(agg.isolation_count, 0);
    }

    #[test]
    fn zero_turnovers_floor_the_ratio_at_zero() {
        let events = EventSet {
            passes: vec![pass(1, true, true, false, PlayType::Isolation)],
            ..Default::default()
        };
        let agg = aggregate_game(1, 10, &events, 0);
        assert_eq!(agg.potential_assists, 1);
        assert_eq!(agg.assist_to_turnover_ratio, 0.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let events = EventSet {
            shots: vec![shot(1, 3, 25.0, 0.0, PlayType::SpotUp), shot(2, 0, 3.0, 3.0, PlayType::PostUp)],
            passes: vec![pass(1, true, true, false, PlayType::PostUp)],
            turnovers: vec![turnover(1, PlayType::PostUp)],
        };
        assert_eq!(aggregate_game(1, 10, &events, 9), aggregate_game(1, 10, &events, 9));
    }

    #[test]
    fn serializes_with_camel_case_wire_names() {
        let agg = aggregate_game(4, 8, &EventSet::default(), 0);
        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["playerID"], 4);
        assert_eq!(json["gameID"], 8);
        assert!(json.get("fieldGoalPercentage").is_some());
        assert!(json.get("pickAndRollCount").is_some());
        assert!(json.get("effectiveFieldGoalPercentage").is_some());
    }
}
