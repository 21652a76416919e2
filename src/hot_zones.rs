use serde::Serialize;

use crate::events::ShotEvent;
use crate::ratio::{percentage, round_to};

pub const HOT_THRESHOLD: f64 = 45.0;
pub const WARM_THRESHOLD: f64 = 35.0;

/// A named box on the half court, bounds inclusive, in feet from the basket center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourtZone {
    pub name: &'static str,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl CourtZone {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_range.0 && x <= self.x_range.1 && y >= self.y_range.0 && y <= self.y_range.1
    }
}

// Zones overlap on their shared edges; a shot on a boundary counts for both.
pub const COURT_ZONES: [CourtZone; 9] = [
    CourtZone { name: "Restricted Area", x_range: (-8.0, 8.0), y_range: (0.0, 8.0) },
    CourtZone { name: "Left Corner 3", x_range: (-25.0, -22.0), y_range: (0.0, 9.0) },
    CourtZone { name: "Right Corner 3", x_range: (22.0, 25.0), y_range: (0.0, 9.0) },
    CourtZone { name: "Left Wing 3", x_range: (-25.0, -15.0), y_range: (9.0, 24.0) },
    CourtZone { name: "Right Wing 3", x_range: (15.0, 25.0), y_range: (9.0, 24.0) },
    CourtZone { name: "Top of Key 3", x_range: (-15.0, 15.0), y_range: (24.0, 30.0) },
    CourtZone { name: "Mid-Range Left", x_range: (-22.0, -8.0), y_range: (8.0, 24.0) },
    CourtZone { name: "Mid-Range Right", x_range: (8.0, 22.0), y_range: (8.0, 24.0) },
    CourtZone { name: "Free Throw Line", x_range: (-8.0, 8.0), y_range: (8.0, 20.0) },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneRating {
    Hot,
    Warm,
    Cold,
}

impl ZoneRating {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= HOT_THRESHOLD {
            ZoneRating::Hot
        } else if pct >= WARM_THRESHOLD {
            ZoneRating::Warm
        } else {
            ZoneRating::Cold
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotZone {
    pub zone: &'static str,
    pub shots_made: u32,
    pub shots_attempted: u32,
    pub percentage: f64,
    pub rating: ZoneRating,
}

/// Shooting by zone, in zone-definition order. Zones without an attempt are left out.
pub fn hot_zones(shots: &[ShotEvent]) -> Vec<HotZone> {
    COURT_ZONES
        .iter()
        .filter_map(|zone| {
            let mut attempted = 0u32;
            let mut made = 0u32;
            for shot in shots {
                if zone.contains(shot.location.x, shot.location.y) {
                    attempted += 1;
                    if shot.points > 0 {
                        made += 1;
                    }
                }
            }
            if attempted == 0 {
                return None;
            }
            let pct = round_to(percentage(made as f64, attempted as f64), 1);
            Some(HotZone {
                zone: zone.name,
                shots_made: made,
                shots_attempted: attempted,
                percentage: pct,
                rating: ZoneRating::from_percentage(pct),
            })
        })
        .collect()
}
