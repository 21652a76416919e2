pub mod comparison;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod events;
pub mod game_stats;
pub mod hot_zones;
pub mod ranking;
pub mod ratio;
pub mod repository;
pub mod store;
pub mod summary;

pub use engine::StatsEngine;
pub use error::{StatsError, StatsResult};
pub use repository::{EventRepository, InMemoryRepository};
pub use store::SqliteRepository;
