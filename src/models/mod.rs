pub mod health;
pub mod training;

pub use health::{HealthRecord, HealthStatus};
pub use training::{Feeling, TrainingRecord, TrainingType};
