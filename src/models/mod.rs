pub mod workout;

pub use workout::{ActivityRecord, WorkoutType};
