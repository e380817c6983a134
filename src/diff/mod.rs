pub mod engine;
pub mod events;

pub use engine::compare;
pub use events::{ChangeEvent, Comparison, DataQualityWarning};
