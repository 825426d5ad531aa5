pub mod blocks;
pub mod content;
pub mod markdown;
pub mod models;
pub mod notion;

pub use models::{CalendarEvent, EventTime, PublishOutcome, SourceReport};
