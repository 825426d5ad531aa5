pub mod auth;
pub mod calendar;

pub use auth::{ServiceAccountKey, TokenProvider, CALENDAR_READONLY_SCOPE};
pub use calendar::{CalendarClient, EventSource};
