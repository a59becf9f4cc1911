pub mod status_history;
pub mod suggestion;

pub use status_history::StatusHistoryEntry;
pub use suggestion::{NewSuggestion, Party, Suggestion};
