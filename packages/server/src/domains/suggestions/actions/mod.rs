pub mod create_suggestion;
pub mod queries;
pub mod sweep_expired;
pub mod transition;

pub use create_suggestion::{create_suggestion, CreateSuggestionRequest};
pub use queries::{get_suggestion, SuggestionView};
pub use sweep_expired::sweep_expired_suggestions;
pub use transition::transition_suggestion;
