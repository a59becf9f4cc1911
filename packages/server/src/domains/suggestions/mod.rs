pub mod actions;
pub mod errors;
pub mod events;
pub mod machines;
pub mod models;
pub mod store;

pub use errors::SuggestionError;
pub use events::SuggestionEvent;
pub use machines::SuggestionStatus;
pub use store::{PostgresSuggestionStore, SuggestionStore};
