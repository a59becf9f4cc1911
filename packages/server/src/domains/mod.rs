pub mod matching;
pub mod suggestions;
