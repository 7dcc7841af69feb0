mod error;
mod history;
mod options;
mod session;
mod status;

pub use error::{OptionParseError, SessionError};
pub use history::HistoryEntry;
pub use options::{Length, ParaphraseOptions, Style, Tone};
pub use session::{
  generation_request, ParaphraseResult, ParaphraseSession, PARAPHRASE_DIRECTIVE,
};
pub use status::SessionStatus;

pub use paraphraser_provider::{GenerationRequest, ProviderError, ProviderLoader, TextProvider};

/// Whitespace separated words, as shown next to the input box.
pub fn word_count(text: &str) -> usize {
  text.split_whitespace().count()
}
