use std::fmt;

use chrono::{DateTime, Local};

use crate::options::ParaphraseOptions;

/// Record of one successful paraphrase. Keeps the selected options, never
/// the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
  timestamp: DateTime<Local>,
  options: ParaphraseOptions,
}

impl HistoryEntry {
  pub(crate) fn new(timestamp: DateTime<Local>, options: ParaphraseOptions) -> Self {
    HistoryEntry { timestamp, options }
  }

  pub fn timestamp(&self) -> DateTime<Local> {
    self.timestamp
  }

  pub fn options(&self) -> &ParaphraseOptions {
    &self.options
  }
}

impl fmt::Display for HistoryEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}] {}",
      self.timestamp.format("%Y-%m-%d %H:%M:%S"),
      self.options
    )
  }
}
