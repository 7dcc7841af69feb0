use thiserror::Error;

use crate::status::SessionStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
  #[error("Please enter some text first!")]
  EmptyInput,

  #[error("Session is not ready (status: {status})")]
  NotReady { status: SessionStatus },

  #[error("A paraphrase request is already in progress")]
  Busy,

  #[error("Paraphrasing failed: {message}")]
  Provider { message: String },

  #[error("Could not load the provider: {message}")]
  Initialization { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionParseError {
  #[error("unknown {field} {value:?}")]
  UnknownOption { field: &'static str, value: String },
}
