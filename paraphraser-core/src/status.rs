use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
  #[default]
  Idle,
  LoadingProvider,
  Ready,
  Processing,
  /// Last failure, either from loading the provider or from a request.
  Error(String),
}

impl SessionStatus {
  pub fn error_message(&self) -> Option<&str> {
    match self {
      SessionStatus::Error(message) => Some(message),
      _ => None,
    }
  }
}

impl fmt::Display for SessionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SessionStatus::Idle => f.write_str("Idle"),
      SessionStatus::LoadingProvider => f.write_str("Loading model..."),
      SessionStatus::Ready => f.write_str("Ready"),
      SessionStatus::Processing => f.write_str("Paraphrasing..."),
      SessionStatus::Error(message) => write!(f, "Error: {}", message),
    }
  }
}
