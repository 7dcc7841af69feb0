use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
  #[error("Provider load failure: {source}")]
  LoadFailure {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("Provider process error: {source}")]
  Process {
    #[source]
    source: std::io::Error,
  },

  #[error("{0}")]
  Generation(String),
}

impl ProviderError {
  pub fn load_failure<E>(source: E) -> ProviderError
  where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    ProviderError::LoadFailure {
      source: source.into(),
    }
  }
}

/// One generation call. Length hints are soft: providers may interpret them
/// in their own units (characters, tokens) and may overshoot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
  pub instruction: String,
  pub min_length: usize,
  pub max_length: usize,
}

/// A synchronous text-to-text generation capability.
pub trait TextProvider {
  fn generate(&mut self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

/// Acquires a provider. Loading may be slow (model weights, process lookup)
/// and happens once per session initialization.
pub trait ProviderLoader {
  type Provider: TextProvider;

  fn load(&self) -> Result<Self::Provider, ProviderError>;
}

impl<F, P> ProviderLoader for F
where
  F: Fn() -> Result<P, ProviderError>,
  P: TextProvider,
{
  type Provider = P;

  fn load(&self) -> Result<P, ProviderError> {
    self()
  }
}
