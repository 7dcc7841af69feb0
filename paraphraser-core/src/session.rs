use std::{
  collections::VecDeque,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Local;
use paraphraser_provider::{GenerationRequest, ProviderLoader, TextProvider};

use crate::{
  error::SessionError, history::HistoryEntry, options::ParaphraseOptions, status::SessionStatus,
};

/// Directive prefixed to the input so text2text models treat it as a
/// paraphrase task.
pub const PARAPHRASE_DIRECTIVE: &str = "paraphrase: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParaphraseResult {
  pub output_text: String,
}

/// Builds the provider request for already trimmed input. Length hints are
/// derived from the input's character count: at most twice as long, at
/// least half as long.
pub fn generation_request(text: &str) -> GenerationRequest {
  let chars = text.chars().count();
  GenerationRequest {
    instruction: format!("{}{}", PARAPHRASE_DIRECTIVE, text),
    min_length: chars / 2,
    max_length: chars * 2,
  }
}

#[derive(Default)]
struct SessionState {
  status: SessionStatus,
  provider_loaded: bool,
  history: VecDeque<HistoryEntry>,
}

/// One paraphrasing session: status, provider and history.
///
/// Every method takes `&self`, so a session can be shared with a worker
/// thread. At most one request runs at a time; a second one fails with
/// [`SessionError::Busy`] instead of waiting.
pub struct ParaphraseSession<Loader: ProviderLoader> {
  loader: Loader,
  state: Mutex<SessionState>,
  provider: Mutex<Option<Loader::Provider>>,
}

impl<Loader: ProviderLoader> ParaphraseSession<Loader> {
  pub fn new(loader: Loader) -> ParaphraseSession<Loader> {
    ParaphraseSession {
      loader,
      state: Mutex::new(SessionState::default()),
      provider: Mutex::new(None),
    }
  }

  fn lock_state(&self) -> MutexGuard<'_, SessionState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn lock_provider(&self) -> MutexGuard<'_, Option<Loader::Provider>> {
    self.provider.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Loads the provider. A session that is already ready keeps its
  /// provider; a failed session may call this again.
  pub fn initialize(&self) -> Result<(), SessionError> {
    {
      let mut state = self.lock_state();
      match &state.status {
        SessionStatus::Ready => {
          log::debug!("Provider already loaded");
          return Ok(());
        }
        SessionStatus::LoadingProvider | SessionStatus::Processing => {
          return Err(SessionError::Busy)
        }
        SessionStatus::Idle | SessionStatus::Error(_) => {}
      }
      state.status = SessionStatus::LoadingProvider;
    }

    log::info!("Loading provider...");
    match self.loader.load() {
      Ok(provider) => {
        *self.lock_provider() = Some(provider);
        let mut state = self.lock_state();
        state.provider_loaded = true;
        state.status = SessionStatus::Ready;
        log::info!("Provider loaded");
        Ok(())
      }
      Err(err) => {
        let message = non_empty_message(err.to_string());
        log::warn!("Failed to load provider: {}", message);
        *self.lock_provider() = None;
        let mut state = self.lock_state();
        state.provider_loaded = false;
        state.status = SessionStatus::Error(message.clone());
        Err(SessionError::Initialization { message })
      }
    }
  }

  pub fn paraphrase(
    &self,
    input_text: &str,
    options: ParaphraseOptions,
  ) -> Result<ParaphraseResult, SessionError> {
    let text = input_text.trim();
    if text.is_empty() {
      return Err(SessionError::EmptyInput);
    }

    let in_flight = self.begin_request()?;
    let request = generation_request(text);
    log::debug!(
      "Requesting paraphrase ({}), length hints {}..{}",
      options,
      request.min_length,
      request.max_length
    );

    let generated = match self.lock_provider().as_mut() {
      Some(provider) => provider.generate(&request),
      None => {
        let status = in_flight.abandon();
        return Err(SessionError::NotReady { status });
      }
    };

    match generated {
      Ok(output_text) => {
        in_flight.succeed(options);
        log::info!("Paraphrasing complete!");
        Ok(ParaphraseResult { output_text })
      }
      Err(err) => {
        let message = non_empty_message(err.to_string());
        log::warn!("Paraphrasing failed: {}", message);
        in_flight.fail(message.clone());
        Err(SessionError::Provider { message })
      }
    }
  }

  fn begin_request(&self) -> Result<InFlight<'_>, SessionError> {
    let mut state = self.lock_state();
    match &state.status {
      SessionStatus::Processing => return Err(SessionError::Busy),
      SessionStatus::Ready => {}
      SessionStatus::Error(_) if state.provider_loaded => {}
      status => {
        return Err(SessionError::NotReady {
          status: status.clone(),
        })
      }
    }

    let previous = std::mem::replace(&mut state.status, SessionStatus::Processing);
    Ok(InFlight {
      state: &self.state,
      previous: Some(previous),
    })
  }

  /// Entries of this session, most recent first.
  pub fn history(&self) -> Vec<HistoryEntry> {
    self.lock_state().history.iter().cloned().collect()
  }

  pub fn status(&self) -> SessionStatus {
    self.lock_state().status.clone()
  }

  pub fn last_error(&self) -> Option<String> {
    self.lock_state().status.error_message().map(str::to_string)
  }
}

fn non_empty_message(message: String) -> String {
  if message.trim().is_empty() {
    "provider failed without a message".to_string()
  } else {
    message
  }
}

/// Holds the session in `Processing`. Dropping it unfinished (a panicking
/// provider) moves the session to `Error` so it does not stay busy.
struct InFlight<'a> {
  state: &'a Mutex<SessionState>,
  previous: Option<SessionStatus>,
}

impl InFlight<'_> {
  fn lock(&self) -> MutexGuard<'_, SessionState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn succeed(mut self, options: ParaphraseOptions) {
    self.previous = None;
    let mut state = self.lock();
    state.status = SessionStatus::Ready;
    state
      .history
      .push_front(HistoryEntry::new(Local::now(), options));
  }

  fn fail(mut self, message: String) {
    self.previous = None;
    self.lock().status = SessionStatus::Error(message);
  }

  fn abandon(mut self) -> SessionStatus {
    let previous = self.previous.take().unwrap_or_default();
    self.lock().status = previous.clone();
    previous
  }
}

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    if self.previous.take().is_some() {
      log::warn!("Paraphrase request interrupted");
      self.lock().status =
        SessionStatus::Error("paraphrase request was interrupted".to_string());
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
      atomic::{AtomicUsize, Ordering},
      mpsc, Arc,
    },
    thread,
  };

  use paraphraser_provider::ProviderError;

  use super::*;
  use crate::options::{Length, Style, Tone};

  type Script = Arc<Mutex<VecDeque<Result<String, String>>>>;

  /// Replays scripted outcomes and records every request it receives.
  struct ScriptedProvider {
    script: Script,
    seen: Arc<Mutex<Vec<GenerationRequest>>>,
  }

  impl TextProvider for ScriptedProvider {
    fn generate(&mut self, request: &GenerationRequest) -> Result<String, ProviderError> {
      self.seen.lock().unwrap().push(request.clone());
      let next = self.script.lock().unwrap().pop_front();
      match next {
        Some(Ok(text)) => Ok(text),
        Some(Err(message)) if message == "panic" => panic!("provider crashed"),
        Some(Err(message)) => Err(ProviderError::Generation(message)),
        None => Ok(format!("echo {}", request.instruction)),
      }
    }
  }

  struct Harness {
    script: Script,
    seen: Arc<Mutex<Vec<GenerationRequest>>>,
  }

  impl Harness {
    fn new(outcomes: Vec<Result<&str, &str>>) -> Self {
      Harness {
        script: Arc::new(Mutex::new(
          outcomes
            .into_iter()
            .map(|o| o.map(str::to_string).map_err(str::to_string))
            .collect(),
        )),
        seen: Arc::new(Mutex::new(vec![])),
      }
    }

    fn loader(&self) -> impl Fn() -> Result<ScriptedProvider, ProviderError> {
      let script = self.script.clone();
      let seen = self.seen.clone();
      move || {
        Ok(ScriptedProvider {
          script: script.clone(),
          seen: seen.clone(),
        })
      }
    }
  }

  fn formal() -> ParaphraseOptions {
    ParaphraseOptions::new(Style::Formal, Tone::Neutral, Length::Similar)
  }

  fn failing_loader() -> Result<ScriptedProvider, ProviderError> {
    Err(ProviderError::load_failure("model weights missing"))
  }

  #[test]
  fn starts_idle_with_empty_history() {
    let harness = Harness::new(vec![]);
    let session = ParaphraseSession::new(harness.loader());

    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(session.history().is_empty());
    assert_eq!(session.last_error(), None);
  }

  #[test]
  fn paraphrase_records_options() {
    let harness = Harness::new(vec![Ok("The feline rested upon the rug.")]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();
    assert_eq!(session.status(), SessionStatus::Ready);

    let result = session.paraphrase("The cat sat on the mat.", formal()).unwrap();

    assert_eq!(result.output_text, "The feline rested upon the rug.");
    assert_eq!(session.status(), SessionStatus::Ready);
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].options(), &formal());
  }

  #[test]
  fn request_carries_directive_and_length_hints() {
    let harness = Harness::new(vec![]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();

    session
      .paraphrase("  The cat sat on the mat.\n", ParaphraseOptions::default())
      .unwrap();

    let seen = harness.seen.lock().unwrap();
    assert_eq!(
      seen[0],
      GenerationRequest {
        instruction: "paraphrase: The cat sat on the mat.".to_string(),
        min_length: 11,
        max_length: 46,
      }
    );
  }

  #[test]
  fn length_hints_count_characters() {
    let request = generation_request("héllo");

    assert_eq!(request.min_length, 2);
    assert_eq!(request.max_length, 10);
  }

  #[test]
  fn history_is_most_recent_first() {
    let harness = Harness::new(vec![]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();
    let casual = ParaphraseOptions::new(Style::Casual, Tone::Positive, Length::Shorter);

    session.paraphrase("one", formal()).unwrap();
    session.paraphrase("two", casual).unwrap();

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].options(), &casual);
    assert_eq!(history[1].options(), &formal());
    assert!(history[0].timestamp() >= history[1].timestamp());
  }

  #[test]
  fn blank_input_is_rejected_without_state_change() {
    let harness = Harness::new(vec![]);
    let session = ParaphraseSession::new(harness.loader());

    assert_eq!(
      session.paraphrase("", formal()),
      Err(SessionError::EmptyInput)
    );
    assert_eq!(session.status(), SessionStatus::Idle);

    session.initialize().unwrap();
    for blank in ["", "   ", "\n\t "] {
      assert_eq!(
        session.paraphrase(blank, formal()),
        Err(SessionError::EmptyInput)
      );
    }
    assert_eq!(session.status(), SessionStatus::Ready);
    assert!(session.history().is_empty());
    assert!(harness.seen.lock().unwrap().is_empty());
  }

  #[test]
  fn paraphrase_before_initialize_is_not_ready() {
    let harness = Harness::new(vec![]);
    let session = ParaphraseSession::new(harness.loader());

    assert_eq!(
      session.paraphrase("Hello world", formal()),
      Err(SessionError::NotReady {
        status: SessionStatus::Idle
      })
    );
    assert!(session.history().is_empty());
  }

  #[test]
  fn provider_failure_sets_error_and_retry_recovers() {
    let harness = Harness::new(vec![Err("generation exploded"), Ok("Hi, world")]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();

    let err = session.paraphrase("Hello world", formal()).unwrap_err();

    assert_eq!(
      err,
      SessionError::Provider {
        message: "generation exploded".to_string()
      }
    );
    assert_eq!(
      session.status(),
      SessionStatus::Error("generation exploded".to_string())
    );
    assert_eq!(session.last_error().as_deref(), Some("generation exploded"));
    assert!(session.history().is_empty());

    let result = session.paraphrase("Hello world", formal()).unwrap();

    assert_eq!(result.output_text, "Hi, world");
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.last_error(), None);
    assert_eq!(session.history().len(), 1);
  }

  #[test]
  fn empty_provider_message_is_replaced() {
    let harness = Harness::new(vec![Err("")]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();

    let err = session.paraphrase("Hello world", formal()).unwrap_err();

    match err {
      SessionError::Provider { message } => assert!(!message.is_empty()),
      other => panic!("unexpected error {:?}", other),
    }
    assert!(session.last_error().is_some_and(|m| !m.is_empty()));
  }

  #[test]
  fn failed_initialize_is_fatal_until_retried() {
    let session = ParaphraseSession::new(failing_loader);

    let err = session.initialize().unwrap_err();

    assert_eq!(
      err,
      SessionError::Initialization {
        message: "Provider load failure: model weights missing".to_string()
      }
    );
    assert!(matches!(session.status(), SessionStatus::Error(_)));
    assert!(matches!(
      session.paraphrase("Hello world", formal()),
      Err(SessionError::NotReady { .. })
    ));
    assert!(matches!(session.status(), SessionStatus::Error(_)));
  }

  #[test]
  fn initialize_can_be_retried_after_failure() {
    let attempts = Mutex::new(0);
    let harness = Harness::new(vec![Ok("done")]);
    let inner = harness.loader();
    let session = ParaphraseSession::new(move || {
      let mut attempts = attempts.lock().unwrap();
      *attempts += 1;
      if *attempts == 1 {
        Err(ProviderError::load_failure("not yet"))
      } else {
        inner()
      }
    });

    assert!(session.initialize().is_err());
    session.initialize().unwrap();

    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.paraphrase("retry", formal()).unwrap().output_text, "done");
  }

  #[test]
  fn failed_reload_discards_previous_provider() {
    let loads = AtomicUsize::new(0);
    let counter = &loads;
    let harness = Harness::new(vec![Err("generation exploded"), Ok("stale")]);
    let inner = harness.loader();
    let session = ParaphraseSession::new(move || {
      if counter.fetch_add(1, Ordering::SeqCst) == 0 {
        inner()
      } else {
        Err(ProviderError::load_failure("weights gone"))
      }
    });
    session.initialize().unwrap();
    assert!(session.paraphrase("fail", formal()).is_err());

    let err = session.initialize().unwrap_err();

    assert_eq!(
      err,
      SessionError::Initialization {
        message: "Provider load failure: weights gone".to_string()
      }
    );
    assert!(matches!(
      session.paraphrase("hello", formal()),
      Err(SessionError::NotReady { .. })
    ));
    assert_eq!(
      session.status(),
      SessionStatus::Error("Provider load failure: weights gone".to_string())
    );
    assert!(session.history().is_empty());
    assert_eq!(harness.seen.lock().unwrap().len(), 1);
  }

  #[test]
  fn initialize_when_ready_keeps_provider() {
    let loads = AtomicUsize::new(0);
    let counter = &loads;
    let harness = Harness::new(vec![]);
    let inner = harness.loader();
    let session = ParaphraseSession::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
      inner()
    });

    session.initialize().unwrap();
    session.initialize().unwrap();

    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
  }

  struct BlockingProvider {
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
  }

  impl TextProvider for BlockingProvider {
    fn generate(&mut self, _request: &GenerationRequest) -> Result<String, ProviderError> {
      self.entered.send(()).unwrap();
      self.release.recv().unwrap();
      Ok("slow result".to_string())
    }
  }

  #[test]
  fn concurrent_request_is_busy() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let slot = Mutex::new(Some(BlockingProvider {
      entered: entered_tx,
      release: release_rx,
    }));
    let session = ParaphraseSession::new(move || {
      slot
        .lock()
        .unwrap()
        .take()
        .ok_or_else(|| ProviderError::load_failure("already taken"))
    });
    session.initialize().unwrap();

    thread::scope(|s| {
      let worker = s.spawn(|| session.paraphrase("first request", formal()));
      entered_rx.recv().unwrap();

      assert_eq!(session.status(), SessionStatus::Processing);
      assert_eq!(
        session.paraphrase("second request", formal()),
        Err(SessionError::Busy)
      );
      assert_eq!(session.initialize(), Err(SessionError::Busy));
      assert!(session.history().is_empty());

      release_tx.send(()).unwrap();
      let result = worker.join().unwrap().unwrap();
      assert_eq!(result.output_text, "slow result");
    });

    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.history().len(), 1);
  }

  #[test]
  fn panicking_provider_does_not_leave_session_busy() {
    let harness = Harness::new(vec![Err("panic"), Ok("recovered")]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
      session.paraphrase("Hello world", formal())
    }));

    assert!(outcome.is_err());
    assert!(matches!(session.status(), SessionStatus::Error(_)));
    assert!(session.history().is_empty());

    let result = session.paraphrase("Hello world", formal()).unwrap();
    assert_eq!(result.output_text, "recovered");
    assert_eq!(session.history().len(), 1);
  }

  #[test]
  fn history_count_matches_successes() {
    let harness = Harness::new(vec![Ok("a"), Err("x"), Ok("b"), Err("y"), Ok("c")]);
    let session = ParaphraseSession::new(harness.loader());
    session.initialize().unwrap();

    let successes = (0..5)
      .filter(|_| session.paraphrase("some text", formal()).is_ok())
      .count();

    assert_eq!(successes, 3);
    assert_eq!(session.history().len(), 3);
  }
}
