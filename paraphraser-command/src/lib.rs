use std::{
  ffi::OsString,
  io::{self, Write},
  path::{Path, PathBuf},
  process::{Command, Stdio},
  thread,
};

use paraphraser_provider::{GenerationRequest, ProviderError, ProviderLoader, TextProvider};

pub const MIN_LENGTH_VAR: &str = "PARAPHRASER_MIN_LENGTH";
pub const MAX_LENGTH_VAR: &str = "PARAPHRASER_MAX_LENGTH";

/// Runs an external generation program once per request.
///
/// The instruction goes to the program's stdin, the length hints go to its
/// environment, and trimmed stdout is the generated text.
#[derive(Debug, Clone)]
pub struct CommandProvider {
  program: PathBuf,
  args: Vec<OsString>,
}

impl CommandProvider {
  pub fn program(&self) -> &Path {
    &self.program
  }
}

impl TextProvider for CommandProvider {
  fn generate(&mut self, request: &GenerationRequest) -> Result<String, ProviderError> {
    log::info!(
      "Running {} for {} chars of instruction",
      self.program.display(),
      request.instruction.len()
    );

    let mut child = Command::new(&self.program)
      .args(&self.args)
      .env(MIN_LENGTH_VAR, request.min_length.to_string())
      .env(MAX_LENGTH_VAR, request.max_length.to_string())
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| ProviderError::Process { source })?;

    // Feed stdin while stdout drains, or a streaming program fills its
    // output pipe and both sides block.
    let stdin = child.stdin.take();
    let instruction = request.instruction.as_bytes();
    let (written, output) = thread::scope(|s| {
      let writer = s.spawn(move || match stdin {
        Some(mut stdin) => stdin.write_all(instruction),
        None => Ok(()),
      });
      let output = child.wait_with_output();
      (writer.join(), output)
    });

    let output = output.map_err(|source| ProviderError::Process { source })?;
    match written {
      Ok(Ok(())) => {}
      Ok(Err(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
        log::debug!("{} closed stdin early", self.program.display());
      }
      Ok(Err(source)) => return Err(ProviderError::Process { source }),
      Err(_) => {
        return Err(ProviderError::Generation(
          "stdin writer thread panicked".to_string(),
        ))
      }
    }

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      log::warn!("{} exited with {}", self.program.display(), output.status);
      return Err(ProviderError::Generation(if stderr.is_empty() {
        format!("{} exited with {}", self.program.display(), output.status)
      } else {
        stderr
      }));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
      return Err(ProviderError::Generation(format!(
        "{} produced no output",
        self.program.display()
      )));
    }

    log::debug!("Produced {} chars", text.len());
    Ok(text)
  }
}

#[derive(Debug, Clone)]
pub struct CommandLoader {
  program: OsString,
  args: Vec<OsString>,
}

impl CommandLoader {
  pub fn new<S: Into<OsString>>(program: S) -> Self {
    CommandLoader {
      program: program.into(),
      args: vec![],
    }
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

impl ProviderLoader for CommandLoader {
  type Provider = CommandProvider;

  fn load(&self) -> Result<CommandProvider, ProviderError> {
    let program = which::which(&self.program).map_err(|err| {
      ProviderError::load_failure(format!(
        "generation program {:?} not found: {}",
        self.program, err
      ))
    })?;

    log::debug!("Using generation program {}", program.display());
    Ok(CommandProvider {
      program,
      args: self.args.clone(),
    })
  }
}
