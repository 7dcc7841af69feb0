use anyhow::{Context, Result};

pub const COMMAND_VAR: &str = "PARAPHRASER_COMMAND";
pub const ARGS_VAR: &str = "PARAPHRASER_ARGS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub command: String,
  pub args: Vec<String>,
}

impl Config {
  pub fn from_env() -> Result<Config> {
    Config::from_vars(|key| std::env::var(key).ok())
  }

  fn from_vars<F>(var: F) -> Result<Config>
  where
    F: Fn(&str) -> Option<String>,
  {
    let command = var(COMMAND_VAR)
      .filter(|value| !value.trim().is_empty())
      .with_context(|| {
        format!(
          "{} variable unset, set it to the program that runs the paraphrase model",
          COMMAND_VAR
        )
      })?;

    let args = var(ARGS_VAR).map(|value| split(&value)).unwrap_or_default();

    Ok(Config {
      command: command.trim().to_string(),
      args,
    })
  }
}

fn split(value: &str) -> Vec<String> {
  value.split_whitespace().map(str::to_string).collect()
}
