use std::{
  io::{self, Write},
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use paraphraser_command::CommandLoader;
use paraphraser_core::{
  word_count, Length, ParaphraseOptions, ParaphraseSession, ProviderLoader, Style, Tone,
};

mod clipboard;
mod config;
mod files;

use crate::config::Config;

const LOADING_MESSAGE: &str = "Loading model...";

/// Paraphrase text with a local generation model.
///
/// Without --input, reads one text per line from stdin. Interactive commands:
/// :history, :status, :quit.
#[derive(Parser, Debug)]
#[command(name = "paraphraser", version)]
struct Args {
  #[arg(long, default_value_t = Style::default())]
  style: Style,

  #[arg(long, default_value_t = Tone::default())]
  tone: Tone,

  #[arg(long, default_value_t = Length::default())]
  length: Length,

  /// Read the text to paraphrase from this UTF-8 file
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Save the paraphrased text to this file instead of printing it
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Copy the paraphrased text to the clipboard
  #[arg(long)]
  copy: bool,
}

impl Args {
  fn options(&self) -> ParaphraseOptions {
    ParaphraseOptions::new(self.style, self.tone, self.length)
  }
}

fn deliver(args: &Args, text: &str) -> Result<()> {
  match &args.output {
    Some(path) => {
      files::save_text(path, text)?;
      println!("File saved successfully!");
    }
    None => println!("{}", text),
  }

  if args.copy {
    clipboard::copy(text)?;
    println!("Text copied to clipboard!");
  }
  Ok(())
}

fn print_history<L: ProviderLoader>(session: &ParaphraseSession<L>) {
  let history = session.history();
  if history.is_empty() {
    println!("No paraphrases yet");
  }
  for entry in history {
    println!("{}", entry);
  }
}

fn run_once<L: ProviderLoader>(
  session: &ParaphraseSession<L>,
  args: &Args,
  path: &Path,
) -> Result<()> {
  let text = files::load_text(path)?;
  println!("Words: {}", word_count(&text));

  let result = session
    .paraphrase(&text, args.options())
    .with_context(|| format!("Unable to paraphrase {}", path.display()))?;

  deliver(args, &result.output_text)?;
  println!("Paraphrasing complete!");
  print_history(session);
  Ok(())
}

fn run_interactive<L: ProviderLoader>(
  session: &ParaphraseSession<L>,
  args: &Args,
) -> Result<()> {
  let prompt = || -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
  };

  prompt()?;
  for line in io::stdin().lines() {
    let line = line?;
    match line.trim() {
      ":quit" | ":q" => break,
      ":history" => print_history(session),
      ":status" => println!("{}", session.status()),
      text => {
        log::debug!("Words: {}", word_count(text));
        match session.paraphrase(text, args.options()) {
          Ok(result) => match deliver(args, &result.output_text) {
            Ok(()) => println!("Paraphrasing complete!"),
            Err(err) => println!("Error: {:#}", err),
          },
          Err(err) => println!("Error: {}", err),
        }
      }
    }
    prompt()?;
  }
  Ok(())
}

fn main() -> Result<()> {
  env_logger::init();

  let args = Args::parse();
  let config = Config::from_env()?;

  let loader = CommandLoader::new(&config.command).args(&config.args);
  let session = ParaphraseSession::new(loader);

  println!("{}", LOADING_MESSAGE);
  session
    .initialize()
    .with_context(|| "Unable to initialize the paraphrase model")?;
  println!("{}", session.status());

  match &args.input {
    Some(path) => run_once(&session, &args, path),
    None => run_interactive(&session, &args),
  }
}
