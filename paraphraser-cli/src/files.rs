use std::{fs, path::Path};

use anyhow::{Context, Result};

pub fn load_text<P: AsRef<Path>>(path: P) -> Result<String> {
  let path = path.as_ref();
  log::debug!("Loading {}", path.display());
  fs::read_to_string(path).with_context(|| format!("Could not load file {}", path.display()))
}

pub fn save_text<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
  let path = path.as_ref();
  log::debug!("Saving {} bytes to {}", text.len(), path.display());
  fs::write(path, text).with_context(|| format!("Could not save file {}", path.display()))
}
