use anyhow::{Context, Result};
use arboard::Clipboard;

pub fn copy(text: &str) -> Result<()> {
  let mut clipboard = Clipboard::new().with_context(|| "Could not access the clipboard")?;
  clipboard
    .set_text(text)
    .with_context(|| "Could not copy text to the clipboard")?;
  log::debug!("Copied {} chars to the clipboard", text.len());
  Ok(())
}
