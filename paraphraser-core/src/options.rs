use std::{fmt, str::FromStr};

use crate::error::OptionParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Style {
  #[default]
  Standard,
  Formal,
  Casual,
  Creative,
  Professional,
  Simple,
  Academic,
}

impl Style {
  pub const ALL: [Style; 7] = [
    Style::Standard,
    Style::Formal,
    Style::Casual,
    Style::Creative,
    Style::Professional,
    Style::Simple,
    Style::Academic,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Style::Standard => "standard",
      Style::Formal => "formal",
      Style::Casual => "casual",
      Style::Creative => "creative",
      Style::Professional => "professional",
      Style::Simple => "simple",
      Style::Academic => "academic",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tone {
  #[default]
  Neutral,
  Positive,
  Negative,
  Objective,
  Subjective,
}

impl Tone {
  pub const ALL: [Tone; 5] = [
    Tone::Neutral,
    Tone::Positive,
    Tone::Negative,
    Tone::Objective,
    Tone::Subjective,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Tone::Neutral => "neutral",
      Tone::Positive => "positive",
      Tone::Negative => "negative",
      Tone::Objective => "objective",
      Tone::Subjective => "subjective",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Length {
  Shorter,
  #[default]
  Similar,
  Longer,
}

impl Length {
  pub const ALL: [Length; 3] = [Length::Shorter, Length::Similar, Length::Longer];

  pub fn name(&self) -> &'static str {
    match self {
      Length::Shorter => "shorter",
      Length::Similar => "similar",
      Length::Longer => "longer",
    }
  }
}

fn parse_named<T: Copy>(
  field: &'static str,
  all: &[T],
  name: impl Fn(&T) -> &'static str,
  s: &str,
) -> Result<T, OptionParseError> {
  let wanted = s.trim();
  all
    .iter()
    .find(|item| name(*item).eq_ignore_ascii_case(wanted))
    .copied()
    .ok_or_else(|| OptionParseError::UnknownOption {
      field,
      value: s.to_string(),
    })
}

impl FromStr for Style {
  type Err = OptionParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_named("style", &Style::ALL, Style::name, s)
  }
}

impl FromStr for Tone {
  type Err = OptionParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_named("tone", &Tone::ALL, Tone::name, s)
  }
}

impl FromStr for Length {
  type Err = OptionParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_named("length", &Length::ALL, Length::name, s)
  }
}

impl fmt::Display for Style {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl fmt::Display for Tone {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl fmt::Display for Length {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Style, tone and length selected for one request. Recorded in history
/// alongside the request; generation does not vary with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParaphraseOptions {
  pub style: Style,
  pub tone: Tone,
  pub length: Length,
}

impl ParaphraseOptions {
  pub fn new(style: Style, tone: Tone, length: Length) -> Self {
    ParaphraseOptions {
      style,
      tone,
      length,
    }
  }
}

impl fmt::Display for ParaphraseOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Style: {}, Tone: {}, Length: {}",
      self.style, self.tone, self.length
    )
  }
}
