use lipsum::{LIBER_PRIMUS, LOREM_IPSUM, MarkovChain};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// What kind of latin text a lorem spec asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
  Words,
  Sentences,
  Paragraphs,
}

/// Whether the caller wants one joined string or a sequence of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  Scalar,
  Sequence,
}

/// A parsed lorem spec such as `3 words`, `2-4s` or `[10 paragraphs]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoremSpec {
  pub min: u32,
  pub max: u32,
  pub unit: Unit,
  pub shape: Shape,
}

/// Generated output, either one string or an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoremOutput {
  Text(String),
  Items(Vec<String>),
}

/// Parses a lorem spec: optional leading `[` (asking for a sequence), a 1-3
/// digit count or `min-max` range, and a unit token. Reversed ranges are
/// swapped, unrecognized unit tokens fall back to words, and anything that
/// does not fit the grammar yields `None`.
pub fn parse_spec(input: &str) -> Option<LoremSpec> {
  let mut s = input.trim().to_lowercase();

  let shape = if let Some(rest) = s.strip_prefix('[') {
    s = rest.to_string();
    Shape::Sequence
  } else {
    Shape::Scalar
  };
  if let Some(rest) = s.strip_suffix(']') {
    s = rest.to_string();
  }
  let s = s.trim();

  let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
  if digits.is_empty() || digits.len() > 3 {
    return None;
  }
  let min: u32 = digits.parse().ok()?;
  let mut rest = &s[digits.len()..];

  let mut max = min;
  if let Some(after) = rest.strip_prefix('-') {
    let more: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
    if more.is_empty() || more.len() > 3 {
      return None;
    }
    max = more.parse().ok()?;
    rest = &after[more.len()..];
  }

  let token = rest.trim();
  if token.is_empty() || token.len() > 10 || !token.chars().all(|c| c.is_ascii_lowercase()) {
    return None;
  }
  let unit = match token {
    "s" | "sentence" | "sentences" => Unit::Sentences,
    "p" | "paragraph" | "paragraphs" => Unit::Paragraphs,
    // 'w', 'word', 'words' and any other letter run
    _ => Unit::Words,
  };

  let (min, max) = if min <= max { (min, max) } else { (max, min) };
  Some(LoremSpec { min, max, unit, shape })
}

/// Pseudo-random latin text generator, memoized once per request.
///
/// Backed by a Markov chain over the classic corpus; the constructor primes
/// it with one discarded draw so the first real output is not always the
/// same boilerplate opening.
pub struct LatinGenerator {
  chain: MarkovChain<'static>,
  rng: SmallRng,
}

impl Default for LatinGenerator {
  fn default() -> Self {
    Self::new()
  }
}

impl LatinGenerator {
  pub fn new() -> Self {
    let mut chain = MarkovChain::new();
    chain.learn(LOREM_IPSUM);
    chain.learn(LIBER_PRIMUS);
    let rng = SmallRng::from_entropy();
    let mut generator = Self { chain, rng };
    // Priming draw, discarded
    generator.words(2);
    generator
  }

  #[cfg(test)]
  pub fn seeded(seed: u64) -> Self {
    let mut chain = MarkovChain::new();
    chain.learn(LOREM_IPSUM);
    chain.learn(LIBER_PRIMUS);
    let rng = SmallRng::seed_from_u64(seed);
    Self { chain, rng }
  }

  /// Exactly `count` plain lowercase words, space-joined.
  pub fn words(&mut self, count: usize) -> String {
    let mut collected: Vec<String> = Vec::with_capacity(count);
    while collected.len() < count {
      let missing = count - collected.len();
      let raw = self.chain.generate_with_rng(&mut self.rng, missing + 2);
      for word in raw.split_whitespace() {
        let bare: String = word
          .chars()
          .filter(|c| c.is_alphabetic())
          .flat_map(|c| c.to_lowercase())
          .collect();
        if !bare.is_empty() {
          collected.push(bare);
        }
        if collected.len() == count {
          break;
        }
      }
    }
    collected.join(" ")
  }

  /// One sentence of 6 to 14 words ending in a period.
  pub fn sentence(&mut self) -> String {
    let length = self.rng.gen_range(6..=14);
    let mut text = self
      .chain
      .generate_with_rng(&mut self.rng, length)
      .trim_end_matches([',', ';', ':', '.'])
      .to_string();
    text.push('.');
    capitalize(&text)
  }

  pub fn sentences(&mut self, count: usize) -> Vec<String> {
    (0..count).map(|_| self.sentence()).collect()
  }

  /// One paragraph of 3 to 6 sentences.
  pub fn paragraph(&mut self) -> String {
    let length = self.rng.gen_range(3..=6);
    self.sentences(length).join(" ")
  }

  pub fn paragraphs(&mut self, count: usize) -> Vec<String> {
    (0..count).map(|_| self.paragraph()).collect()
  }

  /// Runs a parsed spec, drawing a count from its range.
  pub fn generate(&mut self, spec: &LoremSpec) -> LoremOutput {
    let count = if spec.min == spec.max {
      spec.min as usize
    } else {
      self.rng.gen_range(spec.min..=spec.max) as usize
    };
    let text = |s: String| LoremOutput::Text(capitalize(&s));
    let items = |v: Vec<String>| LoremOutput::Items(v.iter().map(|s| capitalize(s)).collect());
    match (spec.shape, spec.unit) {
      (Shape::Scalar, Unit::Words) => text(self.words(count)),
      (Shape::Scalar, Unit::Sentences) => text(self.sentences(count).join(" ")),
      (Shape::Scalar, Unit::Paragraphs) => text(self.paragraphs(count).join("\n\n")),
      (Shape::Sequence, Unit::Words) => items(self.words_list(count)),
      (Shape::Sequence, Unit::Sentences) => items(self.sentences(count)),
      (Shape::Sequence, Unit::Paragraphs) => items(self.paragraphs(count)),
    }
  }

  fn words_list(&mut self, count: usize) -> Vec<String> {
    if count == 0 {
      return Vec::new();
    }
    self.words(count).split(' ').map(str::to_string).collect()
  }
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize(text: &str) -> String {
  let mut chars = text.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_scalar_and_sequence_shapes() {
    let scalar = parse_spec("3 words").unwrap();
    assert_eq!((scalar.min, scalar.max), (3, 3));
    assert_eq!(scalar.unit, Unit::Words);
    assert_eq!(scalar.shape, Shape::Scalar);

    let seq = parse_spec("[2-4 sentences]").unwrap();
    assert_eq!((seq.min, seq.max), (2, 4));
    assert_eq!(seq.unit, Unit::Sentences);
    assert_eq!(seq.shape, Shape::Sequence);
  }

  #[test]
  fn parses_short_unit_tokens() {
    assert_eq!(parse_spec("5w").unwrap().unit, Unit::Words);
    assert_eq!(parse_spec("1s").unwrap().unit, Unit::Sentences);
    assert_eq!(parse_spec("2p").unwrap().unit, Unit::Paragraphs);
  }

  #[test]
  fn swaps_reversed_ranges() {
    let spec = parse_spec("9-2 words").unwrap();
    assert_eq!((spec.min, spec.max), (2, 9));
  }

  #[test]
  fn rejects_malformed_specs() {
    assert!(parse_spec("bogus").is_none());
    assert!(parse_spec("").is_none());
    assert!(parse_spec("1234 words").is_none());
    assert!(parse_spec("3 w0rds").is_none());
  }

  #[test]
  fn word_output_is_exact_and_capitalized() {
    let mut generator = LatinGenerator::seeded(7);
    let spec = parse_spec("3 words").unwrap();
    let LoremOutput::Text(text) = generator.generate(&spec) else {
      panic!("scalar spec must yield text");
    };
    let words: Vec<&str> = text.split(' ').collect();
    assert_eq!(words.len(), 3);
    assert!(text.chars().next().unwrap().is_uppercase());
    assert!(words.iter().all(|w| w.chars().all(|c| c.is_alphabetic())));
  }

  #[test]
  fn zero_count_sequence_is_empty() {
    let mut generator = LatinGenerator::seeded(3);
    let spec = parse_spec("[0 words]").unwrap();
    let LoremOutput::Items(items) = generator.generate(&spec) else {
      panic!("sequence spec must yield items");
    };
    assert!(items.is_empty());
  }

  #[test]
  fn sentence_sequence_has_requested_length() {
    let mut generator = LatinGenerator::seeded(11);
    let spec = parse_spec("[2-2 sentences]").unwrap();
    let LoremOutput::Items(items) = generator.generate(&spec) else {
      panic!("sequence spec must yield items");
    };
    assert_eq!(items.len(), 2);
    for sentence in items {
      assert!(sentence.chars().next().unwrap().is_uppercase());
      assert!(sentence.ends_with('.'));
    }
  }
}
