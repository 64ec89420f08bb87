//! Corpus readers turning raw corpus files into cleaned sentences.
//!
//! The model only ever sees sentence strings; everything specific to a
//! corpus layout (verse numbers, review CSV fields, markup tags) is removed
//! here.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::tokenizer::split_sentences;

/// Layout of a corpus file.
///
/// # Variants
/// - `Bible`: verses introduced by `chapter:verse` designations, possibly
///   with `<…>` markup.
/// - `Hotel`: one review per line, `label,rating,text`.
/// - `Plain`: one sentence per non-empty line.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
	Bible,
	Hotel,
	#[default]
	Plain,
}

impl std::str::FromStr for CorpusKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"b" | "bible" => Ok(CorpusKind::Bible),
			"h" | "hotel" => Ok(CorpusKind::Hotel),
			"p" | "plain" => Ok(CorpusKind::Plain),
			other => Err(format!("Unknown corpus kind '{}'", other)),
		}
	}
}

impl CorpusKind {
	/// Splits a raw corpus into cleaned, non-empty sentences.
	pub fn sentences(self, text: &str) -> Vec<String> {
		let sentences: Vec<String> = match self {
			CorpusKind::Bible => split_verses(text)
				.into_iter()
				.map(|verse| strip_tags(verse).split_whitespace().collect::<Vec<_>>().join(" "))
				.filter(|verse| !verse.is_empty())
				.collect(),
			CorpusKind::Hotel => text
				.lines()
				.flat_map(|line| {
					let review = strip_tags(strip_review_fields(line));
					split_sentences(&review).into_iter().map(str::to_owned).collect::<Vec<_>>()
				})
				.collect(),
			CorpusKind::Plain => text
				.lines()
				.map(str::trim)
				.filter(|line| !line.is_empty())
				.map(str::to_owned)
				.collect(),
		};
		debug!("{:?} corpus split into {} sentences", self, sentences.len());
		sentences
	}
}

/// Removes `<…>` markup: on every line, everything from the first `<` to the
/// last `>` after it.
pub fn strip_tags(text: &str) -> String {
	text.split('\n')
		.map(|line| match (line.find('<'), line.rfind('>')) {
			(Some(open), Some(close)) if close > open => format!("{}{}", &line[..open], &line[close + 1..]),
			_ => line.to_owned(),
		})
		.collect::<Vec<_>>()
		.join("\n")
}

fn digits_end(bytes: &[u8], from: usize) -> usize {
	let mut end = from;
	while end < bytes.len() && bytes[end].is_ascii_digit() {
		end += 1;
	}
	end
}

/// Splits text at every `<digits>:<digits>` verse designation, dropping the
/// designations themselves.
pub fn split_verses(text: &str) -> Vec<&str> {
	let bytes = text.as_bytes();
	let mut verses = Vec::new();
	let mut start = 0;
	let mut i = 0;

	while i < bytes.len() {
		if !bytes[i].is_ascii_digit() {
			i += 1;
			continue;
		}
		let chapter_end = digits_end(bytes, i);
		if chapter_end < bytes.len() && bytes[chapter_end] == b':' {
			let verse_end = digits_end(bytes, chapter_end + 1);
			if verse_end > chapter_end + 1 {
				verses.push(&text[start..i]);
				start = verse_end;
				i = verse_end;
				continue;
			}
		}
		i = chapter_end;
	}
	verses.push(&text[start..]);
	verses
}

/// Parses the `label,rating,` prefix of a review line.
fn review_fields(line: &str) -> Option<(Option<bool>, u8, &str)> {
	let mut parts = line.splitn(3, ',');
	let label = match parts.next()?.trim() {
		"1" => Some(true),
		"0" => Some(false),
		"?" => None,
		_ => return None,
	};
	let rating = parts.next()?.trim().parse().ok()?;
	Some((label, rating, parts.next()?))
}

/// Drops the leading `label,rating,` fields of a review line, if present.
pub fn strip_review_fields(line: &str) -> &str {
	review_fields(line).map_or(line, |(_, _, text)| text)
}

/// One hotel review.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Review {
	/// `Some(true)` truthful, `Some(false)` deceptive, `None` unlabelled.
	pub label: Option<bool>,
	pub rating: u8,
	pub text: String,
}

impl Review {
	/// The review's cleaned sentences.
	pub fn sentences(&self) -> Vec<String> {
		split_sentences(&strip_tags(&self.text)).into_iter().map(str::to_owned).collect()
	}
}

/// Parses `label,rating,text` lines; lines not in that form are skipped.
pub fn parse_reviews(text: &str) -> Vec<Review> {
	text.lines()
		.filter_map(|line| {
			let parsed = review_fields(line);
			if parsed.is_none() && !line.trim().is_empty() {
				debug!("skipping malformed review line: {}", line);
			}
			parsed
		})
		.map(|(label, rating, text)| Review { label, rating, text: text.trim().to_owned() })
		.collect()
}
