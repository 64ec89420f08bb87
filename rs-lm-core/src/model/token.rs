use std::fmt;

use serde::{Deserialize, Serialize};

/// A single unit of a tokenized sentence.
///
/// A token is either a literal word (punctuation marks are words too) or one
/// of the structural markers bracketing a sentence.
///
/// # Variants
/// - `Start`: sentence-start marker, counted once per sentence.
/// - `End`: sentence-end marker, counted once per sentence.
/// - `Unknown`: placeholder for a word absent from the trained vocabulary.
/// - `AnyWord`: "some vocabulary word". Only appears in the reserved
///   unknown-word keys `(AnyWord, Unknown)` and `(Unknown, AnyWord)`;
///   tokenization never produces it.
/// - `Word(text)`: a literal word or punctuation mark.
///
/// Equality and hashing are structural, so tokens can be used directly as
/// map keys.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
	Start,
	End,
	Unknown,
	AnyWord,
	Word(String),
}

impl Token {
	/// Creates a word token.
	pub fn word<S: Into<String>>(text: S) -> Self {
		Token::Word(text.into())
	}

	/// Returns the literal text of a word token, `None` for markers.
	pub fn as_word(&self) -> Option<&str> {
		match self {
			Token::Word(text) => Some(text),
			_ => None,
		}
	}

	/// `true` for START/END.
	pub fn is_boundary(&self) -> bool {
		matches!(self, Token::Start | Token::End)
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Start => f.write_str("<s>"),
			Token::End => f.write_str("</s>"),
			Token::Unknown => f.write_str("<unk>"),
			Token::AnyWord => f.write_str("<w>"),
			Token::Word(text) => f.write_str(text),
		}
	}
}
