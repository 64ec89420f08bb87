use unicode_segmentation::UnicodeSegmentation;

use super::token::Token;

/// Characters split off into tokens of their own.
pub const PUNCTUATION: [char; 8] = ['(', ')', ',', '!', '.', '?', ';', ':'];

/// Splits a sentence into word tokens.
///
/// Every punctuation mark in `( ) , ! . ? ; :` becomes a token of its own;
/// everything else is split on whitespace. No case folding is applied.
///
/// Returns an empty vector for blank input.
pub fn tokenize(sentence: &str) -> Vec<Token> {
	let mut spaced = String::with_capacity(sentence.len() + 8);
	for c in sentence.chars() {
		if PUNCTUATION.contains(&c) {
			spaced.push(' ');
			spaced.push(c);
			spaced.push(' ');
		} else {
			spaced.push(c);
		}
	}

	spaced
		.split_whitespace()
		.map(str::trim)
		.filter(|piece| !piece.is_empty())
		.map(Token::word)
		.collect()
}

/// Splits free text into sentences using Unicode sentence boundaries (UAX #29).
///
/// Decimal numbers and quoted punctuation do not start a new sentence.
/// Segments holding only whitespace are dropped; the others are trimmed.
pub fn split_sentences(text: &str) -> Vec<&str> {
	text.split_sentence_bounds()
		.map(str::trim)
		.filter(|sentence| !sentence.is_empty())
		.collect()
}
