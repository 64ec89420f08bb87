use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::Token;

/// The order of an n-gram model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Order {
	Unigram,
	Bigram,
	Trigram,
}

impl Order {
	/// Number of tokens in an n-gram of this order.
	pub fn n(self) -> u32 {
		match self {
			Order::Unigram => 1,
			Order::Bigram => 2,
			Order::Trigram => 3,
		}
	}
}

impl fmt::Display for Order {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Order::Unigram => f.write_str("unigram"),
			Order::Bigram => f.write_str("bigram"),
			Order::Trigram => f.write_str("trigram"),
		}
	}
}

impl std::str::FromStr for Order {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"1" | "unigram" => Ok(Order::Unigram),
			"2" | "bigram" => Ok(Order::Bigram),
			"3" | "trigram" => Ok(Order::Trigram),
			other => Err(format!("Unknown n-gram order '{}'", other)),
		}
	}
}

/// An ordered pair of tokens.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bigram(pub Token, pub Token);

impl Bigram {
	pub fn new(first: Token, second: Token) -> Self {
		Self(first, second)
	}

	pub fn first(&self) -> &Token {
		&self.0
	}

	pub fn second(&self) -> &Token {
		&self.1
	}
}

impl fmt::Display for Bigram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}; {}]", self.0, self.1)
	}
}

/// An ordered triple of tokens.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Trigram(pub Token, pub Token, pub Token);

impl Trigram {
	pub fn new(first: Token, second: Token, third: Token) -> Self {
		Self(first, second, third)
	}

	pub fn first(&self) -> &Token {
		&self.0
	}

	pub fn second(&self) -> &Token {
		&self.1
	}

	pub fn third(&self) -> &Token {
		&self.2
	}

	/// The two-token context this trigram continues.
	pub fn context(&self) -> (&Token, &Token) {
		(&self.0, &self.1)
	}
}

impl fmt::Display for Trigram {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}; {}; {}]", self.0, self.1, self.2)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bigrams_are_ordered() {
		let a = Bigram::new(Token::word("grey"), Token::word("fox"));
		let b = Bigram::new(Token::word("fox"), Token::word("grey"));
		assert_ne!(a, b);
		assert_eq!(a, Bigram(Token::word("grey"), Token::word("fox")));
		assert_eq!(a.to_string(), "[grey; fox]");
	}

	#[test]
	fn order_parses_names_and_numbers() {
		assert_eq!("Bigram".parse::<Order>(), Ok(Order::Bigram));
		assert_eq!("3".parse::<Order>(), Ok(Order::Trigram));
		assert!("4".parse::<Order>().is_err());
		assert_eq!(Order::Trigram.n(), 3);
	}
}
