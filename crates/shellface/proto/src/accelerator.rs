//! # Accelerator
//!
//! Parses GTK-style accelerator strings as sent to `GrabAccelerator`, such as
//! `"<Super>space"`, `"<Control><Alt>Delete"` or `"XF86AudioMute"`.
//!
//! ## Supported Syntax
//!
//! ```text
//! accelerator = modifier* key
//! modifier    = "<" name ">"
//! name        = "shift" | "control" | "ctrl" | "primary" | "alt" | "mod1"
//!             | "super" | "hyper" | "meta"            (case-insensitive)
//! key         = keysym-char+                            (no '<', '>' or whitespace)
//! ```
//!
//! Parsed accelerators are normalized: modifier aliases collapse, modifiers
//! render in a fixed order, and single-letter keys are lowercased. Key names
//! compare without regard to ASCII case, as keysym lookup does, so
//! `<super>SPACE` and `<Super>space` denote the same binding.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
	/// Modifier keys of an accelerator.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
	pub struct Modifiers: u8 {
		/// Shift
		const SHIFT = 1 << 0;
		/// Control (aliases `Ctrl`, `Primary`)
		const CONTROL = 1 << 1;
		/// Alt (alias `Mod1`)
		const ALT = 1 << 2;
		/// Super
		const SUPER = 1 << 3;
		/// Hyper
		const HYPER = 1 << 4;
		/// Meta
		const META = 1 << 5;
	}
}

/// Rendering order and canonical names of the modifiers.
const MODIFIER_NAMES: [(Modifiers, &str); 6] = [
	(Modifiers::SHIFT, "Shift"),
	(Modifiers::CONTROL, "Control"),
	(Modifiers::ALT, "Alt"),
	(Modifiers::SUPER, "Super"),
	(Modifiers::HYPER, "Hyper"),
	(Modifiers::META, "Meta"),
];

/// A normalized keyboard accelerator.
///
/// Equality and hashing ignore the ASCII case of [`Accelerator::key`]; the
/// spelling is kept for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accelerator {
	/// Held modifiers.
	pub modifiers: Modifiers,
	/// Key symbol name, e.g. `space`, `a`, `XF86AudioMute`.
	pub key: String,
}

impl PartialEq for Accelerator {
	fn eq(&self, other: &Self) -> bool {
		self.modifiers == other.modifiers && self.key.eq_ignore_ascii_case(&other.key)
	}
}

impl Eq for Accelerator {}

impl Hash for Accelerator {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.modifiers.hash(state);
		for byte in self.key.bytes() {
			state.write_u8(byte.to_ascii_lowercase());
		}
		state.write_usize(self.key.len());
	}
}

/// Represents an error that occurred while parsing an accelerator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid accelerator at position {position}: {message}")]
pub struct AcceleratorParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

struct Parser<'a> {
	input: &'a str,
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	fn next(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		self.input = &self.input[ch.len_utf8()..];
		Some(ch)
	}

	fn take_while<F>(&mut self, predicate: F) -> &'a str
	where
		F: Fn(char) -> bool,
	{
		let end = self
			.input
			.char_indices()
			.find(|&(_, ch)| !predicate(ch))
			.map_or(self.input.len(), |(i, _)| i);
		let (taken, rest) = self.input.split_at(end);
		self.position += end;
		self.input = rest;
		taken
	}

	fn error(&self, message: impl Into<String>) -> AcceleratorParseError {
		AcceleratorParseError {
			message: message.into(),
			position: self.position,
		}
	}
}

fn parse_modifier(parser: &mut Parser) -> Result<Modifiers, AcceleratorParseError> {
	// Caller has already seen '<'.
	parser.next();
	let start = parser.position;
	let name = parser.take_while(|ch| ch != '>' && ch != '<');

	match parser.next() {
		Some('>') => {}
		_ => return Err(parser.error("unterminated modifier, expected '>'")),
	}

	match name.to_ascii_lowercase().as_str() {
		"shift" => Ok(Modifiers::SHIFT),
		"control" | "ctrl" | "primary" => Ok(Modifiers::CONTROL),
		"alt" | "mod1" => Ok(Modifiers::ALT),
		"super" => Ok(Modifiers::SUPER),
		"hyper" => Ok(Modifiers::HYPER),
		"meta" => Ok(Modifiers::META),
		_ => Err(AcceleratorParseError {
			message: format!("unknown modifier '{name}'"),
			position: start,
		}),
	}
}

/// Parses and normalizes an accelerator string.
///
/// # Errors
///
/// Returns an [`AcceleratorParseError`] for unknown modifiers, unbalanced
/// brackets, a missing key, or whitespace inside the key.
pub fn parse(s: &str) -> Result<Accelerator, AcceleratorParseError> {
	let mut parser = Parser::new(s.trim());
	let mut modifiers = Modifiers::empty();

	while parser.peek() == Some('<') {
		modifiers |= parse_modifier(&mut parser)?;
	}

	let key = parser.take_while(|ch| ch != '<' && ch != '>' && !ch.is_whitespace());
	if key.is_empty() {
		return Err(parser.error("expected a key name"));
	}
	if let Some(ch) = parser.peek() {
		return Err(parser.error(format!("unexpected '{ch}' after key name")));
	}

	let key = if key.len() == 1 {
		key.to_ascii_lowercase()
	} else {
		key.to_string()
	};

	Ok(Accelerator { modifiers, key })
}

impl FromStr for Accelerator {
	type Err = AcceleratorParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}

impl fmt::Display for Accelerator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (flag, name) in MODIFIER_NAMES {
			if self.modifiers.contains(flag) {
				write!(f, "<{name}>")?;
			}
		}
		f.write_str(&self.key)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn parses_super_space() {
		let accel = parse("<Super>space").unwrap();
		assert_eq!(accel.modifiers, Modifiers::SUPER);
		assert_eq!(accel.key, "space");
		assert_eq!(accel.to_string(), "<Super>space");
	}

	#[test]
	fn aliases_and_order_normalize() {
		let a = parse("<ctrl><Shift>T").unwrap();
		let b = parse("<Shift><Primary>t").unwrap();
		assert_eq!(a, b);
		assert_eq!(a.to_string(), "<Shift><Control>t");
		assert_eq!(parse("<Mod1>F4").unwrap().to_string(), "<Alt>F4");
	}

	#[test]
	fn key_names_compare_without_case() {
		use std::collections::HashSet;

		let a = parse("<Super>space").unwrap();
		let b = parse("<super>SPACE").unwrap();
		assert_eq!(a, b);
		assert_eq!(HashSet::from([a.clone(), b]).len(), 1);
		assert_eq!(a.to_string(), "<Super>space");
		assert_ne!(a, parse("<Shift>space").unwrap());
		assert_eq!(parse("xf86audiomute").unwrap(), parse("XF86AudioMute").unwrap());
	}

	#[test]
	fn bare_keysym_is_valid() {
		let accel = parse("XF86AudioMute").unwrap();
		assert!(accel.modifiers.is_empty());
		assert_eq!(accel.key, "XF86AudioMute");
	}

	#[test]
	fn rejects_malformed_input() {
		assert_eq!(parse("<Super>").unwrap_err().message, "expected a key name");
		assert_eq!(parse("").unwrap_err().position, 0);
		assert!(parse("<Super space").is_err());
		assert!(parse("<Banana>a").unwrap_err().message.contains("Banana"));
		assert!(parse("<Super>a b").is_err());
		assert!(parse("a<Super>").is_err());
	}
}
