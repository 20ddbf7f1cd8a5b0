// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/parser.rs
//!
//! Key-combination string parser
//!
//! Turns textual combinations like "ALT+WIN+SPACE" or "Ctrl+Shift+F5" into
//! [`KeyCombination`] values. Used by the CLI `bind` command and anywhere a
//! combination arrives as text.
//!
//! Grammar: one or more '+'-separated tokens; every token but the last must
//! be a modifier, the last is the primary key. The literal "NONE" (any case)
//! is the unbound combination. Whitespace around tokens is ignored.
//!
//! The parser only reads and structures data; validation of what a
//! combination *does* lives with the registry.

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    multi::separated_list1,
    sequence::delimited,
    IResult, Parser,
};
use thiserror::Error;

use crate::core::types::{Key, KeyCombination, Modifiers};

/// Errors produced while parsing a combination string.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseError {
    #[error("combination string is empty")]
    Empty,

    #[error("combination has only modifiers, no primary key")]
    MissingKey,

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("unexpected trailing input '{0}'")]
    TrailingInput(String),
}

/// Parses a textual key combination.
///
/// # Example
/// ```
/// use global_hotkey_manager::core::parser::parse_combination;
/// use global_hotkey_manager::core::{Key, Modifiers};
///
/// let combo = parse_combination("Alt+Win+Space")?;
/// assert_eq!(combo.key, Some(Key::Space));
/// assert_eq!(combo.modifiers, Modifiers::ALT | Modifiers::WIN);
/// # Ok::<(), global_hotkey_manager::core::parser::ParseError>(())
/// ```
pub fn parse_combination(input: &str) -> Result<KeyCombination, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    if trimmed.eq_ignore_ascii_case("none") {
        return Ok(KeyCombination::unbound());
    }

    let (rest, tokens) = parse_tokens(trimmed).map_err(|_| ParseError::Empty)?;
    if !rest.trim().is_empty() {
        return Err(ParseError::TrailingInput(rest.trim().to_string()));
    }

    let Some((key_token, modifier_tokens)) = tokens.split_last() else {
        return Err(ParseError::Empty);
    };

    let mut modifiers = Modifiers::empty();
    for token in modifier_tokens {
        modifiers |= modifier_from_name(token)
            .ok_or_else(|| ParseError::UnknownModifier((*token).to_string()))?;
    }

    // "ALT+WIN" ends on a modifier: there is no primary key to bind
    if modifier_from_name(key_token).is_some() {
        return Err(ParseError::MissingKey);
    }

    let key =
        Key::from_name(key_token).ok_or_else(|| ParseError::UnknownKey((*key_token).to_string()))?;

    Ok(KeyCombination::new(modifiers, key))
}

/// Tokenises '+'-separated alphanumeric tokens with optional surrounding
/// whitespace.
fn parse_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(
        delimited(space0, char('+'), space0),
        take_while1(|c: char| c.is_ascii_alphanumeric()),
    )
    .parse(input)
}

/// Maps a modifier token to its flag.
///
/// Accepts the common alternative spellings ("CONTROL", "SUPER", "WINDOWS")
/// so hand-edited mapping files keep working.
fn modifier_from_name(token: &str) -> Option<Modifiers> {
    match token.to_uppercase().as_str() {
        "ALT" | "MOD1" => Some(Modifiers::ALT),
        "CTRL" | "CONTROL" => Some(Modifiers::CONTROL),
        "SHIFT" => Some(Modifiers::SHIFT),
        "WIN" | "WINDOWS" | "SUPER" | "OS" => Some(Modifiers::WIN),
        _ => None,
    }
}

impl std::str::FromStr for KeyCombination {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_combination(s)
    }
}
