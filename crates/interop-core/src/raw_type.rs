//! Unresolved type references as written in the descriptor feed.
//!
//! A reference is a name with optional generic arguments: `TArray<TMap<int, FString>>`.
//! Parsing is structural only. Whether a name exists is decided by the resolver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parse failure for a type reference string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRefParseError {
    #[error("empty type name in '{input}'")]
    EmptyName { input: String },

    #[error("unbalanced '<' '>' in '{input}'")]
    Unbalanced { input: String },

    #[error("unexpected text after '>' in '{input}'")]
    TrailingText { input: String },
}

/// A type name with generic arguments, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RawTypeReference {
    pub name: String,
    pub generic_arguments: Vec<RawTypeReference>,
}

impl RawTypeReference {
    /// A plain, non-generic reference.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_arguments: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<RawTypeReference>) -> Self {
        Self {
            name: name.into(),
            generic_arguments: args,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_arguments.is_empty()
    }

    fn parse_at(input: &str, chars: &[char], pos: &mut usize) -> Result<Self, TypeRefParseError> {
        let start = *pos;
        while *pos < chars.len() && !matches!(chars[*pos], '<' | '>' | ',') {
            *pos += 1;
        }
        let name: String = chars[start..*pos].iter().collect::<String>().trim().to_string();
        if name.is_empty() {
            return Err(TypeRefParseError::EmptyName {
                input: input.to_string(),
            });
        }

        let mut generic_arguments = Vec::new();
        if *pos < chars.len() && chars[*pos] == '<' {
            *pos += 1;
            loop {
                generic_arguments.push(Self::parse_at(input, chars, pos)?);
                match chars.get(*pos) {
                    Some(',') => *pos += 1,
                    Some('>') => {
                        *pos += 1;
                        break;
                    }
                    _ => {
                        return Err(TypeRefParseError::Unbalanced {
                            input: input.to_string(),
                        });
                    }
                }
            }
            // whitespace between a closing '>' and the next separator
            while *pos < chars.len() && chars[*pos].is_whitespace() {
                *pos += 1;
            }
        }

        Ok(Self {
            name,
            generic_arguments,
        })
    }
}

impl FromStr for RawTypeReference {
    type Err = TypeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        let mut pos = 0;
        let parsed = Self::parse_at(s, &chars, &mut pos)?;
        match chars.get(pos) {
            None => Ok(parsed),
            Some('>') => Err(TypeRefParseError::Unbalanced {
                input: s.to_string(),
            }),
            Some(_) => Err(TypeRefParseError::TrailingText {
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RawTypeReference {
    type Error = TypeRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RawTypeReference> for String {
    fn from(r: RawTypeReference) -> Self {
        r.to_string()
    }
}

impl fmt::Display for RawTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_generic() {
            write!(f, "<")?;
            for (i, arg) in self.generic_arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
