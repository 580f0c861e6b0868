//! # Path Expressions
//!
//! A dotted path addresses a nested location in a rule document and,
//! equivalently, in the schema that describes it:
//!
//! ```text
//! timeSupport.enabled
//! timeSupport.options[2]
//! board.cells[1][3].owner
//! ```
//!
//! Parsing splits on `.` and expands every trailing `[n]` suffix into a
//! separate [`PathToken::Index`]. The parsed form is the only form the
//! resolver and the mutation engine accept; raw strings never travel past
//! the CLI boundary.

use std::fmt;
use std::str::FromStr;

use crate::error::PathError;

/// One step of a [`PathExpression`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    /// An object property name.
    Key(String),
    /// A zero-based array position.
    Index(usize),
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// An ordered, non-empty sequence of path tokens.
///
/// The first token is always a [`PathToken::Key`]; paths address locations
/// under a root object, never the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    tokens: Vec<PathToken>,
}

impl PathExpression {
    /// Parse a dotted path such as `a.b[0].c`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Syntax`] for an empty path, an empty segment
    /// (`a..b`), a segment that does not start with a name (`[0]`), or a
    /// malformed index suffix (`a[`, `a[x]`, `a[0]b`).
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let syntax = |reason: &str| PathError::Syntax {
            path: text.to_string(),
            reason: reason.to_string(),
        };

        if text.is_empty() {
            return Err(syntax("path is empty"));
        }

        let mut tokens = Vec::new();
        for segment in text.split('.') {
            if segment.is_empty() {
                return Err(syntax("empty segment"));
            }

            let (name, mut rest) = match segment.find('[') {
                Some(open) => segment.split_at(open),
                None => (segment, ""),
            };
            if name.is_empty() {
                return Err(syntax("segment must start with a property name"));
            }
            if name.contains(']') {
                return Err(syntax("unexpected ']'"));
            }
            tokens.push(PathToken::Key(name.to_string()));

            while !rest.is_empty() {
                let Some(body) = rest.strip_prefix('[') else {
                    return Err(syntax("unexpected text after index"));
                };
                let close = body.find(']').ok_or_else(|| syntax("unterminated index"))?;
                let digits = &body[..close];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(syntax("index must be a non-negative integer"));
                }
                let index: usize = digits
                    .parse()
                    .map_err(|_| syntax("index is too large"))?;
                tokens.push(PathToken::Index(index));
                rest = &body[close + 1..];
            }
        }

        Ok(Self { tokens })
    }

    /// Build a path directly from tokens.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Syntax`] when `tokens` is empty or does not
    /// start with a key.
    pub fn from_tokens(tokens: Vec<PathToken>) -> Result<Self, PathError> {
        match tokens.first() {
            Some(PathToken::Key(_)) => Ok(Self { tokens }),
            Some(PathToken::Index(_)) => Err(PathError::Syntax {
                path: Self { tokens }.to_string(),
                reason: "path must start with a property name".to_string(),
            }),
            None => Err(PathError::Syntax {
                path: String::new(),
                reason: "path is empty".to_string(),
            }),
        }
    }

    /// All tokens, in order.
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for a successfully constructed path.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The final token.
    pub fn last(&self) -> &PathToken {
        // Construction guarantees at least one token.
        &self.tokens[self.tokens.len() - 1]
    }

    /// All tokens except the final one.
    pub fn parent_tokens(&self) -> &[PathToken] {
        &self.tokens[..self.tokens.len() - 1]
    }

    /// A copy of this path with one more index token appended.
    ///
    /// Used to look up the item schema of an array-typed path
    /// (`tags` → `tags[0]`).
    pub fn with_index(&self, index: usize) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(PathToken::Index(index));
        Self { tokens }
    }

    /// A copy of this path with one more key token appended.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(PathToken::Key(key.into()));
        Self { tokens }
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 && matches!(token, PathToken::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> PathToken {
        PathToken::Key(k.to_string())
    }

    #[test]
    fn parse_plain_dotted_path() {
        let p = PathExpression::parse("timeSupport.enabled").unwrap();
        assert_eq!(p.tokens(), &[key("timeSupport"), key("enabled")]);
    }

    #[test]
    fn parse_expands_index_suffix() {
        let p = PathExpression::parse("players[1].name").unwrap();
        assert_eq!(
            p.tokens(),
            &[key("players"), PathToken::Index(1), key("name")]
        );
    }

    #[test]
    fn parse_chained_indices() {
        let p = PathExpression::parse("board.cells[1][3]").unwrap();
        assert_eq!(
            p.tokens(),
            &[
                key("board"),
                key("cells"),
                PathToken::Index(1),
                PathToken::Index(3)
            ]
        );
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        for bad in ["", "a..b", ".a", "a.", "[0]", "a[", "a[]", "a[x]", "a[-1]", "a[0]b", "a]"] {
            let err = PathExpression::parse(bad).unwrap_err();
            assert!(
                matches!(err, PathError::Syntax { .. }),
                "expected syntax error for {bad:?}, got {err}"
            );
        }
    }

    #[test]
    fn display_reproduces_canonical_form() {
        for text in ["a", "a.b.c", "items[0]", "a.b[2].c[0][1].d"] {
            assert_eq!(PathExpression::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn with_index_appends_index_token() {
        let p = PathExpression::parse("tags").unwrap().with_index(0);
        assert_eq!(p.to_string(), "tags[0]");
        assert_eq!(p.last(), &PathToken::Index(0));
        assert_eq!(p.parent_tokens(), &[key("tags")]);
    }

    #[test]
    fn from_tokens_requires_leading_key() {
        assert!(PathExpression::from_tokens(vec![]).is_err());
        assert!(PathExpression::from_tokens(vec![PathToken::Index(0)]).is_err());
        let p = PathExpression::from_tokens(vec![key("a"), PathToken::Index(2)]).unwrap();
        assert_eq!(p.to_string(), "a[2]");
    }

    #[test]
    fn from_str_is_parse() {
        let p: PathExpression = "x.y".parse().unwrap();
        assert_eq!(p.len(), 2);
        assert!(!p.is_empty());
    }
}
