//! Path expressions for locating a value inside a search response.
//!
//! Dialect:
//! - `a.b.c` nested field access, `\.` for a literal dot inside a key
//! - `a.0.b` / `a[0].b` array index (a numeric segment on an object is a key)
//! - `a["x.y"]` / `a['x.y']` quoted key
//! - `a.#` length of the array at `a`, only as the last segment

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("empty segment at position {0}")]
    EmptySegment(usize),

    #[error("dangling escape at end of path")]
    TrailingEscape,

    #[error("unclosed bracket opened at position {0}")]
    UnclosedBracket(usize),

    #[error("invalid array index at position {0}")]
    InvalidIndex(usize),

    #[error("unexpected character '{ch}' at position {pos}")]
    Unexpected { pos: usize, ch: char },

    #[error("'#' is only allowed as the last segment")]
    CountNotLast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object key, or array index when numeric and applied to an array.
    Field(String),
    /// Quoted key; never treated as an index.
    Key(String),
    /// Array length.
    Count,
}

impl Segment {
    /// A dotted segment; only an unescaped `#` means length.
    fn dotted(raw: String, escaped: bool) -> Self {
        if raw == "#" && !escaped {
            Segment::Count
        } else {
            Segment::Field(raw)
        }
    }
}

/// A parsed, validated path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        if expr.trim().is_empty() {
            return Err(PathError::Empty);
        }

        let chars: Vec<char> = expr.chars().collect();
        let mut segments = Vec::new();
        let mut current = String::new();
        // `current` holds an escaped character.
        let mut escaped = false;
        // A segment is expected: at the start and right after a '.'.
        let mut pending = true;
        // Right after a ']'; only '.', '[' or the end may follow.
        let mut closed = false;

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            match c {
                '\\' => {
                    if closed {
                        return Err(PathError::Unexpected { pos: i, ch: c });
                    }
                    let next = chars.get(i + 1).ok_or(PathError::TrailingEscape)?;
                    current.push(*next);
                    escaped = true;
                    pending = false;
                    i += 2;
                    continue;
                }
                '.' => {
                    if closed {
                        closed = false;
                    } else if current.is_empty() {
                        return Err(PathError::EmptySegment(i));
                    } else {
                        segments.push(Segment::dotted(std::mem::take(&mut current), escaped));
                        escaped = false;
                    }
                    pending = true;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Segment::dotted(std::mem::take(&mut current), escaped));
                        escaped = false;
                    } else if pending && !segments.is_empty() {
                        return Err(PathError::EmptySegment(i));
                    }
                    let (segment, end) = parse_bracket(&chars, i)?;
                    segments.push(segment);
                    closed = true;
                    pending = false;
                    i = end + 1;
                    continue;
                }
                _ => {
                    if closed {
                        return Err(PathError::Unexpected { pos: i, ch: c });
                    }
                    current.push(c);
                    pending = false;
                }
            }
            i += 1;
        }

        if !current.is_empty() {
            segments.push(Segment::dotted(current, escaped));
        } else if pending {
            return Err(PathError::EmptySegment(chars.len()));
        }

        if let Some(pos) = segments.iter().position(|s| *s == Segment::Count) {
            if pos != segments.len() - 1 {
                return Err(PathError::CountNotLast);
            }
        }

        Ok(Self {
            raw: expr.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk `doc` along the path. `None` means the path does not resolve.
    pub fn select<'a>(&self, doc: &'a Value) -> Option<Cow<'a, Value>> {
        let mut current = doc;
        for segment in &self.segments {
            current = match segment {
                Segment::Field(name) => match current {
                    Value::Object(map) => map.get(name)?,
                    Value::Array(items) => items.get(name.parse::<usize>().ok()?)?,
                    _ => return None,
                },
                Segment::Key(key) => current.as_object()?.get(key)?,
                Segment::Count => {
                    let len = current.as_array()?.len();
                    return Some(Cow::Owned(Value::from(len)));
                }
            };
        }
        Some(Cow::Borrowed(current))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse `[...]` starting at `start`. Returns the segment and the index of `]`.
fn parse_bracket(chars: &[char], start: usize) -> Result<(Segment, usize), PathError> {
    let mut j = start + 1;
    match chars.get(j) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            j += 1;
            let mut key = String::new();
            loop {
                match chars.get(j) {
                    None => return Err(PathError::UnclosedBracket(start)),
                    Some('\\') => {
                        let escaped = chars.get(j + 1).ok_or(PathError::UnclosedBracket(start))?;
                        key.push(*escaped);
                        j += 2;
                    }
                    Some(&c) if c == quote => {
                        j += 1;
                        break;
                    }
                    Some(&c) => {
                        key.push(c);
                        j += 1;
                    }
                }
            }
            if chars.get(j) != Some(&']') {
                return Err(PathError::UnclosedBracket(start));
            }
            Ok((Segment::Key(key), j))
        }
        _ => {
            let mut digits = String::new();
            loop {
                match chars.get(j) {
                    None => return Err(PathError::UnclosedBracket(start)),
                    Some(']') => break,
                    Some(c) if c.is_ascii_digit() => digits.push(*c),
                    Some(_) => return Err(PathError::InvalidIndex(j)),
                }
                j += 1;
            }
            if digits.is_empty() {
                return Err(PathError::InvalidIndex(start));
            }
            Ok((Segment::Field(digits), j))
        }
    }
}
