//! Partial JSON repair.
//!
//! [`decode_partial`] turns a truncated JSON prefix into the largest
//! well-formed value the text supports, plus a frontier: the path from the
//! root to the deepest value still awaiting input. A path is open exactly
//! when it is a prefix of the frontier; everything else in the value is
//! closed and will never change as more input arrives.
//!
//! Repair handles truncation only. Corrupt input (an unexpected character
//! that no continuation could fix) is still a [`DecodeError`].
//!
//! Repair decisions:
//! * unterminated containers are closed, with the container on the frontier
//! * unterminated strings keep the content seen so far and stay open
//! * scalar tokens cut off by end of input are dropped entirely, including
//!   numbers whose text runs to the end (a longer number may follow)

use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::error::DecodeError;

/// One step of a frontier or field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSeg {
    /// An object field.
    Key(String),
    /// A list index.
    Index(usize),
}

/// Render a path as a dotted string, e.g. `items.2.label`.
#[must_use]
pub fn path_to_string(path: &[PathSeg]) -> String {
    let mut out = String::new();
    for seg in path {
        if !out.is_empty() {
            out.push('.');
        }
        match seg {
            PathSeg::Key(k) => out.push_str(k),
            PathSeg::Index(i) => out.push_str(&i.to_string()),
        }
    }
    out
}

/// The result of repairing a truncated JSON prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialValue {
    /// The repaired value.
    pub value: JsonValue,
    /// Path to the deepest open value. `None` means the document parsed
    /// completely and everything is closed.
    pub frontier: Option<Vec<PathSeg>>,
}

impl PartialValue {
    /// Whether the whole document parsed without repair.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frontier.is_none()
    }

    /// Whether the value at `path` may still change with more input.
    ///
    /// The root path is `&[]`, which is open whenever the document is
    /// incomplete.
    #[must_use]
    pub fn is_open(&self, path: &[PathSeg]) -> bool {
        match &self.frontier {
            None => false,
            Some(frontier) => {
                path.len() <= frontier.len() && frontier[..path.len()] == *path
            }
        }
    }

    /// Whether the value at `path` is final.
    #[must_use]
    pub fn is_closed(&self, path: &[PathSeg]) -> bool {
        !self.is_open(path)
    }

    /// For a top-level list, how many leading elements are closed.
    ///
    /// Returns `None` when the value is not a list.
    #[must_use]
    pub fn closed_elements(&self) -> Option<usize> {
        let items = self.value.as_array()?;
        match &self.frontier {
            None => Some(items.len()),
            Some(frontier) => match frontier.first() {
                Some(PathSeg::Index(open)) => Some(*open),
                Some(PathSeg::Key(_)) => None,
                // the list itself is open but every parsed element is closed
                None => Some(items.len()),
            },
        }
    }
}

/// Repair a truncated JSON prefix.
pub fn decode_partial(text: &str) -> Result<PartialValue, DecodeError> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    if parser.at_end() {
        return Err(DecodeError::Empty);
    }
    match parser.parse_value()? {
        Parsed::Closed(value) => Ok(PartialValue {
            value,
            frontier: None,
        }),
        Parsed::Open(value, frontier) => Ok(PartialValue {
            value,
            frontier: Some(frontier),
        }),
        Parsed::Truncated => Err(DecodeError::Empty),
    }
}

enum Parsed {
    /// A finished value, terminated by its own syntax.
    Closed(JsonValue),
    /// A value cut off by end of input, with the path to its open part.
    Open(JsonValue, Vec<PathSeg>),
    /// A scalar token cut off by end of input; nothing usable.
    Truncated,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> DecodeError {
        let mut line = 1;
        let mut column = 1;
        for c in &self.chars[..self.pos.min(self.chars.len())] {
            if *c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        DecodeError::syntax(message, line, column)
    }

    fn parse_value(&mut self) -> Result<Parsed, DecodeError> {
        self.skip_ws();
        match self.peek() {
            None => Ok(Parsed::Truncated),
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => Ok(self.parse_string_value()),
            Some('t') => self.parse_literal("true", JsonValue::Bool(true)),
            Some('f') => self.parse_literal("false", JsonValue::Bool(false)),
            Some('n') => self.parse_literal("null", JsonValue::Null),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    fn parse_object(&mut self) -> Result<Parsed, DecodeError> {
        self.bump();
        let mut map = JsonMap::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Ok(Parsed::Open(JsonValue::Object(map), Vec::new())),
                Some('}') => {
                    self.bump();
                    return Ok(Parsed::Closed(JsonValue::Object(map)));
                }
                Some(',') if !map.is_empty() => {
                    self.bump();
                    self.skip_ws();
                    if self.at_end() {
                        return Ok(Parsed::Open(JsonValue::Object(map), Vec::new()));
                    }
                }
                Some('"') => {}
                Some(c) => return Err(self.error(format!("unexpected character '{c}' in object"))),
            }

            // key
            self.skip_ws();
            let key = match self.peek() {
                None => return Ok(Parsed::Open(JsonValue::Object(map), Vec::new())),
                Some('"') => match self.parse_string_value() {
                    Parsed::Closed(JsonValue::String(key)) => key,
                    // a half-written key means the pair is dropped
                    _ => return Ok(Parsed::Open(JsonValue::Object(map), Vec::new())),
                },
                Some(c) => return Err(self.error(format!("expected a key, found '{c}'"))),
            };

            self.skip_ws();
            match self.peek() {
                None => return Ok(Parsed::Open(JsonValue::Object(map), Vec::new())),
                Some(':') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("expected ':', found '{c}'"))),
            }

            match self.parse_value()? {
                Parsed::Truncated => {
                    return Ok(Parsed::Open(JsonValue::Object(map), Vec::new()));
                }
                Parsed::Open(value, mut frontier) => {
                    map.insert(key.clone(), value);
                    frontier.insert(0, PathSeg::Key(key));
                    return Ok(Parsed::Open(JsonValue::Object(map), frontier));
                }
                Parsed::Closed(value) => {
                    map.insert(key, value);
                }
            }
        }
    }

    fn parse_array(&mut self) -> Result<Parsed, DecodeError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Ok(Parsed::Open(JsonValue::Array(items), Vec::new())),
                Some(']') => {
                    self.bump();
                    return Ok(Parsed::Closed(JsonValue::Array(items)));
                }
                Some(',') if !items.is_empty() => {
                    self.bump();
                }
                _ => {}
            }

            match self.parse_value()? {
                Parsed::Truncated => {
                    return Ok(Parsed::Open(JsonValue::Array(items), Vec::new()));
                }
                Parsed::Open(value, mut frontier) => {
                    let index = items.len();
                    items.push(value);
                    frontier.insert(0, PathSeg::Index(index));
                    return Ok(Parsed::Open(JsonValue::Array(items), frontier));
                }
                Parsed::Closed(value) => {
                    items.push(value);
                }
            }
        }
    }

    /// Parse a string. Unterminated strings keep the decoded content so far
    /// and come back open; a trailing half-finished escape is dropped.
    fn parse_string_value(&mut self) -> Parsed {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Parsed::Open(JsonValue::String(out), Vec::new()),
                Some('"') => return Parsed::Closed(JsonValue::String(out)),
                Some('\\') => match self.bump() {
                    None => return Parsed::Open(JsonValue::String(out), Vec::new()),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('/') => out.push('/'),
                    Some('b') => out.push('\u{0008}'),
                    Some('f') => out.push('\u{000C}'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('u') => match self.parse_unicode_escape() {
                        Some(c) => out.push(c),
                        None => return Parsed::Open(JsonValue::String(out), Vec::new()),
                    },
                    // an unknown escape is kept verbatim rather than rejected
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Option<char> {
        let code = self.parse_hex4()?;
        // surrogate pair
        if (0xD800..0xDC00).contains(&code) {
            if self.peek() == Some('\\') {
                let save = self.pos;
                self.bump();
                if self.bump() == Some('u') {
                    if let Some(low) = self.parse_hex4() {
                        if (0xDC00..0xE000).contains(&low) {
                            let combined =
                                0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                            return char::from_u32(combined);
                        }
                    }
                }
                self.pos = save;
            }
            return Some(char::REPLACEMENT_CHARACTER);
        }
        char::from_u32(code).or(Some(char::REPLACEMENT_CHARACTER))
    }

    fn parse_hex4(&mut self) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self.bump()?.to_digit(16)?;
            code = code * 16 + digit;
        }
        Some(code)
    }

    fn parse_literal(&mut self, literal: &str, value: JsonValue) -> Result<Parsed, DecodeError> {
        for expected in literal.chars() {
            match self.bump() {
                None => return Ok(Parsed::Truncated),
                Some(c) if c == expected => {}
                Some(c) => return Err(self.error(format!("unexpected character '{c}'"))),
            }
        }
        Ok(Parsed::Closed(value))
    }

    /// A number terminated by end of input is truncated: more digits could
    /// follow, so the token is dropped to keep repair monotonic.
    fn parse_number(&mut self) -> Result<Parsed, DecodeError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some('-' | '+' | '.' | 'e' | 'E') | Some('0'..='9')
        ) {
            self.pos += 1;
        }
        if self.at_end() {
            return Ok(Parsed::Truncated);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Parsed::Closed(JsonValue::Number(Number::from(n))));
        }
        if let Ok(f) = text.parse::<f64>() {
            if let Some(n) = Number::from_f64(f) {
                return Ok(Parsed::Closed(JsonValue::Number(n)));
            }
        }
        Err(self.error(format!("invalid number '{text}'")))
    }
}
