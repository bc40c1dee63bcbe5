//! Constrained literal parser for Python-style constant expressions.
//!
//! Only constants are accepted: `None`, booleans, numbers (with an optional
//! unary sign), string literals (including implicit concatenation), and
//! list/tuple/set/dict displays built from those. Names, calls, attribute
//! access, and operators are rejected with a [`LiteralError`]; nothing is
//! ever evaluated.
//!
//! # Examples
//!
//! ```
//! use script_manifest_core::{LiteralValue, parse_literal};
//!
//! assert_eq!(parse_literal("-5").unwrap(), LiteralValue::Int(-5));
//! assert_eq!(parse_literal("'a' \"b\"").unwrap(), LiteralValue::Str("ab".into()));
//! assert!(parse_literal("datetime.now()").is_err());
//! ```

use thiserror::Error;

use crate::LiteralValue;

/// Reasons a source fragment is not a constant literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("'{0}' is a name, not a literal")]
    NotALiteral(String),
    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("integer literal out of range: {0}")]
    IntegerOverflow(String),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unsupported string prefix: {0}")]
    UnsupportedPrefix(String),
    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),
    #[error("list element is not a scalar literal: {0}")]
    NotAScalarList(String),
}

/// Parses one constant literal expression.
pub fn parse_literal(source: &str) -> Result<LiteralValue, LiteralError> {
    let mut parser = LiteralParser::new(source);
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if parser.pos < source.len() {
        return Err(LiteralError::TrailingInput(parser.pos));
    }
    Ok(value)
}

/// Parses a bracketed list of scalar literals into strings.
///
/// Strings keep their content; other scalars use their Python rendering
/// (`1`, `True`, `None`). Nested containers are rejected.
///
/// # Examples
///
/// ```
/// use script_manifest_core::parse_string_list;
///
/// let items = parse_string_list(r#"["a", 'b', 3]"#).unwrap();
/// assert_eq!(items, ["a", "b", "3"]);
/// assert!(parse_string_list("[a, b]").is_err());
/// ```
pub fn parse_string_list(source: &str) -> Result<Vec<String>, LiteralError> {
    let items = match parse_literal(source)? {
        LiteralValue::List(items) | LiteralValue::Tuple(items) => items,
        other => return Err(LiteralError::NotAScalarList(other.to_python())),
    };
    items
        .into_iter()
        .map(|item| match item {
            LiteralValue::Str(text) => Ok(text),
            scalar if scalar.is_scalar() => Ok(scalar.to_python()),
            nested => Err(LiteralError::NotAScalarList(nested.to_python())),
        })
        .collect()
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Skips whitespace, line continuations, and `#` comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '\\' if matches!(self.peek_nth(1), Some('\n' | '\r')) => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_trivia();
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(LiteralError::UnexpectedChar {
                ch,
                offset: self.pos - ch.len_utf8(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(ch) => LiteralError::UnexpectedChar {
                ch,
                offset: self.pos,
            },
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn parse_value(&mut self) -> Result<LiteralValue, LiteralError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => {
                self.bump();
                Ok(LiteralValue::List(self.parse_sequence(']')?))
            }
            Some('(') => self.parse_paren(),
            Some('{') => self.parse_brace(),
            Some(sign @ ('+' | '-')) => {
                self.bump();
                self.skip_trivia();
                match self.parse_number()? {
                    LiteralValue::Int(value) if sign == '-' => value
                        .checked_neg()
                        .map(LiteralValue::Int)
                        .ok_or_else(|| LiteralError::IntegerOverflow(format!("-{value}"))),
                    LiteralValue::Float(value) if sign == '-' => Ok(LiteralValue::Float(-value)),
                    number => Ok(number),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.parse_number(),
            Some('.') if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.parse_number()
            }
            Some('"' | '\'') => self.parse_strings(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.parse_word(),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Parses comma-separated values up to `close`, allowing a trailing comma.
    fn parse_sequence(&mut self, close: char) -> Result<Vec<LiteralValue>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(ch) if ch == close => {
                    self.bump();
                    return Ok(items);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_paren(&mut self) -> Result<LiteralValue, LiteralError> {
        self.bump();
        self.skip_trivia();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(LiteralValue::Tuple(Vec::new()));
        }
        let first = self.parse_value()?;
        self.skip_trivia();
        match self.peek() {
            Some(')') => {
                self.bump();
                Ok(first)
            }
            Some(',') => {
                self.bump();
                let mut items = vec![first];
                items.extend(self.parse_sequence(')')?);
                Ok(LiteralValue::Tuple(items))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_brace(&mut self) -> Result<LiteralValue, LiteralError> {
        self.bump();
        self.skip_trivia();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(LiteralValue::Dict(Vec::new()));
        }
        let first = self.parse_value()?;
        self.skip_trivia();
        if self.peek() != Some(':') {
            let mut items = vec![first];
            match self.peek() {
                Some(',') => {
                    self.bump();
                    items.extend(self.parse_sequence('}')?);
                }
                Some('}') => {
                    self.bump();
                }
                _ => return Err(self.unexpected()),
            }
            return Ok(LiteralValue::Set(items));
        }

        self.bump();
        let mut pairs = vec![(first, self.parse_value()?)];
        loop {
            self.skip_trivia();
            match self.bump() {
                Some('}') => return Ok(LiteralValue::Dict(pairs)),
                Some(',') => {
                    self.skip_trivia();
                    if self.peek() == Some('}') {
                        self.bump();
                        return Ok(LiteralValue::Dict(pairs));
                    }
                    let key = self.parse_value()?;
                    self.expect(':')?;
                    let value = self.parse_value()?;
                    pairs.push((key, value));
                }
                Some(ch) => {
                    return Err(LiteralError::UnexpectedChar {
                        ch,
                        offset: self.pos - ch.len_utf8(),
                    });
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn parse_word(&mut self) -> Result<LiteralValue, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        let word = &self.src[start..self.pos];

        if matches!(self.peek(), Some('"' | '\''))
            && word.len() <= 2
            && word.chars().all(|ch| ch.is_ascii_alphabetic())
        {
            self.pos = start;
            return self.parse_strings();
        }

        match word {
            "None" => Ok(LiteralValue::None),
            "True" => Ok(LiteralValue::Bool(true)),
            "False" => Ok(LiteralValue::Bool(false)),
            _ => Err(LiteralError::NotALiteral(word.to_string())),
        }
    }

    fn parse_number(&mut self) -> Result<LiteralValue, LiteralError> {
        let start = self.pos;
        let radix = match (self.peek(), self.peek_nth(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while self
                .peek()
                .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            {
                self.bump();
            }
            let text = &self.src[start..self.pos];
            let digits: String = self.src[digits_start..self.pos]
                .chars()
                .filter(|&ch| ch != '_')
                .collect();
            if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
                return Err(LiteralError::InvalidNumber(text.to_string()));
            }
            return i64::from_str_radix(&digits, radix)
                .map(LiteralValue::Int)
                .map_err(|_| LiteralError::IntegerOverflow(text.to_string()));
        }

        let mut is_float = false;
        self.eat_digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.eat_digits();
        }
        if self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            // Complex suffixes and malformed tails are not supported.
            while self
                .peek()
                .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
            {
                self.bump();
            }
            return Err(LiteralError::InvalidNumber(
                self.src[start..self.pos].to_string(),
            ));
        }

        let text = &self.src[start..self.pos];
        let cleaned: String = text.chars().filter(|&ch| ch != '_').collect();
        if is_float {
            cleaned
                .parse::<f64>()
                .map(LiteralValue::Float)
                .map_err(|_| LiteralError::InvalidNumber(text.to_string()))
        } else {
            cleaned.parse::<i64>().map(LiteralValue::Int).map_err(|_| {
                if cleaned.chars().all(|ch| ch.is_ascii_digit()) && !cleaned.is_empty() {
                    LiteralError::IntegerOverflow(text.to_string())
                } else {
                    LiteralError::InvalidNumber(text.to_string())
                }
            })
        }
    }

    fn eat_digits(&mut self) {
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '_')
        {
            self.bump();
        }
    }

    /// Parses one or more adjacent string literals and concatenates them.
    fn parse_strings(&mut self) -> Result<LiteralValue, LiteralError> {
        let mut out = self.parse_one_string()?;
        loop {
            let save = self.pos;
            self.skip_trivia();
            if self.at_string_start() {
                out.push_str(&self.parse_one_string()?);
            } else {
                self.pos = save;
                return Ok(LiteralValue::Str(out));
            }
        }
    }

    fn at_string_start(&self) -> bool {
        let rest = self.rest();
        let prefix_len = rest
            .chars()
            .take_while(|ch| ch.is_ascii_alphabetic())
            .count();
        if prefix_len > 2 {
            return false;
        }
        matches!(rest[prefix_len..].chars().next(), Some('"' | '\''))
    }

    fn parse_one_string(&mut self) -> Result<String, LiteralError> {
        let prefix_start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_alphabetic()) {
            self.bump();
        }
        let prefix = self.src[prefix_start..self.pos].to_ascii_lowercase();
        let raw = match prefix.as_str() {
            "" | "u" => false,
            "r" => true,
            _ => return Err(LiteralError::UnsupportedPrefix(prefix)),
        };

        let quote = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let ch = self.bump().ok_or(LiteralError::UnterminatedString)?;
            match ch {
                c if c == quote => {
                    if !triple {
                        return Ok(out);
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        return Ok(out);
                    }
                    out.push(c);
                }
                '\n' if !triple => return Err(LiteralError::UnterminatedString),
                '\\' => {
                    let next = self.bump().ok_or(LiteralError::UnterminatedString)?;
                    if raw {
                        out.push('\\');
                        out.push(next);
                    } else {
                        self.push_escape(next, &mut out)?;
                    }
                }
                other => out.push(other),
            }
        }
    }

    fn push_escape(&mut self, escape: char, out: &mut String) -> Result<(), LiteralError> {
        match escape {
            '\n' => {}
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '\\' | '\'' | '"' => out.push(escape),
            'x' => out.push(self.read_code_point(2)?),
            'u' => out.push(self.read_code_point(4)?),
            'U' => out.push(self.read_code_point(8)?),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|ch| ch.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).ok_or(LiteralError::UnterminatedString)?);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn read_code_point(&mut self, digits: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        for _ in 0..digits {
            match self.peek() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    self.bump();
                }
                _ => return Err(self.unexpected()),
            }
        }
        let text = &self.src[start..self.pos];
        u32::from_str_radix(text, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| LiteralError::InvalidNumber(text.to_string()))
    }
}

impl LiteralValue {
    /// Renders the literal as Python source (the `repr` of the value).
    pub fn to_python(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => python_float(*value),
            Self::Str(value) => python_str(value),
            Self::List(items) => format!("[{}]", join_python(items)),
            Self::Tuple(items) if items.len() == 1 => format!("({},)", items[0].to_python()),
            Self::Tuple(items) => format!("({})", join_python(items)),
            Self::Set(items) if items.is_empty() => "set()".to_string(),
            Self::Set(items) => format!("{{{}}}", join_python(items)),
            Self::Dict(pairs) => {
                let body = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.to_python(), value.to_python()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{body}}}")
            }
        }
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_python())
    }
}

fn join_python(items: &[LiteralValue]) -> String {
    items
        .iter()
        .map(LiteralValue::to_python)
        .collect::<Vec<_>>()
        .join(", ")
}

fn python_float(value: f64) -> String {
    if value.is_nan() {
        return "float('nan')".to_string();
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}float('inf')");
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let rendered = format!("{value:e}");
        let Some((mantissa, exponent)) = rendered.split_once('e') else {
            return rendered;
        };
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }

    let rendered = value.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

fn python_str(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
