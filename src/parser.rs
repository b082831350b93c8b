// src/parser.rs

use std::fmt;

use crate::error::{EvalError, ParseError, ParseErrorKind};
use crate::history::ResultsHistory;
use crate::value::Value;

/// Escape sequences recognised inside double-quoted strings.
static ESCAPES: phf::Map<char, char> = phf::phf_map! {
    'n' => '\n',
    't' => '\t',
    'r' => '\r',
    '"' => '"',
    '\\' => '\\',
};

const PIPE: &str = "|>";

// --- Argument Map ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKey {
    Named(String),
    Positional(usize),
}

impl fmt::Display for ArgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKey::Named(name) => write!(f, "{}", name),
            ArgKey::Positional(i) => write!(f, "{}", i),
        }
    }
}

/// Arguments of one pipeline segment, in source order. Re-inserting a key overwrites it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentMap {
    entries: Vec<(ArgKey, Value)>,
}

impl ArgumentMap {
    pub fn new() -> Self {
        ArgumentMap::default()
    }

    /// Returns the value previously stored under `key`, if any.
    pub fn insert(&mut self, key: ArgKey, value: Value) -> Option<Value> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn named(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(ArgKey::Named(name.to_string()), value.into());
        self
    }

    pub fn positional(mut self, value: impl Into<Value>) -> Self {
        let next = self
            .entries
            .iter()
            .filter(|(k, _)| matches!(k, ArgKey::Positional(_)))
            .count();
        self.insert(ArgKey::Positional(next), value.into());
        self
    }

    pub fn get(&self, key: &ArgKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find_map(|(k, v)| match k {
            ArgKey::Named(n) if n == name => Some(v),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArgKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl IntoIterator for ArgumentMap {
    type Item = (ArgKey, Value);
    type IntoIter = std::vec::IntoIter<(ArgKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// One `operator args...` unit of a `|>` pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub operator: String,
    pub args: ArgumentMap,
}

// --- The Parser ---

pub struct Parser<'h> {
    input: Vec<char>,
    pos: usize,
    // Column of input[0] within the command line, 1-based.
    base_col: usize,
    history: &'h ResultsHistory,
}

impl<'h> Parser<'h> {
    pub fn new(input: &str, base_col: usize, history: &'h ResultsHistory) -> Self {
        Parser {
            input: input.chars().collect(),
            pos: 0,
            base_col,
            history,
        }
    }

    fn current_char(&self) -> Option<char> { self.input.get(self.pos).copied() }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn col(&self) -> usize {
        self.base_col + self.pos
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn error_at(&self, kind: ParseErrorKind, col: usize) -> EvalError {
        EvalError::Parse(ParseError { kind, col })
    }

    fn error(&self, kind: ParseErrorKind) -> EvalError {
        self.error_at(kind, self.col())
    }

    pub fn parse_segment(&mut self) -> Result<Segment, EvalError> {
        self.skip_whitespace();
        let operator = self.read_word();
        if operator.is_empty() {
            return Err(self.error(ParseErrorKind::MissingOperator));
        }

        let mut args = ArgumentMap::new();
        let mut positional = 0;
        loop {
            self.skip_whitespace();
            if self.current_char().is_none() {
                break;
            }
            if let Some(key) = self.try_key() {
                if self.current_char().map_or(true, char::is_whitespace) {
                    return Err(self.error(ParseErrorKind::MissingValue(key)));
                }
                let value = self.parse_value()?;
                self.expect_separator()?;
                args.insert(ArgKey::Named(key), value);
            } else {
                let value = self.parse_value()?;
                self.expect_separator()?;
                args.insert(ArgKey::Positional(positional), value);
                positional += 1;
            }
        }
        tracing::trace!(operator = %operator, args = args.len(), "parsed segment");
        Ok(Segment { operator, args })
    }

    /// Parses the whole input as a single literal.
    pub fn parse_literal(&mut self) -> Result<Value, EvalError> {
        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        match self.current_char() {
            Some(c) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            None => Ok(value),
        }
    }

    // Arguments end at whitespace or end of input; `"a"b` and `[1]x` are rejected.
    fn expect_separator(&self) -> Result<(), EvalError> {
        match self.current_char() {
            Some(c) if !c.is_whitespace() => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            _ => Ok(()),
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                break;
            }
            word.push(c);
            self.advance();
        }
        word
    }

    // Consumes `key=` when the cursor sits on an identifier followed by '='.
    fn try_key(&mut self) -> Option<String> {
        let first = self.current_char()?;
        if !(first.is_ascii_alphabetic() || first == '_') {
            return None;
        }
        let mut end = self.pos;
        while let Some(&c) = self.input.get(end) {
            if c.is_ascii_alphanumeric() || c == '_' {
                end += 1;
            } else {
                break;
            }
        }
        if self.input.get(end) != Some(&'=') {
            return None;
        }
        let key: String = self.input[self.pos..end].iter().collect();
        self.pos = end + 1;
        Some(key)
    }

    fn parse_value(&mut self) -> Result<Value, EvalError> {
        match self.current_char() {
            Some('[') => self.parse_list(),
            Some('"') => self.parse_string().map(Value::Str),
            Some(_) => {
                let col = self.col();
                let token = self.read_word();
                self.parse_bare(&token, col)
            }
            None => Err(self.error(ParseErrorKind::MissingValue(String::new()))),
        }
    }

    fn parse_string(&mut self) -> Result<String, EvalError> {
        let start_col = self.col();
        self.advance(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.current_char() {
                None => return Err(self.error_at(ParseErrorKind::UnterminatedString, start_col)),
                Some('"') => {
                    self.advance();
                    return Ok(s);
                }
                Some('\\') => {
                    self.advance();
                    let c = self
                        .current_char()
                        .ok_or_else(|| self.error_at(ParseErrorKind::UnterminatedString, start_col))?;
                    let decoded = ESCAPES
                        .get(&c)
                        .copied()
                        .ok_or_else(|| self.error(ParseErrorKind::InvalidEscape(c)))?;
                    s.push(decoded);
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn parse_list(&mut self) -> Result<Value, EvalError> {
        let start_col = self.col();
        self.advance(); // consume '['
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.current_char() == Some(']') {
            self.advance();
            return Ok(Value::List(items));
        }

        loop {
            self.skip_whitespace();
            let item = match self.current_char() {
                None => return Err(self.error_at(ParseErrorKind::UnbalancedBracket, start_col)),
                Some('[') => return Err(self.error(ParseErrorKind::NestedList)),
                Some(',') | Some(']') => return Err(self.error(ParseErrorKind::EmptyListElement)),
                Some('"') => Value::Str(self.parse_string()?),
                Some(_) => self.parse_list_element(start_col)?,
            };
            items.push(item);

            self.skip_whitespace();
            match self.current_char() {
                Some(',') => self.advance(),
                Some(']') => {
                    self.advance();
                    return Ok(Value::List(items));
                }
                None => return Err(self.error_at(ParseErrorKind::UnbalancedBracket, start_col)),
                Some(c) => return Err(self.error(ParseErrorKind::UnexpectedChar(c))),
            }
        }
    }

    // Bare list elements run up to the next ',' or ']' and may contain spaces.
    fn parse_list_element(&mut self, list_col: usize) -> Result<Value, EvalError> {
        let col = self.col();
        let mut raw = String::new();
        loop {
            match self.current_char() {
                None => return Err(self.error_at(ParseErrorKind::UnbalancedBracket, list_col)),
                Some(',') | Some(']') => break,
                Some('[') => return Err(self.error(ParseErrorKind::NestedList)),
                Some(c) => {
                    raw.push(c);
                    self.advance();
                }
            }
        }
        self.parse_bare(raw.trim_end(), col)
    }

    fn parse_bare(&self, token: &str, col: usize) -> Result<Value, EvalError> {
        if let Some(reference) = token.strip_prefix('$') {
            if let Ok(index) = reference.parse::<i64>() {
                tracing::trace!(index, col, "result reference");
                return self.history.get(index).cloned();
            }
        }
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        if looks_numeric(token) {
            if let Ok(x) = token.parse::<f64>() {
                return Ok(Value::Float(x));
            }
        }
        Ok(Value::Str(token.to_string()))
    }
}

// Keeps words like "inf" or "nan" as strings.
fn looks_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Splits command text on `|>` outside of quotes and brackets.
/// Each piece is returned with its starting char offset.
fn split_pipeline(text: &str) -> Vec<(usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut in_string = false;
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            current.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    current.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '|' && depth == 0 && chars.get(i + 1) == Some(&'>') {
            pieces.push((start, std::mem::take(&mut current)));
            i += PIPE.len();
            start = i;
            continue;
        } else {
            // Quotes and brackets only open at the start of a token, as in `Parser::parse_value`.
            let token_start = match current.chars().next_back() {
                None => true,
                Some(prev) => prev.is_whitespace() || matches!(prev, '=' | ',' | '['),
            };
            match c {
                '"' if token_start => in_string = true,
                '[' if token_start => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            current.push(c);
        }
        i += 1;
    }
    pieces.push((start, current));
    pieces
}

/// Parses a command line (`!op args |> op args ...`, or `?name` as `!inspect name`)
/// into its pipeline segments. `$n` references are resolved against `history`.
pub fn parse_command(line: &str, history: &ResultsHistory) -> Result<Vec<Segment>, EvalError> {
    let line = line.trim();
    let body = if let Some(rest) = line.strip_prefix('?') {
        format!("inspect {}", rest)
    } else if let Some(rest) = line.strip_prefix('!') {
        rest.to_string()
    } else {
        return Err(EvalError::Parse(ParseError {
            kind: ParseErrorKind::MissingOperator,
            col: 1,
        }));
    };

    let mut segments = Vec::new();
    for (offset, piece) in split_pipeline(&body) {
        let leading = piece.chars().take_while(|c| c.is_whitespace()).count();
        if piece.trim().is_empty() {
            return Err(EvalError::EmptyPipelineSegment);
        }
        // +2: one for the command sigil, one for 1-based columns.
        let mut parser = Parser::new(piece.trim_start(), offset + leading + 2, history);
        segments.push(parser.parse_segment()?);
    }
    Ok(segments)
}

/// Parses operator text without the leading `!`, e.g. `format fmt="{}"`.
pub fn parse_segment(text: &str, history: &ResultsHistory) -> Result<Segment, EvalError> {
    if text.trim().is_empty() {
        return Err(EvalError::EmptyPipelineSegment);
    }
    Parser::new(text, 1, history).parse_segment()
}

pub fn parse_literal(text: &str, history: &ResultsHistory) -> Result<Value, EvalError> {
    Parser::new(text, 1, history).parse_literal()
}
