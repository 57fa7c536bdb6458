//! The token stream: logical lines from a stack of open files.
//!
//! A physical line is stripped of `#` comments (outside double quotes),
//! joined with the next line when it ends in `\`, and then split into
//! logical lines at unquoted `;`. `{` and `}` always form logical lines of
//! their own. `include <file>` lines open another file in place.

use crate::{ParseError, ParseResult, SourceProvider};
use regex_lite::{Captures, Regex};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, warn};

/// Newest configuration format revision this reader understands.
pub const SUPPORTED_REVISION: f64 = 8.0;

/// Where a logical line starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// Canonical file name.
    pub file: String,
    /// Byte offset into the file.
    pub offset: usize,
    /// 1-based line number, for messages.
    pub line: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, offset: usize, line: usize) -> Self {
        Self {
            file: file.into(),
            offset,
            line,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Stream settings.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub supported_revision: f64,
    /// Expand `$NAME` and `${NAME}` in include file names.
    pub expand_env: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            supported_revision: SUPPORTED_REVISION,
            expand_env: true,
        }
    }
}

// ==================== Lines and tokens ====================

/// One logical line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub pos: Position,
}

impl Line {
    pub fn is_open(&self) -> bool {
        self.text == "{"
    }

    pub fn is_close(&self) -> bool {
        self.text == "}"
    }

    pub fn tokens(&self) -> Tokens<'_> {
        Tokens::new(&self.text)
    }
}

/// Token extraction over a logical line.
///
/// Tokens are separated by blanks. A double-quoted run is one token with the
/// quotes removed, and `=` is always a token of its own. Each extractor
/// consumes one token whether or not it converts.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    pub fn next_token(&mut self) -> Option<String> {
        let text = self.rest.trim_start();
        let mut chars = text.char_indices();
        let (_, first) = chars.next()?;
        let (token, used) = match first {
            '"' => match text[1..].find('"') {
                Some(end) => (text[1..end + 1].to_string(), end + 2),
                None => (text[1..].to_string(), text.len()),
            },
            '=' => ("=".to_string(), 1),
            _ => {
                let end = chars
                    .find(|(_, c)| c.is_whitespace() || *c == '=' || *c == '"')
                    .map(|(i, _)| i)
                    .unwrap_or(text.len());
                (text[..end].to_string(), end)
            }
        };
        self.rest = &text[used..];
        Some(token)
    }

    pub fn next_float(&mut self) -> Option<f64> {
        self.next_token()?.parse().ok()
    }

    pub fn next_int(&mut self) -> Option<i64> {
        self.next_token()?.parse().ok()
    }

    pub fn next_bool(&mut self) -> Option<bool> {
        parse_bool(&self.next_token()?)
    }

    pub fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_token()
    }
}

/// Parse a logical value: true/false, t/f, yes/no, on/off.
pub fn parse_bool(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

// ==================== Files ====================

struct OpenFile {
    name: String,
    text: String,
    cursor: usize,
    line: usize,
}

/// A joined physical line, with a map back to file offsets.
struct Logical {
    text: String,
    line: usize,
    /// (offset in `text`, offset in file) at the start of each physical line.
    segments: Vec<(usize, usize)>,
}

impl Logical {
    fn locate(&self, index: usize) -> (usize, usize) {
        let (seg, &(start, file_offset)) = self
            .segments
            .iter()
            .enumerate()
            .rev()
            .find(|(_, (start, _))| *start <= index)
            .unwrap_or((0, &(0, 0)));
        (file_offset + (index - start), self.line + seg)
    }
}

impl OpenFile {
    fn at_end(&self) -> bool {
        self.cursor >= self.text.len()
    }

    fn position(&self) -> Position {
        Position::new(self.name.clone(), self.cursor, self.line)
    }

    fn read_logical(&mut self) -> Logical {
        let mut logical = Logical {
            text: String::new(),
            line: self.line,
            segments: Vec::new(),
        };
        loop {
            let start = self.cursor;
            let end = self.text[start..]
                .find('\n')
                .map(|i| start + i)
                .unwrap_or(self.text.len());
            self.cursor = (end + 1).min(self.text.len());
            self.line += 1;

            let content = strip_comment(&self.text[start..end]).trim_end();
            logical.segments.push((logical.text.len(), start));
            match content.strip_suffix('\\') {
                Some(body) => {
                    logical.text.push_str(body);
                    logical.text.push(' ');
                    if self.at_end() {
                        break;
                    }
                }
                None => {
                    logical.text.push_str(content);
                    break;
                }
            }
        }
        logical
    }

    fn skip_blank(&mut self) {
        while !self.at_end() {
            let rest = &self.text[self.cursor..];
            let end = rest.find('\n').unwrap_or(rest.len());
            if !strip_comment(&rest[..end]).trim().is_empty() {
                break;
            }
            self.cursor = (self.cursor + end + 1).min(self.text.len());
            self.line += 1;
        }
    }
}

fn strip_comment(raw: &str) -> &str {
    let mut quoted = false;
    for (i, c) in raw.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &raw[..i],
            _ => {}
        }
    }
    raw
}

// ==================== Stream ====================

/// Comment-stripped, include-expanded supply of logical lines.
pub struct TokenStream<'p> {
    provider: &'p dyn SourceProvider,
    options: StreamOptions,
    files: Vec<OpenFile>,
    pending: VecDeque<Line>,
    errors: Vec<ParseError>,
    env_var: Regex,
}

impl<'p> TokenStream<'p> {
    fn empty(provider: &'p dyn SourceProvider, options: StreamOptions) -> ParseResult<Self> {
        let env_var = Regex::new(r"\$\{(\w+)\}|\$(\w+)")
            .map_err(|e| ParseError::Pattern(e.to_string()))?;
        Ok(Self {
            provider,
            options,
            files: Vec::new(),
            pending: VecDeque::new(),
            errors: Vec::new(),
            env_var,
        })
    }

    /// Open `name` from the beginning, checking its revision line.
    pub fn open(
        provider: &'p dyn SourceProvider,
        name: &str,
        options: StreamOptions,
    ) -> ParseResult<Self> {
        let mut stream = Self::empty(provider, options)?;
        stream.push_file(name, None)?;
        Ok(stream)
    }

    /// Open the file named in `pos` and continue reading from its offset.
    pub fn reopen_at(
        provider: &'p dyn SourceProvider,
        pos: &Position,
        options: StreamOptions,
    ) -> ParseResult<Self> {
        let mut stream = Self::empty(provider, options)?;
        let source = provider.load(&pos.file, None)?;
        if pos.offset > source.text.len() || !source.text.is_char_boundary(pos.offset) {
            return Err(ParseError::BadPosition {
                pos: pos.clone(),
                reason: format!("offset beyond {} bytes", source.text.len()),
            });
        }
        let line = source.text[..pos.offset].matches('\n').count() + 1;
        stream.files.push(OpenFile {
            name: source.name,
            text: source.text,
            cursor: pos.offset,
            line,
        });
        Ok(stream)
    }

    /// Drop every open file.
    pub fn close(&mut self) {
        self.files.clear();
        self.pending.clear();
    }

    /// Where the next logical line starts.
    pub fn mark_position(&self) -> Option<Position> {
        self.pending
            .front()
            .map(|line| line.pos.clone())
            .or_else(|| self.files.last().map(OpenFile::position))
    }

    /// Errors met so far (failed includes and the like).
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Next non-blank logical line, or None at the end of the root file.
    pub fn next_line(&mut self) -> Option<Line> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            let file = self.files.last_mut()?;
            if file.at_end() {
                debug!(file = %file.name, "closing config file");
                self.files.pop();
                continue;
            }
            let name = file.name.clone();
            let logical = file.read_logical();
            if logical.text.trim().is_empty() {
                continue;
            }
            let mut tokens = Tokens::new(&logical.text);
            if tokens.next_token().as_deref() == Some("include") {
                let (offset, line) = logical.locate(0);
                let pos = Position::new(name, offset, line);
                match tokens.next_token() {
                    Some(target) => self.include(&target, pos),
                    None => self.errors.push(ParseError::EmptyInclude { pos }),
                }
                continue;
            }
            self.split(&name, &logical);
        }
    }

    fn push_file(&mut self, name: &str, from: Option<&Position>) -> ParseResult<()> {
        let relative_to = self.files.last().map(|f| f.name.clone());
        let source = self.provider.load(name, relative_to.as_deref())?;
        if self.files.iter().any(|f| f.name == source.name) {
            return Err(ParseError::IncludeCycle {
                name: source.name,
                pos: from
                    .cloned()
                    .unwrap_or_else(|| Position::new(name, 0, 1)),
            });
        }
        debug!(file = %source.name, "accessing config file");
        let mut file = OpenFile {
            name: source.name,
            text: source.text,
            cursor: 0,
            line: 1,
        };
        self.check_revision(&mut file)?;
        self.files.push(file);
        Ok(())
    }

    fn check_revision(&self, file: &mut OpenFile) -> ParseResult<()> {
        file.skip_blank();
        let rest = &file.text[file.cursor..];
        let first = strip_comment(&rest[..rest.find('\n').unwrap_or(rest.len())]);
        let mut tokens = Tokens::new(first);
        if tokens.next_token().as_deref() != Some("revision") {
            debug!(file = %file.name, "no revision line, assuming oldest format");
            return Ok(());
        }
        let found = tokens.next_token().unwrap_or_default();
        let revision: f64 = found.parse().map_err(|_| ParseError::BadRevision {
            file: file.name.clone(),
            found: found.clone(),
        })?;
        if revision > self.options.supported_revision {
            return Err(ParseError::UnsupportedRevision {
                file: file.name.clone(),
                found: revision,
                supported: self.options.supported_revision,
            });
        }
        file.read_logical();
        Ok(())
    }

    fn include(&mut self, target: &str, pos: Position) {
        let name = if self.options.expand_env {
            self.expand_env(target)
        } else {
            target.to_string()
        };
        if let Err(err) = self.push_file(&name, Some(&pos)) {
            warn!(file = %pos.file, line = pos.line, include = %name, "include failed");
            self.errors.push(err);
        }
    }

    fn expand_env(&self, text: &str) -> String {
        self.env_var
            .replace_all(text, |caps: &Captures| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|m| std::env::var(m.as_str()).ok())
                    .unwrap_or_default()
            })
            .into_owned()
    }

    fn split(&mut self, file: &str, logical: &Logical) {
        let text = &logical.text;
        let mut start: Option<usize> = None;
        let mut quoted = false;
        for (i, c) in text.char_indices() {
            if c == '"' {
                quoted = !quoted;
                start.get_or_insert(i);
                continue;
            }
            if quoted {
                continue;
            }
            match c {
                '{' | '}' => {
                    if let Some(s) = start.take() {
                        self.push_piece(file, logical, s, i);
                    }
                    self.push_piece(file, logical, i, i + 1);
                }
                ';' => {
                    if let Some(s) = start.take() {
                        self.push_piece(file, logical, s, i);
                    }
                }
                c if c.is_whitespace() => {}
                _ => {
                    start.get_or_insert(i);
                }
            }
        }
        if let Some(s) = start {
            self.push_piece(file, logical, s, text.len());
        }
    }

    fn push_piece(&mut self, file: &str, logical: &Logical, start: usize, end: usize) {
        let piece = logical.text[start..end].trim();
        if piece.is_empty() {
            return;
        }
        let (offset, line) = logical.locate(start);
        self.pending.push_back(Line {
            text: piece.to_string(),
            pos: Position::new(file, offset, line),
        });
    }
}
