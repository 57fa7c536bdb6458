//! The block reader: nested `{ ... }` sections as a tree of entries.
//!
//! Each frame is read by one call of a recursive descent. A line followed
//! by `{` owns the nested frame. A structural error abandons the current
//! top-level block; the reader skips to its closing brace and carries on.

use crate::{Line, ParseError, ParseResult, Position, SourceProvider, StreamOptions, TokenStream};
use std::collections::VecDeque;
use tracing::{debug, error};

/// Value token meaning "explicitly empty".
pub const NONE_TOKEN: &str = "None";
/// Value token meaning "restore the default".
pub const DEFAULT_TOKEN: &str = "Default";
/// Value token meaning "no value given".
pub const ABSENT_TOKEN: &str = "-";

/// One line of a block, with its nested frame if it opened one.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The leading token.
    pub key: String,
    /// Tokens between the key and `=` (or the end of the line).
    pub args: Vec<String>,
    /// Whether the line contained `=`.
    pub assigned: bool,
    /// Tokens after `=`.
    pub values: Vec<String>,
    pub body: Option<Vec<Entry>>,
    pub pos: Position,
}

/// How a keyword's values read, with the reserved tokens picked out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueArg<'a> {
    /// Nothing given, or `-`.
    Absent,
    /// `None`.
    Empty,
    /// `Default`.
    Default,
    Values(&'a [String]),
}

impl Entry {
    pub fn is_block(&self) -> bool {
        self.body.is_some()
    }

    /// Nested entries, or an empty slice.
    pub fn children(&self) -> &[Entry] {
        self.body.as_deref().unwrap_or(&[])
    }

    pub fn value_arg(&self) -> ValueArg<'_> {
        match self.values.as_slice() {
            [] => ValueArg::Absent,
            [only] if only == ABSENT_TOKEN => ValueArg::Absent,
            [only] if only.eq_ignore_ascii_case(NONE_TOKEN) => ValueArg::Empty,
            [only] if only.eq_ignore_ascii_case(DEFAULT_TOKEN) => ValueArg::Default,
            values => ValueArg::Values(values),
        }
    }

    /// All values joined by single blanks, or None when absent.
    pub fn text(&self) -> Option<String> {
        match self.value_arg() {
            ValueArg::Values(values) => Some(values.join(" ")),
            _ => None,
        }
    }

    /// The first value, unless absent or reserved.
    pub fn first(&self) -> Option<&str> {
        match self.value_arg() {
            ValueArg::Values(values) => values.first().map(String::as_str),
            _ => None,
        }
    }

    /// The name line as written: key followed by args.
    pub fn label(&self) -> String {
        std::iter::once(self.key.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A top-level block: `Name { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub pos: Position,
    pub entries: Vec<Entry>,
}

/// Reads blocks and entries from a token stream.
pub struct BlockReader<'p> {
    stream: TokenStream<'p>,
    /// Lines read ahead of the current position, in order.
    pending: VecDeque<Line>,
    depth: usize,
    errors: Vec<ParseError>,
}

impl<'p> BlockReader<'p> {
    pub fn new(stream: TokenStream<'p>) -> Self {
        Self {
            stream,
            pending: VecDeque::new(),
            depth: 0,
            errors: Vec::new(),
        }
    }

    /// Read a file from the start.
    pub fn open(
        provider: &'p dyn SourceProvider,
        name: &str,
        options: StreamOptions,
    ) -> ParseResult<Self> {
        TokenStream::open(provider, name, options).map(Self::new)
    }

    /// Read from a position recorded earlier.
    pub fn reopen_at(
        provider: &'p dyn SourceProvider,
        pos: &Position,
        options: StreamOptions,
    ) -> ParseResult<Self> {
        TokenStream::reopen_at(provider, pos, options).map(Self::new)
    }

    /// Structural errors met so far, including the stream's.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        let mut errors = self.stream.take_errors();
        errors.append(&mut self.errors);
        errors
    }

    // ==================== Line helpers ====================

    fn advance(&mut self) -> Option<Line> {
        self.pending.pop_front().or_else(|| self.stream.next_line())
    }

    fn peek(&mut self) -> Option<&Line> {
        if self.pending.is_empty() {
            let line = self.stream.next_line()?;
            self.pending.push_back(line);
        }
        self.pending.front()
    }

    fn fail(&mut self, err: ParseError) {
        error!(%err, "config structure error");
        self.errors.push(err);
    }

    /// Consume lines until every open frame is closed.
    pub fn skip_to_block_end(&mut self) {
        while self.depth > 0 {
            match self.advance() {
                None => self.depth = 0,
                Some(line) if line.is_open() => self.depth += 1,
                Some(line) if line.is_close() => self.depth -= 1,
                Some(_) => {}
            }
        }
    }

    /// Drop the body of a block whose name line had no `{`.
    ///
    /// The body runs to the `}` that leaves it unbalanced. Without one there
    /// was no body, and the lines read ahead are put back.
    fn skip_orphan_body(&mut self) {
        let mut ahead = Vec::new();
        let mut depth = 1usize;
        while let Some(line) = self.advance() {
            if line.is_open() {
                depth += 1;
            } else if line.is_close() {
                depth -= 1;
                if depth == 0 {
                    debug!(lines = ahead.len(), "skipped body of abandoned block");
                    return;
                }
            }
            ahead.push(line);
        }
        self.pending.extend(ahead);
    }

    // ==================== Blocks ====================

    /// Read the next well-formed top-level block.
    ///
    /// Broken blocks are recorded as errors and skipped.
    pub fn next_block(&mut self) -> Option<Block> {
        loop {
            let line = self.advance()?;
            if line.is_close() {
                self.fail(ParseError::UnexpectedClose { pos: line.pos });
                continue;
            }
            if line.is_open() {
                self.fail(ParseError::UnexpectedOpen { pos: line.pos });
                self.depth = 1;
                self.skip_to_block_end();
                continue;
            }

            let name = line.tokens().next_token().unwrap_or_default();
            if !self.peek().is_some_and(Line::is_open) {
                self.fail(ParseError::MissingOpenBrace {
                    block: name,
                    pos: line.pos,
                });
                self.skip_orphan_body();
                continue;
            }
            self.advance();
            self.depth = 1;

            match self.read_body(&name, &line.pos) {
                Ok(entries) => {
                    return Some(Block {
                        name,
                        pos: line.pos,
                        entries,
                    })
                }
                Err(err) => {
                    self.fail(err);
                    self.skip_to_block_end();
                }
            }
        }
    }

    /// Read one entry, with its nested frame, from the current position.
    ///
    /// Used after `reopen_at` to re-read a single record.
    pub fn read_entry(&mut self) -> ParseResult<Option<Entry>> {
        let Some(line) = self.advance() else {
            return Ok(None);
        };
        if line.is_open() {
            return Err(ParseError::UnexpectedOpen { pos: line.pos });
        }
        if line.is_close() {
            return Err(ParseError::UnexpectedClose { pos: line.pos });
        }
        self.depth = 0;
        self.read_entry_from(line).map(Some)
    }

    fn read_body(&mut self, owner: &str, opened: &Position) -> ParseResult<Vec<Entry>> {
        let mut entries = Vec::new();
        loop {
            let Some(line) = self.advance() else {
                return Err(ParseError::UnclosedBlock {
                    block: owner.to_string(),
                    pos: opened.clone(),
                });
            };
            if line.is_close() {
                self.depth -= 1;
                return Ok(entries);
            }
            if line.is_open() {
                self.depth += 1;
                return Err(ParseError::UnexpectedOpen { pos: line.pos });
            }
            entries.push(self.read_entry_from(line)?);
        }
    }

    fn read_entry_from(&mut self, line: Line) -> ParseResult<Entry> {
        let mut tokens = line.tokens();
        let key = tokens.next_token().unwrap_or_default();
        let mut entry = Entry {
            key,
            args: Vec::new(),
            assigned: false,
            values: Vec::new(),
            body: None,
            pos: line.pos.clone(),
        };
        for token in tokens {
            if entry.assigned {
                entry.values.push(token);
            } else if token == "=" {
                entry.assigned = true;
            } else {
                entry.args.push(token);
            }
        }

        if self.peek().is_some_and(Line::is_open) {
            self.advance();
            self.depth += 1;
            let owner = entry.label();
            entry.body = Some(self.read_body(&owner, &entry.pos)?);
        }
        Ok(entry)
    }
}
