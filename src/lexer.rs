// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::*;
use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;

use anyhow::{anyhow, bail, Result};

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::as_ptr(&self.src) == Rc::as_ptr(&other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2; // Account for rows, cols possibly starting at 1, EOF etc.
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed template size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() {
            lines.push((start, contents.len() as u32));
        } else if contents.is_empty() {
            lines.push((0, 0));
        } else {
            let s = (contents.len() - 1) as u32;
            lines.push((s, s));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Source> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.as_ref().display()),
        };
        Self::from_contents(path.as_ref().to_string_lossy().to_string(), contents)
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = (col as usize).saturating_sub(1);

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
		{:<line_num_width$}| {}\n\
		{:<line_num_width$}| {:<col_spaces$}^\n\
		{}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line.saturating_sub(1)),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, "error", msg))
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.len() > max {
            (&t[0..max], "...")
        } else {
            (t.as_str(), "")
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    /// Template text outside of any block.
    Data,
    Symbol,
    String,
    Number,
    Ident,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
    in_block: bool,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
            in_block: false,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn span(&self, line: u32, col: u32, start: usize, end: usize) -> Span {
        Span {
            source: self.source.clone(),
            line,
            col,
            start: start as u32,
            end: end as u32,
        }
    }

    // Consume one character, keeping line and column up to date.
    fn bump(&mut self) {
        match self.peek().1 {
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            '\t' => self.col += 4,
            '\x00' => return,
            _ => self.col += 1,
        }
        self.iter.next();
    }

    fn read_data(&mut self) -> Result<Token> {
        let (start, _) = self.peek();
        let (line, col) = (self.line, self.col);
        loop {
            match (self.peek().1, self.peekahead(1).1) {
                ('\x00', _) | ('{', '{') | ('{', '%') => break,
                ('{', '#') => {
                    if self.peek().0 > start {
                        break;
                    }
                    self.skip_comment()?;
                    return self.next_token();
                }
                _ => self.bump(),
            }
        }
        let end = self.peek().0;
        if end == start {
            return self.read_block_start();
        }
        Ok(Token(TokenKind::Data, self.span(line, col, start, end)))
    }

    fn skip_comment(&mut self) -> Result<()> {
        let (line, col) = (self.line, self.col);
        self.bump();
        self.bump();
        loop {
            match (self.peek().1, self.peekahead(1).1) {
                ('\x00', _) => return Err(self.source.error(line, col, "unmatched {#")),
                ('#', '}') => {
                    self.bump();
                    self.bump();
                    return Ok(());
                }
                _ => self.bump(),
            }
        }
    }

    fn read_block_start(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let (line, col) = (self.line, self.col);
        match (chr, self.peekahead(1).1) {
            ('\x00', _) => Ok(Token(TokenKind::Eof, self.span(line, col, start, start))),
            ('{', '{') => {
                self.bump();
                self.bump();
                // Whitespace control marker.
                if self.peek().1 == '-' || self.peek().1 == '+' {
                    self.bump();
                }
                self.in_block = true;
                let end = self.peek().0;
                Ok(Token(TokenKind::Symbol, self.span(line, col, start, end)))
            }
            ('{', '%') => Err(self
                .source
                .error(line, col, "statement blocks are not supported")),
            _ => Err(self.source.error(line, col, "invalid character")),
        }
    }

    fn read_ident(&mut self) -> Result<Token> {
        let start = self.peek().0;
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(TokenKind::Ident, self.span(self.line, col, start, end)))
    }

    fn read_digits(&mut self) {
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let (start, _) = self.peek();
        let col = self.col;
        self.iter.next();
        self.read_digits();

        // Read fraction part
        // . must be followed by at least 1 digit.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next(); // .
            self.read_digits();
        }

        // Read exponent part
        let ch = self.peek().1;
        if ch == 'e' || ch == 'E' {
            self.iter.next();
            if matches!(self.peek().1, '+' | '-') {
                self.iter.next();
            }
            self.read_digits();
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;

        // Valid number cannot be followed by these characters.
        let ch = self.peek().1;
        if ch == '_' || ch.is_ascii_alphabetic() {
            return Err(self.source.error(self.line, self.col, "invalid number"));
        }

        Ok(Token(
            TokenKind::Number,
            self.span(self.line, col, start, end),
        ))
    }

    fn read_string(&mut self) -> Result<Token> {
        let (line, col) = (self.line, self.col);
        let (_, quote) = self.peek();
        self.bump();
        let (start, _) = self.peek();
        loop {
            match self.peek().1 {
                '\x00' => {
                    return Err(self
                        .source
                        .error(line, col, &format!("unmatched {quote}")))
                }
                '\\' => {
                    self.bump();
                    self.bump();
                }
                ch if ch == quote => break,
                _ => self.bump(),
            }
        }
        let end = self.peek().0;
        self.bump();

        Ok(Token(TokenKind::String, self.span(line, col + 1, start, end)))
    }

    fn skip_ws(&mut self) {
        loop {
            match self.peek().1 {
                ' ' | '\t' | '\r' | '\n' => self.bump(),
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        if !self.in_block {
            return self.read_data();
        }

        self.skip_ws();

        let (start, chr) = self.peek();
        let col = self.col;

        match chr {
	    // Special case for - followed by digit which is a
	    // negative number.
	    '-' if self.peekahead(1).1.is_ascii_digit() => {
		self.read_number()
	    }
	    // Whitespace controlled end of block.
	    '-' | '+' if self.peekahead(1).1 == '}' && self.peekahead(2).1 == '}' => {
		self.bump();
		self.bump();
		self.bump();
		self.in_block = false;
		Ok(Token(TokenKind::Symbol, self.span(self.line, col, start, start + 3)))
	    }
	    '}' if self.peekahead(1).1 == '}' => {
		self.bump();
		self.bump();
		self.in_block = false;
		Ok(Token(TokenKind::Symbol, self.span(self.line, col, start, start + 2)))
	    }
	    // grouping characters
	    '{' | '}' | '[' | ']' | '(' | ')' |
	    // filter pipe
	    '|' |
	    // separators
	    ',' | ':' | '.' | '=' => {
		self.col += 1;
		self.iter.next();
		Ok(Token(TokenKind::Symbol, self.span(self.line, col, start, start + 1)))
	    }
	    '"' | '\'' => self.read_string(),
	    '\x00' => Err(self.source.error(self.line, col, "unexpected end of template, expecting `}}`")),
	    _ if chr.is_ascii_digit() => self.read_number(),
	    _ if chr.is_ascii_alphabetic() || chr == '_' => self.read_ident(),
	    _ => Err(self.source.error(self.line, self.col, "invalid character"))
	}
    }
}
