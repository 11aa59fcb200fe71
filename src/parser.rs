// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::*;
use crate::value::*;

use anyhow::{bail, Result};

/// Deepest nesting of parentheses, list literals, subscripts and filter
/// arguments accepted in one expression.
pub const MAX_NESTING: u32 = 128;

#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    end: u32,
    nesting: u32,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
            end: 0,
            nesting: 0,
        })
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Number | TokenKind::Ident | TokenKind::Eof => {
                self.tok.1.text()
            }
            TokenKind::String | TokenKind::Data => "",
        }
    }

    pub fn next_token(&mut self) -> Result<()> {
        self.end = self.tok.1.end;
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.token_text() == text {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    fn is_keyword(&self, ident: &str) -> bool {
        matches!(
            ident,
            "and" | "if" | "else" | "in" | "is" | "not" | "or"
        )
    }

    fn parse_ident(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident if self.is_keyword(span.text()) => Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                &format!("unexpected keyword `{}`", span.text()),
            )),
            TokenKind::Ident => {
                self.next_token()?;
                Ok(span)
            }
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting identifier")),
        }
    }

    fn read_number(span: Span) -> Result<Expr> {
        let text = span.text();
        let value = if text.contains(['.', 'e', 'E']) {
            match text.parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => bail!(span.error("could not parse number")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => bail!(span.error("integer literal out of range")),
            }
        };
        Ok(Expr::Const { span, value })
    }

    fn unescape(span: &Span) -> Result<String> {
        let mut s = String::with_capacity(span.text().len());
        let mut chars = span.text().chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                s.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some('r') => s.push('\r'),
                Some('0') => s.push('\0'),
                Some(c @ ('\\' | '\'' | '"')) => s.push(c),
                Some(c) => {
                    s.push('\\');
                    s.push(c);
                }
                None => bail!(span.error("invalid escape sequence")),
            }
        }
        Ok(s)
    }

    fn parse_scalar_or_name(&mut self) -> Result<Expr> {
        let span = self.tok.1.clone();
        let node = match &self.tok.0 {
            TokenKind::Number => Self::read_number(span)?,
            TokenKind::String => {
                let value = Value::from(Self::unescape(&span)?);
                Expr::Const { span, value }
            }
            TokenKind::Ident => match self.token_text() {
                "true" | "True" => Expr::Const {
                    span,
                    value: Value::Bool(true),
                },
                "false" | "False" => Expr::Const {
                    span,
                    value: Value::Bool(false),
                },
                "none" | "None" => Expr::Const {
                    span,
                    value: Value::Null,
                },
                _ => {
                    let ident = self.parse_ident()?;
                    let name = ident.text().into();
                    return Ok(Expr::Name { span: ident, name });
                }
            },
            _ => {
                return Err(self.source.error(
                    self.tok.1.line,
                    self.tok.1.col,
                    "expecting expression",
                ))
            }
        };
        self.next_token()?;
        Ok(node)
    }

    fn parse_list(&mut self) -> Result<Expr> {
        let mut span = self.tok.1.clone();
        self.next_token()?;
        let mut items = vec![];
        while self.token_text() != "]" {
            items.push(Ref::new(self.parse_expr()?));
            if self.token_text() != "," {
                break;
            }
            self.next_token()?;
        }
        self.expect("]", "while parsing list literal")?;
        span.end = self.end;
        Ok(Expr::List { span, items })
    }

    // Either a parenthesized expression or a tuple literal.
    fn parse_parens_expr(&mut self) -> Result<Expr> {
        let mut span = self.tok.1.clone();
        self.next_token()?;
        if self.token_text() == ")" {
            self.next_token()?;
            span.end = self.end;
            return Ok(Expr::Tuple {
                span,
                items: vec![],
            });
        }

        let expr = self.parse_expr()?;
        if self.token_text() != "," {
            self.expect(")", "while parsing parenthesized expression")?;
            return Ok(expr);
        }

        let mut items = vec![Ref::new(expr)];
        while self.token_text() == "," {
            self.next_token()?;
            if self.token_text() == ")" {
                break;
            }
            items.push(Ref::new(self.parse_expr()?));
        }
        self.expect(")", "while parsing tuple literal")?;
        span.end = self.end;
        Ok(Expr::Tuple { span, items })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.token_text() {
            "[" if self.tok.0 == TokenKind::Symbol => self.parse_list(),
            "(" if self.tok.0 == TokenKind::Symbol => self.parse_parens_expr(),
            _ => self.parse_scalar_or_name(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let start = self.tok.1.clone();
        let mut term = self.parse_primary()?;

        loop {
            let mut span = start.clone();
            match self.token_text() {
                "." if self.tok.0 == TokenKind::Symbol => {
                    self.next_token()?;
                    let attr = match self.tok.0 {
                        // Numeric attributes like `x.0` are item lookups.
                        TokenKind::Number => {
                            let index = Self::read_number(self.tok.1.clone())?;
                            self.next_token()?;
                            span.end = self.end;
                            term = Expr::Getitem {
                                span,
                                node: Ref::new(term),
                                index: Ref::new(index),
                            };
                            continue;
                        }
                        _ => self.parse_ident()?,
                    };
                    span.end = self.end;
                    let name = attr.text().into();
                    term = Expr::Getattr {
                        span,
                        node: Ref::new(term),
                        attr: (attr, name),
                    };
                }
                "[" if self.tok.0 == TokenKind::Symbol => {
                    self.next_token()?;
                    let index = self.parse_expr()?;
                    self.expect("]", "while parsing subscript")?;
                    span.end = self.end;
                    term = Expr::Getitem {
                        span,
                        node: Ref::new(term),
                        index: Ref::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(term)
    }

    // Keyword arguments are written `name=value`; needs one token of lookahead.
    fn at_keyword_arg(&self) -> Result<bool> {
        if self.tok.0 != TokenKind::Ident {
            return Ok(false);
        }
        let mut lexer = self.lexer.clone();
        let next = lexer.next_token()?;
        Ok(next.0 == TokenKind::Symbol && next.1.text() == "=")
    }

    fn parse_filter_args(
        &mut self,
        args: &mut Vec<Ref<Expr>>,
        kwargs: &mut Vec<(Span, Ref<Expr>)>,
    ) -> Result<()> {
        self.expect("(", "while parsing filter arguments")?;
        while self.token_text() != ")" {
            if self.at_keyword_arg()? {
                let name = self.parse_ident()?;
                self.expect("=", "after keyword argument name")?;
                kwargs.push((name, Ref::new(self.parse_expr()?)));
            } else if !kwargs.is_empty() {
                return Err(self.source.error(
                    self.tok.1.line,
                    self.tok.1.col,
                    "positional argument follows keyword argument",
                ));
            } else {
                args.push(Ref::new(self.parse_expr()?));
            }

            if self.token_text() != "," {
                break;
            }
            self.next_token()?;
        }
        self.expect(")", "while parsing filter arguments")
    }

    fn parse_filter_expr(&mut self) -> Result<Expr> {
        let start = self.tok.1.clone();
        let mut term = self.parse_postfix()?;

        while self.token_text() == "|" && self.tok.0 == TokenKind::Symbol {
            self.next_token()?;
            let name = self.parse_ident()?;
            let mut args = vec![];
            let mut kwargs = vec![];
            if self.token_text() == "(" && self.tok.0 == TokenKind::Symbol {
                self.parse_filter_args(&mut args, &mut kwargs)?;
            }
            let mut span = start.clone();
            span.end = self.end;
            term = Expr::Filter {
                span,
                node: Ref::new(term),
                name,
                args,
                kwargs,
            };
        }

        Ok(term)
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        if self.nesting >= MAX_NESTING {
            return Err(self.source.error(
                self.tok.1.line,
                self.tok.1.col,
                &format!("expression nesting exceeds the limit of {MAX_NESTING}"),
            ));
        }
        self.nesting += 1;
        let expr = self.parse_filter_expr();
        self.nesting -= 1;
        expr
    }

    pub fn parse(&mut self) -> Result<Template> {
        let mut outputs = vec![];
        loop {
            match self.tok.0 {
                TokenKind::Eof => break,
                TokenKind::Data => self.next_token()?,
                _ => {
                    // `{{-` and `{{+` open a block too.
                    if !matches!(self.token_text(), "{{" | "{{-" | "{{+") {
                        return Err(self.source.error(
                            self.tok.1.line,
                            self.tok.1.col,
                            "expecting `{{`",
                        ));
                    }
                    self.next_token()?;
                    outputs.push(Ref::new(self.parse_expr()?));
                    if !matches!(self.token_text(), "}}" | "-}}" | "+}}") {
                        return Err(self.source.error(
                            self.tok.1.line,
                            self.tok.1.col,
                            "expecting `}}` to close expression block",
                        ));
                    }
                    self.next_token()?;
                }
            }
        }

        Ok(Template {
            source: self.source.clone(),
            outputs,
        })
    }

    /// Parse the single expression contained in `{{ ... }}`.
    pub fn parse_output_expr(&mut self) -> Result<Ref<Expr>> {
        let template = self.parse()?;
        match template.outputs.as_slice() {
            [expr] => Ok(expr.clone()),
            _ => bail!(
                "{}: expecting exactly one expression block, found {}",
                self.source.file(),
                template.outputs.len()
            ),
        }
    }
}
