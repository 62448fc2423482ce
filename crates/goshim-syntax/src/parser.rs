//! Parser for the top-level declarations of Go source files.

use std::collections::HashMap;

use crate::ast::*;
use crate::lexer::{CommentGroup, Lexer, Token, TokenKind};

/// A parse error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse one Go source file.
pub fn parse_file(src: &str) -> ParseResult<SourceFile> {
    let mut parser = Parser::new(src)?;
    parser.parse_file()
}

struct Parser<'src> {
    src: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    comments: Vec<CommentGroup>,
    /// Comment group index keyed by the offset of the token that follows it.
    docs: HashMap<usize, usize>,
}

/// A parameter list entry before grouped names are resolved.
struct ParamEntry {
    name: Option<String>,
    ty: TypeExpr,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> ParseResult<Self> {
        let lexed = Lexer::new(src).tokenize()?;
        let docs = lexed
            .comments
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.next_token.map(|start| (start, i)))
            .collect();
        Ok(Self {
            src,
            tokens: lexed.tokens,
            pos: 0,
            comments: lexed.comments,
            docs,
        })
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.current();
        ParseError::new(
            message,
            Span::new(token.start, token.end.max(token.start + 1)),
        )
    }

    fn describe(&self) -> String {
        let token = self.current();
        match &token.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Semicolon if token.start == token.end => "newline".to_string(),
            _ => format!("`{}`", &self.src[token.start..token.end]),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected {what}, found {}",
                self.describe()
            )))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                let token = self.advance();
                Ok(Ident::new(name, Span::new(token.start, token.end)))
            }
            _ => Err(self.error_here(format!(
                "expected identifier, found {}",
                self.describe()
            ))),
        }
    }

    /// Accept `;`, or nothing before a closing `)`/`}` or end of file.
    fn expect_semi(&mut self) -> ParseResult<()> {
        if self.matches(&TokenKind::Semicolon)
            || self.check(&TokenKind::RParen)
            || self.check(&TokenKind::RBrace)
            || self.check(&TokenKind::Eof)
        {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected `;` or newline after declaration, found {}",
                self.describe()
            )))
        }
    }

    fn skip_semis(&mut self) {
        while self.matches(&TokenKind::Semicolon) {}
    }

    /// Doc comment group directly above the current token.
    fn doc_here(&self) -> Option<Doc> {
        let token = self.current();
        let group = &self.comments[*self.docs.get(&token.start)?];
        if !group.own_line || group.end_line + 1 != token.line {
            return None;
        }
        Some(Doc {
            comments: group.comments.iter().map(|c| c.text.clone()).collect(),
        })
    }

    fn span_from(&self, start: usize) -> Span {
        let end = if self.pos == 0 {
            start
        } else {
            self.tokens[self.pos - 1].end.max(start)
        };
        Span::new(start, end)
    }

    /// Index of the bracket matching the opener at `self.pos + offset`.
    fn matching_close(&self, offset: usize) -> Option<usize> {
        let mut depth = 0usize;
        for idx in self.pos + offset..self.tokens.len() {
            match self.tokens[idx].kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(idx - self.pos);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // File structure
    // ------------------------------------------------------------------

    fn parse_file(&mut self) -> ParseResult<SourceFile> {
        self.skip_semis();
        self.expect(&TokenKind::Package, "`package` clause")?;
        let package = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        loop {
            self.skip_semis();
            if !self.check(&TokenKind::Import) {
                break;
            }
            self.parse_import_decl(&mut imports)?;
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semis();
            if self.check(&TokenKind::Eof) {
                break;
            }
            decls.push(self.parse_decl()?);
        }

        Ok(SourceFile {
            package,
            imports,
            decls,
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> ParseResult<()> {
        self.expect(&TokenKind::Import, "`import`")?;
        if self.matches(&TokenKind::LParen) {
            loop {
                self.skip_semis();
                if self.matches(&TokenKind::RParen) {
                    break;
                }
                imports.push(self.parse_import_spec()?);
                self.expect_semi()?;
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.expect_semi()
    }

    fn parse_import_spec(&mut self) -> ParseResult<ImportSpec> {
        let start = self.current().start;
        let name = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(name)
            }
            TokenKind::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = match self.peek().clone() {
            TokenKind::Str(raw) => {
                self.advance();
                unquote(&raw)
            }
            _ => {
                return Err(self.error_here(format!(
                    "expected import path, found {}",
                    self.describe()
                )));
            }
        };
        if path.is_empty() {
            return Err(ParseError::new("invalid import path: empty", self.span_from(start)));
        }
        Ok(ImportSpec {
            name,
            path,
            span: self.span_from(start),
        })
    }

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.peek() {
            TokenKind::Const => Ok(Decl::Const(self.parse_value_decl()?)),
            TokenKind::Var => Ok(Decl::Var(self.parse_value_decl()?)),
            TokenKind::Type => Ok(Decl::Type(self.parse_type_decl()?)),
            TokenKind::Func => Ok(Decl::Func(self.parse_func_decl()?)),
            TokenKind::Import => {
                Err(self.error_here(
                    "imports must appear before other declarations",
                ))
            }
            _ => Err(self.error_here(format!(
                "expected declaration, found {}",
                self.describe()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // const / var
    // ------------------------------------------------------------------

    fn parse_value_decl(&mut self) -> ParseResult<ValueDecl> {
        let doc = self.doc_here();
        let start = self.advance().start;
        let mut specs = Vec::new();
        let grouped = self.matches(&TokenKind::LParen);
        if grouped {
            loop {
                self.skip_semis();
                if self.matches(&TokenKind::RParen) {
                    break;
                }
                specs.push(self.parse_value_spec()?);
                self.expect_semi()?;
            }
        } else {
            specs.push(self.parse_value_spec()?);
        }
        let span = self.span_from(start);
        self.expect_semi()?;
        Ok(ValueDecl {
            doc,
            grouped,
            specs,
            span,
        })
    }

    fn parse_value_spec(&mut self) -> ParseResult<ValueSpec> {
        let doc = self.doc_here();
        let start = self.current().start;
        let mut names = vec![self.expect_ident()?];
        while self.matches(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }

        let ty = match self.peek() {
            TokenKind::Assign | TokenKind::Semicolon | TokenKind::RParen | TokenKind::Eof => None,
            _ => Some(self.parse_type()?),
        };

        let has_values = self.matches(&TokenKind::Assign);
        if has_values {
            self.skip_expr_list()?;
        }

        Ok(ValueSpec {
            doc,
            names,
            ty,
            has_values,
            span: self.span_from(start),
        })
    }

    /// Skip an initializer expression list up to the spec terminator.
    fn skip_expr_list(&mut self) -> ParseResult<()> {
        let start = self.current().start;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(ParseError::new(
                            "unbalanced brackets in expression",
                            self.span_from(start),
                        ));
                    }
                    break;
                }
                _ => {}
            }
            self.advance();
        }
        if self.current().start == start {
            return Err(self.error_here("expected expression"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // type
    // ------------------------------------------------------------------

    fn parse_type_decl(&mut self) -> ParseResult<TypeDecl> {
        let doc = self.doc_here();
        let start = self.advance().start;
        let mut specs = Vec::new();
        let grouped = self.matches(&TokenKind::LParen);
        if grouped {
            loop {
                self.skip_semis();
                if self.matches(&TokenKind::RParen) {
                    break;
                }
                specs.push(self.parse_type_spec()?);
                self.expect_semi()?;
            }
        } else {
            specs.push(self.parse_type_spec()?);
        }
        let span = self.span_from(start);
        self.expect_semi()?;
        Ok(TypeDecl {
            doc,
            grouped,
            specs,
            span,
        })
    }

    fn parse_type_spec(&mut self) -> ParseResult<TypeSpec> {
        let doc = self.doc_here();
        let start = self.current().start;
        let name = self.expect_ident()?;
        let type_params = if self.check(&TokenKind::LBracket) && self.at_type_param_list() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let is_alias = self.matches(&TokenKind::Assign);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            doc,
            name,
            type_params,
            is_alias,
            ty,
            span: self.span_from(start),
        })
    }

    /// At `[` after a type name: a type-parameter list rather than an array length.
    ///
    /// `[P *C]` and `[P (C)]` read as array lengths (`P*C`, a call `P(C)`)
    /// unless a comma follows or the operand can only be a type.
    fn at_type_param_list(&self) -> bool {
        if !matches!(self.peek_nth(1), TokenKind::Ident(_)) {
            return false;
        }
        match self.peek_nth(2) {
            TokenKind::Star | TokenKind::LParen => self.ambiguous_param_is_type(),
            TokenKind::Ident(_)
            | TokenKind::Comma
            | TokenKind::Tilde
            | TokenKind::LBracket
            | TokenKind::Func
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Arrow
            | TokenKind::Struct
            | TokenKind::Interface => true,
            _ => false,
        }
    }

    /// Decide `[P *C ...]` / `[P (C) ...]` by scanning to the closing `]`.
    fn ambiguous_param_is_type(&self) -> bool {
        let call = matches!(self.peek_nth(2), TokenKind::LParen);
        let mut depth = 0usize;
        let mut operand = true;
        let mut n = 3;
        loop {
            let kind = self.peek_nth(n);
            if depth == 0 && operand && self.type_literal_at(n) {
                return true;
            }
            match kind {
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::LBrace => return false,
                TokenKind::RBracket if depth == 0 => return false,
                TokenKind::RParen if depth == 0 && call => {
                    // `P(C)` followed by `,` forces a parameter list.
                    return matches!(self.peek_nth(n + 1), TokenKind::Comma);
                }
                // More than one call argument is an expression; otherwise a
                // trailing comma forces a parameter list.
                TokenKind::Comma if depth == 0 => return !call,
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            operand = matches!(kind, TokenKind::Star | TokenKind::Pipe | TokenKind::Op(_));
            n += 1;
        }
    }

    /// A type literal that cannot start an expression operand starts at `peek_nth(n)`.
    fn type_literal_at(&self, n: usize) -> bool {
        match self.peek_nth(n) {
            TokenKind::Tilde
            | TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Func
            | TokenKind::Struct
            | TokenKind::Interface => true,
            TokenKind::Arrow => matches!(self.peek_nth(n + 1), TokenKind::Chan),
            TokenKind::Star | TokenKind::LParen => self.type_literal_at(n + 1),
            _ => false,
        }
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<TypeParam>> {
        self.expect(&TokenKind::LBracket, "`[`")?;
        let mut params = Vec::new();
        let mut pending = Vec::new();
        loop {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            let name = self.expect_ident()?;
            pending.push(name.name);
            if self.matches(&TokenKind::Comma) {
                continue;
            }
            let constraint = self.parse_constraint()?;
            params.push(TypeParam {
                names: std::mem::take(&mut pending),
                constraint,
            });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        if !pending.is_empty() {
            return Err(self.error_here(format!(
                "missing type constraint for `{}`",
                pending.join(", ")
            )));
        }
        if params.is_empty() {
            return Err(self.error_here("empty type parameter list"));
        }
        self.expect(&TokenKind::RBracket, "`]`")?;
        Ok(params)
    }

    /// `~T | U | V`
    fn parse_constraint(&mut self) -> ParseResult<TypeExpr> {
        let mut terms = vec![self.parse_constraint_term()?];
        while self.matches(&TokenKind::Pipe) {
            terms.push(self.parse_constraint_term()?);
        }
        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(TypeExpr::Union(terms))
        }
    }

    fn parse_constraint_term(&mut self) -> ParseResult<TypeExpr> {
        if self.matches(&TokenKind::Tilde) {
            Ok(TypeExpr::Tilde(Box::new(self.parse_type()?)))
        } else if self.matches(&TokenKind::LParen) {
            let inner = self.parse_constraint()?;
            self.expect(&TokenKind::RParen, "`)`")?;
            Ok(TypeExpr::Paren(Box::new(inner)))
        } else {
            self.parse_type()
        }
    }

    // ------------------------------------------------------------------
    // func
    // ------------------------------------------------------------------

    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let doc = self.doc_here();
        let start = self.advance().start;

        let recv = if self.check(&TokenKind::LParen) {
            let recv_start = self.current().start;
            let mut fields = self.parse_params()?;
            if fields.len() != 1 || fields[0].names.len() > 1 {
                return Err(ParseError::new(
                    "method has multiple receivers",
                    self.span_from(recv_start),
                ));
            }
            fields.pop()
        } else {
            None
        };

        let name = self.expect_ident()?;
        let type_params = if self.check(&TokenKind::LBracket) {
            if recv.is_some() {
                return Err(self.error_here("methods cannot have type parameters"));
            }
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let sig = self.parse_signature()?;

        let has_body = self.check(&TokenKind::LBrace);
        if has_body {
            self.skip_block()?;
        }
        let span = self.span_from(start);
        self.expect_semi()?;

        Ok(FuncDecl {
            doc,
            recv,
            name,
            type_params,
            sig,
            has_body,
            span,
        })
    }

    fn skip_block(&mut self) -> ParseResult<()> {
        let close = self
            .matching_close(0)
            .ok_or_else(|| self.error_here("unclosed `{`"))?;
        self.pos += close + 1;
        Ok(())
    }

    fn parse_signature(&mut self) -> ParseResult<Signature> {
        let params = self.parse_params()?;
        let results = if self.check(&TokenKind::LParen) {
            self.parse_params()?
        } else if self.starts_type() {
            vec![Field {
                names: Vec::new(),
                ty: self.parse_type()?,
            }]
        } else {
            Vec::new()
        };
        Ok(Signature { params, results })
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Ident(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::LParen
        )
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Field>> {
        let open = self.expect(&TokenKind::LParen, "`(`")?;
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.check(&TokenKind::Eof) {
            let name = if matches!(self.peek(), TokenKind::Ident(_)) && self.param_name_follows() {
                Some(self.expect_ident()?.name)
            } else {
                None
            };
            let ty = if self.matches(&TokenKind::Ellipsis) {
                TypeExpr::Ellipsis(Box::new(self.parse_type()?))
            } else {
                self.parse_type()?
            };
            entries.push(ParamEntry { name, ty });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        group_params(entries)
            .map_err(|message| {
                ParseError::new(message, self.span_from(open.start))
            })
    }

    /// At an identifier inside a parameter list: is it a parameter name
    /// followed by its type, rather than a type itself?
    fn param_name_follows(&self) -> bool {
        match self.peek_nth(1) {
            TokenKind::Ident(_)
            | TokenKind::Star
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Arrow
            | TokenKind::Func
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::LParen
            | TokenKind::Ellipsis => true,
            // `a []int` / `a [4]T` versus an instantiated `T[int]`
            TokenKind::LBracket => match self.matching_close(1) {
                Some(close) => !matches!(
                    self.peek_nth(close + 1),
                    TokenKind::Comma | TokenKind::RParen
                ),
                None => false,
            },
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        match self.peek() {
            TokenKind::Ident(_) => self.parse_type_name(),
            TokenKind::Star => {
                self.advance();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            TokenKind::LBracket => {
                self.advance();
                if self.matches(&TokenKind::RBracket) {
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let len = if self.matches(&TokenKind::Ellipsis) {
                    ArrayLen::Inferred
                } else {
                    ArrayLen::Expr(self.parse_const_expr()?)
                };
                self.expect(&TokenKind::RBracket, "`]`")?;
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.parse_type()?),
                })
            }
            TokenKind::Map => {
                self.advance();
                self.expect(&TokenKind::LBracket, "`[`")?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket, "`]`")?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Chan => {
                self.advance();
                let dir = if self.matches(&TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.parse_type()?),
                })
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(&TokenKind::Chan, "`chan`")?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.parse_type()?),
                })
            }
            TokenKind::Func => {
                self.advance();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            TokenKind::Struct => self.parse_struct(),
            TokenKind::Interface => self.parse_interface(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(TypeExpr::Paren(Box::new(inner)))
            }
            _ => Err(self.error_here(format!(
                "expected type, found {}",
                self.describe()
            ))),
        }
    }

    fn parse_type_name(&mut self) -> ParseResult<TypeExpr> {
        let first = self.expect_ident()?.name;
        let (pkg, name) = if self.matches(&TokenKind::Dot) {
            (Some(first), self.expect_ident()?.name)
        } else {
            (None, first)
        };
        let mut args = Vec::new();
        if self.check(&TokenKind::LBracket) && !matches!(self.peek_nth(1), TokenKind::RBracket) {
            self.advance();
            loop {
                args.push(self.parse_type()?);
                if !self.matches(&TokenKind::Comma) || self.check(&TokenKind::RBracket) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket, "`]`")?;
        }
        Ok(TypeExpr::Named { pkg, name, args })
    }

    /// Array length: tokens up to the matching `]`.
    fn parse_const_expr(&mut self) -> ParseResult<ConstExpr> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.current().clone();
            match &token.kind {
                TokenKind::RBracket if depth == 0 => break,
                TokenKind::Eof | TokenKind::Semicolon => {
                    return Err(self.error_here("unterminated array length"));
                }
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                _ => {}
            }
            let text = self.src[token.start..token.end].to_string();
            tokens.push(match token.kind {
                TokenKind::Ident(name) => ExprToken::Ident(name),
                TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Imag(_)
                | TokenKind::Rune(_)
                | TokenKind::Str(_) => ExprToken::Literal(text),
                _ => ExprToken::Punct(text),
            });
            self.advance();
        }
        if tokens.is_empty() {
            return Err(self.error_here("expected array length"));
        }
        Ok(ConstExpr { tokens })
    }

    fn parse_struct(&mut self) -> ParseResult<TypeExpr> {
        self.expect(&TokenKind::Struct, "`struct`")?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.matches(&TokenKind::RBrace) {
                break;
            }
            let (names, ty) = if self.check(&TokenKind::Star) || self.embedded_field_follows() {
                (Vec::new(), self.parse_type()?)
            } else {
                let mut names = vec![self.expect_ident()?.name];
                while self.matches(&TokenKind::Comma) {
                    names.push(self.expect_ident()?.name);
                }
                (names, self.parse_type()?)
            };
            let tag = match self.peek().clone() {
                TokenKind::Str(raw) => {
                    self.advance();
                    Some(raw)
                }
                _ => None,
            };
            fields.push(StructField { names, ty, tag });
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Semicolon, "`;` or newline between fields")?;
            }
        }
        Ok(TypeExpr::Struct(fields))
    }

    /// At an identifier inside a struct: is it an embedded type?
    fn embedded_field_follows(&self) -> bool {
        match self.peek_nth(1) {
            TokenKind::Dot | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Str(_) => true,
            // `T[int]` embedded versus `a [4]int` / `a []int` field
            TokenKind::LBracket => match self.matching_close(1) {
                Some(close) => matches!(
                    self.peek_nth(close + 1),
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Str(_)
                ),
                None => false,
            },
            _ => false,
        }
    }

    fn parse_interface(&mut self) -> ParseResult<TypeExpr> {
        self.expect(&TokenKind::Interface, "`interface`")?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut elems = Vec::new();
        loop {
            self.skip_semis();
            if self.matches(&TokenKind::RBrace) {
                break;
            }
            let is_method = matches!(self.peek(), TokenKind::Ident(_))
                && matches!(self.peek_nth(1), TokenKind::LParen);
            if is_method {
                let name = self.expect_ident()?.name;
                let sig = self.parse_signature()?;
                elems.push(InterfaceElem::Method { name, sig });
            } else {
                elems.push(InterfaceElem::Embed(self.parse_constraint()?));
            }
            if !self.check(&TokenKind::RBrace) {
                self.expect(
                    &TokenKind::Semicolon,
                    "`;` or newline between interface elements",
                )?;
            }
        }
        Ok(TypeExpr::Interface(elems))
    }
}

/// Resolve `a, b int` groups: in a list with any named entry, bare names wait
/// for the next entry's type; otherwise every entry is an unnamed type.
fn group_params(entries: Vec<ParamEntry>) -> Result<Vec<Field>, String> {
    if entries.iter().all(|e| e.name.is_none()) {
        return Ok(entries
            .into_iter()
            .map(|e| Field {
                names: Vec::new(),
                ty: e.ty,
            })
            .collect());
    }

    let mut fields = Vec::new();
    let mut pending = Vec::new();
    for entry in entries {
        match entry.name {
            Some(name) => {
                pending.push(name);
                fields.push(Field {
                    names: std::mem::take(&mut pending),
                    ty: entry.ty,
                });
            }
            None => match entry.ty.as_bare_name() {
                Some(name) => pending.push(name.to_string()),
                None => return Err("mixed named and unnamed parameters".to_string()),
            },
        }
    }
    if !pending.is_empty() {
        return Err("mixed named and unnamed parameters".to_string());
    }
    if fields
        .iter()
        .rev()
        .skip(1)
        .any(|f| matches!(f.ty, TypeExpr::Ellipsis(_)))
    {
        return Err("can only use ... with final parameter".to_string());
    }
    Ok(fields)
}

/// Decode a Go string literal as used by import paths.
pub fn unquote(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return inner.to_string();
    }
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
