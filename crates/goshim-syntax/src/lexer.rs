//! Lexer for Go source files.
//!
//! Produces the token stream consumed by the declaration parser, including the
//! semicolons Go inserts automatically at line ends, and collects comments into
//! groups so the parser can attach doc comments to declarations.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::ast::Span;
use crate::parser::ParseError;

/// Token kinds for Go source files.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Identifiers and literals (literals keep their raw source text)
    Ident(String),
    Int(String),
    Float(String),
    Imag(String),
    Rune(String),
    Str(String),

    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Punctuation the declaration grammar cares about
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Semicolon, // ; (explicit or inserted)
    Colon,     // :
    Dot,       // .
    Ellipsis,  // ...
    Star,      // *
    Tilde,     // ~
    Pipe,      // |
    Arrow,     // <-
    Assign,    // =
    Define,    // :=

    /// Any other operator, only ever seen inside skipped expressions.
    Op(&'static str),

    Eof,
}

impl TokenKind {
    /// Whether a newline directly after this token inserts a semicolon.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Imag(_)
                | TokenKind::Rune(_)
                | TokenKind::Str(_)
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Op("++")
                | TokenKind::Op("--")
        )
    }
}

/// A token with its kind, byte range and 1-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize, line: u32) -> Self {
        Self {
            kind,
            start,
            end,
            line,
        }
    }
}

/// A single `//` or `/* */` comment, with its delimiters.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub line: u32,
    pub end_line: u32,
}

/// Adjacent comments with no token and at most one line break between them.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentGroup {
    pub comments: Vec<Comment>,
    pub line: u32,
    pub end_line: u32,
    /// No token precedes the group on its first line.
    pub own_line: bool,
    /// Start offset of the first real token after the group.
    pub next_token: Option<usize>,
}

/// Output of [`Lexer::tokenize`].
#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<CommentGroup>,
}

/// Lexer for Go source files.
pub struct Lexer<'src> {
    src: &'src str,
    chars: Peekable<CharIndices<'src>>,
    pos: usize,
    line: u32,
    needs_semi: bool,
    last_token_line: u32,
    group: Option<CommentGroup>,
    groups: Vec<CommentGroup>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            pos: 0,
            line: 1,
            needs_semi: false,
            last_token_line: 0,
            group: None,
            groups: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.pos = pos + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl Into<String>, start: usize) -> ParseError {
        ParseError::new(message, Span::new(start, self.pos.max(start + 1)))
    }

    fn implicit_semi(&mut self) -> Token {
        self.needs_semi = false;
        Token::new(TokenKind::Semicolon, self.pos, self.pos, self.line)
    }

    fn emit(&mut self, kind: TokenKind, start: usize, line: u32) -> Token {
        self.needs_semi = kind.ends_statement();
        self.last_token_line = self.line;
        if let Some(mut group) = self.group.take() {
            group.next_token = Some(start);
            self.groups.push(group);
        }
        Token::new(kind, start, self.pos, line)
    }

    fn push_comment(&mut self, comment: Comment) {
        if let Some(group) = self.group.as_mut() {
            if comment.line <= group.end_line + 1 {
                group.end_line = comment.end_line;
                group.comments.push(comment);
                return;
            }
        }
        if let Some(done) = self.group.take() {
            self.groups.push(done);
        }
        self.group = Some(CommentGroup {
            own_line: self.last_token_line != comment.line,
            line: comment.line,
            end_line: comment.end_line,
            comments: vec![comment],
            next_token: None,
        });
    }

    fn read_line_comment(&mut self, start: usize, line: u32) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        let text = self.src[start..self.pos].trim_end_matches('\r').to_string();
        self.push_comment(Comment {
            text,
            line,
            end_line: line,
        });
    }

    /// Returns whether the comment spanned a line break.
    fn read_block_comment(&mut self, start: usize, line: u32) -> Result<bool, ParseError> {
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                Some(_) => {}
                None => return Err(self.error("comment not terminated", start)),
            }
        }
        let end_line = self.line;
        self.push_comment(Comment {
            text: self.src[start..self.pos].to_string(),
            line,
            end_line,
        });
        Ok(end_line > line)
    }

    fn read_quoted(&mut self, quote: char, start: usize) -> Result<String, ParseError> {
        loop {
            match self.advance() {
                Some('\\') => {
                    if self.advance().is_none() {
                        break;
                    }
                }
                Some('\n') | None => break,
                Some(c) if c == quote => return Ok(self.src[start..self.pos].to_string()),
                Some(_) => {}
            }
        }
        let what = if quote == '\'' { "rune literal" } else { "string literal" };
        Err(self.error(format!("{what} not terminated"), start))
    }

    fn read_raw_string(&mut self, start: usize) -> Result<String, ParseError> {
        loop {
            match self.advance() {
                Some('`') => return Ok(self.src[start..self.pos].to_string()),
                Some(_) => {}
                None => return Err(self.error("raw string literal not terminated", start)),
            }
        }
    }

    fn read_number(&mut self, start: usize) -> TokenKind {
        let hex = self.src[start..].starts_with("0x") || self.src[start..].starts_with("0X");
        let mut prev = self.src[start..self.pos].chars().last().unwrap_or('0');
        while let Some(ch) = self.peek() {
            let exponent_sign = (ch == '+' || ch == '-')
                && if hex {
                    matches!(prev, 'p' | 'P')
                } else {
                    matches!(prev, 'e' | 'E')
                };
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || exponent_sign {
                prev = ch;
                self.advance();
            } else {
                break;
            }
        }
        let text = self.src[start..self.pos].to_string();
        if text.ends_with('i') {
            TokenKind::Imag(text)
        } else if text.contains('.')
            || (hex && text.contains(['p', 'P']))
            || (!hex && text.contains(['e', 'E']))
        {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        }
    }

    fn read_ident(&mut self, start: usize) -> &'src str {
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    fn keyword_or_ident(s: &str) -> TokenKind {
        match s {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => TokenKind::Ident(s.to_string()),
        }
    }

    /// Longest-match operator starting with `first` (already consumed).
    fn read_operator(&mut self, first: char) -> Option<TokenKind> {
        const OPERATORS: &[&str] = &[
            "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=",
            ":=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-",
            "*", "/", "%", "&", "|", "^", "<", ">", "=", "!", "~", ":", ".",
        ];
        let second = self.peek();
        let third = self.peek_second();
        let matched = OPERATORS.iter().copied().find(|op| {
            let mut chars = op.chars();
            chars.next() == Some(first)
                && match (chars.next(), chars.next()) {
                    (None, _) => true,
                    (Some(b), None) => second == Some(b),
                    (Some(b), Some(c)) => second == Some(b) && third == Some(c),
                }
        })?;
        for _ in 1..matched.len() {
            self.advance();
        }
        Some(match matched {
            "..." => TokenKind::Ellipsis,
            "<-" => TokenKind::Arrow,
            ":=" => TokenKind::Define,
            "*" => TokenKind::Star,
            "|" => TokenKind::Pipe,
            "=" => TokenKind::Assign,
            "~" => TokenKind::Tilde,
            ":" => TokenKind::Colon,
            "." => TokenKind::Dot,
            other => TokenKind::Op(other),
        })
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        loop {
            while let Some(ch) = self.peek() {
                match ch {
                    '\n' => {
                        if self.needs_semi {
                            let semi = self.implicit_semi();
                            self.advance();
                            return Ok(semi);
                        }
                        self.advance();
                    }
                    ' ' | '\t' | '\r' | '\u{feff}' => {
                        self.advance();
                    }
                    _ => break,
                }
            }

            let start = self.pos;
            let line = self.line;

            let ch = match self.advance() {
                Some(c) => c,
                None => {
                    if self.needs_semi {
                        return Ok(self.implicit_semi());
                    }
                    if let Some(group) = self.group.take() {
                        self.groups.push(group);
                    }
                    return Ok(Token::new(TokenKind::Eof, start, start, line));
                }
            };

            let kind = match ch {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                '/' if self.peek() == Some('/') => {
                    self.read_line_comment(start, line);
                    continue;
                }
                '/' if self.peek() == Some('*') => {
                    self.advance();
                    let multiline = self.read_block_comment(start, line)?;
                    if multiline && self.needs_semi {
                        return Ok(self.implicit_semi());
                    }
                    continue;
                }
                '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(start),
                '"' => TokenKind::Str(self.read_quoted('"', start)?),
                '\'' => TokenKind::Rune(self.read_quoted('\'', start)?),
                '`' => TokenKind::Str(self.read_raw_string(start)?),
                c if c.is_ascii_digit() => self.read_number(start),
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_ident(start);
                    Self::keyword_or_ident(ident)
                }
                c => match self.read_operator(c) {
                    Some(kind) => kind,
                    None => return Err(self.error(format!("invalid character {c:?}"), start)),
                },
            };

            return Ok(self.emit(kind, start, line));
        }
    }

    /// Collect all tokens and comment groups.
    pub fn tokenize(mut self) -> Result<Lexed, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(Lexed {
            tokens,
            comments: self.groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_package_clause_inserts_semicolon() {
        assert_eq!(
            kinds("package foo\n"),
            vec![
                TokenKind::Package,
                TokenKind::Ident("foo".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let k = kinds("x = a +\nb\n");
        assert_eq!(
            k,
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Assign,
                TokenKind::Ident("a".to_string()),
                TokenKind::Op("+"),
                TokenKind::Ident("b".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_variadic_and_channels() {
        let k = kinds("func(xs ...int, c <-chan T)");
        assert_eq!(k[3], TokenKind::Ellipsis);
        assert_eq!(k[7], TokenKind::Arrow);
        assert_eq!(k[8], TokenKind::Chan);
    }

    #[test]
    fn test_longest_match_operators() {
        let k = kinds("a &^= b << c := d");
        assert_eq!(k[1], TokenKind::Op("&^="));
        assert_eq!(k[3], TokenKind::Op("<<"));
        assert_eq!(k[5], TokenKind::Define);
    }

    #[test]
    fn test_number_forms() {
        let k = kinds("1_000 0x1p-2 1e+9 .5 3i 0o17");
        assert_eq!(k[0], TokenKind::Int("1_000".to_string()));
        assert_eq!(k[1], TokenKind::Float("0x1p-2".to_string()));
        assert_eq!(k[2], TokenKind::Float("1e+9".to_string()));
        assert_eq!(k[3], TokenKind::Float(".5".to_string()));
        assert_eq!(k[4], TokenKind::Imag("3i".to_string()));
        assert_eq!(k[5], TokenKind::Int("0o17".to_string()));
    }

    #[test]
    fn test_strings_keep_raw_text() {
        let k = kinds("\"a\\\"b\" `raw\nline` 'x'");
        assert_eq!(k[0], TokenKind::Str("\"a\\\"b\"".to_string()));
        assert_eq!(k[1], TokenKind::Str("`raw\nline`".to_string()));
        assert_eq!(k[2], TokenKind::Rune("'x'".to_string()));
    }

    #[test]
    fn test_raw_string_counts_lines() {
        let lexed = Lexer::new("var x = `a\nb`\nvar y").tokenize().unwrap();
        let y = lexed
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Ident("y".to_string()))
            .unwrap();
        assert_eq!(y.line, 3);
    }

    #[test]
    fn test_comment_groups() {
        let src = "package p\n\n// First line.\n// Second line.\nconst A = 1 // trailing\n\n\
            /* lone */\n\nvar B int\n";
        let lexed = Lexer::new(src).tokenize().unwrap();
        assert_eq!(lexed.comments.len(), 3);

        let doc = &lexed.comments[0];
        assert_eq!(doc.comments.len(), 2);
        assert_eq!((doc.line, doc.end_line), (3, 4));
        assert!(doc.own_line);
        assert_eq!(doc.next_token, Some(src.find("const").unwrap()));

        let trailing = &lexed.comments[1];
        assert!(!trailing.own_line);

        let lone = &lexed.comments[2];
        assert_eq!(lone.comments[0].text, "/* lone */");
        assert_eq!(lone.next_token, Some(src.find("var").unwrap()));
    }

    #[test]
    fn test_multiline_block_comment_acts_as_newline() {
        let k = kinds("x /* a\nb */ y");
        assert_eq!(
            k,
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Semicolon,
                TokenKind::Ident("y".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = Lexer::new("\"abc\n").tokenize().unwrap_err();
        assert!(err.message.contains("not terminated"));
        assert_eq!(err.span.range.start, 0);
    }

    #[test]
    fn test_invalid_character_is_error() {
        let err = Lexer::new("a @ b").tokenize().unwrap_err();
        assert!(err.message.contains("invalid character"));
    }
}
