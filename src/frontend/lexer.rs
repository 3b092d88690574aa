use std::{collections::BTreeMap, str::Chars};

use itertools::{PeekNth, peek_nth};
use once_cell::sync::Lazy;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::frontend::SourceFile;

#[derive(Debug)]
pub struct Lexer<'source> {
    source: &'source SourceFile,
    position: usize,
    chars: PeekNth<Chars<'source>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact lexeme, string quotes and number prefixes included
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,

    /* Words */
    Keyword(Keyword), // func
    Identifier,       // main

    /* Literals */
    StringLiteral, // "hello, world"
    NumberLiteral, // 1, 0xff

    /* Delimiters */
    OpenParen,  // (
    CloseParen, // )
    OpenBrace,  // {
    CloseBrace, // }
    Semicolon,  // ;
    Comma,      // ,

    /* Other */
    Colon,       // :
    DoubleColon, // ::
    At,          // @
    Dot,         // .

    /* Operators */
    Equals,       // =
    DoubleEquals, // ==
    Plus,         // +
    Minus,        // -
    Asterisk,     // *
    Percent,      // %
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    Import,
    Class,
    Func,
    Var,
    Attrib,
    If,
    Else,
    As,
    Return,
    Void,
    U64,
    U32,
    I32,
    #[strum(serialize = "String")]
    String,
    #[strum(serialize = "Variadic")]
    Variadic,
}

impl Keyword {
    /// Keywords which may also name a type
    pub fn is_type_name(&self) -> bool {
        matches!(
            self,
            Self::Void | Self::U64 | Self::U32 | Self::I32 | Self::String | Self::Variadic
        )
    }
}

/// Table of single char tokens (matched after longer sequences are checked for)
static SINGLE_TOKENS: Lazy<BTreeMap<char, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        ('@', TokenKind::At),
        ('(', TokenKind::OpenParen),
        (')', TokenKind::CloseParen),
        ('{', TokenKind::OpenBrace),
        ('}', TokenKind::CloseBrace),
        (',', TokenKind::Comma),
        (';', TokenKind::Semicolon),
        ('%', TokenKind::Percent),
        ('-', TokenKind::Minus),
        ('+', TokenKind::Plus),
        ('.', TokenKind::Dot),
        ('*', TokenKind::Asterisk),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Invalid character found with the value of `{character}`")]
    UnexpectedCharacter { character: char, span: Span },
    #[error("Missing terminating \" character")]
    UnterminatedString { span: Span },
    #[error("Expected hexadecimal digits after `0x`")]
    MissingDigits { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::MissingDigits { span } => *span,
        }
    }
}

/// Whether `c` is a digit of the given base (up to 16)
fn is_digit_in_base(c: char, base: u32) -> bool {
    let c = c.to_ascii_uppercase();

    match base {
        0..=10 => ('0'..char::from(b'0' + base as u8)).contains(&c),
        11..=16 => {
            c.is_ascii_digit() || ('A'..char::from(b'A' + (base - 10) as u8)).contains(&c)
        }
        _ => false,
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source SourceFile) -> Self {
        Self {
            source,
            chars: peek_nth(source.contents.chars()),
            position: 0,
        }
    }

    /// Lexes the whole source from the beginning. The returned stream always
    /// ends with exactly one [`TokenKind::Eof`] token.
    pub fn lex_all_tokens(&mut self) -> Result<Vec<Token>, LexError> {
        self.chars = peek_nth(self.source.contents.chars());
        self.position = 0;

        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;

            tokens.push(token);

            if is_eof {
                return Ok(tokens);
            }
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn ignore_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.advance();
        }

        // Comments run to the end of the line, after which there may be more
        // whitespace (and more comments)
        if self.chars.peek() == Some(&'#') {
            while self.chars.peek().is_some_and(|c| *c != '\n') {
                self.advance();
            }

            self.ignore_whitespace();
        }
    }

    fn new_span(&self, start: usize) -> Span {
        Span {
            start,
            end: self.position,
        }
    }

    fn token_from(&self, kind: TokenKind, start: usize) -> Token {
        let span = self.new_span(start);

        Token {
            kind,
            text: self.source.value_of_span(span).to_owned(),
            span,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.ignore_whitespace();

        let start = self.position;

        let Some(c) = self.chars.peek().copied() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span: Span::new(start, start),
            });
        };

        let token = match c {
            // Double colon (::)
            ':' if self.chars.peek_nth(1) == Some(&':') => self.read_double(TokenKind::DoubleColon),
            ':' => self.read_single(TokenKind::Colon),

            // Double equals (==)
            '=' if self.chars.peek_nth(1) == Some(&'=') => {
                self.read_double(TokenKind::DoubleEquals)
            }
            '=' => self.read_single(TokenKind::Equals),

            '"' => self.read_string()?,

            a if is_identifier_start(a) => self.read_word(),
            n if n.is_ascii_digit() => self.read_number()?,

            s if SINGLE_TOKENS.contains_key(&s) => self.read_single(SINGLE_TOKENS[&s]),

            character => {
                self.advance();

                return Err(LexError::UnexpectedCharacter {
                    character,
                    span: self.new_span(start),
                });
            }
        };

        Ok(token)
    }

    fn read_single(&mut self, kind: TokenKind) -> Token {
        let start = self.position;
        self.advance();
        self.token_from(kind, start)
    }

    fn read_double(&mut self, kind: TokenKind) -> Token {
        let start = self.position;
        self.advance();
        self.advance();
        self.token_from(kind, start)
    }

    // Keyword or identifier
    fn read_word(&mut self) -> Token {
        let start = self.position;

        while self.chars.peek().copied().is_some_and(is_identifier_continue) {
            self.advance();
        }

        let mut token = self.token_from(TokenKind::Identifier, start);

        if let Ok(keyword) = token.text.parse::<Keyword>() {
            token.kind = TokenKind::Keyword(keyword);
        }

        token
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;

        let base = if self.chars.peek() == Some(&'0') && self.chars.peek_nth(1) == Some(&'x') {
            self.advance();
            self.advance();
            16
        } else {
            10
        };

        let digits_start = self.position;

        while self
            .chars
            .peek()
            .is_some_and(|c| is_digit_in_base(*c, base))
        {
            self.advance();
        }

        if self.position == digits_start {
            return Err(LexError::MissingDigits {
                span: self.new_span(start),
            });
        }

        Ok(self.token_from(TokenKind::NumberLiteral, start))
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start = self.position;

        // Consume opening quote
        self.advance();

        loop {
            match self.advance() {
                Some('"') => return Ok(self.token_from(TokenKind::StringLiteral, start)),
                Some(_) => {}
                None => {
                    return Err(LexError::UnterminatedString {
                        span: self.new_span(start),
                    });
                }
            }
        }
    }
}
