//! Scanner for dinein source code
//!
//! Converts raw source text into the flat `(lexeme, kind, line)` [`Token`]
//! stream consumed by the table-driven parser. Comments (`// ...` and
//! `/- ... -/`) and whitespace are discarded here, so the parser never sees
//! them.
//!
//! Scanning does not stop at the first problem: every malformed lexeme is
//! recorded as a [`LexError`] and the scanner resynchronises on the next
//! character, so a single pass reports all lexical errors.

use std::fmt;
use thiserror::Error;

/// Longest identifier the language accepts.
pub const MAX_IDENTIFIER_LENGTH: usize = 32;

/// Longest string literal body the language accepts.
pub const MAX_PASTA_LENGTH: usize = 256;

/// Maximum digits on either side of the decimal point of a numeric literal.
pub const MAX_NUMBER_DIGITS: usize = 9;

/// Terminal symbols of the grammar.
///
/// The [`fmt::Display`] spelling of each variant is the terminal name used by
/// the grammar table and by syntax error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Keywords
    Bleh,
    Bool,
    Case,
    Chef,
    Chop,
    Default,
    Dinein,
    Dish,
    Elif,
    Flip,
    For,
    Full,
    Hungry,
    Keepmix,
    Make,
    Mix,
    Pasta,
    Pinch,
    Recipe,
    Serve,
    Simmer,
    Skim,
    Spit,
    Takeout,
    Taste,
    Yum,

    // Literals and identifiers
    PinchLiteral,
    SkimLiteral,
    PastaLiteral,
    Id,

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Logical
    AndAnd,   // &&
    OrOr,     // ??
    Bang,     // !
    BangBang, // !!

    // Assignment
    Assign,    // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=

    // Increment/Decrement
    PlusPlus,   // ++
    MinusMinus, // --

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
}

impl TokenKind {
    /// Terminal name as written in the grammar.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Bleh => "bleh",
            TokenKind::Bool => "bool",
            TokenKind::Case => "case",
            TokenKind::Chef => "chef",
            TokenKind::Chop => "chop",
            TokenKind::Default => "default",
            TokenKind::Dinein => "dinein",
            TokenKind::Dish => "dish",
            TokenKind::Elif => "elif",
            TokenKind::Flip => "flip",
            TokenKind::For => "for",
            TokenKind::Full => "full",
            TokenKind::Hungry => "hungry",
            TokenKind::Keepmix => "keepmix",
            TokenKind::Make => "make",
            TokenKind::Mix => "mix",
            TokenKind::Pasta => "pasta",
            TokenKind::Pinch => "pinch",
            TokenKind::Recipe => "recipe",
            TokenKind::Serve => "serve",
            TokenKind::Simmer => "simmer",
            TokenKind::Skim => "skim",
            TokenKind::Spit => "spit",
            TokenKind::Takeout => "takeout",
            TokenKind::Taste => "taste",
            TokenKind::Yum => "yum",
            TokenKind::PinchLiteral => "pinchliterals",
            TokenKind::SkimLiteral => "skimliterals",
            TokenKind::PastaLiteral => "pastaliterals",
            TokenKind::Id => "id",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "??",
            TokenKind::Bang => "!",
            TokenKind::BangBang => "!!",
            TokenKind::Assign => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
        }
    }

    fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "bleh" => TokenKind::Bleh,
            "bool" => TokenKind::Bool,
            "case" => TokenKind::Case,
            "chef" => TokenKind::Chef,
            "chop" => TokenKind::Chop,
            "default" => TokenKind::Default,
            "dinein" => TokenKind::Dinein,
            "dish" => TokenKind::Dish,
            "elif" => TokenKind::Elif,
            "flip" => TokenKind::Flip,
            "for" => TokenKind::For,
            "full" => TokenKind::Full,
            "hungry" => TokenKind::Hungry,
            "keepmix" => TokenKind::Keepmix,
            "make" => TokenKind::Make,
            "mix" => TokenKind::Mix,
            "pasta" => TokenKind::Pasta,
            "pinch" => TokenKind::Pinch,
            "recipe" => TokenKind::Recipe,
            "serve" => TokenKind::Serve,
            "simmer" => TokenKind::Simmer,
            "skim" => TokenKind::Skim,
            "spit" => TokenKind::Spit,
            "takeout" => TokenKind::Takeout,
            "taste" => TokenKind::Taste,
            "yum" => TokenKind::Yum,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Source spelling. String literals keep their quotes; escapes are resolved.
    pub lexeme: String,
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenKind, line: usize) -> Self {
        Token {
            lexeme: lexeme.into(),
            kind,
            line,
        }
    }
}

/// Lexical error with its position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Lexical Error: {message} at line {line}, column {column}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Everything one scan produces.
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

/// Scanner for dinein source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    errors: Vec<LexError>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    /// Scan the entire input, collecting tokens and lexical errors.
    pub fn tokenize(mut self) -> LexOutput {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                break;
            }

            if let Some(token) = self.next_token() {
                tokens.push(token);
            }
        }

        tracing::debug!(
            tokens = tokens.len(),
            errors = self.errors.len(),
            "scan complete"
        );

        LexOutput {
            tokens,
            errors: self.errors,
        }
    }

    /// Scan one token. Returns `None` when the lexeme was malformed (the error
    /// is recorded and scanning resumes after it).
    fn next_token(&mut self) -> Option<Token> {
        let (line, column) = (self.line, self.column);
        let ch = self.advance()?;

        let simple = |kind: TokenKind| Some(Token::new(kind.as_str(), kind, line));

        match ch {
            '"' => self.pasta_literal(line, column),

            '~' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.number_literal(String::from("-"), line, column)
                } else {
                    self.error("Expected digit after '~'", line, column);
                    None
                }
            }

            '0'..='9' => self.number_literal(ch.to_string(), line, column),

            'a'..='z' => self.identifier_or_keyword(ch, line, column),

            '+' => {
                if self.match_char('+') {
                    simple(TokenKind::PlusPlus)
                } else if self.match_char('=') {
                    simple(TokenKind::PlusEq)
                } else {
                    simple(TokenKind::Plus)
                }
            }
            '-' => {
                if self.match_char('-') {
                    simple(TokenKind::MinusMinus)
                } else if self.match_char('=') {
                    simple(TokenKind::MinusEq)
                } else {
                    simple(TokenKind::Minus)
                }
            }
            '*' => {
                if self.match_char('=') {
                    simple(TokenKind::StarEq)
                } else {
                    simple(TokenKind::Star)
                }
            }
            '/' => {
                if self.match_char('=') {
                    simple(TokenKind::SlashEq)
                } else {
                    simple(TokenKind::Slash)
                }
            }
            '%' => {
                if self.match_char('=') {
                    simple(TokenKind::PercentEq)
                } else {
                    simple(TokenKind::Percent)
                }
            }
            '=' => {
                if self.match_char('=') {
                    simple(TokenKind::EqEq)
                } else {
                    simple(TokenKind::Assign)
                }
            }
            '!' => {
                if self.match_char('=') {
                    simple(TokenKind::NotEq)
                } else if self.match_char('!') {
                    simple(TokenKind::BangBang)
                } else {
                    simple(TokenKind::Bang)
                }
            }
            '<' => {
                if self.match_char('=') {
                    simple(TokenKind::Le)
                } else {
                    simple(TokenKind::Lt)
                }
            }
            '>' => {
                if self.match_char('=') {
                    simple(TokenKind::Ge)
                } else {
                    simple(TokenKind::Gt)
                }
            }
            '&' => {
                if self.match_char('&') {
                    simple(TokenKind::AndAnd)
                } else {
                    self.error("Invalid character '&', expected '&&'", line, column);
                    None
                }
            }
            '?' => {
                if self.match_char('?') {
                    simple(TokenKind::OrOr)
                } else {
                    self.error("Invalid character '?', expected '??'", line, column);
                    None
                }
            }
            '(' => simple(TokenKind::LParen),
            ')' => simple(TokenKind::RParen),
            '[' => simple(TokenKind::LBracket),
            ']' => simple(TokenKind::RBracket),
            '{' => simple(TokenKind::LBrace),
            '}' => simple(TokenKind::RBrace),
            ',' => simple(TokenKind::Comma),
            ';' => simple(TokenKind::Semicolon),
            ':' => simple(TokenKind::Colon),

            _ => {
                self.error(format!("Invalid character '{}'", ch), line, column);
                None
            }
        }
    }

    /// Scan a string literal. The opening quote is already consumed.
    fn pasta_literal(&mut self, line: usize, column: usize) -> Option<Token> {
        let mut body = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.error("Unterminated pastaliteral", line, column);
                    return None;
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => body.push('\n'),
                        Some('t') => body.push('\t'),
                        Some('"') => body.push('"'),
                        Some('\\') => body.push('\\'),
                        // Unknown escapes are kept as written
                        Some(other) => body.push(other),
                        None => {
                            self.error("Unterminated pastaliteral", line, column);
                            return None;
                        }
                    }
                }
                Some(ch) => {
                    body.push(ch);
                    self.advance();
                }
            }
        }

        if body.chars().count() > MAX_PASTA_LENGTH {
            self.error(
                format!("Pastaliteral exceeds {} characters", MAX_PASTA_LENGTH),
                line,
                column,
            );
            return None;
        }

        Some(Token::new(
            format!("\"{}\"", body),
            TokenKind::PastaLiteral,
            line,
        ))
    }

    /// Scan an integer or float literal. `text` already holds the sign (if any)
    /// and/or the first digit.
    fn number_literal(&mut self, mut text: String, line: usize, column: usize) -> Option<Token> {
        let mut int_digits = text.chars().filter(|c| c.is_ascii_digit()).count();
        while let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            int_digits += 1;
            self.advance();
        }

        if int_digits > MAX_NUMBER_DIGITS {
            self.error(
                format!("Pinchliteral exceeds {} digits", MAX_NUMBER_DIGITS),
                line,
                column,
            );
            return None;
        }

        if !self.match_char('.') {
            if let Some(ch) = self.peek().filter(|c| c.is_ascii_alphabetic() || *c == '_') {
                self.skip_word();
                self.error(format!("Invalid suffix '{}' on pinchliteral", ch), line, column);
                return None;
            }
            return Some(Token::new(text, TokenKind::PinchLiteral, line));
        }

        text.push('.');
        let mut frac_digits = 0;
        while let Some(ch) = self.peek().filter(|c| c.is_ascii_digit()) {
            text.push(ch);
            frac_digits += 1;
            self.advance();
        }

        if frac_digits == 0 {
            self.error("Expected digit after '.'", line, column);
            return None;
        }
        if frac_digits > MAX_NUMBER_DIGITS {
            self.error(
                format!("Skimliteral exceeds {} digits", MAX_NUMBER_DIGITS),
                line,
                column,
            );
            return None;
        }
        if self.peek() == Some('.') {
            self.skip_word();
            self.error("Expected single '.' in skimliteral", line, column);
            return None;
        }
        if let Some(ch) = self.peek().filter(|c| c.is_ascii_alphabetic() || *c == '_') {
            self.skip_word();
            self.error(format!("Invalid suffix '{}' on skimliteral", ch), line, column);
            return None;
        }

        Some(Token::new(text, TokenKind::SkimLiteral, line))
    }

    /// Scan identifier or keyword
    fn identifier_or_keyword(&mut self, first: char, line: usize, column: usize) -> Option<Token> {
        let mut ident = String::new();
        ident.push(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(kind) = TokenKind::keyword(&ident) {
            return Some(Token::new(ident, kind, line));
        }

        if ident.len() > MAX_IDENTIFIER_LENGTH {
            self.error(
                format!("Identifier exceeds {} characters", MAX_IDENTIFIER_LENGTH),
                line,
                column,
            );
            return None;
        }

        Some(Token::new(ident, TokenKind::Id, line))
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_ahead(1) == Some('-') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Skip multi-line comment (/- ... -/)
    fn skip_block_comment(&mut self) {
        let (line, column) = (self.line, self.column);
        self.advance(); // skip '/'
        self.advance(); // skip '-'

        while !self.is_at_end() {
            if self.peek() == Some('-') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }

        self.error("Unterminated block comment", line, column);
    }

    /// Discard the rest of a malformed word so it is reported once.
    fn skip_word(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
    }

    fn error(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.errors.push(LexError {
            message: message.into(),
            line,
            column,
        });
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
