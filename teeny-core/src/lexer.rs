//! Scanner for Teeny source text.
//!
//! The scanner is pull-based: the parser asks for one token at a time
//! through [`Scanner::get_token`]. It does not attach any meaning to
//! identifiers beyond recognizing the fixed keyword table.

use std::fmt;

use crate::error::CoreError;

/// Marks the start of a line comment.
const COMMENT_MARKER: u8 = b'#';

/// Value of the current character once the cursor has left the buffer.
/// A NUL byte in the source is read the same way.
const NUL: u8 = b'\0';

/// Kind of a token produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural
    Eof,
    Newline,

    // Literals and names
    Number,
    Ident,
    String,

    // Keywords
    Label,
    Goto,
    Print,
    Input,
    Let,
    If,
    Then,
    EndIf,
    While,
    Repeat,
    EndWhile,

    // Operators
    Eq,       // =
    Plus,     // +
    Minus,    // -
    Asterisk, // *
    Slash,    // /
    EqEq,     // ==
    NotEq,    // !=
    Lt,       // <
    LtEq,     // <=
    Gt,       // >
    GtEq,     // >=
}

impl TokenKind {
    /// Looks up a reserved word. Matching is exact and case-sensitive.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "LABEL" => TokenKind::Label,
            "GOTO" => TokenKind::Goto,
            "PRINT" => TokenKind::Print,
            "INPUT" => TokenKind::Input,
            "LET" => TokenKind::Let,
            "IF" => TokenKind::If,
            "THEN" => TokenKind::Then,
            "ENDIF" => TokenKind::EndIf,
            "WHILE" => TokenKind::While,
            "REPEAT" => TokenKind::Repeat,
            "ENDWHILE" => TokenKind::EndWhile,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq
        )
    }

    /// Upper-case name used in diagnostics and token dumps.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Number => "NUMBER",
            TokenKind::Ident => "IDENT",
            TokenKind::String => "STRING",
            TokenKind::Label => "LABEL",
            TokenKind::Goto => "GOTO",
            TokenKind::Print => "PRINT",
            TokenKind::Input => "INPUT",
            TokenKind::Let => "LET",
            TokenKind::If => "IF",
            TokenKind::Then => "THEN",
            TokenKind::EndIf => "ENDIF",
            TokenKind::While => "WHILE",
            TokenKind::Repeat => "REPEAT",
            TokenKind::EndWhile => "ENDWHILE",
            TokenKind::Eq => "EQ",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Slash => "SLASH",
            TokenKind::EqEq => "EQEQ",
            TokenKind::NotEq => "NOTEQ",
            TokenKind::Lt => "LT",
            TokenKind::LtEq => "LTEQ",
            TokenKind::Gt => "GT",
            TokenKind::GtEq => "GTEQ",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single token with its kind, text and starting line.
///
/// For string literals `text` holds the contents without the quotes.
/// The end-of-input token has empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line the token starts on.
    pub line: u32,
}

/// Converts source text into tokens, one per call.
pub struct Scanner {
    source: String,
    position: usize,
    current: u8,
    line: u32,
    finished: bool,
}

impl Scanner {
    /// Creates a scanner positioned on the first character.
    ///
    /// A newline is appended so the last statement is always terminated.
    pub fn new(source: &str) -> Self {
        let mut source = source.to_owned();
        source.push('\n');
        let current = source.as_bytes()[0];
        Scanner {
            source,
            position: 0,
            current,
            line: 1,
            finished: false,
        }
    }

    /// Moves the cursor one byte forward.
    pub fn next_character(&mut self) {
        if self.current == b'\n' && !self.at_end() {
            self.line += 1;
        }
        self.position += 1;
        self.current = self.byte_at(self.position);
    }

    /// Returns the byte after the cursor without advancing.
    pub fn peek(&self) -> u8 {
        self.byte_at(self.position + 1)
    }

    pub fn get_token(&mut self) -> Result<Token, CoreError> {
        self.skip_whitespace();
        self.skip_comment();

        let start = self.position;
        let line = self.line;
        let kind = match self.current {
            // End of buffer, or a NUL byte inside it
            NUL => TokenKind::Eof,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Asterisk,
            b'/' => TokenKind::Slash,
            b'=' => self.lex_operator(TokenKind::Eq, TokenKind::EqEq),
            b'>' => self.lex_operator(TokenKind::Gt, TokenKind::GtEq),
            b'<' => self.lex_operator(TokenKind::Lt, TokenKind::LtEq),
            b'!' => {
                if self.peek() != b'=' {
                    let got = self.char_at(self.position + 1);
                    return Err(
                        self.error(start, format!("expected !=, got !{}", got.escape_debug()))
                    );
                }
                self.next_character();
                TokenKind::NotEq
            }
            b'"' => return self.lex_string(line),
            b'\n' => TokenKind::Newline,
            ch if ch.is_ascii_digit() => self.lex_number(start)?,
            ch if ch.is_ascii_alphabetic() => self.lex_ident_or_keyword(start),
            _ => {
                let ch = self.char_at(start);
                return Err(self.error(start, format!("unknown token: {:?}", ch)));
            }
        };

        let text = if kind == TokenKind::Eof {
            String::new()
        } else {
            self.source[start..=self.position].to_owned()
        };
        self.next_character();
        Ok(Token { kind, text, line })
    }

    /// Combines `single` with a following `=` into `double`.
    fn lex_operator(&mut self, single: TokenKind, double: TokenKind) -> TokenKind {
        if self.peek() == b'=' {
            self.next_character();
            double
        } else {
            single
        }
    }

    fn lex_string(&mut self, line: u32) -> Result<Token, CoreError> {
        // Skip the opening quote
        self.next_character();

        let content_start = self.position;
        while self.current != b'"' {
            if self.current == NUL {
                return Err(self.error(self.position, "unterminated string literal".into()));
            }
            if matches!(self.current, b'\r' | b'\n' | b'\t' | b'\\' | b'%') {
                let ch = self.current as char;
                return Err(self.error(
                    self.position,
                    format!("illegal character in string: {:?}", ch),
                ));
            }
            self.next_character();
        }

        let text = self.source[content_start..self.position].to_owned();
        // Closing quote
        self.next_character();
        Ok(Token {
            kind: TokenKind::String,
            text,
            line,
        })
    }

    fn lex_number(&mut self, start: usize) -> Result<TokenKind, CoreError> {
        while self.peek().is_ascii_digit() {
            self.next_character();
        }
        if self.peek() == b'.' {
            self.next_character();
            if !self.peek().is_ascii_digit() {
                return Err(self.error(
                    start,
                    format!(
                        "illegal character in number: {} must be followed by a digit",
                        &self.source[start..=self.position]
                    ),
                ));
            }
            while self.peek().is_ascii_digit() {
                self.next_character();
            }
        }
        Ok(TokenKind::Number)
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> TokenKind {
        while self.peek().is_ascii_alphanumeric() {
            self.next_character();
        }
        let text = &self.source[start..=self.position];
        TokenKind::keyword(text).unwrap_or(TokenKind::Ident)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current, b' ' | b'\t' | b'\r') {
            self.next_character();
        }
    }

    fn skip_comment(&mut self) {
        if self.current == COMMENT_MARKER {
            while self.current != b'\n' && !self.at_end() {
                self.next_character();
            }
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.source.as_bytes().get(index).copied().unwrap_or(NUL)
    }

    /// Decodes the full character starting at `index` for diagnostics.
    fn char_at(&self, index: usize) -> char {
        self.source
            .get(index..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or('\0')
    }

    fn error(&self, position: usize, message: String) -> CoreError {
        CoreError::LexError {
            line: self.line,
            position,
            message,
        }
    }
}

/// Yields every token up to and including `Eof`, or up to the first error.
impl Iterator for Scanner {
    type Item = Result<Token, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.get_token();
        match &result {
            Ok(token) if token.kind != TokenKind::Eof => {}
            _ => self.finished = true,
        }
        Some(result)
    }
}

/// Scans the whole source eagerly.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CoreError> {
    Scanner::new(source).collect()
}
