//! Recursive-descent parser for Teeny.
//!
//! There is no syntax tree. Each grammar rule validates its input and
//! pushes C fragments into the [`Emitter`] as soon as it is recognized,
//! so emission order is exactly source order.
//!
//! ```text
//! program    := {newline} {statement} EOF
//! statement  := "PRINT" (STRING | expression) nl
//!             | "IF" comparison "THEN" nl {statement} "ENDIF" nl
//!             | "WHILE" comparison "REPEAT" nl {statement} "ENDWHILE" nl
//!             | "LABEL" IDENT nl
//!             | "GOTO" IDENT nl
//!             | "LET" IDENT "=" expression nl
//!             | "INPUT" IDENT nl
//! comparison := expression (cmpop expression)+
//! expression := term {("+" | "-") term}
//! term       := unary {("*" | "/") unary}
//! unary      := ["+" | "-"] primary
//! primary    := NUMBER | IDENT
//! nl         := NEWLINE {NEWLINE}
//! ```

use std::collections::HashSet;
use std::mem;

use tracing::trace;

use crate::emitter::Emitter;
use crate::error::CoreError;
use crate::lexer::{Scanner, Token, TokenKind};

/// A `GOTO` target, checked once the whole program has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LabelRef {
    name: String,
    line: u32,
}

pub struct Parser<'e> {
    scanner: Scanner,
    emitter: &'e mut Emitter,

    current: Token,
    peek: Token,

    symbols: HashSet<String>,
    labels_declared: HashSet<String>,
    labels_gotoed: Vec<LabelRef>,
}

impl<'e> Parser<'e> {
    /// Binds a parser to its token source and output sink.
    ///
    /// Fails if either of the first two tokens cannot be scanned.
    pub fn new(mut scanner: Scanner, emitter: &'e mut Emitter) -> Result<Self, CoreError> {
        let current = scanner.get_token()?;
        let peek = scanner.get_token()?;
        Ok(Parser {
            scanner,
            emitter,
            current,
            peek,
            symbols: HashSet::new(),
            labels_declared: HashSet::new(),
            labels_gotoed: Vec::new(),
        })
    }

    /// Variables declared so far.
    pub fn symbols(&self) -> &HashSet<String> {
        &self.symbols
    }

    /// Labels declared so far.
    pub fn labels(&self) -> &HashSet<String> {
        &self.labels_declared
    }

    /// Parses and emits a whole program.
    pub fn program(&mut self) -> Result<(), CoreError> {
        trace!("program");
        self.emitter.header_line("#include <stdio.h>");
        self.emitter.header_line("int main(void){");

        // Leading blank lines
        while self.check_token(TokenKind::Newline) {
            self.next_token()?;
        }

        while !self.check_token(TokenKind::Eof) {
            self.statement()?;
        }

        self.emitter.emit_line("return 0;");
        self.emitter.emit_line("}");

        // Forward references are legal, so targets are only checked here.
        for label in &self.labels_gotoed {
            if !self.labels_declared.contains(&label.name) {
                return Err(CoreError::SemanticError {
                    line: label.line,
                    message: format!("attempting to GOTO an undeclared label: {}", label.name),
                });
            }
        }
        Ok(())
    }

    fn statement(&mut self) -> Result<(), CoreError> {
        trace!(kind = %self.current.kind, "statement");
        match self.current.kind {
            // PRINT (STRING | expression)
            TokenKind::Print => {
                self.next_token()?;
                if self.check_token(TokenKind::String) {
                    let line = format!("printf(\"{}\\n\");", self.current.text);
                    self.emitter.emit_line(&line);
                    self.next_token()?;
                } else {
                    self.emitter.emit("printf(\"%.2f\\n\", (float)(");
                    self.expression()?;
                    self.emitter.emit_line("));");
                }
            }
            // IF comparison THEN nl {statement} ENDIF
            TokenKind::If => {
                self.next_token()?;
                self.emitter.emit("if(");
                self.comparison()?;

                self.match_token(TokenKind::Then)?;
                self.nl()?;
                self.emitter.emit_line("){");

                while !self.check_token(TokenKind::EndIf) {
                    self.statement()?;
                }

                self.match_token(TokenKind::EndIf)?;
                self.emitter.emit_line("}");
            }
            // WHILE comparison REPEAT nl {statement} ENDWHILE
            TokenKind::While => {
                self.next_token()?;
                self.emitter.emit("while(");
                self.comparison()?;

                self.match_token(TokenKind::Repeat)?;
                self.nl()?;
                self.emitter.emit_line("){");

                while !self.check_token(TokenKind::EndWhile) {
                    self.statement()?;
                }

                self.match_token(TokenKind::EndWhile)?;
                self.emitter.emit_line("}");
            }
            // LABEL ident
            TokenKind::Label => {
                self.next_token()?;
                let line = self.current.line;
                let name = self.expect_ident()?;
                if self.labels_declared.contains(&name) {
                    return Err(CoreError::SemanticError {
                        line,
                        message: format!("label already exists: {name}"),
                    });
                }
                // A null statement keeps a label legal at the end of a block.
                self.emitter.emit_line(&format!("{name}:;"));
                self.labels_declared.insert(name);
            }
            // GOTO ident
            TokenKind::Goto => {
                self.next_token()?;
                let line = self.current.line;
                let name = self.expect_ident()?;
                self.emitter.emit_line(&format!("goto {name};"));
                self.labels_gotoed.push(LabelRef { name, line });
            }
            // LET ident = expression
            TokenKind::Let => {
                self.next_token()?;
                let name = self.expect_ident()?;
                self.declare(&name);
                self.emitter.emit(&format!("{name} = "));
                self.match_token(TokenKind::Eq)?;
                self.expression()?;
                self.emitter.emit_line(";");
            }
            // INPUT ident
            TokenKind::Input => {
                self.next_token()?;
                let name = self.expect_ident()?;
                self.declare(&name);

                // A failed read zeroes the variable and drops the rest of the line.
                self.emitter
                    .emit_line(&format!("if(0 == scanf(\"%f\", &{name})) {{"));
                self.emitter.emit_line(&format!("{name} = 0;"));
                self.emitter.emit_line("scanf(\"%*s\");");
                self.emitter.emit_line("}");
            }
            _ => {
                return Err(CoreError::ParseError {
                    line: self.current.line,
                    message: format!("invalid statement at {}", describe(&self.current)),
                });
            }
        }

        self.nl()
    }

    /// comparison := expression (cmpop expression)+
    fn comparison(&mut self) -> Result<(), CoreError> {
        trace!("comparison");
        self.expression()?;

        if !self.current.kind.is_comparison() {
            return Err(CoreError::ParseError {
                line: self.current.line,
                message: format!(
                    "expected comparison operator at {}",
                    describe(&self.current)
                ),
            });
        }
        while self.current.kind.is_comparison() {
            self.binary_operator();
            self.next_token()?;
            self.expression()?;
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<(), CoreError> {
        trace!("expression");
        self.term()?;
        while self.check_token(TokenKind::Plus) || self.check_token(TokenKind::Minus) {
            self.binary_operator();
            self.next_token()?;
            self.term()?;
        }
        Ok(())
    }

    fn term(&mut self) -> Result<(), CoreError> {
        trace!("term");
        self.unary()?;
        while self.check_token(TokenKind::Asterisk) || self.check_token(TokenKind::Slash) {
            self.binary_operator();
            self.next_token()?;
            self.unary()?;
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<(), CoreError> {
        trace!("unary");
        if self.check_token(TokenKind::Plus) || self.check_token(TokenKind::Minus) {
            self.emitter.emit(&self.current.text);
            self.next_token()?;
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<(), CoreError> {
        trace!(kind = %self.current.kind, text = ?self.current.text, "primary");
        match self.current.kind {
            TokenKind::Number => {}
            TokenKind::Ident => {
                if !self.symbols.contains(&self.current.text) {
                    return Err(CoreError::SemanticError {
                        line: self.current.line,
                        message: format!(
                            "referencing variable before assignment: {}",
                            self.current.text
                        ),
                    });
                }
            }
            _ => {
                return Err(CoreError::ParseError {
                    line: self.current.line,
                    message: format!("unexpected token {}", describe(&self.current)),
                });
            }
        }
        self.emitter.emit(&self.current.text);
        self.next_token()
    }

    /// Emits the current operator with a space on each side, so `a - -b`
    /// cannot turn into the C decrement operator.
    fn binary_operator(&mut self) {
        self.emitter.emit(" ");
        self.emitter.emit(&self.current.text);
        self.emitter.emit(" ");
    }

    /// nl := NEWLINE {NEWLINE}
    fn nl(&mut self) -> Result<(), CoreError> {
        trace!("newline");
        self.match_token(TokenKind::Newline)?;
        while self.check_token(TokenKind::Newline) {
            self.next_token()?;
        }
        Ok(())
    }

    /// Adds `name` to the symbol set, declaring it in the header the first time.
    fn declare(&mut self, name: &str) {
        if !self.symbols.contains(name) {
            self.emitter.header_line(&format!("float {name};"));
            self.symbols.insert(name.to_owned());
        }
    }

    fn check_token(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> Result<(), CoreError> {
        if !self.check_token(kind) {
            return Err(CoreError::ParseError {
                line: self.current.line,
                message: format!("expected {kind}, got {}", describe(&self.current)),
            });
        }
        self.next_token()
    }

    /// Matches an identifier and returns its name.
    fn expect_ident(&mut self) -> Result<String, CoreError> {
        if !self.check_token(TokenKind::Ident) {
            return Err(CoreError::ParseError {
                line: self.current.line,
                message: format!("expected IDENT, got {}", describe(&self.current)),
            });
        }
        let name = self.current.text.clone();
        self.next_token()?;
        Ok(name)
    }

    fn next_token(&mut self) -> Result<(), CoreError> {
        let next = self.scanner.get_token()?;
        self.current = mem::replace(&mut self.peek, next);
        Ok(())
    }
}

/// Renders a token for diagnostics without embedding raw newlines.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Newline | TokenKind::Eof => token.kind.name().to_owned(),
        kind => format!("'{}' ({kind})", token.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Emitter, CoreError> {
        let mut emitter = Emitter::new();
        {
            let mut parser = Parser::new(Scanner::new(source), &mut emitter)?;
            parser.program()?;
        }
        Ok(emitter)
    }

    fn body(source: &str) -> String {
        parse(source).expect("parse").code().to_owned()
    }

    #[test]
    fn accepts_label_before_goto() {
        let emitter = parse("LABEL a\nGOTO a\n").expect("parse");
        assert!(emitter.code().contains("a:;\n"));
        assert!(emitter.code().contains("goto a;\n"));
    }

    #[test]
    fn accepts_forward_goto() {
        let code = body("GOTO done\nPRINT 1\nLABEL done\n");
        assert!(code.find("goto done;") < code.find("done:;"));
    }

    #[test]
    fn rejects_goto_to_undeclared_label_naming_the_first_one() {
        let err = parse("GOTO a\nGOTO b\nLABEL b\nGOTO c\n").unwrap_err();
        match err {
            CoreError::SemanticError { line, message } => {
                assert_eq!(line, 1);
                assert!(message.ends_with(": a"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_label() {
        let err = parse("LABEL top\nPRINT 1\nLABEL top\n").unwrap_err();
        match err {
            CoreError::SemanticError { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("label already exists: top"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_variable_used_before_assignment() {
        let err = parse("PRINT x\n").unwrap_err();
        assert!(matches!(err, CoreError::SemanticError { .. }));
        assert!(err.to_string().contains("before assignment: x"));
    }

    #[test]
    fn first_assignment_may_read_its_target() {
        let emitter = parse("LET a = a + 1\n").expect("parse");
        assert_eq!(
            emitter.header(),
            "#include <stdio.h>\nint main(void){\nfloat a;\n"
        );
        assert!(emitter.code().starts_with("a = a + 1;\n"));
    }

    #[test]
    fn separates_binary_operators_from_unary_signs() {
        let code = body("LET a = 1\nLET b = 2\nLET c = a - -b\nLET d = a + +b\n");
        assert!(code.contains("c = a - -b;\n"), "{code}");
        assert!(code.contains("d = a + +b;\n"), "{code}");
        assert!(!code.contains("--") && !code.contains("++"), "{code}");
    }

    #[test]
    fn label_closing_a_block_gets_a_statement() {
        let code = body("IF 1 > 0 THEN\nLABEL inner\nENDIF\n");
        assert!(code.contains("inner:;\n}\n"), "{code}");
    }

    #[test]
    fn input_declares_variable() {
        let code = body("INPUT n\nPRINT n * 2\n");
        assert!(code.contains("printf(\"%.2f\\n\", (float)(n * 2));"));
    }

    #[test]
    fn declares_each_variable_once() {
        let emitter = parse("LET a = 1\nINPUT a\nLET a = a + 1\nINPUT b\n").expect("parse");
        assert_eq!(
            emitter.header(),
            "#include <stdio.h>\nint main(void){\nfloat a;\nfloat b;\n"
        );
    }

    #[test]
    fn input_falls_back_to_zero() {
        let code = body("INPUT n\n");
        assert_eq!(
            code,
            "if(0 == scanf(\"%f\", &n)) {\nn = 0;\nscanf(\"%*s\");\n}\nreturn 0;\n}\n"
        );
    }

    #[test]
    fn emits_operators_in_source_order() {
        let code = body("LET a = 1\nLET b = -a + 2 * a / 3 - +4.5\n");
        assert!(code.contains("b = -a + 2 * a / 3 - +4.5;\n"), "{code}");
    }

    #[test]
    fn emits_chained_comparison() {
        let code = body("LET a = 1\nIF a < 2 <= 3 THEN\nENDIF\n");
        assert!(code.contains("if(a < 2 <= 3){\n}\n"), "{code}");
    }

    #[test]
    fn rejects_comparison_without_operator() {
        let err = parse("IF 1 THEN\nENDIF\n").unwrap_err();
        match err {
            CoreError::ParseError { message, .. } => {
                assert!(message.contains("expected comparison operator"), "{message}")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn nests_blocks() {
        let code = body(
            "LET i = 0\nWHILE i < 3 REPEAT\nIF i == 1 THEN\nPRINT \"one\"\nENDIF\nLET i = i + 1\nENDWHILE\n",
        );
        assert_eq!(
            code,
            "i = 0;\nwhile(i < 3){\nif(i == 1){\nprintf(\"one\\n\");\n}\ni = i + 1;\n}\nreturn 0;\n}\n"
        );
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let code = body("\n\n# setup\nLET a = 1\n\n\n# show it\nPRINT a\n\n");
        assert_eq!(
            code,
            "a = 1;\nprintf(\"%.2f\\n\", (float)(a));\nreturn 0;\n}\n"
        );
    }

    #[test]
    fn requires_newline_between_statements() {
        let err = parse("PRINT 1 PRINT 2\n").unwrap_err();
        match err {
            CoreError::ParseError { message, .. } => {
                assert_eq!(message, "expected NEWLINE, got 'PRINT' (PRINT)")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_statement() {
        let err = parse("THEN\n").unwrap_err();
        assert!(matches!(err, CoreError::ParseError { line: 1, .. }));
    }

    #[test]
    fn rejects_unterminated_block() {
        let err = parse("IF 1 > 0 THEN\nPRINT 1\n").unwrap_err();
        match err {
            CoreError::ParseError { message, .. } => {
                assert_eq!(message, "invalid statement at EOF")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_non_identifier_label() {
        let err = parse("LABEL 10\n").unwrap_err();
        assert!(matches!(err, CoreError::ParseError { .. }));
    }

    #[test]
    fn records_symbols_and_labels() {
        let mut emitter = Emitter::new();
        let mut parser =
            Parser::new(Scanner::new("LET x = 1\nLABEL loop\nINPUT y\n"), &mut emitter)
                .expect("parser");
        parser.program().expect("program");
        assert_eq!(parser.symbols().len(), 2);
        assert!(parser.labels().contains("loop"));
    }

    #[test]
    fn lex_errors_surface_through_the_parser() {
        let err = parse("PRINT \"50%\"\n").unwrap_err();
        assert!(matches!(err, CoreError::LexError { .. }));
    }
}
