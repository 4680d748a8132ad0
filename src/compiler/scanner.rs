//! Lexer: byte stream -> token stream (spec §4.1).
//!
//! Hand-rolled rather than built on a parser-combinator library — the
//! teacher's own `parse.rs` tried `chumsky` and abandoned it for exactly this
//! kind of scanning (see `DESIGN.md`). Contextual keywords are left as plain
//! `Identifier` tokens here; only the parser reclassifies them
//! (`SyntaxKind::from_contextual_keyword_text`), per spec §4.1.
//!
//! Template literals are tokenized eagerly along with everything else:
//! `scan_all` tracks brace depth and resumes template scanning itself the
//! moment a `}` closes an interpolation at the depth it was opened, rather
//! than handing control back to the parser mid-stream.

use crate::compiler::ast::kind::SyntaxKind;
use crate::compiler::diagnostics::{self, DiagnosticCategory};

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    BigInt(String),
    /// Template string chunk: (cooked, raw).
    Template(String, String),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: SyntaxKind,
    pub lexeme: String,
    pub literal: Option<LiteralValue>,
    pub line: usize,
    pub start: usize,
    pub end: usize,
    /// Set when an identifier-shaped token's text matched a *contextual*
    /// keyword; the parser decides whether to honor it based on position.
    pub contextual_kind: Option<SyntaxKind>,
}

#[derive(Debug, Clone)]
pub struct ScanError {
    pub line: usize,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: String,
}

pub struct Scanner<'a> {
    #[allow(dead_code)]
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    pub errors: Vec<ScanError>,
    /// Current `{`/`}` nesting depth, tracked so template re-entry (below)
    /// can tell a template's own closing `}` apart from one belonging to an
    /// object literal nested inside the interpolation.
    brace_depth: i64,
    /// `brace_depth` at the point each currently-open template interpolation
    /// was entered; a `}` at that same depth resumes the template instead of
    /// closing a block.
    template_depths: Vec<i64>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            errors: Vec::new(),
            brace_depth: 0,
            template_depths: Vec::new(),
        }
    }

    fn error(&mut self, msg: &diagnostics::Message, args: &[&str]) {
        let mut message = msg.template.to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        self.errors.push(ScanError {
            line: self.line,
            code: msg.code,
            category: msg.category,
            message,
        });
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        *self.chars.get(self.pos).unwrap_or(&'\0')
    }

    fn peek_at(&self, offset: usize) -> char {
        *self.chars.get(self.pos + offset).unwrap_or(&'\0')
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        c
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Produces the full token stream plus a terminating end-of-file token
    /// (spec §4.1: "a finite ordered sequence of tokens plus a terminating
    /// end-of-file token").
    pub fn scan_all(mut self) -> (Vec<Token>, Vec<ScanError>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let line = self.line;
            if self.is_at_end() {
                tokens.push(Token {
                    kind: SyntaxKind::EndOfFile,
                    lexeme: String::new(),
                    literal: None,
                    line,
                    start,
                    end: start,
                    contextual_kind: None,
                });
                break;
            }
            // A `}` at the exact depth an interpolation was entered resumes
            // the enclosing template instead of closing a block.
            if self.peek() == '}' && self.template_depths.last() == Some(&self.brace_depth) {
                self.template_depths.pop();
                self.advance();
                let tok = self.rescan_template_middle_or_tail();
                if tok.kind == SyntaxKind::TemplateMiddle {
                    self.template_depths.push(self.brace_depth);
                }
                tokens.push(tok);
                continue;
            }
            if let Some(tok) = self.scan_token(start, line) {
                match tok.kind {
                    SyntaxKind::OpenBrace => self.brace_depth += 1,
                    SyntaxKind::CloseBrace => self.brace_depth -= 1,
                    SyntaxKind::TemplateHead => self.template_depths.push(self.brace_depth),
                    _ => {}
                }
                tokens.push(tok);
            }
        }
        (tokens, self.errors)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_at(1) == '/' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                '/' if self.peek_at(1) == '*' => {
                    self.advance();
                    self.advance();
                    while !self.is_at_end() && !(self.peek() == '*' && self.peek_at(1) == '/') {
                        self.advance();
                    }
                    if !self.is_at_end() {
                        self.advance();
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn make(&self, kind: SyntaxKind, start: usize, line: usize) -> Token {
        let lexeme: String = self.chars[start..self.pos].iter().collect();
        Token {
            kind,
            lexeme,
            literal: None,
            line,
            start,
            end: self.pos,
            contextual_kind: None,
        }
    }

    fn scan_token(&mut self, start: usize, line: usize) -> Option<Token> {
        use SyntaxKind::*;
        let c = self.advance();
        let tok = match c {
            '(' => self.make(OpenParen, start, line),
            ')' => self.make(CloseParen, start, line),
            '{' => self.make(OpenBrace, start, line),
            '}' => self.make(CloseBrace, start, line),
            '[' => self.make(OpenBracket, start, line),
            ']' => self.make(CloseBracket, start, line),
            ',' => self.make(Comma, start, line),
            ';' => self.make(Semicolon, start, line),
            '@' => self.make(At, start, line),
            '~' => self.make(Tilde, start, line),
            '#' => return Some(self.scan_private_identifier(start, line)),
            '.' => {
                if self.peek() == '.' && self.peek_at(1) == '.' {
                    self.advance();
                    self.advance();
                    self.make(DotDotDot, start, line)
                } else if self.peek().is_ascii_digit() {
                    return Some(self.scan_number_from(start, line));
                } else {
                    self.make(Dot, start, line)
                }
            }
            ':' => self.make(Colon, start, line),
            '?' => {
                if self.matches('?') {
                    if self.matches('=') {
                        self.make(QuestionQuestionEquals, start, line)
                    } else {
                        self.make(QuestionQuestion, start, line)
                    }
                } else if self.matches('.') && !self.peek().is_ascii_digit() {
                    self.make(QuestionDot, start, line)
                } else {
                    self.make(Question, start, line)
                }
            }
            '=' => {
                if self.matches('=') {
                    if self.matches('=') {
                        self.make(EqualsEqualsEquals, start, line)
                    } else {
                        self.make(EqualsEquals, start, line)
                    }
                } else if self.matches('>') {
                    self.make(EqualsGreaterThan, start, line)
                } else {
                    self.make(Equals, start, line)
                }
            }
            '!' => {
                if self.matches('=') {
                    if self.matches('=') {
                        self.make(ExclamationEqualsEquals, start, line)
                    } else {
                        self.make(ExclamationEquals, start, line)
                    }
                } else {
                    self.make(Exclamation, start, line)
                }
            }
            '<' => {
                if self.matches('<') {
                    if self.matches('=') {
                        self.make(LessThanLessThanEquals, start, line)
                    } else {
                        self.make(LessThanLessThan, start, line)
                    }
                } else if self.matches('=') {
                    self.make(LessThanEquals, start, line)
                } else {
                    self.make(LessThan, start, line)
                }
            }
            '>' => {
                if self.matches('>') {
                    if self.matches('>') {
                        if self.matches('=') {
                            self.make(GreaterThanGreaterThanGreaterThanEquals, start, line)
                        } else {
                            self.make(GreaterThanGreaterThanGreaterThan, start, line)
                        }
                    } else if self.matches('=') {
                        self.make(GreaterThanGreaterThanEquals, start, line)
                    } else {
                        self.make(GreaterThanGreaterThan, start, line)
                    }
                } else if self.matches('=') {
                    self.make(GreaterThanEquals, start, line)
                } else {
                    self.make(GreaterThan, start, line)
                }
            }
            '+' => {
                if self.matches('+') {
                    self.make(PlusPlus, start, line)
                } else if self.matches('=') {
                    self.make(PlusEquals, start, line)
                } else {
                    self.make(Plus, start, line)
                }
            }
            '-' => {
                if self.matches('-') {
                    self.make(MinusMinus, start, line)
                } else if self.matches('=') {
                    self.make(MinusEquals, start, line)
                } else {
                    self.make(Minus, start, line)
                }
            }
            '*' => {
                if self.matches('*') {
                    if self.matches('=') {
                        self.make(AsteriskAsteriskEquals, start, line)
                    } else {
                        self.make(AsteriskAsterisk, start, line)
                    }
                } else if self.matches('=') {
                    self.make(AsteriskEquals, start, line)
                } else {
                    self.make(Asterisk, start, line)
                }
            }
            '/' => {
                if self.matches('=') {
                    self.make(SlashEquals, start, line)
                } else {
                    self.make(Slash, start, line)
                }
            }
            '%' => {
                if self.matches('=') {
                    self.make(PercentEquals, start, line)
                } else {
                    self.make(Percent, start, line)
                }
            }
            '&' => {
                if self.matches('&') {
                    if self.matches('=') {
                        self.make(AmpersandAmpersandEquals, start, line)
                    } else {
                        self.make(AmpersandAmpersand, start, line)
                    }
                } else if self.matches('=') {
                    self.make(AmpersandEquals, start, line)
                } else {
                    self.make(Ampersand, start, line)
                }
            }
            '|' => {
                if self.matches('|') {
                    if self.matches('=') {
                        self.make(BarBarEquals, start, line)
                    } else {
                        self.make(BarBar, start, line)
                    }
                } else if self.matches('=') {
                    self.make(BarEquals, start, line)
                } else {
                    self.make(Bar, start, line)
                }
            }
            '^' => {
                if self.matches('=') {
                    self.make(CaretEquals, start, line)
                } else {
                    self.make(Caret, start, line)
                }
            }
            '"' | '\'' => return Some(self.scan_string(c, start, line)),
            '`' => return Some(self.scan_template(start, line)),
            c if c.is_ascii_digit() => return Some(self.scan_number_from(start, line)),
            c if is_identifier_start(c) => return Some(self.scan_identifier(start, line)),
            _ => {
                self.error(&diagnostics::UNEXPECTED_TOKEN_1004, &[]);
                self.make(Unknown, start, line)
            }
        };
        Some(tok)
    }

    fn scan_private_identifier(&mut self, start: usize, line: usize) -> Token {
        while is_identifier_part(self.peek()) {
            self.advance();
        }
        self.make(SyntaxKind::PrivateIdentifier, start, line)
    }

    fn scan_identifier(&mut self, start: usize, line: usize) -> Token {
        while is_identifier_part(self.peek()) {
            self.advance();
        }
        let mut tok = self.make(SyntaxKind::Identifier, start, line);
        if let Some(keyword) = SyntaxKind::from_keyword_text(&tok.lexeme) {
            tok.kind = keyword;
        } else {
            tok.contextual_kind = SyntaxKind::from_contextual_keyword_text(&tok.lexeme);
        }
        tok
    }

    fn scan_number_from(&mut self, start: usize, line: usize) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_at(1).is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        if self.peek() == 'e' || self.peek() == 'E' {
            let save = self.pos;
            self.advance();
            if self.peek() == '+' || self.peek() == '-' {
                self.advance();
            }
            if self.peek().is_ascii_digit() {
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            } else {
                self.pos = save;
            }
        }
        if self.peek() == 'n' {
            self.advance();
            let mut tok = self.make(SyntaxKind::BigIntLiteral, start, line);
            let digits = tok.lexeme.trim_end_matches('n').to_string();
            tok.literal = Some(LiteralValue::BigInt(digits));
            return tok;
        }
        let mut tok = self.make(SyntaxKind::NumericLiteral, start, line);
        let value: f64 = tok.lexeme.parse().unwrap_or(f64::NAN);
        tok.literal = Some(LiteralValue::Number(value));
        tok
    }

    fn scan_string(&mut self, quote: char, start: usize, line: usize) -> Token {
        let mut cooked = String::new();
        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\n' {
                self.error(&diagnostics::UNTERMINATED_STRING_LITERAL_1002, &[]);
                break;
            }
            if self.peek() == '\\' {
                self.advance();
                cooked.push(self.scan_escape_sequence());
            } else {
                cooked.push(self.advance());
            }
        }
        if self.is_at_end() {
            self.error(&diagnostics::UNTERMINATED_STRING_LITERAL_1002, &[]);
        } else {
            self.advance();
        }
        let mut tok = self.make(SyntaxKind::StringLiteral, start, line);
        tok.literal = Some(LiteralValue::String(cooked));
        tok
    }

    fn scan_escape_sequence(&mut self) -> char {
        if self.is_at_end() {
            return '\\';
        }
        let c = self.advance();
        match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'x' => self.scan_hex_escape(2),
            'u' => {
                if self.peek() == '{' {
                    self.advance();
                    let mut hex = String::new();
                    while self.peek() != '}' && !self.is_at_end() {
                        hex.push(self.advance());
                    }
                    if self.peek() == '}' {
                        self.advance();
                    }
                    u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or('\u{FFFD}')
                } else {
                    self.scan_hex_escape(4)
                }
            }
            other => other,
        }
    }

    fn scan_hex_escape(&mut self, len: usize) -> char {
        let mut hex = String::new();
        for _ in 0..len {
            if self.peek().is_ascii_hexdigit() {
                hex.push(self.advance());
            } else {
                self.error(&diagnostics::DIGIT_EXPECTED_1124, &[]);
                break;
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}')
    }

    /// Scans one template chunk; only produces the string-chunk token
    /// (head/middle/tail/full), stopping at `${` or the closing backtick.
    /// `scan_all` resumes template scanning after each interpolated
    /// expression via `rescan_template_middle_or_tail`.
    fn scan_template(&mut self, start: usize, line: usize) -> Token {
        self.scan_template_chunk(start, line, true)
    }

    /// Resumes a template whose previous chunk ended in `${`, called by
    /// `scan_all` once the interpolation's closing `}` is consumed.
    pub fn rescan_template_middle_or_tail(&mut self) -> Token {
        let start = self.pos - 1;
        let line = self.line;
        self.scan_template_chunk(start, line, false)
    }

    fn scan_template_chunk(&mut self, start: usize, line: usize, is_head: bool) -> Token {
        let mut cooked = String::new();
        let mut raw = String::new();
        let mut hit_interpolation = false;
        loop {
            if self.is_at_end() {
                self.error(&diagnostics::UNTERMINATED_TEMPLATE_LITERAL_1003, &[]);
                break;
            }
            match self.peek() {
                '`' => {
                    self.advance();
                    break;
                }
                '$' if self.peek_at(1) == '{' => {
                    self.advance();
                    self.advance();
                    hit_interpolation = true;
                    break;
                }
                '\\' => {
                    let consumed_start = self.pos;
                    self.advance();
                    cooked.push(self.scan_escape_sequence());
                    for ch in self.chars[consumed_start..self.pos].iter() {
                        raw.push(*ch);
                    }
                }
                c => {
                    cooked.push(c);
                    raw.push(c);
                    self.advance();
                }
            }
        }
        let kind = match (is_head, hit_interpolation) {
            (true, true) => SyntaxKind::TemplateHead,
            (true, false) => SyntaxKind::NoSubstitutionTemplateLiteral,
            (false, true) => SyntaxKind::TemplateMiddle,
            (false, false) => SyntaxKind::TemplateTail,
        };
        let mut tok = self.make(kind, start, line);
        tok.literal = Some(LiteralValue::Template(cooked, raw));
        tok
    }
}

/// `$`/`_` plus the standard library's alphabetic classification. The
/// teacher's prototype carried hand-copied Unicode identifier range tables
/// truncated mid-table; rather than ship fabricated data we lean on the
/// identifier classification the standard library already provides.
pub fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

pub fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_numeric() || c == '\u{200C}' || c == '\u{200D}'
}

/// Convenience wrapper around `Scanner::new(src).scan_all()` for call sites
/// (tests, the checker's scenario helpers) that don't need the `Scanner`
/// itself.
pub fn scan(src: &str) -> (Vec<Token>, Vec<ScanError>) {
    Scanner::new(src).scan_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<SyntaxKind> {
        let (tokens, errors) = Scanner::new(src).scan_all();
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_punctuation_and_operators() {
        let ks = kinds("a += 1 ?? b?.c");
        assert_eq!(
            ks,
            vec![
                SyntaxKind::Identifier,
                SyntaxKind::PlusEquals,
                SyntaxKind::NumericLiteral,
                SyntaxKind::QuestionQuestion,
                SyntaxKind::Identifier,
                SyntaxKind::QuestionDot,
                SyntaxKind::Identifier,
                SyntaxKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn scans_string_with_escapes() {
        let (tokens, errors) = Scanner::new(r#""a\nb""#).scan_all();
        assert!(errors.is_empty());
        match &tokens[0].literal {
            Some(LiteralValue::String(s)) => assert_eq!(s, "a\nb"),
            other => panic!("expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, errors) = Scanner::new("\"abc").scan_all();
        assert_eq!(
            errors[0].code,
            diagnostics::UNTERMINATED_STRING_LITERAL_1002.code
        );
    }

    #[test]
    fn scans_keyword_vs_contextual_keyword() {
        let (tokens, _) = Scanner::new("const x type").scan_all();
        assert_eq!(tokens[0].kind, SyntaxKind::ConstKeyword);
        assert_eq!(tokens[2].kind, SyntaxKind::Identifier);
        assert_eq!(tokens[2].contextual_kind, Some(SyntaxKind::TypeKeyword));
    }

    #[test]
    fn scans_no_substitution_template() {
        let (tokens, _) = Scanner::new("`hello`").scan_all();
        assert_eq!(tokens[0].kind, SyntaxKind::NoSubstitutionTemplateLiteral);
    }

    #[test]
    fn scans_bigint_literal() {
        let (tokens, _) = Scanner::new("10n").scan_all();
        assert_eq!(tokens[0].kind, SyntaxKind::BigIntLiteral);
    }
}
