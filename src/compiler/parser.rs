//! Recursive-descent parser (spec §4.2): token stream -> `ast::Program`.
//!
//! Each nonterminal is a method. Precedence climbs from assignment down to
//! primary via a small table of binding powers (`infix_binding_power`).
//! Speculative constructs (arrow-head detection, generic type arguments on a
//! call, angle-bracket type assertions, interface call/construct signatures)
//! save the cursor with `mark()`, attempt the alternative, and `reset()` on
//! failure; `speculating` suppresses diagnostics for the duration so a failed
//! attempt never leaves a trace.
//!
//! Errors recover at the next statement boundary rather than aborting the
//! whole parse (`synchronize`), so a single malformed declaration doesn't
//! swallow the rest of the file.

use std::rc::Rc;

use super::ast::kind::SyntaxKind;
use super::ast::node::*;
use super::ast::node_flags::{ModifierFlags, NodeFlags, Variance};
use super::ast::type_node::*;
use super::diagnostics::{self, DiagnosticCategory};
use super::scanner::{LiteralValue as ScanLiteral, Token};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: String,
}

pub fn parse_program(tokens: Vec<Token>) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(tokens);
    let mut body = Vec::new();
    while !parser.is_eof() {
        body.push(parser.parse_statement());
    }
    (Program { body }, parser.errors)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    speculating: u32,
    temp_counter: u32,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, errors: Vec::new(), speculating: 0, temp_counter: 0 }
    }

    // ---- cursor primitives -------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn is_eof(&self) -> bool {
        self.current().kind == SyntaxKind::EndOfFile
    }

    fn span(&self, tok: &Token) -> Span {
        Span::new(tok.start, tok.end, tok.line)
    }

    fn here(&self) -> Span {
        self.span(self.current())
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: SyntaxKind) -> bool {
        self.current().kind == kind
    }

    fn check_contextual(&self, kind: SyntaxKind) -> bool {
        self.current().kind == SyntaxKind::Identifier && self.current().contextual_kind == Some(kind)
    }

    fn peek_is_contextual(&self, offset: usize, kind: SyntaxKind) -> bool {
        let tok = self.peek_at(offset);
        tok.kind == SyntaxKind::Identifier && tok.contextual_kind == Some(kind)
    }

    fn is_identifier_like(&self) -> bool {
        self.current().kind == SyntaxKind::Identifier
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_contextual(&mut self, kind: SyntaxKind) -> bool {
        if self.check_contextual(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, msg: &diagnostics::Message, args: &[&str]) {
        if self.speculating > 0 {
            return;
        }
        let mut message = msg.template.to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        self.errors.push(ParseError { span: self.here(), code: msg.code, category: msg.category, message });
    }

    fn expect(&mut self, kind: SyntaxKind, text: &str) -> Token {
        if self.check(kind) {
            self.advance()
        } else {
            self.error(&diagnostics::EXPECTED_TOKEN_1005, &[text]);
            self.current().clone()
        }
    }

    fn mark(&self) -> usize {
        self.pos
    }

    fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// Runs `f` speculatively: diagnostics raised during the attempt never
    /// surface. Caller decides whether to keep or roll back the cursor.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let mark = self.mark();
        self.speculating += 1;
        let result = f(self);
        self.speculating -= 1;
        if result.is_none() {
            self.reset(mark);
        }
        result
    }

    fn next_temp(&mut self) -> String {
        let name = format!("__tmp{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Recovers to the next statement boundary after a parse failure.
    fn synchronize(&mut self) {
        while !self.is_eof() {
            if self.check(SyntaxKind::Semicolon) {
                self.advance();
                return;
            }
            if self.check(SyntaxKind::CloseBrace) {
                return;
            }
            if matches!(
                self.current().kind,
                SyntaxKind::VarKeyword
                    | SyntaxKind::FunctionKeyword
                    | SyntaxKind::ClassKeyword
                    | SyntaxKind::IfKeyword
                    | SyntaxKind::ForKeyword
                    | SyntaxKind::WhileKeyword
                    | SyntaxKind::ReturnKeyword
                    | SyntaxKind::ImportKeyword
                    | SyntaxKind::ExportKeyword
            ) {
                return;
            }
            self.advance();
        }
    }

    fn ident_text(&mut self) -> String {
        if self.is_identifier_like() || self.current().contextual_kind.is_some() {
            self.advance().lexeme
        } else {
            self.error(&diagnostics::EXPECTED_TOKEN_1005, &["identifier"]);
            String::new()
        }
    }

    // ---- statements ---------------------------------------------------------

    fn parse_statement(&mut self) -> Stmt {
        let start_pos = self.pos;
        let stmt = self.parse_statement_inner();
        if self.pos == start_pos {
            // Guarantee forward progress on unrecognized input.
            self.advance();
        }
        stmt
    }

    fn parse_statement_inner(&mut self) -> Stmt {
        let span = self.here();
        if self.eat_contextual(SyntaxKind::DeclareKeyword) {
            let mut stmt = self.parse_declarable_statement();
            stmt.span.start = span.start;
            return stmt;
        }
        match self.current().kind {
            SyntaxKind::Semicolon => {
                self.advance();
                Stmt { span, kind: StmtKind::Empty }
            }
            SyntaxKind::OpenBrace => self.parse_block(),
            SyntaxKind::VarKeyword => self.parse_var_statement(VarKind::Var),
            SyntaxKind::IfKeyword => self.parse_if(),
            SyntaxKind::WhileKeyword => self.parse_while(),
            SyntaxKind::DoKeyword => self.parse_do_while(),
            SyntaxKind::ForKeyword => self.parse_for(),
            SyntaxKind::SwitchKeyword => self.parse_switch(),
            SyntaxKind::TryKeyword => self.parse_try(),
            SyntaxKind::ThrowKeyword => self.parse_throw(),
            SyntaxKind::ReturnKeyword => self.parse_return(),
            SyntaxKind::BreakKeyword => self.parse_break_continue(true),
            SyntaxKind::ContinueKeyword => self.parse_break_continue(false),
            SyntaxKind::ClassKeyword => self.parse_class_decl(ModifierFlags::NONE),
            SyntaxKind::FunctionKeyword => self.parse_function_decl(FunctionFlags::default(), ModifierFlags::NONE),
            SyntaxKind::EnumKeyword => self.parse_enum_decl(false),
            SyntaxKind::ImportKeyword => self.parse_import(),
            SyntaxKind::ExportKeyword => self.parse_export(),
            SyntaxKind::DebuggerKeyword => {
                self.advance();
                self.eat(SyntaxKind::Semicolon);
                Stmt { span, kind: StmtKind::Debugger }
            }
            _ => self.parse_contextual_or_expr_statement(),
        }
    }

    /// Statements valid directly after `declare`: functions, classes,
    /// interfaces, variables, enums, namespaces/modules, type aliases.
    fn parse_declarable_statement(&mut self) -> Stmt {
        match self.current().kind {
            SyntaxKind::VarKeyword => self.parse_var_statement(VarKind::Var),
            SyntaxKind::ClassKeyword => self.parse_class_decl(ModifierFlags::AMBIENT),
            SyntaxKind::FunctionKeyword => self.parse_function_decl(FunctionFlags::default(), ModifierFlags::AMBIENT),
            SyntaxKind::EnumKeyword => self.parse_enum_decl(false),
            SyntaxKind::ConstKeyword => self.parse_var_statement(VarKind::Const),
            _ if self.check_contextual(SyntaxKind::GlobalKeyword) => self.parse_global_augmentation(),
            _ => self.parse_contextual_or_expr_statement(),
        }
    }

    fn parse_global_augmentation(&mut self) -> Stmt {
        let span = self.here();
        self.advance(); // `global`
        let body = self.parse_stmt_block_body();
        Stmt { span, kind: StmtKind::GlobalAugmentation(body) }
    }

    /// Handles every statement whose first token is a contextual keyword
    /// (`let`, `const`, `async function`, `type`, `interface`, `namespace`,
    /// `module`) plus the plain expression-statement fallback.
    fn parse_contextual_or_expr_statement(&mut self) -> Stmt {
        if self.check_contextual(SyntaxKind::LetKeyword) && self.next_starts_binding() {
            return self.parse_var_statement(VarKind::Let);
        }
        if self.check(SyntaxKind::ConstKeyword) {
            return self.parse_var_statement(VarKind::Const);
        }
        if self.check_contextual(SyntaxKind::AsyncKeyword) && self.peek_at(1).kind == SyntaxKind::FunctionKeyword {
            let span = self.here();
            self.advance();
            let mut stmt = self.parse_function_decl(FunctionFlags { is_async: true, is_generator: false }, ModifierFlags::NONE);
            stmt.span.start = span.start;
            return stmt;
        }
        if self.check_contextual(SyntaxKind::TypeKeyword) && self.peek_at(1).kind == SyntaxKind::Identifier {
            return self.parse_type_alias();
        }
        if self.check_contextual(SyntaxKind::InterfaceKeyword) {
            return self.parse_interface_decl();
        }
        if self.check_contextual(SyntaxKind::AbstractKeyword) && self.peek_at(1).kind == SyntaxKind::ClassKeyword {
            self.advance();
            return self.parse_class_decl(ModifierFlags::ABSTRACT);
        }
        if self.check_contextual(SyntaxKind::NamespaceKeyword) {
            return self.parse_namespace_decl();
        }
        if self.check_contextual(SyntaxKind::ModuleKeyword) {
            return self.parse_namespace_decl();
        }
        if self.check_contextual(SyntaxKind::UsingKeyword) && self.next_starts_binding() {
            return self.parse_using();
        }
        if self.is_identifier_like() && self.peek_at(1).kind == SyntaxKind::Colon {
            return self.parse_labeled_statement();
        }
        let span = self.here();
        let expr = self.parse_expression();
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::Expr(expr) }
    }

    fn next_starts_binding(&self) -> bool {
        matches!(
            self.peek_at(1).kind,
            SyntaxKind::Identifier | SyntaxKind::OpenBrace | SyntaxKind::OpenBracket
        )
    }

    fn parse_block(&mut self) -> Stmt {
        let span = self.here();
        let body = self.parse_stmt_block_body();
        Stmt { span, kind: StmtKind::Block(body) }
    }

    fn parse_stmt_block_body(&mut self) -> Vec<Stmt> {
        self.expect(SyntaxKind::OpenBrace, "{");
        let mut body = Vec::new();
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            body.push(self.parse_statement());
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        body
    }

    fn parse_using(&mut self) -> Stmt {
        let span = self.here();
        self.advance(); // `using`
        let is_await = false;
        let mut bindings = Vec::new();
        loop {
            let name = self.ident_text();
            self.expect(SyntaxKind::Equals, "=");
            let init = self.parse_assignment_expr();
            bindings.push((name, init));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::Using { is_await, bindings } }
    }

    fn parse_var_statement(&mut self, kind: VarKind) -> Stmt {
        let span = self.here();
        self.advance(); // consume var/let/const keyword token
        let mut decls = Vec::new();
        loop {
            decls.extend(self.parse_one_var_declarator(kind));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.eat(SyntaxKind::Semicolon);
        if decls.len() == 1 {
            decls.into_iter().next().unwrap()
        } else {
            Stmt { span, kind: StmtKind::Sequence(decls) }
        }
    }

    /// Parses one binding in a `var`/`let`/`const` list, desugaring
    /// destructuring patterns into a `Sequence` of plain `Var` declarations
    /// (spec §4.2).
    fn parse_one_var_declarator(&mut self, kind: VarKind) -> Vec<Stmt> {
        let span = self.here();
        let node_flags = match kind {
            VarKind::Var => NodeFlags::NONE,
            VarKind::Let => NodeFlags::LET,
            VarKind::Const => NodeFlags::CONST,
        };
        if self.check(SyntaxKind::OpenBrace) || self.check(SyntaxKind::OpenBracket) {
            let pattern = self.parse_binding_pattern();
            let type_ann = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            let init = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
            let source = match init {
                Some(e) => e,
                None => {
                    self.error(&diagnostics::CONST_DECLARATIONS_MUST_BE_INITIALIZED_1155, &[]);
                    Expr { span, kind: ExprKind::Literal(LiteralValue::Undefined) }
                }
            };
            let mut out = Vec::new();
            desugar_pattern_binding_annotated(&pattern, source, type_ann, kind, node_flags, self, &mut out);
            return out;
        }
        let name = self.ident_text();
        let definite_assignment = self.eat(SyntaxKind::Exclamation);
        let type_ann = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
        let init = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
        if kind == VarKind::Const && init.is_none() {
            self.error(&diagnostics::CONST_DECLARATIONS_MUST_BE_INITIALIZED_1155, &[]);
        }
        if definite_assignment && (init.is_some() || type_ann.is_none()) {
            self.error(&diagnostics::DEFINITE_ASSIGNMENT_REQUIRES_TYPE_1187, &[]);
        }
        vec![Stmt {
            span,
            kind: StmtKind::VarDecl(VarDecl { kind, name, type_ann, init, definite_assignment, flags: node_flags }),
        }]
    }

    fn parse_if(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        self.expect(SyntaxKind::OpenParen, "(");
        let cond = self.parse_expression();
        self.expect(SyntaxKind::CloseParen, ")");
        let then = Box::new(self.parse_statement());
        let else_ = if self.eat(SyntaxKind::ElseKeyword) { Some(Box::new(self.parse_statement())) } else { None };
        Stmt { span, kind: StmtKind::If { cond, then, else_ } }
    }

    fn parse_while(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        self.expect(SyntaxKind::OpenParen, "(");
        let cond = self.parse_expression();
        self.expect(SyntaxKind::CloseParen, ")");
        let body = Box::new(self.parse_statement());
        Stmt { span, kind: StmtKind::While { cond, body } }
    }

    fn parse_do_while(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        let body = Box::new(self.parse_statement());
        self.expect(SyntaxKind::WhileKeyword, "while");
        self.expect(SyntaxKind::OpenParen, "(");
        let cond = self.parse_expression();
        self.expect(SyntaxKind::CloseParen, ")");
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::DoWhile { body, cond } }
    }

    /// Parses `for`, desugaring the classic three-clause form into a `Block`
    /// wrapping a `While` per spec §4.2, and recognizing `for-of`/`for-in`.
    fn parse_for(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        let is_await = self.eat_contextual(SyntaxKind::AwaitKeyword);
        self.expect(SyntaxKind::OpenParen, "(");

        let decl_kind = if self.check(SyntaxKind::VarKeyword) {
            self.advance();
            Some(VarKind::Var)
        } else if self.check_contextual(SyntaxKind::LetKeyword) {
            self.advance();
            Some(VarKind::Let)
        } else if self.check(SyntaxKind::ConstKeyword) {
            self.advance();
            Some(VarKind::Const)
        } else {
            None
        };

        // Try for-of / for-in: a single binding name followed by `of`/`in`.
        if decl_kind.is_some() || self.is_identifier_like() {
            if let Some(stmt) = self.speculate(|p| p.try_parse_for_of_in(span, decl_kind, is_await)) {
                return stmt;
            }
        }

        let init: Option<Stmt> = if self.check(SyntaxKind::Semicolon) {
            None
        } else if let Some(k) = decl_kind {
            Some(self.parse_rest_of_var_statement_no_semi(k))
        } else {
            let e = self.parse_expression();
            Some(Stmt { span: e.span, kind: StmtKind::Expr(e) })
        };
        self.expect(SyntaxKind::Semicolon, ";");
        let cond = if self.check(SyntaxKind::Semicolon) {
            Expr { span, kind: ExprKind::Literal(LiteralValue::Boolean(true)) }
        } else {
            self.parse_expression()
        };
        self.expect(SyntaxKind::Semicolon, ";");
        let inc = if self.check(SyntaxKind::CloseParen) { None } else { Some(self.parse_expression()) };
        self.expect(SyntaxKind::CloseParen, ")");
        let body = self.parse_statement();

        let mut block_body = Vec::new();
        if let Some(init_stmt) = init {
            block_body.push(init_stmt);
        }
        let mut loop_body = match body {
            Stmt { kind: StmtKind::Block(stmts), .. } => stmts,
            other => vec![other],
        };
        if let Some(inc_expr) = inc {
            loop_body.push(Stmt { span: inc_expr.span, kind: StmtKind::Expr(inc_expr) });
        }
        block_body.push(Stmt { span, kind: StmtKind::While { cond, body: Box::new(Stmt { span, kind: StmtKind::Block(loop_body) }) } });
        Stmt { span, kind: StmtKind::Block(block_body) }
    }

    fn try_parse_for_of_in(&mut self, span: Span, decl_kind: Option<VarKind>, is_await: bool) -> Option<Stmt> {
        let binding = self.ident_text();
        if binding.is_empty() {
            return None;
        }
        if self.eat_contextual(SyntaxKind::OfKeyword) {
            let expr = self.parse_assignment_expr();
            self.expect(SyntaxKind::CloseParen, ")");
            let body = Box::new(self.parse_statement());
            return Some(Stmt { span, kind: StmtKind::ForOf { decl_kind, binding, is_await, expr, body } });
        }
        if self.eat(SyntaxKind::InKeyword) {
            let expr = self.parse_assignment_expr();
            self.expect(SyntaxKind::CloseParen, ")");
            let body = Box::new(self.parse_statement());
            return Some(Stmt { span, kind: StmtKind::ForIn { decl_kind, binding, expr, body } });
        }
        None
    }

    fn parse_rest_of_var_statement_no_semi(&mut self, kind: VarKind) -> Stmt {
        let span = self.here();
        let decls = self.parse_one_var_declarator(kind);
        if decls.len() == 1 {
            decls.into_iter().next().unwrap()
        } else {
            Stmt { span, kind: StmtKind::Sequence(decls) }
        }
    }

    fn parse_switch(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        self.expect(SyntaxKind::OpenParen, "(");
        let discriminant = self.parse_expression();
        self.expect(SyntaxKind::CloseParen, ")");
        self.expect(SyntaxKind::OpenBrace, "{");
        let mut cases = Vec::new();
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            let test = if self.eat(SyntaxKind::CaseKeyword) {
                let e = self.parse_expression();
                Some(e)
            } else {
                self.expect(SyntaxKind::DefaultKeyword, "default");
                None
            };
            self.expect(SyntaxKind::Colon, ":");
            let mut body = Vec::new();
            while !matches!(self.current().kind, SyntaxKind::CaseKeyword | SyntaxKind::DefaultKeyword | SyntaxKind::CloseBrace) {
                body.push(self.parse_statement());
            }
            cases.push(SwitchCase { test, body });
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        Stmt { span, kind: StmtKind::Switch { discriminant, cases } }
    }

    fn parse_try(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        let block = self.parse_stmt_block_body();
        let catch = if self.eat(SyntaxKind::CatchKeyword) {
            let (param, param_type) = if self.eat(SyntaxKind::OpenParen) {
                let name = self.ident_text();
                let ty = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
                self.expect(SyntaxKind::CloseParen, ")");
                (Some(name), ty)
            } else {
                (None, None)
            };
            Some(CatchClause { param, param_type, body: self.parse_stmt_block_body() })
        } else {
            None
        };
        let finally = if self.eat(SyntaxKind::FinallyKeyword) { Some(self.parse_stmt_block_body()) } else { None };
        Stmt { span, kind: StmtKind::Try { block, catch, finally } }
    }

    fn parse_throw(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        let expr = self.parse_expression();
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::Throw(expr) }
    }

    fn parse_return(&mut self) -> Stmt {
        let span = self.here();
        self.advance();
        let value = if self.check(SyntaxKind::Semicolon) || self.check(SyntaxKind::CloseBrace) || self.current().line != span.line {
            None
        } else {
            Some(self.parse_expression())
        };
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::Return(value) }
    }

    fn parse_break_continue(&mut self, is_break: bool) -> Stmt {
        let span = self.here();
        self.advance();
        let label = if self.is_identifier_like() && self.current().line == span.line { Some(self.advance().lexeme) } else { None };
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: if is_break { StmtKind::Break(label) } else { StmtKind::Continue(label) } }
    }

    fn parse_labeled_statement(&mut self) -> Stmt {
        let span = self.here();
        let label = self.advance().lexeme;
        self.expect(SyntaxKind::Colon, ":");
        let body = Box::new(self.parse_statement());
        Stmt { span, kind: StmtKind::Labeled { label, body } }
    }

    // ---- declarations ---------------------------------------------------------

    fn parse_modifiers(&mut self) -> ModifierFlags {
        let mut flags = ModifierFlags::NONE;
        loop {
            let add = if self.eat(SyntaxKind::ExportKeyword) {
                ModifierFlags::EXPORT
            } else if self.eat_contextual(SyntaxKind::PublicKeyword) {
                ModifierFlags::PUBLIC
            } else if self.eat_contextual(SyntaxKind::PrivateKeyword) {
                ModifierFlags::PRIVATE
            } else if self.eat_contextual(SyntaxKind::ProtectedKeyword) {
                ModifierFlags::PROTECTED
            } else if self.eat_contextual(SyntaxKind::ReadonlyKeyword) {
                ModifierFlags::READONLY
            } else if self.eat_contextual(SyntaxKind::StaticKeyword) {
                ModifierFlags::STATIC
            } else if self.eat_contextual(SyntaxKind::AbstractKeyword) {
                ModifierFlags::ABSTRACT
            } else if self.eat_contextual(SyntaxKind::OverrideKeyword) {
                ModifierFlags::OVERRIDE
            } else if self.eat_contextual(SyntaxKind::AsyncKeyword) {
                ModifierFlags::ASYNC
            } else if self.eat_contextual(SyntaxKind::DeclareKeyword) {
                ModifierFlags::AMBIENT
            } else {
                break;
            };
            flags |= add;
        }
        flags
    }

    fn parse_type_params(&mut self) -> Vec<TypeParam> {
        if !self.eat(SyntaxKind::LessThan) {
            return Vec::new();
        }
        let mut params = Vec::new();
        while !self.check(SyntaxKind::GreaterThan) && !self.is_eof() {
            let variance = if self.eat(SyntaxKind::InKeyword) {
                Variance::In
            } else if self.eat_contextual(SyntaxKind::OutKeyword) {
                Variance::Out
            } else {
                Variance::Invariant
            };
            let name = self.ident_text();
            let constraint = if self.eat(SyntaxKind::ExtendsKeyword) { Some(self.parse_type()) } else { None };
            let default = if self.eat(SyntaxKind::Equals) { Some(self.parse_type()) } else { None };
            params.push(TypeParam { name, constraint, default, variance });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::GreaterThan, ">");
        params
    }

    fn parse_type_args(&mut self) -> Vec<TypeNode> {
        if !self.eat(SyntaxKind::LessThan) {
            return Vec::new();
        }
        let mut args = Vec::new();
        while !self.check(SyntaxKind::GreaterThan) && !self.is_eof() {
            args.push(self.parse_type());
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect_close_type_arg_list();
        args
    }

    /// `>>`/`>>>` close more than one generic argument list at once
    /// (`Map<string, Array<number>>`); split the compound token.
    fn expect_close_type_arg_list(&mut self) {
        match self.current().kind {
            SyntaxKind::GreaterThan => {
                self.advance();
            }
            SyntaxKind::GreaterThanGreaterThan | SyntaxKind::GreaterThanGreaterThanGreaterThan | SyntaxKind::GreaterThanEquals => {
                self.split_first_gt();
            }
            _ => {
                self.error(&diagnostics::EXPECTED_TOKEN_1005, &[">"]);
            }
        }
    }

    /// Splits a `>>`/`>>>`/`>=` token into a single `>` consumed and the
    /// remainder re-synthesized in place, without needing the scanner to
    /// rescan (closing several nested generic lists is purely structural).
    fn split_first_gt(&mut self) {
        let tok = self.current().clone();
        let (remaining_kind, remaining_lexeme) = match tok.kind {
            SyntaxKind::GreaterThanGreaterThan => (SyntaxKind::GreaterThan, ">"),
            SyntaxKind::GreaterThanGreaterThanGreaterThan => (SyntaxKind::GreaterThanGreaterThan, ">>"),
            SyntaxKind::GreaterThanEquals => (SyntaxKind::Equals, "="),
            _ => unreachable!(),
        };
        self.tokens[self.pos] = Token {
            kind: remaining_kind,
            lexeme: remaining_lexeme.to_string(),
            literal: None,
            line: tok.line,
            start: tok.start + 1,
            end: tok.end,
            contextual_kind: None,
        };
    }

    fn parse_param_list(&mut self) -> Vec<Param> {
        self.expect(SyntaxKind::OpenParen, "(");
        let mut params = Vec::new();
        while !self.check(SyntaxKind::CloseParen) && !self.is_eof() {
            params.push(self.parse_param());
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseParen, ")");
        params
    }

    /// Parses one parameter, desugaring a destructured parameter into a
    /// generated temporary plus per-name statements the caller splices into
    /// the function body (spec §4.2 "parameter properties"/"destructuring").
    fn parse_param(&mut self) -> Param {
        let mut property_modifiers = ModifierFlags::NONE;
        loop {
            let add = if self.eat_contextual(SyntaxKind::PublicKeyword) {
                ModifierFlags::PUBLIC
            } else if self.eat_contextual(SyntaxKind::PrivateKeyword) {
                ModifierFlags::PRIVATE
            } else if self.eat_contextual(SyntaxKind::ProtectedKeyword) {
                ModifierFlags::PROTECTED
            } else if self.eat_contextual(SyntaxKind::ReadonlyKeyword) {
                ModifierFlags::READONLY
            } else if self.eat_contextual(SyntaxKind::OverrideKeyword) {
                ModifierFlags::OVERRIDE
            } else {
                break;
            };
            property_modifiers |= add;
        }
        let rest = self.eat(SyntaxKind::DotDotDot);

        if self.check(SyntaxKind::OpenBrace) || self.check(SyntaxKind::OpenBracket) {
            let pattern = self.parse_binding_pattern();
            let optional = self.eat(SyntaxKind::Question);
            let type_ann = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            let default = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
            let temp = self.next_temp();
            self.pending_param_destructures.push((temp.clone(), pattern, default.clone()));
            return Param { name: temp, type_ann, optional, rest, default: None, property_modifiers: None };
        }

        let name = self.ident_text();
        let optional = self.eat(SyntaxKind::Question);
        let type_ann = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
        let default = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
        Param {
            name,
            type_ann,
            optional,
            rest,
            default,
            property_modifiers: if property_modifiers.is_empty() { None } else { Some(property_modifiers) },
        }
    }

    fn parse_function_decl(&mut self, flags: FunctionFlags, modifiers: ModifierFlags) -> Stmt {
        let span = self.here();
        self.advance(); // `function`
        let is_generator = self.eat(SyntaxKind::Asterisk);
        let flags = FunctionFlags { is_generator, ..flags };
        let name = if self.is_identifier_like() { Some(self.advance().lexeme) } else { None };
        let type_params = self.parse_type_params();
        let params = self.parse_params_with_destructure_prelude();
        let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
        let body = if self.check(SyntaxKind::OpenBrace) {
            Some(self.finish_body_with_param_prelude())
        } else {
            self.eat(SyntaxKind::Semicolon);
            None
        };
        Stmt {
            span,
            kind: StmtKind::FunctionDecl(Rc::new(FunctionDecl { name, type_params, params, return_type, this_param: None, body, flags, modifiers })),
        }
    }

    /// Parses a parameter list, stashing any destructured-parameter
    /// desugaring so the next parsed body can be prefixed with it.
    fn parse_params_with_destructure_prelude(&mut self) -> Vec<Param> {
        let saved = std::mem::take(&mut self.pending_param_destructures);
        let params = self.parse_param_list();
        let mine = std::mem::replace(&mut self.pending_param_destructures, saved);
        self.param_prelude_stack.push(mine);
        params
    }

    fn finish_body_with_param_prelude(&mut self) -> Vec<Stmt> {
        let mut body = self.parse_stmt_block_body();
        if let Some(prelude_specs) = self.param_prelude_stack.pop() {
            let mut prelude = Vec::new();
            for (temp, pattern, default) in prelude_specs {
                let source = apply_pattern_default(Expr { span: Span::new(0, 0, 0), kind: ExprKind::Ident(temp) }, default);
                desugar_pattern_binding(&pattern, source, VarKind::Let, NodeFlags::LET, self, &mut prelude);
            }
            prelude.extend(body);
            body = prelude;
        }
        body
    }

    fn parse_enum_decl(&mut self, is_const: bool) -> Stmt {
        let span = self.here();
        self.advance(); // `enum`
        let name = self.ident_text();
        self.expect(SyntaxKind::OpenBrace, "{");
        let mut members = Vec::new();
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            let member_name = if self.check(SyntaxKind::StringLiteral) { self.advance().lexeme } else { self.ident_text() };
            let init = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
            members.push(EnumMember { name: member_name, init });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        Stmt { span, kind: StmtKind::EnumDecl(Rc::new(EnumDecl { name, is_const, members })) }
    }

    fn parse_type_alias(&mut self) -> Stmt {
        let span = self.here();
        self.advance(); // `type`
        let name = self.ident_text();
        let type_params = self.parse_type_params();
        self.expect(SyntaxKind::Equals, "=");
        let ty = self.parse_type();
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::TypeAliasDecl(Rc::new(TypeAliasDecl { name, type_params, ty })) }
    }

    fn parse_interface_decl(&mut self) -> Stmt {
        let span = self.here();
        self.advance(); // `interface`
        let name = self.ident_text();
        let type_params = self.parse_type_params();
        let extends = if self.eat(SyntaxKind::ExtendsKeyword) {
            let mut list = vec![self.parse_type()];
            while self.eat(SyntaxKind::Comma) {
                list.push(self.parse_type());
            }
            list
        } else {
            Vec::new()
        };
        self.expect(SyntaxKind::OpenBrace, "{");
        let mut members = Vec::new();
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            members.push(self.parse_interface_member());
            self.eat(SyntaxKind::Semicolon);
            self.eat(SyntaxKind::Comma);
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        Stmt { span, kind: StmtKind::InterfaceDecl(Rc::new(InterfaceDecl { name, type_params, extends, members })) }
    }

    fn parse_interface_member(&mut self) -> InterfaceMember {
        if self.check(SyntaxKind::OpenParen) || self.check(SyntaxKind::LessThan) {
            if let Some(sig) = self.speculate(|p| p.try_parse_call_or_construct_signature(false)) {
                return sig;
            }
        }
        if self.check(SyntaxKind::NewKeyword) {
            if let Some(sig) = self.speculate(|p| {
                p.advance();
                p.try_parse_call_or_construct_signature(true)
            }) {
                return sig;
            }
        }
        if self.check(SyntaxKind::OpenBracket) {
            if let Some(index) = self.speculate(|p| p.try_parse_index_signature()) {
                return InterfaceMember::IndexSignature {
                    key_name: index.0,
                    key_type: index.1,
                    value_type: index.2,
                    readonly: index.3,
                };
            }
        }
        let readonly = self.eat_contextual(SyntaxKind::ReadonlyKeyword);
        let name = self.parse_member_name();
        let optional = self.eat(SyntaxKind::Question);
        if self.check(SyntaxKind::OpenParen) || self.check(SyntaxKind::LessThan) {
            let type_params = self.parse_type_params();
            let params = self.parse_param_list();
            let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            return InterfaceMember::Method { name, type_params, params, return_type, optional };
        }
        self.expect(SyntaxKind::Colon, ":");
        let ty = self.parse_type();
        InterfaceMember::Property { name, optional, readonly, ty }
    }

    fn try_parse_call_or_construct_signature(&mut self, is_construct: bool) -> Option<InterfaceMember> {
        let type_params = self.parse_type_params();
        if !self.check(SyntaxKind::OpenParen) {
            return None;
        }
        let params = self.parse_param_list();
        let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
        Some(if is_construct {
            InterfaceMember::ConstructSignature { type_params, params, return_type }
        } else {
            InterfaceMember::CallSignature { type_params, params, return_type }
        })
    }

    fn try_parse_index_signature(&mut self) -> Option<(String, TypeNode, TypeNode, bool)> {
        if !self.eat(SyntaxKind::OpenBracket) {
            return None;
        }
        if !self.is_identifier_like() {
            return None;
        }
        let key_name = self.advance().lexeme;
        if !self.eat(SyntaxKind::Colon) {
            return None;
        }
        let key_type = self.parse_type();
        if !self.eat(SyntaxKind::CloseBracket) {
            return None;
        }
        if !self.eat(SyntaxKind::Colon) {
            return None;
        }
        let value_type = self.parse_type();
        Some((key_name, key_type, value_type, false))
    }

    fn parse_member_name(&mut self) -> String {
        if self.check(SyntaxKind::StringLiteral) || self.check(SyntaxKind::NumericLiteral) {
            self.advance().lexeme
        } else if self.check(SyntaxKind::OpenBracket) {
            // Computed member name: kept as its source text, the checker
            // resolves well-known symbols (`[Symbol.iterator]`) separately.
            self.advance();
            let mut text = String::new();
            while !self.check(SyntaxKind::CloseBracket) && !self.is_eof() {
                text.push_str(&self.advance().lexeme);
            }
            self.expect(SyntaxKind::CloseBracket, "]");
            text
        } else {
            self.ident_text()
        }
    }

    fn parse_namespace_decl(&mut self) -> Stmt {
        let span = self.here();
        let is_module = self.check_contextual(SyntaxKind::ModuleKeyword);
        self.advance(); // `namespace`/`module`
        if is_module && self.check(SyntaxKind::StringLiteral) {
            let _module_name = self.advance().lexeme;
            let body = self.parse_stmt_block_body();
            return Stmt { span, kind: StmtKind::ModuleAugmentation(Rc::new(NamespaceDecl { name: _module_name, body })) };
        }
        let mut segments = vec![self.ident_text()];
        while self.eat(SyntaxKind::Dot) {
            segments.push(self.ident_text());
        }
        let body = self.parse_stmt_block_body();
        Stmt { span, kind: StmtKind::NamespaceDecl(Rc::new(nest_namespace(segments, body))) }
    }

    fn parse_class_decl(&mut self, extra_modifiers: ModifierFlags) -> Stmt {
        let span = self.here();
        self.advance(); // `class`
        let is_abstract = extra_modifiers.contains(ModifierFlags::ABSTRACT);
        let name = if self.is_identifier_like() { Some(self.advance().lexeme) } else { None };
        let type_params = self.parse_type_params();
        let superclass = if self.eat(SyntaxKind::ExtendsKeyword) {
            let base_name = self.ident_text();
            let type_args = self.parse_type_args();
            Some((base_name, type_args))
        } else {
            None
        };
        let mut implements = Vec::new();
        if self.is_identifier_like() && self.current().lexeme == "implements" {
            self.advance();
            implements.push(self.parse_type());
            while self.eat(SyntaxKind::Comma) {
                implements.push(self.parse_type());
            }
        }
        self.expect(SyntaxKind::OpenBrace, "{");
        let mut members = Vec::new();
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            if self.eat(SyntaxKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member());
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        let members = expand_parameter_properties(members);
        Stmt {
            span,
            kind: StmtKind::ClassDecl(Rc::new(ClassDecl { name, type_params, superclass, implements, members, is_abstract, modifiers: extra_modifiers })),
        }
    }

    fn parse_class_member(&mut self) -> ClassMember {
        if self.check(SyntaxKind::OpenBrace) && self.check_contextual(SyntaxKind::StaticKeyword) {
            // unreachable guard; static block handled below via modifiers loop.
        }
        let modifiers = self.parse_modifiers();
        if modifiers.contains(ModifierFlags::STATIC) && self.check(SyntaxKind::OpenBrace) {
            return ClassMember::StaticBlock(self.parse_stmt_block_body());
        }
        if self.is_identifier_like() && self.current().lexeme == "constructor" && self.peek_at(1).kind == SyntaxKind::OpenParen {
            self.advance();
            let params = self.parse_params_with_destructure_prelude();
            let body = if self.check(SyntaxKind::OpenBrace) { Some(self.finish_body_with_param_prelude()) } else { self.eat(SyntaxKind::Semicolon); None };
            return ClassMember::Constructor { params, body, modifiers };
        }
        let is_getter = self.check_contextual(SyntaxKind::GetKeyword) && !self.next_is_member_terminator();
        let is_setter = self.check_contextual(SyntaxKind::SetKeyword) && !self.next_is_member_terminator();
        if is_getter || is_setter {
            self.advance();
        }
        let is_generator = self.eat(SyntaxKind::Asterisk);
        let is_private_name = self.check(SyntaxKind::PrivateIdentifier);
        let name = self.parse_member_name();
        let optional = self.eat(SyntaxKind::Question);
        let _ = optional;

        if is_getter {
            let return_type_params = self.parse_type_params();
            let _ = return_type_params;
            self.expect(SyntaxKind::OpenParen, "(");
            self.expect(SyntaxKind::CloseParen, ")");
            let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            let body = if self.check(SyntaxKind::OpenBrace) { Some(self.parse_stmt_block_body()) } else { self.eat(SyntaxKind::Semicolon); None };
            return ClassMember::Getter { name, return_type, body, modifiers };
        }
        if is_setter {
            self.parse_type_params();
            self.expect(SyntaxKind::OpenParen, "(");
            let param = self.parse_param();
            self.expect(SyntaxKind::CloseParen, ")");
            let body = if self.check(SyntaxKind::OpenBrace) { Some(self.parse_stmt_block_body()) } else { self.eat(SyntaxKind::Semicolon); None };
            return ClassMember::Setter { name, param, body, modifiers };
        }
        if self.check(SyntaxKind::OpenParen) || self.check(SyntaxKind::LessThan) {
            let type_params = self.parse_type_params();
            let params = self.parse_params_with_destructure_prelude();
            let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            let flags = FunctionFlags { is_async: modifiers.contains(ModifierFlags::ASYNC), is_generator };
            let body = if self.check(SyntaxKind::OpenBrace) { Some(self.finish_body_with_param_prelude()) } else { self.eat(SyntaxKind::Semicolon); None };
            return ClassMember::Method { name, type_params, params, return_type, body, flags, modifiers, is_private_name };
        }
        if self.check(SyntaxKind::OpenBracket) {
            if let Some((key_name, key_type, value_type, _)) = self.speculate(|p| p.try_parse_index_signature()) {
                return ClassMember::IndexSignature { key_name, key_type, value_type, readonly: modifiers.contains(ModifierFlags::READONLY) };
            }
        }
        let type_ann = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
        let init = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
        self.eat(SyntaxKind::Semicolon);
        ClassMember::Field { name, type_ann, init, modifiers, is_private_name }
    }

    fn next_is_member_terminator(&self) -> bool {
        matches!(self.peek_at(1).kind, SyntaxKind::OpenParen | SyntaxKind::Colon | SyntaxKind::Semicolon | SyntaxKind::Equals | SyntaxKind::CloseBrace)
    }

    fn parse_import(&mut self) -> Stmt {
        let span = self.here();
        self.advance(); // `import`
        if self.check(SyntaxKind::StringLiteral) {
            let source = self.advance().lexeme;
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::Import(ImportDecl { specifiers: Vec::new(), source, type_only: false }) };
        }
        let type_only = self.check_contextual(SyntaxKind::TypeKeyword)
            && self.peek_at(1).kind != SyntaxKind::Comma
            && !self.peek_is_contextual(1, SyntaxKind::FromKeyword);
        if type_only {
            self.advance();
        }
        // `import X = A.B.C;`
        if self.is_identifier_like() && self.peek_at(1).kind == SyntaxKind::Equals {
            let name = self.advance().lexeme;
            self.advance(); // `=`
            let mut target = vec![self.ident_text()];
            while self.eat(SyntaxKind::Dot) {
                target.push(self.ident_text());
            }
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::ImportEquals { name, is_export: false, target } };
        }
        let mut specifiers = Vec::new();
        if self.is_identifier_like() {
            specifiers.push(ImportSpecifier::Default(self.advance().lexeme));
            self.eat(SyntaxKind::Comma);
        }
        if self.eat(SyntaxKind::Asterisk) {
            self.eat_contextual(SyntaxKind::AsKeyword);
            specifiers.push(ImportSpecifier::Namespace(self.ident_text()));
        } else if self.eat(SyntaxKind::OpenBrace) {
            while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
                let imported = self.ident_text();
                let local = if self.eat_contextual(SyntaxKind::AsKeyword) { self.ident_text() } else { imported.clone() };
                specifiers.push(ImportSpecifier::Named { imported, local });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::CloseBrace, "}");
        }
        self.eat_contextual(SyntaxKind::FromKeyword);
        let source = if self.check(SyntaxKind::StringLiteral) { self.advance().lexeme } else { String::new() };
        self.eat(SyntaxKind::Semicolon);
        Stmt { span, kind: StmtKind::Import(ImportDecl { specifiers, source, type_only }) }
    }

    fn parse_export(&mut self) -> Stmt {
        let span = self.here();
        self.advance(); // `export`
        if self.eat(SyntaxKind::DefaultKeyword) {
            if self.check(SyntaxKind::FunctionKeyword) || self.check(SyntaxKind::ClassKeyword) {
                let decl = self.parse_statement();
                return Stmt { span, kind: StmtKind::ExportDecl(Box::new(decl)) };
            }
            let expr = self.parse_assignment_expr();
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::ExportDefault(Box::new(expr)) };
        }
        if self.eat(SyntaxKind::Equals) {
            let expr = self.parse_assignment_expr();
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::ExportAssignment(Box::new(expr)) };
        }
        if self.is_identifier_like() && self.current().lexeme == "as" && self.peek_is_contextual(1, SyntaxKind::NamespaceKeyword) {
            // `export as namespace X;` (UMD global) — consume and ignore, ambient-only construct.
            self.advance();
            self.advance();
            self.ident_text();
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::Empty };
        }
        if self.is_identifier_like() && self.current().lexeme == "import" {
            // `export import X = A.B;`
            self.advance();
            let name = self.advance().lexeme;
            self.expect(SyntaxKind::Equals, "=");
            let mut target = vec![self.ident_text()];
            while self.eat(SyntaxKind::Dot) {
                target.push(self.ident_text());
            }
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::ImportEquals { name, is_export: true, target } };
        }
        let type_only = self.check_contextual(SyntaxKind::TypeKeyword) && self.peek_at(1).kind == SyntaxKind::OpenBrace;
        if type_only {
            self.advance();
        }
        if self.eat(SyntaxKind::OpenBrace) {
            let mut specifiers = Vec::new();
            while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
                let local = self.ident_text();
                let exported = if self.eat_contextual(SyntaxKind::AsKeyword) { self.ident_text() } else { local.clone() };
                specifiers.push(ExportSpecifier { local, exported });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::CloseBrace, "}");
            let source = if self.eat_contextual(SyntaxKind::FromKeyword) {
                if self.check(SyntaxKind::StringLiteral) { Some(self.advance().lexeme) } else { None }
            } else {
                None
            };
            self.eat(SyntaxKind::Semicolon);
            return Stmt { span, kind: StmtKind::ExportNamed(ExportNamedDecl { specifiers, source, type_only }) };
        }
        // `export <decl>` — reuse the ordinary declaration parser and tag the modifier.
        let decl = self.parse_statement();
        Stmt { span, kind: StmtKind::ExportDecl(Box::new(decl)) }
    }

    // ---- destructuring patterns -----------------------------------------------

    fn parse_binding_pattern(&mut self) -> Pattern {
        if self.eat(SyntaxKind::OpenBracket) {
            let mut elements = Vec::new();
            while !self.check(SyntaxKind::CloseBracket) && !self.is_eof() {
                if self.eat(SyntaxKind::Comma) {
                    elements.push(ArrayPatternElement::Elision);
                    continue;
                }
                if self.eat(SyntaxKind::DotDotDot) {
                    let pattern = self.parse_binding_pattern_or_ident();
                    elements.push(ArrayPatternElement::Rest(pattern));
                    self.eat(SyntaxKind::Comma);
                    break;
                }
                let pattern = self.parse_binding_pattern_or_ident();
                let default = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
                elements.push(ArrayPatternElement::Binding { pattern, default });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::CloseBracket, "]");
            return Pattern::Array(elements);
        }
        if self.eat(SyntaxKind::OpenBrace) {
            let mut elements = Vec::new();
            let mut rest = None;
            while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
                if self.eat(SyntaxKind::DotDotDot) {
                    rest = Some(self.ident_text());
                    self.eat(SyntaxKind::Comma);
                    break;
                }
                let key = self.parse_member_name();
                let value = if self.eat(SyntaxKind::Colon) { self.parse_binding_pattern_or_ident() } else { Pattern::Ident(key.clone()) };
                let default = if self.eat(SyntaxKind::Equals) { Some(self.parse_assignment_expr()) } else { None };
                elements.push(ObjectPatternElement { key, value, default });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::CloseBrace, "}");
            return Pattern::Object { props: elements, rest };
        }
        Pattern::Ident(self.ident_text())
    }

    fn parse_binding_pattern_or_ident(&mut self) -> Pattern {
        if self.check(SyntaxKind::OpenBrace) || self.check(SyntaxKind::OpenBracket) {
            self.parse_binding_pattern()
        } else {
            Pattern::Ident(self.ident_text())
        }
    }

    // ---- expressions ------------------------------------------------------

    fn parse_expression(&mut self) -> Expr {
        let mut expr = self.parse_assignment_expr();
        if self.check(SyntaxKind::Comma) {
            let span = expr.span;
            let mut exprs = vec![expr];
            while self.eat(SyntaxKind::Comma) {
                exprs.push(self.parse_assignment_expr());
            }
            expr = exprs.into_iter().reduce(|acc, next| Expr { span, kind: ExprKind::Assign { op: AssignOp::Assign, target: Box::new(acc), value: Box::new(next) } }).unwrap();
        }
        expr
    }

    fn parse_assignment_expr(&mut self) -> Expr {
        if self.check_contextual(SyntaxKind::YieldKeyword) {
            return self.parse_yield();
        }
        if let Some(arrow) = self.try_parse_arrow() {
            return arrow;
        }
        let left = self.parse_ternary();
        if let Some(op) = assign_op_for(self.current().kind) {
            self.advance();
            let value = self.parse_assignment_expr();
            let span = left.span;
            return Expr { span, kind: ExprKind::Assign { op, target: Box::new(left), value: Box::new(value) } };
        }
        left
    }

    fn parse_yield(&mut self) -> Expr {
        let span = self.here();
        self.advance();
        let delegate = self.eat(SyntaxKind::Asterisk);
        let arg = if self.check(SyntaxKind::Semicolon) || self.check(SyntaxKind::CloseBrace) || self.check(SyntaxKind::CloseParen) || self.check(SyntaxKind::Comma) {
            None
        } else {
            Some(Box::new(self.parse_assignment_expr()))
        };
        Expr { span, kind: ExprKind::Yield { arg, delegate } }
    }

    /// Speculatively tries to parse the current position as an arrow
    /// function (`(params) => body`, `x => body`, `async (params) => body`);
    /// rolls back and returns `None` if it isn't one.
    fn try_parse_arrow(&mut self) -> Option<Expr> {
        let span = self.here();
        let is_async = self.check_contextual(SyntaxKind::AsyncKeyword)
            && self.peek_at(1).kind != SyntaxKind::EqualsGreaterThan
            && self.peek_at(1).line == span.line;
        let start_offset = if is_async { 1 } else { 0 };
        let after_async = self.peek_at(start_offset);

        // Single bare identifier arrow: `x => ...` / `async x => ...`.
        if after_async.kind == SyntaxKind::Identifier && self.peek_at(start_offset + 1).kind == SyntaxKind::EqualsGreaterThan {
            if is_async {
                self.advance();
            }
            let name = self.advance().lexeme;
            self.advance(); // `=>`
            let params = vec![Param { name, type_ann: None, optional: false, rest: false, default: None, property_modifiers: None }];
            let body = self.parse_arrow_body();
            return Some(Expr { span, kind: ExprKind::Arrow { type_params: Vec::new(), params, return_type: None, this_param: None, body, is_async } });
        }

        if after_async.kind != SyntaxKind::OpenParen && after_async.kind != SyntaxKind::LessThan {
            return None;
        }

        self.speculate(|p| {
            if is_async {
                p.advance();
            }
            let type_params = p.parse_type_params();
            if !p.check(SyntaxKind::OpenParen) {
                return None;
            }
            let params = p.parse_params_with_destructure_prelude();
            let return_type = if p.eat(SyntaxKind::Colon) { Some(p.parse_type()) } else { None };
            if !p.eat(SyntaxKind::EqualsGreaterThan) {
                p.param_prelude_stack.pop();
                return None;
            }
            let body = p.parse_arrow_body_with_prelude();
            Some(Expr { span, kind: ExprKind::Arrow { type_params, params, return_type, this_param: None, body, is_async } })
        })
    }

    fn parse_arrow_body(&mut self) -> ArrowBody {
        if self.check(SyntaxKind::OpenBrace) {
            ArrowBody::Block(self.parse_stmt_block_body())
        } else {
            ArrowBody::Expr(Box::new(self.parse_assignment_expr()))
        }
    }

    fn parse_arrow_body_with_prelude(&mut self) -> ArrowBody {
        if self.check(SyntaxKind::OpenBrace) {
            ArrowBody::Block(self.finish_body_with_param_prelude())
        } else {
            self.param_prelude_stack.pop();
            ArrowBody::Expr(Box::new(self.parse_assignment_expr()))
        }
    }

    fn parse_ternary(&mut self) -> Expr {
        let cond = self.parse_binary(0);
        if self.eat(SyntaxKind::Question) {
            let span = cond.span;
            let then = self.parse_assignment_expr();
            self.expect(SyntaxKind::Colon, ":");
            let else_ = self.parse_assignment_expr();
            return Expr { span, kind: ExprKind::Ternary { cond: Box::new(cond), then: Box::new(then), else_: Box::new(else_) } };
        }
        cond
    }

    /// Precedence-climbing binary/logical operator parse.
    fn parse_binary(&mut self, min_bp: u8) -> Expr {
        let mut left = self.parse_unary();
        loop {
            let Some((bp, kind)) = infix_binding_power(self.current().kind) else { break };
            if bp < min_bp {
                break;
            }
            let op_tok = self.advance();
            let right = self.parse_binary(bp + 1);
            let span = left.span;
            left = match kind {
                InfixKind::Binary(op) => Expr { span, kind: ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) } },
                InfixKind::Logical(op) => Expr { span, kind: ExprKind::Logical { op, left: Box::new(left), right: Box::new(right) } },
            };
            let _ = op_tok;
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        let span = self.here();
        let prefix_op = match self.current().kind {
            SyntaxKind::Plus => Some(UnaryOp::Plus),
            SyntaxKind::Minus => Some(UnaryOp::Minus),
            SyntaxKind::Exclamation => Some(UnaryOp::Not),
            SyntaxKind::Tilde => Some(UnaryOp::BitNot),
            SyntaxKind::TypeOfKeyword => Some(UnaryOp::TypeOf),
            SyntaxKind::VoidKeyword => Some(UnaryOp::Void),
            SyntaxKind::DeleteKeyword => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = prefix_op {
            self.advance();
            let expr = self.parse_unary();
            return Expr { span, kind: ExprKind::Unary { op, expr: Box::new(expr) } };
        }
        if matches!(self.current().kind, SyntaxKind::PlusPlus | SyntaxKind::MinusMinus) {
            let op = if self.current().kind == SyntaxKind::PlusPlus { UnaryOp::Plus } else { UnaryOp::Minus };
            self.advance();
            let expr = self.parse_unary();
            return Expr { span, kind: ExprKind::Update { op, prefix: true, expr: Box::new(expr) } };
        }
        if self.check_contextual(SyntaxKind::AwaitKeyword) {
            self.advance();
            let expr = self.parse_unary();
            return Expr { span, kind: ExprKind::Await(Box::new(expr)) };
        }
        if self.check(SyntaxKind::LessThan) {
            if let Some(expr) = self.speculate(|p| p.try_parse_angle_bracket_assertion(span)) {
                return expr;
            }
        }
        self.parse_postfix_with_as()
    }

    /// Wraps `parse_postfix` with trailing `as Type` / `satisfies Type`
    /// suffixes (spec §4.2), which may chain (`x as A as B`).
    fn parse_postfix_with_as(&mut self) -> Expr {
        let mut expr = self.parse_postfix();
        loop {
            if self.eat_contextual(SyntaxKind::AsKeyword) {
                let span = expr.span;
                // `as const` carries no type arguments to resolve; represented
                // as a bare reference the checker recognizes by name.
                let ty = if self.check(SyntaxKind::ConstKeyword) {
                    self.advance();
                    TypeNode::Reference { name: "const".to_string(), type_args: Vec::new() }
                } else {
                    self.parse_type()
                };
                expr = Expr { span, kind: ExprKind::As { expr: Box::new(expr), ty } };
                continue;
            }
            if self.eat_contextual(SyntaxKind::SatisfiesKeyword) {
                let span = expr.span;
                let ty = self.parse_type();
                expr = Expr { span, kind: ExprKind::Satisfies { expr: Box::new(expr), ty } };
                continue;
            }
            break;
        }
        expr
    }

    fn try_parse_angle_bracket_assertion(&mut self, span: Span) -> Option<Expr> {
        self.advance(); // `<`
        let ty = self.parse_type();
        self.expect_close_type_arg_list();
        // A bare `<T>` with no following unary operand is almost certainly a
        // misparsed comparison; require a real expression to follow.
        if matches!(self.current().kind, SyntaxKind::Semicolon | SyntaxKind::CloseParen | SyntaxKind::Comma | SyntaxKind::EndOfFile) {
            return None;
        }
        let expr = self.parse_unary();
        Some(Expr { span, kind: ExprKind::AngleBracketAssertion { ty, expr: Box::new(expr) } })
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_call_or_member(None);
        if matches!(self.current().kind, SyntaxKind::PlusPlus | SyntaxKind::MinusMinus) && self.current().line == expr.span.line {
            let op = if self.current().kind == SyntaxKind::PlusPlus { UnaryOp::Plus } else { UnaryOp::Minus };
            self.advance();
            let span = expr.span;
            expr = Expr { span, kind: ExprKind::Update { op, prefix: false, expr: Box::new(expr) } };
        }
        expr
    }

    fn parse_call_or_member(&mut self, _ctx: Option<()>) -> Expr {
        let mut expr = if self.check(SyntaxKind::NewKeyword) { self.parse_new() } else { self.parse_primary() };
        loop {
            if self.eat(SyntaxKind::Dot) {
                let span = expr.span;
                let prop = self.parse_member_name();
                expr = Expr { span, kind: ExprKind::Member { object: Box::new(expr), prop: MemberProp::Name(prop), optional: false } };
                continue;
            }
            if self.check(SyntaxKind::PrivateIdentifier) {
                // `this.#x` already routed via Dot; bare `#x.y` unsupported outside class body context here.
            }
            if self.eat(SyntaxKind::QuestionDot) {
                let span = expr.span;
                if self.check(SyntaxKind::OpenParen) {
                    let (type_args, args) = self.parse_call_args();
                    expr = Expr { span, kind: ExprKind::Call { callee: Box::new(expr), type_args, args, optional: true } };
                } else if self.eat(SyntaxKind::OpenBracket) {
                    let index = self.parse_expression();
                    self.expect(SyntaxKind::CloseBracket, "]");
                    expr = Expr { span, kind: ExprKind::Index { object: Box::new(expr), index: Box::new(index), optional: true } };
                } else if self.check(SyntaxKind::PrivateIdentifier) {
                    let prop = self.advance().lexeme;
                    expr = Expr { span, kind: ExprKind::Member { object: Box::new(expr), prop: MemberProp::PrivateName(prop), optional: true } };
                } else {
                    let prop = self.parse_member_name();
                    expr = Expr { span, kind: ExprKind::Member { object: Box::new(expr), prop: MemberProp::Name(prop), optional: true } };
                }
                continue;
            }
            if self.check(SyntaxKind::OpenBracket) {
                self.advance();
                let span = expr.span;
                let index = self.parse_expression();
                self.expect(SyntaxKind::CloseBracket, "]");
                expr = Expr { span, kind: ExprKind::Index { object: Box::new(expr), index: Box::new(index), optional: false } };
                continue;
            }
            if self.check(SyntaxKind::OpenParen) {
                let span = expr.span;
                let (type_args, args) = self.parse_call_args();
                expr = Expr { span, kind: ExprKind::Call { callee: Box::new(expr), type_args, args, optional: false } };
                continue;
            }
            if self.check(SyntaxKind::LessThan) {
                if let Some(new_expr) = self.speculate(|p| p.try_parse_call_with_type_args(&expr)) {
                    expr = new_expr;
                    continue;
                }
            }
            if self.check(SyntaxKind::NoSubstitutionTemplateLiteral) || self.check(SyntaxKind::TemplateHead) {
                let span = expr.span;
                let quasi = self.parse_template_literal();
                expr = Expr { span, kind: ExprKind::TaggedTemplate { tag: Box::new(expr), quasi } };
                continue;
            }
            if self.eat(SyntaxKind::Exclamation) && self.current().line == expr.span.line {
                let span = expr.span;
                expr = Expr { span, kind: ExprKind::NonNull(Box::new(expr)) };
                continue;
            }
            break;
        }
        expr
    }

    fn try_parse_call_with_type_args(&mut self, callee: &Expr) -> Option<Expr> {
        let type_args = self.parse_type_args();
        if !self.check(SyntaxKind::OpenParen) {
            return None;
        }
        let span = callee.span;
        let (_, args) = self.parse_call_args();
        Some(Expr { span, kind: ExprKind::Call { callee: Box::new(callee.clone()), type_args, args, optional: false } })
    }

    fn parse_call_args(&mut self) -> (Vec<TypeNode>, Vec<ArrayElement>) {
        self.expect(SyntaxKind::OpenParen, "(");
        let mut args = Vec::new();
        while !self.check(SyntaxKind::CloseParen) && !self.is_eof() {
            if self.eat(SyntaxKind::DotDotDot) {
                args.push(ArrayElement::Spread(self.parse_assignment_expr()));
            } else {
                args.push(ArrayElement::Item(self.parse_assignment_expr()));
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseParen, ")");
        (Vec::new(), args)
    }

    fn parse_new(&mut self) -> Expr {
        let span = self.here();
        self.advance(); // `new`
        let callee = self.parse_call_or_member(None);
        // parse_call_or_member already consumed any trailing call — but
        // `new` binds its own argument list, so re-extract if it parsed one.
        if let ExprKind::Call { callee: inner_callee, type_args, args, .. } = callee.kind {
            return Expr { span, kind: ExprKind::New { callee: inner_callee, type_args, args } };
        }
        let type_args = if self.check(SyntaxKind::LessThan) {
            self.speculate(|p| {
                let args = p.parse_type_args();
                if p.check(SyntaxKind::OpenParen) { Some(args) } else { None }
            })
            .unwrap_or_default()
        } else {
            Vec::new()
        };
        let args = if self.check(SyntaxKind::OpenParen) { self.parse_call_args().1 } else { Vec::new() };
        Expr { span, kind: ExprKind::New { callee: Box::new(callee), type_args, args } }
    }

    fn parse_primary(&mut self) -> Expr {
        let span = self.here();
        match self.current().kind {
            SyntaxKind::NumericLiteral => {
                let tok = self.advance();
                let n = match tok.literal { Some(ScanLiteral::Number(n)) => n, _ => 0.0 };
                Expr { span, kind: ExprKind::Literal(LiteralValue::Number(n)) }
            }
            SyntaxKind::BigIntLiteral => {
                let tok = self.advance();
                let s = match tok.literal { Some(ScanLiteral::BigInt(s)) => s, _ => tok.lexeme };
                Expr { span, kind: ExprKind::Literal(LiteralValue::BigInt(s)) }
            }
            SyntaxKind::StringLiteral => {
                let tok = self.advance();
                let s = match tok.literal { Some(ScanLiteral::String(s)) => s, _ => tok.lexeme };
                Expr { span, kind: ExprKind::Literal(LiteralValue::String(s)) }
            }
            SyntaxKind::TrueKeyword => {
                self.advance();
                Expr { span, kind: ExprKind::Literal(LiteralValue::Boolean(true)) }
            }
            SyntaxKind::FalseKeyword => {
                self.advance();
                Expr { span, kind: ExprKind::Literal(LiteralValue::Boolean(false)) }
            }
            SyntaxKind::NullKeyword => {
                self.advance();
                Expr { span, kind: ExprKind::Literal(LiteralValue::Null) }
            }
            SyntaxKind::ThisKeyword => {
                self.advance();
                Expr { span, kind: ExprKind::This }
            }
            SyntaxKind::SuperKeyword => {
                self.advance();
                Expr { span, kind: ExprKind::Super }
            }
            SyntaxKind::NoSubstitutionTemplateLiteral | SyntaxKind::TemplateHead => {
                Expr { span, kind: ExprKind::Template(self.parse_template_literal()) }
            }
            SyntaxKind::OpenParen => {
                self.advance();
                let expr = self.parse_expression();
                self.expect(SyntaxKind::CloseParen, ")");
                Expr { span, kind: ExprKind::Grouping(Box::new(expr)) }
            }
            SyntaxKind::OpenBracket => self.parse_array_literal(),
            SyntaxKind::OpenBrace => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => {
                self.advance();
                let is_generator = self.eat(SyntaxKind::Asterisk);
                let name = if self.is_identifier_like() { Some(self.advance().lexeme) } else { None };
                let type_params = self.parse_type_params();
                let params = self.parse_params_with_destructure_prelude();
                let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
                let body = Some(self.finish_body_with_param_prelude());
                Expr {
                    span,
                    kind: ExprKind::FunctionExpr(Rc::new(FunctionDecl {
                        name,
                        type_params,
                        params,
                        return_type,
                        this_param: None,
                        body,
                        flags: FunctionFlags { is_async: false, is_generator },
                        modifiers: ModifierFlags::NONE,
                    })),
                }
            }
            SyntaxKind::ClassKeyword => {
                let Stmt { kind: StmtKind::ClassDecl(decl), .. } = self.parse_class_decl(ModifierFlags::NONE) else { unreachable!() };
                Expr { span, kind: ExprKind::ClassExpr(decl) }
            }
            SyntaxKind::DotDotDot => {
                self.advance();
                let expr = self.parse_assignment_expr();
                Expr { span, kind: ExprKind::Spread(Box::new(expr)) }
            }
            _ if self.is_identifier_like() || self.current().contextual_kind.is_some() => {
                let name = self.advance().lexeme;
                Expr { span, kind: ExprKind::Ident(name) }
            }
            _ => {
                self.error(&diagnostics::UNEXPECTED_TOKEN_1004, &[]);
                self.advance();
                Expr { span, kind: ExprKind::Literal(LiteralValue::Undefined) }
            }
        }
    }

    fn parse_template_literal(&mut self) -> TemplateLiteral {
        let mut cooked = Vec::new();
        let mut raw = Vec::new();
        let mut exprs = Vec::new();
        let first = self.advance();
        let (c, r) = match first.literal { Some(ScanLiteral::Template(c, r)) => (c, r), _ => (String::new(), String::new()) };
        cooked.push(c);
        raw.push(r);
        if first.kind == SyntaxKind::NoSubstitutionTemplateLiteral {
            return TemplateLiteral { cooked, raw, exprs };
        }
        loop {
            exprs.push(self.parse_expression());
            if !(self.check(SyntaxKind::TemplateMiddle) || self.check(SyntaxKind::TemplateTail)) {
                self.error(&diagnostics::UNTERMINATED_TEMPLATE_LITERAL_1003, &[]);
                break;
            }
            let tok = self.advance();
            let is_tail = tok.kind == SyntaxKind::TemplateTail;
            let (c, r) = match tok.literal { Some(ScanLiteral::Template(c, r)) => (c, r), _ => (String::new(), String::new()) };
            cooked.push(c);
            raw.push(r);
            if is_tail {
                break;
            }
        }
        TemplateLiteral { cooked, raw, exprs }
    }

    fn parse_array_literal(&mut self) -> Expr {
        let span = self.here();
        self.advance(); // `[`
        let mut elements = Vec::new();
        while !self.check(SyntaxKind::CloseBracket) && !self.is_eof() {
            if self.check(SyntaxKind::Comma) {
                elements.push(ArrayElement::Hole);
                self.advance();
                continue;
            }
            if self.eat(SyntaxKind::DotDotDot) {
                elements.push(ArrayElement::Spread(self.parse_assignment_expr()));
            } else {
                elements.push(ArrayElement::Item(self.parse_assignment_expr()));
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseBracket, "]");
        Expr { span, kind: ExprKind::Array(elements) }
    }

    fn parse_object_literal(&mut self) -> Expr {
        let span = self.here();
        self.advance(); // `{`
        let mut props = Vec::new();
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            props.push(self.parse_object_prop());
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        Expr { span, kind: ExprKind::Object { props, is_fresh: true } }
    }

    fn parse_object_prop(&mut self) -> ObjectProp {
        if self.eat(SyntaxKind::DotDotDot) {
            return ObjectProp::Spread(self.parse_assignment_expr());
        }
        let is_getter = self.check_contextual(SyntaxKind::GetKeyword) && !self.next_is_prop_terminator();
        let is_setter = self.check_contextual(SyntaxKind::SetKeyword) && !self.next_is_prop_terminator();
        if is_getter || is_setter {
            self.advance();
        }
        let is_generator = self.eat(SyntaxKind::Asterisk);
        let computed = self.check(SyntaxKind::OpenBracket);
        let key = self.parse_member_name();
        if is_getter {
            self.expect(SyntaxKind::OpenParen, "(");
            self.expect(SyntaxKind::CloseParen, ")");
            let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            let body = self.parse_stmt_block_body();
            return ObjectProp::Getter { key, return_type, body };
        }
        if is_setter {
            self.expect(SyntaxKind::OpenParen, "(");
            let param = self.parse_param();
            self.expect(SyntaxKind::CloseParen, ")");
            let body = self.parse_stmt_block_body();
            return ObjectProp::Setter { key, param, body };
        }
        if self.check(SyntaxKind::OpenParen) || self.check(SyntaxKind::LessThan) {
            self.parse_type_params();
            let params = self.parse_params_with_destructure_prelude();
            let return_type = if self.eat(SyntaxKind::Colon) { Some(self.parse_type()) } else { None };
            let body = self.finish_body_with_param_prelude();
            return ObjectProp::Method { key, params, return_type, body, flags: FunctionFlags { is_async: false, is_generator } };
        }
        if self.eat(SyntaxKind::Colon) {
            let value = self.parse_assignment_expr();
            return ObjectProp::KeyValue { key, computed, value };
        }
        if self.eat(SyntaxKind::Equals) {
            // Only legal in a destructuring context reinterpreted later; record as shorthand with default folded into value.
            let default = self.parse_assignment_expr();
            return ObjectProp::KeyValue { key: key.clone(), computed: false, value: default };
        }
        ObjectProp::Shorthand(key)
    }

    fn next_is_prop_terminator(&self) -> bool {
        matches!(self.peek_at(1).kind, SyntaxKind::Colon | SyntaxKind::Comma | SyntaxKind::CloseBrace | SyntaxKind::OpenParen)
    }

    // ---- types --------------------------------------------------------------

    fn parse_type(&mut self) -> TypeNode {
        self.parse_conditional_type()
    }

    fn parse_conditional_type(&mut self) -> TypeNode {
        let check = self.parse_union_type();
        if self.eat(SyntaxKind::ExtendsKeyword) {
            let extends = self.parse_union_type_no_conditional();
            self.expect(SyntaxKind::Question, "?");
            let then = self.parse_type();
            self.expect(SyntaxKind::Colon, ":");
            let else_ = self.parse_type();
            return TypeNode::Conditional { check: Box::new(check), extends: Box::new(extends), then: Box::new(then), else_: Box::new(else_) };
        }
        check
    }

    fn parse_union_type_no_conditional(&mut self) -> TypeNode {
        self.parse_union_type()
    }

    fn parse_union_type(&mut self) -> TypeNode {
        self.eat(SyntaxKind::Bar);
        let mut members = vec![self.parse_intersection_type()];
        while self.eat(SyntaxKind::Bar) {
            members.push(self.parse_intersection_type());
        }
        if members.len() == 1 { members.into_iter().next().unwrap() } else { TypeNode::Union(members) }
    }

    fn parse_intersection_type(&mut self) -> TypeNode {
        self.eat(SyntaxKind::Ampersand);
        let mut members = vec![self.parse_type_operator()];
        while self.eat(SyntaxKind::Ampersand) {
            members.push(self.parse_type_operator());
        }
        if members.len() == 1 { members.into_iter().next().unwrap() } else { TypeNode::Intersection(members) }
    }

    fn parse_type_operator(&mut self) -> TypeNode {
        if self.eat_contextual(SyntaxKind::KeyOfKeyword) {
            return TypeNode::KeyOf(Box::new(self.parse_type_operator()));
        }
        if self.eat_contextual(SyntaxKind::InferKeyword) {
            return TypeNode::Infer(self.ident_text());
        }
        if self.check(SyntaxKind::TypeOfKeyword) {
            self.advance();
            let mut path = self.ident_text();
            while self.eat(SyntaxKind::Dot) {
                path.push('.');
                path.push_str(&self.ident_text());
            }
            return TypeNode::TypeOf(path);
        }
        if self.eat_contextual(SyntaxKind::UniqueKeyword) {
            self.eat_contextual(SyntaxKind::SymbolKeyword);
            return TypeNode::UniqueSymbol;
        }
        if self.eat_contextual(SyntaxKind::ReadonlyKeyword) {
            return self.parse_type_operator();
        }
        self.parse_postfix_type()
    }

    fn parse_postfix_type(&mut self) -> TypeNode {
        let mut ty = self.parse_primary_type();
        loop {
            if self.check(SyntaxKind::OpenBracket) && self.current().line == self.peek_at(0).line {
                self.advance();
                if self.eat(SyntaxKind::CloseBracket) {
                    ty = TypeNode::Array(Box::new(ty));
                } else {
                    let index = self.parse_type();
                    self.expect(SyntaxKind::CloseBracket, "]");
                    ty = TypeNode::IndexedAccess { object: Box::new(ty), index: Box::new(index) };
                }
                continue;
            }
            break;
        }
        ty
    }

    fn parse_primary_type(&mut self) -> TypeNode {
        if self.check(SyntaxKind::LessThan) || (self.check(SyntaxKind::OpenParen) && self.looks_like_function_type()) {
            return self.parse_function_type();
        }
        if self.check(SyntaxKind::NewKeyword) {
            self.advance();
            let TypeNode::Function(sig) = self.parse_function_type() else { unreachable!() };
            return TypeNode::Constructor(sig);
        }
        if self.eat(SyntaxKind::OpenParen) {
            let inner = self.parse_type();
            self.expect(SyntaxKind::CloseParen, ")");
            return TypeNode::Parenthesized(Box::new(inner));
        }
        if self.check(SyntaxKind::OpenBrace) {
            return self.parse_object_or_mapped_type();
        }
        if self.check(SyntaxKind::OpenBracket) {
            return self.parse_tuple_type();
        }
        if self.check(SyntaxKind::StringLiteral) {
            let tok = self.advance();
            let s = match tok.literal { Some(ScanLiteral::String(s)) => s, _ => tok.lexeme };
            return TypeNode::Literal(LiteralTypeValue::String(s));
        }
        if self.check(SyntaxKind::NumericLiteral) {
            let tok = self.advance();
            let n = match tok.literal { Some(ScanLiteral::Number(n)) => n, _ => 0.0 };
            return TypeNode::Literal(LiteralTypeValue::Number(n));
        }
        if self.check(SyntaxKind::Minus) && self.peek_at(1).kind == SyntaxKind::NumericLiteral {
            self.advance();
            let tok = self.advance();
            let n = match tok.literal { Some(ScanLiteral::Number(n)) => n, _ => 0.0 };
            return TypeNode::Literal(LiteralTypeValue::Number(-n));
        }
        if self.check(SyntaxKind::TrueKeyword) {
            self.advance();
            return TypeNode::Literal(LiteralTypeValue::Boolean(true));
        }
        if self.check(SyntaxKind::FalseKeyword) {
            self.advance();
            return TypeNode::Literal(LiteralTypeValue::Boolean(false));
        }
        if self.check(SyntaxKind::NoSubstitutionTemplateLiteral) || self.check(SyntaxKind::TemplateHead) {
            return self.parse_template_literal_type();
        }
        if self.check(SyntaxKind::ThisKeyword) {
            self.advance();
            return TypeNode::This;
        }
        if self.check_contextual(SyntaxKind::AssertsKeyword) {
            self.advance();
            let param_name = self.ident_text();
            let ty = if self.eat_contextual(SyntaxKind::IsKeyword) { Some(Box::new(self.parse_type())) } else { None };
            return TypeNode::AssertsPredicate { param_name, ty };
        }
        let name = self.ident_text();
        if self.eat_contextual(SyntaxKind::IsKeyword) {
            let ty = self.parse_type();
            return TypeNode::Predicate { param_name: name, ty: Some(Box::new(ty)) };
        }
        if let Some(kw) = keyword_type_for(&name) {
            return TypeNode::Keyword(kw);
        }
        let mut full_name = name;
        while self.eat(SyntaxKind::Dot) {
            full_name.push('.');
            full_name.push_str(&self.ident_text());
        }
        let type_args = self.parse_type_args();
        TypeNode::Reference { name: full_name, type_args }
    }

    fn looks_like_function_type(&mut self) -> bool {
        self.speculate(|p| {
            p.parse_param_list();
            if p.eat(SyntaxKind::EqualsGreaterThan) { Some(()) } else { None }
        })
        .is_some()
    }

    fn parse_function_type(&mut self) -> TypeNode {
        let type_params = self.parse_type_params_nodes();
        let params = self.parse_param_list_nodes();
        self.expect(SyntaxKind::EqualsGreaterThan, "=>");
        let return_type = Box::new(self.parse_type());
        TypeNode::Function(FunctionTypeNode { type_params, params, return_type })
    }

    fn parse_type_params_nodes(&mut self) -> Vec<TypeParamNode> {
        self.parse_type_params()
            .into_iter()
            .map(|p| TypeParamNode { name: p.name, constraint: p.constraint, default: p.default, variance: p.variance })
            .collect()
    }

    fn parse_param_list_nodes(&mut self) -> Vec<ParamTypeNode> {
        self.expect(SyntaxKind::OpenParen, "(");
        let mut params = Vec::new();
        while !self.check(SyntaxKind::CloseParen) && !self.is_eof() {
            let rest = self.eat(SyntaxKind::DotDotDot);
            let name = self.ident_text();
            let optional = self.eat(SyntaxKind::Question);
            let ty = if self.eat(SyntaxKind::Colon) { self.parse_type() } else { TypeNode::Keyword(KeywordType::Any) };
            params.push(ParamTypeNode { name, ty, optional, rest });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseParen, ")");
        params
    }

    fn parse_tuple_type(&mut self) -> TypeNode {
        self.advance(); // `[`
        let mut elements = Vec::new();
        while !self.check(SyntaxKind::CloseBracket) && !self.is_eof() {
            let rest = self.eat(SyntaxKind::DotDotDot);
            // Labeled tuple element: `name: T` / `name?: T`, distinguished by lookahead.
            let label = if self.is_identifier_like() && matches!(self.peek_at(1).kind, SyntaxKind::Colon | SyntaxKind::Question) {
                Some(self.advance().lexeme)
            } else {
                None
            };
            let optional = label.is_some() && self.eat(SyntaxKind::Question);
            if label.is_some() {
                self.expect(SyntaxKind::Colon, ":");
            }
            let ty = self.parse_type();
            elements.push(TupleElement { label, ty, optional, rest });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseBracket, "]");
        TypeNode::Tuple(elements)
    }

    fn parse_object_or_mapped_type(&mut self) -> TypeNode {
        if let Some(mapped) = self.speculate(|p| p.try_parse_mapped_type()) {
            return mapped;
        }
        self.advance(); // `{`
        let mut members = Vec::new();
        let mut string_index = None;
        let mut number_index = None;
        while !self.check(SyntaxKind::CloseBrace) && !self.is_eof() {
            if self.check(SyntaxKind::OpenBracket) {
                if let Some((key_name, key_type, value_type, _)) = self.speculate(|p| p.try_parse_index_signature()) {
                    let _ = key_name;
                    match key_type {
                        TypeNode::Keyword(KeywordType::Number) => number_index = Some(Box::new(value_type)),
                        _ => string_index = Some(Box::new(value_type)),
                    }
                    self.eat(SyntaxKind::Semicolon);
                    self.eat(SyntaxKind::Comma);
                    continue;
                }
            }
            let readonly = self.eat_contextual(SyntaxKind::ReadonlyKeyword);
            let name = self.parse_member_name();
            let optional = self.eat(SyntaxKind::Question);
            if self.check(SyntaxKind::OpenParen) || self.check(SyntaxKind::LessThan) {
                let type_params = self.parse_type_params_nodes();
                let params = self.parse_param_list_nodes();
                let return_type = Box::new(if self.eat(SyntaxKind::Colon) { self.parse_type() } else { TypeNode::Keyword(KeywordType::Any) });
                members.push(ObjectTypeMember { name, optional, readonly, ty: TypeNode::Function(FunctionTypeNode { type_params, params, return_type }) });
            } else {
                self.expect(SyntaxKind::Colon, ":");
                let ty = self.parse_type();
                members.push(ObjectTypeMember { name, optional, readonly, ty });
            }
            self.eat(SyntaxKind::Semicolon);
            self.eat(SyntaxKind::Comma);
        }
        self.expect(SyntaxKind::CloseBrace, "}");
        TypeNode::Object(ObjectTypeNode { members, string_index, number_index })
    }

    fn try_parse_mapped_type(&mut self) -> Option<TypeNode> {
        self.advance(); // `{`
        let readonly_modifier = if self.eat(SyntaxKind::Plus) {
            self.eat_contextual(SyntaxKind::ReadonlyKeyword);
            Some(ModifierOp::Add)
        } else if self.eat(SyntaxKind::Minus) {
            self.eat_contextual(SyntaxKind::ReadonlyKeyword);
            Some(ModifierOp::Remove)
        } else if self.eat_contextual(SyntaxKind::ReadonlyKeyword) {
            Some(ModifierOp::Add)
        } else {
            None
        };
        if !self.eat(SyntaxKind::OpenBracket) {
            return None;
        }
        let type_param = self.ident_text();
        if !self.eat(SyntaxKind::InKeyword) {
            return None;
        }
        let key_source = Box::new(self.parse_type());
        let name_type = if self.eat_contextual(SyntaxKind::AsKeyword) { Some(Box::new(self.parse_type())) } else { None };
        if !self.eat(SyntaxKind::CloseBracket) {
            return None;
        }
        let optional_modifier = if self.eat(SyntaxKind::Plus) {
            self.eat(SyntaxKind::Question);
            Some(ModifierOp::Add)
        } else if self.eat(SyntaxKind::Minus) {
            self.eat(SyntaxKind::Question);
            Some(ModifierOp::Remove)
        } else if self.eat(SyntaxKind::Question) {
            Some(ModifierOp::Add)
        } else {
            None
        };
        if !self.eat(SyntaxKind::Colon) {
            return None;
        }
        let value = Box::new(self.parse_type());
        self.eat(SyntaxKind::Semicolon);
        if !self.eat(SyntaxKind::CloseBrace) {
            return None;
        }
        Some(TypeNode::Mapped(MappedTypeNode { type_param, key_source, name_type, value, optional_modifier, readonly_modifier }))
    }

    fn parse_template_literal_type(&mut self) -> TypeNode {
        let mut quasis = Vec::new();
        let mut types = Vec::new();
        let first = self.advance();
        let (c, _) = match first.literal { Some(ScanLiteral::Template(c, r)) => (c, r), _ => (String::new(), String::new()) };
        quasis.push(c);
        if first.kind == SyntaxKind::NoSubstitutionTemplateLiteral {
            return TypeNode::TemplateLiteral { quasis, types };
        }
        loop {
            types.push(self.parse_type());
            if !(self.check(SyntaxKind::TemplateMiddle) || self.check(SyntaxKind::TemplateTail)) {
                self.error(&diagnostics::UNTERMINATED_TEMPLATE_LITERAL_1003, &[]);
                break;
            }
            let tok = self.advance();
            let is_tail = tok.kind == SyntaxKind::TemplateTail;
            let (c, _) = match tok.literal { Some(ScanLiteral::Template(c, r)) => (c, r), _ => (String::new(), String::new()) };
            quasis.push(c);
            if is_tail {
                break;
            }
        }
        TypeNode::TemplateLiteral { quasis, types }
    }
}

fn keyword_type_for(name: &str) -> Option<KeywordType> {
    Some(match name {
        "any" => KeywordType::Any,
        "unknown" => KeywordType::Unknown,
        "never" => KeywordType::Never,
        "void" => KeywordType::Void,
        "string" => KeywordType::String,
        "number" => KeywordType::Number,
        "boolean" => KeywordType::Boolean,
        "bigint" => KeywordType::BigInt,
        "symbol" => KeywordType::Symbol,
        "object" => KeywordType::Object,
        "null" => KeywordType::Null,
        "undefined" => KeywordType::Undefined,
        _ => return None,
    })
}

fn assign_op_for(kind: SyntaxKind) -> Option<AssignOp> {
    use SyntaxKind::*;
    Some(match kind {
        Equals => AssignOp::Assign,
        PlusEquals => AssignOp::AddAssign,
        MinusEquals => AssignOp::SubAssign,
        AsteriskEquals => AssignOp::MulAssign,
        SlashEquals => AssignOp::DivAssign,
        PercentEquals => AssignOp::ModAssign,
        AsteriskAsteriskEquals => AssignOp::PowAssign,
        LessThanLessThanEquals => AssignOp::ShlAssign,
        GreaterThanGreaterThanEquals => AssignOp::ShrAssign,
        GreaterThanGreaterThanGreaterThanEquals => AssignOp::UShrAssign,
        AmpersandEquals => AssignOp::BitAndAssign,
        BarEquals => AssignOp::BitOrAssign,
        CaretEquals => AssignOp::BitXorAssign,
        AmpersandAmpersandEquals => AssignOp::AndAssign,
        BarBarEquals => AssignOp::OrAssign,
        QuestionQuestionEquals => AssignOp::NullishAssign,
        _ => return None,
    })
}

enum InfixKind {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Binding powers, lowest to highest (spec §4.2 "precedence climbs from the
/// assignment level down to primary" — this table covers everything below
/// assignment and the ternary).
fn infix_binding_power(kind: SyntaxKind) -> Option<(u8, InfixKind)> {
    use SyntaxKind::*;
    Some(match kind {
        BarBar => (1, InfixKind::Logical(LogicalOp::Or)),
        QuestionQuestion => (1, InfixKind::Logical(LogicalOp::Nullish)),
        AmpersandAmpersand => (2, InfixKind::Logical(LogicalOp::And)),
        Bar => (3, InfixKind::Binary(BinaryOp::BitOr)),
        Caret => (4, InfixKind::Binary(BinaryOp::BitXor)),
        Ampersand => (5, InfixKind::Binary(BinaryOp::BitAnd)),
        EqualsEquals => (6, InfixKind::Binary(BinaryOp::Eq)),
        ExclamationEquals => (6, InfixKind::Binary(BinaryOp::NotEq)),
        EqualsEqualsEquals => (6, InfixKind::Binary(BinaryOp::StrictEq)),
        ExclamationEqualsEquals => (6, InfixKind::Binary(BinaryOp::StrictNotEq)),
        LessThan => (7, InfixKind::Binary(BinaryOp::Lt)),
        GreaterThan => (7, InfixKind::Binary(BinaryOp::Gt)),
        LessThanEquals => (7, InfixKind::Binary(BinaryOp::LtEq)),
        GreaterThanEquals => (7, InfixKind::Binary(BinaryOp::GtEq)),
        InKeyword => (7, InfixKind::Binary(BinaryOp::In)),
        InstanceOfKeyword => (7, InfixKind::Binary(BinaryOp::InstanceOf)),
        LessThanLessThan => (8, InfixKind::Binary(BinaryOp::Shl)),
        GreaterThanGreaterThan => (8, InfixKind::Binary(BinaryOp::Shr)),
        GreaterThanGreaterThanGreaterThan => (8, InfixKind::Binary(BinaryOp::UShr)),
        Plus => (9, InfixKind::Binary(BinaryOp::Add)),
        Minus => (9, InfixKind::Binary(BinaryOp::Sub)),
        Asterisk => (10, InfixKind::Binary(BinaryOp::Mul)),
        Slash => (10, InfixKind::Binary(BinaryOp::Div)),
        Percent => (10, InfixKind::Binary(BinaryOp::Mod)),
        AsteriskAsterisk => (11, InfixKind::Binary(BinaryOp::Pow)),
        _ => return None,
    })
}

// ---- destructuring pattern model & desugaring ------------------------------

#[derive(Debug, Clone)]
enum Pattern {
    Ident(String),
    Array(Vec<ArrayPatternElement>),
    Object { props: Vec<ObjectPatternElement>, rest: Option<String> },
}

#[derive(Debug, Clone)]
enum ArrayPatternElement {
    Elision,
    Binding { pattern: Pattern, default: Option<Expr> },
    Rest(Pattern),
}

#[derive(Debug, Clone)]
struct ObjectPatternElement {
    key: String,
    value: Pattern,
    default: Option<Expr>,
}

fn apply_pattern_default(value: Expr, default: Option<Expr>) -> Expr {
    match default {
        None => value,
        Some(d) => {
            let span = value.span;
            Expr {
                span,
                kind: ExprKind::Ternary {
                    cond: Box::new(Expr {
                        span,
                        kind: ExprKind::Binary {
                            op: BinaryOp::StrictEq,
                            left: Box::new(value.clone()),
                            right: Box::new(Expr { span, kind: ExprKind::Literal(LiteralValue::Undefined) }),
                        },
                    }),
                    then: Box::new(d),
                    else_: Box::new(value),
                },
            }
        }
    }
}

fn member_of(object: Expr, name: &str) -> Expr {
    let span = object.span;
    Expr { span, kind: ExprKind::Member { object: Box::new(object), prop: MemberProp::Name(name.to_string()), optional: false } }
}

fn index_of(object: Expr, i: usize) -> Expr {
    let span = object.span;
    Expr { span, kind: ExprKind::Index { object: Box::new(object), index: Box::new(Expr { span, kind: ExprKind::Literal(LiteralValue::Number(i as f64)) }), optional: false } }
}

fn call_method(object: Expr, method: &str, args: Vec<Expr>) -> Expr {
    let span = object.span;
    Expr {
        span,
        kind: ExprKind::Call {
            callee: Box::new(member_of(object, method)),
            type_args: Vec::new(),
            args: args.into_iter().map(ArrayElement::Item).collect(),
            optional: false,
        },
    }
}

/// Desugars a top-level destructuring declarator, preserving its type
/// annotation (if any) on the generated temporary so the initializer is
/// still checked against it (spec §8 scenario 4: `const [x,y]:[string,number]=[...]`).
fn desugar_pattern_binding_annotated(
    pattern: &Pattern,
    source: Expr,
    type_ann: Option<TypeNode>,
    kind: VarKind,
    flags: NodeFlags,
    parser: &mut Parser,
    out: &mut Vec<Stmt>,
) {
    let Some(type_ann) = type_ann else {
        desugar_pattern_binding(pattern, source, kind, flags, parser, out);
        return;
    };
    if let Pattern::Ident(name) = pattern {
        let span = source.span;
        out.push(Stmt {
            span,
            kind: StmtKind::VarDecl(VarDecl { kind, name: name.clone(), type_ann: Some(type_ann), init: Some(source), definite_assignment: false, flags }),
        });
        return;
    }
    // Array/Object patterns already introduce a generated temporary holding
    // `source` as their first emitted statement; attach the annotation there
    // so the initializer is contextually checked against it.
    desugar_pattern_binding(pattern, source, kind, flags, parser, out);
    if let Some(Stmt { kind: StmtKind::VarDecl(decl), .. }) = out.first_mut() {
        decl.type_ann = Some(type_ann);
    }
}

/// Desugars a binding pattern matched against `source` into a flat list of
/// `Var` statements (spec §4.2). A nested pattern introduces its own
/// generated temporary so later siblings can reference the original value
/// without re-evaluating `source`.
fn desugar_pattern_binding(pattern: &Pattern, source: Expr, kind: VarKind, flags: NodeFlags, parser: &mut Parser, out: &mut Vec<Stmt>) {
    match pattern {
        Pattern::Ident(name) => {
            let span = source.span;
            out.push(Stmt {
                span,
                kind: StmtKind::VarDecl(VarDecl { kind, name: name.clone(), type_ann: None, init: Some(source), definite_assignment: false, flags }),
            });
        }
        Pattern::Array(elements) => {
            let temp = parser.next_temp();
            let span = source.span;
            out.push(Stmt { span, kind: StmtKind::VarDecl(VarDecl { kind, name: temp.clone(), type_ann: None, init: Some(source), definite_assignment: false, flags }) });
            let temp_ref = || Expr { span, kind: ExprKind::Ident(temp.clone()) };
            for (i, el) in elements.iter().enumerate() {
                match el {
                    ArrayPatternElement::Elision => {}
                    ArrayPatternElement::Binding { pattern, default } => {
                        let value = apply_pattern_default(index_of(temp_ref(), i), default.clone());
                        desugar_pattern_binding(pattern, value, kind, flags, parser, out);
                    }
                    ArrayPatternElement::Rest(pattern) => {
                        let value = call_method(temp_ref(), "slice", vec![Expr { span, kind: ExprKind::Literal(LiteralValue::Number(i as f64)) }]);
                        desugar_pattern_binding(pattern, value, kind, flags, parser, out);
                    }
                }
            }
        }
        Pattern::Object { props, rest } => {
            let temp = parser.next_temp();
            let span = source.span;
            out.push(Stmt { span, kind: StmtKind::VarDecl(VarDecl { kind, name: temp.clone(), type_ann: None, init: Some(source), definite_assignment: false, flags }) });
            let temp_ref = || Expr { span, kind: ExprKind::Ident(temp.clone()) };
            let mut used_keys = Vec::new();
            for prop in props {
                used_keys.push(prop.key.clone());
                let value = apply_pattern_default(member_of(temp_ref(), &prop.key), prop.default.clone());
                desugar_pattern_binding(&prop.value, value, kind, flags, parser, out);
            }
            if let Some(rest_name) = rest {
                let excluded = Expr {
                    span,
                    kind: ExprKind::Array(
                        used_keys
                            .iter()
                            .map(|k| ArrayElement::Item(Expr { span, kind: ExprKind::Literal(LiteralValue::String(k.clone())) }))
                            .collect(),
                    ),
                };
                let call = Expr {
                    span,
                    kind: ExprKind::Call {
                        callee: Box::new(Expr { span, kind: ExprKind::Ident("__objectRest".to_string()) }),
                        type_args: Vec::new(),
                        args: vec![ArrayElement::Item(temp_ref()), ArrayElement::Item(excluded)],
                        optional: false,
                    },
                };
                out.push(Stmt { span, kind: StmtKind::VarDecl(VarDecl { kind, name: rest_name.clone(), type_ann: None, init: Some(call), definite_assignment: false, flags }) });
            }
        }
    }
}

/// Expands `namespace A.B.C { ... }` into nested single-segment namespaces
/// (spec §4.2), innermost-first.
fn nest_namespace(mut segments: Vec<String>, body: Vec<Stmt>) -> NamespaceDecl {
    let last = segments.pop().expect("at least one segment");
    if segments.is_empty() {
        return NamespaceDecl { name: last, body };
    }
    let inner = nest_namespace(segments, body);
    let span = Span::new(0, 0, 0);
    NamespaceDecl { name: last, body: vec![Stmt { span, kind: StmtKind::NamespaceDecl(Rc::new(inner)) }] }
}

/// Desugars constructor parameter-properties into field declarations plus
/// prepended `this.x = x` assignments (spec §4.2).
fn expand_parameter_properties(mut members: Vec<ClassMember>) -> Vec<ClassMember> {
    let mut extra_fields = Vec::new();
    for member in members.iter_mut() {
        if let ClassMember::Constructor { params, body, .. } = member {
            let mut assigns = Vec::new();
            for param in params.iter() {
                if let Some(modifiers) = param.property_modifiers {
                    let span = Span::new(0, 0, 0);
                    extra_fields.push(ClassMember::Field { name: param.name.clone(), type_ann: param.type_ann.clone(), init: None, modifiers, is_private_name: false });
                    let assign = Expr {
                        span,
                        kind: ExprKind::Assign {
                            op: AssignOp::Assign,
                            target: Box::new(member_of(Expr { span, kind: ExprKind::This }, &param.name)),
                            value: Box::new(Expr { span, kind: ExprKind::Ident(param.name.clone()) }),
                        },
                    };
                    assigns.push(Stmt { span, kind: StmtKind::Expr(assign) });
                }
            }
            if let Some(b) = body {
                let mut new_body = assigns;
                new_body.append(b);
                *b = new_body;
            }
        }
    }
    members.extend(extra_fields);
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::scanner::Scanner;

    fn parse(src: &str) -> (Program, Vec<ParseError>) {
        let (tokens, scan_errors) = Scanner::new(src).scan_all();
        assert!(scan_errors.is_empty(), "unexpected scan errors: {:?}", scan_errors);
        parse_program(tokens)
    }

    #[test]
    fn parses_simple_var_decl() {
        let (program, errors) = parse("let x: number = 1;");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(program.body.len(), 1);
        match &program.body[0].kind {
            StmtKind::VarDecl(decl) => {
                assert_eq!(decl.name, "x");
                assert_eq!(decl.kind, VarKind::Let);
            }
            other => panic!("expected var decl, got {:?}", other),
        }
    }

    #[test]
    fn parses_arrow_function_with_generic() {
        let (program, errors) = parse("const id = <T,>(x: T): T => x;");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn desugars_classic_for_loop_into_while() {
        let (program, errors) = parse("for (let i = 0; i < 10; i++) { sum += i; }");
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::Block(stmts) => {
                assert_eq!(stmts.len(), 2);
                assert!(matches!(stmts[1].kind, StmtKind::While { .. }));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn desugars_array_destructuring() {
        let (program, errors) = parse("let [a, b] = pair;");
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::Sequence(stmts) => assert_eq!(stmts.len(), 3),
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn array_destructuring_keeps_its_type_annotation_on_the_temporary() {
        let (program, errors) = parse(r#"const [x, y]: [string, number] = ["a", 1];"#);
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::Sequence(stmts) => {
                assert_eq!(stmts.len(), 3);
                match &stmts[0].kind {
                    StmtKind::VarDecl(decl) => assert!(decl.type_ann.is_some()),
                    other => panic!("expected the generated temporary's var decl, got {:?}", other),
                }
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn parses_interface_with_call_signature() {
        let (program, errors) = parse("interface Fn { (x: number): number; prop: string; }");
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::InterfaceDecl(decl) => assert_eq!(decl.members.len(), 2),
            other => panic!("expected interface decl, got {:?}", other),
        }
    }

    #[test]
    fn parses_mapped_type_alias() {
        let (program, errors) = parse("type Partial2<T> = { [K in keyof T]?: T[K] };");
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::TypeAliasDecl(decl) => assert!(matches!(decl.ty, TypeNode::Mapped(_))),
            other => panic!("expected type alias, got {:?}", other),
        }
    }

    #[test]
    fn expands_dotted_namespace() {
        let (program, errors) = parse("namespace A.B { export const x = 1; }");
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::NamespaceDecl(decl) => {
                assert_eq!(decl.name, "A");
                match &decl.body[0].kind {
                    StmtKind::NamespaceDecl(inner) => assert_eq!(inner.name, "B"),
                    other => panic!("expected nested namespace, got {:?}", other),
                }
            }
            other => panic!("expected namespace decl, got {:?}", other),
        }
    }

    #[test]
    fn parameter_properties_generate_field_and_assignment() {
        let (program, errors) = parse("class Point { constructor(public x: number) {} }");
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.body[0].kind {
            StmtKind::ClassDecl(decl) => {
                assert!(decl.members.iter().any(|m| matches!(m, ClassMember::Field { name, .. } if name == "x")));
                let ClassMember::Constructor { body, .. } = decl.members.iter().find(|m| matches!(m, ClassMember::Constructor { .. })).unwrap() else { unreachable!() };
                assert_eq!(body.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected class decl, got {:?}", other),
        }
    }
}
