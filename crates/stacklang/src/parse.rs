//! Lexer and recursive-descent parser producing the [`SyntaxTree`].
//!
//! Syntax errors never stop the parse: each one is recorded, the parser resyncs at
//! the next statement boundary and carries on, so a single run reports every
//! error in the file. The compiler is only invoked when the batch is empty.

use std::{borrow::Cow, fmt};

use crate::{
    expressions::{Expr, ExprLoc, ForClauses, Identifier, Literal, Node, Operator, SyntaxTree, UnaryOperator},
    types::Type,
};

/// Maximum nesting depth of expressions and statements.
/// Keeps the recursive parser and compiler well clear of the native stack limit.
#[cfg(not(debug_assertions))]
pub const MAX_NESTING_DEPTH: u16 = 200;
/// Debug builds have much larger stack frames, so the limit is lower.
#[cfg(debug_assertions)]
pub const MAX_NESTING_DEPTH: u16 = 64;

/// A position in source code, 1-indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl CodeLoc {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Source range of a token or syntax tree node.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct CodeRange {
    start: CodeLoc,
    end: CodeLoc,
}

/// Custom Debug implementation to make displaying code much less verbose.
impl fmt::Debug for CodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

impl CodeRange {
    #[must_use]
    pub const fn new(start: CodeLoc, end: CodeLoc) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn start(&self) -> CodeLoc {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> CodeLoc {
        self.end
    }

    /// Returns a new `CodeRange` spanning from this range's start to `other`'s end.
    #[must_use]
    pub(crate) fn to(self, other: Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
        }
    }
}

/// A syntax error with the location it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub msg: Cow<'static, str>,
    pub position: CodeRange,
}

impl ParseError {
    pub(crate) fn syntax(msg: impl Into<Cow<'static, str>>, position: CodeRange) -> Self {
        Self {
            msg: msg.into(),
            position,
        }
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.position.start.line
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error at line {} {}", self.line(), self.msg)
    }
}

impl std::error::Error for ParseError {}

/// Parses a whole source file.
///
/// Returns every syntax error found when the source is malformed.
pub fn parse(code: &str) -> Result<SyntaxTree, Vec<ParseError>> {
    let (tokens, mut errors) = Lexer::new(code).tokenize();
    let mut parser = Parser::new(tokens);
    let tree = parser.parse_program();
    errors.append(&mut parser.errors);
    if errors.is_empty() {
        Ok(tree)
    } else {
        errors.sort_by_key(|e| (e.position.start.line, e.position.start.column));
        Err(errors)
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    Ident(String),
    Type(Type),
    True,
    False,
    Read,
    Write,
    If,
    Else,
    While,
    For,
    Semi,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Lt,
    Gt,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Cow<'_, str> = match self {
            Self::IntLit(i) => i.to_string().into(),
            Self::FloatLit(v) => v.to_string().into(),
            Self::StrLit(s) => format!("\"{s}\"").into(),
            Self::Ident(name) => name.as_str().into(),
            Self::Type(ty) => ty.name().into(),
            Self::True => "true".into(),
            Self::False => "false".into(),
            Self::Read => "read".into(),
            Self::Write => "write".into(),
            Self::If => "if".into(),
            Self::Else => "else".into(),
            Self::While => "while".into(),
            Self::For => "for".into(),
            Self::Semi => ";".into(),
            Self::Comma => ",".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
            Self::LBrace => "{".into(),
            Self::RBrace => "}".into(),
            Self::Assign => "=".into(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Star => "*".into(),
            Self::Slash => "/".into(),
            Self::Percent => "%".into(),
            Self::Dot => ".".into(),
            Self::Lt => "<".into(),
            Self::Gt => ">".into(),
            Self::EqEq => "==".into(),
            Self::NotEq => "!=".into(),
            Self::AndAnd => "&&".into(),
            Self::OrOr => "||".into(),
            Self::Bang => "!".into(),
            Self::Eof => "<EOF>".into(),
        };
        f.write_str(&s)
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: CodeRange,
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: u32,
    column: u32,
    errors: Vec<ParseError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    fn loc(&self) -> CodeLoc {
        CodeLoc::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Unconsumed source text.
    fn rest(&mut self) -> &'a str {
        let src = self.src;
        let offset = self.chars.peek().map_or(src.len(), |&(i, _)| i);
        &src[offset..]
    }

    fn tokenize(mut self) -> (Vec<Token>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.loc();
            let Some((_, c)) = self.bump() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    position: CodeRange::new(start, start),
                });
                break;
            };
            if let Some(kind) = self.lex_token(c, start) {
                tokens.push(Token {
                    kind,
                    position: CodeRange::new(start, self.loc()),
                });
            }
        }
        (tokens, self.errors)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.rest().starts_with("//") => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    /// Lexes the token starting with `c`; `None` after recording an error.
    fn lex_token(&mut self, c: char, start: CodeLoc) -> Option<TokenKind> {
        let kind = match c {
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '.' => TokenKind::Dot,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '=' if self.eat_char('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '!' if self.eat_char('=') => TokenKind::NotEq,
            '!' => TokenKind::Bang,
            '&' if self.eat_char('&') => TokenKind::AndAnd,
            '|' if self.eat_char('|') => TokenKind::OrOr,
            '"' => return self.lex_string(start),
            c if c.is_ascii_digit() => return self.lex_number(c, start),
            c if c.is_ascii_alphabetic() => return Some(self.lex_word(c)),
            other => {
                self.error(format!("token recognition error at: '{other}'"), start);
                return None;
            }
        };
        Some(kind)
    }

    fn lex_string(&mut self, start: CodeLoc) -> Option<TokenKind> {
        let mut contents = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.bump();
                    return Some(TokenKind::StrLit(contents));
                }
                Some('\n') | None => {
                    self.error(format!("token recognition error at: '\"{contents}'"), start);
                    return None;
                }
                Some(c) => {
                    contents.push(c);
                    self.bump();
                }
            }
        }
    }

    fn lex_number(&mut self, first: char, start: CodeLoc) -> Option<TokenKind> {
        let mut text = String::from(first);
        self.take_digits(&mut text);

        // a '.' only belongs to the number when digits follow, otherwise it is concatenation
        let is_float = {
            let mut rest_chars = self.rest().chars();
            rest_chars.next() == Some('.') && rest_chars.next().is_some_and(|c| c.is_ascii_digit())
        };
        if is_float {
            self.bump();
            text.push('.');
            self.take_digits(&mut text);
            return match text.parse() {
                Ok(v) => Some(TokenKind::FloatLit(v)),
                Err(_) => {
                    self.error(format!("invalid float literal '{text}'"), start);
                    None
                }
            };
        }
        match text.parse() {
            Ok(v) => Some(TokenKind::IntLit(v)),
            Err(_) => {
                self.error(format!("integer literal '{text}' is too large"), start);
                None
            }
        }
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek_char().filter(char::is_ascii_digit) {
            text.push(c);
            self.bump();
        }
    }

    fn lex_word(&mut self, first: char) -> TokenKind {
        let mut word = String::from(first);
        while let Some(c) = self.peek_char().filter(char::is_ascii_alphanumeric) {
            word.push(c);
            self.bump();
        }
        match word.as_str() {
            "int" => TokenKind::Type(Type::Int),
            "float" => TokenKind::Type(Type::Float),
            "bool" => TokenKind::Type(Type::Bool),
            "string" => TokenKind::Type(Type::Str),
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "read" => TokenKind::Read,
            "write" => TokenKind::Write,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            _ => TokenKind::Ident(word),
        }
    }

    fn error(&mut self, msg: String, start: CodeLoc) {
        let end = self.loc();
        self.errors.push(ParseError::syntax(msg, CodeRange::new(start, end)));
    }
}

// ============================================================================
// Parser
// ============================================================================

type PResult<T> = Result<T, ParseError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u16,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> &Token {
        // the lexer always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{kind}'")))
        }
    }

    fn unexpected(&self, expecting: &str) -> ParseError {
        let token = self.peek();
        ParseError::syntax(
            format!("mismatched input '{}' expecting {expecting}", token.kind),
            token.position,
        )
    }

    fn enter(&mut self) -> PResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::syntax("too many nested statements or expressions", self.peek().position));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_program(&mut self) -> SyntaxTree {
        let mut body = Vec::new();
        while !self.at(&TokenKind::Eof) {
            if self.at(&TokenKind::RBrace) {
                let token = self.advance();
                self.errors
                    .push(ParseError::syntax("extraneous input '}'", token.position));
                continue;
            }
            if let Some(node) = self.statement_or_recover() {
                body.push(node);
            }
        }
        SyntaxTree { body }
    }

    /// Parses a statement, on failure records the error and skips to the next boundary.
    fn statement_or_recover(&mut self) -> Option<Node> {
        let start = self.pos;
        match self.statement() {
            Ok(node) => Some(node),
            Err(err) => {
                self.errors.push(err);
                self.synchronize(start);
                None
            }
        }
    }

    /// Skips past the next `;`, or up to (not past) a `}` or the end of input.
    fn synchronize(&mut self, start: usize) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::RBrace if self.pos > start => return,
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn statement(&mut self) -> PResult<Node> {
        self.enter()?;
        let node = self.statement_inner();
        self.leave();
        node
    }

    fn statement_inner(&mut self) -> PResult<Node> {
        match self.peek().kind.clone() {
            TokenKind::Semi => {
                self.advance();
                Ok(Node::Empty)
            }
            TokenKind::Type(ty) => {
                self.advance();
                let names = self.identifier_list()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Node::Declare { ty, names })
            }
            TokenKind::Read => {
                self.advance();
                let targets = self.identifier_list()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Node::Read { targets })
            }
            TokenKind::Write => {
                self.advance();
                let mut values = vec![self.expression()?];
                while self.eat(&TokenKind::Comma) {
                    values.push(self.expression()?);
                }
                self.expect(&TokenKind::Semi)?;
                Ok(Node::Write { values })
            }
            TokenKind::LBrace => {
                self.advance();
                let mut body = Vec::new();
                while !self.at(&TokenKind::RBrace) {
                    if self.at(&TokenKind::Eof) {
                        return Err(self.unexpected("'}'"));
                    }
                    if let Some(node) = self.statement_or_recover() {
                        body.push(node);
                    }
                }
                self.advance();
                Ok(Node::Block(body))
            }
            TokenKind::If => {
                self.advance();
                let test = self.condition()?;
                let body = Box::new(self.statement()?);
                let or_else = if self.eat(&TokenKind::Else) {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Node::If { test, body, or_else })
            }
            TokenKind::While => {
                self.advance();
                let test = self.condition()?;
                let body = Box::new(self.statement()?);
                Ok(Node::While { test, body })
            }
            TokenKind::For => {
                self.advance();
                let clauses = self.for_clauses()?;
                let body = Box::new(self.statement()?);
                Ok(Node::For { clauses, body })
            }
            _ => {
                let expr = self.expression()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Node::Expr(expr))
            }
        }
    }

    fn identifier_list(&mut self) -> PResult<Vec<Identifier>> {
        let mut names = vec![self.identifier()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.identifier()?);
        }
        Ok(names)
    }

    fn identifier(&mut self) -> PResult<Identifier> {
        let token = self.peek().clone();
        if let TokenKind::Ident(name) = token.kind {
            self.advance();
            Ok(Identifier::new(name, token.position))
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    /// `'(' expr ')'` as used by `if` and `while`.
    fn condition(&mut self) -> PResult<ExprLoc> {
        self.expect(&TokenKind::LParen)?;
        let test = self.expression()?;
        self.expect(&TokenKind::RParen)?;
        Ok(test)
    }

    /// `'(' expr? ';' expr? ';' expr? ')'`
    fn for_clauses(&mut self) -> PResult<ForClauses> {
        self.expect(&TokenKind::LParen)?;
        let mut clauses = ForClauses::default();
        for (slot, terminator) in [TokenKind::Semi, TokenKind::Semi, TokenKind::RParen]
            .into_iter()
            .enumerate()
        {
            if !self.at(&terminator) {
                if slot == 0 {
                    clauses.first_slot_is_expr = true;
                }
                clauses.exprs.push(self.expression()?);
            }
            self.expect(&terminator)?;
        }
        Ok(clauses)
    }

    fn expression(&mut self) -> PResult<ExprLoc> {
        self.enter()?;
        let expr = self.assignment();
        self.leave();
        expr
    }

    /// Right-associative `target = value`.
    fn assignment(&mut self) -> PResult<ExprLoc> {
        let target = self.binary_level(0)?;
        if self.eat(&TokenKind::Assign) {
            let value = self.expression()?;
            let position = target.position.to(value.position);
            return Ok(ExprLoc::new(
                position,
                Expr::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
            ));
        }
        Ok(target)
    }

    /// Left-associative binary operators, loosest level first.
    fn binary_level(&mut self, level: usize) -> PResult<ExprLoc> {
        const LEVELS: &[&[(TokenKind, Operator)]] = &[
            &[(TokenKind::OrOr, Operator::Or)],
            &[(TokenKind::AndAnd, Operator::And)],
            &[(TokenKind::EqEq, Operator::Eq), (TokenKind::NotEq, Operator::NotEq)],
            &[(TokenKind::Lt, Operator::Lt), (TokenKind::Gt, Operator::Gt)],
            &[
                (TokenKind::Plus, Operator::Add),
                (TokenKind::Minus, Operator::Sub),
                (TokenKind::Dot, Operator::Concat),
            ],
            &[
                (TokenKind::Star, Operator::Mul),
                (TokenKind::Slash, Operator::Div),
                (TokenKind::Percent, Operator::Mod),
            ],
        ];
        let Some(operators) = LEVELS.get(level) else {
            return self.unary();
        };
        let left = self.binary_level(level + 1)?;
        let mut chained = 0;
        let expr = self.binary_chain(left, level, operators, &mut chained);
        self.depth -= chained;
        expr
    }

    /// Folds `left op right op ...` into a left-deep tree.
    ///
    /// Each operator deepens the tree by one, so each counts toward the nesting limit.
    fn binary_chain(
        &mut self,
        mut left: ExprLoc,
        level: usize,
        operators: &[(TokenKind, Operator)],
        chained: &mut u16,
    ) -> PResult<ExprLoc> {
        while let Some(op) = operators
            .iter()
            .find(|(kind, _)| self.at(kind))
            .map(|(_, op)| *op)
        {
            self.enter()?;
            *chained += 1;
            self.advance();
            let right = self.binary_level(level + 1)?;
            let position = left.position.to(right.position);
            left = ExprLoc::new(
                position,
                Expr::Op {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn unary(&mut self) -> PResult<ExprLoc> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Bang => UnaryOperator::Not,
            _ => return self.primary(),
        };
        let start = self.advance().position;
        self.enter()?;
        let operand = self.unary();
        self.leave();
        let operand = operand?;
        Ok(ExprLoc::new(
            start.to(operand.position),
            Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            },
        ))
    }

    fn primary(&mut self) -> PResult<ExprLoc> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::IntLit(i) => Expr::Literal(Literal::Int(i)),
            TokenKind::FloatLit(f) => Expr::Literal(Literal::Float(f)),
            TokenKind::StrLit(s) => Expr::Literal(Literal::Str(s)),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::Ident(name) => Expr::Name(Identifier::new(name, token.position)),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                let close = self.expect(&TokenKind::RParen)?;
                return Ok(ExprLoc::new(
                    token.position.to(close.position),
                    Expr::Paren(Box::new(inner)),
                ));
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(ExprLoc::new(token.position, expr))
    }
}
