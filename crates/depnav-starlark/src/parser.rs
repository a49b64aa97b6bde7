//! Recursive-descent parser producing an arena-allocated AST.
//!
//! One token of lookahead, all node allocations in a caller-provided arena.
//! The parser is forgiving: a syntax error produces a diagnostic line in the
//! error buffer, records the offending token, raises the error flag, and
//! [`Parser::parse`] still returns the best partial statement list built so
//! far. Nothing panics on malformed input; whole-codebase surveys must
//! survive broken files.
//!
//! Grammar sketch:
//!
//! ```text
//! file        := { statement }              (toplevel strings are ignored)
//! statement   := identifier '=' expression
//!              | identifier postfix-chain  (must start a call or attribute)
//! expression  := ternary
//! ternary     := comparison [ 'if' comparison [ 'else' expression ] ]
//! comparison  := additive { ('=='|'!='|'<'|'<='|'>'|'>='|'in'|'not in') additive }
//! additive    := multiplicative { ('+'|'-') multiplicative }
//! multiplicative := unary { ('*'|'/'|'%') unary }
//! unary       := ('not'|'!') unary | postfix
//! postfix     := value { '.' value | '[' expression ']' }
//! value       := string | number | identifier [ '(' args ')' ]
//!              | '[' listbody ']' | '{' mapbody '}' | '(' tuple-or-paren ')'
//! ```
//!
//! List, map and tuple bodies promote to comprehensions when `for` follows
//! the first element.

use std::fmt::Write;

use crate::arena::{ArenaDeque, NodeId};
use crate::ast::{
    Assignment, BinOp, Comprehension, FunCall, Identifier, IntScalar, List, ListKind, Node,
    NodeArena, StringScalar, Ternary, UnaryExpr,
};
use crate::line_map::LineColumnMap;
use crate::scanner::{Scanner, Token, TokenKind};

fn is_comparison_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Equals
            | TokenKind::NotEquals
            | TokenKind::LessThan
            | TokenKind::LessEqual
            | TokenKind::GreaterThan
            | TokenKind::GreaterEqual
            | TokenKind::In
            | TokenKind::NotIn
    )
}

pub struct Parser<'a, 'ar> {
    scanner: Scanner<'a>,
    arena: &'ar mut NodeArena,
    filename: String,
    errors: String,
    error: bool,
    last_token: Option<Token<'a>>,
}

impl<'a, 'ar> Parser<'a, 'ar> {
    /// Create a parser reading tokens from `scanner` and allocating nodes
    /// from `arena`. `filename` is only used to prefix diagnostics.
    pub fn new(scanner: Scanner<'a>, arena: &'ar mut NodeArena, filename: &str) -> Self {
        Parser {
            scanner,
            arena,
            filename: filename.to_string(),
            errors: String::new(),
            error: false,
            last_token: None,
        }
    }

    /// Parse the file; the returned node is a list of statements. On error
    /// this is the partial tree built up to the point of failure.
    pub fn parse(&mut self) -> NodeId {
        let mut statements = ArenaDeque::new();
        while !self.error {
            let token = self.scanner.next();
            match token.kind {
                TokenKind::Eof => {
                    self.last_token = Some(token);
                    break;
                }
                // Pythonism: a toplevel string is a no-effect docstring.
                TokenKind::StringLiteral | TokenKind::RawStringLiteral => continue,
                TokenKind::Identifier => {
                    let after = self.scanner.peek();
                    let statement = match after.kind {
                        TokenKind::Assign => {
                            self.scanner.next();
                            let target = self.alloc_identifier(token);
                            self.parse_assignment_rhs(target)
                        }
                        TokenKind::OpenParen | TokenKind::Dot => self.parse_statement_expr(token),
                        _ => {
                            self.error_at(after, "expected '(' or '='");
                            None
                        }
                    };
                    if let Some(statement) = statement {
                        statements.push(statement);
                    }
                }
                _ => {
                    self.error_at(token, "expected identifier");
                    break;
                }
            }
        }
        self.arena.alloc(Node::List(List {
            kind: ListKind::List,
            items: statements,
        }))
    }

    /// Whether any diagnostic was issued.
    pub fn parse_error(&self) -> bool {
        self.error
    }

    /// The error token, or `Eof` after a clean parse.
    pub fn last_token(&self) -> Option<Token<'a>> {
        self.last_token
    }

    /// Diagnostics collected so far, one `file:pos 'token' message` per line.
    pub fn errors(&self) -> &str {
        &self.errors
    }

    /// Consume the parser, releasing the scanner's line map and the
    /// collected diagnostics for storage alongside the AST.
    pub fn into_parts(self) -> (LineColumnMap, String) {
        (self.scanner.into_line_map(), self.errors)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.arena.alloc(node)
    }

    fn alloc_identifier(&mut self, token: Token<'a>) -> NodeId {
        self.alloc(Node::Identifier(Identifier { span: token.span }))
    }

    fn alloc_string(&mut self, token: Token<'a>) -> NodeId {
        let is_raw = token.kind == TokenKind::RawStringLiteral;
        self.alloc(Node::Str(StringScalar::from_literal(
            token.span, token.text, is_raw,
        )))
    }

    fn error_at(&mut self, token: Token<'a>, message: &str) {
        let range = self.scanner.line_map().range(token.span);
        let _ = writeln!(
            self.errors,
            "{}:{} '{}' {}",
            self.filename, range, token.text, message
        );
        self.error = true;
        self.last_token = Some(token);
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token<'a>> {
        let token = self.scanner.next();
        if token.kind != kind {
            self.error_at(token, message);
            return None;
        }
        Some(token)
    }

    /// `=` already consumed; the value may be missing on error, which still
    /// yields an assignment node for the partial tree.
    fn parse_assignment_rhs(&mut self, target: NodeId) -> Option<NodeId> {
        let value = self.parse_expression();
        Some(self.alloc(Node::Assignment(Assignment { target, value })))
    }

    /// Statement starting with an identifier whose lookahead is `(` or `.`:
    /// a function call, possibly reached through an attribute chain.
    fn parse_statement_expr(&mut self, identifier: Token<'a>) -> Option<NodeId> {
        let node = if self.scanner.peek().kind == TokenKind::OpenParen {
            self.scanner.next();
            self.parse_funcall(identifier)?
        } else {
            self.alloc_identifier(identifier)
        };
        self.parse_postfix_suffix(node)
    }

    /// Opening `(` already consumed.
    fn parse_funcall(&mut self, identifier: Token<'a>) -> Option<NodeId> {
        let name = self.alloc_identifier(identifier);
        let args = self.parse_list_body(ListKind::Tuple, TokenKind::CloseParen)?;
        Some(self.alloc(Node::FunCall(FunCall { name, args })))
    }

    fn parse_expression(&mut self) -> Option<NodeId> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Option<NodeId> {
        let positive = self.parse_comparison()?;
        if self.scanner.peek().kind != TokenKind::If {
            return Some(positive);
        }
        self.scanner.next();
        let condition = self.parse_comparison()?;
        let negative = if self.scanner.peek().kind == TokenKind::Else {
            self.scanner.next();
            Some(self.parse_expression()?)
        } else {
            None
        };
        Some(self.alloc(Node::Ternary(Ternary {
            positive,
            condition,
            negative,
        })))
    }

    fn parse_comparison(&mut self) -> Option<NodeId> {
        let mut left = self.parse_additive()?;
        while is_comparison_op(self.scanner.peek().kind) {
            let op = self.scanner.next().kind;
            let right = self.parse_additive()?;
            left = self.alloc(Node::BinOp(BinOp { op, left, right }));
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<NodeId> {
        let mut left = self.parse_multiplicative()?;
        while matches!(
            self.scanner.peek().kind,
            TokenKind::Plus | TokenKind::Minus
        ) {
            let op = self.scanner.next().kind;
            let right = self.parse_multiplicative()?;
            left = self.alloc(Node::BinOp(BinOp { op, left, right }));
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<NodeId> {
        let mut left = self.parse_unary()?;
        while matches!(
            self.scanner.peek().kind,
            TokenKind::Multiply | TokenKind::Divide | TokenKind::Percent
        ) {
            let op = self.scanner.next().kind;
            let right = self.parse_unary()?;
            left = self.alloc(Node::BinOp(BinOp { op, left, right }));
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<NodeId> {
        if self.scanner.peek().kind == TokenKind::Not {
            self.scanner.next();
            let operand = self.parse_unary()?;
            return Some(self.alloc(Node::Unary(UnaryExpr {
                op: TokenKind::Not,
                operand,
            })));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<NodeId> {
        let node = self.parse_value()?;
        self.parse_postfix_suffix(node)
    }

    /// Attribute chains and index accesses binding tightest:
    /// `"s".format(x)`, `conf["key"]`.
    fn parse_postfix_suffix(&mut self, mut node: NodeId) -> Option<NodeId> {
        loop {
            match self.scanner.peek().kind {
                TokenKind::Dot => {
                    self.scanner.next();
                    let right = self.parse_value()?;
                    node = self.alloc(Node::BinOp(BinOp {
                        op: TokenKind::Dot,
                        left: node,
                        right,
                    }));
                }
                TokenKind::OpenSquare => {
                    self.scanner.next();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::CloseSquare, "expected ']' after index")?;
                    node = self.alloc(Node::BinOp(BinOp {
                        op: TokenKind::OpenSquare,
                        left: node,
                        right: index,
                    }));
                }
                _ => return Some(node),
            }
        }
    }

    fn parse_value(&mut self) -> Option<NodeId> {
        let token = self.scanner.next();
        match token.kind {
            TokenKind::StringLiteral | TokenKind::RawStringLiteral => {
                Some(self.alloc_string(token))
            }
            TokenKind::NumberLiteral => self.parse_int_from_token(token),
            TokenKind::Identifier => {
                if self.scanner.peek().kind == TokenKind::OpenParen {
                    self.scanner.next();
                    return self.parse_funcall(token);
                }
                Some(self.alloc_identifier(token))
            }
            TokenKind::OpenSquare => self.parse_list_body(ListKind::List, TokenKind::CloseSquare),
            TokenKind::OpenBrace => self.parse_list_body(ListKind::Map, TokenKind::CloseBrace),
            TokenKind::OpenParen => self.parse_tuple_or_paren(),
            _ => {
                self.error_at(token, "expected value of sorts");
                None
            }
        }
    }

    /// Number tokens may carry a fractional tail (`3.14`); the value is the
    /// leading integer run. Only an unparseable run (overflow, no digits)
    /// is a diagnostic.
    fn parse_int_from_token(&mut self, token: Token<'a>) -> Option<NodeId> {
        let digits_end = token
            .text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.text.len());
        match token.text[..digits_end].parse::<i64>() {
            Ok(value) => Some(self.alloc(Node::Int(IntScalar {
                value,
                span: token.span,
            }))),
            Err(_) => {
                self.error_at(token, "error parsing int literal");
                None
            }
        }
    }

    fn parse_list_element(&mut self, kind: ListKind) -> Option<NodeId> {
        match kind {
            ListKind::Map => self.parse_map_entry(),
            ListKind::List | ListKind::Tuple => self.parse_value_or_assignment(),
        }
    }

    /// An element that may be a keyword argument: `identifier = expression`.
    /// (Only meaningful in call argument lists, but harmless elsewhere.)
    fn parse_value_or_assignment(&mut self) -> Option<NodeId> {
        let value = self.parse_expression()?;
        if matches!(self.arena[value], Node::Identifier(_))
            && self.scanner.peek().kind == TokenKind::Assign
        {
            self.scanner.next();
            return self.parse_assignment_rhs(value);
        }
        Some(value)
    }

    /// `key : expression`; keys are literals or identifiers.
    fn parse_map_entry(&mut self) -> Option<NodeId> {
        let token = self.scanner.next();
        let key = match token.kind {
            TokenKind::StringLiteral | TokenKind::RawStringLiteral => self.alloc_string(token),
            TokenKind::NumberLiteral => self.parse_int_from_token(token)?,
            TokenKind::Identifier => self.alloc_identifier(token),
            _ => {
                self.error_at(token, "expected literal or identifier as map key");
                return None;
            }
        };
        self.expect(TokenKind::Colon, "expected ':' in map entry")?;
        let value = self.parse_expression()?;
        Some(self.alloc(Node::BinOp(BinOp {
            op: TokenKind::Colon,
            left: key,
            right: value,
        })))
    }

    /// Comma-separated body up to `end`, trailing comma permitted. If the
    /// first element is followed by `for`, the whole body is a
    /// comprehension instead.
    fn parse_list_body(&mut self, kind: ListKind, end: TokenKind) -> Option<NodeId> {
        let mut items = ArenaDeque::new();
        if self.scanner.peek().kind == end {
            self.scanner.next();
            return Some(self.alloc(Node::List(List { kind, items })));
        }

        match self.parse_list_element(kind) {
            Some(first) => {
                if self.scanner.peek().kind == TokenKind::For {
                    return self.parse_comprehension(kind, first, end);
                }
                items.push(first);
                loop {
                    let upcoming = self.scanner.peek();
                    if upcoming.kind == end {
                        self.scanner.next();
                        break;
                    }
                    if upcoming.kind != TokenKind::Comma {
                        let token = self.scanner.next();
                        self.error_at(token, "expected ',' or closing delimiter");
                        break;
                    }
                    self.scanner.next();
                    if self.scanner.peek().kind == end {
                        self.scanner.next(); // trailing comma
                        break;
                    }
                    match self.parse_list_element(kind) {
                        Some(element) => {
                            items.push(element);
                        }
                        None => break,
                    }
                }
            }
            None => {
                // Keep whatever was parsed before the failing element.
            }
        }
        Some(self.alloc(Node::List(List { kind, items })))
    }

    /// `for` is the lookahead; `pattern` is the already-parsed first element.
    fn parse_comprehension(&mut self, kind: ListKind, pattern: NodeId, end: TokenKind) -> Option<NodeId> {
        self.scanner.next(); // 'for'
        let mut variables = ArenaDeque::new();
        loop {
            let token = self.scanner.next();
            if token.kind != TokenKind::Identifier {
                self.error_at(token, "expected identifier as comprehension variable");
                return None;
            }
            let variable = self.alloc_identifier(token);
            variables.push(variable);
            if self.scanner.peek().kind != TokenKind::Comma {
                break;
            }
            self.scanner.next();
        }
        let variables = self.alloc(Node::List(List {
            kind: ListKind::List,
            items: variables,
        }));
        self.expect(TokenKind::In, "expected 'in' in comprehension")?;
        let source = self.parse_expression()?;
        self.expect(end, "expected closing delimiter after comprehension")?;
        Some(self.alloc(Node::Comprehension(Comprehension {
            kind,
            pattern,
            variables,
            source,
        })))
    }

    /// Opening `(` already consumed. `()` is the empty tuple; a single
    /// expression without trailing comma is just a parenthesised
    /// expression; a comma makes it a tuple.
    fn parse_tuple_or_paren(&mut self) -> Option<NodeId> {
        if self.scanner.peek().kind == TokenKind::CloseParen {
            self.scanner.next();
            return Some(self.alloc(Node::List(List {
                kind: ListKind::Tuple,
                items: ArenaDeque::new(),
            })));
        }
        let first = self.parse_expression()?;
        let upcoming = self.scanner.peek();
        match upcoming.kind {
            TokenKind::CloseParen => {
                self.scanner.next();
                Some(first) // parenthesised expression, not a tuple
            }
            TokenKind::Comma => {
                self.scanner.next();
                let mut items = ArenaDeque::new();
                items.push(first);
                loop {
                    if self.scanner.peek().kind == TokenKind::CloseParen {
                        self.scanner.next();
                        break;
                    }
                    match self.parse_value_or_assignment() {
                        Some(element) => {
                            items.push(element);
                        }
                        None => break,
                    }
                    let upcoming = self.scanner.peek();
                    if upcoming.kind == TokenKind::Comma {
                        self.scanner.next();
                    } else if upcoming.kind == TokenKind::CloseParen {
                        self.scanner.next();
                        break;
                    } else {
                        let token = self.scanner.next();
                        self.error_at(token, "expected ',' or ')' in tuple");
                        break;
                    }
                }
                Some(self.alloc(Node::List(List {
                    kind: ListKind::Tuple,
                    items,
                })))
            }
            TokenKind::For => self.parse_comprehension(ListKind::Tuple, first, TokenKind::CloseParen),
            _ => {
                let token = self.scanner.next();
                self.error_at(token, "expected ')' after expression");
                Some(first)
            }
        }
    }
}
