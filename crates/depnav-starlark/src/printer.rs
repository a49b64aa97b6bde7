//! Reconstruct source text from an AST.
//!
//! The output is canonical rather than byte-faithful: lists with more than
//! one element go multiline with four-space indent, strings pick their quote
//! character by content, and parentheses are inserted exactly where operand
//! precedence requires them. The invariant that matters is the round trip:
//! re-parsing printed output yields a tree that prints identically.

use crate::arena::NodeId;
use crate::ast::{ListKind, Node, NodeArena};
use crate::scanner::TokenKind;

const INDENT_SPACES: usize = 4;

/// Precedence used when deciding on parentheses, matching the parser's
/// levels. Atoms return `None`: they never need wrapping.
fn node_precedence(arena: &NodeArena, id: NodeId) -> Option<u8> {
    match &arena[id] {
        Node::Ternary(_) => Some(0),
        Node::BinOp(op) => Some(match op.op {
            TokenKind::Dot | TokenKind::OpenSquare => 5,
            TokenKind::Multiply | TokenKind::Divide | TokenKind::Percent => 3,
            TokenKind::Plus | TokenKind::Minus => 2,
            TokenKind::Colon => 0, // map entries, never nested ambiguously
            _ => 1,                // comparisons
        }),
        Node::Unary(_) => Some(4),
        _ => None,
    }
}

/// Print `root` as a file: one statement per line, no enclosing brackets.
pub fn print_file(arena: &NodeArena, content: &str, root: NodeId) -> String {
    let Node::List(statements) = &arena[root] else {
        return print_node(arena, content, root);
    };
    let mut printer = Printer::new(arena, content);
    let mut first = true;
    for &statement in &statements.items {
        if !first {
            printer.out.push('\n');
        }
        printer.node(statement);
        first = false;
    }
    printer.out
}

/// Print a single node (a root statement list prints as a bracketed list).
pub fn print_node(arena: &NodeArena, content: &str, id: NodeId) -> String {
    let mut printer = Printer::new(arena, content);
    printer.node(id);
    printer.out
}

struct Printer<'p> {
    arena: &'p NodeArena,
    content: &'p str,
    out: String,
    indent: usize,
}

impl<'p> Printer<'p> {
    fn new(arena: &'p NodeArena, content: &'p str) -> Self {
        Printer {
            arena,
            content,
            out: String::new(),
            indent: 0,
        }
    }

    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
    }

    fn node(&mut self, id: NodeId) {
        match &self.arena[id] {
            Node::Identifier(ident) => self.out.push_str(ident.name(self.content)),
            Node::Int(int) => {
                self.out.push_str(&int.value.to_string());
            }
            Node::Str(string) => {
                let value = string.value(self.content);
                if string.is_raw {
                    self.out.push('r');
                }
                // Minimal-effort quote choice; strings holding both quote
                // kinds unescaped cannot be reproduced faithfully.
                let quote = if value.contains('"') { '\'' } else { '"' };
                self.out.push(quote);
                self.out.push_str(value);
                self.out.push(quote);
            }
            Node::List(list) => self.list(list.kind, &list.items, true),
            Node::BinOp(op) => {
                let own = node_precedence(self.arena, id).expect("binop has precedence");
                self.child(op.left, own, false);
                if op.op == TokenKind::OpenSquare {
                    self.out.push('[');
                    self.node(op.right);
                    self.out.push(']');
                    return;
                }
                if op.op == TokenKind::Dot {
                    self.out.push('.');
                } else {
                    self.out.push(' ');
                    self.out.push_str(&op.op.to_string());
                    self.out.push(' ');
                }
                self.child(op.right, own, true);
            }
            Node::Unary(unary) => {
                self.out.push_str("not ");
                self.child(unary.operand, 4, false);
            }
            Node::Assignment(assign) => {
                self.node(assign.target);
                self.out.push_str(" = ");
                if let Some(value) = assign.value {
                    self.node(value);
                }
            }
            Node::FunCall(call) => {
                self.node(call.name);
                let Node::List(args) = &self.arena[call.args] else {
                    return;
                };
                // Call arguments are always a tuple; no one-element
                // trailing comma needed to disambiguate.
                self.list(args.kind, &args.items, false);
            }
            Node::Comprehension(comp) => {
                let (open, close) = brackets(comp.kind);
                self.out.push(open);
                self.node(comp.pattern);
                self.out.push_str(" for ");
                let Node::List(vars) = &self.arena[comp.variables] else {
                    return;
                };
                let mut first = true;
                for &var in &vars.items {
                    if !first {
                        self.out.push_str(", ");
                    }
                    self.node(var);
                    first = false;
                }
                self.out.push_str(" in ");
                self.node(comp.source);
                self.out.push(close);
            }
            Node::Ternary(ternary) => {
                self.child(ternary.positive, 1, false);
                self.out.push_str(" if ");
                self.child(ternary.condition, 1, false);
                if let Some(negative) = ternary.negative {
                    self.out.push_str(" else ");
                    self.node(negative);
                }
            }
        }
    }

    /// Print a child operand, parenthesising when its precedence is below
    /// the parent's (or equal, on the right side, to preserve shape under
    /// the parser's left association).
    fn child(&mut self, id: NodeId, parent_precedence: u8, is_right: bool) {
        let needs_parens = match node_precedence(self.arena, id) {
            Some(p) if is_right => p <= parent_precedence,
            Some(p) => p < parent_precedence,
            None => false,
        };
        if needs_parens {
            self.out.push('(');
            self.node(id);
            self.out.push(')');
        } else {
            self.node(id);
        }
    }

    /// Shared list/map/tuple body printing. Multiline once there is more
    /// than one element. `mark_single_tuple` adds the trailing comma that
    /// distinguishes a standalone one-element tuple from a parenthesised
    /// expression.
    fn list(
        &mut self,
        kind: ListKind,
        items: &crate::arena::ArenaDeque<NodeId>,
        mark_single_tuple: bool,
    ) {
        let (open, close) = brackets(kind);
        self.out.push(open);
        let multiline = items.len() > 1;
        if multiline {
            self.out.push('\n');
        }
        self.indent += INDENT_SPACES;
        let mut first = true;
        for &item in items {
            if !first {
                self.out.push_str(",\n");
            }
            if multiline {
                self.pad();
            }
            self.node(item);
            first = false;
        }
        self.indent -= INDENT_SPACES;
        if multiline {
            self.out.push('\n');
            self.pad();
        }
        if kind == ListKind::Tuple && items.len() == 1 && mark_single_tuple {
            self.out.push(',');
        }
        self.out.push(close);
    }
}

fn brackets(kind: ListKind) -> (char, char) {
    match kind {
        ListKind::List => ('[', ']'),
        ListKind::Map => ('{', '}'),
        ListKind::Tuple => ('(', ')'),
    }
}
