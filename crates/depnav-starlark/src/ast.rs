//! AST node variants for parsed BUILD files.
//!
//! The node set is closed: everything a BUILD file can contain is one of the
//! [`Node`] variants below. Nodes live in a [`NodeArena`] and reference each
//! other by [`NodeId`]; text-bearing nodes carry [`Span`]s into the file
//! content rather than owned strings, so the content buffer and the arena
//! together fully describe a parse.
//!
//! Passes over the tree are written as a `match` per variant; [`walk`] is
//! the reusable descend-everything helper for passes that only care about a
//! few variants (see the query layer in the depnav crate).

use crate::arena::{Arena, ArenaDeque, NodeId};
use crate::line_map::Span;
use crate::scanner::TokenKind;

pub type NodeArena = Arena<Node>;

/// Lists, maps and tuples share one representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    List,
    Map,
    Tuple,
}

#[derive(Debug)]
pub enum Node {
    Identifier(Identifier),
    Int(IntScalar),
    Str(StringScalar),
    List(List),
    BinOp(BinOp),
    Unary(UnaryExpr),
    Assignment(Assignment),
    FunCall(FunCall),
    Comprehension(Comprehension),
    Ternary(Ternary),
}

impl Node {
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Node::Identifier(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&StringScalar> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&IntScalar> {
        match self {
            Node::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Node::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_funcall(&self) -> Option<&FunCall> {
        match self {
            Node::FunCall(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Identifier {
    pub span: Span,
}

impl Identifier {
    pub fn name<'a>(&self, content: &'a str) -> &'a str {
        self.span.text(content)
    }
}

#[derive(Debug)]
pub struct IntScalar {
    pub value: i64,
    pub span: Span,
}

/// A string literal with the quotes (and any `r` prefix) stripped.
///
/// `span` points at the inner text in the original file; escape sequences
/// are preserved as written, and unescaping is the consumer's business
/// (guided by `is_raw`).
#[derive(Debug)]
pub struct StringScalar {
    pub span: Span,
    pub is_raw: bool,
    pub is_triple_quoted: bool,
}

impl StringScalar {
    /// Strip the decoration off a string token's span: optional `r`/`R`
    /// prefix, then either triple or single quotes on both ends.
    pub fn from_literal(span: Span, text: &str, is_raw: bool) -> StringScalar {
        let mut start = span.start;
        let mut text = text;
        if is_raw {
            start += 1;
            text = &text[1..];
        }
        let bytes = text.as_bytes();
        let is_triple_quoted =
            bytes.len() >= 6 && bytes[0] == bytes[1] && bytes[0] == bytes[2];
        let quotes = if is_triple_quoted { 3 } else { 1 };
        StringScalar {
            span: Span::new(start + quotes, start + text.len() - quotes),
            is_raw,
            is_triple_quoted,
        }
    }

    pub fn value<'a>(&self, content: &'a str) -> &'a str {
        self.span.text(content)
    }
}

#[derive(Debug)]
pub struct List {
    pub kind: ListKind,
    pub items: ArenaDeque<NodeId>,
}

impl List {
    pub fn new(kind: ListKind) -> List {
        List {
            kind,
            items: ArenaDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Binary operation; `op` is the operator's token kind.
///
/// Arithmetic `+ - * / %`, comparisons `== != < <= > >= in, not in`,
/// `:` for map entries, `.` for attribute access, `[` for indexing.
#[derive(Debug)]
pub struct BinOp {
    pub op: TokenKind,
    pub left: NodeId,
    pub right: NodeId,
}

#[derive(Debug)]
pub struct UnaryExpr {
    pub op: TokenKind,
    pub operand: NodeId,
}

/// `identifier = value`; the only legal assignment target is an identifier.
/// `value` is absent when parsing failed after the `=`.
#[derive(Debug)]
pub struct Assignment {
    pub target: NodeId,
    pub value: Option<NodeId>,
}

/// `name(args)`; `args` is always a tuple-kind [`List`].
#[derive(Debug)]
pub struct FunCall {
    pub name: NodeId,
    pub args: NodeId,
}

/// `[pattern for v1, v2 in source]` (also over map and tuple bodies).
/// `variables` is a list-kind [`List`] of identifiers.
#[derive(Debug)]
pub struct Comprehension {
    pub kind: ListKind,
    pub pattern: NodeId,
    pub variables: NodeId,
    pub source: NodeId,
}

/// `positive if condition else negative`; `negative` may be absent.
#[derive(Debug)]
pub struct Ternary {
    pub positive: NodeId,
    pub condition: NodeId,
    pub negative: Option<NodeId>,
}

/// Depth-first pre-order walk over the tree below `id`, calling `visit` for
/// every node. The closure may inspect nodes through the same arena borrow
/// it captured; the walk only reads.
pub fn walk(arena: &NodeArena, id: NodeId, visit: &mut impl FnMut(NodeId)) {
    visit(id);
    match &arena[id] {
        Node::Identifier(_) | Node::Int(_) | Node::Str(_) => {}
        Node::List(list) => {
            for &item in &list.items {
                walk(arena, item, visit);
            }
        }
        Node::BinOp(op) => {
            walk(arena, op.left, visit);
            walk(arena, op.right, visit);
        }
        Node::Unary(unary) => walk(arena, unary.operand, visit),
        Node::Assignment(assign) => {
            walk(arena, assign.target, visit);
            if let Some(value) = assign.value {
                walk(arena, value, visit);
            }
        }
        Node::FunCall(call) => {
            walk(arena, call.name, visit);
            walk(arena, call.args, visit);
        }
        Node::Comprehension(comp) => {
            walk(arena, comp.pattern, visit);
            walk(arena, comp.variables, visit);
            walk(arena, comp.source, visit);
        }
        Node::Ternary(ternary) => {
            walk(arena, ternary.positive, visit);
            walk(arena, ternary.condition, visit);
            if let Some(negative) = ternary.negative {
                walk(arena, negative, visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_scalar_strips_single_quotes() {
        let content = r#"x = "hello""#;
        let scalar = StringScalar::from_literal(Span::new(4, 11), &content[4..11], false);
        assert_eq!(scalar.value(content), "hello");
        assert!(!scalar.is_triple_quoted);
        assert!(!scalar.is_raw);
    }

    #[test]
    fn string_scalar_strips_triple_quotes() {
        let content = r#"x = """a "" b""""#;
        let scalar = StringScalar::from_literal(Span::new(4, 16), &content[4..16], false);
        assert_eq!(scalar.value(content), r#"a "" b"#);
        assert!(scalar.is_triple_quoted);
    }

    #[test]
    fn string_scalar_strips_raw_prefix() {
        let content = "x = r'raw\\n'";
        let scalar = StringScalar::from_literal(Span::new(4, 12), &content[4..12], true);
        assert_eq!(scalar.value(content), "raw\\n");
        assert!(scalar.is_raw);
        assert!(!scalar.is_triple_quoted);
    }

    #[test]
    fn empty_string_is_not_triple_quoted() {
        let content = r#""""#;
        let scalar = StringScalar::from_literal(Span::new(0, 2), content, false);
        assert_eq!(scalar.value(content), "");
        assert!(!scalar.is_triple_quoted);
    }

    #[test]
    fn walk_visits_every_node_once() {
        let mut arena = NodeArena::new();
        let lhs = arena.alloc(Node::Str(StringScalar {
            span: Span::new(0, 0),
            is_raw: false,
            is_triple_quoted: false,
        }));
        let rhs = arena.alloc(Node::Int(IntScalar {
            value: 7,
            span: Span::new(0, 0),
        }));
        let op = arena.alloc(Node::BinOp(BinOp {
            op: TokenKind::Plus,
            left: lhs,
            right: rhs,
        }));
        let mut list = List::new(ListKind::List);
        list.items.push(op);
        let root = arena.alloc(Node::List(list));

        let mut seen = Vec::new();
        walk(&arena, root, &mut |id| seen.push(id));
        assert_eq!(seen, vec![root, op, lhs, rhs]);
    }
}
