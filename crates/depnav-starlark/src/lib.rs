//! Syntax core for the Starlark dialect used in Bazel BUILD files.
//!
//! This crate provides the language-level machinery only:
//! - Block arenas and append-only sequences for AST storage
//! - Byte spans and line/column mapping
//! - The scanner (tokenizer with one-token lookahead)
//! - The closed AST node set with a walk combinator
//! - The forgiving recursive-descent parser
//! - The pretty-printer used for tree reconstruction
//!
//! It deliberately does no I/O; the `depnav` crate layers project loading
//! and the dependency analysis on top.

pub mod arena;
pub mod ast;
pub mod line_map;
pub mod parser;
pub mod printer;
pub mod scanner;

pub use arena::{Arena, ArenaDeque, NodeId};
pub use ast::{ListKind, Node, NodeArena};
pub use line_map::{LineColumn, LineColumnMap, LineColumnRange, Span};
pub use parser::Parser;
pub use scanner::{Scanner, Token, TokenKind};
