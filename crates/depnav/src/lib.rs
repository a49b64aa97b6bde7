//! depnav: navigation and analysis for Bazel-style BUILD files.
//!
//! This crate layers the tool on top of the `depnav-starlark` syntax core:
//! - Canonical package/target identifiers
//! - Project loading (BUILD file discovery + parsing into one arena)
//! - The query layer over parsed targets
//! - The header index (`header -> defining target`)
//! - Quoted-include extraction from C/C++ sources
//! - The DWYU engine emitting buildozer edits
//! - The `dnav` CLI surface

pub mod bazel;
pub mod cli;
pub mod dwyu;
pub mod error;
pub mod headers;
pub mod includes;
pub mod project;
pub mod query;
