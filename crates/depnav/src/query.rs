//! Extract target declarations from parsed BUILD files.
//!
//! BUILD targets are function calls with keyword arguments
//! (`cc_library(name = "foo", hdrs = [...], ...)`). The query layer finds
//! calls by name and pulls out the small set of parameters the analyses
//! care about; values are only accepted when they have the expected shape
//! and unknown keyword arguments are ignored.

use depnav_starlark::ast::{walk, Node, NodeArena};
use depnav_starlark::{NodeId, Span};

/// Parameters of one matched target declaration.
///
/// `srcs`, `hdrs` and `deps` are node ids of list-kind values, resolved
/// lazily by the caller through [`extract_string_list`].
#[derive(Debug, Default)]
pub struct TargetParameters<'a> {
    pub name: Option<&'a str>,
    /// Span of the `name` value, for diagnostics.
    pub name_span: Option<Span>,
    pub srcs: Option<NodeId>,
    pub hdrs: Option<NodeId>,
    pub deps: Option<NodeId>,
    pub alwayslink: bool,
}

/// Walk `root` and invoke `callback` for every function call whose name is
/// in `names`, with its recognised parameters filled in.
pub fn find_targets(
    arena: &NodeArena,
    content: &str,
    root: NodeId,
    names: &[&str],
    mut callback: impl FnMut(&TargetParameters),
) {
    walk(arena, root, &mut |id| {
        let Node::FunCall(call) = &arena[id] else {
            return;
        };
        let Some(name) = arena[call.name].as_identifier() else {
            return;
        };
        if !names.contains(&name.name(content)) {
            return;
        }
        let params = gather_parameters(arena, content, call.args);
        callback(&params);
    });
}

fn gather_parameters<'a>(arena: &NodeArena, content: &'a str, args: NodeId) -> TargetParameters<'a> {
    let mut params = TargetParameters::default();
    let Some(args) = arena[args].as_list() else {
        return params;
    };
    for &arg in &args.items {
        let Node::Assignment(kwarg) = &arena[arg] else {
            continue; // positional arguments carry nothing we query
        };
        let Some(keyword) = arena[kwarg.target].as_identifier() else {
            continue;
        };
        let Some(value) = kwarg.value else { continue };
        match keyword.name(content) {
            "name" => {
                if let Some(scalar) = arena[value].as_str() {
                    params.name = Some(scalar.value(content));
                    params.name_span = Some(scalar.span);
                }
            }
            "srcs" => params.srcs = string_list(arena, value),
            "hdrs" => params.hdrs = string_list(arena, value),
            "deps" => params.deps = string_list(arena, value),
            "alwayslink" => params.alwayslink = truthy(arena, content, value),
            _ => {} // unknown keyword arguments are fine
        }
    }
    params
}

/// Accept the value only when it is a plain list.
fn string_list(arena: &NodeArena, value: NodeId) -> Option<NodeId> {
    match &arena[value] {
        Node::List(list) if list.kind == depnav_starlark::ListKind::List => Some(value),
        _ => None,
    }
}

/// `alwayslink = True` or a non-zero integer.
fn truthy(arena: &NodeArena, content: &str, value: NodeId) -> bool {
    match &arena[value] {
        Node::Identifier(id) => id.name(content) == "True",
        Node::Int(int) => int.value != 0,
        _ => false,
    }
}

/// Append the span of every string-scalar item of `list` to `out`,
/// silently skipping items of any other shape.
pub fn extract_string_list(arena: &NodeArena, list: Option<NodeId>, out: &mut Vec<Span>) {
    let Some(list) = list else { return };
    let Some(list) = arena[list].as_list() else {
        return;
    };
    for &item in &list.items {
        if let Some(scalar) = arena[item].as_str() {
            out.push(scalar.span);
        }
    }
}
