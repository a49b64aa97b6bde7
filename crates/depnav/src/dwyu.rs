//! Depend on What You Use: align declared `deps` with actual header usage.
//!
//! For every buildable target in the main workspace the engine reads the
//! target's sources, extracts their quoted includes, resolves each include
//! through the header index and diffs the resulting needed-set against the
//! declared `deps`. The output is a stream of `buildozer` edits.
//!
//! Soundness rules for removals, kept deliberately separate:
//! - every source of the target must have been readable and every include
//!   resolvable (`all_headers_accounted_for`), and
//! - the dependency must be a project-owned `cc_library` that is not
//!   `alwayslink` (the known-libraries set).
//!
//! Only when both hold is a declared-but-unused dep proposed for removal.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Write;

use depnav_starlark::Span;

use crate::bazel::BazelTarget;
use crate::headers::{extract_header_to_lib_mapping, HeaderToTargetMap};
use crate::includes::extract_cc_includes;
use crate::project::{FileContent, ParsedProject};
use crate::query::{extract_string_list, find_targets};

/// Where to look for a source file on disk; primary tree first, then the
/// places generated files end up.
const SOURCE_LOCATIONS: [&str; 3] = ["", "bazel-out/host/bin/", "bazel-bin/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Add,
    Remove,
}

/// One buildozer edit: add or remove `dep` on `target`'s `deps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub op: EditOp,
    pub dep: String,
    pub target: BazelTarget,
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.op {
            EditOp::Add => "add",
            EditOp::Remove => "remove",
        };
        write!(f, "buildozer '{} deps {}' {}", verb, self.dep, self.target)
    }
}

/// Resolve the includes of `sources` to the targets providing them.
///
/// `all_headers_accounted_for` is cleared when a source can't be read or an
/// include can't be resolved; only with it intact can removals be trusted.
fn targets_for_includes(
    target_self: &BazelTarget,
    file: &FileContent,
    sources: &[Span],
    header_to_dep: &HeaderToTargetMap,
    all_headers_accounted_for: &mut bool,
    info_out: &mut dyn Write,
) -> BTreeSet<BazelTarget> {
    let mut result = BTreeSet::new();
    for &span in sources {
        let source_file = file.package.qualified_file(span.text(&file.content));

        // The file could be in multiple locations, primary or generated;
        // first hit wins.
        let mut source_content = None;
        for location in SOURCE_LOCATIONS {
            match fs::read_to_string(format!("{location}{source_file}")) {
                Ok(content) => {
                    if !location.is_empty() {
                        tracing::debug!("found {source_file} under {location}");
                    }
                    source_content = Some(content);
                    break;
                }
                Err(_) => continue,
            }
        }
        let Some(source_content) = source_content else {
            // Probably the output of a generated rule; we can't see what it
            // includes, which caps our remove confidence.
            let _ = writeln!(
                info_out,
                "{}:{} Can not read '{}' referenced in {} Probably generated ?",
                file.filename,
                file.line_map.range(span),
                source_file,
                target_self,
            );
            *all_headers_accounted_for = false;
            continue;
        };

        for header in extract_cc_includes(&source_content) {
            match header_to_dep.get(&header) {
                None => {
                    // A header we can't place; be careful with removals.
                    *all_headers_accounted_for = false;
                }
                Some(provider) => {
                    if provider != target_self {
                        result.insert(provider.clone());
                    }
                }
            }
        }
    }
    result
}

/// Every `cc_library` of the project that is not `alwayslink`. Removals are
/// only ever suggested for members of this set: a dep we don't know can't
/// be judged, and alwayslink targets are linked for effect, not headers.
fn extract_known_libraries(project: &ParsedProject) -> BTreeSet<BazelTarget> {
    let mut result = BTreeSet::new();
    for file in project.files.values() {
        let Some(ast) = file.ast else { continue };
        find_targets(
            &project.arena,
            &file.content,
            ast,
            &["cc_library"],
            |params| {
                if params.alwayslink {
                    return;
                }
                let Some(name) = params.name else { return };
                if let Some(target) = BazelTarget::parse(&format!(":{name}"), &file.package) {
                    result.insert(target);
                }
            },
        );
    }
    result
}

/// Compute the DWYU edit stream for the whole project. External workspaces
/// are analysis input but never edited. Deterministic: removals follow the
/// `deps` order in the BUILD file, additions the canonical target order.
pub fn dependency_edits(project: &ParsedProject, info_out: &mut dyn Write) -> Vec<Edit> {
    let header_to_dep = extract_header_to_lib_mapping(project, info_out);
    let known_libs = extract_known_libraries(project);

    let mut edits = Vec::new();
    for file in project.files.values() {
        if !file.package.project.is_empty() {
            continue; // only interested in our project, not the externals
        }
        let Some(ast) = file.ast else { continue };
        find_targets(
            &project.arena,
            &file.content,
            ast,
            &["cc_library", "cc_binary", "cc_test"],
            |params| {
                let Some(name) = params.name else { return };
                let Some(target_self) = BazelTarget::parse(&format!(":{name}"), &file.package)
                else {
                    return;
                };

                let mut all_headers_accounted_for = true;
                let mut sources = Vec::new();
                extract_string_list(&project.arena, params.srcs, &mut sources);
                extract_string_list(&project.arena, params.hdrs, &mut sources);
                let mut targets_needed = targets_for_includes(
                    &target_self,
                    file,
                    &sources,
                    &header_to_dep,
                    &mut all_headers_accounted_for,
                    info_out,
                );

                // Check all the dependencies the target requested but
                // doesn't appear to need.
                let mut deps = Vec::new();
                extract_string_list(&project.arena, params.deps, &mut deps);
                for span in deps {
                    let dep_text = span.text(&file.content);
                    if !BazelTarget::looks_wellformed(dep_text) {
                        let _ = writeln!(
                            info_out,
                            "{}:{} target \"{}\": no '//' or ':' prefix. Consider canonicalizing.",
                            file.filename,
                            file.line_map.range(span),
                            dep_text,
                        );
                    }
                    let Some(requested) = BazelTarget::parse(dep_text, &file.package) else {
                        let _ = writeln!(
                            info_out,
                            "{}:{} Invalid target name '{}'",
                            file.filename,
                            file.line_map.range(span),
                            dep_text,
                        );
                        continue;
                    };
                    let was_needed = targets_needed.remove(&requested);
                    if !was_needed && all_headers_accounted_for && known_libs.contains(&requested)
                    {
                        edits.push(Edit {
                            op: EditOp::Remove,
                            dep: dep_text.to_string(),
                            target: target_self.clone(),
                        });
                    }
                }

                // Whatever survived in the needed-set is missing from deps.
                for needed in targets_needed {
                    edits.push(Edit {
                        op: EditOp::Add,
                        dep: needed.to_string_relative_to(&file.package),
                        target: target_self.clone(),
                    });
                }
            },
        );
    }
    edits
}

/// Emit the edit stream, one buildozer line per edit.
pub fn print_dependency_edits(
    project: &ParsedProject,
    out: &mut dyn Write,
    info_out: &mut dyn Write,
) {
    for edit in dependency_edits(project, info_out) {
        let _ = writeln!(out, "{edit}");
    }
}
