//! The header index: which library target provides which header.
//!
//! Built from every `cc_library(name = N, hdrs = [...])` across the parsed
//! project; each header is keyed by its fully qualified path (package path
//! plus the `hdrs` entry). First writer wins on conflicts, but a duplicate
//! provider inside the main workspace is actionable and gets reported;
//! external workspaces redefine headers all the time and are left alone.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::Write;

use crate::bazel::BazelTarget;
use crate::project::ParsedProject;
use crate::query::{extract_string_list, find_targets};

/// Ordered map from fully qualified header path to its defining target.
pub type HeaderToTargetMap = BTreeMap<String, BazelTarget>;

/// Build the `header -> defining target` map from every `cc_library`'s
/// `hdrs`. Duplicate providers in the main workspace are diagnosed on
/// `info_out`; the first insertion stays authoritative either way.
pub fn extract_header_to_lib_mapping(
    project: &ParsedProject,
    info_out: &mut dyn Write,
) -> HeaderToTargetMap {
    let mut result = HeaderToTargetMap::new();
    for file in project.files.values() {
        let Some(ast) = file.ast else { continue };
        find_targets(
            &project.arena,
            &file.content,
            ast,
            &["cc_library"],
            |params| {
                let Some(lib_name) = params.name else { return };
                let mut headers = Vec::new();
                extract_string_list(&project.arena, params.hdrs, &mut headers);
                for span in headers {
                    let header = span.text(&file.content);
                    if header.is_empty() {
                        continue;
                    }
                    let header_fqn = file.package.qualified_file(header);
                    let target = BazelTarget::new(file.package.clone(), lib_name);
                    match result.entry(header_fqn) {
                        Entry::Vacant(slot) => {
                            slot.insert(target);
                        }
                        Entry::Occupied(existing) => {
                            if *existing.get() == target {
                                continue;
                            }
                            // External projects redefine headers routinely;
                            // only the main workspace is actionable.
                            if file.package.project.is_empty() {
                                let _ = writeln!(
                                    info_out,
                                    "{}:{} Header '{}' in {} already provided by {}",
                                    file.filename,
                                    file.line_map.range(span),
                                    existing.key(),
                                    target,
                                    existing.get(),
                                );
                            }
                        }
                    }
                }
            },
        );
    }
    result
}

/// Print the header table: header path left-justified to the widest entry,
/// a tab, the canonical defining target.
pub fn print_library_headers(
    out: &mut dyn Write,
    info_out: &mut dyn Write,
    project: &ParsedProject,
) {
    let header_to_lib = extract_header_to_lib_mapping(project, info_out);
    let longest = header_to_lib
        .keys()
        .map(|header| header.len())
        .max()
        .unwrap_or(0);
    for (header, lib) in &header_to_lib {
        let _ = writeln!(out, "{header:<longest$}\t{lib}");
    }
}
