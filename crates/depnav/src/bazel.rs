//! Canonical Bazel package and target identifiers.
//!
//! A package is `//path/in/workspace` or `@external_workspace//path`; a
//! target is a package plus a target name, written `//path:name`. A target
//! whose name repeats the last path element has the compact form
//! `//a/b/c` == `//a/b/c:c`. Both types order totally so they can live in
//! sorted sets and maps, which keeps every emitted edit stream stable.

use std::fmt;

/// Something like `//foo/bar` or `@baz//foo/bar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BazelPackage {
    /// Empty for the main workspace, else `@project_name`.
    pub project: String,
    /// Path relative to the workspace, no leading or trailing `/`.
    pub path: String,
}

impl BazelPackage {
    pub fn new(project: &str, path: &str) -> Self {
        BazelPackage {
            project: project.to_string(),
            path: path.to_string(),
        }
    }

    /// Parse `@proj//path`, `//path` or `@proj`; a trailing `:target` is
    /// stripped. Strings without `//` and without a leading `@` are
    /// rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let s = match s.rfind(':') {
            Some(colon) => &s[..colon],
            None => s,
        };
        let parts: Vec<&str> = s.split("//").collect();
        if parts.len() > 2 {
            return None;
        }
        if parts.len() == 1 && !parts[0].starts_with('@') {
            return None;
        }
        Some(BazelPackage {
            project: parts[0].to_string(),
            path: parts.get(1).unwrap_or(&"").to_string(),
        })
    }

    /// Filename relative to the workspace root for a file in this package.
    pub fn qualified_file(&self, relative_file: &str) -> String {
        if self.path.is_empty() {
            return relative_file.to_string();
        }
        format!("{}/{}", self.path, relative_file)
    }

    /// Last path element, or empty when the path has no `/` separator.
    pub fn last_element(&self) -> &str {
        match self.path.rfind('/') {
            Some(slash) => &self.path[slash + 1..],
            None => "",
        }
    }
}

impl fmt::Display for BazelPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}//{}", self.project, self.path)
    }
}

/// A buildable target: package plus target name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BazelTarget {
    pub package: BazelPackage,
    pub target_name: String,
}

impl BazelTarget {
    pub fn new(package: BazelPackage, target_name: &str) -> Self {
        BazelTarget {
            package,
            target_name: target_name.to_string(),
        }
    }

    /// Parse a target reference as it appears in a `deps` list. Relative
    /// forms (`:name`, bare `name`) resolve against `context`. Shortcuts
    /// canonicalise: `@foo` becomes `@foo//:foo`, `//a/b/c` becomes
    /// `//a/b/c:c`.
    pub fn parse(s: &str, context: &BazelPackage) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        let (package, target) = match parts.len() {
            1 => {
                let package = parts[0];
                if let Some(slash) = package.rfind('/') {
                    // //absl/strings to be interpreted as //absl/strings:strings
                    (package, &package[slash + 1..])
                } else if let Some(stripped) = package.strip_prefix('@') {
                    // just a toplevel workspace, e.g. @jsonhpp
                    (package, stripped)
                } else {
                    // no delimiter and no package: relative to context
                    ("", s)
                }
            }
            2 => (parts[0], parts[1]),
            _ => return None,
        };
        if package.is_empty() {
            return Some(BazelTarget::new(context.clone(), target));
        }
        let package = BazelPackage::parse(package)?;
        Some(BazelTarget::new(package, target))
    }

    /// True for anything starting with `:`, `//` or `@`. Other strings may
    /// still parse, but deserve a canonicalisation nudge.
    pub fn looks_wellformed(s: &str) -> bool {
        s.starts_with(':') || s.starts_with("//") || s.starts_with('@')
    }

    /// Compact printing when already inside `other_package`.
    pub fn to_string_relative_to(&self, other_package: &BazelPackage) -> String {
        if *other_package != self.package {
            return self.to_string();
        }
        format!(":{}", self.target_name)
    }
}

impl fmt::Display for BazelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.last_element() == self.target_name {
            // target == package: compact representation
            return write!(f, "{}", self.package);
        }
        write!(f, "{}:{}", self.package, self.target_name)
    }
}
