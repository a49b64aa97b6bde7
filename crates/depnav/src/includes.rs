//! Extract quoted `#include` paths from C/C++ source text.
//!
//! This is deliberately a regex over the raw text, not a lex of C++:
//! angle-bracket includes are system or third-party headers and are
//! ignored, and a line inside a `/* */` block comment that starts with
//! `#include` still matches. The DWYU engine tolerates the false positives
//! because unknown headers only ever lower remove-confidence, never
//! produce an edit. TODO: revisit comment handling together with the
//! generated-source heuristics.

use std::sync::LazyLock;

use regex::Regex;

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*#include\s+"([0-9a-zA-Z_/-]+\.[a-zA-Z]+)""#)
        .expect("include pattern compiles")
});

/// Project headers `#include "..."`-ed by `content`, in order of
/// appearance. Best effort: may be empty.
pub fn extract_cc_includes(content: &str) -> Vec<String> {
    INCLUDE_RE
        .captures_iter(content)
        .map(|capture| capture[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_files_are_extracted() {
        let content = r#"
/* some ignored text */
#include "CaSe-dash_underscore.h"
#include <should_not_be_extracted>
// #include "also-not-extracted.h"
   #include "but-this.h"
#include "with/suffix.hh"      // other ..
#include "with/suffix.inc"     // .. common suffices
#include    "w/space.h"        // even strange spacing should work
#include /* foo */ "this-is-silly.h"  // Some things are too far :)
"#;
        assert_eq!(
            extract_cc_includes(content),
            vec![
                "CaSe-dash_underscore.h",
                "but-this.h",
                "with/suffix.hh",
                "with/suffix.inc",
                "w/space.h",
            ]
        );
    }

    #[test]
    fn quoted_only_and_leading_whitespace() {
        let content = "#include \"a.h\"\n#include <sys.h>\n   #include \"b/c.h\"\n";
        assert_eq!(extract_cc_includes(content), vec!["a.h", "b/c.h"]);
    }

    #[test]
    fn empty_and_unrelated_content() {
        assert!(extract_cc_includes("").is_empty());
        assert!(extract_cc_includes("int main() { return 0; }\n").is_empty());
    }

    #[test]
    fn rejects_paths_with_odd_characters() {
        // Spaces or dots in directories don't match the accepted pattern.
        assert!(extract_cc_includes("#include \"has space.h\"\n").is_empty());
        assert!(extract_cc_includes("#include \"noextension\"\n").is_empty());
    }
}
