//! Print/parse round-trip and totality checks over realistic BUILD inputs.

use depnav_starlark::{printer, NodeArena, Parser, Scanner, TokenKind};

fn parse(input: &str, arena: &mut NodeArena) -> (depnav_starlark::NodeId, bool) {
    let scanner = Scanner::new(input);
    let mut parser = Parser::new(scanner, arena, "<test>");
    let root = parser.parse();
    (root, parser.parse_error())
}

const SAMPLES: &[&str] = &[
    "",
    "\"\"\"Top of file docstring.\"\"\"\n",
    "cc_library(\n    name = \"scanner\",\n    srcs = [\"scanner.cc\"],\n    hdrs = [\"scanner.h\"],\n    deps = [\n        \":line-map\",\n        \"@absl//absl/strings\",\n    ],\n)\n",
    "cc_test(name = \"scanner_test\", srcs = [\"scanner_test.cc\"], deps = [\":scanner\", \"@googletest//:gtest_main\"])",
    "config = { \"mode\" : \"opt\", \"jobs\" : 8 }",
    "names = [(\"lib\" + suffix,) for suffix in [\"a\", \"b\", \"c\"]]",
    "pick = default if mode == \"fast\" else fallback",
    "flags = base_flags + [\"-O2\", \"-g\"]\nall = flags + extra",
    "value = matrix[0] + matrix[1]",
    "exported = not internal",
    "enabled = not not flag",
    "timeout = 3.5",
    "version = \"1\" if major not in released else \"2\"",
    "fmt = \"lib%s\" % name",
    "msg = \"prefix {}\".format(\"suffix\")",
];

#[test]
fn print_parse_round_trip_is_stable() {
    for input in SAMPLES {
        let mut arena = NodeArena::new();
        let (root, error) = parse(input, &mut arena);
        assert!(!error, "sample failed to parse: {input:?}");
        let printed = printer::print_file(&arena, input, root);

        let mut arena2 = NodeArena::new();
        let (root2, error2) = parse(&printed, &mut arena2);
        assert!(!error2, "printed form failed to re-parse: {printed:?}");
        let printed2 = printer::print_file(&arena2, &printed, root2);

        assert_eq!(printed, printed2, "round trip diverged for {input:?}");
    }
}

#[test]
fn scanning_is_total_and_eof_idempotent() {
    let junk = [
        "cc_library(name = \"x\"",
        "))))((((",
        "x = \"unterminated",
        "0..0..0..",
        "r\"raw with \\\" escape\"",
        "a\tb\r\nc",
    ];
    for input in SAMPLES.iter().copied().chain(junk) {
        let mut scanner = Scanner::new(input);
        let mut steps = 0;
        loop {
            let token = scanner.next();
            assert_eq!(token.text, &input[token.span.start..token.span.end]);
            if token.kind == TokenKind::Eof {
                break;
            }
            steps += 1;
            assert!(steps < 10_000, "scanner failed to terminate on {input:?}");
        }
        assert_eq!(scanner.next().kind, TokenKind::Eof);
    }
}

#[test]
fn parsing_is_total_on_malformed_input() {
    let junk = [
        "cc_library(name = ",
        "x = [1, 2",
        "y = {\"k\" 1}",
        "( ) [ ] { }",
        "foo(deps = [:bad])",
        "= = =",
    ];
    for input in junk {
        let mut arena = NodeArena::new();
        let (root, _) = parse(input, &mut arena);
        // A statement list always comes back, printable without panic.
        let _ = printer::print_file(&arena, input, root);
    }
}
