//! Preprocessor state for the lowering pass
//!
//! tree-sitter parses directives but does not run them, so the lowering pass
//! keeps a macro table, evaluates `#if`-family conditions against it and
//! resolves `#include` targets on the search path.
//!
//! @module parse/preprocess

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tree_sitter::Node;

use crate::build::Defines;
use crate::inventory::canonical_path;

// =============================================================================
// MACRO TABLE
// =============================================================================

/// Currently defined macros with their integer value when it is known
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, Option<i64>>,
}

impl MacroTable {
    /// Seed from build defines; a bare `-DNAME` means `NAME=1`
    pub fn from_defines(defines: &Defines) -> Self {
        let macros = defines.iter().map(|d| (d.to_string(), Some(1))).collect();
        Self { macros }
    }

    /// Record a `#define`; `body` is the raw replacement text, if any
    pub fn define(&mut self, name: &str, body: Option<&str>) {
        let value = match body.map(str::trim) {
            None | Some("") => Some(1),
            Some(text) => parse_integer(text),
        };
        self.macros.insert(name.to_string(), value);
    }

    pub fn undefine(&mut self, name: &str) {
        self.macros.remove(name);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Value used when the macro appears in an `#if` expression
    fn value(&self, name: &str) -> i64 {
        match self.macros.get(name) {
            Some(Some(v)) => *v,
            // Defined to something we cannot evaluate: assume true
            Some(None) => 1,
            None => 0,
        }
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Evaluate an `#if` / `#elif` condition
///
/// Supports integer and character literals, `defined`, macro names, unary and
/// binary operators and parentheses. Anything else (function-like macro
/// calls, casts) evaluates to true so the branch still gets indexed.
pub fn eval_condition(node: Node, source: &[u8], macros: &MacroTable) -> bool {
    eval(node, source, macros) != 0
}

fn eval(node: Node, source: &[u8], macros: &MacroTable) -> i64 {
    let text = |n: Node| n.utf8_text(source).unwrap_or("");

    match node.kind() {
        "number_literal" => parse_integer(text(node)).unwrap_or(1),
        "char_literal" => 1,
        "true" => 1,
        "false" => 0,
        "identifier" => macros.value(text(node)),
        "preproc_defined" => {
            let mut cursor = node.walk();
            let defined = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "identifier")
                .map(|c| macros.is_defined(text(c)))
                .unwrap_or(false);
            defined as i64
        }
        "parenthesized_expression" => node
            .named_child(0)
            .map(|inner| eval(inner, source, macros))
            .unwrap_or(1),
        "unary_expression" => {
            let operand = node
                .child_by_field_name("argument")
                .map(|a| eval(a, source, macros))
                .unwrap_or(0);
            match node.child_by_field_name("operator").map(|o| o.kind()) {
                Some("!") => (operand == 0) as i64,
                Some("-") => operand.wrapping_neg(),
                Some("~") => !operand,
                _ => operand,
            }
        }
        "binary_expression" => {
            let (Some(left), Some(right), Some(op)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
                node.child_by_field_name("operator"),
            ) else {
                return 1;
            };
            let l = eval(left, source, macros);
            // Short-circuit like the real preprocessor
            match op.kind() {
                "&&" => return (l != 0 && eval(right, source, macros) != 0) as i64,
                "||" => return (l != 0 || eval(right, source, macros) != 0) as i64,
                _ => {}
            }
            let r = eval(right, source, macros);
            match op.kind() {
                "==" => (l == r) as i64,
                "!=" => (l != r) as i64,
                "<" => (l < r) as i64,
                ">" => (l > r) as i64,
                "<=" => (l <= r) as i64,
                ">=" => (l >= r) as i64,
                "+" => l.wrapping_add(r),
                "-" => l.wrapping_sub(r),
                "*" => l.wrapping_mul(r),
                "/" if r != 0 => l.wrapping_div(r),
                "%" if r != 0 => l.wrapping_rem(r),
                "&" => l & r,
                "|" => l | r,
                "^" => l ^ r,
                "<<" => l.wrapping_shl(r as u32),
                ">>" => l.wrapping_shr(r as u32),
                _ => 1,
            }
        }
        _ => 1,
    }
}

/// Parse a C integer literal (decimal, hex, octal, binary; suffixes ignored)
pub fn parse_integer(text: &str) -> Option<i64> {
    let trimmed = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
    let (digits, radix) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(bin) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        (bin, 2)
    } else if trimmed.len() > 1 && trimmed.starts_with('0') {
        (&trimmed[1..], 8)
    } else {
        (trimmed, 10)
    };
    let digits = digits.replace('\'', "");
    i64::from_str_radix(&digits, radix).ok()
}

// =============================================================================
// INCLUDES
// =============================================================================

/// Header named by an `#include` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    pub name: String,
    /// `"name"` form, searched next to the including file first
    pub quoted: bool,
}

impl IncludeSpec {
    /// Parse the `path` field text of a `preproc_include`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            return Some(Self {
                name: inner.to_string(),
                quoted: true,
            });
        }
        if let Some(inner) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
            return Some(Self {
                name: inner.to_string(),
                quoted: false,
            });
        }
        None
    }
}

/// Resolves include directives against an ordered list of search directories
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    search_paths: Vec<PathBuf>,
}

impl IncludeResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn resolve(&self, including_file: &Path, spec: &IncludeSpec) -> Option<PathBuf> {
        let local = spec
            .quoted
            .then(|| including_file.parent())
            .flatten()
            .map(|dir| dir.join(&spec.name));

        local
            .into_iter()
            .chain(self.search_paths.iter().map(|dir| dir.join(&spec.name)))
            .find(|candidate| candidate.is_file())
            .map(|found| canonical_path(&found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Language;
    use tempfile::TempDir;
    use tree_sitter::Parser;

    fn eval_if(code: &str, macros: &MacroTable) -> bool {
        let mut parser = Parser::new();
        parser
            .set_language(&Language::C.tree_sitter_language())
            .unwrap();
        let tree = parser.parse(code, None).unwrap();
        let root = tree.root_node();
        let directive = root.named_child(0).unwrap();
        assert_eq!(directive.kind(), "preproc_if");
        let condition = directive.child_by_field_name("condition").unwrap();
        eval_condition(condition, code.as_bytes(), macros)
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("010"), Some(8));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("7UL"), Some(7));
        assert_eq!(parse_integer("foo"), None);
    }

    #[test]
    fn test_eval_conditions() {
        let defines: Defines = ["DEBUG"].into_iter().collect();
        let mut macros = MacroTable::from_defines(&defines);
        macros.define("LEVEL", Some("3"));
        macros.define("OFF", Some("0"));

        assert!(!eval_if("#if 0\n#endif\n", &macros));
        assert!(eval_if("#if 1\n#endif\n", &macros));
        assert!(eval_if("#if defined(DEBUG)\n#endif\n", &macros));
        assert!(!eval_if("#if defined(RELEASE)\n#endif\n", &macros));
        assert!(eval_if("#if !defined(RELEASE) && DEBUG\n#endif\n", &macros));
        assert!(eval_if("#if LEVEL >= 2\n#endif\n", &macros));
        assert!(!eval_if("#if OFF\n#endif\n", &macros));
        assert!(!eval_if("#if UNDEFINED_THING\n#endif\n", &macros));
        assert!(eval_if("#if (LEVEL > 5) || defined(DEBUG)\n#endif\n", &macros));
    }

    #[test]
    fn test_include_spec() {
        assert_eq!(
            IncludeSpec::parse("\"util.h\""),
            Some(IncludeSpec {
                name: "util.h".to_string(),
                quoted: true
            })
        );
        assert_eq!(
            IncludeSpec::parse("<stdio.h>"),
            Some(IncludeSpec {
                name: "stdio.h".to_string(),
                quoted: false
            })
        );
        assert_eq!(IncludeSpec::parse("HEADER_MACRO"), None);
    }

    #[test]
    fn test_include_resolution_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("include")).unwrap();
        std::fs::write(root.join("src/local.h"), "").unwrap();
        std::fs::write(root.join("include/shared.h"), "").unwrap();
        std::fs::write(root.join("include/local.h"), "").unwrap();

        let resolver = IncludeResolver::new(vec![root.join("include")]);
        let including = root.join("src/main.c");

        let local = IncludeSpec::parse("\"local.h\"").unwrap();
        assert_eq!(
            resolver.resolve(&including, &local),
            Some(canonical_path(&root.join("src/local.h")))
        );

        let system = IncludeSpec::parse("<local.h>").unwrap();
        assert_eq!(
            resolver.resolve(&including, &system),
            Some(canonical_path(&root.join("include/local.h")))
        );

        let missing = IncludeSpec::parse("<nope.h>").unwrap();
        assert_eq!(resolver.resolve(&including, &missing), None);
    }
}
