//! Language detection and tree-sitter grammar loading

use std::path::Path;

/// C-family languages with a tree-sitter grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    /// Detect language from file path
    ///
    /// Headers with a plain `.h` suffix are treated as C here; when they are
    /// reached through an `#include` the including unit's language wins.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "c++" | "hpp" | "hxx" | "hh" | "h++" | "ipp" | "inl" => {
                Some(Language::Cpp)
            }
            _ => None,
        }
    }

    /// Get the language name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Get the tree-sitter language for this language
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Language::C => tree_sitter_c::LANGUAGE.into(),
            Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_path(Path::new("foo.c")), Some(Language::C));
        assert_eq!(Language::from_path(Path::new("foo.h")), Some(Language::C));
        assert_eq!(Language::from_path(Path::new("bar.cpp")), Some(Language::Cpp));
        assert_eq!(Language::from_path(Path::new("bar.HPP")), Some(Language::Cpp));
        assert_eq!(Language::from_path(Path::new("baz.cc")), Some(Language::Cpp));
        assert_eq!(Language::from_path(Path::new("main.rs")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }
}
