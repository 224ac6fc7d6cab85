//! Translation unit AST
//!
//! A flat arena of named nodes produced by lowering the tree-sitter trees of
//! a source file and every header it pulls in. Only nodes that carry a name
//! (declarations and references) plus the translation unit root are kept;
//! punctuation and anonymous structure is dropped during lowering.
//!
//! @module parse/ast

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// CURSOR KIND
// =============================================================================

/// Syntactic kind of an AST node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorKind {
    TranslationUnit,
    // Declaration kinds
    FunctionDecl,
    CxxMethod,
    VarDecl,
    ParmDecl,
    FieldDecl,
    StructDecl,
    UnionDecl,
    ClassDecl,
    EnumDecl,
    EnumConstantDecl,
    TypedefDecl,
    Namespace,
    MacroDefinition,
    // Uses
    DeclRefExpr,
    CallExpr,
    MemberRefExpr,
    TypeRef,
    NamespaceRef,
    InclusionDirective,
}

impl CursorKind {
    /// True for kinds that declare a symbol rather than refer to one
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Self::FunctionDecl
                | Self::CxxMethod
                | Self::VarDecl
                | Self::ParmDecl
                | Self::FieldDecl
                | Self::StructDecl
                | Self::UnionDecl
                | Self::ClassDecl
                | Self::EnumDecl
                | Self::EnumConstantDecl
                | Self::TypedefDecl
                | Self::Namespace
                | Self::MacroDefinition
        )
    }

    /// Function-like declarations, the ones a prototype-only match sends to fallback search
    pub fn is_function(&self) -> bool {
        matches!(self, Self::FunctionDecl | Self::CxxMethod)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TranslationUnit => "translation_unit",
            Self::FunctionDecl => "function_decl",
            Self::CxxMethod => "cxx_method",
            Self::VarDecl => "var_decl",
            Self::ParmDecl => "parm_decl",
            Self::FieldDecl => "field_decl",
            Self::StructDecl => "struct_decl",
            Self::UnionDecl => "union_decl",
            Self::ClassDecl => "class_decl",
            Self::EnumDecl => "enum_decl",
            Self::EnumConstantDecl => "enum_constant_decl",
            Self::TypedefDecl => "typedef_decl",
            Self::Namespace => "namespace",
            Self::MacroDefinition => "macro_definition",
            Self::DeclRefExpr => "decl_ref_expr",
            Self::CallExpr => "call_expr",
            Self::MemberRefExpr => "member_ref_expr",
            Self::TypeRef => "type_ref",
            Self::NamespaceRef => "namespace_ref",
            Self::InclusionDirective => "inclusion_directive",
        }
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// LOCATION
// =============================================================================

/// Source position: 1-indexed line, 1-indexed byte column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

// =============================================================================
// NODES
// =============================================================================

/// Index of a node inside its `Ast`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: CursorKind,
    pub spelling: CompactString,
    pub location: Location,
    /// Declaration also provides the definition (function body, struct body, ...)
    pub has_body: bool,
    /// Declaration this node refers to, if bound
    pub referenced: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Non-fatal problem reported while building the AST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

// =============================================================================
// AST
// =============================================================================

/// AST of one translation unit
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<AstNode>,
    main_file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Headers expanded into this unit, in inclusion order
    pub includes: Vec<PathBuf>,
}

impl Ast {
    /// Create an AST holding only the translation unit root
    pub fn new(main_file: impl Into<PathBuf>) -> Self {
        let main_file = main_file.into();
        let root = AstNode {
            kind: CursorKind::TranslationUnit,
            spelling: CompactString::new(main_file.to_string_lossy()),
            location: Location::new(main_file.clone(), 1, 1),
            has_body: true,
            referenced: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            main_file,
            diagnostics: Vec::new(),
            includes: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn main_file(&self) -> &Path {
        &self.main_file
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Append a node as the last child of `parent`
    pub fn push(&mut self, parent: NodeId, node: AstNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// The declaration node referenced by `id`
    pub fn referenced(&self, id: NodeId) -> Option<&AstNode> {
        self.node(id).referenced.map(|r| self.node(r))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Depth-first pre-order walk over every descendant of the root
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.node(self.root()).children.clone();
        stack.reverse();
        Descendants { ast: self, stack }
    }
}

/// Iterator returned by [`Ast::descendants`]
pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a AstNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.ast.node(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some((id, node))
    }
}
