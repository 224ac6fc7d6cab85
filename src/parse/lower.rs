//! Lowering tree-sitter trees into a bound translation unit AST
//!
//! Walks the concrete syntax tree of a file (and, through `#include`, of every
//! header it reaches), keeps named declarations and references, follows
//! conditional-compilation branches selected by the macro table and binds
//! each reference to the declaration it names.
//!
//! Binding model:
//! - ordinary identifiers use a scope stack (file, function, block)
//! - struct/union/enum/class names live in a separate tag namespace
//! - fields and methods live in a member namespace
//! - a use binds to the most recent visible declaration before it; names
//!   that are not declared yet are bound at the end of the unit to the first
//!   declaration of that name
//!
//! @module parse/lower

use compact_str::CompactString;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use super::ast::{Ast, AstNode, CursorKind, Diagnostic, Location, NodeId};
use super::preprocess::{eval_condition, IncludeResolver, IncludeSpec, MacroTable};
use super::Language;
use crate::core::error::{Error, Result};

/// Syntax nesting past which subtrees are scanned without recursion
const MAX_NESTING: usize = 256;

/// Which table a name is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Ordinary,
    Tag,
    Member,
    /// Typedef names first, then tags
    Type,
}

/// One source file being lowered: its text and the path locations are attributed to
struct FileCtx<'s> {
    source: &'s [u8],
    path: PathBuf,
}

impl FileCtx<'_> {
    fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn location(&self, node: Node) -> Location {
        let point = node.start_position();
        Location::new(
            self.path.clone(),
            point.row as u32 + 1,
            point.column as u32 + 1,
        )
    }
}

/// Lowering state for one translation unit
pub(crate) struct Lowerer<'r> {
    ast: Ast,
    language: Language,
    macros: MacroTable,
    resolver: &'r IncludeResolver,
    included: HashSet<PathBuf>,
    scopes: Vec<HashMap<CompactString, NodeId>>,
    tags: HashMap<CompactString, NodeId>,
    members: HashMap<CompactString, NodeId>,
    /// First declaration of each file-scope name, for late binding
    first_global: HashMap<CompactString, NodeId>,
    pending: Vec<(NodeId, Namespace)>,
    depth: usize,
}

impl<'r> Lowerer<'r> {
    pub(crate) fn new(
        attributed_path: &Path,
        language: Language,
        macros: MacroTable,
        resolver: &'r IncludeResolver,
    ) -> Self {
        let mut included = HashSet::new();
        included.insert(attributed_path.to_path_buf());
        Self {
            ast: Ast::new(attributed_path),
            language,
            macros,
            resolver,
            included,
            scopes: vec![HashMap::new()],
            tags: HashMap::new(),
            members: HashMap::new(),
            first_global: HashMap::new(),
            pending: Vec::new(),
            depth: 0,
        }
    }

    /// Lower the main file of the unit and finish binding
    pub(crate) fn lower_main(mut self, source: &[u8], attributed_path: &Path) -> Result<Ast> {
        let tree = parse_tree(self.language, source).ok_or_else(|| Error::ParseFailure {
            path: attributed_path.to_path_buf(),
            message: "tree-sitter produced no tree".to_string(),
        })?;

        let ctx = FileCtx {
            source,
            path: attributed_path.to_path_buf(),
        };
        let root = self.ast.root();
        self.visit_children(tree.root_node(), root, &ctx);
        self.bind_pending();

        debug!(
            file = %attributed_path.display(),
            nodes = self.ast.len(),
            headers = self.ast.includes.len(),
            diagnostics = self.ast.diagnostics.len(),
            "Lowered translation unit"
        );
        Ok(self.ast)
    }

    // -------------------------------------------------------------------------
    // Node construction and binding
    // -------------------------------------------------------------------------

    fn add(
        &mut self,
        parent: NodeId,
        kind: CursorKind,
        spelling: &str,
        location: Location,
        has_body: bool,
    ) -> NodeId {
        self.ast.push(
            parent,
            AstNode {
                kind,
                spelling: CompactString::new(spelling),
                location,
                has_body,
                referenced: None,
                children: Vec::new(),
            },
        )
    }

    fn declare(
        &mut self,
        parent: NodeId,
        kind: CursorKind,
        name_node: Node,
        ctx: &FileCtx,
        has_body: bool,
        namespace: Namespace,
    ) -> NodeId {
        let name = ctx.text(name_node).to_string();
        let id = self.add(parent, kind, &name, ctx.location(name_node), has_body);
        self.bind(CompactString::new(&name), id, namespace);
        id
    }

    fn bind(&mut self, name: CompactString, id: NodeId, namespace: Namespace) {
        match namespace {
            Namespace::Ordinary | Namespace::Type => {
                if self.scopes.len() == 1 {
                    self.first_global.entry(name.clone()).or_insert(id);
                }
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name, id);
                }
            }
            Namespace::Tag => {
                self.tags.insert(name, id);
            }
            Namespace::Member => {
                self.members.insert(name, id);
            }
        }
    }

    fn lookup(&self, name: &str, namespace: Namespace) -> Option<NodeId> {
        let ordinary = || {
            self.scopes
                .iter()
                .rev()
                .find_map(|scope| scope.get(name).copied())
        };
        match namespace {
            Namespace::Ordinary => ordinary().or_else(|| {
                // Unqualified names inside member functions can mean members
                if self.language == Language::Cpp {
                    self.members.get(name).copied()
                } else {
                    None
                }
            }),
            Namespace::Tag => self.tags.get(name).copied(),
            Namespace::Member => self.members.get(name).copied(),
            Namespace::Type => ordinary().or_else(|| self.tags.get(name).copied()),
        }
    }

    fn reference(
        &mut self,
        parent: NodeId,
        kind: CursorKind,
        name_node: Node,
        ctx: &FileCtx,
        namespace: Namespace,
    ) -> NodeId {
        let name = ctx.text(name_node).to_string();
        let id = self.add(parent, kind, &name, ctx.location(name_node), false);
        match self.lookup(&name, namespace) {
            Some(target) => self.ast.node_mut(id).referenced = Some(target),
            None => self.pending.push((id, namespace)),
        }
        id
    }

    /// Bind references whose declaration came later in the unit
    fn bind_pending(&mut self) {
        for (id, namespace) in std::mem::take(&mut self.pending) {
            let name = self.ast.node(id).spelling.clone();
            let target = match namespace {
                Namespace::Ordinary => self
                    .first_global
                    .get(&name)
                    .or_else(|| self.members.get(&name))
                    .copied(),
                Namespace::Tag => self.tags.get(&name).copied(),
                Namespace::Member => self.members.get(&name).copied(),
                Namespace::Type => self
                    .first_global
                    .get(&name)
                    .or_else(|| self.tags.get(&name))
                    .copied(),
            };
            if let Some(target) = target {
                self.ast.node_mut(id).referenced = Some(target);
            }
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn diagnostic(&mut self, location: Location, message: impl Into<String>) {
        self.ast.diagnostics.push(Diagnostic {
            location,
            message: message.into(),
        });
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    fn visit_children(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child, parent, ctx);
        }
    }

    /// Visit named children except the given ones (compared by node id)
    fn visit_children_except(&mut self, node: Node, skip: &[Option<Node>], parent: NodeId, ctx: &FileCtx) {
        let skipped: Vec<usize> = skip.iter().flatten().map(|n| n.id()).collect();
        let mut cursor = node.walk();
        let children: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|c| !skipped.contains(&c.id()))
            .collect();
        for child in children {
            self.visit(child, parent, ctx);
        }
    }

    fn visit_field(&mut self, node: Node, field: &str, parent: NodeId, ctx: &FileCtx) {
        if let Some(child) = node.child_by_field_name(field) {
            self.visit(child, parent, ctx);
        }
    }

    fn visit(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        if self.depth >= MAX_NESTING {
            self.visit_flat(node, parent, ctx);
            return;
        }
        self.depth += 1;
        self.visit_node(node, parent, ctx);
        self.depth -= 1;
    }

    /// Reference scan over a subtree nested too deeply to recurse into
    ///
    /// Uses an explicit stack. Identifiers still become references in
    /// source order; declarations inside the subtree are not recorded.
    fn visit_flat(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let reference = match current.kind() {
                "identifier" => Some((CursorKind::DeclRefExpr, Namespace::Ordinary)),
                "type_identifier" => Some((CursorKind::TypeRef, Namespace::Type)),
                "field_identifier" => Some((CursorKind::MemberRefExpr, Namespace::Member)),
                "comment" | "string_literal" | "raw_string_literal" | "char_literal" => continue,
                _ => None,
            };
            if let Some((kind, namespace)) = reference {
                self.reference(parent, kind, current, ctx, namespace);
                continue;
            }
            let mut cursor = current.walk();
            let children: Vec<Node> = current.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn visit_node(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        if node.is_error() {
            self.diagnostic(ctx.location(node), "syntax error");
        } else if node.is_missing() {
            self.diagnostic(ctx.location(node), format!("missing {}", node.kind()));
            return;
        }

        match node.kind() {
            // Preprocessor
            "preproc_include" => self.visit_include(node, parent, ctx),
            "preproc_def" | "preproc_function_def" => self.visit_macro(node, parent, ctx),
            "preproc_call" => self.visit_preproc_call(node, ctx),
            "preproc_ifdef" | "preproc_elifdef" => self.visit_ifdef(node, parent, ctx),
            "preproc_if" | "preproc_elif" => self.visit_if(node, parent, ctx),
            "preproc_else" => self.visit_children(node, parent, ctx),

            // Declarations
            "function_definition" => self.visit_function_definition(node, parent, ctx),
            "declaration" => self.visit_declaration(node, parent, ctx),
            "field_declaration" => self.visit_field_declaration(node, parent, ctx),
            "parameter_declaration" | "optional_parameter_declaration" => {
                self.visit_parameter(node, parent, ctx)
            }
            "type_definition" => self.visit_type_definition(node, parent, ctx),
            "alias_declaration" => {
                self.visit_field(node, "type", parent, ctx);
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(parent, CursorKind::TypedefDecl, name, ctx, true, Namespace::Ordinary);
                }
            }
            "struct_specifier" => self.visit_record(node, CursorKind::StructDecl, parent, ctx),
            "union_specifier" => self.visit_record(node, CursorKind::UnionDecl, parent, ctx),
            "class_specifier" => self.visit_record(node, CursorKind::ClassDecl, parent, ctx),
            "enum_specifier" => self.visit_record(node, CursorKind::EnumDecl, parent, ctx),
            "enumerator" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(parent, CursorKind::EnumConstantDecl, name, ctx, true, Namespace::Ordinary);
                }
                self.visit_field(node, "value", parent, ctx);
            }
            "namespace_definition" => {
                let ns = match node.child_by_field_name("name") {
                    Some(name) if name.kind() == "namespace_identifier" => {
                        self.declare(parent, CursorKind::Namespace, name, ctx, true, Namespace::Ordinary)
                    }
                    _ => parent,
                };
                self.visit_field(node, "body", ns, ctx);
            }

            // References
            "call_expression" => self.visit_call(node, parent, ctx),
            "field_expression" => {
                self.visit_field(node, "argument", parent, ctx);
                if let Some(field) = node.child_by_field_name("field") {
                    self.visit_member_name(field, parent, ctx);
                }
            }
            "qualified_identifier" => {
                self.visit_qualified(node, CursorKind::DeclRefExpr, parent, ctx);
            }
            "identifier" => {
                self.reference(parent, CursorKind::DeclRefExpr, node, ctx, Namespace::Ordinary);
            }
            "type_identifier" => {
                self.reference(parent, CursorKind::TypeRef, node, ctx, Namespace::Type);
            }
            "namespace_identifier" => {
                self.reference(parent, CursorKind::NamespaceRef, node, ctx, Namespace::Ordinary);
            }
            "field_identifier" => {
                self.reference(parent, CursorKind::MemberRefExpr, node, ctx, Namespace::Member);
            }

            // Scopes
            "compound_statement" | "for_statement" | "for_range_loop" => {
                self.push_scope();
                self.visit_children(node, parent, ctx);
                self.pop_scope();
            }

            // Leaves without names
            "comment" | "string_literal" | "raw_string_literal" | "concatenated_string"
            | "char_literal" | "number_literal" | "primitive_type" | "sized_type_specifier"
            | "system_lib_string" | "preproc_arg" | "statement_identifier" | "escape_sequence" => {}

            _ => self.visit_children(node, parent, ctx),
        }
    }

    // -------------------------------------------------------------------------
    // Preprocessor directives
    // -------------------------------------------------------------------------

    fn visit_include(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let Some(path_node) = node.child_by_field_name("path") else {
            return;
        };
        let Some(spec) = IncludeSpec::parse(ctx.text(path_node)) else {
            return;
        };

        self.add(
            parent,
            CursorKind::InclusionDirective,
            &spec.name,
            ctx.location(path_node),
            false,
        );

        let Some(header) = self.resolver.resolve(&ctx.path, &spec) else {
            self.diagnostic(
                ctx.location(path_node),
                format!("'{}' file not found", spec.name),
            );
            return;
        };

        // Each header is expanded once per unit
        if !self.included.insert(header.clone()) {
            return;
        }

        // Raw bytes: text outside identifiers need not be UTF-8
        let source = match std::fs::read(&header) {
            Ok(source) => source,
            Err(e) => {
                self.diagnostic(
                    ctx.location(path_node),
                    format!("cannot read '{}': {}", header.display(), e),
                );
                return;
            }
        };

        // Headers are parsed with the including unit's grammar
        let Some(tree) = parse_tree(self.language, &source) else {
            self.diagnostic(ctx.location(path_node), format!("cannot parse '{}'", spec.name));
            return;
        };

        self.ast.includes.push(header.clone());
        let header_ctx = FileCtx {
            source: &source,
            path: header,
        };
        self.visit_children(tree.root_node(), parent, &header_ctx);
    }

    fn visit_macro(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let body = node.child_by_field_name("value").map(|v| ctx.text(v));
        let is_function_like = node.kind() == "preproc_function_def";
        self.macros.define(ctx.text(name), if is_function_like { Some("") } else { body });
        self.declare(parent, CursorKind::MacroDefinition, name, ctx, true, Namespace::Ordinary);
    }

    fn visit_preproc_call(&mut self, node: Node, ctx: &FileCtx) {
        let directive = node
            .child_by_field_name("directive")
            .map(|d| ctx.text(d).trim().to_string())
            .unwrap_or_default();
        if directive == "#undef" {
            if let Some(arg) = node.child_by_field_name("argument") {
                let name = ctx.text(arg).trim().to_string();
                self.macros.undefine(&name);
            }
        }
    }

    fn visit_ifdef(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let name = node.child_by_field_name("name");
        let alternative = node.child_by_field_name("alternative");
        let negated = node
            .child(0)
            .map(|kw| matches!(kw.kind(), "#ifndef" | "#elifndef"))
            .unwrap_or(false);
        let defined = name
            .map(|n| self.macros.is_defined(ctx.text(n)))
            .unwrap_or(false);

        if defined != negated {
            self.visit_children_except(node, &[name, alternative], parent, ctx);
        } else if let Some(alternative) = alternative {
            self.visit(alternative, parent, ctx);
        }
    }

    fn visit_if(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let condition = node.child_by_field_name("condition");
        let alternative = node.child_by_field_name("alternative");
        let taken = condition
            .map(|c| eval_condition(c, ctx.source, &self.macros))
            .unwrap_or(true);

        if taken {
            self.visit_children_except(node, &[condition, alternative], parent, ctx);
        } else if let Some(alternative) = alternative {
            self.visit(alternative, parent, ctx);
        }
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    fn visit_function_definition(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        self.visit_field(node, "type", parent, ctx);

        let Some(declarator) = node.child_by_field_name("declarator") else {
            self.visit_field(node, "body", parent, ctx);
            return;
        };
        let function = find_function_declarator(declarator);

        let id = match declarator_name(declarator) {
            Some(DeclName::Plain(name)) => {
                let in_class = is_inside_class_body(node);
                if in_class {
                    self.declare(parent, CursorKind::CxxMethod, name, ctx, true, Namespace::Member)
                } else {
                    self.declare(parent, CursorKind::FunctionDecl, name, ctx, true, Namespace::Ordinary)
                }
            }
            Some(DeclName::Qualified { scope, name }) => {
                if let Some(scope) = scope {
                    self.visit(scope, parent, ctx);
                }
                self.declare(parent, CursorKind::CxxMethod, name, ctx, true, Namespace::Member)
            }
            None => parent,
        };

        self.push_scope();
        if let Some(function) = function {
            self.visit_field(function, "parameters", id, ctx);
        }
        self.visit_field(node, "body", id, ctx);
        self.pop_scope();
    }

    fn visit_declaration(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        self.visit_field(node, "type", parent, ctx);
        let is_extern = has_storage_class(node, "extern", ctx);

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        for declarator in declarators {
            let (target, value) = if declarator.kind() == "init_declarator" {
                (
                    declarator.child_by_field_name("declarator"),
                    declarator.child_by_field_name("value"),
                )
            } else {
                (Some(declarator), None)
            };
            let Some(target) = target else { continue };

            if let Some(function) = find_function_declarator(target) {
                let id = match declarator_name(target) {
                    Some(DeclName::Plain(name)) => {
                        self.declare(parent, CursorKind::FunctionDecl, name, ctx, false, Namespace::Ordinary)
                    }
                    Some(DeclName::Qualified { name, .. }) => {
                        self.declare(parent, CursorKind::CxxMethod, name, ctx, false, Namespace::Member)
                    }
                    None => parent,
                };
                // Prototype parameter names do not leak into the enclosing scope
                self.push_scope();
                self.visit_field(function, "parameters", id, ctx);
                self.pop_scope();
            } else if let Some(DeclName::Plain(name)) = declarator_name(target) {
                let id = self.declare(parent, CursorKind::VarDecl, name, ctx, !is_extern, Namespace::Ordinary);
                self.visit_array_sizes(target, id, ctx);
                if let Some(value) = value {
                    self.visit(value, id, ctx);
                }
            } else if let Some(value) = value {
                self.visit(value, parent, ctx);
            }
        }
    }

    fn visit_field_declaration(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        self.visit_field(node, "type", parent, ctx);

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        for declarator in declarators {
            let Some(DeclName::Plain(name)) = declarator_name(declarator) else {
                continue;
            };
            if let Some(function) = find_function_declarator(declarator) {
                let id = self.declare(parent, CursorKind::CxxMethod, name, ctx, false, Namespace::Member);
                self.push_scope();
                self.visit_field(function, "parameters", id, ctx);
                self.pop_scope();
            } else {
                let id = self.declare(parent, CursorKind::FieldDecl, name, ctx, true, Namespace::Member);
                self.visit_array_sizes(declarator, id, ctx);
            }
        }
        self.visit_field(node, "default_value", parent, ctx);
    }

    fn visit_parameter(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        self.visit_field(node, "type", parent, ctx);
        if let Some(declarator) = node.child_by_field_name("declarator") {
            if let Some(DeclName::Plain(name)) = declarator_name(declarator) {
                self.declare(parent, CursorKind::ParmDecl, name, ctx, true, Namespace::Ordinary);
            }
        }
        self.visit_field(node, "default_value", parent, ctx);
    }

    fn visit_type_definition(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        self.visit_field(node, "type", parent, ctx);

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            if let Some(DeclName::Plain(name)) = declarator_name(declarator) {
                self.declare(parent, CursorKind::TypedefDecl, name, ctx, true, Namespace::Ordinary);
            }
        }
    }

    /// struct / union / class / enum specifiers
    fn visit_record(&mut self, node: Node, kind: CursorKind, parent: NodeId, ctx: &FileCtx) {
        let raw_name = node.child_by_field_name("name");
        let body = node.child_by_field_name("body");

        let name = match raw_name {
            Some(n) if n.kind() == "qualified_identifier" => n.child_by_field_name("name"),
            other => other,
        };

        let id = match (name, body) {
            (Some(name), Some(_)) => self.declare(parent, kind, name, ctx, true, Namespace::Tag),
            (Some(name), None) => {
                if self.lookup(ctx.text(name), Namespace::Tag).is_some() {
                    self.reference(parent, CursorKind::TypeRef, name, ctx, Namespace::Tag);
                } else {
                    // Implicit forward declaration
                    self.declare(parent, kind, name, ctx, false, Namespace::Tag);
                }
                return;
            }
            (None, _) => parent,
        };

        self.visit_children_except(node, &[raw_name, body], id, ctx);
        if let Some(body) = body {
            self.visit_children(body, id, ctx);
        }
    }

    fn visit_array_sizes(&mut self, declarator: Node, parent: NodeId, ctx: &FileCtx) {
        let mut current = Some(declarator);
        while let Some(node) = current {
            if node.kind() == "array_declarator" {
                self.visit_field(node, "size", parent, ctx);
            }
            current = node.child_by_field_name("declarator");
        }
    }

    // -------------------------------------------------------------------------
    // Expressions
    // -------------------------------------------------------------------------

    fn visit_call(&mut self, node: Node, parent: NodeId, ctx: &FileCtx) {
        let callee = node.child_by_field_name("function");
        let call = match callee {
            Some(f) if f.kind() == "identifier" => {
                self.reference(parent, CursorKind::CallExpr, f, ctx, Namespace::Ordinary)
            }
            Some(f) if f.kind() == "qualified_identifier" => {
                self.visit_qualified(f, CursorKind::CallExpr, parent, ctx)
            }
            Some(f) => {
                self.visit(f, parent, ctx);
                parent
            }
            None => parent,
        };
        self.visit_field(node, "arguments", call, ctx);
    }

    fn visit_member_name(&mut self, field: Node, parent: NodeId, ctx: &FileCtx) {
        match field.kind() {
            "field_identifier" => {
                self.reference(parent, CursorKind::MemberRefExpr, field, ctx, Namespace::Member);
            }
            _ => self.visit(field, parent, ctx),
        }
    }

    /// `scope::name`; returns the node created for `name`, or `parent`
    fn visit_qualified(&mut self, node: Node, kind: CursorKind, parent: NodeId, ctx: &FileCtx) -> NodeId {
        self.visit_field(node, "scope", parent, ctx);
        let Some(name) = node.child_by_field_name("name") else {
            return parent;
        };
        match name.kind() {
            "identifier" | "field_identifier" => {
                let spelling = ctx.text(name).to_string();
                let namespace = if self.lookup(&spelling, Namespace::Member).is_some()
                    && self.lookup(&spelling, Namespace::Ordinary).is_none()
                {
                    Namespace::Member
                } else {
                    Namespace::Ordinary
                };
                self.reference(parent, kind, name, ctx, namespace)
            }
            "qualified_identifier" => self.visit_qualified(name, kind, parent, ctx),
            _ => {
                self.visit(name, parent, ctx);
                parent
            }
        }
    }
}

// =============================================================================
// DECLARATOR HELPERS
// =============================================================================

/// Name introduced by a declarator
enum DeclName<'t> {
    Plain(Node<'t>),
    Qualified {
        scope: Option<Node<'t>>,
        name: Node<'t>,
    },
}

/// Descend through pointer/array/function/init declarators to the declared name
fn declarator_name(declarator: Node) -> Option<DeclName> {
    let mut current = declarator;
    loop {
        match current.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "operator_name"
            | "destructor_name" => return Some(DeclName::Plain(current)),
            "qualified_identifier" => {
                let name = current.child_by_field_name("name")?;
                if name.kind() == "qualified_identifier" {
                    current = name;
                    continue;
                }
                return Some(DeclName::Qualified {
                    scope: current.child_by_field_name("scope"),
                    name,
                });
            }
            "parenthesized_declarator" => current = current.named_child(0)?,
            "reference_declarator" => current = current.named_child(0)?,
            _ => current = current.child_by_field_name("declarator")?,
        }
    }
}

/// The function declarator directly shaping this declarator, if any
///
/// Stops at pointer declarators wrapped in parentheses, since
/// `int (*fp)(void)` declares a variable, not a function.
fn find_function_declarator(declarator: Node) -> Option<Node> {
    let mut current = declarator;
    loop {
        match current.kind() {
            "function_declarator" => {
                let inner = current.child_by_field_name("declarator")?;
                if inner.kind() == "parenthesized_declarator" {
                    return None;
                }
                return Some(current);
            }
            "pointer_declarator" | "reference_declarator" | "init_declarator"
            | "attributed_declarator" => {
                current = current
                    .child_by_field_name("declarator")
                    .or_else(|| current.named_child(0))?;
            }
            _ => return None,
        }
    }
}

fn has_storage_class(node: Node, class: &str, ctx: &FileCtx) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind() == "storage_class_specifier" && ctx.text(c) == class);
    found
}

fn is_inside_class_body(node: Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "field_declaration_list")
        .unwrap_or(false)
}

pub(crate) fn parse_tree(language: Language, source: &[u8]) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&language.tree_sitter_language()).ok()?;
    parser.parse(source, None)
}
