//! Per-file binding: scopes, declarations, occurrences, imports and exports.
//!
//! A single traversal of the syntax tree records every declaration and every
//! identifier use of a file. Uses are resolved against the scope tree once the
//! traversal is over, so hoisted declarations are visible throughout their
//! scope. Cross-file meaning (imports, re-exports, globals, member access
//! through other modules) is left as links for the program to follow.
//!
//! Binding never fails: error nodes produced by tree-sitter are walked like any
//! other node, so a partially broken file still yields its declarations.

mod modules;
pub mod scope;

use crate::ingest::SourceFile;
use scope::{ScopeId, ScopeKind, ScopeTree};
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

/// Export name used for `export = x` and `module.exports = x`.
pub const EXPORT_EQUALS: &str = "export=";

/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Span covered by a node.
    pub fn of(node: Node<'_>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies within this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Kinds of symbols the binder declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// `var`, `let` or `const` binding.
    Variable,
    /// Function or catch parameter.
    Parameter,
    /// Function declaration or named function expression.
    Function,
    /// Class declaration or expression.
    Class,
    /// TypeScript interface.
    Interface,
    /// TypeScript type alias.
    TypeAlias,
    /// TypeScript enum.
    Enum,
    /// TypeScript namespace.
    Namespace,
    /// Generic type parameter.
    TypeParameter,
    /// Local name introduced by an import or `require`.
    Import,
    /// Name introduced by an export clause or CommonJS export.
    Export,
    /// Class, enum, namespace or object literal member.
    Member,
}

/// Name requested from another module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import x from 'm'`
    Default,
    /// `import { x } from 'm'`
    Named(String),
}

impl ImportName {
    /// Map an exported name (`default` included) to an import name.
    pub fn from_exported(name: &str) -> Self {
        if name == "default" {
            ImportName::Default
        } else {
            ImportName::Named(name.to_string())
        }
    }
}

/// How a symbol takes its meaning from somewhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolLink {
    /// The symbol stands on its own.
    None,
    /// Same meaning as the occurrence with this index in the same file.
    Occurrence(usize),
    /// Name imported from the module request with this index.
    Import {
        /// Index into [`FileBinding::requests`].
        request: usize,
        /// Name requested.
        name: ImportName,
    },
    /// `import * as ns` / `export * as ns`: the whole module.
    Namespace {
        /// Index into [`FileBinding::requests`].
        request: usize,
    },
    /// `x = require('m')`: `module.exports` of the module if assigned, the
    /// module namespace otherwise.
    Require {
        /// Index into [`FileBinding::requests`].
        request: usize,
    },
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Declared name.
    pub name: String,
    /// What declared it.
    pub kind: SymbolKind,
    /// Span of the first declaring name, if the symbol has one.
    pub declaration: Option<Span>,
    /// Where the meaning comes from.
    pub link: SymbolLink,
    /// Members reachable through `symbol.name`.
    pub members: HashMap<String, usize>,
}

/// What an occurrence refers to, as far as the file alone can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurrenceTarget {
    /// A symbol of this file.
    Symbol(usize),
    /// Not declared in this file; looked up among script globals.
    Global(String),
    /// `object.name`, where `object` is another occurrence of this file.
    Member {
        /// Occurrence index of the object expression.
        object: usize,
        /// Property name.
        name: String,
    },
    /// `this.name` inside a class body or object literal method.
    ThisMember {
        /// Symbol owning the members.
        owner: usize,
        /// Property name.
        name: String,
    },
}

/// A name in the source text together with what it refers to.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// Span of the name.
    pub span: Span,
    /// Referenced entity.
    pub target: OccurrenceTarget,
    /// Whether this occurrence declares the symbol.
    pub is_definition: bool,
}

/// Value bound to an export name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// A symbol of the exporting file.
    Symbol(usize),
    /// Whatever the occurrence with this index refers to.
    Occurrence(usize),
}

/// Result of binding one file.
#[derive(Debug, Default)]
pub struct FileBinding {
    /// Declared symbols, indexed by local symbol id.
    pub symbols: Vec<Symbol>,
    /// Every recorded name, in source order of recording.
    pub occurrences: Vec<Occurrence>,
    /// Module specifiers used by imports, re-exports and `require`.
    pub requests: Vec<String>,
    /// Exported names.
    pub exports: HashMap<String, ExportTarget>,
    /// Requests re-exported with `export * from`.
    pub star_exports: Vec<usize>,
    /// Whether the file uses ES module or CommonJS syntax.
    pub is_module: bool,
    /// Bindings of the program scope, sorted by name.
    pub top_level: Vec<(String, usize)>,
}

impl FileBinding {
    /// Smallest occurrence whose span contains `span`.
    pub fn occurrence_at(&self, span: Span) -> Option<usize> {
        self.occurrences
            .iter()
            .enumerate()
            .filter(|(_, occ)| occ.span.contains(span))
            .min_by_key(|(_, occ)| occ.span.len())
            .map(|(idx, _)| idx)
    }
}

/// Bind a parsed file.
pub fn bind_file(file: &SourceFile) -> FileBinding {
    let mut binder = Binder::new(file);
    let root = file.root();
    let ctx = Ctx {
        scope: binder.scopes.root(),
        this_owner: None,
        sink: ExportSink::File,
    };
    binder.visit_children(root, ctx);
    binder.finish()
}

/// Where `export` statements deposit their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportSink {
    File,
    Namespace(usize),
    Discard,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx {
    scope: ScopeId,
    this_owner: Option<usize>,
    sink: ExportSink,
}

pub(crate) struct Binder<'a> {
    file: &'a SourceFile,
    scopes: ScopeTree,
    symbols: Vec<Symbol>,
    occurrences: Vec<Occurrence>,
    pending: Vec<(usize, ScopeId, String)>,
    occurrence_by_node: HashMap<usize, usize>,
    skipped: HashSet<usize>,
    declared_by_node: HashMap<usize, usize>,
    requests: Vec<String>,
    exports: HashMap<String, ExportTarget>,
    star_exports: Vec<usize>,
    is_module: bool,
}

impl<'a> Binder<'a> {
    fn new(file: &'a SourceFile) -> Self {
        Self {
            file,
            scopes: ScopeTree::new(),
            symbols: Vec::new(),
            occurrences: Vec::new(),
            pending: Vec::new(),
            occurrence_by_node: HashMap::new(),
            skipped: HashSet::new(),
            declared_by_node: HashMap::new(),
            requests: Vec::new(),
            exports: HashMap::new(),
            star_exports: Vec::new(),
            is_module: false,
        }
    }

    fn finish(mut self) -> FileBinding {
        for (occurrence, scope, name) in std::mem::take(&mut self.pending) {
            if let Some(symbol) = self.scopes.lookup(scope, &name) {
                self.occurrences[occurrence].target = OccurrenceTarget::Symbol(symbol);
            }
        }

        FileBinding {
            top_level: self.scopes.top_level(),
            symbols: self.symbols,
            occurrences: self.occurrences,
            requests: self.requests,
            exports: self.exports,
            star_exports: self.star_exports,
            is_module: self.is_module,
        }
    }

    fn text(&self, node: Node<'a>) -> &'a str {
        let file: &'a SourceFile = self.file;
        file.node_text(node)
    }

    fn new_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        declaration: Option<Span>,
        link: SymbolLink,
    ) -> usize {
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            declaration,
            link,
            members: HashMap::new(),
        });
        self.symbols.len() - 1
    }

    fn record(&mut self, node: Node<'a>, target: OccurrenceTarget, is_definition: bool) -> usize {
        self.occurrences.push(Occurrence {
            span: Span::of(node),
            target,
            is_definition,
        });
        let idx = self.occurrences.len() - 1;
        self.occurrence_by_node.insert(node.id(), idx);
        idx
    }

    fn declare(&mut self, scope: ScopeId, node: Node<'a>, kind: SymbolKind) -> usize {
        self.declare_linked(scope, node, kind, SymbolLink::None)
    }

    /// Declare the name held by `node` in `scope`. Redeclarations in the same
    /// scope merge into the first symbol.
    fn declare_linked(
        &mut self,
        scope: ScopeId,
        node: Node<'a>,
        kind: SymbolKind,
        link: SymbolLink,
    ) -> usize {
        let name = self.text(node);
        let symbol = match self.scopes.local(scope, name) {
            Some(existing) => existing,
            None => {
                let symbol = self.new_symbol(name, kind, Some(Span::of(node)), link);
                self.scopes.bind(scope, name, symbol)
            }
        };
        self.record(node, OccurrenceTarget::Symbol(symbol), true);
        self.declared_by_node.insert(node.id(), symbol);
        symbol
    }

    /// Declare `node` as a member of `owner`.
    fn declare_member(&mut self, owner: usize, node: Node<'a>) -> usize {
        let name = self.text(node);
        let member = match self.symbols[owner].members.get(name) {
            Some(existing) => *existing,
            None => {
                let member = self.new_symbol(
                    name,
                    SymbolKind::Member,
                    Some(Span::of(node)),
                    SymbolLink::None,
                );
                self.symbols[owner].members.insert(name.to_string(), member);
                member
            }
        };
        self.record(node, OccurrenceTarget::Symbol(member), true);
        member
    }

    /// Add a member that means the same as an existing occurrence.
    fn link_member(&mut self, owner: usize, name: &str, occurrence: usize) {
        if self.symbols[owner].members.contains_key(name) {
            return;
        }
        let member = self.new_symbol(
            name,
            SymbolKind::Member,
            None,
            SymbolLink::Occurrence(occurrence),
        );
        self.symbols[owner].members.insert(name.to_string(), member);
    }

    /// Record a use of the name held by `node`, resolved after the traversal.
    fn reference(&mut self, node: Node<'a>, ctx: Ctx) -> Option<usize> {
        if let Some(idx) = self.occurrence_by_node.get(&node.id()) {
            return Some(*idx);
        }
        if self.skipped.contains(&node.id()) {
            return None;
        }
        let name = self.text(node).to_string();
        let idx = self.record(node, OccurrenceTarget::Global(name.clone()), false);
        self.pending.push((idx, ctx.scope, name));
        Some(idx)
    }

    fn visit_children(&mut self, node: Node<'a>, ctx: Ctx) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, ctx);
        }
    }

    fn visit(&mut self, node: Node<'a>, ctx: Ctx) {
        match node.kind() {
            "import_statement" => return self.visit_import(node, ctx),
            "export_statement" => return self.visit_export(node, ctx),
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(ctx.scope, name, SymbolKind::Function);
                }
                return self.visit_function(node, ctx);
            }
            "function_expression"
            | "generator_function"
            | "arrow_function"
            | "method_definition"
            | "method_signature"
            | "abstract_method_signature"
            | "function_type"
            | "constructor_type"
            | "call_signature"
            | "construct_signature" => return self.visit_function(node, ctx),
            "function" if node.is_named() => return self.visit_function(node, ctx),
            "class_declaration" | "abstract_class_declaration" => {
                return self.visit_class(node, ctx, None)
            }
            "class" if node.is_named() => return self.visit_class(node, ctx, None),
            "lexical_declaration" | "variable_declaration" => {
                return self.visit_variable_declaration(node, ctx)
            }
            "interface_declaration" | "type_alias_declaration" => {
                return self.visit_type_declaration(node, ctx)
            }
            "enum_declaration" => return self.visit_enum(node, ctx),
            "internal_module" => return self.visit_namespace(node, ctx),
            "module" if node.is_named() => return self.visit_namespace(node, ctx),
            "statement_block" | "switch_body" => {
                let scope = self.scopes.push(ctx.scope, ScopeKind::Block);
                return self.visit_children(node, Ctx { scope, ..ctx });
            }
            "for_statement" | "for_in_statement" => return self.visit_loop(node, ctx),
            "catch_clause" => return self.visit_catch(node, ctx),
            "member_expression" => {
                self.visit_member(node, ctx);
                return;
            }
            "nested_type_identifier" | "nested_identifier" => {
                self.visit_nested(node, ctx);
                return;
            }
            "assignment_expression" => {
                if self.visit_commonjs_assignment(node, ctx) {
                    return;
                }
            }
            "object" => return self.visit_object(node, ctx, None),
            "jsx_opening_element" | "jsx_closing_element" | "jsx_self_closing_element" => {
                self.skip_intrinsic_element(node)
            }
            "identifier"
            | "type_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern" => {
                self.reference(node, ctx);
                return;
            }
            _ => {}
        }

        self.visit_children(node, ctx);
    }

    /// Functions, methods, arrows and call signatures: parameters and type
    /// parameters live in a fresh function scope.
    fn visit_function(&mut self, node: Node<'a>, ctx: Ctx) {
        let scope = self.scopes.push(ctx.scope, ScopeKind::Function);
        let this_owner = match node.kind() {
            "arrow_function" | "method_definition" => ctx.this_owner,
            _ => None,
        };
        let inner = Ctx {
            scope,
            this_owner,
            sink: ExportSink::Discard,
        };

        if matches!(
            node.kind(),
            "function_expression" | "function" | "generator_function"
        ) {
            if let Some(name) = node.child_by_field_name("name") {
                self.declare(scope, name, SymbolKind::Function);
            }
        }

        self.declare_type_parameters(node, scope);

        let is_constructor = node.kind() == "method_definition"
            && node
                .child_by_field_name("name")
                .map(|n| self.text(n) == "constructor")
                .unwrap_or(false);

        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                self.declare_pattern(param, scope, SymbolKind::Parameter);
                if is_constructor {
                    if let Some(owner) = ctx.this_owner {
                        self.declare_parameter_property(param, owner);
                    }
                }
            }
        }
        if let Some(param) = node.child_by_field_name("parameter") {
            self.declare_pattern(param, scope, SymbolKind::Parameter);
        }

        let body = node.child_by_field_name("body");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if Some(child) == body && child.kind() == "statement_block" {
                self.visit_children(child, inner);
            } else {
                self.visit(child, inner);
            }
        }
    }

    /// `constructor(private x: T)` also declares the member `x`.
    fn declare_parameter_property(&mut self, param: Node<'a>, owner: usize) {
        if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
            return;
        }
        let mut cursor = param.walk();
        let is_property = param
            .children(&mut cursor)
            .any(|c| matches!(c.kind(), "accessibility_modifier" | "readonly"));
        if !is_property {
            return;
        }
        let Some(pattern) = param.child_by_field_name("pattern") else {
            return;
        };
        if pattern.kind() != "identifier" {
            return;
        }
        if let Some(occurrence) = self.occurrence_by_node.get(&pattern.id()).copied() {
            let name = self.text(pattern);
            self.link_member(owner, name, occurrence);
        }
    }

    fn declare_type_parameters(&mut self, node: Node<'a>, scope: ScopeId) {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return;
        };
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if param.kind() != "type_parameter" {
                continue;
            }
            if let Some(name) = param.child_by_field_name("name") {
                self.declare(scope, name, SymbolKind::TypeParameter);
            }
        }
    }

    /// Declare every name bound by a parameter or destructuring pattern.
    fn declare_pattern(&mut self, node: Node<'a>, scope: ScopeId, kind: SymbolKind) {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                self.declare(scope, node, kind);
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(pattern) = node.child_by_field_name("pattern") {
                    self.declare_pattern(pattern, scope, kind);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.declare_pattern(left, scope, kind);
                }
            }
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.declare_pattern(value, scope, kind);
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.declare_pattern(child, scope, kind);
                }
            }
            _ => {}
        }
    }

    fn visit_class(&mut self, node: Node<'a>, ctx: Ctx, owner: Option<usize>) {
        let class_scope = self.scopes.push(ctx.scope, ScopeKind::Class);
        let name = node.child_by_field_name("name");
        let symbol = match name {
            // a class expression's name is only visible inside the class
            Some(name) if node.kind() == "class" => {
                Some(self.declare(class_scope, name, SymbolKind::Class))
            }
            Some(name) => Some(self.declare(ctx.scope, name, SymbolKind::Class)),
            None => None,
        };
        let owner = match owner.or(symbol) {
            Some(owner) => owner,
            None => self.new_symbol("<class>", SymbolKind::Class, None, SymbolLink::None),
        };

        self.declare_type_parameters(node, class_scope);

        let outer = Ctx {
            scope: class_scope,
            ..ctx
        };
        let inner = Ctx {
            scope: class_scope,
            this_owner: Some(owner),
            sink: ExportSink::Discard,
        };
        let body = node.child_by_field_name("body");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if Some(child) == body {
                self.visit_class_body(child, inner, owner);
            } else {
                self.visit(child, outer);
            }
        }
    }

    fn visit_class_body(&mut self, body: Node<'a>, ctx: Ctx, owner: usize) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    if let Some(name) = member.child_by_field_name("name") {
                        if is_member_name(name) && self.text(name) != "constructor" {
                            self.declare_member(owner, name);
                        }
                    }
                    self.visit_function(member, ctx);
                }
                "public_field_definition" | "field_definition" => {
                    let name = member
                        .child_by_field_name("name")
                        .or_else(|| member.child_by_field_name("property"));
                    if let Some(name) = name {
                        if is_member_name(name) {
                            self.declare_member(owner, name);
                        }
                    }
                    self.visit_children(member, ctx);
                }
                _ => self.visit(member, ctx),
            }
        }
    }

    fn visit_variable_declaration(&mut self, node: Node<'a>, ctx: Ctx) {
        let scope = if node.kind() == "variable_declaration" {
            self.scopes.hoist_target(ctx.scope)
        } else {
            ctx.scope
        };
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "variable_declarator" {
                self.visit_declarator(child, scope, ctx);
            } else {
                self.visit(child, ctx);
            }
        }
    }

    fn visit_declarator(&mut self, declarator: Node<'a>, scope: ScopeId, ctx: Ctx) {
        let Some(name) = declarator.child_by_field_name("name") else {
            return self.visit_children(declarator, ctx);
        };
        let value = declarator.child_by_field_name("value");

        if let Some(value) = value {
            if let Some((request, member)) = self.require_call(value) {
                self.bind_require(name, scope, request, member);
                let mut cursor = declarator.walk();
                for child in declarator.children(&mut cursor) {
                    if child != name && child != value {
                        self.visit(child, ctx);
                    }
                }
                return;
            }
        }

        self.declare_pattern(name, scope, SymbolKind::Variable);
        let owner = if name.kind() == "identifier" {
            self.declared_by_node.get(&name.id()).copied()
        } else {
            None
        };

        let mut cursor = declarator.walk();
        for child in declarator.children(&mut cursor) {
            if Some(child) != value {
                self.visit(child, ctx);
                continue;
            }
            match (child.kind(), owner) {
                ("object", Some(owner)) => self.visit_object(child, ctx, Some(owner)),
                ("class", Some(owner)) => self.visit_class(child, ctx, Some(owner)),
                _ => self.visit(child, ctx),
            }
        }
    }

    fn visit_type_declaration(&mut self, node: Node<'a>, ctx: Ctx) {
        let kind = if node.kind() == "interface_declaration" {
            SymbolKind::Interface
        } else {
            SymbolKind::TypeAlias
        };
        if let Some(name) = node.child_by_field_name("name") {
            self.declare(ctx.scope, name, kind);
        }
        let scope = self.scopes.push(ctx.scope, ScopeKind::Declaration);
        self.declare_type_parameters(node, scope);
        self.visit_children(node, Ctx { scope, ..ctx });
    }

    fn visit_enum(&mut self, node: Node<'a>, ctx: Ctx) {
        let symbol = node
            .child_by_field_name("name")
            .map(|name| self.declare(ctx.scope, name, SymbolKind::Enum));

        let body = node.child_by_field_name("body");
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if Some(child) != body {
                self.visit(child, ctx);
                continue;
            }
            let mut body_cursor = child.walk();
            for member in child.named_children(&mut body_cursor) {
                let name = match member.kind() {
                    "property_identifier" => Some(member),
                    "enum_assignment" => member.child_by_field_name("name"),
                    _ => None,
                };
                if let (Some(owner), Some(name)) = (symbol, name) {
                    if is_member_name(name) {
                        self.declare_member(owner, name);
                    }
                }
                if member.kind() == "enum_assignment" {
                    self.visit_children(member, ctx);
                }
            }
        }
    }

    fn visit_namespace(&mut self, node: Node<'a>, ctx: Ctx) {
        let symbol = match node.child_by_field_name("name") {
            Some(name) if name.kind() == "identifier" => {
                Some(self.declare(ctx.scope, name, SymbolKind::Namespace))
            }
            // `namespace A.B {}` binds `A`; members land on it
            Some(name) if name.kind() == "nested_identifier" => leftmost_identifier(name)
                .map(|first| self.declare(ctx.scope, first, SymbolKind::Namespace)),
            _ => None,
        };

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let scope = self.scopes.push(ctx.scope, ScopeKind::Namespace);
        let sink = match symbol {
            Some(symbol) => ExportSink::Namespace(symbol),
            None => ExportSink::Discard,
        };
        self.visit_children(
            body,
            Ctx {
                scope,
                this_owner: None,
                sink,
            },
        );
    }

    fn visit_loop(&mut self, node: Node<'a>, ctx: Ctx) {
        let scope = self.scopes.push(ctx.scope, ScopeKind::Loop);
        if node.kind() == "for_in_statement" {
            let mut cursor = node.walk();
            let keyword = node
                .children(&mut cursor)
                .find(|c| matches!(c.kind(), "var" | "let" | "const"))
                .map(|c| c.kind());
            if let (Some(keyword), Some(left)) = (keyword, node.child_by_field_name("left")) {
                let target = if keyword == "var" {
                    self.scopes.hoist_target(ctx.scope)
                } else {
                    scope
                };
                self.declare_pattern(left, target, SymbolKind::Variable);
            }
        }
        self.visit_children(node, Ctx { scope, ..ctx });
    }

    fn visit_catch(&mut self, node: Node<'a>, ctx: Ctx) {
        let scope = self.scopes.push(ctx.scope, ScopeKind::Catch);
        if let Some(param) = node.child_by_field_name("parameter") {
            self.declare_pattern(param, scope, SymbolKind::Parameter);
        }
        self.visit_children(node, Ctx { scope, ..ctx });
    }

    /// `object.property`; returns the occurrence recorded for the property.
    fn visit_member(&mut self, node: Node<'a>, ctx: Ctx) -> Option<usize> {
        let object = node.child_by_field_name("object");
        let property = node.child_by_field_name("property");
        let (Some(object), Some(property)) = (object, property) else {
            self.visit_children(node, ctx);
            return None;
        };

        let base = self.visit_member_base(object, ctx);

        if !matches!(
            property.kind(),
            "property_identifier" | "private_property_identifier"
        ) {
            return None;
        }
        self.record_member(property, base)
    }

    /// `A.B` in type positions and namespace names.
    fn visit_nested(&mut self, node: Node<'a>, ctx: Ctx) -> Option<usize> {
        let count = node.named_child_count();
        let (Some(object), Some(name)) = (node.named_child(0), node.named_child(count.max(1) - 1))
        else {
            return None;
        };
        if count < 2 {
            self.visit_children(node, ctx);
            return None;
        }

        let base = self.visit_member_base(object, ctx);

        if !matches!(
            name.kind(),
            "identifier" | "type_identifier" | "property_identifier"
        ) {
            return None;
        }
        self.record_member(name, base)
    }

    fn visit_member_base(&mut self, object: Node<'a>, ctx: Ctx) -> Option<MemberBase> {
        match object.kind() {
            "identifier" => self.reference(object, ctx).map(MemberBase::Occurrence),
            "member_expression" => self.visit_member(object, ctx).map(MemberBase::Occurrence),
            "nested_identifier" | "nested_type_identifier" => {
                self.visit_nested(object, ctx).map(MemberBase::Occurrence)
            }
            "this" => ctx.this_owner.map(MemberBase::Owner),
            _ => {
                self.visit(object, ctx);
                None
            }
        }
    }

    fn record_member(&mut self, name_node: Node<'a>, base: Option<MemberBase>) -> Option<usize> {
        let name = self.text(name_node).to_string();
        let target = match base? {
            MemberBase::Occurrence(object) => OccurrenceTarget::Member { object, name },
            MemberBase::Owner(owner) => OccurrenceTarget::ThisMember { owner, name },
        };
        Some(self.record(name_node, target, false))
    }

    /// Object literal; with an owner, its properties become owner members.
    fn visit_object(&mut self, node: Node<'a>, ctx: Ctx, owner: Option<usize>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "pair" => {
                    let key = child.child_by_field_name("key");
                    let value = child.child_by_field_name("value");
                    let member = match (owner, key) {
                        (Some(owner), Some(key)) if is_member_name(key) => {
                            Some(self.declare_member(owner, key))
                        }
                        _ => None,
                    };
                    let mut pair_cursor = child.walk();
                    for part in child.children(&mut pair_cursor) {
                        match (Some(part) == value, part.kind(), member) {
                            (true, "object", Some(member)) => {
                                self.visit_object(part, ctx, Some(member))
                            }
                            _ => self.visit(part, ctx),
                        }
                    }
                }
                "method_definition" => {
                    if let (Some(owner), Some(name)) = (owner, child.child_by_field_name("name")) {
                        if is_member_name(name) {
                            self.declare_member(owner, name);
                        }
                    }
                    self.visit_function(
                        child,
                        Ctx {
                            this_owner: owner,
                            ..ctx
                        },
                    );
                }
                "shorthand_property_identifier" => {
                    if let Some(occurrence) = self.reference(child, ctx) {
                        if let Some(owner) = owner {
                            let name = self.text(child);
                            self.link_member(owner, name, occurrence);
                        }
                    }
                }
                _ => self.visit(child, ctx),
            }
        }
    }

    /// Lowercase JSX tags are intrinsic elements, not references.
    fn skip_intrinsic_element(&mut self, node: Node<'a>) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        if name.kind() != "identifier" {
            return;
        }
        let starts_lowercase = self
            .text(name)
            .chars()
            .next()
            .map(|c| c.is_ascii_lowercase())
            .unwrap_or(false);
        if starts_lowercase {
            self.skipped.insert(name.id());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MemberBase {
    Occurrence(usize),
    Owner(usize),
}

fn is_member_name(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "property_identifier" | "private_property_identifier" | "identifier" | "type_identifier"
    )
}

fn leftmost_identifier(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        if current.kind() == "identifier" {
            return Some(current);
        }
        current = current.named_child(0)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_source;
    use std::path::Path;

    fn bind(name: &str, text: &str) -> (SourceFile, FileBinding) {
        let file = parse_source(Path::new(name), text.to_string()).expect("parse");
        let binding = bind_file(&file);
        (file, binding)
    }

    /// Byte offset of the `n`th occurrence (0-based) of `needle`.
    fn nth(text: &str, needle: &str, n: usize) -> usize {
        text.match_indices(needle)
            .nth(n)
            .map(|(idx, _)| idx)
            .expect("needle present")
    }

    /// First symbol declared with this name.
    fn symbol_named(binding: &FileBinding, name: &str) -> Option<usize> {
        binding.symbols.iter().position(|s| s.name == name)
    }

    fn target_at(binding: &FileBinding, offset: usize) -> OccurrenceTarget {
        let idx = binding
            .occurrence_at(Span {
                start: offset,
                end: offset + 1,
            })
            .expect("occurrence at offset");
        binding.occurrences[idx].target.clone()
    }

    #[test]
    fn test_parameter_shadows_outer_binding() {
        let text = "const x = 1;\nfunction f(x: number) { return x; }\nx;\n";
        let (_, binding) = bind("a.ts", text);

        let outer = target_at(&binding, nth(text, "x", 0));
        let param = target_at(&binding, nth(text, "x", 1));
        let inner_use = target_at(&binding, nth(text, "x", 2));
        let outer_use = target_at(&binding, nth(text, "x", 3));

        assert_eq!(outer, outer_use);
        assert_eq!(param, inner_use);
        assert_ne!(outer, param);
    }

    #[test]
    fn test_var_hoists_out_of_blocks_but_let_does_not() {
        let text = "function f() { if (a) { var v = 1; } return v; }\n{ let w = 1; }\nw;\n";
        let (_, binding) = bind("a.js", text);

        assert_eq!(
            target_at(&binding, nth(text, "v =", 0)),
            target_at(&binding, nth(text, "v;", 0))
        );
        assert_eq!(
            target_at(&binding, nth(text, "w", 1)),
            OccurrenceTarget::Global("w".to_string())
        );
    }

    #[test]
    fn test_use_before_declaration_resolves() {
        let text = "g();\nfunction g() {}\n";
        let (_, binding) = bind("a.js", text);
        assert_eq!(
            target_at(&binding, nth(text, "g", 0)),
            target_at(&binding, nth(text, "g", 1))
        );
        assert!(!binding.is_module);
        assert!(binding.top_level.iter().any(|(name, _)| name == "g"));
    }

    #[test]
    fn test_renamed_import() {
        let text = "import { a as b } from './m';\nb();\n";
        let (_, binding) = bind("a.ts", text);

        assert!(binding.is_module);
        assert_eq!(binding.requests, vec!["./m".to_string()]);
        let symbol = symbol_named(&binding, "b").expect("b");
        assert_eq!(
            binding.symbols[symbol].link,
            SymbolLink::Import {
                request: 0,
                name: ImportName::Named("a".to_string())
            }
        );
        assert_eq!(
            target_at(&binding, nth(text, "a ", 0)),
            OccurrenceTarget::Symbol(symbol)
        );
        assert_eq!(
            target_at(&binding, nth(text, "b", 1)),
            OccurrenceTarget::Symbol(symbol)
        );
    }

    #[test]
    fn test_default_and_namespace_imports() {
        let text = "import D, * as ns from './m';\n";
        let (_, binding) = bind("a.ts", text);
        let d = symbol_named(&binding, "D").expect("D");
        let ns = symbol_named(&binding, "ns").expect("ns");
        assert_eq!(
            binding.symbols[d].link,
            SymbolLink::Import {
                request: 0,
                name: ImportName::Default
            }
        );
        assert_eq!(binding.symbols[ns].link, SymbolLink::Namespace { request: 0 });
    }

    #[test]
    fn test_es_exports() {
        let text = "export const x = 1;\nexport function f() {}\nexport default class C {}\nconst y = 2;\nexport { y as z };\nexport * from './s';\n";
        let (_, binding) = bind("a.ts", text);

        for name in ["x", "f", "default", "z"] {
            assert!(binding.exports.contains_key(name), "missing export {}", name);
        }
        assert!(!binding.exports.contains_key("y"));
        assert_eq!(binding.star_exports, vec![0]);
        assert_eq!(binding.requests, vec!["./s".to_string()]);

        let c = symbol_named(&binding, "C").expect("C");
        assert_eq!(binding.exports["default"], ExportTarget::Symbol(c));
    }

    #[test]
    fn test_reexport_creates_linked_symbol() {
        let text = "export { helper as h } from './util';\n";
        let (_, binding) = bind("a.ts", text);
        let local = symbol_named(&binding, "helper").expect("helper");
        assert_eq!(
            binding.symbols[local].link,
            SymbolLink::Import {
                request: 0,
                name: ImportName::Named("helper".to_string())
            }
        );
        assert!(binding.exports.contains_key("h"));
    }

    #[test]
    fn test_commonjs_require_and_exports() {
        let text = "const { a, b: c } = require('./m');\nconst whole = require('./w');\nexports.run = function () {};\nmodule.exports.other = a;\n";
        let (_, binding) = bind("a.js", text);

        assert!(binding.is_module);
        let a = symbol_named(&binding, "a").expect("a");
        let c = symbol_named(&binding, "c").expect("c");
        let whole = symbol_named(&binding, "whole").expect("whole");
        assert_eq!(
            binding.symbols[a].link,
            SymbolLink::Import {
                request: 0,
                name: ImportName::Named("a".to_string())
            }
        );
        assert_eq!(
            binding.symbols[c].link,
            SymbolLink::Import {
                request: 0,
                name: ImportName::Named("b".to_string())
            }
        );
        assert_eq!(binding.symbols[whole].link, SymbolLink::Require { request: 1 });
        assert!(binding.exports.contains_key("run"));
        assert!(binding.exports.contains_key("other"));
    }

    #[test]
    fn test_module_exports_assignment() {
        let text = "function main() {}\nmodule.exports = main;\n";
        let (_, binding) = bind("a.js", text);
        let ExportTarget::Occurrence(occurrence) = binding.exports[EXPORT_EQUALS].clone() else {
            panic!("expected occurrence export");
        };
        let main = symbol_named(&binding, "main").expect("main");
        assert_eq!(
            binding.occurrences[occurrence].target,
            OccurrenceTarget::Symbol(main)
        );
    }

    #[test]
    fn test_this_member_in_class() {
        let text = "class K {\n  count = 0;\n  inc() { this.count++; }\n}\n";
        let (_, binding) = bind("a.ts", text);
        let k = symbol_named(&binding, "K").expect("K");
        assert!(binding.symbols[k].members.contains_key("count"));
        assert!(binding.symbols[k].members.contains_key("inc"));
        assert_eq!(
            target_at(&binding, nth(text, "count", 1)),
            OccurrenceTarget::ThisMember {
                owner: k,
                name: "count".to_string()
            }
        );
    }

    #[test]
    fn test_constructor_parameter_property_becomes_member() {
        let text = "class S {\n  constructor(private repo: string) {}\n  get() { return this.repo; }\n}\n";
        let (_, binding) = bind("a.ts", text);
        let s = symbol_named(&binding, "S").expect("S");
        let member = binding.symbols[s].members["repo"];
        assert!(matches!(
            binding.symbols[member].link,
            SymbolLink::Occurrence(_)
        ));
    }

    #[test]
    fn test_enum_members_and_access() {
        let text = "enum Color { Red, Green = 2 }\nColor.Red;\n";
        let (_, binding) = bind("a.ts", text);
        let color = symbol_named(&binding, "Color").expect("Color");
        assert!(binding.symbols[color].members.contains_key("Red"));
        assert!(binding.symbols[color].members.contains_key("Green"));

        let OccurrenceTarget::Member { object, name } = target_at(&binding, nth(text, "Red", 1))
        else {
            panic!("expected member access");
        };
        assert_eq!(name, "Red");
        assert_eq!(
            binding.occurrences[object].target,
            OccurrenceTarget::Symbol(color)
        );
    }

    #[test]
    fn test_namespace_exports_become_members() {
        let text = "namespace NS {\n  export const v = 1;\n  const hidden = 2;\n}\n";
        let (_, binding) = bind("a.ts", text);
        let ns = symbol_named(&binding, "NS").expect("NS");
        assert!(binding.symbols[ns].members.contains_key("v"));
        assert!(!binding.symbols[ns].members.contains_key("hidden"));
        assert!(!binding.is_module);
    }

    #[test]
    fn test_object_literal_members() {
        let text = "const api = { load() {}, limit: 3 };\napi.load();\n";
        let (_, binding) = bind("a.js", text);
        let api = symbol_named(&binding, "api").expect("api");
        let load = binding.symbols[api].members["load"];
        assert_eq!(
            target_at(&binding, nth(text, "load", 0)),
            OccurrenceTarget::Symbol(load)
        );
        assert!(binding.symbols[api].members.contains_key("limit"));
    }

    #[test]
    fn test_intrinsic_jsx_elements_are_not_references() {
        let text = "const A = () => <div><Button /></div>;\n";
        let (file, binding) = bind("App.jsx", text);
        let texts: Vec<&str> = binding
            .occurrences
            .iter()
            .map(|o| &file.text[o.span.start..o.span.end])
            .collect();
        assert!(!texts.contains(&"div"));
        assert_eq!(
            target_at(&binding, nth(text, "Button", 0)),
            OccurrenceTarget::Global("Button".to_string())
        );
    }

    #[test]
    fn test_type_parameters_are_scoped() {
        let text = "function id<T>(v: T): T { return v; }\ntype U = T;\n";
        let (_, binding) = bind("a.ts", text);
        let t = target_at(&binding, nth(text, "T", 0));
        assert_eq!(t, target_at(&binding, nth(text, "T", 1)));
        assert_eq!(
            target_at(&binding, nth(text, "T", 3)),
            OccurrenceTarget::Global("T".to_string())
        );
    }

    #[test]
    fn test_catch_parameter() {
        let text = "try {} catch (err) { log(err); }\nerr;\n";
        let (_, binding) = bind("a.js", text);
        assert_eq!(
            target_at(&binding, nth(text, "err", 0)),
            target_at(&binding, nth(text, "err", 1))
        );
        assert_eq!(
            target_at(&binding, nth(text, "err", 2)),
            OccurrenceTarget::Global("err".to_string())
        );
    }
}
