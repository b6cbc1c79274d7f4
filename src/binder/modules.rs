//! Module syntax: ES imports and exports, `require` and CommonJS exports.

use super::{
    Binder, Ctx, ExportSink, ExportTarget, ImportName, OccurrenceTarget, Span, SymbolKind,
    SymbolLink, EXPORT_EQUALS,
};
use super::scope::ScopeId;
use tree_sitter::Node;

impl<'a> Binder<'a> {
    fn add_request(&mut self, specifier: &str) -> usize {
        if let Some(idx) = self.requests.iter().position(|r| r == specifier) {
            return idx;
        }
        self.requests.push(specifier.to_string());
        self.requests.len() - 1
    }

    fn string_value(&self, node: Node<'a>) -> &'a str {
        let text = self.text(node);
        if text.len() >= 2 {
            &text[1..text.len() - 1]
        } else {
            text
        }
    }

    /// Name written in an import or export specifier.
    fn specifier_name(&self, node: Node<'a>) -> &'a str {
        if node.kind() == "string" {
            self.string_value(node)
        } else {
            self.text(node)
        }
    }

    fn export(&mut self, ctx: Ctx, name: &str, target: ExportTarget) {
        match ctx.sink {
            ExportSink::File => {
                self.exports.entry(name.to_string()).or_insert(target);
            }
            ExportSink::Namespace(namespace) => {
                if let ExportTarget::Symbol(symbol) = target {
                    self.symbols[namespace]
                        .members
                        .entry(name.to_string())
                        .or_insert(symbol);
                }
            }
            ExportSink::Discard => {}
        }
    }

    pub(super) fn visit_import(&mut self, node: Node<'a>, ctx: Ctx) {
        self.is_module = true;
        let request = node
            .child_by_field_name("source")
            .map(|source| self.string_value(source))
            .map(|specifier| self.add_request(specifier));

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_clause" => {
                    if let Some(request) = request {
                        self.bind_import_clause(child, ctx.scope, request);
                    }
                }
                "import_require_clause" => self.bind_import_require(child, ctx.scope),
                _ => {}
            }
        }
    }

    fn bind_import_clause(&mut self, clause: Node<'a>, scope: ScopeId, request: usize) {
        let mut cursor = clause.walk();
        for part in clause.named_children(&mut cursor) {
            match part.kind() {
                "identifier" => {
                    self.declare_linked(
                        scope,
                        part,
                        SymbolKind::Import,
                        SymbolLink::Import {
                            request,
                            name: ImportName::Default,
                        },
                    );
                }
                "namespace_import" => {
                    if let Some(name) = first_named_of_kind(part, "identifier") {
                        self.declare_linked(
                            scope,
                            name,
                            SymbolKind::Import,
                            SymbolLink::Namespace { request },
                        );
                    }
                }
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.named_children(&mut spec_cursor) {
                        if spec.kind() == "import_specifier" {
                            self.bind_import_specifier(spec, scope, request);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_import_specifier(&mut self, spec: Node<'a>, scope: ScopeId, request: usize) {
        let Some(name) = spec.child_by_field_name("name") else {
            return;
        };
        let link = SymbolLink::Import {
            request,
            name: ImportName::from_exported(self.specifier_name(name)),
        };
        match spec.child_by_field_name("alias") {
            Some(alias) => {
                let symbol = self.declare_linked(scope, alias, SymbolKind::Import, link);
                // `import { a as b }`: `a` names the same thing as `b`
                if name.kind() != "string" {
                    self.record(name, OccurrenceTarget::Symbol(symbol), false);
                }
            }
            None => {
                self.declare_linked(scope, name, SymbolKind::Import, link);
            }
        }
    }

    /// `import x = require('m')`
    fn bind_import_require(&mut self, clause: Node<'a>, scope: ScopeId) {
        let source = clause
            .child_by_field_name("source")
            .or_else(|| first_named_of_kind(clause, "string"));
        let name = first_named_of_kind(clause, "identifier");
        if let (Some(source), Some(name)) = (source, name) {
            let request = self.add_request(self.string_value(source));
            self.declare_linked(scope, name, SymbolKind::Import, SymbolLink::Require { request });
        }
    }

    pub(super) fn visit_export(&mut self, node: Node<'a>, ctx: Ctx) {
        if ctx.sink == ExportSink::File {
            self.is_module = true;
        }
        let request = node
            .child_by_field_name("source")
            .map(|source| self.string_value(source))
            .map(|specifier| self.add_request(specifier));
        let declaration = node.child_by_field_name("declaration");
        let value = node.child_by_field_name("value");

        let mut is_default = false;
        let mut export_equals = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if Some(child) == declaration {
                self.visit(child, ctx);
                for name in declaration_names(child) {
                    if let Some(symbol) = self.declared_by_node.get(&name.id()).copied() {
                        let exported = if is_default { "default" } else { self.text(name) };
                        self.export(ctx, exported, ExportTarget::Symbol(symbol));
                    }
                }
                continue;
            }
            if Some(child) == value || (export_equals && child.is_named()) {
                let exported = if export_equals { EXPORT_EQUALS } else { "default" };
                self.bind_export_value(child, ctx, exported);
                export_equals = false;
                continue;
            }

            match child.kind() {
                "default" => is_default = true,
                "=" => export_equals = true,
                "export_clause" => self.bind_export_clause(child, ctx, request),
                "namespace_export" => {
                    if let Some(request) = request {
                        self.bind_namespace_export(child, ctx, request);
                    }
                }
                "*" => {
                    if let Some(request) = request {
                        if ctx.sink == ExportSink::File {
                            self.star_exports.push(request);
                        }
                    }
                }
                _ => self.visit(child, ctx),
            }
        }
    }

    /// `export default <expr>` and `export = <expr>`.
    fn bind_export_value(&mut self, value: Node<'a>, ctx: Ctx, exported: &str) {
        match value.kind() {
            "identifier" => {
                if let Some(occurrence) = self.reference(value, ctx) {
                    self.export(ctx, exported, ExportTarget::Occurrence(occurrence));
                }
            }
            "class" => {
                // the class name, or the anonymous owner, is created first
                let first = self.symbols.len();
                self.visit(value, ctx);
                if first < self.symbols.len() {
                    self.export(ctx, exported, ExportTarget::Symbol(first));
                }
            }
            "function_expression" | "function" | "generator_function" | "arrow_function" => {
                self.visit(value, ctx);
                let named = value
                    .child_by_field_name("name")
                    .and_then(|name| self.declared_by_node.get(&name.id()).copied());
                let symbol = match named {
                    Some(symbol) => symbol,
                    None => self.new_symbol(exported, SymbolKind::Function, None, SymbolLink::None),
                };
                self.export(ctx, exported, ExportTarget::Symbol(symbol));
            }
            _ => self.visit(value, ctx),
        }
    }

    fn bind_export_clause(&mut self, clause: Node<'a>, ctx: Ctx, request: Option<usize>) {
        let mut cursor = clause.walk();
        for spec in clause.named_children(&mut cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(name) = spec.child_by_field_name("name") else {
                continue;
            };
            let alias = spec.child_by_field_name("alias");
            let local_name = self.specifier_name(name);
            let exported = alias.map(|a| self.specifier_name(a)).unwrap_or(local_name);

            // occurrence standing for the exported value inside this file
            let occurrence = match request {
                Some(request) => {
                    let link = SymbolLink::Import {
                        request,
                        name: ImportName::from_exported(local_name),
                    };
                    let span = (name.kind() != "string").then(|| Span::of(name));
                    let symbol = self.new_symbol(local_name, SymbolKind::Export, span, link);
                    if name.kind() == "string" {
                        // nothing to point at; export the linked symbol directly
                        self.export(ctx, exported, ExportTarget::Symbol(symbol));
                        continue;
                    }
                    self.record(name, OccurrenceTarget::Symbol(symbol), true)
                }
                None => {
                    if name.kind() != "identifier" {
                        continue;
                    }
                    match self.reference(name, ctx) {
                        Some(occurrence) => occurrence,
                        None => continue,
                    }
                }
            };

            match alias {
                Some(alias) if alias.kind() == "identifier" => {
                    let symbol = self.new_symbol(
                        exported,
                        SymbolKind::Export,
                        Some(Span::of(alias)),
                        SymbolLink::Occurrence(occurrence),
                    );
                    self.record(alias, OccurrenceTarget::Symbol(symbol), true);
                    self.export(ctx, exported, ExportTarget::Symbol(symbol));
                }
                _ => self.export(ctx, exported, ExportTarget::Occurrence(occurrence)),
            }
        }
    }

    /// `export * as ns from 'm'`
    fn bind_namespace_export(&mut self, node: Node<'a>, ctx: Ctx, request: usize) {
        let count = node.named_child_count();
        let Some(name) = count.checked_sub(1).and_then(|last| node.named_child(last)) else {
            return;
        };
        let exported = self.specifier_name(name);
        let span = (name.kind() == "identifier").then(|| Span::of(name));
        let symbol = self.new_symbol(
            exported,
            SymbolKind::Export,
            span,
            SymbolLink::Namespace { request },
        );
        if name.kind() == "identifier" {
            self.record(name, OccurrenceTarget::Symbol(symbol), true);
        }
        self.export(ctx, exported, ExportTarget::Symbol(symbol));
    }

    /// `require('m')` or `require('m').name`, returning the request and the
    /// accessed member.
    pub(super) fn require_call(&mut self, value: Node<'a>) -> Option<(usize, Option<String>)> {
        match value.kind() {
            "call_expression" => {
                let function = value.child_by_field_name("function")?;
                if function.kind() != "identifier" || self.text(function) != "require" {
                    return None;
                }
                let arguments = value.child_by_field_name("arguments")?;
                if arguments.named_child_count() != 1 {
                    return None;
                }
                let argument = arguments.named_child(0)?;
                if argument.kind() != "string" {
                    return None;
                }
                let specifier = self.string_value(argument);
                Some((self.add_request(specifier), None))
            }
            "member_expression" => {
                let object = value.child_by_field_name("object")?;
                let property = value.child_by_field_name("property")?;
                if property.kind() != "property_identifier" || object.kind() != "call_expression" {
                    return None;
                }
                let (request, _) = self.require_call(object)?;
                Some((request, Some(self.text(property).to_string())))
            }
            _ => None,
        }
    }

    pub(super) fn bind_require(
        &mut self,
        name: Node<'a>,
        scope: ScopeId,
        request: usize,
        member: Option<String>,
    ) {
        self.is_module = true;
        match (name.kind(), member) {
            ("identifier", None) => {
                self.declare_linked(
                    scope,
                    name,
                    SymbolKind::Import,
                    SymbolLink::Require { request },
                );
            }
            ("identifier", Some(member)) => {
                self.declare_linked(
                    scope,
                    name,
                    SymbolKind::Import,
                    SymbolLink::Import {
                        request,
                        name: ImportName::Named(member),
                    },
                );
            }
            ("object_pattern", None) => {
                let mut cursor = name.walk();
                for child in name.named_children(&mut cursor) {
                    self.bind_require_property(child, scope, request);
                }
            }
            _ => self.declare_pattern(name, scope, SymbolKind::Variable),
        }
    }

    /// One property of `const { a, b: c } = require('m')`.
    fn bind_require_property(&mut self, node: Node<'a>, scope: ScopeId, request: usize) {
        match node.kind() {
            "shorthand_property_identifier_pattern" => {
                let imported = self.text(node).to_string();
                self.declare_linked(
                    scope,
                    node,
                    SymbolKind::Import,
                    SymbolLink::Import {
                        request,
                        name: ImportName::Named(imported),
                    },
                );
            }
            "pair_pattern" => {
                let key = node.child_by_field_name("key");
                let value = node.child_by_field_name("value");
                match (key, value) {
                    (Some(key), Some(value))
                        if key.kind() == "property_identifier" && value.kind() == "identifier" =>
                    {
                        let imported = self.text(key).to_string();
                        let symbol = self.declare_linked(
                            scope,
                            value,
                            SymbolKind::Import,
                            SymbolLink::Import {
                                request,
                                name: ImportName::Named(imported),
                            },
                        );
                        self.record(key, OccurrenceTarget::Symbol(symbol), false);
                    }
                    (_, Some(value)) => self.declare_pattern(value, scope, SymbolKind::Variable),
                    _ => {}
                }
            }
            _ => self.declare_pattern(node, scope, SymbolKind::Variable),
        }
    }

    /// `exports.x = ...`, `module.exports.x = ...` and `module.exports = ...`.
    /// Returns false when the assignment is not a CommonJS export.
    pub(super) fn visit_commonjs_assignment(&mut self, node: Node<'a>, ctx: Ctx) -> bool {
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return false;
        };
        if left.kind() != "member_expression" {
            return false;
        }

        if self.is_module_exports(left, ctx) {
            self.is_module = true;
            match right.kind() {
                "identifier" => {
                    if let Some(occurrence) = self.reference(right, ctx) {
                        self.exports.insert(
                            EXPORT_EQUALS.to_string(),
                            ExportTarget::Occurrence(occurrence),
                        );
                    }
                }
                "object" => self.visit_commonjs_object(right, ctx),
                _ => {
                    let symbol =
                        self.new_symbol(EXPORT_EQUALS, SymbolKind::Export, None, SymbolLink::None);
                    self.exports
                        .insert(EXPORT_EQUALS.to_string(), ExportTarget::Symbol(symbol));
                    if right.kind() == "class" {
                        self.visit_class(right, ctx, Some(symbol));
                    } else {
                        self.visit(right, ctx);
                    }
                }
            }
            return true;
        }

        let (Some(object), Some(property)) = (
            left.child_by_field_name("object"),
            left.child_by_field_name("property"),
        ) else {
            return false;
        };
        let is_exports_object = (object.kind() == "identifier"
            && self.text(object) == "exports"
            && self.scopes.lookup(ctx.scope, "exports").is_none())
            || self.is_module_exports(object, ctx);
        if !is_exports_object || property.kind() != "property_identifier" {
            return false;
        }

        self.is_module = true;
        let name = self.text(property);
        self.bind_commonjs_export(name, Some(property), right, ctx);
        true
    }

    fn is_module_exports(&self, node: Node<'a>, ctx: Ctx) -> bool {
        if node.kind() != "member_expression" {
            return false;
        }
        let (Some(object), Some(property)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("property"),
        ) else {
            return false;
        };
        object.kind() == "identifier"
            && self.text(object) == "module"
            && self.text(property) == "exports"
            && self.scopes.lookup(ctx.scope, "module").is_none()
    }

    /// Export `name`, declared at `name_node`, with the value `value`.
    fn bind_commonjs_export(
        &mut self,
        name: &str,
        name_node: Option<Node<'a>>,
        value: Node<'a>,
        ctx: Ctx,
    ) {
        let link = if value.kind() == "identifier" {
            self.reference(value, ctx)
                .map(SymbolLink::Occurrence)
                .unwrap_or(SymbolLink::None)
        } else {
            SymbolLink::None
        };
        let span = name_node.map(Span::of);
        let symbol = self.new_symbol(name, SymbolKind::Export, span, link);
        if let Some(name_node) = name_node {
            self.record(name_node, OccurrenceTarget::Symbol(symbol), true);
        }
        self.exports
            .entry(name.to_string())
            .or_insert(ExportTarget::Symbol(symbol));

        match value.kind() {
            "identifier" => {}
            "object" => self.visit_object(value, ctx, Some(symbol)),
            "class" => self.visit_class(value, ctx, Some(symbol)),
            _ => self.visit(value, ctx),
        }
    }

    /// `module.exports = { a, b: c, m() {} }`
    fn visit_commonjs_object(&mut self, object: Node<'a>, ctx: Ctx) {
        let mut cursor = object.walk();
        for child in object.named_children(&mut cursor) {
            match child.kind() {
                "shorthand_property_identifier" => {
                    if let Some(occurrence) = self.reference(child, ctx) {
                        let name = self.text(child);
                        self.exports
                            .entry(name.to_string())
                            .or_insert(ExportTarget::Occurrence(occurrence));
                    }
                }
                "pair" => {
                    let (Some(key), Some(value)) = (
                        child.child_by_field_name("key"),
                        child.child_by_field_name("value"),
                    ) else {
                        self.visit(child, ctx);
                        continue;
                    };
                    match key.kind() {
                        "property_identifier" => {
                            let name = self.text(key);
                            self.bind_commonjs_export(name, Some(key), value, ctx);
                        }
                        "string" => {
                            let name = self.string_value(key);
                            self.bind_commonjs_export(name, None, value, ctx);
                        }
                        _ => self.visit(child, ctx),
                    }
                }
                "method_definition" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        if name.kind() == "property_identifier" {
                            let text = self.text(name);
                            let symbol = self.new_symbol(
                                text,
                                SymbolKind::Export,
                                Some(Span::of(name)),
                                SymbolLink::None,
                            );
                            self.record(name, OccurrenceTarget::Symbol(symbol), true);
                            self.exports
                                .entry(text.to_string())
                                .or_insert(ExportTarget::Symbol(symbol));
                        }
                    }
                    self.visit_function(
                        child,
                        Ctx {
                            this_owner: None,
                            ..ctx
                        },
                    );
                }
                _ => self.visit(child, ctx),
            }
        }
    }
}

fn first_named_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Name nodes bound by an exported declaration.
fn declaration_names(node: Node<'_>) -> Vec<Node<'_>> {
    let mut names = Vec::new();
    match node.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    pattern_names(name, &mut names);
                }
            }
        }
        "ambient_declaration" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                names.extend(declaration_names(child));
            }
        }
        _ => {
            if let Some(name) = node.child_by_field_name("name") {
                if matches!(name.kind(), "identifier" | "type_identifier") {
                    names.push(name);
                }
            }
        }
    }
    names
}

fn pattern_names<'t>(node: Node<'t>, names: &mut Vec<Node<'t>>) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => names.push(node),
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                pattern_names(left, names);
            }
        }
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                pattern_names(value, names);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                pattern_names(child, names);
            }
        }
        _ => {}
    }
}
