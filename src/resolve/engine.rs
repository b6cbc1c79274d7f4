//! Cross-file linking and the find-references query.
//!
//! Every occurrence resolves to a *direct* symbol: the local declaration,
//! import alias, export alias or member it names. Following links from there
//! (imports through exports, re-exports, `require`, export aliases) reaches
//! the *canonical* symbol. Two occurrences reference the same thing when their
//! canonical symbols are equal.

use crate::binder::{
    ExportTarget, FileBinding, ImportName, OccurrenceTarget, Span, SymbolKind, SymbolLink,
    EXPORT_EQUALS,
};
use crate::program::{FileId, Program, SymbolId};
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;

/// Longest chain of links followed before giving up.
pub const MAX_LINK_DEPTH: usize = 64;

/// One place where a symbol is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// File containing the reference.
    pub file: FileId,
    /// Absolute path of that file.
    pub path: PathBuf,
    /// Byte range of the name.
    pub span: Span,
    /// Line (1-based).
    pub line: usize,
    /// Column (1-based, UTF-16 code units).
    pub column: usize,
    /// Whether this is a declaration of the symbol.
    pub is_definition: bool,
}

/// References grouped by the symbol they resolve to directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedSymbol {
    /// Symbol the grouped occurrences name.
    pub definition: SymbolId,
    /// Name of that symbol.
    pub name: String,
    /// What declared that symbol.
    pub kind: SymbolKind,
    /// Span of the symbol's declaring name, when it has one.
    pub declaration: Option<Span>,
    /// Occurrences, in program file order.
    pub references: Vec<Reference>,
}

/// Follows symbol links across the files of a program.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'p> {
    program: &'p Program,
}

impl<'p> Resolver<'p> {
    /// Resolver over `program`.
    pub fn new(program: &'p Program) -> Self {
        Self { program }
    }

    fn binding(&self, file: FileId) -> &'p FileBinding {
        &self.program.file(file).binding
    }

    fn request_target(&self, file: FileId, request: usize) -> Option<FileId> {
        self.program
            .file(file)
            .resolved_requests
            .get(request)
            .copied()
            .flatten()
    }

    /// Symbol an occurrence names directly, if any.
    pub fn occurrence_symbol(
        &self,
        file: FileId,
        occurrence: usize,
        depth: usize,
    ) -> Option<SymbolId> {
        if depth > MAX_LINK_DEPTH {
            return None;
        }
        let occ = self.binding(file).occurrences.get(occurrence)?;
        match &occ.target {
            OccurrenceTarget::Symbol(index) => Some(SymbolId { file, index: *index }),
            OccurrenceTarget::Global(name) => self.program.global(name),
            OccurrenceTarget::Member { object, name } => {
                let object = self.occurrence_symbol(file, *object, depth + 1)?;
                let object = self.canonical_from(object, depth + 1);
                self.member_of(object, name, depth + 1)
            }
            OccurrenceTarget::ThisMember { owner, name } => {
                self.member_of(SymbolId { file, index: *owner }, name, depth + 1)
            }
        }
    }

    /// Follow links from `symbol` until they run out.
    pub fn canonical(&self, symbol: SymbolId) -> SymbolId {
        self.canonical_from(symbol, 0)
    }

    fn canonical_from(&self, symbol: SymbolId, depth: usize) -> SymbolId {
        let mut chain = vec![symbol];
        let mut depth = depth;
        while depth <= MAX_LINK_DEPTH {
            let current = chain[chain.len() - 1];
            let Some(next) = self.step(current, depth) else {
                return current;
            };
            if let Some(start) = chain.iter().position(|s| *s == next) {
                // cycle: settle on its smallest member
                return chain[start..].iter().copied().min().unwrap_or(next);
            }
            chain.push(next);
            depth += 1;
        }
        debug!("link chain from {:?} exceeded depth limit", symbol);
        chain[chain.len() - 1]
    }

    /// Follow one link.
    fn step(&self, symbol: SymbolId, depth: usize) -> Option<SymbolId> {
        let sym = &self.binding(symbol.file).symbols[symbol.index];
        match &sym.link {
            SymbolLink::None | SymbolLink::Namespace { .. } => None,
            SymbolLink::Occurrence(occurrence) => {
                self.occurrence_symbol(symbol.file, *occurrence, depth + 1)
            }
            SymbolLink::Import { request, name } => {
                let target = self.request_target(symbol.file, *request)?;
                match name {
                    ImportName::Named(name) => {
                        self.resolve_export(target, name, depth + 1).or_else(|| {
                            // named import from a module that assigns `module.exports`
                            let whole = self.resolve_export(target, EXPORT_EQUALS, depth + 1)?;
                            let whole = self.canonical_from(whole, depth + 1);
                            self.member_of(whole, name, depth + 1)
                        })
                    }
                    ImportName::Default => self
                        .resolve_export(target, "default", depth + 1)
                        .or_else(|| {
                            if self.program.config().compiler_options.es_module_interop {
                                self.resolve_export(target, EXPORT_EQUALS, depth + 1)
                            } else {
                                None
                            }
                        }),
                }
            }
            SymbolLink::Require { request } => {
                let target = self.request_target(symbol.file, *request)?;
                self.resolve_export(target, EXPORT_EQUALS, depth + 1)
            }
        }
    }

    /// Symbol exported from `file` under `name`, through `export *` as needed.
    pub fn resolve_export(&self, file: FileId, name: &str, depth: usize) -> Option<SymbolId> {
        if depth > MAX_LINK_DEPTH {
            return None;
        }
        let binding = self.binding(file);
        if let Some(target) = binding.exports.get(name) {
            return match target {
                ExportTarget::Symbol(index) => Some(SymbolId { file, index: *index }),
                ExportTarget::Occurrence(occurrence) => {
                    self.occurrence_symbol(file, *occurrence, depth + 1)
                }
            };
        }
        // `export *` never forwards the default export
        if name == "default" || name == EXPORT_EQUALS {
            return None;
        }
        binding.star_exports.iter().find_map(|request| {
            let target = self.request_target(file, *request)?;
            self.resolve_export(target, name, depth + 1)
        })
    }

    /// Member `name` of an (already canonical) owner symbol.
    pub fn member_of(&self, owner: SymbolId, name: &str, depth: usize) -> Option<SymbolId> {
        if depth > MAX_LINK_DEPTH {
            return None;
        }
        let sym = &self.binding(owner.file).symbols[owner.index];
        match &sym.link {
            SymbolLink::Namespace { request } | SymbolLink::Require { request } => {
                let target = self.request_target(owner.file, *request)?;
                self.resolve_export(target, name, depth + 1)
            }
            // default import of a module without a default export
            SymbolLink::Import {
                request,
                name: ImportName::Default,
            } if self.program.config().compiler_options.es_module_interop => {
                let target = self.request_target(owner.file, *request)?;
                self.resolve_export(target, name, depth + 1)
            }
            _ => sym.members.get(name).map(|index| SymbolId {
                file: owner.file,
                index: *index,
            }),
        }
    }
}

/// Find every occurrence in the program that names the same symbol as the
/// occurrence covering `node`.
///
/// Returns an empty list when `node` is not part of a symbol occurrence or
/// names something undeclared. Declarations are included.
pub fn find_references(
    program: &Program,
    file: FileId,
    node: tree_sitter::Node<'_>,
) -> Vec<ReferencedSymbol> {
    let resolver = Resolver::new(program);
    let binding = &program.file(file).binding;

    let Some(occurrence) = binding.occurrence_at(Span::of(node)) else {
        debug!("node {} is not a symbol occurrence", node.kind());
        return Vec::new();
    };
    let Some(direct) = resolver.occurrence_symbol(file, occurrence, 0) else {
        debug!("occurrence does not resolve to a declared symbol");
        return Vec::new();
    };
    let target = resolver.canonical(direct);
    let target_file = program.file(target.file);
    let target_symbol = &target_file.binding.symbols[target.index];
    match target_symbol.declaration {
        Some(span) => {
            let (line, column) = target_file.source.line_column(span.start);
            debug!(
                "canonical {:?} '{}' declared at {}:{}:{}",
                target_symbol.kind,
                target_symbol.name,
                target_file.source.path.display(),
                line,
                column
            );
        }
        None => debug!(
            "canonical {:?} '{}' in {} has no declaring name",
            target_symbol.kind,
            target_symbol.name,
            target_file.source.path.display()
        ),
    }

    let mut groups: Vec<ReferencedSymbol> = Vec::new();
    let mut group_of: HashMap<SymbolId, usize> = HashMap::new();

    for (file_id, program_file) in program.files().iter().enumerate() {
        for (idx, occ) in program_file.binding.occurrences.iter().enumerate() {
            let Some(direct) = resolver.occurrence_symbol(file_id, idx, 0) else {
                continue;
            };
            if resolver.canonical(direct) != target {
                continue;
            }

            let group = *group_of.entry(direct).or_insert_with(|| {
                let symbol = &program.file(direct.file).binding.symbols[direct.index];
                groups.push(ReferencedSymbol {
                    definition: direct,
                    name: symbol.name.clone(),
                    kind: symbol.kind,
                    declaration: symbol.declaration,
                    references: Vec::new(),
                });
                groups.len() - 1
            });

            let (line, column) = program_file.source.line_column(occ.span.start);
            groups[group].references.push(Reference {
                file: file_id,
                path: program_file.source.path.clone(),
                span: occ.span,
                line,
                column,
                is_definition: occ.is_definition,
            });
        }
    }

    debug!(
        "{} reference groups, {} references",
        groups.len(),
        groups.iter().map(|g| g.references.len()).sum::<usize>()
    );
    groups
}
