//! The program: every loaded source file, bound and linked.
//!
//! A [`ProgramBuilder`] collects source files one by one; files that cannot be
//! loaded are reported to the caller, which decides whether to skip them.
//! [`ProgramBuilder::build`] binds each file, resolves module requests between
//! files and collects the globals declared by script files.

pub mod config;

use crate::binder::{bind_file, FileBinding};
use crate::error::Result;
use crate::ingest::{load_source_file, parse_source, SourceFile};
use crate::resolve::engine::{self, ReferencedSymbol};
use crate::resolve::module_resolver::{normalize_path, ModuleIndex};
use config::ProjectConfig;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Index of a file inside a [`Program`].
pub type FileId = usize;

/// Program-wide symbol identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    /// File declaring the symbol.
    pub file: FileId,
    /// Index into that file's symbol table.
    pub index: usize,
}

/// A source file together with its binding.
#[derive(Debug)]
pub struct ProgramFile {
    /// Parsed source.
    pub source: SourceFile,
    /// Scopes, symbols and occurrences.
    pub binding: FileBinding,
    /// Target file of each module request, by request index.
    pub resolved_requests: Vec<Option<FileId>>,
}

/// All source files of one lookup.
#[derive(Debug)]
pub struct Program {
    config: ProjectConfig,
    files: Vec<ProgramFile>,
    index: ModuleIndex,
    globals: HashMap<String, SymbolId>,
}

impl Program {
    /// Configuration the program was built with.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Files in insertion order.
    pub fn files(&self) -> &[ProgramFile] {
        &self.files
    }

    /// File by id.
    pub fn file(&self, id: FileId) -> &ProgramFile {
        &self.files[id]
    }

    /// Id of the file loaded from `path`, compared after normalization.
    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.index.get(path)
    }

    /// Global declared by a script file.
    pub fn global(&self, name: &str) -> Option<SymbolId> {
        self.globals.get(name).copied()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file was loaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every reference to the symbol named by `node` in `file`.
    pub fn find_references(
        &self,
        file: FileId,
        node: tree_sitter::Node<'_>,
    ) -> Vec<ReferencedSymbol> {
        engine::find_references(self, file, node)
    }
}

/// Incrementally collects files for a [`Program`].
#[derive(Debug)]
pub struct ProgramBuilder {
    config: ProjectConfig,
    files: Vec<SourceFile>,
    seen: HashSet<PathBuf>,
}

impl ProgramBuilder {
    /// Start an empty program with the given configuration.
    pub fn new(config: ProjectConfig) -> Self {
        debug!(
            "program config: {}",
            config.to_json().unwrap_or_else(|e| e.to_string())
        );
        Self {
            config,
            files: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Read, parse and add a file. Adding the same path twice is a no-op.
    pub fn add_source_file_at_path(&mut self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        if self.seen.contains(&path) {
            return Ok(());
        }
        let file = load_source_file(&path)?;
        self.push(file);
        Ok(())
    }

    /// Add a file whose text is already in memory.
    pub fn add_source_text(&mut self, path: &Path, text: impl Into<String>) -> Result<()> {
        let path = normalize_path(path);
        if self.seen.contains(&path) {
            return Ok(());
        }
        let file = parse_source(&path, text.into())?;
        self.push(file);
        Ok(())
    }

    fn push(&mut self, file: SourceFile) {
        if file.root().has_error() {
            debug!("{} has syntax errors; keeping it", file.path.display());
        }
        self.seen.insert(file.path.clone());
        self.files.push(file);
    }

    /// Bind every file and link module requests.
    pub fn build(self) -> Program {
        let mut index = ModuleIndex::new();
        for (id, file) in self.files.iter().enumerate() {
            index.insert(&file.path, id);
        }
        if index.is_empty() {
            debug!("no source files to bind");
        }

        let mut files = Vec::with_capacity(self.files.len());
        let mut globals = HashMap::new();
        for (id, source) in self.files.into_iter().enumerate() {
            let binding = bind_file(&source);
            let resolved_requests: Vec<Option<FileId>> = binding
                .requests
                .iter()
                .map(|specifier| {
                    let target = index.resolve(&source.path, specifier);
                    if target.is_none() {
                        debug!(
                            "{}: unresolved module '{}'",
                            source.path.display(),
                            specifier
                        );
                    }
                    target
                })
                .collect();

            if !binding.is_module {
                for (name, symbol) in &binding.top_level {
                    globals.entry(name.clone()).or_insert(SymbolId {
                        file: id,
                        index: *symbol,
                    });
                }
            }

            files.push(ProgramFile {
                source,
                binding,
                resolved_requests,
            });
        }

        info!(
            "program built: {} files, {} script globals",
            index.len(),
            globals.len()
        );

        Program {
            config: self.config,
            files,
            index,
            globals,
        }
    }
}
