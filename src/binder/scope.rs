//! Lexical scope tree used while binding a single file.

use std::collections::HashMap;

/// Index of a scope inside a [`ScopeTree`].
pub type ScopeId = usize;

/// What introduced a scope. Decides where `var` declarations land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The file itself.
    Program,
    /// Function, method, arrow function or signature parameters.
    Function,
    /// Statement block or switch body.
    Block,
    /// `for` / `for-in` / `for-of` header.
    Loop,
    /// `catch (e)` clause.
    Catch,
    /// Class expression name and class type parameters.
    Class,
    /// Interface or type alias type parameters.
    Declaration,
    /// Body of a TypeScript `namespace` / `module`.
    Namespace,
}

impl ScopeKind {
    /// Scopes that capture hoisted `var` declarations.
    pub fn is_hoist_target(&self) -> bool {
        matches!(
            self,
            ScopeKind::Program | ScopeKind::Function | ScopeKind::Namespace
        )
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    bindings: HashMap<String, usize>,
}

/// Arena of scopes for one file. Scope 0 is always the program scope.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree holding only the program scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Program,
                bindings: HashMap::new(),
            }],
        }
    }

    /// The program scope.
    pub fn root(&self) -> ScopeId {
        0
    }

    /// Open a child scope.
    pub fn push(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            bindings: HashMap::new(),
        });
        self.scopes.len() - 1
    }

    /// Kind of a scope.
    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope].kind
    }

    /// Nearest enclosing scope (including `scope`) that receives `var` declarations.
    pub fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let entry = &self.scopes[current];
            if entry.kind.is_hoist_target() {
                return current;
            }
            match entry.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// Symbol already bound to `name` directly in `scope`.
    pub fn local(&self, scope: ScopeId, name: &str) -> Option<usize> {
        self.scopes[scope].bindings.get(name).copied()
    }

    /// Bind `name` in `scope`, keeping an existing binding (declaration merging).
    pub fn bind(&mut self, scope: ScopeId, name: &str, symbol: usize) -> usize {
        *self.scopes[scope]
            .bindings
            .entry(name.to_string())
            .or_insert(symbol)
    }

    /// Resolve `name` walking outwards from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<usize> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let entry = &self.scopes[id];
            if let Some(symbol) = entry.bindings.get(name) {
                return Some(*symbol);
            }
            current = entry.parent;
        }
        None
    }

    /// Bindings of the program scope, sorted by name.
    pub fn top_level(&self) -> Vec<(String, usize)> {
        let mut bindings: Vec<(String, usize)> = self.scopes[0]
            .bindings
            .iter()
            .map(|(name, symbol)| (name.clone(), *symbol))
            .collect();
        bindings.sort();
        bindings
    }
}
