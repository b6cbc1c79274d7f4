//! In-memory project configuration.
//!
//! The configuration mirrors the handful of `tsconfig.json` settings that
//! influence a lookup. It is built in memory and never written to disk; a JSON
//! file with the same camelCase keys can be loaded with `--config`.

use crate::discover::DiscoveryRules;
use crate::error::{RefError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compiler options recognised by the program builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    /// Language level. Informational.
    pub target: String,

    /// Module system. Informational.
    pub module: String,

    /// Whether `.js` / `.jsx` files join the program.
    pub allow_js: bool,

    /// Whether JavaScript files are bound like TypeScript ones. Informational.
    pub check_js: bool,

    /// Whether a default import of a CommonJS module binds `module.exports`.
    pub es_module_interop: bool,

    /// Informational.
    pub skip_lib_check: bool,

    /// Informational; nothing is ever emitted.
    pub no_emit: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            target: "es2018".to_string(),
            module: "commonjs".to_string(),
            allow_js: true,
            check_js: true,
            es_module_interop: true,
            skip_lib_check: true,
            no_emit: true,
        }
    }
}

/// Project configuration: compiler options plus file selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Compiler options.
    pub compiler_options: CompilerOptions,

    /// Repo-relative globs a file must match to be collected.
    pub include: Vec<String>,

    /// Directory names or repo-relative globs that are skipped.
    pub exclude: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            compiler_options: CompilerOptions::default(),
            include: ["**/*.js", "**/*.jsx", "**/*.ts", "**/*.tsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude: vec!["node_modules".to_string(), "dist".to_string()],
        }
    }
}

impl ProjectConfig {
    /// Load a configuration file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RefError::io(path, e))?;
        let config: ProjectConfig = serde_json::from_str(&text).map_err(|e| RefError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("loaded project config from {}", path.display());
        Ok(config)
    }

    /// Pretty JSON rendering, as it would appear in a `tsconfig.json`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Discovery rules implied by this configuration.
    ///
    /// Plain names in `exclude` prune directories of that name at any depth;
    /// anything else is treated as a repo-relative glob.
    pub fn discovery_rules(&self) -> Result<DiscoveryRules> {
        let mut rules = DiscoveryRules::default();

        if !self.compiler_options.allow_js {
            rules.extensions.retain(|ext| ext != "js" && ext != "jsx");
        }

        let mut globs = Vec::new();
        for entry in &self.exclude {
            if is_plain_name(entry) {
                if !rules.excluded_dirs.contains(entry) {
                    rules.excluded_dirs.push(entry.clone());
                }
            } else {
                globs.push(entry.as_str());
            }
        }

        rules
            .with_exclude_globs(&globs)?
            .with_include_globs(&self.include)
    }
}

fn is_plain_name(entry: &str) -> bool {
    !entry.is_empty() && !entry.contains(['/', '\\', '*', '?', '[', ']'])
}
