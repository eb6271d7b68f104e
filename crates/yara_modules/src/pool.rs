//! `Module`/`ModulePool`: the catalogue of external symbol schemas a
//! condition expression's identifiers resolve against.

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use yara_diagnostic::ModuleError;
use yara_ir::name::{Name, StringInterner};
use yara_ir::symbol::{Structure, Symbol};

use crate::flags::FeatureFlags;
use crate::schema::{node_to_symbol, SchemaNode};

const ENV_SPEC_PATH: &str = "YARAMOD_MODULE_SPEC_PATH";
const ENV_SPEC_PATH_EXCLUSIVE: &str = "YARAMOD_MODULE_SPEC_PATH_EXCLUSIVE";

/// Configuration for a [`ModulePool`], passed in explicitly rather than
/// read from ambient globals.
#[derive(Clone, Debug)]
pub struct ModulePoolConfig {
    /// Directories scanned for `*.json` schema documents, in order.
    /// Directories listed later override identically named modules defined
    /// earlier, unless `exclusive` is set, in which case only the final
    /// directory is used at all.
    pub directories: Vec<PathBuf>,
    pub flags: FeatureFlags,
    pub exclusive: bool,
}

impl ModulePoolConfig {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        ModulePoolConfig { directories: vec![directory.into()], flags: FeatureFlags::default(), exclusive: false }
    }

    /// Reads `YARAMOD_MODULE_SPEC_PATH` (a `:`-separated list of
    /// directories) and `YARAMOD_MODULE_SPEC_PATH_EXCLUSIVE` (`1` to replace
    /// rather than extend the configured directory list).
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if let Ok(path) = std::env::var(ENV_SPEC_PATH) {
            let extra: Vec<PathBuf> = std::env::split_paths(&path).collect();
            if std::env::var(ENV_SPEC_PATH_EXCLUSIVE).as_deref() == Ok("1") {
                self.directories = extra;
                self.exclusive = true;
            } else {
                self.directories.extend(extra);
            }
        }
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A single loaded module, exposed to condition expressions under its
/// top-level identifier.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: Name,
    pub root: Structure,
}

/// The full catalogue of modules available to a parse.
pub struct ModulePool {
    modules: FxHashMap<Name, Module>,
}

impl ModulePool {
    /// Loads every `*.json` schema document under `config`'s directories.
    pub fn load(config: &ModulePoolConfig, interner: &StringInterner) -> Result<Self, ModuleError> {
        let mut modules: FxHashMap<Name, Module> = FxHashMap::default();
        let mut pending_refs: Vec<(Name, Name, Name)> = Vec::new(); // (module, attr, target)

        for dir in &config.directories {
            let entries = std::fs::read_dir(dir).map_err(|_| ModuleError::DirectoryNotFound {
                path: dir.display().to_string(),
            })?;
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let text = std::fs::read_to_string(&path).map_err(|e| ModuleError::InvalidSchema {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                let node: SchemaNode = serde_json::from_str(&text).map_err(|e| ModuleError::InvalidSchema {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                let symbol = node_to_symbol(&node, interner)?;
                let Symbol::Structure { name, attributes } = symbol else {
                    return Err(ModuleError::InvalidSchema {
                        path: path.display().to_string(),
                        message: "top-level schema node must have kind 'struct'".into(),
                    });
                };
                match modules.get_mut(&name) {
                    Some(existing) => existing
                        .root
                        .merge(attributes)
                        .map_err(|_| ModuleError::CollidingDefinition { module: interner.lookup(name).into() })?,
                    None => {
                        modules.insert(name, Module { name, root: attributes });
                    }
                }
            }
        }

        // Resolve `reference` attributes against the now-complete module
        // set. References were left embedded inside `Structure` values
        // during parsing, so this pass only validates that their targets
        // exist; actual dereferencing happens at lookup time in `resolve`.
        for module in modules.values() {
            collect_reference_targets(&module.root, module.name, &mut pending_refs);
        }
        for (_module, _attr, target) in &pending_refs {
            if !modules.contains_key(target) {
                return Err(ModuleError::UnknownReference { target: interner.lookup(*target).into() });
            }
        }

        Ok(ModulePool { modules })
    }

    #[must_use]
    pub fn get(&self, name: Name) -> Option<&Module> {
        self.modules.get(&name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Resolves a `reference` symbol to the structure it points at.
    #[must_use]
    pub fn resolve<'a>(&'a self, symbol: &'a Symbol) -> Option<&'a Structure> {
        match symbol {
            Symbol::Structure { attributes, .. } => Some(attributes),
            Symbol::Reference { target, .. } => self.modules.get(target).map(|m| &m.root),
            _ => None,
        }
    }
}

fn collect_reference_targets(structure: &Structure, module: Name, out: &mut Vec<(Name, Name, Name)>) {
    for sym in structure.iter() {
        if let Symbol::Reference { name, target } = sym {
            out.push((module, *name, *target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_basic_flags() {
        let config = ModulePoolConfig::new("/tmp/nonexistent");
        assert_eq!(config.flags, FeatureFlags::BASIC);
    }

    #[test]
    fn missing_directory_is_reported() {
        let interner = StringInterner::new();
        let config = ModulePoolConfig::new("/definitely/not/a/real/path/for/yaramod");
        let err = ModulePool::load(&config, &interner).unwrap_err();
        assert!(matches!(err, ModuleError::DirectoryNotFound { .. }));
    }
}
