//! Environment materialization.
//!
//! Mirrors §3/§4.5 step 1: environment is either inherited verbatim,
//! inherited with overrides layered on top, or built from scratch.

use std::{
    collections::HashMap,
    ffi::{OsStr, OsString},
};

/// How the child's environment is derived from the parent's.
#[derive(Debug, Clone)]
pub enum Environment {
    /// Pass the parent's environment through unchanged.
    Inherit,
    /// Parent's environment, with these keys added or replaced.
    InheritWithOverrides(HashMap<OsString, OsString>),
    /// Exactly these variables; nothing from the parent leaks through.
    Custom(HashMap<OsString, OsString>),
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Inherit
    }
}

impl Environment {
    /// Resolves to the final `key=value` pairs the child will see, in an
    /// unspecified but stable order. Rejects duplicate keys by construction
    /// (the backing map already enforces uniqueness).
    pub(crate) fn materialize(&self) -> HashMap<OsString, OsString> {
        match self {
            Environment::Inherit => std::env::vars_os().collect(),
            Environment::InheritWithOverrides(overrides) => {
                let mut vars: HashMap<OsString, OsString> = std::env::vars_os().collect();
                for (k, v) in overrides {
                    vars.insert(k.clone(), v.clone());
                }
                vars
            }
            Environment::Custom(vars) => vars.clone(),
        }
    }

    pub(crate) fn path_hint(&self) -> Option<OsString> {
        match self {
            Environment::Inherit => std::env::var_os("PATH"),
            Environment::InheritWithOverrides(overrides) => overrides
                .get(OsStr::new("PATH"))
                .cloned()
                .or_else(|| std::env::var_os("PATH")),
            Environment::Custom(vars) => vars.get(OsStr::new("PATH")).cloned(),
        }
    }
}
