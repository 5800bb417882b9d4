//! Layered subprocess environment

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Snapshot of the process environment plus per-shell overrides.
///
/// Cloning produces an independent copy; the clone can be extended freely
/// without the original ever observing it. The snapshot keeps variables that
/// are not valid UTF-8 so children inherit them unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellEnvironment {
    base: BTreeMap<OsString, OsString>,
    overrides: BTreeMap<String, String>,
}

impl ShellEnvironment {
    /// Snapshot the current process environment, or start empty when
    /// `clear_env` is set.
    pub fn new(clear_env: bool) -> Self {
        let base = if clear_env {
            BTreeMap::new()
        } else {
            std::env::vars_os().collect()
        };

        Self {
            base,
            overrides: BTreeMap::new(),
        }
    }

    /// Merge `values` into the overrides; later values win.
    pub fn set<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Consuming variant of [`set`](Self::set) for builder chains.
    pub fn with<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set(values);
        self
    }

    /// Base merged with overrides, overrides winning.
    ///
    /// Non-UTF-8 base entries are converted lossily; use
    /// [`effective_os`](Self::effective_os) for what a child receives.
    pub fn effective(&self) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = self
            .base
            .iter()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect();
        merged.extend(
            self.overrides
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }

    /// The exact environment handed to a subprocess.
    pub fn effective_os(&self) -> BTreeMap<OsString, OsString> {
        let mut merged = self.base.clone();
        merged.extend(
            self.overrides
                .iter()
                .map(|(k, v)| (OsString::from(k), OsString::from(v))),
        );
        merged
    }

    /// Only the values added on top of the base snapshot.
    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    pub fn base(&self) -> &BTreeMap<OsString, OsString> {
        &self.base
    }

    /// Value of `key`, or `None` when unset or not valid UTF-8.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.overrides.get(key) {
            Some(value) => Some(value.as_str()),
            None => self.base.get(OsStr::new(key)).and_then(|value| value.to_str()),
        }
    }
}
