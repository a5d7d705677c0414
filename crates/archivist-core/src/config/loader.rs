//! Multi-file configuration loading.

use std::fmt::Display;
use std::hash::Hash;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::{ConfigPath, interpolate, is_yaml_file};
use crate::error::ConfigError;

/// Configs assembled from several YAML files.
///
/// Keyed components must be unique across all files; everything else is
/// merged through [`Mergeable::merge_settings`].
pub trait Mergeable: Sized + Default {
    type Key: Eq + Hash + Clone + Display;
    type Component;

    fn components_mut(&mut self) -> &mut IndexMap<Self::Key, Self::Component>;
    fn parse_yaml(contents: &str) -> Result<Self, ConfigError>;

    /// Merge non-keyed settings from `other` (last-write-wins).
    fn merge_settings(&mut self, other: &Self);

    fn merge(&mut self, mut other: Self) -> Result<(), ConfigError> {
        let duplicates: Vec<String> = other
            .components_mut()
            .keys()
            .filter(|key| self.components_mut().contains_key(*key))
            .map(|key| key.to_string())
            .collect();

        if !duplicates.is_empty() {
            return Err(ConfigError::DuplicateComponents { keys: duplicates });
        }

        self.merge_settings(&other);
        for (key, component) in other.components_mut().drain(..) {
            self.components_mut().insert(key, component);
        }
        Ok(())
    }
}

/// Load and merge every config source, collecting all errors.
pub fn load_from_paths<C: Mergeable>(paths: &[ConfigPath]) -> Result<C, ConfigError> {
    let mut config = C::default();
    let mut errors = Vec::new();

    for path in paths {
        let (location, loaded) = match path {
            ConfigPath::File(file) => (file, load_file::<C>(file)),
            ConfigPath::Dir(dir) => (dir, load_dir::<C>(dir)),
        };
        match loaded.and_then(|partial| config.merge(partial)) {
            Ok(()) => debug!(path = %location.display(), "Loaded config source"),
            // Directory errors already carry per-file prefixes.
            Err(ConfigError::MultipleErrors { errors: nested }) => errors.extend(nested),
            Err(e) => errors.push(format!("{}: {}", location.display(), e)),
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MultipleErrors { errors });
    }
    Ok(config)
}

fn load_file<C: Mergeable>(path: &Path) -> Result<C, ConfigError> {
    if !is_yaml_file(path) {
        return Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let contents =
        std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile { source })?;

    let result = interpolate(&contents);
    if !result.is_ok() {
        return Err(ConfigError::EnvInterpolation {
            message: result.errors.join("\n"),
        });
    }

    C::parse_yaml(&result.text)
}

fn load_dir<C: Mergeable>(dir: &Path) -> Result<C, ConfigError> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| ConfigError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_yaml_file(path))
        .collect();
    files.sort();

    let mut config = C::default();
    let mut errors = Vec::new();
    for path in files {
        if let Err(e) = load_file::<C>(&path).and_then(|partial| config.merge(partial)) {
            errors.push(format!("{}: {}", path.display(), e));
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MultipleErrors { errors });
    }
    Ok(config)
}
