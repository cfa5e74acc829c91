//! Canned response fixtures
//!
//! A fixture is a static JSON file standing in for a backend response,
//! addressed by its file stem: `tags` resolves to `<dir>/tags.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug)]
pub struct FixtureStore {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Value>>,
}

impl FixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load a fixture by name, caching the parsed value.
    pub fn load(&self, name: &str) -> HarnessResult<Value> {
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(value) = cache.get(name) {
                return Ok(value.clone());
            }
        }

        let path = self.dir.join(format!("{}.json", name));
        let content = std::fs::read_to_string(&path)
            .map_err(|_| HarnessError::FixtureNotFound(format!("{} ({})", name, path.display())))?;
        let value: Value = serde_json::from_str(&content)?;

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Eagerly parse every `.json` file under the directory, returning the
    /// fixture names found. Useful for catching malformed fixtures before
    /// any scenario runs.
    pub fn load_all(&self) -> HarnessResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
            })
        {
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                self.load(stem)?;
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(name: &str, content: &str) -> (tempfile::TempDir, FixtureStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{}.json", name)), content).unwrap();
        let store = FixtureStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn loads_and_caches_a_fixture() {
        let (_dir, store) = store_with("tags", r#"{"tags":["cypress"]}"#);
        let first = store.load("tags").unwrap();
        assert_eq!(first["tags"][0], "cypress");
        // second load hits the cache, same value
        assert_eq!(store.load("tags").unwrap(), first);
    }

    #[test]
    fn missing_fixture_names_the_file() {
        let (_dir, store) = store_with("tags", r#"{}"#);
        let err = store.load("articles").unwrap_err();
        match err {
            HarnessError::FixtureNotFound(what) => assert!(what.contains("articles")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_all_reports_every_fixture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tags.json"), r#"{"tags":[]}"#).unwrap();
        std::fs::write(dir.path().join("articles.json"), r#"{"articles":[]}"#).unwrap();
        let store = FixtureStore::new(dir.path());
        assert_eq!(store.load_all().unwrap(), vec!["articles", "tags"]);
    }
}
