/*!
 * Schema catalog for field eligibility.
 *
 * Theme schemas can mark specific `(section_type, field_key)` pairs as
 * always-translate or never-translate, overriding the pattern heuristics.
 * The catalog is loaded from a JSON file once per process and cached
 * behind an explicit accessor; a load failure degrades the filter to
 * pattern-only evaluation with a warning, never a fault.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Process-wide catalog cache, populated on first lookup
static GLOBAL_CATALOG: OnceCell<Option<SchemaCatalog>> = OnceCell::new();

/// Schema-level decision for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaAction {
    /// Always translate, regardless of pattern heuristics
    ForceInclude,
    /// Never translate, regardless of pattern heuristics
    ForceExclude,
}

/// One catalog rule as stored in the JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaRule {
    /// Section type the rule applies to
    section_type: String,
    /// Field key within the section
    field_key: String,
    /// What to do with the field
    action: SchemaAction,
}

/// On-disk catalog file shape
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaFile {
    rules: Vec<SchemaRule>,
}

/// Lookup table keyed by `(section_type, field_key)`
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entries: HashMap<(String, String), SchemaAction>,
}

impl SchemaCatalog {
    /// Load a catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema catalog: {:?}", path))?;

        let file: SchemaFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse schema catalog: {:?}", path))?;

        let mut entries = HashMap::new();
        for rule in file.rules {
            entries.insert((rule.section_type, rule.field_key), rule.action);
        }

        debug!("Loaded schema catalog with {} rules", entries.len());
        Ok(Self { entries })
    }

    /// Build a catalog from in-memory rules, for tests
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (String, String, SchemaAction)>,
    {
        let entries = rules
            .into_iter()
            .map(|(section, key, action)| ((section, key), action))
            .collect();
        Self { entries }
    }

    /// Schema verdict for a field, if one exists
    pub fn lookup(&self, section_type: &str, field_key: &str) -> Option<SchemaAction> {
        self.entries
            .get(&(section_type.to_string(), field_key.to_string()))
            .copied()
    }

    /// Number of rules in the catalog
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no rules
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Process-wide catalog, lazily loaded from `path` on first call
    ///
    /// The first call decides for the process lifetime: a successful load
    /// is cached, a failed one caches `None` after a warning so later
    /// callers degrade to pattern-only evaluation without retrying the
    /// filesystem. Invalidated only by process restart.
    pub fn global<P: AsRef<Path>>(path: P) -> Option<&'static SchemaCatalog> {
        GLOBAL_CATALOG
            .get_or_init(|| match Self::from_file(path.as_ref()) {
                Ok(catalog) => Some(catalog),
                Err(e) => {
                    warn!(
                        "Schema catalog unavailable, falling back to pattern rules: {:#}",
                        e
                    );
                    None
                }
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fromRules_lookup_shouldReturnAction() {
        let catalog = SchemaCatalog::from_rules(vec![
            (
                "hero".to_string(),
                "heading".to_string(),
                SchemaAction::ForceInclude,
            ),
            (
                "hero".to_string(),
                "custom_css".to_string(),
                SchemaAction::ForceExclude,
            ),
        ]);

        assert_eq!(
            catalog.lookup("hero", "heading"),
            Some(SchemaAction::ForceInclude)
        );
        assert_eq!(
            catalog.lookup("hero", "custom_css"),
            Some(SchemaAction::ForceExclude)
        );
        assert_eq!(catalog.lookup("hero", "other"), None);
        assert_eq!(catalog.lookup("footer", "heading"), None);
    }

    #[test]
    fn test_fromFile_shouldParseRules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"rules":[{"section_type":"hero","field_key":"badge","action":"force_include"}]}"#,
        )
        .unwrap();

        let catalog = SchemaCatalog::from_file(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.lookup("hero", "badge"),
            Some(SchemaAction::ForceInclude)
        );
    }

    #[test]
    fn test_fromFile_missingFile_shouldError() {
        assert!(SchemaCatalog::from_file("/nonexistent/catalog.json").is_err());
    }
}
