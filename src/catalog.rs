//! Item catalog: which models exist and where their files live.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One renderable item from the catalog JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub section: u32,
    #[serde(default)]
    pub section_name: String,
    pub index: u32,
    #[serde(default)]
    pub name: String,
    /// Model file name relative to the item directory, e.g. "sword04.bmd".
    pub model: String,
}

/// Loads the catalog, dropping entries without a model file.
pub fn load_catalog(path: &Path) -> Result<Vec<ItemDef>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read catalog {}", path.display()))?;
    let items: Vec<ItemDef> = serde_json::from_str(&text)
        .with_context(|| format!("parse catalog {}", path.display()))?;
    Ok(items.into_iter().filter(|i| !i.model.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_catalog_skips_modelless_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(
            &path,
            r#"[
                {"section": 0, "section_name": "Swords", "index": 4, "name": "Sword", "model": "sword04.bmd"},
                {"section": 0, "index": 5, "name": "Placeholder", "model": ""}
            ]"#,
        )
        .unwrap();
        let items = load_catalog(&path).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].model, "sword04.bmd");
        assert_eq!(items[0].section_name, "Swords");
    }

    #[test]
    fn load_catalog_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "{").unwrap();
        assert!(load_catalog(&path).is_err());
    }
}
