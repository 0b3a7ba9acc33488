use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const BASE_CORRECTIONS: &[(&str, &str)] = &[
    ("Rusy Ring", "Ruby Ring"),
    ("Tronscale Gauntlets", "Ironscale Gauntlets"),
    ("Twoo-Point Arrow Quiver", "Two-Point Arrow Quiver"),
    ("Twwo-Stone Ring", "Two-Stone Ring"),
    ("Unsset Ring", "Unset Ring"),
    ("Ruy Ring", "Ruby Ring"),
    ("Goathide Booots", "Goathide Boots"),
];

const ITEM_CORRECTIONS: &[(&str, &str)] = &[
    ("Dyyaadus", "Dyadus"),
    ("Heup_of_All", "Le_Heup_of_All"),
    ("Hyrrls_Bite", "Hyrris_Bite"),
    ("Hyrrs_Bite", "Hyrris_Bite"),
    ("Kondoss_Pride", "Kondos_Pride"),
    ("Night_Hold", "Nights_Hold"),
    ("Nomiics_Storm", "Nomics_Storm"),
    ("Rigwaldss_Command", "Rigwalds_Command"),
];

/// Known OCR misreads, applied in order as substring replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrCorrections {
    /// Applied to base type names ("Rusy Ring" -> "Ruby Ring")
    pub base: Vec<(String, String)>,
    /// Applied to item file keys ("Dyyaadus" -> "Dyadus")
    pub item: Vec<(String, String)>,
}

impl Default for OcrCorrections {
    fn default() -> Self {
        let owned = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        };
        Self {
            base: owned(BASE_CORRECTIONS),
            item: owned(ITEM_CORRECTIONS),
        }
    }
}

impl OcrCorrections {
    /// Load `corrections.json` if present, otherwise the built-in tables.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let corrections: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!(
            "Loaded {} base and {} item corrections from {}",
            corrections.base.len(),
            corrections.item.len(),
            path.display()
        );
        Ok(corrections)
    }

    pub fn correct_base(&self, base: &str) -> String {
        apply(base, &self.base)
    }

    pub fn correct_item(&self, item: &str) -> String {
        apply(item, &self.item)
    }
}

fn apply(name: &str, table: &[(String, String)]) -> String {
    let mut name = name.to_string();
    for (from, to) in table {
        if name.contains(from.as_str()) {
            name = name.replace(from.as_str(), to);
        }
    }
    name
}
