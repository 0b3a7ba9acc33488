use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Size of one inventory grid cell in a 1920x1080 screenshot
pub const CELL_SIZE_PX: u32 = 78;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read item catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse item catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("icon for item '{name}' not found at {}", .path.display())]
    MissingIcon { name: String, path: PathBuf },

    #[error("invalid record for item '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error("item '{name}' is an alias of '{alias}', which is not in the catalog")]
    DanglingAlias { name: String, alias: String },

    #[error("item '{0}' not found")]
    NotFound(String),

    #[error("failed to read icon {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Color variant of a socket glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketColor {
    Red,
    Green,
    Blue,
    White,
}

impl SocketColor {
    /// Order in which template variants are generated
    pub const ALL: [SocketColor; 4] = [
        SocketColor::Red,
        SocketColor::Green,
        SocketColor::Blue,
        SocketColor::White,
    ];

    /// Suffix used by the socket glyph asset files
    pub fn suffix(self) -> &'static str {
        match self {
            SocketColor::Red => "r",
            SocketColor::Green => "g",
            SocketColor::Blue => "b",
            SocketColor::White => "w",
        }
    }
}

/// A unique item as recorded in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    /// Stable key, also the icon file stem
    pub file: String,
    /// File key of the canonical item this one is an alias of
    pub alias: Option<String>,
    pub icon: PathBuf,
    pub base: String,
    pub sockets: u32,
    pub columns: u32,
    /// Inventory footprint in grid cells
    pub width: u32,
    pub height: u32,
}

impl Item {
    pub const MAX_WIDTH: u32 = 2;
    pub const MAX_HEIGHT: u32 = 4;
    pub const MAX_SOCKETS: u32 = 6;

    /// True if the item occupies fewer cells than the largest possible item.
    pub fn is_smaller_than_full(&self) -> bool {
        self.width < Self::MAX_WIDTH || self.height < Self::MAX_HEIGHT
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    /// Footprint in cells derived from the icon's pixel size.
    pub fn cells_from_icon(&self) -> Result<(u32, u32)> {
        let (w, h) = image::image_dimensions(&self.icon).map_err(|source| CatalogError::Image {
            path: self.icon.clone(),
            source,
        })?;
        let cell = CELL_SIZE_PX as f64;
        Ok((
            (w as f64 / cell).round() as u32,
            (h as f64 / cell).round() as u32,
        ))
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| CatalogError::InvalidRecord {
            name: self.name.clone(),
            reason,
        };

        if self.sockets > Self::MAX_SOCKETS {
            return Err(invalid(format!(
                "sockets must be 0-{}, got {}",
                Self::MAX_SOCKETS,
                self.sockets
            )));
        }
        if !(1..=Self::MAX_WIDTH).contains(&self.width) {
            return Err(invalid(format!("width must be 1-2, got {}", self.width)));
        }
        if !(1..=Self::MAX_HEIGHT).contains(&self.height) {
            return Err(invalid(format!("height must be 1-4, got {}", self.height)));
        }
        if self.sockets > 0 && !(1..=2).contains(&self.columns) {
            return Err(invalid(format!(
                "socketed items need 1 or 2 columns, got {}",
                self.columns
            )));
        }
        if self.base.is_empty() {
            return Err(invalid("base is empty".to_string()));
        }
        Ok(())
    }
}

/// Convert an item name into its file key ("Ungil's Harmony" -> "Ungils_Harmony").
pub fn normalize_item_name(name: &str) -> String {
    name.replace('\'', "").replace(' ', "_").replace(',', "")
}

/// Raw items.csv row
#[derive(Debug, Deserialize)]
struct ItemRow {
    name: String,
    file: String,
    #[serde(default)]
    alias: String,
    base: String,
    sockets: u32,
    columns: u32,
    width: Option<u32>,
    height: Option<u32>,
    enabled: u8,
    global: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogOptions {
    /// Skip items that cannot drop globally
    pub ignore_non_global: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            ignore_non_global: true,
        }
    }
}

/// Item registry, indexed by file key. Catalog order is preserved.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<Item>,
    by_file: HashMap<String, usize>,
    bases: BTreeSet<String>,
}

impl ItemCatalog {
    /// Load the catalog from the data directory.
    /// Expects:
    ///   - data_dir/items.csv
    ///   - data_dir/items/{file}.png
    pub fn load(data_dir: &Path, options: CatalogOptions) -> Result<Self> {
        let csv_path = data_dir.join("items.csv");
        let file = std::fs::File::open(&csv_path).map_err(|source| CatalogError::Io {
            path: csv_path.clone(),
            source,
        })?;

        let items = read_items(file, &data_dir.join("items"), options)?;
        let catalog = Self::from_items(items)?;

        info!(
            "Loaded {} items ({} bases) from {}",
            catalog.len(),
            catalog.bases.len(),
            csv_path.display()
        );

        Ok(catalog)
    }

    /// Build a catalog from already parsed items.
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        let mut by_file = HashMap::with_capacity(items.len());
        let mut bases = BTreeSet::new();

        for (i, item) in items.iter().enumerate() {
            item.validate()?;
            by_file.insert(item.file.clone(), i);
            bases.insert(item.base.clone());
        }

        for item in &items {
            if let Some(alias) = &item.alias {
                if !by_file.contains_key(alias) {
                    return Err(CatalogError::DanglingAlias {
                        name: item.name.clone(),
                        alias: alias.clone(),
                    });
                }
            }
        }

        let catalog = Self {
            items,
            by_file,
            bases,
        };

        for base in catalog.bases_with_mixed_dimensions() {
            warn!("Items from base '{}' don't have the same dimensions", base);
        }

        Ok(catalog)
    }

    /// Find an item by its file key.
    pub fn get(&self, file: &str) -> Result<&Item> {
        self.by_file
            .get(file)
            .map(|&i| &self.items[i])
            .ok_or_else(|| CatalogError::NotFound(file.to_string()))
    }

    pub fn bases(&self) -> &BTreeSet<String> {
        &self.bases
    }

    pub fn has_base(&self, base: &str) -> bool {
        self.bases.contains(base)
    }

    /// All non-aliased items of the given base, in catalog order.
    pub fn filter_by_base(&self, base: &str) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.base == base && !item.is_alias())
            .collect()
    }

    /// Items that are aliases of `item`.
    pub fn aliases_of(&self, item: &Item) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| i.alias.as_deref() == Some(item.file.as_str()))
            .collect()
    }

    /// Bases whose items don't share one (width, height).
    pub fn bases_with_mixed_dimensions(&self) -> Vec<&str> {
        let mut dims: HashMap<&str, (u32, u32)> = HashMap::new();
        let mut mixed = BTreeSet::new();

        for item in &self.items {
            let entry = dims.entry(item.base.as_str()).or_insert((item.width, item.height));
            if *entry != (item.width, item.height) {
                mixed.insert(item.base.as_str());
            }
        }

        mixed.into_iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn read_items<R: std::io::Read>(
    reader: R,
    icon_dir: &Path,
    options: CatalogOptions,
) -> Result<Vec<Item>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut items = Vec::new();

    for row in reader.deserialize::<ItemRow>() {
        let row = row?;

        if row.enabled == 0 {
            debug!("Skipping drop-disabled item: {}", row.name);
            continue;
        }

        if options.ignore_non_global && row.global == 0 {
            debug!("Skipping non-global item: {}", row.name);
            continue;
        }

        let icon = icon_dir.join(format!("{}.png", row.file));
        if !icon.exists() {
            return Err(CatalogError::MissingIcon {
                name: row.name,
                path: icon,
            });
        }

        items.push(Item {
            name: row.name,
            file: row.file,
            alias: Some(row.alias).filter(|a| !a.is_empty()),
            icon,
            base: row.base.replace('\'', ""),
            sockets: row.sockets,
            columns: row.columns,
            width: row.width.unwrap_or(Item::MAX_WIDTH),
            height: row.height.unwrap_or(Item::MAX_HEIGHT),
        });
    }

    Ok(items)
}
