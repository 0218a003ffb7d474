// 🗂️ Catalog - Fixed price list with case-insensitive lookup
//
// The catalog is built once at startup and passed by reference into every
// component that needs item lookup. No fuzzy matching: an unresolved name is
// a per-item miss the caller reports and skips, not a fatal error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Matcha drinks
    Matcha,

    /// Coffee drinks
    Coffee,

    /// Teas and infusions
    Tea,

    /// Baked goods
    Pastry,

    /// Everything else (bottled water, merch, ...)
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Matcha => "Matcha",
            Category::Coffee => "Coffee",
            Category::Tea => "Tea",
            Category::Pastry => "Pastry",
            Category::Other => "Other",
        }
    }

    /// Parse a category label case-insensitively. Unknown labels fold to
    /// `Other` so a hand-edited price list can't fail to load.
    pub fn from_label(label: &str) -> Category {
        match label.trim().to_lowercase().as_str() {
            "matcha" => Category::Matcha,
            "coffee" => Category::Coffee,
            "tea" => Category::Tea,
            "pastry" => Category::Pastry,
            _ => Category::Other,
        }
    }
}

// ============================================================================
// CATALOG ITEM
// ============================================================================

/// One sellable item. `name` is the canonical display name; the lookup key
/// is its trimmed, lowercased form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub unit_price: f64,
    pub category: Category,
}

impl CatalogItem {
    pub fn new(name: &str, unit_price: f64, category: Category) -> Self {
        CatalogItem {
            name: name.to_string(),
            unit_price,
            category,
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Immutable item registry. Constructed once per process.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: HashMap<String, CatalogItem>,
}

/// Canonical lookup key: trimmed + lowercased.
fn canonical_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl Catalog {
    /// Build a catalog from a list of items. Later duplicates win, matching
    /// the "last edit counts" behavior of a hand-maintained price list.
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let mut map = HashMap::new();
        for item in items {
            map.insert(canonical_key(&item.name), item);
        }
        Catalog { items: map }
    }

    /// The compiled-in menu used when no price list file is given.
    pub fn default_menu() -> Self {
        Catalog::from_items(vec![
            CatalogItem::new("matcha latte", 25.0, Category::Matcha),
            CatalogItem::new("matcha", 20.0, Category::Matcha),
            CatalogItem::new("iced matcha", 22.0, Category::Matcha),
            CatalogItem::new("latte", 15.0, Category::Coffee),
            CatalogItem::new("espresso", 10.0, Category::Coffee),
            CatalogItem::new("cappuccino", 18.0, Category::Coffee),
            CatalogItem::new("americano", 12.0, Category::Coffee),
            CatalogItem::new("mocha", 20.0, Category::Coffee),
            CatalogItem::new("black tea", 8.0, Category::Tea),
            CatalogItem::new("chai latte", 17.0, Category::Tea),
            CatalogItem::new("croissant", 14.0, Category::Pastry),
            CatalogItem::new("muffin", 12.0, Category::Pastry),
            CatalogItem::new("cookie", 8.0, Category::Pastry),
            CatalogItem::new("water", 5.0, Category::Other),
        ])
    }

    /// Load a price list from a CSV file.
    ///
    /// Expected columns: `name,price,category` with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Failed to open price list: {}", path.as_ref().display()))?;
        Catalog::from_csv_reader(file)
    }

    /// Load a price list from any CSV reader (used by tests).
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut items = Vec::new();
        for (line_num, result) in csv_reader.records().enumerate() {
            let record = result
                .with_context(|| format!("Failed to parse price list line {}", line_num + 2))?;

            let name = record.get(0).unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            let price: f64 = record
                .get(1)
                .unwrap_or("")
                .parse()
                .with_context(|| format!("Bad price on line {} ({})", line_num + 2, name))?;

            let category = Category::from_label(record.get(2).unwrap_or(""));

            items.push(CatalogItem {
                name,
                unit_price: price,
                category,
            });
        }

        Ok(Catalog::from_items(items))
    }

    /// Resolve a raw item name. `None` means "not on the menu".
    pub fn lookup(&self, raw_name: &str) -> Option<&CatalogItem> {
        self.items.get(&canonical_key(raw_name))
    }

    pub fn contains(&self, raw_name: &str) -> bool {
        self.items.contains_key(&canonical_key(raw_name))
    }

    /// All items, sorted by name (for menu display).
    pub fn items(&self) -> Vec<&CatalogItem> {
        let mut all: Vec<&CatalogItem> = self.items.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
