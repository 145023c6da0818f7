//! Catalog record model
//!
//! The raw product file is a JSON array of products, each with a list of
//! variants. Field names vary between exports ("bestell_nr", "Bestell-Nr.",
//! ...), so both levels are read as loose JSON objects and mapped through alias
//! lists. Products are flattened to one [`CatalogEntry`] per variant.

use std::path::{Path, PathBuf};

use catalog_chat_core::LexiconSource;
use catalog_chat_text_processing::normalize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CatalogError;

type Object = Map<String, Value>;

const TITLE: &[&str] = &["title", "Title"];
const CATEGORY: &[&str] = &["category", "Kategorie"];
const DESCRIPTION: &[&str] = &["description", "Beschreibung"];
const ORDER_NUMBER: &[&str] = &["bestell_nr", "Bestell-Nr.", "Bestell-Nr"];
const VARIANT: &[&str] = &["ausfuehrung", "Ausführung", "Ausfuehrung"];
const LENGTH: &[&str] = &["l_mm", "L mm", "L"];
const WIDTH: &[&str] = &["b_mm", "B mm", "B"];
const HEIGHT: &[&str] = &["h_mm", "H mm", "H"];
const THICKNESS: &[&str] = &["staerke_mm", "Stärke", "Staerke"];
const PRICE: &[&str] = &["price_eur", "€", "EUR", "Preis"];
const PACKING_UNIT: &[&str] = &["ve", "VE"];

/// Search-blob synonyms keyed by a normalized trigger word
pub const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "herzgriffspachtel",
        &["herzspachtel", "herzform spachtel", "spachtel herzform"],
    ),
    ("flächenspachtel", &["flachspachtel", "flächen spachtel"]),
];

/// One searchable product variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub bestell_nr: String,
    pub title: String,
    pub category: String,
    pub ausfuehrung: String,
    pub description: String,
    pub price_eur: Option<f64>,
    pub ve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l_mm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_mm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_mm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staerke_mm: Option<String>,

    #[serde(rename = "_blob")]
    pub blob: String,
    #[serde(rename = "_title_norm")]
    pub title_norm: String,
    #[serde(rename = "_cat_norm")]
    pub category_norm: String,
    #[serde(rename = "_ausf_norm")]
    pub variant_norm: String,
    #[serde(rename = "_bestell_norm")]
    pub bestell_norm: String,
    #[serde(rename = "_bestell_digits")]
    pub bestell_digits: String,
}

impl CatalogEntry {
    /// Named dimensions that are present, in display order
    pub fn dimensions(&self) -> Vec<(&'static str, &str)> {
        [
            ("L_MM", &self.l_mm),
            ("B_MM", &self.b_mm),
            ("H_MM", &self.h_mm),
            ("STAERKE_MM", &self.staerke_mm),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    /// Text mined for the product lexicon
    pub fn lexicon_text(&self) -> String {
        join_present(&[
            &self.title,
            &self.category,
            &self.ausfuehrung,
            &self.description,
            &self.bestell_nr,
        ])
    }

    /// Fuzzy matching key: "title variant category"
    pub fn fuzzy_key(&self) -> String {
        join_present(&[&self.title, &self.ausfuehrung, &self.category])
    }

    /// Multi-line reply block for this entry
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(5);
        if self.ausfuehrung.is_empty() {
            lines.push(format!("* {}", self.title));
        } else {
            lines.push(format!("* {} — {}", self.title, self.ausfuehrung));
        }
        lines.push(format!("  Kategorie: {}", self.category));
        lines.push(format!("  Bestell-Nr.: {}", self.bestell_nr));

        let price = self
            .price_eur
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "-".to_string());
        let ve = self.ve.as_deref().unwrap_or("-");
        lines.push(format!("  Preis: {} € | VE: {}", price, ve));

        let dims = self.dimensions();
        if !dims.is_empty() {
            let rendered: Vec<String> = dims.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            lines.push(format!("  {}", rendered.join(", ")));
        }
        lines.join("\n")
    }
}

/// Normalized form used for catalog matching: hyphen and slash read as spaces
pub fn search_normalize(text: &str) -> String {
    normalize(text)
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append synonyms for every trigger word contained in the text
pub fn expand_synonyms(text: &str) -> String {
    let norm = search_normalize(text);
    let mut parts = vec![norm.clone()];
    for (key, synonyms) in SYNONYMS {
        if norm.contains(key) {
            parts.extend(synonyms.iter().map(|s| s.to_string()));
        }
    }
    parts.join(" ")
}

/// Read the raw product file
pub fn load_products(path: &Path) -> Result<Vec<Object>, CatalogError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
    let value: Value = serde_json::from_str(&content)?;
    let Value::Array(items) = value else {
        return Err(CatalogError::Parse(format!(
            "{}: expected a JSON array of products",
            path.display()
        )));
    };

    let total = items.len();
    let products: Vec<Object> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if products.len() < total {
        tracing::warn!(
            skipped = total - products.len(),
            "Skipping non-object entries in product file"
        );
    }
    Ok(products)
}

/// Flatten products to one entry per variant
pub fn flatten_products(products: &[Object]) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();

    for product in products {
        let title = text_field(product, TITLE);
        let category = text_field(product, CATEGORY);
        let description = text_field(product, DESCRIPTION);

        let variants = match product.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => match product.get("variants") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => &[],
            },
        };

        for variant in variants.iter().filter_map(Value::as_object) {
            entries.push(flatten_variant(&title, &category, &description, variant));
        }
    }

    entries
}

fn flatten_variant(title: &str, category: &str, description: &str, v: &Object) -> CatalogEntry {
    let bestell_nr = text_field(v, ORDER_NUMBER);
    let ausfuehrung = text_field(v, VARIANT);
    let l_mm = value_field(v, LENGTH);
    let b_mm = value_field(v, WIDTH);
    let h_mm = value_field(v, HEIGHT);
    let staerke_mm = value_field(v, THICKNESS);

    let field_blob = join_present(&[
        title,
        category,
        description,
        &ausfuehrung,
        l_mm.as_deref().unwrap_or_default(),
        b_mm.as_deref().unwrap_or_default(),
        h_mm.as_deref().unwrap_or_default(),
        staerke_mm.as_deref().unwrap_or_default(),
    ]);
    let bestell_norm: String = bestell_nr.chars().filter(|c| *c != ' ').collect();
    let bestell_digits: String = bestell_norm.chars().filter(char::is_ascii_digit).collect();

    CatalogEntry {
        blob: expand_synonyms(&field_blob),
        title_norm: search_normalize(title),
        category_norm: search_normalize(category),
        variant_norm: search_normalize(&ausfuehrung),
        bestell_norm,
        bestell_digits,
        price_eur: first_present(v, PRICE).and_then(parse_price),
        ve: value_field(v, PACKING_UNIT),
        bestell_nr,
        title: title.to_string(),
        category: category.to_string(),
        ausfuehrung,
        description: description.to_string(),
        l_mm,
        b_mm,
        h_mm,
        staerke_mm,
    }
}

/// First alias with a non-empty value
fn first_present<'a>(object: &'a Object, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| object.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn value_field(object: &Object, aliases: &[&str]) -> Option<String> {
    first_present(object, aliases).map(|value| match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

fn text_field(object: &Object, aliases: &[&str]) -> String {
    value_field(object, aliases).unwrap_or_default()
}

/// Numbers or strings with decimal comma; "" and "-" mean absent
pub fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "-" {
                return None;
            }
            s.replace(',', ".").parse().ok()
        }
        _ => None,
    }
}

fn join_present(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lexicon source reading the flattened docs file written by an index build
///
/// Used with the subprocess backend, where the records live outside this
/// process.
pub struct DocsFileLexicon {
    path: PathBuf,
}

#[derive(Deserialize)]
struct DocRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    ausfuehrung: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    bestell_nr: String,
}

impl DocsFileLexicon {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LexiconSource for DocsFileLexicon {
    fn record_texts(&self) -> catalog_chat_core::Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| CatalogError::Io(format!("{}: {}", self.path.display(), e)))?;
        let docs: Vec<DocRecord> = serde_json::from_str(&content).map_err(CatalogError::from)?;
        Ok(docs
            .iter()
            .map(|d| {
                join_present(&[
                    &d.title,
                    &d.category,
                    &d.ausfuehrung,
                    &d.description,
                    &d.bestell_nr,
                ])
            })
            .collect())
    }
}
