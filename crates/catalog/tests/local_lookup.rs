//! Gateway over the local backend, loaded from a product file on disk

use std::sync::Arc;

use catalog_chat_catalog::{
    build_backend, flatten_products, CatalogGateway, LocalCatalog, LookupFailure, SearchTuning,
};
use catalog_chat_config::CatalogConfig;
use catalog_chat_core::LexiconSource;
use serde_json::json;

const PRODUCTS: &str = r#"[
  {
    "title": "Venezianer Glättekelle",
    "category": "Glätten",
    "description": "Federstahl, Holzgriff",
    "variants": [
      { "bestell_nr": "505.02", "ausfuehrung": "240 x 100 mm", "price_eur": 24.9, "ve": 6 },
      { "bestell_nr": "505.04", "ausfuehrung": "280 x 120 mm", "price_eur": 27.5, "ve": 6 }
    ]
  },
  {
    "Title": "Herzgriffspachtel",
    "Kategorie": "Spachteln",
    "items": [ { "Bestell-Nr.": "31.060", "Ausführung": "60 mm", "€": "4,20", "VE": 12 } ]
  }
]"#;

fn config(dir: &tempfile::TempDir) -> CatalogConfig {
    let products = dir.path().join("produkte.json");
    std::fs::write(&products, PRODUCTS).unwrap();
    CatalogConfig {
        products_path: products.display().to_string(),
        docs_path: dir.path().join("docs.json").display().to_string(),
        ..CatalogConfig::default()
    }
}

#[tokio::test]
async fn test_order_number_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let handles = build_backend(&config).unwrap();
    let gateway = CatalogGateway::new(handles.backend, &config);

    let text = gateway.lookup("Bestell-Nr. 505.02").await.unwrap();
    assert!(text.contains("Bestell-Nr.: 505.02"));
    assert!(!text.contains("505.04"));
}

#[tokio::test]
async fn test_synonym_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let handles = build_backend(&config).unwrap();
    let gateway = CatalogGateway::new(handles.backend, &config);

    let text = gateway.lookup("Haben Sie Herzspachtel?").await.unwrap();
    assert!(text.contains("* Herzgriffspachtel — 60 mm"));
    assert!(text.contains("Preis: 4.20 € | VE: 12"));
}

#[tokio::test]
async fn test_unknown_product() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let handles = build_backend(&config).unwrap();
    let gateway = CatalogGateway::new(handles.backend, &config);

    assert_eq!(
        gateway.lookup("Betonmischer").await,
        Err(LookupFailure::NoMatch)
    );
}

#[tokio::test]
async fn test_lexicon_source_and_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir);
    let handles = build_backend(&config).unwrap();

    let texts = handles.lexicon_source.record_texts().unwrap();
    assert_eq!(texts.len(), 3);
    assert!(texts[2].contains("Herzgriffspachtel"));

    let gateway = CatalogGateway::new(handles.backend, &config);
    assert_eq!(gateway.rebuild().await.unwrap(), 3);
    assert!(dir.path().join("docs.json").exists());
}

#[tokio::test]
async fn test_slow_scan_hits_gateway_timeout() {
    let products: Vec<_> = (0..60_000)
        .map(|i| {
            json!({
                "title": format!("Fugenkelle Modell {i}"),
                "category": "Fugen",
                "variants": [ { "bestell_nr": format!("{}.{:03}", 100 + i / 1000, i % 1000) } ]
            })
            .as_object()
            .unwrap()
            .clone()
        })
        .collect();
    let catalog = LocalCatalog::from_entries(flatten_products(&products), SearchTuning::default());
    let config = CatalogConfig {
        timeout_ms: 1,
        ..CatalogConfig::default()
    };
    let gateway = CatalogGateway::new(Arc::new(catalog), &config);

    // falls through to the fuzzy scan over every entry
    assert_eq!(
        gateway.lookup("Betonmischer Diesel Anhänger").await,
        Err(LookupFailure::Timeout(1))
    );
}
