//! Static product → tier tables, one per provider.
//!
//! Loaded once from configuration and shared read-only. Product ids are
//! matched exactly (case-sensitive).

use std::collections::HashMap;

use serde::Deserialize;

use crate::event::{Provider, Tier};

/// A single `product_id → tier` row as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
  pub product_id: String,
  pub tier:       Tier,
}

/// Configuration shape: one list of entries per provider.
///
/// Product ids are kept as values rather than table keys so that layered
/// config sources cannot fold their case.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  pub kiwify:  Vec<CatalogEntry>,
  pub hotmart: Vec<CatalogEntry>,
}

/// Per-provider product → tier lookup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CatalogConfig")]
pub struct TierCatalog {
  tables: HashMap<Provider, HashMap<String, Tier>>,
}

impl TierCatalog {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert, mostly useful in tests.
  pub fn with(
    mut self,
    provider: Provider,
    product_id: impl Into<String>,
    tier: Tier,
  ) -> Self {
    self.insert(provider, product_id, tier);
    self
  }

  pub fn insert(
    &mut self,
    provider: Provider,
    product_id: impl Into<String>,
    tier: Tier,
  ) {
    self
      .tables
      .entry(provider)
      .or_default()
      .insert(product_id.into(), tier);
  }

  /// Derive the tier for a product. Unmapped or absent ids are
  /// [`Tier::Basic`].
  pub fn tier_for(&self, provider: Provider, product_id: Option<&str>) -> Tier {
    product_id
      .and_then(|id| self.tables.get(&provider)?.get(id))
      .copied()
      .unwrap_or_default()
  }

  /// Number of mapped products for `provider`.
  pub fn len(&self, provider: Provider) -> usize {
    self.tables.get(&provider).map_or(0, HashMap::len)
  }
}

impl From<CatalogConfig> for TierCatalog {
  fn from(cfg: CatalogConfig) -> Self {
    let mut catalog = Self::new();
    for e in cfg.kiwify {
      catalog.insert(Provider::Kiwify, e.product_id, e.tier);
    }
    for e in cfg.hotmart {
      catalog.insert(Provider::Hotmart, e.product_id, e.tier);
    }
    catalog
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn catalog() -> TierCatalog {
    TierCatalog::new()
      .with(Provider::Kiwify, "prod_A1", Tier::Plus)
      .with(Provider::Kiwify, "prod_A2", Tier::Elite)
      .with(Provider::Hotmart, "123456", Tier::Elite)
  }

  #[test]
  fn mapped_ids_resolve() {
    let c = catalog();
    assert_eq!(c.tier_for(Provider::Kiwify, Some("prod_A1")), Tier::Plus);
    assert_eq!(c.tier_for(Provider::Kiwify, Some("prod_A2")), Tier::Elite);
    assert_eq!(c.tier_for(Provider::Hotmart, Some("123456")), Tier::Elite);
  }

  #[test]
  fn unmapped_or_absent_ids_are_basic() {
    let c = catalog();
    assert_eq!(c.tier_for(Provider::Kiwify, Some("unknown")), Tier::Basic);
    assert_eq!(c.tier_for(Provider::Kiwify, None), Tier::Basic);
    assert_eq!(c.tier_for(Provider::Hotmart, None), Tier::Basic);
    assert_eq!(TierCatalog::new().tier_for(Provider::Hotmart, Some("x")), Tier::Basic);
  }

  #[test]
  fn tables_are_scoped_per_provider() {
    let c = catalog();
    // Known to Kiwify only.
    assert_eq!(c.tier_for(Provider::Hotmart, Some("prod_A1")), Tier::Basic);
  }

  #[test]
  fn lookup_is_case_sensitive() {
    let c = catalog();
    assert_eq!(c.tier_for(Provider::Kiwify, Some("PROD_A1")), Tier::Basic);
  }

  #[test]
  fn deserializes_from_config_shape() {
    let c: TierCatalog = serde_json::from_value(json!({
      "kiwify":  [{ "product_id": "prod_A1", "tier": "plus" }],
      "hotmart": [{ "product_id": "PROD_ZZZZZ", "tier": "elite" }],
    }))
    .unwrap();

    assert_eq!(c.len(Provider::Kiwify), 1);
    assert_eq!(c.tier_for(Provider::Hotmart, Some("PROD_ZZZZZ")), Tier::Elite);
  }

  #[test]
  fn missing_provider_section_is_empty() {
    let c: TierCatalog = serde_json::from_value(json!({})).unwrap();
    assert_eq!(c.len(Provider::Kiwify), 0);
    assert_eq!(c.len(Provider::Hotmart), 0);
  }
}
