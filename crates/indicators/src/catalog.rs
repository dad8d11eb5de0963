//! Versioned, deterministic indicator catalog.

use std::sync::Arc;

use crate::builtin;
use crate::Indicator;

/// Version of the built-in catalog.
pub const CATALOG_VERSION: &str = "1.0";

/// An ordered list of indicators. Enumeration order is stable.
#[derive(Clone)]
pub struct IndicatorCatalog {
    version: String,
    indicators: Vec<Arc<dyn Indicator>>,
}

impl IndicatorCatalog {
    /// An empty catalog.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            indicators: Vec::new(),
        }
    }

    /// The reference indicators shipped with this crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new(CATALOG_VERSION);
        for indicator in builtin::all() {
            catalog.register(Arc::new(indicator));
        }
        catalog
    }

    /// Append an indicator, replacing one with the same identifier.
    pub fn register(&mut self, indicator: Arc<dyn Indicator>) {
        let id = indicator.metadata().identifier.clone();
        match self
            .indicators
            .iter()
            .position(|i| i.metadata().identifier == id)
        {
            Some(pos) => self.indicators[pos] = indicator,
            None => self.indicators.push(indicator),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, identifier: &str) -> Option<&Arc<dyn Indicator>> {
        self.indicators
            .iter()
            .find(|i| i.metadata().identifier == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Indicator>> {
        self.indicators.iter()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

impl std::fmt::Debug for IndicatorCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorCatalog")
            .field("version", &self.version)
            .field(
                "indicators",
                &self
                    .indicators
                    .iter()
                    .map(|i| i.metadata().identifier.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
