//! ITIS taxonomy lookups.
//!
//! Critterbase only needs two facts about a TSN: its scientific name and the
//! chain of ancestor TSNs ("hierarchy") from the kingdom down to itself. The
//! `TaxonomyService` trait is the seam services depend on; `ItisClient` talks
//! to the ITIS Solr endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ItisConfig;

#[derive(Debug, Error)]
pub enum ItisError {
    #[error("TSN {0} not found in ITIS")]
    NotFound(i32),

    #[error("ITIS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected ITIS response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait TaxonomyService: Send + Sync {
    async fn scientific_name(&self, tsn: i32) -> Result<String, ItisError>;

    /// Ancestor TSNs from the root down to and including `tsn`
    async fn tsn_hierarchy(&self, tsn: i32) -> Result<Vec<i32>, ItisError>;
}

#[derive(Debug, Deserialize)]
struct SolrEnvelope {
    response: SolrResponse,
}

#[derive(Debug, Deserialize)]
struct SolrResponse {
    #[serde(default)]
    docs: Vec<SolrDoc>,
}

#[derive(Debug, Deserialize)]
struct SolrDoc {
    #[serde(rename = "nameWOInd")]
    name_wo_ind: Option<String>,
    #[serde(rename = "hierarchyTSN")]
    hierarchy_tsn: Option<OneOrMany>,
}

/// Solr returns multi-valued fields as arrays, single-valued as strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn first(&self) -> Option<&str> {
        match self {
            OneOrMany::One(s) => Some(s.as_str()),
            OneOrMany::Many(v) => v.first().map(String::as_str),
        }
    }
}

/// Parse `$202423$914154$180703$` into `[202423, 914154, 180703]`
pub fn parse_hierarchy(path: &str) -> Result<Vec<i32>, ItisError> {
    path.split('$')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| ItisError::InvalidResponse(format!("bad hierarchy segment '{}'", part)))
        })
        .collect()
}

pub struct ItisClient {
    base: Url,
    client: reqwest::Client,
}

impl ItisClient {
    pub fn new(config: &ItisConfig) -> Result<Self, ItisError> {
        let base = Url::parse(&config.solr_url)
            .map_err(|e| ItisError::InvalidResponse(format!("invalid ITIS url '{}': {}", config.solr_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { base, client })
    }

    fn url_for(&self, tsn: i32) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("wt", "json")
            .append_pair("omitHeader", "true")
            .append_pair("q", &format!("tsn:{}", tsn));
        url
    }

    async fn lookup(&self, tsn: i32) -> Result<SolrDoc, ItisError> {
        let url = self.url_for(tsn);
        debug!("ITIS lookup {}", url);
        let envelope: SolrEnvelope = self.client.get(url).send().await?.error_for_status()?.json().await?;
        envelope.response.docs.into_iter().next().ok_or(ItisError::NotFound(tsn))
    }
}

#[async_trait]
impl TaxonomyService for ItisClient {
    async fn scientific_name(&self, tsn: i32) -> Result<String, ItisError> {
        self.lookup(tsn)
            .await?
            .name_wo_ind
            .ok_or_else(|| ItisError::InvalidResponse(format!("TSN {} has no scientific name", tsn)))
    }

    async fn tsn_hierarchy(&self, tsn: i32) -> Result<Vec<i32>, ItisError> {
        let doc = self.lookup(tsn).await?;
        let path = doc
            .hierarchy_tsn
            .as_ref()
            .and_then(OneOrMany::first)
            .ok_or_else(|| ItisError::InvalidResponse(format!("TSN {} has no hierarchy", tsn)))?;
        parse_hierarchy(path)
    }
}

/// Memoizes hierarchy lookups for the lifetime of one request
pub struct TaxonomyMemo {
    inner: Arc<dyn TaxonomyService>,
    hierarchies: Mutex<HashMap<i32, Vec<i32>>>,
    names: Mutex<HashMap<i32, String>>,
}

impl TaxonomyMemo {
    pub fn new(inner: Arc<dyn TaxonomyService>) -> Self {
        Self {
            inner,
            hierarchies: Mutex::new(HashMap::new()),
            names: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TaxonomyService for TaxonomyMemo {
    async fn scientific_name(&self, tsn: i32) -> Result<String, ItisError> {
        let cached = self.names.lock().ok().and_then(|m| m.get(&tsn).cloned());
        if let Some(name) = cached {
            return Ok(name);
        }
        let name = self.inner.scientific_name(tsn).await?;
        if let Ok(mut names) = self.names.lock() {
            names.insert(tsn, name.clone());
        }
        Ok(name)
    }

    async fn tsn_hierarchy(&self, tsn: i32) -> Result<Vec<i32>, ItisError> {
        let cached = self.hierarchies.lock().ok().and_then(|m| m.get(&tsn).cloned());
        if let Some(path) = cached {
            return Ok(path);
        }
        let path = self.inner.tsn_hierarchy(tsn).await?;
        if let Ok(mut hierarchies) = self.hierarchies.lock() {
            hierarchies.insert(tsn, path.clone());
        }
        Ok(path)
    }
}

/// Fixed in-memory taxonomy, for running without network access to ITIS
#[derive(Debug, Default, Clone)]
pub struct StaticTaxonomy {
    taxa: HashMap<i32, (String, Vec<i32>)>,
}

impl StaticTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_taxon(mut self, tsn: i32, name: &str, hierarchy: &[i32]) -> Self {
        self.taxa.insert(tsn, (name.to_string(), hierarchy.to_vec()));
        self
    }
}

#[async_trait]
impl TaxonomyService for StaticTaxonomy {
    async fn scientific_name(&self, tsn: i32) -> Result<String, ItisError> {
        self.taxa.get(&tsn).map(|(name, _)| name.clone()).ok_or(ItisError::NotFound(tsn))
    }

    async fn tsn_hierarchy(&self, tsn: i32) -> Result<Vec<i32>, ItisError> {
        self.taxa.get(&tsn).map(|(_, path)| path.clone()).ok_or(ItisError::NotFound(tsn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parses_hierarchy_paths() {
        assert_eq!(parse_hierarchy("$202423$914154$180703$").unwrap(), vec![202423, 914154, 180703]);
        assert_eq!(parse_hierarchy("180703").unwrap(), vec![180703]);
        assert!(parse_hierarchy("$202423$abc$").is_err());
    }

    #[test]
    fn reads_solr_documents() {
        let body = serde_json::json!({
            "response": {
                "numFound": 1,
                "start": 0,
                "docs": [{
                    "tsn": "180703",
                    "nameWOInd": "Alces alces",
                    "hierarchyTSN": ["$202423$914154$180703$"]
                }]
            }
        });
        let envelope: SolrEnvelope = serde_json::from_value(body).unwrap();
        let doc = &envelope.response.docs[0];
        assert_eq!(doc.name_wo_ind.as_deref(), Some("Alces alces"));
        assert_eq!(doc.hierarchy_tsn.as_ref().and_then(OneOrMany::first), Some("$202423$914154$180703$"));
    }

    #[test]
    fn builds_solr_query() {
        let client = ItisClient::new(&ItisConfig {
            solr_url: "https://services.itis.gov/".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap();
        let url = client.url_for(180703);
        assert_eq!(url.as_str(), "https://services.itis.gov/?wt=json&omitHeader=true&q=tsn%3A180703");
    }

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TaxonomyService for Counting {
        async fn scientific_name(&self, tsn: i32) -> Result<String, ItisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("taxon {}", tsn))
        }

        async fn tsn_hierarchy(&self, tsn: i32) -> Result<Vec<i32>, ItisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, tsn])
        }
    }

    #[tokio::test]
    async fn memo_calls_through_once() {
        let counting = Arc::new(Counting { calls: AtomicUsize::new(0) });
        let memo = TaxonomyMemo::new(counting.clone());
        assert_eq!(memo.tsn_hierarchy(5).await.unwrap(), vec![1, 5]);
        assert_eq!(memo.tsn_hierarchy(5).await.unwrap(), vec![1, 5]);
        assert_eq!(memo.scientific_name(5).await.unwrap(), "taxon 5");
        assert_eq!(memo.scientific_name(5).await.unwrap(), "taxon 5");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn static_taxonomy_reports_unknown_tsn() {
        let taxonomy = StaticTaxonomy::new().with_taxon(180703, "Alces alces", &[202423, 180703]);
        assert_eq!(taxonomy.scientific_name(180703).await.unwrap(), "Alces alces");
        assert!(matches!(taxonomy.tsn_hierarchy(1).await, Err(ItisError::NotFound(1))));
    }
}
