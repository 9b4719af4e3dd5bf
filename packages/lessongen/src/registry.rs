//! Static catalog of known source APIs.
//!
//! Built once at process start ([`ApiRegistry::builtin`]), wrapped in an
//! `Arc`, and shared read-only with the selector and orchestrator. No
//! ambient globals, no teardown.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content category a source covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Encyclopedia,
    Research,
    Community,
    News,
    Books,
    Qa,
}

impl Category {
    /// Human-readable name, also used for catalog search.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Encyclopedia => "encyclopedia",
            Self::Research => "research",
            Self::Community => "community",
            Self::News => "news",
            Self::Books => "books",
            Self::Qa => "qa",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Documented rate limit for a source API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Sustained requests per second the API tolerates
    pub requests_per_second: u32,

    /// Notes from the API's documentation (auth, quotas)
    pub notes: String,
}

/// Static description of one source API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDescriptor {
    /// Stable id, matches [`crate::types::ContentSource::id`]
    pub id: String,

    /// Categories this source covers
    pub categories: BTreeSet<Category>,

    /// Free-form capability tags ("full-text", "search", "recent")
    pub capabilities: BTreeSet<String>,

    /// Documented rate limit
    pub rate_limit: RateLimitInfo,
}

impl ApiDescriptor {
    /// Create a descriptor.
    pub fn new(
        id: impl Into<String>,
        categories: impl IntoIterator<Item = Category>,
        capabilities: impl IntoIterator<Item = &'static str>,
        rate_limit: RateLimitInfo,
    ) -> Self {
        Self {
            id: id.into(),
            categories: categories.into_iter().collect(),
            capabilities: capabilities.into_iter().map(|c| c.to_string()).collect(),
            rate_limit,
        }
    }

    /// Case-insensitive substring match over id, categories, and capabilities.
    fn matches(&self, term_lower: &str) -> bool {
        self.id.to_lowercase().contains(term_lower)
            || self
                .categories
                .iter()
                .any(|c| c.name().contains(term_lower))
            || self
                .capabilities
                .iter()
                .any(|c| c.to_lowercase().contains(term_lower))
    }
}

/// Read-only catalog of source APIs, in declaration order.
///
/// Declaration order is the stable tie-break order used by the selector
/// and the orchestrator's ranking.
pub struct ApiRegistry {
    apis: IndexMap<String, ApiDescriptor>,
}

impl ApiRegistry {
    /// Build a registry from descriptors. Later duplicates replace earlier
    /// ones but keep the original position.
    pub fn new(descriptors: impl IntoIterator<Item = ApiDescriptor>) -> Self {
        let mut apis = IndexMap::new();
        for d in descriptors {
            apis.insert(d.id.clone(), d);
        }
        Self { apis }
    }

    /// The built-in catalog.
    ///
    /// Includes descriptors for sources without a shipped adapter
    /// (openlibrary, stackexchange); the orchestrator skips those when
    /// intersecting with its adapter set.
    pub fn builtin() -> Self {
        Self::new([
            ApiDescriptor::new(
                "wikipedia",
                [Category::Encyclopedia],
                ["search", "full-text", "extracts"],
                RateLimitInfo {
                    requests_per_second: 5,
                    notes: "anonymous use; etiquette asks for a descriptive user agent".to_string(),
                },
            ),
            ApiDescriptor::new(
                "arxiv",
                [Category::Research],
                ["search", "abstracts", "recent"],
                RateLimitInfo {
                    requests_per_second: 1,
                    notes: "one request per 3 seconds recommended".to_string(),
                },
            ),
            ApiDescriptor::new(
                "hackernews",
                [Category::Community, Category::News],
                ["search", "recent", "points"],
                RateLimitInfo {
                    requests_per_second: 10,
                    notes: "Algolia-hosted, generous limits".to_string(),
                },
            ),
            ApiDescriptor::new(
                "openlibrary",
                [Category::Books, Category::Encyclopedia],
                ["search", "metadata"],
                RateLimitInfo {
                    requests_per_second: 2,
                    notes: "no auth required".to_string(),
                },
            ),
            ApiDescriptor::new(
                "stackexchange",
                [Category::Qa, Category::Community],
                ["search", "answers"],
                RateLimitInfo {
                    requests_per_second: 3,
                    notes: "300 requests/day without a key".to_string(),
                },
            ),
        ])
    }

    /// All descriptors in declaration order.
    pub fn get_all(&self) -> Vec<&ApiDescriptor> {
        self.apis.values().collect()
    }

    /// Look up one descriptor by id.
    pub fn get(&self, id: &str) -> Option<&ApiDescriptor> {
        self.apis.get(id)
    }

    /// Ids of sources covering a category, in declaration order.
    pub fn get_by_category(&self, category: Category) -> Vec<&str> {
        self.apis
            .values()
            .filter(|d| d.categories.contains(&category))
            .map(|d| d.id.as_str())
            .collect()
    }

    /// Case-insensitive substring search over id/category/capability fields.
    pub fn search(&self, term: &str) -> Vec<&str> {
        let term_lower = term.to_lowercase();
        self.apis
            .values()
            .filter(|d| d.matches(&term_lower))
            .map(|d| d.id.as_str())
            .collect()
    }

    /// Declaration position of an id, used as a ranking tie-break.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.apis.get_index_of(id)
    }

    /// Human-readable digest of the catalog, suitable for prompting.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for d in self.apis.values() {
            let categories: Vec<&str> = d.categories.iter().map(|c| c.name()).collect();
            let capabilities: Vec<&str> = d.capabilities.iter().map(|s| s.as_str()).collect();
            out.push_str(&format!(
                "- {}: categories [{}], capabilities [{}], ~{} req/s\n",
                d.id,
                categories.join(", "),
                capabilities.join(", "),
                d.rate_limit.requests_per_second,
            ));
        }
        out
    }
}
