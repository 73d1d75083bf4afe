//! # Cache Key Scheme
//!
//! Deterministic cache keys per resource class. Keys are the namespace and the
//! resource components joined with `:`. Parameter values are not escaped, so a
//! value containing `:` can collide with a different parameter split.
//!
//! Search keys carry the raw query where other resources carry their resource
//! tag (`<ns>:<query>:<page>`). A search for `trending` therefore shares the
//! key space with the trending entries.

/// Builds cache keys for every cached resource
#[derive(Debug, Clone)]
pub struct CacheKeyScheme {
    namespace: String,
}

impl CacheKeyScheme {
    /// Create a key scheme rooted at `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn compose(&self, components: &[&str]) -> String {
        let mut key = self.namespace.clone();
        for component in components {
            key.push(':');
            key.push_str(component);
        }
        key
    }

    /// `<ns>:trending:tv`
    pub fn trending_tv(&self) -> String {
        self.compose(&["trending", "tv"])
    }

    /// `<ns>:trending:movies`
    pub fn trending_movies(&self) -> String {
        self.compose(&["trending", "movies"])
    }

    /// `<ns>:info:<id>`
    pub fn info(&self, id: &str) -> String {
        self.compose(&["info", id])
    }

    /// `<ns>:watch:<episodeId>:<mediaId>:<server-or-empty>`
    pub fn watch(&self, episode_id: &str, media_id: &str, server: Option<&str>) -> String {
        self.compose(&["watch", episode_id, media_id, server.unwrap_or("")])
    }

    /// `<ns>:<rawQuery>:<page-or-empty>`
    pub fn search(&self, raw_query: &str, page: Option<&str>) -> String {
        self.compose(&[raw_query, page.unwrap_or("")])
    }
}

impl Default for CacheKeyScheme {
    fn default() -> Self {
        Self::new("catalog")
    }
}
