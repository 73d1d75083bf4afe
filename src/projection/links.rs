//! Links embedded in responses: watch URLs and search pagination.

/// Previous/next search page URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// Builds absolute gateway URLs from a base such as `https://catalog.example.com`
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/watch?episodeId=<episode>&mediaId=<media>`
    pub fn watch_url(&self, episode_id: &str, media_id: &str) -> String {
        format!(
            "{}/watch?episodeId={}&mediaId={}",
            self.base_url,
            urlencoding::encode(episode_id),
            urlencoding::encode(media_id)
        )
    }

    /// `<base>/search/<query>`, query percent-encoded
    pub fn search_url(&self, query: &str) -> String {
        format!("{}/search/{}", self.base_url, urlencoding::encode(query))
    }

    /// Next link iff there is a next page, previous link iff past page 1.
    /// No next link is built past `u32::MAX`.
    pub fn page_links(&self, query: &str, current_page: u32, has_next_page: bool) -> PageLinks {
        let search_url = self.search_url(query);

        PageLinks {
            next: current_page
                .checked_add(1)
                .filter(|_| has_next_page)
                .map(|next| format!("{}?page={}", search_url, next)),
            prev: (current_page > 1).then(|| format!("{}?page={}", search_url, current_page - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_last_page_has_no_links() {
        let links = LinkBuilder::new("http://gw.local");
        assert_eq!(
            links.page_links("foo", 1, false),
            PageLinks {
                next: None,
                prev: None
            }
        );
    }

    #[test]
    fn test_middle_page_links_both_ways() {
        let links = LinkBuilder::new("http://gw.local/");
        let page = links.page_links("foo", 3, true);
        assert_eq!(page.next.as_deref(), Some("http://gw.local/search/foo?page=4"));
        assert_eq!(page.prev.as_deref(), Some("http://gw.local/search/foo?page=2"));
    }

    #[test]
    fn test_last_page_links_back_only() {
        let page = LinkBuilder::new("http://gw.local").page_links("foo", 5, false);
        assert!(page.next.is_none());
        assert_eq!(page.prev.as_deref(), Some("http://gw.local/search/foo?page=4"));
    }

    #[test]
    fn test_last_representable_page_has_no_next_link() {
        let page = LinkBuilder::new("http://gw.local").page_links("foo", u32::MAX, true);
        assert!(page.next.is_none());
        assert_eq!(
            page.prev,
            Some(format!("http://gw.local/search/foo?page={}", u32::MAX - 1))
        );
    }

    #[test]
    fn test_query_is_percent_encoded() {
        let links = LinkBuilder::new("http://gw.local");
        assert_eq!(
            links.search_url("the office/us"),
            "http://gw.local/search/the%20office%2Fus"
        );
    }

    #[test]
    fn test_watch_url_encodes_ids() {
        let links = LinkBuilder::new("http://gw.local");
        assert_eq!(
            links.watch_url("ep-1", "movie-42"),
            "http://gw.local/watch?episodeId=ep-1&mediaId=movie-42"
        );
        assert_eq!(
            links.watch_url("123", "tv/watch-x-9"),
            "http://gw.local/watch?episodeId=123&mediaId=tv%2Fwatch-x-9"
        );
    }
}
