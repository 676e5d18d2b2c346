//! Search request model
//!
//! A [`SearchRequest`] describes one call to `/search/advanced`. It can only
//! be obtained through [`SearchRequest::builder`], which takes the query and
//! site up front; the optional refinements may be applied in any order and
//! [`SearchRequestBuilder::build`] produces the immutable request.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use thiserror::Error;

use super::SearchError;

/// Path of the advanced search endpoint, relative to the API root
pub const SEARCH_ENDPOINT: &str = "/search/advanced";

/// Response filter that includes question and answer bodies
pub const DEFAULT_FILTER: &str = "withbody";

/// Number of candidate questions requested when none is given
pub const DEFAULT_NUM: usize = 30;

/// Largest page the API will return for one call
pub const MAX_PAGE_SIZE: usize = 100;

/// Errors raised when finalizing a request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Search requires a non-empty query")]
    EmptyQuery,

    #[error("Search requires a site, e.g. 'stackoverflow'")]
    EmptySite,

    #[error("Number of results must be a positive integer")]
    ZeroResults,
}

/// Ordering applied by the API to search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortMethod {
    #[default]
    Votes,
    Creation,
    Relevance,
    Activity,
}

impl SortMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMethod::Votes => "votes",
            SortMethod::Creation => "creation",
            SortMethod::Relevance => "relevance",
            SortMethod::Activity => "activity",
        }
    }
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "votes" => Ok(SortMethod::Votes),
            "creation" => Ok(SortMethod::Creation),
            "relevance" => Ok(SortMethod::Relevance),
            "activity" => Ok(SortMethod::Activity),
            other => Err(other.to_string()),
        }
    }
}

/// A fully specified `/search/advanced` request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    query: String,
    tags: Option<String>,
    num: usize,
    site: String,
    accepted: bool,
    filter: String,
    sort_by: SortMethod,
}

impl SearchRequest {
    /// Starts building a request for `query` on `site`
    pub fn builder(query: impl Into<String>, site: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder {
            query: query.into(),
            site: site.into(),
            tags: None,
            num: DEFAULT_NUM,
            accepted: false,
            filter: DEFAULT_FILTER.to_string(),
            sort_by: SortMethod::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Semicolon-delimited tags, as the API expects them
    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// Maximum number of candidate questions taken from the search
    pub fn num(&self) -> usize {
        self.num
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn accepted_only(&self) -> bool {
        self.accepted
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort_by(&self) -> SortMethod {
        self.sort_by
    }

    /// Query parameters sent to `/search/advanced`, ordered by name
    ///
    /// `num` is sent as `pagesize`, capped at [`MAX_PAGE_SIZE`].
    pub fn query_params(&self) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("q", self.query.clone());
        params.insert("pagesize", self.num.min(MAX_PAGE_SIZE).to_string());
        params.insert("site", self.site.clone());
        params.insert("filter", self.filter.clone());
        params.insert("sort", self.sort_by.to_string());
        if let Some(ref tags) = self.tags {
            params.insert("tagged", tags.clone());
        }
        if self.accepted {
            params.insert("accepted", "true".to_string());
        }
        params
    }

    /// The encoded search URL for this request under `base_url`
    ///
    /// Never carries the API key, so the result doubles as a stable cache key.
    pub fn search_url(&self, base_url: &str) -> Result<Url, SearchError> {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), SEARCH_ENDPOINT);
        Url::parse_with_params(&endpoint, self.query_params())
            .map_err(|e| SearchError::request(endpoint, format!("invalid url: {}", e)))
    }

    /// Canonical cache key: the search URL as a string
    pub fn cache_key(&self, base_url: &str) -> Result<String, SearchError> {
        self.search_url(base_url).map(String::from)
    }
}

/// Step builder for [`SearchRequest`]
#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    query: String,
    site: String,
    tags: Option<String>,
    num: usize,
    accepted: bool,
    filter: String,
    sort_by: SortMethod,
}

impl SearchRequestBuilder {
    /// Space-separated tags, e.g. `"python c++ rust"`
    ///
    /// Blank input clears the tag filter.
    pub fn tags(mut self, tags: &str) -> Self {
        let joined = tags.split_whitespace().collect::<Vec<_>>().join(";");
        self.tags = if joined.is_empty() { None } else { Some(joined) };
        self
    }

    /// Only return questions that have an accepted answer
    pub fn accepted_only(mut self) -> Self {
        self.accepted = true;
        self
    }

    /// Number of candidate questions to keep
    pub fn num(mut self, num: usize) -> Self {
        self.num = num;
        self
    }

    /// Response filter, see <https://api.stackexchange.com/docs/filters>
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn sort_by(mut self, method: SortMethod) -> Self {
        self.sort_by = method;
        self
    }

    pub fn build(self) -> Result<SearchRequest, BuildError> {
        let query = self.query.trim().to_string();
        let site = self.site.trim().to_string();
        if query.is_empty() {
            return Err(BuildError::EmptyQuery);
        }
        if site.is_empty() {
            return Err(BuildError::EmptySite);
        }
        if self.num == 0 {
            return Err(BuildError::ZeroResults);
        }

        Ok(SearchRequest {
            query,
            tags: self.tags,
            num: self.num,
            site,
            accepted: self.accepted,
            filter: self.filter,
            sort_by: self.sort_by,
        })
    }
}
