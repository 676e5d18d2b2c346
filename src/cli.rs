//! Command-line interface parsing for stackx
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the single [`Action`] the binary performs.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::search::{BuildError, SearchRequest, SortMethod};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The sort method is not one the API supports
    #[error("Invalid sort method: '{0}'. Valid methods: votes, creation, relevance, activity")]
    InvalidSortMethod(String),

    /// A search was requested without `--query`
    #[error("Search requires a query string - please use the '-q' or '--query' argument")]
    MissingQuery,
}

/// stackx - search Stack Exchange sites from your terminal
#[derive(Parser, Debug)]
#[command(name = "stackx")]
#[command(about = "Stack Exchange command line search client - search stack exchange websites in your terminal")]
#[command(after_help = "Have fun searching!")]
#[command(version)]
pub struct Cli {
    /// Search query
    #[arg(short, long, num_args = 1.., value_name = "WORDS")]
    pub query: Option<Vec<String>>,

    /// Stack Exchange site to search, defaults to the configured site
    #[arg(short, long)]
    pub site: Option<String>,

    /// Space separated tags, e.g. "python pandas"
    #[arg(short, long, default_value = "")]
    pub tags: String,

    /// Number of candidate questions to fetch
    #[arg(short, long, default_value_t = 30)]
    pub num: usize,

    /// Sort results by: votes, creation, relevance, activity
    #[arg(long, value_name = "METHOD", default_value = "votes", value_parser = parse_sort_arg)]
    pub sort_by: SortMethod,

    /// Browse all results interactively
    #[arg(short, long)]
    pub interactive: bool,

    /// Print search results as JSON to stdout
    #[arg(short, long)]
    pub json: bool,

    /// Stack Exchange API key for this run, avoids request throttling
    #[arg(short, long)]
    pub key: Option<String>,

    /// Save a Stack Exchange API key to the config file and exit
    #[arg(long, value_name = "KEY")]
    pub set_key: Option<String>,

    /// Path to a config.yaml file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Ignore cached results and refresh the cache
    #[arg(long)]
    pub overwrite_cache: bool,

    /// Remove every cached entry, including aliases, and exit
    #[arg(long)]
    pub flush_cache: bool,

    /// Don't ask for confirmation when flushing the cache
    #[arg(short, long)]
    pub yes: bool,

    /// Show the search result saved under this alias and exit
    #[arg(short, long, value_name = "NAME")]
    pub alias: Option<String>,
}

/// Parses a sort method argument.
pub fn parse_sort_arg(s: &str) -> Result<SortMethod, CliError> {
    s.parse().map_err(|_| CliError::InvalidSortMethod(s.to_string()))
}

/// Options for a search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: String,
    pub site: Option<String>,
    pub tags: String,
    pub num: usize,
    pub sort_by: SortMethod,
    pub interactive: bool,
    pub json: bool,
    pub overwrite_cache: bool,
}

impl SearchOptions {
    /// Builds the request, falling back to `default_site`
    ///
    /// Requests are always accepted-only: only accepted answers are shown.
    pub fn to_request(&self, default_site: &str) -> Result<SearchRequest, BuildError> {
        let site = self.site.as_deref().unwrap_or(default_site);
        SearchRequest::builder(self.query.as_str(), site)
            .tags(&self.tags)
            .accepted_only()
            .num(self.num)
            .sort_by(self.sort_by)
            .build()
    }
}

/// What the binary was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FlushCache { confirmed: bool },
    ViewAlias(String),
    SetKey(String),
    Search(SearchOptions),
}

impl Action {
    /// Picks the action, in order: flush, alias, set-key, search.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.flush_cache {
            return Ok(Action::FlushCache { confirmed: cli.yes });
        }
        if let Some(ref alias) = cli.alias {
            return Ok(Action::ViewAlias(alias.clone()));
        }
        if let Some(ref key) = cli.set_key {
            return Ok(Action::SetKey(key.clone()));
        }

        let query = cli
            .query
            .as_ref()
            .map(|words| words.join(" "))
            .filter(|q| !q.trim().is_empty())
            .ok_or(CliError::MissingQuery)?;

        Ok(Action::Search(SearchOptions {
            query,
            site: cli.site.clone(),
            tags: cli.tags.clone(),
            num: cli.num,
            sort_by: cli.sort_by,
            interactive: cli.interactive,
            json: cli.json,
            overwrite_cache: cli.overwrite_cache,
        }))
    }
}
