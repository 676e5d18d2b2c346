//! One-shot commands that work directly on the cache
//!
//! Aliases are stored in the same keyspace as cached searches: the alias
//! name is the key and the value is a single search result mapping.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{Cache, CacheError};
use crate::search::{SearchError, SearchResult};

/// Errors from the one-shot commands
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Caching is disabled in the config file; set cache.enabled to use {0}")]
    CacheDisabled(&'static str),

    #[error("Alias: '{0}' doesn't exist in cache")]
    AliasNotFound(String),

    #[error("Alias name must not be empty")]
    EmptyAlias,

    #[error("Alias '{alias}' does not hold a search result: {source}")]
    InvalidAlias { alias: String, source: SearchError },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to read confirmation: {0}")]
    Io(#[from] io::Error),
}

/// Asks whether to flush the cache until the user answers `y` or `n`
///
/// End of input counts as `n`.
pub fn confirm_flush<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    loop {
        write!(
            output,
            "Are you sure you want to flush the cache? Type 'y' for YES | 'n' for NO "
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match line.trim() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(output, "Please enter a valid value: 'y' or 'n'")?,
        }
    }
}

/// Removes every cache entry, aliases included
pub async fn flush_cache(cache: &dyn Cache) -> Result<(), CommandError> {
    warn!("flushing cache");
    cache.clear().await?;
    Ok(())
}

/// Reads the result saved under `alias`
pub async fn view_alias(cache: &dyn Cache, alias: &str) -> Result<SearchResult, CommandError> {
    info!(alias, "fetching alias from cache");
    let value = cache
        .get(alias)
        .await?
        .ok_or_else(|| CommandError::AliasNotFound(alias.to_string()))?;

    SearchResult::from_json(&value).map_err(|source| CommandError::InvalidAlias {
        alias: alias.to_string(),
        source,
    })
}

/// Saves `result` under `alias`, replacing any previous value
///
/// Returns the trimmed alias the result was stored under.
pub async fn save_alias(
    cache: &dyn Cache,
    alias: &str,
    result: &SearchResult,
) -> Result<String, CommandError> {
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(CommandError::EmptyAlias);
    }

    cache.set(alias, &result.to_json()).await?;
    info!(alias, question_id = result.question.question_id, "saved alias");
    Ok(alias.to_string())
}
