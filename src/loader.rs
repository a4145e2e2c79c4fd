//! Reading descriptor feeds.
//!
//! Several feeds may be given on the command line, typically one per side of
//! the boundary. They are concatenated in argument order.

use std::path::Path;

use interop_core::FeedDescriptor;

use crate::error::{BindgenError, Result};

pub fn parse_feed(text: &str) -> std::result::Result<FeedDescriptor, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn load_feed(path: &Path) -> Result<FeedDescriptor> {
    let text = std::fs::read_to_string(path).map_err(|source| BindgenError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let feed = parse_feed(&text).map_err(|source| BindgenError::Feed {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        modules = feed.modules.len(),
        mappings = feed.mappings.len(),
        types = feed.types.len(),
        "feed loaded"
    );
    Ok(feed)
}

/// Load and concatenate every feed in `paths`.
pub fn load_feeds<P: AsRef<Path>>(paths: &[P]) -> Result<FeedDescriptor> {
    let mut merged = FeedDescriptor::default();
    for path in paths {
        let feed = load_feed(path.as_ref())?;
        merged.modules.extend(feed.modules);
        merged.mappings.extend(feed.mappings);
        merged.types.extend(feed.types);
    }
    Ok(merged)
}
