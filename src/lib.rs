//! Interop binding generator front end.
//!
//! Loads descriptor feeds and configuration, runs the generator and writes its
//! files. The generator itself lives in [`interop_generator`], the runtime
//! registry generated code relies on in [`interop_registry`].
//!
//! ```no_run
//! use interop_bindgen::{GeneratorConfig, generate, loader};
//! use std::path::Path;
//!
//! let feed = loader::load_feed(Path::new("feed.json")).unwrap();
//! let output = generate(&feed, &GeneratorConfig::default()).unwrap();
//! println!("{} files", output.files.len());
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;

pub use interop_core;
pub use interop_generator;
pub use interop_registry;

pub use config::GeneratorConfig;
pub use error::{BindgenError, Result};
pub use output::{OutputLayout, WriteSummary, write_files};

use interop_core::{FeedDescriptor, GenerationError};
use interop_generator::{GenerationOutput, Generator};

/// Validate `config` and run one generation over `feed`.
///
/// Non-fatal errors are returned inside the output; fatal ones as `Err`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate(feed: &FeedDescriptor, config: &GeneratorConfig) -> Result<GenerationOutput> {
    config.validate().map_err(GenerationError::from)?;
    Ok(Generator::new(config.options()).run(feed)?)
}

/// One line per leaf error, `error[IB0102]: ...`.
pub fn diagnostics<'e>(errors: impl IntoIterator<Item = &'e GenerationError>) -> Vec<String> {
    errors
        .into_iter()
        .flat_map(|err| err.clone().into_leaves())
        .map(|leaf| format!("error[{}]: {leaf}", leaf.code()))
        .collect()
}
