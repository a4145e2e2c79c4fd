//! Error types for binding generation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! GenerationError
//! ├── Configuration  - bad mapping declarations or options (fatal)
//! ├── Unresolved     - a referenced type could not be resolved
//! ├── Metadata       - inconsistent metadata, e.g. a mangling collision
//! ├── Cycle          - inheritance cycle under the abort policy (fatal)
//! ├── Io             - a single output file could not be written
//! └── Aggregate      - everything collected so far
//! ```
//!
//! Non-fatal errors skip the offending declaration and generation goes on.
//! [`ErrorCollector`] records them and bails out on the first fatal one.

use thiserror::Error;

use crate::SourceLocation;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Invalid mapping declarations or generator options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Two mappings claim the same native name.
    #[error("conflicting mappings for native type '{native_name}': '{existing}' and '{new}'")]
    ConflictingMapping {
        native_name: String,
        existing: String,
        new: String,
    },

    /// A mapping is missing a name or has an invalid format string.
    #[error("malformed mapping '{name}': {reason}")]
    MalformedMapping { name: String, reason: String },

    /// An option or config file value is invalid.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

// ============================================================================
// Unresolved Types
// ============================================================================

/// No resolver produced a type for a reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved type '{name}' referenced by '{requested_by}'{}", location_suffix(.location))]
pub struct UnresolvedTypeError {
    /// The raw reference as written.
    pub name: String,
    /// The declaration that needed it.
    pub requested_by: String,
    pub location: Option<SourceLocation>,
}

fn location_suffix(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" at {loc}"),
        None => String::new(),
    }
}

// ============================================================================
// Generation Errors
// ============================================================================

/// Any error raised while generating bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedTypeError),

    #[error("metadata error in '{symbol}': {message}")]
    Metadata { symbol: String, message: String },

    #[error("inheritance cycle between {}", .participants.join(" -> "))]
    Cycle { participants: Vec<String> },

    #[error("could not write '{path}': {message}")]
    Io { path: String, message: String },

    #[error("{} generation error(s)", .0.len())]
    Aggregate(Vec<GenerationError>),
}

impl GenerationError {
    pub fn metadata(symbol: impl Into<String>, message: impl Into<String>) -> Self {
        GenerationError::Metadata {
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Fatal errors stop the run. Everything else skips a declaration.
    pub fn is_fatal(&self) -> bool {
        match self {
            GenerationError::Configuration(_) | GenerationError::Cycle { .. } => true,
            GenerationError::Unresolved(_)
            | GenerationError::Metadata { .. }
            | GenerationError::Io { .. } => false,
            GenerationError::Aggregate(errors) => errors.iter().any(GenerationError::is_fatal),
        }
    }

    /// Diagnostic code printed next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "IB0101",
            GenerationError::Unresolved(_) => "IB0102",
            GenerationError::Metadata { .. } => "IB0103",
            GenerationError::Cycle { .. } => "IB0104",
            GenerationError::Io { .. } => "IB0105",
            GenerationError::Aggregate(_) => "IB0106",
        }
    }

    /// Flatten nested aggregates into their leaf errors.
    pub fn into_leaves(self) -> Vec<GenerationError> {
        match self {
            GenerationError::Aggregate(errors) => {
                errors.into_iter().flat_map(GenerationError::into_leaves).collect()
            }
            other => vec![other],
        }
    }
}

// ============================================================================
// Error Collection
// ============================================================================

/// Accumulates errors for a run.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<GenerationError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    ///
    /// A fatal error ends the run: the result is `Err(Aggregate(..))` holding every
    /// error recorded so far, this one included.
    pub fn add(&mut self, error: GenerationError) -> Result<(), GenerationError> {
        let fatal = error.is_fatal();
        self.errors.push(error);
        if fatal {
            return Err(GenerationError::Aggregate(std::mem::take(&mut self.errors)));
        }
        Ok(())
    }

    /// Record a result's error, if any, and pass the success value through.
    pub fn check<T>(&mut self, result: Result<T, GenerationError>) -> Result<Option<T>, GenerationError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.add(err)?;
                Ok(None)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[GenerationError] {
        &self.errors
    }

    /// The aggregate of everything collected, or `None` when the run was clean.
    pub fn finish(self) -> Option<GenerationError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(GenerationError::Aggregate(self.errors))
        }
    }

    pub fn into_errors(self) -> Vec<GenerationError> {
        self.errors
    }
}
