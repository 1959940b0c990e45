//! Typed errors for schema compilation.

use std::fmt;

/// One recorded problem from a single compilation attempt.
///
/// Every variant but [`SchemaError::FetchFailure`] is accumulated in a buffer rather
/// than raised immediately, so a single `compile()` call can report every problem it
/// finds instead of stopping at the first one.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Pattern must start with '^' and end with '$': {pattern}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsupported ref: {reference}")]
    UnsupportedRef { reference: String },

    #[error("Error resolving ref {reference}: {token} not in {dump}")]
    UnresolvedRef {
        reference: String,
        token: String,
        dump: String,
    },

    #[error("Unknown primitive: {name}")]
    UnknownPrimitive { name: String },

    #[error("Unrecognized schema: {dump}")]
    UnrecognizedSchema { dump: String },

    #[error("fetch failed for {uri}: {source}")]
    FetchFailure {
        uri: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The failure channel a compilation raises.
///
/// `Errors` carries the full accumulated buffer (§7's "one invocation reports as many
/// problems as possible"); `Fetch` carries a single immediate fetch failure, which
/// propagates rather than accumulating.
#[derive(Debug)]
pub enum CompileError {
    Errors(Vec<SchemaError>),
    Fetch(SchemaError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Errors(errors) => {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join("\n"))
            }
            Self::Fetch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Errors(errors) => errors.first().map(|e| e as &(dyn std::error::Error + 'static)),
            Self::Fetch(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_joins_with_newline() {
        let err = CompileError::Errors(vec![
            SchemaError::UnsupportedRef {
                reference: "ftp://x".into(),
            },
            SchemaError::UnknownPrimitive { name: "widget".into() },
        ]);
        let rendered = err.to_string();
        assert_eq!(
            rendered,
            "Unsupported ref: ftp://x\nUnknown primitive: widget"
        );
    }

    #[test]
    fn fetch_failure_displays_uri_and_source() {
        let io_err: Box<dyn std::error::Error + Send + Sync> =
            Box::new(std::io::Error::other("boom"));
        let err = CompileError::Fetch(SchemaError::FetchFailure {
            uri: "https://example.com/s.json".into(),
            source: io_err,
        });
        assert!(err.to_string().contains("https://example.com/s.json"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn invalid_pattern_message() {
        let err = SchemaError::InvalidPattern {
            pattern: "[0-9]+".into(),
            reason: "not anchored".into(),
        };
        assert!(err.to_string().contains("[0-9]+"));
    }
}
