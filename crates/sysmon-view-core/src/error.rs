//! Error types for sysmon-view-core.

use thiserror::Error;

/// Data-shape errors raised while building or addressing the node tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A node carries neither a usable `id` nor a `name`.
    #[error("node #{position} under {parent:?} has neither id nor name")]
    MissingIdentifier {
        /// FQN of the parent (empty at the root level)
        parent: String,
        /// Position among its siblings
        position: usize,
    },

    /// Two nodes resolved to the same fully-qualified name.
    #[error("duplicate fqn {0:?}")]
    DuplicateFqn(String),

    /// Lookup of an FQN that is not part of the current forest.
    #[error("unknown fqn {0:?}")]
    UnknownFqn(String),
}

/// A response payload that does not have the expected shape.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// JSON did not decode into the expected structure.
    #[error("malformed {what} payload: {source}")]
    Decode {
        /// Which payload was being decoded
        what: &'static str,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },

    /// A required top-level field is absent.
    #[error("{what} payload is missing field `{field}`")]
    MissingField {
        /// Which payload was being decoded
        what: &'static str,
        /// Name of the absent field
        field: &'static str,
    },
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The refresh interval must be positive.
    #[error("auto-refresh interval must be positive, got {0}s")]
    InvalidInterval(u32),

    /// Slide animation duration out of range.
    #[error("slide duration {0}ms exceeds {max}ms", max = crate::config::MAX_SLIDE_MS)]
    InvalidSlide(u32),

    /// TOML could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Any error surfaced to the view layer.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Tree data was malformed.
    #[error("malformed tree data: {0}")]
    Tree(#[from] TreeError),

    /// A payload could not be decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_error_missing_identifier() {
        let err = TreeError::MissingIdentifier {
            parent: "\nhw".to_string(),
            position: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("neither id nor name"));
    }

    #[test]
    fn test_tree_error_duplicate() {
        let err = TreeError::DuplicateFqn("\nenvvar\nPATH".to_string());
        assert!(err.to_string().starts_with("duplicate fqn"));
    }

    #[test]
    fn test_view_error_wraps_tree_error() {
        let err: ViewError = TreeError::UnknownFqn("x".to_string()).into();
        assert!(matches!(err, ViewError::Tree(_)));
        assert!(err.to_string().starts_with("malformed tree data"));
    }

    #[test]
    fn test_config_error_interval() {
        let err = ConfigError::InvalidInterval(0);
        assert_eq!(
            err.to_string(),
            "auto-refresh interval must be positive, got 0s"
        );
    }

    #[test]
    fn test_payload_error_missing_field() {
        let err = PayloadError::MissingField {
            what: "tree",
            field: "envTree",
        };
        assert_eq!(err.to_string(), "tree payload is missing field `envTree`");
    }

    #[test]
    fn test_payload_error_decode() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = PayloadError::Decode {
            what: "graph",
            source,
        };
        assert!(err.to_string().starts_with("malformed graph payload"));
    }
}
