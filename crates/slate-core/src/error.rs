/// Core error types for the Slate engine.
use crate::types::MobjectId;

/// A specialized Result type for Slate operations.
pub type SlateResult<T> = Result<T, SlateError>;

/// Top-level error type encompassing all Slate subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SlateError {
    #[error("dangling reference: mobject {id} does not exist")]
    DanglingReference { id: MobjectId },

    #[error("layout cycle among mobjects [{}]", format_ids(.ids))]
    LayoutCycle { ids: Vec<MobjectId> },

    #[error("incompatible transform from {source_id} to {target_id}: {reason}")]
    IncompatibleTransform {
        source_id: MobjectId,
        target_id: MobjectId,
        reason: String,
    },

    #[error("scene is closed: no further animations may be scheduled")]
    SceneClosed,

    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("compile error: {0}")]
    Compile(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("timeline entry {index}: {source}")]
    AtEntry {
        index: usize,
        #[source]
        source: Box<SlateError>,
    },
}

fn format_ids(ids: &[MobjectId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SlateError {
    /// Attach the index of the timeline entry that produced this error.
    /// Errors that already carry an entry index are returned unchanged.
    pub fn at_entry(self, index: usize) -> Self {
        match self {
            err @ SlateError::AtEntry { .. } => err,
            other => SlateError::AtEntry {
                index,
                source: Box::new(other),
            },
        }
    }

    /// The timeline entry this error was raised at, if known.
    pub fn entry_index(&self) -> Option<usize> {
        match self {
            SlateError::AtEntry { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The underlying error with any entry context stripped.
    pub fn root(&self) -> &SlateError {
        match self {
            SlateError::AtEntry { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SlateError::InvalidArgument(message.into())
    }

    pub fn incompatible(
        source_id: MobjectId,
        target_id: MobjectId,
        reason: impl Into<String>,
    ) -> Self {
        SlateError::IncompatibleTransform {
            source_id,
            target_id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_cycle_display() {
        let err = SlateError::LayoutCycle {
            ids: vec![MobjectId(1), MobjectId(2)],
        };
        assert_eq!(err.to_string(), "layout cycle among mobjects [#1, #2]");
    }

    #[test]
    fn test_at_entry_wraps_once() {
        let err = SlateError::DanglingReference { id: MobjectId(7) }
            .at_entry(3)
            .at_entry(9);
        assert_eq!(err.entry_index(), Some(3));
        assert!(matches!(
            err.root(),
            SlateError::DanglingReference { id } if *id == MobjectId(7)
        ));
        assert!(err.to_string().starts_with("timeline entry 3:"));
    }

    #[test]
    fn test_root_of_plain_error_is_itself() {
        let err = SlateError::SceneClosed;
        assert!(err.entry_index().is_none());
        assert!(matches!(err.root(), SlateError::SceneClosed));
    }
}
