/// Closed set of failure kinds surfaced by generation requests.
///
/// Each variant carries the human-readable message that ends up in the
/// HTTP response body. The HTTP layer maps kinds to status codes by a
/// single lookup; nothing downstream inspects the message text.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A downstream service refused the connection.
    #[error("{0}")]
    Unreachable(String),

    /// A required local resource (e.g. a workflow template) is missing.
    #[error("{0}")]
    NotFound(String),

    /// A workflow template exists but is not a usable node graph.
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// A downstream service answered, but not with what we needed.
    #[error("{0}")]
    UpstreamFailure(String),

    /// Generation finished without producing any artifact.
    #[error("{0}")]
    EmptyResult(String),
}

impl CoreError {
    /// Prefix the message with `context`, keeping the error kind.
    ///
    /// `Unreachable` messages are fixed per service and pass through
    /// untouched.
    pub fn context(self, context: &str) -> Self {
        match self {
            CoreError::Unreachable(msg) => CoreError::Unreachable(msg),
            CoreError::NotFound(msg) => CoreError::NotFound(format!("{context}: {msg}")),
            CoreError::InvalidWorkflow(msg) => {
                CoreError::InvalidWorkflow(format!("{context}: {msg}"))
            }
            CoreError::UpstreamFailure(msg) => {
                CoreError::UpstreamFailure(format!("{context}: {msg}"))
            }
            CoreError::EmptyResult(msg) => CoreError::EmptyResult(format!("{context}: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn context_prefixes_message_and_keeps_kind() {
        let err = CoreError::NotFound("Workflow file x.json not found.".into())
            .context("Image generation failed");
        assert_matches!(err, CoreError::NotFound(ref msg) if msg == "Image generation failed: Workflow file x.json not found.");
    }

    #[test]
    fn context_leaves_unreachable_untouched() {
        let err = CoreError::Unreachable("ComfyUI service is not reachable.".into())
            .context("Video generation failed");
        assert_eq!(err.to_string(), "ComfyUI service is not reachable.");
    }
}
