pub type Result<T> = std::result::Result<T, ClientError>;

// JSON parse errors mean the server sent us something we can't interpret, which
// is a protocol problem rather than a transport problem.
impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> ClientError {
        ClientError::Protocol(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

/// Express whether the error seems to be happening in the server or the data.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorLayer {
    /// The request itself has structural issues like a malformed URL.  Nothing
    /// was sent over the wire.
    BadInput,
    /// The error seems to involve the server or the channel to it; a 5xx
    /// status or a refused connection.
    ServerLayer,
    /// The server answered but the answer was unusable: a 4xx status or a
    /// payload that doesn't match the declared response kind.
    DataLayer,
}

/// Details about what went wrong for investigation purposes.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorDetails {
    /// Attempt to distinguish failures due to server trouble from failures due
    /// to the data that was requested or returned.
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.layer, self.message)
    }
}

/// Everything that can stop a response from being fully processed.
///
/// Server-declared `Error` responses are deliberately absent; those are an
/// expected, user-facing channel and get turned into a notice instead.
///
/// Nothing is retried automatically.  `is_transient` only exists so callers
/// that want to build retries can tell whether one might succeed.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request failed at the channel level.  No response was usable, so
    /// the pending request chain halts.
    #[error("transport error ({0})")]
    Transport(ErrorDetails),
    /// A response arrived but its handler kind is unknown or its payload does
    /// not have the shape its kind requires.  This indicates client/server
    /// version skew.
    #[error("protocol error ({0})")]
    Protocol(ErrorDetails),
    /// A sample referenced a class id that was never registered.
    #[error("lookup error: no class registered with id {0}")]
    Lookup(u64),
}

impl ClientError {
    pub fn protocol(message: String) -> ClientError {
        ClientError::Protocol(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message,
        })
    }

    /// Whether the failure happened before any response could be used, which
    /// is what halts a request chain.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(ErrorDetails {
                layer: ErrorLayer::ServerLayer,
                ..
            })
        )
    }
}

#[test]
fn test_error_classification() {
    let lookup = ClientError::Lookup(7);
    assert!(!lookup.is_fatal());
    assert_eq!(
        lookup.to_string(),
        "lookup error: no class registered with id 7"
    );

    let transient = ClientError::Transport(ErrorDetails {
        layer: ErrorLayer::ServerLayer,
        message: "Server status of 503 Service Unavailable".to_string(),
    });
    assert!(transient.is_fatal());
    assert!(transient.is_transient());

    let sticky = ClientError::Transport(ErrorDetails {
        layer: ErrorLayer::DataLayer,
        message: "Server status of 404 Not Found".to_string(),
    });
    assert!(!sticky.is_transient());

    let from_json: ClientError = serde_json::from_str::<u64>("nope").unwrap_err().into();
    assert!(matches!(from_json, ClientError::Protocol(_)));
}
