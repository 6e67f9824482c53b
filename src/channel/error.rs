//! Error types for the channel helpers.

use std::error::Error;
use std::fmt;

use crate::context::ContextError;

// =============================================================================
// ChannelError
// =============================================================================

/// Failure of a channel draining helper.
///
/// Every variant names the operation that failed, so the message alone
/// identifies where an error came from:
///
/// | Variant     | Message                                     |
/// |-------------|---------------------------------------------|
/// | `Cancelled` | `<operation> failed: <cause>`               |
/// | `Producer`  | `<operation> failed: <producer error>`      |
/// | `Consumer`  | `<operation> failed: map failed: <error>`   |
///
/// The original cause is kept as data, not only as text: match on the
/// variant or use [`ChannelError::cancellation`] to tell a cancelled call
/// apart from a failed one.
///
/// # Examples
///
/// ```rust
/// use collection::channel::ChannelError;
/// use collection::context::ContextError;
///
/// let error: ChannelError<String> = ChannelError::Cancelled {
///     operation: "count channel",
///     cause: ContextError::Canceled,
/// };
/// assert_eq!(error.to_string(), "count channel failed: context canceled");
/// assert_eq!(error.cancellation(), Some(ContextError::Canceled));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError<E> {
    /// The context was cancelled before the drain completed.
    Cancelled {
        /// The operation that was interrupted.
        operation: &'static str,
        /// The cancellation cause, unchanged.
        cause: ContextError,
    },
    /// The producer returned an error.
    Producer {
        /// The operation whose producer failed.
        operation: &'static str,
        /// The error returned by the producer.
        source: E,
    },
    /// The per-item consumer function returned an error.
    Consumer {
        /// The operation whose consumer failed.
        operation: &'static str,
        /// The error returned by the consumer function.
        source: E,
    },
}

impl<E> ChannelError<E> {
    /// Returns the name of the failed operation.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Cancelled { operation, .. }
            | Self::Producer { operation, .. }
            | Self::Consumer { operation, .. } => *operation,
        }
    }

    /// Returns the cancellation cause if the drain was cancelled.
    #[must_use]
    pub const fn cancellation(&self) -> Option<ContextError> {
        match self {
            Self::Cancelled { cause, .. } => Some(*cause),
            Self::Producer { .. } | Self::Consumer { .. } => None,
        }
    }

    /// Returns `true` if the drain was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancellation().is_some()
    }

    /// Consumes the error, returning the producer or consumer error if any.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Cancelled { .. } => None,
            Self::Producer { source, .. } | Self::Consumer { source, .. } => Some(source),
        }
    }
}

impl<E: fmt::Display> fmt::Display for ChannelError<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled { operation, cause } => {
                write!(formatter, "{operation} failed: {cause}")
            }
            Self::Producer { operation, source } => {
                write!(formatter, "{operation} failed: {source}")
            }
            Self::Consumer { operation, source } => {
                write!(formatter, "{operation} failed: map failed: {source}")
            }
        }
    }
}

impl<E: Error + 'static> Error for ChannelError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cancelled { cause, .. } => Some(cause),
            Self::Producer { source, .. } | Self::Consumer { source, .. } => Some(source),
        }
    }
}

// =============================================================================
// StreamError
// =============================================================================

/// Failure of [`stream_list`](super::stream_list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The context was cancelled; the cause is reported unwrapped.
    Cancelled(ContextError),
    /// The receiving half of the channel was dropped.
    Closed,
}

impl fmt::Display for StreamError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled(cause) => write!(formatter, "{cause}"),
            Self::Closed => write!(formatter, "channel closed"),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Cancelled(cause) => Some(cause),
            Self::Closed => None,
        }
    }
}

impl From<ContextError> for StreamError {
    fn from(cause: ContextError) -> Self {
        Self::Cancelled(cause)
    }
}

// =============================================================================
// CapacityError
// =============================================================================

/// Returned when a channel capacity of zero is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError;

impl fmt::Display for CapacityError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "channel capacity must be greater than 0")
    }
}

impl Error for CapacityError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Failure(&'static str);

    impl fmt::Display for Failure {
        fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str(self.0)
        }
    }

    impl Error for Failure {}

    #[rstest]
    #[case(
        ChannelError::Producer { operation: "count channel", source: Failure("producer error") },
        "count channel failed: producer error"
    )]
    #[case(
        ChannelError::Consumer { operation: "map channel", source: Failure("boom") },
        "map channel failed: map failed: boom"
    )]
    #[case(
        ChannelError::Cancelled {
            operation: "convert channel to list",
            cause: ContextError::DeadlineExceeded,
        },
        "convert channel to list failed: context deadline exceeded"
    )]
    fn test_channel_error_display(#[case] error: ChannelError<Failure>, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn test_source_chain_keeps_original_error() {
        let error = ChannelError::Producer {
            operation: "count channel",
            source: Failure("producer error"),
        };
        let source = error.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("producer error"));
        assert!(!error.is_cancelled());
        assert_eq!(error.into_source(), Some(Failure("producer error")));
    }

    #[rstest]
    fn test_stream_error_display() {
        assert_eq!(
            StreamError::Cancelled(ContextError::Canceled).to_string(),
            "context canceled"
        );
        assert_eq!(StreamError::Closed.to_string(), "channel closed");
    }

    #[rstest]
    fn test_capacity_error_display() {
        assert_eq!(
            CapacityError.to_string(),
            "channel capacity must be greater than 0"
        );
    }
}
