//! Error types for throttled execution
use std::fmt;

/// Unified error type for work routed through a limiter.
///
/// All failures are local to one submission; the limiter itself never fails
/// an unrelated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleError<E> {
    /// The submitted operation itself failed
    Inner(E),
    /// The completion channel closed before a result was delivered
    Disconnected,
}

impl<E: fmt::Display> fmt::Display for ThrottleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner(e) => write!(f, "{}", e),
            Self::Disconnected => {
                write!(f, "limiter dropped the request before a result was delivered")
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ThrottleError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Disconnected => None,
        }
    }
}

impl<E> ThrottleError<E> {
    /// Check if this error wraps the operation's own failure.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Check if the completion channel was closed before delivery.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Get the inner error if this is an Inner variant
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Disconnected => None,
        }
    }

    /// Borrow the inner error if present.
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Disconnected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn inner_display_passes_through() {
        let err: ThrottleError<io::Error> =
            ThrottleError::Inner(io::Error::new(io::ErrorKind::Other, "upstream 503"));
        assert_eq!(format!("{}", err), "upstream 503");
    }

    #[test]
    fn disconnected_display() {
        let err: ThrottleError<io::Error> = ThrottleError::Disconnected;
        assert!(format!("{}", err).contains("dropped"));
    }

    #[test]
    fn source_points_at_the_inner_error() {
        let err: ThrottleError<io::Error> =
            ThrottleError::Inner(io::Error::new(io::ErrorKind::Other, "x"));
        assert!(err.source().is_some());
        let err: ThrottleError<io::Error> = ThrottleError::Disconnected;
        assert!(err.source().is_none());
    }

    #[test]
    fn predicates_and_accessors() {
        let inner: ThrottleError<&str> = ThrottleError::Inner("boom");
        assert!(inner.is_inner());
        assert!(!inner.is_disconnected());
        assert_eq!(inner.as_inner(), Some(&"boom"));
        assert_eq!(inner.into_inner(), Some("boom"));

        let disconnected: ThrottleError<&str> = ThrottleError::Disconnected;
        assert!(disconnected.is_disconnected());
        assert_eq!(disconnected.into_inner(), None);
    }
}
