use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Flattened source chain of an error, rendered on a single line
///
/// Log lines of fatal failures should name the root cause (e.g. a refused connection)
/// and not only the outermost context. Nested chains are integrated into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorChain {
    causes: Vec<String>,
}

impl ErrorChain {
    /// Walks the source chain of the given error
    pub fn of(error: &(dyn Error + 'static)) -> Self {
        let mut source = Some(error);
        let mut causes = Vec::new();

        while let Some(error) = source {
            match error.downcast_ref::<ErrorChain>() {
                Some(chain) => causes.extend(chain.causes.iter().cloned()),
                None => causes.push(error.to_string()),
            }

            source = error.source();
        }

        Self { causes }
    }

    /// Innermost cause of the chain
    pub fn root_cause(&self) -> Option<&str> {
        self.causes.last().map(String::as_str)
    }
}

impl Error for ErrorChain {}

impl Display for ErrorChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.causes.is_empty() {
            return write!(f, "unknown error");
        }

        write!(f, "{}", self.causes.join(": "))
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct Refused;

    #[derive(Debug, Error)]
    enum OuterError {
        #[error("failed to claim entries")]
        Claim(#[source] Refused),
        #[error("consumer stopped")]
        Chained(#[source] ErrorChain),
    }

    #[test]
    fn render_every_cause_in_order() {
        let chain = ErrorChain::of(&OuterError::Claim(Refused));

        assert_eq!(chain.to_string(), "failed to claim entries: connection refused");
        assert_eq!(chain.root_cause(), Some("connection refused"));
    }

    #[test]
    fn integrate_nested_chains() {
        let inner = ErrorChain::of(&OuterError::Claim(Refused));
        let chain = ErrorChain::of(&OuterError::Chained(inner));

        assert_eq!(
            chain.to_string(),
            "consumer stopped: failed to claim entries: connection refused"
        );
    }

    #[test]
    fn handle_empty_chain() {
        let chain = ErrorChain { causes: Vec::new() };

        assert_eq!(chain.to_string(), "unknown error");
        assert_eq!(chain.root_cause(), None);
    }
}
