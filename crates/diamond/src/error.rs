//! Router errors

use regulus_core::{InitError, Selector};
use thiserror::Error;

use crate::facet::FacetAction;

/// Error raised by a facet handler, propagated unchanged by the router
pub type FacetError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from the facet router
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Selector not registered: {0}")]
    SelectorNotRegistered(Selector),

    #[error("Selector already registered: {0}")]
    SelectorAlreadyRegistered(Selector),

    #[error("Facet required for {0} cut")]
    MissingFacet(FacetAction),

    #[error("Facet cut has no selectors")]
    EmptySelectors,

    #[error("Facet initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("Facet call failed: {0}")]
    Facet(#[source] FacetError),
}

/// Result type for router operations
pub type RouterResult<T> = Result<T, RouterError>;

impl RouterError {
    /// Wrap a facet error, lifting initialization failures into [`RouterError::Init`]
    pub fn from_facet(error: FacetError) -> Self {
        match error.downcast::<InitError>() {
            Ok(init) => RouterError::Init(*init),
            Err(other) => RouterError::Facet(other),
        }
    }

    /// Borrow the facet's own error if it is a `T`
    pub fn facet_error<T: std::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            RouterError::Facet(source) => source.downcast_ref::<T>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_facet_lifts_init_error() {
        let err = RouterError::from_facet(Box::new(InitError::AlreadyInitialized));
        assert!(matches!(
            err,
            RouterError::Init(InitError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_from_facet_keeps_other_errors() {
        let err = RouterError::from_facet("boom".into());
        assert!(matches!(err, RouterError::Facet(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_facet_error_downcast() {
        let err = RouterError::Facet(Box::new(InitError::NotInitializing));
        assert_eq!(
            err.facet_error::<InitError>(),
            Some(&InitError::NotInitializing)
        );
        assert!(RouterError::EmptySelectors.facet_error::<InitError>().is_none());
    }
}
