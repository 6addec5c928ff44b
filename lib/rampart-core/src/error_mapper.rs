//! Status-code to caller-error mapping.
//!
//! An [`ErrorMapper`] is the shared, read-mostly table consulted when an
//! execution fails terminally. A [`RequestSpec`](crate::RequestSpec) may carry
//! its own [`StatusMappings`] that take precedence for that one call.
//!
//! Resolution order:
//! 1. the spec-local mapping for the status code,
//! 2. the shared mapping for the status code,
//! 3. the shared default factory.
//!
//! Only failures of kind [`FailureKind::Status`](crate::FailureKind::Status)
//! are looked up by code; everything else goes straight to the default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{ClientError, FailureDescription};

/// Factory turning a failure description into a caller error.
pub type ErrorFactory<E> = Arc<dyn Fn(&FailureDescription) -> E + Send + Sync>;

/// Status-code keyed factories.
pub type StatusMappings<E> = HashMap<u16, ErrorFactory<E>>;

/// Shared table from HTTP status code to error factory, with a default.
///
/// # Example
///
/// ```
/// use rampart_core::{ClientError, Error, ErrorMapper, FailureDescription};
///
/// #[derive(Debug)]
/// enum ApiError {
///     NotFound,
///     Other(ClientError),
/// }
///
/// impl From<ClientError> for ApiError {
///     fn from(err: ClientError) -> Self {
///         Self::Other(err)
///     }
/// }
///
/// let mapper = ErrorMapper::<ApiError>::new().map(404, |_| ApiError::NotFound);
///
/// let not_found = FailureDescription::from(Error::http(404, "gone"));
/// assert!(matches!(mapper.resolve(&not_found), ApiError::NotFound));
///
/// let unavailable = FailureDescription::from(Error::http(503, "busy"));
/// assert!(matches!(mapper.resolve(&unavailable), ApiError::Other(_)));
/// ```
pub struct ErrorMapper<E = ClientError> {
    mappings: StatusMappings<E>,
    default: ErrorFactory<E>,
}

impl<E> ErrorMapper<E>
where
    E: From<ClientError> + 'static,
{
    /// Create an empty mapper whose default produces a [`ClientError`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_default(|failure| E::from(ClientError::from(failure)))
    }
}

impl<E> Default for ErrorMapper<E>
where
    E: From<ClientError> + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorMapper<E> {
    /// Create an empty mapper with a custom default factory.
    #[must_use]
    pub fn with_default<F>(default: F) -> Self
    where
        F: Fn(&FailureDescription) -> E + Send + Sync + 'static,
    {
        Self {
            mappings: HashMap::new(),
            default: Arc::new(default),
        }
    }

    /// Register a factory for a status code, replacing any previous one.
    #[must_use]
    pub fn map<F>(mut self, status: u16, factory: F) -> Self
    where
        F: Fn(&FailureDescription) -> E + Send + Sync + 'static,
    {
        self.mappings.insert(status, Arc::new(factory));
        self
    }

    /// Returns `true` if a factory is registered for the status code.
    #[must_use]
    pub fn is_mapped(&self, status: u16) -> bool {
        self.mappings.contains_key(&status)
    }

    /// Resolve a failure using the shared table only.
    #[must_use]
    pub fn resolve(&self, failure: &FailureDescription) -> E {
        self.factory_for(None, failure)(failure)
    }

    /// Resolve a failure, consulting spec-local overrides first.
    #[must_use]
    pub fn resolve_with(&self, overrides: &StatusMappings<E>, failure: &FailureDescription) -> E {
        self.factory_for(Some(overrides), failure)(failure)
    }

    fn factory_for<'a>(
        &'a self,
        overrides: Option<&'a StatusMappings<E>>,
        failure: &FailureDescription,
    ) -> &'a ErrorFactory<E> {
        let Some(status) = failure.lookup_status() else {
            return &self.default;
        };

        overrides
            .and_then(|local| local.get(&status))
            .or_else(|| self.mappings.get(&status))
            .unwrap_or(&self.default)
    }
}

impl<E> fmt::Debug for ErrorMapper<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<_> = self.mappings.keys().copied().collect();
        statuses.sort_unstable();
        f.debug_struct("ErrorMapper")
            .field("statuses", &statuses)
            .finish_non_exhaustive()
    }
}
