//! Lookup of interceptors by identifier.

use std::sync::Arc;

use thiserror::Error;

use crate::api::Interceptor;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate interceptor id: {0}")]
    DuplicateId(String),
}

pub trait InterceptorRegistry: Send + Sync {
    fn get(&self, interceptor_id: &str) -> Option<Arc<dyn Interceptor>>;

    /// All registered interceptors in registration order.
    fn list(&self) -> Vec<Arc<dyn Interceptor>>;

    /// Interceptors the user may currently choose.
    fn selectable(&self) -> Vec<Arc<dyn Interceptor>> {
        self.list()
            .into_iter()
            .filter(|i| i.selectable().is_selectable())
            .collect()
    }
}

/// Registry fixed at construction time.
#[derive(Clone, Default)]
pub struct StaticInterceptorRegistry {
    entries: Vec<Arc<dyn Interceptor>>,
}

impl StaticInterceptorRegistry {
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] if two interceptors share an id.
    pub fn new(
        interceptors: impl IntoIterator<Item = Arc<dyn Interceptor>>,
    ) -> Result<Self, RegistryError> {
        let mut entries: Vec<Arc<dyn Interceptor>> = Vec::new();
        for interceptor in interceptors {
            let id = interceptor.interceptor_id();
            if entries.iter().any(|e| e.interceptor_id() == id) {
                return Err(RegistryError::DuplicateId(id.to_owned()));
            }
            entries.push(interceptor);
        }
        Ok(Self { entries })
    }
}

impl std::fmt::Debug for StaticInterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.interceptor_id()))
            .finish()
    }
}

impl InterceptorRegistry for StaticInterceptorRegistry {
    fn get(&self, interceptor_id: &str) -> Option<Arc<dyn Interceptor>> {
        self.entries
            .iter()
            .find(|e| e.interceptor_id() == interceptor_id)
            .cloned()
    }

    fn list(&self) -> Vec<Arc<dyn Interceptor>> {
        self.entries.clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::api::{PendingResponse, RequestRun, Selectable};
    use crate::cancel::CancelToken;
    use crate::error::InterceptorFailure;
    use crate::i18n::Translator;
    use crate::models::InterceptorRequest;

    struct Fixed {
        id: &'static str,
        selectable: bool,
    }

    impl Interceptor for Fixed {
        fn interceptor_id(&self) -> &str {
            self.id
        }

        fn name(&self, translator: &dyn Translator) -> String {
            translator.translate(self.id)
        }

        fn selectable(&self) -> Selectable {
            if self.selectable {
                Selectable::Selectable
            } else {
                Selectable::Unselectable {
                    reason_key: "interceptor.unavailable".to_owned(),
                }
            }
        }

        fn run_request(&self, _request: &InterceptorRequest) -> RequestRun {
            RequestRun {
                cancel: CancelToken::new().handle(),
                response: PendingResponse::spawn(std::future::ready(Err(
                    InterceptorFailure::Cancellation,
                ))),
            }
        }
    }

    fn fixed(id: &'static str, selectable: bool) -> Arc<dyn Interceptor> {
        Arc::new(Fixed { id, selectable })
    }

    #[test]
    fn test_lookup_and_order() {
        let registry =
            StaticInterceptorRegistry::new([fixed("native", true), fixed("proxy", false)]).unwrap();

        assert_eq!(registry.get("proxy").unwrap().interceptor_id(), "proxy");
        assert!(registry.get("extension").is_none());

        let ids: Vec<_> = registry
            .list()
            .iter()
            .map(|i| i.interceptor_id().to_owned())
            .collect();
        assert_eq!(ids, vec!["native", "proxy"]);
    }

    #[test]
    fn test_selectable_filters() {
        let registry =
            StaticInterceptorRegistry::new([fixed("native", true), fixed("proxy", false)]).unwrap();

        let selectable = registry.selectable();
        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].interceptor_id(), "native");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = StaticInterceptorRegistry::new([fixed("native", true), fixed("native", false)])
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateId("native".to_owned()));
    }

    #[test]
    fn test_name_goes_through_translator() {
        let interceptor = fixed("native", true);
        let translator = |key: &str| key.to_uppercase();
        assert_eq!(interceptor.name(&translator), "NATIVE");
    }
}
