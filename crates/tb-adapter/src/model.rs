// SPDX-License-Identifier: MIT OR Apache-2.0
//! Framework-neutral model handle.

use crate::contract::FrameworkModel;
use crate::registry::AdapterRegistry;
use std::fmt;
use std::sync::Arc;
use tb_core::{ModelInfo, ModelInfoSource};
use tb_error::BridgeError;

/// A model reachable through a [`ModelInfoSource`], optionally pinned to a
/// specific model name.
#[derive(Clone)]
pub struct CommonModel {
    source: Arc<dyn ModelInfoSource>,
    model: Option<String>,
}

impl CommonModel {
    /// A handle over `source`.
    pub fn new(source: Arc<dyn ModelInfoSource>) -> Self {
        Self { source, model: None }
    }

    /// A handle over fixed connection info.
    #[must_use]
    pub fn from_info(info: ModelInfo) -> Self {
        Self::new(Arc::new(info))
    }

    /// Override the model name reported by the source.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// The pinned model name, if any.
    #[must_use]
    pub fn model_override(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Connection info with the override applied. Each call queries the
    /// source once.
    pub fn model_info(&self) -> Result<ModelInfo, BridgeError> {
        let mut info = self.source.model_info()?;
        if let Some(model) = &self.model {
            info.model = Some(model.clone());
        }
        Ok(info)
    }

    /// Wrap for framework `id`; a missing adapter yields `Ok(None)`.
    pub fn to_framework(&self, registry: &AdapterRegistry, id: &str) -> Result<Option<FrameworkModel>, BridgeError> {
        registry.wrap_model(id, self)
    }
}

impl fmt::Debug for CommonModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonModel").field("model", &self.model).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl ModelInfoSource for Counting {
        fn model_info(&self) -> Result<ModelInfo, BridgeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ModelInfo {
                model: Some("base".into()),
                base_url: Some("http://localhost:8000/v1".into()),
                ..ModelInfo::default()
            })
        }
    }

    #[test]
    fn override_applies() {
        let source = Arc::new(Counting(AtomicUsize::new(0)));
        let model = CommonModel::new(source.clone()).with_model("pinned");
        assert_eq!(model.model_info().unwrap().model.as_deref(), Some("pinned"));
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_framework_is_none() {
        let model = CommonModel::from_info(ModelInfo::default());
        assert!(model.to_framework(&AdapterRegistry::new(), "nope").unwrap().is_none());
    }
}
