// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lazily created sandbox with a single reset-and-retry on failure.

use crate::provider::{CodeInterpreter, SandboxProvider, SandboxSpec};
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tb_error::{BridgeError, ErrorCode};
use tracing::{debug, warn};

/// One sandbox shared by every tool of a tool set.
///
/// The sandbox is created on first use. When an operation fails the session
/// drops the sandbox, creates a fresh one and retries once; a second failure
/// is reported as `{"error": <first failure>}` rather than raised.
pub struct SandboxSession {
    provider: Arc<dyn SandboxProvider>,
    spec: SandboxSpec,
    current: Mutex<Option<Arc<dyn CodeInterpreter>>>,
}

impl SandboxSession {
    /// A session that will create sandboxes from `spec` on demand.
    pub fn new(provider: Arc<dyn SandboxProvider>, spec: SandboxSpec) -> Self {
        Self {
            provider,
            spec,
            current: Mutex::new(None),
        }
    }

    /// Spec sandboxes are created from.
    #[must_use]
    pub fn spec(&self) -> &SandboxSpec {
        &self.spec
    }

    /// Whether a sandbox is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// The current sandbox, creating one if none is held.
    ///
    /// Creation happens under the lock so concurrent first calls share one
    /// sandbox.
    pub fn ensure(&self) -> Result<Arc<dyn CodeInterpreter>, BridgeError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sandbox) = current.as_ref() {
            return Ok(Arc::clone(sandbox));
        }
        let sandbox = self.provider.create(&self.spec).map_err(|e| {
            BridgeError::new(ErrorCode::SandboxUnavailable, format!("sandbox creation failed: {}", e.message))
                .with_context("template_name", &self.spec.template_name)
        })?;
        debug!(target: "tb.sandbox", sandbox = sandbox.id(), template = %self.spec.template_name, "sandbox created");
        *current = Some(Arc::clone(&sandbox));
        Ok(sandbox)
    }

    /// Forget the current sandbox without stopping it.
    pub fn reset(&self) {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Stop and forget the current sandbox. Stop failures are logged.
    pub fn close(&self) {
        let taken = self.current.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(sandbox) = taken
            && let Err(e) = sandbox.stop()
        {
            warn!(target: "tb.sandbox", sandbox = sandbox.id(), error = %e, "sandbox stop failed");
        }
    }

    /// Run `op` against the sandbox, retrying once on a fresh sandbox.
    ///
    /// Never fails: when both attempts fail the first error message is
    /// returned as `{"error": ...}`.
    pub fn run<F>(&self, operation: &str, f: F) -> Value
    where
        F: Fn(&dyn CodeInterpreter) -> Result<Value, BridgeError>,
    {
        match self.ensure().and_then(|sandbox| f(sandbox.as_ref())) {
            Ok(value) => value,
            Err(first) => {
                warn!(target: "tb.sandbox", operation, error = %first, "sandbox operation failed, recreating sandbox");
                self.reset();
                match self.ensure().and_then(|sandbox| f(sandbox.as_ref())) {
                    Ok(value) => value,
                    Err(second) => {
                        warn!(target: "tb.sandbox", operation, error = %second, "retry failed");
                        json!({"error": first.message})
                    }
                }
            }
        }
    }
}

impl fmt::Debug for SandboxSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SandboxSession")
            .field("spec", &self.spec)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for SandboxSession {
    fn drop(&mut self) {
        self.close();
    }
}
