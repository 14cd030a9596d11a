// SPDX-License-Identifier: MIT OR Apache-2.0
//! The sandbox collaborator contract.
//!
//! Everything here is implemented outside toolbridge (an HTTP client for a
//! hosted sandbox, a local container runner, a test double). Every call may
//! fail; [`crate::SandboxSession`] owns the retry policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tb_error::BridgeError;

/// How to create a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SandboxSpec {
    /// Template to instantiate.
    pub template_name: String,
    /// Idle seconds before the sandbox is reclaimed.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout() -> u64 {
    600
}

impl SandboxSpec {
    /// A spec for `template_name` with the default idle timeout.
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }

    /// Override the idle timeout.
    #[must_use]
    pub fn idle_timeout_secs(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

/// An execution context inside a code interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContextInfo {
    /// Context id.
    pub context_id: String,
    /// Language the context runs.
    pub language: String,
    /// Working directory.
    pub cwd: String,
}

/// A live code-interpreter sandbox.
///
/// Methods mirror the coarse request/response operations of the hosted
/// service; results are returned as the service's JSON.
pub trait CodeInterpreter: Send + Sync {
    /// Sandbox id.
    fn id(&self) -> &str;

    /// Health probe.
    fn health(&self) -> Result<Value, BridgeError>;

    /// Create an execution context.
    fn create_context(&self, language: &str, cwd: &str) -> Result<ContextInfo, BridgeError>;
    /// All contexts.
    fn list_contexts(&self) -> Result<Value, BridgeError>;
    /// One context.
    fn get_context(&self, context_id: &str) -> Result<ContextInfo, BridgeError>;
    /// Delete a context.
    fn delete_context(&self, context_id: &str) -> Result<Value, BridgeError>;
    /// Run code in a context. The result carries `stdout`, `stderr` and
    /// `exitCode` when the service reports them.
    fn execute(&self, context_id: &str, code: &str, timeout_secs: u64) -> Result<Value, BridgeError>;

    /// File content as text.
    fn read_file(&self, path: &str) -> Result<String, BridgeError>;
    /// Write a file, creating parents.
    fn write_file(&self, path: &str, content: &str, mode: &str, encoding: &str) -> Result<Value, BridgeError>;

    /// Directory listing.
    fn list(&self, path: &str, depth: Option<u32>) -> Result<Value, BridgeError>;
    /// File or directory metadata.
    fn stat(&self, path: &str) -> Result<Value, BridgeError>;
    /// Create a directory.
    fn mkdir(&self, path: &str, parents: bool, mode: &str) -> Result<Value, BridgeError>;
    /// Move or rename.
    fn move_path(&self, source: &str, destination: &str) -> Result<Value, BridgeError>;
    /// Delete a file or directory tree.
    fn remove(&self, path: &str) -> Result<Value, BridgeError>;

    /// Run a shell command.
    fn cmd(&self, command: &str, cwd: &str, timeout_secs: u64) -> Result<Value, BridgeError>;
    /// Running processes.
    fn process_list(&self) -> Result<Value, BridgeError>;
    /// One process.
    fn process_get(&self, pid: &str) -> Result<Value, BridgeError>;
    /// Kill a process.
    fn process_kill(&self, pid: &str) -> Result<Value, BridgeError>;

    /// Release the sandbox. Failures are only logged by callers.
    fn stop(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// Creates sandboxes.
pub trait SandboxProvider: Send + Sync {
    /// Start a sandbox for `spec`.
    fn create(&self, spec: &SandboxSpec) -> Result<Arc<dyn CodeInterpreter>, BridgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_defaults() {
        let spec: SandboxSpec = serde_json::from_str(r#"{"template_name": "py"}"#).unwrap();
        assert_eq!(spec, SandboxSpec::new("py"));
        assert_eq!(SandboxSpec::new("py").idle_timeout_secs(5).idle_timeout_secs, 5);
    }
}
