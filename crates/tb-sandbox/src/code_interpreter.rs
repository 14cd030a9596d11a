// SPDX-License-Identifier: MIT OR Apache-2.0
//! Code-interpreter operations exposed as tools.
//!
//! Every tool runs through one [`SandboxSession`], so all of them see the
//! same sandbox and share its retry policy. Tool functions never fail on
//! sandbox errors; they answer `{"error": ...}` instead.

use crate::provider::{CodeInterpreter, SandboxProvider, SandboxSpec};
use crate::session::SandboxSession;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tb_adapter::CommonToolSet;
use tb_core::{Tool, ToolError};
use tb_error::BridgeError;
use tracing::debug;

/// Working directory for new contexts and commands.
pub const DEFAULT_CWD: &str = "/home/user";

// ── Arguments ──────────────────────────────────────────────────────────

fn default_language() -> String {
    "python".into()
}
fn default_cwd() -> String {
    DEFAULT_CWD.into()
}
fn root() -> String {
    "/".into()
}
fn code_timeout() -> u64 {
    60
}
fn cmd_timeout() -> u64 {
    30
}
fn file_mode() -> String {
    "644".into()
}
fn dir_mode() -> String {
    "0755".into()
}
fn utf8() -> String {
    "utf-8".into()
}
fn yes() -> bool {
    true
}

#[derive(Deserialize, JsonSchema)]
struct NoArgs {}

#[derive(Deserialize, JsonSchema)]
struct RunCodeArgs {
    /// Source code to run.
    code: String,
    /// Language of the code.
    #[serde(default = "default_language")]
    language: String,
    /// Timeout in seconds.
    #[serde(default = "code_timeout")]
    timeout: u64,
    /// Existing context to run in; a temporary one is used when absent.
    #[serde(default)]
    context_id: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct ExecuteCodeArgs {
    /// Source code to run.
    code: String,
    /// Language of the code.
    #[serde(default = "default_language")]
    language: String,
    /// Timeout in seconds.
    #[serde(default = "code_timeout")]
    timeout: u64,
}

#[derive(Deserialize, JsonSchema)]
struct CreateContextArgs {
    /// Language of the context.
    #[serde(default = "default_language")]
    language: String,
    /// Working directory.
    #[serde(default = "default_cwd")]
    cwd: String,
}

#[derive(Deserialize, JsonSchema)]
struct ContextArgs {
    /// Context id.
    context_id: String,
}

#[derive(Deserialize, JsonSchema)]
struct PathArgs {
    /// Absolute path.
    path: String,
}

#[derive(Deserialize, JsonSchema)]
struct WriteFileArgs {
    /// Absolute path.
    path: String,
    /// Text to write.
    content: String,
    /// Permission bits.
    #[serde(default = "file_mode")]
    mode: String,
    /// Text encoding.
    #[serde(default = "utf8")]
    encoding: String,
}

#[derive(Deserialize, JsonSchema)]
struct ListArgs {
    /// Directory to list.
    #[serde(default = "root")]
    path: String,
    /// Recursion depth.
    #[serde(default)]
    depth: Option<u32>,
}

#[derive(Deserialize, JsonSchema)]
struct ListDirectoryArgs {
    /// Directory to list.
    #[serde(default = "root")]
    path: String,
}

#[derive(Deserialize, JsonSchema)]
struct MkdirArgs {
    /// Directory to create.
    path: String,
    /// Create missing parents.
    #[serde(default = "yes")]
    parents: bool,
    /// Permission bits.
    #[serde(default = "dir_mode")]
    mode: String,
}

#[derive(Deserialize, JsonSchema)]
struct MoveArgs {
    /// Current path.
    source: String,
    /// New path.
    destination: String,
}

#[derive(Deserialize, JsonSchema)]
struct CmdArgs {
    /// Shell command.
    command: String,
    /// Working directory.
    #[serde(default = "default_cwd")]
    cwd: String,
    /// Timeout in seconds.
    #[serde(default = "cmd_timeout")]
    timeout: u64,
}

#[derive(Deserialize, JsonSchema)]
struct PidArgs {
    /// Process id.
    pid: String,
}

// ── Results ────────────────────────────────────────────────────────────

/// Reduce a raw execution result to `{stdout, stderr, exit_code, result}`.
///
/// A missing `exitCode` counts as success.
#[must_use]
pub fn execution_summary(raw: Value) -> Value {
    let field = |key: &str| raw.get(key).and_then(Value::as_str).unwrap_or_default().to_owned();
    json!({
        "stdout": field("stdout"),
        "stderr": field("stderr"),
        "exit_code": raw.get("exitCode").and_then(Value::as_i64).unwrap_or(0),
        "result": raw,
    })
}

fn run_code(
    sandbox: &dyn CodeInterpreter,
    code: &str,
    language: &str,
    timeout: u64,
    context_id: Option<&str>,
) -> Result<Value, BridgeError> {
    if let Some(id) = context_id {
        return sandbox.execute(id, code, timeout).map(execution_summary);
    }
    let context = sandbox.create_context(language, DEFAULT_CWD)?;
    let outcome = sandbox.execute(&context.context_id, code, timeout);
    if let Err(e) = sandbox.delete_context(&context.context_id) {
        debug!(target: "tb.sandbox", context = %context.context_id, error = %e, "temporary context not deleted");
    }
    outcome.map(execution_summary)
}

// ── Tool set ───────────────────────────────────────────────────────────

/// Tools over a lazily created code-interpreter sandbox.
///
/// | Tool | Result |
/// |------|--------|
/// | `health` | service health |
/// | `run_code` / `execute_code` | `{stdout, stderr, exit_code, result}` |
/// | `list_contexts` | `{contexts}` |
/// | `create_context` / `get_context` | `{context_id, language, cwd}` |
/// | `delete_context` | `{success, result}` |
/// | `read_file` | `{path, content}` |
/// | `write_file` | `{path, success, result}` |
/// | `file_system_list` / `list_directory` | `{path, entries}` |
/// | `file_system_stat` | `{path, stat}` |
/// | `file_system_mkdir` / `file_system_remove` | `{path, success, result}` |
/// | `file_system_move` | `{source, destination, success, result}` |
/// | `process_exec_cmd` | `{command, stdout, stderr, exit_code, result}` |
/// | `process_list` | `{processes}` |
/// | `process_stat` | `{pid, process}` |
/// | `process_kill` | `{pid, success, result}` |
#[derive(Debug)]
pub struct CodeInterpreterToolSet {
    session: Arc<SandboxSession>,
    tools: Vec<Tool>,
}

impl CodeInterpreterToolSet {
    /// Build the tool set. No sandbox is created until a tool runs.
    pub fn new(provider: Arc<dyn SandboxProvider>, spec: SandboxSpec) -> Result<Self, BridgeError> {
        let session = Arc::new(SandboxSession::new(provider, spec));
        let tools = build_tools(&session)?;
        Ok(Self { session, tools })
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<SandboxSession> {
        &self.session
    }

    /// Every tool, in declaration order.
    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// The tools as a framework-convertible set.
    #[must_use]
    pub fn toolset(&self) -> CommonToolSet {
        self.tools.clone().into()
    }

    /// Stop the sandbox, if one was started.
    pub fn close(&self) {
        self.session.close();
    }
}

fn op<A, F>(session: &Arc<SandboxSession>, name: &'static str, description: &str, f: F) -> Result<Tool, BridgeError>
where
    A: JsonSchema + DeserializeOwned + 'static,
    F: Fn(&dyn CodeInterpreter, &A) -> Result<Value, BridgeError> + Send + Sync + 'static,
{
    let session = Arc::clone(session);
    Tool::from_fn(name, description, move |args: A| {
        Ok::<_, ToolError>(session.run(name, |sandbox| f(sandbox, &args)))
    })
}

fn build_tools(s: &Arc<SandboxSession>) -> Result<Vec<Tool>, BridgeError> {
    Ok(vec![
        op(s, "health", "Check sandbox health.", |sb, _: &NoArgs| sb.health())?,
        op(s, "run_code", "Run code in the sandbox.", |sb, a: &RunCodeArgs| {
            run_code(sb, &a.code, &a.language, a.timeout, a.context_id.as_deref())
        })?,
        op(
            s,
            "execute_code",
            "Run code in a temporary context. Alias of run_code.",
            |sb, a: &ExecuteCodeArgs| run_code(sb, &a.code, &a.language, a.timeout, None),
        )?,
        op(s, "list_contexts", "List execution contexts.", |sb, _: &NoArgs| {
            Ok(json!({"contexts": sb.list_contexts()?}))
        })?,
        op(s, "create_context", "Create an execution context.", |sb, a: &CreateContextArgs| {
            Ok(serde_json::to_value(sb.create_context(&a.language, &a.cwd)?)?)
        })?,
        op(s, "get_context", "Describe an execution context.", |sb, a: &ContextArgs| {
            Ok(serde_json::to_value(sb.get_context(&a.context_id)?)?)
        })?,
        op(s, "delete_context", "Delete an execution context.", |sb, a: &ContextArgs| {
            Ok(json!({"success": true, "result": sb.delete_context(&a.context_id)?}))
        })?,
        op(s, "read_file", "Read a text file.", |sb, a: &PathArgs| {
            Ok(json!({"path": a.path, "content": sb.read_file(&a.path)?}))
        })?,
        op(s, "write_file", "Write a text file.", |sb, a: &WriteFileArgs| {
            let result = sb.write_file(&a.path, &a.content, &a.mode, &a.encoding)?;
            Ok(json!({"path": a.path, "success": true, "result": result}))
        })?,
        op(s, "file_system_list", "List a directory.", |sb, a: &ListArgs| {
            Ok(json!({"path": a.path, "entries": sb.list(&a.path, a.depth)?}))
        })?,
        op(
            s,
            "list_directory",
            "List a directory. Alias of file_system_list.",
            |sb, a: &ListDirectoryArgs| Ok(json!({"path": a.path, "entries": sb.list(&a.path, None)?})),
        )?,
        op(s, "file_system_stat", "Stat a file or directory.", |sb, a: &PathArgs| {
            Ok(json!({"path": a.path, "stat": sb.stat(&a.path)?}))
        })?,
        op(s, "file_system_mkdir", "Create a directory.", |sb, a: &MkdirArgs| {
            let result = sb.mkdir(&a.path, a.parents, &a.mode)?;
            Ok(json!({"path": a.path, "success": true, "result": result}))
        })?,
        op(s, "file_system_move", "Move or rename a path.", |sb, a: &MoveArgs| {
            let result = sb.move_path(&a.source, &a.destination)?;
            Ok(json!({"source": a.source, "destination": a.destination, "success": true, "result": result}))
        })?,
        op(s, "file_system_remove", "Remove a file or directory.", |sb, a: &PathArgs| {
            let result = sb.remove(&a.path)?;
            Ok(json!({"path": a.path, "success": true, "result": result}))
        })?,
        op(s, "process_exec_cmd", "Run a shell command.", |sb, a: &CmdArgs| {
            let raw = sb.cmd(&a.command, &a.cwd, a.timeout)?;
            let mut out = execution_summary(raw);
            out["command"] = json!(a.command);
            Ok(out)
        })?,
        op(s, "process_list", "List running processes.", |sb, _: &NoArgs| {
            Ok(json!({"processes": sb.process_list()?}))
        })?,
        op(s, "process_stat", "Describe a process.", |sb, a: &PidArgs| {
            Ok(json!({"pid": a.pid, "process": sb.process_get(&a.pid)?}))
        })?,
        op(s, "process_kill", "Kill a process.", |sb, a: &PidArgs| {
            Ok(json!({"pid": a.pid, "success": true, "result": sb.process_kill(&a.pid)?}))
        })?,
    ])
}
