// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sandboxed code-interpreter tools for toolbridge.
//!
//! The sandbox itself is a collaborator: implement [`SandboxProvider`] and
//! [`CodeInterpreter`] for the service in use. [`CodeInterpreterToolSet`]
//! turns it into ordinary [`tb_core::Tool`]s that convert to any framework
//! through a [`tb_adapter::CommonToolSet`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod code_interpreter;
mod provider;
mod session;

pub use code_interpreter::{CodeInterpreterToolSet, DEFAULT_CWD, execution_summary};
pub use provider::{CodeInterpreter, ContextInfo, SandboxProvider, SandboxSpec};
pub use session::SandboxSession;
