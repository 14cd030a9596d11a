// SPDX-License-Identifier: MIT OR Apache-2.0
//! Callable synthesis for toolbridge.
//!
//! [`CallableSynthesizer`] turns a [`CanonicalTool`](tb_core::CanonicalTool)
//! into a [`SynthesizedCallable`]: a keyword-only parameter list mirroring
//! the schema, the normalized name, and a description that can carry a
//! plain-text structural block. Invocation runs the argument
//! [`reconcile`] step and an [`ArgumentValidator`] before reaching the tool
//! function or an adapter's [`InvokeHook`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod reconcile;
pub mod synthesize;
pub mod validate;

pub use reconcile::{ALIASES_KEY, aliases_from_schema, field_names, reconcile};
pub use synthesize::{
    CallableParam, CallableSynthesizer, InvokeHook, SynthesisOptions, SynthesizedCallable, invoke_hook,
};
pub use validate::ArgumentValidator;
