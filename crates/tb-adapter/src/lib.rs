// SPDX-License-Identifier: MIT OR Apache-2.0
//! Adapter layer for toolbridge.
//!
//! Defines the [`ToolAdapter`], [`ModelAdapter`] and [`MessageAdapter`]
//! contracts, the [`AdapterRegistry`] mapping framework ids to adapters,
//! and the framework-neutral [`CommonToolSet`] and [`CommonModel`] that
//! convert through it. Concrete adapters live in `tb-integrations`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod function;
pub mod model;
pub mod registered;
pub mod registry;
pub mod toolset;

pub use contract::{
    ChatClientConfig, FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, ToolAdapter, UsageReporting,
};
pub use function::function_tools;
pub use model::CommonModel;
pub use registered::RegisteredTools;
pub use registry::AdapterRegistry;
pub use toolset::{CommonToolSet, ToolSelection};
