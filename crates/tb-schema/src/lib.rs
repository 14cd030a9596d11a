// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-Schema handling for toolbridge.
//!
//! - [`resolve`] normalizes a property schema (`$ref`, `anyOf`, `oneOf`,
//!   `allOf`) into a single core schema plus a nullability flag.
//! - [`TypeSynthesizer`] builds [`TypeRef`] descriptors, caching named
//!   records in an injectable [`TypeCache`].
//! - [`describe_type`] / [`params_doc`] render plain-text structural
//!   descriptions for frameworks without structured type inspection.
//! - [`enrich_parameters`] re-annotates a parameters schema for
//!   OpenAI/Anthropic style tool specs.
//!
//! Nothing in this crate fails on malformed schemas; it degrades instead.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod describe;
pub mod enrich;
pub mod resolve;
pub mod synth;
pub mod types;

pub use describe::{describe_type, params_doc};
pub use enrich::enrich_parameters;
pub use resolve::{Resolved, Schema, inline_refs, lookup_ref, merge_schemas, resolve};
pub use synth::{CacheKey, MAX_RECORD_DEPTH, SynthesisError, TypeCache, TypeSynthesizer, record_name};
pub use types::{RecordField, RecordType, TypeRef};
