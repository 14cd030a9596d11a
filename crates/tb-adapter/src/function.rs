// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared conversion loop for function-style tool adapters.

use crate::contract::FrameworkTool;
use crate::registered::RegisteredTools;
use serde_json::Value;
use tb_callable::{CallableSynthesizer, InvokeHook, SynthesisOptions, SynthesizedCallable};
use tb_core::CanonicalTool;

/// Convert `tools` into [`FrameworkTool`]s for `framework`.
///
/// Each tool gets a synthesized callable (with `hook` when given) and a
/// declaration built by `declare`; every tool is recorded in `registered`.
pub fn function_tools<D>(
    framework: &str,
    tools: &[CanonicalTool],
    synth: &CallableSynthesizer,
    hook: Option<&InvokeHook>,
    options: SynthesisOptions,
    registered: &RegisteredTools,
    declare: D,
) -> Vec<FrameworkTool>
where
    D: Fn(&SynthesizedCallable) -> Value,
{
    registered.extend(tools);
    synth
        .synthesize_all(tools, hook, options)
        .into_iter()
        .map(|callable| FrameworkTool {
            framework: framework.to_owned(),
            declaration: declare(&callable),
            callable,
        })
        .collect()
}
