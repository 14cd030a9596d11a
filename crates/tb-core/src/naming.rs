// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool-name normalization for provider length limits.

use md5::{Digest, Md5};

/// Longest tool name providers accept.
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Characters of the original name kept in front of the digest.
pub const TOOL_NAME_HEAD_LEN: usize = 32;

/// Shorten `name` so it fits [`MAX_TOOL_NAME_LEN`].
///
/// Names of at most 64 characters come back unchanged. Longer names become
/// their first 32 characters followed by the 32-hex-digit MD5 of the whole
/// name, 64 characters in total. Lengths count `char`s, the digest covers the
/// UTF-8 bytes.
///
/// ```
/// use tb_core::normalize_tool_name;
///
/// let long = "a".repeat(80);
/// let short = normalize_tool_name(&long);
/// assert_eq!(short.chars().count(), 64);
/// assert_eq!(normalize_tool_name(&short), short);
/// ```
#[must_use]
pub fn normalize_tool_name(name: &str) -> String {
    if name.chars().count() <= MAX_TOOL_NAME_LEN {
        return name.to_owned();
    }
    let mut hasher = Md5::new();
    hasher.update(name.as_bytes());
    let head: String = name.chars().take(TOOL_NAME_HEAD_LEN).collect();
    format!("{head}{:x}", hasher.finalize())
}

/// Replace every character outside `[0-9A-Za-z_]` with `_`.
///
/// Used where a name must double as an identifier (e.g. OpenAPI
/// operation ids such as `GET /users/{id}`).
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_unchanged() {
        assert_eq!(normalize_tool_name("get_weather"), "get_weather");
        let exactly = "x".repeat(64);
        assert_eq!(normalize_tool_name(&exactly), exactly);
        assert_eq!(normalize_tool_name(""), "");
    }

    #[test]
    fn long_name_is_head_plus_md5() {
        let long = "a".repeat(80);
        let out = normalize_tool_name(&long);
        assert_eq!(out.len(), 64);
        assert!(out.starts_with(&"a".repeat(32)));
        assert_eq!(&out[32..], "b15af9cdabbaea0516866a33d8fd0f98");
    }

    #[test]
    fn shared_prefix_still_distinct() {
        let prefix = "p".repeat(40);
        let a = normalize_tool_name(&format!("{prefix}_alpha_operation_with_long_suffix"));
        let b = normalize_tool_name(&format!("{prefix}_beta_operation_with_long_suffix"));
        assert_ne!(a, b);
        assert_eq!(a[..32], b[..32]);
    }

    #[test]
    fn multibyte_names_count_chars() {
        let name = "工具".repeat(40);
        let out = normalize_tool_name(&name);
        assert_eq!(out.chars().count(), 64);
        assert!(out.starts_with(&"工具".repeat(16)));
    }

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_identifier("GET /users/{id}"), "GET__users__id_");
        assert_eq!(sanitize_identifier("ok_name1"), "ok_name1");
    }
}
