//! Identifier sanitization for generated wrapper names.
//!
//! [`sanitize_identifier`] maps arbitrary display names to identifier-safe
//! text. The mapping is not injective (`"My Tool"` and `"my-tool!"` both
//! become `my_tool`), so callers that need unique names should claim them
//! through an [`IdentifierAllocator`].
//!
//! # Examples
//!
//! ```
//! use script_manifest_core::{IdentifierAllocator, sanitize_identifier};
//!
//! assert_eq!(sanitize_identifier("3 Cool Tool"), "_3_cool_tool");
//!
//! let mut allocator = IdentifierAllocator::new();
//! assert_eq!(allocator.claim("My Tool"), "my_tool");
//! assert_eq!(allocator.claim("my tool!"), "my_tool_2");
//! ```

use std::collections::HashSet;

/// Lowercases, turns spaces into underscores, drops everything outside
/// `[0-9a-z_]`, and prepends `_` when the result starts with a digit.
///
/// The function is idempotent: sanitizing an already sanitized name returns
/// it unchanged.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .to_lowercase()
        .chars()
        .map(|ch| if ch == ' ' { '_' } else { ch })
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    if out.starts_with(|ch: char| ch.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Hands out collision-free identifiers.
///
/// The first claim of a sanitized name returns it unchanged; later claims
/// get `_2`, `_3`, ... appended, skipping suffixes already in use.
#[derive(Debug, Clone, Default)]
pub struct IdentifierAllocator {
    taken: HashSet<String>,
}

impl IdentifierAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitizes `name` and reserves a unique identifier for it.
    pub fn claim(&mut self, name: &str) -> String {
        let mut base = sanitize_identifier(name);
        if base.is_empty() {
            base.push('_');
        }
        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut suffix = 2usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn is_taken(&self, identifier: &str) -> bool {
        self.taken.contains(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic_cases() {
        assert_eq!(sanitize_identifier("3 Cool Tool"), "_3_cool_tool");
        assert_eq!(sanitize_identifier("hello-world"), "helloworld");
        assert_eq!(sanitize_identifier("Data  Sync"), "data__sync");
        assert_eq!(sanitize_identifier("Ünïcode Näme"), "ncode_nme");
        assert_eq!(sanitize_identifier(""), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in [
            "3 Cool Tool",
            "42",
            "__init__",
            "Hello, World!",
            "   ",
            "ÀB 9",
            "_1",
        ] {
            let once = sanitize_identifier(input);
            assert_eq!(sanitize_identifier(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_allocator_disambiguates_collisions() {
        let mut allocator = IdentifierAllocator::new();
        assert_eq!(allocator.claim("tool"), "tool");
        assert_eq!(allocator.claim("tool_2"), "tool_2");
        assert_eq!(allocator.claim("Tool"), "tool_3");
        assert_eq!(allocator.claim("!!!"), "_");
        assert_eq!(allocator.claim("???"), "__2");
        assert!(allocator.is_taken("tool_3"));
    }
}
