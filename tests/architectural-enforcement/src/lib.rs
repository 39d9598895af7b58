//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce source policies on
//! the transport crates:
//! - No `unwrap()`/`expect()` in library code (transport failures must be
//!   swallowed, never turned into panics)
//! - No `thread::sleep` in library code (the send path is bounded by socket
//!   timeouts only)
//!
//! Test modules (everything from the first `#[cfg(test)]` on) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the pattern
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The pattern that matched
    pub pattern: &'static str,
}

/// Root of the transport crates, relative to this package
pub fn transport_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../transport")
}

/// The part of a source file before its first test module
pub fn production_source(source: &str) -> &str {
    source
        .find("#[cfg(test)]")
        .map_or(source, |idx| &source[..idx])
}

/// Find `patterns` in the production part of every `src/**/*.rs` under `root`
pub fn scan(root: &Path, patterns: &[&'static str]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let files = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .filter(|e| e.path().components().any(|c| c.as_os_str() == "src"));

    for entry in files {
        let Ok(source) = fs::read_to_string(entry.path()) else {
            continue;
        };
        for (idx, line) in production_source(&source).lines().enumerate() {
            let code = line.split("//").next().unwrap_or_default();
            for &pattern in patterns {
                if code.contains(pattern) {
                    violations.push(Violation {
                        path: entry.path().to_path_buf(),
                        line: idx + 1,
                        pattern,
                    });
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_source_stops_at_test_module() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }\n";
        assert_eq!(production_source(source), "fn a() {}\n");
        assert_eq!(production_source("fn a() {}"), "fn a() {}");
    }
}
