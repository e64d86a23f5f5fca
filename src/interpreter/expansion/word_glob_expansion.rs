//! Word Expansion with Glob Handling
//!
//! Provides helper functions for glob/pathname expansion.
//! The main word expansion flow is handled at the interpreter level.

use crate::interpreter::expansion::{has_glob_pattern, unescape_glob_pattern};
use crate::interpreter::interpreter::FileSystem as SyncFileSystem;

/// Result of glob expansion.
#[derive(Debug, Clone)]
pub struct GlobExpansionResult {
    /// The expanded values (file paths or original pattern if no match)
    pub values: Vec<String>,
    /// Whether the result should be treated as quoted (no further splitting)
    pub quoted: bool,
}

/// Expand a glob pattern to matching file paths.
/// If no matches are found, returns the original pattern (with glob escapes removed).
/// If failglob is enabled and no matches are found, returns an error.
pub fn expand_glob_pattern(
    fs: &dyn SyncFileSystem,
    pattern: &str,
    cwd: &str,
    failglob: bool,
    nullglob: bool,
    extglob: bool,
) -> Result<GlobExpansionResult, String> {
    // Check if the pattern contains glob characters
    if !has_glob_pattern(pattern, extglob) {
        // No glob characters - return the unescaped pattern
        return Ok(GlobExpansionResult {
            values: vec![unescape_glob_pattern(pattern)],
            quoted: false,
        });
    }

    // Perform glob expansion against the virtual filesystem
    let matches = match fs.glob(pattern, cwd) {
        Ok(m) => m,
        Err(_) => {
            if failglob {
                return Err(format!("no match: {}", pattern));
            }
            // Return the original pattern on error
            return Ok(GlobExpansionResult {
                values: vec![unescape_glob_pattern(pattern)],
                quoted: false,
            });
        }
    };

    if matches.is_empty() {
        if failglob {
            return Err(format!("no match: {}", pattern));
        }
        if nullglob {
            return Ok(GlobExpansionResult {
                values: vec![],
                quoted: false,
            });
        }
        // Return the original pattern
        return Ok(GlobExpansionResult {
            values: vec![unescape_glob_pattern(pattern)],
            quoted: false,
        });
    }

    Ok(GlobExpansionResult {
        values: matches,
        quoted: false,
    })
}

/// Check if a word should be subject to glob expansion.
/// Returns false if the word is entirely quoted.
pub fn should_glob_expand(is_quoted: bool, noglob: bool) -> bool {
    !is_quoted && !noglob
}

/// Split a value by IFS and expand each resulting word as a glob pattern.
pub fn split_and_glob_expand(
    fs: &dyn SyncFileSystem,
    values: &[String],
    cwd: &str,
    failglob: bool,
    nullglob: bool,
    noglob: bool,
    extglob: bool,
) -> Result<Vec<String>, String> {
    if noglob {
        return Ok(values.to_vec());
    }

    let mut result = Vec::new();
    for value in values {
        let expanded = expand_glob_pattern(fs, value, cwd, failglob, nullglob, extglob)?;
        result.extend(expanded.values);
    }
    Ok(result)
}
