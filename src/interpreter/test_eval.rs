//! Evaluation of the `test` / `[` builtin and the `[[ ]]` conditional
//! command against the sandboxed filesystem.
//!
//! Built on the operator primitives in `helpers::{file_tests, string_tests,
//! string_compare, numeric_compare}`; this module owns only the argument
//! grammar and file-test evaluation against `FileSystem`.

use crate::interpreter::helpers::file_tests::{BinaryFileTestOperator, FileTestOperator};
use crate::interpreter::helpers::numeric_compare::compare_numeric_str;
use crate::interpreter::helpers::string_compare::{compare_strings_nocase, StringCompareOp};
use crate::interpreter::helpers::string_tests::evaluate_string_test_str;
use crate::interpreter::interpreter::FileSystem as SyncFileSystem;

/// Evaluate the file test named by `op` against `path`.
fn evaluate_file_test(fs: &dyn SyncFileSystem, op: FileTestOperator, path: &str) -> bool {
    match op {
        FileTestOperator::Exists | FileTestOperator::ExistsDeprecated => fs.exists(path),
        FileTestOperator::RegularFile => fs.is_file(path),
        FileTestOperator::Directory => fs.is_dir(path),
        FileTestOperator::Readable | FileTestOperator::Writable => fs.exists(path),
        FileTestOperator::Executable => fs
            .stat(path)
            .map(|s| s.is_file && (s.mode & 0o111) != 0)
            .unwrap_or(false),
        FileTestOperator::NonEmpty => fs.stat(path).map(|s| s.size > 0).unwrap_or(false),
        FileTestOperator::SymbolicLink | FileTestOperator::SymbolicLinkH => {
            fs.stat(path).map(|s| s.is_symlink).unwrap_or(false)
        }
        FileTestOperator::StickyBit => fs.stat(path).map(|s| s.mode & 0o1000 != 0).unwrap_or(false),
        FileTestOperator::SetGid => fs.stat(path).map(|s| s.mode & 0o2000 != 0).unwrap_or(false),
        FileTestOperator::SetUid => fs.stat(path).map(|s| s.mode & 0o4000 != 0).unwrap_or(false),
        FileTestOperator::OwnedByGroup | FileTestOperator::OwnedByUser => fs.exists(path),
        FileTestOperator::BlockSpecial
        | FileTestOperator::CharSpecial
        | FileTestOperator::NamedPipe
        | FileTestOperator::Socket => false,
        FileTestOperator::Terminal => false,
        FileTestOperator::ModifiedSinceRead => false,
    }
}

fn evaluate_binary_file_test(
    fs: &dyn SyncFileSystem,
    op: BinaryFileTestOperator,
    left: &str,
    right: &str,
) -> bool {
    match op {
        BinaryFileTestOperator::NewerThan => match (fs.stat(left), fs.stat(right)) {
            (Ok(l), Ok(r)) => l.mtime > r.mtime,
            (Ok(_), Err(_)) => true,
            _ => false,
        },
        BinaryFileTestOperator::OlderThan => match (fs.stat(left), fs.stat(right)) {
            (Ok(l), Ok(r)) => l.mtime < r.mtime,
            (Err(_), Ok(_)) => true,
            _ => false,
        },
        BinaryFileTestOperator::SameFile => fs.resolve_path("/", left) == fs.resolve_path("/", right),
    }
}

/// Evaluate a single primary (no `-a`/`-o` combinators): 0, 1, 2 or 3 operands.
fn evaluate_primary(fs: &dyn SyncFileSystem, args: &[String]) -> Result<bool, String> {
    match args.len() {
        0 => Ok(false),
        1 => Ok(!args[0].is_empty()),
        2 => {
            if args[0] == "!" {
                return Ok(args[1].is_empty());
            }
            if let Some(result) = evaluate_string_test_str(&args[0], &args[1]) {
                return Ok(result);
            }
            if let Some(op) = FileTestOperator::from_str(&args[0]) {
                return Ok(evaluate_file_test(fs, op, &args[1]));
            }
            Err(format!("test: {}: unknown unary operator\n", args[0]))
        }
        3 => {
            if args[0] == "!" {
                return evaluate_primary(fs, &args[1..]).map(|b| !b);
            }
            let (left, op, right) = (&args[0], &args[1], &args[2]);
            if let Some(result) = compare_numeric_str(
                op,
                left.trim().parse::<i64>().unwrap_or(0),
                right.trim().parse::<i64>().unwrap_or(0),
            ) {
                return Ok(result);
            }
            if let Some(cmp) = StringCompareOp::from_str(op) {
                return Ok(compare_strings_nocase(cmp, left, right, false));
            }
            if let Some(bop) = BinaryFileTestOperator::from_str(op) {
                return Ok(evaluate_binary_file_test(fs, bop, left, right));
            }
            match op.as_str() {
                "<" => Ok(left < right),
                ">" => Ok(left > right),
                _ => Err(format!("test: {}: binary operator expected\n", op)),
            }
        }
        _ => Err("test: too many arguments\n".to_string()),
    }
}

/// Evaluate `test`/`[` arguments, including `-a`/`-o` chained primaries.
pub fn evaluate_test(fs: &dyn SyncFileSystem, args: &[String]) -> Result<bool, String> {
    // Split on top-level -a / -o, left associative, -a binds tighter than -o.
    let or_groups: Vec<&[String]> = split_on(args, "-o");
    let mut overall = false;
    for (i, group) in or_groups.iter().enumerate() {
        let and_groups: Vec<&[String]> = split_on(group, "-a");
        let mut and_result = true;
        for part in and_groups {
            and_result = and_result && evaluate_primary(fs, part)?;
        }
        overall = if i == 0 { and_result } else { overall || and_result };
    }
    Ok(overall)
}

fn split_on<'a>(args: &'a [String], sep: &str) -> Vec<&'a [String]> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, a) in args.iter().enumerate() {
        if a == sep {
            parts.push(&args[start..i]);
            start = i + 1;
        }
    }
    parts.push(&args[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use crate::interpreter::sync_fs_adapter::SyncFsAdapter;
    use std::sync::Arc;

    fn adapter() -> SyncFsAdapter {
        let fs = Arc::new(InMemoryFs::new());
        SyncFsAdapter::new(fs, tokio::runtime::Handle::current())
    }

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_string_nonempty() {
        let a = adapter();
        assert!(evaluate_test(&a, &args(&["hello"])).unwrap());
        assert!(!evaluate_test(&a, &args(&[""])).unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_z_n() {
        let a = adapter();
        assert!(evaluate_test(&a, &args(&["-z", ""])).unwrap());
        assert!(evaluate_test(&a, &args(&["-n", "x"])).unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_numeric_compare() {
        let a = adapter();
        assert!(evaluate_test(&a, &args(&["3", "-lt", "5"])).unwrap());
        assert!(!evaluate_test(&a, &args(&["5", "-lt", "3"])).unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_string_compare() {
        let a = adapter();
        assert!(evaluate_test(&a, &args(&["a", "=", "a"])).unwrap());
        assert!(evaluate_test(&a, &args(&["a", "!=", "b"])).unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_exists() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/foo.txt", b"hi").await.unwrap();
        let a = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        assert!(evaluate_test(&a, &args(&["-f", "/foo.txt"])).unwrap());
        assert!(!evaluate_test(&a, &args(&["-d", "/foo.txt"])).unwrap());
        assert!(!evaluate_test(&a, &args(&["-e", "/missing.txt"])).unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_or() {
        let a = adapter();
        assert!(evaluate_test(&a, &args(&["x", "-a", "y"])).unwrap());
        assert!(evaluate_test(&a, &args(&["", "-o", "y"])).unwrap());
        assert!(!evaluate_test(&a, &args(&["", "-a", "y"])).unwrap());
    }
}
