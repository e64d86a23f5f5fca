//! Evaluation of the `[[ expression ]]` conditional command.
//!
//! Operands are expanded like double-quoted words: parameter, command and
//! arithmetic substitution run, but word splitting and pathname expansion
//! do not. `==`/`!=` match the right-hand side as a glob pattern unless
//! quoted; `=~` treats it as a POSIX extended regular expression.

use crate::ast::types::{
    CondBinaryOperator, CondUnaryOperator, ConditionalExpressionNode, WordNode,
};
use crate::interpreter::conditionals::{match_pattern, posix_ere_to_regex};
use crate::interpreter::helpers::file_tests::FileTestOperator;
use crate::interpreter::helpers::numeric_compare::compare_numeric_str;
use crate::interpreter::interpreter::FileSystem as SyncFileSystem;
use crate::interpreter::types::InterpreterState;
use crate::interpreter::word_expansion::expand_word;

fn expand(state: &mut InterpreterState, word: &WordNode) -> String {
    expand_word(state, word, None).value
}

fn unary_file_op(op: CondUnaryOperator) -> Option<FileTestOperator> {
    use CondUnaryOperator::*;
    Some(match op {
        A => FileTestOperator::ExistsDeprecated,
        B => FileTestOperator::BlockSpecial,
        C => FileTestOperator::CharSpecial,
        D => FileTestOperator::Directory,
        E => FileTestOperator::Exists,
        F => FileTestOperator::RegularFile,
        G => FileTestOperator::SetGid,
        H => FileTestOperator::SymbolicLinkH,
        K => FileTestOperator::StickyBit,
        P => FileTestOperator::NamedPipe,
        R => FileTestOperator::Readable,
        S => FileTestOperator::NonEmpty,
        T => FileTestOperator::Terminal,
        U => FileTestOperator::SetUid,
        W => FileTestOperator::Writable,
        X => FileTestOperator::Executable,
        UpperG => FileTestOperator::OwnedByGroup,
        L => FileTestOperator::SymbolicLink,
        N => FileTestOperator::ModifiedSinceRead,
        UpperO => FileTestOperator::OwnedByUser,
        UpperS => FileTestOperator::Socket,
        Z | LowerN | LowerO | V | UpperR => return None,
    })
}

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
        _ => false,
    }
}

/// Evaluate a `[[ ]]` expression. Returns the boolean result or an
/// evaluation error message (e.g. an invalid `=~` regex).
pub fn evaluate_conditional(
    state: &mut InterpreterState,
    fs: &dyn SyncFileSystem,
    expr: &ConditionalExpressionNode,
) -> Result<bool, String> {
    match expr {
        ConditionalExpressionNode::Word(w) => Ok(!expand(state, &w.word).is_empty()),

        ConditionalExpressionNode::Not(n) => {
            evaluate_conditional(state, fs, &n.operand).map(|b| !b)
        }

        ConditionalExpressionNode::And(n) => {
            Ok(evaluate_conditional(state, fs, &n.left)? && evaluate_conditional(state, fs, &n.right)?)
        }

        ConditionalExpressionNode::Or(n) => {
            Ok(evaluate_conditional(state, fs, &n.left)? || evaluate_conditional(state, fs, &n.right)?)
        }

        ConditionalExpressionNode::Group(n) => evaluate_conditional(state, fs, &n.expression),

        ConditionalExpressionNode::Unary(n) => {
            let operand = expand(state, &n.operand);
            match n.operator {
                CondUnaryOperator::Z => Ok(operand.is_empty()),
                CondUnaryOperator::LowerN => Ok(!operand.is_empty()),
                CondUnaryOperator::V => Ok(state.env.contains_key(&operand)),
                CondUnaryOperator::UpperR => Ok(state
                    .namerefs
                    .as_ref()
                    .map(|s| s.contains(&operand))
                    .unwrap_or(false)),
                CondUnaryOperator::LowerO => Ok(crate::interpreter::conditionals::evaluate_shell_option(
                    state, &operand,
                )),
                other => {
                    let op = unary_file_op(other)
                        .expect("file-test operators handled by unary_file_op");
                    Ok(evaluate_file_test(fs, op, &operand))
                }
            }
        }

        ConditionalExpressionNode::Binary(n) => {
            let left = expand(state, &n.left);
            let extglob = state.shopt_options.extglob;
            let nocasematch = state.shopt_options.nocasematch;
            match n.operator {
                CondBinaryOperator::Eq | CondBinaryOperator::EqEq => {
                    let right = expand(state, &n.right);
                    Ok(match_pattern(&left, &right, nocasematch, extglob))
                }
                CondBinaryOperator::Ne => {
                    let right = expand(state, &n.right);
                    Ok(!match_pattern(&left, &right, nocasematch, extglob))
                }
                CondBinaryOperator::Match => {
                    let pattern_word = expand(state, &n.right);
                    let regex_src = posix_ere_to_regex(&pattern_word);
                    let re = regex_lite::Regex::new(&regex_src)
                        .map_err(|e| format!("bash: [[: {}: invalid regex: {}\n", pattern_word, e))?;
                    if let Some(m) = re.captures(&left) {
                        for i in 0..10 {
                            let key = format!("BASH_REMATCH[{}]", i);
                            if let Some(g) = m.get(i) {
                                state.env.insert(key, g.as_str().to_string());
                            }
                        }
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                }
                CondBinaryOperator::Lt => Ok(left < expand(state, &n.right)),
                CondBinaryOperator::Gt => Ok(left > expand(state, &n.right)),
                CondBinaryOperator::NumEq
                | CondBinaryOperator::NumNe
                | CondBinaryOperator::NumLt
                | CondBinaryOperator::NumLe
                | CondBinaryOperator::NumGt
                | CondBinaryOperator::NumGe => {
                    let right = expand(state, &n.right);
                    let op_str = match n.operator {
                        CondBinaryOperator::NumEq => "-eq",
                        CondBinaryOperator::NumNe => "-ne",
                        CondBinaryOperator::NumLt => "-lt",
                        CondBinaryOperator::NumLe => "-le",
                        CondBinaryOperator::NumGt => "-gt",
                        _ => "-ge",
                    };
                    let l: i64 = left.trim().parse().unwrap_or(0);
                    let r: i64 = right.trim().parse().unwrap_or(0);
                    Ok(compare_numeric_str(op_str, l, r).unwrap_or(false))
                }
                CondBinaryOperator::Nt => {
                    let right = expand(state, &n.right);
                    Ok(fs.stat(&left).map(|s| s.mtime).unwrap_or(0)
                        > fs.stat(&right).map(|s| s.mtime).unwrap_or(0))
                }
                CondBinaryOperator::Ot => {
                    let right = expand(state, &n.right);
                    Ok(fs.stat(&left).map(|s| s.mtime).unwrap_or(u64::MAX)
                        < fs.stat(&right).map(|s| s.mtime).unwrap_or(u64::MAX))
                }
                CondBinaryOperator::Ef => {
                    let right = expand(state, &n.right);
                    Ok(fs.resolve_path("/", &left) == fs.resolve_path("/", &right))
                }
            }
        }
    }
}
