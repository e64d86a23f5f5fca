//! Word Expansion
//!
//! Main entry point for shell word expansion.
//!
//! Handles shell word expansion including:
//! - Variable expansion ($VAR, ${VAR})
//! - Command substitution $(...)
//! - Arithmetic expansion $((...)
//! - Tilde expansion (~)
//! - Brace expansion {a,b,c}
//! - Glob expansion (*, ?, [...])
//!
//! This module provides the high-level expansion functions.
//! The actual expansion logic is implemented in the expansion/ submodules.
//! Command substitution requires runtime dependencies (script execution),
//! supplied by the caller as a `CommandSubstFn` callback.

use crate::ast::types::{
    ArrayKeysOp, BraceExpansionPart, BraceItem, BraceRangeValue, CommandSubstitutionPart,
    DoubleQuotedPart, GlobPart, IndirectionOp, InnerParameterOperation, LiteralPart,
    ParameterExpansionPart, ParameterOperation, ScriptNode, SingleQuotedPart,
    TildeExpansionPart, VarNamePrefixOp, WordNode, WordPart,
};
use crate::interpreter::arithmetic::evaluate_arithmetic;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::expansion::parameter_ops::{
    apply_case_modification, apply_pattern_removal_op, apply_pattern_replacement_op,
    apply_substring_op, apply_transform_op, get_array_keys, get_parameter_length,
    get_var_names_with_prefix_op, should_use_alternative, should_use_default, ParameterOpContext,
};
use crate::interpreter::expansion::pattern::pattern_to_regex;
use crate::interpreter::expansion::tilde::apply_tilde_expansion;
use crate::interpreter::expansion::variable::get_variable;
use crate::interpreter::expansion::word_glob_expansion::expand_glob_pattern;
use crate::interpreter::helpers::ifs::{get_ifs, split_by_ifs_for_expansion_ex};
use crate::interpreter::helpers::word_parts::{get_literal_value, is_quoted_part};
use crate::interpreter::interpreter::FileSystem as SyncFileSystem;
use crate::interpreter::types::{ExecutionLimits, InterpreterContext, InterpreterState};

// Re-export commonly used expansion functions
pub use crate::interpreter::expansion::analysis::*;
pub use crate::interpreter::expansion::brace_range::*;
pub use crate::interpreter::expansion::glob_escape::*;
pub use crate::interpreter::expansion::pattern::*;
pub use crate::interpreter::expansion::pattern_removal::*;
pub use crate::interpreter::expansion::quoting::*;
pub use crate::interpreter::expansion::tilde::*;
pub use crate::interpreter::expansion::variable::*;
pub use crate::interpreter::expansion::word_split::*;

/// Result of word expansion.
#[derive(Debug, Clone)]
pub struct WordExpansionResult {
    /// The expanded string value
    pub value: String,
    /// Whether the expansion produced multiple words (from word splitting / brace / glob)
    pub split_words: Option<Vec<String>>,
    /// Any stderr output from command substitutions
    pub stderr: String,
    /// Exit code from command substitutions (if any)
    pub exit_code: Option<i32>,
}

impl WordExpansionResult {
    /// Create a simple result with just a value.
    pub fn simple(value: String) -> Self {
        Self {
            value,
            split_words: None,
            stderr: String::new(),
            exit_code: None,
        }
    }

    /// Create a result with split words.
    pub fn with_split(value: String, words: Vec<String>) -> Self {
        Self {
            value,
            split_words: Some(words),
            stderr: String::new(),
            exit_code: None,
        }
    }
}

/// Options for word expansion.
#[derive(Debug, Clone, Default)]
pub struct WordExpansionOptions {
    /// Whether we're inside double quotes
    pub in_double_quotes: bool,
    /// Whether to perform word splitting
    pub do_word_split: bool,
    /// Whether to perform glob expansion
    pub do_glob: bool,
    /// Whether to preserve empty fields
    pub preserve_empty: bool,
    /// Whether extglob is enabled
    pub extglob: bool,
}

/// Callback type the caller supplies to run a command-substitution body and
/// capture its stdout. Invoked with the substitution's script and the live
/// interpreter state (so side effects like variable assignments are visible).
pub type CommandSubstFn = dyn Fn(&ScriptNode, &mut InterpreterState) -> String;

/// Legacy alias kept for callers still referencing the old name.
pub type CommandSubstitutionFn = Box<dyn Fn(&str, &mut InterpreterState) -> crate::interpreter::types::ExecResult + Send + Sync>;

/// Expand a word without glob expansion (legacy, state-only entry point).
///
/// Superseded by [`expand_word`], which additionally supports command
/// substitution and mutating arithmetic expansion. Kept for call sites that
/// only need a read-only best-effort expansion.
pub fn expand_word_no_glob(
    state: &InterpreterState,
    word: &WordNode,
    options: &WordExpansionOptions,
) -> WordExpansionResult {
    let mut result = String::new();
    for part in &word.parts {
        result.push_str(&expand_part_no_glob(state, part, options));
    }
    WordExpansionResult::simple(result)
}

fn expand_part_no_glob(state: &InterpreterState, part: &WordPart, options: &WordExpansionOptions) -> String {
    if let Some(literal) = get_literal_value(part) {
        return literal.to_string();
    }

    match part {
        WordPart::TildeExpansion(tilde) => {
            if options.in_double_quotes {
                return match &tilde.user {
                    Some(u) => format!("~{}", u),
                    None => "~".to_string(),
                };
            }
            let tilde_str = match &tilde.user {
                Some(u) => format!("~{}", u),
                None => "~".to_string(),
            };
            apply_tilde_expansion(state, &tilde_str)
        }
        WordPart::ParameterExpansion(param) => get_variable(state, &param.parameter),
        WordPart::DoubleQuoted(dq) => {
            let inner_options = WordExpansionOptions { in_double_quotes: true, ..options.clone() };
            let mut result = String::new();
            for inner_part in &dq.parts {
                result.push_str(&expand_part_no_glob(state, inner_part, &inner_options));
            }
            result
        }
        WordPart::CommandSubstitution(_) => String::new(),
        WordPart::ArithmeticExpansion(arith) => {
            let limits = ExecutionLimits::default();
            let mut state_clone = state.clone();
            let mut ctx = InterpreterContext::new(&mut state_clone, &limits);
            match evaluate_arithmetic(&mut ctx, &arith.expression.expression, false, None) {
                Ok(value) => value.to_string(),
                Err(_) => "0".to_string(),
            }
        }
        WordPart::Glob(glob) => glob.pattern.clone(),
        WordPart::BraceExpansion(_) => String::new(),
        _ => String::new(),
    }
}

// ============================================================================
// Full (mutable-state) word expansion
// ============================================================================

/// Expand a single word to its string value. Performs tilde, parameter,
/// command and arithmetic substitution, and quote removal, but NOT brace
/// expansion, word splitting, or pathname expansion (use
/// [`expand_word_with_glob`] for those). This is the form used for command
/// names, assignment right-hand sides, and other "one word in, one word out"
/// contexts.
pub fn expand_word(
    state: &mut InterpreterState,
    word: &WordNode,
    command_subst: Option<&CommandSubstFn>,
) -> WordExpansionResult {
    let mut value = String::new();
    for part in &word.parts {
        value.push_str(&expand_part(state, part, false, command_subst));
    }
    WordExpansionResult::simple(value)
}

/// Expand a word fully: brace expansion, parameter/command/arithmetic
/// substitution, IFS word splitting, and pathname (glob) expansion against
/// the sandboxed filesystem. Used for command arguments and `for` word
/// lists, where a single source word can produce many result words.
pub fn expand_word_with_glob(
    state: &mut InterpreterState,
    fs: &dyn SyncFileSystem,
    word: &WordNode,
    command_subst: Option<&CommandSubstFn>,
) -> WordExpansionResult {
    let branches = expand_braces(word);
    let noglob = state.options.noglob;
    let failglob = state.shopt_options.failglob;
    let nullglob = state.shopt_options.nullglob;
    let extglob = state.shopt_options.extglob;
    let cwd = state.cwd.clone();

    let mut words: Vec<String> = Vec::new();

    for branch in &branches {
        let quoted = is_word_fully_quoted(branch);
        let mut value = String::new();
        for part in &branch.parts {
            value.push_str(&expand_part(state, part, false, command_subst));
        }

        let fields: Vec<String> = if quoted {
            vec![value]
        } else {
            let ifs = get_ifs(&state.env).to_string();
            let split = split_by_ifs_for_expansion_ex(&value, &ifs);
            if split.words.is_empty() && !value.is_empty() {
                vec![value]
            } else {
                split.words
            }
        };

        for field in fields {
            if quoted || noglob {
                words.push(field);
                continue;
            }
            match expand_glob_pattern(fs, &field, &cwd, failglob, nullglob, extglob) {
                Ok(expanded) => words.extend(expanded.values),
                Err(_) => words.push(field),
            }
        }
    }

    if words.len() == 1 {
        WordExpansionResult::simple(words.into_iter().next().unwrap())
    } else {
        let joined = words.join(" ");
        WordExpansionResult::with_split(joined, words)
    }
}

/// Expand brace expressions (`{a,b,c}` / `{1..5}`) into the Cartesian
/// product of candidate words. A word without any `BraceExpansion` part
/// expands to itself.
pub fn expand_braces(word: &WordNode) -> Vec<WordNode> {
    let pos = word.parts.iter().position(|p| matches!(p, WordPart::BraceExpansion(_)));
    let Some(pos) = pos else {
        return vec![word.clone()];
    };

    let brace = match &word.parts[pos] {
        WordPart::BraceExpansion(b) => b,
        _ => unreachable!(),
    };

    let mut alternatives: Vec<Vec<WordPart>> = Vec::new();
    for item in &brace.items {
        match item {
            BraceItem::Word { word: w } => alternatives.push(w.parts.clone()),
            BraceItem::Range { start, end, step, start_str, end_str } => {
                let start_val = brace_range_value(start);
                let end_val = brace_range_value(end);
                match expand_brace_range(start_val, end_val, *step, start_str.as_deref(), end_str.as_deref()) {
                    Ok(result) => {
                        let values = result.expanded.unwrap_or_else(|| vec![result.literal]);
                        for v in values {
                            alternatives.push(vec![WordPart::Literal(LiteralPart { value: v })]);
                        }
                    }
                    Err(_) => {
                        alternatives.push(vec![WordPart::Literal(LiteralPart {
                            value: format!("{}..{}", start, end),
                        })]);
                    }
                }
            }
        }
    }

    let mut results = Vec::new();
    for alt in alternatives {
        let mut new_parts = word.parts[..pos].to_vec();
        new_parts.extend(alt);
        new_parts.extend(word.parts[pos + 1..].to_vec());
        let candidate = WordNode { parts: new_parts };
        results.extend(expand_braces(&candidate));
    }
    results
}

fn brace_range_value(v: &BraceRangeValue) -> RangeValue {
    match v {
        BraceRangeValue::Number(n) => RangeValue::Numeric(*n),
        BraceRangeValue::Char(c) => RangeValue::Char(*c),
    }
}

fn expand_part(
    state: &mut InterpreterState,
    part: &WordPart,
    in_double_quotes: bool,
    command_subst: Option<&CommandSubstFn>,
) -> String {
    if let Some(literal) = get_literal_value(part) {
        return literal.to_string();
    }

    match part {
        WordPart::SingleQuoted(SingleQuotedPart { value }) => value.clone(),
        WordPart::TildeExpansion(TildeExpansionPart { user }) => {
            if in_double_quotes {
                return match user {
                    Some(u) => format!("~{}", u),
                    None => "~".to_string(),
                };
            }
            let tilde_str = match user {
                Some(u) => format!("~{}", u),
                None => "~".to_string(),
            };
            apply_tilde_expansion(state, &tilde_str)
        }
        WordPart::ParameterExpansion(param) => expand_parameter(state, param, in_double_quotes, command_subst),
        WordPart::DoubleQuoted(DoubleQuotedPart { parts }) => {
            let mut result = String::new();
            for inner in parts {
                result.push_str(&expand_part(state, inner, true, command_subst));
            }
            result
        }
        WordPart::CommandSubstitution(CommandSubstitutionPart { body, .. }) => {
            expand_command_substitution(state, body, command_subst)
        }
        WordPart::ArithmeticExpansion(arith) => {
            let limits = state_limits(state);
            let mut ctx = InterpreterContext::new(state, &limits);
            match evaluate_arithmetic(&mut ctx, &arith.expression.expression, true, None) {
                Ok(value) => value.to_string(),
                Err(_) => "0".to_string(),
            }
        }
        WordPart::Glob(GlobPart { pattern }) => pattern.clone(),
        WordPart::BraceExpansion(_) => {
            // Handled by expand_braces before this point; a stray one (e.g.
            // nested inside a parameter's default word) is expanded literally.
            String::new()
        }
        _ => String::new(),
    }
}

fn state_limits(_state: &InterpreterState) -> ExecutionLimits {
    ExecutionLimits::default()
}

fn expand_command_substitution(
    state: &mut InterpreterState,
    body: &ScriptNode,
    command_subst: Option<&CommandSubstFn>,
) -> String {
    let Some(run) = command_subst else { return String::new() };
    let mut output = run(body, state);
    while output.ends_with('\n') {
        output.pop();
    }
    output
}

fn expand_parameter(
    state: &mut InterpreterState,
    param: &ParameterExpansionPart,
    in_double_quotes: bool,
    command_subst: Option<&CommandSubstFn>,
) -> String {
    let Some(op) = &param.operation else {
        if state.options.nounset && !is_variable_set(state, &param.parameter) {
            state.expansion_exit_code = Some(1);
            state.expansion_stderr = Some(format!("bash: {}: unbound variable\n", param.parameter));
            state.expansion_nounset_var = Some(param.parameter.clone());
        }
        return get_variable(state, &param.parameter);
    };

    match op {
        ParameterOperation::ArrayKeys(ArrayKeysOp { array, star }) => {
            get_array_keys(state, array, *star).join(if *star { "" } else { " " })
        }
        ParameterOperation::VarNamePrefix(VarNamePrefixOp { prefix, star }) => {
            get_var_names_with_prefix_op(state, prefix, *star).join(if *star { "" } else { " " })
        }
        ParameterOperation::Indirection(IndirectionOp { inner_op }) => {
            let target = get_variable(state, &param.parameter);
            match inner_op {
                None => get_variable(state, &target),
                Some(op) => expand_inner_op(state, &target, op, in_double_quotes, command_subst),
            }
        }
        ParameterOperation::Inner(inner) => {
            expand_inner_op(state, &param.parameter, inner, in_double_quotes, command_subst)
        }
    }
}

fn expand_inner_op(
    state: &mut InterpreterState,
    parameter: &str,
    op: &InnerParameterOperation,
    in_double_quotes: bool,
    command_subst: Option<&CommandSubstFn>,
) -> String {
    match op {
        InnerParameterOperation::Length(_) => get_parameter_length(state, parameter).to_string(),
        InnerParameterOperation::LengthSliceError(_) | InnerParameterOperation::BadSubstitution(_) => String::new(),

        InnerParameterOperation::DefaultValue(d) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_default(&ctx, d.check_empty) {
                let mut v = String::new();
                for p in &d.word.parts {
                    v.push_str(&expand_part(state, p, in_double_quotes, command_subst));
                }
                v
            } else {
                ctx.value
            }
        }

        InnerParameterOperation::AssignDefault(d) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_default(&ctx, d.check_empty) {
                let mut v = String::new();
                for p in &d.word.parts {
                    v.push_str(&expand_part(state, p, in_double_quotes, command_subst));
                }
                state.env.insert(parameter.to_string(), v.clone());
                v
            } else {
                ctx.value
            }
        }

        InnerParameterOperation::ErrorIfUnset(d) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_default(&ctx, d.check_empty) {
                let msg = match &d.word {
                    Some(w) => {
                        let mut v = String::new();
                        for p in &w.parts {
                            v.push_str(&expand_part(state, p, in_double_quotes, command_subst));
                        }
                        v
                    }
                    None => "parameter null or not set".to_string(),
                };
                state.expansion_exit_code = Some(1);
                state.expansion_stderr = Some(format!("bash: {}: {}\n", parameter, msg));
                String::new()
            } else {
                ctx.value
            }
        }

        InnerParameterOperation::UseAlternative(d) => {
            let ctx = ParameterOpContext::new(state, parameter, in_double_quotes);
            if should_use_alternative(&ctx, d.check_empty) {
                let mut v = String::new();
                for p in &d.word.parts {
                    v.push_str(&expand_part(state, p, in_double_quotes, command_subst));
                }
                v
            } else {
                String::new()
            }
        }

        InnerParameterOperation::Substring(s) => {
            let value = get_variable(state, parameter);
            let limits = state_limits(state);
            let offset = {
                let mut ctx = InterpreterContext::new(state, &limits);
                evaluate_arithmetic(&mut ctx, &s.offset.expression, true, None).unwrap_or(0)
            };
            let length = s.length.as_ref().map(|l| {
                let mut ctx = InterpreterContext::new(state, &limits);
                evaluate_arithmetic(&mut ctx, &l.expression, true, None).unwrap_or(0)
            });
            apply_substring_op(&value, offset, length).unwrap_or_default()
        }

        InnerParameterOperation::PatternRemoval(p) => {
            let value = get_variable(state, parameter);
            let mut pattern = String::new();
            for part in &p.pattern.parts {
                pattern.push_str(&expand_part(state, part, in_double_quotes, command_subst));
            }
            let regex = pattern_to_regex(&pattern, p.greedy, state.shopt_options.extglob);
            let side = match p.side {
                crate::ast::types::PatternRemovalSide::Prefix => {
                    crate::interpreter::expansion::pattern_removal::PatternRemovalSide::Prefix
                }
                crate::ast::types::PatternRemovalSide::Suffix => {
                    crate::interpreter::expansion::pattern_removal::PatternRemovalSide::Suffix
                }
            };
            apply_pattern_removal_op(&value, &regex, side, p.greedy)
        }

        InnerParameterOperation::PatternReplacement(p) => {
            let value = get_variable(state, parameter);
            let mut pattern = String::new();
            for part in &p.pattern.parts {
                pattern.push_str(&expand_part(state, part, in_double_quotes, command_subst));
            }
            let replacement = match &p.replacement {
                Some(w) => {
                    let mut v = String::new();
                    for part in &w.parts {
                        v.push_str(&expand_part(state, part, in_double_quotes, command_subst));
                    }
                    v
                }
                None => String::new(),
            };
            let regex = pattern_to_regex(&pattern, true, state.shopt_options.extglob);
            let anchor_start = matches!(p.anchor, Some(crate::ast::types::PatternAnchor::Start));
            let anchor_end = matches!(p.anchor, Some(crate::ast::types::PatternAnchor::End));
            apply_pattern_replacement_op(&value, &regex, &replacement, p.all, anchor_start, anchor_end)
        }

        InnerParameterOperation::CaseModification(c) => {
            let value = get_variable(state, parameter);
            let op_str = match (c.direction, c.all) {
                (crate::ast::types::CaseDirection::Upper, true) => "U",
                (crate::ast::types::CaseDirection::Upper, false) => "u",
                (crate::ast::types::CaseDirection::Lower, true) => "L",
                (crate::ast::types::CaseDirection::Lower, false) => "l",
            };
            apply_case_modification(&value, op_str)
        }

        InnerParameterOperation::Transform(t) => {
            let value = get_variable(state, parameter);
            let op_str = match t.operator {
                crate::ast::types::TransformOperator::Q => "Q",
                crate::ast::types::TransformOperator::P => "P",
                crate::ast::types::TransformOperator::A => "a",
                crate::ast::types::TransformOperator::LowerA => "a",
                crate::ast::types::TransformOperator::LowerU => "u",
                crate::ast::types::TransformOperator::U => "U",
                crate::ast::types::TransformOperator::L => "L",
                crate::ast::types::TransformOperator::E
                | crate::ast::types::TransformOperator::K
                | crate::ast::types::TransformOperator::LowerK => "",
            };
            apply_transform_op(state, parameter, &value, op_str)
        }
    }
}

/// Check if a word is "fully quoted" - meaning glob characters should be treated literally.
///
/// A word is fully quoted if all its parts are either:
/// - SingleQuoted
/// - DoubleQuoted (entirely quoted variable expansion like "$pat")
/// - Escaped characters
pub fn is_word_fully_quoted(word: &WordNode) -> bool {
    if word.parts.is_empty() {
        return true;
    }
    for part in &word.parts {
        if !is_quoted_part(part) {
            return false;
        }
    }
    true
}

/// Check if a word contains any glob patterns.
pub fn word_has_glob_pattern(word: &WordNode, extglob: bool) -> bool {
    use crate::interpreter::expansion::glob_escape::has_glob_pattern;

    for part in &word.parts {
        match part {
            WordPart::Glob(_) => return true,
            WordPart::Literal(lit) => {
                if has_glob_pattern(&lit.value, extglob) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Check if a word contains command substitution.
pub fn word_has_command_substitution(word: &WordNode) -> bool {
    for part in &word.parts {
        if matches!(part, WordPart::CommandSubstitution(_)) {
            return true;
        }
        if let WordPart::DoubleQuoted(dq) = part {
            for inner in &dq.parts {
                if matches!(inner, WordPart::CommandSubstitution(_)) {
                    return true;
                }
            }
        }
    }
    false
}

/// Convert an expansion-time interpreter error (e.g. `${VAR?msg}`) picked up
/// via `state.expansion_exit_code`/`expansion_stderr` into an `ExecResult`,
/// clearing the pending error from state.
pub fn take_expansion_error(state: &mut InterpreterState) -> Option<(i32, String)> {
    let code = state.expansion_exit_code.take()?;
    let msg = state.expansion_stderr.take().unwrap_or_default();
    Some((code, msg))
}

/// Take a pending `set -u` violation recorded during the last expansion, if
/// any, clearing it and the generic expansion-error fields it shares with
/// `take_expansion_error`.
pub fn take_nounset_error(state: &mut InterpreterState) -> Option<InterpreterError> {
    let var_name = state.expansion_nounset_var.take()?;
    let stdout = String::new();
    state.expansion_exit_code = None;
    state.expansion_stderr = None;
    Some(InterpreterError::Nounset(crate::interpreter::errors::NounsetError::new(var_name, stdout)))
}

/// Convenience used by callers that want a typed unwind instead of an
/// `ExecResult` for a pending expansion error.
pub fn expansion_error_to_interpreter_error(code: i32, msg: String) -> InterpreterError {
    InterpreterError::Errexit(crate::interpreter::errors::ErrexitError::new(code, String::new(), msg))
}

// ============================================================================
// Tests
// ============================================================================
