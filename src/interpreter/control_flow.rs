//! Control Flow Execution
//!
//! Handles control flow constructs:
//! - if/elif/else
//! - for loops
//! - C-style for loops
//! - while loops
//! - until loops
//! - case statements
//! - break/continue

use regex_lite::Regex;

use crate::ast::types::StatementNode;
use crate::interpreter::errors::{BreakError, ContinueError, ControlFlowError, ExecutionLimitError, InterpreterError, LimitType};
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::types::{ExecResult, InterpreterState};

/// Result type shared by the loop/conditional executors below; identical in
/// shape to `ExecResult` since callers just fold it back into one.
pub type ForResult = ExecResult;

/// Run a list of statements that make up an if/while/until condition,
/// returning the exit status of the last one executed (bash semantics: the
/// condition is a command list, and only its final exit code matters).
fn run_condition_list<C>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    exec_condition: &mut C,
) -> Result<ConditionResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    for stmt in condition {
        let res = exec_condition(state, stmt)?;
        stdout.push_str(&res.stdout);
        stderr.push_str(&res.stderr);
        exit_code = res.exit_code;
    }
    Ok(ConditionResult { stdout, stderr, exit_code })
}

/// Execute an if/elif/else chain. `clauses` is a list of (condition, body)
/// pairs; the body of the first clause whose condition is true (exit code 0)
/// runs. If none match, `else_body` runs when present.
pub fn execute_if<C, B>(
    state: &mut InterpreterState,
    clauses: &[(Vec<&StatementNode>, Vec<&StatementNode>)],
    else_body: Option<&[&StatementNode]>,
    mut exec_condition: C,
    mut exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();

    for (condition, body) in clauses {
        let cond_result = run_condition_list(state, condition, &mut exec_condition)?;
        stdout.push_str(&cond_result.stdout);
        stderr.push_str(&cond_result.stderr);

        if cond_result.exit_code == 0 {
            let mut exit_code = 0;
            for stmt in body {
                let res = exec_body(state, stmt)?;
                stdout.push_str(&res.stdout);
                stderr.push_str(&res.stderr);
                exit_code = res.exit_code;
            }
            return Ok(ExecResult::new(stdout, stderr, exit_code));
        }
    }

    if let Some(else_stmts) = else_body {
        let mut exit_code = 0;
        for stmt in else_stmts {
            let res = exec_body(state, stmt)?;
            stdout.push_str(&res.stdout);
            stderr.push_str(&res.stderr);
            exit_code = res.exit_code;
        }
        return Ok(ExecResult::new(stdout, stderr, exit_code));
    }

    Ok(ExecResult::new(stdout, stderr, 0))
}

/// Execute a `for name in words; do body; done` loop.
pub fn execute_for<B>(
    state: &mut InterpreterState,
    variable: &str,
    words: &[String],
    body: &[&StatementNode],
    max_iterations: u64,
    mut exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let mut iterations: u64 = 0;

    state.loop_depth += 1;

    for word in words {
        state.env.insert(variable.to_string(), word.clone());

        let mut continued = false;
        for stmt in body {
            iterations += 1;
            if iterations > max_iterations {
                state.loop_depth -= 1;
                return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                    format!("maximum loop iterations ({}) exceeded", max_iterations),
                    LimitType::Iterations,
                )));
            }

            match exec_body(state, stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    exit_code = res.exit_code;
                }
                Err(InterpreterError::Break(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    state.loop_depth -= 1;
                    if e.levels > 1 {
                        return Err(InterpreterError::Break(BreakError::new(
                            e.levels - 1,
                            e.stdout,
                            e.stderr,
                        )));
                    }
                    return Ok(ExecResult::new(e.stdout, e.stderr, exit_code));
                }
                Err(InterpreterError::Continue(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    if e.levels > 1 {
                        state.loop_depth -= 1;
                        return Err(InterpreterError::Continue(ContinueError::new(
                            e.levels - 1,
                            e.stdout,
                            e.stderr,
                        )));
                    }
                    continued = true;
                    break;
                }
                Err(other) => {
                    state.loop_depth -= 1;
                    return Err(other);
                }
            }
        }
        let _ = continued;
    }

    state.loop_depth -= 1;
    Ok(ExecResult::new(stdout, stderr, exit_code))
}

/// Shared implementation for `while`/`until`; `invert` flips the condition
/// exit-code test so `until` can reuse the same loop machinery.
fn run_conditional_loop<C, B>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    invert: bool,
    mut exec_condition: C,
    mut exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let mut iterations: u64 = 0;

    state.loop_depth += 1;

    loop {
        let cond_result = run_condition_list(state, condition, &mut exec_condition).map_err(|e| {
            state.loop_depth -= 1;
            e
        })?;
        stdout.push_str(&cond_result.stdout);
        stderr.push_str(&cond_result.stderr);

        let keep_going = if invert {
            cond_result.exit_code != 0
        } else {
            cond_result.exit_code == 0
        };
        if !keep_going {
            break;
        }

        for stmt in body {
            iterations += 1;
            if iterations > max_iterations {
                state.loop_depth -= 1;
                return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                    format!("maximum loop iterations ({}) exceeded", max_iterations),
                    LimitType::Iterations,
                )));
            }

            match exec_body(state, stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    exit_code = res.exit_code;
                }
                Err(InterpreterError::Break(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    state.loop_depth -= 1;
                    if e.levels > 1 {
                        return Err(InterpreterError::Break(BreakError::new(
                            e.levels - 1,
                            e.stdout,
                            e.stderr,
                        )));
                    }
                    return Ok(ExecResult::new(e.stdout, e.stderr, exit_code));
                }
                Err(InterpreterError::Continue(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    if e.levels > 1 {
                        state.loop_depth -= 1;
                        return Err(InterpreterError::Continue(ContinueError::new(
                            e.levels - 1,
                            e.stdout,
                            e.stderr,
                        )));
                    }
                    break;
                }
                Err(other) => {
                    state.loop_depth -= 1;
                    return Err(other);
                }
            }
        }
    }

    state.loop_depth -= 1;
    Ok(ExecResult::new(stdout, stderr, exit_code))
}

/// Execute a `while condition; do body; done` loop.
pub fn execute_while<C, B>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    exec_condition: C,
    exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    run_conditional_loop(state, condition, body, max_iterations, false, exec_condition, exec_body)
}

/// Execute an `until condition; do body; done` loop.
pub fn execute_until<C, B>(
    state: &mut InterpreterState,
    condition: &[&StatementNode],
    body: &[&StatementNode],
    max_iterations: u64,
    exec_condition: C,
    exec_body: B,
) -> Result<ForResult, InterpreterError>
where
    C: FnMut(&mut InterpreterState, &StatementNode) -> Result<ConditionResult, InterpreterError>,
    B: FnMut(&mut InterpreterState, &StatementNode) -> Result<ExecResult, InterpreterError>,
{
    run_conditional_loop(state, condition, body, max_iterations, true, exec_condition, exec_body)
}

/// Validate that a variable name is a valid identifier.
/// Returns true if valid, false otherwise.
pub fn is_valid_identifier(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
    re.is_match(name)
}

/// Case statement terminator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTerminator {
    /// ;; - stop, no fall-through
    Break,
    /// ;& - unconditional fall-through (execute next body without pattern check)
    FallThrough,
    /// ;;& - continue pattern matching (check next case patterns)
    ContinueMatching,
}

impl CaseTerminator {
    /// Parse a terminator string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ";;" => Some(CaseTerminator::Break),
            ";&" => Some(CaseTerminator::FallThrough),
            ";;&" => Some(CaseTerminator::ContinueMatching),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseTerminator::Break => ";;",
            CaseTerminator::FallThrough => ";&",
            CaseTerminator::ContinueMatching => ";;&",
        }
    }
}
