//! Execution Engine
//!
//! The core execution engine that ties all interpreter components together.
//! Implements the full AST execution chain:
//!
//! execute_script -> execute_statement -> execute_pipeline -> execute_command

use std::sync::Arc;

use crate::ast::types::{
    CommandNode, CompoundCommandNode, PipelineNode, ScriptNode, SimpleCommandNode, StatementNode,
    StatementOperator, WordNode,
};
use crate::commands::{CommandContext, CommandRegistry};
use crate::fs::FileSystem as AsyncFileSystem;
use crate::interpreter::builtins::{
    handle_break, handle_cd, handle_compgen, handle_complete, handle_compopt, handle_continue,
    handle_declare, handle_dirs, handle_exit, handle_export, handle_getopts, handle_hash,
    handle_help, handle_let, handle_local, handle_mapfile, handle_popd, handle_pushd,
    handle_read, handle_readonly, handle_return, handle_set, handle_shift, handle_shopt,
    handle_unset,
};
use crate::interpreter::conditional_eval::evaluate_conditional;
use crate::interpreter::control_flow::{execute_for, execute_if, execute_while, execute_until, ForResult};
use crate::interpreter::errors::{
    ControlFlowError, ErrexitError, ExecutionLimitError, ExitError, InterpreterError, LimitType,
};
use crate::interpreter::functions::{call_function, execute_function_def};
use crate::interpreter::helpers::condition::ConditionResult;
use crate::interpreter::interpreter::{
    build_exported_env, check_command_limit, should_trigger_errexit, update_exit_code,
    FileSystem as SyncFileSystem,
};
use crate::interpreter::pipeline_execution::{execute_pipeline, PipelineOptions, PipelineState, set_pipestatus};
use crate::interpreter::redirections::apply_redirections;
use crate::interpreter::subshell_group::{execute_group, execute_subshell};
use crate::interpreter::test_eval::evaluate_test;
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterState};
use crate::interpreter::word_expansion::{expand_word, expand_word_with_glob, CommandSubstFn};

/// The execution engine that ties all interpreter components together.
pub struct ExecutionEngine<'a> {
    /// Execution limits (max commands, recursion depth, iterations)
    pub limits: &'a ExecutionLimits,
    /// Sync filesystem interface, used by word/glob expansion and builtins.
    pub fs: &'a dyn SyncFileSystem,
    /// Async filesystem backing `fs`, handed to external `Command` impls.
    pub async_fs: Arc<dyn AsyncFileSystem>,
    /// Tokio handle used to bridge external async commands into this
    /// otherwise-synchronous execution engine.
    pub handle: tokio::runtime::Handle,
    /// External (non-builtin) commands the sandbox ships.
    pub registry: CommandRegistry,
}

impl<'a> ExecutionEngine<'a> {
    /// Create a new execution engine.
    pub fn new(
        limits: &'a ExecutionLimits,
        fs: &'a dyn SyncFileSystem,
        async_fs: Arc<dyn AsyncFileSystem>,
        handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            limits,
            fs,
            async_fs,
            handle,
            registry: CommandRegistry::with_default_commands(),
        }
    }

    /// Run an external command registered in `self.registry` synchronously,
    /// bridging into the async `Command` trait the way `SyncFsAdapter`
    /// bridges filesystem calls.
    fn run_external_command(
        &self,
        state: &InterpreterState,
        name: &str,
        args: &[String],
        stdin: &str,
    ) -> Option<ExecResult> {
        let command = self.registry.get(name)?;
        tracing::trace!(command = name, "dispatching external command");
        let ctx = CommandContext {
            args: args.to_vec(),
            stdin: stdin.to_string(),
            cwd: state.cwd.clone(),
            env: build_exported_env(state),
            fs: self.async_fs.clone(),
            exec_fn: None,
            fetch_fn: None,
        };
        let result = tokio::task::block_in_place(|| self.handle.block_on(command.execute(ctx)));
        Some(ExecResult::new(result.stdout, result.stderr, result.exit_code))
    }

    /// Execute a complete script (list of statements).
    pub fn execute_script(
        &self,
        state: &mut InterpreterState,
        ast: &ScriptNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for statement in &ast.statements {
            match self.execute_statement(state, statement) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                    update_exit_code(state, exit_code);
                }
                Err(InterpreterError::Exit(e)) => {
                    // ExitError propagates up to terminate the script
                    let mut err = e;
                    err.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Exit(err));
                }
                Err(InterpreterError::ExecutionLimit(e)) => {
                    // ExecutionLimitError must always propagate
                    return Err(InterpreterError::ExecutionLimit(e));
                }
                Err(InterpreterError::Errexit(e)) => {
                    // Errexit terminates the script
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    exit_code = e.exit_code;
                    return Ok(ExecResult::new(stdout, stderr, exit_code));
                }
                Err(InterpreterError::Nounset(e)) => {
                    // set -u unbound variable terminates the script
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    return Ok(ExecResult::new(stdout, stderr, 1));
                }
                Err(InterpreterError::Break(mut e)) => {
                    // Break/continue outside loops - silently continue
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Return(mut e)) => {
                    // Return outside function - propagate
                    e.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Return(e));
                }
                Err(e) => {
                    // Other errors - convert to result
                    stderr.push_str(&format!("{}\n", e));
                    exit_code = 1;
                }
            }
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a single statement (list of pipelines with && || operators).
    pub fn execute_statement(
        &self,
        state: &mut InterpreterState,
        stmt: &StatementNode,
    ) -> Result<ExecResult, InterpreterError> {
        // Handle deferred syntax errors
        if let Some(ref err) = stmt.deferred_error {
            return Ok(ExecResult::new(
                String::new(),
                format!("bash: syntax error near unexpected token `{}'\n", err.token),
                2,
            ));
        }

        // noexec mode (set -n): parse but don't execute
        if state.options.noexec {
            return Ok(ExecResult::ok());
        }

        // Reset errexit_safe at start of each statement
        state.errexit_safe = Some(false);

        let mut stdout = String::new();
        let mut stderr = String::new();

        // verbose mode (set -v): print source before execution
        if state.options.verbose {
            if let Some(ref source) = stmt.source_text {
                stderr.push_str(source);
                stderr.push('\n');
            }
        }

        let mut exit_code = 0;
        let mut last_executed_index: i32 = -1;
        let mut last_pipeline_negated = false;

        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            // Check && / || short-circuit
            if i > 0 {
                let op = &stmt.operators[i - 1];
                match op {
                    StatementOperator::And => {
                        if exit_code != 0 {
                            continue;
                        }
                    }
                    StatementOperator::Or => {
                        if exit_code == 0 {
                            continue;
                        }
                    }
                    StatementOperator::Semi => {
                        // Always execute
                    }
                }
            }

            let result = self.execute_pipeline_node(state, pipeline)?;
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            exit_code = result.exit_code;
            last_executed_index = i as i32;
            last_pipeline_negated = pipeline.negated;

            update_exit_code(state, exit_code);
        }

        // Check errexit
        let was_short_circuited = last_executed_index < (stmt.pipelines.len() as i32 - 1);
        let inner_was_safe = state.errexit_safe.unwrap_or(false);

        if should_trigger_errexit(state, exit_code, was_short_circuited, last_pipeline_negated)
            && !inner_was_safe
        {
            return Err(InterpreterError::Errexit(ErrexitError::new(
                exit_code, stdout, stderr,
            )));
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a pipeline (list of commands connected by |).
    pub fn execute_pipeline_node(
        &self,
        state: &mut InterpreterState,
        pipeline: &PipelineNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut pipe_state = PipelineState::new();
        let pipe_stderr = pipeline.pipe_stderr.clone().unwrap_or_default();

        let options = PipelineOptions {
            pipefail: state.options.pipefail,
            lastpipe: state.shopt_options.lastpipe,
            runs_in_subshell: false,
            time_pipeline: pipeline.timed,
            time_posix_format: pipeline.time_posix,
        };

        // We need to pass state through the closure, but execute_pipeline
        // takes ownership of the closure. Use a RefCell pattern.
        use std::cell::RefCell;
        let state_cell = RefCell::new(state);

        let result = execute_pipeline(
            &mut pipe_state,
            &pipeline.commands,
            &pipe_stderr,
            &options,
            |cmd, stdin| {
                let state = &mut *state_cell.borrow_mut();
                self.execute_command(state, cmd, stdin)
            },
        )?;

        // Get state back
        let state = state_cell.into_inner();

        // Set PIPESTATUS
        set_pipestatus(&mut state.env, &result.exit_codes);

        let mut exec_result = result.to_exec_result();

        // Handle negation
        if pipeline.negated {
            exec_result.exit_code = if exec_result.exit_code == 0 { 1 } else { 0 };
        }

        Ok(exec_result)
    }

    /// Execute a single command.
    pub fn execute_command(
        &self,
        state: &mut InterpreterState,
        cmd: &CommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Check command limit
        if let Some(msg) = check_command_limit(state, self.limits) {
            return Err(InterpreterError::ExecutionLimit(
                crate::interpreter::errors::ExecutionLimitError::simple(
                    msg,
                    crate::interpreter::errors::LimitType::Commands,
                ),
            ));
        }

        match cmd {
            CommandNode::Simple(simple) => self.execute_simple_command(state, simple, stdin),
            CommandNode::Compound(compound) => {
                self.execute_compound_command(state, compound, stdin)
            }
            CommandNode::FunctionDef(func_def) => {
                let current_source = state.current_source.clone();
                execute_function_def(state, func_def, current_source.as_deref())
                    .map_err(InterpreterError::Exit)
            }
        }
    }

    /// Execute a simple command (name + args + redirections).
    ///
    /// Resolution order: assignments, then (if a command name is present)
    /// control-flow and other builtins, user-defined functions, external
    /// commands from the registry, and finally "command not found".
    pub fn execute_simple_command(
        &self,
        state: &mut InterpreterState,
        cmd: &SimpleCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Set line number for $LINENO
        if let Some(line) = cmd.line {
            state.current_line = line as u32;
        }

        let command_subst = |script: &ScriptNode, state: &mut InterpreterState| -> String {
            let result = match self.execute_script(state, script) {
                Ok(res) => res,
                Err(InterpreterError::Exit(e)) => ExecResult::new(e.stdout, e.stderr, e.exit_code),
                Err(_) => return String::new(),
            };
            result.stdout.trim_end_matches('\n').to_string()
        };

        let expand_word_fn = |state: &mut InterpreterState, word: &WordNode| -> String {
            expand_word_with_glob(state, self.fs, word, Some(&command_subst)).value
        };

        let assignments = crate::interpreter::simple_command_assignments::process_assignments(
            state,
            cmd,
            &expand_word_fn,
        );
        if let Some(err) = crate::interpreter::word_expansion::take_nounset_error(state) {
            return Err(err);
        }
        if let Some(error) = assignments.error {
            return Ok(error);
        }

        let cmd_name = match &cmd.name {
            Some(word) => expand_word(state, word, Some(&command_subst)).value,
            None => {
                // Assignment-only command (e.g. `FOO=bar`): assignments were
                // already applied permanently above.
                return Ok(ExecResult::new(String::new(), assignments.xtrace_output, 0));
            }
        };
        if let Some(err) = crate::interpreter::word_expansion::take_nounset_error(state) {
            return Err(err);
        }

        let mut args: Vec<String> = Vec::new();
        for arg in &cmd.args {
            let result = expand_word_with_glob(state, self.fs, arg, Some(&command_subst));
            if let Some(words) = result.split_words {
                args.extend(words);
            } else {
                args.push(result.value);
            }
            if let Some(err) = crate::interpreter::word_expansion::take_nounset_error(state) {
                return Err(err);
            }
        }

        let result = self.dispatch_command(state, &cmd_name, &args, stdin);

        // Prefix assignments (`FOO=bar cmd`) are only visible to `cmd`.
        for (key, previous) in assignments.temp_assignments {
            match previous {
                Some(value) => {
                    state.env.insert(key, value);
                }
                None => {
                    state.env.remove(&key);
                }
            }
        }

        let result = result?;
        Ok(apply_redirections(
            state,
            self.fs,
            result,
            &cmd.redirections,
            None,
            &expand_word_fn,
        ))
    }

    /// Dispatch a command by name once its name and arguments have been
    /// expanded, in resolution order: special builtins, then user-defined
    /// functions, then non-special builtins, then the external command
    /// registry.
    fn dispatch_command(
        &self,
        state: &mut InterpreterState,
        cmd_name: &str,
        args: &[String],
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Special builtins (POSIX): found before functions, never shadowed by
        // a user-defined function of the same name.
        match cmd_name {
            "" => return Ok(ExecResult::ok()),
            ":" => return Ok(ExecResult::ok()),
            "break" => {
                let res = handle_break(state, args)?;
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "continue" => {
                let res = handle_continue(state, args)?;
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "return" => {
                let res = handle_return(state, args)?;
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "exit" => {
                handle_exit(state, args)?;
                unreachable!("handle_exit always returns Err")
            }
            "export" => {
                let res = handle_export(state, args);
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "unset" => return Ok(handle_unset(state, args)),
            "set" => {
                let res = handle_set(state, args)?;
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "shift" => {
                let res = handle_shift(state, args)?;
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "readonly" => {
                let res = handle_readonly(state, args);
                return Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code));
            }
            "eval" => {
                use crate::interpreter::builtins::eval_cmd::{
                    eval_parse_error, handle_eval_parse, prepare_eval_stdin, restore_eval_stdin,
                };

                let cmd = match handle_eval_parse(args) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => return Ok(ExecResult::ok()),
                    Err((stdout, stderr, exit_code)) => return Ok(ExecResult::new(stdout, stderr, exit_code)),
                };

                let saved_group_stdin = prepare_eval_stdin(state, Some(stdin));
                let ast = match crate::parser::parse(&cmd.command) {
                    Ok(ast) => ast,
                    Err(e) => {
                        restore_eval_stdin(state, saved_group_stdin);
                        return Ok(eval_parse_error(&e.to_string()));
                    }
                };
                let result = self.execute_script(state, &ast);
                restore_eval_stdin(state, saved_group_stdin);
                return match result {
                    Ok(res) => Ok(res),
                    Err(InterpreterError::Exit(e)) => Ok(ExecResult::new(e.stdout, e.stderr, e.exit_code)),
                    Err(other) => Err(other),
                };
            }
            "source" | "." => {
                use crate::interpreter::builtins::source_cmd::{
                    handle_source_parse, prepare_source_state, resolve_source_paths,
                    restore_source_state, source_file_not_found,
                };

                let cmd = match handle_source_parse(args) {
                    Ok(cmd) => cmd,
                    Err((stdout, stderr, exit_code)) => return Ok(ExecResult::new(stdout, stderr, exit_code)),
                };

                let path_env = state.env.get("PATH").cloned();
                let candidates = resolve_source_paths(&state.cwd, &cmd.filename, path_env.as_deref());
                let content = candidates.iter().find_map(|p| self.fs.read_file(p).ok());
                let content = match content {
                    Some(c) => c,
                    None => return Ok(source_file_not_found(&cmd.filename)),
                };

                let ast = match crate::parser::parse(&content) {
                    Ok(ast) => ast,
                    Err(e) => return Ok(ExecResult::new(String::new(), format!("bash: {}: {}\n", cmd.filename, e), 2)),
                };

                let saved = prepare_source_state(state, &cmd);
                let result = self.execute_script(state, &ast);
                restore_source_state(state, saved);
                return match result {
                    Ok(res) => Ok(res),
                    Err(InterpreterError::Exit(e)) => Ok(ExecResult::new(e.stdout, e.stderr, e.exit_code)),
                    Err(other) => Err(other),
                };
            }
            _ => {}
        }

        // A user-defined function shadows every non-special builtin and the
        // external command registry, but never a special builtin above.
        if let Some(func) = state.functions.get(cmd_name).cloned() {
            let call_line = Some(state.current_line);
            let max_call_depth = self.limits.max_recursion_depth;
            return call_function(
                state,
                &func,
                args,
                stdin,
                call_line,
                max_call_depth,
                |state, stdin| self.execute_compound_command(state, &func.body, stdin),
            );
        }

        match cmd_name {
            "true" => Ok(ExecResult::ok()),
            "false" => Ok(ExecResult::new(String::new(), String::new(), 1)),
            "cd" => Ok(handle_cd(state, args)),
            "pwd" => Ok(ExecResult::new(format!("{}\n", state.cwd), String::new(), 0)),
            "local" => Ok(handle_local(state, args)),
            "shopt" => {
                let res = handle_shopt(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "let" => {
                let (stdout, stderr, exit_code) = handle_let(state, args);
                Ok(ExecResult::new(stdout, stderr, exit_code))
            }
            "declare" | "typeset" => {
                let res = handle_declare(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "read" => {
                let res = handle_read(state, args, stdin, -1);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "hash" => {
                let res = handle_hash(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "help" => {
                let res = handle_help(args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "getopts" => {
                let res = handle_getopts(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "mapfile" | "readarray" => {
                let res = handle_mapfile(state, args, stdin);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "pushd" => {
                let res = handle_pushd(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "popd" => {
                let res = handle_popd(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "dirs" => {
                let res = handle_dirs(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "compgen" => {
                let res = handle_compgen(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "complete" => {
                let res = handle_complete(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "compopt" => {
                let res = handle_compopt(state, args);
                Ok(ExecResult::new(res.stdout, res.stderr, res.exit_code))
            }
            "type" => {
                use crate::interpreter::type_command::{handle_type, TypeCommandContext};

                let ctx = TypeCommandContext { state: &*state };
                let find_first_in_path = |name: &str| {
                    if self.registry.contains(name) {
                        Some(format!("/usr/bin/{}", name))
                    } else {
                        None
                    }
                };
                let find_all_in_path = |name: &str| {
                    if self.registry.contains(name) {
                        vec![format!("/usr/bin/{}", name)]
                    } else {
                        Vec::new()
                    }
                };
                Ok(handle_type(&ctx, args, find_first_in_path, find_all_in_path))
            }
            "command" => {
                use crate::interpreter::type_command::{handle_command_v, TypeCommandContext};

                let mut show_path = false;
                let mut verbose = false;
                let mut rest = args;
                while let Some(first) = rest.first() {
                    match first.as_str() {
                        "-v" => {
                            show_path = true;
                            rest = &rest[1..];
                        }
                        "-V" => {
                            verbose = true;
                            rest = &rest[1..];
                        }
                        _ => break,
                    }
                }

                if show_path || verbose {
                    let ctx = TypeCommandContext { state: &*state };
                    Ok(handle_command_v(&ctx, rest, show_path, verbose))
                } else if let Some((name, cmd_args)) = rest.split_first() {
                    if let Some(result) = self.run_external_command(state, name, cmd_args, stdin) {
                        Ok(result)
                    } else {
                        self.dispatch_command(state, name, cmd_args, stdin)
                    }
                } else {
                    Ok(ExecResult::ok())
                }
            }
            "test" | "[" => {
                let test_args: &[String] = if cmd_name == "[" {
                    match args.split_last() {
                        Some((last, rest)) if last == "]" => rest,
                        _ => args,
                    }
                } else {
                    args
                };
                match evaluate_test(self.fs, test_args) {
                    Ok(true) => Ok(ExecResult::ok()),
                    Ok(false) => Ok(ExecResult::new(String::new(), String::new(), 1)),
                    Err(msg) => Ok(ExecResult::new(String::new(), format!("bash: {}", msg), 2)),
                }
            }
            _ => {
                if let Some(result) = self.run_external_command(state, cmd_name, args, stdin) {
                    return Ok(result);
                }

                Ok(ExecResult::new(
                    String::new(),
                    format!("bash: {}: command not found\n", cmd_name),
                    127,
                ))
            }
        }
    }

    /// Execute a compound command (if, for, while, etc.).
    pub fn execute_compound_command(
        &self,
        state: &mut InterpreterState,
        compound: &CompoundCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        match compound {
            CompoundCommandNode::If(if_node) => {
                // Build clauses for execute_if
                let clauses: Vec<(Vec<&StatementNode>, Vec<&StatementNode>)> = if_node
                    .clauses
                    .iter()
                    .map(|c| {
                        (
                            c.condition.iter().collect(),
                            c.body.iter().collect(),
                        )
                    })
                    .collect();

                let else_body: Option<Vec<&StatementNode>> =
                    if_node.else_body.as_ref().map(|b| b.iter().collect());

                let result = execute_if(
                    state,
                    &clauses,
                    else_body.as_deref(),
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::For(for_node) => {
                // Expand words
                let mut words: Vec<String> = Vec::new();
                if let Some(ref word_list) = for_node.words {
                    let command_subst = |script: &ScriptNode, state: &mut InterpreterState| {
                        match self.execute_script(state, script) {
                            Ok(res) => res.stdout.trim_end_matches('\n').to_string(),
                            Err(InterpreterError::Exit(e)) => e.stdout.trim_end_matches('\n').to_string(),
                            Err(_) => String::new(),
                        }
                    };
                    for word in word_list {
                        let result = expand_word_with_glob(state, self.fs, word, Some(&command_subst));
                        if let Some(split) = result.split_words {
                            words.extend(split);
                        } else {
                            words.push(result.value);
                        }
                        if let Some(err) = crate::interpreter::word_expansion::take_nounset_error(state) {
                            return Err(err);
                        }
                    }
                } else {
                    // Default to positional parameters
                    let argc: usize = state.env.get("#")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    for i in 1..=argc {
                        if let Some(val) = state.env.get(&i.to_string()) {
                            words.push(val.clone());
                        }
                    }
                }

                let body: Vec<&StatementNode> = for_node.body.iter().collect();

                let result = execute_for(
                    state,
                    &for_node.variable,
                    &words,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::While(while_node) => {
                let condition: Vec<&StatementNode> = while_node.condition.iter().collect();
                let body: Vec<&StatementNode> = while_node.body.iter().collect();

                let result = execute_while(
                    state,
                    &condition,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::Until(until_node) => {
                let condition: Vec<&StatementNode> = until_node.condition.iter().collect();
                let body: Vec<&StatementNode> = until_node.body.iter().collect();

                let result = execute_until(
                    state,
                    &condition,
                    &body,
                    self.limits.max_iterations,
                    |state, stmt| {
                        let res = self.execute_statement(state, stmt)?;
                        Ok(ConditionResult {
                            stdout: res.stdout,
                            stderr: res.stderr,
                            exit_code: res.exit_code,
                        })
                    },
                    |state, stmt| self.execute_statement(state, stmt),
                )?;

                Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
            }

            CompoundCommandNode::Case(case_node) => {
                use crate::ast::types::CaseTerminator;
                use crate::interpreter::conditionals::match_pattern;

                let command_subst = |script: &ScriptNode, state: &mut InterpreterState| -> String {
                    match self.execute_script(state, script) {
                        Ok(res) => res.stdout.trim_end_matches('\n').to_string(),
                        Err(InterpreterError::Exit(e)) => e.stdout.trim_end_matches('\n').to_string(),
                        Err(_) => String::new(),
                    }
                };
                let word = expand_word(state, &case_node.word, Some(&command_subst)).value;
                if let Some(err) = crate::interpreter::word_expansion::take_nounset_error(state) {
                    return Err(err);
                }
                let nocasematch = state.shopt_options.nocasematch;
                let extglob = state.shopt_options.extglob;

                let mut stdout = String::new();
                let mut stderr = String::new();
                let mut exit_code = 0;
                let mut item_index = 0;
                let mut fallthrough = false;

                while item_index < case_node.items.len() {
                    let item = &case_node.items[item_index];
                    let matches = fallthrough
                        || item
                            .patterns
                            .iter()
                            .any(|p| match_pattern(&word, &expand_word(state, p, Some(&command_subst)).value, nocasematch, extglob));

                    if matches {
                        for stmt in &item.body {
                            let res = self.execute_statement(state, stmt)?;
                            stdout.push_str(&res.stdout);
                            stderr.push_str(&res.stderr);
                            exit_code = res.exit_code;
                        }
                        match item.terminator {
                            CaseTerminator::DoubleSemi => break,
                            CaseTerminator::SemiAnd => {
                                fallthrough = true;
                                item_index += 1;
                                continue;
                            }
                            CaseTerminator::SemiSemiAnd => {
                                fallthrough = false;
                                item_index += 1;
                                continue;
                            }
                        }
                    }
                    item_index += 1;
                }

                Ok(ExecResult::new(stdout, stderr, exit_code))
            }

            CompoundCommandNode::Subshell(subshell_node) => {
                execute_subshell(
                    state,
                    &subshell_node.body,
                    Some(stdin),
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::Group(group_node) => {
                execute_group(
                    state,
                    &group_node.body,
                    Some(stdin),
                    |state, stmt| self.execute_statement(state, stmt),
                )
            }

            CompoundCommandNode::ArithmeticCommand(arith) => {
                use crate::interpreter::arithmetic::evaluate_arithmetic;
                use crate::interpreter::types::InterpreterContext;

                let mut ctx = InterpreterContext::new(state, self.limits);
                match evaluate_arithmetic(&mut ctx, &arith.expression.expression, false, None) {
                    Ok(value) => {
                        // Arithmetic command: exit 0 if non-zero, exit 1 if zero
                        let exit_code = if value != 0 { 0 } else { 1 };
                        Ok(ExecResult::new(String::new(), String::new(), exit_code))
                    }
                    Err(e) => {
                        Ok(ExecResult::new(
                            String::new(),
                            format!("bash: {}\n", e),
                            1,
                        ))
                    }
                }
            }

            CompoundCommandNode::ConditionalCommand(cond) => {
                let outcome = evaluate_conditional(state, self.fs, &cond.expression);
                if let Some(err) = crate::interpreter::word_expansion::take_nounset_error(state) {
                    return Err(err);
                }
                match outcome {
                    Ok(true) => Ok(ExecResult::ok()),
                    Ok(false) => Ok(ExecResult::new(String::new(), String::new(), 1)),
                    Err(msg) => Ok(ExecResult::new(String::new(), format!("bash: {}\n", msg), 2)),
                }
            }

            CompoundCommandNode::CStyleFor(cfor) => {
                use crate::interpreter::arithmetic::evaluate_arithmetic;
                use crate::interpreter::types::InterpreterContext;

                if let Some(ref init) = cfor.init {
                    let mut ctx = InterpreterContext::new(state, self.limits);
                    evaluate_arithmetic(&mut ctx, &init.expression, false, None)
                        .map_err(|e| InterpreterError::Exit(ExitError::new(1, String::new(), format!("bash: {}\n", e))))?;
                }

                let mut stdout = String::new();
                let mut stderr = String::new();
                let mut exit_code = 0;
                let mut iterations: u64 = 0;

                state.loop_depth += 1;

                loop {
                    if let Some(ref condition) = cfor.condition {
                        let mut ctx = InterpreterContext::new(state, self.limits);
                        let cond_value = evaluate_arithmetic(&mut ctx, &condition.expression, false, None)
                            .map_err(|e| {
                                state.loop_depth -= 1;
                                InterpreterError::Exit(ExitError::new(1, String::new(), format!("bash: {}\n", e)))
                            })?;
                        if cond_value == 0 {
                            break;
                        }
                    }

                    for stmt in &cfor.body {
                        iterations += 1;
                        if iterations > self.limits.max_iterations {
                            state.loop_depth -= 1;
                            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                                format!("maximum loop iterations ({}) exceeded", self.limits.max_iterations),
                                LimitType::Iterations,
                            )));
                        }

                        match self.execute_statement(state, stmt) {
                            Ok(res) => {
                                stdout.push_str(&res.stdout);
                                stderr.push_str(&res.stderr);
                                exit_code = res.exit_code;
                            }
                            Err(InterpreterError::Break(mut e)) => {
                                e.prepend_output(&stdout, &stderr);
                                state.loop_depth -= 1;
                                if e.levels > 1 {
                                    return Err(InterpreterError::Break(
                                        crate::interpreter::errors::BreakError::new(e.levels - 1, e.stdout, e.stderr),
                                    ));
                                }
                                return Ok(ExecResult::new(e.stdout, e.stderr, exit_code));
                            }
                            Err(InterpreterError::Continue(mut e)) => {
                                e.prepend_output(&stdout, &stderr);
                                stdout = e.stdout.clone();
                                stderr = e.stderr.clone();
                                if e.levels > 1 {
                                    state.loop_depth -= 1;
                                    return Err(InterpreterError::Continue(
                                        crate::interpreter::errors::ContinueError::new(e.levels - 1, e.stdout, e.stderr),
                                    ));
                                }
                                break;
                            }
                            Err(other) => {
                                state.loop_depth -= 1;
                                return Err(other);
                            }
                        }
                    }

                    if let Some(ref update) = cfor.update {
                        let mut ctx = InterpreterContext::new(state, self.limits);
                        evaluate_arithmetic(&mut ctx, &update.expression, false, None).map_err(|e| {
                            state.loop_depth -= 1;
                            InterpreterError::Exit(ExitError::new(1, String::new(), format!("bash: {}\n", e)))
                        })?;
                    }
                }

                state.loop_depth -= 1;
                Ok(ExecResult::new(stdout, stderr, exit_code))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
