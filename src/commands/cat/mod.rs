// src/commands/cat/mod.rs
use async_trait::async_trait;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct CatCommand;

#[async_trait]
impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let args = &ctx.args;

        if args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: cat [OPTION]... [FILE]...\n\n\
                 Concatenate FILE(s) to standard output.\n\n\
                 Options:\n\
                   -n, --number     number all output lines\n\
                       --help       display this help and exit\n".to_string()
            );
        }

        let mut show_line_numbers = false;
        let mut files: Vec<String> = Vec::new();

        for arg in args {
            match arg.as_str() {
                "-n" | "--number" => show_line_numbers = true,
                _ if !arg.starts_with('-') || arg == "-" => files.push(arg.clone()),
                _ => {}
            }
        }

        if files.is_empty() {
            files.push("-".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut line_number = 1;

        for file in &files {
            let content = if file == "-" {
                ctx.stdin.clone()
            } else {
                let path = ctx.fs.resolve_path(&ctx.cwd, file);
                match ctx.fs.read_file(&path).await {
                    Ok(c) => c,
                    Err(_) => {
                        stderr.push_str(&format!("cat: {}: No such file or directory\n", file));
                        exit_code = 1;
                        continue;
                    }
                }
            };

            if show_line_numbers {
                let (numbered, next_line) = add_line_numbers(&content, line_number);
                stdout.push_str(&numbered);
                line_number = next_line;
            } else {
                stdout.push_str(&content);
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

fn add_line_numbers(content: &str, start_line: usize) -> (String, usize) {
    let lines: Vec<&str> = content.split('\n').collect();
    let has_trailing_newline = content.ends_with('\n');
    let lines_to_number = if has_trailing_newline {
        &lines[..lines.len() - 1]
    } else {
        &lines[..]
    };

    let numbered: Vec<String> = lines_to_number
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>6}\t{}", start_line + i, line))
        .collect();

    let result = if has_trailing_newline {
        format!("{}\n", numbered.join("\n"))
    } else {
        numbered.join("\n")
    };

    (result, start_line + lines_to_number.len())
}
