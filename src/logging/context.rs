use crate::cli::{args::LintFormat, Command};

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Commands that only print a human summary on stdout.
    Interactive,
    /// Commands whose stdout is the report itself (Markdown, DOT, JSON, YAML).
    StdoutReport,
}

impl ExecutionContext {
    /// Returns `true` when stdout must stay free of log lines.
    pub fn reserves_stdout(self) -> bool {
        matches!(self, ExecutionContext::StdoutReport)
    }
}

/// Derive the active execution context from a parsed CLI command.
pub fn detect_context(command: &Command) -> ExecutionContext {
    match command {
        Command::Render(args) if args.out.is_none() => ExecutionContext::StdoutReport,
        Command::Dot(args) if args.out.is_none() => ExecutionContext::StdoutReport,
        Command::Lint(args) if args.format != LintFormat::Text => ExecutionContext::StdoutReport,
        Command::Doc(_)
        | Command::Render(_)
        | Command::Dot(_)
        | Command::Lint(_)
        | Command::Trigger(_) => ExecutionContext::Interactive,
    }
}
