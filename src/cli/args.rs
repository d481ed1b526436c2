use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Flags shared by commands that render reports.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderFlags {
    /// Leave embedded scripts out of the report
    #[arg(long, help_heading = "Report Content")]
    pub no_scripts: bool,

    /// Leave the Mermaid flow diagram out of the report
    #[arg(long, help_heading = "Report Content")]
    pub no_diagram: bool,
}

#[derive(Args, Debug)]
pub struct DocArgs {
    /// Workflow files or folders to document (folders are walked recursively)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output folder for the generated reports (default: docs)
    #[arg(long, short = 'o', value_name = "DIR", default_value = "docs")]
    pub out: PathBuf,

    /// Regenerate every report even when its source is unchanged
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub render: RenderFlags,

    /// Explicit configuration file (default: ./orchdoc.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Workflow file to render
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderFlags,

    /// Explicit configuration file (default: ./orchdoc.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Output formats supported by `orchdoc lint`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LintFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Workflow files or folders to lint
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = LintFormat::Text)]
    pub format: LintFormat,

    /// Exit non-zero on warnings as well as errors
    #[arg(long)]
    pub deny_warnings: bool,

    /// Explicit configuration file (default: ./orchdoc.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DotArgs {
    /// Workflow file to convert
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write the DOT graph to this file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Identifier of the workflow to start on the orchestrator
    #[arg(long, value_name = "ID")]
    pub workflow_id: String,

    /// Input parameter as name[:type]=value (repeatable; types: string, number, boolean, SecureString)
    #[arg(long = "param", short = 'p', value_name = "SPEC")]
    pub params: Vec<String>,

    /// Poll the execution until it finishes
    #[arg(long)]
    pub wait: bool,

    /// Orchestrator base URL (overrides remote.base_url and ORCHDOC_REMOTE_URL)
    #[arg(long, value_name = "URL", help_heading = "Connection")]
    pub url: Option<String>,

    /// Login user (overrides remote.username and ORCHDOC_REMOTE_USERNAME)
    #[arg(long, value_name = "USER", help_heading = "Connection")]
    pub username: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, help_heading = "Connection")]
    pub insecure: bool,

    /// Explicit configuration file (default: ./orchdoc.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
