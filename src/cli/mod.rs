pub mod args;
pub mod commands;

pub use args::{DocArgs, DotArgs, LintArgs, LintFormat, RenderArgs, RenderFlags, TriggerArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
WORKFLOW COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "orchdoc")]
#[command(version = crate::VERSION)]
#[command(about = "Documentation generator and linter for orchestrator workflow definitions")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: lint exported workflows, generate their documentation folder, then trigger a run on the orchestrator."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Generate Markdown reports for a set of workflows",
        long_about = "Doc walks the given files and folders, writes one Markdown report per workflow plus a README.md index, and skips workflows whose source has not changed since the last run.",
        after_help = "Example:\n    orchdoc doc ./workflows --out ./docs"
    )]
    Doc(DocArgs),
    #[command(
        about = "Render one workflow as Markdown",
        long_about = "Render prints the Markdown report of a single workflow file, or writes it to --out.",
        after_help = "Example:\n    orchdoc render create_lb.xml --no-scripts"
    )]
    Render(RenderArgs),
    #[command(
        about = "Check naming conventions, links and embedded scripts",
        long_about = "Lint runs the built-in rules (ODL-001 to ODL-014) against each workflow and exits non-zero when errors are found, or warnings with --deny-warnings.",
        after_help = "Example:\n    orchdoc lint ./workflows --format json"
    )]
    Lint(LintArgs),
    #[command(
        about = "Export the workflow flow graph as Graphviz DOT",
        long_about = "Dot converts the item links of a workflow into a DOT digraph that Graphviz can render.",
        after_help = "Example:\n    orchdoc dot create_lb.xml | dot -Tsvg > flow.svg"
    )]
    Dot(DotArgs),
    #[command(
        about = "Start a workflow execution on a remote orchestrator",
        long_about = "Trigger logs in with the configured user (password from ORCHDOC_REMOTE_PASSWORD), starts the workflow with the given parameters and optionally waits for it to finish.",
        after_help = "Example:\n    orchdoc trigger --workflow-id 3f2a... -p lbName=web01 -p port:number=443 --wait"
    )]
    Trigger(TriggerArgs),
}

pub async fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Doc(doc_args) => commands::doc(doc_args).await,
        Command::Render(render_args) => commands::render(render_args).await,
        Command::Lint(lint_args) => commands::lint(lint_args).await,
        Command::Dot(dot_args) => commands::dot(dot_args).await,
        Command::Trigger(trigger_args) => commands::trigger(trigger_args).await,
    }
}
