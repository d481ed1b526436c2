use crate::{
    cli::args::{DocArgs, DotArgs, LintArgs, LintFormat, RenderArgs, RenderFlags, TriggerArgs},
    core::{
        config::loader::CONFIG_FILE_NAME,
        types::ErrorCategory,
        workflow::{
            docs::render_options,
            lint::{tally, LintRegistry, LintResult, LintSeverity},
            parser::is_workflow_file,
            render_markdown, DocsGenerator, FlowGraph, RenderOptions,
        },
        AppError, ConfigLoader, ConfigValidator, OrchdocConfig,
    },
    remote::{ExecutionParameter, ExecutionState, OrchestratorClient},
    utils::files::{collect_files, write_file},
    Result,
};
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const PASSWORD_ENV: &str = "ORCHDOC_REMOTE_PASSWORD";

/// Code reported by `lint` for files that cannot be parsed at all.
const PARSE_FAILURE_CODE: &str = "ODL-000";

/// Lint outcome for one workflow file.
#[derive(Debug, Serialize)]
struct FileLintReport {
    file: String,
    results: Vec<LintResult>,
}

pub async fn doc(args: DocArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let generator = DocsGenerator::new(config.docs.clone());
    let options = apply_render_flags(generator.options().clone(), &args.render);
    let generator = generator.with_options(options);

    let summary = generator.generate(&args.paths, &args.out, args.force)?;

    println!(
        "Documented {} workflow(s): {} written, {} unchanged, {} failed",
        summary.total(),
        summary.written.len(),
        summary.unchanged.len(),
        summary.failed.len()
    );
    for (path, message) in &summary.failed {
        println!("  failed {}: {}", path.display(), message);
    }
    if let Some(index) = &summary.index {
        println!("Index: {}", index.display());
    }
    Ok(())
}

pub async fn render(args: RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let document = crate::core::workflow::parse_workflow(&args.file)?;
    let options = apply_render_flags(render_options(&config.docs), &args.render);
    let markdown = render_markdown(&document, &options);

    match &args.out {
        Some(out) => {
            write_file(out, &markdown)?;
            tracing::info!(output = %out.display(), "wrote workflow report");
            println!("Wrote {}", out.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

pub async fn lint(args: LintArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = LintRegistry::new(&config.lint)?;

    let files = collect_files(&args.paths, is_workflow_file)?;
    if files.is_empty() {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            "no workflow definitions found in the given paths",
        )
        .with_code("NO_WORKFLOWS")
        .into());
    }

    let reports: Vec<FileLintReport> = files
        .iter()
        .map(|file| lint_file(&registry, file))
        .collect();
    let all_results: Vec<LintResult> = reports
        .iter()
        .flat_map(|report| report.results.iter().cloned())
        .collect();
    let (errors, warnings, infos) = tally(&all_results);

    match args.format {
        LintFormat::Text => print!("{}", format_text_report(&reports, errors, warnings, infos)),
        LintFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("failed to serialize lint report")?
        ),
        LintFormat::Yaml => print!(
            "{}",
            serde_yaml::to_string(&reports).context("failed to serialize lint report")?
        ),
    }

    if errors > 0 {
        return Err(anyhow!("lint failed with {} error(s)", errors));
    }
    if args.deny_warnings && warnings > 0 {
        return Err(anyhow!(
            "lint failed with {} warning(s) (--deny-warnings)",
            warnings
        ));
    }
    Ok(())
}

pub async fn dot(args: DotArgs) -> Result<()> {
    let document = crate::core::workflow::parse_workflow(&args.file)?;
    let graph = FlowGraph::build(&document);
    let dot = graph.to_dot();

    match &args.out {
        Some(out) => {
            write_file(out, &dot)?;
            println!("Wrote {}", out.display());
        }
        None => print!("{}", dot),
    }
    Ok(())
}

pub async fn trigger(args: TriggerArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(url) = args.url.clone() {
        config.remote.base_url = Some(url);
    }
    if let Some(username) = args.username.clone() {
        config.remote.username = Some(username);
    }
    if args.insecure {
        config.remote.insecure = true;
    }
    ConfigValidator::validate(&config)?;

    let parameters = args
        .params
        .iter()
        .map(|spec| ExecutionParameter::parse(spec))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let username = config.remote.username.clone().ok_or_else(|| {
        anyhow!("no remote user configured; pass --username or set ORCHDOC_REMOTE_USERNAME")
    })?;
    let password = env::var(PASSWORD_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("{} must be set to trigger a workflow", PASSWORD_ENV))?;

    let client = OrchestratorClient::new(&config.remote)?;
    let token = client
        .authenticate(&username, &password)
        .await
        .context("authentication failed")?;
    let execution_id = client
        .start_execution(&token, &args.workflow_id, &parameters)
        .await
        .with_context(|| format!("failed to start workflow {}", args.workflow_id))?;
    println!("Started execution {}", execution_id);

    if !args.wait {
        return Ok(());
    }

    let state = client
        .wait_for_completion(&token, &args.workflow_id, &execution_id)
        .await?;
    println!("Execution {} finished: {}", execution_id, state);
    match state {
        ExecutionState::Completed => Ok(()),
        other => Err(anyhow!("execution {} ended as {}", execution_id, other)),
    }
}

/// Load `--config` when given, otherwise `orchdoc.toml` from the working directory, then validate.
fn load_config(explicit: Option<&Path>) -> Result<OrchdocConfig> {
    let config = match explicit {
        Some(path) => ConfigLoader::load_explicit(path)?,
        None => {
            let cwd: PathBuf = env::current_dir().context("cannot resolve working directory")?;
            tracing::debug!(file = CONFIG_FILE_NAME, dir = %cwd.display(), "looking for configuration");
            ConfigLoader::load_from_dir(&cwd)?
        }
    };
    ConfigValidator::validate(&config)?;
    Ok(config)
}

fn apply_render_flags(mut options: RenderOptions, flags: &RenderFlags) -> RenderOptions {
    if flags.no_scripts {
        options.include_scripts = false;
    }
    if flags.no_diagram {
        options.include_diagram = false;
    }
    options
}

fn lint_file(registry: &LintRegistry, file: &Path) -> FileLintReport {
    let results = match crate::core::workflow::parse_workflow(file) {
        Ok(document) => registry.run(&document),
        Err(err) => vec![LintResult::new(
            PARSE_FAILURE_CODE,
            LintSeverity::Error,
            format!("workflow could not be parsed: {}", err.message),
            None,
            None,
        )],
    };
    FileLintReport {
        file: file.display().to_string(),
        results,
    }
}

fn format_text_report(
    reports: &[FileLintReport],
    errors: usize,
    warnings: usize,
    infos: usize,
) -> String {
    let mut out = String::new();
    for report in reports {
        if report.results.is_empty() {
            let _ = writeln!(out, "{}: ok", report.file);
            continue;
        }
        let _ = writeln!(out, "{}:", report.file);
        for result in &report.results {
            let location = result
                .location
                .as_deref()
                .map(|loc| format!(" [{}]", loc))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {:<7} {}{} {}",
                result.severity.to_string().to_lowercase(),
                result.code,
                location,
                result.message
            );
            if let Some(suggestion) = &result.suggestion {
                let _ = writeln!(out, "          hint: {}", suggestion);
            }
        }
    }
    let _ = writeln!(
        out,
        "{} error(s), {} warning(s), {} info(s) in {} file(s)",
        errors,
        warnings,
        infos,
        reports.len()
    );
    out
}
