#![allow(clippy::result_large_err)]

//! Batch generation of Markdown reports plus an index page.

use crate::core::config::DocsConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow::markdown::{escape_cell, render_markdown, RenderOptions};
use crate::core::workflow::parser::{is_workflow_file, parse_workflow};
use crate::utils::files::{collect_files, file_digest, slugify, write_file};
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = ".orchdoc-manifest.json";
pub const INDEX_FILE: &str = "README.md";

/// Record of one generated report, keyed by source path in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub digest: String,
    /// Fingerprint of the render options the report was written with.
    #[serde(default)]
    pub options: String,
    pub output: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Source digests of the last run, used to skip unchanged workflows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: IndexMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn load(out_dir: &Path) -> Self {
        let path = out_dir.join(MANIFEST_FILE);
        let Ok(raw) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable manifest");
                Self::default()
            }
        }
    }

    fn save(&self, out_dir: &Path) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(self).map_err(|err| {
            AppError::with_source(ErrorCategory::IoError, "failed to encode manifest", err)
        })?;
        write_file(&out_dir.join(MANIFEST_FILE), &format!("{}\n", raw))
    }
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct DocsSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub index: Option<PathBuf>,
}

impl DocsSummary {
    pub fn total(&self) -> usize {
        self.written.len() + self.unchanged.len() + self.failed.len()
    }
}

/// Turns a set of workflow files into a documentation folder.
pub struct DocsGenerator {
    config: DocsConfig,
    options: RenderOptions,
}

impl DocsGenerator {
    pub fn new(config: DocsConfig) -> Self {
        let options = render_options(&config);
        Self { config, options }
    }

    /// Override what the reports embed, on top of the configuration.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render every workflow found under `inputs` into `out_dir`.
    pub fn generate(
        &self,
        inputs: &[PathBuf],
        out_dir: &Path,
        force: bool,
    ) -> Result<DocsSummary, AppError> {
        let files = collect_files(inputs, is_workflow_file)?;
        if files.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "no workflow definitions found in the given paths",
            )
            .with_code("NO_WORKFLOWS")
            .with_suggestion("point orchdoc at exported workflow .xml files or their folder"));
        }
        fs::create_dir_all(out_dir)?;

        let previous = Manifest::load(out_dir);
        let mut manifest = Manifest::default();
        let mut summary = DocsSummary::default();
        let mut slugs = HashSet::new();
        let options_fingerprint = self.options.fingerprint();

        for file in &files {
            let key = file.display().to_string();
            let document = match parse_workflow(file) {
                Ok(document) => document,
                Err(err) => {
                    tracing::warn!(file = %key, error = %err.message, "skipping workflow");
                    summary.failed.push((file.clone(), err.message));
                    continue;
                }
            };
            let digest = file_digest(file)?;
            let title = document.title();
            let output_name = format!("{}.md", unique_slug(&title, &mut slugs));
            let output = out_dir.join(&output_name);

            let entry = ManifestEntry {
                digest,
                options: options_fingerprint.clone(),
                output: output_name,
                title,
                description: document.description.clone(),
            };
            let unchanged = previous.entries.get(&key) == Some(&entry) && output.exists();
            if unchanged && !force {
                tracing::debug!(file = %key, "workflow unchanged, keeping report");
                summary.unchanged.push(output);
            } else {
                write_file(&output, &render_markdown(&document, &self.options))?;
                tracing::info!(file = %key, output = %output.display(), "wrote workflow report");
                summary.written.push(output);
            }
            manifest.entries.insert(key, entry);
        }

        if summary.written.is_empty() && summary.unchanged.is_empty() {
            let details = summary
                .failed
                .iter()
                .map(|(path, message)| format!("{}: {}", path.display(), message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::new(
                ErrorCategory::ParseError,
                format!("every workflow failed to parse ({})", details),
            )
            .with_code("ALL_WORKFLOWS_FAILED"));
        }

        let index = out_dir.join(INDEX_FILE);
        write_file(&index, &self.render_index(&manifest))?;
        manifest.save(out_dir)?;
        summary.index = Some(index);
        Ok(summary)
    }

    fn render_index(&self, manifest: &Manifest) -> String {
        let mut out = format!("# {}\n\n", self.config.index_title);
        out.push_str("| Workflow | Description | Source |\n|---|---|---|\n");
        for (source, entry) in &manifest.entries {
            let summary = entry
                .description
                .as_deref()
                .and_then(|d| d.lines().map(str::trim).find(|line| !line.is_empty()))
                .unwrap_or("");
            out.push_str(&format!(
                "| [{}]({}) | {} | `{}` |\n",
                escape_link_text(&entry.title),
                entry.output,
                escape_cell(summary),
                source
            ));
        }
        out
    }
}

/// Render options derived from configuration alone.
pub fn render_options(config: &DocsConfig) -> RenderOptions {
    RenderOptions {
        include_scripts: config.include_scripts,
        include_diagram: config.include_diagram,
        timestamp: config.timestamp.then(Utc::now),
        masked_types: config.masked_types.clone(),
        max_value_len: config.max_value_len,
    }
}

fn unique_slug(title: &str, taken: &mut HashSet<String>) -> String {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    candidate
}

fn escape_link_text(value: &str) -> String {
    escape_cell(value).replace('[', "\\[").replace(']', "\\]")
}
