// src/pipeline/transform.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::model::BuildSection;
use crate::errors;
use crate::graph::{Action, ActionOutcome};
use crate::watch::FileSet;

/// How transform outputs are produced.
///
/// - `PerFile`: one transformer invocation per source file; each artifact is
///   named after its source, with the configured extension.
/// - `Bundle`: a single invocation over all source files, producing one
///   combined artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    PerFile,
    Bundle,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-file" => Ok(OutputMode::PerFile),
            "bundle" => Ok(OutputMode::Bundle),
            other => Err(format!(
                "invalid mode: {other} (expected \"per-file\" or \"bundle\")"
            )),
        }
    }
}

/// Action that runs the external transformer over the source file set.
///
/// The file set is re-enumerated on every run. In per-file mode, a failing
/// input does not stop the batch: remaining inputs are still transformed and
/// the failures are folded into one `ActionOutcome::Failure` at the end, so
/// artifacts for healthy inputs always land.
pub struct TransformAction {
    fileset: FileSet,
    dest: PathBuf,
    command: String,
    mode: OutputMode,
    bundle: String,
    extension: String,
}

impl TransformAction {
    /// Build the action from the `[build]` config, with all paths anchored
    /// at the project root.
    pub fn from_config(build: &BuildSection, root: &Path) -> errors::Result<Self> {
        let t = &build.transform;
        let fileset = FileSet::new(root, t.sources.clone(), t.exclude.clone())?;
        let mode = OutputMode::from_str(&t.mode)
            .map_err(|e| errors::GustError::Config(format!("invalid [build.transform].mode: {e}")))?;

        Ok(Self {
            fileset,
            dest: root.join(&build.dest),
            command: t.command.clone(),
            mode,
            bundle: t.bundle.clone(),
            extension: t.extension.clone(),
        })
    }

    async fn run_inner(&self) -> ActionOutcome {
        let inputs = match self.fileset.resolve() {
            Ok(inputs) => inputs,
            Err(err) => return ActionOutcome::Failure(format!("resolving sources: {err:#}")),
        };

        if inputs.is_empty() {
            info!("no sources matched, nothing to transform");
            return ActionOutcome::Success;
        }

        if let Err(err) = tokio::fs::create_dir_all(&self.dest).await {
            return ActionOutcome::Failure(format!(
                "creating destination directory {:?}: {err}",
                self.dest
            ));
        }

        match self.mode {
            OutputMode::PerFile => self.run_per_file(&inputs).await,
            OutputMode::Bundle => self.run_bundle(&inputs).await,
        }
    }

    async fn run_per_file(&self, inputs: &[PathBuf]) -> ActionOutcome {
        let mut failures: Vec<String> = Vec::new();
        let mut written = 0usize;

        for input in inputs {
            let output = per_file_output(&self.dest, input, &self.extension);
            let cmdline = render_per_file(&self.command, input, &output);

            match run_shell(&cmdline).await {
                Ok(()) => {
                    debug!(
                        input = %input.display(),
                        output = %output.display(),
                        "input transformed"
                    );
                    written += 1;
                }
                Err(err) => {
                    warn!(
                        input = %input.display(),
                        error = %format!("{err:#}"),
                        "transform failed, continuing with remaining inputs"
                    );
                    failures.push(format!("{}: {err:#}", display_name(input)));
                }
            }
        }

        if failures.is_empty() {
            info!(outputs = written, "transform finished");
            ActionOutcome::Success
        } else {
            ActionOutcome::Failure(format!(
                "{} of {} inputs failed: {}",
                failures.len(),
                inputs.len(),
                failures.join("; ")
            ))
        }
    }

    async fn run_bundle(&self, inputs: &[PathBuf]) -> ActionOutcome {
        let output = self.dest.join(&self.bundle);
        let cmdline = render_bundle(&self.command, inputs, &output);

        match run_shell(&cmdline).await {
            Ok(()) => {
                info!(
                    inputs = inputs.len(),
                    output = %output.display(),
                    "bundle written"
                );
                ActionOutcome::Success
            }
            Err(err) => ActionOutcome::Failure(format!(
                "bundling {} inputs into {}: {err:#}",
                inputs.len(),
                display_name(&output)
            )),
        }
    }
}

impl Action for TransformAction {
    fn run(&self) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>> {
        Box::pin(self.run_inner())
    }
}

/// Artifact path for one source file: same stem, configured extension,
/// directly under dest. Built by hand so a dotted stem like `a.b` keeps
/// every part.
fn per_file_output(dest: &Path, input: &Path, extension: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    dest.join(name)
}

/// Substitute `{input}` / `{output}` placeholders, shell-quoting both paths.
fn render_per_file(template: &str, input: &Path, output: &Path) -> String {
    template
        .replace("{input}", &shell_quote(input))
        .replace("{output}", &shell_quote(output))
}

/// Substitute `{inputs}` (space separated) / `{output}` placeholders.
fn render_bundle(template: &str, inputs: &[PathBuf], output: &Path) -> String {
    let joined = inputs
        .iter()
        .map(|p| shell_quote(p))
        .collect::<Vec<_>>()
        .join(" ");
    template
        .replace("{inputs}", &joined)
        .replace("{output}", &shell_quote(output))
}

/// Single-quote a path for the POSIX shell. Embedded single quotes are the
/// only character needing care inside single quotes.
fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.contains('\'') {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        format!("'{s}'")
    }
}

/// Run a rendered command line through the platform shell and capture its
/// output. Nonzero exit becomes an error carrying the last stderr line.
async fn run_shell(cmdline: &str) -> Result<()> {
    debug!(cmd = %cmdline, "running transformer");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmdline);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmdline);
        c
    };
    cmd.kill_on_drop(true);

    let out = cmd
        .output()
        .await
        .with_context(|| format!("spawning transformer command `{cmdline}`"))?;

    if out.status.success() {
        return Ok(());
    }

    let code = out.status.code().unwrap_or(-1);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let tail = stderr_tail(&stderr);
    if tail.is_empty() {
        bail!("transformer exited with status {code}");
    }
    bail!("transformer exited with status {code}: {tail}")
}

/// Last non-empty stderr line, keeping sink messages one line long.
fn stderr_tail(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim())
        .unwrap_or("")
}

/// File name for failure messages; falls back to the full path display.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
