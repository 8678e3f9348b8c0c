//! Runs the selected steps in order, either inside this process or as one
//! child process per step.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{error, info};

use crate::pipeline::{Pipeline, Step, StepReport};
use crate::ui::{Phase, Ui};

/// Run `steps` in order on one pipeline, stopping at the first failure
pub fn run_steps(
    pipeline: &mut Pipeline,
    steps: &[Step],
    ui: &mut impl Ui,
) -> Result<Vec<StepReport>> {
    info!("starting suite: {} steps", steps.len());
    let mut reports = Vec::with_capacity(steps.len());

    for (idx, step) in steps.iter().enumerate() {
        if ui.cancelled() {
            error!("suite cancelled before {}; suite finished with failures", step);
            bail!("Cancelled before step {}", step);
        }
        ui.set_phase(match step {
            Step::Preprocess => Phase::Preprocessing,
            _ => Phase::Generating,
        });
        ui.set_step(idx + 1, steps.len(), step.name());

        let start = Instant::now();
        match pipeline.run_step(*step, ui) {
            Ok(report) => {
                let elapsed = start.elapsed().as_secs_f64();
                info!("{} finished in {:.2}s", step, elapsed);
                ui.log(format!("{} done in {:.2}s ({} rows)", step, elapsed, report.total_rows()));
                reports.push(report);
            }
            Err(e) => {
                let elapsed = start.elapsed().as_secs_f64();
                error!("{} failed after {:.2}s: {:#}", step, elapsed, e);
                ui.warn(format!("{} failed: {:#}", step, e));
                error!("suite stopped at {}; suite finished with failures", step);
                return Err(e.context(format!("Step {} failed", step)));
            }
        }
    }

    info!("suite finished successfully");
    Ok(reports)
}

/// Runs each step as `<exe> generate <step>`, handing ids over through files
pub struct SuiteRunner {
    executable: PathBuf,
    config: Option<PathBuf>,
}

impl SuiteRunner {
    /// Use the current executable
    pub fn new(config: Option<PathBuf>) -> Result<Self> {
        let executable =
            std::env::current_exe().context("Could not locate the current executable")?;
        Ok(Self::with_executable(executable, config))
    }

    pub fn with_executable(executable: impl Into<PathBuf>, config: Option<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            config,
        }
    }

    fn command(&self, step: Step) -> Command {
        let mut cmd = Command::new(&self.executable);
        if let Some(config) = &self.config {
            cmd.arg("--config").arg(config);
        }
        cmd.arg("generate").arg(step.name());
        cmd
    }

    /// Run one step; `Ok(false)` when the child process failed
    pub fn run_step(&self, step: Step) -> Result<bool> {
        info!("starting {}", step);
        let start = Instant::now();

        let output = self
            .command(step)
            .output()
            .with_context(|| format!("Failed to launch {:?}", self.executable))?;
        let elapsed = start.elapsed().as_secs_f64();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            info!("{} finished successfully in {:.2}s", step, elapsed);
            if !stdout.trim().is_empty() {
                info!("{} output:\n{}", step, stdout.trim_end());
            }
            Ok(true)
        } else {
            error!("{} failed after {:.2}s ({})", step, elapsed, output.status);
            if !stderr.trim().is_empty() {
                error!("{} error output:\n{}", step, stderr.trim_end());
            }
            Ok(false)
        }
    }

    /// Run every step in order, stopping at the first failure
    pub fn run(&self, steps: &[Step]) -> Result<()> {
        info!("starting suite: {} steps as child processes", steps.len());

        for step in steps {
            if !self.run_step(*step)? {
                error!("suite interrupted by a failure in {}", step);
                error!("suite finished with failures");
                bail!("Step {} failed", step);
            }
        }

        info!("suite finished successfully");
        Ok(())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}
