//! Tool invocations and the runner seam
//!
//! The pipeline tools (blob detection, neighbor matching, transform fitting,
//! warping…) are opaque external command-line entry points. This module
//! holds the argument-list representation the builders produce and the
//! boundary through which they are executed. Failures are caught here and
//! reported; whatever cell values existed before the call remain.

use crate::error::{AlignmentError, Result};
use crate::progress::ProgressSink;
use std::fmt;
use std::process::Command;

/// A fully-formed command line for one external pipeline tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        ToolInvocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Append `--flag value`
    pub fn option(self, flag: &str, value: impl fmt::Display) -> Self {
        self.arg(flag).arg(value)
    }

    /// Append `--flag` when `enabled`
    pub fn switch(self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.arg(flag)
        } else {
            self
        }
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes tool invocations. The seam exists so tests and embedders can
/// substitute their own execution strategy (in-process entry points,
/// worker pools, mocks).
pub trait ToolRunner {
    fn run(
        &mut self,
        invocation: &ToolInvocation,
        progress: &mut dyn ProgressSink,
    ) -> anyhow::Result<()>;
}

/// Runs each tool as a child process and waits for it to exit
#[derive(Debug, Default)]
pub struct SubprocessRunner;

impl ToolRunner for SubprocessRunner {
    fn run(
        &mut self,
        invocation: &ToolInvocation,
        progress: &mut dyn ProgressSink,
    ) -> anyhow::Result<()> {
        progress.message(&format!("running {}", invocation.program));
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()?;
        if !status.success() {
            anyhow::bail!("exited with {status}");
        }
        Ok(())
    }
}

/// Invoke one tool through `runner`, translating any failure into a
/// non-fatal [`AlignmentError::Tool`]. The error is logged and returned to
/// the caller for display; no blackboard state is rolled back.
pub fn run_tool(
    runner: &mut dyn ToolRunner,
    invocation: &ToolInvocation,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    tracing::info!(tool = %invocation.program, command = %invocation, "invoking pipeline tool");
    progress.begin(&invocation.program, None);
    let outcome = runner.run(invocation, progress);
    progress.finish();
    outcome.map_err(|error| {
        tracing::error!(tool = %invocation.program, %error, "pipeline tool failed");
        AlignmentError::Tool {
            tool: invocation.program.clone(),
            message: format!("{error:#}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{MockProgressSink, NullProgress};

    struct ScriptedRunner {
        succeed: bool,
        seen: Vec<ToolInvocation>,
    }

    impl ToolRunner for ScriptedRunner {
        fn run(
            &mut self,
            invocation: &ToolInvocation,
            _progress: &mut dyn ProgressSink,
        ) -> anyhow::Result<()> {
            self.seen.push(invocation.clone());
            if self.succeed {
                Ok(())
            } else {
                anyhow::bail!("synthetic failure")
            }
        }
    }

    #[test]
    fn run_tool_passes_the_invocation_through() {
        let mut runner = ScriptedRunner {
            succeed: true,
            seen: Vec::new(),
        };
        let invocation = ToolInvocation::new("phathom-warp-points").option("--n-workers", 4);
        run_tool(&mut runner, &invocation, &mut NullProgress).unwrap();
        assert_eq!(runner.seen, vec![invocation]);
    }

    #[test]
    fn run_tool_maps_failure_to_tool_error() {
        let mut runner = ScriptedRunner {
            succeed: false,
            seen: Vec::new(),
        };
        let invocation = ToolInvocation::new("detect-blobs");
        let err = run_tool(&mut runner, &invocation, &mut NullProgress).unwrap_err();
        match err {
            AlignmentError::Tool { tool, message } => {
                assert_eq!(tool, "detect-blobs");
                assert!(message.contains("synthetic failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn run_tool_brackets_progress_even_on_failure() {
        let mut progress = MockProgressSink::new();
        progress.expect_begin().times(1).return_const(());
        progress.expect_finish().times(1).return_const(());
        let mut runner = ScriptedRunner {
            succeed: false,
            seen: Vec::new(),
        };
        let invocation = ToolInvocation::new("detect-blobs");
        let _ = run_tool(&mut runner, &invocation, &mut progress);
    }

    #[test]
    fn display_renders_a_command_line() {
        let invocation = ToolInvocation::new("precomputed-tif")
            .option("--levels", 7)
            .switch("--use-gpu", true);
        assert_eq!(
            invocation.to_string(),
            "precomputed-tif --levels 7 --use-gpu"
        );
    }
}
