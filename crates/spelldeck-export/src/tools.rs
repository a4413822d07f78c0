// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External tool discovery and invocation.

use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::{debug, warn};

use spelldeck_core::error::{Result, SpelldeckError};

/// Lines of tool output kept in an error. LaTeX logs run to thousands of
/// lines; the failure is almost always at the end.
const FAILURE_TAIL_LINES: usize = 20;

/// Absolute path of `name` on `PATH`.
pub fn find_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| SpelldeckError::ToolMissing(name.to_string()))
}

/// The subset of `names` that cannot be found on `PATH`, in input order.
pub fn missing_tools<'a>(names: &[&'a str]) -> Vec<&'a str> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| find_tool(name).is_err())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "required tools not found on PATH");
    }
    missing
}

/// Run `command` to completion, capturing its output. A non-zero exit becomes
/// [`SpelldeckError::ExternalTool`] carrying the tail of what the tool printed.
pub fn run(tool: &str, command: &mut Command) -> Result<Output> {
    debug!(tool, ?command, "running external tool");

    let output = command.output().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SpelldeckError::ToolMissing(tool.to_string()),
        _ => SpelldeckError::Io(e),
    })?;

    if !output.status.success() {
        return Err(SpelldeckError::ExternalTool {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: failure_detail(&output),
        });
    }
    Ok(output)
}

/// stderr if the tool wrote any, otherwise stdout (latexmk reports errors
/// there), trimmed to the last few lines.
fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };

    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_SUCH_TOOL: &str = "spelldeck-no-such-tool-9f2c";

    #[test]
    fn unknown_tool_is_missing() {
        assert!(matches!(
            find_tool(NO_SUCH_TOOL),
            Err(SpelldeckError::ToolMissing(name)) if name == NO_SUCH_TOOL
        ));
        assert_eq!(missing_tools(&[NO_SUCH_TOOL]), [NO_SUCH_TOOL]);
        assert!(missing_tools(&[]).is_empty());
    }

    #[test]
    fn spawning_a_missing_binary_is_tool_missing() {
        let err = run(NO_SUCH_TOOL, &mut Command::new(NO_SUCH_TOOL)).unwrap_err();
        assert!(matches!(err, SpelldeckError::ToolMissing(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_keeps_the_tail_of_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "for i in $(seq 1 30); do echo line$i >&2; done; exit 3"]);
        match run("sh", &mut command).unwrap_err() {
            SpelldeckError::ExternalTool { tool, stderr, .. } => {
                assert_eq!(tool, "sh");
                assert_eq!(stderr.lines().count(), FAILURE_TAIL_LINES);
                assert!(stderr.ends_with("line30"));
                assert!(!stderr.contains("line10\n"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_used_when_stderr_is_empty() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo '! LaTeX Error: File `spell.sty'\"'\"' not found.'; exit 12"]);
        match run("latexmk", &mut command).unwrap_err() {
            SpelldeckError::ExternalTool { stderr, .. } => assert!(stderr.contains("not found")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn success_returns_output() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo ok"]);
        let output = run("sh", &mut command).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
    }
}
