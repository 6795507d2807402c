//! Local command execution.

use std::process::{Command, ExitStatus};

use anyhow::{Context, anyhow};
use opsblade_types::{Document, TaskResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::prepare;
use crate::{
    task::{Task, TaskContext, TaskError},
    templates::{Rewrite, TemplateError, Templater},
    variables::VariableStore,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct CommandInstructions {
    cmd: String,
    args: Vec<String>,
    /// Report success even when the command fails.
    no_fail: bool,
}

impl Rewrite for CommandInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.cmd.rewrite(templater)?;
        self.args.rewrite(templater)
    }
}

struct CommandOutput {
    combined: String,
    status: ExitStatus,
}

/// Runs `cmd` with `args` and reports the combined output as `cmd_output`.
pub struct CmdExec<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn cmd_exec<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(CmdExec { context, variables })
}

impl CmdExec<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: CommandInstructions = prepare(&self.context, self.variables)?;
        if instructions.cmd.is_empty() {
            return Err(TaskError::configuration("no command specified"));
        }
        debug!(cmd = %instructions.cmd, args = ?instructions.args, "prepared command");

        if self.context.dry_run {
            return Ok(self.context.result(true, "DryRun, command not executed", Document::Null));
        }

        let (output, failure) = match run_command(&instructions.cmd, &instructions.args) {
            Ok(output) if output.status.success() => (output.combined, None),
            Ok(output) => {
                let failure = anyhow!("'{}' exited with {}", instructions.cmd, output.status);
                (output.combined, Some(failure))
            }
            Err(error) => (String::new(), Some(error)),
        };
        let data = json!({
            "cmd": instructions.cmd,
            "cmd_args": instructions.args,
            "cmd_output": output,
        });

        match failure {
            None => Ok(self.context.result(true, "Command executed successfully", data)),
            Some(error) if instructions.no_fail => {
                warn!(error = %error, "command failed; continuing because no_fail is set");
                Ok(self.context.result(
                    true,
                    "Command executed with non-zero exit code (ignored because no_fail is set)",
                    data,
                ))
            }
            Some(error) => Err(TaskError::external("command execution failed", error)),
        }
    }
}

impl Task for CmdExec<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

/// Runs a command to completion, capturing stdout followed by stderr.
fn run_command(cmd: &str, args: &[String]) -> anyhow::Result<CommandOutput> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("failed to launch '{cmd}'"))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(CommandOutput {
        combined,
        status: output.status,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tasks::testing::context_for;

    #[test]
    fn captures_command_output() {
        let mut store = VariableStore::new();
        store.set("who", "world");
        let context = context_for("cmd_exec", json!({"cmd": "echo", "args": ["hello", "{{who}}"]}));

        let result = cmd_exec(context, &store).execute();
        assert!(result.success, "{}", result.msg);
        assert_eq!(result.data.get("cmd"), Some(&json!("echo")));
        assert_eq!(result.data.get("cmd_args"), Some(&json!(["hello", "world"])));
        assert_eq!(result.data.get("cmd_output"), Some(&json!("hello world\n")));
    }

    #[test]
    fn includes_stderr_after_stdout() {
        let context = context_for(
            "cmd_exec",
            json!({"cmd": "sh", "args": ["-c", "echo out; echo err 1>&2"]}),
        );
        let result = cmd_exec(context, &VariableStore::new()).execute();
        assert_eq!(result.data.get("cmd_output"), Some(&json!("out\nerr\n")));
    }

    #[test]
    fn non_zero_exit_fails_unless_no_fail() {
        let failing = context_for("cmd_exec", json!({"cmd": "false"}));
        let result = cmd_exec(failing, &VariableStore::new()).execute();
        assert!(!result.success);
        assert!(result.msg.starts_with("command execution failed"));
        assert!(result.data.is_empty());

        let tolerated = context_for("cmd_exec", json!({"cmd": "false", "no_fail": true}));
        let result = cmd_exec(tolerated, &VariableStore::new()).execute();
        assert!(result.success);
        assert_eq!(
            result.msg,
            "Command executed with non-zero exit code (ignored because no_fail is set)"
        );
        assert_eq!(result.data.get("cmd"), Some(&json!("false")));
    }

    #[test]
    fn missing_binary_is_reported() {
        let context = context_for("cmd_exec", json!({"cmd": "opsblade-definitely-not-installed"}));
        let result = cmd_exec(context, &VariableStore::new()).execute();
        assert!(!result.success);
        assert!(result.msg.contains("failed to launch"));
    }

    #[test]
    fn dry_run_skips_execution() {
        let directory = tempfile::tempdir().expect("tempdir");
        let marker = directory.path().join("ran");
        let mut context = context_for("cmd_exec", json!({"cmd": "touch", "args": [marker.to_string_lossy()]}));
        context.dry_run = true;

        let result = cmd_exec(context, &VariableStore::new()).execute();
        assert!(result.success);
        assert_eq!(result.msg, "DryRun, command not executed");
        assert!(!marker.exists());
    }

    #[test]
    fn credentials_block_is_accepted_and_left_out_of_the_child() {
        let context = context_for(
            "cmd_exec",
            json!({
                "cmd": "sh",
                "args": ["-c", "env"],
                "credentials": {"aws": {"secret_access_key": "wJalrXUtnFEMI"}}
            }),
        );
        let result = cmd_exec(context, &VariableStore::new()).execute();
        assert!(result.success, "{}", result.msg);
        let output = result.data.get("cmd_output").and_then(|value| value.as_str()).unwrap_or_default();
        assert!(!output.contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let result = cmd_exec(context_for("cmd_exec", json!({})), &VariableStore::new()).execute();
        assert!(!result.success);
        assert_eq!(result.msg, "no command specified");
    }
}
