//! `Shell` action: run a subprocess, feed it the event as JSON on stdin,
//! and fold its structured stdout back into the rule's accumulator.
//!
//! Spawn/timeout/kill shape mirrors the teacher crate's hook and prompt
//! guard runners: a new process group on unix so a timeout can reap the
//! whole subtree, not just the shell.

use crate::accumulator::{InjectionTag, RuleAccumulator};
use crate::error::EngineError;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MAX_STDOUT_BYTES: usize = 1 << 20;

/// Run `command` or `script` via `sh -c`, writing `event_json` to stdin.
/// On success, parses stdout as a JSON object and folds any of
/// `deny`/`deny_message`/`warn_message`/`inject_content`/`allow` into
/// `rule_acc`, matching the contract the original hook entrypoints return.
/// When `cwd` is given (the event's working directory), the subprocess runs
/// there rather than inheriting the engine's own working directory.
#[allow(clippy::too_many_arguments)]
pub fn run(
    rule_id: &str,
    command: Option<&str>,
    script: Option<&str>,
    timeout_ms: Option<u64>,
    cwd: Option<&str>,
    event_json: &str,
    rule_acc: &mut RuleAccumulator,
) -> Result<Option<serde_json::Value>, EngineError> {
    let program = command.or(script).ok_or_else(|| EngineError::ActionFailed {
        rule_id: rule_id.to_string(),
        reason: "shell action has neither command nor script".into(),
    })?;

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(EngineError::Spawn)?;

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(event_json.as_bytes());
    }

    let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
    let start = Instant::now();

    loop {
        match child.try_wait().map_err(EngineError::Spawn)? {
            Some(status) => {
                let mut stdout_buf = String::new();
                if let Some(mut out) = child.stdout.take() {
                    let mut raw = Vec::new();
                    let _ = out.read_to_end(&mut raw);
                    raw.truncate(MAX_STDOUT_BYTES);
                    stdout_buf = String::from_utf8_lossy(&raw).trim().to_string();
                }

                if !status.success() {
                    return Err(EngineError::ActionFailed {
                        rule_id: rule_id.to_string(),
                        reason: format!(
                            "exited with code {}",
                            status.code().unwrap_or(-1)
                        ),
                    });
                }

                let parsed = parse_output(&stdout_buf, rule_acc);
                return Ok(parsed);
            }
            None => {
                if start.elapsed() >= timeout {
                    kill_process_group(&mut child);
                    let _ = child.wait();
                    return Err(EngineError::ActionTimeout {
                        rule_id: rule_id.to_string(),
                        timeout_ms: timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
                    });
                }
                std::thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut std::process::Child) {
    // SAFETY: kill() is async-signal-safe; negative PID targets the whole
    // process group created by process_group(0) above.
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut std::process::Child) {
    let _ = child.kill();
}

fn parse_output(stdout: &str, rule_acc: &mut RuleAccumulator) -> Option<serde_json::Value> {
    if stdout.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(stdout).ok()?;
    let obj = value.as_object()?;

    if obj.get("deny").and_then(|v| v.as_bool()).unwrap_or(false) {
        let message = obj
            .get("deny_message")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        rule_acc.deny(message);
    }
    if let Some(msg) = obj.get("warn_message").and_then(|v| v.as_str()) {
        rule_acc.warn(Some(msg.to_string()));
    }
    if let Some(content) = obj.get("inject_content").and_then(|v| v.as_str()) {
        rule_acc.inject(InjectionTag::Context, content.to_string());
    }
    if obj.get("allow").and_then(|v| v.as_bool()).unwrap_or(false) {
        rule_acc.allow(
            obj.get("allow_message")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        );
    }

    Some(value)
}
