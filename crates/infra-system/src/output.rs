// Simulator output classification

use qjob_core::port::RunOutcome;
use serde_json::Value;

/// Characters of stderr kept in a crash reason
const STDERR_TAIL_CHARS: usize = 500;
/// Characters of stdout quoted when the output is unusable
const STDOUT_SNIPPET_CHARS: usize = 200;

/// Turn a finished simulator run into an outcome.
///
/// `exit_code` is `None` when the process was ended by a signal.
/// The simulator may print progress text before its JSON document and
/// anything after it; only the first JSON value starting at the first `{`
/// is considered.
pub fn classify_output(exit_code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> RunOutcome {
    let stderr = String::from_utf8_lossy(stderr);
    match exit_code {
        Some(0) => {}
        Some(code) => {
            return RunOutcome::Crash(with_stderr(
                format!("simulator exited with code {}", code),
                &stderr,
            ))
        }
        None => {
            return RunOutcome::Crash(with_stderr(
                "simulator was terminated by a signal".to_string(),
                &stderr,
            ))
        }
    }

    let stdout = String::from_utf8_lossy(stdout);
    let Some(start) = stdout.find('{') else {
        return RunOutcome::Crash(format!(
            "malformed simulator output: no JSON object found in '{}'",
            snippet(&stdout)
        ));
    };

    let mut values = serde_json::Deserializer::from_str(&stdout[start..]).into_iter::<Value>();
    match values.next() {
        Some(Ok(Value::Object(map))) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let reason = ["status", "message"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or("simulator reported failure");
                RunOutcome::Crash(reason.to_string())
            } else {
                RunOutcome::Success(Value::Object(map))
            }
        }
        Some(Ok(other)) => RunOutcome::Crash(format!(
            "malformed simulator output: expected a JSON object, got {}",
            snippet(&other.to_string())
        )),
        Some(Err(e)) => RunOutcome::Crash(format!("malformed simulator output: {}", e)),
        None => RunOutcome::Crash("malformed simulator output: empty".to_string()),
    }
}

fn with_stderr(reason: String, stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return reason;
    }
    let count = trimmed.chars().count();
    let tail: String = trimmed
        .chars()
        .skip(count.saturating_sub(STDERR_TAIL_CHARS))
        .collect();
    format!("{}: {}", reason, tail)
}

fn snippet(text: &str) -> String {
    text.trim().chars().take(STDOUT_SNIPPET_CHARS).collect()
}
