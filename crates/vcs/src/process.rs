#![forbid(unsafe_code)]

use crate::error::GitError;
use crate::remote::redact_text;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug)]
pub(crate) struct GitOutput {
    pub(crate) success: bool,
    pub(crate) code: Option<i32>,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl GitOutput {
    pub(crate) fn trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct GitRunner {
    pub(crate) program: String,
    pub(crate) timeout: Duration,
}

impl GitRunner {
    /// Run git and return its output whatever the exit code. Only spawn failures and
    /// timeouts are errors here.
    pub(crate) fn output(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput, GitError> {
        let shown = display_args(args);
        tracing::debug!(cwd = %cwd.display(), args = %shown, "git");

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GitError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty child never blocks on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {}
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GitError::Io(err));
                }
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let Some(status) = status else {
            // Grandchildren may still hold the pipes open; the drain threads are left detached.
            tracing::warn!(args = %shown, secs = self.timeout.as_secs(), "git timed out");
            return Err(GitError::Timeout {
                args: shown,
                secs: self.timeout.as_secs(),
            });
        };
        let stdout = stdout.map(join).unwrap_or_default();
        let stderr = stderr.map(join).unwrap_or_default();

        Ok(GitOutput {
            success: status.success(),
            code: status.code(),
            stdout,
            stderr: redact_text(&stderr),
        })
    }

    /// Run git and fail on a non-zero exit.
    pub(crate) fn run(&self, cwd: &Path, args: &[&str]) -> Result<GitOutput, GitError> {
        let out = self.output(cwd, args)?;
        if out.success {
            return Ok(out);
        }
        Err(GitError::Failed {
            args: display_args(args),
            code: out.code,
            stderr: out.stderr.trim().to_string(),
        })
    }
}

fn display_args(args: &[&str]) -> String {
    args.iter()
        .map(|arg| redact_text(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
