#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::TempDir;

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage: TempDir,
    next_id: i64,
}

impl Server {
    pub(crate) fn start() -> Self {
        Self::start_with_args(&[])
    }

    pub(crate) fn start_with_args(extra_args: &[&str]) -> Self {
        let storage = TempDir::new().expect("create storage dir");
        let mut child = Command::new(env!("CARGO_BIN_EXE_dm_mcp"))
            .arg("--storage-dir")
            .arg(storage.path())
            .args(extra_args)
            .env("DOCMIRROR_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn dm_mcp");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            storage,
            next_id: 100,
        }
    }

    pub(crate) fn start_initialized() -> Self {
        let mut server = Self::start();
        server.initialize_default();
        server
    }

    pub(crate) fn storage_dir(&self) -> &Path {
        self.storage.path()
    }

    pub(crate) fn send(&mut self, req: Value) {
        writeln!(self.stdin, "{req}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send_raw(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write line");
        self.stdin.flush().expect("flush line");
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    pub(crate) fn initialize_default(&mut self) {
        let _ = self.request(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": { "name": "test", "version": "0" } }
        }));
        self.send(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        }));
    }

    /// `tools/call` and return the parsed tool envelope.
    pub(crate) fn call(&mut self, name: &str, arguments: Value) -> Value {
        self.next_id += 1;
        let resp = self.request(json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }));
        extract_tool_text(&resp)
    }

    /// Like [`Server::call`] but panics unless the tool succeeded; returns `data`.
    pub(crate) fn call_ok(&mut self, name: &str, arguments: Value) -> Value {
        let payload = self.call(name, arguments);
        assert_eq!(
            payload.get("success").and_then(|v| v.as_bool()),
            Some(true),
            "{name} failed: {payload}"
        );
        payload.get("data").cloned().unwrap_or(Value::Null)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub(crate) fn extract_tool_text(resp: &Value) -> Value {
    let text = resp
        .get("result")
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .expect("result.content[0].text");
    serde_json::from_str(text).expect("tool text is json")
}

pub(crate) fn error_code(payload: &Value) -> Option<&str> {
    payload
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_str())
}

pub(crate) fn assert_json_rpc_error(resp: &Value, expected_code: i64) {
    let code = resp
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_i64())
        .expect("error.code");
    assert_eq!(code, expected_code, "unexpected error: {resp}");
}

/// Create a repository and fill `main` through the store directly, since tools refuse to
/// edit `main`. Returns the repository id.
pub(crate) fn seed_main(storage_dir: &Path) -> i64 {
    use dm_core::ids::BranchName;
    use dm_storage::{NewBlock, NewDoc, NewRepository, SqliteStore};

    let mut store = SqliteStore::open(storage_dir).expect("open store");
    let repo = store
        .repo_create(NewRepository {
            title: "handbook".to_string(),
            ..NewRepository::default()
        })
        .expect("create repo")
        .id;
    let main = BranchName::main();
    let doc = store
        .doc_create(
            repo,
            &main,
            NewDoc {
                title: "Guide".to_string(),
                body: "welcome".to_string(),
                ..NewDoc::default()
            },
        )
        .expect("seed doc");
    store
        .block_create(
            repo,
            &main,
            NewBlock {
                doc_id: doc.id,
                title: "intro".to_string(),
                body: "first block".to_string(),
                order: None,
            },
        )
        .expect("seed block");
    repo.get()
}

pub(crate) fn bare_remote(dir: &Path) -> String {
    let status = Command::new("git")
        .args(["init", "--quiet", "--bare"])
        .arg(dir)
        .status()
        .expect("spawn git init --bare");
    assert!(status.success(), "git init --bare failed");
    dir.to_string_lossy().into_owned()
}
