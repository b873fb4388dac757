#![forbid(unsafe_code)]

mod support;
use support::*;

use serde_json::json;
use tempfile::TempDir;

#[test]
fn commit_is_a_noop_when_nothing_changed() {
    let mut server = Server::start_initialized();
    let repo = seed_main(server.storage_dir());
    server.call_ok("branch_create", json!({ "repoId": repo, "name": "exp" }));

    let first = server.call_ok("commit", json!({ "repoId": repo }));
    assert_eq!(first["commit"], json!(null), "exp starts identical to main");
    assert_eq!(first["docs"], json!(1));
    assert_eq!(first["blocks"], json!(1));

    server.call_ok("doc_create", json!({ "repoId": repo, "title": "Notes" }));
    let second = server.call_ok("commit", json!({ "repoId": repo, "message": "notes" }));
    assert!(second["commit"].is_string());
    let third = server.call_ok("commit", json!({ "repoId": repo }));
    assert_eq!(third["commit"], json!(null));

    let remote_dir = TempDir::new().expect("remote dir");
    let remote = bare_remote(remote_dir.path());
    let status = server.call_ok("status", json!({ "repoId": repo, "remoteUrl": remote }));
    assert_eq!(status["branch"], json!("exp"));
    assert_eq!(status["hasLocalBranch"], json!(true));
    assert_eq!(status["hasRemote"], json!(true));
    assert_eq!(status["hasRemoteBranch"], json!(false));
    assert_eq!(status["ahead"], json!(2));
    assert_eq!(status["lastCommit"]["message"], json!(format!("repo-{repo}/system/docmirror: notes")));
}

#[test]
fn push_and_pull_through_a_bare_remote() {
    let remote_dir = TempDir::new().expect("remote dir");
    let remote = bare_remote(remote_dir.path());

    let mut writer = Server::start_initialized();
    let repo = seed_main(writer.storage_dir());
    let missing = writer.call("push", json!({ "repoId": repo, "branch": "main" }));
    assert_eq!(error_code(&missing), Some("READ_ONLY_BRANCH"));

    writer.call_ok("branch_create", json!({ "repoId": repo, "name": "exp" }));
    let no_remote = writer.call("push", json!({ "repoId": repo }));
    assert_eq!(error_code(&no_remote), Some("NOT_FOUND"));

    let updated = writer.call_ok("repo_set_remote", json!({ "repoId": repo, "remoteUrl": remote }));
    assert_eq!(updated["remoteUrl"], json!(remote));
    writer.call_ok("doc_create", json!({ "repoId": repo, "title": "Shared", "body": "hello" }));
    writer.call_ok("commit", json!({ "repoId": repo }));
    let pushed = writer.call_ok("push", json!({ "repoId": repo }));
    assert_eq!(pushed["setUpstream"], json!(true));

    let status = writer.call_ok("status", json!({ "repoId": repo }));
    assert_eq!(status["hasRemoteBranch"], json!(true));
    assert_eq!(status["ahead"], json!(0));
    assert_eq!(status["behind"], json!(0));
    assert_eq!(status["sync"]["state"], json!("pushed"));

    let info = writer.call_ok("remote_verify", json!({ "url": remote }));
    assert_eq!(info["branches"], json!(["exp"]));

    let mut reader = Server::start_initialized();
    let created = reader.call_ok(
        "repo_create",
        json!({ "title": "mirror", "remoteUrl": remote, "displayMode": "list" }),
    );
    assert_eq!(created["displayMode"], json!("list"));
    let mirror = created["id"].as_i64().expect("repo id");

    let pulled = reader.call_ok("pull", json!({ "repoId": mirror, "branch": "exp" }));
    assert_eq!(pulled["docs"], json!(2));
    assert_eq!(pulled["blocks"], json!(1));

    let tree = reader.call_ok("doc_query", json!({ "repoId": mirror, "branch": "exp" }));
    let titles: Vec<&str> = tree["tree"]
        .as_array()
        .expect("tree")
        .iter()
        .map(|doc| doc["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Guide", "Shared"]);

    let branches = reader.call_ok("branch_list", json!({ "repoId": mirror }));
    assert_eq!(branches["current"], json!("main"));
    assert_eq!(branches["branches"][1]["name"], json!("exp"));
    assert_eq!(branches["branches"][1]["sync"]["state"], json!("pushed"));

    let cleared = reader.call_ok("repo_set_remote", json!({ "repoId": mirror, "remoteUrl": null }));
    assert_eq!(cleared["remoteUrl"], json!(null));
}

#[test]
fn unreachable_remote_reports_vcs_error() {
    let mut server = Server::start_initialized();
    let missing = server.storage_dir().join("nowhere.git");
    let payload = server.call(
        "remote_verify",
        json!({ "url": missing.to_string_lossy() }),
    );
    assert_eq!(error_code(&payload), Some("VCS_ERROR"));

    let blank = server.call("remote_verify", json!({ "url": "  " }));
    assert_eq!(error_code(&blank), Some("INVALID_INPUT"));
}
