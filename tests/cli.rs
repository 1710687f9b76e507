//! Binary-level tests for the agentic-rag CLI.

#![allow(clippy::panic)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agentic-rag").unwrap_or_else(|e| panic!("binary: {e}"));
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("AGENTIC_RAG_API_KEY")
        .env_remove("AGENTIC_RAG_STORAGE_DIR")
        .env_remove("AGENTIC_RAG_DATA_DIR")
        .env_remove("AGENTIC_RAG_PROMPT_DIR")
        .env_remove("AGENTIC_RAG_EMBEDDING_BACKEND");
    cmd
}

fn tempdir() -> TempDir {
    TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"))
}

#[test]
fn test_help_lists_commands() {
    let dir = tempdir();
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("router")
                .and(predicate::str::contains("tool-call"))
                .and(predicate::str::contains("agent"))
                .and(predicate::str::contains("multi-doc"))
                .and(predicate::str::contains("build"))
                .and(predicate::str::contains("init-prompts")),
        );
}

#[test]
fn test_missing_api_key() {
    let dir = tempdir();
    cmd(&dir)
        .args(["router"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key missing"));
}

#[test]
fn test_init_prompts_without_api_key() {
    let dir = tempdir();
    let target = dir.path().join("prompts");
    cmd(&dir)
        .args(["init-prompts", "--dir"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 5 prompt template(s)"));
    assert!(target.join("selector.md").exists());
}

#[test]
fn test_missing_document_fails_before_prompting() {
    let dir = tempdir();
    cmd(&dir)
        .env("OPENAI_API_KEY", "test")
        .args(["--embedding-backend", "hash", "router", "--file", "missing.pdf"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.pdf"))
        .stdout(predicate::str::contains("Enter prompt:").not());
}

#[test]
fn test_build_empty_data_dir() {
    let dir = tempdir();
    std::fs::create_dir(dir.path().join("data")).unwrap_or_else(|e| panic!("mkdir: {e}"));
    cmd(&dir)
        .env("OPENAI_API_KEY", "test")
        .args(["--embedding-backend", "hash", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no PDF files found"));
}

#[test]
fn test_build_with_local_embeddings_needs_no_api_key() {
    let dir = tempdir();
    std::fs::create_dir(dir.path().join("papers")).unwrap_or_else(|e| panic!("mkdir: {e}"));
    cmd(&dir)
        .args(["--embedding-backend", "hash", "--data-dir", "papers", "build"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("no PDF files found in papers")
                .and(predicate::str::contains("API key missing").not()),
        );
}

#[test]
fn test_build_with_openai_embeddings_needs_api_key() {
    let dir = tempdir();
    cmd(&dir)
        .args(["build", "x.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key missing"));
}

#[test]
fn test_default_document_read_from_data_dir() {
    let dir = tempdir();
    cmd(&dir)
        .env("OPENAI_API_KEY", "test")
        .args(["--embedding-backend", "hash", "--data-dir", "papers", "agent"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("papers/metagpt.pdf"));
}

#[test]
fn test_unknown_embedding_backend() {
    let dir = tempdir();
    cmd(&dir)
        .env("OPENAI_API_KEY", "test")
        .args(["--embedding-backend", "word2vec", "build", "x.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported embedding backend: word2vec"));
}
