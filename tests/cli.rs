use std::process::{Command, Output};

fn run_cmd(args: &[&str]) -> Output {
    let home = std::env::temp_dir().join("push50-cli-test-home");
    Command::new(env!("CARGO_BIN_EXE_push50"))
        .args(args)
        .env("NO_COLOR", "1")
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("PUSH50_LOCAL_PATH", home.join("mirrors"))
        .output()
        .expect("run command")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn leading_slash_is_rejected_with_suggestion() {
    let out = run_cmd(&["connect", "/cs50/problems/master/hello", "check50"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Did you mean cs50/problems/master/hello, without the leading slash?"));
}

#[test]
fn trailing_slash_is_rejected_with_suggestion() {
    let out = run_cmd(&["connect", "cs50/problems/master/hello/", "check50", "--offline"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("without the trailing slash"));
}

#[test]
fn slug_without_branch_is_rejected() {
    let out = run_cmd(&["connect", "cs50/problems", "check50", "--offline"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Invalid slug: cs50/problems"));
}

#[test]
fn offline_without_mirror_is_rejected() {
    let out = run_cmd(&["connect", "cs50/problems/master/hello", "check50", "--offline"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Invalid slug: cs50/problems/master/hello"));
}

#[test]
fn subcommand_is_required() {
    let out = run_cmd(&[]);
    assert!(!out.status.success());
}
