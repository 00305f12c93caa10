//! CLI smoke tests for the sitepack binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn sitepack_binary() -> &'static str {
    env!("CARGO_BIN_EXE_sitepack")
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(sitepack_binary())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute sitepack")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "sitepack.toml",
        r#"
site = "https://relocation.quest"

[[integrations]]
name = "sitemap"

[bundling.manual_chunks]
vendor = ["js/graphql.js"]
"#,
    );
    write(temp.path(), "src/pages/index.html", "<h1>Home</h1>");
    write(temp.path(), "src/js/app.js", "import './graphql.js';");
    write(temp.path(), "src/js/graphql.js", "export const gql = 1;");
    temp
}

#[test]
fn test_check_reports_config() {
    let project = create_project();
    let output = run_in(project.path(), &["check"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.contains("Site: https://relocation.quest"));
    assert!(text.contains("1. sitemap"));
    assert!(text.contains("vendor: js/graphql.js"));
    assert!(text.contains("Config OK"));
}

#[test]
fn test_chunks_lookup() {
    let project = create_project();
    let output = run_in(project.path(), &["chunks", "js/graphql.js", "js/app.js"]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "js/graphql.js\tvendor\njs/app.js\t(auto)\n");
}

#[test]
fn test_chunks_requires_specifier() {
    let project = create_project();
    let output = run_in(project.path(), &["chunks"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_build_dry_run_writes_nothing() {
    let project = create_project();
    let output = run_in(project.path(), &["build", "--dry-run"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.contains("would write chunks/vendor.js"));
    assert!(text.contains("would write sitemap.xml"));
    assert!(!project.path().join("dist").exists());
}

#[test]
fn test_build_writes_site() {
    let project = create_project();
    let output = run_in(project.path(), &["build", "--out", "public_html"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let out = project.path().join("public_html");
    assert!(out.join("index.html").is_file());
    assert!(out.join("js/app.js").is_file());
    assert!(out.join("chunks/vendor.js").is_file());
    assert!(fs::read_to_string(out.join("sitemap.xml")).unwrap().contains("https://relocation.quest/"));
}

#[test]
fn test_build_log_has_no_color_codes_when_redirected() {
    let project = create_project();
    let output = run_in(project.path(), &["build", "--dry-run"]);

    assert!(output.status.success());
    let log = String::from_utf8_lossy(&output.stderr);
    assert!(log.contains("Build"), "stderr: {}", log);
    assert!(!log.contains('\x1b'), "stderr: {}", log);
}

#[test]
fn test_build_rejects_zero_jobs() {
    let project = create_project();
    let output = run_in(project.path(), &["build", "--jobs", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_check_fails_on_unknown_integration() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "sitepack.toml", "[[integrations]]\nname = \"tailwind\"\n");

    let output = run_in(temp.path(), &["check"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tailwind"));
}
