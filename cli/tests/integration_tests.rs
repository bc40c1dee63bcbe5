//! End-to-end tests for the `script-inspect` binary.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const HELLO: &str = r#"# /// script
# title = "Hello World"
# description = "Prints a greeting"
# dependencies = [
#   "typer",
# ]
# ///

import typer

app = typer.Typer()


@app.command()
def greet(name: str, count: int = 1):
    """Say hello."""
    typer.echo(name * count)
"#;

const CLEANUP: &str = r#"# /// script
# title = "Cleanup"
# external_source = "https://mirror.example.org/cleanup.py"
# ///

import typer

app = typer.Typer()


@app.command("purge")
def purge(days: int = 30, *, force: bool = False):
    pass
"#;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_script-inspect"))
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run script-inspect")
}

fn write_collection(dir: &Path) {
    let hello = dir.join("hello-world");
    fs::create_dir_all(&hello).unwrap();
    fs::write(hello.join("0.1.0.py"), HELLO).unwrap();
    fs::write(dir.join("cleanup.py"), CLEANUP).unwrap();
    fs::write(dir.join("notes.md"), "# not a script\n").unwrap();
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("Invalid JSON output: {e}\n{stdout}"))
}

#[test]
fn metadata_json_output_keeps_file_order() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path());
    let input = dir.path().join("hello-world/0.1.0.py");

    let output = run(&["metadata", "--input", input.to_str().unwrap()]);
    let parsed = stdout_json(&output);

    assert_eq!(parsed["entries"]["title"], "Hello World");
    assert_eq!(parsed["entries"]["dependencies"], serde_json::json!(["typer"]));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let title = stdout.find("\"title\"").unwrap();
    let description = stdout.find("\"description\"").unwrap();
    let dependencies = stdout.find("\"dependencies\"").unwrap();
    assert!(title < description && description < dependencies, "{stdout}");
}

#[test]
fn metadata_reads_stdin() {
    let mut child = Command::new(bin())
        .args(["metadata", "--format", "yaml"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn script-inspect");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(CLEANUP.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("title: Cleanup"), "{stdout}");
    assert!(stdout.contains("script_source:"), "{stdout}");
    assert!(
        stdout.contains("https://mirror.example.org/cleanup.py"),
        "{stdout}"
    );
}

#[test]
fn commands_markdown_renders_wrappers() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path());
    let input = dir.path().join("hello-world/0.1.0.py");

    let output = run(&[
        "commands",
        "--format",
        "markdown",
        "--input",
        input.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("### `greet`"), "{stdout}");
    assert!(
        stdout.contains("def helloworld_greet(name: str, count: int = 1):"),
        "{stdout}"
    );
}

#[test]
fn commands_json_reports_keyword_only_parameters() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path());
    let input = dir.path().join("cleanup.py");

    let parsed = stdout_json(&run(&["commands", "--input", input.to_str().unwrap()]));
    assert_eq!(parsed[0]["name"], "purge");
    assert_eq!(parsed[0]["marker"]["explicit_name"], "purge");
    assert_eq!(parsed[0]["parameters"][1]["name"], "force");
    assert_eq!(parsed[0]["parameters"][1]["kind"], "keyword_only");
    assert_eq!(
        parsed[0]["parameters"][0]["default"],
        serde_json::json!({"kind": "literal", "value": {"type": "int", "value": 30}})
    );
}

#[test]
fn inspect_synthesizes_script_source_from_base_url() {
    let dir = tempfile::tempdir().unwrap();
    write_collection(dir.path());
    let input = dir.path().join("hello-world/0.1.0.py");

    let parsed = stdout_json(&run(&[
        "inspect",
        "--input",
        input.to_str().unwrap(),
        "--base-url",
        "https://example.org/scripts",
    ]));
    assert_eq!(parsed["path"], "hello-world/0.1.0.py");
    assert_eq!(parsed["identifier_seed"], "hello-world");
    assert_eq!(
        parsed["metadata"]["script_source"],
        "https://example.org/scripts/hello-world/0.1.0.py"
    );
    assert_eq!(parsed["commands"][0]["name"], "greet");
}

#[test]
fn catalog_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    write_collection(&scripts);
    let out = dir.path().join("dist").join("catalog.json");

    let output = run(&[
        "catalog",
        scripts.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--name",
        "demo",
        "--jobs",
        "2",
    ]);
    assert!(
        output.status.success(),
        "catalog failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cataloged 2 script(s)"), "{stdout}");

    let catalog: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(catalog["name"], "demo");
    assert_eq!(catalog["schema_version"], "1.0.0");
    let ids: Vec<&str> = catalog["scripts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["cleanup", "helloworld"]);
}

#[test]
fn catalog_of_single_file_reports_path_from_its_collection() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    write_collection(&scripts);
    let input = scripts.join("hello-world/0.1.0.py");

    let parsed = stdout_json(&run(&["catalog", input.to_str().unwrap()]));
    assert_eq!(parsed["scripts"][0]["identifier"], "helloworld");
    assert_eq!(parsed["scripts"][0]["path"], "hello-world/0.1.0.py");
}

#[test]
fn catalog_keeps_latest_version_of_each_script() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    write_collection(&scripts);
    fs::write(scripts.join("hello-world/0.2.0.py"), HELLO).unwrap();

    let parsed = stdout_json(&run(&["catalog", scripts.to_str().unwrap()]));
    let records = parsed["scripts"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    let hello = records
        .iter()
        .find(|s| s["identifier"] == "helloworld")
        .unwrap();
    assert_eq!(hello["path"], "hello-world/0.2.0.py");
}

#[test]
fn catalog_uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = dir.path().join("scripts");
    write_collection(&scripts);
    let config = dir.path().join("script-manifest.yml");
    fs::write(
        &config,
        "base_url: https://example.org/tools\nexclude:\n  - cleanup.py\ncatalog:\n  name: from-config\n",
    )
    .unwrap();

    let parsed = stdout_json(&run(&[
        "--config",
        config.to_str().unwrap(),
        "catalog",
        scripts.to_str().unwrap(),
    ]));
    assert_eq!(parsed["name"], "from-config");
    assert_eq!(parsed["scripts"].as_array().unwrap().len(), 1);
    assert_eq!(
        parsed["scripts"][0]["metadata"]["script_source"],
        "https://example.org/tools/hello-world/0.1.0.py"
    );
}

#[test]
fn invalid_config_fails_with_error_message() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.yml");
    fs::write(&config, "extractor:\n  marker_attributes: []\n").unwrap();
    let input = dir.path().join("x.py");
    fs::write(&input, "").unwrap();

    let output = run(&[
        "commands",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: Failed to load config"), "{stderr}");
    assert!(stderr.contains("marker_attributes"), "{stderr}");
}

#[test]
fn catalog_rejects_missing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let output = run(&["catalog", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}
