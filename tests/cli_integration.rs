//! CLI integration tests
//!
//! These tests run the compiled binary and verify:
//! - Help and version output
//! - Configuration errors and their exit code
//! - Output formats and exit codes of real runs

mod support;

use std::process::Command;
use support::{catalog, pomalign_bin, Scratch};

#[test]
fn test_cli_help() {
    let output = Command::new(pomalign_bin())
        .arg("--help")
        .output()
        .expect("Failed to execute pomalign");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pomalign"));
    assert!(stdout.contains("realign"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(pomalign_bin())
        .arg("--version")
        .output()
        .expect("Failed to execute pomalign");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_bom_exits_with_config_error() {
    let scratch = Scratch::from_fixture("multimodule");
    let output = Command::new(pomalign_bin())
        .arg("realign")
        .arg(&scratch.tree)
        .output()
        .expect("Failed to execute pomalign");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No BOM specified"));
    // Nothing was touched
    assert!(scratch.read("core/pom.xml").contains("1.7.36"));
}

#[test]
fn test_unknown_modder_exits_with_config_error() {
    let scratch = Scratch::from_fixture("multimodule");
    let output = Command::new(pomalign_bin())
        .arg("realign")
        .arg(&scratch.tree)
        .args(["--bom", &catalog("platform-bom.pom")])
        .args(["--modders", "bom-realign,teleport"])
        .output()
        .expect("Failed to execute pomalign");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown modder 'teleport'"));
}

#[test]
fn test_realign_json_output() {
    let scratch = Scratch::from_fixture("multimodule");
    let output = Command::new(pomalign_bin())
        .arg("-q")
        .arg("realign")
        .arg(&scratch.tree)
        .args(["--bom", &catalog("platform-bom.pom")])
        .arg("--workspace")
        .arg(&scratch.workspace)
        .arg("--local-repo")
        .arg(&scratch.repo)
        .args(["--format", "json"])
        .output()
        .expect("Failed to execute pomalign");

    // Quiet mode suppresses the summary
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());

    // A second, non-quiet run reports no changes
    let output = Command::new(pomalign_bin())
        .arg("realign")
        .arg(&scratch.tree)
        .args(["--bom", &catalog("platform-bom.pom")])
        .arg("--workspace")
        .arg(&scratch.workspace)
        .arg("--local-repo")
        .arg(&scratch.repo)
        .args(["--format", "json"])
        .env("POMALIGN_LOG_LEVEL", "error")
        .output()
        .expect("Failed to execute pomalign");

    assert_eq!(output.status.code(), Some(0));
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(summary["loaded"], 3);
    assert_eq!(summary["changed"], 0);
    assert_eq!(summary["boms"][0], "org.platform:platform-bom:7");
}

#[test]
fn test_capture_sets_attention_exit_code() {
    let scratch = Scratch::empty();
    scratch.write(
        "pom.xml",
        r#"<project>
    <groupId>org.example</groupId>
    <artifactId>lonely</artifactId>
    <version>1</version>
    <dependencies>
        <dependency>
            <groupId>org.unknown</groupId>
            <artifactId>thing</artifactId>
            <version>0.3</version>
        </dependency>
    </dependencies>
</project>
"#,
    );
    let capture = scratch.workspace.join("capture.pom");

    let output = Command::new(pomalign_bin())
        .arg("realign")
        .arg(&scratch.tree)
        .args(["--bom", &catalog("platform-bom.pom")])
        .arg("--workspace")
        .arg(&scratch.workspace)
        .arg("--local-repo")
        .arg(&scratch.repo)
        .arg("--capture")
        .arg(&capture)
        .output()
        .expect("Failed to execute pomalign");

    assert_eq!(output.status.code(), Some(2));
    assert!(capture.is_file());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Realignment Result"));
    assert!(stdout.contains("(capture)"));
}
