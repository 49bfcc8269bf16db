//! CLI integration tests for the form-logic binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("form-logic"))
}

// Helper to create a temp file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const EMPLOYMENT_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["status"],
    "properties": {
        "status": { "type": "string", "x-label": "Status", "x-order": 1 },
        "employer": { "type": "string", "x-label": "Employer", "x-order": 2 },
        "unemploymentReason": { "type": "string", "x-label": "Reason", "x-order": 3 },
        "birthDate": {
            "type": "string",
            "x-label": "Date of birth",
            "x-order": 4,
            "x-source": { "type": "date", "data": { "minAge": 18 } }
        }
    },
    "if": { "properties": { "status": { "const": "employed" } } },
    "then": { "required": ["employer"] },
    "else": { "required": ["unemploymentReason"] }
}"#;

mod evaluate_command {
    use super::*;

    #[test]
    fn reports_field_states() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", r#"{"status": "employed"}"#);

        cmd()
            .args(["evaluate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"key":"employer","label":"Employer","visible":true,"required":true,"errors":["Employer is required"]}"#,
            ))
            .stdout(predicate::str::contains(
                r#"{"key":"unemploymentReason","label":"Reason","visible":false,"required":false}"#,
            ))
            .stdout(predicate::str::contains(r#""isValid":false"#));
    }

    #[test]
    fn evaluate_with_pretty() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", "{}");

        cmd()
            .args([
                "evaluate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--pretty",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("{\n"));
    }

    #[test]
    fn evaluate_with_output_file() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", r#"{"status": "unemployed"}"#);
        let output = dir.path().join("report.json");

        cmd()
            .args([
                "evaluate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        let content = fs::read_to_string(&output).unwrap();
        let report: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(report["errors"]["unemploymentReason"][0], "Reason is required");
    }

    #[test]
    fn evaluate_uses_today_flag() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(
            &dir,
            "data.json",
            r#"{"status": "unemployed", "unemploymentReason": "moving", "birthDate": "2008-10-19"}"#,
        );

        cmd()
            .args([
                "evaluate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--today",
                "2026-10-18",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("You must be at least 18 years old"));

        cmd()
            .args([
                "evaluate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--today",
                "2026-10-19",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""isValid":true"#));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn validate_valid_data() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(
            &dir,
            "data.json",
            r#"{"status": "employed", "employer": "Acme"}"#,
        );

        cmd()
            .args(["validate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn validate_missing_branch_field() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", r#"{"status": "unemployed"}"#);

        cmd()
            .args(["validate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "unemploymentReason: Reason is required",
            ));
    }

    #[test]
    fn validate_ignores_hidden_stale_values() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{
                "properties": {
                    "hasPet": { "type": "boolean" },
                    "petName": {
                        "type": "string",
                        "minLength": 3,
                        "x-required_if": { "field": "hasPet", "value": true, "operator": "eq" }
                    }
                }
            }"#,
        );
        let data = write_temp_file(&dir, "data.json", r#"{"hasPet": false, "petName": "x"}"#);

        cmd()
            .args(["validate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .success();
    }

    #[test]
    fn validate_json_output_valid() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(
            &dir,
            "data.json",
            r#"{"status": "unemployed", "unemploymentReason": "moving"}"#,
        );

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""isValid":true"#));
    }

    #[test]
    fn validate_json_output_invalid() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", "{}");

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""isValid":false"#))
            .stdout(predicate::str::contains(r#""status":["Status is required"]"#));
    }

    #[test]
    fn strict_operators_flag() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{
                "properties": {
                    "pets": { "type": "number" },
                    "petName": {
                        "type": "string",
                        "x-required_if": { "field": "pets", "value": 0, "operator": "gt" }
                    }
                }
            }"#,
        );
        let data = write_temp_file(&dir, "data.json", r#"{"pets": 2}"#);

        cmd()
            .args(["validate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args([
                "validate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--strict-operators",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("only \"eq\" is evaluated"));
    }
}

mod error_handling {
    use super::*;

    #[test]
    fn schema_not_found() {
        let dir = TempDir::new().unwrap();
        let data = write_temp_file(&dir, "data.json", "{}");

        cmd()
            .args(["validate", "/nonexistent/schema.json", data.to_str().unwrap()])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn invalid_json_schema() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", "{ not json }");
        let data = write_temp_file(&dir, "data.json", "{}");

        cmd()
            .args(["evaluate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid JSON"));
    }

    #[test]
    fn data_must_be_object() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", r#"["employed"]"#);

        cmd()
            .args(["validate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must be a JSON object"));
    }

    #[test]
    fn malformed_pattern() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"properties": {"zip": {"type": "string", "pattern": "[0-9"}}}"#,
        );
        let data = write_temp_file(&dir, "data.json", r#"{"zip": "123"}"#);

        cmd()
            .args(["validate", schema.to_str().unwrap(), data.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid pattern"));
    }

    #[test]
    fn invalid_today_flag() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);
        let data = write_temp_file(&dir, "data.json", "{}");

        cmd()
            .args([
                "evaluate",
                schema.to_str().unwrap(),
                data.to_str().unwrap(),
                "--today",
                "yesterday",
            ])
            .assert()
            .failure();
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn lint_clean_directory() {
        let dir = TempDir::new().unwrap();
        write_temp_file(&dir, "employment.json", EMPLOYMENT_SCHEMA);

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 files checked, all passed"));
    }

    #[test]
    fn lint_reports_errors() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "bad.json",
            r#"{"properties": {"zip": {"type": "string", "pattern": "[0-9"}}}"#,
        );

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("E003"));
    }

    #[test]
    fn lint_json_format() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", EMPLOYMENT_SCHEMA);

        cmd()
            .args(["lint", schema.to_str().unwrap(), "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""files_checked": 1"#));
    }

    #[test]
    fn lint_strict_fails_on_warnings() {
        let dir = TempDir::new().unwrap();
        write_temp_file(
            &dir,
            "warn.json",
            r#"{
                "properties": { "status": { "type": "string" } },
                "if": { "properties": { "status": { "const": "x" } } }
            }"#,
        );

        cmd()
            .args(["lint", dir.path().to_str().unwrap()])
            .assert()
            .success();

        cmd()
            .args(["lint", dir.path().to_str().unwrap(), "--strict"])
            .assert()
            .code(1);
    }

    #[test]
    fn lint_missing_path() {
        cmd()
            .args(["lint", "/nonexistent/dir"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("path not found"));
    }
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_flag() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("evaluate"))
            .stdout(predicate::str::contains("validate"))
            .stdout(predicate::str::contains("lint"));
    }

    #[test]
    fn version_flag() {
        cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("form-logic"));
    }
}

/// Remote schema loading against a local mock server
#[cfg(feature = "remote")]
mod remote {
    use super::*;

    #[test]
    fn validate_with_remote_schema() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/employment.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(EMPLOYMENT_SCHEMA)
            .create();

        let dir = TempDir::new().unwrap();
        let data = write_temp_file(
            &dir,
            "data.json",
            r#"{"status": "employed", "employer": "Acme"}"#,
        );

        cmd()
            .args([
                "validate",
                &format!("{}/employment.json", server.url()),
                data.to_str().unwrap(),
            ])
            .assert()
            .success();
    }

    #[test]
    fn remote_schema_404() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/missing.json").with_status(404).create();

        let dir = TempDir::new().unwrap();
        let data = write_temp_file(&dir, "data.json", "{}");

        cmd()
            .args([
                "validate",
                &format!("{}/missing.json", server.url()),
                data.to_str().unwrap(),
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("failed to fetch"));
    }
}
