#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LPSTAT: &str = r#"
case "$1" in
  -d) echo "system default destination: Office" ;;
  *)
    echo "printer Office is idle.  enabled since Mon 01 Jan 2024 09:00:00"
    echo "	Description: Front office laser"
    echo "	Location: Floor 1"
    echo "printer Label disabled since Mon 01 Jan 2024 09:00:00 -"
    echo "	Description: Label printer"
    ;;
esac
"#;

/// Writes a PDF signature followed by the HTML Chrome was asked to print.
const CHROME: &str = r#"
for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) out="${arg#--print-to-pdf=}" ;;
    file://*) input="${arg#file://}" ;;
  esac
done
printf '%%PDF-1.4\n' > "$out"
cat "$input" >> "$out"
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let cards = root.join("templates").join("cards");
        fs::create_dir_all(&cards).unwrap();
        fs::write(cards.join("template.html"), "<html><head></head><body><p>{{ firstname }} {{ lastname }}</p></body></html>")
            .unwrap();
        fs::write(cards.join("options.json"), r#"{ "format": "A5", "orientation": "landscape" }"#).unwrap();

        let bin = root.join("bin");
        fs::create_dir_all(&bin).unwrap();
        let jobs = root.join("jobs.log");
        script(&bin.join("lpstat"), LPSTAT);
        script(
            &bin.join("lp"),
            &format!(
                "cat > /dev/null\necho \"$@\" >> '{}'\necho \"request id is $2-$$ (1 file(s))\"\n",
                jobs.display()
            ),
        );
        script(&bin.join("chrome"), CHROME);
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let path = format!("{}:{}", self.path().join("bin").display(), std::env::var("PATH").unwrap_or_default());
        let mut command = Command::cargo_bin("plastic").unwrap();
        command
            .current_dir(self.path())
            .env("PATH", path)
            .env("PLASTIC_CONFIG", self.path().join("missing.toml"))
            .env("PLASTIC_CHROME", self.path().join("bin").join("chrome"))
            .env("PLASTIC_TEMPLATE_PATH", self.path().join("templates"))
            .env_remove("PLASTIC_FORMAT")
            .env_remove("RUST_LOG");
        command
    }

    fn jobs(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("jobs.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn script(path: &PathBuf, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_no_arguments_prints_help() {
    let fixture = Fixture::new();
    fixture.command().assert().success().stdout(predicate::str::contains("Usage:"));
    fixture.command().arg("h").assert().success().stdout(predicate::str::contains("printers"));
}

#[test]
fn test_printers_as_json() {
    let fixture = Fixture::new();
    let output = fixture.command().args(["printers", "--format", "json"]).assert().success().get_output().clone();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    let printers = value.as_array().unwrap();
    assert_eq!(printers.len(), 2);
    assert_eq!(printers[0]["name"], "Office");
    assert_eq!(printers[0]["description"], "Front office laser");
    assert_eq!(printers[0]["default"], true);
    assert_eq!(printers[1]["name"], "Label");
    assert_eq!(printers[1]["state"], "disabled");
}

#[test]
fn test_printers_as_table() {
    let fixture = Fixture::new();
    fixture
        .command()
        .arg("ps")
        .assert()
        .success()
        .stdout(predicate::str::contains("╔").and(predicate::str::contains("Office")).and(predicate::str::contains("Label")));
}

#[test]
fn test_print_to_file() {
    let fixture = Fixture::new();
    fixture
        .command()
        .args(["print", "cards", r#"{"firstname":"Jane","lastname":"Doe"}"#, "--output", "card.pdf"])
        .assert()
        .success();
    let pdf = fs::read_to_string(fixture.path().join("card.pdf")).unwrap();
    assert!(pdf.starts_with("%PDF-"));
    assert!(pdf.contains("<p>Jane Doe</p>"));
    assert!(fixture.jobs().is_empty());
}

#[test]
fn test_print_to_stdout() {
    let fixture = Fixture::new();
    fixture
        .command()
        .args(["p", "cards", r#"{"firstname":"Jane","lastname":"<Doe>"}"#])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("%PDF-").and(predicate::str::contains("Jane &lt;Doe&gt;")));
}

#[test]
fn test_print_to_printer_by_name() {
    let fixture = Fixture::new();
    let output = fixture
        .command()
        .args(["print", "cards", r#"{"firstname":"Jane"}"#, "-p", "Office", "-f", "json", "--docname", "badge"])
        .assert()
        .success()
        .get_output()
        .clone();
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["job"].as_str().unwrap().starts_with("Office-"));
    assert_eq!(fixture.jobs(), ["-d Office -t badge -o raw"]);
}

#[test]
fn test_print_csv_batch() {
    let fixture = Fixture::new();
    fs::write(fixture.path().join("people.csv"), "Jane,Doe\nJohn,Smith\nAda,Lovelace\n").unwrap();
    fixture
        .command()
        .args(["print", "cards", "people.csv", "--input", "csv", "--printer", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("record 0").and(predicate::str::contains("record 2")));
    let jobs = fixture.jobs();
    assert_eq!(jobs.len(), 3);
    assert!(jobs.iter().all(|job| job.starts_with("-d Label ")));
}

#[test]
fn test_batch_to_file_rejected() {
    let fixture = Fixture::new();
    fixture
        .command()
        .args(["print", "cards", r#"[{"firstname":"A"},{"firstname":"B"}]"#, "-o", "cards.pdf"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Multiple documents can only be sent to the print queue"));
    assert!(!fixture.path().join("cards.pdf").exists());
}

#[test]
fn test_unknown_printer() {
    let fixture = Fixture::new();
    fixture
        .command()
        .args(["print", "cards", "{}", "-p", "7", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\""));
    assert!(fixture.jobs().is_empty());
}

#[test]
fn test_unsupported_input_format() {
    let fixture = Fixture::new();
    fixture
        .command()
        .args(["print", "cards", "{}", "--input", "xml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid input format"));
}

#[test]
fn test_missing_options_file() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.path().join("templates").join("cards").join("options.json")).unwrap();
    fixture
        .command()
        .args(["print", "cards", "{}", "-o", "card.pdf"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("error:").and(predicate::str::contains("options.json")));
}

#[test]
fn test_template_path_flag_overrides_environment() {
    let fixture = Fixture::new();
    fixture
        .command()
        .args(["print", "cards", "{}", "-o", "card.pdf", "--template-path", "/nonexistent"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("not found"));
}
