//! End-to-end workflow: add, label, reprocess, compare, delete, clear.
//!
//! Each test runs the `huntdiff` binary in an isolated temp directory with
//! upstream responses replayed from a `--snapshot-dir` fixture tree.

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

struct Project {
    root: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            root: TempDir::new().expect("tempdir"),
        }
    }

    fn snapshots(&self) -> PathBuf {
        self.root.path().join("snapshots")
    }

    /// Write `<snapshots>/<id>/results.json` and `details.json`.
    fn hunt(&self, id: &str, samples: &[(&str, &str)], status: &str, source: &str) {
        let dir = self.snapshots().join(id);
        fs::create_dir_all(&dir).expect("snapshot dir");

        let groups: Vec<Value> = samples
            .iter()
            .map(|(sample_id, subject)| {
                json!({
                    "id": sample_id,
                    "messages": [{
                        "subject": subject,
                        "sender": {"display_name": "Alice", "email": "alice@example.com"},
                        "recipients": [{"email": "bob@example.com"}],
                        "created_at": "2024-01-02T03:04:05Z"
                    }],
                    "flagged_rules": [{"name": "Suspicious link"}]
                })
            })
            .collect();
        fs::write(
            dir.join("results.json"),
            json!({"message_groups": groups}).to_string(),
        )
        .expect("results.json");

        fs::write(
            dir.join("details.json"),
            json!({
                "status": status,
                "range_start_time": "2024-01-01T00:00:00Z",
                "range_end_time": "2024-01-08T00:00:00Z",
                "source": source
            })
            .to_string(),
        )
        .expect("details.json");
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("huntdiff"));
        cmd.current_dir(self.root.path());
        cmd.env("HUNTDIFF_LOG", "off");
        cmd.env("XDG_CONFIG_HOME", self.root.path().join("xdg"));
        cmd.env("HOME", self.root.path());
        for var in [
            "SUBLIME_API_TOKEN",
            "HUNTDIFF_API_URL",
            "HUNTDIFF_DATA_DIR",
            "FORMAT",
            "DEBUG",
        ] {
            cmd.env_remove(var);
        }
        cmd.arg("--snapshot-dir").arg(self.snapshots());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("huntdiff should not crash");
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
    }

    fn ok(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }

    fn state_file(&self) -> PathBuf {
        self.root.path().join(".huntdiff/data/hunt_data.json")
    }
}

fn hunt<'a>(list: &'a Value, id: &str) -> &'a Value {
    list["hunts"]
        .as_array()
        .expect("hunts array")
        .iter()
        .find(|h| h["id"] == id)
        .unwrap_or_else(|| panic!("hunt {id} not listed"))
}

fn setup_pair(project: &Project) {
    project.hunt(
        "hunt-a",
        &[("m1", "Invoice due"), ("m2", "Lunch plans"), ("m3", "Password reset")],
        "COMPLETED",
        "sender.domain == 'abc'",
    );
    project.hunt(
        "hunt-b",
        &[("m1", "Invoice due"), ("m3", "Password reset"), ("m4", "Wire transfer")],
        "COMPLETED",
        "sender.domain == 'abd'",
    );
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn full_labeling_and_comparison_workflow() {
    let project = Project::new();
    setup_pair(&project);

    let added = project.json(&["add", "hunt-a", "--name", "baseline"]);
    assert_eq!(added["stats"]["total_samples"], 3);
    assert_eq!(added["pre_labeled"], 0);
    assert!(exists(&project.state_file()));

    project.ok(&["categorize", "hunt-a", "m1", "tp"]);
    project.ok(&["categorize", "hunt-a", "m2", "false_positive"]);
    project.ok(&["categorize", "hunt-a", "m3", "tp", "--subject", "Password reset"]);

    let added = project.json(&["add", "hunt-b", "--name", "tightened"]);
    assert_eq!(added["pre_labeled"], 2);
    assert_eq!(added["stats"]["unlabeled"], 1);

    project.ok(&["categorize", "hunt-b", "m4", "tp"]);
    let report = project.json(&["reprocess"]);
    assert_eq!(report["hunts"], 2);
    assert_eq!(report["reassigned"], 0);

    let list = project.json(&["list"]);
    assert_eq!(list["labels"], 4);
    let b = hunt(&list, "hunt-b");
    assert_eq!(b["stats"]["true_positives"], 3);
    assert_eq!(b["stats"]["pre_labeled"], 2);
    assert_eq!(b["stats"]["unlabeled"], 0);
    assert_eq!(b["timeframe"]["duration_days"], 7.0);

    let cmp = project.json(&["compare", "hunt-a", "hunt-b"]);
    assert_eq!(cmp["verdict"]["kind"], "success");
    assert_eq!(
        cmp["verdict"]["message"],
        "Rule improvement: Current rule detects all true positives and reduces false positives \
         by 100.0%. Additionally, it found 1 new true positives."
    );
    assert_eq!(cmp["metrics"]["fp_reduction_count"], 1);
    assert_eq!(cmp["eliminated_false_positives"][0]["id"], "m2");
    assert_eq!(cmp["new_true_positives"][0]["id"], "m4");
    assert_eq!(cmp["rule_diff"][1]["op"], "delete");
    assert_eq!(cmp["rule_diff"][1]["text"], "c");
    assert!(cmp["timeframe_warning"].is_null());
}

#[test]
fn delete_reassigns_and_drops_labels() {
    let project = Project::new();
    setup_pair(&project);
    project.ok(&["add", "hunt-a", "--name", "baseline"]);
    project.ok(&["add", "hunt-b", "--name", "tightened"]);
    project.ok(&["mass-categorize", "hunt-a", "fp", "m1", "m2", "m3"]);

    let report = project.json(&["delete", "hunt-a"]);
    assert_eq!(report["reassigned"], 2);
    assert_eq!(report["removed"], 1);
    assert_eq!(report["remaining_hunts"], 1);

    // Cached counts only move on reprocess.
    project.ok(&["reprocess"]);
    let list = project.json(&["list"]);
    assert_eq!(list["labels"], 2);
    assert_eq!(hunt(&list, "hunt-b")["stats"]["false_positives"], 2);

    let view = project.json(&["show", "hunt-b"]);
    let rows = view["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["pre_labeled"] == false));
}

#[test]
fn show_hides_pre_labeled_samples_unless_all() {
    let project = Project::new();
    setup_pair(&project);
    project.ok(&["add", "hunt-a", "--name", "baseline"]);
    project.ok(&["categorize", "hunt-a", "m1", "tp"]);
    project.ok(&["add", "hunt-b", "--name", "tightened"]);

    let view = project.json(&["show", "hunt-b"]);
    assert_eq!(view["hidden_pre_labeled"], 1);
    assert_eq!(view["rows"].as_array().expect("rows").len(), 2);
    assert_eq!(view["first_view"], true);

    let view = project.json(&["show", "hunt-b", "--all"]);
    assert_eq!(view["first_view"], false);
    let rows = view["rows"].as_array().expect("rows");
    let m1 = rows.iter().find(|r| r["id"] == "m1").expect("m1 row");
    assert_eq!(m1["labeled_in"], "hunt-a");
    assert_eq!(m1["sender"], "Alice <alice@example.com>");
}

#[test]
fn diff_files_in_text_mode() {
    let project = Project::new();
    fs::write(project.root.path().join("old.txt"), "abc").expect("old");
    fs::write(project.root.path().join("new.txt"), "abd").expect("new");

    project
        .cmd()
        .args(["--format", "text", "diff", "old.txt", "new.txt"])
        .assert()
        .success()
        .stdout("ab[-c-]{+d+}\n");
}

#[test]
fn clear_removes_everything() {
    let project = Project::new();
    setup_pair(&project);
    project.ok(&["add", "hunt-a", "--name", "baseline"]);
    project.ok(&["categorize", "hunt-a", "m1", "tp"]);

    let report = project.json(&["clear", "--force"]);
    assert_eq!(report["hunts"], 1);
    assert_eq!(report["labels"], 1);

    let list = project.json(&["list"]);
    assert_eq!(list["hunts"].as_array().map(Vec::len), Some(0));
}
