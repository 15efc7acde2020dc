//! End-to-end tests driving the `valet` binary.
//!
//! Covers a day's flow: init → check-ins/outs → corrections → reports →
//! publish → history, all against a temporary data directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn valet_binary() -> String {
    env!("CARGO_BIN_EXE_valet").to_string()
}

struct Sandbox {
    temp: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("valet.toml");
        std::fs::write(
            &config,
            format!(
                r#"
data_dir = "{}"
regular_tags = "wa1 wa2 wa3 wa4 wa5 wb1 wb2 wb3"
oversize_tags = "bf1 bf2"
retired_tags = "wb3"
time_open = "07:00"
time_closed = "18:00"
"#,
                temp.path().join("data").display()
            ),
        )
        .unwrap();
        Self { temp, config }
    }

    fn datafile(&self) -> PathBuf {
        self.temp.path().join("data/valet_2024-06-01.dat")
    }

    fn home(&self) -> &Path {
        self.temp.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(valet_binary())
            .env("HOME", self.home())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("XDG_DATA_HOME")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .arg("--date")
            .arg("2024-06-01")
            .args(args)
            .output()
            .expect("failed to run valet")
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "valet {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(!output.status.success(), "valet {args:?} should fail");
        String::from_utf8(output.stderr).unwrap()
    }
}

/// A full day: check-ins, a correction, reports, then publishing.
#[test]
fn test_day_flow() {
    let sandbox = Sandbox::new();

    let out = sandbox.ok(&["init"]);
    assert!(out.starts_with("Started "), "{out}");
    assert!(sandbox.datafile().exists());

    sandbox.ok(&["in", "wa3", "9:00"]);
    sandbox.ok(&["in", "bf1", "10:00"]);
    sandbox.ok(&["out", "wa3", "9:45"]);
    sandbox.ok(&["in", "wa1", "8:00"]);
    sandbox.ok(&["in", "wa2", "8:15"]);
    sandbox.ok(&["out", "wa1", "8:20"]);

    let out = sandbox.ok(&["query", "wa3", "--as-of", "12:00"]);
    assert_eq!(out, "wa3: in at 09:00, out at 09:45 (0:45)\n");

    // an edit that would put check-out before check-in is refused
    let err = sandbox.fails(&["edit", "wa3", "out", "8:30"]);
    assert!(err.contains("would be earlier than check-in 09:00"), "{err}");
    let out = sandbox.ok(&["query", "wa3", "--as-of", "12:00"]);
    assert_eq!(out, "wa3: in at 09:00, out at 09:45 (0:45)\n");

    sandbox.ok(&["delete", "wa3", "out"]);
    let out = sandbox.ok(&["query", "wa3", "--as-of", "12:00"]);
    assert_eq!(out, "wa3: in at 09:00, still here\n");

    let out = sandbox.ok(&["blocks", "--as-of", "8:29"]);
    assert!(out.contains("\n08:00     2    1       2        1     2\n"), "{out}");

    let out = sandbox.ok(&["audit", "--as-of", "10:00", "--leftover", "3"]);
    assert!(out.contains("Bikes on hand:        2 regular   1 oversize   3 total"), "{out}");
    assert!(out.ends_with("Leftover count matches: 3 bikes.\n"), "{out}");

    sandbox.ok(&["note", "wa2", "has", "a", "flat"]);
    sandbox.ok(&["note", "Closes: early if it storms"]);
    let out = sandbox.ok(&["registrations", "+3"]);
    assert_eq!(out, "There are 3 registrations\n");
    sandbox.ok(&["registrations", "-1"]);
    let out = sandbox.ok(&["hours", "7:30", "18:00"]);
    assert_eq!(out, "Hours set to 07:30 - 18:00\n");
    sandbox.ok(&["lint", "--strict"]);
    let out = sandbox.ok(&["hours"]);
    assert_eq!(out, "Hours: 07:30 - 18:00\n");

    let out = sandbox.ok(&["report", "--as-of", "18:00"]);
    assert!(out.contains("Bikes parked:         3 regular   1 oversize   4 total"), "{out}");

    let out = sandbox.ok(&["publish", "--leftover", "3", "--temperature", "22.5"]);
    assert!(out.starts_with("Published 2024-06-01: 4 visits"), "{out}");

    let out = sandbox.ok(&["history", "--json"]);
    let days: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(days[0]["date"], "2024-06-01");
    assert_eq!(days[0]["leftover"], 3);
    assert_eq!(days[0]["temperature"], 22.5);
    assert_eq!(days[0]["notes"], "wa2 has a flat\nCloses: early if it storms");
    assert_eq!(days[0]["registrations"], 2);
    assert_eq!(days[0]["time_open"], "07:30");
}

/// A datafile that fails lint stops state-changing commands.
#[test]
fn test_inconsistent_datafile_blocks_changes() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.datafile().parent().unwrap()).unwrap();
    std::fs::write(
        sandbox.datafile(),
        "Date: 2024-06-01\nBikes checked in / tags out:\nzz9,09:00\nRegular-bike tags:\nwa1\n",
    )
    .unwrap();
    let before = std::fs::read_to_string(sandbox.datafile()).unwrap();

    let err = sandbox.fails(&["in", "wa1", "9:30"]);
    assert!(err.contains("Tag zz9 has a visit but is not a regular or oversize tag."), "{err}");
    assert_eq!(std::fs::read_to_string(sandbox.datafile()).unwrap(), before);

    let output = sandbox.run(&["lint"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Tag zz9"));
}

/// Malformed tags and times are rejected before anything is written.
#[test]
fn test_malformed_input_rejected() {
    let sandbox = Sandbox::new();
    let err = sandbox.fails(&["in", "w3", "9:00"]);
    assert!(err.contains("'w3' is not a valid tag"), "{err}");
    let err = sandbox.fails(&["in", "wa3", "25:00"]);
    assert!(err.contains("25:00"), "{err}");
    assert!(!sandbox.datafile().exists());
}
