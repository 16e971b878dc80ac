use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = ",거래 일시,적요,거래 유형,거래 기관,계좌번호,거래 금액,거래 후 잔액,메모";

/// Toss-style export: eight preamble rows, the vendor header, then data rows.
fn write_export(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let mut content = String::new();
    content.push_str("토스뱅크 거래내역\n");
    for i in 1..8 {
        content.push_str(&format!("preamble {i}\n"));
    }
    content.push_str(HEADER);
    content.push('\n');
    for r in rows {
        content.push_str(r);
        content.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn sample(dir: &Path) -> PathBuf {
    write_export(
        dir,
        "export.csv",
        &[
            "0,2024.01.10 09:00:00,급여,입금,토스뱅크,,100000,100000,",
            "1,2024.02.03 18:30:00,월세,출금,토스뱅크,1000-2000,-40000,60000,메모",
            "2,2023.12.24 12:00:00,케이크,체크카드결제,토스뱅크,,\"-25,000\",85000,",
            "3,2024.02.05 07:00:00,환불,해외결제,토스뱅크,,0,60000,",
        ],
    )
}

/// Binary with HOME pointed at a scratch dir so user settings never leak in.
fn tossdash(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tossdash").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn no_file_prints_notice_and_succeeds() {
    let home = TempDir::new().unwrap();
    tossdash(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("Please provide a transaction file"));
}

#[test]
fn report_json_matches_two_transaction_example() {
    let home = TempDir::new().unwrap();
    let file = sample(home.path());
    let output = tossdash(&home)
        .args(["report", file.to_str().unwrap(), "--year", "2024", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kpi"]["deposit"], 100000.0);
    assert_eq!(json["kpi"]["withdrawal"], 40000.0);
    assert_eq!(json["kpi"]["count"], 3);
    assert_eq!(json["kpi"]["balance"], 60000.0);
    assert_eq!(json["monthly"][0]["month"], "2024-01");
    assert_eq!(json["monthly"][1]["expense"], 40000.0);
    assert_eq!(json["net_income"][1]["net"], -40000.0);
    assert_eq!(json["top_withdrawals"][0]["remarks"], "월세");
}

#[test]
fn report_with_no_matching_month_is_zeroed() {
    let home = TempDir::new().unwrap();
    let file = sample(home.path());
    let output = tossdash(&home)
        .args(["report", file.to_str().unwrap(), "--month", "7", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kpi"]["count"], 0);
    assert_eq!(json["kpi"]["balance"], 0.0);
    assert!(json["monthly"].as_array().unwrap().is_empty());
    assert!(json["hourly"].as_object().unwrap().is_empty());
}

#[test]
fn report_text_renders_tables() {
    let home = TempDir::new().unwrap();
    let file = sample(home.path());
    tossdash(&home)
        .args(["report", file.to_str().unwrap()])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly Cash Flow"))
        .stdout(predicate::str::contains("₩100,000"))
        .stdout(predicate::str::contains("케이크"));
}

#[test]
fn export_writes_canonical_csv() {
    let home = TempDir::new().unwrap();
    let file = sample(home.path());
    let out = home.path().join("transactions.csv");
    tossdash(&home)
        .args(["export", file.to_str().unwrap(), "--output", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 transactions"));
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("timestamp,remarks,transaction_type"));
    assert!(written.contains("월세,Withdrawal,토스뱅크,10002000,-40000,60000"));
    assert!(written.contains("케이크,Check Card"));
    assert!(!written.contains("메모"));
}

#[test]
fn inspect_lists_untranslated_labels() {
    let home = TempDir::new().unwrap();
    let file = sample(home.path());
    tossdash(&home)
        .args(["inspect", file.to_str().unwrap()])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions: 4"))
        .stdout(predicate::str::contains("2023, 2024"))
        .stdout(predicate::str::contains("해외결제"));
}

#[test]
fn missing_column_is_a_schema_error() {
    let home = TempDir::new().unwrap();
    let mut content: String = (0..8).map(|i| format!("preamble {i}\n")).collect();
    content.push_str(",거래 일시,적요,거래 유형,거래 기관,계좌번호,거래 후 잔액\n");
    content.push_str("0,2024.01.10 09:00:00,급여,입금,토스뱅크,,100000\n");
    let file = home.path().join("broken.csv");
    std::fs::write(&file, content).unwrap();
    tossdash(&home)
        .args(["report", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Missing required column(s): 거래 금액"));
}

#[test]
fn bad_timestamp_fails_whole_file() {
    let home = TempDir::new().unwrap();
    let file = write_export(
        home.path(),
        "bad.csv",
        &[
            "0,2024.01.10 09:00:00,급여,입금,토스뱅크,,100000,100000,",
            "1,2024/02/03 18:30,월세,출금,토스뱅크,,-40000,60000,",
        ],
    );
    tossdash(&home)
        .args(["export", file.to_str().unwrap(), "--output", "unused.csv"])
        .current_dir(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 2"))
        .stderr(predicate::str::contains("timestamp"));
    assert!(!home.path().join("unused.csv").exists());
}

#[test]
fn config_persists_settings() {
    let home = TempDir::new().unwrap();
    tossdash(&home)
        .args(["config", "--privacy", "off", "--top", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Privacy:    off"))
        .stdout(predicate::str::contains("Top N:      5"));
    let saved = home.path().join(".config").join("tossdash").join("settings.json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(saved).unwrap()).unwrap();
    assert_eq!(json["privacy_mode"], false);
    assert_eq!(json["top_n"], 5);
}

#[test]
fn configured_top_n_limits_rankings() {
    let home = TempDir::new().unwrap();
    let file = sample(home.path());
    tossdash(&home).args(["config", "--top", "1"]).assert().success();
    let output = tossdash(&home)
        .args(["report", file.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["top_withdrawals"].as_array().unwrap().len(), 1);
    assert_eq!(json["top_withdrawals"][0]["remarks"], "월세");
}

#[test]
fn completions_generate() {
    let home = TempDir::new().unwrap();
    tossdash(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tossdash"));
}
