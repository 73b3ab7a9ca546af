//! `tb snapshot | realized | validate` end to end over files on disk.
//!
//! Pure local IO (tempdir); no network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const TRADES_CSV: &str = "\
symbol,side,price,quantity,timestamp,asset_type,note,emotion
AAPL,buy,150.0,10,2024-01-02T14:30:00Z,stock,,
AAPL,buy,160.0,5,2024-01-03T14:30:00Z,stock,,calm
MSFT,buy,300,4,2024-01-04T14:30:00Z,,,
MSFT,sell,330,4,2024-01-05T14:30:00Z,,,
";

const PRICES_CSV: &str = "symbol,price\nAAPL,160\nMSFT,340\n";

fn fixture() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let trades = dir.path().join("trades.csv");
    let prices = dir.path().join("prices.csv");
    fs::write(&trades, TRADES_CSV).unwrap();
    fs::write(&prices, PRICES_CSV).unwrap();
    (dir, trades, prices)
}

fn tb() -> Command {
    let mut cmd = Command::cargo_bin("tb").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn snapshot_prints_open_positions_only() {
    let (_dir, trades, prices) = fixture();

    let out = tb()
        .args(["snapshot", "--trades"])
        .arg(&trades)
        .arg("--prices")
        .arg(&prices)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let snap: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let assets = snap["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 1, "MSFT is closed");
    assert_eq!(assets[0]["symbol"], "AAPL");
    assert_eq!(assets[0]["quantity"], "15");
    assert_eq!(snap["total_balance"], "2400");
    assert!(snap.get("diagnostics").is_none());
}

#[test]
fn realized_by_symbol() {
    let (_dir, trades, _) = fixture();

    tb().args(["realized", "--by-symbol", "--trades"])
        .arg(&trades)
        .assert()
        .success()
        .stdout(predicate::str::contains("symbol=MSFT realized_gain=120"))
        .stdout(predicate::str::contains("symbol=AAPL realized_gain=0"))
        .stdout(predicate::str::contains("realized_gain=120\n"));
}

#[test]
fn validate_accepts_covered_sell() {
    let (_dir, trades, _) = fixture();

    tb().args(["validate", "--trades"])
        .arg(&trades)
        .args(["--symbol", "aapl", "--side", "sell", "--price", "170", "--qty", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("validation_ok=true symbol=AAPL"));
}

#[test]
fn validate_rejects_oversell_with_quantities() {
    let (_dir, trades, _) = fixture();

    tb().args(["validate", "--trades"])
        .arg(&trades)
        .args(["--symbol", "AAPL", "--side", "sell", "--price", "170", "--qty", "16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "insufficient quantity of AAPL: available 15, requested 16",
        ));
}

#[test]
fn validate_rejects_zero_price() {
    let (_dir, trades, _) = fixture();

    tb().args(["validate", "--trades"])
        .arg(&trades)
        .args(["--symbol", "AAPL", "--side", "buy", "--price", "0", "--qty", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("price must be greater than zero"));
}

#[test]
fn report_policy_from_config_surfaces_oversells() {
    let (dir, _, prices) = fixture();
    let trades = dir.path().join("dirty.csv");
    fs::write(
        &trades,
        "symbol,side,price,quantity,timestamp\nAAPL,buy,100,10,2024-01-02\nAAPL,sell,110,12,2024-01-03\nMSFT,buy,300,1,2024-01-04\n",
    )
    .unwrap();
    let cfg = dir.path().join("engine.yaml");
    fs::write(&cfg, "engine:\n  oversell_policy: report\n").unwrap();

    let out = tb()
        .arg("--config")
        .arg(&cfg)
        .args(["snapshot", "--trades"])
        .arg(&trades)
        .arg("--prices")
        .arg(&prices)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let snap: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let diags = snap["diagnostics"].as_array().unwrap();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0]["symbol"], "AAPL");
    assert_eq!(diags[0]["requested"], "12");
    assert_eq!(diags[0]["available"], "10");
}

#[test]
fn config_hash_prints_hash_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("base.yaml");
    fs::write(&cfg, "engine:\n  oversell_policy: clamp\n").unwrap();

    tb().arg("config-hash")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="))
        .stdout(predicate::str::contains(r#"{"engine":{"oversell_policy":"clamp"}}"#));
}

#[test]
fn missing_trade_log_fails_with_path() {
    tb().args(["realized", "--trades", "/no/such/trades.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/no/such/trades.csv"));
}
