// kakusu/tests/cli_integration_tests.rs
//! Command-line integration tests for the `kakusu` binary.
//!
//! Every command runs in a fresh temporary directory with `HOME` and the config
//! directory pointed inside it, so no user rule file or `.env` leaks into a test.
//! `--quiet` keeps stderr free of the summary table where stdout is asserted.

use anyhow::Result;
#[allow(unused_imports)]
use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};
use test_log::test;

const REPORT: &str = "代表取締役 田中一郎氏は、Project-X の成功を報告しました。";

fn kakusu(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kakusu").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("KAKUSU_RULES_FILE")
        .env_remove("KAKUSU_NER_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace() -> TempDir {
    tempdir().unwrap()
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn test_rules_only_masks_positions_and_projects() {
    let dir = workspace();
    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", REPORT])
        .assert()
        .success();

    let out = stdout_of(&assert);
    assert!(!out.contains("代表取締役"), "{}", out);
    assert!(!out.contains("Project-X"), "{}", out);
    assert!(out.starts_with("<<役職_"), "{}", out);
    assert!(out.contains("<<プロジェクト_"), "{}", out);
    assert!(out.contains("田中一郎氏"), "names need a recognizer: {}", out);
}

#[test]
fn test_mask_reads_stdin() {
    let dir = workspace();
    kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", "--style", "simple"])
        .write_stdin("担当 部長")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("担当 <<POS_"));
}

#[test]
fn test_mask_requires_a_recognizer_choice() {
    let dir = workspace();
    kakusu(dir.path())
        .args(["mask", REPORT])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--rules-only"));
}

#[test]
fn test_invalid_category_exits_with_one() {
    let dir = workspace();
    kakusu(dir.path())
        .args(["mask", "--rules-only", "-c", "PERSON,AL!EN", REPORT])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid category 'AL!EN'"));
}

#[test]
fn test_recognizer_only_category_can_be_selected() -> Result<()> {
    let dir = workspace();
    let spans = dir.path().join("spans.json");
    fs::write(
        &spans,
        r#"[{"label": "Percent", "start": 4, "end": 7},
            {"label": "PERSON", "start": 8, "end": 10}]"#,
    )?;

    let assert = kakusu(dir.path())
        .args(["-q", "mask", "-c", "PERCENT", "--ner-spans"])
        .arg(&spans)
        .arg("成長率 25% 山田")
        .assert()
        .success();
    let out = stdout_of(&assert);
    assert!(out.starts_with("成長率 <<"), "{}", out);
    assert!(!out.contains("25%"), "{}", out);
    assert!(out.trim_end().ends_with(" 山田"), "{}", out);
    Ok(())
}

#[test]
fn test_blank_category_list_does_not_filter() -> Result<()> {
    let dir = workspace();
    let spans = dir.path().join("spans.json");
    fs::write(&spans, r#"[{"label": "PERSON", "start": 0, "end": 2}]"#)?;

    let assert = kakusu(dir.path())
        .args(["-q", "mask", "-c", "", "--ner-spans"])
        .arg(&spans)
        .arg("山田さん")
        .assert()
        .success();
    let out = stdout_of(&assert);
    assert!(out.starts_with("<<人物_"), "{}", out);
    Ok(())
}

#[test]
fn test_mask_then_decode_round_trip_through_files() -> Result<()> {
    let dir = workspace();
    let spans = dir.path().join("spans.json");
    fs::write(
        &spans,
        r#"[{"label": "ORG", "start": 0, "end": 11},
            {"label": "PERSON", "start": 12, "end": 16},
            {"label": "POSITION", "start": 16, "end": 18}]"#,
    )?;
    let text = "株式会社テクノロジーズの山田太郎部長";
    let mapping = dir.path().join("mapping.json");
    let masked = dir.path().join("masked.txt");

    kakusu(dir.path())
        .args(["-q", "mask", "--style", "simple", "--ner-spans"])
        .arg(&spans)
        .arg("--mapping-out")
        .arg(&mapping)
        .arg("-o")
        .arg(&masked)
        .arg(text)
        .assert()
        .success();

    let masked_text = fs::read_to_string(&masked)?;
    let org = masked_text.find("<<ORG_").expect("org mask");
    let person = masked_text.find("<<PERSON_").expect("person mask");
    let position = masked_text.find("<<POS_").expect("position mask");
    assert!(org < person && person < position, "{}", masked_text);

    let mapping_json: Value = serde_json::from_str(&fs::read_to_string(&mapping)?)?;
    assert_eq!(mapping_json.as_object().unwrap().len(), 3);

    kakusu(dir.path())
        .args(["-q", "decode", "-m"])
        .arg(&mapping)
        .arg("-i")
        .arg(&masked)
        .assert()
        .success()
        .stdout(format!("{}\n", text));
    Ok(())
}

#[test]
fn test_decode_accepts_full_json_output() -> Result<()> {
    let dir = workspace();
    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", "--json", REPORT])
        .assert()
        .success();
    let outcome: Value = serde_json::from_str(&stdout_of(&assert))?;
    assert_eq!(outcome["preprocessed_text"], REPORT);
    assert_eq!(outcome["audit"][0]["original"], "代表取締役");
    assert_eq!(outcome["audit"][0]["source"], "rule");

    let json_file = dir.path().join("outcome.json");
    fs::write(&json_file, stdout_of(&assert))?;
    let masked = outcome["masked_text"].as_str().unwrap().to_string();

    kakusu(dir.path())
        .args(["-q", "decode", "-m"])
        .arg(&json_file)
        .arg(&masked)
        .assert()
        .success()
        .stdout(format!("{}\n", REPORT));
    Ok(())
}

#[test]
fn test_decode_skips_masks_missing_from_text() -> Result<()> {
    let dir = workspace();
    let mapping = dir.path().join("mapping.json");
    fs::write(
        &mapping,
        r#"{
  "<<人物_1a2b3c4d>>": {"original_text": "山田", "masked_text": "<<人物_1a2b3c4d>>", "category": "PERSON", "source": "ner"},
  "<<組織_5e6f7a8b>>": {"original_text": "株式会社A", "masked_text": "<<組織_5e6f7a8b>>", "category": "ORG", "source": "rule"}
}"#,
    )?;

    kakusu(dir.path())
        .args(["decode", "-m"])
        .arg(&mapping)
        .arg("<<人物_1a2b3c4d>>さん")
        .assert()
        .success()
        .stdout("山田さん\n")
        .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn test_overrides_from_files() -> Result<()> {
    let dir = workspace();
    let kv = dir.path().join("kv.json");
    fs::write(&kv, r#"{"株式会社Lightblue": "lead tech"}"#)?;
    let values = dir.path().join("values.json");
    fs::write(&values, r#"["RAG Ready診断"]"#)?;

    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", "-k"])
        .arg(&kv)
        .arg("-v")
        .arg(&values)
        .arg("契約先 株式会社Lightblue にRAG Ready診断を提案")
        .assert()
        .success();

    let out = stdout_of(&assert);
    assert!(out.starts_with("契約先 lead tech に"), "{}", out);
    assert!(!out.contains("RAG Ready診断"), "{}", out);
    assert!(out.trim_end().ends_with("を提案"), "{}", out);
    Ok(())
}

#[test]
fn test_custom_rule_file_replaces_defaults() -> Result<()> {
    let dir = workspace();
    let rules = dir.path().join("rules.yaml");
    fs::write(
        &rules,
        r#"
rules:
  project_patterns: ["Project-Z"]
exclusions:
  common_words: []
  safe_patterns: []
"#,
    )?;

    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", "--rules"])
        .arg(&rules)
        .arg("部長 Project-Z")
        .assert()
        .success();
    let out = stdout_of(&assert);
    assert!(out.starts_with("部長 <<プロジェクト_"), "{}", out);

    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", "--extend-defaults", "--rules"])
        .arg(&rules)
        .arg("部長 Project-Z")
        .assert()
        .success();
    assert!(stdout_of(&assert).starts_with("<<役職_"));
    Ok(())
}

#[test]
fn test_rule_file_from_working_directory_is_found() -> Result<()> {
    let dir = workspace();
    fs::write(
        dir.path().join("masking_rules.yaml"),
        "rules:\n  company_patterns: [\"テスト商事\"]\nexclusions:\n  common_words: []\n  safe_patterns: []\n",
    )?;
    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--rules-only", "テスト商事 の 部長"])
        .assert()
        .success();
    let out = stdout_of(&assert);
    assert!(out.starts_with("<<組織_"), "{}", out);
    assert!(out.trim_end().ends_with("の 部長"), "{}", out);
    Ok(())
}

#[test]
fn test_unreachable_recognizer_fails() {
    let dir = workspace();
    kakusu(dir.path())
        .args(["mask", "--ner-url", "http://127.0.0.1:9/ner", "--ner-timeout", "2", REPORT])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn test_recognizer_service_spans_are_masked() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/ner")
        .with_header("content-type", "application/json")
        .with_body(r#"{"entities": [{"label": "Person", "start": 6, "end": 10}]}"#)
        .create();

    let dir = workspace();
    let assert = kakusu(dir.path())
        .args(["-q", "mask", "--ner-url"])
        .arg(format!("{}/ner", server.url()))
        .arg(REPORT)
        .assert()
        .success();
    let out = stdout_of(&assert);
    assert!(!out.contains("田中一郎"), "{}", out);
    assert!(out.contains("<<人物_"), "{}", out);
    mock.assert();
}

#[test]
fn test_categories_lists_codes() {
    let dir = workspace();
    kakusu(dir.path())
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("PERSON\t人物"))
        .stdout(predicate::str::contains("DEPARTMENT\t部署"))
        .stdout(predicate::str::contains("PERCENT\t-"));
}

#[test]
fn test_summary_goes_to_stderr() {
    let dir = workspace();
    kakusu(dir.path())
        .args(["mask", "--rules-only", "部長、課長"])
        .assert()
        .success()
        .stderr(predicate::str::contains("POSITION"))
        .stderr(predicate::str::contains("--mapping-out"));
}
