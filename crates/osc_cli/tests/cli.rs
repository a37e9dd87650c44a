mod common;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use common::{read_json, write_tables, PRODUCTS};

fn osc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_osc"))
}

fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(osc_bin())
        .current_dir(cwd)
        .env_remove("OSC_CONFIG")
        .env_remove("OSC_LOG")
        .args(args)
        .output()
        .expect("run osc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn convert_args(dir: &Path, products: &str) -> Vec<String> {
    let input = write_tables(dir, products);
    vec![
        "convert".to_string(),
        "--themes".to_string(),
        input.themes.display().to_string(),
        "--variables".to_string(),
        input.variables.display().to_string(),
        "--eo-missions".to_string(),
        input.eo_missions.display().to_string(),
        "--projects".to_string(),
        input.projects.display().to_string(),
        "--products".to_string(),
        input.products.display().to_string(),
        "-o".to_string(),
        input.out_dir.display().to_string(),
    ]
}

fn convert(dir: &Path, products: &str) {
    let args = convert_args(dir, products);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run(dir, &args);
    assert!(output.status.success(), "convert failed: {}", stderr(&output));
}

#[test]
fn convert_build_validate_round() {
    let dir = tempfile::tempdir().unwrap();
    let args = convert_args(dir.path(), PRODUCTS);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run(dir.path(), &args);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("themes=2"), "{}", out);
    assert!(out.contains("products=1"), "{}", out);
    assert!(dir.path().join("data/projects/ocean-watch.json").exists());

    let output = run(dir.path(), &["build", "data", "-o", "dist", "--no-iso"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("nodes=12"), "{}", out);
    assert!(out.contains("metadata_records=0"), "{}", out);
    assert!(out.contains("diagnostics=0"), "{}", out);
    assert!(!dir.path().join("dist/products/ssh-2020/iso.xml").exists());

    let output = run(dir.path(), &["validate", "dist", "--strict"]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("issues=0"));
}

#[test]
fn validate_reports_by_default_and_enforces_with_strict() {
    let dir = tempfile::tempdir().unwrap();
    convert(dir.path(), &PRODUCTS.replace(",Ocean Watch,", ",Nonexistent,"));

    let output = run(dir.path(), &["validate", "data"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("mode=records"), "{}", out);
    assert!(out.contains("issues=1"), "{}", out);
    assert!(out.contains("rule=unresolved-reference"), "{}", out);
    assert!(out.contains("Nonexistent"), "{}", out);

    let output = run(dir.path(), &["validate", "data", "--strict"]);
    assert_eq!(output.status.code(), Some(1));

    let output = run(dir.path(), &["validate", "data", "--json"]);
    let issues: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(issues.as_array().unwrap().len(), 1);
    assert_eq!(issues[0]["rule"], "unresolved-reference");
    assert_eq!(issues[0]["target"], "project");
    assert_eq!(issues[0]["reference"], "Nonexistent");
}

#[test]
fn strict_mode_can_come_from_config() {
    let dir = tempfile::tempdir().unwrap();
    convert(dir.path(), &PRODUCTS.replace(",Ocean Watch,", ",Nonexistent,"));
    std::fs::write(dir.path().join("osc.toml"), "[validate]\nstrict = true\n").unwrap();
    let output = run(dir.path(), &["validate", "data"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("1 issue"));
}

#[test]
fn build_warns_about_unresolved_references() {
    let dir = tempfile::tempdir().unwrap();
    convert(dir.path(), &PRODUCTS.replace(",Jason-3\n", ",Sentinel-42\n"));
    let output = run(dir.path(), &["build", "data", "-o", "dist", "--compact"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("warning: products/ssh-2020: missing mission 'Sentinel-42'"));
    assert!(stdout(&output).contains("diagnostics=1"));

    let root = std::fs::read_to_string(dir.path().join("dist/catalog.json")).unwrap();
    assert_eq!(root.trim_end().lines().count(), 1);
}

#[test]
fn config_file_sets_catalog_identity() {
    let dir = tempfile::tempdir().unwrap();
    convert(dir.path(), PRODUCTS);
    let config = dir.path().join("custom.toml");
    std::fs::write(
        &config,
        "[catalog]\nid = \"my-catalog\"\ntitle = \"My Catalog\"\n\n[codelists]\nversion = \"3.0.0\"\n",
    )
    .unwrap();
    let output = run(
        dir.path(),
        &["--config", "custom.toml", "build", "data", "-o", "dist"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("config=custom.toml"));

    let root = read_json(&dir.path().join("dist/catalog.json"));
    assert_eq!(root["id"], "my-catalog");
    assert_eq!(root["title"], "My Catalog");
    let metrics = read_json(&dir.path().join("dist/metrics.json"));
    assert_eq!(metrics["id"], "my-catalog");
    let codelists = std::fs::read_to_string(dir.path().join("dist/codelists.xml")).unwrap();
    assert!(codelists.contains("<gco:CharacterString>3.0.0</gco:CharacterString>"));
}

#[test]
fn malformed_rows_name_the_row_and_column() {
    let dir = tempfile::tempdir().unwrap();
    let products = PRODUCTS.replace(",2020-01-01,", ",2020-13-45,");
    let args = convert_args(dir.path(), &products);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run(dir.path(), &args);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("row 2"), "{}", err);
    assert!(err.contains("`Start`"), "{}", err);
    assert!(!dir.path().join("data").exists());
}

#[test]
fn multipolygon_rows_are_named_in_the_warning() {
    let dir = tempfile::tempdir().unwrap();
    let products = PRODUCTS.replace(
        "\"[[[0,0],[10,0],[10,10],[0,10],[0,0]]]\"",
        "\"Multipolygon(((0 0, 1 1, 1 0, 0 0)))\"",
    );
    assert_ne!(products, PRODUCTS);
    let args = convert_args(dir.path(), &products);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = run(dir.path(), &args);
    assert!(output.status.success(), "{}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("products.csv row 2: multipolygon"), "{}", err);

    let product = read_json(&dir.path().join("data/products/ssh-2020.json"));
    assert!(product.get("geometry").map_or(true, |g| g.is_null()));
}
