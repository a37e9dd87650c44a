mod common;

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use osc_cli::{build_catalog, convert, validate_dir, OscConfig};

use common::{read_json, write_tables, PRODUCTS};

fn convert_and_build(dir: &Path, out: &str) -> osc_cli::BuildSummary {
    let input = write_tables(dir, PRODUCTS);
    convert(&input).expect("convert");
    let images = input.out_dir.join("themes").join("images");
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("ocean.png"), b"png").unwrap();
    build_catalog(&input.out_dir, &dir.join(out), &OscConfig::default()).expect("build")
}

/// Every JSON file below `dir`, keyed by relative path, with `updated` removed.
fn documents_without_updated(dir: &Path) -> Vec<(String, serde_json::Value)> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.unwrap();
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let mut value = read_json(path);
        if let Some(object) = value.as_object_mut() {
            object.remove("updated");
        }
        let relative = path.strip_prefix(dir).unwrap().display().to_string();
        out.push((relative, value));
    }
    out
}

#[test]
fn climate_ocean_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let summary = convert_and_build(dir.path(), "dist");
    let dist = dir.path().join("dist");

    assert!(summary.diagnostics.is_empty(), "{:?}", summary.diagnostics);
    assert_eq!(summary.projects, 1);
    assert_eq!(summary.products, 1);
    assert_eq!(summary.themes, 2);
    assert_eq!(summary.metadata_records, 2);
    assert_eq!(summary.images_copied, 1);

    for path in [
        "catalog.json",
        "projects/catalog.json",
        "projects/ocean-watch/collection.json",
        "projects/ocean-watch/iso.xml",
        "products/ssh-2020/collection.json",
        "products/ssh-2020/iso.xml",
        "themes/ocean/catalog.json",
        "themes/images/ocean.png",
        "variables/sea-surface-height/catalog.json",
        "eo-missions/jason-3/catalog.json",
        "metrics.json",
        "codelists.xml",
        "themes.json",
        "variables.json",
        "eo-missions.json",
    ] {
        assert!(dist.join(path).exists(), "missing {}", path);
    }

    let metrics = read_json(&dist.join("metrics.json"));
    assert_eq!(metrics["id"], "osc");
    assert_eq!(metrics["summary"]["numberOfProducts"], 1);
    assert_eq!(metrics["summary"]["numberOfProjects"], 1);
    assert_eq!(metrics["summary"]["numberOfThemes"], 2);
    assert_eq!(metrics["summary"]["years"], serde_json::json!([2020]));

    let climate = &metrics["themes"][0];
    assert_eq!(climate["name"], "Climate");
    assert_eq!(climate["summary"]["numberOfProducts"], 0);
    assert_eq!(climate["summary"]["numberOfProjects"], 0);
    assert_eq!(climate["summary"]["numberOfVariables"], 0);
    assert_eq!(climate["summary"]["years"], serde_json::json!([]));

    let ocean = &metrics["themes"][1];
    assert_eq!(ocean["name"], "Ocean");
    assert_eq!(ocean["summary"]["numberOfProducts"], 1);
    assert_eq!(ocean["summary"]["numberOfProjects"], 1);
    assert_eq!(ocean["summary"]["numberOfVariables"], 1);
    assert_eq!(ocean["summary"]["years"], serde_json::json!([2020]));
    assert_eq!(ocean["image"], "themes/images/ocean.png");
    assert!(dist.join(ocean["image"].as_str().unwrap()).exists());
    assert_eq!(ocean["variables"][0]["name"], "Sea Surface Height");

    let jason = &metrics["missions"][0];
    assert_eq!(jason["name"], "Jason-3");
    assert_eq!(jason["summary"]["numberOfProjects"], 1);

    let product = read_json(&dist.join("products/ssh-2020/collection.json"));
    assert_eq!(product["osc:project"], "Ocean Watch");
    assert_eq!(product["sci:doi"], "10.5285/ssh.2020");
    assert_eq!(product["extent"]["spatial"]["bbox"][0], serde_json::json!([0.0, 0.0, 10.0, 10.0]));
    assert_eq!(product["assets"]["iso-metadata"]["href"], "./iso.xml");
    assert!(product["updated"].is_string());

    let iso = fs::read_to_string(dist.join("products/ssh-2020/iso.xml")).unwrap();
    assert!(iso.contains("<gco:CharacterString>ocean-watch</gco:CharacterString>"));
    assert!(iso.contains("Jason-3"));

    let codelists = fs::read_to_string(dist.join("codelists.xml")).unwrap();
    assert!(codelists.contains("OSC_Variable_Sea Surface Height"));
}

#[test]
fn built_catalog_validates_clean_and_is_symmetric() {
    let dir = tempfile::tempdir().unwrap();
    convert_and_build(dir.path(), "dist");
    let report = validate_dir(&dir.path().join("dist")).unwrap();
    assert_eq!(report.mode, "catalog");
    assert!(report.is_clean(), "{:?}", report.issues);

    let data_report = validate_dir(&dir.path().join("data")).unwrap();
    assert_eq!(data_report.mode, "records");
    assert!(data_report.is_clean(), "{:?}", data_report.issues);
}

#[test]
fn rebuilding_produces_identical_documents() {
    let dir = tempfile::tempdir().unwrap();
    convert_and_build(dir.path(), "first");
    let second = build_catalog(
        &dir.path().join("data"),
        &dir.path().join("second"),
        &OscConfig::default(),
    )
    .unwrap();
    assert!(second.diagnostics.is_empty());

    let first = documents_without_updated(&dir.path().join("first"));
    let second = documents_without_updated(&dir.path().join("second"));
    assert_eq!(first.len(), second.len());
    assert!(!first.is_empty());
    for ((a_path, a), (b_path, b)) in first.iter().zip(second.iter()) {
        assert_eq!(a_path, b_path);
        assert_eq!(a, b, "{} differs", a_path);
    }
}

#[test]
fn parents_are_never_older_than_children() {
    let dir = tempfile::tempdir().unwrap();
    convert_and_build(dir.path(), "dist");
    let dist = dir.path().join("dist");
    let root = read_json(&dist.join("catalog.json"));
    let root_updated = root["updated"].as_str().unwrap().to_string();
    for (path, _) in documents_without_updated(&dist) {
        let value = read_json(&dist.join(&path));
        if let Some(updated) = value.get("updated").and_then(|v| v.as_str()) {
            // RFC 3339 UTC with second precision sorts lexically.
            assert!(root_updated.as_str() >= updated, "{} newer than root", path);
        }
    }
}

#[test]
fn root_href_makes_every_link_absolute() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_tables(dir.path(), PRODUCTS);
    convert(&input).unwrap();
    let mut config = OscConfig::default();
    config.build.root_href = Some("https://catalog.example.org/osc".to_string());
    let summary = build_catalog(&input.out_dir, &dir.path().join("dist"), &config).unwrap();
    assert_eq!(
        summary.publish_root.as_deref(),
        Some("https://catalog.example.org/osc")
    );

    let product = read_json(&dir.path().join("dist/products/ssh-2020/collection.json"));
    for link in product["links"].as_array().unwrap() {
        let href = link["href"].as_str().unwrap();
        assert!(href.starts_with("https://"), "relative href {}", href);
    }
    let self_link = product["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|link| link["rel"] == "self")
        .unwrap();
    assert_eq!(
        self_link["href"],
        "https://catalog.example.org/osc/products/ssh-2020/collection.json"
    );
    assert_eq!(
        product["assets"]["iso-metadata"]["href"],
        "https://catalog.example.org/osc/products/ssh-2020/iso.xml"
    );

    let metrics = read_json(&dir.path().join("dist/metrics.json"));
    assert_eq!(
        metrics["themes"][1]["image"],
        "https://catalog.example.org/osc/themes/images/ocean.png"
    );
}

#[test]
fn unknown_project_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let products = PRODUCTS.replace(",Ocean Watch,", ",Nonexistent,");
    let input = write_tables(dir.path(), &products);
    convert(&input).unwrap();

    let report = validate_dir(&input.out_dir).unwrap();
    assert_eq!(report.issues.len(), 1);
    assert!(report.issues[0].to_string().contains("Nonexistent"));

    let summary = build_catalog(&input.out_dir, &dir.path().join("dist"), &OscConfig::default())
        .unwrap();
    assert_eq!(summary.diagnostics.len(), 1);
    let metrics = read_json(&dir.path().join("dist/metrics.json"));
    assert_eq!(metrics["missions"][0]["summary"]["numberOfProjects"], 0);
}

#[test]
fn published_catalog_still_reports_unknown_project() {
    let dir = tempfile::tempdir().unwrap();
    let products = PRODUCTS.replace(",Ocean Watch,", ",Nonexistent,");
    let input = write_tables(dir.path(), &products);
    convert(&input).unwrap();
    let mut config = OscConfig::default();
    config.build.root_href = Some("https://catalog.example.org/osc".to_string());
    let summary = build_catalog(&input.out_dir, &dir.path().join("dist"), &config).unwrap();
    assert_eq!(summary.diagnostics.len(), 1);

    let report = validate_dir(&dir.path().join("dist")).unwrap();
    assert_eq!(report.mode, "catalog");
    assert_eq!(report.issues.len(), 1, "{:?}", report.issues);
    assert_eq!(report.issues[0], summary.diagnostics[0]);
}

#[test]
fn published_catalog_validates_clean() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_tables(dir.path(), PRODUCTS);
    convert(&input).unwrap();
    let mut config = OscConfig::default();
    config.build.root_href = Some("https://catalog.example.org/osc/".to_string());
    build_catalog(&input.out_dir, &dir.path().join("dist"), &config).unwrap();

    let report = validate_dir(&dir.path().join("dist")).unwrap();
    assert!(report.is_clean(), "{:?}", report.issues);
}

#[test]
fn colliding_theme_names_fail_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_tables(dir.path(), PRODUCTS);
    convert(&input).unwrap();
    // A second record whose name slugifies to an existing id.
    fs::write(
        input.out_dir.join("themes/ocean-2.json"),
        r#"{"name": "OCEAN", "description": "dup"}"#,
    )
    .unwrap();
    let err = build_catalog(&input.out_dir, &dir.path().join("dist"), &OscConfig::default())
        .unwrap_err();
    assert!(err.contains("ocean"), "{}", err);
    assert!(!dir.path().join("dist/catalog.json").exists());
}
