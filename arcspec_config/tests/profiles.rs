use std::fs;

use arcspec_config::{EXAMPLE_PROFILE, create_config, find_profile, load_profiles};
use serde_json::json;

fn write_profile(dir: &std::path::Path, file: &str, friendly: &str, temperature: f64) {
    let body = json!({
        "FriendlyName": friendly,
        "Model": "m",
        "ResponseType": "echo",
        "Temperature": temperature,
        "MaxTokens": 100,
    });
    fs::write(dir.join(file), body.to_string()).expect("write");
}

#[test]
fn invalid_and_foreign_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_profile(dir.path(), "b.ai.json", "Bravo", 0.5);
    write_profile(dir.path(), "a.ai.json", "Alpha", 1.0);
    write_profile(dir.path(), "hot.ai.json", "Hot", 3.0);
    write_profile(dir.path(), "plain.json", "Plain", 0.5);
    fs::write(dir.path().join("broken.ai.json"), "{").expect("write");

    let profiles = load_profiles(dir.path()).expect("profiles");
    let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_profiles(&dir.path().join("nope")).expect_err("missing");
    assert!(err.to_string().contains("arcspec init"));
}

#[test]
fn find_by_name_friendly_name_or_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_profile(dir.path(), "alpha.ai.json", "First One", 0.2);
    write_profile(dir.path(), "beta.ai.json", "Second One", 0.2);

    assert_eq!(find_profile(dir.path(), "BETA").expect("name").name, "beta");
    assert_eq!(
        find_profile(dir.path(), "first one").expect("friendly").name,
        "alpha"
    );
    assert_eq!(find_profile(dir.path(), "2").expect("index").name, "beta");

    let err = find_profile(dir.path(), "gamma").expect_err("unknown");
    assert!(err.to_string().contains("alpha, beta"));
    assert!(find_profile(dir.path(), "0").is_err());
}

#[test]
fn init_writes_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let configs = dir.path().join("configs");

    let path = create_config(&configs).expect("created");
    assert_eq!(path, configs.join(EXAMPLE_PROFILE));
    assert_eq!(load_profiles(&configs).expect("profiles").len(), 1);

    assert!(create_config(&configs).is_err());
}
