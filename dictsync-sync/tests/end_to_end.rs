mod common;

use std::fs;

use dictsync_core::Decision;
use dictsync_sync::{profiles, run, InstallError, SyncError, SyncPhase};
use tempfile::TempDir;

use common::*;

const PINYIN_ARCHIVE: &str = "CustomPinyinDictionary_Fcitx_20250101.tar.gz";

fn pinyin_archive(contents: &[u8]) -> Vec<u8> {
    tar_gz(&[
        ("CustomPinyinDictionary_Fcitx/README.md", &b"readme"[..]),
        (
            "CustomPinyinDictionary_Fcitx/CustomPinyinDictionary_Fcitx.dict",
            contents,
        ),
    ])
}

// ---------------------------------------------------------------------------
// custom-pinyin
// ---------------------------------------------------------------------------

#[test]
fn fresh_state_installs_once_and_records_success() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])])
        .with_file(&download_url(PINYIN_ARCHIVE), pinyin_archive(b"ni hao"));

    let report = run(&profile, &transport, &config).unwrap();

    assert_eq!(report.phase, SyncPhase::Done);
    assert_eq!(transport.downloads.borrow().len(), 1);
    let dict = root.path().join("dict").join("CustomPinyinDictionary_Fcitx.dict");
    assert_eq!(fs::read(&dict).unwrap(), b"ni hao");
    let install = report.install.unwrap();
    assert_eq!(install.installed, dict);
    assert_eq!(install.sha256.len(), 64);

    let status = read_status(&profile.status_file);
    assert_eq!(status["version"], "v1.0");
    assert_eq!(status["asset_date"], "20250101");
    let history = status["update_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    let line = history[0].as_str().unwrap();
    assert!(line.contains("✅ success"), "{line}");
    assert!(line.contains("`v1.0`"), "{line}");
    assert!(line.contains("(asset date: 2025-01-01)"), "{line}");
}

#[test]
fn unchanged_release_is_skipped_without_touching_status() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])])
        .with_file(&download_url(PINYIN_ARCHIVE), pinyin_archive(b"ni hao"));
    run(&profile, &transport, &config).unwrap();
    let before = fs::read_to_string(&profile.status_file).unwrap();

    transport.push_reply(release_json("v1.0", &[PINYIN_ARCHIVE]));
    let report = run(&profile, &transport, &config).unwrap();

    assert_eq!(report.phase, SyncPhase::Skipped);
    assert_eq!(report.decision, Decision::UpToDate);
    assert!(report.install.is_none());
    assert_eq!(transport.downloads.borrow().len(), 1);
    assert_eq!(fs::read_to_string(&profile.status_file).unwrap(), before);
}

#[test]
fn force_reinstalls_and_appends_history() {
    let root = TempDir::new().unwrap();
    let mut config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![
        release_json("v1.0", &[PINYIN_ARCHIVE]),
        release_json("v1.0", &[PINYIN_ARCHIVE]),
    ])
    .with_file(&download_url(PINYIN_ARCHIVE), pinyin_archive(b"ni hao"));
    run(&profile, &transport, &config).unwrap();

    config.force = true;
    let report = run(&profile, &transport, &config).unwrap();

    assert_eq!(report.phase, SyncPhase::Done);
    assert_eq!(report.decision, Decision::Forced);
    assert_eq!(transport.downloads.borrow().len(), 2);
    let status = read_status(&profile.status_file);
    assert_eq!(status["update_history"].as_array().unwrap().len(), 2);
}

#[test]
fn new_asset_date_under_same_tag_triggers_update() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let newer = "CustomPinyinDictionary_Fcitx_20250201.tar.gz";
    let transport = ScriptedTransport::new(vec![
        release_json("v1.0", &[PINYIN_ARCHIVE]),
        release_json("v1.0", &[newer]),
    ])
    .with_file(&download_url(PINYIN_ARCHIVE), pinyin_archive(b"old"))
    .with_file(&download_url(newer), pinyin_archive(b"new"));
    run(&profile, &transport, &config).unwrap();

    let report = run(&profile, &transport, &config).unwrap();

    assert!(matches!(report.decision, Decision::FingerprintChanged(_)));
    let dict = root.path().join("dict").join("CustomPinyinDictionary_Fcitx.dict");
    assert_eq!(fs::read(dict).unwrap(), b"new");
    assert_eq!(read_status(&profile.status_file)["asset_date"], "20250201");
}

#[test]
fn missing_asset_fails_without_writing_status() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &["source.zip"])]);

    let err = run(&profile, &transport, &config).unwrap_err();

    assert!(matches!(err, SyncError::SelectionNotFound { asset_count: 1, .. }));
    assert!(!profile.status_file.exists());
}

#[test]
fn fetch_failure_fails_without_writing_status() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![status(404)]);

    let err = run(&profile, &transport, &config).unwrap_err();

    assert!(matches!(err, SyncError::Fetch(_)));
    assert!(!profile.status_file.exists());
}

#[test]
fn failed_download_records_failure_without_merging() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    // No file registered for the asset URL: the download answers 404.
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])]);

    let err = run(&profile, &transport, &config).unwrap_err();

    assert!(matches!(err, SyncError::Install(InstallError::Download { .. })));
    let status = read_status(&profile.status_file);
    assert!(status["version"].is_null());
    assert!(status["asset_date"].is_null());
    let history = status["update_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].as_str().unwrap().contains("❌ failure"));
    assert!(!root.path().join("dict").exists());
}

#[test]
fn archive_without_payload_is_a_locate_error() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])])
        .with_file(
            &download_url(PINYIN_ARCHIVE),
            tar_gz(&[("docs/README.md", &b"nothing here"[..])]),
        );

    let err = run(&profile, &transport, &config).unwrap_err();
    assert!(matches!(err, SyncError::Install(InstallError::Locate { .. })));
}

#[test]
fn corrupt_archive_is_an_extract_error() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])])
        .with_file(&download_url(PINYIN_ARCHIVE), b"definitely not gzip".to_vec());

    let err = run(&profile, &transport, &config).unwrap_err();
    assert!(matches!(err, SyncError::Install(InstallError::Extract { .. })));
}

#[test]
fn unreadable_status_file_is_treated_as_first_run() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    fs::create_dir_all(profile.status_file.parent().unwrap()).unwrap();
    fs::write(&profile.status_file, "{ truncated").unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])])
        .with_file(&download_url(PINYIN_ARCHIVE), pinyin_archive(b"ni hao"));

    let report = run(&profile, &transport, &config).unwrap();

    assert_eq!(report.phase, SyncPhase::Done);
    assert_eq!(read_status(&profile.status_file)["version"], "v1.0");
}

#[test]
fn interrupted_run_writes_nothing() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    config.interrupt.trigger();
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])]);

    let err = run(&profile, &transport, &config).unwrap_err();

    assert!(err.is_interrupted());
    assert!(!profile.status_file.exists());
}

#[test]
fn status_save_failure_after_install_fails_the_run() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::custom_pinyin(root.path()).unwrap();
    // A directory squatting on the temp path makes the atomic write fail.
    fs::create_dir_all(profile.status_file.with_extension("json.tmp")).unwrap();
    let transport = ScriptedTransport::new(vec![release_json("v1.0", &[PINYIN_ARCHIVE])])
        .with_file(&download_url(PINYIN_ARCHIVE), pinyin_archive(b"ni hao"));

    let err = run(&profile, &transport, &config).unwrap_err();

    assert!(matches!(err, SyncError::Io { .. }), "unexpected error: {err:?}");
    let dict = root.path().join("dict").join("CustomPinyinDictionary_Fcitx.dict");
    assert_eq!(fs::read(&dict).unwrap(), b"ni hao");
    assert!(!profile.status_file.exists());
}

// ---------------------------------------------------------------------------
// zhwiki
// ---------------------------------------------------------------------------

#[test]
fn zhwiki_replaces_old_dated_files() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::zhwiki(root.path()).unwrap();
    let dict_dir = root.path().join("dict");
    fs::create_dir_all(&dict_dir).unwrap();
    fs::write(dict_dir.join("zhwiki-20231201.dict"), "old").unwrap();
    fs::write(dict_dir.join("zhwiki-20240101.dict"), "older").unwrap();
    fs::write(dict_dir.join("CustomPinyinDictionary_Fcitx.dict"), "keep").unwrap();

    let transport = ScriptedTransport::new(vec![release_json(
        "0.2.5",
        &["zhwiki-20240101.dict", "zhwiki-20240509.dict", "notes.txt"],
    )])
    .with_file(&download_url("zhwiki-20240509.dict"), b"fresh".to_vec());

    let report = run(&profile, &transport, &config).unwrap();

    assert_eq!(report.asset, "zhwiki-20240509.dict");
    assert_eq!(report.install.as_ref().unwrap().removed.len(), 2);
    let mut remaining: Vec<String> = fs::read_dir(&dict_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    remaining.sort();
    assert_eq!(
        remaining,
        vec!["CustomPinyinDictionary_Fcitx.dict", "zhwiki-20240509.dict"]
    );
    assert_eq!(fs::read(dict_dir.join("zhwiki-20240509.dict")).unwrap(), b"fresh");
    assert_eq!(
        transport.downloads.borrow().as_slice(),
        [download_url("zhwiki-20240509.dict")]
    );

    let status = read_status(&profile.status_file);
    assert_eq!(status["version"], "0.2.5");
    assert_eq!(status["latest_dict_date"], "20240509");
    assert_eq!(status["latest_dict_name"], "zhwiki-20240509.dict");
    let line = status["update_history"][0].as_str().unwrap().to_string();
    assert!(line.ends_with(", dictionary file: zhwiki-20240509.dict"), "{line}");
}

#[test]
fn zhwiki_failed_download_keeps_existing_files() {
    let root = TempDir::new().unwrap();
    let config = fast_config(root.path());
    let profile = profiles::zhwiki(root.path()).unwrap();
    let dict_dir = root.path().join("dict");
    fs::create_dir_all(&dict_dir).unwrap();
    fs::write(dict_dir.join("zhwiki-20240101.dict"), "current").unwrap();

    let transport = ScriptedTransport::new(vec![release_json("0.2.6", &["zhwiki-20240509.dict"])]);

    let err = run(&profile, &transport, &config).unwrap_err();

    assert!(matches!(err, SyncError::Install(InstallError::Download { .. })));
    assert!(dict_dir.join("zhwiki-20240101.dict").exists());
}

#[test]
fn zhwiki_history_is_capped() {
    let root = TempDir::new().unwrap();
    let mut config = fast_config(root.path());
    config.force = true;
    let profile = profiles::zhwiki(root.path()).unwrap();
    let transport = ScriptedTransport::default()
        .with_file(&download_url("zhwiki-20240509.dict"), b"x".to_vec());

    for i in 0..53 {
        transport.push_reply(release_json(&format!("r{i}"), &["zhwiki-20240509.dict"]));
        run(&profile, &transport, &config).unwrap();
    }

    let status = read_status(&profile.status_file);
    let history = status["update_history"].as_array().unwrap();
    assert_eq!(history.len(), 50);
    assert!(history[0].as_str().unwrap().contains("`r3`"));
    assert!(history[49].as_str().unwrap().contains("`r52`"));
    assert_eq!(status["version"], "r52");
}
