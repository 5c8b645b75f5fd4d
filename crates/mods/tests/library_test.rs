//! Integration tests for mod folder operations

use modkeeper_core::{Error, ModsConfig};
use modkeeper_dirlock::DirectoryLockManager;
use modkeeper_mods::ModLibrary;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

struct Fixture {
    _temp_dir: TempDir,
    root: PathBuf,
    character: PathBuf,
    locks: Arc<DirectoryLockManager>,
    library: Arc<ModLibrary>,
}

/// `<root>/Raiden/{ModA, DISABLED ModB}` with a preview in ModA
async fn fixture() -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("Mods");
    let character = root.join("Raiden");
    tokio::fs::create_dir_all(character.join("ModA")).await.unwrap();
    tokio::fs::create_dir_all(character.join("DISABLED ModB")).await.unwrap();
    tokio::fs::write(character.join("ModA").join("preview.png"), PNG_HEADER)
        .await
        .unwrap();

    let locks = Arc::new(DirectoryLockManager::new());
    let library = Arc::new(ModLibrary::new(
        &root,
        Arc::clone(&locks),
        &ModsConfig::default(),
    ));

    Fixture {
        _temp_dir: temp_dir,
        root,
        character,
        locks,
        library,
    }
}

#[tokio::test]
async fn test_character_mods_report_status_and_preview() {
    let f = fixture().await;

    let folders = f.library.mod_folders().await.unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "Raiden");
    assert_eq!(folders[0].path, f.root.join("Raiden"));

    let mods = f.library.character_mods(&f.character).await.unwrap();
    let summary: Vec<(&str, bool, bool)> = mods
        .iter()
        .map(|m| (m.name.as_str(), m.enabled, m.preview.is_some()))
        .collect();
    assert_eq!(
        summary,
        vec![("DISABLED ModB", false, false), ("ModA", true, true)]
    );
    assert_eq!(
        mods[1].preview.as_ref().unwrap().path,
        f.character.join("ModA").join("preview.png")
    );
}

#[tokio::test]
async fn test_switch_round_trip() {
    let f = fixture().await;
    let enabled = f.character.join("ModA");

    let disabled = f.library.switch_mod_status(&enabled).await.unwrap();
    assert_eq!(disabled, f.character.join("DISABLED ModA"));
    assert!(disabled.is_dir());
    assert!(!enabled.exists());

    let restored = f.library.switch_mod_status(&disabled).await.unwrap();
    assert_eq!(restored, enabled);
    assert!(enabled.join("preview.png").is_file());
}

#[tokio::test]
async fn test_switch_lowercase_prefix_is_enabled() {
    let f = fixture().await;
    let lower = f.character.join("disabled ModC");
    tokio::fs::create_dir(&lower).await.unwrap();

    let enabled = f.library.switch_mod_status(&lower).await.unwrap();
    assert_eq!(enabled, f.character.join("ModC"));
}

#[tokio::test]
async fn test_switch_missing_folder_is_not_found() {
    let f = fixture().await;
    let result = f
        .library
        .switch_mod_status(f.character.join("Missing"))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_mod_removes_tree() {
    let f = fixture().await;
    let target = f.character.join("ModA");

    f.library.delete_mod(&target).await.unwrap();
    assert!(!target.exists());

    let result = f.library.delete_mod(&target).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_read_preview_sniffs_content_type() {
    let f = fixture().await;
    let preview = f.character.join("ModA").join("preview.png");

    let served = f.library.read_preview(&preview).await.unwrap();
    assert_eq!(served.content_type, "image/png");
    assert_eq!(served.bytes, PNG_HEADER);

    // Extension lies, bytes win
    let mislabeled = f.character.join("ModA").join("preview2.jpg");
    tokio::fs::write(&mislabeled, PNG_HEADER).await.unwrap();
    let served = f.library.read_preview(&mislabeled).await.unwrap();
    assert_eq!(served.content_type, "image/png");

    let missing = f.library.read_preview(f.character.join("ModA").join("gone.png")).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

fn mod_path(f: &Fixture, name: &str) -> PathBuf {
    f.character.join(name)
}

fn preview_in(dir: &Path) -> PathBuf {
    dir.join("preview.png")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_waits_for_preview_reader() {
    let f = fixture().await;
    let mod_a = mod_path(&f, "ModA");

    // A reader holding the preview's lock blocks the rename of its folder
    let reader = f.locks.acquire_read(&mod_a).await;

    let library = Arc::clone(&f.library);
    let rename_target = mod_a.clone();
    let rename = tokio::spawn(async move { library.switch_mod_status(&rename_target).await });

    sleep(Duration::from_millis(100)).await;
    assert!(!rename.is_finished());
    assert!(preview_in(&mod_a).is_file());

    reader.release();
    let renamed = timeout(Duration::from_secs(2), rename)
        .await
        .expect("rename did not proceed after reader released")
        .unwrap()
        .unwrap();
    assert_eq!(renamed, mod_path(&f, "DISABLED ModA"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_preview_read_waits_for_rename() {
    let f = fixture().await;
    let mod_a = mod_path(&f, "ModA");

    // Simulates a rename in progress on the character folder
    let writer = f.locks.acquire_write(&mod_a).await;

    let library = Arc::clone(&f.library);
    let preview = preview_in(&mod_a);
    let read = tokio::spawn(async move { library.read_preview(&preview).await });

    sleep(Duration::from_millis(100)).await;
    assert!(!read.is_finished());

    writer.release();
    let served = timeout(Duration::from_secs(2), read)
        .await
        .expect("read did not proceed after writer released")
        .unwrap()
        .unwrap();
    assert_eq!(served.content_type, "image/png");
}
