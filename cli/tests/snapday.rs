use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::tempdir;

fn snapday(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("snapday").unwrap();
    cmd.env("SNAPDAY_HOME", home)
        .env_remove("SNAPDAY_DATA_DIR")
        .env_remove("SNAPDAY_STORE_BACKEND")
        .env_remove("RUST_LOG");
    cmd
}

fn write_png(dir: &Path) -> String {
    let path = dir.join("frame.png");
    fs::write(&path, b"\x89PNG\r\n\x1a\nfake").unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn capture_once_per_day() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let image = write_png(home.path());

    snapday(home.path())
        .args(["capture", "-m", "hi", "--image", &image])
        .assert()
        .success()
        .stdout(contains("Saved entry"));

    snapday(home.path())
        .args(["capture", "-m", "different", "--image", &image])
        .assert()
        .success()
        .stdout(contains("only make one entry per day"));

    let next: i64 = fs::read_to_string(home.path().join("data/nextAvailableTime.json"))?
        .trim()
        .parse()?;
    assert!(next > 0);

    snapday(home.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(contains(r#""message":"hi""#))
        .stdout(contains("different").not());

    snapday(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Closed until"));
    Ok(())
}

#[test]
fn delete_reports_out_of_range() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let image = write_png(home.path());
    snapday(home.path())
        .args(["capture", "-m", "hi", "--image", &image])
        .assert()
        .success();

    snapday(home.path())
        .args(["delete", "5"])
        .assert()
        .failure()
        .stderr(contains("out of range"));

    snapday(home.path())
        .args(["delete", "0"])
        .assert()
        .success()
        .stdout(contains("Deleted entry 0"));

    snapday(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No entries yet."));
    Ok(())
}

#[test]
fn non_image_capture_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let note = home.path().join("note.txt");
    fs::write(&note, "hello")?;
    snapday(home.path())
        .args(["capture", "-m", "hi", "--image", note.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("capture unavailable"));

    snapday(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Ready"));
    Ok(())
}

#[test]
fn remind_once_notifies_for_elapsed_deadline() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let data = home.path().join("data");
    fs::create_dir_all(&data)?;
    fs::write(data.join("nextAvailableTime.json"), "1000")?;

    snapday(home.path())
        .args(["remind", "--once"])
        .assert()
        .success()
        .stdout(contains("[snapday] You can take today's snapshot now."));
    assert_eq!(
        fs::read_to_string(data.join("nextAvailableTime.json"))?.trim(),
        "0"
    );

    snapday(home.path())
        .args(["remind", "--once"])
        .assert()
        .success()
        .stdout(contains("Nothing due."));
    Ok(())
}

#[test]
fn status_clears_elapsed_deadline() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let data = home.path().join("data");
    fs::create_dir_all(&data)?;
    fs::write(data.join("nextAvailableTime.json"), "1000")?;

    snapday(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Available now"));
    snapday(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Ready"));
    Ok(())
}

#[test]
fn timelapse_writes_frames_and_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    let out = home.path().join("video");

    snapday(home.path())
        .args(["timelapse", "--out", out.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("no entries"));

    let image = write_png(home.path());
    snapday(home.path())
        .args(["capture", "-m", "hi", "--image", &image])
        .assert()
        .success();
    snapday(home.path())
        .args(["timelapse", "--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Wrote 1 frames"));

    assert_eq!(fs::read(out.join("frame_0001.png"))?, b"\x89PNG\r\n\x1a\nfake");
    let manifest = fs::read_to_string(out.join("timelapse.txt"))?;
    assert!(manifest.contains("file 'frame_0001.png'"));
    assert!(manifest.contains("duration 0.1"));
    Ok(())
}

fn seed_entries(home: &Path, messages: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let data = home.join("data");
    fs::create_dir_all(&data)?;
    let entries: Vec<_> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            serde_json::json!({
                "message": m,
                "image": "data:image/png;base64,AA==",
                "date": format!("2024-06-0{}T09:00:00Z", i + 1),
            })
        })
        .collect();
    fs::write(data.join("entries.json"), serde_json::to_string(&entries)?)?;
    Ok(())
}

#[test]
fn browse_wraps_and_deletes_current() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    seed_entries(home.path(), &["first", "second"])?;

    snapday(home.path())
        .arg("browse")
        .write_stdin("n\nn\np\nd\nq\n")
        .assert()
        .success()
        .stdout(contains("[1/2]"))
        .stdout(contains("[2/2]"))
        .stdout(contains("Deleted entry 1"))
        .stdout(contains("[1/1]"));

    snapday(home.path())
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(contains("first"))
        .stdout(contains("second").not());

    snapday(home.path())
        .arg("browse")
        .write_stdin("d\n")
        .assert()
        .success()
        .stdout(contains("Deleted entry 0"))
        .stdout(contains("No entries yet."));
    Ok(())
}

#[test]
fn migrate_rejects_unknown_backend() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    seed_entries(home.path(), &["first"])?;
    let to = home.path().join("copy");

    snapday(home.path())
        .args(["migrate", "--to", to.to_str().unwrap(), "--backend", "redis"])
        .assert()
        .failure()
        .stderr(contains("unknown migrate backend"));
    assert!(!to.exists());

    snapday(home.path())
        .args(["migrate", "--to", to.to_str().unwrap(), "--backend", "json"])
        .assert()
        .success()
        .stdout(contains("Copied 1 keys"));
    assert!(to.join("entries.json").exists());
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
#[test]
fn migrate_to_sqlite_needs_the_feature() -> Result<(), Box<dyn std::error::Error>> {
    let home = tempdir()?;
    seed_entries(home.path(), &["first"])?;
    let to = home.path().join("copy");

    snapday(home.path())
        .args(["migrate", "--to", to.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("sqlite backend not compiled"));
    assert!(!to.exists());
    Ok(())
}
