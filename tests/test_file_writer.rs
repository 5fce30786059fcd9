use rs_log_ng::writers::{FileWriter, FileWriterBuilder, MutexWriter, Writer};
use rs_log_ng::{LogError, Logger};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn creates_parent_directories_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/app.log");

    let w = FileWriter::open(&path, 0, 0).unwrap();
    assert_eq!(w.path(), path);
    w.write(b"one\n").unwrap();
    w.write(b"two\n").unwrap();
    assert_eq!(read(&path), "one\ntwo\n");
    assert_eq!(w.size(), 8);

    let again = FileWriter::open(&path, 0, 0).unwrap();
    again.write(b"three\n").unwrap();
    assert_eq!(read(&path), "one\ntwo\nthree\n");
    assert_eq!(again.size(), 14);
}

#[test]
fn size_counts_writes_without_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.log");
    fs::write(&path, "seed\n").unwrap();

    let w = FileWriter::open(&path, 0, 0).unwrap();
    assert_eq!(w.size(), 5);
    for _ in 0..100 {
        w.write(b"0123456789").unwrap();
    }
    assert_eq!(w.size(), 1005);
    assert_eq!(fs::metadata(&path).unwrap().len(), 1005);
    assert!(w.backups().unwrap().is_empty());
}

#[test]
fn directory_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileWriter::open(dir.path(), 0, 0).unwrap_err();
    assert!(matches!(err, LogError::NotRegularFile(_)), "{err}");
}

#[test]
fn crossing_the_limit_rotates_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let w = FileWriter::open(&path, 10, 0).unwrap();

    w.write(b"12345").unwrap();
    assert!(w.backups().unwrap().is_empty());
    w.write(b"67890").unwrap();

    let backups = w.backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(read(&backups[0]), "1234567890");
    assert_eq!(read(&path), "");
    assert_eq!(w.size(), 0);

    let name = backups[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("app-") && name.ends_with(".log"), "{name}");
    assert_eq!(name.len(), "app-".len() + 25 + ".log".len());

    w.write(b"abc").unwrap();
    assert_eq!(read(&path), "abc");
    assert_eq!(w.backups().unwrap().len(), 1);
}

#[test]
fn oversized_existing_file_is_rotated_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.log");
    fs::write(&path, "x".repeat(100)).unwrap();

    let w = FileWriter::open(&path, 50, 0).unwrap();
    assert_eq!(w.size(), 0);
    assert_eq!(read(&path), "");
    let backups = w.backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(read(&backups[0]).len(), 100);
}

#[test]
fn old_backups_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let w = FileWriter::open(&path, 4, 2).unwrap();

    for i in 0..6 {
        w.write(format!("{i:04}").as_bytes()).unwrap();
    }

    assert!(
        wait_for(|| w.backups().unwrap().len() == 2),
        "backups left: {:?}",
        w.backups().unwrap()
    );
    let kept: Vec<_> = w.backups().unwrap().iter().map(|p| read(p)).collect();
    assert_eq!(kept, ["0004", "0005"]);
}

#[test]
fn zero_backups_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let w = FileWriter::open(&path, 1, 0).unwrap();
    for _ in 0..5 {
        w.write(b"x").unwrap();
    }
    thread::sleep(Duration::from_millis(50));
    assert_eq!(w.backups().unwrap().len(), 5);
}

#[test]
fn close_is_idempotent_and_write_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let w = FileWriter::open(&path, 0, 0).unwrap();
    w.write(b"a").unwrap();
    w.close().unwrap();
    w.close().unwrap();
    assert!(!w.is_open());

    w.write(b"b").unwrap();
    assert!(w.is_open());
    assert_eq!(read(&path), "ab");
    assert_eq!(w.size(), 2);
}

#[test]
fn concurrent_writers_rotate_without_losing_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let errors = Arc::new(MutexWriter::new(Vec::new()));
    let w = FileWriterBuilder::new(&path)
        .max_size(1024)
        .error_output(errors.clone())
        .open()
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let w = w.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    w.write(format!("t{t}-{i:05}\n").as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut total = read(&path).lines().count();
    for backup in w.backups().unwrap() {
        total += read(&backup).lines().count();
    }
    assert_eq!(total, 800);
    assert!(w.backups().unwrap().len() >= 5);
    assert_eq!(errors.contents(), "");
}

#[test]
fn logger_writes_through_file_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("svc.log");
    let logger = Logger::new("svc");
    logger.set_output(FileWriter::open(&path, 0, 0).unwrap().into_shared());

    logger.with_field("n", 1).info("ready");

    let text = read(&path);
    assert!(text.contains("\"message\":\"ready\"") && text.ends_with("}\n"));
}
