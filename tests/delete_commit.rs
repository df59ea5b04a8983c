use std::fs;

use filetxn::adapters::lock::LockRegistry;
use filetxn::logging::JsonlSink;
use filetxn::{FileDelete, Transaction};

#[test]
fn delete_removes_main_and_backup() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let main = td.path().join("a.bin");
    let backup = td.path().join("a.bin.bak");
    fs::write(&main, b"X").unwrap();

    let del = FileDelete::new(&main, &backup, Box::new(reg.locker_for(&main))).unwrap();
    let outcome = Transaction::single(JsonlSink, JsonlSink, Box::new(del))
        .execute()
        .unwrap();

    assert!(outcome.is_committed());
    assert!(!main.exists());
    assert!(!backup.exists());
}

#[test]
fn delete_of_missing_file_commits_as_a_no_op() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let main = td.path().join("a.bin");

    let del = FileDelete::new(&main, td.path().join("a.bin.bak"), Box::new(reg.locker_for(&main)))
        .unwrap();
    let outcome = Transaction::single(JsonlSink, JsonlSink, Box::new(del))
        .execute()
        .unwrap();

    assert!(outcome.is_committed());
    assert!(!main.exists());
}

#[test]
fn delete_clears_a_stale_backup_first() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let main = td.path().join("a.bin");
    let backup = td.path().join("a.bin.bak");
    fs::write(&main, b"X").unwrap();
    fs::write(&backup, b"stale from a crashed run").unwrap();

    let del = FileDelete::new(&main, &backup, Box::new(reg.locker_for(&main))).unwrap();
    let outcome = Transaction::single(JsonlSink, JsonlSink, Box::new(del))
        .execute()
        .unwrap();

    assert!(outcome.is_committed());
    assert!(!main.exists());
    assert!(!backup.exists());
}
