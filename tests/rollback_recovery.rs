use std::fs;
use std::path::Path;

use filetxn::adapters::lock::LockRegistry;
use filetxn::adapters::ResourceLocker;
use filetxn::logging::JsonlSink;
use filetxn::serialize::Serializer;
use filetxn::types::errors::{Error, ErrorKind, Result};
use filetxn::{FileSave, FileTriple, Outcome, Transaction};

/// Serializer that writes part of the payload and then fails, as a torn network
/// stream would.
struct TornSerializer;

impl Serializer for TornSerializer {
    fn serialize(&self, dest: &Path) -> Result<()> {
        fs::write(dest, b"half-").map_err(|e| Error::io("write", e))?;
        Err(Error::new(ErrorKind::Io, "stream ended unexpectedly"))
    }
}

/// Serializer that fails before touching the destination at all.
struct UnavailableSerializer;

impl Serializer for UnavailableSerializer {
    fn serialize(&self, _dest: &Path) -> Result<()> {
        Err(Error::new(ErrorKind::Io, "source unavailable"))
    }
}

fn failing_save(reg: &LockRegistry, triple: &FileTriple, serializer: Box<dyn Serializer>) -> Box<FileSave> {
    Box::new(FileSave::new(
        triple.clone(),
        Box::new(reg.locker_for(triple.main())),
        serializer,
    ))
}

#[test]
fn torn_staging_rolls_back_to_prior_content() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let triple = FileTriple::with_default_scratch(td.path().join("a.bin")).unwrap();
    fs::write(triple.main(), b"original").unwrap();

    let outcome = Transaction::single(
        JsonlSink,
        JsonlSink,
        failing_save(&reg, &triple, Box::new(TornSerializer)),
    )
    .execute()
    .unwrap();

    let Outcome::RolledBack { cause } = outcome else {
        panic!("expected a rolled back outcome");
    };
    assert_eq!(cause.kind, ErrorKind::Io);
    assert_eq!(fs::read(triple.main()).unwrap(), b"original");
    assert!(!triple.temp().exists());
    assert!(!triple.backup().exists());
}

#[test]
fn torn_staging_with_no_prior_file_leaves_nothing() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let triple = FileTriple::with_default_scratch(td.path().join("a.bin")).unwrap();

    let outcome = Transaction::single(
        JsonlSink,
        JsonlSink,
        failing_save(&reg, &triple, Box::new(TornSerializer)),
    )
    .execute()
    .unwrap();

    assert!(!outcome.is_committed());
    assert!(!triple.main().exists());
    assert!(!triple.temp().exists());
    assert!(!triple.backup().exists());
}

#[test]
fn failure_before_staging_touches_nothing() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let triple = FileTriple::with_default_scratch(td.path().join("a.bin")).unwrap();
    fs::write(triple.main(), b"original").unwrap();

    let outcome = Transaction::single(
        JsonlSink,
        JsonlSink,
        failing_save(&reg, &triple, Box::new(UnavailableSerializer)),
    )
    .execute()
    .unwrap();

    assert!(!outcome.is_committed());
    assert_eq!(fs::read(triple.main()).unwrap(), b"original");
    assert!(!triple.temp().exists());
    assert!(!triple.backup().exists());
}

#[test]
fn unremovable_scratch_is_fatal_and_still_releases_the_lock() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let triple = FileTriple::with_default_scratch(td.path().join("a.bin")).unwrap();
    fs::write(triple.main(), b"original").unwrap();
    // A directory squatting on the temp path cannot be unlinked, whoever runs
    // the process; pre_run's scratch cleanup has to give up.
    fs::create_dir(triple.temp()).unwrap();

    use filetxn::serialize::{MemoryStreamProvider, StreamSerializer};
    let good = Box::new(StreamSerializer::new(MemoryStreamProvider::from("new")));
    let err = Transaction::single(JsonlSink, JsonlSink, failing_save(&reg, &triple, good))
        .execute()
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Cleanup);
    assert_eq!(fs::read(triple.main()).unwrap(), b"original");
    // The lock must not leak past the failed attempt.
    let locker = reg.locker_for(triple.main());
    drop(locker.acquire(100).unwrap());
}

#[test]
fn identity_is_reusable_after_a_rolled_back_save() {
    let td = tempfile::tempdir().unwrap();
    let reg = LockRegistry::new();
    let triple = FileTriple::with_default_scratch(td.path().join("a.bin")).unwrap();
    fs::write(triple.main(), b"original").unwrap();

    let _ = Transaction::single(
        JsonlSink,
        JsonlSink,
        failing_save(&reg, &triple, Box::new(TornSerializer)),
    )
    .execute()
    .unwrap();

    // The failed attempt released the lock and left a clean triple; a working
    // save straight after must commit.
    use filetxn::serialize::{MemoryStreamProvider, StreamSerializer};
    let good = Box::new(StreamSerializer::new(MemoryStreamProvider::from("fixed")));
    let outcome = Transaction::single(JsonlSink, JsonlSink, failing_save(&reg, &triple, good))
        .execute()
        .unwrap();
    assert!(outcome.is_committed());
    assert_eq!(fs::read(triple.main()).unwrap(), b"fixed");
}
