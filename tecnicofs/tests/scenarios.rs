//! Integration tests for single-threaded scenarios and invariants: one
//! `#[test]` per named behavior.

use tecnicofs::{FsError, OpenMode, Params, TecnicoFs};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fs_with(max_inode_count: usize, max_block_count: usize, max_open_files_count: usize, block_size: usize) -> TecnicoFs {
    let params = Params::new(max_inode_count, max_block_count, max_open_files_count, block_size)
        .expect("valid params");
    TecnicoFs::new(Some(params)).expect("fs construction")
}

#[test]
fn s1_write_then_read_back() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    assert_eq!(fs.write(f, b"AAA!\0").unwrap(), 5);
    fs.close(f).unwrap();

    let f2 = fs.open("/f1", OpenMode::empty()).unwrap();
    let mut buf = [0u8; 5];
    assert_eq!(fs.read(f2, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"AAA!\0");
}

#[test]
fn s2_hard_link_reads_same_bytes() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    fs.write(f, b"AAA!").unwrap();
    fs.close(f).unwrap();

    fs.link("/f1", "/l1").unwrap();

    let f2 = fs.open("/l1", OpenMode::empty()).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(fs.read(f2, &mut buf).unwrap(), 4);
    assert_eq!(&buf, b"AAA!");
}

#[test]
fn s3_symlink_follows_then_dangles_after_unlink() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    fs.write(f, b"AAA!").unwrap();
    fs.close(f).unwrap();

    fs.sym_link("/f1", "/s1").unwrap();

    let f2 = fs.open("/s1", OpenMode::empty()).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(fs.read(f2, &mut buf).unwrap(), 4);
    assert_eq!(&buf, b"AAA!");
    fs.close(f2).unwrap();

    fs.unlink("/f1").unwrap();
    assert!(matches!(
        fs.open("/s1", OpenMode::empty()),
        Err(FsError::NotFound(_))
    ));
}

#[test]
fn s4_link_name_too_long_is_rejected() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    fs.close(f).unwrap();

    let too_long = format!("/{}", "l".repeat(100));
    assert!(fs.link("/f1", &too_long).is_err());
}

#[test]
fn s5_unlink_refuses_open_file() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    assert!(matches!(fs.unlink("/f1"), Err(FsError::FileOpen)));
    fs.close(f).unwrap();
    fs.unlink("/f1").unwrap();
}

#[test]
fn s6_inode_table_bounded() {
    init();
    let fs = fs_with(2, 1024, 16, 1024);
    fs.open("/a", OpenMode::CREAT).unwrap();
    fs.open("/b", OpenMode::CREAT).unwrap();
    assert!(matches!(
        fs.open("/c", OpenMode::CREAT),
        Err(FsError::TableFull(_))
    ));
}

#[test]
fn truncate_resets_size_to_zero() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    fs.write(f, b"hello").unwrap();
    fs.close(f).unwrap();

    let f2 = fs.open("/f1", OpenMode::TRUNC).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(fs.read(f2, &mut buf).unwrap(), 0);
}

#[test]
fn append_starts_offset_at_size() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    fs.write(f, b"abc").unwrap();
    fs.close(f).unwrap();

    let f2 = fs.open("/f1", OpenMode::APPEND).unwrap();
    fs.write(f2, b"def").unwrap();
    fs.close(f2).unwrap();

    let f3 = fs.open("/f1", OpenMode::empty()).unwrap();
    let mut buf = [0u8; 6];
    assert_eq!(fs.read(f3, &mut buf).unwrap(), 6);
    assert_eq!(&buf, b"abcdef");
}

#[test]
fn hard_link_count_keeps_inode_alive_until_last_unlink() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/a", OpenMode::CREAT).unwrap();
    fs.write(f, b"x").unwrap();
    fs.close(f).unwrap();

    fs.link("/a", "/b").unwrap();
    fs.unlink("/a").unwrap();

    let fb = fs.open("/b", OpenMode::empty()).unwrap();
    let mut buf = [0u8; 1];
    assert_eq!(fs.read(fb, &mut buf).unwrap(), 1);
    fs.close(fb).unwrap();

    fs.unlink("/b").unwrap();
    assert!(matches!(fs.open("/a", OpenMode::empty()), Err(FsError::NotFound(_))));
    assert!(matches!(fs.open("/b", OpenMode::empty()), Err(FsError::NotFound(_))));

    // the freed inode slot must be reusable.
    fs.open("/c", OpenMode::CREAT).unwrap();
}

#[test]
fn no_hard_link_to_symlink() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    let f = fs.open("/f1", OpenMode::CREAT).unwrap();
    fs.close(f).unwrap();
    fs.sym_link("/f1", "/s1").unwrap();

    assert!(matches!(fs.link("/s1", "/x"), Err(FsError::IsSymlink)));
}

#[test]
fn path_validation_rejects_malformed_names() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    assert!(matches!(
        fs.open("/", OpenMode::CREAT),
        Err(FsError::InvalidPath(_))
    ));
    assert!(matches!(
        fs.open("noslash", OpenMode::CREAT),
        Err(FsError::InvalidPath(_))
    ));
    let too_long = format!("/{}", "a".repeat(64));
    assert!(matches!(
        fs.open(&too_long, OpenMode::CREAT),
        Err(FsError::InvalidPath(_))
    ));
}

#[test]
fn symlink_cycle_is_rejected_not_infinite() {
    init();
    let fs = TecnicoFs::new(None).unwrap();
    // Build a and b as plain files first so sym_link's existence check
    // passes, then repoint b -> a, a -> b to form a cycle.
    fs.open("/a", OpenMode::CREAT).unwrap();
    fs.sym_link("/a", "/b").unwrap();
    fs.unlink("/a").unwrap();
    fs.open("/a", OpenMode::CREAT).unwrap();
    fs.unlink("/a").unwrap();
    fs.sym_link("/b", "/a").unwrap();

    assert!(matches!(
        fs.open("/a", OpenMode::empty()),
        Err(FsError::TooDeepSymlinkChain)
    ));
}

#[test]
fn copy_from_external_fs_round_trips_bytes() {
    init();
    let fs = TecnicoFs::new(None).unwrap();

    let mut tmp = std::env::temp_dir();
    tmp.push(format!("tecnicofs-test-{}.bin", std::process::id()));
    std::fs::write(&tmp, b"imported bytes").unwrap();

    fs.copy_from_external_fs(&tmp, "/imported").unwrap();
    std::fs::remove_file(&tmp).ok();

    let f = fs.open("/imported", OpenMode::empty()).unwrap();
    let mut buf = [0u8; 14];
    assert_eq!(fs.read(f, &mut buf).unwrap(), 14);
    assert_eq!(&buf, b"imported bytes");
}

#[test]
fn copy_from_external_fs_rejects_oversized_host_file() {
    init();
    let fs = fs_with(64, 1024, 16, 8);

    let mut tmp = std::env::temp_dir();
    tmp.push(format!("tecnicofs-test-big-{}.bin", std::process::id()));
    std::fs::write(&tmp, vec![b'x'; 64]).unwrap();

    let result = fs.copy_from_external_fs(&tmp, "/too-big");
    std::fs::remove_file(&tmp).ok();

    assert!(matches!(result, Err(FsError::HostFileTooLarge { .. })));
    assert!(matches!(
        fs.open("/too-big", OpenMode::empty()),
        Err(FsError::NotFound(_))
    ));
}

#[test]
fn params_validation_rejects_zero_sizes() {
    assert!(Params::new(0, 1024, 16, 1024).is_err());
    assert!(Params::new(64, 1024, 16, 0).is_err());
    assert!(Params::new(64, 1024, 16, 4).is_err());
}
