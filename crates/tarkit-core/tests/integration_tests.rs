//! Integration tests for tarkit-core.
//!
//! These tests exercise the public API end to end: writing archives,
//! reading them back in different chunkings, and extracting onto a real
//! filesystem.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use tarkit_core::ArchiveError;
use tarkit_core::ArchiveReader;
use tarkit_core::ArchiveWriter;
use tarkit_core::CompressionCodec;
use tarkit_core::CreationConfig;
use tarkit_core::Entry;
use tarkit_core::EntryType;
use tarkit_core::ExtractOptions;
use tarkit_core::FormatIssue;
use tarkit_core::create_archive;
use tarkit_core::create_archive_file;
use tarkit_core::extract;
use tarkit_core::extract_archive;
use tarkit_core::formats::header::BLOCK_SIZE;
use tarkit_core::formats::pax;
use tarkit_core::list_archive;
use tarkit_core::parse_bytes;
use tempfile::TempDir;

fn sample_entries() -> Vec<Entry> {
    vec![
        Entry::directory("pkg").with_mtime(1_700_000_000),
        Entry::file("pkg/readme.md", b"# readme\n".to_vec())
            .with_mtime(1_700_000_001)
            .with_owner(1000, 100, "alice", "users"),
        Entry::file("pkg/empty", Vec::new()),
        Entry::symlink("pkg/latest", "readme.md"),
        Entry::hardlink("pkg/alias", "pkg/readme.md"),
        Entry::file("pkg/data.bin", (0..3000u32).map(|i| (i % 256) as u8).collect()),
    ]
}

fn feed(bytes: &[u8], chunk: usize) -> Vec<Entry> {
    let mut reader = ArchiveReader::new();
    let mut out = Vec::new();
    for piece in bytes.chunks(chunk) {
        out.extend(reader.push(piece).unwrap());
    }
    reader.finish().unwrap();
    out
}

#[test]
fn test_write_then_extract_concrete_scenario() {
    let temp = TempDir::new().unwrap();
    let bytes = create_archive(&[
        Entry::file("a.txt", b"hi".to_vec()),
        Entry {
            name: "dir/".to_string(),
            entry_type: EntryType::Directory,
            mode: 0o755,
            ..Entry::default()
        },
    ])
    .unwrap();

    let report = extract(&bytes[..], temp.path(), &ExtractOptions::default()).unwrap();

    let file = temp.path().join("a.txt");
    assert_eq!(fs::metadata(&file).unwrap().len(), 2);
    assert_eq!(fs::read(&file).unwrap(), b"hi");
    let dir = temp.path().join("dir");
    assert!(dir.is_dir());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    assert_eq!(report.entries.len(), 2);
}

#[test]
fn test_roundtrip_preserves_header_fields() {
    let entries = sample_entries();
    let bytes = create_archive(&entries).unwrap();
    let parsed = parse_bytes(&bytes).unwrap();
    assert_eq!(parsed, entries);
}

#[test]
fn test_written_entries_carry_current_mtime() {
    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let bytes = create_archive(&[Entry::file("a.txt", b"hi".to_vec())]).unwrap();
    let parsed = parse_bytes(&bytes).unwrap();
    assert!(parsed[0].mtime >= before);
}

#[test]
fn test_chunking_does_not_change_output() {
    let bytes = create_archive(&sample_entries()).unwrap();
    let whole = feed(&bytes, bytes.len());
    assert_eq!(feed(&bytes, 1), whole);
    assert_eq!(feed(&bytes, 511), whole);
    assert_eq!(feed(&bytes, 513), whole);
}

#[test]
fn test_single_byte_flip_fails_checksum() {
    let bytes = create_archive(&[Entry::file("flip.txt", b"x".to_vec())]).unwrap();
    for offset in (0..BLOCK_SIZE).filter(|o| !(148..156).contains(o)) {
        let mut corrupted = bytes.clone();
        corrupted[offset] ^= 0x01;
        let err = parse_bytes(&corrupted).unwrap_err();
        assert!(
            matches!(err.format_issue(), Some(FormatIssue::InvalidChecksum { .. })),
            "offset {offset}: {err}"
        );
    }
}

#[test]
fn test_missing_second_terminator_is_tolerated() {
    let bytes = create_archive(&sample_entries()).unwrap();
    let cut = &bytes[..bytes.len() - BLOCK_SIZE];
    assert_eq!(parse_bytes(cut).unwrap().len(), sample_entries().len());

    let no_terminator = &bytes[..bytes.len() - 2 * BLOCK_SIZE];
    assert_eq!(parse_bytes(no_terminator).unwrap().len(), sample_entries().len());
}

#[test]
fn test_mid_content_truncation_is_fatal() {
    let bytes = create_archive(&[Entry::file("big", vec![1u8; 2000])]).unwrap();
    let err = parse_bytes(&bytes[..BLOCK_SIZE + 1000]).unwrap_err();
    assert!(matches!(err, ArchiveError::Truncated { missing: 1000 }));
}

#[test]
fn test_pax_long_path_roundtrip() {
    let name: String = (0..50).map(|i| format!("dir{i:06}/")).collect::<String>() + "end.txt";
    assert!(name.len() > 255);
    let link_target = "t".repeat(150);

    let entries = vec![
        Entry::file(name.clone(), b"payload".to_vec()),
        Entry::symlink("short-link", link_target.clone()),
    ];
    let parsed = parse_bytes(&create_archive(&entries).unwrap()).unwrap();

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].name, name);
    assert_eq!(parsed[0].content, b"payload");
    assert_eq!(parsed[1].linkname, link_target);
}

#[test]
fn test_500_character_path() {
    let name = format!("{}/{}", "a".repeat(249), "b".repeat(250));
    assert_eq!(name.len(), 500);
    let parsed = parse_bytes(&create_archive(&[Entry::file(name.clone(), Vec::new())]).unwrap())
        .unwrap();
    assert_eq!(parsed[0].name, name);
}

#[test]
fn test_long_name_split_without_pax() {
    let name = format!("{}/{}", "p".repeat(60), "n".repeat(89));
    assert_eq!(name.len(), 150);
    let entry = Entry::file(name.clone(), Vec::new());
    assert!(!pax::needs_pax(&entry));

    let bytes = create_archive(&[entry]).unwrap();
    // One header and the terminator: no extended header was needed.
    assert_eq!(bytes.len(), 3 * BLOCK_SIZE);
    assert_eq!(parse_bytes(&bytes).unwrap()[0].name, name);
}

#[test]
fn test_unsplittable_name_is_rejected() {
    let name = "x".repeat(150);
    let err = create_archive(&[Entry::file(name, Vec::new())]).unwrap_err();
    assert!(matches!(err, ArchiveError::NameTooLong { len: 150, .. }));
}

#[test]
fn test_writer_tracks_counts() {
    let mut writer = ArchiveWriter::new(Vec::new());
    for entry in sample_entries() {
        writer.append(&entry).unwrap();
    }
    assert_eq!(writer.entries_written(), 6);
    let written = writer.bytes_written();
    let bytes = writer.finish().unwrap();
    assert_eq!(bytes.len() as u64, written + 2 * BLOCK_SIZE as u64);
    assert_eq!(bytes.len() % BLOCK_SIZE, 0);
}

#[test]
fn test_path_traversal_aborts_extraction() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("root");
    let bytes = create_archive(&[
        Entry::file("before.txt", b"ok".to_vec()),
        Entry::file("../../etc/evil", b"pwned".to_vec()),
        Entry::file("after.txt", b"never".to_vec()),
    ])
    .unwrap();

    let err = extract(&bytes[..], &dest, &ExtractOptions::default()).unwrap_err();
    assert!(err.is_security_violation());
    assert!(dest.join("before.txt").is_file());
    assert!(!dest.join("after.txt").exists());
    assert!(!temp.path().join("etc").exists());
}

#[test]
#[cfg(unix)]
fn test_extract_links_and_strip() {
    let temp = TempDir::new().unwrap();
    let bytes = create_archive(&sample_entries()).unwrap();
    let report = extract(
        &bytes[..],
        temp.path(),
        &ExtractOptions::default().with_strip_components(1),
    )
    .unwrap();

    let root = temp.path();
    assert_eq!(fs::read(root.join("readme.md")).unwrap(), b"# readme\n");
    assert_eq!(fs::read_link(root.join("latest")).unwrap().to_str(), Some("readme.md"));
    assert_eq!(fs::read(root.join("alias")).unwrap(), b"# readme\n");
    assert_eq!(fs::metadata(root.join("data.bin")).unwrap().len(), 3000);
    assert_eq!(report.entries_skipped, 1);
    assert_eq!(report.symlinks_created, 1);
    assert_eq!(report.hardlinks_created, 1);
}

#[test]
fn test_filesystem_roundtrip_compressed() {
    for codec in [None, Some(CompressionCodec::Gzip), Some(CompressionCodec::Xz)] {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("project");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("nested/deeper/leaf.txt"), "leaf").unwrap();

        let archive = temp.path().join("out.tar");
        let config = CreationConfig::default().with_compression(codec);
        create_archive_file(&archive, &[&src], &config).unwrap();

        let names: Vec<_> = list_archive(&archive)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "project/",
                "project/nested/",
                "project/nested/deeper/",
                "project/nested/deeper/leaf.txt",
                "project/top.txt",
            ]
        );

        let out = temp.path().join("restored");
        extract_archive(&archive, &out, &ExtractOptions::default()).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("project/nested/deeper/leaf.txt")).unwrap(),
            "leaf"
        );
    }
}
