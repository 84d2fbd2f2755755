//! Property-based tests for the header codec, PAX codec and reader.
//!
//! These tests use proptest to generate arbitrary inputs and verify the
//! codec laws hold across a wide range of cases.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use tarkit_core::ArchiveReader;
use tarkit_core::Entry;
use tarkit_core::create_archive;
use tarkit_core::formats::header;
use tarkit_core::formats::header::MAX_OCTAL_SIZE;
use tarkit_core::formats::pax;
use tarkit_core::parse_bytes;
use tarkit_core::types::strip_components;

fn entry_strategy() -> impl Strategy<Value = Entry> {
    let name = "[a-z0-9_]{1,16}(/[a-z0-9_.]{1,16}){0,3}";
    prop_oneof![
        (name, prop::collection::vec(any::<u8>(), 0..1500), 0u64..4_000_000_000)
            .prop_map(|(name, content, mtime)| Entry::file(name, content).with_mtime(mtime)),
        name.prop_map(Entry::directory),
        (name, name).prop_map(|(name, target)| Entry::symlink(name, target)),
    ]
}

proptest! {
    /// Padding is always in 0..512 and block-aligns the content.
    #[test]
    fn prop_padding_law(size in any::<u64>().prop_map(|s| s >> 2)) {
        let padding = header::padding(size);
        prop_assert!(padding < 512);
        prop_assert_eq!((size + padding) % 512, 0);
        prop_assert_eq!(padding == 0, size % 512 == 0);
    }

    /// The length prefix of an encoded record counts the whole record.
    #[test]
    fn prop_pax_record_length_is_self_consistent(
        key in "[a-z]{1,12}",
        value in "\\PC{0,400}",
    ) {
        let record = pax::encode_record(&key, &value);
        let text = String::from_utf8(record.clone()).unwrap();
        let (len, _) = text.split_once(' ').unwrap();
        prop_assert_eq!(len.parse::<usize>().unwrap(), record.len());
        prop_assert!(record.ends_with(b"\n"));
    }

    /// Encoded attributes decode back unchanged.
    #[test]
    fn prop_pax_attributes_roundtrip(
        path in "\\PC{1,600}",
        linkpath in proptest::option::of("\\PC{1,200}"),
        size in proptest::option::of(any::<u64>()),
        uid in proptest::option::of(any::<u32>()),
        uname in proptest::option::of("[a-z]{1,31}"),
    ) {
        let attrs = pax::PaxAttributes {
            path: Some(path),
            linkpath,
            size,
            uid: uid.map(u64::from),
            uname,
            ..Default::default()
        };
        let decoded = pax::decode(&pax::encode(&attrs)).unwrap();
        prop_assert_eq!(decoded, attrs);
    }

    /// `needs_pax` flips exactly past each classic-header limit.
    #[test]
    fn prop_needs_pax_boundaries(
        name_len in 1usize..400,
        link_len in 0usize..200,
        size_delta in 0u64..3,
    ) {
        let mut entry = Entry::symlink("n".repeat(name_len), "l".repeat(link_len));
        prop_assert_eq!(pax::needs_pax(&entry), name_len > 255 || link_len > 100);

        entry = Entry::file("f", Vec::new());
        entry.size = MAX_OCTAL_SIZE - 1 + size_delta;
        prop_assert_eq!(pax::needs_pax(&entry), entry.size > MAX_OCTAL_SIZE);
    }

    /// Writing then reading recovers the entries exactly.
    #[test]
    fn prop_archive_roundtrip(entries in prop::collection::vec(entry_strategy(), 0..8)) {
        let bytes = create_archive(&entries).unwrap();
        prop_assert_eq!(bytes.len() % 512, 0);
        prop_assert_eq!(parse_bytes(&bytes).unwrap(), entries);
    }

    /// Output does not depend on how the input is chunked.
    #[test]
    fn prop_chunking_invariance(
        entries in prop::collection::vec(entry_strategy(), 1..6),
        chunk in 1usize..1200,
    ) {
        let bytes = create_archive(&entries).unwrap();
        let mut reader = ArchiveReader::new();
        let mut got = Vec::new();
        for piece in bytes.chunks(chunk) {
            got.extend(reader.push(piece).unwrap());
        }
        reader.finish().unwrap();
        prop_assert!(reader.is_complete());
        prop_assert_eq!(got, entries);
    }

    /// Stripping never leaves a leading separator or an empty name.
    #[test]
    fn prop_strip_components_shape(
        segments in prop::collection::vec("[a-z]{1,8}", 1..6),
        leading_slash in any::<bool>(),
        count in 0usize..7,
    ) {
        let mut name = segments.join("/");
        if leading_slash {
            name.insert(0, '/');
        }
        match strip_components(&name, count) {
            Some(stripped) => {
                prop_assert!(count < segments.len());
                prop_assert!(!stripped.is_empty());
                prop_assert!(!stripped.starts_with('/'));
                prop_assert_eq!(stripped, segments[count..].join("/"));
            }
            None => prop_assert!(count >= segments.len()),
        }
    }
}
