//! Black-box coverage of the testable scenarios, built against the exact
//! byte layouts described for each one, driven only through the crate's
//! public API.

use dvdbnd::filelist::Filelist;
use dvdbnd::format::compressed::CompressedPackage;
use dvdbnd::format::external::{DataEntry, ExternalArchive, ExternalHeader, ExternalPayload};
use dvdbnd::format::standalone::StandaloneBuilder;
use dvdbnd::hash::PathHasher;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

#[test]
fn scenario_a_hash() {
    assert_eq!(PathHasher::hash("/chr/c0000.anibnd.dcx"), 0xF863_0FB1);
    assert_eq!(PathHasher::hex(0xF863_0FB1), "F8630FB1");
}

#[test]
fn scenario_b_external_extract() {
    let dir = tempdir().unwrap();
    let header_path = dir.path().join("dvdbnd0.bhd5");
    let payload_path = dir.path().join("dvdbnd0.bdt");

    let mut payload = ExternalPayload::create(&payload_path).unwrap();
    let (offset, size) = payload.append(b"hello").unwrap();
    assert_eq!(offset, 16); // right after the 16-byte payload magic
    assert_eq!(size, 5);

    let mut header = ExternalHeader::new();
    let record = header.push_record();
    header.push_entry(
        record,
        DataEntry {
            key: 0xF863_0FB1,
            size,
            offset: offset as u32,
            unk: 0,
        },
    );
    let mut header_file = fs::File::create(&header_path).unwrap();
    header.save(&mut header_file).unwrap();
    drop(header_file);

    let filelist_path = dir.path().join("filelist.json");
    fs::write(&filelist_path, r#"{"F8630FB1": "/a/b.txt"}"#).unwrap();
    let filelist = Filelist::load(&filelist_path).unwrap();

    let mut archive = ExternalArchive::load(&header_path, &payload_path).unwrap();
    let output_dir = dir.path().join("output");
    archive
        .export_all(&output_dir, Some(&filelist), false)
        .unwrap();

    assert_eq!(
        fs::read_to_string(output_dir.join("a/b.txt")).unwrap(),
        "hello"
    );
}

#[test]
fn scenario_c_compressed_round_trip() {
    let original = b"The quick brown fox".to_vec();
    let package = CompressedPackage::from_payload(original.clone());

    let mut encoded = Vec::new();
    package.encode(&mut encoded, std::path::Path::new("test.dcx")).unwrap();

    assert_eq!(&encoded[0..4], &0x4443_5800u32.to_be_bytes());
    assert!(encoded.windows(4).any(|w| w == b"DFLT"));

    let mut cursor = Cursor::new(encoded);
    let decoded =
        CompressedPackage::decode(&mut cursor, std::path::Path::new("test.dcx")).unwrap();
    assert_eq!(decoded.payload(), original.as_slice());
}

#[test]
fn scenario_d_standalone_path() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("common.emevd");
    fs::write(&source, b"evt").unwrap();

    let mut builder = StandaloneBuilder::new();
    builder.add(&source, "N:\\FRPG\\data\\event\\common.emevd");
    let archive_path = dir.path().join("out.bnd");
    builder.write(&archive_path).unwrap();

    let mut archive = dvdbnd::format::standalone::StandaloneArchive::load(&archive_path).unwrap();
    let output_dir = dir.path().join("output");
    archive
        .extract_all(&archive_path, &output_dir, true)
        .unwrap();

    assert!(output_dir
        .join("N/FRPG/data/event/common.emevd")
        .exists());
}

#[test]
fn scenario_e_unknown_key_fallback() {
    let dir = tempdir().unwrap();
    let header_path = dir.path().join("dvdbnd0.bhd5");
    let payload_path = dir.path().join("dvdbnd0.bdt");

    let mut payload = ExternalPayload::create(&payload_path).unwrap();
    let mut body = b"BND3".to_vec();
    body.extend_from_slice(b"rest-of-file");
    let (offset, size) = payload.append(&body).unwrap();

    let mut header = ExternalHeader::new();
    let record = header.push_record();
    header.push_entry(
        record,
        DataEntry {
            key: 0xDEAD_BEEF,
            size,
            offset: offset as u32,
            unk: 0,
        },
    );
    let mut header_file = fs::File::create(&header_path).unwrap();
    header.save(&mut header_file).unwrap();
    drop(header_file);

    let mut archive = ExternalArchive::load(&header_path, &payload_path).unwrap();
    let output_dir = dir.path().join("output");
    archive.export_all(&output_dir, None, false).unwrap();

    assert!(output_dir.join("file_DEADBEEF.bnd").exists());
}

#[test]
fn external_archive_export_then_reimport_round_trips_named_entry() {
    let dir = tempdir().unwrap();
    let header_path = dir.path().join("dvdbnd0.bhd5");
    let payload_path = dir.path().join("dvdbnd0.bdt");

    let mut payload = ExternalPayload::create(&payload_path).unwrap();
    let (offset, size) = payload.append(b"hello").unwrap();

    let key = PathHasher::hash("/a/b.txt");
    let mut header = ExternalHeader::new();
    let record = header.push_record();
    header.push_entry(
        record,
        DataEntry {
            key,
            size,
            offset: offset as u32,
            unk: 0,
        },
    );
    let mut header_file = fs::File::create(&header_path).unwrap();
    header.save(&mut header_file).unwrap();
    drop(header_file);

    let filelist_path = dir.path().join("filelist.json");
    fs::write(
        &filelist_path,
        format!(r#"{{"{}": "/a/b.txt"}}"#, PathHasher::hex(key)),
    )
    .unwrap();
    let filelist = Filelist::load(&filelist_path).unwrap();

    let mut archive = ExternalArchive::load(&header_path, &payload_path).unwrap();
    let output_dir = dir.path().join("output");
    archive
        .export_all(&output_dir, Some(&filelist), false)
        .unwrap();

    let rebuilt_header = dir.path().join("rebuilt.bhd5");
    let rebuilt_payload = dir.path().join("rebuilt.bdt");
    ExternalArchive::import(&rebuilt_header, &rebuilt_payload, &output_dir).unwrap();

    let rebuilt = ExternalArchive::load(&rebuilt_header, &rebuilt_payload).unwrap();
    assert_eq!(rebuilt.header().records[0].entries[0].key, key);
}

#[test]
fn standalone_archive_extract_then_rebuild_round_trips_idents() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("a.anibnd");
    fs::write(&source, b"hello").unwrap();

    let mut builder = StandaloneBuilder::new();
    builder.add(&source, "chr\\c0000.anibnd");
    let archive_path = dir.path().join("out.bnd");
    builder.write(&archive_path).unwrap();

    let mut archive = dvdbnd::format::standalone::StandaloneArchive::load(&archive_path).unwrap();
    let extracted_dir = dir.path().join("extracted");
    archive
        .extract_all(&archive_path, &extracted_dir, true)
        .unwrap();

    let rebuilt_path = dir.path().join("rebuilt.bnd");
    dvdbnd::format::standalone::StandaloneArchive::rebuild_from_tree(
        &extracted_dir,
        &rebuilt_path,
    )
    .unwrap();

    let rebuilt = dvdbnd::format::standalone::StandaloneArchive::load(&rebuilt_path).unwrap();
    assert_eq!(rebuilt.header().entries.len(), 1);
    assert_eq!(rebuilt.header().entries[0].decoded_path, "chr\\c0000.anibnd");
    assert_eq!(rebuilt.header().magic, archive.header().magic);
}
