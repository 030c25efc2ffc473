//! End-to-end backup of a small directory tree, exercising the fixed
//! wire-record order across a directory, a small file, a multi-chunk
//! file, and an attributes-only empty file in a single job.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use checksums::strong::DigestAlgorithm;
use core::file_type::FileType;
use core::job::JobType;
use core::session::SessionContext;
use core::stat::FileStat;
use filters::option::OptionBlock;
use metadata::acl::{AclBackend, AclError};
use metadata::xattr::{XattrBackend, XattrEntry, XattrError};
use orchestrator::backup::BackupOrchestrator;
use orchestrator::packet::{BackupSource, CONTENT_BLOCK_SIZE, FileEntry};
use wire::framing::recv_record;
use wire::stream_type::StreamType;

struct MapSource(HashMap<String, Vec<u8>>);

impl BackupSource for MapSource {
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read>> {
        self.0
            .get(path)
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn Read>)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such path"))
    }
}

struct NoAcl;
impl AclBackend for NoAcl {
    fn gather(&self, _path: &std::path::Path) -> Result<Option<Vec<u8>>, AclError> {
        Ok(None)
    }
    fn apply(&self, _path: &std::path::Path, _blob: &[u8]) -> Result<(), AclError> {
        Ok(())
    }
}

struct NoXattr;
impl XattrBackend for NoXattr {
    fn gather(&self, _path: &std::path::Path) -> Result<Vec<XattrEntry>, XattrError> {
        Ok(Vec::new())
    }
    fn apply(&self, _path: &std::path::Path, _entries: &[XattrEntry]) -> Result<(), XattrError> {
        Ok(())
    }
}

fn regular_entry(path: &str, content_len: u64) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        file_type: FileType::Regular,
        stat: FileStat {
            size: content_len,
            ..Default::default()
        },
        link_target: None,
        delta_sequence: 0,
        options: OptionBlock {
            digest: Some(DigestAlgorithm::Sha256),
            ..Default::default()
        },
        hard_link_digest: None,
    }
}

#[test]
fn a_directory_small_file_and_multi_chunk_file_emit_records_in_order() {
    let big_content: Vec<u8> = (0..CONTENT_BLOCK_SIZE + 100).map(|i| (i % 251) as u8).collect();
    let small_content = b"hello from the small file".to_vec();

    let mut files = HashMap::new();
    files.insert("/data/small.txt".to_string(), small_content.clone());
    files.insert("/data/big.bin".to_string(), big_content.clone());
    let source = MapSource(files);
    let acl = NoAcl;
    let xattr = NoXattr;

    let mut out = Vec::new();
    let mut orchestrator =
        BackupOrchestrator::<_, _, NoAcl, NoXattr>::new(&mut out, &source, Some(&acl), Some(&xattr), None, None, 1, 1000);
    let mut ctx = SessionContext::new(1, "job".into(), JobType::Backup);

    let dir_entry = FileEntry {
        path: "/data".to_string(),
        file_type: FileType::DirectoryBegin,
        stat: FileStat::default(),
        link_target: None,
        delta_sequence: 0,
        options: OptionBlock::default(),
        hard_link_digest: None,
    };
    let small_entry = regular_entry("/data/small.txt", small_content.len() as u64);
    let big_entry = regular_entry("/data/big.bin", big_content.len() as u64);
    let empty_entry = FileEntry {
        path: "/data/empty.txt".to_string(),
        file_type: FileType::EmptyRegular,
        stat: FileStat::default(),
        link_target: None,
        delta_sequence: 0,
        options: OptionBlock::default(),
        hard_link_digest: None,
    };

    for entry in [&dir_entry, &small_entry, &big_entry, &empty_entry] {
        orchestrator.backup_entry(&mut ctx, entry).unwrap();
    }

    let mut cursor = Cursor::new(out);
    let mut records = Vec::new();
    while let Ok((header, payload)) = recv_record(&mut cursor) {
        records.push((header.stream_type, payload));
    }

    let streams: Vec<StreamType> = records.iter().map(|(stream, _)| *stream).collect();
    assert_eq!(
        streams,
        vec![
            StreamType::UnixAttributes, // /data
            StreamType::UnixAttributes, // /data/small.txt
            StreamType::FileData,
            StreamType::Sha256Digest,
            StreamType::UnixAttributes, // /data/big.bin
            StreamType::FileData,       // first CONTENT_BLOCK_SIZE bytes
            StreamType::FileData,       // trailing 100 bytes
            StreamType::Sha256Digest,
            StreamType::UnixAttributes, // /data/empty.txt, no content stream
        ]
    );

    let small_payload = &records[2].1;
    assert_eq!(small_payload, &small_content);

    let reassembled_big: Vec<u8> = records[5].1.iter().chain(records[6].1.iter()).copied().collect();
    assert_eq!(reassembled_big, big_content);

    assert_eq!(ctx.counters.files_sent, 4);
    assert_eq!(ctx.counters.bytes_read, (small_content.len() + big_content.len()) as u64);
    assert_eq!(ctx.counters.errors, 0);
}
