//! Binary snapshot persistence for the vector index.
//!
//! File format: jobs.vec
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model_id: [u8; 32] (SHA256 hash of the embedding model name)
//! - dimensions: u16 (little-endian)
//! - entry_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Entries (repeated, in insertion order):
//! - embedding: [f32; dimensions] (little-endian)
//! - text_len: u32 (little-endian), then text bytes (UTF-8)
//! - job_len: u32 (little-endian), then the job serialized as JSON
//!
//! The per-entry job JSON makes the file self-describing: a fresh process can
//! reconstruct full jobs at query time without re-deriving embeddings.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::jobs::Job;
use crate::store::index::{IndexEntry, VectorIndex};

/// Current file format version
const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: version(1) + model_id(32) + dimensions(2) + entry_count(8) + checksum(4)
const HEADER_SIZE: usize = 47;

/// Errors that can occur during snapshot storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot format: {0}")]
    InvalidFormat(String),

    #[error("version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("model mismatch: snapshot was built with a different embedding model")]
    ModelMismatch,

    #[error("checksum mismatch: snapshot may be corrupted")]
    ChecksumMismatch,

    #[error("dimension mismatch: expected {expected}, snapshot has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("malformed job metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Storage manager for one snapshot location.
pub struct SnapshotStorage {
    path: PathBuf,
}

impl SnapshotStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot into a [`VectorIndex`].
    ///
    /// A missing file surfaces as `StorageError::Io` with
    /// `ErrorKind::NotFound`; the store maps that to its own not-found error.
    pub fn load(
        &self,
        expected_model_id: &[u8; 32],
        expected_dimensions: usize,
    ) -> Result<VectorIndex, StorageError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        let header = read_header(&mut reader)?;
        validate_header(&header, expected_model_id, expected_dimensions)?;

        let dimensions = header.dimensions as usize;
        let mut index = VectorIndex::with_capacity(dimensions, header.entry_count as usize);
        for _ in 0..header.entry_count {
            let entry = read_entry(&mut reader, dimensions)?;
            index.push(entry).map_err(|e| {
                StorageError::InvalidFormat(format!("entry rejected on load: {e}"))
            })?;
        }

        Ok(index)
    }

    /// Save the index, atomically replacing any prior snapshot.
    ///
    /// Writes to a temp file, syncs, then renames over the target so an
    /// in-flight reader never observes a partially written snapshot.
    pub fn save(&self, index: &VectorIndex, model_id: &[u8; 32]) -> Result<(), StorageError> {
        let temp_path = self.path.with_extension("tmp");

        let result = write_to_file(&temp_path, index, model_id);
        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
            return result;
        }

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[derive(Debug)]
struct Header {
    #[allow(dead_code)]
    version: u8,
    model_id: [u8; 32],
    dimensions: u16,
    entry_count: u64,
}

fn write_to_file(path: &Path, index: &VectorIndex, model_id: &[u8; 32]) -> Result<(), StorageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_header(
        &mut writer,
        model_id,
        index.dimensions() as u16,
        index.len() as u64,
    )?;

    for entry in index.iter() {
        write_entry(&mut writer, entry)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    Ok(())
}

fn write_header(
    writer: &mut BufWriter<File>,
    model_id: &[u8; 32],
    dimensions: u16,
    entry_count: u64,
) -> Result<(), StorageError> {
    let mut header_bytes = [0u8; HEADER_SIZE];

    header_bytes[0] = FORMAT_VERSION;
    header_bytes[1..33].copy_from_slice(model_id);
    header_bytes[33..35].copy_from_slice(&dimensions.to_le_bytes());
    header_bytes[35..43].copy_from_slice(&entry_count.to_le_bytes());

    let checksum = crc32fast::hash(&header_bytes[0..43]);
    header_bytes[43..47].copy_from_slice(&checksum.to_le_bytes());

    writer.write_all(&header_bytes)?;
    Ok(())
}

fn read_header(reader: &mut BufReader<File>) -> Result<Header, StorageError> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_bytes)?;

    let version = header_bytes[0];
    if version > FORMAT_VERSION {
        return Err(StorageError::VersionMismatch(version, FORMAT_VERSION));
    }

    let mut model_id = [0u8; 32];
    model_id.copy_from_slice(&header_bytes[1..33]);

    let dimensions = u16::from_le_bytes([header_bytes[33], header_bytes[34]]);
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&header_bytes[35..43]);
    let entry_count = u64::from_le_bytes(count_bytes);

    let mut checksum_bytes = [0u8; 4];
    checksum_bytes.copy_from_slice(&header_bytes[43..47]);
    let stored_checksum = u32::from_le_bytes(checksum_bytes);

    let computed_checksum = crc32fast::hash(&header_bytes[0..43]);
    if stored_checksum != computed_checksum {
        return Err(StorageError::ChecksumMismatch);
    }

    Ok(Header {
        version,
        model_id,
        dimensions,
        entry_count,
    })
}

fn validate_header(
    header: &Header,
    expected_model_id: &[u8; 32],
    expected_dimensions: usize,
) -> Result<(), StorageError> {
    if header.model_id != *expected_model_id {
        return Err(StorageError::ModelMismatch);
    }

    if header.dimensions as usize != expected_dimensions {
        return Err(StorageError::DimensionMismatch {
            expected: expected_dimensions,
            got: header.dimensions as usize,
        });
    }

    Ok(())
}

fn write_entry(writer: &mut BufWriter<File>, entry: &IndexEntry) -> Result<(), StorageError> {
    for &value in &entry.embedding {
        writer.write_all(&value.to_le_bytes())?;
    }

    let text_bytes = entry.text.as_bytes();
    writer.write_all(&(text_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(text_bytes)?;

    let job_bytes = serde_json::to_vec(&entry.job)?;
    writer.write_all(&(job_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&job_bytes)?;

    Ok(())
}

fn read_entry(reader: &mut BufReader<File>, dimensions: usize) -> Result<IndexEntry, StorageError> {
    let mut embedding = Vec::with_capacity(dimensions);
    for _ in 0..dimensions {
        let mut float_bytes = [0u8; 4];
        reader.read_exact(&mut float_bytes)?;
        embedding.push(f32::from_le_bytes(float_bytes));
    }

    let text_bytes = read_block(reader)?;
    let text = String::from_utf8(text_bytes)
        .map_err(|e| StorageError::InvalidFormat(format!("entry text is not UTF-8: {e}")))?;

    let job_bytes = read_block(reader)?;
    // Lenient decode: jobs written by an older schema fill missing fields
    // with empty strings instead of failing the whole load.
    let job: Job = serde_json::from_slice(&job_bytes)?;

    Ok(IndexEntry {
        text,
        job,
        embedding,
    })
}

fn read_block(reader: &mut BufReader<File>) -> Result<Vec<u8>, StorageError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let mut block = vec![0u8; len];
    reader.read_exact(&mut block)?;
    Ok(block)
}
