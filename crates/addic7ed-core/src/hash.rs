//! Whole-file video hashes
//!
//! Each subtitle database identifies a video by a hash over part of the
//! file. All four functions return `Ok(None)` when the file is too small
//! for the algorithm and propagate any I/O failure.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

const OPENSUBTITLES_CHUNK: u64 = 64 * 1024;
const THESUBDB_CHUNK: u64 = 64 * 1024;
const NAPIPROJEKT_CHUNK: u64 = 10 * 1024 * 1024;
const SHOOTER_CHUNK: u64 = 4096;

/// Computes the OpenSubtitles hash
///
/// Sum of the file size and every little-endian `i64` in the first and
/// last 64 KiB, wrapping at 64 bits, as 16 lowercase hex digits.
///
/// # Returns
/// `None` for files smaller than 128 KiB
pub fn hash_opensubtitles(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size < OPENSUBTITLES_CHUNK * 2 {
        return Ok(None);
    }

    let mut hash = size;
    let mut buffer = vec![0u8; OPENSUBTITLES_CHUNK as usize];

    file.read_exact(&mut buffer)?;
    hash = sum_words(hash, &buffer);

    file.seek(SeekFrom::Start(size - OPENSUBTITLES_CHUNK))?;
    file.read_exact(&mut buffer)?;
    hash = sum_words(hash, &buffer);

    Ok(Some(format!("{:016x}", hash)))
}

fn sum_words(mut acc: u64, buffer: &[u8]) -> u64 {
    for word in buffer.chunks_exact(8) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(word);
        acc = acc.wrapping_add(i64::from_le_bytes(bytes) as u64);
    }
    acc
}

/// Computes the TheSubDB hash
///
/// MD5 of the first 64 KiB followed by the last 64 KiB. For files between
/// 64 KiB and 128 KiB the two windows overlap and both are hashed in full.
///
/// # Returns
/// `None` for files smaller than 64 KiB
pub fn hash_thesubdb(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size < THESUBDB_CHUNK {
        return Ok(None);
    }

    let mut data = vec![0u8; (THESUBDB_CHUNK * 2) as usize];
    let (head, tail) = data.split_at_mut(THESUBDB_CHUNK as usize);
    file.read_exact(head)?;
    file.seek(SeekFrom::End(-(THESUBDB_CHUNK as i64)))?;
    file.read_exact(tail)?;

    Ok(Some(md5_hex(&data)))
}

/// Computes the NapiProjekt hash
///
/// MD5 of the first 10 MiB, or of the whole file when it is shorter.
/// Defined for every file, including empty ones.
pub fn hash_napiprojekt(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    let file = File::open(path)?;
    let mut data = Vec::new();
    file.take(NAPIPROJEKT_CHUNK).read_to_end(&mut data)?;
    Ok(Some(md5_hex(&data)))
}

/// Computes the Shooter hash
///
/// MD5 of four 4 KiB windows at offsets `4096`, `size / 3 * 2`,
/// `size / 3` and `size - 8192`, joined with `;` in that order. A window
/// running past the end of the file is hashed short.
///
/// # Returns
/// `None` for files smaller than 8 KiB
pub fn hash_shooter(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size < SHOOTER_CHUNK * 2 {
        return Ok(None);
    }

    let offsets = [
        SHOOTER_CHUNK,
        size / 3 * 2,
        size / 3,
        size - SHOOTER_CHUNK * 2,
    ];

    let mut digests = Vec::with_capacity(offsets.len());
    for offset in offsets {
        file.seek(SeekFrom::Start(offset))?;
        let mut window = Vec::with_capacity(SHOOTER_CHUNK as usize);
        (&mut file).take(SHOOTER_CHUNK).read_to_end(&mut window)?;
        digests.push(md5_hex(&window));
    }

    Ok(Some(digests.join(";")))
}

fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// All four hashes of one video file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoHashes {
    pub opensubtitles: Option<String>,
    pub thesubdb: Option<String>,
    pub napiprojekt: Option<String>,
    pub shooter: Option<String>,
}

impl VideoHashes {
    /// Runs every hash over the file at `path`
    pub fn compute(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            opensubtitles: hash_opensubtitles(path)?,
            thesubdb: hash_thesubdb(path)?,
            napiprojekt: hash_napiprojekt(path)?,
            shooter: hash_shooter(path)?,
        })
    }
}
