//! .kft Binary Shard Format
//!
//! A shard is a fixed-order numeric matrix, one row per (map, mods) pair.
//!
//! # File Structure
//!
//! ```text
//! Offset   Size    Type        Description
//! ─────────────────────────────────────────────
//! 0x00     8       [u8; 8]     Magic: "KFTBL001"
//! 0x08     4       u32 LE      N: Number of rows
//! 0x0C     4       u32 LE      C: Columns per row (always 12)
//! 0x10     N*C*8   [f64]       Row-major matrix (Little Endian)
//! ```
//!
//! Column order: star_rating, bpm, size, approach_rate, slider_factor,
//! circle_slider_ratio, aim_speed_ratio, speed_object_ratio, map_id,
//! mod_mask, accuracy_param, drain_param.
//!
//! # Example
//!
//! ```ignore
//! let mut writer = ShardWriter::new("catalog_nm.kft")?;
//! writer.write_row(&row)?;
//! writer.finish()?;
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

/// Magic bytes identifying a .kft shard: "KFTBL001"
pub const MAGIC: [u8; 8] = *b"KFTBL001";

/// Header size in bytes: 8 (magic) + 4 (rows) + 4 (columns) = 16
pub const HEADER_SIZE: usize = 16;

/// Columns per row. Fixed for every shard; shards that disagree are rejected.
pub const COLUMNS: usize = 12;

#[derive(Error, Debug)]
pub enum ShardError {
    #[error("invalid magic bytes: expected KFTBL001")]
    InvalidMagic,

    #[error("column count mismatch: expected {expected}, got {actual}")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("shard truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("shard payload not aligned for f64 access")]
    Misaligned,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Parsed .kft shard header
#[derive(Debug, Clone, Copy)]
pub struct ShardHeader {
    pub rows: u32,
    pub columns: u32,
}

impl ShardHeader {
    /// Parse header from raw bytes (first 16 bytes of file)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShardError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ShardError::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        if bytes[0..8] != MAGIC {
            return Err(ShardError::InvalidMagic);
        }

        let rows = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let columns = u32::from_le_bytes(bytes[12..16].try_into().unwrap());

        Ok(Self { rows, columns })
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&MAGIC);
        buf[8..12].copy_from_slice(&self.rows.to_le_bytes());
        buf[12..16].copy_from_slice(&self.columns.to_le_bytes());
        buf
    }

    /// Total file size implied by the header
    pub fn file_size(&self) -> usize {
        HEADER_SIZE + (self.rows as usize * self.columns as usize * std::mem::size_of::<f64>())
    }
}

/// Writer for creating .kft shards
pub struct ShardWriter {
    writer: BufWriter<File>,
    rows: u32,
}

impl ShardWriter {
    /// Create a new shard writer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ShardError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Placeholder header; the row count is patched in finish()
        let header = ShardHeader {
            rows: 0,
            columns: COLUMNS as u32,
        };
        writer.write_all(&header.to_bytes())?;

        Ok(Self { writer, rows: 0 })
    }

    /// Write a single 12-column row to the shard
    pub fn write_row(&mut self, row: &[f64]) -> Result<(), ShardError> {
        if row.len() != COLUMNS {
            return Err(ShardError::ColumnMismatch {
                expected: COLUMNS,
                actual: row.len(),
            });
        }

        for &val in row {
            self.writer.write_all(&val.to_le_bytes())?;
        }

        self.rows += 1;
        Ok(())
    }

    /// Finalize the shard, updating the header with the actual row count
    pub fn finish(mut self) -> Result<u32, ShardError> {
        use std::io::Seek;

        self.writer.flush()?;

        let file = self.writer.get_mut();
        file.seek(io::SeekFrom::Start(8))?;
        file.write_all(&self.rows.to_le_bytes())?;
        file.sync_all()?;

        Ok(self.rows)
    }
}
