//! Journal-backed ledger for durability across restarts.
//!
//! Every put and delete is appended to a journal as a length-prefixed
//! MessagePack frame followed by a CRC32 of the frame. Opening the ledger
//! replays the journal into memory; reads never touch the disk.
//!
//! A torn or corrupt frame at the tail (a crash mid-append) ends replay. The
//! journal is truncated back to the last good frame so later appends stay
//! readable. A failed append is rolled back the same way before the error is
//! returned, so a write the caller saw fail never reappears on replay.

use super::LedgerStore;
use crate::error::{LedgerError, Result};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Magic bytes for the journal file.
const JOURNAL_MAGIC: &[u8; 4] = b"TLJ\0";

/// Current journal format version.
const JOURNAL_VERSION: u8 = 1;

/// Header length (magic + version).
const HEADER_LEN: u64 = 5;

/// Sanity bound on a single frame.
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const JOURNAL_FILE: &str = "ledger.journal";
const LOCK_FILE: &str = "LOCK";

/// Journal configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Directory holding the journal and its lock file.
    pub path: PathBuf,

    /// fsync after every append.
    pub sync_writes: bool,

    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./ledger"),
            sync_writes: true,
            create_if_missing: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
enum JournalOp {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct JournalEntry {
    seq: u64,
    op: JournalOp,
}

/// Append handle for the journal.
///
/// `offset` is the end of the last committed frame. Bytes past it belong to
/// a failed append and are truncated before the next write.
struct Writer {
    path: PathBuf,
    file: File,
    offset: u64,
    next_seq: u64,
    needs_rollback: bool,
}

impl Writer {
    fn open(path: PathBuf, offset: u64, next_seq: u64) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            offset,
            next_seq,
            needs_rollback: false,
        })
    }

    /// Write one whole frame, optionally syncing it. On failure the journal
    /// is cut back to `offset`.
    fn commit(&mut self, frame: &[u8], sync: bool) -> io::Result<()> {
        if self.needs_rollback {
            self.rollback()?;
        }

        let written = self
            .file
            .write_all(frame)
            .and_then(|_| if sync { self.file.sync_data() } else { Ok(()) });

        if let Err(e) = written {
            self.needs_rollback = true;
            if let Err(rollback_err) = self.rollback() {
                error!(
                    path = %self.path.display(),
                    offset = self.offset,
                    error = %rollback_err,
                    "failed to roll back journal after a failed append"
                );
            }
            return Err(e);
        }

        self.offset += frame.len() as u64;
        Ok(())
    }

    /// Truncate to the last committed frame and reopen the append handle.
    fn rollback(&mut self) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_len(self.offset)?;
        file.sync_all()?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;
        self.needs_rollback = false;
        warn!(
            path = %self.path.display(),
            offset = self.offset,
            "rolled back failed journal append"
        );
        Ok(())
    }
}

/// Ledger persisted to an append-only journal.
pub struct FileLedger {
    config: JournalConfig,

    /// Held for the lifetime of the ledger.
    _lock_file: File,

    records: RwLock<HashMap<String, Vec<u8>>>,

    writer: Mutex<Writer>,
}

impl FileLedger {
    /// Open the journal at `config.path`, replaying any existing entries.
    pub fn open(config: JournalConfig) -> Result<Self> {
        if !config.path.exists() {
            if !config.create_if_missing {
                return Err(LedgerError::NotFound(config.path.display().to_string()));
            }
            fs::create_dir_all(&config.path)?;
        }

        let lock_file = Self::acquire_lock(&config.path)?;
        let journal_path = config.path.join(JOURNAL_FILE);

        let (records, next_seq, offset) = if journal_path.exists() {
            Self::replay(&journal_path)?
        } else {
            Self::write_header(&journal_path)?;
            (HashMap::new(), 1, HEADER_LEN)
        };

        debug!(
            path = %journal_path.display(),
            records = records.len(),
            next_seq,
            "opened ledger journal"
        );

        let writer = Writer::open(journal_path, offset, next_seq)?;

        Ok(Self {
            config,
            _lock_file: lock_file,
            records: RwLock::new(records),
            writer: Mutex::new(writer),
        })
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Directory this ledger lives in.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Rewrite the journal as one put per live record.
    ///
    /// Holds the writer for the whole rewrite, so no append can land in the
    /// old journal after the snapshot is taken.
    pub fn compact(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        let records = self.records.read();

        let journal_path = self.config.path.join(JOURNAL_FILE);
        let tmp_path = self.config.path.join(format!("{}.compact", JOURNAL_FILE));

        Self::write_header(&tmp_path)?;
        let mut tmp = BufWriter::new(OpenOptions::new().append(true).open(&tmp_path)?);

        let mut seq = 1u64;
        let mut offset = HEADER_LEN;
        for (key, value) in records.iter() {
            let entry = JournalEntry {
                seq,
                op: JournalOp::Put {
                    key: key.clone(),
                    value: value.clone(),
                },
            };
            let frame = Self::encode_frame(&entry)?;
            tmp.write_all(&frame)?;
            offset += frame.len() as u64;
            seq += 1;
        }
        tmp.flush()?;
        tmp.get_ref().sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &journal_path)?;

        *writer = Writer::open(journal_path, offset, seq)?;

        debug!(records = records.len(), "compacted ledger journal");
        Ok(())
    }

    /// Journal `op`, then apply it to the in-memory map.
    ///
    /// Both happen under the writer lock so the map and the journal agree on
    /// order, and `compact` never snapshots a map missing a journaled write.
    fn append(&self, op: JournalOp) -> Result<()> {
        let mut writer = self.writer.lock();
        let entry = JournalEntry {
            seq: writer.next_seq,
            op,
        };

        let frame = Self::encode_frame(&entry)?;
        writer
            .commit(&frame, self.config.sync_writes)
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;
        writer.next_seq += 1;

        let mut records = self.records.write();
        match entry.op {
            JournalOp::Put { key, value } => {
                records.insert(key, value);
            }
            JournalOp::Delete { key } => {
                records.remove(&key);
            }
        }
        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join(LOCK_FILE))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| LedgerError::Locked)?;

        Ok(lock_file)
    }

    fn write_header(path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.write_all(JOURNAL_MAGIC)?;
        file.write_all(&[JOURNAL_VERSION])?;
        file.sync_all()?;
        Ok(())
    }

    /// Returns the live records, the next sequence number and the end offset
    /// of the last good frame.
    fn replay(path: &Path) -> Result<(HashMap<String, Vec<u8>>, u64, u64)> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != JOURNAL_MAGIC {
            return Err(LedgerError::Corruption("Invalid journal magic".into()));
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;
        if version[0] != JOURNAL_VERSION {
            return Err(LedgerError::Corruption(format!(
                "Unsupported journal version: {}",
                version[0]
            )));
        }

        let mut records = HashMap::new();
        let mut max_seq = 0u64;
        let mut offset = HEADER_LEN;

        while offset < file_len {
            match Self::read_entry(&mut reader) {
                Ok((entry, frame_len)) => {
                    max_seq = max_seq.max(entry.seq);
                    match entry.op {
                        JournalOp::Put { key, value } => {
                            records.insert(key, value);
                        }
                        JournalOp::Delete { key } => {
                            records.remove(&key);
                        }
                    }
                    offset += frame_len;
                }
                Err(e) => {
                    warn!(
                        offset,
                        file_len,
                        error = %e,
                        "discarding unreadable journal tail"
                    );
                    let file = OpenOptions::new().write(true).open(path)?;
                    file.set_len(offset)?;
                    file.sync_all()?;
                    break;
                }
            }
        }

        Ok((records, max_seq + 1, offset))
    }

    fn encode_frame(entry: &JournalEntry) -> Result<Vec<u8>> {
        let encoded = rmp_serde::to_vec(entry)?;
        if encoded.len() > MAX_FRAME_LEN {
            return Err(LedgerError::StoreUnavailable(format!(
                "journal frame of {} bytes exceeds limit",
                encoded.len()
            )));
        }

        let mut frame = Vec::with_capacity(encoded.len() + 8);
        frame.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
        frame.extend_from_slice(&encoded);
        frame.extend_from_slice(&crc32fast::hash(&encoded).to_le_bytes());
        Ok(frame)
    }

    /// Read one frame, returning the entry and the number of bytes consumed.
    fn read_entry(reader: &mut BufReader<File>) -> Result<(JournalEntry, u64)> {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > MAX_FRAME_LEN {
            return Err(LedgerError::Corruption("Journal frame too large".into()));
        }

        let mut encoded = vec![0u8; len];
        reader.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        reader.read_exact(&mut checksum_bytes)?;
        let stored = u32::from_le_bytes(checksum_bytes);

        let computed = crc32fast::hash(&encoded);
        if stored != computed {
            return Err(LedgerError::Corruption(format!(
                "Journal checksum mismatch: expected {}, got {}",
                stored, computed
            )));
        }

        let entry = rmp_serde::from_slice(&encoded)?;
        Ok((entry, 8 + len as u64))
    }
}

impl LedgerStore for FileLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.append(JournalOp::Put {
            key: key.to_string(),
            value,
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.append(JournalOp::Delete {
            key: key.to_string(),
        })
    }
}
