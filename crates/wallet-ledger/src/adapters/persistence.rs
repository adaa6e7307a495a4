//! # Ledger Snapshot Persistence
//!
//! File format:
//!
//! ```text
//! [MAGIC: 8][LEN: u64 LE][CRC32: u32 LE][bincode(PersistedLedger): LEN]
//! ```
//!
//! Writes go to `<path>.tmp`, are synced, then renamed over `<path>`, so a
//! crash leaves either the old or the new snapshot on disk.

use crate::domain::LedgerError;
use crate::ports::outbound::{LedgerPersistence, PersistedLedger};
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Magic bytes for ledger snapshot files.
const SNAPSHOT_MAGIC: &[u8; 8] = b"WLEDGER\x01";

const HEADER_LEN: usize = 8 + 8 + 4;

fn io_error(context: &str, path: &Path, e: std::io::Error) -> LedgerError {
    LedgerError::Persistence(format!("{context} {}: {e}", path.display()))
}

/// Encode a ledger into the snapshot file format.
pub fn encode_snapshot(ledger: &PersistedLedger) -> Result<Vec<u8>, LedgerError> {
    let payload = bincode::serialize(ledger)
        .map_err(|e| LedgerError::Persistence(format!("encode snapshot: {e}")))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode and verify a snapshot.
pub fn decode_snapshot(bytes: &[u8]) -> Result<PersistedLedger, LedgerError> {
    if bytes.len() < HEADER_LEN {
        return Err(LedgerError::Persistence("snapshot truncated".into()));
    }
    let (magic, rest) = bytes.split_at(8);
    if magic != SNAPSHOT_MAGIC {
        return Err(LedgerError::Persistence("invalid snapshot magic".into()));
    }

    let (len_bytes, rest) = rest.split_at(8);
    let (crc_bytes, payload) = rest.split_at(4);
    let mut len = [0u8; 8];
    len.copy_from_slice(len_bytes);
    let mut crc = [0u8; 4];
    crc.copy_from_slice(crc_bytes);

    if u64::from_le_bytes(len) != payload.len() as u64 {
        return Err(LedgerError::Persistence(format!(
            "snapshot length mismatch: header {} bytes, found {}",
            u64::from_le_bytes(len),
            payload.len()
        )));
    }
    if crc32fast::hash(payload) != u32::from_le_bytes(crc) {
        return Err(LedgerError::Persistence("snapshot checksum mismatch".into()));
    }

    bincode::deserialize(payload)
        .map_err(|e| LedgerError::Persistence(format!("decode snapshot: {e}")))
}

/// Snapshot file on local disk.
pub struct FileSnapshotStore {
    path: PathBuf,
    /// Serializes writers sharing one file.
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerPersistence for FileSnapshotStore {
    fn load(&self) -> Result<Option<PersistedLedger>, LedgerError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "[wallet-ledger] No existing snapshot at {}",
                    self.path.display()
                );
                return Ok(None);
            }
            Err(e) => return Err(io_error("read", &self.path, e)),
        };

        let ledger = decode_snapshot(&bytes)?;
        tracing::info!(
            "[wallet-ledger] Loaded snapshot {} ({} bytes, {} transactions)",
            self.path.display(),
            bytes.len(),
            ledger.records.len()
        );
        Ok(Some(ledger))
    }

    fn save(&self, ledger: &PersistedLedger) -> Result<(), LedgerError> {
        let bytes = encode_snapshot(ledger)?;
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file =
            std::fs::File::create(&temp_path).map_err(|e| io_error("create", &temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| io_error("write", &temp_path, e))?;
        file.sync_all()
            .map_err(|e| io_error("sync", &temp_path, e))?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| io_error("rename", &self.path, e))?;
        Ok(())
    }
}

/// Persistence kept in memory; survives service restarts within one
/// process.
#[derive(Default)]
pub struct InMemoryPersistence {
    saved: Mutex<Option<Vec<u8>>>,
    saves: std::sync::atomic::AtomicU64,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> u64 {
        self.saves.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl LedgerPersistence for InMemoryPersistence {
    fn load(&self) -> Result<Option<PersistedLedger>, LedgerError> {
        self.saved
            .lock()
            .as_deref()
            .map(decode_snapshot)
            .transpose()
    }

    fn save(&self, ledger: &PersistedLedger) -> Result<(), LedgerError> {
        let bytes = encode_snapshot(ledger)?;
        *self.saved.lock() = Some(bytes);
        self.saves
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }
}

/// No durability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl LedgerPersistence for NoPersistence {
    fn load(&self) -> Result<Option<PersistedLedger>, LedgerError> {
        Ok(None)
    }

    fn save(&self, _ledger: &PersistedLedger) -> Result<(), LedgerError> {
        Ok(())
    }
}
