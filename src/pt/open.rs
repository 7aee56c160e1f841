//! pt/open — открытие/закрытие файловых сессий и flush каталога.

use log::{debug, info};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{PtError, Result};
use crate::handle::HandleKind;
use crate::metrics::{record_close_busy, record_session_close, record_session_open};
use crate::session::{AccessMode, SessionInner};

use super::core::{lock_session, note_invalid, FileId, PointLib, Record};

impl PointLib {
    /// Open (or create) a point file and return its session identifier.
    ///
    /// - `CreateTruncate`: existing content at `path` is discarded.
    /// - `ReadOnly`: `NotFound` if `path` does not exist.
    /// - `ReadWrite`: created if missing, otherwise opened with its catalog.
    pub fn open<P: AsRef<Path>>(&self, path: P, mode: AccessMode) -> Result<FileId> {
        let path = path.as_ref();
        let inner = SessionInner::open(path, mode, &self.cfg)?;
        let rec = Record::Session(Arc::new(Mutex::new(inner)));
        let id = self.table()?.allocate(HandleKind::Session, rec)?;
        record_session_open();
        debug!("open: {} -> {}", path.display(), FileId(id));
        Ok(FileId(id))
    }

    /// Close a session. Fails with `ResourceBusy` while points remain attached;
    /// the session and its points stay valid in that case.
    pub fn close(&self, file: FileId) -> Result<()> {
        let sref = self.session_ref(file)?;
        let mut s = lock_session(&sref)?;

        if let Err(e) = s.close() {
            if let PtError::ResourceBusy { live } = &e {
                record_close_busy();
                debug!("close: {} busy, {} live point(s): {:?}", file, live, s.registry.names());
            }
            return Err(e);
        }

        // Handle освобождается под локом сессии: конкурентный create увидит NotOpen.
        note_invalid(self.table()?.release(file.0, HandleKind::Session))?;
        record_session_close();
        info!("session: closed {}", s.path.display());
        Ok(())
    }

    /// Write pending catalog changes to disk. No-op for read-only sessions.
    pub fn flush(&self, file: FileId) -> Result<()> {
        let sref = self.session_ref(file)?;
        let mut s = lock_session(&sref)?;
        s.storage_mut()?.flush()
    }
}
