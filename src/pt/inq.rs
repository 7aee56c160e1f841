//! pt/inq — запросы: каталог точек файла, живые точки, свойства идентификаторов.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::Result;
use crate::handle::HandleKind;
use crate::session::{AccessMode, SessionState};
use crate::storage::CatalogEntry;

use super::core::{lock_session, FileId, PointId, PointLib, Record};

/// Summary of one open file session.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub mode: String,
    pub catalogued: Vec<String>,
    pub live: Vec<String>,
    pub dirty: bool,
}

impl PointLib {
    /// Names of all points stored in the file, in creation order.
    pub fn inq_points(&self, file: FileId) -> Result<Vec<String>> {
        let sref = self.session_ref(file)?;
        let s = lock_session(&sref)?;
        Ok(s.storage()?.names())
    }

    /// Catalog entries (name + creation time) of the file.
    pub fn catalog(&self, file: FileId) -> Result<Vec<CatalogEntry>> {
        let sref = self.session_ref(file)?;
        let s = lock_session(&sref)?;
        Ok(s.storage()?.entries().to_vec())
    }

    /// Names of currently attached points, in creation order.
    pub fn live_points(&self, file: FileId) -> Result<Vec<String>> {
        let sref = self.session_ref(file)?;
        let s = lock_session(&sref)?;
        s.ensure_open()?;
        Ok(s.registry.names())
    }

    pub fn point_name(&self, point: PointId) -> Result<String> {
        let (name, _, _) = self.point_ref(point)?;
        Ok(name)
    }

    pub fn point_file(&self, point: PointId) -> Result<FileId> {
        let (_, file, _) = self.point_ref(point)?;
        Ok(file)
    }

    /// true только для живого идентификатора открытой сессии.
    pub fn is_open(&self, file: FileId) -> bool {
        match self.session_ref(file) {
            Ok(sref) => lock_session(&sref)
                .map(|s| s.state == SessionState::Open)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub fn mode(&self, file: FileId) -> Result<AccessMode> {
        let sref = self.session_ref(file)?;
        let s = lock_session(&sref)?;
        s.ensure_open()?;
        Ok(s.mode)
    }

    pub fn path(&self, file: FileId) -> Result<PathBuf> {
        let sref = self.session_ref(file)?;
        let s = lock_session(&sref)?;
        s.ensure_open()?;
        Ok(s.path.clone())
    }

    pub fn file_info(&self, file: FileId) -> Result<FileInfo> {
        let sref = self.session_ref(file)?;
        let s = lock_session(&sref)?;
        let st = s.storage()?;
        Ok(FileInfo {
            path: s.path.clone(),
            mode: s.mode.to_string(),
            catalogued: st.names(),
            live: s.registry.names(),
            dirty: st.is_dirty(),
        })
    }

    /// Identifiers of all sessions currently held by this context.
    pub fn open_files(&self) -> Result<Vec<FileId>> {
        let t = self.table()?;
        let mut out = Vec::new();
        t.for_each_of(HandleKind::Session, |id, rec| {
            if let Record::Session(_) = rec {
                out.push(FileId(id));
            }
        });
        Ok(out)
    }
}
