//! pt/core — ядро API: PointLib, идентификаторы FileId/PointId, записи handle table.
//!
//! PointLib — явный контекст вместо процессного глобального состояния библиотеки:
//! вызывающий код владеет им и передаёт во все вызовы.
//!
//! Локи:
//! - `table` — один Mutex на handle table (короткие критические секции);
//! - каждая сессия — `Arc<Mutex<SessionInner>>`: один грубый лок на сессию,
//!   под которым выполняются create/attach/detach/close.
//! Порядок: лок сессии -> лок таблицы. Лок таблицы никогда не удерживается
//! в момент взятия лока сессии.

use log::warn;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::config::PtConfig;
use crate::error::{ErrorKind, PtError, Result};
use crate::handle::{HandleKind, HandleTable};
use crate::metrics::record_invalid_handle;
use crate::session::{SessionInner, SessionState};

/// Opaque identifier of an open file session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub(crate) u64);

/// Opaque identifier of a live point object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointId(pub(crate) u64);

impl FileId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
    /// Rebuild an identifier from its raw value (e.g. received over an FFI boundary).
    /// Validity is checked on use.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl PointId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{:x}", self.0)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point#{:x}", self.0)
    }
}

pub(crate) type SessionRef = Arc<Mutex<SessionInner>>;

pub(crate) struct PointRecord {
    pub(crate) name: String,
    pub(crate) file: FileId,
    // не владеющая обратная ссылка: сессию держит только её запись в таблице
    pub(crate) session: Weak<Mutex<SessionInner>>,
}

pub(crate) enum Record {
    Session(SessionRef),
    Point(PointRecord),
}

/// Library context: owns the handle table shared by all sessions it opened.
pub struct PointLib {
    pub(crate) cfg: PtConfig,
    pub(crate) table: Mutex<HandleTable<Record>>,
}

impl Default for PointLib {
    fn default() -> Self {
        Self::new()
    }
}

impl PointLib {
    /// Context configured from `PT_*` environment variables.
    pub fn new() -> Self {
        Self::with_config(PtConfig::from_env())
    }

    pub fn with_config(cfg: PtConfig) -> Self {
        Self {
            cfg,
            table: Mutex::new(HandleTable::new()),
        }
    }

    pub fn config(&self) -> &PtConfig {
        &self.cfg
    }

    pub(crate) fn table(&self) -> Result<MutexGuard<'_, HandleTable<Record>>> {
        self.table
            .lock()
            .map_err(|_| PtError::Poisoned("handle table"))
    }

    /// Резолв FileId -> сессия (клон Arc; лок таблицы отпускается до возврата).
    pub(crate) fn session_ref(&self, file: FileId) -> Result<SessionRef> {
        let t = self.table()?;
        match t.resolve(file.0, HandleKind::Session) {
            Ok(Record::Session(s)) => Ok(Arc::clone(s)),
            Ok(Record::Point(_)) | Err(_) => Err(invalid_handle(file.0)),
        }
    }

    /// Резолв PointId -> (имя, файл, сессия). Сессия уже закрыта => InvalidHandle.
    pub(crate) fn point_ref(&self, point: PointId) -> Result<(String, FileId, SessionRef)> {
        let (name, file, weak) = {
            let t = self.table()?;
            match t.resolve(point.0, HandleKind::Point) {
                Ok(Record::Point(p)) => (p.name.clone(), p.file, p.session.clone()),
                Ok(Record::Session(_)) | Err(_) => return Err(invalid_handle(point.0)),
            }
        };
        let session = weak.upgrade().ok_or_else(|| invalid_handle(point.0))?;
        Ok((name, file, session))
    }
}

pub(crate) fn lock_session(s: &SessionRef) -> Result<MutexGuard<'_, SessionInner>> {
    s.lock().map_err(|_| PtError::Poisoned("file session"))
}

#[inline]
pub(crate) fn invalid_handle(id: u64) -> PtError {
    record_invalid_handle();
    PtError::InvalidHandle(id)
}

/// Учесть InvalidHandle из нижних слоёв в метриках.
#[inline]
pub(crate) fn note_invalid<T>(r: Result<T>) -> Result<T> {
    if let Err(e) = &r {
        if e.kind() == ErrorKind::InvalidHandle {
            record_invalid_handle();
        }
    }
    r
}

impl Drop for PointLib {
    fn drop(&mut self) {
        let table = match self.table.get_mut() {
            Ok(t) => t,
            Err(_) => return,
        };
        // Сессии, которые не закрыли явно: предупреждаем и best-effort сбрасываем каталог.
        // Файловые локи освобождаются при Drop контейнеров.
        table.for_each_of(HandleKind::Session, |id, rec| {
            if let Record::Session(s) = rec {
                if let Ok(mut inner) = s.lock() {
                    if inner.state != SessionState::Open {
                        return;
                    }
                    warn!(
                        "{} ({}) dropped while open with {} attached point(s)",
                        FileId(id),
                        inner.path.display(),
                        inner.registry.len()
                    );
                    if let Some(st) = inner.storage.as_mut() {
                        if let Err(e) = st.flush() {
                            warn!("best-effort flush of {} failed: {}", st.path().display(), e);
                        }
                    }
                }
            }
        });
    }
}
