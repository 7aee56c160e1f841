//! pt/point — create/attach/detach точек внутри открытой сессии.
//!
//! Все три операции выполняются целиком под локом сессии; при ошибке ни реестр,
//! ни handle table, ни каталог не меняются.

use log::debug;
use std::sync::Arc;

use crate::error::{PtError, Result};
use crate::handle::HandleKind;
use crate::metrics::{record_point_attach, record_point_create, record_point_detach};
use crate::session::SessionInner;

use super::core::{
    invalid_handle, lock_session, note_invalid, FileId, PointId, PointLib, PointRecord, Record,
    SessionRef,
};

impl PointLib {
    /// Create a new point object named `name` in an open, writable session.
    ///
    /// Errors: `NotOpen`, `ReadOnly`, `InvalidName`, `DuplicateName` (name already live).
    /// A name that is catalogued but not live is re-opened rather than duplicated.
    pub fn create(&self, file: FileId, name: &str) -> Result<PointId> {
        let sref = self.session_ref(file)?;
        let mut s = lock_session(&sref)?;

        s.ensure_open()?;
        if !s.mode.is_writable() {
            return Err(PtError::ReadOnly(format!("create '{}'", name)));
        }
        s.validate_name(name)?;
        s.registry.check_insert(name)?;

        let fresh = s.storage_mut()?.insert(name)?;
        match self.register(&sref, &mut s, file, name) {
            Ok(id) => {
                record_point_create();
                debug!(
                    "create: '{}' in {} -> {} ({})",
                    name,
                    file,
                    id,
                    if fresh { "new" } else { "catalogued" }
                );
                Ok(id)
            }
            Err(e) => {
                if fresh {
                    if let Some(st) = s.storage.as_mut() {
                        st.rollback_insert(name);
                    }
                }
                Err(e)
            }
        }
    }

    /// Attach an existing, catalogued point by name (read-side traversal).
    ///
    /// Errors: `NotOpen`, `NotFound` (not in the catalog), `DuplicateName` (already live).
    pub fn attach(&self, file: FileId, name: &str) -> Result<PointId> {
        let sref = self.session_ref(file)?;
        let mut s = lock_session(&sref)?;

        if !s.storage()?.contains(name) {
            return Err(PtError::NotFound(format!(
                "point '{}' in {}",
                name,
                s.path.display()
            )));
        }
        s.registry.check_insert(name)?;

        let id = self.register(&sref, &mut s, file, name)?;
        record_point_attach();
        debug!("attach: '{}' in {} -> {}", name, file, id);
        Ok(id)
    }

    /// Detach a point: its name leaves the registry and its identifier is released.
    /// Detaching an unknown or already detached identifier fails with `InvalidHandle`.
    pub fn detach(&self, point: PointId) -> Result<()> {
        let (name, file, sref) = self.point_ref(point)?;
        let mut s = lock_session(&sref)?;

        // Конкурентный detach того же id мог успеть между резолвом и локом.
        if !s.registry.contains_handle(point.0) {
            return Err(invalid_handle(point.0));
        }
        note_invalid(self.table()?.release(point.0, HandleKind::Point))?;
        s.registry.remove(point.0)?;

        record_point_detach();
        debug!("detach: '{}' ({}) from {}", name, point, file);
        Ok(())
    }

    // Выдать handle и зарегистрировать имя. Вызывается под локом сессии после всех проверок.
    fn register(
        &self,
        sref: &SessionRef,
        s: &mut SessionInner,
        file: FileId,
        name: &str,
    ) -> Result<PointId> {
        let rec = Record::Point(PointRecord {
            name: name.to_string(),
            file,
            session: Arc::downgrade(sref),
        });
        let id = self.table()?.allocate(HandleKind::Point, rec)?;
        if let Err(e) = s.registry.insert(name, id) {
            let _ = self.table()?.release(id, HandleKind::Point);
            return Err(e);
        }
        Ok(PointId(id))
    }
}
