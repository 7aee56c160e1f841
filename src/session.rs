//! File session: владеет контейнером (storage) и реестром живых точек.
//!
//! Машина состояний: Closed -> Open (open), Open -> Open (create/attach/detach),
//! Open -> Closed (close, только при пустом реестре). Closed — терминальное.
//! Все мутации выполняются под локом сессии (см. pt::core).

use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::PtConfig;
use crate::consts::HARD_MAX_NAME_LEN;
use crate::error::{PtError, Result};
use crate::registry::PointRegistry;
use crate::storage::Container;

/// How [`crate::PointLib::open`] treats the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Discard any existing content and create a new file.
    CreateTruncate,
    /// Open an existing file; fail with `NotFound` if missing.
    ReadOnly,
    /// Create if missing, else open existing for writing.
    ReadWrite,
}

impl AccessMode {
    #[inline]
    pub fn is_writable(self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessMode::CreateTruncate => "create-truncate",
            AccessMode::ReadOnly => "read-only",
            AccessMode::ReadWrite => "read-write",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

pub(crate) struct SessionInner {
    pub(crate) path: PathBuf,
    pub(crate) mode: AccessMode,
    pub(crate) state: SessionState,
    // None после close
    pub(crate) storage: Option<Container>,
    pub(crate) registry: PointRegistry,
    pub(crate) max_name_len: usize,
}

impl SessionInner {
    pub(crate) fn open(path: &Path, mode: AccessMode, cfg: &PtConfig) -> Result<Self> {
        let storage = match mode {
            AccessMode::CreateTruncate => Container::create_truncate(path, cfg)?,
            AccessMode::ReadOnly => Container::open_existing(path, false, cfg)?,
            AccessMode::ReadWrite => Container::open_or_create(path, cfg)?,
        };
        info!("session: opened {} ({})", path.display(), mode);
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            state: SessionState::Open,
            storage: Some(storage),
            registry: PointRegistry::new(),
            max_name_len: cfg.max_name_len.min(HARD_MAX_NAME_LEN),
        })
    }

    #[inline]
    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(PtError::NotOpen),
        }
    }

    pub(crate) fn storage(&self) -> Result<&Container> {
        self.ensure_open()?;
        self.storage.as_ref().ok_or(PtError::NotOpen)
    }

    pub(crate) fn storage_mut(&mut self) -> Result<&mut Container> {
        self.ensure_open()?;
        self.storage.as_mut().ok_or(PtError::NotOpen)
    }

    pub(crate) fn validate_name(&self, name: &str) -> Result<()> {
        let reason = if name.is_empty() {
            Some("empty")
        } else if name.len() > self.max_name_len {
            Some("too long")
        } else if name.contains('/') {
            Some("contains '/'")
        } else if name.contains('\0') {
            Some("contains NUL")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(PtError::InvalidName {
                name: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Flush + освобождение storage. При ошибке сессия остаётся открытой.
    pub(crate) fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.registry.is_empty() {
            return Err(PtError::ResourceBusy {
                live: self.registry.len(),
            });
        }
        self.storage_mut()?.flush()?;
        // Drop контейнера снимает файловый лок
        self.storage = None;
        self.state = SessionState::Closed;
        debug!("session: storage released for {}", self.path.display());
        Ok(())
    }
}
