//! Lightweight global metrics for pointfile.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - File sessions (open/close, отказы close при живых точках)
//! - Points (create/attach/detach)
//! - Handle table (обращения по невалидным идентификаторам)
//! - Catalog (запись каталога на диск)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- Sessions -----
static SESSIONS_OPENED: AtomicU64 = AtomicU64::new(0);
static SESSIONS_CLOSED: AtomicU64 = AtomicU64::new(0);
static CLOSE_BUSY_REJECTS: AtomicU64 = AtomicU64::new(0);

// ----- Points -----
static POINTS_CREATED: AtomicU64 = AtomicU64::new(0);
static POINTS_ATTACHED: AtomicU64 = AtomicU64::new(0);
static POINTS_DETACHED: AtomicU64 = AtomicU64::new(0);

// ----- Handles -----
static INVALID_HANDLE_ERRORS: AtomicU64 = AtomicU64::new(0);

// ----- Catalog -----
static CATALOG_FLUSHES: AtomicU64 = AtomicU64::new(0);
static CATALOG_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    // Sessions
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub close_busy_rejects: u64,

    // Points
    pub points_created: u64,
    pub points_attached: u64,
    pub points_detached: u64,

    // Handles
    pub invalid_handle_errors: u64,

    // Catalog
    pub catalog_flushes: u64,
    pub catalog_bytes_written: u64,
}

impl MetricsSnapshot {
    /// Сессии, открытые и ещё не закрытые (по счётчикам процесса).
    pub fn sessions_live(&self) -> u64 {
        self.sessions_opened.saturating_sub(self.sessions_closed)
    }

    /// Точки, выданные (create+attach) и ещё не отсоединённые.
    pub fn points_live(&self) -> u64 {
        (self.points_created + self.points_attached).saturating_sub(self.points_detached)
    }
}

// ----- Recorders (Sessions) -----
pub fn record_session_open() {
    SESSIONS_OPENED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_session_close() {
    SESSIONS_CLOSED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_close_busy() {
    CLOSE_BUSY_REJECTS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Points) -----
pub fn record_point_create() {
    POINTS_CREATED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_point_attach() {
    POINTS_ATTACHED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_point_detach() {
    POINTS_DETACHED.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Handles) -----
pub fn record_invalid_handle() {
    INVALID_HANDLE_ERRORS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Catalog) -----
pub fn record_catalog_flush(bytes: usize) {
    CATALOG_FLUSHES.fetch_add(1, Ordering::Relaxed);
    CATALOG_BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        sessions_opened: SESSIONS_OPENED.load(Ordering::Relaxed),
        sessions_closed: SESSIONS_CLOSED.load(Ordering::Relaxed),
        close_busy_rejects: CLOSE_BUSY_REJECTS.load(Ordering::Relaxed),

        points_created: POINTS_CREATED.load(Ordering::Relaxed),
        points_attached: POINTS_ATTACHED.load(Ordering::Relaxed),
        points_detached: POINTS_DETACHED.load(Ordering::Relaxed),

        invalid_handle_errors: INVALID_HANDLE_ERRORS.load(Ordering::Relaxed),

        catalog_flushes: CATALOG_FLUSHES.load(Ordering::Relaxed),
        catalog_bytes_written: CATALOG_BYTES_WRITTEN.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    SESSIONS_OPENED.store(0, Ordering::Relaxed);
    SESSIONS_CLOSED.store(0, Ordering::Relaxed);
    CLOSE_BUSY_REJECTS.store(0, Ordering::Relaxed);

    POINTS_CREATED.store(0, Ordering::Relaxed);
    POINTS_ATTACHED.store(0, Ordering::Relaxed);
    POINTS_DETACHED.store(0, Ordering::Relaxed);

    INVALID_HANDLE_ERRORS.store(0, Ordering::Relaxed);

    CATALOG_FLUSHES.store(0, Ordering::Relaxed);
    CATALOG_BYTES_WRITTEN.store(0, Ordering::Relaxed);
}
