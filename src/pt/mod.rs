//! pt — high-level API точечных файлов (PointLib)
//!
//! Разделение по подмодулям:
//! - core.rs  — PointLib, FileId/PointId, записи handle table, порядок локов
//! - open.rs  — open/close/flush файловых сессий
//! - point.rs — create/attach/detach точек
//! - inq.rs   — запросы (каталог, живые точки, свойства идентификаторов)

pub mod core;
pub mod inq;
pub mod open;
pub mod point;

pub use self::core::{FileId, PointId, PointLib};
pub use self::inq::FileInfo;
