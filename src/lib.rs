// Базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;
pub mod util;

// Ядро: handle table -> registry -> storage -> session
pub mod handle;
pub mod registry;
pub mod storage;
pub mod session;

// High-level API (src/pt/{mod,core,open,point,inq}.rs)
pub mod pt;

// Удобные реэкспорты
pub use config::PtConfig;
pub use error::{ErrorKind, PtError, Result};
pub use pt::{FileId, FileInfo, PointId, PointLib};
pub use session::AccessMode;
pub use storage::CatalogEntry;
