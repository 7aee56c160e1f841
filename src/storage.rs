//! storage — контейнерный файл точек (underlying storage handle).
//!
//! Один файл на сессию. Формат (LE), см. consts.rs:
//! [magic8="HE5PTC01"][version u32][flags u32][point_count u32][crc32c u32]
//! затем point_count записей [name_len u16][name][created_at_secs u64].
//!
//! CRC32C считается по [version][flags][point_count] + body.
//! Пустой файл (len=0) трактуется как пустой каталог.
//!
//! Блокировки (fs2, advisory): writable => exclusive, read-only => shared.
//! Лок берётся ДО усечения файла в режиме CreateTruncate. Освобождается в Drop.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use fs2::FileExt;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::PtConfig;
use crate::consts::{
    CATALOG_REC_FIXED, CONTAINER_HDR_SIZE, CONTAINER_MAGIC, CONTAINER_OFF_CRC, CONTAINER_VERSION,
};
use crate::error::{IoContext, PtError, Result};
use crate::metrics::record_catalog_flush;
use crate::util::{now_secs, write_at};

/// One catalogued point group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub created_at: u64,
}

pub struct Container {
    path: PathBuf,
    file: File,
    writable: bool,
    fsync: bool,
    catalog: Vec<CatalogEntry>,
    dirty: bool,
}

fn lock_file(file: &File, path: &Path, exclusive: bool, wait: bool) -> Result<()> {
    let r = match (exclusive, wait) {
        (true, true) => FileExt::lock_exclusive(file),
        (true, false) => FileExt::try_lock_exclusive(file),
        (false, true) => FileExt::lock_shared(file),
        (false, false) => FileExt::try_lock_shared(file),
    };
    match r {
        Ok(()) => Ok(()),
        Err(e) if !wait && e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(PtError::Locked(path.display().to_string()))
        }
        Err(e) => Err(PtError::Io {
            context: format!("lock {}", path.display()),
            source: e,
        }),
    }
}

fn open_file(path: &Path, opts: &OpenOptions) -> Result<File> {
    opts.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PtError::NotFound(path.display().to_string())
        } else {
            PtError::Io {
                context: format!("open {}", path.display()),
                source: e,
            }
        }
    })
}

impl Container {
    /// Создать файл или усечь существующий (старое содержимое отбрасывается).
    pub fn create_truncate(path: &Path, cfg: &PtConfig) -> Result<Self> {
        let file = open_file(path, OpenOptions::new().create(true).read(true).write(true))?;
        lock_file(&file, path, true, cfg.lock_wait)?;
        file.set_len(0)
            .io_context(|| format!("truncate {}", path.display()))?;

        let mut c = Self::from_parts(path, file, true, cfg, Vec::new());
        c.write_catalog()?;
        debug!("container: created {}", path.display());
        Ok(c)
    }

    /// Открыть существующий файл. Отсутствующий путь => NotFound.
    pub fn open_existing(path: &Path, writable: bool, cfg: &PtConfig) -> Result<Self> {
        let mut file = open_file(path, OpenOptions::new().read(true).write(writable))?;
        lock_file(&file, path, writable, cfg.lock_wait)?;
        let catalog = read_catalog(&mut file, path)?;
        debug!(
            "container: opened {} ({} point(s), writable={})",
            path.display(),
            catalog.len(),
            writable
        );
        Ok(Self::from_parts(path, file, writable, cfg, catalog))
    }

    /// Открыть существующий или создать новый (ReadWrite).
    pub fn open_or_create(path: &Path, cfg: &PtConfig) -> Result<Self> {
        let mut file = open_file(path, OpenOptions::new().create(true).read(true).write(true))?;
        lock_file(&file, path, true, cfg.lock_wait)?;
        let catalog = read_catalog(&mut file, path)?;
        let fresh = file
            .metadata()
            .io_context(|| format!("stat {}", path.display()))?
            .len()
            == 0;
        let mut c = Self::from_parts(path, file, true, cfg, catalog);
        if fresh {
            c.write_catalog()?;
            debug!("container: created {}", path.display());
        }
        Ok(c)
    }

    fn from_parts(
        path: &Path,
        file: File,
        writable: bool,
        cfg: &PtConfig,
        catalog: Vec<CatalogEntry>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            writable,
            fsync: cfg.fsync,
            catalog,
            dirty: false,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.iter().any(|e| e.name == name)
    }

    /// Записанные в каталог имена в порядке создания.
    pub fn names(&self) -> Vec<String> {
        self.catalog.iter().map(|e| e.name.clone()).collect()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    /// Добавить точку в каталог (in-memory). true — если имя новое.
    pub fn insert(&mut self, name: &str) -> Result<bool> {
        if !self.writable {
            return Err(PtError::ReadOnly(format!("insert '{}'", name)));
        }
        if self.contains(name) {
            return Ok(false);
        }
        self.catalog.push(CatalogEntry {
            name: name.to_string(),
            created_at: now_secs(),
        });
        self.dirty = true;
        Ok(true)
    }

    /// Откатить последний insert (используется при ошибке после вставки).
    pub(crate) fn rollback_insert(&mut self, name: &str) {
        if let Some(pos) = self.catalog.iter().rposition(|e| e.name == name) {
            self.catalog.remove(pos);
        }
    }

    /// Сбросить каталог на диск, если есть изменения. RO — no-op.
    pub fn flush(&mut self) -> Result<()> {
        if !self.writable || !self.dirty {
            return Ok(());
        }
        self.write_catalog()?;
        self.dirty = false;
        Ok(())
    }

    fn write_catalog(&mut self) -> Result<()> {
        let buf = encode_catalog(&self.catalog)?;
        let path = &self.path;
        write_at(&mut self.file, 0, &buf)
            .io_context(|| format!("write catalog {}", path.display()))?;
        self.file
            .set_len(buf.len() as u64)
            .io_context(|| format!("set_len {}", path.display()))?;
        if self.fsync {
            self.file
                .sync_all()
                .io_context(|| format!("fsync {}", path.display()))?;
        }
        record_catalog_flush(buf.len());
        Ok(())
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("container: unlock {} failed: {}", self.path.display(), e);
        }
    }
}

// -------------------- codec --------------------

pub(crate) fn encode_catalog(entries: &[CatalogEntry]) -> Result<Vec<u8>> {
    let count = u32::try_from(entries.len())
        .map_err(|_| PtError::Corrupt(format!("too many points: {}", entries.len())))?;

    let mut buf = Vec::with_capacity(
        CONTAINER_HDR_SIZE
            + entries
                .iter()
                .map(|e| CATALOG_REC_FIXED + e.name.len())
                .sum::<usize>(),
    );
    buf.extend_from_slice(CONTAINER_MAGIC);
    // Vec<u8> как io::Write не падает
    let _ = buf.write_u32::<LittleEndian>(CONTAINER_VERSION);
    let _ = buf.write_u32::<LittleEndian>(0); // flags
    let _ = buf.write_u32::<LittleEndian>(count);
    let _ = buf.write_u32::<LittleEndian>(0); // crc, позже

    for e in entries {
        let len = u16::try_from(e.name.len()).map_err(|_| PtError::InvalidName {
            name: e.name.clone(),
            reason: "longer than 65535 bytes",
        })?;
        let _ = buf.write_u16::<LittleEndian>(len);
        buf.extend_from_slice(e.name.as_bytes());
        let _ = buf.write_u64::<LittleEndian>(e.created_at);
    }

    let crc = catalog_crc(&buf);
    LittleEndian::write_u32(&mut buf[CONTAINER_OFF_CRC..CONTAINER_HDR_SIZE], crc);
    Ok(buf)
}

// CRC по [version][flags][count] + body (магия и само поле CRC не входят)
fn catalog_crc(buf: &[u8]) -> u32 {
    let c = crc32c::crc32c_append(0, &buf[8..CONTAINER_OFF_CRC]);
    crc32c::crc32c_append(c, &buf[CONTAINER_HDR_SIZE..])
}

pub(crate) fn decode_catalog(buf: &[u8], path: &Path) -> Result<Vec<CatalogEntry>> {
    if buf.is_empty() {
        return Ok(Vec::new());
    }
    if buf.len() < CONTAINER_HDR_SIZE {
        return Err(PtError::corrupt(
            path,
            format!("short header ({} bytes)", buf.len()),
        ));
    }
    if &buf[0..8] != CONTAINER_MAGIC {
        return Err(PtError::corrupt(path, "bad magic"));
    }
    let version = LittleEndian::read_u32(&buf[8..12]);
    if version != CONTAINER_VERSION {
        return Err(PtError::corrupt(
            path,
            format!("unsupported version {}", version),
        ));
    }
    let count = LittleEndian::read_u32(&buf[16..20]) as usize;
    let stored = LittleEndian::read_u32(&buf[CONTAINER_OFF_CRC..CONTAINER_HDR_SIZE]);
    let calc = catalog_crc(buf);
    if stored != calc {
        return Err(PtError::corrupt(
            path,
            format!("CRC mismatch (stored={:#010x}, calc={:#010x})", stored, calc),
        ));
    }

    let mut entries = Vec::with_capacity(count.min(4096));
    let mut seen: HashSet<&str> = HashSet::new();
    let mut off = CONTAINER_HDR_SIZE;
    for i in 0..count {
        if off + 2 > buf.len() {
            return Err(PtError::corrupt(path, format!("truncated record {}", i)));
        }
        let len = LittleEndian::read_u16(&buf[off..off + 2]) as usize;
        off += 2;
        if off + len + 8 > buf.len() {
            return Err(PtError::corrupt(path, format!("truncated record {}", i)));
        }
        let name = std::str::from_utf8(&buf[off..off + len])
            .map_err(|_| PtError::corrupt(path, format!("record {} name is not UTF-8", i)))?;
        if !seen.insert(name) {
            return Err(PtError::corrupt(path, format!("duplicate point '{}'", name)));
        }
        off += len;
        let created_at = LittleEndian::read_u64(&buf[off..off + 8]);
        off += 8;
        entries.push(CatalogEntry {
            name: name.to_string(),
            created_at,
        });
    }
    if off != buf.len() {
        return Err(PtError::corrupt(
            path,
            format!("{} trailing byte(s)", buf.len() - off),
        ));
    }
    Ok(entries)
}

fn read_catalog(file: &mut File, path: &Path) -> Result<Vec<CatalogEntry>> {
    let mut buf = Vec::new();
    file.seek(SeekFrom::Start(0))
        .io_context(|| format!("seek {}", path.display()))?;
    file.read_to_end(&mut buf)
        .io_context(|| format!("read {}", path.display()))?;
    decode_catalog(&buf, path)
}
