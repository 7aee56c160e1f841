//! Общие константы формата контейнера (catalog) и лимиты имён.

// -------- Container (point catalog) --------
// Формат файла (LE):
// [magic8="HE5PTC01"][version u32=1][flags u32][point_count u32][crc32c u32]
// Далее point_count записей: [name_len u16][name bytes][created_at_secs u64]
pub const CONTAINER_MAGIC: &[u8; 8] = b"HE5PTC01";
pub const CONTAINER_VERSION: u32 = 1;
pub const CONTAINER_HDR_SIZE: usize = 24; // magic8 + ver4 + flags4 + count4 + crc4

// Смещение поля CRC внутри заголовка
pub const CONTAINER_OFF_CRC: usize = 20;

// Фиксированная часть записи каталога (без байтов имени)
pub const CATALOG_REC_FIXED: usize = 2 + 8;

// -------- Names --------
pub const DEFAULT_MAX_NAME_LEN: usize = 255;
// Жёсткий предел: длина имени хранится в u16
pub const HARD_MAX_NAME_LEN: usize = u16::MAX as usize;

// -------- Handles --------
// Поколение 0 не выдаётся никогда => идентификатор 0 всегда невалиден.
pub const FIRST_GENERATION: u32 = 1;
