//! Handle table: opaque integer identifiers -> in-memory records.
//!
//! Раскладка идентификатора (u64):
//! - младшие 32 бита — индекс слота;
//! - старшие 32 бита — поколение слота (начиная с 1).
//!
//! Освобождение слота увеличивает поколение, поэтому старый идентификатор
//! после release() больше никогда не резолвится. Свободные слоты переиспользуются
//! (LIFO), но уже с новым поколением. Идентификатор 0 не выдаётся.

use crate::consts::FIRST_GENERATION;
use crate::error::{PtError, Result};

/// What an identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Session,
    Point,
}

#[inline]
fn pack(index: u32, generation: u32) -> u64 {
    ((generation as u64) << 32) | index as u64
}

#[inline]
fn unpack(id: u64) -> (u32, u32) {
    (id as u32, (id >> 32) as u32)
}

struct Slot<T> {
    generation: u32,
    entry: Option<(HandleKind, T)>,
}

/// Generational arena keyed by opaque `u64` identifiers.
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Выдать новый идентификатор под запись `record`.
    pub fn allocate(&mut self, kind: HandleKind, record: T) -> Result<u64> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some((kind, record));
            self.live += 1;
            return Ok(pack(index, slot.generation));
        }
        let index = u32::try_from(self.slots.len())
            .map_err(|_| PtError::Corrupt("handle table exhausted (2^32 slots)".into()))?;
        self.slots.push(Slot {
            generation: FIRST_GENERATION,
            entry: Some((kind, record)),
        });
        self.live += 1;
        Ok(pack(index, FIRST_GENERATION))
    }

    fn slot(&self, id: u64) -> Option<&Slot<T>> {
        let (index, generation) = unpack(id);
        self.slots
            .get(index as usize)
            .filter(|s| s.generation == generation && s.entry.is_some())
    }

    /// Kind of a live identifier.
    pub fn kind_of(&self, id: u64) -> Result<HandleKind> {
        self.slot(id)
            .and_then(|s| s.entry.as_ref())
            .map(|(k, _)| *k)
            .ok_or(PtError::InvalidHandle(id))
    }

    /// Резолв с проверкой вида: чужой вид => InvalidHandle.
    pub fn resolve(&self, id: u64, kind: HandleKind) -> Result<&T> {
        match self.slot(id).and_then(|s| s.entry.as_ref()) {
            Some((k, rec)) if *k == kind => Ok(rec),
            _ => Err(PtError::InvalidHandle(id)),
        }
    }

    /// Освободить идентификатор и вернуть запись. Повторный release => InvalidHandle.
    pub fn release(&mut self, id: u64, kind: HandleKind) -> Result<T> {
        self.resolve(id, kind)?;
        let (index, _) = unpack(id);
        let slot = &mut self.slots[index as usize];
        let (_, rec) = slot.entry.take().ok_or(PtError::InvalidHandle(id))?;
        // Поколение wrap-around: пропускаем 0, чтобы идентификатор 0 оставался невалидным.
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => FIRST_GENERATION,
            g => g,
        };
        self.free.push(index);
        self.live -= 1;
        Ok(rec)
    }

    /// Обход живых записей заданного вида.
    pub fn for_each_of<F: FnMut(u64, &T)>(&self, kind: HandleKind, mut f: F) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some((k, rec)) = slot.entry.as_ref() {
                if *k == kind {
                    f(pack(i as u32, slot.generation), rec);
                }
            }
        }
    }
}
