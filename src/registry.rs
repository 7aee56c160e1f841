//! Named object registry: live point names of one file session.
//!
//! Хранит упорядоченную (по порядку создания) последовательность живых точек
//! `name -> handle`. Используется для перечисления и для проверки пустоты при close.
//! Сам реестр не знает про handle table — согласованность обеспечивает вызывающий
//! код (PointLib) под локом сессии.

use std::collections::HashMap;

use crate::error::{PtError, Result};

#[derive(Debug, Default)]
pub struct PointRegistry {
    // порядок создания
    order: Vec<(String, u64)>,
    by_name: HashMap<String, u64>,
}

impl PointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[inline]
    pub fn contains_handle(&self, id: u64) -> bool {
        self.order.iter().any(|(_, h)| *h == id)
    }

    /// Проверка без мутации: можно ли зарегистрировать имя.
    pub fn check_insert(&self, name: &str) -> Result<()> {
        if self.contains_name(name) {
            return Err(PtError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Register a live point. Fails with `DuplicateName` if the name is live.
    pub fn insert(&mut self, name: &str, id: u64) -> Result<()> {
        self.check_insert(name)?;
        self.by_name.insert(name.to_string(), id);
        self.order.push((name.to_string(), id));
        Ok(())
    }

    /// Снять регистрацию по handle; возвращает имя. Неизвестный handle => InvalidHandle.
    pub fn remove(&mut self, id: u64) -> Result<String> {
        let pos = self
            .order
            .iter()
            .position(|(_, h)| *h == id)
            .ok_or(PtError::InvalidHandle(id))?;
        let (name, _) = self.order.remove(pos);
        self.by_name.remove(&name);
        Ok(name)
    }

    pub fn handle_of(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    /// Живые имена в порядке создания.
    pub fn names(&self) -> Vec<String> {
        self.order.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn handles(&self) -> Vec<u64> {
        self.order.iter().map(|(_, h)| *h).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn insert_remove_keeps_order() {
        let mut r = PointRegistry::new();
        r.insert("Simple Point", 1).unwrap();
        r.insert("FixedBuoy Point", 2).unwrap();
        r.insert("FloatBuoy Point", 3).unwrap();
        assert_eq!(r.len(), 3);

        assert_eq!(r.remove(2).unwrap(), "FixedBuoy Point");
        assert_eq!(r.names(), vec!["Simple Point", "FloatBuoy Point"]);
        assert!(!r.contains_name("FixedBuoy Point"));
        assert_eq!(r.handle_of("FloatBuoy Point"), Some(3));
    }

    #[test]
    fn duplicate_name_rejected_without_mutation() {
        let mut r = PointRegistry::new();
        r.insert("p", 1).unwrap();
        let e = r.insert("p", 2).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::DuplicateName);
        assert_eq!(r.len(), 1);
        assert_eq!(r.handle_of("p"), Some(1));
        assert!(!r.contains_handle(2));
    }

    #[test]
    fn remove_unknown_is_invalid_handle() {
        let mut r = PointRegistry::new();
        r.insert("p", 1).unwrap();
        r.remove(1).unwrap();
        assert_eq!(r.remove(1).unwrap_err().kind(), ErrorKind::InvalidHandle);
        assert!(r.is_empty());
    }

    #[test]
    fn name_reusable_after_remove() {
        let mut r = PointRegistry::new();
        r.insert("p", 1).unwrap();
        r.remove(1).unwrap();
        r.insert("p", 9).unwrap();
        assert_eq!(r.handles(), vec![9]);
    }
}
