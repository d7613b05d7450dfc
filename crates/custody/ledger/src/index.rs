use std::collections::HashMap;

use custody_types::EscrowKey;

use crate::error::CustodyError;
use crate::record::RecordHandle;

/// `EscrowKey -> RecordHandle` map of one ledger.
///
/// Mutators are crate-private: only ledger operations insert or remove
/// entries. An occupied key is never overwritten.
#[derive(Debug, Default, Clone)]
pub struct EscrowIndex {
    entries: HashMap<EscrowKey, RecordHandle>,
}

impl EscrowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &EscrowKey) -> Option<RecordHandle> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &EscrowKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EscrowKey, &RecordHandle)> {
        self.entries.iter()
    }

    pub(crate) fn insert(
        &mut self,
        key: EscrowKey,
        handle: RecordHandle,
    ) -> Result<(), CustodyError> {
        if let Some(existing) = self.entries.get(&key) {
            return Err(CustodyError::IntegrityViolation(format!(
                "index slot {} already points at {}",
                key, existing
            )));
        }
        self.entries.insert(key, handle);
        Ok(())
    }

    pub(crate) fn remove(&mut self, key: &EscrowKey) -> Option<RecordHandle> {
        self.entries.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custody_types::{AssetClass, PrincipalId};

    fn key(depositor: &str) -> EscrowKey {
        EscrowKey::new(AssetClass::new("USD").unwrap(), PrincipalId::derive(depositor))
    }

    #[test]
    fn insert_refuses_occupied_slot() {
        let mut index = EscrowIndex::new();
        let first = RecordHandle::generate();
        index.insert(key("a"), first).unwrap();

        let err = index.insert(key("a"), RecordHandle::generate()).unwrap_err();
        assert!(matches!(err, CustodyError::IntegrityViolation(_)));
        assert_eq!(index.get(&key("a")), Some(first));
    }

    #[test]
    fn remove_frees_slot() {
        let mut index = EscrowIndex::new();
        let handle = RecordHandle::generate();
        index.insert(key("a"), handle).unwrap();
        index.insert(key("b"), RecordHandle::generate()).unwrap();

        assert_eq!(index.remove(&key("a")), Some(handle));
        assert!(!index.contains(&key("a")));
        assert_eq!(index.len(), 1);
        assert_eq!(index.remove(&key("a")), None);
    }
}
