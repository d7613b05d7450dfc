use std::collections::HashMap;

use custody_types::{LedgerHandle, PrincipalId};

use crate::error::CustodyError;

/// Creator -> ledger pointers. One ledger per creator.
#[derive(Debug, Default, Clone)]
pub struct LedgerDirectory {
    by_creator: HashMap<PrincipalId, LedgerHandle>,
}

impl LedgerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, creator: &PrincipalId) -> Result<LedgerHandle, CustodyError> {
        self.by_creator
            .get(creator)
            .copied()
            .ok_or_else(|| CustodyError::NotFound(format!("no ledger for creator {}", creator)))
    }

    pub fn contains(&self, creator: &PrincipalId) -> bool {
        self.by_creator.contains_key(creator)
    }

    pub fn len(&self) -> usize {
        self.by_creator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_creator.is_empty()
    }

    pub(crate) fn ensure_vacant(&self, creator: &PrincipalId) -> Result<(), CustodyError> {
        if self.contains(creator) {
            return Err(CustodyError::AlreadyExists { creator: *creator });
        }
        Ok(())
    }

    pub(crate) fn register(
        &mut self,
        creator: PrincipalId,
        handle: LedgerHandle,
    ) -> Result<(), CustodyError> {
        self.ensure_vacant(&creator)?;
        self.by_creator.insert(creator, handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_once_per_creator() {
        let mut directory = LedgerDirectory::new();
        let creator = PrincipalId::derive("creator");
        let first = LedgerHandle::generate();

        directory.register(creator, first).unwrap();
        let err = directory
            .register(creator, LedgerHandle::generate())
            .unwrap_err();

        assert!(matches!(err, CustodyError::AlreadyExists { .. }));
        assert_eq!(directory.lookup(&creator).unwrap(), first);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let directory = LedgerDirectory::new();
        assert!(matches!(
            directory.lookup(&PrincipalId::derive("nobody")),
            Err(CustodyError::NotFound(_))
        ));
    }
}
