use std::collections::HashSet;

use crate::domain::{a002_block, a003_apartment, a004_resident};

/// One block as the resolver sees it
#[derive(Debug, Clone)]
pub struct DirectoryBlock {
    pub id: String,
    pub name: String,
}

/// One apartment as the resolver sees it
#[derive(Debug, Clone)]
pub struct DirectoryApartment {
    pub id: String,
    pub block_id: String,
    pub number: String,
}

/// Read-only registry of the condominium's blocks and apartments,
/// loaded once per import session. Apartment numbers are only unique
/// within a block, so resolution always goes block first.
#[derive(Debug, Clone, Default)]
pub struct UnitDirectory {
    blocks: Vec<DirectoryBlock>,
    apartments: Vec<DirectoryApartment>,
}

impl UnitDirectory {
    pub fn new(blocks: Vec<DirectoryBlock>, apartments: Vec<DirectoryApartment>) -> Self {
        Self { blocks, apartments }
    }

    /// Fetch every block and apartment of the condominium.
    pub async fn load(condominium_id: &str) -> anyhow::Result<Self> {
        let blocks = a002_block::service::list_by_condominium(condominium_id).await?;
        let block_ids: Vec<String> = blocks
            .iter()
            .map(|b| b.base.id.value().to_string())
            .collect();
        let apartments = a003_apartment::service::list_by_blocks(&block_ids).await?;

        Ok(Self::new(
            blocks
                .into_iter()
                .map(|b| DirectoryBlock {
                    id: b.base.id.value().to_string(),
                    name: b.name,
                })
                .collect(),
            apartments
                .into_iter()
                .map(|a| DirectoryApartment {
                    id: a.base.id.value().to_string(),
                    block_id: a.block_id,
                    number: a.number,
                })
                .collect(),
        ))
    }

    /// Map textual labels to a concrete apartment id.
    ///
    /// Case-insensitive exact match only: block by name, then apartment
    /// by number within that block. No fuzzy matching here.
    pub fn resolve(&self, block_label: &str, apartment_label: &str) -> Option<String> {
        let block_key = block_label.trim().to_uppercase();
        let apartment_key = apartment_label.trim().to_uppercase();
        if block_key.is_empty() || apartment_key.is_empty() {
            return None;
        }

        let block = self
            .blocks
            .iter()
            .find(|b| b.name.trim().to_uppercase() == block_key)?;

        self.apartments
            .iter()
            .find(|a| a.block_id == block.id && a.number.trim().to_uppercase() == apartment_key)
            .map(|a| a.id.clone())
    }

    pub fn apartment_ids(&self) -> Vec<String> {
        self.apartments.iter().map(|a| a.id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.apartments.is_empty()
    }
}

/// (apartment_id, normalized email) pairs already on file, fetched once
/// before parsing begins. Empty for reduced-schema imports, which carry
/// no email at all.
#[derive(Debug, Clone, Default)]
pub struct ExistingResidentIndex {
    pairs: HashSet<(String, String)>,
}

impl ExistingResidentIndex {
    pub fn new(raw_pairs: Vec<(String, String)>) -> Self {
        let pairs = raw_pairs
            .into_iter()
            .filter_map(|(apartment_id, email)| {
                let normalized = normalize_email(&email);
                if normalized.is_empty() {
                    None
                } else {
                    Some((apartment_id, normalized))
                }
            })
            .collect();
        Self { pairs }
    }

    /// Fetch the pairs for every apartment in the directory.
    pub async fn load(directory: &UnitDirectory) -> anyhow::Result<Self> {
        let pairs = a004_resident::service::list_email_pairs(&directory.apartment_ids()).await?;
        Ok(Self::new(pairs))
    }

    pub fn contains(&self, apartment_id: &str, email: &str) -> bool {
        let normalized = normalize_email(email);
        if normalized.is_empty() {
            return false;
        }
        self.pairs
            .contains(&(apartment_id.to_string(), normalized))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UnitDirectory {
        UnitDirectory::new(
            vec![
                DirectoryBlock {
                    id: "b1".into(),
                    name: "BLOCO 1".into(),
                },
                DirectoryBlock {
                    id: "b2".into(),
                    name: "BLOCO 2".into(),
                },
            ],
            vec![
                DirectoryApartment {
                    id: "a101".into(),
                    block_id: "b1".into(),
                    number: "101".into(),
                },
                DirectoryApartment {
                    id: "a102".into(),
                    block_id: "b1".into(),
                    number: "102".into(),
                },
                DirectoryApartment {
                    id: "a201".into(),
                    block_id: "b2".into(),
                    number: "101".into(),
                },
            ],
        )
    }

    #[test]
    fn resolves_every_known_pair_to_its_own_id() {
        let dir = directory();
        assert_eq!(dir.resolve("BLOCO 1", "101"), Some("a101".into()));
        assert_eq!(dir.resolve("BLOCO 1", "102"), Some("a102".into()));
        // Same number in another block resolves to the other apartment
        assert_eq!(dir.resolve("BLOCO 2", "101"), Some("a201".into()));
    }

    #[test]
    fn resolution_is_case_insensitive_and_trims() {
        let dir = directory();
        assert_eq!(dir.resolve(" bloco 1 ", " 101 "), Some("a101".into()));
    }

    #[test]
    fn unknown_block_or_number_resolves_to_none() {
        let dir = directory();
        assert_eq!(dir.resolve("BLOCO 9", "101"), None);
        assert_eq!(dir.resolve("BLOCO 1", "999"), None);
        assert_eq!(dir.resolve("", "101"), None);
        assert_eq!(dir.resolve("BLOCO 1", ""), None);
    }

    #[test]
    fn directory_without_apartments_is_empty() {
        assert!(UnitDirectory::new(vec![], vec![]).is_empty());
        assert!(UnitDirectory::new(
            vec![DirectoryBlock {
                id: "b1".into(),
                name: "BLOCO 1".into(),
            }],
            vec![],
        )
        .is_empty());
        assert!(!directory().is_empty());
    }

    #[test]
    fn existing_index_is_case_and_whitespace_insensitive() {
        let index =
            ExistingResidentIndex::new(vec![("a101".into(), " Joao@Email.com".into())]);
        assert!(index.contains("a101", "joao@email.com "));
        assert!(index.contains("a101", "JOAO@EMAIL.COM"));
        assert!(!index.contains("a102", "joao@email.com"));
        assert!(!index.contains("a101", ""));
    }
}
