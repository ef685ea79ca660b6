use crate::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of an apartment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApartmentId(pub Uuid);

impl ApartmentId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for ApartmentId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ApartmentId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// A dwelling identified by a number inside a block.
/// Numbers are unique only within their block, never globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apartment {
    #[serde(flatten)]
    pub base: BaseAggregate<ApartmentId>,

    #[serde(rename = "blockId")]
    pub block_id: String,

    pub number: String,
}

impl Apartment {
    pub fn new_for_insert(code: String, block_id: String, number: String) -> Self {
        Self {
            base: BaseAggregate::new(ApartmentId::new_v4(), code, number.clone()),
            block_id,
            number,
        }
    }

    pub fn update(&mut self, dto: &ApartmentDto) {
        self.number = dto.number.clone();
        self.base.description = dto.number.clone();
        self.base.comment = dto.comment.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.number.trim().is_empty() {
            return Err("Apartment number must not be empty".to_string());
        }
        if self.block_id.trim().is_empty() {
            return Err("Apartment must belong to a block".to_string());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.metadata.touch();
        self.base.metadata.increment_version();
    }

    /// Rebuild from database columns
    pub fn from_parts(
        id: ApartmentId,
        code: String,
        comment: Option<String>,
        block_id: String,
        number: String,
        metadata: EntityMetadata,
    ) -> Self {
        Self {
            base: BaseAggregate::with_metadata(id, code, number.clone(), comment, metadata),
            block_id,
            number,
        }
    }
}

/// Payload accepted by the apartment upsert endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApartmentDto {
    pub id: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "blockId")]
    pub block_id: String,
    pub number: String,
    pub comment: Option<String>,
}
