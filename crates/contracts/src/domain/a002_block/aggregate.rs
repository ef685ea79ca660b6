use crate::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
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

impl AggregateId for BlockId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(BlockId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// A named grouping of apartments inside a condominium.
/// `name` is the label residents type in import files ("BLOCO 1", "Torre A").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub base: BaseAggregate<BlockId>,

    #[serde(rename = "condominiumId")]
    pub condominium_id: String,

    pub name: String,
}

impl Block {
    pub fn new_for_insert(code: String, condominium_id: String, name: String) -> Self {
        Self {
            base: BaseAggregate::new(BlockId::new_v4(), code, name.clone()),
            condominium_id,
            name,
        }
    }

    pub fn update(&mut self, dto: &BlockDto) {
        self.name = dto.name.clone();
        self.base.description = dto.name.clone();
        self.base.comment = dto.comment.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Block name must not be empty".to_string());
        }
        if self.condominium_id.trim().is_empty() {
            return Err("Block must belong to a condominium".to_string());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.metadata.touch();
        self.base.metadata.increment_version();
    }

    /// Rebuild from database columns
    pub fn from_parts(
        id: BlockId,
        code: String,
        comment: Option<String>,
        condominium_id: String,
        name: String,
        metadata: EntityMetadata,
    ) -> Self {
        Self {
            base: BaseAggregate::with_metadata(id, code, name.clone(), comment, metadata),
            condominium_id,
            name,
        }
    }
}

/// Payload accepted by the block upsert endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDto {
    pub id: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "condominiumId")]
    pub condominium_id: String,
    pub name: String,
    pub comment: Option<String>,
}
