use crate::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a condominium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CondominiumId(pub Uuid);

impl CondominiumId {
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

impl AggregateId for CondominiumId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(CondominiumId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// A managed property. `base.description` is the display name the
/// import template filename is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condominium {
    #[serde(flatten)]
    pub base: BaseAggregate<CondominiumId>,

    pub address: String,
}

impl Condominium {
    pub fn new_for_insert(code: String, description: String, address: String) -> Self {
        Self {
            base: BaseAggregate::new(CondominiumId::new_v4(), code, description),
            address,
        }
    }

    pub fn update(&mut self, dto: &CondominiumDto) {
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        self.address = dto.address.clone().unwrap_or_default();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Description must not be empty".to_string());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.metadata.touch();
        self.base.metadata.increment_version();
    }
}

/// Payload accepted by the condominium upsert endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondominiumDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub description: String,
    pub address: Option<String>,
    pub comment: Option<String>,
}

impl Condominium {
    /// Rebuild from database columns
    pub fn from_parts(
        id: CondominiumId,
        code: String,
        description: String,
        comment: Option<String>,
        address: String,
        metadata: EntityMetadata,
    ) -> Self {
        Self {
            base: BaseAggregate::with_metadata(id, code, description, comment, metadata),
            address,
        }
    }
}
