use crate::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a resident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidentId(pub Uuid);

impl ResidentId {
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

impl AggregateId for ResidentId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ResidentId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// A person attached to an apartment. Email is stored trimmed and
/// lowercased; it is the duplicate key within an apartment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    #[serde(flatten)]
    pub base: BaseAggregate<ResidentId>,

    #[serde(rename = "apartmentId")]
    pub apartment_id: String,

    #[serde(rename = "fullName")]
    pub full_name: String,

    pub email: String,
    pub phone: String,

    #[serde(rename = "taxId")]
    pub tax_id: String,

    #[serde(rename = "isOwner")]
    pub is_owner: bool,

    #[serde(rename = "isResponsible")]
    pub is_responsible: bool,
}

impl Resident {
    #[allow(clippy::too_many_arguments)]
    pub fn new_for_insert(
        code: String,
        apartment_id: String,
        full_name: String,
        email: String,
        phone: String,
        tax_id: String,
        is_owner: bool,
        is_responsible: bool,
    ) -> Self {
        Self {
            base: BaseAggregate::new(ResidentId::new_v4(), code, full_name.clone()),
            apartment_id,
            full_name,
            email: email.trim().to_lowercase(),
            phone,
            tax_id,
            is_owner,
            is_responsible,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().len() < 2 {
            return Err("Resident name must have at least 2 characters".to_string());
        }
        if self.apartment_id.trim().is_empty() {
            return Err("Resident must belong to an apartment".to_string());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.metadata.touch();
        self.base.metadata.increment_version();
    }

    pub fn update(&mut self, dto: &ResidentDto) {
        self.full_name = dto.full_name.clone();
        self.base.description = dto.full_name.clone();
        self.email = dto.email.clone().unwrap_or_default().trim().to_lowercase();
        self.phone = dto.phone.clone().unwrap_or_default();
        self.tax_id = dto.tax_id.clone().unwrap_or_default();
        self.is_owner = dto.is_owner;
        self.is_responsible = dto.is_responsible;
        self.base.comment = dto.comment.clone();
    }

    /// Rebuild from database columns
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ResidentId,
        code: String,
        comment: Option<String>,
        apartment_id: String,
        full_name: String,
        email: String,
        phone: String,
        tax_id: String,
        is_owner: bool,
        is_responsible: bool,
        metadata: EntityMetadata,
    ) -> Self {
        Self {
            base: BaseAggregate::with_metadata(id, code, full_name.clone(), comment, metadata),
            apartment_id,
            full_name,
            email,
            phone,
            tax_id,
            is_owner,
            is_responsible,
        }
    }
}

/// Payload accepted by the resident create endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentDto {
    pub id: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "apartmentId")]
    pub apartment_id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "taxId")]
    pub tax_id: Option<String>,
    #[serde(rename = "isOwner", default)]
    pub is_owner: bool,
    #[serde(rename = "isResponsible", default)]
    pub is_responsible: bool,
    pub comment: Option<String>,
}
