use serde::{Deserialize, Serialize};

/// Validation failures attached to a single parsed row. A row can carry
/// several of these at once; they never block other rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowError {
    BlockRequired,
    ApartmentRequired,
    UnitNotFound,
    InvalidName,
    InvalidEmail,
    InvalidTaxId,
    DuplicateResident,
}

impl RowError {
    pub fn message(&self) -> &'static str {
        match self {
            RowError::BlockRequired => "block required",
            RowError::ApartmentRequired => "apartment required",
            RowError::UnitNotFound => "unit not found for that block/apartment",
            RowError::InvalidName => "invalid name",
            RowError::InvalidEmail => "invalid email",
            RowError::InvalidTaxId => "invalid tax id",
            RowError::DuplicateResident => "resident already registered for this unit",
        }
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Editable fields of a candidate row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateField {
    Block,
    Apartment,
    Name,
    Email,
    Phone,
    TaxId,
    Owner,
    Responsible,
}

/// One parsed, validated, editable row awaiting the import decision.
/// Every user edit re-runs the full validation pipeline on the row;
/// the error list is never patched incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentCandidate {
    /// 1-based line number in the source file (header counts as line 1)
    pub line: usize,

    #[serde(rename = "blockLabel")]
    pub block_label: String,
    #[serde(rename = "apartmentLabel")]
    pub apartment_label: String,
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

    #[serde(rename = "apartmentId")]
    pub resolved_apartment_id: Option<String>,

    pub errors: Vec<RowError>,
}

impl ResidentCandidate {
    /// Derived, never stored: valid means no errors and a resolved unit.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.resolved_apartment_id.is_some()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}
