use super::repository;
use contracts::domain::a004_resident::aggregate::{Resident, ResidentDto};
use contracts::usecases::u501_import_residents::ResidentCandidate;
use thiserror::Error;
use uuid::Uuid;

/// Classified failure of a single resident insert. The import loop
/// never aborts on these; they become per-row results.
#[derive(Debug, Error)]
pub enum InsertFailure {
    #[error("duplicate key")]
    DuplicateKey,
    #[error("constraint violation")]
    ConstraintViolation,
    #[error("{0}")]
    Other(String),
}

impl InsertFailure {
    /// UNIQUE must be checked before the generic constraint match:
    /// SQLite phrases it as "UNIQUE constraint failed: ...".
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("unique constraint") {
            InsertFailure::DuplicateKey
        } else if lower.contains("constraint") {
            InsertFailure::ConstraintViolation
        } else {
            InsertFailure::Other(raw.to_string())
        }
    }
}

pub async fn create(dto: ResidentDto) -> anyhow::Result<Uuid> {
    let code = dto
        .code
        .clone()
        .unwrap_or_else(|| format!("RES-{}", Uuid::new_v4()));
    let mut aggregate = Resident::new_for_insert(
        code,
        dto.apartment_id.clone(),
        dto.full_name.clone(),
        dto.email.clone().unwrap_or_default(),
        dto.phone.clone().unwrap_or_default(),
        dto.tax_id.clone().unwrap_or_default(),
        dto.is_owner,
        dto.is_responsible,
    );
    aggregate.base.comment = dto.comment;

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(&aggregate)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

pub async fn update(dto: ResidentDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::update(&aggregate).await
}

/// Insert one candidate from the bulk import. The candidate must carry a
/// resolved apartment id; failures come back classified, never thrown.
pub async fn insert_imported(candidate: &ResidentCandidate) -> Result<Uuid, InsertFailure> {
    let apartment_id = candidate
        .resolved_apartment_id
        .clone()
        .ok_or_else(|| InsertFailure::Other("candidate has no resolved unit".to_string()))?;

    let mut aggregate = Resident::new_for_insert(
        format!("RES-{}", Uuid::new_v4()),
        apartment_id,
        candidate.full_name.clone(),
        candidate.email.clone(),
        candidate.phone.clone(),
        candidate.tax_id.clone(),
        candidate.is_owner,
        candidate.is_responsible,
    );

    aggregate
        .validate()
        .map_err(InsertFailure::Other)?;
    aggregate.before_write();

    repository::insert(&aggregate)
        .await
        .map_err(|e| InsertFailure::classify(&e.to_string()))
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Resident>> {
    repository::get_by_id(id).await
}

pub async fn list_by_apartment(apartment_id: &str) -> anyhow::Result<Vec<Resident>> {
    repository::list_by_apartment(apartment_id).await
}

pub async fn list_email_pairs(apartment_ids: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    repository::list_email_pairs(apartment_ids).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sqlite_unique_violation_as_duplicate() {
        let failure = InsertFailure::classify(
            "Execution Error: error returned from database: (code: 2067) \
             UNIQUE constraint failed: a004_resident.apartment_id, a004_resident.email",
        );
        assert!(matches!(failure, InsertFailure::DuplicateKey));
    }

    #[test]
    fn classifies_other_constraints_as_violation() {
        let failure =
            InsertFailure::classify("(code: 275) CHECK constraint failed: a004_resident");
        assert!(matches!(failure, InsertFailure::ConstraintViolation));
        let failure = InsertFailure::classify("FOREIGN KEY constraint failed");
        assert!(matches!(failure, InsertFailure::ConstraintViolation));
    }

    #[test]
    fn passes_unknown_errors_through() {
        let failure = InsertFailure::classify("database is locked");
        match failure {
            InsertFailure::Other(raw) => assert_eq!(raw, "database is locked"),
            other => panic!("unexpected classification: {other:?}"),
        }
    }
}
