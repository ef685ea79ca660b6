use super::repository;
use contracts::domain::a003_apartment::aggregate::{Apartment, ApartmentDto};
use uuid::Uuid;

pub async fn create(dto: ApartmentDto) -> anyhow::Result<Uuid> {
    let code = dto
        .code
        .clone()
        .unwrap_or_else(|| format!("APT-{}", Uuid::new_v4()));
    let mut aggregate = Apartment::new_for_insert(code, dto.block_id, dto.number);
    aggregate.base.comment = dto.comment;

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(&aggregate).await
}

pub async fn update(dto: ApartmentDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
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

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(id).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Apartment>> {
    repository::get_by_id(id).await
}

pub async fn list_by_block(block_id: &str) -> anyhow::Result<Vec<Apartment>> {
    repository::list_by_block(block_id).await
}

pub async fn list_by_blocks(block_ids: &[String]) -> anyhow::Result<Vec<Apartment>> {
    repository::list_by_blocks(block_ids).await
}
