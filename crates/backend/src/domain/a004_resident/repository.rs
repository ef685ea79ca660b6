use chrono::Utc;
use contracts::domain::a004_resident::aggregate::{Resident, ResidentId};
use contracts::domain::common::EntityMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_resident")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub comment: Option<String>,
    pub apartment_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub tax_id: String,
    pub is_owner: bool,
    pub is_responsible: bool,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Resident {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        Resident::from_parts(
            ResidentId(uuid),
            m.code,
            m.comment,
            m.apartment_id,
            m.full_name,
            m.email,
            m.phone,
            m.tax_id,
            m.is_owner,
            m.is_responsible,
            metadata,
        )
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn list_by_apartment(apartment_id: &str) -> anyhow::Result<Vec<Resident>> {
    let mut items: Vec<Resident> = Entity::find()
        .filter(Column::ApartmentId.eq(apartment_id))
        .filter(Column::IsDeleted.eq(false))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    items.sort_by(|a, b| {
        a.full_name
            .to_lowercase()
            .cmp(&b.full_name.to_lowercase())
    });
    Ok(items)
}

/// (apartment_id, email) pairs currently on file for the given
/// apartments. Feeds the duplicate detector; one round trip per
/// import session.
pub async fn list_email_pairs(apartment_ids: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    if apartment_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<(String, String)> = Entity::find()
        .select_only()
        .column(Column::ApartmentId)
        .column(Column::Email)
        .filter(Column::ApartmentId.is_in(apartment_ids.iter().cloned()))
        .filter(Column::IsDeleted.eq(false))
        .into_tuple()
        .all(conn())
        .await?;
    Ok(rows)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Resident>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &Resident) -> Result<Uuid, sea_orm::DbErr> {
    let uuid = aggregate.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(aggregate.base.code.clone()),
        comment: Set(aggregate.base.comment.clone()),
        apartment_id: Set(aggregate.apartment_id.clone()),
        full_name: Set(aggregate.full_name.clone()),
        email: Set(aggregate.email.clone()),
        phone: Set(aggregate.phone.clone()),
        tax_id: Set(aggregate.tax_id.clone()),
        is_owner: Set(aggregate.is_owner),
        is_responsible: Set(aggregate.is_responsible),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &Resident) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        comment: Set(aggregate.base.comment.clone()),
        apartment_id: Set(aggregate.apartment_id.clone()),
        full_name: Set(aggregate.full_name.clone()),
        email: Set(aggregate.email.clone()),
        phone: Set(aggregate.phone.clone()),
        tax_id: Set(aggregate.tax_id.clone()),
        is_owner: Set(aggregate.is_owner),
        is_responsible: Set(aggregate.is_responsible),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
        created_at: sea_orm::ActiveValue::NotSet,
    };
    active.update(conn()).await?;
    Ok(())
}

pub async fn soft_delete(id: Uuid) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
