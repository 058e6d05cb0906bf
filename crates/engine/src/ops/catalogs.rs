use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    BusinessUnit, BusinessUnitKind, EngineError, ResultEngine, Tag, business_units, tags,
    util::{normalize_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn list_business_units(&self) -> ResultEngine<Vec<BusinessUnit>> {
        business_units::Entity::find()
            .order_by_asc(business_units::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(BusinessUnit::try_from)
            .collect()
    }

    pub async fn create_business_unit(
        &self,
        name: &str,
        kind: BusinessUnitKind,
    ) -> ResultEngine<BusinessUnit> {
        let name = normalize_required_name(name, "business unit")?;
        let active = business_units::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = active.insert(&self.database).await?;
        BusinessUnit::try_from(model)
    }

    pub async fn list_tags(&self) -> ResultEngine<Vec<Tag>> {
        Ok(tags::Entity::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Tag::from)
            .collect())
    }

    /// Registers a tag. Names are unique ignoring case and accents.
    pub async fn create_tag(&self, name: &str) -> ResultEngine<Tag> {
        let name = normalize_required_name(name, "tag")?;
        let name_norm = normalize_key(&name)
            .ok_or_else(|| EngineError::InvalidName("tag name must contain letters or digits".to_string()))?;

        with_tx!(self, |db_tx| {
            if let Some(existing) = find_tag(&db_tx, &name_norm).await? {
                return Err(EngineError::ExistingKey(existing.name));
            }

            let id = Uuid::new_v4();
            let active = tags::ActiveModel {
                id: ActiveValue::Set(id),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            };
            // Lost a race against a concurrent insert of the same key.
            let inserted = tags::Entity::insert(active)
                .on_conflict(
                    OnConflict::column(tags::Column::NameNorm)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
            if inserted == 0 {
                let existing = find_tag(&db_tx, &name_norm).await?;
                return Err(EngineError::ExistingKey(
                    existing.map_or(name, |tag| tag.name),
                ));
            }

            let model = tags::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("tag not exists".to_string()))?;
            Ok(Tag::from(model))
        })
    }
}

async fn find_tag<C: ConnectionTrait>(
    db: &C,
    name_norm: &str,
) -> ResultEngine<Option<tags::Model>> {
    Ok(tags::Entity::find()
        .filter(tags::Column::NameNorm.eq(name_norm))
        .one(db)
        .await?)
}
