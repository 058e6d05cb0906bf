use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*, sea_query::OnConflict};

use crate::{EngineError, ResultEngine, User, users, util::normalize_optional_text};

use super::{Engine, with_tx};

/// Profile data of a verified identity.
#[derive(Clone, Debug, Default)]
pub struct RegisterUserCmd {
    pub id: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Engine {
    /// Creates or refreshes the user record for a verified identity.
    ///
    /// Blank profile fields never overwrite stored values. Returns the user
    /// and whether it was created by this call.
    pub async fn register_user(&self, cmd: RegisterUserCmd) -> ResultEngine<(User, bool)> {
        let id = cmd.id.trim().to_string();
        if id.is_empty() {
            return Err(EngineError::InvalidId("user id must not be empty".to_string()));
        }
        let email = normalize_optional_text(cmd.email.as_deref());
        let phone_number = normalize_optional_text(cmd.phone_number.as_deref());
        let display_name = normalize_optional_text(cmd.display_name.as_deref());
        let photo_url = normalize_optional_text(cmd.photo_url.as_deref());
        let now = Utc::now();

        let (model, created) = with_tx!(self, |db_tx| {
            let fresh = users::ActiveModel {
                id: ActiveValue::Set(id.clone()),
                email: ActiveValue::Set(email.clone()),
                phone_number: ActiveValue::Set(phone_number.clone()),
                display_name: ActiveValue::Set(display_name.clone()),
                photo_url: ActiveValue::Set(photo_url.clone()),
                created_at: ActiveValue::Set(now),
                last_login_at: ActiveValue::Set(now),
            };
            // A concurrent first registration may win the insert; the
            // loser refreshes the row instead.
            let inserted = users::Entity::insert(fresh)
                .on_conflict(
                    OnConflict::column(users::Column::Id)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
            let existing = users::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not registered".to_string()))?;
            if inserted > 0 {
                Ok::<_, EngineError>((existing, true))
            } else {
                let mut active: users::ActiveModel = existing.into();
                if email.is_some() {
                    active.email = ActiveValue::Set(email);
                }
                if phone_number.is_some() {
                    active.phone_number = ActiveValue::Set(phone_number);
                }
                if display_name.is_some() {
                    active.display_name = ActiveValue::Set(display_name);
                }
                if photo_url.is_some() {
                    active.photo_url = ActiveValue::Set(photo_url);
                }
                active.last_login_at = ActiveValue::Set(now);
                let model = active.update(&db_tx).await?;
                Ok((model, false))
            }
        })?;

        if created {
            tracing::info!(user_id = %model.id, "user registered");
        } else {
            tracing::debug!(user_id = %model.id, "user login refreshed");
        }
        Ok((User::from(model), created))
    }

    /// Returns a registered user.
    pub async fn user(&self, user_id: &str) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not registered".to_string()))
    }
}
