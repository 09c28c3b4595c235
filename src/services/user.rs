use tracing::info;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::models::{User, UserCreate, UserUpdate};
use crate::database::query::{self, json_returning};
use crate::database::{to_columns, Database, Repository};
use crate::filter::{SqlResult, SqlValue};
use crate::validation::Validate;

pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn repo() -> Repository<User> {
        Repository::new()
    }

    pub async fn list(&self) -> ServiceResult<Vec<User>> {
        Ok(Self::repo()
            .find_where_ordered(self.db.pool(), &serde_json::Value::Null, "user_identifier")
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<User> {
        Ok(Self::repo().get(self.db.pool(), id).await?)
    }

    pub async fn create(&self, payload: UserCreate, actor: Uuid) -> ServiceResult<User> {
        payload.validate()?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().insert(self.db.pool(), &values, actor).await?)
    }

    pub async fn update(&self, id: Uuid, payload: UserUpdate, actor: Uuid) -> ServiceResult<User> {
        payload.validate()?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(self.db.pool(), id, &values, actor).await?)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<User> {
        Ok(Self::repo().delete(self.db.pool(), id).await?)
    }

    /// Find the user for a Keycloak identity, creating it on first sight and
    /// tracking username changes
    pub async fn upsert_by_keycloak(&self, keycloak_uuid: &str, username: &str) -> ServiceResult<User> {
        let existing = Self::repo()
            .find_where(self.db.pool(), &serde_json::json!({ "keycloak_uuid": keycloak_uuid }))
            .await?
            .into_iter()
            .next();

        if let Some(user) = existing {
            if user.user_identifier == username {
                return Ok(user);
            }
        }

        let sql = SqlResult {
            query: json_returning(
                "INSERT INTO \"user\" (\"user_identifier\", \"keycloak_uuid\") VALUES ($1::text, $2::text) \
                 ON CONFLICT (\"keycloak_uuid\") DO UPDATE SET \"user_identifier\" = EXCLUDED.\"user_identifier\", \
                 \"update_timestamp\" = now()",
            ),
            params: vec![
                SqlValue::Text(username.to_string()),
                SqlValue::Text(keycloak_uuid.to_string()),
            ],
        };
        let user: User = query::fetch_optional(self.db.pool(), &sql)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} could not be registered", username)))?;
        info!("Registered user {} ({})", user.user_identifier, user.user_id);
        Ok(user)
    }
}
