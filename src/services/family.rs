use std::collections::BTreeSet;

use serde_json::{json, Value};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::models::{
    Critter, Family, FamilyChild, FamilyChildLink, FamilyCreate, FamilyDetailed, FamilyParent, FamilyParentLink,
    FamilyUpdate, ImmediateFamily,
};
use crate::database::{by_key, by_keys, to_columns, Database, Repository};
use crate::validation::Validate;

/// Families group critters into parents and children. A critter may belong to
/// many families but cannot sit on both sides of the same one.
pub struct FamilyService {
    db: Database,
}

impl FamilyService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn repo() -> Repository<Family> {
        Repository::new()
    }

    fn parents() -> Repository<FamilyParent> {
        Repository::new()
    }

    fn children() -> Repository<FamilyChild> {
        Repository::new()
    }

    pub async fn list(&self) -> ServiceResult<Vec<Family>> {
        Ok(Self::repo()
            .find_where_ordered(self.db.pool(), &Value::Null, "family_label")
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<FamilyDetailed> {
        let mut conn = self.db.pool().acquire().await?;
        let family = Self::repo().get(&mut *conn, id).await?;
        let parent_ids: Vec<Uuid> = Self::parents()
            .find_where(&mut *conn, &by_key("family_id", id))
            .await?
            .into_iter()
            .map(|p| p.parent_critter_id)
            .collect();
        let child_ids: Vec<Uuid> = Self::children()
            .find_where(&mut *conn, &by_key("family_id", id))
            .await?
            .into_iter()
            .map(|c| c.child_critter_id)
            .collect();
        Ok(FamilyDetailed {
            family,
            parents: critters(&mut conn, parent_ids).await?,
            children: critters(&mut conn, child_ids).await?,
        })
    }

    pub async fn create(&self, payload: FamilyCreate, user_id: Uuid) -> ServiceResult<Family> {
        let mut conn = self.db.pool().acquire().await?;
        Self::create_in(&mut conn, payload, user_id).await
    }

    pub async fn update(&self, id: Uuid, payload: FamilyUpdate, user_id: Uuid) -> ServiceResult<Family> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_in(&mut conn, id, payload, user_id).await
    }

    /// Parent and child links cascade with the family
    pub async fn delete(&self, id: Uuid) -> ServiceResult<Family> {
        Ok(Self::repo().delete(self.db.pool(), id).await?)
    }

    pub async fn create_in(conn: &mut PgConnection, payload: FamilyCreate, user_id: Uuid) -> ServiceResult<Family> {
        payload.validate()?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().insert(conn, &values, user_id).await?)
    }

    pub async fn update_in(
        conn: &mut PgConnection,
        id: Uuid,
        payload: FamilyUpdate,
        user_id: Uuid,
    ) -> ServiceResult<Family> {
        payload.validate()?;
        let values = to_columns(&payload)?;
        Ok(Self::repo().update(conn, id, &values, user_id).await?)
    }

    pub async fn delete_in(conn: &mut PgConnection, id: Uuid) -> ServiceResult<Family> {
        Ok(Self::repo().delete(conn, id).await?)
    }

    pub async fn list_parents(&self) -> ServiceResult<Vec<FamilyParent>> {
        Ok(Self::parents().find_all(self.db.pool()).await?)
    }

    pub async fn list_children(&self) -> ServiceResult<Vec<FamilyChild>> {
        Ok(Self::children().find_all(self.db.pool()).await?)
    }

    pub async fn add_parent(&self, link: FamilyParentLink, user_id: Uuid) -> ServiceResult<FamilyParent> {
        let mut tx = self.db.begin().await?;
        let parent = Self::add_parent_in(&mut tx, link, user_id).await?;
        tx.commit().await?;
        Ok(parent)
    }

    pub async fn remove_parent(&self, link: FamilyParentLink) -> ServiceResult<FamilyParent> {
        let mut conn = self.db.pool().acquire().await?;
        Self::remove_parent_in(&mut conn, link).await
    }

    pub async fn add_child(&self, link: FamilyChildLink, user_id: Uuid) -> ServiceResult<FamilyChild> {
        let mut tx = self.db.begin().await?;
        let child = Self::add_child_in(&mut tx, link, user_id).await?;
        tx.commit().await?;
        Ok(child)
    }

    pub async fn remove_child(&self, link: FamilyChildLink) -> ServiceResult<FamilyChild> {
        let mut conn = self.db.pool().acquire().await?;
        Self::remove_child_in(&mut conn, link).await
    }

    /// Must run inside a transaction: the family row stays locked until it
    /// ends, so concurrent links to the same family are checked one at a time.
    pub async fn add_parent_in(
        conn: &mut PgConnection,
        link: FamilyParentLink,
        user_id: Uuid,
    ) -> ServiceResult<FamilyParent> {
        Self::repo().lock(&mut *conn, link.family_id).await?;
        let opposite = Self::children()
            .find_where(
                &mut *conn,
                &json!({ "family_id": link.family_id.to_string(), "child_critter_id": link.parent_critter_id.to_string() }),
            )
            .await?;
        if !opposite.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "critter {} is already a child in family {}",
                link.parent_critter_id, link.family_id
            )));
        }
        let values = to_columns(&link)?;
        Ok(Self::parents().insert(conn, &values, user_id).await?)
    }

    /// Same locking as [`add_parent_in`](Self::add_parent_in)
    pub async fn add_child_in(
        conn: &mut PgConnection,
        link: FamilyChildLink,
        user_id: Uuid,
    ) -> ServiceResult<FamilyChild> {
        Self::repo().lock(&mut *conn, link.family_id).await?;
        let opposite = Self::parents()
            .find_where(
                &mut *conn,
                &json!({ "family_id": link.family_id.to_string(), "parent_critter_id": link.child_critter_id.to_string() }),
            )
            .await?;
        if !opposite.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "critter {} is already a parent in family {}",
                link.child_critter_id, link.family_id
            )));
        }
        let values = to_columns(&link)?;
        Ok(Self::children().insert(conn, &values, user_id).await?)
    }

    pub async fn remove_parent_in(conn: &mut PgConnection, link: FamilyParentLink) -> ServiceResult<FamilyParent> {
        let where_data = json!({
            "family_id": link.family_id.to_string(),
            "parent_critter_id": link.parent_critter_id.to_string(),
        });
        Self::parents()
            .delete_where(conn, &where_data)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "critter {} is not a parent in family {}",
                    link.parent_critter_id, link.family_id
                ))
            })
    }

    pub async fn remove_child_in(conn: &mut PgConnection, link: FamilyChildLink) -> ServiceResult<FamilyChild> {
        let where_data = json!({
            "family_id": link.family_id.to_string(),
            "child_critter_id": link.child_critter_id.to_string(),
        });
        Self::children()
            .delete_where(conn, &where_data)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "critter {} is not a child in family {}",
                    link.child_critter_id, link.family_id
                ))
            })
    }

    /// Every family the critter belongs to, as parent or child
    pub async fn families_of_critter(&self, critter_id: Uuid) -> ServiceResult<Vec<Family>> {
        let mut conn = self.db.pool().acquire().await?;
        let mut family_ids = BTreeSet::new();
        for p in Self::parents()
            .find_where(&mut *conn, &by_key("parent_critter_id", critter_id))
            .await?
        {
            family_ids.insert(p.family_id);
        }
        for c in Self::children()
            .find_where(&mut *conn, &by_key("child_critter_id", critter_id))
            .await?
        {
            family_ids.insert(c.family_id);
        }
        if family_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = family_ids.into_iter().collect();
        Ok(Self::repo()
            .find_where_ordered(&mut *conn, &by_keys("family_id", &ids), "family_label")
            .await?)
    }

    /// Parents and siblings through every family the critter is a child of,
    /// children through every family it is a parent of
    pub async fn immediate(&self, critter_id: Uuid) -> ServiceResult<ImmediateFamily> {
        let mut conn = self.db.pool().acquire().await?;

        let born_into: Vec<Uuid> = Self::children()
            .find_where(&mut *conn, &by_key("child_critter_id", critter_id))
            .await?
            .into_iter()
            .map(|c| c.family_id)
            .collect();
        let parented: Vec<Uuid> = Self::parents()
            .find_where(&mut *conn, &by_key("parent_critter_id", critter_id))
            .await?
            .into_iter()
            .map(|p| p.family_id)
            .collect();

        let mut parent_ids = BTreeSet::new();
        let mut sibling_ids = BTreeSet::new();
        if !born_into.is_empty() {
            for p in Self::parents()
                .find_where(&mut *conn, &by_keys("family_id", &born_into))
                .await?
            {
                parent_ids.insert(p.parent_critter_id);
            }
            for c in Self::children()
                .find_where(&mut *conn, &by_keys("family_id", &born_into))
                .await?
            {
                if c.child_critter_id != critter_id {
                    sibling_ids.insert(c.child_critter_id);
                }
            }
        }

        let mut child_ids = BTreeSet::new();
        if !parented.is_empty() {
            for c in Self::children()
                .find_where(&mut *conn, &by_keys("family_id", &parented))
                .await?
            {
                child_ids.insert(c.child_critter_id);
            }
        }

        Ok(ImmediateFamily {
            parents: critters(&mut conn, parent_ids.into_iter().collect()).await?,
            siblings: critters(&mut conn, sibling_ids.into_iter().collect()).await?,
            children: critters(&mut conn, child_ids.into_iter().collect()).await?,
        })
    }
}

async fn critters(conn: &mut PgConnection, ids: Vec<Uuid>) -> ServiceResult<Vec<Critter>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Repository::<Critter>::new()
        .find_where(conn, &by_keys("critter_id", &ids))
        .await?)
}
