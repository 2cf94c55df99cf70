use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::UserRole;
use crate::entities::user;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateUser {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            role: model.role,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Loads every user in `ids`, keyed by id. Unknown ids are skipped.
    pub async fn find_by_ids<C: ConnectionTrait>(
        db: &C,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Self>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| (model.id, Self::from_model(model)))
            .collect())
    }

    pub async fn find_teams<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Team))
            .order_by_asc(user::Column::Name)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Returns the user only when it exists and has the `team` role.
    pub async fn find_team_member<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        Ok(Self::find_by_id(db, id)
            .await?
            .filter(|user| user.role == UserRole::Team))
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateUser) -> Result<Self, DbErr> {
        let active = user::ActiveModel {
            id: Set(data.id),
            name: Set(data.name.clone()),
            role: Set(data.role),
            created_at: Set(Utc::now().into()),
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db::setup_db;

    async fn insert(db: &sea_orm::DatabaseConnection, name: &str, role: UserRole) -> User {
        User::create(
            db,
            &CreateUser {
                id: Uuid::new_v4(),
                name: name.to_string(),
                role,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn find_teams_returns_only_team_members_sorted_by_name() {
        let db = setup_db().await;
        insert(&db, "Zoe", UserRole::Team).await;
        insert(&db, "John", UserRole::Lead).await;
        insert(&db, "Anne", UserRole::Team).await;

        let names: Vec<String> = User::find_teams(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.name)
            .collect();

        assert_eq!(names, vec!["Anne".to_string(), "Zoe".to_string()]);
    }

    #[tokio::test]
    async fn find_team_member_ignores_leads_and_unknown_ids() {
        let db = setup_db().await;
        let lead = insert(&db, "John", UserRole::Lead).await;
        let team = insert(&db, "Anne", UserRole::Team).await;

        assert!(User::find_team_member(&db, lead.id).await.unwrap().is_none());
        assert!(User::find_team_member(&db, Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(
            User::find_team_member(&db, team.id).await.unwrap().map(|u| u.id),
            Some(team.id)
        );
    }

    #[tokio::test]
    async fn find_by_ids_skips_unknown_ids() {
        let db = setup_db().await;
        let anne = insert(&db, "Anne", UserRole::Team).await;

        let users = User::find_by_ids(&db, &[anne.id, Uuid::new_v4()]).await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users.get(&anne.id).map(|u| u.name.as_str()), Some("Anne"));
        assert!(User::find_by_ids(&db, &[]).await.unwrap().is_empty());
    }
}
