use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::user::User;
pub use crate::types::{AuditAction, TaskStatus};
use crate::entities::audit_log;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct FieldChange<T> {
    pub old_value: T,
    pub new_value: T,
}

impl<T: PartialEq> FieldChange<T> {
    /// `None` when the value did not actually change.
    pub fn between(old_value: T, new_value: T) -> Option<Self> {
        (old_value != new_value).then_some(Self {
            old_value,
            new_value,
        })
    }
}

/// Field-level diff of a task update. Only changed fields are present, and
/// only those are serialized into the audit row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TaskChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<FieldChange<Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FieldChange<TaskStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<FieldChange<Option<Uuid>>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.team_id.is_none()
    }

    /// Changed fields that only the owning lead may edit.
    pub fn lead_only_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.team_id.is_some() {
            fields.push("team_id");
        }
        fields
    }
}

/// Audit payload of a create: the task as it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TaskSnapshot {
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuditLog {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub changes: String,
    pub created_at: DateTime<Utc>,
}

/// Audit entry as shown on the task detail, with the acting user inlined.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuditLogWithUser {
    pub id: Uuid,
    pub user: User,
    pub action: AuditAction,
    pub changes: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    fn from_model(model: audit_log::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            user_id: model.user_id,
            action: model.action,
            changes: model.changes,
            created_at: model.created_at.into(),
        }
    }

    /// Appends an audit row. Call it on the same transaction as the task write.
    pub async fn record<C, T>(
        db: &C,
        task_id: Uuid,
        user_id: Uuid,
        action: AuditAction,
        changes: &T,
    ) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
        T: Serialize,
    {
        let changes =
            serde_json::to_string(changes).map_err(|err| DbErr::Custom(err.to_string()))?;

        let active = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            task_id: Set(task_id),
            user_id: Set(user_id),
            action: Set(action),
            changes: Set(changes),
            created_at: Set(Utc::now().into()),
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = audit_log::Entity::find()
            .filter(audit_log::Column::TaskId.eq(task_id))
            .order_by_asc(audit_log::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_task_id_with_user<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Vec<AuditLogWithUser>, DbErr> {
        let logs = Self::find_by_task_id(db, task_id).await?;

        let mut user_ids: Vec<Uuid> = logs.iter().map(|log| log.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let users = User::find_by_ids(db, &user_ids).await?;

        logs.into_iter()
            .map(|log| {
                let user = users.get(&log.user_id).cloned().ok_or_else(|| {
                    DbErr::RecordNotFound(format!("User {} not found", log.user_id))
                })?;
                Ok(AuditLogWithUser {
                    id: log.id,
                    user,
                    action: log.action,
                    changes: log.changes,
                    created_at: log.created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_change_is_none_for_equal_values() {
        assert!(FieldChange::between("a".to_string(), "a".to_string()).is_none());
        assert_eq!(
            FieldChange::between(None, Some(3)),
            Some(FieldChange {
                old_value: None,
                new_value: Some(3)
            })
        );
    }

    #[test]
    fn only_changed_fields_are_serialized() {
        let changes = TaskChanges {
            status: FieldChange::between(TaskStatus::NotStarted, TaskStatus::Done),
            description: FieldChange::between(Some("old".to_string()), None),
            ..Default::default()
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&changes).unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "description": { "old_value": "old", "new_value": null },
                "status": { "old_value": "not_started", "new_value": "done" }
            })
        );
    }

    #[test]
    fn lead_only_fields_cover_name_and_assignment() {
        let team = Uuid::new_v4();
        let changes = TaskChanges {
            name: FieldChange::between("a".to_string(), "b".to_string()),
            team_id: FieldChange::between(None, Some(team)),
            status: FieldChange::between(TaskStatus::NotStarted, TaskStatus::OnProgress),
            ..Default::default()
        };

        assert_eq!(changes.lead_only_fields(), vec!["name", "team_id"]);
        assert!(TaskChanges::default().is_empty());
        assert!(TaskChanges::default().lead_only_fields().is_empty());
    }
}
