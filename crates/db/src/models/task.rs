use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    audit_log::{AuditLog, AuditLogWithUser, FieldChange, TaskChanges, TaskSnapshot},
    user::User,
};
pub use crate::types::{AuditAction, TaskStatus, UserRole};
use crate::entities::task;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Team member not found: {0}")]
    TeamMemberNotFound(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub lead_id: Uuid,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskWithTeam {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub team: Option<User>,
}

impl std::ops::Deref for TaskWithTeam {
    type Target = Task;
    fn deref(&self) -> &Self::Target {
        &self.task
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: Task,
    pub team: Option<User>,
    pub audit_logs: Vec<AuditLogWithUser>,
}

/// Rows a caller may see: leads see the tasks they own, team members the
/// tasks assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    Lead(Uuid),
    Team(Uuid),
}

impl TaskScope {
    pub fn for_user(user_id: Uuid, role: UserRole) -> Self {
        match role {
            UserRole::Lead => TaskScope::Lead(user_id),
            UserRole::Team => TaskScope::Team(user_id),
        }
    }

    fn apply<Q: QueryFilter>(self, query: Q) -> Q {
        match self {
            TaskScope::Lead(user_id) => query.filter(task::Column::LeadId.eq(user_id)),
            TaskScope::Team(user_id) => query.filter(task::Column::TeamId.eq(user_id)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub team_id: Option<Uuid>,
}

impl CreateTask {
    /// Validated, normalized form of the payload as it will be stored.
    pub fn snapshot(&self) -> Result<TaskSnapshot, TaskError> {
        Ok(TaskSnapshot {
            name: normalize_name(&self.name)?,
            description: normalize_description(self.description.clone()),
            status: self.status.unwrap_or_default(),
            team_id: self.team_id,
        })
    }
}

/// Partial update. Omitted fields are left alone; `description` and
/// `team_id` accept an explicit `null` to clear them, `name` and `status`
/// reject it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    #[serde(default, deserialize_with = "deserialize_non_null")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_non_null")]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub team_id: Option<Option<Uuid>>,
}

impl UpdateTask {
    /// Diffs the patch against the stored task. Fields equal to the stored
    /// value are not changes.
    pub fn diff(&self, existing: &Task) -> Result<TaskChanges, TaskError> {
        let name = match &self.name {
            Some(name) => FieldChange::between(existing.name.clone(), normalize_name(name)?),
            None => None,
        };
        let description = self.description.clone().and_then(|description| {
            FieldChange::between(
                existing.description.clone(),
                normalize_description(description),
            )
        });
        let status = self
            .status
            .and_then(|status| FieldChange::between(existing.status, status));
        let team_id = self
            .team_id
            .and_then(|team_id| FieldChange::between(existing.team_id, team_id));

        Ok(TaskChanges {
            name,
            description,
            status,
            team_id,
        })
    }
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn deserialize_non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn normalize_name(name: &str) -> Result<String, TaskError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TaskError::ValidationError(
            "Task name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

async fn ensure_team_member<C: ConnectionTrait>(db: &C, team_id: Uuid) -> Result<(), TaskError> {
    match User::find_team_member(db, team_id).await? {
        Some(_) => Ok(()),
        None => Err(TaskError::TeamMemberNotFound(team_id)),
    }
}

impl Task {
    fn from_model(model: task::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            status: model.status,
            lead_id: model.lead_id,
            team_id: model.team_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    async fn with_team<C: ConnectionTrait>(
        db: &C,
        tasks: Vec<Self>,
    ) -> Result<Vec<TaskWithTeam>, DbErr> {
        let mut team_ids: Vec<Uuid> = tasks.iter().filter_map(|task| task.team_id).collect();
        team_ids.sort_unstable();
        team_ids.dedup();
        let teams = User::find_by_ids(db, &team_ids).await?;

        Ok(tasks
            .into_iter()
            .map(|task| {
                let team = task.team_id.and_then(|id| teams.get(&id).cloned());
                TaskWithTeam { task, team }
            })
            .collect())
    }

    pub async fn find_in_scope<C: ConnectionTrait>(
        db: &C,
        scope: TaskScope,
    ) -> Result<Vec<TaskWithTeam>, DbErr> {
        let models = scope
            .apply(task::Entity::find())
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;

        let tasks = models.into_iter().map(Self::from_model).collect();
        Self::with_team(db, tasks).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_id_in_scope<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        scope: TaskScope,
    ) -> Result<Option<Self>, DbErr> {
        let record = scope
            .apply(task::Entity::find().filter(task::Column::Id.eq(id)))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn detail<C: ConnectionTrait>(self, db: &C) -> Result<TaskDetail, DbErr> {
        let team = match self.team_id {
            Some(team_id) => User::find_by_id(db, team_id).await?,
            None => None,
        };
        let audit_logs = AuditLog::find_by_task_id_with_user(db, self.id).await?;

        Ok(TaskDetail {
            task: self,
            team,
            audit_logs,
        })
    }

    /// Inserts a task owned by `lead_id` together with its `create` audit row.
    pub async fn create<C>(db: &C, lead_id: Uuid, data: &CreateTask) -> Result<Self, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let snapshot = data.snapshot()?;

        let tx = db.begin().await?;
        if let Some(team_id) = snapshot.team_id {
            ensure_team_member(&tx, team_id).await?;
        }

        let now = Utc::now();
        let active = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(snapshot.name.clone()),
            description: Set(snapshot.description.clone()),
            status: Set(snapshot.status),
            lead_id: Set(lead_id),
            team_id: Set(snapshot.team_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let model = active.insert(&tx).await?;
        AuditLog::record(&tx, model.id, lead_id, AuditAction::Create, &snapshot).await?;
        tx.commit().await?;

        Ok(Self::from_model(model))
    }

    /// Applies `changes` to task `id` and records one `update` audit row
    /// attributed to `actor_id`. `changes` must not be empty.
    pub async fn update<C>(
        db: &C,
        id: Uuid,
        actor_id: Uuid,
        changes: &TaskChanges,
    ) -> Result<Self, TaskError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        if changes.is_empty() {
            return Err(TaskError::ValidationError("No changes to apply".to_string()));
        }

        let tx = db.begin().await?;
        let record = task::Entity::find_by_id(id)
            .one(&tx)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        if let Some(FieldChange {
            new_value: Some(team_id),
            ..
        }) = &changes.team_id
        {
            ensure_team_member(&tx, *team_id).await?;
        }

        let mut active: task::ActiveModel = record.into();
        if let Some(change) = &changes.name {
            active.name = Set(change.new_value.clone());
        }
        if let Some(change) = &changes.description {
            active.description = Set(change.new_value.clone());
        }
        if let Some(change) = &changes.status {
            active.status = Set(change.new_value);
        }
        if let Some(change) = &changes.team_id {
            active.team_id = Set(change.new_value);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&tx).await?;
        AuditLog::record(&tx, id, actor_id, AuditAction::Update, changes).await?;
        tx.commit().await?;

        Ok(Self::from_model(updated))
    }

    /// Deletes task `id` if it is owned by `lead_id`; its audit rows go with it
    /// through the foreign-key cascade. Returns the number of tasks removed, so
    /// 0 means absent or not owned.
    pub async fn delete_owned<C>(db: &C, id: Uuid, lead_id: Uuid) -> Result<u64, DbErr>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let tx = db.begin().await?;
        let owned = task::Entity::find_by_id(id)
            .filter(task::Column::LeadId.eq(lead_id))
            .one(&tx)
            .await?;
        if owned.is_none() {
            return Ok(0);
        }

        let result = task::Entity::delete_many()
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::LeadId.eq(lead_id))
            .exec(&tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected)
    }
}
