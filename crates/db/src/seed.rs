use sea_orm::{ConnectionTrait, DbErr};
use uuid::{Uuid, uuid};

use crate::{
    models::user::{CreateUser, User},
    types::UserRole,
};

pub const DEMO_LEAD_ID: Uuid = uuid!("407bdd34-6b7c-44d5-81b1-e7926f447f1a");
pub const DEMO_TEAM_ID: Uuid = uuid!("e8157de0-e552-459d-9573-09403c597d1f");

fn demo_users() -> [CreateUser; 2] {
    [
        CreateUser {
            id: DEMO_LEAD_ID,
            name: "John".to_string(),
            role: UserRole::Lead,
        },
        CreateUser {
            id: DEMO_TEAM_ID,
            name: "Anne".to_string(),
            role: UserRole::Team,
        },
    ]
}

/// Inserts the demo lead and team member. Existing rows are left untouched,
/// so running it twice is harmless. Returns how many users were inserted.
pub async fn seed_demo_users<C: ConnectionTrait>(db: &C) -> Result<usize, DbErr> {
    let mut inserted = 0;
    for user in demo_users() {
        if User::find_by_id(db, user.id).await?.is_some() {
            tracing::debug!(user_id = %user.id, "Demo user already present");
            continue;
        }
        User::create(db, &user).await?;
        tracing::info!(
            user_id = %user.id,
            name = %user.name,
            role = %user.role,
            "Seeded demo user"
        );
        inserted += 1;
    }
    Ok(inserted)
}
