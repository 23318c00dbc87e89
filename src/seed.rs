use entity::user::{self, Role};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::db::queries;

/// What `bootstrap` did with the admin user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedAction {
    Created,
    Promoted,
    AlreadyAdmin,
}

/// Result of a bootstrap/seed operation.
#[derive(Debug)]
pub struct SeedResult {
    pub user_id: String,
    pub action: SeedAction,
}

/// Create or promote the admin user.
///
/// `admin_name` is only used when the user doesn't exist yet and defaults
/// to "Admin".
pub async fn bootstrap(
    db: &DatabaseConnection,
    admin_email: &str,
    admin_name: Option<&str>,
) -> Result<SeedResult, Box<dyn std::error::Error>> {
    let existing = queries::users::find_by_email(db, admin_email).await?;

    let (user_id, action) = match existing {
        Some(found) if found.is_admin() => (found.id, SeedAction::AlreadyAdmin),
        Some(found) => {
            let mut active: user::ActiveModel = found.into();
            active.role = Set(Role::Admin);
            active.updated_at = Set(chrono::Utc::now().naive_utc());
            let promoted = active.update(db).await?;
            (promoted.id, SeedAction::Promoted)
        }
        None => {
            let name = admin_name.unwrap_or("Admin");
            let created = queries::users::insert(db, name, admin_email, Role::Admin).await?;
            (created.id, SeedAction::Created)
        }
    };

    tracing::info!(user_id = %user_id, ?action, "Admin user bootstrapped");

    Ok(SeedResult { user_id, action })
}
