use sqlx::PgPool;
use tracing::info;

use crate::auth::password::hash_password;
use crate::config::BootstrapConfig;
use crate::users::repo::User;

/// Idempotently creates the configured admin and demo accounts.
pub async fn ensure_bootstrap_users(db: &PgPool, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    ensure_user(
        db,
        &bootstrap.admin_email,
        &bootstrap.admin_password,
        &bootstrap.admin_full_name,
        true,
    )
    .await?;
    ensure_user(
        db,
        &bootstrap.demo_email,
        &bootstrap.demo_password,
        &bootstrap.demo_full_name,
        false,
    )
    .await?;
    Ok(())
}

async fn ensure_user(
    db: &PgPool,
    email: &str,
    password: &str,
    full_name: &str,
    is_admin: bool,
) -> anyhow::Result<()> {
    if User::find_by_email(db, email).await?.is_some() {
        info!(email, "bootstrap user already exists");
        return Ok(());
    }

    let hash = hash_password(password)?;
    let user = User::create(db, email, &hash, full_name, is_admin).await?;
    info!(user_id = %user.id, email, is_admin, "bootstrap user created");
    Ok(())
}
