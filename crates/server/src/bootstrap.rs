//! Master account initialization.

use crate::handlers::auth::hash_password;
use anyhow::{Result, bail};
use lantern_core::config::AuthConfig;
use lantern_metadata::MetadataStore;
use lantern_metadata::models::{ProfileRow, ROLE_MASTER};
use time::OffsetDateTime;
use uuid::Uuid;

/// Ensure the configured master profile exists.
///
/// Token administration requires a `master` session, so a fresh database
/// needs one account provisioned outside the signup flow. Idempotent: an
/// existing profile with the configured email is left untouched (including
/// its password), it only has to hold the master role.
pub async fn ensure_master_profile(metadata: &dyn MetadataStore, config: &AuthConfig) -> Result<()> {
    let (email, password) = match (&config.master_email, &config.master_password) {
        (Some(email), Some(password)) => (email, password),
        (None, None) => return Ok(()),
        _ => bail!("auth.master_email and auth.master_password must be set together"),
    };

    if let Some(existing) = metadata.get_profile_by_email(email).await? {
        if existing.role != ROLE_MASTER {
            bail!(
                "profile for {} exists but has role '{}'; refusing to escalate it",
                email,
                existing.role
            );
        }
        tracing::debug!("Master profile already exists");
        return Ok(());
    }

    let now = OffsetDateTime::now_utc();
    let profile = ProfileRow {
        user_id: Uuid::new_v4(),
        email: email.clone(),
        full_name: None,
        role: ROLE_MASTER.to_string(),
        avatar_url: None,
        password_hash: hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?,
        created_at: now,
        updated_at: now,
    };

    metadata.ensure_profile(&profile).await?;
    tracing::info!(user_id = %profile.user_id, "Master profile created");

    Ok(())
}
