use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, Registration, SeaOrmAuthService};

pub async fn cmd_create_superuser(
    config: &Config,
    email: String,
    first_name: String,
    last_name: String,
    password: String,
) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let auth = SeaOrmAuthService::new(store, config);

    let registration = Registration {
        email: Some(email),
        first_name: Some(first_name),
        last_name: Some(last_name),
        password2: Some(password.clone()),
        password: Some(password),
    };

    match auth.create_superuser(registration).await {
        Ok(user) => {
            println!("✓ Superuser created: {} ({})", user.email, user.id);
            Ok(())
        }
        Err(AuthError::Validation(errors)) => {
            anyhow::bail!("Superuser not created: {errors}")
        }
        Err(e) => Err(e.into()),
    }
}
