//! Creation of the SDK client: password login on first start, session restore
//! afterwards.

use log::{debug, info};
use matrix_sdk::{Client, ruma::OwnedUserId};

use crate::matrix::{UserCredentials, session::SessionStore};

const DEVICE_NAME: &str = "bracket bot";

async fn build_client(user_id: &OwnedUserId, store: &SessionStore) -> anyhow::Result<Client> {
    let client = Client::builder()
        .server_name(user_id.server_name())
        .sqlite_store(store.sqlite_path(), None)
        .build()
        .await?;
    debug!("matrix client created");
    Ok(client)
}

async fn login(credentials: &UserCredentials, store: &SessionStore) -> anyhow::Result<Client> {
    info!("logging in as {}", credentials.user_id);

    let user_id: OwnedUserId = credentials.user_id.clone().try_into()?;
    let client = build_client(&user_id, store).await?;

    client
        .matrix_auth()
        .login_username(&user_id, &credentials.password)
        .initial_device_display_name(DEVICE_NAME)
        .send()
        .await?;

    let Some(user_session) = client.matrix_auth().session() else {
        anyhow::bail!("no session after login");
    };
    store.save_user_session(&user_session).await?;

    info!("logged in");
    Ok(client)
}

async fn restore(credentials: &UserCredentials, store: &SessionStore) -> anyhow::Result<Client> {
    info!("restoring matrix session from disk");

    let Some(user_session) = store.user_session() else {
        anyhow::bail!("no session to restore");
    };

    let user_id: OwnedUserId = credentials.user_id.clone().try_into()?;
    let client = build_client(&user_id, store).await?;
    client.restore_session(user_session.clone()).await?;

    info!("matrix session restored");
    Ok(client)
}

/// Returns a logged in client, restoring the stored session when there is one.
pub async fn setup_client(
    credentials: &UserCredentials,
    store: &SessionStore,
) -> anyhow::Result<Client> {
    if store.user_session().is_some() {
        restore(credentials, store).await
    } else {
        login(credentials, store).await
    }
}
