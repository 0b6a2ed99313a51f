//! Sign-up, sign-in and session restoration.

use log::*;

use crate::{
    data_objects::{Credentials, NewUser, User},
    errors::ClientError,
    state::{SessionRecord, StateStore},
    traits::StorefrontBackend,
};

/// Account and session operations.
///
/// A successful sign-in does three things atomically from the caller's point of view: the bearer token goes live
/// on the backend handle, the token and profile land in the state store, and the profile comes back to the
/// caller. Sign-out reverses all of it, including any queue or club markers left over from an interrupted flow.
pub struct SessionApi<B> {
    backend: B,
    store: StateStore,
}

impl<B> SessionApi<B>
where B: StorefrontBackend + Sync
{
    pub fn new(backend: B, store: StateStore) -> Self {
        Self { backend, store }
    }

    /// Signs in with `credentials`. On success the token is active and persisted, and the signed-in profile is
    /// returned. A bad password surfaces as [`ClientError::Auth`] with the server's message.
    pub async fn login(&self, credentials: Credentials) -> Result<User, ClientError> {
        let token = self.backend.login(&credentials).await?;
        self.backend.set_bearer_token(Some(token.access_token.clone())).await;
        let user = self.backend.me().await?;
        self.store.set_session(SessionRecord { token: token.access_token, user: user.clone() })?;
        info!("🔑 Signed in as {}", user.email);
        Ok(user)
    }

    /// Registers a new account and signs straight in with the same credentials.
    pub async fn register(&self, new_user: NewUser) -> Result<User, ClientError> {
        let credentials = Credentials { email: new_user.email.clone(), password: new_user.password.clone() };
        let user = self.backend.register(&new_user).await?;
        debug!("Registered account for {}", user.email);
        self.login(credentials).await
    }

    /// Revalidates a stored session. Returns the signed-in profile, or `None` when nothing is stored. A token the
    /// server no longer accepts is treated like a sign-out, not an error: the stored state is wiped and `None`
    /// comes back.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        let Some(record) = self.store.session()? else {
            return Ok(None);
        };
        self.backend.set_bearer_token(Some(record.token.clone())).await;
        match self.backend.me().await {
            Ok(user) => {
                if user != record.user {
                    // The profile was edited elsewhere. Keep the token, refresh the snapshot.
                    self.store.set_session(SessionRecord { token: record.token, user: user.clone() })?;
                }
                debug!("Restored session for {}", user.email);
                Ok(Some(user))
            },
            Err(e) if e.is_auth() => {
                warn!("The stored session is no longer valid. Signing out");
                self.backend.set_bearer_token(None).await;
                self.store.reset()?;
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    /// Signs out, dropping the bearer token and every persisted marker.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.backend.set_bearer_token(None).await;
        self.store.reset()?;
        info!("🔒 Signed out");
        Ok(())
    }

    /// The locally stored profile, if any. Does not touch the network, so it can be stale.
    pub fn current_user(&self) -> Result<Option<User>, ClientError> {
        Ok(self.store.session()?.map(|record| record.user))
    }
}
