//! Sign-in, sign-up and session tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::NewProfile;
use crate::store::FasalStore;
use crate::types::{FasalError, Language};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    /// Opaque bearer token; persisted locally to resume the session.
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and signs it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, FasalError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, FasalError>;

    /// Ends the current session, if any, and publishes `None`.
    async fn sign_out(&self) -> Result<(), FasalError>;

    /// Resumes a session from a stored token. `Ok(None)` when the token is
    /// unknown or revoked.
    async fn restore(&self, token: &str) -> Result<Option<Session>, FasalError>;

    fn current_session(&self) -> Option<Session>;

    /// Session-change notifications.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Holder for the current session that identity implementations share.
#[derive(Debug)]
pub struct SessionCell {
    sender: watch::Sender<Option<Session>>,
}

impl Default for SessionCell {
    fn default() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }
}

impl SessionCell {
    pub fn set(&self, session: Option<Session>) {
        self.sender.send_replace(session);
    }

    pub fn current(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }
}

/// Normalises an e-mail address and checks the password length.
pub fn validate_credentials(email: &str, password: &str) -> Result<String, FasalError> {
    let email = email.trim().to_lowercase();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(FasalError::invalid_input("email", &email, "error-email-invalid", "Identity"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FasalError::invalid_input(
            "password",
            "***",
            "error-password-too-short",
            "Identity",
        ));
    }
    Ok(email)
}

/// Signs up and creates the matching profile row.
///
/// The account is usable even when the profile insert fails; that failure
/// is only logged.
pub async fn register(
    identity: &dyn IdentityProvider,
    store: &dyn FasalStore,
    email: &str,
    password: &str,
    full_name: &str,
    language: Language,
) -> Result<Session, FasalError> {
    let session = identity.sign_up(email, password).await?;

    let profile = NewProfile {
        id: session.user_id,
        full_name: full_name.trim().to_string(),
        email: session.email.clone(),
        preferred_language: language,
    };
    match store.insert_profile(profile).await {
        Ok(_) => info!(user_id = %session.user_id, "Account registered"),
        Err(e) => error!(error = %e, user_id = %session.user_id, "Error creating profile"),
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    /// Accepts any well-formed credentials; keeps nothing but the session.
    #[derive(Default)]
    struct OpenIdentity {
        cell: SessionCell,
        issued: Mutex<Vec<Session>>,
        fixed_id: Option<Uuid>,
    }

    #[async_trait]
    impl IdentityProvider for OpenIdentity {
        async fn sign_up(&self, email: &str, password: &str) -> Result<Session, FasalError> {
            let email = validate_credentials(email, password)?;
            let session = Session {
                user_id: self.fixed_id.unwrap_or_else(Uuid::new_v4),
                email,
                token: Uuid::new_v4().to_string(),
                issued_at: Utc::now(),
            };
            self.issued.lock().unwrap().push(session.clone());
            self.cell.set(Some(session.clone()));
            Ok(session)
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, FasalError> {
            self.sign_up(email, password).await
        }

        async fn sign_out(&self) -> Result<(), FasalError> {
            self.cell.set(None);
            Ok(())
        }

        async fn restore(&self, token: &str) -> Result<Option<Session>, FasalError> {
            Ok(self.issued.lock().unwrap().iter().find(|s| s.token == token).cloned())
        }

        fn current_session(&self) -> Option<Session> {
            self.cell.current()
        }

        fn subscribe(&self) -> watch::Receiver<Option<Session>> {
            self.cell.subscribe()
        }
    }

    #[test]
    fn test_validate_credentials() {
        assert_eq!(validate_credentials(" Asha@Example.IN ", "secret1").unwrap(), "asha@example.in");
        assert_eq!(
            validate_credentials("asha", "secret1").unwrap_err().reason_key(),
            "error-email-invalid"
        );
        assert_eq!(
            validate_credentials("asha@example.in", "123").unwrap_err().reason_key(),
            "error-password-too-short"
        );
    }

    #[tokio::test]
    async fn test_register_creates_profile() {
        let identity = OpenIdentity::default();
        let store = MemoryStore::new();
        let session = register(&identity, &store, "asha@example.in", "secret1", " Asha Patil ", Language::Mr)
            .await
            .unwrap();

        let profile = store.get_profile(session.user_id).await.unwrap().unwrap();
        assert_eq!(profile.full_name, "Asha Patil");
        assert_eq!(profile.preferred_language, Language::Mr);
        assert_eq!(identity.current_session().map(|s| s.user_id), Some(session.user_id));
    }

    #[tokio::test]
    async fn test_register_survives_profile_failure() {
        let taken = Uuid::new_v4();
        let store = MemoryStore::new();
        store
            .insert_profile(NewProfile {
                id: taken,
                full_name: "Existing".into(),
                email: "existing@example.in".into(),
                preferred_language: Language::En,
            })
            .await
            .unwrap();
        let identity = OpenIdentity {
            fixed_id: Some(taken),
            ..Default::default()
        };

        // The profile row already exists, so the insert fails; sign-up stands.
        let session = register(&identity, &store, "a@b.in", "secret1", "A", Language::Hi).await.unwrap();
        assert_eq!(session.user_id, taken);
        let profile = store.get_profile(taken).await.unwrap().unwrap();
        assert_eq!(profile.full_name, "Existing");
    }

    #[tokio::test]
    async fn test_session_channel() {
        let identity = OpenIdentity::default();
        let mut rx = identity.subscribe();
        identity.sign_in("ravi@example.in", "secret1").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        identity.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
