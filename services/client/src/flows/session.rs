//! services/client/src/flows/session.rs
//!
//! Holds the identity session the rest of the client reads from.
//!
//! The session starts out loading. It resolves once, either from a session
//! persisted by an earlier run or because the identity provider reported a
//! sign-in or sign-out. Every change is published on a `watch` channel.

use async_trait::async_trait;
use lens_core::domain::{AuthUser, SessionSnapshot};
use lens_core::ports::{IssuedSession, KeyValueStore, PortResult, SessionProvider};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info};

const UID_KEY: &str = "lens.session.uid";
const EMAIL_KEY: &str = "lens.session.email";
const VERIFIED_KEY: &str = "lens.session.emailVerified";
const TOKEN_KEY: &str = "lens.session.idToken";

pub struct SessionHandle {
    state: watch::Sender<SessionSnapshot>,
    token: Mutex<Option<String>>,
    store: Arc<dyn KeyValueStore>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::resolving());
        Self {
            state,
            token: Mutex::new(None),
            store,
        }
    }

    /// Resolves the session from storage. Only verified sessions come back.
    pub fn restore(&self) -> PortResult<()> {
        let uid = self.store.get(UID_KEY)?;
        let token = self.store.get(TOKEN_KEY)?;
        let verified = self.store.get(VERIFIED_KEY)?.as_deref() == Some("true");

        match (uid, token) {
            (Some(uid), Some(token)) if verified => {
                let user = AuthUser {
                    uid,
                    email: self.store.get(EMAIL_KEY)?,
                    email_verified: true,
                };
                debug!("Restored session for {}", user.uid);
                self.publish(Some(token), SessionSnapshot::signed_in(user));
            }
            _ => self.publish(None, SessionSnapshot::signed_out()),
        }
        Ok(())
    }

    /// Makes `issued` the current session and persists it.
    pub fn resolve(&self, issued: &IssuedSession) -> PortResult<()> {
        let user = &issued.user;
        let verified = if user.email_verified { "true" } else { "false" };
        let mut record = vec![
            (UID_KEY, user.uid.as_str()),
            (VERIFIED_KEY, verified),
            (TOKEN_KEY, issued.id_token.as_str()),
        ];
        match &user.email {
            Some(email) => record.push((EMAIL_KEY, email.as_str())),
            None => self.store.remove(EMAIL_KEY)?,
        }
        self.store.set_many(&record)?;

        info!("Session resolved for {}", user.uid);
        self.publish(
            Some(issued.id_token.clone()),
            SessionSnapshot::signed_in(user.clone()),
        );
        Ok(())
    }

    /// Signs out: forgets the persisted session and publishes the change.
    pub fn clear(&self) -> PortResult<()> {
        for key in [UID_KEY, EMAIL_KEY, VERIFIED_KEY, TOKEN_KEY] {
            self.store.remove(key)?;
        }
        info!("Session cleared");
        self.publish(None, SessionSnapshot::signed_out());
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Waits until the session is no longer loading.
    pub async fn resolved(&self) -> SessionSnapshot {
        let mut rx = self.state.subscribe();
        let resolved = rx.wait_for(|s| !s.loading).await.map(|s| s.clone());
        resolved.unwrap_or_else(|_| self.snapshot())
    }

    fn publish(&self, token: Option<String>, snapshot: SessionSnapshot) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token;
        self.state.send_replace(snapshot);
    }
}

#[async_trait]
impl SessionProvider for SessionHandle {
    fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    async fn id_token(&self) -> PortResult<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}
