//! services/client/src/flows/profile.rs
//!
//! Keeps the signed-in user's profile (and so the credit balance) fresh by
//! polling `/me` in a background task.

use crate::flows::state::AppState;
use lens_core::domain::UserProfile;
use lens_core::ports::SessionProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A running poll loop. Dropping the handle stops it.
pub struct ProfilePoller {
    cancel: CancellationToken,
    profile: watch::Receiver<Option<UserProfile>>,
    task: JoinHandle<()>,
}

impl ProfilePoller {
    /// Starts polling at the configured interval, beginning immediately.
    pub fn spawn(app: Arc<AppState>) -> Self {
        let period = app.config.profile_poll_interval;
        Self::spawn_every(app, period)
    }

    pub fn spawn_every(app: Arc<AppState>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (tx, profile) = watch::channel(None);
        let task = tokio::spawn(poll_loop(app, period, tx, cancel.clone()));
        Self {
            cancel,
            profile,
            task,
        }
    }

    /// The most recently fetched profile, if any.
    pub fn profile(&self) -> Option<UserProfile> {
        self.profile.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.profile.clone()
    }

    /// Stops the loop and waits for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!("Profile poller ended abnormally: {}", e);
        }
    }
}

impl Drop for ProfilePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One fetch at a time: the next tick is only awaited once the previous
/// request has finished, and ticks missed meanwhile are skipped.
async fn poll_loop(
    app: Arc<AppState>,
    period: Duration,
    tx: watch::Sender<Option<UserProfile>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Profile polling started every {:?}", period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if app.session.snapshot().is_guest() {
            tx.send_replace(None);
            continue;
        }

        let token = match app.session.id_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the session token: {}", e);
                continue;
            }
        };

        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            fetched = app.documents.me(token.as_deref()) => fetched,
        };
        match fetched {
            Ok(profile) => {
                debug!("Profile refreshed: {} credits", profile.credits);
                tx.send_replace(Some(profile));
            }
            Err(e) => warn!("Failed to refresh the profile: {}", e),
        }
    }

    info!("Profile polling stopped");
}
