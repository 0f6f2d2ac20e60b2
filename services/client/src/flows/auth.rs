//! services/client/src/flows/auth.rs
//!
//! Sign-in, sign-up and email verification against the identity provider.
//!
//! Passwords are checked against the local policy before the provider is
//! contacted. A session only becomes current once its email is verified.

use crate::flows::session::SessionHandle;
use lens_core::domain::{AuthUser, Notification};
use lens_core::password::{check_password, PasswordPolicyError, PASSWORD_REQUIREMENTS};
use lens_core::ports::{FederatedCredential, IdentityService, PortError};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{}", PASSWORD_REQUIREMENTS)]
    WeakPassword(PasswordPolicyError),
    #[error("{0}")]
    Provider(String),
    #[error("Could not update the session: {0}")]
    Session(PortError),
}

impl AuthError {
    pub fn notification(&self) -> Notification {
        Notification::error("Error", self.to_string())
    }

    fn from_provider(e: PortError, fallback: &str) -> Self {
        let message = match e.detail() {
            Some(detail) => detail.to_string(),
            None => {
                warn!("{}: {}", fallback, e);
                fallback.to_string()
            }
        };
        AuthError::Provider(message)
    }
}

/// A signed-out account that still has to confirm its email address.
///
/// Holds the token needed to send another verification link.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    pub email: Option<String>,
    id_token: String,
}

#[derive(Debug, Clone)]
pub enum AuthOutcome {
    SignedIn {
        user: AuthUser,
        notification: Notification,
    },
    /// A new account was created and signed out until it is verified.
    VerificationSent { notification: Notification },
    /// The credentials were right but the email is unverified.
    Unverified {
        pending: PendingVerification,
        notification: Notification,
    },
}

impl AuthOutcome {
    pub fn notification(&self) -> &Notification {
        match self {
            AuthOutcome::SignedIn { notification, .. }
            | AuthOutcome::VerificationSent { notification }
            | AuthOutcome::Unverified { notification, .. } => notification,
        }
    }
}

/// Email/password sign-in.
pub async fn sign_in(
    identity: &dyn IdentityService,
    session: &SessionHandle,
    email: &str,
    password: &str,
) -> Result<AuthOutcome, AuthError> {
    check_password(password).map_err(AuthError::WeakPassword)?;

    let issued = identity
        .sign_in_with_password(email, password)
        .await
        .map_err(|e| AuthError::from_provider(e, "Authentication failed"))?;

    if !issued.user.email_verified {
        info!("Sign-in refused for unverified account {}", issued.user.uid);
        session.clear().map_err(AuthError::Session)?;
        return Ok(AuthOutcome::Unverified {
            pending: PendingVerification {
                email: issued.user.email.clone(),
                id_token: issued.id_token,
            },
            notification: Notification::warning(
                "Email not verified",
                "Please verify your email before logging in.",
            ),
        });
    }

    session.resolve(&issued).map_err(AuthError::Session)?;
    Ok(AuthOutcome::SignedIn {
        user: issued.user,
        notification: Notification::success("Welcome!", "Logged in successfully"),
    })
}

/// Creates an account, sends the verification email, and signs straight out.
pub async fn sign_up(
    identity: &dyn IdentityService,
    session: &SessionHandle,
    email: &str,
    password: &str,
) -> Result<AuthOutcome, AuthError> {
    check_password(password).map_err(AuthError::WeakPassword)?;

    let issued = identity
        .sign_up_with_password(email, password)
        .await
        .map_err(|e| AuthError::from_provider(e, "Authentication failed"))?;

    identity
        .send_verification_email(&issued.id_token)
        .await
        .map_err(|e| AuthError::from_provider(e, "Failed to send verification email"))?;
    session.clear().map_err(AuthError::Session)?;

    info!("Account {} created; verification email sent", issued.user.uid);
    Ok(AuthOutcome::VerificationSent {
        notification: Notification::info(
            "Verify your email",
            "A verification link has been sent to your email. Please verify before logging in.",
        ),
    })
}

/// Sign-in with a credential from a federated identity provider.
pub async fn sign_in_federated(
    identity: &dyn IdentityService,
    session: &SessionHandle,
    credential: &FederatedCredential,
) -> Result<AuthOutcome, AuthError> {
    let issued = identity
        .sign_in_federated(credential)
        .await
        .map_err(|e| {
            warn!("Federated sign-in failed: {}", e);
            AuthError::Provider(format!(
                "Failed to sign in with {}. Please try again.",
                provider_label(&credential.provider_id)
            ))
        })?;

    session.resolve(&issued).map_err(AuthError::Session)?;
    Ok(AuthOutcome::SignedIn {
        notification: Notification::success(
            "Welcome!",
            format!("Successfully signed in with {}", provider_label(&credential.provider_id)),
        ),
        user: issued.user,
    })
}

/// Sends another verification link to an account that is not verified yet.
pub async fn resend_verification(
    identity: &dyn IdentityService,
    pending: &PendingVerification,
) -> Result<Notification, AuthError> {
    identity
        .send_verification_email(&pending.id_token)
        .await
        .map_err(|e| AuthError::from_provider(e, "Failed to resend verification email"))?;
    Ok(Notification::success(
        "Verification email sent",
        "Check your inbox for a new verification link.",
    ))
}

pub fn sign_out(session: &SessionHandle) -> Result<Notification, AuthError> {
    session.clear().map_err(AuthError::Session)?;
    Ok(Notification::info("Signed out", "You have been signed out."))
}

fn provider_label(provider_id: &str) -> &str {
    match provider_id {
        "google.com" => "Google",
        "github.com" => "GitHub",
        "microsoft.com" => "Microsoft",
        "apple.com" => "Apple",
        other => other,
    }
}
