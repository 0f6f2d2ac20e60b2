//! services/client/src/adapters/identity.rs
//!
//! This module contains the identity provider adapter. It implements the
//! `IdentityService` port against the provider's `accounts:*` REST API
//! (email/password sign-in and sign-up, federated sign-in, verification email).

use async_trait::async_trait;
use lens_core::domain::AuthUser;
use lens_core::ports::{FederatedCredential, IdentityService, IssuedSession, PortError, PortResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `IdentityService` over the identity toolkit REST API.
#[derive(Clone)]
pub struct IdentityToolkitAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IdentityToolkitAdapter {
    /// Creates a new `IdentityToolkitAdapter`.
    pub fn new(client: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, method, self.api_key)
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> PortResult<T> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let code = response
                .json::<ProviderErrorRecord>()
                .await
                .map(|record| record.error.message)
                .unwrap_or_default();
            warn!("Identity provider rejected accounts:{} with {}: {}", method, status, code);
            return Err(PortError::Rejected {
                status: status.as_u16(),
                detail: Some(describe_provider_error(&code)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed identity response: {}", e)))
    }

    /// Fetches the account behind a token, which is where the verified flag lives.
    async fn lookup(&self, id_token: &str) -> PortResult<AccountRecord> {
        let record: LookupRecord = self.call("lookup", &TokenRequest { id_token }).await?;
        record
            .users
            .into_iter()
            .next()
            .ok_or(PortError::Unauthorized)
    }
}

/// Maps provider error codes to text a user can act on.
pub fn describe_provider_error(code: &str) -> String {
    // Codes sometimes carry a suffix: "WEAK_PASSWORD : Password should be ..."
    let key = code.split(':').next().unwrap_or("").trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password".to_string()
        }
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "EMAIL_EXISTS" => "An account with this email already exists".to_string(),
        "INVALID_EMAIL" => "Please enter a valid email address".to_string(),
        "WEAK_PASSWORD" => "Password is too weak".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Too many attempts. Please try again later.".to_string()
        }
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => {
            "Your session has expired. Please sign in again.".to_string()
        }
        "" => "Authentication failed".to_string(),
        other => format!("Authentication failed ({})", other),
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    id_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRecord {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    email_verified: Option<bool>,
}

#[derive(Deserialize)]
struct LookupRecord {
    #[serde(default)]
    users: Vec<AccountRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    #[serde(default)]
    email_verified: bool,
}

#[derive(Deserialize)]
struct ProviderErrorRecord {
    error: ProviderErrorBody,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

impl TokenRecord {
    fn into_session(self, email_verified: bool) -> IssuedSession {
        IssuedSession {
            user: AuthUser {
                uid: self.local_id,
                email: self.email,
                email_verified,
            },
            id_token: self.id_token,
        }
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for IdentityToolkitAdapter {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<IssuedSession> {
        let record: TokenRecord = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let account = self.lookup(&record.id_token).await?;
        info!("Signed in {}", record.local_id);
        Ok(record.into_session(account.email_verified))
    }

    async fn sign_up_with_password(&self, email: &str, password: &str) -> PortResult<IssuedSession> {
        let record: TokenRecord = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        info!("Created account {}", record.local_id);
        Ok(record.into_session(false))
    }

    async fn sign_in_federated(&self, credential: &FederatedCredential) -> PortResult<IssuedSession> {
        let request = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                credential.id_token, credential.provider_id
            ),
            request_uri: "http://localhost",
            return_secure_token: true,
            return_idp_credential: true,
        };
        let record: TokenRecord = self.call("signInWithIdp", &request).await?;
        // Federated providers vouch for the address themselves.
        let verified = record.email_verified.unwrap_or(true);
        info!("Signed in {} via {}", record.local_id, credential.provider_id);
        Ok(record.into_session(verified))
    }

    async fn send_verification_email(&self, id_token: &str) -> PortResult<()> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &OobRequest {
                    request_type: "VERIFY_EMAIL",
                    id_token,
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_become_readable() {
        assert_eq!(describe_provider_error("INVALID_PASSWORD"), "Invalid email or password");
        assert_eq!(
            describe_provider_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            "Password is too weak"
        );
        assert_eq!(describe_provider_error(""), "Authentication failed");
        assert_eq!(describe_provider_error("ODD"), "Authentication failed (ODD)");
    }
}
