//! Session store: who is signed in, and with which credential.
//!
//! The store is the single writer of the persisted `token` and `user` keys.
//! It is a cheap-to-clone handle; every clone observes the same session.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::gateway::{ApiError, ApiResult};
use crate::storage::SessionStorage;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the serialized user profile.
pub const USER_KEY: &str = "user";

/// Opaque bearer token issued by the authentication endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The signed-in user as returned by login/signup, minus the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Any other fields the server returned, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Label for headers: the store name, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.store_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Snapshot of the session as seen by readers.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// True until the startup restore has run.
    pub loading: bool,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Account creation payload. Validation happens server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub store_name: String,
    pub shopify_domain: String,
    pub shopify_access_token: String,
}

/// Which authentication endpoint a submission targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEndpoint {
    Login,
    Signup,
}

impl AuthEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            AuthEndpoint::Login => "/auth/login",
            AuthEndpoint::Signup => "/auth/signup",
        }
    }
}

/// Submits credentials and returns the raw response payload.
///
/// Implemented by the gateway; tests substitute fakes.
pub trait Authenticator: Send + Sync {
    fn authenticate(
        &self,
        endpoint: AuthEndpoint,
        body: Value,
    ) -> impl Future<Output = ApiResult<Value>> + Send;
}

#[derive(Debug)]
struct State {
    loading: bool,
    credential: Option<Credential>,
    user: Option<UserProfile>,
}

struct Inner {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<State>,
}

/// Handle to the shared session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates an uninitialized store (`loading = true`, no user).
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                state: RwLock::new(State {
                    loading: true,
                    credential: None,
                    user: None,
                }),
            }),
        }
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> Session {
        let state = self.read();
        Session {
            loading: state.loading,
            user: state.user.clone(),
        }
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    /// The credential as of now. Callers must not cache it.
    pub fn credential(&self) -> Option<Credential> {
        self.read().credential.clone()
    }

    /// Loads the persisted session. Runs once; later calls return the
    /// current snapshot without touching storage.
    ///
    /// Never fails: unreadable or half-written data counts as logged out,
    /// and any leftover key is discarded.
    pub fn restore(&self) -> Session {
        let mut state = self.write();
        if !state.loading {
            return Session {
                loading: false,
                user: state.user.clone(),
            };
        }

        let storage = &self.inner.storage;
        let token = read_key(storage.as_ref(), TOKEN_KEY).filter(|t| !t.trim().is_empty());
        let user = read_key(storage.as_ref(), USER_KEY).and_then(|raw| {
            serde_json::from_str::<UserProfile>(&raw)
                .inspect_err(|err| tracing::warn!("ignoring malformed stored profile: {err}"))
                .ok()
        });

        let (credential, user) = match (token, user) {
            (Some(token), Some(user)) => (Some(Credential::new(token)), Some(user)),
            (token, user) => {
                if token.is_some() || user.is_some() {
                    tracing::warn!("discarding incomplete stored session");
                }
                discard_keys(storage.as_ref());
                (None, None)
            }
        };

        match &user {
            Some(user) => tracing::info!(email = %user.email, "session restored"),
            None => tracing::debug!("no stored session"),
        }

        state.loading = false;
        state.credential = credential;
        state.user = user;
        Session {
            loading: false,
            user: state.user.clone(),
        }
    }

    /// Signs in and establishes the session.
    ///
    /// Returns the full response payload (including the token). On failure
    /// the session is unchanged.
    pub async fn login<A: Authenticator>(
        &self,
        auth: &A,
        email: &str,
        password: &str,
    ) -> Result<Value> {
        let body = serde_json::json!({ "email": email, "password": password });
        let payload = auth.authenticate(AuthEndpoint::Login, body).await?;
        self.establish(&payload)?;
        Ok(payload)
    }

    /// Creates an account and establishes the session; same contract as
    /// [`SessionStore::login`].
    pub async fn signup<A: Authenticator>(
        &self,
        auth: &A,
        registration: &Registration,
    ) -> Result<Value> {
        let body = serde_json::to_value(registration).context("Failed to encode registration")?;
        let payload = auth.authenticate(AuthEndpoint::Signup, body).await?;
        self.establish(&payload)?;
        Ok(payload)
    }

    /// Clears the session. Never fails; storage errors are logged.
    pub fn logout(&self) {
        self.clear("logout");
    }

    /// Tears the session down after the server rejected the credential.
    pub(crate) fn expire(&self) {
        self.clear("credential rejected");
    }

    fn clear(&self, reason: &str) {
        let mut state = self.write();
        discard_keys(self.inner.storage.as_ref());
        state.loading = false;
        state.credential = None;
        if let Some(user) = state.user.take() {
            tracing::info!(email = %user.email, reason, "session cleared");
        }
    }

    /// Splits the payload into credential + profile, persists both, then
    /// swaps them in. The write lock is held throughout so readers never
    /// see a partial session.
    fn establish(&self, payload: &Value) -> Result<()> {
        let (credential, user) = split_auth_payload(payload)?;
        let user_json = serde_json::to_string(&user).context("Failed to encode user profile")?;

        let mut state = self.write();
        let storage = &self.inner.storage;
        storage
            .set(TOKEN_KEY, credential.as_str())
            .context("Failed to persist credential")?;
        if let Err(err) = storage.set(USER_KEY, &user_json) {
            // The stored pair must keep describing the in-memory session.
            match state.credential.as_ref().filter(|_| state.user.is_some()) {
                Some(previous) => {
                    if let Err(restore_err) = storage.set(TOKEN_KEY, previous.as_str()) {
                        tracing::warn!("failed to restore stored {TOKEN_KEY}: {restore_err:#}");
                        discard_keys(storage.as_ref());
                    }
                }
                None => discard_keys(storage.as_ref()),
            }
            return Err(err.context("Failed to persist user profile"));
        }

        tracing::info!(email = %user.email, "session established");
        state.loading = false;
        state.credential = Some(credential);
        state.user = Some(user);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Separates `{token, ...user}` into its two halves.
fn split_auth_payload(payload: &Value) -> Result<(Credential, UserProfile), ApiError> {
    let Some(object) = payload.as_object() else {
        return Err(ApiError::parse(
            "authentication response is not a JSON object",
        ));
    };

    let token = object
        .get(TOKEN_KEY)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::parse("authentication response has no token"))?;

    let mut fields = object.clone();
    fields.remove(TOKEN_KEY);
    let user: UserProfile = serde_json::from_value(Value::Object(fields))
        .map_err(|err| ApiError::parse(format!("invalid user in authentication response: {err}")))?;

    Ok((Credential::new(token), user))
}

fn read_key(storage: &dyn SessionStorage, key: &str) -> Option<String> {
    storage
        .get(key)
        .inspect_err(|err| tracing::warn!("failed to read stored {key}: {err:#}"))
        .ok()
        .flatten()
}

fn discard_keys(storage: &dyn SessionStorage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(err) = storage.remove(key) {
            tracing::warn!("failed to remove stored {key}: {err:#}");
        }
    }
}
