//! Login and signup forms.
//!
//! A form submits through the [`SessionStore`]; a rejection stays on the
//! form as an inline message and never touches the session.

use crate::gateway::ApiError;
use crate::session::{Authenticator, Registration, SessionStore};

/// Message for an error, preferring the API's own one-liner.
fn form_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => api.message.clone(),
        None => format!("{err:#}"),
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    error: Option<String>,
    submitting: bool,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Submits the form. Returns true once the session is established.
    pub async fn submit<A: Authenticator>(&mut self, session: &SessionStore, auth: &A) -> bool {
        self.error = None;
        self.submitting = true;
        let result = session.login(auth, &self.email, &self.password).await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.password.clear();
                true
            }
            Err(err) => {
                tracing::debug!("login failed: {err:#}");
                self.error = Some(form_error(&err));
                false
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct SignupForm {
    pub registration: Registration,
    error: Option<String>,
    submitting: bool,
}

impl SignupForm {
    pub fn new(registration: Registration) -> Self {
        Self {
            registration,
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub async fn submit<A: Authenticator>(&mut self, session: &SessionStore, auth: &A) -> bool {
        self.error = None;
        self.submitting = true;
        let result = session.signup(auth, &self.registration).await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.registration.password.clear();
                self.registration.shopify_access_token.clear();
                true
            }
            Err(err) => {
                tracing::debug!("signup failed: {err:#}");
                self.error = Some(form_error(&err));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::gateway::{DEFAULT_AUTH_ERROR, GatewayClient};
    use crate::session::TOKEN_KEY;
    use crate::storage::{MemoryStorage, SessionStorage};

    fn logged_out(server: &MockServer) -> (Arc<MemoryStorage>, GatewayClient) {
        let storage = Arc::new(MemoryStorage::default());
        let session = SessionStore::new(Arc::clone(&storage) as Arc<dyn SessionStorage>);
        session.restore();
        let gateway = GatewayClient::new(&format!("{}/api", server.uri()), session, None).unwrap();
        (storage, gateway)
    }

    #[tokio::test]
    async fn test_login_success_clears_password() {
        let server = MockServer::start().await;
        // The email goes out exactly as typed.
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": " a@b.com ", "password": "x"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"token": "t1", "email": "a@b.com", "storeName": "Acme"}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        let (storage, gateway) = logged_out(&server);
        let mut form = LoginForm::new(" a@b.com ", "x");

        assert!(form.submit(gateway.session(), &gateway).await);

        assert!(form.error().is_none());
        assert!(form.password.is_empty());
        assert!(!form.is_submitting());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert_eq!(
            gateway.session().current_user().unwrap().store_name.as_deref(),
            Some("Acme")
        );
    }

    #[tokio::test]
    async fn test_login_rejection_is_inline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let (storage, gateway) = logged_out(&server);
        let mut form = LoginForm::new("a@b.com", "wrong");

        assert!(!form.submit(gateway.session(), &gateway).await);

        assert_eq!(form.error(), Some(DEFAULT_AUTH_ERROR));
        assert_eq!(form.password, "wrong");
        assert!(storage.is_empty());
        assert!(!gateway.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_payload_without_token_reports_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.com"})))
            .mount(&server)
            .await;
        let (_, gateway) = logged_out(&server);
        let mut form = LoginForm::new("a@b.com", "x");

        assert!(!form.submit(gateway.session(), &gateway).await);
        assert!(form.error().is_some());
        assert!(!gateway.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_signup_rejection_uses_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signup"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "Email already registered"})),
            )
            .mount(&server)
            .await;
        let (_, gateway) = logged_out(&server);
        let mut form = SignupForm::new(Registration {
            email: "a@b.com".into(),
            password: "secret".into(),
            store_name: "Acme".into(),
            shopify_domain: "acme.myshopify.com".into(),
            shopify_access_token: "shpat_x".into(),
        });

        assert!(!form.submit(gateway.session(), &gateway).await);
        assert_eq!(form.error(), Some("Email already registered"));
        assert_eq!(form.registration.password, "secret");
    }

    #[tokio::test]
    async fn test_signup_success_establishes_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signup"))
            .and(body_json(json!({
                "email": "a@b.com",
                "password": "secret",
                "storeName": "Acme",
                "shopifyDomain": "acme.myshopify.com",
                "shopifyAccessToken": "shpat_x"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!({"token": "t2", "email": "a@b.com", "storeName": "Acme"}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        let (_, gateway) = logged_out(&server);
        let mut form = SignupForm::new(Registration {
            email: "a@b.com".into(),
            password: "secret".into(),
            store_name: "Acme".into(),
            shopify_domain: "acme.myshopify.com".into(),
            shopify_access_token: "shpat_x".into(),
        });

        assert!(form.submit(gateway.session(), &gateway).await);
        assert!(form.registration.password.is_empty());
        assert_eq!(
            gateway.session().credential().unwrap().as_str(),
            "t2"
        );
    }
}
