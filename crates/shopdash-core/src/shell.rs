//! Routing shell: owns the active route, applies the session guard, and
//! reacts to gateway events.

use std::fmt;
use std::sync::Arc;

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;

use crate::gateway::{GatewayClient, GatewayEvent};
use crate::pages::{LoginForm, SignupForm};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Customers,
    Products,
}

impl Route {
    /// Resolves a path. `/` and anything unknown land on the dashboard.
    pub fn from_path(path: &str) -> Self {
        let path = path.trim().trim_end_matches('/');
        match path {
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/customers" => Route::Customers,
            "/products" => Route::Products,
            _ => Route::Dashboard,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
            Route::Customers => "/customers",
            Route::Products => "/products",
        }
    }

    pub fn requires_session(self) -> bool {
        !matches!(self, Route::Login | Route::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub struct Shell {
    gateway: Arc<GatewayClient>,
    events: Receiver<GatewayEvent>,
    route: Route,
}

impl Shell {
    /// Subscribes to the gateway and starts at the dashboard, or at the
    /// login page when nobody is signed in.
    pub fn new(gateway: Arc<GatewayClient>) -> Self {
        let events = gateway.subscribe();
        let route = if gateway.session().is_authenticated() {
            Route::Dashboard
        } else {
            Route::Login
        };
        Self {
            gateway,
            events,
            route,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn gateway(&self) -> &Arc<GatewayClient> {
        &self.gateway
    }

    pub fn navigate(&mut self, path: &str) -> Route {
        self.go(Route::from_path(path))
    }

    /// Moves to `route`, or to the login page if it needs a session and
    /// there is none. Returns where the shell ended up.
    pub fn go(&mut self, route: Route) -> Route {
        self.route = if route.requires_session() && !self.session().is_authenticated() {
            tracing::debug!(requested = %route, "no session, redirecting to login");
            Route::Login
        } else {
            route
        };
        self.route
    }

    /// Drains pending gateway events. Returns true if the session expired.
    pub fn process_events(&mut self) -> bool {
        let mut expired = false;
        loop {
            match self.events.try_recv() {
                Ok(GatewayEvent::SessionExpired { path }) => {
                    tracing::info!(%path, from = %self.route, "session expired, redirecting to login");
                    expired = true;
                }
                // Dropped events were expiries too.
                Err(TryRecvError::Lagged(_)) => expired = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if expired {
            self.route = Route::Login;
        }
        expired
    }

    /// Submits the login form and opens the dashboard on success.
    pub async fn login(&mut self, form: &mut LoginForm) -> bool {
        let gateway = Arc::clone(&self.gateway);
        let ok = form.submit(gateway.session(), gateway.as_ref()).await;
        if ok {
            self.go(Route::Dashboard);
        }
        ok
    }

    pub async fn signup(&mut self, form: &mut SignupForm) -> bool {
        let gateway = Arc::clone(&self.gateway);
        let ok = form.submit(gateway.session(), gateway.as_ref()).await;
        if ok {
            self.go(Route::Dashboard);
        }
        ok
    }

    pub fn logout(&mut self) {
        self.session().logout();
        self.route = Route::Login;
    }
}
