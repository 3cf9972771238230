use async_trait::async_trait;
use reqwest::StatusCode;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    error::ConsoleError,
    models::{AdminProfile, Credentials, TokenResponse, UserProfile},
    session::Realm,
};

/// AccountService
///
/// The upstream collaborators of the console: token issuance and profile lookup. Consumed as
/// opaque async calls; callers only distinguish success from failure.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Exchanges credentials for a bearer token of `realm`.
    async fn login(&self, realm: Realm, credentials: &Credentials) -> Result<String, ConsoleError>;

    async fn fetch_user_profile(&self, token: &str) -> Result<UserProfile, ConsoleError>;

    async fn fetch_admin_profile(&self, token: &str) -> Result<AdminProfile, ConsoleError>;
}

/// AccountState
///
/// The shared handle type for the account service.
pub type AccountState = Arc<dyn AccountService>;

/// HttpAccountClient
///
/// Talks to the admissions API over HTTP.
#[derive(Clone)]
pub struct HttpAccountClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccountClient {
    pub fn new(base_url: &str) -> Result<Self, ConsoleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn login_url(&self, realm: Realm) -> String {
        match realm {
            Realm::User => format!("{}/api/auth/login", self.base_url),
            Realm::Admin => format!("{}/api/admin/auth/login", self.base_url),
        }
    }

    fn profile_url(&self, realm: Realm) -> String {
        match realm {
            Realm::User => format!("{}/api/auth/me", self.base_url),
            Realm::Admin => format!("{}/api/admin/auth/me", self.base_url),
        }
    }

    async fn fetch_profile<T>(&self, realm: Realm, token: &str) -> Result<T, ConsoleError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(self.profile_url(realm))
            .bearer_auth(token)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// check_status
///
/// 401/403 mean the token is no longer accepted; anything else non-2xx is an upstream fault.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ConsoleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ConsoleError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ConsoleError::Upstream(format!("{}: {}", status, body)))
}

#[async_trait]
impl AccountService for HttpAccountClient {
    async fn login(&self, realm: Realm, credentials: &Credentials) -> Result<String, ConsoleError> {
        let response = self
            .client
            .post(self.login_url(realm))
            .json(credentials)
            .send()
            .await?;

        let response = check_status(response).await?;
        let token = response.json::<TokenResponse>().await?;
        Ok(token.access_token)
    }

    async fn fetch_user_profile(&self, token: &str) -> Result<UserProfile, ConsoleError> {
        self.fetch_profile(Realm::User, token).await
    }

    async fn fetch_admin_profile(&self, token: &str) -> Result<AdminProfile, ConsoleError> {
        self.fetch_profile(Realm::Admin, token).await
    }
}

// The Mock Implementation (For Tests)
/// MockAccountService
///
/// Accepts exactly one user token and one admin token. `set_failing(true)` makes every call
/// fail as if the upstream were unreachable; `with_latency` delays every call.
#[derive(Default)]
pub struct MockAccountService {
    pub user_token: Option<String>,
    pub admin_token: Option<String>,
    pub user_profile: UserProfile,
    pub admin_profile: AdminProfile,
    pub password: String,
    latency: Option<Duration>,
    failing: AtomicBool,
    user_fetches: AtomicUsize,
    admin_fetches: AtomicUsize,
}

impl MockAccountService {
    pub fn new() -> Self {
        Self {
            password: "secret".to_string(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, token: &str, profile: UserProfile) -> Self {
        self.user_token = Some(token.to_string());
        self.user_profile = profile;
        self
    }

    pub fn with_admin(mut self, token: &str, profile: AdminProfile) -> Self {
        self.admin_token = Some(token.to_string());
        self.admin_profile = profile;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn user_fetches(&self) -> usize {
        self.user_fetches.load(Ordering::SeqCst)
    }

    pub fn admin_fetches(&self) -> usize {
        self.admin_fetches.load(Ordering::SeqCst)
    }

    // The failure mode is sampled when the call starts, like a request already on the wire.
    async fn simulate(&self) -> Result<(), ConsoleError> {
        let failing = self.failing.load(Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if failing {
            return Err(ConsoleError::Upstream(
                "Mock Account Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountService for MockAccountService {
    async fn login(&self, realm: Realm, credentials: &Credentials) -> Result<String, ConsoleError> {
        self.simulate().await?;
        if credentials.password != self.password {
            return Err(ConsoleError::Unauthorized);
        }
        let token = match realm {
            Realm::User => self.user_token.clone(),
            Realm::Admin => self.admin_token.clone(),
        };
        token.ok_or(ConsoleError::Unauthorized)
    }

    async fn fetch_user_profile(&self, token: &str) -> Result<UserProfile, ConsoleError> {
        self.user_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        match &self.user_token {
            Some(valid) if valid == token => Ok(self.user_profile.clone()),
            _ => Err(ConsoleError::Unauthorized),
        }
    }

    async fn fetch_admin_profile(&self, token: &str) -> Result<AdminProfile, ConsoleError> {
        self.admin_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        match &self.admin_token {
            Some(valid) if valid == token => Ok(self.admin_profile.clone()),
            _ => Err(ConsoleError::Unauthorized),
        }
    }
}
