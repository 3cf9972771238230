use std::env;

use crate::layout::DEFAULT_SIDEBAR_BREAKPOINT;

/// AppConfig
///
/// Holds the console's entire configuration state. Immutable once loaded and pulled into
/// handlers via `FromRef`, alongside the account service it configures.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls fail-fast behaviour and the log format.
    pub env: Env,
    // Base URL of the upstream admissions API (login + profile endpoints).
    pub upstream_url: String,
    // Socket address the BFF listens on.
    pub bind_addr: String,
    // Viewport width (px) below which the sidebar becomes an overlay drawer.
    pub sidebar_breakpoint: u32,
    // Suffix appended to every page title.
    pub app_title: String,
}

/// Env
///
/// Defines the runtime context.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_APP_TITLE: &str = "招生咨询管理系统";

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig primarily used for test setup, so state can be
    /// scaffolded without touching environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            sidebar_breakpoint: DEFAULT_SIDEBAR_BREAKPOINT,
            app_title: DEFAULT_APP_TITLE.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables, failing fast on settings that
    /// production cannot run without.
    ///
    /// # Panics
    /// Panics in production when `UPSTREAM_API_URL` is missing, or in any environment when
    /// `SIDEBAR_BREAKPOINT` is set but not a positive integer.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let upstream_url = match env {
            Env::Production => env::var("UPSTREAM_API_URL")
                .expect("FATAL: UPSTREAM_API_URL must be set in production."),
            Env::Local => {
                env::var("UPSTREAM_API_URL").unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string())
            }
        };

        let sidebar_breakpoint = match env::var("SIDEBAR_BREAKPOINT") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|px| *px > 0)
                .expect("FATAL: SIDEBAR_BREAKPOINT must be a positive integer."),
            Err(_) => DEFAULT_SIDEBAR_BREAKPOINT,
        };

        Self {
            env,
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            sidebar_breakpoint,
            app_title: env::var("APP_TITLE").unwrap_or_else(|_| DEFAULT_APP_TITLE.to_string()),
        }
    }
}
