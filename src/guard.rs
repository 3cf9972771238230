use serde::Serialize;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    route_table::{ADMIN_LOGIN_PATH, ADMIN_PREFIX, USER_LOGIN_PATH, is_under, normalize_path},
    session::Session,
};

/// Paths every visitor may reach regardless of session state.
pub const ALLOW_LIST: [&str; 2] = [USER_LOGIN_PATH, ADMIN_LOGIN_PATH];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LoginView {
    User,
    Admin,
}

impl LoginView {
    pub fn path(self) -> &'static str {
        match self {
            LoginView::User => USER_LOGIN_PATH,
            LoginView::Admin => ADMIN_LOGIN_PATH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS, ToSchema)]
#[serde(tag = "outcome", content = "login", rename_all = "snake_case")]
#[ts(export)]
pub enum GuardDecision {
    Proceed,
    Redirect(LoginView),
}

/// GuardOutcome
///
/// The decision plus whether the caller should hydrate the user profile in the background.
/// Hydration never gates the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardOutcome {
    pub decision: GuardDecision,
    pub hydrate_user_profile: bool,
}

impl GuardOutcome {
    fn proceed() -> Self {
        Self {
            decision: GuardDecision::Proceed,
            hydrate_user_profile: false,
        }
    }

    fn redirect(login: LoginView) -> Self {
        Self {
            decision: GuardDecision::Redirect(login),
            hydrate_user_profile: false,
        }
    }
}

pub fn is_admin_path(path: &str) -> bool {
    is_under(path, ADMIN_PREFIX)
}

/// evaluate
///
/// Decides a single transition to `path`. The admin and end-user domains are partitioned by
/// the `/admin` prefix: admin paths only look at the admin token, every other path only at
/// the user token. Token presence is sufficient; validity is settled later by a profile fetch.
pub fn evaluate(path: &str, session: &Session) -> GuardOutcome {
    let path = normalize_path(path);

    if ALLOW_LIST.contains(&path.as_str()) {
        return GuardOutcome::proceed();
    }

    let outcome = if is_admin_path(&path) {
        if session.has_admin_token() {
            GuardOutcome::proceed()
        } else {
            GuardOutcome::redirect(LoginView::Admin)
        }
    } else if session.has_user_token() {
        GuardOutcome {
            decision: GuardDecision::Proceed,
            hydrate_user_profile: session.user_profile.is_none(),
        }
    } else {
        GuardOutcome::redirect(LoginView::User)
    };

    tracing::debug!(%path, decision = ?outcome.decision, "route guard");
    outcome
}
