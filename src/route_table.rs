//! Declarative route table for the console SPA.
//!
//! A plain ordered list of path/metadata records plus a segment matcher, independent of any UI
//! framework. The paths are a stable contract: bookmarked links depend on them.

use serde::Serialize;
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;

pub const USER_LOGIN_PATH: &str = "/login";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const ADMIN_PREFIX: &str = "/admin";
pub const ADMIN_HOME_PATH: &str = "/admin/dashboard";

// Bounds redirect chains.
const MAX_REDIRECTS: usize = 4;

/// RouteMeta
///
/// Per-route flags read by the guard and the layout.
#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteMeta {
    pub title: String,
    pub requires_auth: bool,
    pub requires_admin: bool,
    pub keep_alive: bool,
}

/// RouteDescriptor
///
/// One navigable path. `view` names the lazily-loaded view module; redirect records have none.
#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteDescriptor {
    pub path: String,
    pub name: String,
    pub view: Option<String>,
    pub meta: RouteMeta,
    pub redirect: Option<String>,
}

/// RouteMatch
///
/// A matched descriptor plus the values captured by its `:param` segments.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub params: BTreeMap<String, String>,
}

/// A child of a nested group. Auth flags come from the group.
struct Child {
    path: &'static str,
    name: &'static str,
    view: &'static str,
    title: &'static str,
    keep_alive: bool,
}

fn child(path: &'static str, name: &'static str, view: &'static str, title: &'static str) -> Child {
    Child {
        path,
        name,
        view,
        title,
        keep_alive: false,
    }
}

impl Child {
    fn cached(mut self) -> Self {
        self.keep_alive = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    /// standard
    ///
    /// The console's fixed route surface: the end-user chat pages and the admin pages nested
    /// under `/admin`.
    pub fn standard() -> Self {
        let mut table = Self::default();

        table.page(USER_LOGIN_PATH, "Login", "views/LoginView", "登录", false);
        table.page("/", "Home", "views/HomeView", "首页", true);
        table.page("/chat", "ChatList", "views/ChatView", "智能咨询", true);
        table.page("/chat/:id", "Chat", "views/ChatView", "智能咨询", true);
        table.page("/settings", "Settings", "views/SettingsView", "个人设置", true);
        table.page(
            ADMIN_LOGIN_PATH,
            "AdminLogin",
            "views/admin/LoginView",
            "管理员登录",
            false,
        );

        table.nest(
            ADMIN_PREFIX,
            "Admin",
            "管理后台",
            ADMIN_HOME_PATH,
            vec![
                child("dashboard", "AdminDashboard", "views/admin/DashboardView", "仪表盘"),
                child("knowledge", "AdminKnowledge", "views/admin/KnowledgeView", "知识库管理")
                    .cached(),
                child(
                    "sensitive-words",
                    "AdminSensitiveWords",
                    "views/admin/SensitiveWordsView",
                    "敏感词管理",
                ),
                child(
                    "model-config",
                    "AdminModelConfig",
                    "views/admin/ModelConfigView",
                    "模型配置",
                ),
                child("settings", "AdminSettings", "views/admin/SystemSettingsView", "系统设置"),
                child("users", "AdminUsers", "views/admin/UsersView", "用户管理").cached(),
                child(
                    "conversations",
                    "AdminConversations",
                    "views/admin/ConversationsView",
                    "会话记录",
                )
                .cached(),
                child("admins", "AdminAdmins", "views/admin/AdminsView", "管理员管理"),
                child("roles", "AdminRoles", "views/admin/RolesView", "角色权限"),
                child("workflows", "AdminWorkflows", "views/admin/WorkflowsView", "工作流"),
                child("media", "AdminMedia", "views/admin/MediaView", "媒体资源"),
                child("calendar", "AdminCalendar", "views/admin/CalendarView", "招生日历"),
                child("logs", "AdminLogs", "views/admin/AuditLogsView", "操作日志"),
                child("profile", "AdminProfile", "views/admin/ProfileView", "个人资料"),
            ],
        );

        table
    }

    fn page(&mut self, path: &str, name: &str, view: &str, title: &str, requires_auth: bool) {
        self.routes.push(RouteDescriptor {
            path: path.to_string(),
            name: name.to_string(),
            view: Some(view.to_string()),
            meta: RouteMeta {
                title: title.to_string(),
                requires_auth,
                requires_admin: false,
                keep_alive: false,
            },
            redirect: None,
        });
    }

    /// Adds a parent record at `prefix` (redirecting to `home`) and its children, which
    /// inherit the parent's auth requirements.
    fn nest(&mut self, prefix: &str, name: &str, title: &str, home: &str, children: Vec<Child>) {
        let parent = RouteMeta {
            title: title.to_string(),
            requires_auth: true,
            requires_admin: true,
            keep_alive: false,
        };

        self.routes.push(RouteDescriptor {
            path: prefix.to_string(),
            name: name.to_string(),
            view: None,
            meta: parent.clone(),
            redirect: Some(home.to_string()),
        });

        for c in children {
            self.routes.push(RouteDescriptor {
                path: format!("{}/{}", prefix, c.path),
                name: c.name.to_string(),
                view: Some(c.view.to_string()),
                meta: RouteMeta {
                    title: c.title.to_string(),
                    keep_alive: c.keep_alive,
                    ..parent.clone()
                },
                redirect: None,
            });
        }
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// resolve
    ///
    /// Matches `path` segment by segment against each descriptor in declaration order.
    /// `None` means not found.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(path);
        let segments: Vec<&str> = split_segments(&path).collect();

        self.routes.iter().find_map(|route| {
            let pattern: Vec<&str> = split_segments(&route.path).collect();
            if pattern.len() != segments.len() {
                return None;
            }

            let mut params = BTreeMap::new();
            for (expected, actual) in pattern.iter().zip(&segments) {
                match expected.strip_prefix(':') {
                    Some(param) => {
                        params.insert(param.to_string(), (*actual).to_string());
                    }
                    None if expected == actual => {}
                    None => return None,
                }
            }

            Some(RouteMatch { route, params })
        })
    }

    /// Follows redirect records from `path` to the path that will actually render.
    pub fn follow_redirects(&self, path: &str) -> String {
        let mut target = normalize_path(path);
        for _ in 0..MAX_REDIRECTS {
            match self.resolve(&target).and_then(|m| m.route.redirect.clone()) {
                Some(next) => target = normalize_path(&next),
                None => break,
            }
        }
        target
    }
}

/// normalize_path
///
/// Drops query string and fragment, collapses repeated slashes and strips a trailing slash
/// (the root stays `/`).
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let joined = split_segments(path).collect::<Vec<_>>().join("/");
    format!("/{}", joined)
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// is_under
///
/// Segment-aware prefix test: `/admin/users` is under `/admin`, `/administrator` is not.
pub fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_query_and_trailing_slash() {
        assert_eq!(normalize_path("/chat/42/?tab=1#top"), "/chat/42");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("//admin//users"), "/admin/users");
    }

    #[test]
    fn prefix_is_segment_aware() {
        assert!(is_under("/admin", "/admin"));
        assert!(is_under("/admin/users", "/admin"));
        assert!(!is_under("/administrator", "/admin"));
        assert!(is_under("/anything", "/"));
    }
}
