use serde::Serialize;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    models::PermissionSet,
    route_table::{ADMIN_HOME_PATH, is_under, normalize_path},
};

/// MenuEntry
///
/// One sidebar link. Without a `permission` the entry is visible to every signed-in admin.
#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct MenuEntry {
    pub path: String,
    pub label: String,
    pub icon: String,
    pub permission: Option<String>,
}

impl MenuEntry {
    pub fn new(path: &str, label: &str, icon: &str) -> Self {
        Self {
            path: path.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            permission: None,
        }
    }

    pub fn requires(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_string());
        self
    }

    pub fn is_visible(&self, permissions: &PermissionSet) -> bool {
        self.permission
            .as_deref()
            .is_none_or(|code| permissions.contains(code))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct MenuGroup {
    pub label: String,
    pub entries: Vec<MenuEntry>,
}

impl MenuGroup {
    pub fn new(label: &str, entries: Vec<MenuEntry>) -> Self {
        Self {
            label: label.to_string(),
            entries,
        }
    }
}

/// MenuConfig
///
/// The static admin sidebar: ordered groups of ordered entries.
#[derive(Debug, Clone, Default)]
pub struct MenuConfig {
    groups: Vec<MenuGroup>,
}

impl MenuConfig {
    pub fn new(groups: Vec<MenuGroup>) -> Self {
        Self { groups }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            MenuGroup::new(
                "工作台",
                vec![MenuEntry::new(ADMIN_HOME_PATH, "仪表盘", "Odometer")],
            ),
            MenuGroup::new(
                "业务管理",
                vec![
                    MenuEntry::new("/admin/knowledge", "知识库管理", "Collection")
                        .requires("knowledge:read"),
                    MenuEntry::new("/admin/media", "媒体资源", "Picture").requires("media:read"),
                    MenuEntry::new("/admin/calendar", "招生日历", "Calendar")
                        .requires("calendar:read"),
                ],
            ),
            MenuGroup::new(
                "内容安全",
                vec![
                    MenuEntry::new("/admin/sensitive-words", "敏感词管理", "Warning")
                        .requires("sensitive:read"),
                    MenuEntry::new("/admin/conversations", "会话记录", "ChatDotRound")
                        .requires("conversation:read"),
                ],
            ),
            MenuGroup::new(
                "用户与权限",
                vec![
                    MenuEntry::new("/admin/users", "用户管理", "User").requires("user:read"),
                    MenuEntry::new("/admin/admins", "管理员管理", "Avatar").requires("admin:read"),
                    MenuEntry::new("/admin/roles", "角色权限", "Lock").requires("role:read"),
                ],
            ),
            MenuGroup::new(
                "系统配置",
                vec![
                    MenuEntry::new("/admin/model-config", "模型配置", "Cpu")
                        .requires("model:read"),
                    MenuEntry::new("/admin/workflows", "工作流", "Share").requires("workflow:read"),
                    MenuEntry::new("/admin/settings", "系统设置", "Setting")
                        .requires("system:read"),
                    MenuEntry::new("/admin/logs", "操作日志", "Document").requires("log:read"),
                ],
            ),
        ])
    }

    pub fn groups(&self) -> &[MenuGroup] {
        &self.groups
    }

    pub fn visible(&self, permissions: &PermissionSet) -> Vec<MenuGroup> {
        filter_menu(&self.groups, permissions)
    }
}

/// filter_menu
///
/// Keeps the entries `permissions` allows, drops groups left empty, and preserves the
/// configured order of both.
pub fn filter_menu(groups: &[MenuGroup], permissions: &PermissionSet) -> Vec<MenuGroup> {
    groups
        .iter()
        .filter_map(|group| {
            let entries: Vec<MenuEntry> = group
                .entries
                .iter()
                .filter(|entry| entry.is_visible(permissions))
                .cloned()
                .collect();

            (!entries.is_empty()).then(|| MenuGroup {
                label: group.label.clone(),
                entries,
            })
        })
        .collect()
}

/// resolve_active
///
/// Picks the visible entry whose path is the longest segment-aware prefix of `path`, so a
/// detail page lights up its list entry. Falls back to the dashboard.
pub fn resolve_active(path: &str, visible: &[MenuGroup]) -> String {
    let path = normalize_path(path);

    visible
        .iter()
        .flat_map(|group| group.entries.iter())
        .filter(|entry| is_under(&path, &entry.path))
        .max_by_key(|entry| entry.path.len())
        .map(|entry| entry.path.clone())
        .unwrap_or_else(|| ADMIN_HOME_PATH.to_string())
}

/// MenuState
///
/// The sidebar's highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuState {
    active: String,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            active: ADMIN_HOME_PATH.to_string(),
        }
    }
}

impl MenuState {
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Re-derives the highlight after the route or the visible entries changed.
    pub fn sync(&mut self, path: &str, visible: &[MenuGroup]) -> &str {
        self.active = resolve_active(path, visible);
        &self.active
    }

    /// Marks `path` active and returns it as the navigation target; `None` when it already
    /// was active.
    pub fn select(&mut self, path: &str) -> Option<String> {
        let path = normalize_path(path);
        if path == self.active {
            return None;
        }
        self.active = path.clone();
        Some(path)
    }
}
