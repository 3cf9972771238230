use serde::Serialize;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    account::AccountService,
    menu::{MenuConfig, MenuGroup, MenuState},
    navigation::{Navigation, Navigator},
    route_table::{RouteDescriptor, RouteTable},
    session::{Realm, Session, SessionContext},
};

/// Narrowest viewport (px) that still gets the fixed sidebar.
pub const DEFAULT_SIDEBAR_BREAKPOINT: u32 = 768;

const FALLBACK_DISPLAY_NAME: &str = "管理员";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SidebarMode {
    Fixed,
    Drawer,
}

impl SidebarMode {
    pub fn for_width(width: u32, breakpoint: u32) -> Self {
        if width < breakpoint {
            SidebarMode::Drawer
        } else {
            SidebarMode::Fixed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct HeaderView {
    pub title: String,
    pub display_name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct SidebarView {
    pub mode: SidebarMode,
    pub collapsed: bool,
    pub drawer_open: bool,
    pub groups: Vec<MenuGroup>,
    pub active: String,
}

/// ShellView
///
/// Everything the admin layout renders for one path: header, navigation and the content route.
#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct ShellView {
    pub header: HeaderView,
    pub sidebar: SidebarView,
    pub content: Option<RouteDescriptor>,
}

/// LayoutShell
///
/// Local UI state of the admin layout. Nothing here is persisted across reloads.
#[derive(Debug, Clone)]
pub struct LayoutShell {
    breakpoint: u32,
    mode: SidebarMode,
    collapsed: bool,
    drawer_open: bool,
    menu: MenuState,
}

impl LayoutShell {
    pub fn new(breakpoint: u32, width: u32) -> Self {
        Self {
            breakpoint,
            mode: SidebarMode::for_width(width, breakpoint),
            collapsed: false,
            drawer_open: false,
            menu: MenuState::default(),
        }
    }

    pub fn mode(&self) -> SidebarMode {
        self.mode
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_drawer_open(&self) -> bool {
        self.drawer_open
    }

    pub fn active_entry(&self) -> &str {
        self.menu.active()
    }

    /// Re-evaluates the sidebar mode. Widening past the breakpoint closes an open drawer.
    pub fn resize(&mut self, width: u32) -> SidebarMode {
        let mode = SidebarMode::for_width(width, self.breakpoint);
        if mode != self.mode {
            tracing::debug!(width, ?mode, "sidebar mode changed");
            if mode == SidebarMode::Fixed {
                self.drawer_open = false;
            }
            self.mode = mode;
        }
        mode
    }

    /// The header's menu button: collapses the fixed sidebar or opens/closes the drawer.
    pub fn toggle_sidebar(&mut self) {
        match self.mode {
            SidebarMode::Fixed => self.collapsed = !self.collapsed,
            SidebarMode::Drawer => self.drawer_open = !self.drawer_open,
        }
    }

    pub fn close_drawer(&mut self) {
        self.drawer_open = false;
    }

    /// Handles a click on a sidebar entry. Returns the path to navigate to, or `None` when the
    /// entry was already active. The drawer closes either way.
    pub fn select_entry(&mut self, path: &str) -> Option<String> {
        if self.mode == SidebarMode::Drawer {
            self.drawer_open = false;
        }
        self.menu.select(path)
    }

    /// mount
    ///
    /// Loads the admin profile when none is cached. Failures are logged and swallowed; the
    /// guard handles redirects on later navigations. Returns whether a profile was applied.
    pub async fn mount(&self, session: &SessionContext, accounts: &dyn AccountService) -> bool {
        if session.has_admin_profile() {
            return false;
        }
        let Some(ticket) = session.begin_admin_refresh() else {
            return false;
        };

        match accounts.fetch_admin_profile(&ticket.token).await {
            Ok(profile) => session.apply_admin_profile(&ticket, profile),
            Err(e) => {
                tracing::warn!("admin profile fetch on mount failed: {}", e);
                false
            }
        }
    }

    /// logout
    ///
    /// Logs the admin out once the user confirmed. A cancelled confirmation is a no-op.
    pub fn logout(&mut self, navigator: &Navigator, confirmed: bool) -> Option<Navigation> {
        if !confirmed {
            return None;
        }
        self.drawer_open = false;
        self.menu = MenuState::default();
        Some(navigator.logout(Realm::Admin))
    }

    /// render
    ///
    /// Composes the shell for `path`. Tolerates a session whose admin profile has not arrived
    /// yet: the header falls back to a generic name and only unrestricted entries show.
    pub fn render(
        &mut self,
        path: &str,
        session: &Session,
        menu: &MenuConfig,
        routes: &RouteTable,
    ) -> ShellView {
        let groups = menu.visible(&session.permissions());
        let active = self.menu.sync(path, &groups).to_string();
        let content = routes.resolve(path).map(|m| m.route.clone());

        let profile = session.admin_profile.as_ref();
        let header = HeaderView {
            title: content
                .as_ref()
                .map(|r| r.meta.title.clone())
                .unwrap_or_default(),
            display_name: profile
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()),
            role: profile.map(|p| p.role.clone()),
        };

        ShellView {
            header,
            sidebar: SidebarView {
                mode: self.mode,
                collapsed: self.collapsed,
                drawer_open: self.drawer_open,
                groups,
                active,
            },
            content,
        }
    }
}
