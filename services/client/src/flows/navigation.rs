//! services/client/src/flows/navigation.rs
//!
//! The navigation shell: resolves a path to a page and applies the route guard.

use crate::flows::session::SessionHandle;
use lens_core::ports::SessionProvider;
use lens_core::routing::{decide, GuardDecision, Route, NAV_ITEMS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    /// Session still resolving; a placeholder stands in for the page.
    Loading(Route),
    Redirect { from: Route, to: Route },
}

/// Decides what visiting `path` shows right now.
pub fn navigate(session: &dyn SessionProvider, path: &str) -> Navigation {
    let route = Route::from_path(path);
    match decide(route, &session.snapshot()) {
        GuardDecision::Render => Navigation::Render(route),
        GuardDecision::Loading => Navigation::Loading(route),
        GuardDecision::RedirectToLogin => Navigation::Redirect {
            from: route,
            to: Route::Login,
        },
    }
}

/// Like [`navigate`], but waits out the loading state first.
pub async fn navigate_resolved(session: &SessionHandle, path: &str) -> Navigation {
    session.resolved().await;
    navigate(session, path)
}

/// The side navigation, marking the entry for the current route.
pub fn nav_menu(current: Route) -> Vec<String> {
    NAV_ITEMS
        .iter()
        .map(|item| {
            let marker = if item.route == current { ">" } else { " " };
            format!("{} {:<20} {}", marker, item.label, item.route.path())
        })
        .collect()
}
