//! crates/lens_core/src/routing.rs
//!
//! The page table and the access gate in front of the protected pages.

use crate::domain::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable with or without a session.
    Public,
    /// Requires a resolved session.
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    About,
    Home,
    Analysis,
    History,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Landing,
        Route::Login,
        Route::About,
        Route::Home,
        Route::Analysis,
        Route::History,
    ];

    /// Resolves a path. Unknown paths land on the landing page.
    pub fn from_path(path: &str) -> Route {
        let trimmed = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = trimmed.trim_end_matches('/');
        match trimmed {
            "" => Route::Landing,
            "/login" => Route::Login,
            "/about" => Route::About,
            "/app" => Route::Home,
            "/app/analysis" => Route::Analysis,
            "/app/history" | "/history" => Route::History,
            _ => Route::Landing,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::About => "/about",
            Route::Home => "/app",
            Route::Analysis => "/app/analysis",
            Route::History => "/app/history",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "Legal Lens",
            Route::Login => "Sign in",
            Route::About => "About",
            Route::Home => "Home",
            Route::Analysis => "Document Analysis",
            Route::History => "History",
        }
    }

    pub fn class(&self) -> RouteClass {
        match self {
            Route::Landing | Route::Login | Route::About => RouteClass::Public,
            Route::Home | Route::Analysis | Route::History => RouteClass::Protected,
        }
    }
}

/// An entry in the side navigation of the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
}

pub const NAV_ITEMS: [NavItem; 3] = [
    NavItem { label: "Home", route: Route::Landing },
    NavItem { label: "Document Analysis", route: Route::Analysis },
    NavItem { label: "History", route: Route::History },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session resolution is pending: show a placeholder.
    Loading,
    RedirectToLogin,
    Render,
}

/// The access gate for protected pages.
pub fn guard(loading: bool, user_present: bool) -> GuardDecision {
    if loading {
        GuardDecision::Loading
    } else if !user_present {
        GuardDecision::RedirectToLogin
    } else {
        GuardDecision::Render
    }
}

/// Decides what happens when `route` is visited with the given session.
pub fn decide(route: Route, session: &SessionSnapshot) -> GuardDecision {
    match route.class() {
        RouteClass::Public => GuardDecision::Render,
        RouteClass::Protected => guard(session.loading, session.user.is_some()),
    }
}
