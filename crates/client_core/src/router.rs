//! Route table and the pure authorization decision applied before a view is
//! rendered.

use shared::domain::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Verify,
    SuperAdmin,
    Organization,
    Citizen,
    NotFound,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Landing,
        Route::Login,
        Route::Verify,
        Route::SuperAdmin,
        Route::Organization,
        Route::Citizen,
        Route::NotFound,
    ];

    /// Unknown paths fall through to the not-found view.
    pub fn from_path(path: &str) -> Route {
        match path {
            "/" => Route::Landing,
            "/login" => Route::Login,
            "/verify" => Route::Verify,
            "/super-admin" => Route::SuperAdmin,
            "/organization" => Route::Organization,
            "/citizen" => Route::Citizen,
            _ => Route::NotFound,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Verify => "/verify",
            Route::SuperAdmin => "/super-admin",
            Route::Organization => "/organization",
            Route::Citizen => "/citizen",
            Route::NotFound => "*",
        }
    }

    pub fn access(self) -> RouteAccess {
        match self {
            Route::Landing | Route::Login | Route::NotFound => RouteAccess::Public,
            Route::Verify => RouteAccess::Authenticated,
            Route::SuperAdmin => RouteAccess::RoleOnly(&[Role::SuperAdmin]),
            Route::Organization => RouteAccess::RoleOnly(&[Role::Organization]),
            Route::Citizen => RouteAccess::RoleOnly(&[Role::Citizen]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Any authenticated role.
    Authenticated,
    RoleOnly(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Render,
    RedirectToLogin,
    RedirectToRoleHome(Route),
}

/// Dashboard a role lands on after login, and where mismatched navigation is
/// redirected. Total over the role enumeration.
pub fn role_home(role: Role) -> Route {
    match role {
        Role::SuperAdmin => Route::SuperAdmin,
        Role::Organization => Route::Organization,
        Role::Citizen => Route::Citizen,
    }
}

pub fn authorize(route: Route, identity: Option<&Identity>) -> Decision {
    match route.access() {
        RouteAccess::Public => Decision::Render,
        RouteAccess::Authenticated => match identity {
            Some(_) => Decision::Render,
            None => Decision::RedirectToLogin,
        },
        RouteAccess::RoleOnly(allowed) => match identity {
            None => Decision::RedirectToLogin,
            Some(identity) if allowed.contains(&identity.role) => Decision::Render,
            Some(identity) => Decision::RedirectToRoleHome(role_home(identity.role)),
        },
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
