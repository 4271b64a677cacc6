//! Role-to-route mapping. The only place that interprets `Identity::role`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
    Employee,
}

impl Role {
    /// Roles are matched exactly as the backend stores them.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Employees,
    Attendance,
    Users,
    Departments,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Employees, Route::Attendance, Route::Users, Route::Departments];

    pub fn id(&self) -> &'static str {
        match self {
            Route::Employees => "employees",
            Route::Attendance => "attendance",
            Route::Users => "users",
            Route::Departments => "departments",
        }
    }

    /// Accepts `employees` or `/employees`.
    pub fn parse(s: &str) -> Option<Route> {
        let id = s.trim().trim_start_matches('/');
        Route::ALL.into_iter().find(|r| r.id() == id)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.id()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Route(Route),
    /// No route is permitted; send the user back to the login screen.
    LoggedOut,
}

const EMPLOYEE_ROUTES: &[Route] = &[Route::Attendance];
const ADMIN_ROUTES: &[Route] = &Route::ALL;

/// Ordered permitted routes for a role string. Unknown roles get nothing.
pub fn permitted_routes(role: &str) -> &'static [Route] {
    match Role::parse(role) {
        Some(Role::Employee) => EMPLOYEE_ROUTES,
        Some(Role::Admin) | Some(Role::User) => ADMIN_ROUTES,
        None => &[],
    }
}

pub fn is_permitted(route: Route, role: &str) -> bool {
    permitted_routes(role).contains(&route)
}

/// Where a user with `role` lands after login.
pub fn landing_route(role: &str) -> Navigation {
    permitted_routes(role).first().copied().map(Navigation::Route).unwrap_or(Navigation::LoggedOut)
}

/// Requested route when permitted, else the role's landing route.
pub fn resolve_navigation(requested: Route, role: &str) -> Navigation {
    if is_permitted(requested, role) {
        Navigation::Route(requested)
    } else {
        landing_route(role)
    }
}
