//! Route context and public-route classification.
//!
//! Paths are compared without query string, fragment or trailing slashes, so
//! `/login/?next=/plans` is the login route. A public route also covers its
//! sub-paths (`/reset-password/<token>`), except the root which only matches
//! itself.

use regex::Regex;
use serde::Serialize;

pub const DEFAULT_PUBLIC_ROUTES: [&str; 5] = [
    "/",
    "/login",
    "/register",
    "/reset-password",
    "/create-password",
];

/// Where the user currently is, and where they came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RouteContext {
    /// Full location as navigated, including any query string.
    pub path: String,
    pub previous: Option<String>,
}

impl RouteContext {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous: None,
        }
    }

    /// Returns the context after navigating to `path`.
    #[must_use]
    pub fn navigate(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous: Some(self.path.clone()),
        }
    }
}

/// Strip query, fragment and trailing slashes. Empty input maps to `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Classifies paths reachable without authentication.
#[derive(Clone, Debug)]
pub struct PublicRoutes {
    routes: Vec<String>,
    patterns: Vec<Regex>,
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_ROUTES)
    }
}

impl PublicRoutes {
    #[must_use]
    pub fn new<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut public = Self {
            routes: Vec::new(),
            patterns: Vec::new(),
        };
        for route in routes {
            public = public.with_route(route.as_ref());
        }
        public
    }

    #[must_use]
    pub fn with_route(mut self, route: &str) -> Self {
        let route = normalize_path(route);
        if !self.routes.contains(&route) {
            self.routes.push(route);
        }
        self
    }

    /// Adds a regular expression matched against the normalized path.
    ///
    /// # Errors
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    #[must_use]
    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let literal = self.routes.iter().any(|route| {
            if route == "/" {
                path == "/"
            } else {
                path == *route
                    || path
                        .strip_prefix(route.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        });
        literal || self.patterns.iter().any(|re| re.is_match(&path))
    }
}
