use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, TodoError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Users,
    /// `/:userId/tasks`
    Tasks { user_id: String },
}

fn tasks_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^/([^/]+)/tasks/?$").expect("valid route pattern"))
}

impl Route {
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();

        if path.is_empty() || path == "/" {
            return Ok(Route::Users);
        }

        tasks_pattern()
            .captures(path)
            .and_then(|caps| caps.get(1))
            .map(|user_id| Route::Tasks {
                user_id: user_id.as_str().to_string(),
            })
            .ok_or_else(|| TodoError::InvalidRoute(path.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Users => write!(f, "/"),
            Route::Tasks { user_id } => write!(f, "/{user_id}/tasks"),
        }
    }
}
