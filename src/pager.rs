//! Page, title filter and sort order for one user's task list.

use tracing::{debug, warn};

use crate::error::TodoError;
use crate::resource::{Resolution, Resource, Seq};
use crate::types::{Paginated, SortOrder, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub user_id: String,
    pub page: u32,
    pub per_page: u32,
    pub title: String,
    pub sort: SortOrder,
}

impl TaskQuery {
    pub fn new(user_id: impl Into<String>, per_page: u32) -> Self {
        Self {
            user_id: user_id.into(),
            page: 1,
            per_page,
            title: String::new(),
            sort: SortOrder::default(),
        }
    }

    /// Query-string pairs understood by json-server.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("_page", self.page.to_string()),
            ("_per_page", self.per_page.to_string()),
            ("_sort", self.sort.as_param().to_string()),
            ("userId", self.user_id.clone()),
        ];
        if !self.title.is_empty() {
            params.push(("title:contains", self.title.clone()));
        }
        params
    }
}

/// Partial override of the current query. Anything left `None` keeps its current value,
/// except the page, which falls back to 1.
#[derive(Debug, Clone, Default)]
pub struct Refetch {
    pub page: Option<u32>,
    pub title: Option<String>,
    pub sort: Option<SortOrder>,
}

impl Refetch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn sort(sort: SortOrder) -> Self {
        Self {
            sort: Some(sort),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub seq: Seq,
    pub query: TaskQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    First,
    Prev,
    Next,
    Last,
}

/// Pagination controls derived from the last page the server returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub page: u32,
    pub pages: u32,
    pub first: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub last: u32,
    /// False while a refetch is in flight.
    pub enabled: bool,
}

impl Navigation {
    /// Page a button leads to, or `None` when the button is absent or disabled.
    pub fn target(&self, target: NavTarget) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        match target {
            NavTarget::First => Some(self.first),
            NavTarget::Prev => self.prev,
            NavTarget::Next => self.next,
            NavTarget::Last => Some(self.last),
        }
    }
}

#[derive(Debug)]
pub struct TaskPager {
    query: TaskQuery,
    tasks: Resource<Paginated<Task>>,
}

impl TaskPager {
    pub fn new(query: TaskQuery) -> Self {
        Self {
            query,
            tasks: Resource::default(),
        }
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn refetch(&mut self, overrides: Refetch) -> FetchTicket {
        if let Some(title) = overrides.title {
            self.query.title = title;
        }
        if let Some(sort) = overrides.sort {
            self.query.sort = sort;
        }
        self.query.page = overrides.page.unwrap_or(1);

        let seq = self.tasks.begin();
        debug!(?seq, query = ?self.query, "task refetch issued");

        FetchTicket {
            seq,
            query: self.query.clone(),
        }
    }

    pub fn resolve(&mut self, seq: Seq, result: Result<Paginated<Task>, TodoError>) -> Resolution {
        if let Ok(page) = &result {
            if let Err(problem) = page.check_invariants(self.query.per_page) {
                warn!(%problem, "server returned an inconsistent page");
            }
        }
        self.tasks.resolve(seq, result)
    }

    pub fn resource(&self) -> &Resource<Paginated<Task>> {
        &self.tasks
    }

    pub fn current(&self) -> Option<&Paginated<Task>> {
        self.tasks.data()
    }

    pub fn navigation(&self) -> Option<Navigation> {
        self.current().map(|page| Navigation {
            page: page.page,
            pages: page.pages,
            first: page.first,
            prev: page.prev,
            next: page.next,
            last: page.last,
            enabled: !self.tasks.is_pending(),
        })
    }
}
