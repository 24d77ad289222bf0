use colored::Colorize;
use tabled::Tabled;

use crate::actions::validate_title;
use crate::cli::TaskListArgs;
use crate::client::TodoApi;
use crate::error::{Result, TodoError};
use crate::output::{self, done_marker, format_timestamp, truncate};
use crate::pager::{Navigation, TaskQuery};
use crate::types::{NewTask, Task, TaskPatch};

#[derive(Tabled)]
pub struct TaskRow {
    #[tabled(rename = "")]
    done: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "")]
    status: String,
}

impl TaskRow {
    pub fn new(task: &Task, owner: Option<&str>) -> Self {
        Self {
            done: done_marker(task.done),
            title: truncate(&task.title, 50),
            owner: owner.map(|o| truncate(o, 30)).unwrap_or_else(|| "-".to_string()),
            created: format_timestamp(task.created_at),
            id: task.id.clone(),
            status: String::new(),
        }
    }

    pub fn with_status(mut self, status: String) -> Self {
        self.status = status;
        self
    }
}

pub fn compact_line(task: &Task) -> String {
    format!(
        "{}\t[{}]\t{}",
        task.id,
        if task.done { "x" } else { " " },
        task.title
    )
}

/// Pagination bar: buttons for the pages the server reported, greyed out while loading.
pub fn render_navigation(nav: &Navigation) -> String {
    let mut buttons = vec![format!("First ({})", nav.first)];
    if let Some(prev) = nav.prev {
        buttons.push(format!("Prev ({prev})"));
    }
    if let Some(next) = nav.next {
        buttons.push(format!("Next ({next})"));
    }
    buttons.push(format!("Last ({})", nav.last));

    let bar = buttons.join("  ");
    let bar = if nav.enabled {
        bar.cyan().to_string()
    } else {
        bar.bright_black().to_string()
    };
    format!("{bar}    Page {} of {}", nav.page, nav.pages)
}

pub async fn list(api: &dyn TodoApi, default_per_page: u32, args: TaskListArgs) -> Result<()> {
    let query = TaskQuery {
        user_id: args.user_id,
        page: args.page,
        per_page: args.per_page.unwrap_or(default_per_page),
        title: args.search.unwrap_or_default(),
        sort: args.sort,
    };

    let page = api.list_tasks(&query).await?;
    if let Err(problem) = page.check_invariants(query.per_page) {
        tracing::warn!(%problem, "server returned an inconsistent page");
    }

    if output::is_json_output() {
        output::print_item(&page, |_| {});
        return Ok(());
    }

    if page.data.is_empty() {
        output::print_message(&format!("No tasks for {}", query.user_id));
        return Ok(());
    }

    output::print_table(&page.data, |t| TaskRow::new(t, None), compact_line);

    let nav = Navigation {
        page: page.page,
        pages: page.pages,
        first: page.first,
        prev: page.prev,
        next: page.next,
        last: page.last,
        enabled: true,
    };
    output::print_message(&render_navigation(&nav));

    Ok(())
}

pub async fn add(api: &dyn TodoApi, user_id: &str, title: &str) -> Result<()> {
    validate_title(title).map_err(|message| TodoError::Validation(message.to_string()))?;

    let task = NewTask::new(user_id, title).into_task();
    let created = api.create_task(&task).await?;

    output::print_item(&created, |task| {
        output::print_message(&format!("Created task \"{}\" ({})", task.title, task.id));
    });

    Ok(())
}

pub async fn set_done(api: &dyn TodoApi, id: &str, done: bool) -> Result<()> {
    let patch = TaskPatch {
        done: Some(done),
        ..Default::default()
    };
    let updated = api.update_task(id, &patch).await?;

    output::print_item(&updated, |task| {
        let state = if task.done { "done" } else { "not done" };
        output::print_message(&format!("Marked \"{}\" as {state}", task.title));
    });

    Ok(())
}

pub async fn remove(api: &dyn TodoApi, id: &str) -> Result<()> {
    api.delete_task(id).await?;
    output::print_message(&format!("Deleted task {id}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(prev: Option<u32>, next: Option<u32>, enabled: bool) -> Navigation {
        Navigation {
            page: 2,
            pages: 3,
            first: 1,
            prev,
            next,
            last: 3,
            enabled,
        }
    }

    #[test]
    fn test_navigation_hides_missing_buttons() {
        colored::control::set_override(false);

        let bar = render_navigation(&nav(None, Some(3), true));
        assert!(bar.contains("First (1)"));
        assert!(!bar.contains("Prev"));
        assert!(bar.contains("Next (3)"));
        assert!(bar.ends_with("Page 2 of 3"));

        let bar = render_navigation(&nav(Some(1), None, false));
        assert!(bar.contains("Prev (1)"));
        assert!(!bar.contains("Next"));
    }

    #[test]
    fn test_compact_line() {
        let task = Task {
            id: "t1".into(),
            user_id: "u1".into(),
            title: "Buy milk".into(),
            done: true,
            created_at: 0,
        };
        assert_eq!(compact_line(&task), "t1\t[x]\tBuy milk");
    }
}
