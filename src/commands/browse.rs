use colored::Colorize;
use tabled::Tabled;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::tasks::{render_navigation, TaskRow};
use crate::error::Result;
use crate::output::{render_table, truncate};
use crate::overlay::OverlayState;
use crate::pager::NavTarget;
use crate::route::Route;
use crate::session::{Event, Session};
use crate::types::SortOrder;

const HELP: &str = "\
Commands:
  open ROUTE      switch route (\"/\" or \"/<user-id>/tasks\")
  tasks ID        open a user's tasks
  add TEXT        create a user (on /) or a task (on a task page)
  rm ID           delete a user or a task
  done ID         mark a task done (undo ID to reopen)
  s TEXT          search task titles (s alone clears)
  sort [asc|desc] sort tasks by creation time (toggles without an argument)
  first, prev, next, last
  r               refresh
  help, q";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Open(Route),
    Add(String),
    Remove(String),
    Done(String, bool),
    Search(String),
    Sort(SortOrder),
    ToggleSort,
    Navigate(NavTarget),
    Refresh,
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let require = |what: &str| {
        if rest.is_empty() {
            Err(format!("{word}: missing {what}"))
        } else {
            Ok(rest.to_string())
        }
    };

    match word {
        "open" | "o" => Route::parse(rest)
            .map(Command::Open)
            .map_err(|e| e.to_string()),
        "tasks" | "t" => require("user id").map(|id| Command::Open(Route::Tasks { user_id: id })),
        "users" | "u" => Ok(Command::Open(Route::Users)),
        "add" | "a" => require("text").map(Command::Add),
        "rm" | "del" => require("id").map(Command::Remove),
        "done" => require("id").map(|id| Command::Done(id, true)),
        "undo" => require("id").map(|id| Command::Done(id, false)),
        "s" | "search" => Ok(Command::Search(rest.to_string())),
        "sort" if rest.is_empty() => Ok(Command::ToggleSort),
        "sort" => rest.parse().map(Command::Sort),
        "first" => Ok(Command::Navigate(NavTarget::First)),
        "prev" | "p" => Ok(Command::Navigate(NavTarget::Prev)),
        "next" | "n" => Ok(Command::Navigate(NavTarget::Next)),
        "last" => Ok(Command::Navigate(NavTarget::Last)),
        "r" | "refresh" => Ok(Command::Refresh),
        "help" | "?" | "" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other} (try help)")),
    }
}

enum Input {
    Line(Option<String>),
    Event(Option<Event>),
}

pub async fn run(session: &mut Session, route: Route) -> Result<()> {
    session.open(route);
    println!("{HELP}");
    render(session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            event = session.next_event() => Input::Event(event),
        };

        match input {
            Input::Line(None) | Input::Event(None) => break,
            Input::Line(Some(line)) => match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => apply(session, command),
                Err(message) => println!("{}", message.red()),
            },
            Input::Event(Some(event)) => session.handle(event),
        }
        render(session);
    }

    Ok(())
}

fn apply(session: &mut Session, command: Command) {
    let on_tasks = matches!(session.route(), Route::Tasks { .. });

    match command {
        Command::Open(route) => session.open(route),
        Command::Add(text) if on_tasks => session.create_task(&text),
        Command::Add(text) => session.create_user(&text),
        Command::Remove(id) if on_tasks => session.delete_task(&id),
        Command::Remove(id) => session.delete_user(&id),
        Command::Done(id, done) if on_tasks => session.set_task_done(&id, done),
        Command::Search(text) if on_tasks => session.search(&text),
        Command::Sort(sort) if on_tasks => session.set_sort(sort),
        Command::ToggleSort if on_tasks => {
            let sort = session.task_query().map(|q| q.sort.toggled()).unwrap_or_default();
            session.set_sort(sort);
        }
        Command::Navigate(target) if on_tasks => {
            if !session.navigate(target) {
                println!("{}", "That page is not available right now".yellow());
            }
        }
        Command::Refresh => session.refresh(),
        Command::Help => println!("{HELP}"),
        Command::Done(..)
        | Command::Search(_)
        | Command::Sort(_)
        | Command::ToggleSort
        | Command::Navigate(_) => {
            println!("{}", "Open a task page first (tasks <user-id>)".yellow());
        }
        Command::Quit => {}
    }
}

#[derive(Tabled)]
struct UserLine {
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "")]
    status: String,
}

fn row_status(pending: bool, error: Option<&str>) -> String {
    match (pending, error) {
        (true, _) => "…".bright_black().to_string(),
        (false, Some(error)) => error.red().to_string(),
        (false, None) => String::new(),
    }
}

fn render_form(label: &str, input: &str, pending: bool, error: Option<&str>) {
    let mut line = format!("{label}: [{input}]");
    if pending {
        line.push_str(" (saving…)");
    }
    println!("{line}");
    if let Some(error) = error {
        println!("{}", error.red());
    }
}

fn dim_if(text: String, stale: bool) -> String {
    if stale {
        text.dimmed().to_string()
    } else {
        text
    }
}

fn render(session: &Session) {
    println!();
    if session.overlay_state() != OverlayState::Synced {
        println!("{}", "(unsaved changes pending)".bright_black());
    }
    match session.route().clone() {
        Route::Users => render_users(session),
        Route::Tasks { user_id } => render_tasks(session, &user_id),
    }
}

fn render_users(session: &Session) {
    println!("{}", "Users:".bold());

    let form = session.user_form();
    render_form("New user", &form.input, form.is_pending(), form.error.as_deref());

    let resource = session.users();
    if let Some(error) = resource.error() {
        println!("{}", format!("Something went wrong: {error}").red());
        return;
    }
    if resource.is_first_load() {
        println!("Loading...");
        return;
    }
    let Some(users) = session.users_view() else {
        return;
    };

    let rows = users.iter().map(|user| {
        let row = session.user_row(&user.id);
        UserLine {
            email: truncate(&user.email, 50),
            id: user.id.clone(),
            status: row_status(
                row.is_some_and(|r| r.pending),
                row.and_then(|r| r.error.as_deref()),
            ),
        }
    });
    println!("{}", dim_if(render_table(rows), resource.is_stale()));
}

fn render_tasks(session: &Session, user_id: &str) {
    let owner = session.owner_email(user_id).unwrap_or(user_id);
    println!("{}", format!("Tasks of user: {owner}").bold());

    if let Some(form) = session.task_form() {
        render_form("New task", &form.input, form.is_pending(), form.error.as_deref());
    }
    if let (Some(search), Some(query)) = (session.search_text(), session.task_query()) {
        println!("Search: [{search}]  Sort: {}", query.sort);
    }

    let Some(resource) = session.tasks() else {
        return;
    };
    if let Some(error) = resource.error() {
        println!("{}", format!("Something went wrong: {error}").red());
        return;
    }
    if resource.is_first_load() {
        println!("Loading...");
        return;
    }
    let Some(tasks) = session.tasks_view() else {
        return;
    };

    if tasks.is_empty() {
        println!("{}", dim_if("No tasks".to_string(), resource.is_stale()));
    } else {
        let table = render_table(tasks.iter().map(|task| {
            let mut row = TaskRow::new(task, session.owner_email(&task.user_id));
            if let Some(state) = session.task_row(&task.id) {
                row = row.with_status(row_status(state.pending, state.error.as_deref()));
            }
            row
        }));
        println!("{}", dim_if(table, resource.is_stale()));
    }

    if let Some(nav) = session.navigation() {
        println!("{}", render_navigation(&nav));
    }
}
