//! Session-scoped data provider.
//!
//! Owns the users list, the open task page, their optimistic overlays and form state.
//! Network calls run as spawned tasks that post an [`Event`] back; the owner of the
//! session feeds those into [`Session::handle`] one at a time, so all state changes
//! happen on a single task.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::actions::{self, FormState, Mutation, RowState};
use crate::client::TodoApi;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::overlay::{FailurePolicy, MutationId, Overlay, OverlayState};
use crate::pager::{FetchTicket, NavTarget, Navigation, Refetch, TaskPager, TaskQuery};
use crate::resource::{Resolution, Resource, Seq};
use crate::route::Route;
use crate::types::{NewTask, Paginated, SortOrder, Task, User};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub per_page: u32,
    pub search_debounce: Duration,
    pub failure_policy: FailurePolicy,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            per_page: config.per_page(),
            search_debounce: config.search_debounce(),
            failure_policy: config.failure_policy(),
        }
    }
}

/// Which piece of UI submitted a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    UserForm,
    UserRow(String),
    TaskForm,
    TaskRow(String),
}

#[derive(Debug)]
pub struct Submission {
    origin: Origin,
    mutation: Mutation,
    overlay: Option<MutationId>,
    prior_input: String,
    /// Task page generation the submission belongs to.
    generation: u64,
}

#[derive(Debug)]
pub enum Event {
    Users {
        seq: Seq,
        result: Result<Vec<User>>,
    },
    Tasks {
        generation: u64,
        seq: Seq,
        result: Result<Paginated<Task>>,
    },
    Mutated {
        submission: Submission,
        result: Result<()>,
    },
    /// The search box has been quiet long enough.
    SearchSettled { generation: u64, text: String },
}

struct UsersPage {
    resource: Resource<Vec<User>>,
    overlay: Overlay<User>,
    form: FormState,
    rows: HashMap<String, RowState>,
    requested: bool,
}

struct TasksPage {
    generation: u64,
    pager: TaskPager,
    overlay: Overlay<Task>,
    form: FormState,
    rows: HashMap<String, RowState>,
    search: String,
    debouncer: Debouncer<String>,
}

pub struct Session {
    api: Arc<dyn TodoApi>,
    settings: SessionSettings,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    route: Route,
    users: UsersPage,
    tasks: Option<TasksPage>,
    generation: u64,
}

impl Session {
    pub fn new(api: Arc<dyn TodoApi>, settings: SessionSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let users = UsersPage {
            resource: Resource::default(),
            overlay: Overlay::new(settings.failure_policy),
            form: FormState::default(),
            rows: HashMap::new(),
            requested: false,
        };

        Self {
            api,
            settings,
            tx,
            rx,
            route: Route::Users,
            users,
            tasks: None,
            generation: 0,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Switch routes and start their fetches immediately.
    pub fn open(&mut self, route: Route) {
        info!(%route, "opening route");

        if !self.users.requested {
            self.refetch_users();
        }

        self.tasks = match &route {
            Route::Users => None,
            Route::Tasks { user_id } => {
                self.generation += 1;
                Some(TasksPage {
                    generation: self.generation,
                    pager: TaskPager::new(TaskQuery::new(user_id.clone(), self.settings.per_page)),
                    overlay: Overlay::new(self.settings.failure_policy),
                    form: FormState::default(),
                    rows: HashMap::new(),
                    search: String::new(),
                    debouncer: Debouncer::new(self.settings.search_debounce),
                })
            }
        };
        self.route = route;

        if self.tasks.is_some() {
            self.refetch_tasks(Refetch::default());
        }
    }

    /// Reload whatever the current route shows, keeping the current page.
    pub fn refresh(&mut self) {
        self.refetch_users();
        let page = self.tasks.as_ref().map(|t| t.pager.query().page);
        if let Some(page) = page {
            self.refetch_tasks(Refetch::page(page));
        }
    }

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver only goes away with the session itself.
            let _ = tx.send(work.await);
        });
    }

    fn refetch_users(&mut self) {
        self.users.requested = true;
        let seq = self.users.resource.begin();
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.list_users().await;
            Event::Users { seq, result }
        });
    }

    fn refetch_tasks(&mut self, overrides: Refetch) {
        let Some(page) = self.tasks.as_mut() else {
            return;
        };
        let generation = page.generation;
        let FetchTicket { seq, query } = page.pager.refetch(overrides);
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.list_tasks(&query).await;
            Event::Tasks {
                generation,
                seq,
                result,
            }
        });
    }

    fn dispatch(&self, submission: Submission) {
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = submission.mutation.run(api.as_ref()).await;
            Event::Mutated { submission, result }
        });
    }

    pub fn create_user(&mut self, email: &str) {
        if let Err(message) = actions::validate_email(email) {
            debug!(%email, reason = message, "create user rejected");
            self.users.form.reject(email, message);
            return;
        }

        let user = User::new(email);
        let overlay = self.users.overlay.apply_create(user.clone());
        self.users.form.submit();
        self.dispatch(Submission {
            origin: Origin::UserForm,
            mutation: Mutation::CreateUser(user),
            overlay: Some(overlay),
            prior_input: email.to_string(),
            generation: self.generation,
        });
    }

    pub fn delete_user(&mut self, id: &str) {
        let overlay = self.users.overlay.apply_delete(id);
        self.users.rows.insert(
            id.to_string(),
            RowState {
                pending: true,
                error: None,
            },
        );
        self.dispatch(Submission {
            origin: Origin::UserRow(id.to_string()),
            mutation: Mutation::DeleteUser(id.to_string()),
            overlay: Some(overlay),
            prior_input: String::new(),
            generation: self.generation,
        });
    }

    pub fn create_task(&mut self, title: &str) {
        let generation = self.generation;
        let Some(page) = self.tasks.as_mut() else {
            return;
        };

        if let Err(message) = actions::validate_title(title) {
            page.form.reject(title, message);
            return;
        }

        let task = NewTask::new(page.pager.query().user_id.clone(), title).into_task();
        let overlay = page.overlay.apply_create(task.clone());
        page.form.submit();
        self.dispatch(Submission {
            origin: Origin::TaskForm,
            mutation: Mutation::CreateTask(task),
            overlay: Some(overlay),
            prior_input: title.to_string(),
            generation,
        });
    }

    pub fn delete_task(&mut self, id: &str) {
        let generation = self.generation;
        let Some(page) = self.tasks.as_mut() else {
            return;
        };

        let overlay = page.overlay.apply_delete(id);
        page.rows.insert(
            id.to_string(),
            RowState {
                pending: true,
                error: None,
            },
        );
        self.dispatch(Submission {
            origin: Origin::TaskRow(id.to_string()),
            mutation: Mutation::DeleteTask(id.to_string()),
            overlay: Some(overlay),
            prior_input: String::new(),
            generation,
        });
    }

    /// Mark a task done (or not). No optimistic overlay; the list refreshes on success.
    pub fn set_task_done(&mut self, id: &str, done: bool) {
        let generation = self.generation;
        let Some(page) = self.tasks.as_mut() else {
            return;
        };

        page.rows.insert(
            id.to_string(),
            RowState {
                pending: true,
                error: None,
            },
        );
        self.dispatch(Submission {
            origin: Origin::TaskRow(id.to_string()),
            mutation: Mutation::SetTaskDone {
                id: id.to_string(),
                done,
            },
            overlay: None,
            prior_input: String::new(),
            generation,
        });
    }

    /// Update the search box now; the fetch follows after the debounce delay.
    pub fn search(&mut self, text: &str) {
        if let Some(page) = self.tasks.as_mut() {
            page.search = text.to_string();
            if page.pager.query().title == text {
                // Back to what is already shown.
                page.debouncer.cancel();
            } else {
                page.debouncer.schedule(text.to_string());
            }
        }
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.refetch_tasks(Refetch::sort(sort));
    }

    /// Follow a pagination button. Returns `false` when the button is absent or disabled.
    pub fn navigate(&mut self, target: NavTarget) -> bool {
        match self.navigation().and_then(|nav| nav.target(target)) {
            Some(page) => {
                self.refetch_tasks(Refetch::page(page));
                true
            }
            None => false,
        }
    }

    /// Wait for the next completed fetch, mutation or settled search.
    pub async fn next_event(&mut self) -> Option<Event> {
        let Session { rx, tasks, .. } = self;

        let settled = async {
            match tasks.as_mut() {
                Some(page) => {
                    let text = page.debouncer.ready().await;
                    (page.generation, text)
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            event = rx.recv() => event,
            (generation, text) = settled => Some(Event::SearchSettled { generation, text }),
        }
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Users { seq, result } => {
                if self.users.resource.resolve(seq, result) == Resolution::Applied {
                    self.users.overlay.settle();
                }
            }
            Event::Tasks {
                generation,
                seq,
                result,
            } => {
                let Some(page) = self.tasks_for(generation) else {
                    debug!(generation, "dropping tasks for a closed page");
                    return;
                };
                if page.pager.resolve(seq, result) == Resolution::Applied {
                    page.overlay.settle();
                }
            }
            Event::SearchSettled { generation, text } => {
                if self.tasks_for(generation).is_some() {
                    self.refetch_tasks(Refetch::title(text));
                }
            }
            Event::Mutated { submission, result } => self.finish(submission, result),
        }
    }

    fn tasks_for(&mut self, generation: u64) -> Option<&mut TasksPage> {
        self.tasks
            .as_mut()
            .filter(|page| page.generation == generation)
    }

    fn finish(&mut self, submission: Submission, result: Result<()>) {
        let Submission {
            origin,
            mutation,
            overlay,
            prior_input,
            generation,
        } = submission;
        let ok = result.is_ok();
        let message = mutation.failure_message();

        match origin {
            Origin::UserForm | Origin::UserRow(_) => {
                let users = &mut self.users;
                if let Some(overlay) = overlay {
                    if ok {
                        users.overlay.confirm(overlay);
                    } else {
                        users.overlay.fail(overlay);
                    }
                }
                match &origin {
                    Origin::UserForm if ok => users.form.succeed(),
                    Origin::UserForm => users.form.fail(prior_input, message),
                    Origin::UserRow(id) => finish_row(&mut users.rows, id, ok, message),
                    _ => {}
                }
                if ok {
                    self.refetch_users();
                }
            }
            Origin::TaskForm | Origin::TaskRow(_) => {
                let Some(page) = self.tasks_for(generation) else {
                    debug!(generation, "mutation finished after its page closed");
                    return;
                };
                if let Some(overlay) = overlay {
                    if ok {
                        page.overlay.confirm(overlay);
                    } else {
                        page.overlay.fail(overlay);
                    }
                }
                match &origin {
                    Origin::TaskForm if ok => page.form.succeed(),
                    Origin::TaskForm => page.form.fail(prior_input, message),
                    Origin::TaskRow(id) => finish_row(&mut page.rows, id, ok, message),
                    _ => {}
                }
                if ok {
                    self.refetch_tasks(Refetch::default());
                }
            }
        }
    }

    /// Reconciliation state of the list the current route shows.
    pub fn overlay_state(&self) -> OverlayState {
        match &self.tasks {
            Some(page) => page.overlay.state(),
            None => self.users.overlay.state(),
        }
    }

    pub fn users(&self) -> &Resource<Vec<User>> {
        &self.users.resource
    }

    /// Users as rendered: canonical list plus optimistic changes. `None` until first load.
    pub fn users_view(&self) -> Option<Vec<User>> {
        self.users
            .resource
            .data()
            .map(|users| self.users.overlay.view(users))
    }

    pub fn user_form(&self) -> &FormState {
        &self.users.form
    }

    pub fn user_row(&self, id: &str) -> Option<&RowState> {
        self.users.rows.get(id)
    }

    pub fn owner_email(&self, user_id: &str) -> Option<&str> {
        self.users
            .resource
            .data()?
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.email.as_str())
    }

    pub fn tasks(&self) -> Option<&Resource<Paginated<Task>>> {
        self.tasks.as_ref().map(|page| page.pager.resource())
    }

    pub fn tasks_view(&self) -> Option<Vec<Task>> {
        let page = self.tasks.as_ref()?;
        page.pager
            .current()
            .map(|current| page.overlay.view(&current.data))
    }

    pub fn task_query(&self) -> Option<&TaskQuery> {
        self.tasks.as_ref().map(|page| page.pager.query())
    }

    pub fn task_form(&self) -> Option<&FormState> {
        self.tasks.as_ref().map(|page| &page.form)
    }

    pub fn task_row(&self, id: &str) -> Option<&RowState> {
        self.tasks.as_ref()?.rows.get(id)
    }

    pub fn search_text(&self) -> Option<&str> {
        self.tasks.as_ref().map(|page| page.search.as_str())
    }

    pub fn navigation(&self) -> Option<Navigation> {
        self.tasks.as_ref()?.pager.navigation()
    }
}

fn finish_row(rows: &mut HashMap<String, RowState>, id: &str, ok: bool, message: &str) {
    if ok {
        rows.remove(id);
    } else {
        rows.insert(
            id.to_string(),
            RowState {
                pending: false,
                error: Some(message.to_string()),
            },
        );
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
