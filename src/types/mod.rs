mod page;
mod task;
mod user;

pub use page::Paginated;
pub use task::{NewTask, SortOrder, Task, TaskPatch};
pub use user::User;

/// Anything with a stable string identity that can sit in an optimistic overlay.
pub trait Entity {
    fn id(&self) -> &str;
}
