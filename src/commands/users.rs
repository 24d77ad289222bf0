use tabled::Tabled;

use crate::actions::validate_email;
use crate::client::TodoApi;
use crate::error::{Result, TodoError};
use crate::output::{self, truncate};
use crate::types::User;

#[derive(Tabled)]
pub struct UserRow {
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            email: truncate(&user.email, 50),
            id: user.id.clone(),
        }
    }
}

pub fn compact_line(user: &User) -> String {
    format!("{}\t{}", user.id, user.email)
}

pub async fn list(api: &dyn TodoApi) -> Result<()> {
    let users = api.list_users().await?;

    if users.is_empty() {
        output::print_message("No users");
        return Ok(());
    }

    output::print_table(&users, |u| UserRow::from(u), compact_line);

    Ok(())
}

pub async fn add(api: &dyn TodoApi, email: &str) -> Result<()> {
    validate_email(email).map_err(|message| TodoError::Validation(message.to_string()))?;

    let created = api.create_user(&User::new(email)).await?;

    output::print_item(&created, |user| {
        output::print_message(&format!("Created user {} ({})", user.email, user.id));
    });

    Ok(())
}

pub async fn remove(api: &dyn TodoApi, id: &str) -> Result<()> {
    api.delete_user(id).await?;
    output::print_message(&format!("Deleted user {id}"));
    Ok(())
}
