use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Result, TodoError};
use crate::pager::TaskQuery;
use crate::types::{Paginated, Task, TaskPatch, User};

/// Request/response mapping for the users and tasks resources.
///
/// No retries, no caching, no dedup of identical in-flight requests: every call is one
/// HTTP round trip and any failure is handed straight back to the caller.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn create_user(&self, user: &User) -> Result<User>;

    async fn delete_user(&self, id: &str) -> Result<()>;

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Paginated<Task>>;

    async fn create_task(&self, task: &Task) -> Result<Task>;

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task>;

    async fn delete_task(&self, id: &str) -> Result<()>;
}

pub struct TodoClient {
    http: Client,
    base_url: Url,
}

impl TodoClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TodoError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();

        debug!(url = %response.url(), status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(TodoError::Api {
                status: status.as_u16(),
                message: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response body>".to_string()),
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TodoApi for TodoClient {
    async fn list_users(&self) -> Result<Vec<User>> {
        let url = self.endpoint(&["users"])?;
        debug!(%url, "listing users");
        self.send_json(self.http.get(url)).await
    }

    async fn create_user(&self, user: &User) -> Result<User> {
        let url = self.endpoint(&["users"])?;
        debug!(%url, id = %user.id, "creating user");
        self.send_json(self.http.post(url).json(user)).await
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["users", id])?;
        debug!(%url, "deleting user");
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Paginated<Task>> {
        let url = self.endpoint(&["tasks"])?;
        debug!(%url, ?query, "listing tasks");
        let page: Paginated<Task> = self
            .send_json(self.http.get(url).query(&query.to_params()))
            .await?;
        Ok(page.with_requested_page(query.page))
    }

    async fn create_task(&self, task: &Task) -> Result<Task> {
        let url = self.endpoint(&["tasks"])?;
        debug!(%url, id = %task.id, "creating task");
        self.send_json(self.http.post(url).json(task)).await
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(%url, ?patch, "updating task");
        self.send_json(self.http.patch(url).json(patch)).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["tasks", id])?;
        debug!(%url, "deleting task");
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}
