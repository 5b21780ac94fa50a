//! Thin REST client for the to-do API.
//!
//! Every call sends `Authorization: Bearer <token>`. Non-2xx replies become errors naming the
//! status, plus the API's error message when it sends one.
use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::models::{Category, ErrorResponse, Todo};

pub struct ApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("todo-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    pub async fn list_todos(
        &self,
        is_done: Option<bool>,
        category_id: Option<&str>,
    ) -> Result<Vec<Todo>> {
        let mut query = Vec::new();
        if let Some(is_done) = is_done {
            query.push(("isDone", is_done.to_string()));
        }
        if let Some(category_id) = category_id {
            query.push(("categoryID", category_id.to_string()));
        }

        json_body(self.request(Method::GET, "/todos").query(&query).send().await?).await
    }

    pub async fn add_todo(&self, content: &str, category_id: Option<&str>) -> Result<Todo> {
        let body = json!({"content": content, "isDone": false, "categoryID": category_id});
        json_body(self.request(Method::POST, "/todos").json(&body).send().await?).await
    }

    pub async fn get_todo(&self, id: &str) -> Result<Todo> {
        json_body(self.request(Method::GET, &todo_path(id)).send().await?).await
    }

    pub async fn update_todo(&self, id: &str, changes: &Value) -> Result<Todo> {
        let res = self
            .request(Method::PATCH, &todo_path(id))
            .json(changes)
            .send()
            .await?;
        json_body(res).await
    }

    /// Sends the whole item back with `isDone` flipped.
    pub async fn set_completeness(&self, mut todo: Todo, is_done: bool) -> Result<Todo> {
        todo.is_done = is_done;
        let res = self
            .request(Method::PUT, &todo_path(&todo.id))
            .json(&todo)
            .send()
            .await?;
        json_body(res).await
    }

    pub async fn delete_todo(&self, id: &str) -> Result<()> {
        no_body(self.request(Method::DELETE, &todo_path(id)).send().await?).await
    }

    pub async fn list_categories(&self, name: Option<&str>) -> Result<Vec<Category>> {
        let query: Vec<(&str, &str)> = name.map(|n| ("name", n)).into_iter().collect();
        json_body(self.request(Method::GET, "/categories").query(&query).send().await?).await
    }

    pub async fn add_category(&self, name: &str) -> Result<Category> {
        let body = json!({"name": name});
        json_body(self.request(Method::POST, "/categories").json(&body).send().await?).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<()> {
        no_body(self.request(Method::DELETE, &category_path(id)).send().await?).await
    }

    /// Resolves a category name to its id.
    pub async fn category_id(&self, name: &str) -> Result<String> {
        self.list_categories(Some(name))
            .await?
            .into_iter()
            .next()
            .map(|c| c.id)
            .ok_or_else(|| anyhow!("no category named {:?}", name))
    }
}

fn todo_path(id: &str) -> String {
    format!("/todos/{}", id)
}

fn category_path(id: &str) -> String {
    format!("/categories/{}", id)
}

async fn json_body<T: DeserializeOwned>(res: Response) -> Result<T> {
    let res = check(res).await?;
    res.json().await.context("unexpected response body")
}

async fn no_body(res: Response) -> Result<()> {
    check(res).await.map(|_| ())
}

async fn check(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    match status {
        StatusCode::UNAUTHORIZED => bail!("401 Unauthorized: missing or invalid token"),
        StatusCode::FORBIDDEN => bail!("403 Forbidden: the record belongs to another user"),
        StatusCode::NOT_FOUND => bail!("404 Not Found"),
        _ => {
            let text = res.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(err) => bail!("{}: {} ({})", status, err.error.message, err.error.code),
                Err(_) => bail!("{}: {}", status, text),
            }
        }
    }
}
