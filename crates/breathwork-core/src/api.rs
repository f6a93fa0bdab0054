//! HTTP client for the remote persistence API.
//!
//! Endpoints:
//! - `POST /api/sessions`, `GET /api/sessions[?date=YYYY-MM-DD]`
//! - `GET /api/sessions/stats`
//! - `GET/POST /api/favorites`, `DELETE /api/favorites/:id`
//!
//! Identity is a pre-obtained session cookie; this client never logs in.
//! Requests are not retried.

use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::error::ApiError;
use crate::persistence::SessionSummary;
use crate::stats::SessionStats;
use crate::storage::{FavoritePattern, SessionRecord};

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    session_cookie: Option<String>,
    http: Client,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, session_cookie: Option<String>) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            session_cookie,
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn create_session(&self, summary: &SessionSummary) -> Result<SessionRecord, ApiError> {
        let req = self.request(Method::POST, "api/sessions")?.json(summary);
        Self::send_json(req).await
    }

    pub async fn list_sessions(&self, date: Option<NaiveDate>) -> Result<Vec<SessionRecord>, ApiError> {
        let mut req = self.request(Method::GET, "api/sessions")?;
        if let Some(date) = date {
            req = req.query(&[("date", date.format("%Y-%m-%d").to_string())]);
        }
        Self::send_json(req).await
    }

    pub async fn stats(&self) -> Result<SessionStats, ApiError> {
        Self::send_json(self.request(Method::GET, "api/sessions/stats")?).await
    }

    pub async fn list_favorites(&self) -> Result<Vec<FavoritePattern>, ApiError> {
        Self::send_json(self.request(Method::GET, "api/favorites")?).await
    }

    pub async fn add_favorite(&self, name: &str, pattern: &str) -> Result<FavoritePattern, ApiError> {
        let req = self
            .request(Method::POST, "api/favorites")?
            .json(&json!({ "name": name, "pattern": pattern }));
        Self::send_json(req).await
    }

    pub async fn delete_favorite(&self, id: i64) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("api/favorites/{id}"))?;
        Self::check(req.send().await?).await?;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(path)?;
        let mut req = self.http.request(method, url);
        if let Some(cookie) = &self.session_cookie {
            req = req.header(reqwest::header::COOKIE, cookie);
        }
        Ok(req)
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
        let resp = Self::check(req.send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/app", None).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/app/");
        assert_eq!(
            client.base_url().join("api/sessions").unwrap().as_str(),
            "http://localhost:5000/app/api/sessions"
        );
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            ApiClient::new("localhost", None),
            Err(ApiError::Url(_))
        ));
    }
}
