//! PostgREST backend
//!
//! Talks to a PostgREST-compatible API (the REST interface of a hosted
//! Supabase project). Tables live under `<base>/rest/v1/<table>`.
//!
//! - Nested read: `GET servers?select=*,ips(*,domains(*))`
//! - Filters: `?id=eq.<id>`, `?ip_id=eq.<id>`, `?assigned_user_id=eq.<id>`
//! - Inserts send `Prefer: return=representation` and read the stored rows
//!   back from the response body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::{RemoteError, RemoteResult};
use super::rows::{
    DomainRow, IpRow, NewDomainRow, NewIpRow, NewServerRow, NewUserRow, ServerPatchRow,
    ServerRow, UserPatchRow, UserRow, DOMAINS_TABLE, IPS_TABLE, SERVERS_TABLE, USERS_TABLE,
};
use super::Backend;
use crate::config::Config;

/// Embedded select for the servers → ips → domains chain
const NESTED_SERVER_SELECT: &str = "*,ips(*,domains(*))";

/// PostgREST implementation of `Backend`
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    /// Create a backend for `base_url`, authenticating with `api_key` if set
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> RemoteResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|_| RemoteError::NotConfigured("api_key is not a valid header value".into()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| RemoteError::NotConfigured("api_key is not a valid header value".into()))?;
            headers.insert("apikey", apikey);
            headers.insert(reqwest::header::AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a backend from `rest_url` / `api_key` in the configuration
    pub fn from_config(config: &Config) -> RemoteResult<Self> {
        let Some(ref url) = config.rest_url else {
            return Err(RemoteError::NotConfigured(
                "rest_url must be set when backend = \"rest\"".into(),
            ));
        };
        Self::new(url, config.api_key.as_deref(), config.request_timeout())
    }

    /// URL of a table endpoint
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client.request(method, self.table_url(table))
    }

    fn select_all(&self, table: &str, select: &str) -> RequestBuilder {
        self.request(Method::GET, table).query(&[("select", select)])
    }

    fn insert<T: Serialize + ?Sized>(&self, table: &str, body: &T) -> RequestBuilder {
        self.request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
    }

    fn update<T: Serialize + ?Sized>(&self, table: &str, column: &str, value: &str, body: &T) -> RequestBuilder {
        self.request(Method::PATCH, table)
            .query(&[(column, eq_filter(value))])
            .json(body)
    }

    fn delete(&self, table: &str, column: &str, value: &str) -> RequestBuilder {
        self.request(Method::DELETE, table)
            .query(&[(column, eq_filter(value))])
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> RemoteResult<T> {
        let response = Self::send(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(request: RequestBuilder) -> RemoteResult<()> {
        Self::send(request).await.map(|_| ())
    }

    async fn send(request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!("Backend responded {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// PostgREST equality filter value
fn eq_filter(value: &str) -> String {
    format!("eq.{}", value)
}

/// Take the single row a one-row insert returns
fn single<T>(rows: Vec<T>, table: &str) -> RemoteResult<T> {
    rows.into_iter().next().ok_or_else(|| {
        RemoteError::UnexpectedResponse(format!("insert into {} returned no rows", table))
    })
}

#[async_trait]
impl Backend for RestBackend {
    async fn fetch_users(&self) -> RemoteResult<Vec<UserRow>> {
        Self::send_json(self.select_all(USERS_TABLE, "*")).await
    }

    async fn fetch_servers_nested(&self) -> RemoteResult<Vec<ServerRow>> {
        Self::send_json(self.select_all(SERVERS_TABLE, NESTED_SERVER_SELECT)).await
    }

    async fn insert_server(&self, row: &NewServerRow) -> RemoteResult<ServerRow> {
        let rows: Vec<ServerRow> = Self::send_json(self.insert(SERVERS_TABLE, row)).await?;
        single(rows, SERVERS_TABLE)
    }

    async fn update_server(&self, id: &str, patch: &ServerPatchRow) -> RemoteResult<()> {
        Self::send_empty(self.update(SERVERS_TABLE, "id", id, patch)).await
    }

    async fn delete_server(&self, id: &str) -> RemoteResult<()> {
        Self::send_empty(self.delete(SERVERS_TABLE, "id", id)).await
    }

    async fn insert_ips(&self, rows: &[NewIpRow]) -> RemoteResult<Vec<IpRow>> {
        Self::send_json(self.insert(IPS_TABLE, rows)).await
    }

    async fn delete_ip(&self, id: &str) -> RemoteResult<()> {
        Self::send_empty(self.delete(IPS_TABLE, "id", id)).await
    }

    async fn delete_domains_for_ip(&self, ip_id: &str) -> RemoteResult<()> {
        Self::send_empty(self.delete(DOMAINS_TABLE, "ip_id", ip_id)).await
    }

    async fn insert_domains(&self, rows: &[NewDomainRow]) -> RemoteResult<Vec<DomainRow>> {
        Self::send_json(self.insert(DOMAINS_TABLE, rows)).await
    }

    async fn insert_user(&self, row: &NewUserRow) -> RemoteResult<UserRow> {
        let rows: Vec<UserRow> = Self::send_json(self.insert(USERS_TABLE, row)).await?;
        single(rows, USERS_TABLE)
    }

    async fn update_user(&self, id: &str, row: &UserPatchRow) -> RemoteResult<()> {
        Self::send_empty(self.update(USERS_TABLE, "id", id, row)).await
    }

    async fn unassign_user(&self, user_id: &str) -> RemoteResult<()> {
        let patch = ServerPatchRow {
            assigned_user_id: Some(None),
            ..ServerPatchRow::default()
        };
        Self::send_empty(self.update(SERVERS_TABLE, "assigned_user_id", user_id, &patch)).await
    }

    async fn delete_user(&self, id: &str) -> RemoteResult<()> {
        Self::send_empty(self.delete(USERS_TABLE, "id", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RestBackend {
        RestBackend::new(
            "https://project.supabase.co/",
            Some("anon-key"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        assert_eq!(
            backend().table_url("servers"),
            "https://project.supabase.co/rest/v1/servers"
        );
    }

    #[test]
    fn test_nested_select_query() {
        let request = backend()
            .select_all(SERVERS_TABLE, NESTED_SERVER_SELECT)
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![("select".to_string(), "*,ips(*,domains(*))".to_string())]
        );
    }

    #[test]
    fn test_delete_uses_eq_filter() {
        let request = backend().delete(DOMAINS_TABLE, "ip_id", "ip-42").build().unwrap();

        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/rest/v1/domains");
        assert_eq!(request.url().query(), Some("ip_id=eq.ip-42"));
    }

    #[test]
    fn test_insert_requests_representation() {
        let row = NewUserRow {
            name: "Alice".to_string(),
        };
        let request = backend().insert(USERS_TABLE, &row).build().unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.headers().get("Prefer").unwrap(),
            "return=representation"
        );
    }

    #[test]
    fn test_single_requires_a_row() {
        let empty: Vec<UserRow> = Vec::new();
        assert!(matches!(
            single(empty, USERS_TABLE),
            Err(RemoteError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = Config::default();
        assert!(matches!(
            RestBackend::from_config(&config),
            Err(RemoteError::NotConfigured(_))
        ));
    }
}
