//! HTTP client for the inventory backend.
//!
//! Every endpoint answers with a `{message, data}` envelope; the client
//! unwraps it and turns non-success statuses into [`ApiError`]s.

use crate::api::ApiError;
use crate::config::ApiConfig;
use crate::models::{Envelope, LoginRequest, LoginResponse, Resource};
use crate::session::Session;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Client bound to one backend and, optionally, one session token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout_seconds: u64,
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// A signed-in session's token is sent as a bearer token on every request.
    pub fn new(config: &ApiConfig, session: &Session) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: session.token.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    seconds: self.timeout_seconds,
                }
            } else if e.is_connect() {
                ApiError::Connect {
                    url: self.base_url.clone(),
                }
            } else {
                ApiError::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!("{} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// `GET /{resource}`, returning the unwrapped list.
    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ApiError> {
        debug!("Fetching {}", resource);
        let envelope: Envelope<Vec<T>> = self.send(self.request(Method::GET, resource.path())).await?;
        debug!(
            "Fetched {} {}: {}",
            envelope.data.len(),
            resource,
            envelope.message
        );
        Ok(envelope.data)
    }

    /// `POST /{resource}` with a JSON body.
    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> Result<Envelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        info!("Creating record in {}", resource);
        self.send(self.request(Method::POST, resource.path()).json(body))
            .await
    }

    /// `POST /auth/login`.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        info!("Signing in as {}", credentials.email);
        let envelope: Envelope<LoginResponse> = self
            .send(self.request(Method::POST, "auth/login").json(credentials))
            .await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateExpenseRequest, Expense, Sale};
    use rust_decimal::Decimal;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Serve one canned response; the handle yields the raw request.
    async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client_for(base_url: &str, token: Option<&str>) -> ApiClient {
        let config = ApiConfig {
            base_url: format!("{}/api/", base_url),
            timeout_seconds: 5,
        };
        let session = Session {
            token: token.map(String::from),
            user: None,
        };
        let mut client = ApiClient::new(&config, &session).unwrap();
        // Keep requests to the local responder away from any proxy in the environment.
        client.http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_list_unwraps_envelope() {
        let (url, server) = serve_once(
            200,
            r#"{"message": "ok", "data": [{"id": 1, "date": "2024-01-15", "amount": 100}]}"#,
        )
        .await;
        let client = client_for(&url, Some("secret-token"));

        let sales: Vec<Sale> = client.list(Resource::Sales).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].amount, Some(Decimal::from(100)));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/sales HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_authorization() {
        let (url, server) = serve_once(200, r#"{"message": "", "data": []}"#).await;
        let client = client_for(&url, None);

        let expenses: Vec<Expense> = client.list(Resource::Expenses).await.unwrap();
        assert!(expenses.is_empty());

        let request = server.await.unwrap();
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_create_posts_json_body() {
        let (url, server) = serve_once(
            201,
            r#"{"message": "Expense recorded", "data": {"id": 9, "amount": "45.00", "date": "2024-03-01"}}"#,
        )
        .await;
        let client = client_for(&url, None);

        let payload = CreateExpenseRequest {
            category: "Utilities".to_string(),
            description: None,
            amount: Decimal::from(45),
            date: "2024-03-01".to_string(),
        };
        let envelope: Envelope<Expense> =
            client.create(Resource::Expenses, &payload).await.unwrap();
        assert_eq!(envelope.message, "Expense recorded");
        assert_eq!(envelope.data.id, 9);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/expenses HTTP/1.1"));
        assert!(request.contains("\"category\":\"Utilities\""));
    }

    #[tokio::test]
    async fn test_error_status_surfaces_message() {
        let (url, _server) =
            serve_once(401, r#"{"message": "Session expired", "data": null}"#).await;
        let client = client_for(&url, Some("stale"));

        let err = client.list::<Sale>(Resource::Sales).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Session expired"));
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let (url, server) = serve_once(
            200,
            r#"{"message": "Welcome", "data": {"token": "abc", "user": {"email": "a@b.test"}}}"#,
        )
        .await;
        let client = client_for(&url, None);

        let login = client
            .login(&LoginRequest {
                email: "a@b.test".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.token, "abc");
        assert_eq!(login.user.map(|u| u.email).as_deref(), Some("a@b.test"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/auth/login HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let (url, _server) = serve_once(200, "<html>maintenance</html>").await;
        let client = client_for(&url, None);

        let err = client.list::<Sale>(Resource::Sales).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr), None);
        let err = client.list::<Sale>(Resource::Sales).await.unwrap_err();
        assert!(matches!(err, ApiError::Connect { .. }));
    }

    #[test]
    fn test_url_joining() {
        let client = client_for("http://localhost:8000", None);
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/sales"), "http://localhost:8000/api/sales");
        assert_eq!(client.url("auth/login"), "http://localhost:8000/api/auth/login");
    }
}
