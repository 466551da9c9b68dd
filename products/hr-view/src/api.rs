use std::future::Future;

use platform_api::MessageBody;
use platform_authn::LoginRequest;
use products_hr::{DeletedEmployee, Employee, EmployeeId, EmployeeInput};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The request never produced a response.
    #[error("Network error")]
    Network(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Status { status: 401, .. })
    }
}

/// Transport used by the view controller.
pub trait EmployeeApi {
    fn list(&self) -> impl Future<Output = ClientResult<Vec<Employee>>> + Send;
    fn get(&self, id: EmployeeId) -> impl Future<Output = ClientResult<Employee>> + Send;
    fn create(&self, input: &EmployeeInput) -> impl Future<Output = ClientResult<Employee>> + Send;
    fn update(
        &self,
        id: EmployeeId,
        input: &EmployeeInput,
    ) -> impl Future<Output = ClientResult<Employee>> + Send;
    fn delete(&self, id: EmployeeId) -> impl Future<Output = ClientResult<DeletedEmployee>> + Send;
    fn login(&self, email: &str, password: &str)
    -> impl Future<Output = ClientResult<String>> + Send;
    fn logout(&self) -> impl Future<Output = ClientResult<String>> + Send;
}

/// `reqwest` client holding the session cookie between calls.
#[derive(Clone, Debug)]
pub struct HttpEmployeeApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEmployeeApi {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|err| ClientError::Network(err.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> ClientError {
    let message = response
        .json::<MessageBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    tracing::debug!(status = status.as_u16(), %message, "request rejected");
    ClientError::Status {
        status: status.as_u16(),
        message,
    }
}

impl EmployeeApi for HttpEmployeeApi {
    async fn list(&self) -> ClientResult<Vec<Employee>> {
        self.send(self.request(Method::GET, "/api/employees"))
            .await
    }

    async fn get(&self, id: EmployeeId) -> ClientResult<Employee> {
        self.send(self.request(Method::GET, &format!("/api/employees/{id}")))
            .await
    }

    async fn create(&self, input: &EmployeeInput) -> ClientResult<Employee> {
        self.send(self.request(Method::POST, "/api/employees").json(input))
            .await
    }

    async fn update(&self, id: EmployeeId, input: &EmployeeInput) -> ClientResult<Employee> {
        self.send(
            self.request(Method::PUT, &format!("/api/employees/{id}"))
                .json(input),
        )
        .await
    }

    async fn delete(&self, id: EmployeeId) -> ClientResult<DeletedEmployee> {
        self.send(self.request(Method::DELETE, &format!("/api/employees/{id}")))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<String> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let reply: MessageBody = self
            .send(self.request(Method::POST, "/api/login").json(&body))
            .await?;
        Ok(reply.message)
    }

    async fn logout(&self) -> ClientResult<String> {
        let reply: MessageBody = self
            .send(self.request(Method::POST, "/api/logout"))
            .await?;
        Ok(reply.message)
    }
}
