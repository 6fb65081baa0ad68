//! Fakes shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value, json};
use tokenwarden_domain::{
    ApiRequest, ApiResponse, AuthError, AuthResult, HttpMethod, RequestBody, SessionState,
};

use crate::ports::{Clock, HttpTransport, SessionRepository, SessionStoreError};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at_epoch_secs(secs: i64) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(DateTime::from_timestamp(secs, 0).expect("valid timestamp")),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("Lock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("Lock poisoned")
    }
}

/// Builder for unsigned test tokens.
#[derive(Default)]
pub struct JwtBuilder {
    claims: Map<String, Value>,
}

pub fn jwt() -> JwtBuilder {
    JwtBuilder::default()
}

impl JwtBuilder {
    pub fn exp(mut self, exp: i64) -> Self {
        self.claims.insert("exp".into(), json!(exp));
        self
    }

    pub fn fingerprint(mut self, fingerprint: &str) -> Self {
        self.claims.insert("fingerprint".into(), json!(fingerprint));
        self
    }

    pub fn totp(mut self) -> Self {
        self.claims.insert("totp".into(), json!(true));
        self
    }

    pub fn sub(mut self, sub: &str) -> Self {
        self.claims.insert("sub".into(), json!(sub));
        self
    }

    pub fn build(self) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(Value::Object(self.claims).to_string());
        format!("{header}.{payload}.signature")
    }
}

/// What the fake transport saw.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
    pub request: ApiRequest,
}

type Handler = dyn Fn(&ApiRequest) -> AuthResult<ApiResponse> + Send + Sync;

/// Scripted transport that records every request.
pub struct FakeTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
    delays: Mutex<HashMap<String, StdDuration>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest) -> AuthResult<ApiResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
        })
    }

    /// Makes every request to `path` sleep before answering.
    pub fn delay(&self, path: &str, by: StdDuration) {
        self.delays
            .lock()
            .expect("Lock poisoned")
            .insert(path.to_string(), by);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("Lock poisoned").clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .expect("Lock poisoned")
            .iter()
            .filter(|c| c.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("Lock poisoned").len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> AuthResult<ApiResponse> {
        self.calls.lock().expect("Lock poisoned").push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            bearer: request.bearer_token().map(str::to_string),
            body: request.body.clone(),
            request: request.clone(),
        });

        let delay = self
            .delays
            .lock()
            .expect("Lock poisoned")
            .get(&request.path)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        (self.handler)(request)
    }
}

pub fn ok_json(body: &Value) -> AuthResult<ApiResponse> {
    Ok(ApiResponse::new(200, "OK", body.to_string()))
}

pub fn status(code: u16, body: &Value) -> AuthResult<ApiResponse> {
    let text = match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        _ => "Error",
    };
    Ok(ApiResponse::new(code, text, body.to_string()))
}

pub fn unauthorized() -> AuthResult<ApiResponse> {
    status(401, &json!({ "detail": "Could not validate credentials" }))
}

pub fn network_down() -> AuthResult<ApiResponse> {
    Err(AuthError::network("connection refused"))
}

pub fn pair_json(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    })
}

pub fn profile_json() -> Value {
    json!({
        "id": "u1",
        "email": "ada@example.com",
        "email_validated": false,
        "is_active": true,
        "is_superuser": false,
        "full_name": "Ada",
        "password": true,
        "totp": false,
    })
}

/// In-memory session repository.
#[derive(Default)]
pub struct MemoryRepository {
    pub state: Mutex<Option<SessionState>>,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stored(&self) -> Option<SessionState> {
        self.state.lock().expect("Lock poisoned").clone()
    }
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn load(&self) -> Result<Option<SessionState>, SessionStoreError> {
        Ok(self.stored())
    }

    async fn save(&self, state: &SessionState) -> Result<(), SessionStoreError> {
        *self.state.lock().expect("Lock poisoned") = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        *self.state.lock().expect("Lock poisoned") = None;
        Ok(())
    }
}
