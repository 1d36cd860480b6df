//! HTTP remote endpoint over the hyper-util client.
//!
//! # Responsibilities
//! - Resolve an instance of the service for each call
//! - Forward the request ID of the inbound request
//! - Map the response to a [`CallOutcome`]
//! - Report transport failures to the pool (passive health)

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Uri};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::request::X_REQUEST_ID;
use crate::load_balancer::ServicePool;
use crate::remote::RemoteEndpoint;
use crate::resilience::error::{CallError, CallOutcome};

/// Largest response body read from a remote.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct HttpRemote {
    client: Client<HttpConnector, Body>,
    pool: Arc<ServicePool>,
}

impl HttpRemote {
    pub fn new(pool: Arc<ServicePool>, connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client, pool }
    }
}

impl RemoteEndpoint for HttpRemote {
    fn get(&self, path: &str, request_id: Option<String>) -> BoxFuture<'static, CallOutcome> {
        let client = self.client.clone();
        let pool = self.pool.clone();
        let path = path.to_string();
        async move { fetch(client, pool, &path, request_id).await }.boxed()
    }
}

async fn fetch(
    client: Client<HttpConnector, Body>,
    pool: Arc<ServicePool>,
    path: &str,
    request_id: Option<String>,
) -> CallOutcome {
    let instance = pool
        .resolve()
        .ok_or_else(|| CallError::RemoteFailure(format!("no instance of '{}' available", pool.name())))?;

    let url = instance
        .base_url
        .join(path)
        .map_err(|e| CallError::RemoteFailure(format!("invalid path '{path}': {e}")))?;
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|e| CallError::RemoteFailure(format!("invalid uri '{url}': {e}")))?;

    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(id) = &request_id {
        builder = builder.header(X_REQUEST_ID, id.as_str());
    }
    let request = builder
        .body(Body::empty())
        .map_err(|e| CallError::RemoteFailure(format!("failed to build request: {e}")))?;

    tracing::debug!(
        service = %pool.name(),
        instance = %instance.addr,
        path = %path,
        request_id = request_id.as_deref().unwrap_or("none"),
        "Calling remote"
    );

    let response = match client.request(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(service = %pool.name(), instance = %instance.addr, error = %e, "Remote unreachable");
            pool.report_failure(&instance);
            return Err(CallError::RemoteFailure(format!("{} unreachable: {e}", instance.addr)));
        }
    };
    pool.report_success(&instance);

    let status = response.status();
    let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
        .await
        .map_err(|e| CallError::RemoteFailure(format!("failed to read body from {}: {e}", instance.addr)))?;
    let payload = String::from_utf8_lossy(&bytes).into_owned();

    if status.is_success() {
        Ok(payload)
    } else {
        tracing::debug!(instance = %instance.addr, status = %status, "Remote answered with error status");
        Err(CallError::RemoteFailure(format!("{} answered {status}: {payload}", instance.addr)))
    }
}
