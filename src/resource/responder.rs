// ABOUTME: Guarantees exactly one response per custom-resource request.
// ABOUTME: Failure is the default outcome; drop without finishing still sends FAILED.

use futures::FutureExt;
use snafu::ResultExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::error::{DeliverySnafu, ResponderError};
use super::request::CustomResourceRequest;
use super::response::{CustomResourceResponse, ResponseData, ResponseStatus};
use super::transport::CallbackTransport;

const SUCCESS_REASON: &str = "completed";
const ABANDONED_REASON: &str = "handler exited without responding";

/// Owns the pending response for one request.
///
/// Created with status FAILED and empty data. `succeed` and `fail` change the
/// outcome; `finish` sends it. If the responder is dropped unsent (early return,
/// cancellation, panic unwinding through the caller) a FAILED response is
/// delivered on the current tokio runtime.
#[must_use = "an unfinished responder sends FAILED when dropped"]
pub struct Responder {
    request: CustomResourceRequest,
    transport: Arc<dyn CallbackTransport>,
    status: ResponseStatus,
    reason: String,
    data: ResponseData,
    sent: bool,
}

impl Responder {
    pub fn begin(request: CustomResourceRequest, transport: Arc<dyn CallbackTransport>) -> Self {
        Self {
            request,
            transport,
            status: ResponseStatus::Failed,
            reason: ABANDONED_REASON.to_string(),
            data: ResponseData::new(),
            sent: false,
        }
    }

    pub fn request(&self) -> &CustomResourceRequest {
        &self.request
    }

    pub fn succeed(&mut self, data: ResponseData) {
        self.status = ResponseStatus::Success;
        self.reason = SUCCESS_REASON.to_string();
        self.data = data;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = ResponseStatus::Failed;
        self.reason = reason.into();
        self.data.clear();
    }

    /// The response as it would be sent right now.
    pub fn response(&self) -> CustomResourceResponse {
        CustomResourceResponse::for_request(
            &self.request,
            self.status,
            &self.reason,
            self.data.clone(),
        )
    }

    /// Send the current outcome. Consumes the responder, so a second send is
    /// impossible; a delivery failure is returned and not retried.
    pub async fn finish(mut self) -> Result<CustomResourceResponse, ResponderError> {
        self.sent = true;
        let response = self.response();
        tracing::info!(
            logical_resource_id = %self.request.logical_resource_id,
            status = ?response.status,
            "sending custom resource response"
        );
        self.transport
            .deliver(&self.request.response_url, &response)
            .await
            .context(DeliverySnafu {
                logical_resource_id: self.request.logical_resource_id.clone(),
            })?;
        Ok(response)
    }

    /// Run a computation and send its outcome. Errors and panics become FAILED
    /// with their message as the reason.
    pub async fn complete<F, E>(mut self, computation: F) -> Result<CustomResourceResponse, ResponderError>
    where
        F: Future<Output = Result<ResponseData, E>>,
        E: Display,
    {
        match AssertUnwindSafe(computation).catch_unwind().await {
            Ok(Ok(data)) => self.succeed(data),
            Ok(Err(e)) => {
                tracing::error!(
                    logical_resource_id = %self.request.logical_resource_id,
                    "custom resource failed: {}",
                    e
                );
                self.fail(e.to_string());
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    logical_resource_id = %self.request.logical_resource_id,
                    "custom resource panicked: {}",
                    message
                );
                self.fail(message);
            }
        }
        self.finish().await
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.sent {
            return;
        }
        let response = CustomResourceResponse::for_request(
            &self.request,
            ResponseStatus::Failed,
            ABANDONED_REASON,
            ResponseData::new(),
        );
        let url = self.request.response_url.clone();
        let transport = Arc::clone(&self.transport);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    logical_resource_id = %self.request.logical_resource_id,
                    "responder dropped unsent, delivering FAILED"
                );
                handle.spawn(async move {
                    if let Err(e) = transport.deliver(&url, &response).await {
                        tracing::error!("fallback FAILED response not delivered: {}", e);
                    }
                });
            }
            Err(_) => tracing::error!(
                logical_resource_id = %self.request.logical_resource_id,
                "responder dropped outside a runtime; no response delivered"
            ),
        }
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Run `computation` for `request` and deliver exactly one response.
pub async fn respond<F, E>(
    request: CustomResourceRequest,
    transport: Arc<dyn CallbackTransport>,
    computation: F,
) -> Result<CustomResourceResponse, ResponderError>
where
    F: Future<Output = Result<ResponseData, E>>,
    E: Display,
{
    Responder::begin(request, transport)
        .complete(computation)
        .await
}
