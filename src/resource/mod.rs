// ABOUTME: Custom-resource protocol: request, response, responder, delivery.
// ABOUTME: The responder sends exactly one response per request.

mod error;
mod request;
mod responder;
mod response;
mod transport;

pub use error::{ResponderError, ResponderErrorKind};
pub use request::{CustomResourceRequest, RequestType};
pub use responder::{Responder, respond};
pub use response::{CustomResourceResponse, ResponseData, ResponseStatus};
pub use transport::{CallbackTransport, HttpCallback, RecordingTransport, TransportError};

pub(crate) use responder::panic_message;
pub(crate) use response::truncate_chars;
