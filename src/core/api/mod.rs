//! Backend API access
//!
//! - [`transport`] - HTTP abstraction with reqwest and gloo-net implementations
//! - [`pipeline`] - authenticated request pipeline with one-shot token refresh
//! - [`error`] - error taxonomy shared by every API call

pub mod error;
pub mod pipeline;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use error::{ApiError, GENERIC_ERROR_MESSAGE, extract_error_message};
pub use pipeline::{ApiClient, ApiRequest, MAX_REFRESH_RETRIES, ensure_success, join_url};
#[cfg(feature = "web")]
pub use transport::GlooTransport;
#[cfg(feature = "native")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
