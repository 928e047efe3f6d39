//! Vector tile provider abstraction
//!
//! A provider fetches raw tiles from one upstream source. Providers are held
//! by name as `Arc<dyn TileProvider>` in the composite registry, so adding a
//! source means implementing [`TileProvider`] and registering it.
//!
//! ```ignore
//! use roadtiles::provider::{AsyncReqwestClient, HttpTileProvider};
//!
//! let client = AsyncReqwestClient::with_defaults()?;
//! let provider = HttpTileProvider::kerala_pwd(client);
//! ```

mod http;
mod kerala_pwd;
mod retry;
mod types;

pub use http::{
    AsyncHttpClient, AsyncReqwestClient, HttpResponse, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT,
};
pub use kerala_pwd::{
    HttpProviderConfig, HttpTileProvider, KERALA_PWD_ATTRIBUTION, KERALA_PWD_BASE_URL,
    KERALA_PWD_MAX_ZOOM, KERALA_PWD_MIN_ZOOM, KERALA_PWD_NAME, KERALA_PWD_REFERER,
};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use types::{ProviderError, ProviderMetadata, TileBytes, TileProvider};

#[cfg(test)]
pub(crate) use http::tests::MockAsyncHttpClient;
#[cfg(test)]
pub(crate) use types::tests::StaticTileProvider;
