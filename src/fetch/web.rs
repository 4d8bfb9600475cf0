//! Browser fetch
//!
//! Reads static files from the page's own origin. Subject to the usual
//! browser rules, which is fine: everything it asks for is same-origin.

use super::{Fetch, FetchError, FetchResponse, FetchResult};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Fetch relative to the current origin
#[derive(Debug, Clone, Copy, Default)]
pub struct WebFetch;

impl Fetch for WebFetch {
    async fn fetch(&self, path: &str) -> FetchResult<FetchResponse> {
        let window =
            web_sys::window().ok_or_else(|| FetchError::Network("No window object".into()))?;

        let opts = web_sys::RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(web_sys::RequestMode::SameOrigin);

        let request = web_sys::Request::new_with_str_and_init(path, &opts)
            .map_err(|e| FetchError::Network(format!("Failed to create request: {:?}", e)))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| FetchError::Network(format!("Fetch failed: {:?}", e)))?;

        let resp: web_sys::Response = resp_value
            .dyn_into()
            .map_err(|_| FetchError::Network("Failed to cast response".into()))?;

        let status = resp.status();

        let array_buffer = JsFuture::from(
            resp.array_buffer()
                .map_err(|e| FetchError::Network(format!("Failed to get body: {:?}", e)))?,
        )
        .await
        .map_err(|e| FetchError::Network(format!("Failed to read body: {:?}", e)))?;

        let body = js_sys::Uint8Array::new(&array_buffer).to_vec();

        Ok(FetchResponse { status, body })
    }
}
