use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(thread_local_v2, js_namespace = ["window"], js_name = "ethereum")]
    pub static ETHEREUM: Option<Eip1193Provider>;
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Eip1193Provider;

    /// Set by MetaMask (and by wallets pretending to be MetaMask).
    #[wasm_bindgen(method, getter, js_name = "isMetaMask")]
    pub fn is_meta_mask(this: &Eip1193Provider) -> Option<bool>;

    /// Submits an RPC request to the provider, the `args` being a
    /// [`RequestArguments`] object. The promise resolves with the result of
    /// the RPC method call or rejects with a `ProviderRpcError`
    /// (`{ code, message, data? }`).
    ///
    /// More details [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193#request-1)
    ///
    #[wasm_bindgen(method, catch, js_name = "request")]
    pub async fn request(this: &Eip1193Provider, args: JsValue) -> Result<JsValue, JsValue>;
}

/// The argument of [`Eip1193Provider::request`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RequestArguments<'a> {
    pub method: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<serde_json::Value>,
}

/// Look up `window.ethereum`.
///
/// The provider is looked up again on every call rather than only through
/// [`ETHEREUM`]: extensions may inject it after our module was loaded.
pub fn ethereum() -> Option<Eip1193Provider> {
    let fresh = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("window"))
        .ok()
        .and_then(|win| js_sys::Reflect::get(&win, &JsValue::from_str("ethereum")).ok());

    match fresh {
        Some(value) if looks_like_eip1193_provider(&value) => Some(Eip1193Provider::from(value)),
        _ => ETHEREUM.with(|provider| provider.clone()).filter(|provider| {
            let value: &JsValue = provider.as_ref();
            looks_like_eip1193_provider(value)
        }),
    }
}

fn looks_like_eip1193_provider(value: &JsValue) -> bool {
    if !value.is_object() {
        return false;
    }

    js_sys::Reflect::get(value, &JsValue::from_str("request"))
        .ok()
        .map(|v| v.is_function())
        .unwrap_or(false)
}
