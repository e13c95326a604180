use crate::units::ETHER_DECIMALS;

/// What to do with the result of a stage that completes after a newer run of
/// the same stage was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StalePolicy {
    /// drop the outdated result, the newer run will decide
    #[default]
    Discard,
    /// apply results in completion order, the last one to land wins
    Overwrite,
}

/// Settings of the [`Connector`].
///
/// From JavaScript, every field is optional:
///
/// ```js
/// { decimals: 18, stalePolicy: "discard", blockTag: "latest" }
/// ```
///
/// [`Connector`]: crate::Connector
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// scale used to display the balance
    pub decimals: u8,
    pub stale_policy: StalePolicy,
    /// block the balance is read at
    pub block_tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decimals: ETHER_DECIMALS,
            stale_policy: StalePolicy::default(),
            block_tag: "latest".to_owned(),
        }
    }
}

impl Config {
    /// read the configuration from a JavaScript object, `undefined` and `null`
    /// give the defaults
    #[cfg(feature = "browser")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self, serde_wasm_bindgen::Error> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value)
    }
}
