/// Error codes a provider attaches to a rejected request.
///
/// The `4xxx` codes are defined by EIP-1193, the negative ones by JSON-RPC 2.0
/// (plus `-32002` which wallets use when a request is already pending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejectedRequest,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The provider does not support the requested method.")]
    UnsupportedMethod,
    /// The provider is disconnected from all chains.
    #[error("The provider is disconnected.")]
    Disconnected,
    #[error("The provider is not connected to the requested chain.")]
    ChainDisconnected,
    /// A request of the same kind is still waiting on the user.
    #[error("A request is already pending.")]
    RequestPending,
    #[error("Invalid JSON was received.")]
    ParseError,
    #[error("Invalid request.")]
    InvalidRequest,
    #[error("The method does not exist or is not available.")]
    MethodNotFound,
    #[error("Invalid method parameters.")]
    InvalidParams,
    #[error("An error occured during the execution of this request.")]
    InternalError,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => Self::UserRejectedRequest,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            -32002 => Self::RequestPending,
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            unknown => Self::Unknown(unknown),
        }
    }
}

impl From<ProviderErrorCode> for i64 {
    fn from(code: ProviderErrorCode) -> Self {
        match code {
            ProviderErrorCode::UserRejectedRequest => 4001,
            ProviderErrorCode::Unauthorized => 4100,
            ProviderErrorCode::UnsupportedMethod => 4200,
            ProviderErrorCode::Disconnected => 4900,
            ProviderErrorCode::ChainDisconnected => 4901,
            ProviderErrorCode::RequestPending => -32002,
            ProviderErrorCode::ParseError => -32700,
            ProviderErrorCode::InvalidRequest => -32600,
            ProviderErrorCode::MethodNotFound => -32601,
            ProviderErrorCode::InvalidParams => -32602,
            ProviderErrorCode::InternalError => -32603,
            ProviderErrorCode::Unknown(code) => code,
        }
    }
}

/// A rejected provider request, as thrown by `window.ethereum.request`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error, serde::Deserialize,
)]
#[error("{code} {message}")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// shorthand for the errors we raise ourselves when a response does not
    /// look like what EIP-1193 promises.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }
}

/// Failures of the connection stages.
///
/// None of these ever escape the [`Connector`]: each one is folded into the
/// [`ConnectionState`] so a view only observes (possibly default) state.
///
/// [`Connector`]: crate::Connector
/// [`ConnectionState`]: crate::ConnectionState
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// No wallet provider in the host environment. Terminal for the session.
    #[error("No wallet provider was found.")]
    ProviderAbsent,
    /// Recoverable only through an explicit new authorization request.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(ProviderError),
    /// Building the connection or querying the chain failed. Authorization is
    /// left untouched.
    #[error("Connection or query failure: {0}")]
    ConnectionOrQueryFailure(ProviderError),
}

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ProviderErrorCode::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map(ProviderErrorCode::from)
                    .map_err(|_| E::custom(format!("error code `{v}' out of range")))
            }

            // JS numbers come through as floats from serde-wasm-bindgen
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() != 0.0 || v < i64::MIN as f64 || v > i64::MAX as f64 {
                    return Err(E::custom(format!("error code `{v}' is not an integer")));
                }
                Ok(ProviderErrorCode::from(v as i64))
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
