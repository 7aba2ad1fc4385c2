#![forbid(unsafe_code)]

//! Provider options.
//!
//! Options are the serializable half of a provider's configuration: the
//! identity notification mode plus arbitrary passthrough props. Client
//! handles are attached separately by the runtime's `ProviderConfig`.
//!
//! ```
//! use firelink_core::{NotificationMode, ProviderOptions};
//!
//! let opts = ProviderOptions::from_json_str(
//!     r#"{ "notificationMode": "tokenRefreshInclusive", "props": { "theme": "dark" } }"#,
//! )
//! .unwrap();
//! assert_eq!(opts.notification_mode, NotificationMode::TokenRefreshInclusive);
//! assert_eq!(opts.props["theme"], "dark");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::BindError;
use crate::value::Value;

/// Which identity-source method the provider subscribes with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationMode {
    /// Raw sign-in/sign-out changes.
    #[default]
    StateChange,
    /// Changes including token refreshes.
    TokenRefreshInclusive,
}

impl NotificationMode {
    /// Select the mode from the boolean flag used by callers that only care
    /// whether token refreshes count as changes.
    #[must_use]
    pub fn from_token_refresh(include_refresh: bool) -> Self {
        if include_refresh {
            Self::TokenRefreshInclusive
        } else {
            Self::StateChange
        }
    }
}

/// Serializable provider options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderOptions {
    pub notification_mode: NotificationMode,
    /// Static passthrough props, published in insertion order.
    pub props: IndexMap<String, Value>,
}

impl ProviderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Config`] on malformed input.
    pub fn from_json_str(input: &str) -> Result<Self, BindError> {
        serde_json::from_str(input).map_err(|e| BindError::Config(e.to_string()))
    }

    /// Parse options from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Config`] on malformed input or values TOML
    /// cannot express as JSON.
    #[cfg(feature = "config")]
    pub fn from_toml_str(input: &str) -> Result<Self, BindError> {
        toml::from_str(input).map_err(|e| BindError::Config(e.to_string()))
    }
}
