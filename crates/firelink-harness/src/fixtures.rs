#![forbid(unsafe_code)]

//! A small render target shared by the integration tests.

use firelink_core::Value;
use firelink_runtime::{Dispatcher, Props};

/// Text shown while no identity has been published.
pub const NO_USER: &str = "no user yet";

/// What [`card`] renders.
#[derive(Clone, Debug)]
pub struct Card {
    pub arbitrary: Option<Value>,
    pub user: String,
    pub passing_in: Option<String>,
    pub click: Option<Dispatcher>,
    pub keys: Vec<String>,
}

impl Card {
    /// Press the button, if a click dispatcher was bound.
    pub fn click(&self) -> bool {
        match &self.click {
            Some(dispatcher) => {
                dispatcher.call(&Value::Null);
                true
            }
            None => false,
        }
    }
}

/// Render target reading `arbitraryProp`, `identity`, `passingIn`, and a
/// `click` or `onClick` dispatcher.
#[must_use]
pub fn card(props: &Props) -> Card {
    let user = props
        .identity()
        .and_then(|identity| identity.uid().map(Value::to_string))
        .unwrap_or_else(|| NO_USER.to_string());
    Card {
        arbitrary: props.value("arbitraryProp").cloned(),
        user,
        passing_in: props.str("passingIn").map(str::to_string),
        click: props
            .dispatcher("click")
            .or_else(|| props.dispatcher("onClick"))
            .cloned(),
        keys: props.keys().map(str::to_string).collect(),
    }
}
