#![forbid(unsafe_code)]

//! Integration tests: providers configured from serialized options.

use std::rc::Rc;

use firelink_core::{NotificationMode, ProviderOptions};
use firelink_harness::{CallLog, FakeClock, MockIdentitySource, card};
use firelink_runtime::{AmbientStateProvider, Props, ProviderConfig, identity_connect};
use serde_json::json;

const OPTIONS_JSON: &str = r#"{
    "notificationMode": "tokenRefreshInclusive",
    "props": { "arbitraryProp": "from json", "anotherProp": true }
}"#;

#[test]
fn json_options_drive_mode_and_props() {
    let options = ProviderOptions::from_json_str(OPTIONS_JSON).unwrap();
    let (clock, log) = (FakeClock::new(), CallLog::new());
    let auth = MockIdentitySource::new("auth", &clock, &log);
    let mut provider = AmbientStateProvider::new(
        ProviderConfig::from_options(options).identity_source(Rc::clone(&auth)),
    );
    assert_eq!(
        provider.notification_mode(),
        NotificationMode::TokenRefreshInclusive
    );
    provider.activate().unwrap();
    assert_eq!(log.entries(), ["auth:onIdTokenChanged"]);

    let node = identity_connect()
        .wrap(card)
        .mount(&provider.scope(), Props::new())
        .unwrap();
    let rendered = node.render().unwrap();
    assert_eq!(rendered.arbitrary, Some(json!("from json")));
    assert_eq!(rendered.keys, ["arbitraryProp", "anotherProp"]);
}

#[test]
fn builder_props_extend_loaded_options() {
    let options = ProviderOptions::from_json_str(OPTIONS_JSON).unwrap();
    let provider = AmbientStateProvider::new(
        ProviderConfig::from_options(options)
            .prop("arbitraryProp", "overridden")
            .token_refresh(false),
    );
    assert_eq!(provider.notification_mode(), NotificationMode::StateChange);
    assert_eq!(provider.current().get("arbitraryProp"), Some(&json!("overridden")));
}

#[cfg(feature = "config")]
#[test]
fn toml_options_match_json() {
    let toml = r#"
        notificationMode = "tokenRefreshInclusive"

        [props]
        arbitraryProp = "from json"
        anotherProp = true
    "#;
    let from_toml = ProviderOptions::from_toml_str(toml).unwrap();
    let from_json = ProviderOptions::from_json_str(OPTIONS_JSON).unwrap();
    assert_eq!(from_toml, from_json);
}
