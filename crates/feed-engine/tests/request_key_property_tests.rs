//! Property-based tests for request keys and validation.
//!
//! Keys must be a pure function of the request configuration: equal
//! configurations give equal keys, and changing any dimension changes the key.

use finfeed_engine::models::{HistoricalDuration, ValidatedConfig};
use finfeed_engine::request::{build_url, validate, CallbackToken, RequestKey};
use finfeed_engine::{Endpoints, RequestConfig, ValidationError};
use proptest::prelude::*;
use uuid::Uuid;

// =============================================================================
// Generators
// =============================================================================

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Z]{1,5}(\\.[A-Z]{1,2})?"
}

fn arb_symbols() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_symbol(), 1..5).prop_map(|s| s.join("|"))
}

fn arb_fields() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-zA-Z]{2,10}", 0..4)
}

fn arb_duration() -> impl Strategy<Value = HistoricalDuration> {
    prop::sample::select(HistoricalDuration::ALL.to_vec())
}

fn arb_config() -> impl Strategy<Value = RequestConfig> {
    (
        arb_symbols(),
        prop::bool::ANY,
        arb_duration(),
        arb_fields(),
        "[A-Za-z0-9]{1,12}",
    )
        .prop_map(|(symbols, historical, duration, fields, display)| {
            let config = if historical {
                RequestConfig::historical(symbols, duration.code())
            } else {
                RequestConfig::realtime(symbols)
            };
            config.with_fields(fields).with_display_id(display)
        })
}

fn key(config: &RequestConfig) -> RequestKey {
    RequestKey::build(&validated(config))
}

fn validated(config: &RequestConfig) -> ValidatedConfig {
    validate(config).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_key_is_deterministic(config in arb_config()) {
        prop_assert_eq!(key(&config), key(&config.clone()));
    }

    #[test]
    fn prop_changing_symbols_changes_key(config in arb_config(), extra in arb_symbol()) {
        let mut changed = config.clone();
        changed.symbols = format!("{}|{}", config.symbols, extra);
        prop_assert_ne!(key(&config), key(&changed));
    }

    #[test]
    fn prop_changing_display_changes_key(config in arb_config()) {
        let changed = config.clone().with_display_id(format!("{}x", config.display_id));
        prop_assert_ne!(key(&config), key(&changed));
    }

    #[test]
    fn prop_field_order_matters(config in arb_config(), a in "[a-z]{3}", b in "[A-Z]{3}") {
        let forward = config.clone().with_fields([a.clone(), b.clone()]);
        let backward = config.with_fields([b, a]);
        prop_assert_ne!(key(&forward), key(&backward));
    }

    #[test]
    fn prop_url_carries_token_and_symbols(config in arb_config()) {
        let token = CallbackToken::generate(&Uuid::new_v4());
        let validated = validated(&config);
        let url = build_url(&validated, &token, &Endpoints::production());

        prop_assert!(url.ends_with(token.as_str()));
        let encoded_symbols = config.symbols.replace('|', "%7C");
        prop_assert!(url.contains(&encoded_symbols));
    }

    #[test]
    fn prop_unknown_historical_duration_is_rejected(
        symbols in arb_symbols(),
        duration in "[a-z]{1,4}",
    ) {
        let config = RequestConfig::historical(symbols, duration.clone());
        prop_assert_eq!(validate(&config), Err(ValidationError::InvalidDuration(duration)));
    }
}
