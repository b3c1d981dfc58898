use crate::errors::ValidationError;
use crate::models::{
    FeedType, HistoricalDuration, RequestConfig, ValidatedConfig, SYMBOL_SEPARATOR,
};

/// Validate a host configuration.
///
/// Checks run in this order: symbols, historical duration, type. A symbol
/// element that is empty or only whitespace is rejected. The duration
/// check lower-cases the type token before comparing it with `historical`
/// while the type check itself is case-sensitive, so `Historical` with an
/// unknown duration reports [`ValidationError::InvalidDuration`] rather than
/// [`ValidationError::InvalidType`].
pub fn validate(config: &RequestConfig) -> Result<ValidatedConfig, ValidationError> {
    if config.symbols.is_empty() {
        return Err(ValidationError::NoSymbols);
    }

    let symbols: Vec<String> = config
        .symbols
        .split(SYMBOL_SEPARATOR)
        .map(str::to_string)
        .collect();
    if symbols.iter().any(|s| s.trim().is_empty()) {
        return Err(ValidationError::InvalidSymbols(config.symbols.clone()));
    }

    let parsed_duration = HistoricalDuration::parse(&config.duration);
    if config.kind.to_lowercase() == FeedType::Historical.as_str() && parsed_duration.is_none() {
        return Err(ValidationError::InvalidDuration(config.duration.clone()));
    }

    let kind =
        FeedType::parse(&config.kind).ok_or_else(|| ValidationError::InvalidType(config.kind.clone()))?;

    Ok(ValidatedConfig {
        kind,
        symbols,
        duration: parsed_duration.unwrap_or_default(),
        fields: config.fields.clone(),
        display_id: config.display_id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_realtime_config() {
        let validated = validate(&RequestConfig::realtime("AA.N|MSFT")).unwrap();
        assert_eq!(validated.kind, FeedType::Realtime);
        assert_eq!(validated.symbols, vec!["AA.N", "MSFT"]);
        assert_eq!(validated.duration, HistoricalDuration::OneMonth);
    }

    #[test]
    fn test_empty_symbols_is_no_symbols() {
        assert_eq!(
            validate(&RequestConfig::realtime("")),
            Err(ValidationError::NoSymbols)
        );
    }

    #[test]
    fn test_empty_symbol_element_is_invalid() {
        assert_eq!(
            validate(&RequestConfig::realtime("AA.N||MSFT")),
            Err(ValidationError::InvalidSymbols("AA.N||MSFT".to_string()))
        );
        assert!(matches!(
            validate(&RequestConfig::realtime("|")),
            Err(ValidationError::InvalidSymbols(_))
        ));
        assert!(matches!(
            validate(&RequestConfig::realtime("MSFT|")),
            Err(ValidationError::InvalidSymbols(_))
        ));
    }

    #[test]
    fn test_whitespace_symbol_element_counts_as_empty() {
        assert_eq!(
            validate(&RequestConfig::realtime("AA.N| ")),
            Err(ValidationError::InvalidSymbols("AA.N| ".to_string()))
        );
        assert!(matches!(
            validate(&RequestConfig::realtime("\t|MSFT")),
            Err(ValidationError::InvalidSymbols(_))
        ));

        // Surrounding whitespace on a real symbol is kept as given.
        let validated = validate(&RequestConfig::realtime(" MSFT")).unwrap();
        assert_eq!(validated.symbols, vec![" MSFT"]);
    }

    #[test]
    fn test_unknown_type_is_invalid() {
        let config = RequestConfig {
            kind: "intraday".to_string(),
            ..RequestConfig::realtime("MSFT")
        };
        assert_eq!(
            validate(&config),
            Err(ValidationError::InvalidType("intraday".to_string()))
        );
    }

    #[test]
    fn test_type_is_case_sensitive() {
        let config = RequestConfig {
            kind: "Realtime".to_string(),
            ..RequestConfig::realtime("MSFT")
        };
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidType(_))
        ));
    }

    #[test]
    fn test_lowercase_duration_is_invalid() {
        assert_eq!(
            validate(&RequestConfig::historical("MSFT", "day")),
            Err(ValidationError::InvalidDuration("day".to_string()))
        );
    }

    #[test]
    fn test_duration_check_lowercases_type() {
        let config = RequestConfig {
            kind: "HISTORICAL".to_string(),
            ..RequestConfig::historical("MSFT", "2Y")
        };
        assert_eq!(
            validate(&config),
            Err(ValidationError::InvalidDuration("2Y".to_string()))
        );

        // With a valid duration the case-sensitive type check still rejects it.
        let config = RequestConfig {
            kind: "HISTORICAL".to_string(),
            ..RequestConfig::historical("MSFT", "1Y")
        };
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidType(_))
        ));
    }

    #[test]
    fn test_realtime_ignores_duration() {
        let config = RequestConfig {
            duration: "whenever".to_string(),
            ..RequestConfig::realtime("MSFT")
        };
        let validated = validate(&config).unwrap();
        assert_eq!(validated.duration, HistoricalDuration::OneMonth);
    }

    #[test]
    fn test_historical_keeps_duration() {
        let validated = validate(&RequestConfig::historical("MSFT", "5Y")).unwrap();
        assert_eq!(validated.kind, FeedType::Historical);
        assert_eq!(validated.duration, HistoricalDuration::FiveYears);
    }
}
