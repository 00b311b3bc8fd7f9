//! Configuration validation.
//!
//! Collects every violation before failing so one run reports them all.

use tabdeck_common::ConfigError;

use crate::schema::TabdeckConfig;

pub fn validate(config: &TabdeckConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(&mut errors, "tabs.header_height", config.tabs.header_height, 0, 200);
    validate_range(&mut errors, "tabs.fallback_width", config.tabs.fallback_width, 200, 16384);
    validate_range(&mut errors, "tabs.fallback_height", config.tabs.fallback_height, 200, 16384);
    if config.tabs.header_height >= config.tabs.fallback_height {
        errors.push(format!(
            "tabs.header_height = {} leaves no room in tabs.fallback_height = {}",
            config.tabs.header_height, config.tabs.fallback_height
        ));
    }

    validate_range(&mut errors, "window.width", config.window.width, 200, 16384);
    validate_range(&mut errors, "window.height", config.window.height, 200, 16384);

    if config.bridge.event_key.is_empty()
        || !config
            .bridge
            .event_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        errors.push(format!(
            "bridge.event_key = {:?} must be non-empty and use only [A-Za-z0-9_.-]",
            config.bridge.event_key
        ));
    }

    if config.bridge.error_page_url.trim().is_empty() {
        errors.push("bridge.error_page_url must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&TabdeckConfig::default()).is_ok());
    }

    #[test]
    fn header_out_of_range_is_rejected() {
        let mut config = TabdeckConfig::default();
        config.tabs.header_height = 500;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("tabs.header_height = 500"));
    }

    #[test]
    fn header_taller_than_window_is_rejected() {
        let mut config = TabdeckConfig::default();
        config.tabs.header_height = 200;
        config.tabs.fallback_height = 200;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("leaves no room"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = TabdeckConfig::default();
        config.window.width = 10;
        config.bridge.event_key = "bad key'); alert(1); ('".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("window.width"));
        assert!(err.contains("bridge.event_key"));
    }

    #[test]
    fn empty_event_key_is_rejected() {
        let mut config = TabdeckConfig::default();
        config.bridge.event_key.clear();
        assert!(validate(&config).is_err());
    }
}
