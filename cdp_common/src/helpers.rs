use std::env;

/// Reads an environment variable. Unset and blank values are both treated as missing.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Shorthand for [`parse_boolean_flag`] applied to an environment variable.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env_value(name), default)
}
