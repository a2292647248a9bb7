use std::{net::IpAddr, str::FromStr};

use actix_web::{http::header::AUTHORIZATION, HttpRequest};
use log::{debug, trace};
use regex::Regex;
use serde_json::Value;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration. The first (client)
///    address in the list is used.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        let re = Regex::new(r#"for="?(?P<ip>[^;,"]+)"#).ok();
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.as_ref().and_then(|re| re.captures(v)))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str())
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// Finds the caller's access token. An `Authorization: Bearer` header wins over the session cookie.
pub fn session_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);
    if bearer.is_some() {
        trace!("🔑️ Access token taken from the Authorization header");
        return bearer;
    }
    let cookie = req.cookie(cookie_name)?;
    let token = token_from_cookie_value(cookie.value());
    if token.is_none() {
        debug!("🔑️ The {cookie_name} cookie is present, but does not contain an access token");
    }
    token
}

/// Unpacks the access token from a session cookie value.
///
/// The Supabase auth helpers have stored sessions in a few different shapes over time. All of these are accepted:
/// * the raw access token,
/// * a JSON array whose first element is the access token,
/// * a JSON object with an `access_token` field,
/// * any of the above, base64-encoded and prefixed with `base64-`.
pub fn token_from_cookie_value(value: &str) -> Option<String> {
    let value = value.trim();
    let decoded;
    let value = match value.strip_prefix("base64-") {
        Some(encoded) => {
            decoded = base64::decode_config(encoded, base64::URL_SAFE_NO_PAD)
                .or_else(|_| base64::decode(encoded))
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())?;
            decoded.as_str()
        },
        None => value,
    };
    let token = match value.chars().next()? {
        '[' | '{' => match serde_json::from_str::<Value>(value).ok()? {
            Value::Array(items) => items.first().and_then(Value::as_str).map(String::from),
            Value::Object(map) => map.get("access_token").and_then(Value::as_str).map(String::from),
            _ => None,
        },
        '"' => serde_json::from_str::<String>(value).ok(),
        _ => Some(value.to_string()),
    };
    token.filter(|t| !t.trim().is_empty())
}
