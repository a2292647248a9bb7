use std::net::IpAddr;

use cdp_common::helpers::{env_flag, env_value};
#[cfg(feature = "supabase")]
use cdp_engine::SupabaseConfig;
use log::*;
use razorpay_tools::RazorpayConfig;

const DEFAULT_CDP_HOST: &str = "127.0.0.1";
const DEFAULT_CDP_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/cdp_store.db";
pub const DEFAULT_SESSION_COOKIE: &str = "sb-access-token";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Only used when no Supabase project is configured.
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// The cookie that carries the caller's access token.
    pub session_cookie: String,
    /// Whether the session cookie set by the auth callback carries the `Secure` attribute.
    pub secure_cookies: bool,
    /// If supplied, calls to the webhook endpoint must come from one of these addresses.
    pub razorpay_whitelist: Option<Vec<IpAddr>>,
    pub razorpay: RazorpayConfig,
    #[cfg(feature = "supabase")]
    pub supabase: Option<SupabaseConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CDP_HOST.to_string(),
            port: DEFAULT_CDP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            secure_cookies: false,
            razorpay_whitelist: None,
            razorpay: RazorpayConfig::default(),
            #[cfg(feature = "supabase")]
            supabase: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env_value("CDP_HOST").unwrap_or_else(|| DEFAULT_CDP_HOST.into());
        let port = env_value("CDP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CDP_PORT. {e} Using the default, {DEFAULT_CDP_PORT}, instead."
                    );
                    DEFAULT_CDP_PORT
                })
            })
            .unwrap_or(DEFAULT_CDP_PORT);
        let database_url = env_value("CDP_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ CDP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL} if a local database is needed.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let session_cookie = env_value("CDP_SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        let secure_cookies = env_flag("CDP_SECURE_COOKIES", false);
        let use_x_forwarded_for = env_flag("CDP_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("CDP_USE_FORWARDED", false);
        let razorpay_whitelist = configure_whitelist(env_value("CDP_RAZORPAY_IP_WHITELIST"));
        let razorpay = RazorpayConfig::new_from_env_or_default();
        #[cfg(feature = "supabase")]
        let supabase = SupabaseConfig::new_from_env();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            session_cookie,
            secure_cookies,
            razorpay_whitelist,
            razorpay,
            #[cfg(feature = "supabase")]
            supabase,
        }
    }
}

/// Parses a comma-separated list of IP addresses. `none`, `false` and `0` explicitly disable the whitelist.
pub fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            info!(
                "🪛️ Razorpay IP whitelist is disabled. If this is not what you want, set CDP_RAZORPAY_IP_WHITELIST to \
                 a comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter_map(|s| {
                s.parse()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in CDP_RAZORPAY_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The Razorpay IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 webhook calls."
            );
        },
        None => {
            info!("🪛️ No Razorpay IP whitelist is set. Only HMAC validation will be used for webhooks.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Razorpay IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers need. It never carries secrets.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub session_cookie: String,
    pub secure_cookies: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            session_cookie: config.session_cookie.clone(),
            secure_cookies: config.secure_cookies,
        }
    }

    /// The cookie the storefront uses to stash the PKCE code verifier during an OAuth sign-in.
    pub fn code_verifier_cookie(&self) -> String {
        format!("{}-code-verifier", self.session_cookie)
    }
}
