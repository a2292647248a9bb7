use cdp_common::{helpers::env_value, Secret};
use log::*;

#[derive(Debug, Clone, Default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: Secret<String>,
    pub service_role_key: Option<Secret<String>>,
}

impl SupabaseConfig {
    pub fn new<S: Into<String>>(url: S, anon_key: S) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self { url, anon_key: Secret::new(anon_key.into()), service_role_key: None }
    }

    pub fn with_service_role_key(mut self, key: Option<Secret<String>>) -> Self {
        self.service_role_key = key.filter(|k| !k.reveal().trim().is_empty());
        self
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `SUPABASE_SERVICE_ROLE_KEY`. Returns `None` if there is no URL, in
    /// which case the caller should fall back to a local backend.
    pub fn new_from_env() -> Option<Self> {
        let url = env_value("SUPABASE_URL")?;
        let anon_key = env_value("SUPABASE_ANON_KEY").unwrap_or_else(|| {
            warn!("🪛️ SUPABASE_ANON_KEY is not set. Session lookups against Supabase will fail.");
            String::default()
        });
        let service_role_key = Secret::from_env("SUPABASE_SERVICE_ROLE_KEY");
        Some(Self::new(url, anon_key).with_service_role_key(service_role_key))
    }
}
