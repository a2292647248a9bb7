use std::{fmt::Debug, sync::Arc};

use cdp_common::Secret;
use log::*;
use reqwest::{header::HeaderValue, Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Capability, SupabaseConfig, SupabaseError};
use crate::{
    db_types::{
        CreditOutcome,
        NewOrder,
        Order,
        OrderId,
        OrderStatus,
        PaymentVerification,
        Plan,
        ProfileUpdate,
        ProviderOrderUpdate,
        Session,
        UserId,
        WebhookEvent,
    },
    traits::{
        AuthProvider,
        AuthProviderError,
        CatalogError,
        CreditLedger,
        CreditLedgerError,
        OrderManagement,
        OrderStoreError,
        PlanCatalog,
        ProfileError,
        ProfileManagement,
        RequestScoped,
    },
};

#[derive(Clone)]
pub struct SupabaseDatabase<C> {
    url: String,
    anon_key: Secret<String>,
    capability: C,
    caller_token: Option<Secret<String>>,
    client: Arc<Client>,
}

impl<C: Debug> Debug for SupabaseDatabase<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SupabaseDatabase ({}, {:?}, scoped: {})", self.url, self.capability, self.caller_token.is_some())
    }
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: GoTrueUser,
}

impl From<GoTrueSession> for Session {
    fn from(s: GoTrueSession) -> Self {
        let mut session = Session::new(s.user.id, s.access_token).with_email(s.user.email);
        session.refresh_token = s.refresh_token.map(Secret::new);
        session.expires_in = s.expires_in;
        session
    }
}

impl<C: Capability> SupabaseDatabase<C> {
    pub fn new(config: &SupabaseConfig, capability: C) -> Result<Self, SupabaseError> {
        let client = Client::builder().build().map_err(|e| SupabaseError::Initialization(e.to_string()))?;
        Ok(Self {
            url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            capability,
            caller_token: None,
            client: Arc::new(client),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    pub fn is_privileged(&self) -> bool {
        self.capability.is_privileged()
    }

    fn request(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        let url = self.url(path);
        trace!("🗃️ Sending Supabase query: {method} {url}");
        self.client.request(method, url).header("apikey", self.anon_key.reveal().as_str()).bearer_auth(bearer)
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, SupabaseError> {
        let response = req.send().await.map_err(|e| SupabaseError::RestResponseError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("🗃️ Supabase query successful. {status}");
            response.json::<T>().await.map_err(|e| SupabaseError::JsonError(e.to_string()))
        } else {
            let body = response.text().await.map_err(|e| SupabaseError::RestResponseError(e.to_string()))?;
            Err(SupabaseError::from_response(status.as_u16(), &body))
        }
    }

    /// The caller's own access token, if this handle has been scoped to a session.
    fn caller_bearer(&self) -> Option<&str> {
        self.caller_token.as_ref().map(|t| t.reveal().as_str())
    }

    /// A PostgREST query with this handle's credentials.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<B>,
    ) -> Result<T, SupabaseError> {
        let bearer = self.capability.bearer(&self.anon_key, self.caller_token.as_ref());
        self.rest_query_as(bearer, method, path, query, body).await
    }

    async fn rest_query_as<T: DeserializeOwned, B: Serialize>(
        &self,
        bearer: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<B>,
    ) -> Result<T, SupabaseError> {
        let mut req = self
            .request(method, &format!("/rest/v1{path}"), bearer)
            .query(query)
            .header("Prefer", HeaderValue::from_static("return=representation"));
        if let Some(body) = body {
            req = req.json(&body);
        }
        Self::send(req).await
    }

    /// Calls a database procedure.
    pub async fn rpc<T: DeserializeOwned>(&self, procedure: &str, params: Value) -> Result<T, SupabaseError> {
        let path = format!("/rpc/{procedure}");
        self.rest_query(Method::POST, &path, &[], Some(params)).await
    }
}

impl<C: Capability> RequestScoped for SupabaseDatabase<C> {
    fn for_session(&self, session: &Session) -> Self {
        let mut scoped = self.clone();
        scoped.caller_token = Some(session.access_token.clone());
        scoped
    }
}

impl<C: Capability> OrderManagement for SupabaseDatabase<C> {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let order_id = order.order_id.clone();
        let rows: Vec<Order> = self.rest_query(Method::POST, "/payment_orders", &[], Some(&order)).await?;
        let order = rows.into_iter().next().ok_or(OrderStoreError::OrderNotFound(order_id))?;
        debug!("🗃️ Order {} has been saved in Supabase", order.order_id);
        Ok(order)
    }

    async fn attach_provider_order(
        &self,
        order_id: &OrderId,
        update: ProviderOrderUpdate,
    ) -> Result<Order, OrderStoreError> {
        let body = json!({
            "razorpay_order_id": update.razorpay_order_id,
            "razorpay_data": update.razorpay_data,
            "status": OrderStatus::ProviderIdAssigned,
        });
        let filter = [("order_id", format!("eq.{}", order_id.as_str()))];
        let rows: Vec<Order> = self.rest_query(Method::PATCH, "/payment_orders", &filter, Some(body)).await?;
        rows.into_iter().next().ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let filter = [("order_id", format!("eq.{}", order_id.as_str())), ("select", "*".to_string())];
        let rows: Vec<Order> = self.rest_query(Method::GET, "/payment_orders", &filter, None::<()>).await?;
        Ok(rows.into_iter().next())
    }
}

impl<C: Capability> CreditLedger for SupabaseDatabase<C> {
    async fn verify_payment_and_add_credits(
        &self,
        payment: &PaymentVerification,
    ) -> Result<CreditOutcome, CreditLedgerError> {
        let params = json!({
            "p_user_id": payment.user_id,
            "p_payment_id": payment.razorpay_payment_id,
            "p_order_id": payment.razorpay_order_id,
            "p_credits": payment.credits,
            "p_razorpay_signature": payment.razorpay_signature,
        });
        let outcome: Option<CreditOutcome> = self.rpc("verify_payment_and_add_credits", params).await?;
        // A procedure that answers `null` has not credited anything
        Ok(outcome.unwrap_or_default())
    }

    async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<Value, CreditLedgerError> {
        let params = json!({ "p_event_type": event.event_type, "p_payload": event.entity });
        let result: Value = self.rpc("handle_razorpay_webhook", params).await?;
        Ok(result)
    }
}

impl<C: Capability> PlanCatalog for SupabaseDatabase<C> {
    async fn fetch_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        let query = [("select", "*".to_string()), ("order", "display_order.asc".to_string())];
        Ok(self.rest_query(Method::GET, "/plans", &query, None::<()>).await?)
    }

    async fn fetch_credit_packs(&self) -> Result<Vec<Plan>, CatalogError> {
        let query = [
            ("select", "*".to_string()),
            ("is_pack", "eq.true".to_string()),
            ("order", "display_order.asc".to_string()),
        ];
        Ok(self.rest_query(Method::GET, "/plans", &query, None::<()>).await?)
    }

    async fn fetch_free_plan(&self) -> Result<Option<Plan>, CatalogError> {
        let query = [
            ("select", "*".to_string()),
            ("price", "eq.0".to_string()),
            ("order", "display_order.asc".to_string()),
            ("limit", "1".to_string()),
        ];
        let plans: Vec<Plan> = self.rest_query(Method::GET, "/plans", &query, None::<()>).await?;
        Ok(plans.into_iter().next())
    }
}

impl<C: Capability> ProfileManagement for SupabaseDatabase<C> {
    /// Always sent with the caller's own token, even from a service role handle, so that row-level security decides
    /// which profile may be written.
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<Vec<Value>, ProfileError> {
        let Some(bearer) = self.caller_bearer() else {
            return Err(ProfileError::Rejected("Profile updates need the caller's session".into()));
        };
        let filter = [("id", format!("eq.{}", user_id.as_str())), ("select", "*".to_string())];
        let rows: Vec<Value> = self.rest_query_as(bearer, Method::PATCH, "/users", &filter, Some(&update)).await?;
        Ok(rows)
    }
}

impl<C: Capability> AuthProvider for SupabaseDatabase<C> {
    /// Asks GoTrue who the token belongs to. GoTrue validates the signature and expiry, so a `401` or `403` simply
    /// means there is no session.
    async fn session_for_token(&self, access_token: &str) -> Result<Option<Session>, AuthProviderError> {
        let req = self.request(Method::GET, "/auth/v1/user", access_token);
        match Self::send::<GoTrueUser>(req).await {
            Ok(user) => Ok(Some(Session::new(user.id, access_token.to_string()).with_email(user.email))),
            Err(SupabaseError::QueryError { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Ok(None)
            },
            Err(e) => Err(AuthProviderError::TransportError(e.to_string())),
        }
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<String>,
    ) -> Result<Session, AuthProviderError> {
        let req = self
            .request(Method::POST, "/auth/v1/token", self.anon_key.reveal())
            .query(&[("grant_type", "pkce")])
            .json(&json!({ "auth_code": code, "code_verifier": code_verifier }));
        let session = Self::send::<GoTrueSession>(req).await?;
        Ok(session.into())
    }
}
