//! `SqliteDatabase` is a concrete, self-contained implementation of a Coder Duo payment engine backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module. When scoped to a session, it refuses to
//! write orders or profiles on behalf of anyone but the session's user, which mirrors the row-level security a hosted
//! backend applies.
use std::fmt::Debug;

use log::*;
use serde_json::Value;
use sqlx::{migrate, SqlitePool};

use super::{
    db::{
        db_url,
        ledger::{self, PaymentSource},
        new_pool,
        orders,
        plans,
        sessions::{self, CodeRedemption},
        users,
        webhooks,
    },
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        CreditOutcome,
        NewOrder,
        Order,
        OrderId,
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
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    caller: Option<UserId>,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?}, caller: {:?})", self.pool, self.caller)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `CDP_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, caller: None })
    }

    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }

    /// `true` if this handle may act on behalf of `user_id`. Unscoped handles act with full privileges.
    fn may_act_for(&self, user_id: &UserId) -> bool {
        self.caller.as_ref().map_or(true, |caller| caller == user_id)
    }

    pub async fn create_user(
        &self,
        user_id: &UserId,
        email: Option<&str>,
        credits: i64,
    ) -> Result<(), SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        users::create_user(user_id, email, credits, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User {user_id} created with {credits} credits");
        Ok(())
    }

    pub async fn fetch_credits(&self, user_id: &UserId) -> Result<Option<i64>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_credits(user_id, &mut conn).await
    }

    pub async fn fetch_user(&self, user_id: &UserId) -> Result<Option<Value>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    pub async fn upsert_plan(&self, plan: &Plan) -> Result<(), SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        plans::upsert_plan(plan, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Starts a new session for an existing user. This is what a sign-in would do with a hosted auth provider.
    pub async fn issue_session(&self, user_id: &UserId) -> Result<Session, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let session = sessions::issue_session(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(session)
    }

    pub async fn revoke_session(&self, access_token: &str) -> Result<bool, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        sessions::revoke_session(access_token, &mut conn).await
    }

    /// Issues a one-time OAuth code for `user_id`, to be redeemed at the auth callback.
    pub async fn issue_auth_code(
        &self,
        user_id: &UserId,
        code_verifier: Option<&str>,
    ) -> Result<String, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let code = sessions::issue_auth_code(user_id, code_verifier, &mut tx).await?;
        tx.commit().await?;
        Ok(code)
    }

    pub async fn count_webhook_events(&self, event_type: &str) -> Result<i64, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        webhooks::count_events(event_type, &mut conn).await
    }
}

impl RequestScoped for SqliteDatabase {
    fn for_session(&self, session: &Session) -> Self {
        Self { url: self.url.clone(), pool: self.pool.clone(), caller: Some(session.user_id.clone()) }
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        if !self.may_act_for(&order.user_id) {
            return Err(OrderStoreError::Rejected(format!("Cannot create an order on behalf of {}", order.user_id)));
        }
        let mut tx = self.pool.begin().await?;
        let order_id = order.order_id.clone();
        let order = orders::insert_order(order, &mut tx).await?.ok_or(OrderStoreError::OrderAlreadyExists(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB", order.order_id);
        Ok(order)
    }

    async fn attach_provider_order(
        &self,
        order_id: &OrderId,
        update: ProviderOrderUpdate,
    ) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let existing = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        if !self.may_act_for(&existing.user_id) {
            return Err(OrderStoreError::Rejected(format!("Order {order_id} belongs to another user")));
        }
        let order = orders::attach_provider_order(order_id, update, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order.filter(|o| self.may_act_for(&o.user_id)))
    }
}

impl CreditLedger for SqliteDatabase {
    /// Runs the ledger in a single transaction. See [`ledger::credit_payment`].
    async fn verify_payment_and_add_credits(
        &self,
        payment: &PaymentVerification,
    ) -> Result<CreditOutcome, CreditLedgerError> {
        let mut tx = self.pool.begin().await?;
        let outcome = ledger::credit_payment(payment, PaymentSource::Verify, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<Value, CreditLedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = webhooks::handle_event(event, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}

impl PlanCatalog for SqliteDatabase {
    async fn fetch_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(plans::fetch_plans(false, &mut conn).await?)
    }

    async fn fetch_credit_packs(&self) -> Result<Vec<Plan>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(plans::fetch_plans(true, &mut conn).await?)
    }

    async fn fetch_free_plan(&self) -> Result<Option<Plan>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(plans::fetch_free_plan(&mut conn).await?)
    }
}

impl ProfileManagement for SqliteDatabase {
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<Vec<Value>, ProfileError> {
        if !self.may_act_for(user_id) {
            return Err(ProfileError::Rejected(format!("Cannot update the profile of {user_id}")));
        }
        let mut tx = self.pool.begin().await?;
        let row = users::update_profile(user_id, update, &mut tx)
            .await?
            .ok_or_else(|| ProfileError::UserNotFound(user_id.clone()))?;
        tx.commit().await?;
        Ok(vec![row])
    }
}

impl AuthProvider for SqliteDatabase {
    async fn session_for_token(&self, access_token: &str) -> Result<Option<Session>, AuthProviderError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sessions::fetch_session(access_token, &mut conn).await?)
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<String>,
    ) -> Result<Session, AuthProviderError> {
        let mut tx = self.pool.begin().await?;
        let redemption = sessions::redeem_auth_code(code, code_verifier.as_deref(), &mut tx).await?;
        let user_id = match redemption {
            CodeRedemption::Redeemed(user_id) => user_id,
            CodeRedemption::InvalidCode => {
                // Commit anyway, so that a used code stays used
                tx.commit().await?;
                return Err(AuthProviderError::ExchangeFailed("Invalid or expired authentication code".into()));
            },
            CodeRedemption::VerifierMismatch => {
                tx.commit().await?;
                return Err(AuthProviderError::ExchangeFailed("Code verifier does not match".into()));
            },
        };
        let session = sessions::issue_session(&user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(session)
    }
}
