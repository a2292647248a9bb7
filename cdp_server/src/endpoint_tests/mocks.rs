use cdp_engine::{
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
        PaymentProvider,
        PlanCatalog,
        ProfileError,
        ProfileManagement,
        ProviderError,
        ProviderOrder,
        ProviderOrderRequest,
        RequestScoped,
    },
};
use mockall::mock;
use serde_json::Value;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl RequestScoped for Backend {
        fn for_session(&self, session: &Session) -> Self;
    }
    impl OrderManagement for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn attach_provider_order(&self, order_id: &OrderId, update: ProviderOrderUpdate) -> Result<Order, OrderStoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
    }
    impl CreditLedger for Backend {
        async fn verify_payment_and_add_credits(&self, payment: &PaymentVerification) -> Result<CreditOutcome, CreditLedgerError>;
        async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<Value, CreditLedgerError>;
    }
    impl PlanCatalog for Backend {
        async fn fetch_plans(&self) -> Result<Vec<Plan>, CatalogError>;
        async fn fetch_credit_packs(&self) -> Result<Vec<Plan>, CatalogError>;
        async fn fetch_free_plan(&self) -> Result<Option<Plan>, CatalogError>;
    }
    impl ProfileManagement for Backend {
        async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<Vec<Value>, ProfileError>;
    }
    impl AuthProvider for Backend {
        async fn session_for_token(&self, access_token: &str) -> Result<Option<Session>, AuthProviderError>;
        async fn exchange_code_for_session(&self, code: &str, code_verifier: Option<String>) -> Result<Session, AuthProviderError>;
    }
}

mock! {
    pub Provider {}
    impl PaymentProvider for Provider {
        fn key_id(&self) -> String;
        async fn create_order(&self, request: ProviderOrderRequest) -> Result<ProviderOrder, ProviderError>;
    }
}
