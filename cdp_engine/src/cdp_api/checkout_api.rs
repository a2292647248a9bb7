use std::fmt::Debug;

use chrono::Utc;
use log::*;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::{
    cdp_api::{
        checkout_objects::{CheckoutResult, CreateOrderRequest},
        errors::CheckoutError,
    },
    db_types::{NewOrder, OrderId, ProviderOrderUpdate, Session},
    traits::{OrderManagement, PaymentProvider, ProviderOrderRequest},
};

/// `CheckoutApi` opens credit pack orders with the payment provider.
///
/// The local order record is best-effort: if the backend cannot store it, the checkout still goes ahead, since the
/// credit path only relies on the provider's order id and the signed payment.
pub struct CheckoutApi<B, P> {
    db: B,
    provider: P,
}

impl<B, P> Debug for CheckoutApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B, P> CheckoutApi<B, P>
where
    B: OrderManagement,
    P: PaymentProvider,
{
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }

    pub async fn create_order(
        &self,
        session: &Session,
        request: CreateOrderRequest,
    ) -> Result<CheckoutResult, CheckoutError> {
        if !request.is_complete() {
            debug!("💳️ Rejecting incomplete order request from {}", session.user_id);
            return Err(CheckoutError::MissingParameters);
        }
        let amount = request.amount.to_paise();
        let order_id = new_order_id();
        let CreateOrderRequest { pack_id, amount: price, plan_id, credits, receipt, notes } = request;

        let new_order = NewOrder::new(order_id.clone(), session.user_id.clone(), pack_id.clone(), price, credits)
            .with_plan_id(plan_id)
            .with_notes(notes.clone().unwrap_or_default());
        match self.db.insert_order(new_order).await {
            Ok(order) => debug!("💳️ Order {} saved with status {}", order.order_id, order.status),
            Err(e) => warn!("💳️ Could not save order {order_id}. Continuing with checkout anyway. {e}"),
        }

        let mut provider_notes = notes.clone().unwrap_or_default();
        merge_notes(&mut provider_notes, session, &pack_id, credits);
        let receipt = receipt.unwrap_or_else(|| order_id.as_str().to_string());
        let provider_request = ProviderOrderRequest::new(amount, receipt, provider_notes);
        let provider_order = self.provider.create_order(provider_request).await.map_err(|e| {
            error!("💳️ The payment provider could not create an order for {order_id}. {e}");
            e
        })?;
        info!("💳️ Order {order_id} assigned provider id {} for {amount}", provider_order.id);

        let update = ProviderOrderUpdate::new(provider_order.id.clone(), provider_order.raw.clone());
        if let Err(e) = self.db.attach_provider_order(&order_id, update).await {
            warn!("💳️ Could not record provider order id {} against {order_id}. {e}", provider_order.id);
        }

        Ok(CheckoutResult {
            order_id,
            razorpay_order_id: provider_order.id,
            amount,
            currency: cdp_common::CURRENCY_CODE.to_string(),
            key_id: self.provider.key_id(),
            pack_id,
            credits,
            user_id: session.user_id.clone(),
            notes,
        })
    }
}

/// Generates a local order id of the form `order_<unix-millis>_<0..=999>`.
pub fn new_order_id() -> OrderId {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::thread_rng().gen_range(0..=999);
    OrderId(format!("order_{millis}_{suffix}"))
}

/// The buyer's own notes are kept, but the ledger fields always win.
fn merge_notes(notes: &mut Map<String, Value>, session: &Session, pack_id: &str, credits: i64) {
    notes.insert("userId".into(), json!(session.user_id));
    notes.insert("packId".into(), json!(pack_id));
    notes.insert("credits".into(), json!(credits));
}
