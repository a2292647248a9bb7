use log::*;

use crate::{db_types::Plan, traits::PlanCatalog};

/// Read-only access to the plan list. Backend failures degrade to an empty list (or no free plan), so the pricing
/// page still renders.
#[derive(Debug)]
pub struct CatalogApi<B> {
    db: B,
}

impl<B> CatalogApi<B>
where B: PlanCatalog
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn plans(&self) -> Vec<Plan> {
        self.db.fetch_plans().await.unwrap_or_else(|e| {
            error!("🗃️ Error fetching plans: {e}");
            vec![]
        })
    }

    pub async fn credit_packs(&self) -> Vec<Plan> {
        self.db.fetch_credit_packs().await.unwrap_or_else(|e| {
            error!("🗃️ Error fetching credit packs: {e}");
            vec![]
        })
    }

    pub async fn free_plan(&self) -> Option<Plan> {
        self.db.fetch_free_plan().await.unwrap_or_else(|e| {
            error!("🗃️ Error fetching free plan: {e}");
            None
        })
    }
}
