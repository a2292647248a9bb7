use log::*;
use serde_json::Value;

use crate::{
    db_types::{ProfileUpdate, Session},
    traits::{ProfileError, ProfileManagement},
};

#[derive(Debug)]
pub struct ProfileApi<B> {
    db: B,
}

impl<B> ProfileApi<B>
where B: ProfileManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Updates the signed-in user's own row. Credits and plan are never written from here.
    pub async fn update_profile(&self, session: &Session, update: ProfileUpdate) -> Result<Vec<Value>, ProfileError> {
        trace!("👤️ Updating {} profile field(s) for {}", update.fields().len(), session.user_id);
        self.db.update_profile(&session.user_id, update).await
    }
}
