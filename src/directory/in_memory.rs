use async_trait::async_trait;
use dashmap::DashMap;

use super::{CardInfo, Directory, DirectoryError};

/// Directory held in memory. Used by the replay tool and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    names: DashMap<String, String>,
    cards: DashMap<String, CardInfo>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user_id: impl Into<String>, display_name: impl Into<String>) {
        self.names.insert(user_id.into(), display_name.into());
    }

    pub fn insert_card(&self, card: CardInfo) {
        self.cards.insert(card.id.clone(), card);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn sender_name(&self, user_id: &str) -> Result<Option<String>, DirectoryError> {
        Ok(self.names.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn card_info(&self, mcard_id: &str) -> Result<Option<CardInfo>, DirectoryError> {
        Ok(self.cards.get(mcard_id).map(|entry| entry.value().clone()))
    }
}
