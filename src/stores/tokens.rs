// API token generation and revocation

use chrono::Utc;
use tracing::info;

use super::EntityStore;
use crate::models::{ApiToken, TokenId, generate_token_secret};

impl EntityStore<ApiToken> {
    pub async fn generate(&self, name: &str) -> ApiToken {
        let now = Utc::now();
        let token = ApiToken {
            id: TokenId::generate(),
            name: name.trim().to_string(),
            token: generate_token_secret(now),
            created_at: now,
        };
        info!(token_id = %token.id, name = %token.name, "api token generated");
        self.insert(token).await
    }

    pub async fn revoke(&self, id: &TokenId) -> Option<ApiToken> {
        let revoked = self.delete(id).await;
        if revoked.is_some() {
            info!(token_id = %id, "api token revoked");
        }
        revoked
    }
}
