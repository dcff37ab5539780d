// Generated API tokens (bearer-like strings, shown masked by default)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenId;
use super::ids::{random_base36, to_base36};

pub const TOKEN_PREFIX: &str = "corsihub_";
const VISIBLE_SUFFIX: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToken {
    pub id: TokenId,
    pub name: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// API view of a token; `token` is masked unless revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub id: TokenId,
    pub name: String,
    pub token: String,
    pub masked: bool,
    pub created_at: DateTime<Utc>,
}

impl ApiToken {
    pub fn view(&self, reveal: bool) -> TokenView {
        TokenView {
            id: self.id.clone(),
            name: self.name.clone(),
            token: if reveal {
                self.token.clone()
            } else {
                mask_token(&self.token)
            },
            masked: !reveal,
            created_at: self.created_at,
        }
    }
}

/// `corsihub_<20 random base36>_<base36 millis>`.
pub fn generate_token_secret(now: DateTime<Utc>) -> String {
    format!(
        "{}{}_{}",
        TOKEN_PREFIX,
        random_base36(20),
        to_base36(now.timestamp_millis().max(0) as u64)
    )
}

/// Keeps the `corsihub_` prefix and the last 4 characters; everything between becomes `*`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let prefix_len = if token.starts_with(TOKEN_PREFIX) {
        TOKEN_PREFIX.len()
    } else {
        0
    };
    if chars.len() <= prefix_len + VISIBLE_SUFFIX {
        return "*".repeat(chars.len());
    }
    let hidden = chars.len() - prefix_len - VISIBLE_SUFFIX;
    let mut out = String::with_capacity(chars.len());
    out.extend(&chars[..prefix_len]);
    out.push_str(&"*".repeat(hidden));
    out.extend(&chars[chars.len() - VISIBLE_SUFFIX..]);
    out
}
