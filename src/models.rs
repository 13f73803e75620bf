use serde::{Deserialize, Serialize};

/// Bearer-token claims. `sub` is the chat-platform user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}
