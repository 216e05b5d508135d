use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn issue(&self, user_id: Uuid, is_admin: bool) -> anyhow::Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_seconds);

        let claims = Claims {
            sub: user_id,
            is_admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data: TokenData<Claims> = decode(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_roundtrip_preserves_claims() {
        let manager = SessionManager::new("test_secret", 3600);
        let user_id = Uuid::new_v4();

        let token = manager.issue(user_id, true).unwrap();
        let claims = manager.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.is_admin);
    }

    #[test]
    fn tampered_secret_fails_verification() {
        let manager = SessionManager::new("right_secret", 3600);
        let other = SessionManager::new("wrong_secret", 3600);
        let token = manager.issue(Uuid::new_v4(), false).unwrap();

        assert!(other.verify(&token).is_err());
    }
}
