use actix_web::{web, FromRequest};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error;

/// Identity asserted by the auth provider. `sub` is the provider's subject id,
/// not our internal user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    #[allow(unused)]
    pub fn new(sub: impl Into<String>, email: Option<String>, exp: u64) -> Self {
        let now = chrono::Utc::now().timestamp() as u64;
        Claims { sub: sub.into(), email, iat: now, exp: now + exp }
    }

    #[allow(unused)]
    pub fn encode(&self, secret: &[u8]) -> Result<String, error::SystemError> {
        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, self, &EncodingKey::from_secret(secret))?;
        Ok(token)
    }

    pub fn decode(token: &str, secret: &[u8]) -> Result<Self, error::SystemError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(token_data.claims)
    }
}

const DECORATIVE_SUFFIXES: [&str; 3] = ["\u{1F6E1}\u{FE0F}", "\u{1F6E1}", "\u{1F451}"];

/// Key for the `normalized_username` index: trimmed, lowercased, with trailing
/// shield/crown decorations removed.
pub fn normalize_username(username: &str) -> String {
    let mut current = username.trim().to_lowercase();
    loop {
        let stripped = DECORATIVE_SUFFIXES
            .iter()
            .find_map(|suffix| current.strip_suffix(suffix))
            .map(|rest| rest.trim_end().to_string());
        match stripped {
            Some(rest) => current = rest,
            None => return current,
        }
    }
}

pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest for ValidatedJson<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Json::<T>::from_request(req, payload);

        Box::pin(async move {
            let json = fut.await.map_err(|e| error::Error::bad_request(e.to_string()))?;
            let model = json.into_inner();
            model.validate().map_err(|e| error::Error::bad_request(e.to_string()))?;
            Ok(ValidatedJson(model))
        })
    }
}
