use anyhow::anyhow;
use hmac::{Hmac, Mac};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    Data, Request,
};
use sha2::Sha256;
use tracing::trace;

use crate::webhooks::github::GitHubSecret;

const X_GITHUB_SIGNATURE: &str = "X-Hub-Signature-256";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("no GitHub secret configured, can't verify payloads")]
    MissingSecret,
    #[error("request needs exactly one {} header", X_GITHUB_SIGNATURE)]
    MissingHeader,
    #[error("signature doesn't match payload")]
    Mismatch,
}

/// Checks `signature` (as found in `X-Hub-Signature-256`) against the HMAC-SHA256 of the raw
/// `body`. The digests are compared in constant time.
pub fn validate_signature(
    secret: &str,
    signature: &str,
    body: &[u8],
) -> Result<(), SignatureError> {
    trace!("validating signature...");
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }

    // GitHub puts a prefix in front of its hex SHA256
    let signature = match signature.strip_prefix("sha256=") {
        Some(s) => s,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return Err(SignatureError::Mismatch);
        }
    };

    let signature = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", signature);
            return Err(SignatureError::Mismatch);
        }
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(body);

    // length is checked first, then bytes are compared in constant time
    mac.verify_slice(&signature).map_err(|_| SignatureError::Mismatch)
}

/// Raw body of a GitHub delivery whose signature was checked.
///
/// The bytes are kept exactly as received: parsing and re-serializing the JSON could change its
/// layout and break the digest.
pub struct SignedGitHubPayload(pub Vec<u8>);

const LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

// Every failure is a 403: a payload we couldn't verify is an untrusted one.
#[rocket::async_trait]
impl<'r> FromData<'r> for SignedGitHubPayload {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on GitHub webhook endpoint: {:?}", request);

        let signatures = request
            .headers()
            .get(X_GITHUB_SIGNATURE)
            .collect::<Vec<_>>();
        if signatures.len() != 1 {
            trace!("couldn't locate {} header", X_GITHUB_SIGNATURE);
            return Outcome::Error((Status::Forbidden, SignatureError::MissingHeader.into()));
        }
        let signature = signatures[0];

        let size_limit = request.limits().get("json").unwrap_or(LIMIT);
        let content = match data.open(size_limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                trace!("payload was too big to be verified");
                return Outcome::Error((Status::Forbidden, anyhow!("data limit exceeded")));
            }
            Err(e) => return Outcome::Error((Status::Forbidden, e.into())),
        };

        let secret = match request
            .rocket()
            .state::<GitHubSecret>()
            .and_then(|secret| secret.0.as_deref())
        {
            Some(secret) => secret,
            None => {
                trace!("no secret to check the signature against");
                return Outcome::Error((Status::Forbidden, SignatureError::MissingSecret.into()));
            }
        };

        if let Err(e) = validate_signature(secret, signature, &content) {
            trace!("signature validation failed ({}), stopping here...", e);
            return Outcome::Error((Status::Forbidden, e.into()));
        }

        trace!("validated GitHub payload");
        Outcome::Success(SignedGitHubPayload(content))
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
