use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "f2f";

/// Content encoded in the QR image: `f2f:<challenge_id>:<hex hmac>`.
pub fn sign_challenge(challenge_id: &str, secret: &str) -> String {
    format!("{}:{}:{}", PREFIX, challenge_id, signature(challenge_id, secret))
}

/// Returns the challenge id when the payload carries a valid signature.
pub fn verify_payload(payload: &str, secret: &str) -> Option<String> {
    let mut parts = payload.splitn(3, ':');
    if parts.next()? != PREFIX {
        return None;
    }
    let challenge_id = parts.next()?;
    let sig = hex::decode(parts.next()?).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(challenge_id.as_bytes());
    mac.verify_slice(&sig).ok()?;
    Some(challenge_id.to_string())
}

fn signature(challenge_id: &str, secret: &str) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(challenge_id.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}
