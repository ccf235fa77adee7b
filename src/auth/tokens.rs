use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};

/// 32 alphanumeric characters carry just under 191 bits of entropy and
/// need no escaping in a URL.
const TOKEN_LEN: usize = 32;

/// How long a password-reset token stays valid after issuance.
pub const RESET_TOKEN_TTL: Duration = Duration::HOUR;

/// Draw a fresh opaque token from the OS entropy source.
pub fn generate() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn reset_expiry(now: OffsetDateTime) -> OffsetDateTime {
    now + RESET_TOKEN_TTL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_sized() {
        let token = generate();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn reset_tokens_expire_an_hour_out() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(reset_expiry(now) - now, Duration::HOUR);
    }
}
