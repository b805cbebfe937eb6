use std::fmt::{Display, Formatter};

use rand::Rng;
use rocket::{
    http::{Cookie, SameSite},
    request::{self, FromRequest},
    Request,
};
use serde::{Deserialize, Serialize};

/// Cookie carrying the voter identity between requests.
pub const VOTER_ID_COOKIE: &str = "voter_id";

/// An opaque bearer token identifying a visitor across requests.
///
/// The token lives entirely on the client: the server never stores it and
/// never verifies it beyond accepting whatever the cookie carries. This is
/// an intentional trust boundary, not an oversight; the demo has no voter
/// authentication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(String);

impl VoterId {
    /// Reuse an existing token, or mint a fresh one if none was presented.
    pub fn resolve(existing: Option<&str>) -> Self {
        match existing {
            Some(token) if !token.is_empty() => Self(token.to_string()),
            _ => Self::mint(),
        }
    }

    /// Mint a fresh token: 64 random bits rendered as fixed-width lowercase
    /// hex. Uniqueness is probabilistic, not enforced.
    fn mint() -> Self {
        Self(format!("{:016x}", rand::thread_rng().gen::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the cookie handed back on every response. Session-scoped:
    /// no expiry is set.
    pub fn into_cookie(self) -> Cookie<'static> {
        Cookie::build(VOTER_ID_COOKIE, self.0)
            .same_site(SameSite::Lax)
            .finish()
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for VoterId {
    type Error = (); // No errors possible, use the `!` type once stabilised.

    /// Resolve the identity from the `voter_id` cookie. Never fails: a
    /// missing or empty cookie mints a fresh identity, which the handler is
    /// responsible for sending back to the client.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let token = req.cookies().get(VOTER_ID_COOKIE).map(|cookie| cookie.value());
        let voter = Self::resolve(token);
        if token.is_none() {
            info!("Minted new voter {voter}");
        }
        request::Outcome::Success(voter)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn existing_tokens_are_reused_unchanged() {
        let voter = VoterId::resolve(Some("deadbeef00c0ffee"));
        assert_eq!("deadbeef00c0ffee", voter.as_str());
    }

    #[test]
    fn empty_tokens_are_replaced() {
        let voter = VoterId::resolve(Some(""));
        assert_ne!("", voter.as_str());
    }

    #[test]
    fn minted_tokens_are_fixed_width_lowercase_hex() {
        for _ in 0..100 {
            let voter = VoterId::resolve(None);
            assert_eq!(16, voter.as_str().len());
            assert!(voter
                .as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn minted_tokens_are_distinct() {
        let tokens = (0..1000)
            .map(|_| VoterId::resolve(None))
            .collect::<HashSet<_>>();
        assert_eq!(1000, tokens.len());
    }

    #[test]
    fn cookie_is_session_scoped() {
        let cookie = VoterId::resolve(Some("deadbeef00c0ffee")).into_cookie();
        assert_eq!(VOTER_ID_COOKIE, cookie.name());
        assert_eq!("deadbeef00c0ffee", cookie.value());
        assert_eq!(None, cookie.max_age());
        assert_eq!(None, cookie.expires());
    }
}
