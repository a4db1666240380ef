//! Authenticated session: token accessor plus the roles granted by the identity provider.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::ports::auth::{Error as TokenError, TokenSource};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleSet {
    pub admin: bool,
    pub staff: bool,
}

/// Which members query paths a session may use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberAccess {
    /// Listings and text search
    Full,
    /// Text search only, with a non-empty query
    SearchOnly,
    None,
}

impl RoleSet {
    pub fn from_permissions<S: AsRef<str>>(permissions: &[S]) -> Self {
        let has = |role: &str| permissions.iter().any(|p| p.as_ref() == role);
        Self {
            admin: has("Admin"),
            staff: has("Staff"),
        }
    }

    pub fn member_access(&self) -> MemberAccess {
        if self.admin {
            MemberAccess::Full
        } else if self.staff {
            MemberAccess::SearchOnly
        } else {
            MemberAccess::None
        }
    }

    /// Card inventory and statistics
    pub fn can_view_cards(&self) -> bool {
        self.admin || self.staff
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed access token: {0}")]
    MalformedToken(#[from] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    permissions: Vec<String>,
}

/// Read the roles from the `permissions` claim of a JWT
///
/// Neither the signature nor the registered claims are checked here: the backend validates the
/// token on every request, roles only pick which queries to run.
pub fn roles_from_jwt(token: &str) -> Result<RoleSet, SessionError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(RoleSet::from_permissions(&data.claims.permissions))
}

/// Fixed token, e.g. passed on the command line
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, TokenError> {
        Ok(self.0.clone())
    }
}

/// Session of a signed-in user
///
/// Constructed once after sign-in and shared by the REST client and the commands. Clones share
/// the same sign-out state.
#[derive(Clone)]
pub struct Session {
    tokens: Arc<dyn TokenSource>,
    roles: RoleSet,
    signed_out: Arc<AtomicBool>,
}

impl Session {
    pub fn new(tokens: Arc<dyn TokenSource>, roles: RoleSet) -> Self {
        Self {
            tokens,
            roles,
            signed_out: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Session around a single access token, with roles read from its claims
    pub fn from_jwt(token: impl Into<String>) -> Result<Self, SessionError> {
        let token = token.into();
        let roles = roles_from_jwt(&token)?;
        Ok(Self::new(Arc::new(StaticToken::new(token)), roles))
    }

    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    pub fn is_authenticated(&self) -> bool {
        !self.signed_out.load(Ordering::Acquire)
    }

    pub async fn access_token(&self) -> Result<String, TokenError> {
        if !self.is_authenticated() {
            return Err(TokenError::NotAuthenticated);
        }
        self.tokens.access_token().await
    }

    pub fn sign_out(&self) {
        self.signed_out.store(true, Ordering::Release);
        tracing::info!("session signed out");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("roles", &self.roles)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::auth::MockTokenSource;
    use rstest::*;
    use speculoos::prelude::*;

    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    /// Token signed with a key the client never sees
    fn jwt(claims: Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"backend secret"),
        )
        .unwrap()
    }

    #[rstest]
    #[case(json!({"permissions": ["Admin"]}), RoleSet { admin: true, staff: false })]
    #[case(json!({"permissions": ["Staff", "read:members"]}), RoleSet { admin: false, staff: true })]
    #[case(json!({"sub": "auth0|1"}), RoleSet::default())]
    fn test_roles_from_jwt(#[case] claims: Value, #[case] expected: RoleSet) {
        assert_that!(roles_from_jwt(&jwt(claims)))
            .is_ok()
            .is_equal_to(expected);
    }

    #[test]
    fn test_registered_claims_are_not_checked() {
        let token = jwt(json!({
            "permissions": ["Staff"],
            "aud": "https://members.example.org",
            "exp": 1,
        }));
        assert_that!(roles_from_jwt(&token))
            .is_ok()
            .is_equal_to(RoleSet {
                admin: false,
                staff: true,
            });
    }

    #[rstest]
    #[case("not-a-jwt")]
    #[case("eyJhbGciOiJSUzI1NiJ9.not base64.signature")]
    fn test_malformed_token(#[case] token: &str) {
        assert_that!(roles_from_jwt(token))
            .is_err()
            .matches(|err| matches!(err, SessionError::MalformedToken(_)));
    }

    #[rstest]
    #[case(RoleSet { admin: true, staff: true }, MemberAccess::Full)]
    #[case(RoleSet { admin: false, staff: true }, MemberAccess::SearchOnly)]
    #[case(RoleSet::default(), MemberAccess::None)]
    fn test_member_access(#[case] roles: RoleSet, #[case] expected: MemberAccess) {
        assert_that!(roles.member_access()).is_equal_to(expected);
    }

    #[tokio::test]
    async fn test_sign_out_stops_tokens() {
        let mut tokens = MockTokenSource::new();
        tokens
            .expect_access_token()
            .times(1)
            .returning(|| Ok("token".to_string()));
        let session = Session::new(Arc::new(tokens), RoleSet::default());
        let shared = session.clone();

        assert_that!(session.access_token().await).is_ok();
        shared.sign_out();
        assert_that!(session.access_token().await)
            .is_err()
            .matches(|err| matches!(err, TokenError::NotAuthenticated));
    }
}
