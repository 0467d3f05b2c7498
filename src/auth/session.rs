use std::fmt;

use serde::Deserialize;

/// Opaque short-lived bearer credential.
///
/// The core never parses the token or inspects its expiry; expiry is
/// observed operationally when a protected request comes back 401/403.
/// Never written to durable storage, and redacted in Debug output so it
/// cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Identity returned by the server alongside a token.
/// Role-based gating happens in the UI; the core only carries the data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl User {
    /// The admin panel gates rendering on this; enforcement stays server-side.
    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

/// An established session: identity and token always travel together,
/// so a partial session is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub access_token: AccessToken,
}

/// What the UI observes through the session store.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Bootstrap is still outstanding; gated content should hold rendering
    /// instead of flashing an unauthenticated view.
    #[default]
    Loading,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|session| &session.user)
    }
}

/// Wire shape of the login and refresh responses.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionPayload {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: User,
}

impl SessionPayload {
    pub fn into_session(self) -> Session {
        Session {
            user: self.user,
            access_token: AccessToken::new(self.access_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_payload() {
        let json = r#"{"accessToken": "tok-1", "user": {"id": "u1", "name": "Ada", "role": "ADMIN"}}"#;
        let payload: SessionPayload =
            serde_json::from_str(json).expect("Failed to parse session payload");
        let session = payload.into_session();
        assert_eq!(session.access_token.secret(), "tok-1");
        assert_eq!(session.user.name, "Ada");
        assert!(session.user.is_admin());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        assert_eq!(format!("{:?}", token), "AccessToken(..)");
    }

    #[test]
    fn test_non_admin_role() {
        let user = User {
            id: "u2".into(),
            name: "Bob".into(),
            role: "USER".into(),
        };
        assert!(!user.is_admin());
    }
}
