#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{operation} failed{}: {detail}", status_suffix(.status))]
    OAuth {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token decode error: {0}")]
    Token(String),
    #[error("Provider discovery error: {0}")]
    Discovery(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// True when the upstream rejected the access token (HTTP 401).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::OAuth { status, .. } => *status == Some(401),
            Self::Http(e) => e.status().is_some_and(|s| s.as_u16() == 401),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_only_for_401() {
        let expired = Error::OAuth {
            operation: "organisation lookup",
            status: Some(401),
            detail: String::new(),
        };
        let forbidden = Error::OAuth {
            operation: "organisation lookup",
            status: Some(403),
            detail: String::new(),
        };
        assert!(expired.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
        assert!(!Error::Token("bad".into()).is_unauthorized());
    }

    #[test]
    fn oauth_display_includes_status() {
        let err = Error::OAuth {
            operation: "token exchange",
            status: Some(400),
            detail: "invalid_grant".into(),
        };
        assert_eq!(err.to_string(), "token exchange failed (HTTP 400): invalid_grant");

        let err = Error::OAuth {
            operation: "organisation lookup",
            status: None,
            detail: "no organisations".into(),
        };
        assert_eq!(err.to_string(), "organisation lookup failed: no organisations");
    }
}
