//! HTML snippets rendered by the routes.

/// Shown when the session has no active tenant.
#[must_use]
pub fn connect() -> String {
    "<a href='/connect'>Connect to Xero</a>".to_string()
}

/// Shown when the active tenant's organisation lookup succeeded.
#[must_use]
pub fn connected(name: &str) -> String {
    format!(
        "<p>Connected to: {}</p><p><a href='/disconnect'>Disconnect</a></p>",
        escape(name)
    )
}

/// Shown when the upstream rejected the stored access token.
#[must_use]
pub fn expired(name: Option<&str>) -> String {
    let reconnect = match name {
        Some(name) => format!("Reconnect {}", escape(name)),
        None => "Reconnect".to_string(),
    };
    format!(
        "<p>Session has expired...</p><p><a href='/connect'>{reconnect}</a></p><p><a href='/disconnect'>Disconnect</a></p>"
    )
}

#[must_use]
pub fn error() -> String {
    "Sorry, something went wrong".to_string()
}

#[must_use]
pub fn error_with_detail(detail: &str) -> String {
    format!("Sorry, something went wrong: {}", escape(detail))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
