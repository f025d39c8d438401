//! User-Agent string shared by listing and file requests.

/// Default User-Agent for every request the tool makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    format!("{name}/{version} (marker-hunt)")
}
