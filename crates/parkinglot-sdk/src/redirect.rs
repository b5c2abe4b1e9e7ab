//! Navigation to the login entry point after a session is invalidated

/// Sends the user to the login entry point
pub trait LoginRedirect: Send + Sync {
    fn redirect(&self, login_path: &str);
}

/// Records the redirect in the log only
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect(&self, login_path: &str) {
        tracing::warn!("Session invalidated, sign in again at {}", login_path);
    }
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, login_path: &str) {
        self(login_path)
    }
}
