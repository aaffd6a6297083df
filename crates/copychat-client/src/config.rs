use std::time::Duration;

/// Configuration for the agent API client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the agent-serving API.
    pub base_url: String,
    /// Default HTTP timeout for control-plane requests (lists, deletes).
    pub timeout: Duration,
    /// Timeout for a full streamed run.
    pub run_timeout: Duration,
}

impl ClientConfig {
    /// Creates a config pointing at the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            run_timeout: Duration::from_secs(300),
        }
    }

    /// Builds a config from `AGENTOS_API_URL` (honoring a `.env` file),
    /// falling back to the local development default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var("AGENTOS_API_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        Self::new(base_url)
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the control-plane timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the streamed-run timeout.
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}
