/// Supplies HMAC key material for access credentials.
///
/// Tokens are always signed with [`current`](SecretProvider::current); the
/// [`previous`](SecretProvider::previous) secrets are still accepted when
/// verifying.
pub trait SecretProvider: Send + Sync {
    fn current(&self) -> &[u8];
    fn previous(&self) -> Vec<&[u8]>;
}

/// Secrets fixed at startup from configuration.
#[derive(Clone)]
pub struct StaticSecret {
    current: Vec<u8>,
    previous: Vec<Vec<u8>>,
}

impl StaticSecret {
    pub fn new(current: impl Into<Vec<u8>>) -> Self {
        Self { current: current.into(), previous: Vec::new() }
    }

    pub fn with_previous<I, S>(mut self, previous: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        self.previous = previous.into_iter().map(Into::into).collect();
        self
    }
}

impl std::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecret")
            .field("previous", &self.previous.len())
            .finish_non_exhaustive()
    }
}

impl SecretProvider for StaticSecret {
    fn current(&self) -> &[u8] {
        &self.current
    }

    fn previous(&self) -> Vec<&[u8]> {
        self.previous.iter().map(Vec::as_slice).collect()
    }
}
