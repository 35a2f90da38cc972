use crate::error::WalletError;
use crate::ports::{ProviderSource, WalletProvider};

#[derive(Debug, Clone)]
pub struct Discovery<P> {
    pub provider: Option<P>,
    pub provider_name: Option<String>,
    pub has_provider: bool,
    pub has_conflict: bool,
    pub error: Option<WalletError>,
}

impl<P> Discovery<P> {
    fn none() -> Self {
        Self {
            provider: None,
            provider_name: None,
            has_provider: false,
            has_conflict: false,
            error: None,
        }
    }
}

/// Resolves the single usable provider from the source's current candidates.
///
/// With several candidates only a lone `isMetaMask` handle is trusted; any
/// other mix is reported as a conflict instead of guessing.
pub fn discover<S: ProviderSource>(source: &S) -> Discovery<S::Provider> {
    let mut candidates = source.candidates();
    match candidates.len() {
        0 => Discovery::none(),
        1 => {
            let provider = candidates.remove(0);
            Discovery {
                provider_name: Some(provider.descriptor().display_name()),
                provider: Some(provider),
                has_provider: true,
                has_conflict: false,
                error: None,
            }
        }
        n => {
            let mut canonical: Vec<_> = candidates
                .into_iter()
                .filter(|p| p.descriptor().is_metamask)
                .collect();
            if canonical.len() == 1 {
                let provider = canonical.remove(0);
                tracing::debug!(candidates = n, "wallet conflict resolved to canonical provider");
                Discovery {
                    provider_name: Some(provider.descriptor().display_name()),
                    provider: Some(provider),
                    has_provider: true,
                    has_conflict: true,
                    error: None,
                }
            } else {
                tracing::warn!(
                    candidates = n,
                    canonical = canonical.len(),
                    "ambiguous wallet providers"
                );
                Discovery {
                    provider: None,
                    provider_name: None,
                    has_provider: true,
                    has_conflict: true,
                    error: Some(WalletError::conflict()),
                }
            }
        }
    }
}
