use crate::api::config::{ResolveOptions, ScannerConfig};
use crate::api::models::{Interface, InterfaceReport, Profile, ReportFilter, ResolvedCredential};
use crate::backend::open_platform_store;
use crate::core::enumerate::build_report;
use crate::core::resolver::CredentialResolver;
use crate::core::scanner::{CommandScanner, CredentialScanner};
use crate::core::store::ProfileStore;
use crate::Result;

/// High-level interface for recovering saved Wi-Fi keys.
///
/// Owns one profile store session for its whole lifetime; the session is
/// released when the `KeyFinder` is dropped.
///
/// # Creating an Instance
///
/// ```no_run
/// use wlkeys::KeyFinder;
///
/// # async fn example() -> wlkeys::Result<()> {
/// let finder = KeyFinder::new().await?;
/// # Ok(())
/// # }
/// ```
///
/// # Examples
///
/// ## Dump every saved key
///
/// ```no_run
/// use wlkeys::{KeyFinder, ReportFilter};
///
/// # async fn example() -> wlkeys::Result<()> {
/// let finder = KeyFinder::new().await?;
///
/// for iface in finder.report(&ReportFilter::default()).await? {
///     println!("---- Interface: {} ----", iface.interface.description);
///     for entry in iface.profiles {
///         println!("{}: {:?}", entry.profile.name, entry.credential.secret());
///     }
/// }
/// # Ok(())
/// # }
/// ```
///
/// ## Resolve a single profile
///
/// ```no_run
/// use wlkeys::KeyFinder;
///
/// # async fn example() -> wlkeys::Result<()> {
/// let finder = KeyFinder::new().await?;
/// let iface = finder.list_interfaces().await?.remove(0);
///
/// match finder.resolve(&iface, "MyHomeWiFi").await.secret() {
///     Some(psk) => println!("PASS: {psk}"),
///     None => println!("PASS: (not available / permission denied)"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct KeyFinder {
    store: Box<dyn ProfileStore>,
    scanner: Box<dyn CredentialScanner>,
    options: ResolveOptions,
}

impl KeyFinder {
    /// Opens the platform profile store with the platform's default fallback tool.
    pub async fn new() -> Result<Self> {
        Self::with_config(ScannerConfig::platform_default(), ResolveOptions::default()).await
    }

    /// Opens the platform profile store with a custom fallback tool configuration.
    pub async fn with_config(scanner: ScannerConfig, options: ResolveOptions) -> Result<Self> {
        let store = open_platform_store().await?;
        Ok(Self::from_parts(
            store,
            Box::new(CommandScanner::new(scanner)),
            options,
        ))
    }

    /// Builds a finder from an existing store and scanner.
    pub fn from_parts(
        store: Box<dyn ProfileStore>,
        scanner: Box<dyn CredentialScanner>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            store,
            scanner,
            options,
        }
    }

    fn resolver(&self) -> CredentialResolver<'_> {
        CredentialResolver::with_options(
            self.store.as_ref(),
            self.scanner.as_ref(),
            self.options.clone(),
        )
    }

    /// Lists wireless interfaces.
    pub async fn list_interfaces(&self) -> Result<Vec<Interface>> {
        self.store.interfaces().await
    }

    /// Lists saved profiles on one interface.
    pub async fn list_profiles(&self, interface: &Interface) -> Result<Vec<Profile>> {
        self.store.profiles(interface).await
    }

    /// Resolves one profile's key. Never fails; see [`ResolvedCredential`].
    pub async fn resolve(&self, interface: &Interface, profile: &str) -> ResolvedCredential {
        self.resolver().resolve(interface, profile).await
    }

    /// Resolves every saved profile on every interface matching `filter`.
    ///
    /// Fails only if the interface list cannot be read.
    pub async fn report(&self, filter: &ReportFilter) -> Result<Vec<InterfaceReport>> {
        build_report(self.store.as_ref(), &self.resolver(), filter).await
    }
}
