use std::time::Duration;
use wlkeys::{KeyFinder, ResolveOptions, ScannerConfig};

#[tokio::main]
async fn main() -> wlkeys::Result<()> {
    let profile = std::env::args().nth(1).unwrap_or_else(|| "MyHomeWiFi".to_string());

    // Also recognise the French netsh label and give up on the tool after 5 seconds.
    let scanner = ScannerConfig::platform_default()
        .with_label("Contenu de la clé")
        .with_timeout(Duration::from_secs(5));
    let finder = KeyFinder::with_config(scanner, ResolveOptions::default()).await?;

    for iface in finder.list_interfaces().await? {
        let credential = finder.resolve(&iface, &profile).await;
        match (credential.secret(), credential.provenance()) {
            (Some(psk), Some(source)) => println!("{}: {psk} [{source}]", iface.description),
            _ => println!("{}: not available", iface.description),
        }
    }

    Ok(())
}
