use wlkeys::{KeyFinder, ReportFilter};

#[tokio::main]
async fn main() -> wlkeys::Result<()> {
    let finder = KeyFinder::new().await?;

    for iface in finder.report(&ReportFilter::default()).await? {
        println!("---- Interface: {} ----", iface.interface.description);
        for entry in iface.profiles {
            let pass = entry.credential.secret().unwrap_or("(not available)");
            println!("{:30} {}", entry.profile.ssid, pass);
        }
    }

    Ok(())
}
