fn main() -> anyhow::Result<()> {
    wlkeys_cli::run()
}
