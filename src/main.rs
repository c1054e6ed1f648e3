fn main() -> anyhow::Result<()> {
    pathmux::cli::run_cli()
}
