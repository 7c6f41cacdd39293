fn main() -> anyhow::Result<()> {
    comp_server::run()
}
