fn main() -> anyhow::Result<()> {
    optfilter::init();
    optfilter::cli::run()
}
