use std::fs::File;
use std::io;
use std::sync::Mutex;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sitesh::{
    cli::SiteshCli,
    fetch::HttpFetcher,
    output::ConsoleSink,
    repl::Terminal,
    sitemap::{fetch_sitemap, read_sitemap, sitemap_tree},
    system::SiteSystem,
};
use tracing::info;

fn main() -> Result<()> {
    let cli = SiteshCli::parse();

    // The screen is in raw mode while the shell runs, so logs only go to a file.
    if let Some(log_file) = &cli.log_file {
        let file = File::create(log_file).into_diagnostic()?;
        tracing_subscriber::fmt()
            .with_max_level(cli.log_level())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    let origin = cli.base_url()?;
    let site = cli.site_label()?;
    let fetcher = HttpFetcher::new(cli.timeout())?;

    let urls = match &cli.sitemap_file {
        Some(path) => read_sitemap(path)?,
        None => fetch_sitemap(&fetcher, &cli.sitemap_url()?)?,
    };
    let tree = sitemap_tree(&urls)?;
    info!(%origin, %site, nodes = tree.len(), "filesystem ready");

    let system = SiteSystem::new(tree, origin, site, fetcher);
    let mut terminal = Terminal::new(system, ConsoleSink::new(io::stdout()));
    terminal
        .sink_mut()
        .notice("Type ls, cd, cat, echo or clear. Ctrl-D exits.")
        .into_diagnostic()?;

    terminal.run()
}
