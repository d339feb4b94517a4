use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = sortbox::cli::parse();
    app::run(args)
}
