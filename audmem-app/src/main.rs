mod app;
mod cli;
mod setup;

use anyhow::Result;
use clap::Parser;

pub use app::App;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();
    let experiment = setup::build(&args)?;
    let font = audmem_render::load_font(args.font.as_deref());

    let app = App::new(experiment, font, args.windowed);
    app.run()?;

    Ok(())
}
