mod options;
mod sim;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let options = options::DriverOptions::parse();

    let spec = options.verbose.log_level_filter().to_string().to_lowercase();
    let _logger = flexi_logger::Logger::try_with_env_or_str(&spec)?.start()?;

    let output_file = sim::run(&options)?;
    log::info!("Wrote {}", output_file.display());
    Ok(())
}
