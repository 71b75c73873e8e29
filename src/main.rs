use pomalign::cli::commands::{CliArgs, Commands, RealignArgs};
use pomalign::cli::output::OutputFormatter;
use pomalign::util::{init_logging, LoggingConfig};
use pomalign::{VersionManager, VERSION};

use clap::Parser;
use tracing::{debug, error};

fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_cli(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("pomalign v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Realign(realign_args) => handle_realign(realign_args, args.quiet),
    };

    std::process::exit(exit_code);
}

fn handle_realign(args: &RealignArgs, quiet: bool) -> i32 {
    let config = args.to_config();
    debug!("{}", config);

    let manager = match VersionManager::new(config) {
        Ok(manager) => manager,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let summary = match manager.run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };

    if !quiet {
        match OutputFormatter::new(args.format.into()).format(&summary) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return 2;
            }
        }
    }

    summary.exit_code()
}
