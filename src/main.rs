use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, warn};
use wordlist_forge::cli::{exit_code, parse_cli, run_command};
use wordlist_forge::logging;

fn main() -> ExitCode {
    let cli = parse_cli();
    logging::init(cli.verbose);

    // Ctrl-C asks the generator to pause after the batch in flight
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("Interrupt received; pausing after the current batch (press again to quit)");
    }) {
        warn!("Could not install the interrupt handler: {e}");
    }

    match run_command(&cli.command, &stop) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(exit_code(&e))
        }
    }
}
