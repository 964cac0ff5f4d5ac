use clap::{App, Arg};
use log::{debug, error};
use partfs_tool_lib::{Config, Engine, NO_COMMANDS};
use std::io::BufRead;
use std::process::exit;

fn main() {
    env_logger::builder().format_timestamp_nanos().init();

    let arguments = App::new("partfs-shell")
        .version("0.1.0")
        .about("Runs partfs commands from a script or from standard input.")
        .arg(
            Arg::with_name("script")
                .short("s")
                .long("script")
                .takes_value(true)
                .help("A file of commands to run, one per line"),
        )
        .arg(
            Arg::with_name("suffix")
                .long("suffix")
                .takes_value(true)
                .help("The prefix of generated mount ids. Overrides PARTFS_MOUNT_SUFFIX."),
        )
        .get_matches();

    let mut config = Config::from_env();

    if let Some(suffix) = arguments.value_of("suffix") {
        config = config.with_suffix(suffix);
    }

    debug!("starting with {:?}", config);

    let mut engine = Engine::new(config);

    if let Some(path) = arguments.value_of("script") {
        let script = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                error!("could not read {}: {}", path, e);
                eprintln!("Failed to read script {}. Error: {}", path, e);
                exit(1);
            }
        };

        println!("{}", engine.run_command_line(&script));
        return;
    }

    let stdin = std::io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read input. Error: {}", e);
                exit(1);
            }
        };

        let output = engine.run_command_line(&line);

        if output != NO_COMMANDS {
            println!("{}", output);
        }
    }
}
