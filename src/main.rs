use clap::{Arg, ArgAction, Command};
use std::error::Error;
use std::path::{Path, PathBuf};

use lfs_rsync_agent::logging::*;
use lfs_rsync_agent::{logging, signals, Agent, AgentConfig, RsyncTransfer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let matches = Command::new("lfs-rsync-agent")
		.version(env!("CARGO_PKG_VERSION"))
		.author("Szilard Hajba <szilu@symbion.hu>")
		.about("Git LFS custom transfer agent using rsync")
		.arg(
			Arg::new("remote")
				.value_name("REMOTE")
				.help("Remote storage root, e.g. /backup/lfs or host:/srv/lfs"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file (default: ~/.config/lfs-rsync-agent/config.toml)"),
		)
		.arg(
			Arg::new("rsync-command")
				.long("rsync-command")
				.value_name("PROGRAM")
				.help("Transfer program to run instead of rsync"),
		)
		.arg(
			Arg::new("rsync-arg")
				.long("rsync-arg")
				.value_name("ARG")
				.action(ArgAction::Append)
				.allow_hyphen_values(true)
				.help("Extra argument for the transfer program (repeatable)"),
		)
		.arg(
			Arg::new("temp-dir")
				.long("temp-dir")
				.value_name("DIR")
				.help("Directory for downloaded files"),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.value_name("LEVEL")
				.help("Log level when RUST_LOG is not set (trace, debug, info, warn, error)"),
		)
		.get_matches();

	let mut config = AgentConfig::load(matches.get_one::<String>("config").map(Path::new))?;
	config.apply_env();

	if let Some(remote) = matches.get_one::<String>("remote") {
		config.remote = Some(remote.clone());
	}
	if let Some(command) = matches.get_one::<String>("rsync-command") {
		config.rsync_command = command.clone();
	}
	if let Some(args) = matches.get_many::<String>("rsync-arg") {
		config.rsync_args = args.cloned().collect();
	}
	if let Some(dir) = matches.get_one::<String>("temp-dir") {
		config.temp_dir = Some(PathBuf::from(dir));
	}
	if let Some(level) = matches.get_one::<String>("log-level") {
		config.log_level = level.clone();
	}
	config.validate()?;

	logging::init_tracing(&config.log_level);
	signals::exit_on_signal();
	debug!("Configuration: {:?}", config);

	let transfer = RsyncTransfer::new(config.rsync_command.clone(), config.rsync_args.clone());
	let mut agent = Agent::from_config(&config, transfer);

	let reader = tokio::io::BufReader::new(tokio::io::stdin());
	let mut stdout = tokio::io::stdout();
	agent.run(reader, &mut stdout).await?;

	Ok(())
}

// vim: ts=4
