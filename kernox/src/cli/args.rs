use std::path::PathBuf;

use clap::Parser;
use humantime::Duration;

use crate::{Error, Result};

#[derive(Parser, Debug)]
#[command(name = "kernox", about = "Process lifecycle and DNS query monitor")]
pub struct Cli {
	#[arg(long, help = "Run duration (e.g., 20s, 5m, 1h). Runs until Ctrl-C/SIGTERM when omitted")]
	pub time: Option<Duration>,

	#[arg(long, help = "Write daily rolling logs to this directory instead of stdout")]
	pub log_dir: Option<PathBuf>,

	#[arg(long, help = "Do not attach the exec/exit probes")]
	pub no_process: bool,

	#[arg(long, help = "Do not attach the udp_sendmsg probe")]
	pub no_dns: bool,

	#[arg(long, default_value_t = 10_000, help = "Processes kept in the lineage tree before pruning")]
	pub tree_max_size: usize,
}

/// Probe groups to attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HookSelection {
	pub process: bool,
	pub dns: bool,
}

impl Cli {
	pub fn hooks(&self) -> Result<HookSelection> {
		let hooks = HookSelection {
			process: !self.no_process,
			dns: !self.no_dns,
		};
		if !hooks.process && !hooks.dns {
			return Err(Error::NoHooksSelected);
		}
		Ok(hooks)
	}

	pub fn run_time(&self) -> Option<std::time::Duration> {
		self.time.map(Into::into)
	}
}

// region:    --- Tests


// endregion: --- Tests
