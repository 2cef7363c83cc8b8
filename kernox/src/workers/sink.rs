use kernox_common::{DnsEvent, EbpfEvent, ExecEvent, ExitEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
	core::{ProcessTree, UserCache},
	error::Result,
	trx::Rx,
};

/// Per-kind count of records received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
	pub exec: u64,
	pub exit: u64,
	pub dns: u64,
}

impl SinkStats {
	pub fn total(&self) -> u64 {
		self.exec + self.exit + self.dns
	}
}

/// Final consumer: keeps the lineage tree current and logs every record.
pub struct EventSink {
	pub rx: Rx<EbpfEvent>,
	pub shutdown: CancellationToken,
	tree: ProcessTree,
	users: UserCache,
	stats: SinkStats,
}

impl EventSink {
	pub fn start(rx: Rx<EbpfEvent>, shutdown: CancellationToken, tree_max_size: usize) -> Result<Self> {
		Ok(EventSink {
			rx,
			shutdown,
			tree: ProcessTree::new(tree_max_size),
			users: UserCache::new(),
			stats: SinkStats::default(),
		})
	}

	pub async fn run(mut self) -> Result<()> {
		loop {
			tokio::select! {
				_ = self.shutdown.cancelled() => {
					break;
				}

				evt = self.rx.recv() => {
					match evt {
						Ok(evt) => self.log(evt),
						Err(e) => {
							info!("Event channel '{}' closed: {:?}", self.rx.name(), e);
							break;
						}
					}
				}
			}
		}

		let pending: Vec<EbpfEvent> = self.rx.drain().collect();
		for evt in pending {
			self.log(evt);
		}

		let stats = self.stats();
		info!(
			"Shutdown: {} events received ({} exec, {} exit, {} dns), {} processes tracked",
			stats.total(),
			stats.exec,
			stats.exit,
			stats.dns,
			self.tree().len()
		);
		if !self.tree().is_empty() {
			debug!("Process tree:\n{}", self.tree().render(1));
		}

		Ok(())
	}

	fn log(&mut self, evt: EbpfEvent) {
		if let Some(line) = self.handle(evt) {
			info!("{line}");
		}
	}

	/// Applies `evt` to the tree and counters. Returns the log line, or `None` for records
	/// that are counted but not reported.
	pub fn handle(&mut self, evt: EbpfEvent) -> Option<String> {
		match evt {
			EbpfEvent::Exec(e) => {
				self.stats.exec += 1;
				let user = self.users.name(e.uid);
				self.tree.add_process(e.pid, e.ppid, e.comm_str(), e.filename_str(), e.uid, user);
				Some(format_exec(&e, user, &self.tree.lineage_string(e.pid)))
			}
			EbpfEvent::Exit(e) => {
				self.stats.exit += 1;
				let user = self.users.name(e.uid);
				let line = format_exit(&e, user, &self.tree.lineage_string(e.pid));
				self.tree.remove_process(e.pid);
				Some(line)
			}
			EbpfEvent::Dns(e) => {
				self.stats.dns += 1;
				if e.dns_name_str().is_empty() {
					return None;
				}
				let user = self.users.name(e.uid);
				Some(format_dns(&e, user, &self.tree.lineage_string(e.pid)))
			}
		}
	}

	pub fn stats(&self) -> SinkStats {
		self.stats
	}

	pub fn tree(&self) -> &ProcessTree {
		&self.tree
	}
}

// region:    --- Formatting

fn format_exec(e: &ExecEvent, user: &str, lineage: &str) -> String {
	format!(
		"[EXEC] PID:{} | PPID:{} | UID:{} | USER:{} | GID:{} | CMD:{} | FILE:{} | LINEAGE: {}",
		e.pid,
		e.ppid,
		e.uid,
		user,
		e.gid,
		e.comm_str(),
		e.filename_str(),
		lineage
	)
}

fn format_exit(e: &ExitEvent, user: &str, lineage: &str) -> String {
	format!(
		"[EXIT] PID:{} | PPID:{} | UID:{} | USER:{} | CMD:{} | CODE:{} | LINEAGE: {}",
		e.pid,
		e.ppid,
		e.uid,
		user,
		e.comm_str(),
		e.exit_code,
		lineage
	)
}

fn format_dns(e: &DnsEvent, user: &str, lineage: &str) -> String {
	format!(
		"[DNS] PID:{} | PPID:{} | UID:{} | USER:{} | CMD:{} | {}:{} | QUERY:{} | LINEAGE: {}",
		e.pid,
		e.ppid,
		e.uid,
		user,
		e.comm_str(),
		e.dest_addr(),
		e.dest_port,
		e.dns_name_str(),
		lineage
	)
}

// endregion: --- Formatting

// region:    --- Tests


// endregion: --- Tests
