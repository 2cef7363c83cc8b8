// region:    --- Modules
mod cli;
mod core;
mod error;
mod supervisor;
mod trx;
mod workers;
// endregion: --- Modules

use crate::{
	cli::args::{Cli, HookSelection},
	supervisor::Supervisor,
	trx::new_channel,
	workers::{EventSink, RingBufWorker},
};

pub use self::error::{Error, Result};
use aya::{
	maps::{MapData, RingBuf},
	programs::{KProbe, TracePoint},
	Ebpf,
};
use clap::Parser;
use kernox_common::{EbpfEvent, EventType};
use std::path::Path;
use tokio::io::unix::AsyncFd;
use tracing::info;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
#[rustfmt::skip]
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	let _tracing_guard = init_tracing(args.log_dir.as_deref());

	let hooks = args.hooks()?;

	// Bump the memlock rlimit. This is needed for older kernels that don't use the
	// new memcg based accounting, see https://lwn.net/Articles/837122/
	let rlim = libc::rlimit {
		rlim_cur: libc::RLIM_INFINITY,
		rlim_max: libc::RLIM_INFINITY,
	};
	let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
	if ret != 0 {
		debug!("remove limit on locked memory failed, ret is: {ret}");
	}

	let mut ebpf = aya::Ebpf::load(aya::include_bytes_aligned!(concat!(env!("OUT_DIR"), "/kernox")))?;
	if let Err(e) = aya_log::EbpfLogger::init(&mut ebpf) {
		// This can happen if you remove all log statements from your eBPF program.
		warn!("failed to initialize eBPF logger: {e}");
	}

	let streams = load_hooks(&mut ebpf, hooks)?;

	let (event_tx, event_rx) = new_channel::<EbpfEvent>("ebpf_event");

	let mut supervisor = Supervisor::new();
	for (kind, ringbuf_fd) in streams {
		let worker = RingBufWorker::start(kind, ringbuf_fd, event_tx.clone(), supervisor.token())?;
		supervisor.spawn(worker.run());
	}
	drop(event_tx);

	let sink = EventSink::start(event_rx, supervisor.token(), args.tree_max_size)?;
	supervisor.spawn(sink.run());

	info!(
		"Kernox monitoring started (process: {}, dns: {})",
		hooks.process, hooks.dns
	);
	supervisor.wait(args.run_time()).await?;

	supervisor.shutdown().await?;

	Ok(())
}

/// Stdout by default, or a daily rolling file under `log_dir`. The returned guard flushes
/// the non-blocking writer and must live as long as the program.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
	match log_dir {
		Some(log_dir) => {
			let file_appender = rolling::daily(log_dir, "kernox.log");
			let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

			tracing_subscriber::fmt()
				.with_writer(non_blocking_writer)
				.with_ansi(false)
				.with_target(false)
				.with_env_filter(EnvFilter::from_default_env())
				.init();

			Some(guard)
		}
		None => {
			tracing_subscriber::fmt()
				.with_target(false)
				.with_env_filter(EnvFilter::from_default_env())
				.init();

			None
		}
	}
}

/// Loads and attaches the selected programs. Returns one readable ring buffer per record kind.
pub fn load_hooks(ebpf: &mut Ebpf, hooks: HookSelection) -> Result<Vec<(EventType, AsyncFd<RingBuf<MapData>>)>> {
	let mut streams = Vec::new();

	if hooks.process {
		let tp_execve: &mut TracePoint = ebpf
			.program_mut("sys_enter_execve")
			.ok_or(Error::EbpfProgNotFound("sys_enter_execve"))?
			.try_into()?;
		tp_execve.load()?;
		tp_execve.attach("syscalls", "sys_enter_execve")?;

		let tp_exit: &mut TracePoint = ebpf
			.program_mut("sched_process_exit")
			.ok_or(Error::EbpfProgNotFound("sched_process_exit"))?
			.try_into()?;
		tp_exit.load()?;
		tp_exit.attach("sched", "sched_process_exit")?;

		streams.push((EventType::Exec, take_ringbuf(ebpf, "EXEC_EVENTS")?));
		streams.push((EventType::Exit, take_ringbuf(ebpf, "EXIT_EVENTS")?));
	}

	if hooks.dns {
		let kp_udp_sendmsg: &mut KProbe = ebpf
			.program_mut("udp_sendmsg")
			.ok_or(Error::EbpfProgNotFound("udp_sendmsg"))?
			.try_into()?;
		kp_udp_sendmsg.load()?;
		kp_udp_sendmsg.attach("udp_sendmsg", 0)?;

		streams.push((EventType::Dns, take_ringbuf(ebpf, "DNS_EVENTS")?));
	}

	Ok(streams)
}

fn take_ringbuf(ebpf: &mut Ebpf, name: &'static str) -> Result<AsyncFd<RingBuf<MapData>>> {
	let ring_buf = RingBuf::try_from(ebpf.take_map(name).ok_or(Error::EbpfMapNotFound(name))?)?;
	let fd = AsyncFd::new(ring_buf)?;
	Ok(fd)
}
