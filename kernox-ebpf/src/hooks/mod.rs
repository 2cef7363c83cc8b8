mod exec;
mod network;
mod process;

pub use exec::*;
pub use network::*;
pub use process::*;

use aya_ebpf::EbpfContext;
use aya_log_ebpf::{error, warn};
use kernox_common::ProbeOutcome;

/// Logs the outcomes worth a trace line. Emitted and filtered triggers stay silent.
fn report<C: EbpfContext>(ctx: &C, outcome: ProbeOutcome) {
	match outcome {
		ProbeOutcome::Dropped(e) => error!(ctx, "Couldn't write to the ring buffer ->> ERROR: {}", e),
		ProbeOutcome::NoScratch => warn!(ctx, "scratch slot unavailable, event skipped"),
		ProbeOutcome::Emitted | ProbeOutcome::Filtered => (),
	}
}
