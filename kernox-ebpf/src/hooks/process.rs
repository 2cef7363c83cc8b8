use aya_ebpf::programs::TracePointContext;
use kernox_common::on_exit;

use super::report;
use crate::{
	utils::{Channel, CurrentTask},
	EXIT_EVENTS,
};

pub fn try_sched_process_exit(ctx: TracePointContext) -> Result<u32, u32> {
	report(&ctx, on_exit(&CurrentTask, &Channel(&EXIT_EVENTS)));

	Ok(0)
}
