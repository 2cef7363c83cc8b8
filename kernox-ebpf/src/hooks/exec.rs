use aya_ebpf::programs::TracePointContext;
use kernox_common::on_exec;

use super::report;
use crate::{
	utils::{Channel, CurrentTask, Scratch, UserCStr},
	EXEC_EVENTS, EXEC_SCRATCH,
};

// syscalls/sys_enter_execve: common header (8) + __syscall_nr (4) + pad (4), then filename.
const FILENAME_OFFSET: usize = 16;

pub fn try_sys_enter_execve(ctx: TracePointContext) -> Result<u32, u32> {
	let filename: *const u8 = unsafe { ctx.read_at(FILENAME_OFFSET) }.unwrap_or(core::ptr::null());

	let outcome = on_exec(
		&CurrentTask,
		&UserCStr(filename),
		&Scratch(&EXEC_SCRATCH),
		&Channel(&EXEC_EVENTS),
	);
	report(&ctx, outcome);

	Ok(0)
}
