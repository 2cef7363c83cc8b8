#![no_std]
#![no_main]

use aya_ebpf::{
	macros::{kprobe, map, tracepoint},
	maps::{PerCpuArray, RingBuf},
	programs::{ProbeContext, TracePointContext},
};
use kernox_common::{DnsEvent, ExecEvent};

mod hooks;
mod utils;

#[allow(non_upper_case_globals, non_snake_case, non_camel_case_types, dead_code, clippy::all)]
mod vmlinux {
	include!(concat!(env!("OUT_DIR"), "/vmlinux.rs"));
}

#[map]
static EXEC_EVENTS: RingBuf = RingBuf::with_byte_size(256 * 1024, 0);

#[map]
static EXIT_EVENTS: RingBuf = RingBuf::with_byte_size(64 * 1024, 0);

#[map]
static DNS_EVENTS: RingBuf = RingBuf::with_byte_size(256 * 1024, 0);

// Records carrying a 128 byte string are built in per-CPU scratch, off the 512 byte stack.
#[map]
static EXEC_SCRATCH: PerCpuArray<ExecEvent> = PerCpuArray::with_max_entries(1, 0);

#[map]
static DNS_SCRATCH: PerCpuArray<DnsEvent> = PerCpuArray::with_max_entries(1, 0);

#[tracepoint]
pub fn sys_enter_execve(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_execve(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sched_process_exit(ctx: TracePointContext) -> u32 {
	match hooks::try_sched_process_exit(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[kprobe]
pub fn udp_sendmsg(ctx: ProbeContext) -> u32 {
	match hooks::try_udp_sendmsg(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
	loop {}
}

#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 13] = *b"Dual MIT/GPL\0";
