use core::ptr::addr_of;

use aya_ebpf::{
	helpers::{bpf_probe_read_kernel, bpf_probe_read_user_buf},
	programs::ProbeContext,
};
use kernox_common::{on_dns_query, OutboundDatagram, PayloadSegment};

use super::report;
use crate::{
	utils::{Channel, CurrentTask, Scratch, EFAULT},
	vmlinux::{msghdr, sock},
	DNS_EVENTS, DNS_SCRATCH,
};

// struct iov_iter (x86_64, 6.4+):
//   0  u8 iter_type
//   16 union { const struct iovec *__iov; void __user *ubuf; ... }
//   24 size_t count
// 5.14 to 6.3 kernels have ITER_IOVEC == 0 and count at 16, so names come out empty there.
const ITER_TYPE_OFFSET: usize = 0;
const ITER_PTR_OFFSET: usize = 16;
const ITER_COUNT_OFFSET: usize = 24;

const ITER_UBUF: u8 = 0;
const ITER_IOVEC: u8 = 1;

// struct iovec { void __user *iov_base; size_t iov_len; }
const IOV_BASE_OFFSET: usize = 0;
const IOV_LEN_OFFSET: usize = 8;

pub fn try_udp_sendmsg(ctx: ProbeContext) -> Result<u32, u32> {
	let sk: *const sock = ctx.arg(0).ok_or(0u32)?;
	let msg: *const msghdr = ctx.arg(1).ok_or(0u32)?;
	if sk.is_null() || msg.is_null() {
		return Ok(0);
	}

	let outcome = on_dns_query(
		&CurrentTask,
		&SendMsg { sk, msg },
		&Scratch(&DNS_SCRATCH),
		&Channel(&DNS_EVENTS),
	);
	report(&ctx, outcome);

	Ok(0)
}

/// Arguments of `udp_sendmsg(sk, msg, len)`.
struct SendMsg {
	sk: *const sock,
	msg: *const msghdr,
}

impl OutboundDatagram for SendMsg {
	type Segment = UserSegment;

	fn dest_port_be(&self) -> Result<u16, i64> {
		unsafe { bpf_probe_read_kernel(&(*self.sk).__sk_common.__bindgen_anon_3.__bindgen_anon_1.skc_dport) }
	}

	fn dest_addr(&self) -> Result<u32, i64> {
		unsafe { bpf_probe_read_kernel(&(*self.sk).__sk_common.__bindgen_anon_1.__bindgen_anon_1.skc_daddr) }
	}

	fn first_segment(&self) -> Option<UserSegment> {
		unsafe {
			let iter = addr_of!((*self.msg).msg_iter) as *const u8;
			let iter_type: u8 = bpf_probe_read_kernel(iter.add(ITER_TYPE_OFFSET)).ok()?;
			let ptr: *const u8 = bpf_probe_read_kernel(iter.add(ITER_PTR_OFFSET) as *const *const u8).ok()?;

			let (base, len) = match iter_type {
				ITER_UBUF => {
					let count: usize = bpf_probe_read_kernel(iter.add(ITER_COUNT_OFFSET) as *const usize).ok()?;
					(ptr, count)
				}
				ITER_IOVEC => {
					if ptr.is_null() {
						return None;
					}
					let base: *const u8 = bpf_probe_read_kernel(ptr.add(IOV_BASE_OFFSET) as *const *const u8).ok()?;
					let len: usize = bpf_probe_read_kernel(ptr.add(IOV_LEN_OFFSET) as *const usize).ok()?;
					(base, len)
				}
				_ => return None,
			};

			if base.is_null() {
				return None;
			}
			Some(UserSegment { base, len })
		}
	}
}

/// Contiguous user buffer holding the start of the datagram.
pub struct UserSegment {
	base: *const u8,
	len: usize,
}

impl PayloadSegment for UserSegment {
	fn len(&self) -> usize {
		self.len
	}

	fn read(&self, offset: usize, dst: &mut [u8]) -> Result<(), i64> {
		match offset.checked_add(dst.len()) {
			Some(end) if end <= self.len => unsafe { bpf_probe_read_user_buf(self.base.add(offset), dst) },
			_ => Err(EFAULT),
		}
	}
}
