use crate::{dns::PayloadSegment, TASK_COMM_LEN};

/// State of the task that triggered the probe.
///
/// Every read that can fail returns the host's error code; probes treat a failure as
/// "field unknown" and keep going.
pub trait TaskInfo {
	/// Process id in the high half, thread id in the low half.
	fn pid_tgid(&self) -> u64;

	/// Group id in the high half, user id in the low half.
	fn uid_gid(&self) -> u64;

	fn comm(&self) -> Result<[u8; TASK_COMM_LEN], i64>;

	/// Thread-group id of the parent task, read through a validated kernel access.
	fn parent_tgid(&self) -> Result<u32, i64>;

	/// Raw termination status as stored by the kernel (exit code in bits 8..16).
	fn exit_status(&self) -> Result<i32, i64>;
}

/// NUL-terminated string living in user-controlled memory.
pub trait UserStr {
	/// Copies the string into `dst`, truncating to `dst.len() - 1` bytes plus a
	/// terminator. Returns the copied length without the terminator.
	fn read_str(&self, dst: &mut [u8]) -> Result<usize, i64>;
}

/// Outbound datagram seen at send time.
pub trait OutboundDatagram {
	type Segment: PayloadSegment;

	/// Destination port, network byte order.
	fn dest_port_be(&self) -> Result<u16, i64>;

	/// Destination IPv4 address, network byte order.
	fn dest_addr(&self) -> Result<u32, i64>;

	/// First contiguous segment of the message payload.
	fn first_segment(&self) -> Option<Self::Segment>;
}
