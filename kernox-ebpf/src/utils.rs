use aya_ebpf::{
	helpers::{
		bpf_get_current_comm, bpf_get_current_pid_tgid, bpf_get_current_uid_gid, bpf_probe_read_kernel,
		bpf_probe_read_user_str_bytes, r#gen::bpf_get_current_task,
	},
	maps::{PerCpuArray, RingBuf},
};
use kernox_common::{EventChannel, ScratchPool, TaskInfo, UserStr, TASK_COMM_LEN};

use crate::vmlinux::task_struct;

pub const EFAULT: i64 = -14;

/// The task running the probe.
pub struct CurrentTask;

impl CurrentTask {
	fn task() -> Result<*const task_struct, i64> {
		let task = unsafe { bpf_get_current_task() } as *const task_struct;
		if task.is_null() {
			return Err(EFAULT);
		}
		Ok(task)
	}
}

impl TaskInfo for CurrentTask {
	fn pid_tgid(&self) -> u64 {
		bpf_get_current_pid_tgid()
	}

	fn uid_gid(&self) -> u64 {
		bpf_get_current_uid_gid()
	}

	fn comm(&self) -> Result<[u8; TASK_COMM_LEN], i64> {
		bpf_get_current_comm()
	}

	fn parent_tgid(&self) -> Result<u32, i64> {
		let task = Self::task()?;
		unsafe {
			let parent: *const task_struct = bpf_probe_read_kernel(&(*task).real_parent)?;
			if parent.is_null() {
				return Err(EFAULT);
			}
			let tgid = bpf_probe_read_kernel(&(*parent).tgid)?;
			Ok(tgid as u32)
		}
	}

	fn exit_status(&self) -> Result<i32, i64> {
		let task = Self::task()?;
		unsafe { bpf_probe_read_kernel(&(*task).exit_code) }
	}
}

/// NUL-terminated string in user memory, e.g. a syscall argument.
pub struct UserCStr(pub *const u8);

impl UserStr for UserCStr {
	fn read_str(&self, dst: &mut [u8]) -> Result<usize, i64> {
		if self.0.is_null() {
			return Err(EFAULT);
		}
		let copied = unsafe { bpf_probe_read_user_str_bytes(self.0, dst)? };
		Ok(copied.len())
	}
}

pub struct Channel<'a>(pub &'a RingBuf);

impl<T> EventChannel<T> for Channel<'_> {
	fn emit(&self, record: &T) -> Result<(), i64> {
		self.0.output(record, 0)
	}
}

/// One-entry per-CPU array used as the processor's scratch slot.
pub struct Scratch<'a, T>(pub &'a PerCpuArray<T>);

impl<T> ScratchPool<T> for Scratch<'_, T> {
	fn with_slot<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
		let slot = self.0.get_ptr_mut(0)?;
		// probes do not nest on a CPU, so the slot is exclusively ours until we return
		Some(f(unsafe { &mut *slot }))
	}
}
