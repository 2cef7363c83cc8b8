use zerocopy::FromZeros;

use crate::{
	channel::EventChannel,
	dns::decode_name,
	event::{terminate, DnsEvent, EventType, ExecEvent, ExitEvent},
	scratch::ScratchPool,
	task::{OutboundDatagram, TaskInfo, UserStr},
	DNS_PORT, TASK_COMM_LEN,
};

/// What a single probe invocation did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
	/// One record was handed to the channel.
	Emitted,
	/// The trigger did not qualify (kernel idle task, non-DNS port).
	Filtered,
	/// The per-processor slot could not be acquired.
	NoScratch,
	/// The channel refused the record with the given error code.
	Dropped(i64),
}

impl From<Result<(), i64>> for ProbeOutcome {
	fn from(res: Result<(), i64>) -> Self {
		match res {
			Ok(()) => ProbeOutcome::Emitted,
			Err(code) => ProbeOutcome::Dropped(code),
		}
	}
}

/// Handles entry to an exec request. `filename` is the first syscall argument.
pub fn on_exec<T, F, P, C>(task: &T, filename: &F, pool: &P, channel: &C) -> ProbeOutcome
where
	T: TaskInfo,
	F: UserStr + ?Sized,
	P: ScratchPool<ExecEvent>,
	C: EventChannel<ExecEvent>,
{
	let pid = tgid(task);
	if pid == 0 {
		return ProbeOutcome::Filtered;
	}

	let res = pool.with_slot(|evt| {
		evt.zero();

		let (uid, gid) = credentials(task);
		evt.pid = pid;
		evt.uid = uid;
		evt.gid = gid;
		evt.event_type = EventType::Exec as u8;
		fill_comm(task, &mut evt.comm);
		evt.ppid = task.parent_tgid().unwrap_or(0);

		if filename.read_str(&mut evt.filename).is_err() {
			evt.filename.zero();
		}
		terminate(&mut evt.filename);

		channel.emit(evt)
	});

	res.map_or(ProbeOutcome::NoScratch, ProbeOutcome::from)
}

/// Handles process termination. The record is small enough for the probe stack.
pub fn on_exit<T, C>(task: &T, channel: &C) -> ProbeOutcome
where
	T: TaskInfo,
	C: EventChannel<ExitEvent>,
{
	let pid = tgid(task);
	if pid == 0 {
		return ProbeOutcome::Filtered;
	}

	let mut evt = ExitEvent::new_zeroed();
	let (uid, _) = credentials(task);
	evt.pid = pid;
	evt.uid = uid;
	evt.event_type = EventType::Exit as u8;
	fill_comm(task, &mut evt.comm);
	evt.ppid = task.parent_tgid().unwrap_or(0);
	evt.exit_code = task.exit_status().map(|status| status >> 8).unwrap_or(0);

	channel.emit(&evt).into()
}

/// Handles an outbound UDP send, emitting only for datagrams addressed to port 53.
pub fn on_dns_query<T, D, P, C>(task: &T, datagram: &D, pool: &P, channel: &C) -> ProbeOutcome
where
	T: TaskInfo,
	D: OutboundDatagram,
	P: ScratchPool<DnsEvent>,
	C: EventChannel<DnsEvent>,
{
	let port = match datagram.dest_port_be() {
		Ok(port) => u16::from_be(port),
		Err(_) => return ProbeOutcome::Filtered,
	};
	if port != DNS_PORT {
		return ProbeOutcome::Filtered;
	}

	let res = pool.with_slot(|evt| {
		evt.zero();

		let (uid, _) = credentials(task);
		evt.pid = tgid(task);
		evt.uid = uid;
		evt.event_type = EventType::Dns as u8;
		fill_comm(task, &mut evt.comm);
		evt.ppid = task.parent_tgid().unwrap_or(0);
		evt.dest_ip = datagram.dest_addr().unwrap_or(0);
		evt.dest_port = port;

		if let Some(segment) = datagram.first_segment() {
			decode_name(&segment, &mut evt.dns_name);
		}

		channel.emit(evt)
	});

	res.map_or(ProbeOutcome::NoScratch, ProbeOutcome::from)
}

// region:    --- Support

fn tgid<T: TaskInfo>(task: &T) -> u32 {
	(task.pid_tgid() >> 32) as u32
}

/// (uid, gid) from the combined credential value.
fn credentials<T: TaskInfo>(task: &T) -> (u32, u32) {
	let uid_gid = task.uid_gid();
	(uid_gid as u32, (uid_gid >> 32) as u32)
}

fn fill_comm<T: TaskInfo>(task: &T, dst: &mut [u8; TASK_COMM_LEN]) {
	match task.comm() {
		Ok(comm) => *dst = comm,
		Err(_) => dst.zero(),
	}
	terminate(dst);
}

// endregion: --- Support

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use crate::channel::mock::MockChannel;
	use crate::dns::tests::query;
	use crate::scratch::mock::MockScratch;
	use crate::task::mock::{comm, MockDatagram, MockTask, MockUserStr};
	use crate::FILENAME_LEN;

	fn fx_filename(path: &str) -> MockUserStr {
		MockUserStr(Some(path.as_bytes().to_vec()))
	}

	#[test]
	fn exec_emits_populated_record() -> Result<()> {
		// -- Setup & Fixtures
		let mut fx_task = MockTask::new(4242, 4243);
		fx_task.parent_tgid = Some(4000);
		fx_task.comm = Some(comm(b"bash"));
		let pool = MockScratch::<ExecEvent>::new();
		let channel = MockChannel::new();

		// -- Exec
		let outcome = on_exec(&fx_task, &fx_filename("/usr/bin/curl"), &pool, &channel);

		// -- Check
		assert_eq!(outcome, ProbeOutcome::Emitted);
		let records = channel.records.borrow();
		assert_eq!(records.len(), 1);
		let evt = &records[0];
		assert_eq!(evt.pid, 4242);
		assert_eq!(evt.ppid, 4000);
		assert_eq!(evt.uid, 1000);
		assert_eq!(evt.gid, 100);
		assert_eq!(evt.event_type, EventType::Exec as u8);
		assert_eq!(evt.comm_str(), "bash");
		assert_eq!(evt.filename_str(), "/usr/bin/curl");

		Ok(())
	}

	#[test]
	fn pid_zero_emits_nothing() -> Result<()> {
		// -- Setup & Fixtures
		let fx_idle = MockTask::new(0, 0);
		let fx_idle_thread = MockTask::new(0, 17);
		let pool = MockScratch::<ExecEvent>::new();
		let exec_channel = MockChannel::new();
		let exit_channel = MockChannel::new();

		// -- Exec & Check
		for task in [&fx_idle, &fx_idle_thread] {
			assert_eq!(
				on_exec(task, &fx_filename("/sbin/init"), &pool, &exec_channel),
				ProbeOutcome::Filtered
			);
			assert_eq!(on_exit(task, &exit_channel), ProbeOutcome::Filtered);
		}
		assert_eq!(exec_channel.len(), 0);
		assert_eq!(exit_channel.len(), 0);

		Ok(())
	}

	#[test]
	fn exec_strings_terminated_within_width() -> Result<()> {
		// -- Setup & Fixtures
		let pool = MockScratch::<ExecEvent>::new();
		let channel = MockChannel::new();
		let fx_names: [&[u8]; 3] = [b"sh", b"0123456789abcdef", b"a-much-longer-process-name"];
		let fx_paths = [
			"/bin/true".to_string(),
			"p".repeat(FILENAME_LEN - 1),
			"q".repeat(FILENAME_LEN),
			"r".repeat(FILENAME_LEN * 3),
		];

		// -- Exec
		for name in fx_names {
			for path in &fx_paths {
				let mut task = MockTask::new(10, 10);
				task.comm = Some(comm(name));
				on_exec(&task, &fx_filename(path), &pool, &channel);
			}
		}

		// -- Check
		let records = channel.records.borrow();
		assert_eq!(records.len(), fx_names.len() * fx_paths.len());
		for (idx, evt) in records.iter().enumerate() {
			let name = fx_names[idx / fx_paths.len()];
			let path = &fx_paths[idx % fx_paths.len()];

			assert_eq!(evt.comm[TASK_COMM_LEN - 1], 0);
			assert_eq!(evt.filename[FILENAME_LEN - 1], 0);

			let comm_len = name.len().min(TASK_COMM_LEN - 1);
			assert_eq!(evt.comm_str().as_bytes(), &name[..comm_len]);
			let path_len = path.len().min(FILENAME_LEN - 1);
			assert_eq!(evt.filename_str(), &path[..path_len]);
		}

		Ok(())
	}

	#[test]
	fn exec_degrades_unreadable_fields() -> Result<()> {
		// -- Setup & Fixtures
		let mut fx_task = MockTask::new(77, 77);
		fx_task.parent_tgid = None;
		fx_task.comm = None;
		let pool = MockScratch::<ExecEvent>::new();
		let channel = MockChannel::new();

		// -- Exec
		let outcome = on_exec(&fx_task, &MockUserStr(None), &pool, &channel);

		// -- Check
		assert_eq!(outcome, ProbeOutcome::Emitted);
		let records = channel.records.borrow();
		let evt = &records[0];
		assert_eq!(evt.pid, 77);
		assert_eq!(evt.ppid, 0);
		assert_eq!(evt.comm_str(), "");
		assert!(evt.filename.iter().all(|&b| b == 0));

		Ok(())
	}

	#[test]
	fn exec_without_scratch_emits_nothing() -> Result<()> {
		// -- Setup & Fixtures
		let pool = MockScratch::<ExecEvent>::new();
		pool.available.set(false);
		let channel = MockChannel::new();

		// -- Exec
		let outcome = on_exec(&MockTask::new(5, 5), &fx_filename("/bin/ls"), &pool, &channel);

		// -- Check
		assert_eq!(outcome, ProbeOutcome::NoScratch);
		assert_eq!(channel.len(), 0);

		Ok(())
	}

	#[test]
	fn full_channel_reports_drop() -> Result<()> {
		// -- Setup & Fixtures
		let pool = MockScratch::<ExecEvent>::new();
		let channel = MockChannel::with_capacity(1);
		let fx_task = MockTask::new(9, 9);

		// -- Exec
		let first = on_exec(&fx_task, &fx_filename("/bin/a"), &pool, &channel);
		let second = on_exec(&fx_task, &fx_filename("/bin/b"), &pool, &channel);

		// -- Check
		assert_eq!(first, ProbeOutcome::Emitted);
		assert_eq!(second, ProbeOutcome::Dropped(-28));
		assert_eq!(channel.len(), 1);
		assert_eq!(channel.records.borrow()[0].filename_str(), "/bin/a");

		Ok(())
	}

	#[test]
	fn exit_code_is_status_shifted() -> Result<()> {
		// -- Setup & Fixtures
		let fx_cases = [(Some(256), 1), (Some(0), 0), (Some(42 << 8), 42), (Some(9), 0), (None, 0)];
		let channel = MockChannel::new();

		// -- Exec
		for (status, _) in fx_cases {
			let mut task = MockTask::new(300, 301);
			task.parent_tgid = Some(299);
			task.exit_status = status;
			assert_eq!(on_exit(&task, &channel), ProbeOutcome::Emitted);
		}

		// -- Check
		let records = channel.records.borrow();
		for (evt, (_, expected)) in records.iter().zip(fx_cases) {
			assert_eq!(evt.exit_code, expected);
			assert_eq!(evt.pid, 300);
			assert_eq!(evt.ppid, 299);
			assert_eq!(evt.uid, 1000);
			assert_eq!(evt.event_type, EventType::Exit as u8);
			assert_eq!(evt.comm[TASK_COMM_LEN - 1], 0);
		}

		Ok(())
	}

	#[test]
	fn dns_emits_only_for_port_53() -> Result<()> {
		// -- Setup & Fixtures
		let fx_payload = query(&[b"www", b"google", b"com"]);
		let fx_ports = [53u16, 5353, 443, 0, 13568];
		let pool = MockScratch::<DnsEvent>::new();
		let channel = MockChannel::new();
		let fx_task = MockTask::new(600, 601);

		// -- Exec
		let outcomes: Vec<_> = fx_ports
			.iter()
			.map(|&port| {
				let datagram = MockDatagram::to_port(port, fx_payload.clone());
				on_dns_query(&fx_task, &datagram, &pool, &channel)
			})
			.collect();
		let mut fx_unreadable = MockDatagram::to_port(53, fx_payload.clone());
		fx_unreadable.port_be = None;
		let unreadable = on_dns_query(&fx_task, &fx_unreadable, &pool, &channel);

		// -- Check
		assert_eq!(
			outcomes,
			vec![
				ProbeOutcome::Emitted,
				ProbeOutcome::Filtered,
				ProbeOutcome::Filtered,
				ProbeOutcome::Filtered,
				ProbeOutcome::Filtered,
			]
		);
		assert_eq!(unreadable, ProbeOutcome::Filtered);
		assert_eq!(channel.len(), 1);

		let records = channel.records.borrow();
		let evt = &records[0];
		assert_eq!(evt.pid, 600);
		assert_eq!(evt.ppid, 1);
		assert_eq!(evt.event_type, EventType::Dns as u8);
		assert_eq!(evt.dest_port, 53);
		assert_eq!(evt.dest_addr().to_string(), "10.0.0.53");
		assert_eq!(evt.dns_name_str(), "www.google.com");

		Ok(())
	}

	#[test]
	fn dns_non_matching_port_skips_scratch() -> Result<()> {
		// -- Setup & Fixtures
		let pool = MockScratch::<DnsEvent>::new();
		pool.available.set(false);
		let channel = MockChannel::new();
		let fx_task = MockTask::new(1, 1);

		// -- Exec
		let other = on_dns_query(&fx_task, &MockDatagram::to_port(123, Vec::new()), &pool, &channel);
		let dns = on_dns_query(&fx_task, &MockDatagram::to_port(53, Vec::new()), &pool, &channel);

		// -- Check
		assert_eq!(other, ProbeOutcome::Filtered);
		assert_eq!(dns, ProbeOutcome::NoScratch);
		assert_eq!(channel.len(), 0);

		Ok(())
	}

	#[test]
	fn dns_undecodable_payload_still_emits() -> Result<()> {
		// -- Setup & Fixtures
		let pool = MockScratch::<DnsEvent>::new();
		let channel = MockChannel::new();
		let fx_task = MockTask::new(2, 2);
		let mut fx_no_segment = MockDatagram::to_port(53, Vec::new());
		fx_no_segment.payload = None;
		let fx_short = MockDatagram::to_port(53, vec![0u8; 8]);

		// -- Exec
		let a = on_dns_query(&fx_task, &fx_no_segment, &pool, &channel);
		let b = on_dns_query(&fx_task, &fx_short, &pool, &channel);

		// -- Check
		assert_eq!((a, b), (ProbeOutcome::Emitted, ProbeOutcome::Emitted));
		for evt in channel.records.borrow().iter() {
			assert_eq!(evt.dns_name_str(), "");
			assert!(evt.dns_name.iter().all(|&c| c == 0));
		}

		Ok(())
	}

	#[test]
	fn reused_slot_never_leaks_previous_bytes() -> Result<()> {
		// -- Setup & Fixtures
		let exec_pool = MockScratch::<ExecEvent>::new();
		exec_pool.slot.borrow_mut().filename.fill(0xFF);
		exec_pool.slot.borrow_mut().comm.fill(0xFF);
		let dns_pool = MockScratch::<DnsEvent>::new();
		dns_pool.slot.borrow_mut().dns_name.fill(0xFF);
		let exec_channel = MockChannel::new();
		let dns_channel = MockChannel::new();
		let fx_task = MockTask::new(31, 31);
		let fx_long_path = format!("/opt/{}", "x".repeat(100));
		let fx_long_name = query(&[b"a-rather-long-label", b"another-label", b"example", b"com"]);
		let fx_short_name = query(&[b"a", b"io"]);

		// -- Exec
		on_exec(&fx_task, &fx_filename(&fx_long_path), &exec_pool, &exec_channel);
		on_exec(&fx_task, &fx_filename("/bin/id"), &exec_pool, &exec_channel);
		on_exec(&fx_task, &MockUserStr(None), &exec_pool, &exec_channel);
		on_dns_query(&fx_task, &MockDatagram::to_port(53, fx_long_name), &dns_pool, &dns_channel);
		on_dns_query(&fx_task, &MockDatagram::to_port(53, fx_short_name), &dns_pool, &dns_channel);

		// -- Check
		let execs = exec_channel.records.borrow();
		assert_eq!(execs[0].filename_str(), fx_long_path);
		assert_eq!(execs[1].filename_str(), "/bin/id");
		assert!(execs[1].filename[7..].iter().all(|&b| b == 0));
		assert!(execs[2].filename.iter().all(|&b| b == 0));
		assert!(execs[0].comm[4..].iter().all(|&b| b == 0));

		let dns = dns_channel.records.borrow();
		assert_eq!(dns[0].dns_name_str(), "a-rather-long-label.another-label.example.com");
		assert_eq!(dns[1].dns_name_str(), "a.io");
		assert!(dns[1].dns_name[4..].iter().all(|&b| b == 0));

		Ok(())
	}
}

// endregion: --- Tests
