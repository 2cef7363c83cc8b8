use core::net::Ipv4Addr;

use zerocopy::FromBytes;
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{DNS_NAME_LEN, FILENAME_LEN, TASK_COMM_LEN};

// 1 => EXEC (sys_enter_execve)
// 2 => EXIT (sched_process_exit)
// 3 => DNS  (udp_sendmsg, dport 53)

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
	Exec = 1,
	Exit = 2,
	Dns = 3,
}

impl EventType {
	pub fn name(self) -> &'static str {
		match self {
			EventType::Exec => "EXEC",
			EventType::Exit => "EXIT",
			EventType::Dns => "DNS",
		}
	}
}

impl TryFrom<u8> for EventType {
	type Error = ParseError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(EventType::Exec),
			2 => Ok(EventType::Exit),
			3 => Ok(EventType::Dns),
			other => Err(ParseError::UnknownEventType(other)),
		}
	}
}

#[repr(C)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct ExecEvent {
	pub pid: u32,                       // 0..4
	pub ppid: u32,                      // 4..8
	pub uid: u32,                       // 8..12
	pub gid: u32,                       // 12..16
	pub event_type: u8,                 // 16..17
	pub comm: [u8; TASK_COMM_LEN],      // 17..33
	pub filename: [u8; FILENAME_LEN],   // 33..161
	pub _pad0: [u8; 3],                 // 161..164
}

#[repr(C)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct ExitEvent {
	pub pid: u32,                  // 0..4
	pub ppid: u32,                 // 4..8
	pub uid: u32,                  // 8..12
	pub event_type: u8,            // 12..13
	pub comm: [u8; TASK_COMM_LEN], // 13..29
	pub _pad0: [u8; 3],            // 29..32
	pub exit_code: i32,            // 32..36
}

#[repr(C)]
#[derive(Clone, Copy, Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct DnsEvent {
	pub pid: u32,                      // 0..4
	pub ppid: u32,                     // 4..8
	pub uid: u32,                      // 8..12
	pub event_type: u8,                // 12..13
	pub comm: [u8; TASK_COMM_LEN],     // 13..29
	pub _pad0: [u8; 3],                // 29..32
	pub dest_ip: u32,                  // 32..36 | network byte order, as stored in the socket
	pub dest_port: u16,                // 36..38 | host byte order
	pub dns_name: [u8; DNS_NAME_LEN],  // 38..166
	pub _pad1: [u8; 2],                // 166..168
}

impl ExecEvent {
	pub fn comm_str(&self) -> &str {
		c_str(&self.comm)
	}

	pub fn filename_str(&self) -> &str {
		c_str(&self.filename)
	}
}

impl ExitEvent {
	pub fn comm_str(&self) -> &str {
		c_str(&self.comm)
	}
}

impl DnsEvent {
	pub fn comm_str(&self) -> &str {
		c_str(&self.comm)
	}

	pub fn dns_name_str(&self) -> &str {
		c_str(&self.dns_name)
	}

	pub fn dest_addr(&self) -> Ipv4Addr {
		Ipv4Addr::from(self.dest_ip.to_ne_bytes())
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
	InvalidEventSize { expected: usize, actual: usize },
	UnknownEventType(u8),
	TagMismatch { expected: EventType, actual: u8 },
}

/// A record drained from one of the event streams, dispatched on its tag.
#[derive(Clone, Copy, Debug)]
pub enum EbpfEvent {
	Exec(ExecEvent),
	Exit(ExitEvent),
	Dns(DnsEvent),
}

impl EbpfEvent {
	/// Parses a record from the stream that carries `kind` records.
	///
	/// The tag stored in the record must agree with the stream it came from.
	pub fn parse(kind: EventType, data: &[u8]) -> Result<Self, ParseError> {
		let evt = match kind {
			EventType::Exec => EbpfEvent::Exec(read_record::<ExecEvent>(data)?),
			EventType::Exit => EbpfEvent::Exit(read_record::<ExitEvent>(data)?),
			EventType::Dns => EbpfEvent::Dns(read_record::<DnsEvent>(data)?),
		};

		let tag = evt.tag();
		match EventType::try_from(tag)? {
			actual if actual == kind => Ok(evt),
			_ => Err(ParseError::TagMismatch { expected: kind, actual: tag }),
		}
	}

	pub fn tag(&self) -> u8 {
		match self {
			EbpfEvent::Exec(e) => e.event_type,
			EbpfEvent::Exit(e) => e.event_type,
			EbpfEvent::Dns(e) => e.event_type,
		}
	}

	pub fn pid(&self) -> u32 {
		match self {
			EbpfEvent::Exec(e) => e.pid,
			EbpfEvent::Exit(e) => e.pid,
			EbpfEvent::Dns(e) => e.pid,
		}
	}
}

fn read_record<T: FromBytes>(data: &[u8]) -> Result<T, ParseError> {
	T::read_from_prefix(data).map(|(evt, _)| evt).map_err(|_| ParseError::InvalidEventSize {
		expected: core::mem::size_of::<T>(),
		actual: data.len(),
	})
}

/// Returns the text before the first NUL, cut at the first invalid UTF-8 byte.
pub fn c_str(bytes: &[u8]) -> &str {
	let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
	let bytes = &bytes[..len];
	match core::str::from_utf8(bytes) {
		Ok(s) => s,
		Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
	}
}

/// Forces a NUL into the last byte so the field is always terminated within its width.
#[inline(always)]
pub(crate) fn terminate(buf: &mut [u8]) {
	if let Some(last) = buf.last_mut() {
		*last = 0;
	}
}

// region:    --- Tests


// endregion: --- Tests
