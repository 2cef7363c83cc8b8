#![cfg_attr(not(test), no_std)]

// region:    --- Modules
pub mod channel;
pub mod dns;
pub mod event;
pub mod probe;
pub mod scratch;
pub mod task;
// endregion: --- Modules

pub use channel::EventChannel;
pub use dns::{decode_name, PayloadSegment};
pub use event::{DnsEvent, EbpfEvent, EventType, ExecEvent, ExitEvent, ParseError};
pub use probe::{on_dns_query, on_exec, on_exit, ProbeOutcome};
pub use scratch::ScratchPool;
pub use task::{OutboundDatagram, TaskInfo, UserStr};

/// Fixed width of the kernel task name.
pub const TASK_COMM_LEN: usize = 16;

/// Width of the exec filename field, terminator included.
pub const FILENAME_LEN: usize = 128;

/// Width of the decoded DNS name field, terminator included.
pub const DNS_NAME_LEN: usize = 128;

/// Destination port that marks an outbound datagram as a DNS query.
pub const DNS_PORT: u16 = 53;
