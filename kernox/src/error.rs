use derive_more::{Display, From};
use flume::{RecvError, SendError};
use kernox_common::ParseError;
use tokio::task::JoinError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	EventSend(String),
	EventRecv(RecvError),
	EbpfProgNotFound(&'static str),
	EbpfMapNotFound(&'static str),
	InvalidEventSize {
		expected: usize,
		actual: usize,
	},
	UnknownEventType(u8),
	EventTagMismatch {
		expected: &'static str,
		actual: u8,
	},
	#[display("--no-process and --no-dns together leave nothing to monitor")]
	NoHooksSelected,

	// -- Externals
	//
	#[from]
	JoinError(JoinError),
	#[from]
	AyaEbpf(aya::EbpfError),
	#[from]
	AyaMaps(aya::maps::MapError),
	#[from]
	AyaProgram(aya::programs::ProgramError),
	#[from]
	Io(std::io::Error),
}

impl<T> From<SendError<T>> for Error {
	fn from(value: SendError<T>) -> Self {
		Self::EventSend(value.to_string())
	}
}

impl From<RecvError> for Error {
	fn from(err: RecvError) -> Self {
		Self::EventRecv(err)
	}
}

impl From<ParseError> for Error {
	fn from(err: ParseError) -> Self {
		match err {
			ParseError::InvalidEventSize { expected, actual } => Self::InvalidEventSize { expected, actual },
			ParseError::UnknownEventType(tag) => Self::UnknownEventType(tag),
			ParseError::TagMismatch { expected, actual } => Self::EventTagMismatch {
				expected: expected.name(),
				actual,
			},
		}
	}
}

// region:    --- Custom

impl Error {
	pub fn custom(val: impl Into<String>) -> Self {
		Self::Custom(val.into())
	}
}

// endregion: --- Custom

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
