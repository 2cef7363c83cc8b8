use aya::maps::{MapData, RingBuf};
use kernox_common::{EbpfEvent, EventType};
use tokio::io::unix::AsyncFd;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{error::Result, trx::Tx, Error};

/// Drains one kernel ring buffer. Every record on it is expected to be of `kind`.
pub struct RingBufWorker {
	pub kind: EventType,
	pub ringbuf_fd: AsyncFd<RingBuf<MapData>>,
	pub tx: Tx<EbpfEvent>,
	pub shutdown: CancellationToken,
}

impl RingBufWorker {
	pub fn start(
		kind: EventType,
		ringbuf_fd: AsyncFd<RingBuf<MapData>>,
		tx: Tx<EbpfEvent>,
		shutdown: CancellationToken,
	) -> Result<Self> {
		Ok(RingBufWorker {
			kind,
			ringbuf_fd,
			tx,
			shutdown,
		})
	}

	pub async fn run(mut self) -> Result<()> {
		debug!("{} ring buffer worker started, forwarding to '{}'", self.kind.name(), self.tx.name());

		loop {
			let batch = {
				let mut guard = tokio::select! {
					_ = self.shutdown.cancelled() => break,
					res = self.ringbuf_fd.readable_mut() => match res {
						Ok(g) => g,
						Err(_) => break,
					},
				};

				let ring_buf = guard.get_inner_mut();
				let mut batch = Vec::new();
				while let Some(item) = ring_buf.next() {
					if let Some(evt) = decode_item(self.kind, &item) {
						batch.push(evt);
					}
				}
				guard.clear_ready();
				batch
			};

			if !forward(&self.tx, &self.shutdown, batch).await? {
				break;
			}
		}

		debug!("{} ring buffer worker stopped", self.kind.name());
		Ok(())
	}
}

/// Sends `batch` downstream. Returns `false` when the sink went away during shutdown,
/// which ends the worker quietly instead of failing it.
pub async fn forward(tx: &Tx<EbpfEvent>, shutdown: &CancellationToken, batch: Vec<EbpfEvent>) -> Result<bool> {
	for evt in batch {
		if let Err(err) = tx.send(evt).await {
			if shutdown.is_cancelled() {
				debug!("'{}' closed during shutdown, dropping the rest of the batch", tx.name());
				return Ok(false);
			}
			return Err(err);
		}
	}
	Ok(true)
}

/// Parses one ring buffer item. A malformed record is logged and skipped.
pub fn decode_item(kind: EventType, data: &[u8]) -> Option<EbpfEvent> {
	match EbpfEvent::parse(kind, data) {
		Ok(evt) => Some(evt),
		Err(err) => {
			warn!("skipping {} record: {:?}", kind.name(), Error::from(err));
			None
		}
	}
}

// region:    --- Tests


// endregion: --- Tests
