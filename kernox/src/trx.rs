use crate::Result;

/// Unbounded named channel between two workers.
pub fn new_channel<T>(name: &'static str) -> (Tx<T>, Rx<T>) {
	let (tx, rx) = flume::unbounded();

	(Tx(tx, name), Rx(rx, name))
}

pub struct Tx<T>(flume::Sender<T>, &'static str);

impl<T> Tx<T> {
	pub async fn send(&self, value: impl Into<T>) -> Result<()> {
		self.0.send_async(value.into()).await?;
		Ok(())
	}

	pub fn name(&self) -> &'static str {
		self.1
	}
}

impl<T> Clone for Tx<T> {
	fn clone(&self) -> Self {
		Self(self.0.clone(), self.1)
	}
}

pub struct Rx<T>(flume::Receiver<T>, &'static str);

impl<T> Rx<T> {
	pub async fn recv(&self) -> Result<T> {
		let res = self.0.recv_async().await?;
		Ok(res)
	}

	/// Takes whatever is already queued without waiting.
	pub fn drain(&self) -> flume::Drain<'_, T> {
		self.0.drain()
	}

	pub fn name(&self) -> &'static str {
		self.1
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use crate::Error;

	#[tokio::test]
	async fn channel_delivers_in_order_and_reports_close() -> Result<()> {
		// -- Setup & Fixtures
		let (tx, rx) = new_channel::<u32>("fx_numbers");
		let tx_clone = tx.clone();

		// -- Exec
		tx.send(1u32).await?;
		tx_clone.send(2u32).await?;
		drop(tx);
		drop(tx_clone);

		// -- Check
		assert_eq!(rx.name(), "fx_numbers");
		assert_eq!(rx.recv().await?, 1);
		assert_eq!(rx.recv().await?, 2);
		assert!(matches!(rx.recv().await, Err(Error::EventRecv(_))));

		Ok(())
	}
}

// endregion: --- Tests
