/// Lossy conduit from probe context to the userspace consumer.
///
/// `emit` never blocks. An `Err` carries the host's error code for a record that was
/// dropped (buffer full, consumer gone); the record is not retried.
pub trait EventChannel<T> {
	fn emit(&self, record: &T) -> Result<(), i64>;
}

#[cfg(test)]
pub(crate) mod mock {
	use std::cell::RefCell;

	use super::EventChannel;

	const ENOSPC: i64 = -28;

	/// Bounded channel that keeps emitted records and drops the newest once full.
	pub struct MockChannel<T> {
		pub records: RefCell<Vec<T>>,
		pub capacity: usize,
	}

	impl<T> MockChannel<T> {
		pub fn new() -> Self {
			Self::with_capacity(usize::MAX)
		}

		pub fn with_capacity(capacity: usize) -> Self {
			Self {
				records: RefCell::new(Vec::new()),
				capacity,
			}
		}

		pub fn len(&self) -> usize {
			self.records.borrow().len()
		}
	}

	impl<T: Copy> EventChannel<T> for MockChannel<T> {
		fn emit(&self, record: &T) -> Result<(), i64> {
			let mut records = self.records.borrow_mut();
			if records.len() >= self.capacity {
				return Err(ENOSPC);
			}
			records.push(*record);
			Ok(())
		}
	}
}
