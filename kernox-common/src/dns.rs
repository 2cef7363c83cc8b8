/// Fixed DNS header preceding the question section.
pub const DNS_HEADER_LEN: usize = 12;

/// Smallest segment that can hold a header and a one-character question.
pub const MIN_SEGMENT_LEN: usize = 17;

/// Largest classic (non-EDNS) UDP DNS message.
pub const MAX_SEGMENT_LEN: usize = 512;

/// Label lengths above this are either malformed or compression pointers, which are
/// not followed.
pub const MAX_LABEL_LEN: usize = 63;

/// Upper bound on labels visited per name.
pub const MAX_LABELS: usize = 64;

const EFAULT: i64 = -14;

/// A contiguous region of the outbound message.
pub trait PayloadSegment {
	fn len(&self) -> usize;

	/// Validated copy of `dst.len()` bytes starting at `offset`. Never faults; an
	/// unreadable or out-of-range region is reported as `Err`.
	fn read(&self, offset: usize, dst: &mut [u8]) -> Result<(), i64>;
}

impl PayloadSegment for [u8] {
	fn len(&self) -> usize {
		<[u8]>::len(self)
	}

	fn read(&self, offset: usize, dst: &mut [u8]) -> Result<(), i64> {
		let src = offset
			.checked_add(dst.len())
			.and_then(|end| self.get(offset..end))
			.ok_or(EFAULT)?;
		dst.copy_from_slice(src);
		Ok(())
	}
}

/// Decodes the query name of `segment` into `out` as a dotted, NUL-terminated string.
///
/// Writes at most `out.len() - 1` characters and returns how many were written. `out`
/// is zeroed first and every byte past the returned length is zero on return, whatever
/// the outcome. A segment outside `MIN_SEGMENT_LEN..=MAX_SEGMENT_LEN` or an unreadable
/// segment yields an empty name; a malformed label ends the name early.
pub fn decode_name<S: PayloadSegment + ?Sized>(segment: &S, out: &mut [u8]) -> usize {
	out.fill(0);
	let Some(limit) = out.len().checked_sub(1) else {
		return 0;
	};
	if limit == 0 {
		return 0;
	}

	let seg_len = segment.len();
	if !(MIN_SEGMENT_LEN..=MAX_SEGMENT_LEN).contains(&seg_len) {
		return 0;
	}

	// The question section is pulled into `out` with a single validated read and
	// unpacked in place.
	let window = (seg_len - DNS_HEADER_LEN).min(out.len());
	let Some(raw) = out.get_mut(..window) else {
		return 0;
	};
	if segment.read(DNS_HEADER_LEN, raw).is_err() {
		raw.fill(0);
		return 0;
	}

	let written = unpack_labels(out, window, limit);
	if let Some(tail) = out.get_mut(written..) {
		tail.fill(0);
	}
	written
}

/// Rewrites the label sequence in `buf[..window]` into dotted form at the front of `buf`.
///
/// The write cursor always trails the read cursor, so unread input is never clobbered.
fn unpack_labels(buf: &mut [u8], window: usize, limit: usize) -> usize {
	let mut src = 0usize;
	let mut dst = 0usize;

	for _ in 0..MAX_LABELS {
		if src >= window {
			break;
		}
		let Some(&label_len) = buf.get(src) else {
			break;
		};
		let label_len = label_len as usize;
		if label_len == 0 || label_len > MAX_LABEL_LEN {
			break;
		}
		src += 1;

		if dst > 0 {
			// no separator unless at least one label byte can follow it
			if src >= window || dst + 1 >= limit {
				break;
			}
			if let Some(slot) = buf.get_mut(dst) {
				*slot = b'.';
			}
			dst += 1;
		}

		let mut copied = 0usize;
		for _ in 0..MAX_LABEL_LEN {
			if copied >= label_len || src >= window || dst >= limit {
				break;
			}
			let Some(&byte) = buf.get(src) else {
				break;
			};
			if let Some(slot) = buf.get_mut(dst) {
				*slot = byte;
			}
			src += 1;
			dst += 1;
			copied += 1;
		}

		if copied < label_len {
			break;
		}
	}

	dst
}

// region:    --- Tests


// endregion: --- Tests
