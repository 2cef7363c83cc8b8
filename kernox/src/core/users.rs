use std::{collections::HashMap, ffi::CStr};

// getpwuid_r scratch grows up to this size on ERANGE
const MAX_PASSWD_BUF: usize = 64 * 1024;

/// uid -> login name from the system user database, resolved once per uid.
///
/// Unknown uids fall back to the numeric uid so every record still names its user.
#[derive(Default)]
pub struct UserCache {
	names: HashMap<u32, String>,
}

impl UserCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(&mut self, uid: u32) -> &str {
		self.names
			.entry(uid)
			.or_insert_with(|| lookup_username(uid).unwrap_or_else(|| uid.to_string()))
	}

	pub fn insert(&mut self, uid: u32, name: impl Into<String>) {
		self.names.insert(uid, name.into());
	}
}

fn lookup_username(uid: u32) -> Option<String> {
	let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
	let mut result: *mut libc::passwd = std::ptr::null_mut();
	let mut buf: Vec<libc::c_char> = vec![0; 1024];

	loop {
		let ret = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
		if ret == libc::ERANGE && buf.len() < MAX_PASSWD_BUF {
			buf.resize(buf.len() * 2, 0);
			continue;
		}
		if ret != 0 || result.is_null() || pwd.pw_name.is_null() {
			return None;
		}

		let name = unsafe { CStr::from_ptr(pwd.pw_name) };
		return Some(name.to_string_lossy().into_owned());
	}
}

// region:    --- Tests


// endregion: --- Tests
