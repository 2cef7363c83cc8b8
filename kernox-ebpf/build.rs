use std::{env, fs, path::PathBuf, process::Command};

use derive_more::{Display, From};
use which::which;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	ToolNotFound(&'static str),
	ExecFail,
	#[from]
	Env(env::VarError),
	#[from]
	Io(std::io::Error),
}

/// Kernel types the probes dereference.
const BTF_TYPES: &[&str] = &["task_struct", "sock", "msghdr"];

/// Building this crate has an undeclared dependency on the `bpf-linker` binary, so cargo is
/// told to rebuild whenever the binary found on `$PATH` changes.
///
/// Kernel bindings are generated from the running kernel's BTF with `aya-tool` and written to
/// `$OUT_DIR/vmlinux.rs`.
fn main() -> Result<()> {
	let bpf_linker = which("bpf-linker").map_err(|_| Error::ToolNotFound("bpf-linker"))?;
	println!("cargo:rerun-if-changed={}", bpf_linker.display());

	let aya_tool = which("aya-tool").map_err(|_| Error::ToolNotFound("aya-tool"))?;
	let output = Command::new(aya_tool)
		.arg("generate")
		.args(BTF_TYPES)
		.output()
		.map_err(|_| Error::ExecFail)?;
	if !output.status.success() {
		return Err(format!("aya-tool generate failed: {}", String::from_utf8_lossy(&output.stderr)).into());
	}

	let out_dir = PathBuf::from(env::var("OUT_DIR")?);
	fs::write(out_dir.join("vmlinux.rs"), output.stdout)?;
	println!("cargo:rerun-if-changed=/sys/kernel/btf/vmlinux");

	Ok(())
}
