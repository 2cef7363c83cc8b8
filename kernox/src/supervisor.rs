use std::{future::Future, time::Duration};

use tokio::{
	signal::unix::{signal, SignalKind},
	task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::Result;

pub struct Supervisor {
	pub shutdown: CancellationToken,
	pub tasks: JoinSet<Result<()>>,
}

impl Supervisor {
	pub fn new() -> Self {
		Self {
			shutdown: CancellationToken::new(),
			tasks: JoinSet::new(),
		}
	}

	pub fn token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = Result<()>> + Send + 'static,
	{
		self.tasks.spawn(fut);
	}

	/// Resolves on Ctrl-C, SIGTERM, cancellation, or once `run_time` has elapsed.
	pub async fn wait(&self, run_time: Option<Duration>) -> Result<()> {
		let mut sigterm = signal(SignalKind::terminate())?;
		let timer = async {
			match run_time {
				Some(run_time) => tokio::time::sleep(run_time).await,
				None => std::future::pending().await,
			}
		};

		tokio::select! {
			_ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
			_ = sigterm.recv() => info!("Received SIGTERM"),
			_ = timer => info!("Run time elapsed"),
			_ = self.shutdown.cancelled() => {}
		}

		Ok(())
	}

	pub async fn shutdown(mut self) -> Result<()> {
		info!("Supervisor shutdown starting");
		self.shutdown.cancel();

		while let Some(res) = self.tasks.join_next().await {
			res??;
		}
		info!("Supervisor shutdown complete");

		Ok(())
	}
}

// region:    --- Tests


// endregion: --- Tests
