use std::collections::{HashMap, HashSet};

/// Ancestors walked before a lineage query gives up.
pub const MAX_LINEAGE_DEPTH: usize = 20;

const LINEAGE_SEPARATOR: &str = " → ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessNode {
	pub pid: u32,
	pub ppid: u32,
	pub comm: String,
	pub filename: String,
	pub uid: u32,
	pub username: String,
	pub alive: bool,
	pub children: Vec<u32>,
}

/// pid -> node map with parent/child edges.
///
/// Dead processes are dropped once they have no living children, and the whole tree is
/// pruned of dead leaves whenever it grows past `max_size`.
pub struct ProcessTree {
	nodes: HashMap<u32, ProcessNode>,
	max_size: usize,
}

impl ProcessTree {
	pub fn new(max_size: usize) -> Self {
		Self {
			nodes: HashMap::new(),
			max_size,
		}
	}

	/// Records an exec. A pid that execs again keeps its children.
	pub fn add_process(
		&mut self,
		pid: u32,
		ppid: u32,
		comm: impl Into<String>,
		filename: impl Into<String>,
		uid: u32,
		username: impl Into<String>,
	) {
		let children = self.nodes.remove(&pid).map(|old| old.children).unwrap_or_default();
		self.nodes.insert(
			pid,
			ProcessNode {
				pid,
				ppid,
				comm: comm.into(),
				filename: filename.into(),
				uid,
				username: username.into(),
				alive: true,
				children,
			},
		);

		if let Some(parent) = self.nodes.get_mut(&ppid) {
			if ppid != pid && !parent.children.contains(&pid) {
				parent.children.push(pid);
			}
		}

		if self.nodes.len() > self.max_size {
			self.prune_dead_leaves();
		}
	}

	/// Marks `pid` as exited and drops it right away if none of its children are alive.
	pub fn remove_process(&mut self, pid: u32) {
		let Some(node) = self.nodes.get_mut(&pid) else {
			return;
		};
		node.alive = false;

		if !self.has_living_children(pid) {
			self.remove_leaf(pid);
		}
	}

	/// Known ancestry of `pid`, oldest ancestor first and `pid` last.
	pub fn lineage(&self, pid: u32) -> Vec<&ProcessNode> {
		let mut chain = Vec::new();
		let mut visited = HashSet::new();
		let mut current = pid;

		for _ in 0..MAX_LINEAGE_DEPTH {
			let Some(node) = self.nodes.get(&current) else {
				break;
			};
			if !visited.insert(current) {
				break;
			}
			chain.push(node);
			current = node.ppid;
		}

		chain.reverse();
		chain
	}

	/// e.g. `systemd → bash → curl`, or `unknown` when `pid` is not tracked.
	pub fn lineage_string(&self, pid: u32) -> String {
		let chain = self.lineage(pid);
		if chain.is_empty() {
			return "unknown".to_string();
		}
		chain.iter().map(|node| node.comm.as_str()).collect::<Vec<_>>().join(LINEAGE_SEPARATOR)
	}

	pub fn children(&self, pid: u32) -> &[u32] {
		self.nodes.get(&pid).map(|node| node.children.as_slice()).unwrap_or_default()
	}

	pub fn get(&self, pid: u32) -> Option<&ProcessNode> {
		self.nodes.get(&pid)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Indented dump of the subtree under `root`, `●` for live and `○` for exited processes.
	pub fn render(&self, root: u32) -> String {
		let mut lines = Vec::new();
		let mut visited = HashSet::new();
		let mut stack = vec![(root, 0usize)];

		while let Some((pid, depth)) = stack.pop() {
			if !visited.insert(pid) {
				continue;
			}
			let Some(node) = self.nodes.get(&pid) else {
				continue;
			};
			let status = if node.alive { "●" } else { "○" };
			lines.push(format!("{}{status} [{}] {}", "  ".repeat(depth), node.pid, node.comm));
			stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
		}

		if lines.is_empty() {
			return "(empty tree)".to_string();
		}
		lines.join("\n")
	}
}

// region:    --- Support

impl ProcessTree {
	fn has_living_children(&self, pid: u32) -> bool {
		self.children(pid)
			.iter()
			.any(|child| self.nodes.get(child).is_some_and(|node| node.alive))
	}

	fn remove_leaf(&mut self, pid: u32) {
		let Some(node) = self.nodes.remove(&pid) else {
			return;
		};
		if let Some(parent) = self.nodes.get_mut(&node.ppid) {
			parent.children.retain(|&child| child != pid);
		}
	}

	fn prune_dead_leaves(&mut self) {
		let dead: Vec<u32> = self
			.nodes
			.values()
			.filter(|node| !node.alive && !self.has_living_children(node.pid))
			.map(|node| node.pid)
			.collect();

		for pid in dead {
			self.remove_leaf(pid);
		}
	}
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests
