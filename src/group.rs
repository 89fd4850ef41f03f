use crate::middleware::SharedMiddleware;

struct Group {
	prefix: String,
	middleware: Vec<SharedMiddleware>,
}

/// Route groups that are currently open, outermost first.
#[derive(Default)]
pub(crate) struct GroupStack {
	frames: Vec<Group>,
}

impl GroupStack {
	/// Returns the new depth.
	pub fn push(&mut self, prefix: String, middleware: Vec<SharedMiddleware>) -> usize {
		self.frames.push(Group { prefix, middleware });
		self.frames.len()
	}

	/// Returns false when there was nothing to pop.
	pub fn pop(&mut self) -> bool {
		self.frames.pop().is_some()
	}

	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	pub fn prefix(&self) -> String {
		self.frames.iter().map(|group| group.prefix.as_str()).collect()
	}

	pub fn middleware(&self) -> Vec<SharedMiddleware> {
		self.frames
			.iter()
			.flat_map(|group| group.middleware.iter().cloned())
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::GroupStack;
	use crate::middleware::{from_fn, SharedMiddleware};
	use std::sync::Arc;

	fn passthrough() -> SharedMiddleware {
		from_fn(|req, res, params, next| next.run(req, res, params))
	}

	#[test]
	fn composes_prefixes_in_push_order() {
		let mut groups = GroupStack::default();
		assert_eq!(groups.prefix(), "");

		assert_eq!(groups.push("/api".into(), vec![]), 1);
		assert_eq!(groups.push("/v1".into(), vec![]), 2);
		assert_eq!(groups.prefix(), "/api/v1");

		assert!(groups.pop());
		assert_eq!(groups.prefix(), "/api");
		assert_eq!(groups.push("/v2".into(), vec![]), 2);
		assert_eq!(groups.prefix(), "/api/v2");
	}

	#[test]
	fn pop_on_empty_is_harmless() {
		let mut groups = GroupStack::default();
		assert!(!groups.pop());
		assert_eq!(groups.depth(), 0);

		groups.push("/a".into(), vec![]);
		assert!(groups.pop());
		assert!(!groups.pop());
		assert_eq!(groups.prefix(), "");
	}

	#[test]
	fn concatenates_middleware_without_dedup() {
		let shared = passthrough();
		let inner = passthrough();
		let mut groups = GroupStack::default();
		groups.push("/a".into(), vec![Arc::clone(&shared)]);
		groups.push("/b".into(), vec![Arc::clone(&inner), Arc::clone(&shared)]);

		let middleware = groups.middleware();
		assert_eq!(middleware.len(), 3);
		assert!(Arc::ptr_eq(&middleware[0], &shared));
		assert!(Arc::ptr_eq(&middleware[1], &inner));
		assert!(Arc::ptr_eq(&middleware[2], &shared));
	}
}
