use crate::{
	error::{MatchError, PatternError},
	route::{Method, Params, RouteId},
	template::{Segment, Template},
};
use regex::{Captures, Regex};

/// Placeholders without a regex match one path segment.
const DEFAULT_PARAM: &str = "[^/]+";

/// Prefix of the capture groups wrapping placeholders, kept clear of names users give their own
/// groups.
const GROUP_PREFIX: &str = "__waypost";

/// A successfully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
	pub route: RouteId,
	pub params: Params,
}

/// Resolves `(method, path)` pairs to registered routes.
///
/// The router only hands out [`RouteId`]s; the matcher never owns the routes themselves.
pub trait PatternMatcher: Send + Sync {
	fn register(&mut self, method: &Method, template: &Template, route: RouteId) -> Result<(), PatternError>;

	fn resolve(&self, method: &Method, path: &str) -> Result<Match, MatchError>;
}

struct Entry {
	method: Method,
	regex: Regex,
	/// Placeholder names paired with their capture group index.
	slots: Vec<(String, usize)>,
	route: RouteId,
}

impl Entry {
	fn extract(&self, captures: &Captures<'_>) -> Match {
		let params = self
			.slots
			.iter()
			.filter_map(|(name, slot)| captures.get(*slot).map(|m| (name.as_str(), m.as_str())))
			.collect();

		Match {
			route: self.route,
			params,
		}
	}
}

/// Matches routes by compiling every template into an anchored regex.
///
/// Registrations are tried in order and the first one matching both path and method wins, so
/// registering the same method and pattern twice leaves the earlier route in charge. `HEAD`
/// requests fall back to `GET` routes.
#[derive(Default)]
pub struct RegexMatcher {
	entries: Vec<Entry>,
}

impl RegexMatcher {
	pub fn new() -> Self {
		Self::default()
	}
}

impl PatternMatcher for RegexMatcher {
	fn register(&mut self, method: &Method, template: &Template, route: RouteId) -> Result<(), PatternError> {
		let mut expr = String::from("^");
		let mut groups = Vec::new();

		for segment in template.segments() {
			match segment {
				Segment::Literal(text) => expr.push_str(&regex::escape(text)),
				Segment::Param { name, pattern } => {
					let group = format!("{}{}", GROUP_PREFIX, groups.len());
					let pattern = pattern.as_deref().unwrap_or(DEFAULT_PARAM);
					expr.push_str(&format!("(?P<{}>(?:{}))", group, pattern));
					groups.push((name.clone(), group));
				}
			}
		}
		expr.push('$');

		let regex = Regex::new(&expr).map_err(|source| PatternError::Regex {
			pattern: template.as_str().to_owned(),
			source,
		})?;

		let names: Vec<_> = regex.capture_names().collect();
		let slots = groups
			.into_iter()
			.filter_map(|(name, group)| {
				names
					.iter()
					.position(|n| *n == Some(group.as_str()))
					.map(|slot| (name, slot))
			})
			.collect();

		self.entries.push(Entry {
			method: method.clone(),
			regex,
			slots,
			route,
		});
		Ok(())
	}

	fn resolve(&self, method: &Method, path: &str) -> Result<Match, MatchError> {
		let mut allowed: Vec<Method> = Vec::new();
		let mut head_fallback = None;

		for entry in &self.entries {
			let captures = match entry.regex.captures(path) {
				Some(captures) => captures,
				None => continue,
			};

			if entry.method == *method {
				return Ok(entry.extract(&captures));
			}

			if *method == Method::HEAD && entry.method == Method::GET && head_fallback.is_none() {
				head_fallback = Some(entry.extract(&captures));
			}

			if !allowed.contains(&entry.method) {
				allowed.push(entry.method.clone());
			}
			// GET routes also answer HEAD
			if entry.method == Method::GET && !allowed.contains(&Method::HEAD) {
				allowed.push(Method::HEAD);
			}
		}

		match head_fallback {
			Some(found) => Ok(found),
			None if allowed.is_empty() => Err(MatchError::NotFound),
			None => Err(MatchError::MethodNotAllowed(allowed)),
		}
	}
}
