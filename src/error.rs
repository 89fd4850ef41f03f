use hyper::Method;
use thiserror::Error;

/// Raised while registering a route whose pattern cannot be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
	#[error("unclosed placeholder at offset {offset} in pattern `{pattern}`")]
	Unclosed { pattern: String, offset: usize },

	#[error("unexpected `}}` at offset {offset} in pattern `{pattern}`")]
	UnexpectedBrace { pattern: String, offset: usize },

	#[error("invalid placeholder name `{name}` in pattern `{pattern}`")]
	InvalidName { pattern: String, name: String },

	#[error("placeholder `{name}` appears more than once in pattern `{pattern}`")]
	DuplicateName { pattern: String, name: String },

	#[error("pattern `{pattern}` does not compile: {source}")]
	Regex {
		pattern: String,
		#[source]
		source: regex::Error,
	},
}

/// Raised while building a URL for a named route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
	#[error("no route is named `{0}`")]
	RouteNotFound(String),

	#[error("missing value for URL segment `{0}`")]
	MissingParam(String),
}

/// Reported by a [`PatternMatcher`](crate::PatternMatcher) that could not resolve a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
	#[error("no route matches the request path")]
	NotFound,

	#[error("method not allowed, expected one of: {}", join_methods(.0))]
	MethodNotAllowed(Vec<Method>),
}

/// Everything that can go wrong between receiving a request and producing its response.
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error("no route matches the request path")]
	NotFound,

	#[error("method not allowed, expected one of: {}", join_methods(.0))]
	MethodNotAllowed(Vec<Method>),

	#[error("handler for route `{route}` failed: {source}")]
	Handler {
		route: String,
		#[source]
		source: anyhow::Error,
	},

	#[error("handler for route `{route}` must return a hyper::Response<Body>, got `{type_name}`")]
	InvalidReturn {
		route: String,
		type_name: &'static str,
	},

	#[error("handler for route `{route}` panicked: {message}")]
	Panicked { route: String, message: String },
}

impl From<MatchError> for DispatchError {
	fn from(e: MatchError) -> Self {
		match e {
			MatchError::NotFound => DispatchError::NotFound,
			MatchError::MethodNotAllowed(allowed) => DispatchError::MethodNotAllowed(allowed),
		}
	}
}

pub(crate) fn join_methods(methods: &[Method]) -> String {
	methods
		.iter()
		.map(Method::as_str)
		.collect::<Vec<_>>()
		.join(", ")
}
