use crate::{
	error::{join_methods, DispatchError},
	matcher::{PatternMatcher, RegexMatcher},
	route::{Body, Method, Request, Response, StatusCode},
	router::Router,
	strategy::{ResponseStrategy, Strategy},
};
use hyper::header::{HeaderValue, ALLOW};

/// Creates the response for requests that match no route.
pub type NotFoundHandler = fn(req: &Request) -> Response;

/// Creates the response for requests whose path only matches under other methods.
pub type MethodNotAllowedHandler = fn(req: &Request, allowed: &[Method]) -> Response;

/// Converts a failed or misbehaving handler into a response.
pub type InternalErrorHandler = fn(req: &Request, e: &DispatchError) -> Response;

fn status(code: StatusCode, body: Body) -> Response {
	let mut res = Response::new(body);
	*res.status_mut() = code;
	res
}

fn default_not_found_handler(_req: &Request) -> Response {
	status(StatusCode::NOT_FOUND, Body::empty())
}

fn default_method_not_allowed_handler(_req: &Request, allowed: &[Method]) -> Response {
	let mut res = status(StatusCode::METHOD_NOT_ALLOWED, Body::empty());
	if let Ok(value) = HeaderValue::from_str(&join_methods(allowed)) {
		res.headers_mut().insert(ALLOW, value);
	}
	res
}

fn default_error_handler(_req: &Request, e: &DispatchError) -> Response {
	status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string().into())
}

/// Response hooks used when dispatch fails.
#[derive(Clone, Copy)]
pub(crate) struct Fallbacks {
	pub not_found: NotFoundHandler,
	pub method_not_allowed: MethodNotAllowedHandler,
	pub internal_error: InternalErrorHandler,
}

impl Default for Fallbacks {
	fn default() -> Self {
		Self {
			not_found: default_not_found_handler,
			method_not_allowed: default_method_not_allowed_handler,
			internal_error: default_error_handler,
		}
	}
}

/// Configures a [`Router`] before any route is registered.
///
/// ```
/// use waypost::{Response, RouterBuilder, StatusCode};
///
/// let router = RouterBuilder::default()
/// 	.base_path("/app")
/// 	.not_found_handler(|_req| {
/// 		let mut res = Response::default();
/// 		*res.status_mut() = StatusCode::GONE;
/// 		res
/// 	})
/// 	.build();
/// # let _ = router;
/// ```
#[derive(Default)]
pub struct RouterBuilder {
	base_path: String,
	fallbacks: Fallbacks,
	matcher: Option<Box<dyn PatternMatcher>>,
	strategy: Option<Box<dyn Strategy>>,
}

impl RouterBuilder {
	/// Prefix for every URL built by [`Router::url_for`]. A trailing `/` is dropped.
	pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
		self.base_path = base_path.into().trim_end_matches('/').to_owned();
		self
	}

	pub fn not_found_handler(mut self, handler: NotFoundHandler) -> Self {
		self.fallbacks.not_found = handler;
		self
	}

	pub fn method_not_allowed_handler(mut self, handler: MethodNotAllowedHandler) -> Self {
		self.fallbacks.method_not_allowed = handler;
		self
	}

	pub fn internal_error_handler(mut self, handler: InternalErrorHandler) -> Self {
		self.fallbacks.internal_error = handler;
		self
	}

	/// Replaces the default [`RegexMatcher`].
	pub fn matcher(mut self, matcher: impl PatternMatcher + 'static) -> Self {
		self.matcher = Some(Box::new(matcher));
		self
	}

	/// Replaces the default [`ResponseStrategy`].
	pub fn strategy(mut self, strategy: impl Strategy + 'static) -> Self {
		self.strategy = Some(Box::new(strategy));
		self
	}

	pub fn build(self) -> Router {
		Router::from_parts(
			self.base_path,
			self.fallbacks,
			self.matcher.unwrap_or_else(|| Box::new(RegexMatcher::new())),
			self.strategy.unwrap_or_else(|| Box::new(ResponseStrategy)),
		)
	}
}

#[cfg(test)]
mod test {
	use super::{default_error_handler, default_method_not_allowed_handler, RouterBuilder};
	use crate::{
		error::DispatchError,
		route::{Method, Request, StatusCode},
	};
	use hyper::header::ALLOW;

	#[test]
	fn method_not_allowed_lists_methods() {
		let res = default_method_not_allowed_handler(&Request::default(), &[Method::GET, Method::PUT]);

		assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(res.headers()[ALLOW], "GET, PUT");
	}

	#[test]
	fn internal_error_is_500() {
		let err = DispatchError::InvalidReturn {
			route: "home".into(),
			type_name: "u8",
		};
		assert_eq!(
			default_error_handler(&Request::default(), &err).status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn trims_base_path() {
		let router = RouterBuilder::default().base_path("/app/").build();
		assert_eq!(router.base_path(), "/app");
	}
}
