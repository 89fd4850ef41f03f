use crate::{
	middleware::{Next, SharedMiddleware},
	template::Template,
};
use anyhow::Result;
pub use hyper::{Body, Method, StatusCode};
use std::{
	any::{self, Any},
	fmt::{self, Debug, Formatter},
	iter::FromIterator,
};

pub type Request = hyper::Request<Body>;
pub type Response = hyper::Response<Body>;

/// The type-erased route handler stored by the router.
pub(crate) type Handler = Box<dyn Fn(&Request, Response, &Params) -> Result<Reply> + Send + Sync>;

/// Named path parameters extracted from a request path, in pattern order.
///
/// Also used as the substitution data when building URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.0
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// Sets `name`, replacing any earlier value.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.0.iter_mut().find(|(key, _)| *key == name) {
			Some(entry) => entry.1 = value,
			None => self.0.push((name, value)),
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Params::new();
		for (name, value) in iter {
			params.insert(name, value);
		}
		params
	}
}

impl IntoIterator for Params {
	type Item = (String, String);
	type IntoIter = std::vec::IntoIter<(String, String)>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a Params {
	type Item = (&'a str, &'a str);
	type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

	fn into_iter(self) -> Self::IntoIter {
		Box::new(self.iter())
	}
}

/// Whatever a handler or middleware produced.
///
/// The router only accepts replies holding a [`Response`]; anything else is reported as
/// [`DispatchError::InvalidReturn`](crate::DispatchError::InvalidReturn).
pub struct Reply {
	value: Box<dyn Any + Send>,
	type_name: &'static str,
}

impl Reply {
	pub fn new<T: Any + Send>(value: T) -> Self {
		Self {
			value: Box::new(value),
			type_name: any::type_name::<T>(),
		}
	}

	pub fn is<T: Any>(&self) -> bool {
		self.value.is::<T>()
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Takes the value out, or hands the reply back if it holds another type.
	pub fn downcast<T: Any>(self) -> std::result::Result<T, Self> {
		let type_name = self.type_name;
		self.value
			.downcast::<T>()
			.map(|value| *value)
			.map_err(|value| Self { value, type_name })
	}
}

impl From<Response> for Reply {
	fn from(res: Response) -> Self {
		Reply::new(res)
	}
}

impl Debug for Reply {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reply").field("type", &self.type_name).finish()
	}
}

/// Position of a route in its router. Routes are never removed, so ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
	pub fn index(self) -> usize {
		self.0
	}
}

/// A single endpoint: method, pattern, optional name, middleware and handler.
pub struct Route {
	id: RouteId,
	method: Method,
	template: Template,
	name: Option<String>,
	middleware: Vec<SharedMiddleware>,
	handler: Handler,
}

impl Route {
	pub(crate) fn new<H, R>(id: RouteId, method: Method, template: Template, handler: H) -> Self
	where
		H: Fn(&Request, Response, &Params) -> Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		let handler: Handler = Box::new(move |req: &Request, res: Response, params: &Params| {
			handler(req, res, params).map(Reply::new)
		});

		Self {
			id,
			method,
			template,
			name: None,
			middleware: Vec::new(),
			handler,
		}
	}

	pub fn id(&self) -> RouteId {
		self.id
	}

	pub fn method(&self) -> &Method {
		&self.method
	}

	/// The full pattern, including any group prefixes.
	pub fn pattern(&self) -> &str {
		self.template.as_str()
	}

	pub fn template(&self) -> &Template {
		&self.template
	}

	/// Empty names count as unnamed.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref().filter(|name| !name.is_empty())
	}

	pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
		self.name = Some(name.into());
		self
	}

	/// Appends `middleware` after everything already attached.
	pub fn set_middleware(&mut self, middleware: SharedMiddleware) -> &mut Self {
		self.middleware.push(middleware);
		self
	}

	pub fn middleware(&self) -> &[SharedMiddleware] {
		&self.middleware
	}

	/// Runs the middleware chain and then the handler, passing its reply through untouched.
	pub fn call(&self, req: &Request, res: Response, params: &Params) -> Result<Reply> {
		Next::new(&self.middleware, &self.handler).run(req, res, params)
	}

	/// The route name, or `METHOD pattern` for unnamed routes.
	pub fn label(&self) -> String {
		match self.name() {
			Some(name) => name.to_owned(),
			None => format!("{} {}", self.method, self.template),
		}
	}
}

impl Debug for Route {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Route")
			.field("id", &self.id)
			.field("method", &self.method)
			.field("pattern", &self.template.as_str())
			.field("name", &self.name)
			.field("middleware", &self.middleware.len())
			.finish()
	}
}

#[cfg(test)]
mod test {
	use super::{Body, Method, Params, Reply, Request, Response, Route, RouteId};
	use crate::template::Template;

	fn echo_route() -> Route {
		Route::new(
			RouteId(0),
			Method::GET,
			Template::parse("/echo/{word}").unwrap(),
			|_req: &Request, res: Response, params: &Params| {
				let word = params.get("word").unwrap_or_default().to_owned();
				Ok(res.map(|_| Body::from(word)))
			},
		)
	}

	#[test]
	fn call_passes_handler_reply_through() {
		let route = echo_route();
		let req = Request::default();
		let params: Params = vec![("word", "hi")].into_iter().collect();

		let reply = route.call(&req, Response::default(), &params).unwrap();
		assert!(reply.is::<Response>());
		assert_eq!(reply.type_name(), std::any::type_name::<Response>());
	}

	#[test]
	fn name_is_last_write() {
		let mut route = echo_route();
		assert_eq!(route.name(), None);
		assert_eq!(route.label(), "GET /echo/{word}");

		route.set_name("first").set_name("echo");
		assert_eq!(route.name(), Some("echo"));
		assert_eq!(route.label(), "echo");

		route.set_name("");
		assert_eq!(route.name(), None);
	}

	#[test]
	fn reply_downcast_returns_original_on_mismatch() {
		let reply = Reply::new(42_u32);
		let reply = reply.downcast::<String>().unwrap_err();
		assert_eq!(reply.downcast::<u32>().unwrap(), 42);
	}

	#[test]
	fn params_insert_replaces() {
		let mut params = Params::new();
		params.insert("id", "1");
		params.insert("id", "2");
		assert_eq!(params.len(), 1);
		assert_eq!(params.get("id"), Some("2"));
		assert_eq!(params.get("missing"), None);
	}
}
