use crate::{
	builder::{Fallbacks, RouterBuilder},
	error::{DispatchError, PatternError, UrlError},
	group::GroupStack,
	matcher::PatternMatcher,
	middleware::SharedMiddleware,
	route::{Method, Params, Request, Response, Route, RouteId},
	strategy::Strategy,
	template::Template,
};
use std::{
	any::Any,
	collections::HashMap,
	fmt::{self, Debug, Display, Formatter},
	panic::{self, AssertUnwindSafe},
	sync::OnceLock,
};
use tracing::{debug, error, trace, warn};
use url::form_urlencoded;

/// Registers routes, dispatches requests to them and builds URLs for named routes.
///
/// Registration (`add_route`, groups) needs `&mut self` and is meant to finish before the router
/// is shared; dispatching and URL building only need `&self`.
pub struct Router {
	routes: Vec<Route>,
	groups: GroupStack,
	/// Built on the first named lookup and dropped by any mutable route access.
	named: OnceLock<HashMap<String, RouteId>>,
	matcher: Box<dyn PatternMatcher>,
	strategy: Box<dyn Strategy>,
	fallbacks: Fallbacks,
	base_path: String,
}

impl Default for Router {
	fn default() -> Self {
		RouterBuilder::default().build()
	}
}

impl Debug for Router {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.routes)
			.field("groups", &self.groups.depth())
			.field("base_path", &self.base_path)
			.finish()
	}
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn builder() -> RouterBuilder {
		RouterBuilder::default()
	}

	pub(crate) fn from_parts(
		base_path: String,
		fallbacks: Fallbacks,
		matcher: Box<dyn PatternMatcher>,
		strategy: Box<dyn Strategy>,
	) -> Self {
		Self {
			routes: Vec::new(),
			groups: GroupStack::default(),
			named: OnceLock::new(),
			matcher,
			strategy,
			fallbacks,
			base_path,
		}
	}

	/// Registers `handler` for `method` at the current group prefix followed by `pattern`.
	///
	/// Middleware of every open group is attached to the route, outermost group first. The
	/// returned route may be named or given more middleware; both are read at dispatch time.
	pub fn add_route<H, R>(&mut self, method: Method, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		let template = Template::parse(&format!("{}{}", self.groups.prefix(), pattern))?;
		let id = RouteId(self.routes.len());
		self.matcher.register(&method, &template, id)?;
		debug!(%method, pattern = %template, route = id.index(), "registered route");

		let mut route = Route::new(id, method, template, handler);
		for middleware in self.groups.middleware() {
			route.set_middleware(middleware);
		}

		self.named.take();
		self.routes.push(route);
		Ok(&mut self.routes[id.index()])
	}

	pub fn get<H, R>(&mut self, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		self.add_route(Method::GET, pattern, handler)
	}

	pub fn post<H, R>(&mut self, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		self.add_route(Method::POST, pattern, handler)
	}

	pub fn put<H, R>(&mut self, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		self.add_route(Method::PUT, pattern, handler)
	}

	pub fn patch<H, R>(&mut self, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		self.add_route(Method::PATCH, pattern, handler)
	}

	pub fn delete<H, R>(&mut self, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		self.add_route(Method::DELETE, pattern, handler)
	}

	pub fn options<H, R>(&mut self, pattern: &str, handler: H) -> Result<&mut Route, PatternError>
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: Any + Send,
	{
		self.add_route(Method::OPTIONS, pattern, handler)
	}

	/// Opens a route group and returns the new group depth.
	pub fn push_group(&mut self, prefix: impl Into<String>, middleware: Vec<SharedMiddleware>) -> usize {
		let prefix = prefix.into();
		debug!(prefix = %prefix, middleware = middleware.len(), "pushed route group");
		self.groups.push(prefix, middleware)
	}

	/// Closes the innermost route group. Returns false if no group was open.
	pub fn pop_group(&mut self) -> bool {
		let popped = self.groups.pop();
		if popped {
			debug!(depth = self.groups.depth(), "popped route group");
		}
		popped
	}

	/// Runs `f` inside a route group that is closed again once `f` returns.
	pub fn group<F, T>(&mut self, prefix: impl Into<String>, middleware: Vec<SharedMiddleware>, f: F) -> T
	where
		F: FnOnce(&mut Self) -> T,
	{
		self.push_group(prefix, middleware);
		let out = f(self);
		self.pop_group();
		out
	}

	/// The prefix a route registered right now would receive.
	pub fn group_prefix(&self) -> String {
		self.groups.prefix()
	}

	pub fn group_depth(&self) -> usize {
		self.groups.depth()
	}

	/// Routes in registration order.
	pub fn routes(&self) -> impl Iterator<Item = &Route> {
		self.routes.iter()
	}

	pub fn route(&self, id: RouteId) -> Option<&Route> {
		self.routes.get(id.index())
	}

	pub fn route_mut(&mut self, id: RouteId) -> Option<&mut Route> {
		self.named.take();
		self.routes.get_mut(id.index())
	}

	pub fn base_path(&self) -> &str {
		&self.base_path
	}

	fn named_routes(&self) -> &HashMap<String, RouteId> {
		self.named.get_or_init(|| {
			let mut index = HashMap::new();
			for route in &self.routes {
				if let Some(name) = route.name() {
					// later routes win
					index.insert(name.to_owned(), route.id());
				}
			}
			debug!(names = index.len(), "indexed named routes");
			index
		})
	}

	/// Looks a route up by name.
	pub fn named(&self, name: &str) -> Option<&Route> {
		self.named_routes()
			.get(name)
			.and_then(|id| self.routes.get(id.index()))
	}

	/// Builds the path of the route named `name`, substituting every placeholder from `params`.
	///
	/// Values are inserted verbatim, without percent-encoding, and are not checked against the
	/// placeholder's regex.
	pub fn url_for<I, K, V>(&self, name: &str, params: I) -> Result<String, UrlError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Display,
	{
		let route = self
			.named(name)
			.ok_or_else(|| UrlError::RouteNotFound(name.to_owned()))?;
		let params: Params = params
			.into_iter()
			.map(|(key, value)| (Into::<String>::into(key), value.to_string()))
			.collect();

		let path = route.template().render(&params)?;
		Ok(format!("{}{}", self.base_path, path))
	}

	/// Like [`url_for`](Self::url_for), followed by `query` as a form-urlencoded query string.
	pub fn url_for_with_query<I, K, V, Q, QK, QV>(&self, name: &str, params: I, query: Q) -> Result<String, UrlError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Display,
		Q: IntoIterator<Item = (QK, QV)>,
		QK: AsRef<str>,
		QV: AsRef<str>,
	{
		let mut url = self.url_for(name, params)?;
		let mut serializer = form_urlencoded::Serializer::new(String::new());
		for (key, value) in query {
			serializer.append_pair(key.as_ref(), value.as_ref());
		}
		let query = serializer.finish();

		if !query.is_empty() {
			url.push('?');
			url.push_str(&query);
		}
		Ok(url)
	}

	/// Resolves the request and runs the matched route, reporting every failure to the caller.
	///
	/// A panic in the route's middleware or handler is caught here and reported as
	/// [`DispatchError::Panicked`].
	pub fn try_dispatch(&self, req: &Request, res: Response) -> Result<Response, DispatchError> {
		let found = self.matcher.resolve(req.method(), req.uri().path())?;
		let route = self.routes.get(found.route.index()).ok_or(DispatchError::NotFound)?;
		trace!(method = %req.method(), path = %req.uri().path(), route = %route.label(), "matched route");

		let dispatched = panic::catch_unwind(AssertUnwindSafe(|| {
			self.strategy.dispatch(route, req, res, &found.params)
		}));
		dispatched.unwrap_or_else(|payload| {
			Err(DispatchError::Panicked {
				route: route.label(),
				message: panic_message(&*payload),
			})
		})
	}

	/// Resolves the request and runs the matched route.
	///
	/// Failures never escape: unmatched paths produce a 404, paths served only under other
	/// methods a 405 with an `Allow` header, and failing or panicking handlers a 500.
	pub fn dispatch(&self, req: &Request, res: Response) -> Response {
		match self.try_dispatch(req, res) {
			Ok(res) => res,
			Err(DispatchError::NotFound) => {
				warn!(method = %req.method(), path = %req.uri().path(), "no route matched");
				(self.fallbacks.not_found)(req)
			}
			Err(DispatchError::MethodNotAllowed(allowed)) => {
				warn!(method = %req.method(), path = %req.uri().path(), "method not allowed");
				(self.fallbacks.method_not_allowed)(req, &allowed)
			}
			Err(e) => {
				error!(method = %req.method(), path = %req.uri().path(), error = %e, "route failed");
				(self.fallbacks.internal_error)(req, &e)
			}
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_owned()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		String::from("unknown panic payload")
	}
}
