use crate::route::{Handler, Params, Reply, Request, Response};
use anyhow::Result;
use std::sync::Arc;

/// Code that wraps a route handler.
///
/// A middleware either calls [`Next::run`] to continue down the chain or returns its own reply
/// to short-circuit it.
pub trait Middleware: Send + Sync {
	fn handle(&self, req: &Request, res: Response, params: &Params, next: Next<'_>) -> Result<Reply>;
}

/// Middleware shared between every route of a group.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// The remainder of a route's middleware chain, ending in its handler.
pub struct Next<'a> {
	chain: &'a [SharedMiddleware],
	handler: &'a Handler,
}

impl<'a> Next<'a> {
	pub(crate) fn new(chain: &'a [SharedMiddleware], handler: &'a Handler) -> Self {
		Self { chain, handler }
	}

	pub fn run(self, req: &Request, res: Response, params: &Params) -> Result<Reply> {
		match self.chain.split_first() {
			Some((current, rest)) => current.handle(req, res, params, Next::new(rest, self.handler)),
			None => (self.handler)(req, res, params),
		}
	}
}

/// Builds a middleware from a closure.
///
/// ```
/// use waypost::{middleware, StatusCode};
///
/// let deny = middleware::from_fn(|_req, mut res, _params, _next| {
/// 	*res.status_mut() = StatusCode::FORBIDDEN;
/// 	Ok(res.into())
/// });
/// # let _ = deny;
/// ```
pub fn from_fn<F>(f: F) -> SharedMiddleware
where
	F: Fn(&Request, Response, &Params, Next<'_>) -> Result<Reply> + Send + Sync + 'static,
{
	Arc::new(FromFn(f))
}

struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
	F: Fn(&Request, Response, &Params, Next<'_>) -> Result<Reply> + Send + Sync,
{
	fn handle(&self, req: &Request, res: Response, params: &Params, next: Next<'_>) -> Result<Reply> {
		(self.0)(req, res, params, next)
	}
}

#[cfg(test)]
mod test {
	use super::{from_fn, Next};
	use crate::route::{Body, Handler, Params, Reply, Request, Response, StatusCode};
	use std::sync::{Arc, Mutex};

	fn recording(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> super::SharedMiddleware {
		let log = Arc::clone(log);
		from_fn(move |req, res, params, next| {
			log.lock().unwrap().push(tag);
			next.run(req, res, params)
		})
	}

	fn handler(log: &Arc<Mutex<Vec<&'static str>>>) -> Handler {
		let log = Arc::clone(log);
		Box::new(move |_req: &Request, res: Response, _params: &Params| {
			log.lock().unwrap().push("handler");
			Ok::<_, anyhow::Error>(Reply::new(res))
		})
	}

	#[test]
	fn runs_chain_in_order() {
		let log = Arc::new(Mutex::new(vec![]));
		let chain = vec![recording(&log, "outer"), recording(&log, "inner")];
		let handler = handler(&log);

		let reply = Next::new(&chain, &handler)
			.run(&Request::default(), Response::default(), &Params::new())
			.unwrap();

		assert!(reply.is::<Response>());
		assert_eq!(*log.lock().unwrap(), ["outer", "inner", "handler"]);
	}

	#[test]
	fn short_circuits() {
		let log = Arc::new(Mutex::new(vec![]));
		let deny = from_fn(|_req, _res, _params, _next| {
			let mut res = Response::new(Body::empty());
			*res.status_mut() = StatusCode::UNAUTHORIZED;
			Ok(res.into())
		});
		let chain = vec![deny, recording(&log, "never")];
		let handler = handler(&log);

		let res = Next::new(&chain, &handler)
			.run(&Request::default(), Response::default(), &Params::new())
			.unwrap()
			.downcast::<Response>()
			.unwrap();

		assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
		assert!(log.lock().unwrap().is_empty());
	}
}
