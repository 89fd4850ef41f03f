use crate::{
	route::{Request, Response},
	Router,
};
use hyper::service::Service;
use std::{
	convert::Infallible,
	future::{ready, Ready},
	sync::Arc,
	task::{Context, Poll},
};

/// Serves a [`Router`] through hyper.
///
/// Pass it to `hyper::Server::serve`; each connection gets a [`RouteHandler`] sharing the same
/// router.
#[derive(Clone)]
pub struct HttpRouter {
	router: Arc<Router>,
}

impl From<Router> for HttpRouter {
	fn from(router: Router) -> Self {
		Self {
			router: Arc::new(router),
		}
	}
}

impl From<Arc<Router>> for HttpRouter {
	fn from(router: Arc<Router>) -> Self {
		Self { router }
	}
}

impl<T> Service<T> for HttpRouter {
	type Response = RouteHandler;
	type Error = Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _: &mut Context) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, _: T) -> Self::Future {
		ready(Ok(RouteHandler {
			router: Arc::clone(&self.router),
		}))
	}
}

/// Handles the requests of one connection.
#[derive(Clone)]
pub struct RouteHandler {
	router: Arc<Router>,
}

impl Service<Request> for RouteHandler {
	type Response = Response;
	type Error = Infallible;
	type Future = Ready<Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: Request) -> Self::Future {
		ready(Ok(self.router.dispatch(&req, Response::default())))
	}
}
