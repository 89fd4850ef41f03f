use crate::{
	error::DispatchError,
	route::{Params, Request, Response, Route},
};

/// Invokes a matched route and turns its reply into a response.
///
/// The request and seed response are passed in on every call, so one strategy can serve
/// concurrent dispatches.
pub trait Strategy: Send + Sync {
	fn dispatch(
		&self,
		route: &Route,
		req: &Request,
		res: Response,
		params: &Params,
	) -> Result<Response, DispatchError>;
}

/// Requires every route to reply with a [`Response`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseStrategy;

impl Strategy for ResponseStrategy {
	fn dispatch(
		&self,
		route: &Route,
		req: &Request,
		res: Response,
		params: &Params,
	) -> Result<Response, DispatchError> {
		let reply = route
			.call(req, res, params)
			.map_err(|source| DispatchError::Handler {
				route: route.label(),
				source,
			})?;

		reply.downcast::<Response>().map_err(|reply| DispatchError::InvalidReturn {
			route: route.label(),
			type_name: reply.type_name(),
		})
	}
}

#[cfg(test)]
mod test {
	use super::{ResponseStrategy, Strategy};
	use crate::{
		error::DispatchError,
		route::{Body, Method, Params, Request, Response, Route, RouteId, StatusCode},
		template::Template,
	};
	use anyhow::anyhow;

	fn route<H, R>(handler: H) -> Route
	where
		H: Fn(&Request, Response, &Params) -> anyhow::Result<R> + Send + Sync + 'static,
		R: std::any::Any + Send,
	{
		Route::new(RouteId(0), Method::GET, Template::parse("/{id}").unwrap(), handler)
	}

	fn params() -> Params {
		vec![("id", "7")].into_iter().collect()
	}

	#[test]
	fn hands_request_response_and_params_to_handler() {
		let route = route(|req, mut res, params| {
			assert_eq!(req.uri().path(), "/7");
			*res.status_mut() = StatusCode::ACCEPTED;
			Ok(res.map(|_| Body::from(params.get("id").unwrap_or_default().to_owned())))
		});
		let req = hyper::Request::builder().uri("/7").body(Body::empty()).unwrap();

		let res = ResponseStrategy
			.dispatch(&route, &req, Response::default(), &params())
			.unwrap();
		assert_eq!(res.status(), StatusCode::ACCEPTED);
	}

	#[test]
	fn rejects_non_response_reply() {
		let route = route(|_req, _res, _params| Ok("not a response"));

		let err = ResponseStrategy
			.dispatch(&route, &Request::default(), Response::default(), &params())
			.unwrap_err();
		match err {
			DispatchError::InvalidReturn { route, type_name } => {
				assert_eq!(route, "GET /{id}");
				assert_eq!(type_name, "&str");
			}
			other => panic!("unexpected error: {}", other),
		}
	}

	#[test]
	fn wraps_handler_failure() {
		let route = route(|_req, _res, _params| -> anyhow::Result<Response> { Err(anyhow!("database is down")) });

		let err = ResponseStrategy
			.dispatch(&route, &Request::default(), Response::default(), &params())
			.unwrap_err();
		assert!(matches!(err, DispatchError::Handler { .. }));
		assert!(err.to_string().ends_with("database is down"));
	}
}
