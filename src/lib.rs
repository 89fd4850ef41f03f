//! A named-route HTTP router with route groups and reverse URL generation, built on hyper.
//!
//! ```
//! use waypost::{hyper, Body, Params, Request, Response, Router, StatusCode};
//!
//! fn show_book(_req: &Request, res: Response, params: &Params) -> anyhow::Result<Response> {
//! 	let id = params.get("id").unwrap_or_default().to_owned();
//! 	Ok(res.map(|_| Body::from(format!("book {}", id))))
//! }
//!
//! let mut router = Router::new();
//! router.push_group("/books", vec![]);
//! router.get("/{id:[0-9]+}", show_book)?.set_name("book");
//! router.pop_group();
//!
//! assert_eq!(router.url_for("book", vec![("id", "42")])?, "/books/42");
//!
//! let req = hyper::Request::get("/books/42").body(Body::empty())?;
//! let res = router.dispatch(&req, Response::default());
//! assert_eq!(res.status(), StatusCode::OK);
//!
//! let req = hyper::Request::get("/books/dune").body(Body::empty())?;
//! assert_eq!(router.dispatch(&req, Response::default()).status(), StatusCode::NOT_FOUND);
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```
//!
//! Patterns are literal text mixed with `{name}` placeholders, which match one path segment, and
//! `{name:regex}` placeholders, which match `regex`. Routes registered between
//! [`Router::push_group`] and [`Router::pop_group`] get the group's prefix and middleware.
//!
//! Handlers receive the request, a seed response and the extracted [`Params`], and must return a
//! [`Response`]. [`Router::dispatch`] turns unmatched paths into 404s, wrong methods into 405s
//! and failing handlers into 500s; [`Router::try_dispatch`] reports them as [`DispatchError`]s.
//! Serve a router with hyper by converting it into an [`HttpRouter`].

mod builder;
mod error;
mod group;
mod http;
mod router;
mod strategy;

/// Pattern matching between request paths and registered routes.
pub mod matcher;

/// Middleware that wraps route handlers.
pub mod middleware;

/// Types for defining routes and route handlers.
pub mod route;

/// Parsing and rendering of path templates.
pub mod template;

pub use builder::*;
pub use error::*;
pub use http::*;
pub use hyper;
pub use matcher::{Match, PatternMatcher, RegexMatcher};
pub use middleware::{Middleware, Next, SharedMiddleware};
pub use route::*;
pub use router::*;
pub use strategy::*;
pub use template::Template;
