use crate::{
	error::{PatternError, UrlError},
	route::Params,
};
use std::{fmt, mem};

/// One piece of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Literal(String),
	/// A `{name}` or `{name:regex}` placeholder.
	Param {
		name: String,
		pattern: Option<String>,
	},
}

/// A parsed path template such as `/books/{id:[0-9]+}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	source: String,
	segments: Vec<Segment>,
}

impl Template {
	pub fn parse(pattern: &str) -> Result<Self, PatternError> {
		let mut segments = Vec::new();
		let mut literal = String::new();
		let mut chars = pattern.char_indices();

		while let Some((start, c)) = chars.next() {
			match c {
				'{' => {
					if !literal.is_empty() {
						segments.push(Segment::Literal(mem::take(&mut literal)));
					}

					// Braces inside the regex part must balance, e.g. `{year:[0-9]{4}}`.
					let mut depth = 1;
					let mut end = None;
					for (i, c) in chars.by_ref() {
						match c {
							'{' => depth += 1,
							'}' => {
								depth -= 1;
								if depth == 0 {
									end = Some(i);
									break;
								}
							}
							_ => {}
						}
					}

					let end = end.ok_or_else(|| PatternError::Unclosed {
						pattern: pattern.to_owned(),
						offset: start,
					})?;
					segments.push(placeholder(pattern, &pattern[start + 1..end], &segments)?);
				}
				'}' => {
					return Err(PatternError::UnexpectedBrace {
						pattern: pattern.to_owned(),
						offset: start,
					})
				}
				_ => literal.push(c),
			}
		}

		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}

		Ok(Self {
			source: pattern.to_owned(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Names of every placeholder, in order of appearance.
	pub fn param_names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| match segment {
			Segment::Param { name, .. } => Some(name.as_str()),
			Segment::Literal(_) => None,
		})
	}

	/// Replaces each placeholder with its value from `params`.
	///
	/// Values are inserted verbatim: they are neither percent-encoded nor checked against the
	/// placeholder's regex.
	pub fn render(&self, params: &Params) -> Result<String, UrlError> {
		let mut url = String::with_capacity(self.source.len());
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => url.push_str(text),
				Segment::Param { name, .. } => {
					let value = params
						.get(name)
						.ok_or_else(|| UrlError::MissingParam(name.clone()))?;
					url.push_str(value);
				}
			}
		}

		Ok(url)
	}
}

impl fmt::Display for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

fn placeholder(pattern: &str, body: &str, seen: &[Segment]) -> Result<Segment, PatternError> {
	let (name, regex) = match body.find(':') {
		Some(i) => (&body[..i], Some(&body[i + 1..])),
		None => (body, None),
	};

	if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return Err(PatternError::InvalidName {
			pattern: pattern.to_owned(),
			name: name.to_owned(),
		});
	}

	let duplicate = seen
		.iter()
		.any(|segment| matches!(segment, Segment::Param { name: other, .. } if other == name));
	if duplicate {
		return Err(PatternError::DuplicateName {
			pattern: pattern.to_owned(),
			name: name.to_owned(),
		});
	}

	Ok(Segment::Param {
		name: name.to_owned(),
		pattern: regex.filter(|r| !r.is_empty()).map(str::to_owned),
	})
}

#[cfg(test)]
mod test {
	use super::{Segment, Template};
	use crate::{error::PatternError, error::UrlError, route::Params};

	fn param(name: &str, pattern: Option<&str>) -> Segment {
		Segment::Param {
			name: name.into(),
			pattern: pattern.map(Into::into),
		}
	}

	#[test]
	fn parses_segments() {
		let template = Template::parse("/books/{id:[0-9]+}/chapters/{chapter}").unwrap();

		assert_eq!(
			template.segments(),
			&[
				Segment::Literal("/books/".into()),
				param("id", Some("[0-9]+")),
				Segment::Literal("/chapters/".into()),
				param("chapter", None),
			]
		);
		assert_eq!(template.param_names().collect::<Vec<_>>(), ["id", "chapter"]);
	}

	#[test]
	fn keeps_nested_braces_in_regex() {
		let template = Template::parse("/archive/{year:[0-9]{4}}").unwrap();
		assert_eq!(template.segments()[1], param("year", Some("[0-9]{4}")));
	}

	#[test]
	fn rejects_malformed_patterns() {
		assert!(matches!(
			Template::parse("/books/{id"),
			Err(PatternError::Unclosed { offset: 7, .. })
		));
		assert!(matches!(
			Template::parse("/books/id}"),
			Err(PatternError::UnexpectedBrace { offset: 9, .. })
		));
		assert!(matches!(
			Template::parse("/books/{}"),
			Err(PatternError::InvalidName { .. })
		));
		assert!(matches!(
			Template::parse("/books/{book-id}"),
			Err(PatternError::InvalidName { .. })
		));
		assert!(matches!(
			Template::parse("/{id}/{id}"),
			Err(PatternError::DuplicateName { .. })
		));
	}

	#[test]
	fn renders_verbatim() {
		let template = Template::parse("/books/{id:[0-9]+}").unwrap();
		let params: Params = vec![("id", "not a number")].into_iter().collect();

		// the suffix regex is not enforced when building URLs
		assert_eq!(template.render(&params).unwrap(), "/books/not a number");
	}

	#[test]
	fn render_names_missing_param() {
		let template = Template::parse("/books/{id}/{chapter}").unwrap();
		let params: Params = vec![("id", "1")].into_iter().collect();

		assert_eq!(
			template.render(&params),
			Err(UrlError::MissingParam("chapter".into()))
		);
	}
}
