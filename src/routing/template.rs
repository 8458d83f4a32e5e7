//! Inbound path templates.
//!
//! A template is a literal path with optional `{name}` segments, e.g.
//! `/users/{id}/orders/{order}`. The same syntax is registered with the HTTP
//! router; at ingress every placeholder is replaced with the caller's literal
//! (still percent-encoded) segment to produce the forwarded path.

use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path must start with '/'")]
    MissingLeadingSlash,

    #[error("malformed placeholder in segment '{0}'")]
    MalformedPlaceholder(String),

    #[error("placeholder '{0}' appears more than once")]
    DuplicatePlaceholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let rest = raw
            .strip_prefix('/')
            .ok_or(TemplateError::MissingLeadingSlash)?;

        let mut seen = HashSet::new();
        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if let Some(inner) = segment.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .filter(|n| !n.is_empty() && !n.contains(['{', '}', '*']))
                    .ok_or_else(|| TemplateError::MalformedPlaceholder(segment.to_string()))?;
                if !seen.insert(name) {
                    return Err(TemplateError::DuplicatePlaceholder(name.to_string()));
                }
                segments.push(Segment::Param(name.to_string()));
            } else if segment.contains(['{', '}']) || segment.starts_with([':', '*']) {
                return Err(TemplateError::MalformedPlaceholder(segment.to_string()));
            } else {
                segments.push(Segment::Literal(segment.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Template as written; also the HTTP router's route syntax.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_placeholders(&self) -> bool {
        self.placeholders().next().is_some()
    }

    /// Substitute placeholders using `lookup`. A placeholder with no value
    /// renders as an empty segment.
    pub fn render<'a, F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(name) => path.push_str(lookup(name).unwrap_or_default()),
            }
        }
        path
    }
}
