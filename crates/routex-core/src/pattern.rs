//! Registration-time pattern validation.

use routex_dsa::{PatternSegment, ROOT_PATH};

use crate::config::RouterConfig;
use crate::error::{PatternFault, RouterError};

/// A pattern that passed validation, with trailing slashes trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidPattern<'a> {
    pub normalized: &'a str,
    pub params: usize,
    pub segments: usize,
}

impl ValidPattern<'_> {
    pub fn has_params(&self) -> bool {
        self.params > 0
    }
}

/// Checks a route pattern: non-empty, rooted, bounded, no query string, no
/// empty interior segment, no unnamed or excess parameters.
pub fn validate<'a>(pattern: &'a str, config: &RouterConfig) -> Result<ValidPattern<'a>, RouterError> {
    let fail = |fault| Err(RouterError::invalid(pattern, fault));

    if pattern.is_empty() {
        return fail(PatternFault::Empty);
    }
    if pattern.len() > config.max_path_len {
        return fail(PatternFault::TooLong {
            len: pattern.len(),
            max: config.max_path_len,
        });
    }
    if pattern.contains('?') {
        return fail(PatternFault::QueryString);
    }
    if !pattern.starts_with('/') {
        return fail(PatternFault::MissingLeadingSlash);
    }

    let trimmed = pattern.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(ValidPattern {
            normalized: ROOT_PATH,
            params: 0,
            segments: 0,
        });
    }

    let mut params = 0;
    let mut segments = 0;
    for segment in trimmed[1..].split('/') {
        if segment.is_empty() {
            return fail(PatternFault::EmptySegment);
        }
        if let PatternSegment::Param(name) = PatternSegment::classify(segment) {
            if name.is_empty() {
                return fail(PatternFault::EmptyParamName);
            }
            params += 1;
        }
        segments += 1;
    }

    if params > config.max_params {
        return fail(PatternFault::TooManyParams {
            count: params,
            max: config.max_params,
        });
    }

    Ok(ValidPattern {
        normalized: trimmed,
        params,
        segments,
    })
}
