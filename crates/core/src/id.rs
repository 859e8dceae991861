// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier canonicalization.
//!
//! YARN applications and MapReduce jobs share a numeric stem but are addressed
//! with different prefixes depending on which upstream API is in play
//! (`application_` at the resource manager, `job_` everywhere else). Every
//! stored job is keyed by its `job_` form; callers convert at the boundary.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Canonical key for a tracked job: always the `job_`-prefixed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        let (_, job_form) = canonicalize(&id.into());
        Self(job_form)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `application_` form of this id, e.g. for building RM proxy URLs.
    pub fn application_form(&self) -> String {
        canonicalize(&self.0).0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId::new(s)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId::new(s)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Produce both the `application_` and `job_` forms of an identifier,
/// regardless of which form was passed in. Idempotent: canonicalizing either
/// output form yields the same pair.
pub fn canonicalize(raw: &str) -> (String, String) {
    let app_form = replace_first(raw, "job_", "application_");
    let job_form = replace_first(raw, "application_", "job_");
    (app_form, job_form)
}

fn replace_first(s: &str, from: &str, to: &str) -> String {
    match s.find(from) {
        Some(idx) => {
            let mut out = String::with_capacity(s.len() - from.len() + to.len());
            out.push_str(&s[..idx]);
            out.push_str(to);
            out.push_str(&s[idx + from.len()..]);
            out
        }
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_from_job_form() {
        let (app, job) = canonicalize("job_1329348432655_0001");
        assert_eq!(app, "application_1329348432655_0001");
        assert_eq!(job, "job_1329348432655_0001");
    }

    #[test]
    fn canonicalize_from_application_form() {
        let (app, job) = canonicalize("application_1329348432655_0001");
        assert_eq!(app, "application_1329348432655_0001");
        assert_eq!(job, "job_1329348432655_0001");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let (app1, job1) = canonicalize("job_1_1");
        let (app2, job2) = canonicalize(&app1);
        assert_eq!(job1, job2);
        let (_, job3) = canonicalize(&job1);
        assert_eq!(job1, job3);
        let _ = app2;
    }

    #[test]
    fn job_id_keys_on_job_form() {
        let id = JobId::new("application_1_2");
        assert_eq!(id.as_str(), "job_1_2");
        assert_eq!(id.application_form(), "application_1_2");
    }
}
