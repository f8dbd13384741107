//! Change-Set Applier
//!
//! Patches the live page from a [`ChangeSet`]: each key names a target
//! element (by class token), each value is the HTML that replaces it.
//!
//! # Replacement
//!
//! | Target        | Effect                                                    |
//! |---------------|-----------------------------------------------------------|
//! | root body     | children of the target replaced, container kept           |
//! | anything else | target swapped for the fragment's first top-level element |
//!
//! Keys are independent. A missing target is logged and skipped unless the
//! `fail` policy is selected, in which case every target is checked before
//! the DOM is touched and nothing is applied if one is missing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::{Dom, DomError};
use crate::protocol::{ChangeSet, ROOT_BODY};

// =============================================================================
// Options
// =============================================================================

/// What to do when a change-set key has no matching element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingTargetPolicy {
    /// Log and continue with the remaining keys.
    #[default]
    Skip,
    /// Reject the whole change-set before mutating anything.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Key whose target keeps its identity and only has its children replaced.
    pub root_body: String,
    pub missing: MissingTargetPolicy,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            root_body: ROOT_BODY.to_string(),
            missing: MissingTargetPolicy::Skip,
        }
    }
}

// =============================================================================
// Report & Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TargetNotFound,
    /// Fragment had no element to swap in.
    NoElement,
    Dom(DomError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound => write!(f, "target not found"),
            Self::NoElement => write!(f, "fragment has no element"),
            Self::Dom(e) => write!(f, "{e}"),
        }
    }
}

/// Outcome of one `apply` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn skipped_targets(&self) -> impl Iterator<Item = &str> {
        self.skipped.iter().map(|(target, _)| target.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("change-set rejected, target(s) not found: {}", .0.join(", "))]
    TargetsNotFound(Vec<String>),

    #[error("failed to replace `{target}`: {source}")]
    Dom {
        target: String,
        #[source]
        source: DomError,
    },
}

// =============================================================================
// Apply
// =============================================================================

/// Apply every entry of `changes` to `dom`.
///
/// An empty change-set is a no-op.
pub fn apply<D: Dom>(
    dom: &mut D,
    changes: &ChangeSet,
    options: &ApplyOptions,
) -> Result<ApplyReport, ApplyError> {
    let mut report = ApplyReport::default();
    if changes.is_empty() {
        return Ok(report);
    }

    if options.missing == MissingTargetPolicy::Fail {
        let missing: Vec<String> = changes
            .keys()
            .filter(|target| dom.find_by_target_id(target).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            crate::log!("apply"; "rejected change-set, missing: {}", missing.join(", "));
            return Err(ApplyError::TargetsNotFound(missing));
        }
    }

    for (target, html) in changes {
        match apply_one(dom, target, html, options) {
            Ok(()) => {
                crate::debug!("apply"; "replaced `{}`", target);
                report.applied.push(target.clone());
            }
            Err(SkipReason::Dom(source)) if options.missing == MissingTargetPolicy::Fail => {
                return Err(ApplyError::Dom {
                    target: target.clone(),
                    source,
                });
            }
            Err(reason) => {
                crate::log!("apply"; "skipped `{}`: {}", target, reason);
                report.skipped.push((target.clone(), reason));
            }
        }
    }

    Ok(report)
}

fn apply_one<D: Dom>(
    dom: &mut D,
    target: &str,
    html: &str,
    options: &ApplyOptions,
) -> Result<(), SkipReason> {
    let Some(node) = dom.find_by_target_id(target) else {
        return Err(SkipReason::TargetNotFound);
    };

    let fragment = dom.parse_fragment(html);
    let (elements, others): (Vec<_>, Vec<_>) =
        fragment.nodes.into_iter().partition(|&n| dom.is_element(n));
    dom.discard(&others);

    if target == options.root_body {
        return dom.replace_children(node, &elements).map_err(|e| {
            dom.discard(&elements);
            SkipReason::Dom(e)
        });
    }

    let Some((&first, extra)) = elements.split_first() else {
        return Err(SkipReason::NoElement);
    };
    dom.discard(extra);
    dom.replace_element(node, first).map_err(|e| {
        dom.discard(&[first]);
        SkipReason::Dom(e)
    })
}

// =============================================================================
// Tests
// =============================================================================
