//! `click` and `submit` commands: one interaction over HTTP.

use anyhow::{Context, Result};

use super::common::body_node;
use crate::apply::ApplyReport;
use crate::capture::{SubmitEvent, find_by_identifier, find_clickable};
use crate::dom::{Document, Dom};
use crate::runtime::Runtime;

pub async fn click(runtime: &Runtime<Document>, elem_id: &str) -> Result<()> {
    if find_clickable(&runtime.dom(), elem_id).is_none() {
        crate::log!("capture"; "no element is bound to `{}`, sending anyway", elem_id);
    }

    let report = runtime
        .click(elem_id)
        .await
        .with_context(|| format!("click on `{elem_id}` failed"))?;
    print_result(runtime, &report);
    Ok(())
}

pub async fn submit(
    runtime: &Runtime<Document>,
    elem_id: &str,
    fields: &[(String, String)],
) -> Result<()> {
    let capture = &runtime.options().capture;
    let (identifier_attr, field_key_attr) = (&capture.identifier_attr, &capture.field_key_attr);

    let submitter = {
        let mut dom = runtime.dom();
        let submitter = find_by_identifier(&dom, identifier_attr, elem_id)
            .with_context(|| format!("no element with {identifier_attr}=\"{elem_id}\""))?;
        for (key, value) in fields {
            set_field(&mut dom, submitter, field_key_attr, key, value)?;
        }
        submitter
    };

    let mut event = SubmitEvent::new(submitter);
    let report = runtime
        .submit(&mut event)
        .await
        .with_context(|| format!("submit of `{elem_id}` failed"))?;
    print_result(runtime, &report);
    Ok(())
}

/// Type `value` into the field keyed `key` below `submitter`.
fn set_field(
    doc: &mut Document,
    submitter: <Document as Dom>::Node,
    field_key_attr: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let field = doc
        .descendants(submitter)
        .into_iter()
        .find(|&node| doc.field_key(node, field_key_attr).as_deref() == Some(key))
        .with_context(|| format!("form has no field with {field_key_attr}=\"{key}\""))?;
    doc.set_value(field, value)?;
    Ok(())
}

fn print_result(runtime: &Runtime<Document>, report: &ApplyReport) {
    for target in report.skipped_targets() {
        crate::log!("apply"; "skipped `{}`", target);
    }
    crate::debug!("apply"; "applied {} target(s)", report.applied.len());

    let dom = runtime.dom();
    match body_node(&dom, &runtime.options().apply.root_body) {
        Some(body) => println!("{}", dom.inner_html(body)),
        None => println!("{}", dom.to_html()),
    }
}
