//! Session setup shared by all commands.

use std::fs;

use anyhow::{Context, Result};

use super::args::SessionArgs;
use crate::apply::MissingTargetPolicy;
use crate::bootstrap::initial_state;
use crate::config::ClientConfig;
use crate::dom::{Document, Dom, NodeId};
use crate::runtime::Runtime;
use crate::store::StateStore;
use crate::transport::HttpChannel;

/// Apply session flags on top of the file configuration.
pub fn apply_session_args(config: &mut ClientConfig, args: &SessionArgs) {
    if let Some(url) = &args.url {
        config.page.url = url.clone();
    }
    if args.strict {
        config.apply.missing_target = MissingTargetPolicy::Fail;
    }
}

/// Load the page, seed the store from its bootstrap script and build a runtime.
///
/// The push channel is attached only when `with_push` is set and enabled in config.
pub fn open_session(
    config: &ClientConfig,
    args: &SessionArgs,
    with_push: bool,
) -> Result<Runtime<Document>> {
    let html = fs::read_to_string(&args.page)
        .with_context(|| format!("Failed to read page `{}`", args.page.display()))?;
    let doc = Document::parse(&html);

    let store = match initial_state(&doc)? {
        Some(snapshot) => StateStore::with_snapshot(snapshot),
        None => {
            crate::debug!("config"; "no page_props in {}, state starts unset", args.page.display());
            StateStore::new()
        }
    };

    let http = HttpChannel::new(&config.page.url, &config.http.options())?;
    crate::debug!("http"; "events go to {}", http.endpoint());

    let runtime = Runtime::new(doc, store, http, config.runtime_options());
    let manager = with_push
        .then(|| config.push.manager(config.page.url.page_id()))
        .flatten();

    Ok(match manager {
        Some(manager) => runtime.with_push(manager),
        None => runtime,
    })
}

/// The root body container, falling back to `<body>`.
pub fn body_node(doc: &Document, root_body: &str) -> Option<NodeId> {
    doc.find_by_target_id(root_body).or_else(|| doc.body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::core::PageUrl;

    fn session(page: PathBuf) -> SessionArgs {
        SessionArgs {
            page,
            url: None,
            strict: false,
        }
    }

    #[test]
    fn test_apply_session_args() {
        let mut config = ClientConfig::default();
        let mut args = session(PathBuf::from("page.html"));
        args.url = Some(PageUrl::parse("http://localhost:9000/todo/").unwrap());
        args.strict = true;

        apply_session_args(&mut config, &args);
        assert_eq!(config.page.url.page_id(), "/todo/");
        assert_eq!(config.apply.missing_target, MissingTargetPolicy::Fail);
    }

    #[test]
    fn test_open_session_seeds_state() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(
            &page,
            r#"<html><head><script>let page_props = {'n': 1}; </script></head>
            <body><div class="pyfron_body"><p>hi</p></div></body></html>"#,
        )
        .unwrap();

        let runtime = open_session(&ClientConfig::default(), &session(page), true).unwrap();
        assert_eq!(runtime.store().get(), Some(serde_json::json!({"n": 1}).into()));
        assert_eq!(
            runtime.http().endpoint().as_str(),
            "http://localhost:8000/onEvent"
        );

        let dom = runtime.dom();
        let body = body_node(&dom, "pyfron_body").unwrap();
        assert_eq!(dom.inner_html(body), "<p>hi</p>");
    }

    #[test]
    fn test_open_session_missing_page() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_session(
            &ClientConfig::default(),
            &session(dir.path().join("absent.html")),
            false,
        );
        assert!(result.is_err());
    }
}
