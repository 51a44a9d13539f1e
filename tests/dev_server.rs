//! Dev build served through the dev server router.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use pagesmith::livereload::Reloader;
use pagesmith::serve;
use pagesmith::tasks;
use tower::ServiceExt;

fn dev_site() -> (tempfile::TempDir, axum::Router) {
    let (tmp, project) = common::site();
    let site = project.load_site_config(true).unwrap();
    tasks::run_tasks(tasks::DEV_BUILD, &project, &site, |_, _| {}).unwrap();
    let app = serve::router(
        &project.output_dir(),
        &project.config.server.default_page,
        Reloader::new(),
    );
    (tmp, app)
}

async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn root_redirects_to_default_page() {
    let (_tmp, app) = dev_site();

    let res = get(app, "/").await;

    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[header::LOCATION], "/mac");
}

#[tokio::test]
async fn default_page_resolves_without_extension() {
    let (_tmp, app) = dev_site();

    let res = get(app, "/mac").await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("<link rel=\"stylesheet\" href=\"/style.css\">"));
    assert!(body.contains("</p>\n<script src=\"/__livereload.js\" defer></script></body>"));
}

#[tokio::test]
async fn dev_assets_are_served() {
    let (_tmp, app) = dev_site();

    let css = get(app.clone(), "/style.css").await;
    let js = get(app, "/app.js").await;

    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(js.status(), StatusCode::OK);
    let body = to_bytes(js.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        &body[..],
        b"document.documentElement.classList.add(\"js\");\n"
    );
}

#[tokio::test]
async fn watch_refuses_production_config() {
    let (_tmp, project) = common::site();
    let site = project.load_site_config(false).unwrap();

    let result = pagesmith::watch::run(project, site).await;

    assert!(result.is_err());
}
