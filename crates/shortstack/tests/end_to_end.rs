//! A configured application driven through the full pipeline.

use std::fs;
use std::path::Path;

use http::StatusCode;
use shortstack::prelude::*;
use shortstack_test::{TestClient, TestError};
use tempfile::TempDir;

fn write(root: &Path, name: &str, source: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

fn views() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "posts/show.html", "<h1>{{ title }}</h1>");
    write(root, "posts/show.json", r#"{"title": {{ title|tojson }}, "id": {{ params.id|tojson }}}"#);
    write(root, "layouts/application.html", "<html>{{ content|safe }}</html>");
    write(root, "layouts/application.json", "{{ content|safe }}");
    dir
}

fn config(views: &TempDir, handle_errors: bool) -> ShortStackConfig {
    let toml = format!(
        r#"
[dispatch]
handle_errors = {handle_errors}
log_http_errors = false
default_layout = "application"

[views]
paths = [{root:?}]
default_format = "html"

[logging]
enabled = false
"#,
        root = views.path().display().to_string(),
    );
    ConfigLoader::new()
        .with_string(&toml, "toml")
        .unwrap()
        .load()
        .unwrap()
}

fn app(config: &ShortStackConfig) -> Stack {
    StackBuilder::new()
        .configure(config)
        .unwrap()
        .provides(vec![Format::HTML, Format::JSON])
        .get("/posts/featured", |c| {
            c.assign("title", "Featured")?;
            Ok(Reply::from(c.render("posts/show")?))
        })
        .get("/posts/:id(.:format)", |c| {
            let title = format!("Post {}", c.param("id").unwrap_or_default());
            c.assign("title", title)?;
            Ok(Reply::from(c.render("posts/show")?))
        })
        .get("/cached", |c| {
            c.set_status(StatusCode::NOT_MODIFIED);
            c.headers_mut().insert("etag", "\"v1\"".parse()?);
            Err(Abort::halt())
        })
        .get("/boom", |_c| {
            Err(Abort::raise(anyhow::Error::msg("database password is hunter2")))
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_html_page_is_wrapped_in_default_layout() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/posts/7").accept("text/html").send().await;

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "text/html")
        .assert_body("<html><h1>Post 7</h1></html>");
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_extension_selects_json_view() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/posts/7.json").accept("text/html").send().await;

    response.assert_header("content-type", "application/json");
    let body = response.json_value().unwrap();
    assert_eq!(body["title"], "Post 7");
    assert_eq!(body["id"], "7");
}

#[tokio::test]
async fn test_literal_route_beats_capture() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/posts/featured").send().await;
    response.assert_body("<html><h1>Featured</h1></html>");
}

#[tokio::test]
async fn test_unknown_path_renders_error_view() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/nowhere").send().await;

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_header("content-type", "text/html")
        .assert_body_contains("404 Not Found");
}

#[tokio::test]
async fn test_unacceptable_format_is_406() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/posts/7").accept("image/png").send().await;
    response.assert_status(StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn test_halt_keeps_status_and_headers() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/cached").send().await;

    response
        .assert_status(StatusCode::NOT_MODIFIED)
        .assert_header("etag", "\"v1\"")
        .assert_body("");
}

#[tokio::test]
async fn test_server_error_hides_details() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, true)));

    let response = client.get("/boom").accept("application/json").send().await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().unwrap().contains("hunter2"));
    assert_eq!(response.json_value().unwrap()["status"], 500);
}

#[tokio::test]
async fn test_uncaught_errors_escape_bare_stack() {
    let views = views();
    let client = TestClient::new(app(&config(&views, false)));

    let err = client.get("/boom").try_send().await.unwrap_err();
    assert!(matches!(err, TestError::Dispatch(DispatchError::Unhandled(_))));

    let err = client.get("/nowhere").try_send().await.unwrap_err();
    assert!(matches!(
        err,
        TestError::Dispatch(DispatchError::Http(HttpError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_rescue_stage_catches_escaped_errors() {
    let views = views();
    let client = TestClient::with_pipeline(app(&config(&views, false)));

    let response = client.get("/boom").send().await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().unwrap().contains("hunter2"));
}

#[tokio::test]
async fn test_mounted_admin_stack_inherits_layout_and_formats() {
    let views = views();
    let config = config(&views, true);
    let admin = StackBuilder::new()
        .get("/", |_c| Ok(Reply::from("dashboard")))
        .build()
        .unwrap();
    let stack = StackBuilder::new()
        .configure(&config)
        .unwrap()
        .provides(vec![Format::HTML])
        .mount("/admin", &admin)
        .build()
        .unwrap();
    let client = TestClient::with_pipeline(stack);

    let response = client.get("/admin/").send().await;
    response
        .assert_header("content-type", "text/html")
        .assert_body("<html>dashboard</html>");

    let response = client.get("/admin/").accept("application/json").send().await;
    response.assert_status(StatusCode::NOT_ACCEPTABLE);
}
