#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use mangashelf::config::Config;
use serde_json::Value;
use std::path::PathBuf;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub uploads_dir: PathBuf,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("mangashelf-test-{id}.db"));
    let uploads_dir = std::env::temp_dir().join(format!("mangashelf-uploads-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.uploads.root_path = uploads_dir.display().to_string();
    config.server.secure_cookies = false;
    configure(&mut config);

    let state = mangashelf::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    TestApp {
        router: mangashelf::api::router(state).await,
        uploads_dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        self.send_from(method, uri, cookie, body, "203.0.113.7").await
    }

    /// Same as [`TestApp::send`] with an explicit forwarded client address.
    pub async fn send_from(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
        client: &str,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", client);

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Logs in and returns the `name=value` part of the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login should set a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn login_admin(&self) -> String {
        self.login("admin", "password").await
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
