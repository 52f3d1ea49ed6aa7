use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use ltg_common::Secret;
use serde_json::Value;

use crate::{
    config::ServerOptions,
    middleware::{ApiKeyMiddlewareFactory, API_KEY_HEADER},
};

// The key the test app is wired with. DO NOT use this value in a real deployment.
pub const TEST_API_KEY: &str = "ltg-test-key-00000000000000000000";

pub fn test_api_key() -> Secret<String> {
    Secret::new(TEST_API_KEY.to_string())
}

pub fn server_options() -> ServerOptions {
    ServerOptions { admin_id: "LTG-ADMIN-01".to_string(), use_x_forwarded_for: false, use_forwarded: false }
}

pub async fn get_request(
    api_key: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::get().uri(path);
    if !api_key.is_empty() {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    let req = req.to_request();
    let app = App::new().wrap(ApiKeyMiddlewareFactory::new(test_api_key(), false, false)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making GET request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn post_request(
    api_key: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri(path).set_json(&body);
    if !api_key.is_empty() {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    let req = req.to_request();
    let app = App::new().wrap(ApiKeyMiddlewareFactory::new(test_api_key(), false, false)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making POST request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn patch_request(
    api_key: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::patch().uri(path).set_json(&body);
    if !api_key.is_empty() {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    let req = req.to_request();
    let app = App::new().wrap(ApiKeyMiddlewareFactory::new(test_api_key(), false, false)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making PATCH request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn put_request(
    api_key: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::put().uri(path).set_json(&body);
    if !api_key.is_empty() {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    let req = req.to_request();
    let app = App::new().wrap(ApiKeyMiddlewareFactory::new(test_api_key(), false, false)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making PUT request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn delete_request(
    api_key: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::delete().uri(path);
    if !api_key.is_empty() {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    let req = req.to_request();
    let app = App::new().wrap(ApiKeyMiddlewareFactory::new(test_api_key(), false, false)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making DELETE request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
