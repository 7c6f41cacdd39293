//! ============================================================================
//! HTTP Routes - JSON endpoints over the composition service
//! ============================================================================
//! `handle` is the whole router: method + URL + body in, status + body out.
//! It never touches the socket, so tests drive it directly.
//! ============================================================================

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use tiny_http::Method;
use tracing::{debug, error};

use comp_core::{CompError, CompService, ItemCategory, SaveRequest, ServerConfig};

/// A response ready to be written by the server loop
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: value.to_string(),
        }
    }

    pub fn text(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body,
        }
    }

    pub fn into_http(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let response = tiny_http::Response::from_string(self.body).with_status_code(self.status);
        match tiny_http::Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(_) => response,
        }
    }
}

/// `{ id, password }` body of the verify and delete endpoints
#[derive(Debug, Default, Deserialize)]
struct PasswordBody {
    #[serde(default)]
    id: String,
    #[serde(default)]
    password: Option<String>,
}

type RouteResult = Result<ApiResponse, CompError>;

/// Route one request
pub fn handle(
    service: &CompService,
    config: &ServerConfig,
    method: &Method,
    raw_url: &str,
    body: &str,
) -> ApiResponse {
    match route(service, config, method, raw_url, body) {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

fn route(
    service: &CompService,
    config: &ServerConfig,
    method: &Method,
    raw_url: &str,
    body: &str,
) -> RouteResult {
    let parsed = url::Url::parse(&format!("http://localhost{}", raw_url))
        .map_err(|e| CompError::BadRequest(format!("Invalid URL: {}", e)))?;
    let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
    let segments: Vec<&str> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (method, segments.as_slice()) {
        (Method::Get, ["api", "items"]) => {
            let category = parse_category(query.get("category"))?;
            let items = service.items(category, query.get("search").map(String::as_str));
            Ok(ApiResponse::json(200, json!(items)))
        }
        (Method::Get, ["api", "items", "picker"]) => {
            let category = parse_category(query.get("category"))?
                .ok_or_else(|| CompError::BadRequest("Missing category".to_string()))?;
            let tier = parse_number(&query, "tier", comp_core::DEFAULT_TIER)?;
            let enchant = parse_number(&query, "enchant", 0)?;
            let groups =
                service.picker(category, tier, enchant, query.get("search").map(String::as_str));
            Ok(ApiResponse::json(200, json!(groups)))
        }
        (Method::Get, ["api", "composition", "list"]) => {
            let summaries = service.list()?;
            Ok(ApiResponse::json(200, json!({ "success": true, "data": summaries })))
        }
        (Method::Post, ["api", "composition"]) => {
            let req: SaveRequest = parse_body(body)?;
            let id = service.create(req)?;
            Ok(ApiResponse::json(201, json!({ "success": true, "id": id })))
        }
        (Method::Put, ["api", "composition"]) => {
            let req: SaveRequest = parse_body(body)?;
            let view = service.update(req)?;
            Ok(ApiResponse::json(200, json!({ "success": true, "data": view })))
        }
        (Method::Delete, ["api", "composition"])
        | (Method::Delete, ["api", "composition", "delete"]) => {
            let from_body: PasswordBody = if body.trim().is_empty() {
                PasswordBody::default()
            } else {
                parse_body(body)?
            };
            let id = query
                .get("id")
                .cloned()
                .filter(|id| !id.is_empty())
                .unwrap_or(from_body.id);
            if id.is_empty() {
                return Err(CompError::BadRequest("Missing composition id".to_string()));
            }
            // The admin password is only ever read from the body
            service.delete(&id, from_body.password.as_deref())?;
            Ok(ApiResponse::json(200, json!({ "success": true })))
        }
        (Method::Post, ["api", "composition", "verify"]) => {
            let req: PasswordBody = parse_body(body)?;
            let ok = service.verify_edit(&req.id, req.password.as_deref().unwrap_or(""))?;
            Ok(verify_response(ok))
        }
        (Method::Post, ["api", "composition", "verify-viewer"]) => {
            let req: PasswordBody = parse_body(body)?;
            let ok = service.verify_viewer(&req.id, req.password.as_deref().unwrap_or(""))?;
            Ok(verify_response(ok))
        }
        (Method::Get, ["api", "composition", id]) => {
            let view = service.get(id, query.get("viewer").map(String::as_str))?;
            Ok(ApiResponse::json(200, json!({ "success": true, "data": view })))
        }
        (Method::Get, ["api", "composition", id, "discord"]) => {
            let text = service.discord_template(
                id,
                query.get("viewer").map(String::as_str),
                &config.public_url,
            )?;
            Ok(ApiResponse::text(200, text))
        }
        _ => {
            debug!("No route for {} {}", method, parsed.path());
            Ok(ApiResponse::json(
                404,
                json!({ "success": false, "message": "Not found" }),
            ))
        }
    }
}

/// Request target without its query string, safe to log
pub fn log_path(raw_url: &str) -> &str {
    raw_url.split('?').next().unwrap_or(raw_url)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, CompError> {
    serde_json::from_str(body)
        .map_err(|e| CompError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn parse_category(raw: Option<&String>) -> Result<Option<ItemCategory>, CompError> {
    match raw.map(String::as_str).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(name) => ItemCategory::parse(name)
            .map(Some)
            .ok_or_else(|| CompError::BadRequest(format!("Unknown category '{}'", name))),
    }
}

fn parse_number(
    query: &HashMap<String, String>,
    key: &str,
    default: u32,
) -> Result<u32, CompError> {
    match query.get(key).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| CompError::BadRequest(format!("Invalid {} '{}'", key, v))),
    }
}

fn verify_response(ok: bool) -> ApiResponse {
    if ok {
        ApiResponse::json(200, json!({ "success": true }))
    } else {
        ApiResponse::json(
            401,
            json!({ "success": false, "message": "Invalid password" }),
        )
    }
}

fn error_response(err: CompError) -> ApiResponse {
    let message = err.to_string();
    match err {
        CompError::Validation(fields) => ApiResponse::json(
            400,
            json!({ "success": false, "message": message, "fields": fields }),
        ),
        CompError::BadRequest(_) => {
            ApiResponse::json(400, json!({ "success": false, "message": message }))
        }
        CompError::WrongPassword => {
            ApiResponse::json(401, json!({ "success": false, "message": message }))
        }
        CompError::ViewLocked { title } => ApiResponse::json(
            403,
            json!({ "success": false, "locked": true, "title": title, "message": message }),
        ),
        CompError::NotFound(_) => {
            ApiResponse::json(404, json!({ "success": false, "message": message }))
        }
        CompError::Storage(detail) => {
            error!("Storage failure: {}", detail);
            ApiResponse::json(
                500,
                json!({ "success": false, "message": "Internal storage error" }),
            )
        }
    }
}
