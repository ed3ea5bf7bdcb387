use crate::server::api;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn to_http_string(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_code,
            self.status_text,
            self.content_type,
            self.body.len(),
            self.body
        )
    }

    fn ok_json(body: String) -> Self {
        Self {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body,
        }
    }
}

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    match (method, path) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/plain; charset=utf-8",
            body: usage_text(),
        },
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => HttpResponse::ok_json(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("GET", "/api/participants") => match api::participants_payload() {
            Ok(payload) => HttpResponse::ok_json(payload),
            Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
        },
        ("POST", "/api/plan") => match api::plan_payload(body) {
            Ok(payload) => HttpResponse::ok_json(payload),
            Err(api::PlanPayloadError::Parse(err)) => {
                error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
            }
            Err(api::PlanPayloadError::Validation(payload)) => HttpResponse {
                status_code: 400,
                status_text: "Bad Request",
                content_type: "application/json",
                body: payload,
            },
            Err(api::PlanPayloadError::Plan(err)) => {
                error_response(400, "Bad Request", &err.to_string())
            }
        },
        (method, path) if method == "GET" && path.starts_with("/api/share/") => {
            match api::share_payload(path) {
                Some(payload) => HttpResponse::ok_json(payload),
                None => error_response(404, "Not Found", "no saved plan contains that group"),
            }
        }
        _ => error_response(404, "Not Found", "unknown route"),
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    let body = serde_json::json!({
        "status": "error",
        "message": message,
    });
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: body.to_string(),
    }
}

fn usage_text() -> String {
    [
        "barhop api",
        "",
        "GET  /api/health",
        "GET  /api/participants",
        "POST /api/plan",
        "GET  /api/share/<group-id>",
        "",
    ]
    .join("\n")
}
