//! HTTP handlers: shop page, health check, and routing fallbacks.
//! Purchase and checkout flows live in the submodules.

pub mod payments;
pub mod purchase;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, http::StatusCode, response::Html, response::IntoResponse, Json};
use serde_json::json;

use crate::catalog::format_amount;
use crate::error::AppError;
use crate::AppState;

/// Map a JSON extractor rejection to this service's 400 contract.
pub(crate) fn invalid_json(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::Validation("Content-Type must be application/json".to_string())
        }
        other => AppError::Validation(format!("Invalid JSON payload: {}", other)),
    }
}

/// Render the main shop page.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mut rows = String::new();
    for (name, product) in state.catalog.iter() {
        rows.push_str(&format!(
            r#"        <li style="margin-bottom: 16px;"><strong>{}</strong> — ${}<br><small>{}</small></li>
"#,
            name,
            format_amount(product.price),
            product.description
        ));
    }

    Html(format!(
        r#"<html>
<head><title>The Scrap Shop</title></head>
<body style="font-family: Arial, sans-serif; padding: 50px; background: #1a1a1a; color: white;">
    <h1>The Scrap Shop</h1>
    <ul style="list-style: none; padding: 0;">
{}    </ul>
</body>
</html>
"#,
        rows
    ))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "The Scrap Shop is running"
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": "The requested endpoint does not exist"
        })),
    )
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method not allowed",
            "message": "The HTTP method is not allowed for this endpoint"
        })),
    )
}
