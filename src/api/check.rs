//! Statement checking endpoint

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};

use crate::api::error::ApiError;
use crate::model::{Answer, QuestionAnswer, Verdict, VerdictLabel};
use crate::service::FactCheckService;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckRequest {
    /// The statement to fact-check
    pub statement: String,
    /// Use the local in-process model instead of the remote API
    #[serde(default)]
    pub use_local: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(check_statement),
    components(schemas(CheckRequest, Verdict, VerdictLabel, QuestionAnswer, Answer)),
    tags((name = "check", description = "Statement fact-checking"))
)]
pub struct ApiDoc;

/// Check the factual accuracy of a statement
#[utoipa::path(
    post,
    path = "/api/v1/check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Verdict with the full answer trace", body = Verdict),
        (status = 400, description = "Invalid request")
    ),
    tag = "check"
)]
#[post("/api/v1/check")]
pub async fn check_statement(
    service: web::Data<FactCheckService>,
    request: web::Json<CheckRequest>,
) -> Result<HttpResponse, ApiError> {
    let statement = request.statement.trim();
    if statement.is_empty() {
        return Err(ApiError::BadRequest(
            "statement must not be empty".to_string(),
        ));
    }

    let verdict = service.check_statement(statement, request.use_local).await;

    Ok(HttpResponse::Ok().json(verdict))
}

/// Configure check routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(check_statement);
}
