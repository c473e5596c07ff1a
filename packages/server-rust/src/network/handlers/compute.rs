//! `GET /` handler: parses the query, runs the pipeline, renders the result.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use heavylift_core::{PipelineRequest, PipelineResult};
use serde::Deserialize;
use tower::ServiceExt;
use tracing::{debug, warn};

use super::AppState;
use crate::service::ServiceError;

/// Raw query parameters. Values are kept as strings so parse failures can
/// name the offending parameter instead of producing a generic rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ComputeParams {
    /// Exclusive upper limit for the prime search.
    #[serde(rename = "in")]
    pub bound: Option<String>,
    /// Seconds to pause between the prime search and the approximation.
    pub nap: Option<String>,
    /// Highest series index; `processes + 1` terms are summed.
    pub processes: Option<String>,
    /// `json` selects a JSON body; anything else renders HTML.
    pub format: Option<String>,
}

/// Query-string problems detected before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("missing query parameter `{param}`")]
    Missing { param: &'static str },
    #[error("missing query parameter `nap`: can't live without my nap")]
    MissingNap,
    #[error("query parameter `{param}` is not an integer: {value:?}")]
    Unparseable { param: &'static str, value: String },
}

/// Converts the raw parameters into a request. Range checks are left to the stages.
pub fn parse_request(params: &ComputeParams) -> Result<PipelineRequest, QueryError> {
    let bound = parse_param("in", params.bound.as_deref())?;
    let delay_secs = match params.nap.as_deref() {
        None | Some("") => return Err(QueryError::MissingNap),
        Some(raw) => parse_param("nap", Some(raw))?,
    };
    let term_count = parse_param("processes", params.processes.as_deref())?;
    Ok(PipelineRequest::new(bound, delay_secs, term_count))
}

fn parse_param(param: &'static str, raw: Option<&str>) -> Result<i64, QueryError> {
    let raw = match raw {
        None | Some("") => return Err(QueryError::Missing { param }),
        Some(raw) => raw,
    };
    raw.trim().parse().map_err(|_| QueryError::Unparseable {
        param,
        value: raw.to_string(),
    })
}

/// Runs one pipeline per request and renders it as HTML (or JSON with `format=json`).
pub async fn compute_handler(
    State(state): State<AppState>,
    Query(params): Query<ComputeParams>,
) -> Response {
    let json = params.format.as_deref() == Some("json");

    let request = match parse_request(&params) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "rejected query");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string(), json);
        }
    };

    let _guard = state.shutdown.in_flight_guard();
    match state.pipeline.clone().oneshot(request).await {
        Ok(result) if json => Json(result).into_response(),
        Ok(result) => Html(render_page(&state.config.colour, &request, &result)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                warn!(error = %e, "pipeline failed");
            }
            error_response(status, &e.to_string(), json)
        }
    }
}

fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Pipeline(failure) if failure.error.is_validation() => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(status: StatusCode, message: &str, json: bool) -> Response {
    if json {
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    } else {
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("ERROR: {message}"),
        )
            .into_response()
    }
}

fn render_page(colour: &str, request: &PipelineRequest, result: &PipelineResult) -> String {
    format!(
        "<html><body>\
         <p><font color=\"{colour}\"><h1>heavylift</h1></font></p>\
         <p>The largest prime below {bound} is {prime}<br>\
         <p>Napped for {nap} seconds<br>\
         <p>Approximated pi as {pi:.6} using {terms} terms<br><br></p>\
         </body></html>",
        colour = escape_html(colour),
        bound = request.bound,
        prime = result.largest_prime,
        nap = result.delay_secs,
        pi = result.approximation,
        terms = request.term_count,
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use heavylift_core::{PipelineError, PipelineFailure, Stage};

    use super::*;
    use crate::network::handlers::test_support::test_state;
    use crate::network::NetworkConfig;

    fn params(bound: Option<&str>, nap: Option<&str>, processes: Option<&str>) -> ComputeParams {
        ComputeParams {
            bound: bound.map(str::to_string),
            nap: nap.map(str::to_string),
            processes: processes.map(str::to_string),
            format: None,
        }
    }

    async fn get_body(state: AppState, uri: &str) -> (StatusCode, String) {
        let app = Router::new().route("/", get(compute_handler)).with_state(state);
        let response = app
            .oneshot(Request::get(uri).body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn parses_all_three_parameters() {
        let request = parse_request(&params(Some("100"), Some("1"), Some(" 10 "))).unwrap();
        assert_eq!(request, PipelineRequest::new(100, 1, 10));
    }

    #[test]
    fn negative_values_parse_and_are_left_to_the_stages() {
        let request = parse_request(&params(Some("-5"), Some("-1"), Some("-2"))).unwrap();
        assert_eq!(request, PipelineRequest::new(-5, -1, -2));
    }

    #[test]
    fn missing_parameters_are_named() {
        assert_eq!(
            parse_request(&params(None, Some("1"), Some("1"))),
            Err(QueryError::Missing { param: "in" })
        );
        assert_eq!(
            parse_request(&params(Some("10"), None, Some("1"))),
            Err(QueryError::MissingNap)
        );
        assert_eq!(
            parse_request(&params(Some("10"), Some(""), Some("1"))),
            Err(QueryError::MissingNap)
        );
        assert_eq!(
            parse_request(&params(Some("10"), Some("1"), None)),
            Err(QueryError::Missing { param: "processes" })
        );
    }

    #[test]
    fn unparseable_parameter_is_named() {
        let err = parse_request(&params(Some("ten"), Some("1"), Some("1"))).unwrap_err();
        assert_eq!(
            err,
            QueryError::Unparseable {
                param: "in",
                value: "ten".to_string()
            }
        );
        assert!(err.to_string().contains("`in`"));
    }

    #[test]
    fn error_statuses() {
        let rejected = ServiceError::Pipeline(PipelineFailure::new(
            Stage::PrimeSearch,
            PipelineError::invalid_bound("too small"),
        ));
        let failed = ServiceError::Pipeline(PipelineFailure::new(
            Stage::Aggregating,
            PipelineError::task_failure("panicked"),
        ));
        assert_eq!(status_for(&rejected), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&failed), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&ServiceError::Overloaded), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn escapes_markup_in_colour() {
        assert_eq!(escape_html("<b>\"red\"&'x'"), "&lt;b&gt;&quot;red&quot;&amp;&#39;x&#39;");
    }

    #[tokio::test]
    async fn renders_html_page() {
        let (status, body) = get_body(test_state(), "/?in=100&nap=0&processes=10").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("color=\"blue\""));
        assert!(body.contains("The largest prime below 100 is 97"));
        assert!(body.contains("Napped for 0 seconds"));
        assert!(body.contains("using 10 terms"));
        assert!(body.contains("Approximated pi as 3.2"));
    }

    #[tokio::test]
    async fn uses_configured_colour() {
        let mut state = test_state();
        state.config = Arc::new(NetworkConfig {
            colour: "green".to_string(),
            ..NetworkConfig::default()
        });
        let (_, body) = get_body(state, "/?in=10&nap=0&processes=0").await;
        assert!(body.contains("color=\"green\""));
        assert!(body.contains("Approximated pi as 4.000000 using 0 terms"));
    }

    #[tokio::test]
    async fn renders_json_when_asked() {
        let (status, body) = get_body(test_state(), "/?in=100&nap=0&processes=0&format=json").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["largest_prime"], 97);
        assert_eq!(value["delay_secs"], 0);
        assert_eq!(value["approximation"], 4.0);
    }

    #[tokio::test]
    async fn missing_nap_is_a_bad_request() {
        let (status, body) = get_body(test_state(), "/?in=100&processes=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("nap"));
    }

    #[tokio::test]
    async fn stage_validation_failure_is_a_bad_request() {
        let (status, body) = get_body(test_state(), "/?in=2&nap=0&processes=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid bound"));

        let (status, body) = get_body(test_state(), "/?in=100&nap=11&processes=10").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid duration"));
    }

    #[tokio::test]
    async fn json_errors_carry_the_message() {
        let (status, body) =
            get_body(test_state(), "/?in=100&nap=0&processes=-1&format=json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["error"].as_str().unwrap().contains("invalid term count"));
    }

    #[tokio::test]
    async fn in_flight_count_returns_to_zero() {
        let state = test_state();
        let shutdown = Arc::clone(&state.shutdown);
        let _ = get_body(state, "/?in=100&nap=0&processes=1").await;
        assert_eq!(shutdown.in_flight_count(), 0);
    }
}
