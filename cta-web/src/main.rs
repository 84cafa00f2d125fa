//! Servidor web Axum com WebSocket para a análise de manuscritos cuneiformes

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cta_core::{
    compare::{compare_sign_usage, RankBy},
    corpus::demo_manuscripts,
    signs::line_length_stats,
    words::word_table,
    AnalysisConfig, CtaPipeline, Manuscript, OraccOptions, PipelineEvent,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const NO_SYNTAX_ERRORS: &str =
    "None syntax errors encountered in this manuscript during the sign analysis";
const TOP_OVERLAP: usize = 10;

/// Estado compartilhado da aplicação: opções padrão das análises
struct AppState {
    pipeline: CtaPipeline,
}

/// Corpo das rotas de análise: o manuscrito já extraído e, opcionalmente, as opções
#[derive(Deserialize)]
struct AnalyzeRequest {
    manuscript: Manuscript,
    #[serde(default)]
    config: Option<AnalysisConfig>,
    #[serde(default)]
    oracc: Option<OraccOptions>,
}

impl AnalyzeRequest {
    /// Pipeline com as opções da requisição, ou as do servidor quando ausentes
    fn pipeline(&self, defaults: &CtaPipeline) -> CtaPipeline {
        CtaPipeline::with_options(
            self.config.clone().unwrap_or_else(|| defaults.config.clone()),
            self.oracc.clone().unwrap_or_else(|| defaults.oracc.clone()),
        )
    }
}

#[derive(Deserialize)]
struct CompareRequest {
    first: Manuscript,
    second: Manuscript,
}

/// Visualização HTML do documento ATF
#[derive(Template)]
#[template(
    source = r#"<p class="oracc-output">{% for line in lines %}{{ line }}{% if !loop.last %}<br>{% endif %}{% endfor %}</p>"#,
    ext = "html"
)]
struct OraccHtml<'a> {
    lines: Vec<&'a str>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = Arc::new(AppState {
        pipeline: CtaPipeline::new(),
    });

    let addr = std::env::var("CTA_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Servidor CTA iniciado em http://{addr}");
    axum::serve(listener, app(state)).await
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/demo", get(demo_handler))
        .route("/analyze", post(analyze_handler))
        .route("/analyze/signs", post(signs_handler))
        .route("/analyze/words", post(words_handler))
        .route("/analyze/glossary", post(glossary_handler))
        .route("/analyze/oracc", post(oracc_handler))
        .route("/compare", post(compare_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Retorna os manuscritos de demonstração
async fn demo_handler() -> impl IntoResponse {
    let manuscripts: Vec<serde_json::Value> = demo_manuscripts()
        .into_iter()
        .map(|(name, manuscript)| json!({ "name": name, "manuscript": manuscript }))
        .collect();
    Json(manuscripts)
}

/// Todas as análises de uma vez
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    info!("Análise completa: {} seções", req.manuscript.sections.len());
    let report = req.pipeline(&state.pipeline).analyze(&req.manuscript);
    let syntax_errors = report.signs.errors.clone();
    Json(json!({
        "success": true,
        "analysis": report,
        "syntax_errors": syntax_errors,
    }))
}

async fn signs_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    info!("Análise de sinais: {} seções", req.manuscript.sections.len());
    let analysis = req.pipeline(&state.pipeline).analyse_signs(&req.manuscript);
    let syntax_errors = if analysis.errors.is_empty() {
        json!(NO_SYNTAX_ERRORS)
    } else {
        json!(analysis.errors)
    };
    Json(json!({
        "success": true,
        "analysis": analysis.signs,
        "line_lengths": line_length_stats(&req.manuscript),
        "syntax_errors": syntax_errors,
    }))
}

async fn words_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    info!("Análise de palavras: {} seções", req.manuscript.sections.len());
    let analysis = req.pipeline(&state.pipeline).analyse_words(&req.manuscript);
    Json(json!({
        "success": true,
        "analysis": word_table(&analysis),
        "syntax_errors": "None",
    }))
}

async fn glossary_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    info!("Glossário: {} seções", req.manuscript.sections.len());
    let glossary = req.pipeline(&state.pipeline).build_glossary(&req.manuscript);
    Json(json!({
        "success": true,
        "analysis": glossary,
        "syntax_errors": "None",
    }))
}

async fn oracc_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    info!("Exportação ORACC: {} seções", req.manuscript.sections.len());
    let export = req.pipeline(&state.pipeline).export_oracc(&req.manuscript);

    let html = OraccHtml {
        lines: export.document.lines().collect(),
    };
    let as_html_data = match html.render() {
        Ok(rendered) => rendered,
        Err(err) => {
            error!("Falha ao renderizar o ATF: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };

    Json(json!({
        "success": true,
        "analysis": export.document,
        "as_html_data": as_html_data,
        "syntax_errors": export.errors,
    }))
    .into_response()
}

/// Compara o uso de sinais de dois manuscritos
async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> impl IntoResponse {
    let first = state.pipeline.analyse_signs(&req.first);
    let second = state.pipeline.analyse_signs(&req.second);
    let result = compare_sign_usage(&first.signs, &second.signs);
    info!(
        "Comparação: {} sinais em comum, {}/{} exclusivos",
        result.overlap.len(),
        result.unique_a.len(),
        result.unique_b.len()
    );

    Json(json!({
        "success": true,
        "top_by_first": result.top_overlap(RankBy::First, TOP_OVERLAP),
        "top_by_second": result.top_overlap(RankBy::Second, TOP_OVERLAP),
        "analysis": result,
    }))
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe uma requisição de análise e envia os eventos do pipeline
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req = match serde_json::from_str::<AnalyzeRequest>(&text) {
                    Ok(req) => req,
                    Err(err) => {
                        let reply = json!({ "type": "Error", "data": { "message": err.to_string() } });
                        if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };

                info!("Analisando via WebSocket: {} seções", req.manuscript.sections.len());

                // O pipeline é síncrono: roda fora do runtime
                let pipeline = req.pipeline(&state.pipeline);
                let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
                let handle = tokio::task::spawn_blocking(move || {
                    pipeline.analyze_streaming(&req.manuscript, tx);
                });
                if let Err(err) = handle.await {
                    error!("Pipeline interrompido: {err}");
                    return;
                }

                let events: Vec<PipelineEvent> = rx.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            return; // cliente desconectou
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use cta_core::corpus::{demo_manuscript, demo_variant};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(Arc::new(AppState {
            pipeline: CtaPipeline::new(),
        }))
    }

    async fn post_json(uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_demo_manuscripts() {
        let response = test_app()
            .oneshot(Request::builder().uri("/demo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let demos: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(demos.as_array().map(Vec::len), Some(2));
        assert_eq!(demos[0]["name"], "A");
    }

    #[tokio::test]
    async fn test_signs_without_errors() {
        let (status, body) = post_json("/analyze/signs", json!({ "manuscript": demo_manuscript() })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["syntax_errors"], NO_SYNTAX_ERRORS);
        assert_eq!(body["analysis"]["liš"]["preserved"], 2);
    }

    #[tokio::test]
    async fn test_signs_with_syntax_errors() {
        let manuscript = json!({
            "obv. i": { "cuneiform_data": { "A obv. i 1": [{ "text": "a,na", "type": "syllabic" }] } }
        });
        let (status, body) = post_json("/analyze/signs", json!({ "manuscript": manuscript })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["syntax_errors"][0]["char"], ",");
        assert_eq!(body["syntax_errors"][0]["line_id"], "A obv. i 1");
    }

    #[tokio::test]
    async fn test_words_table() {
        let (status, body) = post_json("/analyze/words", json!({ "manuscript": demo_manuscript() })).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["analysis"].as_array().unwrap();
        assert!(rows.iter().any(|row| row["form"] == "ti-amat" && row["reconstructed"] == 1));
    }

    #[tokio::test]
    async fn test_glossary() {
        let (status, body) = post_json("/analyze/glossary", json!({ "manuscript": demo_manuscript() })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["e-liš"]["attestation"], "A obv. i 1");
    }

    #[tokio::test]
    async fn test_oracc_export_and_html() {
        let (status, body) = post_json("/analyze/oracc", json!({ "manuscript": demo_manuscript() })).await;
        assert_eq!(status, StatusCode::OK);

        let document = body["analysis"].as_str().unwrap();
        assert!(document.starts_with("&X000001 = Composition"));

        let html = body["as_html_data"].as_str().unwrap();
        assert!(html.starts_with(r#"<p class="oracc-output">"#));
        assert!(html.contains("<br>"));
        assert!(!html.contains("<i>"));
        assert!(body["syntax_errors"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_options_override_defaults() {
        let manuscript = json!({
            "tablet": {
                "cuneiform_data": { "A": [{ "text": "a-na", "type": "syllabic" }] },
                "translation_data": { "A": "to" }
            }
        });
        let oracc = json!({ "rec_vers": false, "cols": false, "lines": false, "title": "Test" });
        let (status, body) = post_json("/analyze", json!({ "manuscript": manuscript, "oracc": oracc })).await;
        assert_eq!(status, StatusCode::OK);
        let document = body["analysis"]["oracc"]["document"].as_str().unwrap();
        assert!(document.starts_with("&X000001 = Test"));
        assert!(document.contains("1. a-na"));
        assert!(body["analysis"]["oracc"]["errors"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_manuscript_is_rejected() {
        let (status, _) = post_json("/analyze/signs", json!({})).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_compare() {
        let body = json!({ "first": demo_manuscript(), "second": demo_variant() });
        let (status, body) = post_json("/compare", body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["analysis"]["overlap"].get("nu").is_some());
        assert!(body["top_by_first"].as_array().unwrap().len() <= TOP_OVERLAP);
    }
}
