use crate::config::ServerSettings;
use crate::core::answer::AnswerEngine;
use crate::utils::error::RagError;
use actix_web::dev::Server;
use actix_web::{web, App, HttpResponse, HttpServer};
use serde::Deserialize;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Deserialize)]
struct BotRequest {
    query: Option<String>,
}

/// Registers `POST /api/bot` and `GET /health`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::resource("/api/bot")
            .route(web::post().to(bot))
            .default_service(web::to(method_not_allowed)),
    );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .content_type(TEXT_PLAIN)
        .body("Method Not Allowed")
}

fn bad_request() -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type(TEXT_PLAIN)
        .body("Bad request")
}

async fn bot(
    body: web::Bytes,
    engine: web::Data<AnswerEngine>,
) -> Result<HttpResponse, RagError> {
    let query = match serde_json::from_slice::<BotRequest>(&body) {
        Ok(BotRequest { query: Some(query) }) if !query.trim().is_empty() => query,
        Ok(_) => return Ok(bad_request()),
        Err(e) => {
            tracing::debug!("Rejecting unparsable body: {}", e);
            return Ok(bad_request());
        }
    };

    tracing::info!("💬 Question received ({} chars)", query.len());

    let answer = engine.answer_stream(&query).await.map_err(|e| {
        tracing::error!("❌ Could not start answer: {} ({:?})", e, e.category());
        e
    })?;

    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).streaming(answer))
}

/// Binds the listener and returns the running server.
pub fn run(engine: AnswerEngine, settings: &ServerSettings) -> std::io::Result<Server> {
    let engine = web::Data::new(engine);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .configure(configure)
    })
    .bind((settings.host.as_str(), settings.port))?;

    if let Some(workers) = settings.workers {
        server = server.workers(workers);
    }

    tracing::info!("🌐 Listening on http://{}:{}", settings.host, settings.port);
    Ok(server.run())
}
