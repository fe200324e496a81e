use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use quote_engine::volume::{CbmEstimate, CbmRequest};
use quote_engine::{
    state, summary, Composer, CustomerRequest, Edit, OrderId, OrderRepository, OrderState, OutboundMessage,
    Quote, QuoteSession, Settlement, ShipmentMetrics,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::ApiError;
use crate::gallery::gallery;
use crate::store::FileRepository;
use crate::upload::{upload, ImageStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub images: ImageStore,
    pub orders: Arc<dyn OrderRepository>,
    pub composer: Arc<Composer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let orders: Arc<dyn OrderRepository> = Arc::new(FileRepository::new(&config.state_dir));
        Self::with_repository(config, orders)
    }

    pub fn with_repository(config: Config, orders: Arc<dyn OrderRepository>) -> Self {
        AppState {
            images: ImageStore::new(&config.upload_dir),
            composer: Arc::new(Composer::new(config.shop_name.clone(), &config.base_url)),
            config: Arc::new(config),
            orders,
        }
    }

    fn session(&self, id: OrderId) -> Result<QuoteSession<'_, dyn OrderRepository>, ApiError> {
        let images = self.images.image_urls(&id)?;
        Ok(QuoteSession::open(self.orders.as_ref(), id, images.as_deref())?)
    }
}

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.images.root());
    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/u/:id", get(gallery))
        .route("/orders/:id", get(get_order).put(put_order))
        .route("/orders/:id/edits", post(post_edit))
        .route("/orders/:id/summary", get(quote_summary))
        .route("/orders/:id/shipment/summary", get(shipment_summary))
        .route("/orders/:id/messages/:kind", post(post_message))
        .route("/requests", post(post_request))
        .route("/cbm", post(cbm))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub state: OrderState,
    pub quote: Quote,
    pub payment_delta: i64,
    pub settlement: Settlement,
    pub shipment: ShipmentMetrics,
}

impl OrderView {
    fn of(id: &OrderId, st: &OrderState) -> Self {
        let quote = Quote::for_order(st);
        let delta = quote.payment_delta(st.payment.amount_received);
        OrderView {
            id: id.to_string(),
            state: st.clone(),
            payment_delta: delta,
            settlement: Settlement::from_delta(delta),
            shipment: ShipmentMetrics::of(&st.shipment),
            quote,
        }
    }
}

async fn get_order(State(app): State<AppState>, Path(id): Path<String>) -> Result<Json<OrderView>, ApiError> {
    let session = app.session(OrderId::parse(&id)?)?;
    Ok(Json(OrderView::of(session.id(), session.state())))
}

/// Full overwrite; the body goes through strict decoding first.
async fn put_order(State(app): State<AppState>, Path(id): Path<String>, body: String) -> Result<Json<OrderView>, ApiError> {
    let id = OrderId::parse(&id)?;
    let incoming = state::decode(&body)?;
    let session = QuoteSession::overwrite(app.orders.as_ref(), id, incoming)?;
    info!(target = "shopper", id = %session.id(), items = session.state().items.len(), "order replaced");
    Ok(Json(OrderView::of(session.id(), session.state())))
}

async fn post_edit(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(edit): Json<Edit>,
) -> Result<Json<OrderView>, ApiError> {
    let mut session = app.session(OrderId::parse(&id)?)?;
    session.apply(edit)?;
    Ok(Json(OrderView::of(session.id(), session.state())))
}

async fn quote_summary(State(app): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let session = app.session(OrderId::parse(&id)?)?;
    let text = summary::quote_text(&session.quote());
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

async fn shipment_summary(State(app): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let session = app.session(OrderId::parse(&id)?)?;
    let text = summary::shipment_text(session.id().as_str(), &session.state().shipment);
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MessageKind {
    Quote,
    Reminder,
    Transport,
}

async fn post_message(
    State(app): State<AppState>,
    Path((id, kind)): Path<(String, MessageKind)>,
) -> Result<Json<OutboundMessage>, ApiError> {
    let session = app.session(OrderId::parse(&id)?)?;
    let (id, st) = (session.id().as_str(), session.state());
    let msg = match kind {
        MessageKind::Quote => app.composer.quote(id, st)?,
        MessageKind::Reminder => app.composer.payment_reminder(st)?,
        MessageKind::Transport => app.composer.transport_update(id, st)?,
    };
    Ok(Json(msg))
}

async fn post_request(State(app): State<AppState>, Json(req): Json<CustomerRequest>) -> Result<Json<OutboundMessage>, ApiError> {
    let id = OrderId::parse(&req.gallery_id)?;
    if app.images.list(&id)?.is_none() {
        return Err(ApiError::NotFound(format!("no upload folder for {}", id)));
    }
    Ok(Json(app.composer.customer_request(&app.config.shop_phone, &req)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CbmResponse {
    estimate: CbmEstimate,
    summary: String,
}

async fn cbm(Json(req): Json<CbmRequest>) -> Json<CbmResponse> {
    let estimate = CbmEstimate::compute(&req);
    Json(CbmResponse { summary: summary::cbm_text(&estimate), estimate })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use quote_engine::{InMemoryRepository, Status};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "XshopperBoundaryX";

    fn app_in(dir: &std::path::Path) -> (Router, AppState) {
        let state = AppState::with_repository(Config::rooted_at(dir), Arc::new(InMemoryRepository::new()));
        (router(state.clone()), state)
    }

    fn multipart(files: &[(&str, &str, Vec<u8>)]) -> Body {
        let mut body = Vec::new();
        for (name, ct, bytes) in files {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\n", name).as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", ct).as_bytes());
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Body::from(body)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
        (status, value)
    }

    fn upload_req(files: &[(&str, &str, Vec<u8>)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(multipart(files))
            .unwrap()
    }

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn uploaded(app: &Router) -> String {
        let (status, body) = send(
            app,
            upload_req(&[
                ("shoe.jpg", "image/jpeg", vec![1; 64]),
                ("IMG_2.HEIC", "", vec![2; 64]),
                ("notes.txt", "text/plain", vec![3; 8]),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let (status, body) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_and_gallery() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let (status, body) = send(
            &app,
            upload_req(&[
                ("shoe.jpg", "image/jpeg", vec![1; 64]),
                ("IMG_2.HEIC", "", vec![2; 64]),
                ("notes.txt", "text/plain", vec![3; 8]),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["savedCount"], 2);
        assert_eq!(body["receivedCount"], 3);
        assert_eq!(body["skipped"], json!(["notes.txt"]));
        let id = body["id"].as_str().unwrap();
        assert_eq!(body["galleryPath"], format!("/u/{}", id));

        let (status, gallery) = send(&app, get_req(&format!("/u/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(gallery["count"], 2);
        let first = gallery["images"][0].as_str().unwrap().to_string();

        let resp = app.clone().oneshot(get_req(&first)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oversized_image_aborts_batch_without_writes() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_in(dir.path());
        let (status, body) = send(
            &app,
            upload_req(&[
                ("a.jpg", "image/jpeg", vec![1; 1024]),
                ("b.png", "image/png", vec![2; 1024]),
                ("c.jpg", "image/jpeg", vec![3; 12 * 1024 * 1024 + 1]),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].as_str().unwrap().contains("12 MB"));
        let leftovers = std::fs::read_dir(state.images.root()).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_upload_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let (status, body) = send(&app, upload_req(&[])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no images received");

        let (status, body) = send(&app, upload_req(&[("report.pdf", "application/pdf", vec![0; 10])])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["skipped"], json!(["report.pdf"]));
    }

    #[tokio::test]
    async fn test_unknown_gallery_and_bad_id() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let (status, _) = send(&app, get_req("/u/0123456789abcdef")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get_req("/u/..%2F..%2Fetc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_order_flow() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let id = uploaded(&app).await;

        let (status, view) = send(&app, get_req(&format!("/orders/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(view["quote"]["total"], 0);

        let edits = [
            json!({"type": "set_foreign_price", "index": 0, "value": "500"}),
            json!({"type": "set_quantity", "index": 0, "value": 2}),
            json!({"type": "set_local_price", "index": 1, "value": 5000}),
            json!({"type": "set_shipping", "value": "2500"}),
            json!({"type": "set_status", "status": "PAID"}),
            json!({"type": "set_amount_received", "value": 125000}),
        ];
        let mut last = Value::Null;
        for e in edits {
            let (status, view) = send(&app, json_req("POST", &format!("/orders/{}/edits", id), e)).await;
            assert_eq!(status, StatusCode::OK, "{}", view);
            last = view;
        }
        // 50 000 x2 + 5 000 = 105 000 -> 10% tier
        assert_eq!(last["quote"]["subtotal"], 105_000);
        assert_eq!(last["quote"]["commission"], 10_500);
        assert_eq!(last["quote"]["total"], 118_000);
        assert_eq!(last["paymentDelta"], 7_000);
        assert_eq!(last["settlement"], "overpaid");
        assert_eq!(last["state"]["status"], "PAID");

        let resp = app.clone().oneshot(get_req(&format!("/orders/{}/summary", id))).await.unwrap();
        let text = String::from_utf8(to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
        assert!(text.starts_with("Item 1: 50 000 FCFA (500 ¥) x2 = 100 000 FCFA\n"));
        assert!(text.ends_with("TOTAL: 118 000 FCFA"));
    }

    #[tokio::test]
    async fn test_huge_prices_keep_order_readable() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let id = uploaded(&app).await;
        for e in [
            json!({"type": "set_foreign_price", "index": 0, "value": "1e17"}),
            json!({"type": "set_quantity", "index": 0, "value": 999}),
            json!({"type": "set_shipping", "value": "1e19"}),
        ] {
            let (status, _) = send(&app, json_req("POST", &format!("/orders/{}/edits", id), e)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, view) = send(&app, get_req(&format!("/orders/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["quote"]["total"], i64::MAX);
        assert_eq!(view["settlement"], "outstanding");
        let resp = app.clone().oneshot(get_req(&format!("/orders/{}/summary", id))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_edit_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let id = uploaded(&app).await;
        let (status, _) = send(
            &app,
            json_req("POST", &format!("/orders/{}/edits", id), json!({"type": "set_note", "index": 9, "value": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_rejects_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let id = "00000000000000aa";
        let (status, body) = send(&app, json_req("PUT", &format!("/orders/{}", id), json!({"items": [{"quantity": "many"}]}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("items[0].quantity"));

        let (status, view) = send(
            &app,
            json_req("PUT", &format!("/orders/{}", id), json!({"rate": 90, "client": {"name": "Awa", "phone": "0102030405"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"]["client"]["name"], "Awa");

        let (_, view) = send(&app, get_req(&format!("/orders/{}", id))).await;
        assert_eq!(view["state"]["rate"], 90.0);
    }

    #[tokio::test]
    async fn test_messages() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_in(dir.path());
        let id = uploaded(&app).await;

        let (status, body) = send(&app, json_req("POST", &format!("/orders/{}/messages/quote", id), json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("WhatsApp number"));

        let oid = OrderId::parse(&id).unwrap();
        let mut st = state.orders.load(&oid).unwrap().unwrap_or_default();
        st.client.phone = "+225 07 88 65 53 41".into();
        st.status = Status::Shipped;
        state.orders.save(&oid, &st).unwrap();

        for kind in ["quote", "reminder", "transport"] {
            let (status, body) = send(&app, json_req("POST", &format!("/orders/{}/messages/{}", id, kind), json!({}))).await;
            assert_eq!(status, StatusCode::OK, "{}: {}", kind, body);
            assert_eq!(body["phone"], "2250788655341");
        }
        let (_, body) = send(&app, json_req("POST", &format!("/orders/{}/messages/quote", id), json!({}))).await;
        let text = body["text"].as_str().unwrap();
        assert!(text.contains(&format!("\nhttps://shop.example/quotes/{}\n", id)));
        assert!(text.contains("Status: 🚚 Shipped"));
    }

    #[tokio::test]
    async fn test_customer_request() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let id = uploaded(&app).await;
        let (status, body) = send(
            &app,
            json_req("POST", "/requests", json!({"name": "Koffi", "phone": "0102030405", "city": "Abidjan", "galleryId": id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phone"], "2250788655341");
        assert!(body["text"].as_str().unwrap().contains(&format!("https://shop.example/u/{}", id)));

        let (status, _) = send(
            &app,
            json_req("POST", "/requests", json!({"name": "", "phone": "1", "city": "Abidjan", "galleryId": id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cbm_calculator() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_in(dir.path());
        let (status, body) = send(
            &app,
            json_req(
                "POST",
                "/cbm",
                json!({"dimensions": {"lengthCm": 50, "widthCm": 40, "heightCm": 30}, "quantity": 3, "tariffPerM3": 250000}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimate"]["quantity"], 3);
        assert_eq!(body["estimate"]["freight"], 45_000);
        assert!(body["summary"].as_str().unwrap().contains("CBM total: 0.1800"));
    }
}
