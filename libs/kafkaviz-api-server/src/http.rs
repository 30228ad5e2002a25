use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use kafkaviz_engine::{
    Consumer, EntityKind, Event, FetchOutcome, NewConsumer, NewProducer, NewTopic, Produced,
    Producer, Snapshot, Topic,
};

use super::AppState;
use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

pub(crate) async fn handle_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.engine.sim().snapshot().await)
}

/// Topics with their resident records.
pub(crate) async fn handle_list_topics(State(state): State<AppState>) -> Json<Vec<Topic>> {
    let topics = state
        .engine
        .sim()
        .with(|s| s.topics().iter().cloned().collect())
        .await;
    Json(topics)
}

#[derive(Serialize)]
pub(crate) struct ConsumerView {
    #[serde(flatten)]
    consumer: Consumer,
    auto_consuming: bool,
}

pub(crate) async fn handle_list_consumers(
    State(state): State<AppState>,
) -> Json<Vec<ConsumerView>> {
    let consumers = state.engine.sim().with(|s| s.consumers().to_vec()).await;
    let auto = state.engine.auto_consumer();
    Json(
        consumers
            .into_iter()
            .map(|c| ConsumerView {
                auto_consuming: auto.is_running(&c.id),
                consumer: c,
            })
            .collect(),
    )
}

pub(crate) async fn handle_list_producers(State(state): State<AppState>) -> Json<Vec<Producer>> {
    Json(state.engine.sim().with(|s| s.producers().to_vec()).await)
}

pub(crate) async fn handle_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.engine.sim().with(|s| s.events()).await)
}

pub(crate) async fn handle_groups(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.engine.sim().with(|s| s.groups()).await)
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

pub(crate) async fn handle_create_topic(
    State(state): State<AppState>,
    body: Option<Json<NewTopic>>,
) -> Result<impl IntoResponse, ApiError> {
    let spec = body.map(|Json(b)| b).unwrap_or_default();
    let topic = state
        .engine
        .sim()
        .with(|s| s.create_topic(spec).cloned())
        .await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

pub(crate) async fn handle_create_producer(
    State(state): State<AppState>,
    body: Option<Json<NewProducer>>,
) -> Result<impl IntoResponse, ApiError> {
    let spec = body.map(|Json(b)| b).unwrap_or_default();
    let producer = state
        .engine
        .sim()
        .with(|s| s.create_producer(spec).cloned())
        .await?;
    Ok((StatusCode::CREATED, Json(producer)))
}

pub(crate) async fn handle_add_consumer(
    State(state): State<AppState>,
    Json(spec): Json<NewConsumer>,
) -> Result<impl IntoResponse, ApiError> {
    let consumer = state
        .engine
        .sim()
        .with(|s| s.add_consumer(spec).cloned())
        .await?;
    Ok((StatusCode::CREATED, Json(consumer)))
}

pub(crate) async fn handle_remove(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind: EntityKind = kind.parse()?;
    state.engine.remove_entity(kind, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub(crate) struct SubscribeBody {
    topic: String,
}

pub(crate) async fn handle_subscribe(
    State(state): State<AppState>,
    Path(consumer_id): Path<String>,
    Json(body): Json<SubscribeBody>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .sim()
        .with(|s| s.subscribe(&consumer_id, &body.topic))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub(crate) struct CapacityBody {
    limit: usize,
}

pub(crate) async fn handle_set_capacity(
    State(state): State<AppState>,
    Path((topic_id, partition)): Path<(String, u32)>,
    Json(body): Json<CapacityBody>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .sim()
        .with(|s| s.set_partition_capacity(&topic_id, partition, body.limit))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn handle_reset(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.engine.reset_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Produce / consume
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct ProduceBody {
    topic: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    payload: Option<String>,
}

pub(crate) async fn handle_produce(
    State(state): State<AppState>,
    Path(producer_id): Path<String>,
    Json(body): Json<ProduceBody>,
) -> Result<Json<Produced>, ApiError> {
    let produced = state
        .engine
        .sim()
        .with(|s| s.produce(&producer_id, &body.topic, body.key.as_deref(), body.payload))
        .await?;
    Ok(Json(produced))
}

pub(crate) async fn handle_consume(
    State(state): State<AppState>,
    Path(consumer_id): Path<String>,
) -> Result<Json<FetchOutcome>, ApiError> {
    Ok(Json(state.engine.sim().consume(&consumer_id).await?))
}

#[derive(Serialize)]
pub(crate) struct AutoStatus {
    consumer: String,
    running: bool,
}

pub(crate) async fn handle_start_auto(
    State(state): State<AppState>,
    Path(consumer_id): Path<String>,
) -> Result<Json<AutoStatus>, ApiError> {
    state.engine.auto_consumer().start(&consumer_id).await?;
    Ok(Json(AutoStatus {
        consumer: consumer_id,
        running: true,
    }))
}

pub(crate) async fn handle_stop_auto(
    State(state): State<AppState>,
    Path(consumer_id): Path<String>,
) -> Json<AutoStatus> {
    state.engine.auto_consumer().stop(&consumer_id);
    Json(AutoStatus {
        consumer: consumer_id,
        running: false,
    })
}

// ---------------------------------------------------------------------------
// Tutor
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct AskBody {
    question: String,
}

#[derive(Serialize)]
pub(crate) struct AskReply {
    answer: String,
}

/// The snapshot is taken under the lock; the tutor call runs after the
/// lock is released and never touches simulation state.
pub(crate) async fn handle_ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<AskReply>, ApiError> {
    let question = body.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question is empty".into()));
    }
    let context = state.engine.sim().snapshot().await.to_context_string();
    let answer = state.tutor.ask(question, &context).await;
    Ok(Json(AskReply { answer }))
}
