// src/api/handlers/aggregation.rs
use actix_web::{
    web::{self, Data, Json, Path},
    HttpResponse, Scope,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::core::{
    onboarding::{types::AddPluginRequest, OnboardingService},
    tasks::TaskService,
};

pub fn scope() -> Scope {
    web::scope("/redfish/v1")
        .service(
            web::resource("/AggregationService/Actions/AggregationService.Add")
                .route(web::post().to(add_plugin)),
        )
        .service(web::resource("/TaskService/Tasks/{id}").route(web::get().to(get_task)))
}

/// Accepts the add request, hands back a task handle immediately and runs
/// the handshake on a spawned worker. Callers poll the task endpoint for
/// the terminal state.
async fn add_plugin(
    service: Data<OnboardingService>,
    tasks: Data<TaskService>,
    request: Json<AddPluginRequest>,
) -> HttpResponse {
    let request = request.into_inner();
    info!(
        "Received add request for plugin {} at {}",
        request.oem.plugin_id, request.manager_address
    );

    let task_id = tasks.create_task("aggregation").await;
    let task_uri = format!("/redfish/v1/TaskService/Tasks/{}", task_id);

    let service = service.into_inner();
    tokio::spawn(async move {
        service.add_plugin(task_id, "aggregation", &request).await;
    });

    HttpResponse::Accepted()
        .insert_header(("Location", task_uri.clone()))
        .json(json!({
            "@odata.id": task_uri,
            "Id": task_id,
            "TaskState": "Running",
        }))
}

async fn get_task(tasks: Data<TaskService>, id: Path<Uuid>) -> HttpResponse {
    match tasks.get_task(*id).await {
        Some(task) => HttpResponse::Ok().json(task),
        None => HttpResponse::NotFound().json(json!({
            "error": { "code": 404, "message": format!("task {} not found", id) }
        })),
    }
}
