//! Medicine inventory handlers

use axum::extract::{Query, State};
use axum::Json;
use datastore_layer::{Row, RowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::{
    first_non_empty, internal_error, listing_item, total_or_zero, DeletedRows, UuidQuery,
};
use crate::db::medicine_stock_repository::{MEDICINE_LIST_COLUMNS, MEDICINE_UPDATABLE_COLUMNS};
use crate::error::{api_success, ApiError, ApiResult};
use crate::middleware::JsonBody;
use crate::server::ClinicServer;
use crate::types::{PageMeta, PaginationParams};
use crate::utils::coerce::{coerce_or_drop, first_text, present_fields, truthy, value_text, NumericKind};

const NUMERIC_COLUMNS: [(&str, NumericKind); 3] = [
    ("Dosage", NumericKind::Float),
    ("Quantity", NumericKind::Integer),
    ("Price", NumericKind::Integer),
];

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedMedicine {
    #[serde(rename = "medicineId")]
    #[schema(value_type = String)]
    pub medicine_id: Value,
    #[serde(rename = "Name")]
    #[schema(value_type = String)]
    pub name: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicineCreated {
    pub medicine: CreatedMedicine,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicinePage {
    pub medicines: Vec<Row>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicineLookup {
    pub medicine: Option<Row>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicineUpdated {
    #[serde(rename = "medicineId")]
    pub medicine_id: String,
}

/// `?Name=` (or `?name=`) query parameter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NameQuery {
    #[serde(rename = "Name")]
    pub upper: Option<String>,
    #[serde(rename = "name")]
    pub lower: Option<String>,
}

/// Add a medicine to the inventory
#[utoipa::path(
    post,
    path = crate::routes::paths::medicine_stock::ADD,
    tag = "medicine-stock",
    request_body = Object,
    responses(
        (status = 200, description = "Medicine created", body = MedicineCreated),
        (status = 400, description = "Missing required field: Name"),
        (status = 409, description = "Medicine with this Name already exists"),
        (status = 500, description = "Failed to create medicine")
    )
)]
pub async fn create_medicine(
    State(server): State<ClinicServer>,
    JsonBody(body): JsonBody,
) -> ApiResult<MedicineCreated> {
    if !truthy(body.get("Name")) {
        return Err(ApiError::missing_field("Name"));
    }
    let field = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
    let numeric = |key: &str, kind: NumericKind| kind.coerce(&field(key)).unwrap_or(Value::Null);

    let stock = server.medicine_stock();
    let name = value_text(&field("Name"));
    match stock.name_exists(&name).await {
        Ok(true) => return Err(ApiError::conflict("Medicine with this Name already exists")),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Failed to check MedicineStock uniqueness"),
    }

    let uuid = Uuid::new_v4().to_string();
    let row = Row::new()
        .with("Name", field("Name"))
        .with("Dosage", numeric("Dosage", NumericKind::Float))
        .with("Quantity", numeric("Quantity", NumericKind::Integer))
        .with("Category", field("Category"))
        .with("Price", numeric("Price", NumericKind::Integer))
        .with("ManufacturerName", field("ManufacturerName"))
        .with("UUID", Value::from(uuid));

    let inserted = stock
        .insert(row)
        .await
        .map_err(internal_error("Failed to create medicine"))?;
    info!(medicine = %name, "Medicine added to stock");

    Ok(Json(api_success(MedicineCreated {
        medicine: CreatedMedicine {
            medicine_id: inserted
                .row_id()
                .map(|id| id.to_value())
                .unwrap_or_else(|| field("Name")),
            name: field("Name"),
        },
    })))
}

/// One page of the inventory
#[utoipa::path(
    get,
    path = crate::routes::paths::medicine_stock::ALL,
    tag = "medicine-stock",
    params(PaginationParams),
    responses(
        (status = 200, description = "Medicines retrieved", body = MedicinePage),
        (status = 500, description = "Failed to fetch medicines")
    )
)]
pub async fn list_medicines(
    State(server): State<ClinicServer>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<MedicinePage> {
    let config = &server.config.pagination;
    let stock = server.medicine_stock();

    let total = total_or_zero(stock.count().await, "MedicineStock");
    let rows = stock
        .page(params.page(), params.per_page(config))
        .await
        .map_err(internal_error("Failed to fetch medicines"))?;

    Ok(Json(api_success(MedicinePage {
        medicines: rows
            .iter()
            .map(|row| listing_item(row, "medicineId", &MEDICINE_LIST_COLUMNS))
            .collect(),
        meta: params.page_meta(config, total),
    })))
}

/// Look a medicine up by exact name
#[utoipa::path(
    get,
    path = crate::routes::paths::medicine_stock::MEDICINE,
    tag = "medicine-stock",
    params(NameQuery),
    responses(
        (status = 200, description = "Medicine or null", body = MedicineLookup),
        (status = 400, description = "Missing Name query parameter"),
        (status = 500, description = "Failed to fetch medicine")
    )
)]
pub async fn get_medicine_by_name(
    State(server): State<ClinicServer>,
    Query(query): Query<NameQuery>,
) -> ApiResult<MedicineLookup> {
    let name = first_non_empty(&query.upper, &query.lower)
        .ok_or_else(|| ApiError::bad_request("Missing Name query parameter"))?;

    let medicine = server
        .medicine_stock()
        .find_by_name(name)
        .await
        .map_err(internal_error("Failed to fetch medicine"))?;

    Ok(Json(api_success(MedicineLookup { medicine })))
}

/// Update an inventory row identified by UUID
///
/// Changes to `Quantity` or `Name` hold the stock lock of the affected names
/// so they cannot interleave with a prescription save.
#[utoipa::path(
    put,
    path = crate::routes::paths::medicine_stock::MEDICINE,
    tag = "medicine-stock",
    request_body = Object,
    responses(
        (status = 200, description = "Medicine updated", body = MedicineUpdated),
        (status = 400, description = "Missing UUID or no updatable fields"),
        (status = 404, description = "Medicine not found for UUID"),
        (status = 500, description = "Failed to update medicine")
    )
)]
pub async fn update_medicine(
    State(server): State<ClinicServer>,
    JsonBody(body): JsonBody,
) -> ApiResult<MedicineUpdated> {
    let uuid = first_text(&body, &["UUID", "uuid"]).ok_or_else(|| ApiError::missing_field("UUID"))?;

    let mut updates = present_fields(&body, &MEDICINE_UPDATABLE_COLUMNS);
    coerce_or_drop(&mut updates, &NUMERIC_COLUMNS);
    if updates.is_empty() {
        return Err(ApiError::validation("No updatable fields provided"));
    }

    let stock = server.medicine_stock();
    let current = stock
        .find_by_uuid(&uuid)
        .await
        .map_err(internal_error("Failed to update medicine"))?
        .ok_or_else(|| ApiError::not_found("Medicine not found for UUID"))?;
    let row_id = current
        .row_id()
        .ok_or_else(|| ApiError::not_found("Medicine not found for UUID"))?;

    let touches_stock = updates.contains_key("Quantity") || updates.contains_key("Name");
    let _guard = if touches_stock {
        let names: Vec<String> = [current.get("Name"), updates.get("Name")]
            .into_iter()
            .flatten()
            .filter(|name| truthy(Some(*name)))
            .map(value_text)
            .collect();
        Some(server.stock_locks.lock_all(names).await)
    } else {
        None
    };

    stock
        .update(&row_id, Row::from(updates))
        .await
        .map_err(internal_error("Failed to update medicine"))?;

    Ok(Json(api_success(MedicineUpdated { medicine_id: uuid })))
}

/// Delete every inventory row carrying a UUID
///
/// Holds the stock locks of the deleted names so a concurrent save never
/// restores stock into a row that has just gone.
#[utoipa::path(
    delete,
    path = crate::routes::paths::medicine_stock::MEDICINE,
    tag = "medicine-stock",
    params(UuidQuery),
    responses(
        (status = 200, description = "Rows deleted", body = DeletedRows),
        (status = 400, description = "Missing UUID query parameter"),
        (status = 404, description = "No medicine found with that UUID"),
        (status = 500, description = "Failed to delete medicine(s)")
    )
)]
pub async fn delete_medicine(
    State(server): State<ClinicServer>,
    Query(query): Query<UuidQuery>,
) -> ApiResult<DeletedRows> {
    let uuid = query
        .uuid()
        .ok_or_else(|| ApiError::bad_request("Please provide UUID query param to delete medicine."))?;

    let stock = server.medicine_stock();
    let rows = stock
        .find_all_by_uuid(uuid)
        .await
        .map_err(internal_error("Failed to delete medicine(s)"))?;
    if rows.is_empty() {
        return Err(ApiError::not_found("No medicine found with that UUID"));
    }

    let names: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get("Name"))
        .filter(|name| truthy(Some(*name)))
        .map(value_text)
        .collect();
    let _guard = server.stock_locks.lock_all(names).await;

    let row_ids: Vec<RowId> = rows.iter().filter_map(Row::row_id).collect();
    let deleted_row_ids = stock.delete_each(&row_ids).await;
    Ok(Json(api_success(DeletedRows { deleted_row_ids })))
}
