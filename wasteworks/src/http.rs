//! Hand-rolled routing for the public API. Handlers are plain functions from
//! parsed inputs to an [`ApiResponse`], so the route table is testable
//! without opening sockets; `handle` is the only hyper-facing entry point.

use std::{collections::BTreeMap, sync::Arc};

use core_types::{CapacityLimits, OrgId, ReservationId, ReservationPatch, Warehouse, WarehouseId};
use depot_store::{seed::seed_demo, DepotStore, StoreError};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    header::{HeaderValue, CONTENT_TYPE},
    Method, Request, Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use transfer_engine::{TransferController, TransferError};

use crate::metrics::ApiMetrics;

pub struct ApiContext {
    pub controller: TransferController,
    pub metrics: Arc<ApiMetrics>,
    pub testing_routes: bool,
}

impl ApiContext {
    pub fn new(
        controller: TransferController,
        metrics: Arc<ApiMetrics>,
        testing_routes: bool,
    ) -> Self {
        Self {
            controller,
            metrics,
            testing_routes,
        }
    }

    fn store(&self) -> Arc<DepotStore> {
        self.controller.store()
    }
}

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    fn json(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    fn detail(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": message.into() }),
        }
    }
}

/// Hyper entry point: reads the body, routes, and renders the JSON reply.
pub async fn handle(ctx: Arc<ApiContext>, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().trim_matches('/').to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    if method == Method::GET && path == "metrics" {
        return text_response(ctx.metrics.render());
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => {
            return json_response(&ApiResponse::detail(
                StatusCode::BAD_REQUEST,
                "failed to read request body",
            ))
        }
    };
    json_response(&route(&ctx, &method, &path, &query, &body))
}

/// The route table. Paths arrive with surrounding slashes trimmed.
pub fn route(
    ctx: &ApiContext,
    method: &Method,
    path: &str,
    query: &str,
    body: &[u8],
) -> ApiResponse {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] if *method == Method::GET => index(),
        ["warehouses"] if *method == Method::POST => create_warehouse(ctx, body),
        ["warehouses", id] if *method == Method::GET => match parse_id(id) {
            Ok(id) => get_warehouse(ctx, id),
            Err(response) => response,
        },
        ["orgs"] if *method == Method::POST => create_organization(ctx, body),
        ["orgs"] if *method == Method::GET => list_organizations(ctx),
        ["orgs", id] if *method == Method::GET => match parse_id(id) {
            Ok(id) => get_organization(ctx, id),
            Err(response) => response,
        },
        ["transfer_waste"] if *method == Method::POST => transfer_waste(ctx, query),
        ["order", id] if *method == Method::PATCH => match parse_id(id) {
            Ok(id) => patch_order(ctx, id, body),
            Err(response) => response,
        },
        ["testing"] if *method == Method::PUT && ctx.testing_routes => seed(ctx),
        ["testing"] if *method == Method::DELETE && ctx.testing_routes => reset(ctx),
        _ => ApiResponse::detail(StatusCode::NOT_FOUND, "not found"),
    }
}

fn index() -> ApiResponse {
    ApiResponse::json(
        StatusCode::OK,
        json!({
            "message": "wasteworks API: manage warehouses and organizations, \
                        then POST /transfer_waste/ to ship waste"
        }),
    )
}

#[derive(Deserialize)]
struct CreateWarehouseBody {
    name: String,
    bio_limit: u32,
    plastic_limit: u32,
    glass_limit: u32,
}

fn create_warehouse(ctx: &ApiContext, body: &[u8]) -> ApiResponse {
    let payload: CreateWarehouseBody = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(_) => {
            return ApiResponse::detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                "waste limits must be whole numbers",
            )
        }
    };
    let limits = CapacityLimits::new(
        payload.bio_limit,
        payload.plastic_limit,
        payload.glass_limit,
    );
    let created = ctx
        .store()
        .transaction(|state| -> Result<Warehouse, StoreError> {
            Ok(state.insert_warehouse(payload.name, limits))
        });
    match created {
        Ok(warehouse) => ApiResponse::json(StatusCode::CREATED, to_json(&warehouse)),
        Err(err) => store_fault(err),
    }
}

#[derive(Deserialize)]
struct CreateOrganizationBody {
    name: String,
    /// Reachable warehouses: id to distance.
    warehouses: BTreeMap<WarehouseId, u32>,
}

fn create_organization(ctx: &ApiContext, body: &[u8]) -> ApiResponse {
    let payload: CreateOrganizationBody = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(_) => {
            return ApiResponse::detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                "warehouse ids and distances must be whole numbers",
            )
        }
    };
    let reachable: Vec<(WarehouseId, u32)> = payload.warehouses.into_iter().collect();
    let created = ctx
        .store()
        .transaction(|state| state.insert_organization(payload.name, &reachable));
    match created {
        Ok(organization) => ApiResponse::json(StatusCode::CREATED, to_json(&organization)),
        Err(StoreError::UnknownWarehouse { warehouse_id }) => ApiResponse::detail(
            StatusCode::NOT_FOUND,
            format!("Warehouse {warehouse_id} not found"),
        ),
        Err(err) => store_fault(err),
    }
}

#[derive(Serialize)]
struct OrgWarehouseView {
    warehouse_id: WarehouseId,
    warehouse_name: String,
    bio_limit: u32,
    plastic_limit: u32,
    glass_limit: u32,
    distance: u32,
}

#[derive(Serialize)]
struct OrganizationView {
    organization_name: String,
    organization_id: OrgId,
    warehouses: Vec<OrgWarehouseView>,
}

fn organization_view(
    state: &depot_store::DepotState,
    org: &core_types::Organization,
) -> OrganizationView {
    let warehouses = state
        .edges_for(org.id)
        .into_iter()
        .filter_map(|edge| {
            state.warehouse(edge.warehouse_id).map(|warehouse| OrgWarehouseView {
                warehouse_id: warehouse.id,
                warehouse_name: warehouse.name.clone(),
                bio_limit: warehouse.limits.bio_limit,
                plastic_limit: warehouse.limits.plastic_limit,
                glass_limit: warehouse.limits.glass_limit,
                distance: edge.distance,
            })
        })
        .collect();
    OrganizationView {
        organization_name: org.name.clone(),
        organization_id: org.id,
        warehouses,
    }
}

fn list_organizations(ctx: &ApiContext) -> ApiResponse {
    let views: Vec<OrganizationView> = ctx.store().read(|state| {
        state
            .organizations()
            .map(|org| organization_view(state, org))
            .collect()
    });
    ApiResponse::json(StatusCode::OK, to_json(&views))
}

fn get_organization(ctx: &ApiContext, org_id: OrgId) -> ApiResponse {
    let view = ctx.store().read(|state| {
        state
            .organization(org_id)
            .map(|org| organization_view(state, org))
    });
    match view {
        Some(view) => ApiResponse::json(StatusCode::OK, to_json(&view)),
        None => ApiResponse::detail(
            StatusCode::NOT_FOUND,
            format!("No organization with id {org_id}"),
        ),
    }
}

#[derive(Serialize)]
struct WarehouseDistanceView {
    org_id: OrgId,
    distance: u32,
}

#[derive(Serialize)]
struct WarehouseView {
    warehouse_id: WarehouseId,
    warehouse_name: String,
    bio_limit: u32,
    plastic_limit: u32,
    glass_limit: u32,
    distance: Vec<WarehouseDistanceView>,
}

fn get_warehouse(ctx: &ApiContext, warehouse_id: WarehouseId) -> ApiResponse {
    let view = ctx.store().read(|state| {
        state.warehouse(warehouse_id).map(|warehouse| WarehouseView {
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name.clone(),
            bio_limit: warehouse.limits.bio_limit,
            plastic_limit: warehouse.limits.plastic_limit,
            glass_limit: warehouse.limits.glass_limit,
            distance: state
                .edges_to(warehouse.id)
                .into_iter()
                .map(|edge| WarehouseDistanceView {
                    org_id: edge.org_id,
                    distance: edge.distance,
                })
                .collect(),
        })
    });
    match view {
        Some(view) => ApiResponse::json(StatusCode::OK, to_json(&view)),
        None => ApiResponse::detail(
            StatusCode::NOT_FOUND,
            format!("No warehouse with id {warehouse_id}"),
        ),
    }
}

fn transfer_waste(ctx: &ApiContext, query: &str) -> ApiResponse {
    let params = parse_query(query);
    let (Some(org_id), Some(waste_type), Some(quantity)) = (
        param(&params, "org_id"),
        param(&params, "waste_type"),
        param(&params, "quantity"),
    ) else {
        return ApiResponse::detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "org_id, waste_type and quantity query parameters are required",
        );
    };
    let Ok(org_id) = org_id.parse::<OrgId>() else {
        return ApiResponse::detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "org_id must be a whole number",
        );
    };
    let Ok(quantity) = quantity.parse::<u32>() else {
        return ApiResponse::detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "quantity must be a whole number",
        );
    };

    match ctx.controller.transfer_waste(org_id, waste_type, quantity) {
        Ok(receipt) => {
            ctx.metrics.record_transfer();
            ApiResponse::json(StatusCode::OK, to_json(&receipt))
        }
        Err(err) => {
            let status = status_for(&err);
            if status != StatusCode::INTERNAL_SERVER_ERROR {
                ctx.metrics.record_rejected_transfer();
            }
            ApiResponse::detail(status, err.to_string())
        }
    }
}

fn patch_order(ctx: &ApiContext, reservation_id: ReservationId, body: &[u8]) -> ApiResponse {
    let patch: ReservationPatch = if body.is_empty() {
        ReservationPatch::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(patch) => patch,
            Err(_) => {
                return ApiResponse::detail(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "accepted must be a boolean and date an RFC 3339 timestamp",
                )
            }
        }
    };
    match ctx.controller.set_accepted(reservation_id, &patch) {
        Ok(outcome) => {
            if outcome.capacity_restored {
                ctx.metrics.record_reversal();
            }
            ApiResponse::json(StatusCode::OK, to_json(&outcome.reservation))
        }
        Err(err) => ApiResponse::detail(status_for(&err), err.to_string()),
    }
}

fn seed(ctx: &ApiContext) -> ApiResponse {
    match seed_demo(&ctx.store()) {
        Ok(true) => ApiResponse::detail(StatusCode::OK, "demo fixtures seeded"),
        Ok(false) => ApiResponse::detail(StatusCode::OK, "store already has records"),
        Err(err) => store_fault(err),
    }
}

fn reset(ctx: &ApiContext) -> ApiResponse {
    match ctx.store().reset() {
        Ok(()) => ApiResponse::detail(StatusCode::OK, "store cleared"),
        Err(err) => store_fault(err),
    }
}

fn status_for(err: &TransferError) -> StatusCode {
    match err {
        TransferError::InvalidCategory { .. } | TransferError::InsufficientCapacity { .. } => {
            StatusCode::BAD_REQUEST
        }
        TransferError::NoAvailableWarehouses { .. }
        | TransferError::ReservationNotFound { .. }
        | TransferError::WarehouseNotFound { .. } => StatusCode::NOT_FOUND,
        TransferError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_fault(err: StoreError) -> ApiResponse {
    log::error!("store fault: {err}");
    ApiResponse::detail(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn parse_id(raw: &str) -> Result<u32, ApiResponse> {
    raw.parse::<u32>().map_err(|_| {
        ApiResponse::detail(StatusCode::UNPROCESSABLE_ENTITY, "id must be a whole number")
    })
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn json_response(api: &ApiResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(api.body.to_string())));
    *response.status_mut() = api.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn text_response(body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}

#[cfg(test)]
mod tests {
    use depot_store::StoreConfig;
    use tempfile::tempdir;

    use super::*;

    fn context(dir: &std::path::Path, testing_routes: bool) -> ApiContext {
        let store = Arc::new(DepotStore::open(&StoreConfig::new(dir.to_path_buf())).unwrap());
        seed_demo(&store).unwrap();
        ApiContext::new(
            TransferController::new(store),
            Arc::new(ApiMetrics::new().unwrap()),
            testing_routes,
        )
    }

    fn call(ctx: &ApiContext, method: Method, path: &str, query: &str, body: &str) -> ApiResponse {
        route(ctx, &method, path, query, body.as_bytes())
    }

    #[test]
    fn index_serves_usage_message() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let response = call(&ctx, Method::GET, "", "", "");
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body["message"].as_str().unwrap().contains("wasteworks"));
    }

    #[test]
    fn warehouse_creation_assigns_the_next_id() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let response = call(
            &ctx,
            Method::POST,
            "warehouses",
            "",
            r#"{"name": "Depot 10", "bio_limit": 10, "plastic_limit": 20, "glass_limit": 30}"#,
        );
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["id"], 9);
        assert_eq!(response.body["bio_limit"], 10);
    }

    #[test]
    fn warehouse_creation_rejects_non_numeric_limits() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let response = call(
            &ctx,
            Method::POST,
            "warehouses",
            "",
            r#"{"name": "Depot 10", "bio_limit": "10t", "plastic_limit": "20t", "glass_limit": "30t"}"#,
        );
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn organization_creation_reports_missing_warehouses() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let response = call(
            &ctx,
            Method::POST,
            "orgs",
            "",
            r#"{"name": "Org 3", "warehouses": {"1000": 10, "2": 20}}"#,
        );
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["detail"], "Warehouse 1000 not found");
        // Nothing was created.
        let listing = call(&ctx, Method::GET, "orgs", "", "");
        assert_eq!(listing.body.as_array().unwrap().len(), 2);
    }

    #[test]
    fn organization_view_includes_limits_and_distance() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let response = call(&ctx, Method::GET, "orgs/2", "", "");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["organization_id"], 2);
        let warehouses = response.body["warehouses"].as_array().unwrap();
        assert_eq!(warehouses.len(), 3);
        assert_eq!(warehouses[0]["warehouse_id"], 3);
        assert_eq!(warehouses[0]["distance"], 50);
        assert_eq!(warehouses[0]["bio_limit"], 250);
    }

    #[test]
    fn unknown_org_and_warehouse_report_404() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        assert_eq!(
            call(&ctx, Method::GET, "orgs/200", "", "").status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            call(&ctx, Method::GET, "warehouses/200", "", "").status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn transfer_route_commits_and_counts() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let response = call(
            &ctx,
            Method::POST,
            "transfer_waste",
            "org_id=1&waste_type=bio&quantity=30",
            "",
        );
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["initial_quantity"], 30);
        assert_eq!(response.body["transfer_data"][0]["warehouse_id"], 2);
        assert_eq!(ctx.metrics.transfers(), 1);
    }

    #[test]
    fn transfer_route_maps_engine_errors_to_statuses() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let invalid = call(
            &ctx,
            Method::POST,
            "transfer_waste",
            "org_id=1&waste_type=biomio&quantity=30",
            "",
        );
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let too_much = call(
            &ctx,
            Method::POST,
            "transfer_waste",
            "org_id=2&waste_type=bio&quantity=1000",
            "",
        );
        assert_eq!(too_much.status, StatusCode::BAD_REQUEST);
        assert!(too_much.body["detail"]
            .as_str()
            .unwrap()
            .contains("350 of 1000"));

        let unreachable = call(
            &ctx,
            Method::POST,
            "transfer_waste",
            "org_id=99&waste_type=bio&quantity=1",
            "",
        );
        assert_eq!(unreachable.status, StatusCode::NOT_FOUND);
        assert_eq!(ctx.metrics.rejected_transfers(), 3);
        assert_eq!(ctx.metrics.transfers(), 0);
    }

    #[test]
    fn patch_route_reverses_a_reservation() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        call(
            &ctx,
            Method::POST,
            "transfer_waste",
            "org_id=1&waste_type=bio&quantity=30",
            "",
        );

        let response = call(&ctx, Method::PATCH, "order/1", "", r#"{"accepted": false}"#);
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["accepted"], false);
        assert_eq!(ctx.metrics.reversals(), 1);

        // Second rejection is a no-op for capacity and for the counter.
        call(&ctx, Method::PATCH, "order/1", "", r#"{"accepted": false}"#);
        assert_eq!(ctx.metrics.reversals(), 1);

        let missing = call(&ctx, Method::PATCH, "order/99", "", r#"{"accepted": false}"#);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn testing_routes_reset_and_reseed() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), true);
        assert_eq!(
            call(&ctx, Method::DELETE, "testing", "", "").status,
            StatusCode::OK
        );
        ctx.store().read(|state| assert!(state.is_empty()));
        assert_eq!(
            call(&ctx, Method::PUT, "testing", "", "").status,
            StatusCode::OK
        );
        ctx.store()
            .read(|state| assert_eq!(state.organizations().count(), 2));
    }

    #[test]
    fn testing_routes_disappear_outside_dev() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), false);
        assert_eq!(
            call(&ctx, Method::DELETE, "testing", "", "").status,
            StatusCode::NOT_FOUND
        );
    }
}
