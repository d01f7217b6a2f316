use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, reports, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::register,
		routes::auth::login,
		routes::auth::refresh,
		routes::auth::logout,
		routes::auth::me,
		routes::auth::update_me,
		routes::users::list_users,
		routes::users::create_user,
		routes::users::update_user,
		routes::users::delete_user,
		routes::businesses::list_businesses,
		routes::businesses::create_business,
		routes::businesses::get_business,
		routes::businesses::update_business,
		routes::businesses::delete_business,
		routes::customers::list_customers,
		routes::customers::create_customer,
		routes::customers::get_customer,
		routes::customers::update_customer,
		routes::customers::delete_customer,
		routes::pets::list_pets,
		routes::pets::create_pet,
		routes::pets::get_pet,
		routes::pets::update_pet,
		routes::pets::delete_pet,
		routes::services::list_services,
		routes::services::create_service,
		routes::services::get_service,
		routes::services::update_service,
		routes::services::delete_service,
		routes::appointments::list_appointments,
		routes::appointments::list_business_appointments,
		routes::appointments::create_appointment,
		routes::appointments::create_business_appointment,
		routes::appointments::get_appointment,
		routes::appointments::update_appointment,
		routes::appointments::delete_appointment,
		routes::financial::list_records,
		routes::financial::overview,
		routes::financial::create_record,
		routes::financial::get_record,
		routes::financial::update_record,
		routes::financial::delete_record,
		routes::goals::list_goals,
		routes::goals::progress,
		routes::goals::create_goal,
		routes::goals::get_goal,
		routes::goals::update_goal,
		routes::goals::delete_goal,
		routes::public::book_default,
		routes::public::book_for_handle,
		routes::public::business_info,
		routes::public::business_services
	),
	components(
		schemas(
			authz::Role,
			routes::health::HealthResponse,
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::RegisterRequest,
			models::user::RefreshRequest,
			models::user::ProfileUpdateRequest,
			models::user::UserCreateRequest,
			models::user::UserUpdateRequest,
			models::business::Business,
			models::business::BusinessPublicInfo,
			models::business::BusinessCreateRequest,
			models::business::BusinessUpdateRequest,
			models::customer::Customer,
			models::customer::CustomerCreateRequest,
			models::customer::CustomerUpdateRequest,
			models::pet::Pet,
			models::pet::PetCreateRequest,
			models::pet::PetUpdateRequest,
			models::service::Service,
			models::service::PublicService,
			models::service::ServiceCreateRequest,
			models::service::ServiceUpdateRequest,
			models::appointment::Appointment,
			models::appointment::AppointmentCreateRequest,
			models::appointment::AppointmentUpdateRequest,
			models::financial::FinancialRecord,
			models::financial::FinancialCreateRequest,
			models::financial::FinancialUpdateRequest,
			models::goal::Goal,
			models::goal::GoalCreateRequest,
			models::goal::GoalUpdateRequest,
			models::booking::PublicBookingRequest,
			models::booking::BookingOutcome,
			reports::FinancialOverview,
			reports::StatusTotals,
			reports::ServiceRevenue,
			reports::GoalProgress
		)
	),
	modifiers(&BearerAuth),
	tags(
		(name = "Health", description = "Liveness and database status"),
		(name = "Auth", description = "Registration, sessions and own profile"),
		(name = "Users", description = "Account management"),
		(name = "Businesses", description = "Tenants"),
		(name = "Customers", description = "Pet owners"),
		(name = "Pets", description = "Pets and their owners"),
		(name = "Services", description = "Service catalogue and prices"),
		(name = "Appointments", description = "Schedule"),
		(name = "Financial", description = "Ledger and overview"),
		(name = "Goals", description = "Revenue goals and progress"),
		(name = "Public", description = "Booking page endpoints, no session")
	)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		if let Some(components) = openapi.components.as_mut() {
			components.add_security_scheme("bearerAuth", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
		}
	}
}

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_bearer_format(&mut doc);
	add_examples(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.persist_authorization(true);

	let doc = Arc::new(doc);
	let json_route = get(move || {
		let doc = Arc::clone(&doc);
		async move { Json((*doc).clone()) }
	});

	Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config))
}

fn ensure_bearer_format(doc: &mut Value) {
	let Some(scheme) = doc.pointer_mut("/components/securitySchemes/bearerAuth").and_then(Value::as_object_mut) else {
		return;
	};
	scheme.entry("bearerFormat").or_insert_with(|| json!("JWT"));
}

fn add_examples(doc: &mut Value) {
	if let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) {
		for item in paths.values_mut() {
			if let Some(operations) = item.as_object_mut() {
				for operation in operations.values_mut() {
					apply_request_examples(operation);
				}
			}
		}
	}
}

fn apply_request_examples(operation: &mut Value) {
	let Some(app_json) = operation
		.pointer_mut("/requestBody/content/application~1json")
		.and_then(Value::as_object_mut)
	else {
		return;
	};
	let Some(reference) = app_json.get("schema").and_then(|schema| schema.get("$ref")).and_then(Value::as_str) else {
		return;
	};

	let example = match reference {
		"#/components/schemas/LoginRequest" => Some(json!({
			"email": "ana@acme-petshop.com",
			"password": "S3cureP@ssw0rd"
		})),
		"#/components/schemas/RegisterRequest" => Some(json!({
			"email": "ana@acme-petshop.com",
			"password": "S3cureP@ssw0rd",
			"first_name": "Ana",
			"last_name": "Souza",
			"business": {"brand_name": "Acme Petshop", "handle": "acme-petshop", "location": "Rua X, 100"}
		})),
		"#/components/schemas/PublicBookingRequest" => Some(json!({
			"nomePet": "Rex",
			"nomeCliente": "Ana",
			"telefone": "11999999999",
			"servico": "Banho",
			"data": "2025-03-10",
			"hora": "09:00"
		})),
		"#/components/schemas/AppointmentCreateRequest" => Some(json!({
			"customer_id": 1,
			"pet_id": 1,
			"service_id": 1,
			"date": "2025-03-10",
			"time": "09:00"
		})),
		_ => None,
	};

	if let Some(example) = example {
		app_json.insert("example".to_string(), example);
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(servers)) => {
			let has = servers
				.iter()
				.any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				servers.push(json!({ "url": server_url }));
			}
		}
		_ => {
			if let Some(root) = doc.as_object_mut() {
				let mut server = Map::new();
				server.insert("url".to_string(), Value::String(server_url));
				root.insert("servers".to_string(), Value::Array(vec![Value::Object(server)]));
			}
		}
	}
}
