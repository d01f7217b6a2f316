use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::appointment::Appointment;

/// Body posted by the public booking page. Keys stay in Portuguese because
/// that is what the page sends.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PublicBookingRequest {
    #[serde(rename = "nomePet")]
    #[schema(example = "Rex")]
    pub pet_name: String,
    #[serde(rename = "nomeCliente")]
    #[schema(example = "Ana")]
    pub customer_name: String,
    #[serde(rename = "telefone")]
    #[schema(example = "11999999999")]
    pub phone: String,
    #[serde(rename = "servico")]
    #[schema(example = "Banho")]
    pub service: Option<String>,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "hora")]
    #[schema(example = "09:00")]
    pub time: String,
    #[serde(rename = "especie")]
    pub species: Option<String>,
    #[serde(rename = "raca")]
    pub breed: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
    /// The pet is already at the shop: book straight into `received`.
    #[serde(rename = "recebido", default)]
    pub received: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    pub customer_id: i64,
    pub pet_id: i64,
    pub customer_created: bool,
    pub pet_created: bool,
    pub financial_record_id: Option<i64>,
}
