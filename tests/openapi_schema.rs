use serde_json::Value;

fn document() -> anyhow::Result<Value> {
    // Build the OpenAPI document the same way the server does
    let doc = petshop_api::docs::build_openapi(8000)?;
    Ok(serde_json::to_value(&doc)?)
}

fn schema_properties<'a>(doc: &'a Value, name: &str) -> &'a serde_json::Map<String, Value> {
    doc.pointer(&format!("/components/schemas/{}/properties", name))
        .and_then(Value::as_object)
        .unwrap_or_else(|| panic!("components.schemas.{}.properties must exist", name))
}

#[test]
fn openapi_documents_the_booking_payload() -> anyhow::Result<()> {
    let doc = document()?;
    let props = schema_properties(&doc, "PublicBookingRequest");

    for key in ["nomePet", "nomeCliente", "telefone", "servico", "data", "hora", "recebido"] {
        assert!(props.contains_key(key), "PublicBookingRequest missing '{}'", key);
    }
    Ok(())
}

#[test]
fn openapi_has_appointment_and_ledger_fields() -> anyhow::Result<()> {
    let doc = document()?;

    let appointment = schema_properties(&doc, "Appointment");
    for key in ["business_id", "customer_id", "pet_id", "service_id", "date", "time", "status"] {
        assert!(appointment.contains_key(key), "Appointment missing '{}'", key);
    }

    let record = schema_properties(&doc, "FinancialRecord");
    assert!(record.contains_key("type"), "FinancialRecord must expose `type`");
    assert!(!record.contains_key("kind"));
    Ok(())
}

#[test]
fn openapi_declares_bearer_auth_and_server() -> anyhow::Result<()> {
    let doc = document()?;

    let scheme = doc
        .pointer("/components/securitySchemes/bearerAuth")
        .expect("bearerAuth scheme must exist");
    assert_eq!(scheme["scheme"], "bearer");
    assert_eq!(scheme["bearerFormat"], "JWT");

    let servers = doc["servers"].as_array().expect("servers");
    assert!(servers.iter().any(|s| s["url"] == "http://localhost:8000"));

    let example = doc.pointer("/paths/~1agendamentos-publicos/post/requestBody/content/application~1json/example");
    assert_eq!(example.and_then(|e| e.get("servico")), Some(&Value::from("Banho")));
    Ok(())
}
