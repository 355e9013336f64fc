#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use comprobante::core::*;
use serde_json::{Value, json};

pub const ISSUER_RUC: &str = "20100066603";
pub const CUSTOMER_RUC: &str = "20601030013";

pub const CERT_PEM: &str = include_str!("../fixtures/signing-cert.pem");
pub const KEY_PEM: &str = include_str!("../fixtures/signing-key.pem");
pub const P12: &[u8] = include_bytes!("../fixtures/signing.p12");
pub const P12_PASSWORD: &str = "prueba123";

pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

pub fn issuer() -> Value {
    json!({
        "idType": "6",
        "id": ISSUER_RUC,
        "legalName": "EMPRESA DE PRUEBAS S.A.C.",
        "address": {
            "ubigeo": "150101",
            "line": "AV. JAVIER PRADO ESTE 123",
            "district": "LIMA",
            "province": "LIMA",
            "department": "LIMA"
        }
    })
}

/// Factura F001-123 for 156.78 + 28.22 IGV.
pub fn factura_json() -> Value {
    json!({
        "documentType": "01",
        "series": "F001",
        "number": "123",
        "issueDate": "2025-03-01",
        "issueTime": "10:15:00",
        "currency": "PEN",
        "grossTaxable": "156.78",
        "tax": "28.22",
        "taxInclusive": "185.00",
        "payable": "185.00",
        "issuer": issuer(),
        "customer": {
            "idType": "6",
            "id": CUSTOMER_RUC,
            "legalName": "CLIENTE DE PRUEBA S.R.L."
        },
        "lines": [
            {
                "quantity": "2",
                "unitCode": "NIU",
                "unitPrice": "50.00",
                "lineTotal": "100.00",
                "description": "Teclado USB"
            },
            {
                "quantity": "1",
                "unitCode": "ZZ",
                "unitPrice": "56.78",
                "lineTotal": "56.78",
                "description": "Instalación"
            }
        ]
    })
}

/// Boleta B001-45 for a DNI customer.
pub fn boleta_json() -> Value {
    json!({
        "documentType": "03",
        "series": "B001",
        "number": 45,
        "issueDate": "2025-03-01",
        "currency": "PEN",
        "grossTaxable": "100.00",
        "tax": "18.00",
        "taxInclusive": "118.00",
        "payable": "118.00",
        "issuer": issuer(),
        "customer": {
            "idType": "1",
            "id": "45678912",
            "legalName": "JUAN PEREZ"
        },
        "lines": [{
            "quantity": "4",
            "unitPrice": "25",
            "lineTotal": "100.00",
            "description": "Cuaderno"
        }]
    })
}

/// Credit note F002-7 cancelling F001-123.
pub fn credit_note_json() -> Value {
    let mut note = factura_json();
    note["documentType"] = json!("07");
    note["series"] = json!("F002");
    note["number"] = json!("7");
    note["reference"] = json!({
        "documentId": "F001-00000123",
        "documentType": "01",
        "reasonCode": "01",
        "description": "Anulación de la operación"
    });
    note
}

pub fn raw(value: Value) -> RawInvoice {
    serde_json::from_value(value).unwrap()
}

pub fn factura() -> Invoice {
    validate_invoice(&raw(factura_json()), now()).unwrap()
}

pub fn boleta() -> Invoice {
    validate_invoice(&raw(boleta_json()), now()).unwrap()
}

pub fn credit_note() -> Invoice {
    validate_invoice(&raw(credit_note_json()), now()).unwrap()
}

/// A receipt (`ApplicationResponse`) for `document_id` with the given code.
pub fn receipt_xml(document_id: &str, code: &str, description: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ar:ApplicationResponse xmlns:ar="urn:oasis:names:specification:ubl:schema:xsd:ApplicationResponse-2" xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2" xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:UBLVersionID>2.0</cbc:UBLVersionID>
  <cbc:ID>1740825000000</cbc:ID>
  <cbc:IssueDate>2025-03-01</cbc:IssueDate>
  <cbc:ResponseDate>2025-03-01</cbc:ResponseDate>
  <cbc:ResponseTime>10:30:05</cbc:ResponseTime>
  <cac:DocumentResponse>
    <cac:Response>
      <cbc:ReferenceID>{document_id}</cbc:ReferenceID>
      <cbc:ResponseCode>{code}</cbc:ResponseCode>
      <cbc:Description>{description}</cbc:Description>
    </cac:Response>
    <cac:DocumentReference>
      <cbc:ID>{document_id}</cbc:ID>
    </cac:DocumentReference>
  </cac:DocumentResponse>
</ar:ApplicationResponse>"#
    )
}
