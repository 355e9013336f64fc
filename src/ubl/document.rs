use super::xml_utils::{XmlResult, XmlWriter};
use super::{CUSTOMIZATION_ID, OPERATION_TYPE, SIGNATURE_ID, UBL_VERSION_ID, ubl_ns};
use crate::core::*;

const SUNAT_AGENCY: &str = "PE:SUNAT";
const UNECE_AGENCY: &str = "United Nations Economic Commission for Europe";

fn catalog_uri(n: &str) -> String {
    format!("urn:pe:gob:sunat:cpe:see:gem:catalogos:catalogo{n}")
}

/// Element names that differ between the three document families.
struct Layout {
    root: &'static str,
    namespace: &'static str,
    line: &'static str,
    quantity: &'static str,
    monetary_total: &'static str,
}

impl Layout {
    fn for_type(kind: DocumentType) -> Self {
        match kind {
            DocumentType::Invoice | DocumentType::Receipt => Self {
                root: "Invoice",
                namespace: ubl_ns::INVOICE,
                line: "cac:InvoiceLine",
                quantity: "cbc:InvoicedQuantity",
                monetary_total: "cac:LegalMonetaryTotal",
            },
            DocumentType::CreditNote => Self {
                root: "CreditNote",
                namespace: ubl_ns::CREDIT_NOTE,
                line: "cac:CreditNoteLine",
                quantity: "cbc:CreditedQuantity",
                monetary_total: "cac:LegalMonetaryTotal",
            },
            DocumentType::DebitNote => Self {
                root: "DebitNote",
                namespace: ubl_ns::DEBIT_NOTE,
                line: "cac:DebitNoteLine",
                quantity: "cbc:DebitedQuantity",
                monetary_total: "cac:RequestedMonetaryTotal",
            },
        }
    }
}

/// Generate the UBL 2.1 document for a validated invoice.
///
/// The output is a pure function of `invoice`: the same input always yields
/// byte-identical XML. The first child of the root is an empty
/// `ext:ExtensionContent` placeholder for the digital signature.
pub fn to_ubl_xml(invoice: &Invoice) -> XmlResult {
    let kind = invoice.document_type;
    let layout = Layout::for_type(kind);
    let currency = invoice.currency.code();
    let document_id = invoice.document_id();

    if kind.is_note() && invoice.reference.is_none() {
        return Err(CpeError::Build(format!(
            "{document_id}: credit and debit notes require a document reference"
        )));
    }

    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(
        layout.root,
        &[
            ("xmlns", layout.namespace),
            ("xmlns:cac", ubl_ns::CAC),
            ("xmlns:cbc", ubl_ns::CBC),
            ("xmlns:ext", ubl_ns::EXT),
        ],
    )?;

    // Signature placeholder
    w.start_element("ext:UBLExtensions")?;
    w.start_element("ext:UBLExtension")?;
    w.empty_element("ext:ExtensionContent")?;
    w.end_element("ext:UBLExtension")?;
    w.end_element("ext:UBLExtensions")?;

    w.text_element("cbc:UBLVersionID", UBL_VERSION_ID)?;
    w.text_element_with_attrs(
        "cbc:CustomizationID",
        CUSTOMIZATION_ID,
        &[("schemeAgencyName", SUNAT_AGENCY)],
    )?;
    w.text_element_with_attrs(
        "cbc:ProfileID",
        OPERATION_TYPE,
        &[
            ("schemeName", "Tipo de Operacion"),
            ("schemeAgencyName", SUNAT_AGENCY),
            ("schemeURI", &catalog_uri("51")),
        ],
    )?;
    w.text_element("cbc:ID", &document_id)?;
    w.text_element("cbc:IssueDate", &invoice.issue_date.format("%Y-%m-%d").to_string())?;
    w.text_element("cbc:IssueTime", &invoice.issue_time.format("%H:%M:%S").to_string())?;
    if !kind.is_note() {
        w.text_element("cbc:DueDate", &invoice.due_date.format("%Y-%m-%d").to_string())?;
        w.text_element_with_attrs(
            "cbc:InvoiceTypeCode",
            kind.code(),
            &[
                ("listAgencyName", SUNAT_AGENCY),
                ("listName", "Tipo de Documento"),
                ("listURI", &catalog_uri("01")),
                ("listID", OPERATION_TYPE),
                ("name", "Tipo de Operacion"),
            ],
        )?;
    }
    w.text_element_with_attrs(
        "cbc:DocumentCurrencyCode",
        currency,
        &[
            ("listID", "ISO 4217 Alpha"),
            ("listName", "Currency"),
            ("listAgencyName", UNECE_AGENCY),
        ],
    )?;
    w.text_element("cbc:LineCountNumeric", &invoice.lines.len().to_string())?;

    if let Some(reference) = &invoice.reference {
        write_reference(&mut w, kind, reference)?;
    }

    write_signature_reference(&mut w, invoice, &document_id)?;
    write_party(&mut w, &invoice.issuer, "cac:AccountingSupplierParty", true)?;
    write_party(&mut w, &invoice.customer, "cac:AccountingCustomerParty", false)?;

    if !kind.is_note() {
        write_payment_terms(&mut w, invoice, currency)?;
    }

    // Document-level IGV
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", invoice.tax, currency)?;
    write_tax_subtotal(&mut w, invoice.gross_taxable, invoice.tax, currency, false)?;
    w.end_element("cac:TaxTotal")?;

    w.start_element(layout.monetary_total)?;
    w.amount_element("cbc:LineExtensionAmount", invoice.gross_taxable, currency)?;
    w.amount_element("cbc:TaxInclusiveAmount", invoice.tax_inclusive, currency)?;
    w.amount_element("cbc:PayableAmount", invoice.payable, currency)?;
    w.end_element(layout.monetary_total)?;

    for line in &invoice.lines {
        write_line(&mut w, &layout, line, currency)?;
    }

    w.end_element(layout.root)?;
    w.into_string()
}

fn write_reference(
    w: &mut XmlWriter,
    kind: DocumentType,
    reference: &DocumentReference,
) -> Result<(), CpeError> {
    let (list_name, catalog) = if kind == DocumentType::CreditNote {
        ("Tipo de nota de credito", "09")
    } else {
        ("Tipo de nota de debito", "10")
    };
    w.start_element("cac:DiscrepancyResponse")?;
    w.text_element("cbc:ReferenceID", &reference.id)?;
    w.text_element_with_attrs(
        "cbc:ResponseCode",
        &reference.reason_code,
        &[
            ("listAgencyName", SUNAT_AGENCY),
            ("listName", list_name),
            ("listURI", &catalog_uri(catalog)),
        ],
    )?;
    w.cdata_element("cbc:Description", &reference.description)?;
    w.end_element("cac:DiscrepancyResponse")?;

    w.start_element("cac:BillingReference")?;
    w.start_element("cac:InvoiceDocumentReference")?;
    w.text_element("cbc:ID", &reference.id)?;
    w.text_element_with_attrs(
        "cbc:DocumentTypeCode",
        reference.document_type.code(),
        &[
            ("listAgencyName", SUNAT_AGENCY),
            ("listName", "Tipo de Documento"),
            ("listURI", &catalog_uri("01")),
        ],
    )?;
    w.end_element("cac:InvoiceDocumentReference")?;
    w.end_element("cac:BillingReference")?;
    Ok(())
}

fn write_signature_reference(
    w: &mut XmlWriter,
    invoice: &Invoice,
    document_id: &str,
) -> Result<(), CpeError> {
    w.start_element("cac:Signature")?;
    w.text_element("cbc:ID", document_id)?;
    w.start_element("cac:SignatoryParty")?;
    w.start_element("cac:PartyIdentification")?;
    w.text_element("cbc:ID", &invoice.issuer.id)?;
    w.end_element("cac:PartyIdentification")?;
    w.start_element("cac:PartyName")?;
    w.cdata_element("cbc:Name", &invoice.issuer.legal_name)?;
    w.end_element("cac:PartyName")?;
    w.end_element("cac:SignatoryParty")?;
    w.start_element("cac:DigitalSignatureAttachment")?;
    w.start_element("cac:ExternalReference")?;
    w.text_element("cbc:URI", &format!("#{SIGNATURE_ID}"))?;
    w.end_element("cac:ExternalReference")?;
    w.end_element("cac:DigitalSignatureAttachment")?;
    w.end_element("cac:Signature")?;
    Ok(())
}

fn write_party(
    w: &mut XmlWriter,
    party: &Party,
    wrapper: &str,
    is_issuer: bool,
) -> Result<(), CpeError> {
    let scheme_uri = catalog_uri("06");
    let id_attrs = [
        ("schemeID", party.id_type.code()),
        ("schemeName", "Documento de Identidad"),
        ("schemeAgencyName", SUNAT_AGENCY),
        ("schemeURI", scheme_uri.as_str()),
    ];
    let tax_attrs = [
        ("schemeID", party.id_type.code()),
        ("schemeName", "SUNAT:Identificador de Documento de Identidad"),
        ("schemeAgencyName", SUNAT_AGENCY),
        ("schemeURI", scheme_uri.as_str()),
    ];

    w.start_element(wrapper)?;
    w.start_element("cac:Party")?;

    w.start_element("cac:PartyIdentification")?;
    w.text_element_with_attrs("cbc:ID", &party.id, &id_attrs)?;
    w.end_element("cac:PartyIdentification")?;

    w.start_element("cac:PartyName")?;
    w.cdata_element("cbc:Name", &party.legal_name)?;
    w.end_element("cac:PartyName")?;

    w.start_element("cac:PartyTaxScheme")?;
    w.cdata_element("cbc:RegistrationName", &party.legal_name)?;
    w.text_element_with_attrs("cbc:CompanyID", &party.id, &tax_attrs)?;
    w.start_element("cac:TaxScheme")?;
    w.text_element_with_attrs("cbc:ID", &party.id, &tax_attrs)?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:PartyTaxScheme")?;

    w.start_element("cac:PartyLegalEntity")?;
    w.cdata_element("cbc:RegistrationName", &party.legal_name)?;
    if let Some(address) = &party.address {
        w.start_element("cac:RegistrationAddress")?;
        if !address.ubigeo.is_empty() {
            w.text_element_with_attrs(
                "cbc:ID",
                &address.ubigeo,
                &[("schemeName", "Ubigeos"), ("schemeAgencyName", "PE:INEI")],
            )?;
        }
        if is_issuer {
            // Establishment code: 0000 is the fiscal address.
            w.text_element_with_attrs(
                "cbc:AddressTypeCode",
                "0000",
                &[
                    ("listAgencyName", SUNAT_AGENCY),
                    ("listName", "Establecimientos anexos"),
                ],
            )?;
        }
        w.cdata_element("cbc:CityName", &address.province)?;
        w.cdata_element("cbc:CountrySubentity", &address.department)?;
        w.cdata_element("cbc:District", &address.district)?;
        w.start_element("cac:AddressLine")?;
        w.cdata_element("cbc:Line", &address.line)?;
        w.end_element("cac:AddressLine")?;
        w.start_element("cac:Country")?;
        w.text_element_with_attrs(
            "cbc:IdentificationCode",
            &address.country_code,
            &[
                ("listID", "ISO 3166-1"),
                ("listAgencyName", UNECE_AGENCY),
                ("listName", "Country"),
            ],
        )?;
        w.end_element("cac:Country")?;
        w.end_element("cac:RegistrationAddress")?;
    }
    w.end_element("cac:PartyLegalEntity")?;

    w.end_element("cac:Party")?;
    w.end_element(wrapper)?;
    Ok(())
}

fn write_payment_terms(w: &mut XmlWriter, invoice: &Invoice, currency: &str) -> Result<(), CpeError> {
    w.start_element("cac:PaymentTerms")?;
    w.text_element("cbc:ID", "FormaPago")?;
    w.text_element("cbc:PaymentMeansID", invoice.payment_terms.as_str())?;
    if invoice.payment_terms == PaymentTerms::Credit {
        w.amount_element("cbc:Amount", invoice.payable, currency)?;
    }
    w.end_element("cac:PaymentTerms")?;

    // Credit sales carry a single instalment due on the due date.
    if invoice.payment_terms == PaymentTerms::Credit {
        w.start_element("cac:PaymentTerms")?;
        w.text_element("cbc:ID", "FormaPago")?;
        w.text_element("cbc:PaymentMeansID", "Cuota001")?;
        w.amount_element("cbc:Amount", invoice.payable, currency)?;
        w.text_element(
            "cbc:PaymentDueDate",
            &invoice.due_date.format("%Y-%m-%d").to_string(),
        )?;
        w.end_element("cac:PaymentTerms")?;
    }
    Ok(())
}

fn write_tax_subtotal(
    w: &mut XmlWriter,
    taxable: rust_decimal::Decimal,
    tax: rust_decimal::Decimal,
    currency: &str,
    with_rate: bool,
) -> Result<(), CpeError> {
    w.start_element("cac:TaxSubtotal")?;
    w.amount_element("cbc:TaxableAmount", taxable, currency)?;
    w.amount_element("cbc:TaxAmount", tax, currency)?;
    w.start_element("cac:TaxCategory")?;
    w.text_element_with_attrs(
        "cbc:ID",
        "S",
        &[
            ("schemeID", "UN/ECE 5305"),
            ("schemeName", "Tax Category Identifier"),
            ("schemeAgencyName", UNECE_AGENCY),
        ],
    )?;
    if with_rate {
        w.text_element("cbc:Percent", "18.00")?;
        // Catalog 07: 10 = taxed, onerous operation
        w.text_element_with_attrs(
            "cbc:TaxExemptionReasonCode",
            "10",
            &[
                ("listAgencyName", SUNAT_AGENCY),
                ("listName", "Afectacion del IGV"),
                ("listURI", &catalog_uri("07")),
            ],
        )?;
    }
    w.start_element("cac:TaxScheme")?;
    w.text_element_with_attrs(
        "cbc:ID",
        "1000",
        &[
            ("schemeID", "UN/ECE 5153"),
            ("schemeName", "Codigo de tributos"),
            ("schemeAgencyName", SUNAT_AGENCY),
        ],
    )?;
    w.text_element("cbc:Name", "IGV")?;
    w.text_element("cbc:TaxTypeCode", "VAT")?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:TaxCategory")?;
    w.end_element("cac:TaxSubtotal")?;
    Ok(())
}

fn write_line(
    w: &mut XmlWriter,
    layout: &Layout,
    line: &LineItem,
    currency: &str,
) -> Result<(), CpeError> {
    w.start_element(layout.line)?;
    w.text_element("cbc:ID", &line.id)?;
    w.quantity_element(layout.quantity, line.quantity, &line.unit_code)?;
    w.amount_element("cbc:LineExtensionAmount", line.line_total, currency)?;

    w.start_element("cac:PricingReference")?;
    w.start_element("cac:AlternativeConditionPrice")?;
    w.amount_element("cbc:PriceAmount", line.unit_price_with_tax(), currency)?;
    w.text_element_with_attrs(
        "cbc:PriceTypeCode",
        "01",
        &[
            ("listName", "Tipo de Precio"),
            ("listAgencyName", SUNAT_AGENCY),
            ("listURI", &catalog_uri("16")),
        ],
    )?;
    w.end_element("cac:AlternativeConditionPrice")?;
    w.end_element("cac:PricingReference")?;

    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", line.tax_amount, currency)?;
    write_tax_subtotal(w, line.line_total, line.tax_amount, currency, true)?;
    w.end_element("cac:TaxTotal")?;

    w.start_element("cac:Item")?;
    w.cdata_element("cbc:Description", &line.description)?;
    if let Some(code) = &line.product_code {
        w.start_element("cac:SellersItemIdentification")?;
        w.cdata_element("cbc:ID", code)?;
        w.end_element("cac:SellersItemIdentification")?;
    }
    if let Some(classification) = &line.classification {
        w.start_element("cac:CommodityClassification")?;
        w.text_element_with_attrs(
            "cbc:ItemClassificationCode",
            classification,
            &[
                ("listID", "UNSPSC"),
                ("listAgencyName", "GS1 US"),
                ("listName", "Item Classification"),
            ],
        )?;
        w.end_element("cac:CommodityClassification")?;
    }
    w.end_element("cac:Item")?;

    w.start_element("cac:Price")?;
    w.amount_element("cbc:PriceAmount", line.unit_price, currency)?;
    w.end_element("cac:Price")?;

    w.end_element(layout.line)?;
    Ok(())
}
