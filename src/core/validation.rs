use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use rust_decimal::Decimal;

use super::error::ValidationError;
use super::input::*;
use super::ruc::is_valid_ruc;
use super::types::*;
use super::units::{DEFAULT_UNIT_CODE, is_known_unit_code};

static SERIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,2}[0-9]{3}$").expect("series pattern"));

static REFERENCE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{4}-[0-9]{1,8}$").expect("reference pattern"));

/// Catalog 09: credit note reasons.
const CREDIT_NOTE_REASONS: &[&str] = &[
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12", "13",
];

/// Catalog 10: debit note reasons.
const DEBIT_NOTE_REASONS: &[&str] = &["01", "02", "03", "04", "05", "11"];

/// Validate a raw payload and produce an immutable [`Invoice`].
///
/// Runs three stages in order (structural, semantic, cross-field) and stops at
/// the first stage that reports errors, returning all errors of that stage.
/// Issue date and time default to `now` when absent; the due date defaults to
/// the issue date.
pub fn validate_invoice(
    raw: &RawInvoice,
    now: NaiveDateTime,
) -> Result<Invoice, Vec<ValidationError>> {
    let parsed = structural(raw, now)?;
    let invoice = semantic(parsed)?;
    let errors = cross_field(&invoice);
    if errors.is_empty() {
        Ok(invoice)
    } else {
        Err(errors)
    }
}

// ---------------------------------------------------------------------------
// Structural
// ---------------------------------------------------------------------------

struct Parsed {
    document_type: String,
    series: String,
    number: String,
    issue_date: NaiveDate,
    issue_time: NaiveTime,
    due_date: Option<NaiveDate>,
    currency: String,
    payment_terms: Option<String>,
    gross_taxable: Decimal,
    tax: Decimal,
    tax_inclusive: Decimal,
    payable: Decimal,
    issuer: ParsedParty,
    customer: ParsedParty,
    lines: Vec<ParsedLine>,
    reference: Option<ParsedReference>,
}

struct ParsedParty {
    id_type: String,
    id: String,
    legal_name: String,
    address: Option<Address>,
}

struct ParsedLine {
    id: String,
    quantity: Decimal,
    unit_code: String,
    unit_price: Decimal,
    line_total: Decimal,
    tax_amount: Option<Decimal>,
    description: String,
    product_code: Option<String>,
    classification: Option<String>,
}

struct ParsedReference {
    document_id: String,
    document_type: String,
    reason_code: String,
    description: String,
}

fn structural(raw: &RawInvoice, now: NaiveDateTime) -> Result<Parsed, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let document_type = required_text(raw.document_type.as_ref(), "documentType", &mut errors);

    let series = required_text(raw.series.as_ref(), "series", &mut errors);
    if let Some(s) = &series {
        if !SERIES_RE.is_match(s) {
            errors.push(ValidationError::structural(
                "series",
                format!("'{s}' must be 1-2 uppercase letters followed by 3 digits"),
            ));
        }
    }

    let number = required_text(raw.number.as_ref(), "number", &mut errors).and_then(|n| {
        let padded = pad_number(&n);
        if padded.is_none() {
            errors.push(ValidationError::structural(
                "number",
                format!("'{n}' must be numeric with at most 8 digits"),
            ));
        }
        padded
    });

    let issue_date = match text(raw.issue_date.as_ref()) {
        Some(t) => parse_date(&t, "issueDate", &mut errors),
        None => Some(now.date()),
    };
    let issue_time = match text(raw.issue_time.as_ref()) {
        Some(t) => parse_time(&t, "issueTime", &mut errors),
        None => Some(now.time().with_nanosecond(0).unwrap_or_else(|| now.time())),
    };
    let due_date = text(raw.due_date.as_ref()).and_then(|t| parse_date(&t, "dueDate", &mut errors));

    let currency = required_text(raw.currency.as_ref(), "currency", &mut errors);
    let payment_terms = text(raw.payment_terms.as_ref());

    let gross_taxable = required_decimal(raw.gross_taxable.as_ref(), "grossTaxable", &mut errors);
    let tax = required_decimal(raw.tax.as_ref(), "tax", &mut errors);
    let tax_inclusive = required_decimal(raw.tax_inclusive.as_ref(), "taxInclusive", &mut errors);
    let payable = required_decimal(raw.payable.as_ref(), "payable", &mut errors);

    let issuer = parse_party(raw.issuer.as_ref(), "issuer", true, &mut errors);
    let customer = parse_party(raw.customer.as_ref(), "customer", false, &mut errors);

    let mut lines = Vec::new();
    match raw.lines.as_deref() {
        None | Some([]) => errors.push(ValidationError::structural(
            "lines",
            "document must have at least one line",
        )),
        Some(raw_lines) => {
            for (i, line) in raw_lines.iter().enumerate() {
                if let Some(parsed) = parse_line(line, i, &mut errors) {
                    lines.push(parsed);
                }
            }
        }
    }

    let reference = raw
        .reference
        .as_ref()
        .and_then(|r| parse_reference(r, &mut errors));

    let (
        Some(document_type),
        Some(series),
        Some(number),
        Some(issue_date),
        Some(issue_time),
        Some(currency),
        Some(gross_taxable),
        Some(tax),
        Some(tax_inclusive),
        Some(payable),
        Some(issuer),
        Some(customer),
    ) = (
        document_type,
        series,
        number,
        issue_date,
        issue_time,
        currency,
        gross_taxable,
        tax,
        tax_inclusive,
        payable,
        issuer,
        customer,
    )
    else {
        if errors.is_empty() {
            errors.push(ValidationError::structural("document", "incomplete document"));
        }
        return Err(errors);
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let parsed = Parsed {
        document_type,
        series,
        number,
        issue_date,
        issue_time,
        due_date,
        currency,
        payment_terms,
        gross_taxable,
        tax,
        tax_inclusive,
        payable,
        issuer,
        customer,
        lines,
        reference,
    };
    let errors = xml_text_errors(&parsed);
    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

/// First character of `s` that XML 1.0 does not allow in a document.
///
/// Escaping and CDATA do not help for these; they must not reach the writer.
pub fn first_invalid_xml_char(s: &str) -> Option<char> {
    s.chars().find(|&c| {
        matches!(
            c,
            '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
        )
    })
}

fn xml_text_errors(p: &Parsed) -> Vec<ValidationError> {
    let mut fields: Vec<(String, &str)> = Vec::new();
    for (prefix, party) in [("issuer", &p.issuer), ("customer", &p.customer)] {
        fields.push((format!("{prefix}.id"), &party.id));
        fields.push((format!("{prefix}.legalName"), &party.legal_name));
        if let Some(a) = &party.address {
            for (name, value) in [
                ("ubigeo", &a.ubigeo),
                ("line", &a.line),
                ("district", &a.district),
                ("province", &a.province),
                ("department", &a.department),
                ("country", &a.country_code),
            ] {
                fields.push((format!("{prefix}.address.{name}"), value));
            }
        }
    }
    if let Some(terms) = &p.payment_terms {
        fields.push(("paymentTerms".into(), terms));
    }
    for (i, line) in p.lines.iter().enumerate() {
        fields.push((format!("lines[{i}].id"), &line.id));
        fields.push((format!("lines[{i}].unitCode"), &line.unit_code));
        fields.push((format!("lines[{i}].description"), &line.description));
        if let Some(code) = &line.product_code {
            fields.push((format!("lines[{i}].productCode"), code));
        }
        if let Some(code) = &line.classification {
            fields.push((format!("lines[{i}].classification"), code));
        }
    }
    if let Some(r) = &p.reference {
        fields.push(("reference.documentId".into(), &r.document_id));
        fields.push(("reference.description".into(), &r.description));
    }

    fields
        .into_iter()
        .filter_map(|(field, value)| {
            first_invalid_xml_char(value).map(|c| {
                ValidationError::structural(
                    field,
                    format!("contains U+{:04X}, which is not allowed in XML", u32::from(c)),
                )
            })
        })
        .collect()
}

fn text(value: Option<&RawValue>) -> Option<String> {
    value
        .map(|v| v.as_text().into_owned())
        .filter(|s| !s.is_empty())
}

fn required_text(
    value: Option<&RawValue>,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let t = text(value);
    if t.is_none() {
        errors.push(ValidationError::structural(field, "is required"));
    }
    t
}

fn parse_decimal(t: &str, field: &str, errors: &mut Vec<ValidationError>) -> Option<Decimal> {
    match Decimal::from_str(t).or_else(|_| Decimal::from_scientific(t)) {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push(ValidationError::structural(
                field,
                format!("'{t}' is not a valid number"),
            ));
            None
        }
    }
}

fn required_decimal(
    value: Option<&RawValue>,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<Decimal> {
    let t = required_text(value, field, errors)?;
    parse_decimal(&t, field, errors)
}

fn parse_date(t: &str, field: &str, errors: &mut Vec<ValidationError>) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            errors.push(ValidationError::structural(
                field,
                format!("'{t}' is not a date in YYYY-MM-DD format"),
            ));
            None
        }
    }
}

fn parse_time(t: &str, field: &str, errors: &mut Vec<ValidationError>) -> Option<NaiveTime> {
    match NaiveTime::parse_from_str(t, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(t, "%H:%M")) {
        Ok(time) => Some(time),
        Err(_) => {
            errors.push(ValidationError::structural(
                field,
                format!("'{t}' is not a time in HH:MM:SS format"),
            ));
            None
        }
    }
}

/// Left-pad a document number to eight digits.
fn pad_number(n: &str) -> Option<String> {
    if n.is_empty() || n.len() > 8 || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{n:0>8}"))
}

fn parse_party(
    raw: Option<&RawParty>,
    prefix: &str,
    strict_address: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<ParsedParty> {
    let Some(raw) = raw else {
        errors.push(ValidationError::structural(prefix, "is required"));
        return None;
    };
    let id_type = required_text(raw.id_type.as_ref(), &format!("{prefix}.idType"), errors);
    let id = required_text(raw.id.as_ref(), &format!("{prefix}.id"), errors);
    let legal_name = required_text(raw.legal_name.as_ref(), &format!("{prefix}.legalName"), errors);
    let address = match &raw.address {
        Some(a) => parse_address(a, &format!("{prefix}.address"), strict_address, errors),
        None if strict_address => {
            errors.push(ValidationError::structural(
                format!("{prefix}.address"),
                "is required",
            ));
            None
        }
        None => None,
    };
    Some(ParsedParty {
        id_type: id_type?,
        id: id?,
        legal_name: legal_name?,
        address,
    })
}

fn parse_address(
    raw: &RawAddress,
    prefix: &str,
    strict: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Address> {
    let mut field = |value: Option<&RawValue>, name: &str| -> Option<String> {
        if strict {
            required_text(value, &format!("{prefix}.{name}"), errors)
        } else {
            Some(text(value).unwrap_or_default())
        }
    };
    let ubigeo = field(raw.ubigeo.as_ref(), "ubigeo");
    let line = field(raw.line.as_ref(), "line");
    let district = field(raw.district.as_ref(), "district");
    let province = field(raw.province.as_ref(), "province");
    let department = field(raw.department.as_ref(), "department");
    Some(Address {
        ubigeo: ubigeo?,
        line: line?,
        district: district?,
        province: province?,
        department: department?,
        country_code: text(raw.country.as_ref()).unwrap_or_else(|| "PE".to_string()),
    })
}

fn parse_line(raw: &RawLine, i: usize, errors: &mut Vec<ValidationError>) -> Option<ParsedLine> {
    let prefix = format!("lines[{i}]");
    let quantity = required_decimal(raw.quantity.as_ref(), &format!("{prefix}.quantity"), errors);
    let unit_price =
        required_decimal(raw.unit_price.as_ref(), &format!("{prefix}.unitPrice"), errors);
    let line_total =
        required_decimal(raw.line_total.as_ref(), &format!("{prefix}.lineTotal"), errors);
    let tax_amount = match text(raw.tax_amount.as_ref()) {
        Some(t) => Some(parse_decimal(&t, &format!("{prefix}.taxAmount"), errors)?),
        None => None,
    };
    Some(ParsedLine {
        id: text(raw.id.as_ref()).unwrap_or_else(|| (i + 1).to_string()),
        quantity: quantity?,
        unit_code: text(raw.unit_code.as_ref()).unwrap_or_else(|| DEFAULT_UNIT_CODE.to_string()),
        unit_price: unit_price?,
        line_total: line_total?,
        tax_amount,
        description: text(raw.description.as_ref()).unwrap_or_default(),
        product_code: text(raw.product_code.as_ref()),
        classification: text(raw.classification.as_ref()),
    })
}

fn parse_reference(
    raw: &RawReference,
    errors: &mut Vec<ValidationError>,
) -> Option<ParsedReference> {
    let document_id = required_text(raw.document_id.as_ref(), "reference.documentId", errors);
    let document_type =
        required_text(raw.document_type.as_ref(), "reference.documentType", errors);
    let reason_code = required_text(raw.reason_code.as_ref(), "reference.reasonCode", errors);
    let description = required_text(raw.description.as_ref(), "reference.description", errors);
    Some(ParsedReference {
        document_id: document_id?,
        document_type: document_type?,
        reason_code: reason_code?,
        description: description?,
    })
}

// ---------------------------------------------------------------------------
// Semantic
// ---------------------------------------------------------------------------

fn semantic(p: Parsed) -> Result<Invoice, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let document_type = DocumentType::from_code(&p.document_type);
    if document_type.is_none() {
        errors.push(ValidationError::semantic(
            "documentType",
            format!(
                "'{}' is not a supported document type (01, 03, 07, 08)",
                p.document_type
            ),
        ));
    }

    let currency = Currency::from_code(&p.currency.to_ascii_uppercase());
    if currency.is_none() {
        errors.push(ValidationError::semantic(
            "currency",
            format!("'{}' is not a supported currency (PEN, USD, EUR)", p.currency),
        ));
    }

    let payment_terms = match &p.payment_terms {
        None => Some(PaymentTerms::default()),
        Some(t) => {
            let terms = PaymentTerms::parse(t);
            if terms.is_none() {
                errors.push(ValidationError::semantic(
                    "paymentTerms",
                    format!("'{t}' must be Contado or Credito"),
                ));
            }
            terms
        }
    };

    // Issuer must be a registered taxpayer.
    let issuer_type = IdentityType::from_code(&p.issuer.id_type);
    if issuer_type != Some(IdentityType::Ruc) {
        errors.push(ValidationError::semantic(
            "issuer.idType",
            "issuer must be identified by RUC (6)",
        ));
    } else if !is_valid_ruc(&p.issuer.id) {
        errors.push(ValidationError::checksum(
            "issuer.id",
            format!("'{}' is not a valid RUC", p.issuer.id),
        ));
    }

    let customer_type = IdentityType::from_code(&p.customer.id_type);
    if customer_type.is_none() {
        errors.push(ValidationError::semantic(
            "customer.idType",
            format!("'{}' is not an identity document type of catalog 06", p.customer.id_type),
        ));
    }

    let reference = match document_type {
        Some(kind) if kind.is_note() => validate_reference(kind, p.reference.as_ref(), &mut errors),
        _ => None,
    };

    // Notes follow the customer rules of the document they amend.
    let effective_type = match document_type {
        Some(kind) if kind.is_note() => reference.as_ref().map(|r| r.document_type),
        other => other,
    };

    match effective_type {
        Some(DocumentType::Invoice) => {
            if customer_type != Some(IdentityType::Ruc) {
                errors.push(ValidationError::semantic(
                    "customer.idType",
                    "a factura requires a customer identified by RUC (6)",
                ));
            } else if !is_digits(&p.customer.id, 11) {
                errors.push(ValidationError::semantic(
                    "customer.id",
                    "RUC must have exactly 11 digits",
                ));
            } else if !is_valid_ruc(&p.customer.id) {
                errors.push(ValidationError::checksum(
                    "customer.id",
                    format!("'{}' is not a valid RUC", p.customer.id),
                ));
            }
            if !p.series.starts_with('F') {
                errors.push(ValidationError::semantic(
                    "series",
                    "factura series must start with F",
                ));
            }
        }
        Some(DocumentType::Receipt) => {
            if customer_type != Some(IdentityType::Dni) {
                errors.push(ValidationError::semantic(
                    "customer.idType",
                    "a boleta requires a customer identified by DNI (1)",
                ));
            } else if !is_digits(&p.customer.id, 8) {
                errors.push(ValidationError::semantic(
                    "customer.id",
                    "DNI must have exactly 8 digits",
                ));
            }
            if !p.series.starts_with('B') {
                errors.push(ValidationError::semantic(
                    "series",
                    "boleta series must start with B",
                ));
            }
        }
        _ => {}
    }

    for (field, amount) in [
        ("grossTaxable", p.gross_taxable),
        ("tax", p.tax),
        ("taxInclusive", p.tax_inclusive),
        ("payable", p.payable),
    ] {
        check_amount(amount, field, &mut errors);
    }

    for (i, line) in p.lines.iter().enumerate() {
        validate_line(line, i, &mut errors);
    }

    let due_date = p.due_date.unwrap_or(p.issue_date);
    if due_date < p.issue_date {
        errors.push(ValidationError::semantic(
            "dueDate",
            "due date must not be before the issue date",
        ));
    }

    let (Some(document_type), Some(currency), Some(payment_terms), Some(customer_type)) =
        (document_type, currency, payment_terms, customer_type)
    else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let lines = p
        .lines
        .into_iter()
        .map(|l| LineItem {
            tax_amount: l
                .tax_amount
                .unwrap_or_else(|| round_amount(l.line_total * IGV_RATE)),
            id: l.id,
            quantity: l.quantity,
            unit_code: l.unit_code,
            unit_price: l.unit_price,
            line_total: l.line_total,
            description: l.description,
            product_code: l.product_code,
            classification: l.classification,
        })
        .collect();

    Ok(Invoice {
        document_type,
        series: p.series,
        number: p.number,
        issue_date: p.issue_date,
        issue_time: p.issue_time,
        due_date,
        currency,
        payment_terms,
        issuer: Party {
            id_type: IdentityType::Ruc,
            id: p.issuer.id,
            legal_name: p.issuer.legal_name,
            address: p.issuer.address,
        },
        customer: Party {
            id_type: customer_type,
            id: p.customer.id,
            legal_name: p.customer.legal_name,
            address: p.customer.address,
        },
        lines,
        gross_taxable: p.gross_taxable,
        tax: p.tax,
        tax_inclusive: p.tax_inclusive,
        payable: p.payable,
        reference,
    })
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

fn has_at_most_two_decimals(d: Decimal) -> bool {
    d.normalize().scale() <= 2
}

fn check_amount(amount: Decimal, field: &str, errors: &mut Vec<ValidationError>) {
    if amount < Decimal::ZERO {
        errors.push(ValidationError::semantic(field, "must not be negative"));
    }
    if !has_at_most_two_decimals(amount) {
        errors.push(ValidationError::semantic(
            field,
            format!("{amount} has more than 2 decimal places"),
        ));
    }
}

fn validate_line(line: &ParsedLine, i: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("lines[{i}]");

    if line.quantity <= Decimal::ZERO {
        errors.push(ValidationError::semantic(
            format!("{prefix}.quantity"),
            "quantity must be greater than zero",
        ));
    }
    check_amount(line.unit_price, &format!("{prefix}.unitPrice"), errors);
    check_amount(line.line_total, &format!("{prefix}.lineTotal"), errors);
    if let Some(tax) = line.tax_amount {
        check_amount(tax, &format!("{prefix}.taxAmount"), errors);
    }

    match line.quantity.checked_mul(line.unit_price) {
        Some(expected) => {
            let off = expected
                .checked_sub(line.line_total)
                .is_none_or(|diff| diff.abs() > AMOUNT_TOLERANCE);
            if off {
                errors.push(ValidationError::semantic(
                    format!("{prefix}.lineTotal"),
                    format!(
                        "quantity x unit price = {} does not match line total {}",
                        round_amount(expected),
                        line.line_total
                    ),
                ));
            }
        }
        None => errors.push(ValidationError::semantic(
            format!("{prefix}.lineTotal"),
            "quantity x unit price is out of range",
        )),
    }
    if line.unit_price.checked_mul(Decimal::ONE + IGV_RATE).is_none() {
        errors.push(ValidationError::semantic(
            format!("{prefix}.unitPrice"),
            "unit price including IGV is out of range",
        ));
    }

    if line.description.trim().is_empty() {
        errors.push(ValidationError::semantic(
            format!("{prefix}.description"),
            "description must not be empty",
        ));
    }

    if !is_known_unit_code(&line.unit_code) {
        errors.push(ValidationError::semantic(
            format!("{prefix}.unitCode"),
            format!("'{}' is not a known unit code", line.unit_code),
        ));
    }
}

fn validate_reference(
    kind: DocumentType,
    reference: Option<&ParsedReference>,
    errors: &mut Vec<ValidationError>,
) -> Option<DocumentReference> {
    let Some(r) = reference else {
        errors.push(ValidationError::semantic(
            "reference",
            "credit and debit notes must reference the amended document",
        ));
        return None;
    };

    let document_type = DocumentType::from_code(&r.document_type)
        .filter(|t| matches!(t, DocumentType::Invoice | DocumentType::Receipt));
    if document_type.is_none() {
        errors.push(ValidationError::semantic(
            "reference.documentType",
            "amended document must be a factura (01) or boleta (03)",
        ));
    }

    if !REFERENCE_ID_RE.is_match(&r.document_id) {
        errors.push(ValidationError::semantic(
            "reference.documentId",
            format!("'{}' must have the form SERIES-NUMBER", r.document_id),
        ));
    }

    let reasons = if kind == DocumentType::CreditNote {
        CREDIT_NOTE_REASONS
    } else {
        DEBIT_NOTE_REASONS
    };
    if !reasons.contains(&r.reason_code.as_str()) {
        errors.push(ValidationError::semantic(
            "reference.reasonCode",
            format!("'{}' is not a valid reason code for this note", r.reason_code),
        ));
    }

    Some(DocumentReference {
        id: r.document_id.clone(),
        document_type: document_type?,
        reason_code: r.reason_code.clone(),
        description: r.description.clone(),
    })
}

// ---------------------------------------------------------------------------
// Cross-field
// ---------------------------------------------------------------------------

fn cross_field(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let line_sum = invoice
        .lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, l| sum.checked_add(l.line_total));
    match line_sum {
        Some(sum) if (sum - invoice.gross_taxable).abs() <= AMOUNT_TOLERANCE => {}
        Some(sum) => errors.push(ValidationError::cross_field(
            "grossTaxable",
            format!(
                "gross taxable {} does not match sum of line totals {}",
                invoice.gross_taxable, sum
            ),
        )),
        None => errors.push(ValidationError::cross_field(
            "grossTaxable",
            "sum of line totals is out of range",
        )),
    }

    let expected_tax = round_amount(invoice.gross_taxable * IGV_RATE);
    if (expected_tax - invoice.tax).abs() > AMOUNT_TOLERANCE {
        errors.push(ValidationError::cross_field(
            "tax",
            format!(
                "tax {} does not match 18% of gross taxable ({})",
                invoice.tax, expected_tax
            ),
        ));
    }

    let inclusive_matches = invoice
        .gross_taxable
        .checked_add(invoice.tax)
        .is_some_and(|expected| (expected - invoice.tax_inclusive).abs() <= AMOUNT_TOLERANCE);
    if !inclusive_matches {
        errors.push(ValidationError::cross_field(
            "taxInclusive",
            format!(
                "tax inclusive amount {} does not match gross taxable {} + tax {}",
                invoice.tax_inclusive, invoice.gross_taxable, invoice.tax
            ),
        ));
    }

    if (invoice.payable - invoice.tax_inclusive).abs() > AMOUNT_TOLERANCE {
        errors.push(ValidationError::cross_field(
            "payable",
            format!(
                "payable amount {} does not match tax inclusive amount {}",
                invoice.payable, invoice.tax_inclusive
            ),
        ));
    }

    if invoice.payable <= Decimal::ZERO {
        errors.push(ValidationError::cross_field(
            "payable",
            "payable amount must be greater than zero",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_padding() {
        assert_eq!(pad_number("123").as_deref(), Some("00000123"));
        assert_eq!(pad_number("12345678").as_deref(), Some("12345678"));
        assert_eq!(pad_number("123456789"), None);
        assert_eq!(pad_number("12a"), None);
        assert_eq!(pad_number(""), None);
    }

    #[test]
    fn series_pattern() {
        assert!(SERIES_RE.is_match("F001"));
        assert!(!SERIES_RE.is_match("FC01"));
        assert!(SERIES_RE.is_match("BB123"));
        assert!(!SERIES_RE.is_match("f001"));
        assert!(!SERIES_RE.is_match("F0001"));
    }

    #[test]
    fn decimal_places() {
        assert!(has_at_most_two_decimals(Decimal::new(15678, 2)));
        assert!(has_at_most_two_decimals(Decimal::new(1500, 3)));
        assert!(!has_at_most_two_decimals(Decimal::new(1501, 3)));
    }
}
