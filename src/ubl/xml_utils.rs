use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{CpeError, first_invalid_xml_char, round_amount};

pub type XmlResult = Result<String, CpeError>;

fn xml_io(e: std::io::Error) -> CpeError {
    CpeError::Build(format!("XML write error: {e}"))
}

fn xml_chars(name: &str, text: &str) -> Result<(), CpeError> {
    match first_invalid_xml_char(text) {
        Some(c) => Err(CpeError::Build(format!(
            "{name}: U+{:04X} is not allowed in XML",
            u32::from(c)
        ))),
        None => Ok(()),
    }
}

pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, CpeError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    /// Writer for an embeddable fragment: no XML declaration, no indentation.
    pub fn fragment() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    pub fn into_string(self) -> Result<String, CpeError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| CpeError::Build(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            xml_chars(k, v)?;
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// Write a self-closing element (`<name/>`).
    pub fn empty_element(&mut self, name: &str) -> Result<&mut Self, CpeError> {
        self.writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, CpeError> {
        xml_chars(name, text)?;
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, CpeError> {
        xml_chars(name, text)?;
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write free text wrapped in CDATA.
    ///
    /// A literal `]]>` cannot appear inside a CDATA section, so the text is
    /// split into consecutive sections around it.
    pub fn cdata_element(&mut self, name: &str, text: &str) -> Result<&mut Self, CpeError> {
        xml_chars(name, text)?;
        self.start_element(name)?;
        let mut rest = text;
        while let Some(pos) = rest.find("]]>") {
            self.write_cdata(&rest[..pos + 2])?;
            rest = &rest[pos + 2..];
        }
        self.write_cdata(rest)?;
        self.end_element(name)
    }

    fn write_cdata(&mut self, content: &str) -> Result<(), CpeError> {
        self.writer
            .write_event(Event::CData(BytesCData::new(content)))
            .map_err(xml_io)
    }

    /// Write a monetary amount with currencyID attribute and exactly two decimals.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<&mut Self, CpeError> {
        self.text_element_with_attrs(name, &format_amount(amount), &[("currencyID", currency)])
    }

    /// Write a quantity with unitCode attribute.
    pub fn quantity_element(
        &mut self,
        name: &str,
        qty: Decimal,
        unit: &str,
    ) -> Result<&mut Self, CpeError> {
        self.text_element_with_attrs(
            name,
            &format_decimal(qty),
            &[
                ("unitCode", unit),
                ("unitCodeListID", "UN/ECE rec 20"),
                (
                    "unitCodeListAgencyName",
                    "United Nations Economic Commission for Europe",
                ),
            ],
        )
    }
}

/// Format a monetary amount with exactly two decimals, rounding half away
/// from zero.
pub fn format_amount(d: Decimal) -> String {
    let mut rounded = round_amount(d);
    rounded.rescale(2);
    rounded.to_string()
}

/// Format a Decimal for XML output: at least 2 decimal places, trailing
/// zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(100)), "100.00");
        assert_eq!(format_decimal(dec!(1500.0)), "1500.00");
        assert_eq!(format_decimal(dec!(2.5)), "2.50");
        assert_eq!(format_decimal(dec!(0.005)), "0.005");
    }

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(185)), "185.00");
        assert_eq!(format_amount(dec!(28.2204)), "28.22");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(156.780)), "156.78");
    }

    #[test]
    fn cdata_splits_terminator() {
        let mut w = XmlWriter::new().unwrap();
        w.cdata_element("cbc:Name", "A]]>B").unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("<cbc:Name><![CDATA[A]]]]><![CDATA[>B]]></cbc:Name>"));
    }

    #[test]
    fn forbidden_characters_are_refused() {
        let mut w = XmlWriter::new().unwrap();
        assert!(matches!(
            w.cdata_element("cbc:Description", "A\u{1}B"),
            Err(CpeError::Build(msg)) if msg.contains("U+0001")
        ));
        assert!(w.text_element("cbc:Note", "x\u{FFFF}").is_err());
        assert!(
            w.text_element_with_attrs("cbc:Note", "ok", &[("languageID", "\u{0}")])
                .is_err()
        );
        w.cdata_element("cbc:Description", "tab\tand\nnewline").unwrap();
    }

    #[test]
    fn fragment_has_no_declaration_or_indent() {
        let mut w = XmlWriter::fragment();
        w.start_element("ds:X509Data").unwrap();
        w.text_element("ds:X509Certificate", "MII&").unwrap();
        w.end_element("ds:X509Data").unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "<ds:X509Data><ds:X509Certificate>MII&amp;</ds:X509Certificate></ds:X509Data>"
        );
    }

    #[test]
    fn empty_element_is_self_closing() {
        let mut w = XmlWriter::new().unwrap();
        w.start_element("ext:UBLExtension").unwrap();
        w.empty_element("ext:ExtensionContent").unwrap();
        w.end_element("ext:UBLExtension").unwrap();
        let xml = w.into_string().unwrap();
        assert!(xml.contains("<ext:ExtensionContent/>"));
    }
}
