//! Exclusive XML Canonicalization 1.0 (without comments) through libxml2.
//!
//! Documents are parsed strictly: recoverable well-formedness errors are
//! reported instead of being repaired before canonicalization.

use libxml::parser::{Parser, ParserOptions};
use libxml::tree::{Document, c14n};
use libxml::xpath;
use thiserror::Error;

use crate::ubl::ubl_ns;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum C14nError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("element {{{namespace}}}{local_name} not found")]
    NotFound {
        namespace: String,
        local_name: String,
    },

    #[error("canonicalization failed: {0}")]
    Canonicalize(String),
}

fn exclusive() -> c14n::CanonicalizationOptions {
    c14n::CanonicalizationOptions {
        mode: c14n::CanonicalizationMode::ExclusiveCanonical1_0,
        inclusive_ns_prefixes: vec![],
        with_comments: false,
    }
}

fn parse(xml: &str) -> Result<Document, C14nError> {
    let options = ParserOptions {
        recover: false,
        no_error: true,
        no_warning: true,
        no_net: true,
        ..Default::default()
    };
    Parser::default()
        .parse_string_with_options(xml, options)
        .map_err(|e| C14nError::Xml(format!("{e:?}")))
}

fn find_elements(
    doc: &Document,
    namespace: &str,
    local_name: &str,
) -> Result<Vec<libxml::tree::Node>, C14nError> {
    let ctx = xpath::Context::new(doc)
        .map_err(|e| C14nError::Canonicalize(format!("XPath context error: {e:?}")))?;
    let expr = format!("//*[local-name()='{local_name}' and namespace-uri()='{namespace}']");
    Ok(ctx
        .evaluate(&expr)
        .map_err(|e| C14nError::Canonicalize(format!("XPath error: {e:?}")))?
        .get_nodes_as_vec())
}

/// Canonicalize a whole document.
pub fn canonicalize(xml: &str) -> Result<String, C14nError> {
    let doc = parse(xml)?;
    doc.canonicalize(exclusive(), None)
        .map_err(|e| C14nError::Canonicalize(format!("{e:?}")))
}

/// Canonicalize a whole document after the enveloped-signature transform,
/// i.e. with every `ds:Signature` subtree removed.
pub fn canonicalize_enveloped(xml: &str) -> Result<String, C14nError> {
    let doc = parse(xml)?;
    for mut signature in find_elements(&doc, ubl_ns::DS, "Signature")? {
        signature.unlink();
    }
    doc.canonicalize(exclusive(), None)
        .map_err(|e| C14nError::Canonicalize(format!("{e:?}")))
}

/// Canonicalize the first element named `{namespace}local_name` together
/// with the namespaces it visibly uses from its ancestors.
pub fn canonicalize_element(
    xml: &str,
    namespace: &str,
    local_name: &str,
) -> Result<String, C14nError> {
    let doc = parse(xml)?;
    let mut element = find_elements(&doc, namespace, local_name)?
        .into_iter()
        .next()
        .ok_or_else(|| C14nError::NotFound {
            namespace: namespace.to_string(),
            local_name: local_name.to_string(),
        })?;
    element
        .canonicalize(exclusive())
        .map_err(|e| C14nError::Canonicalize(format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_attributes_and_expands_empty_elements() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<a:root xmlns:b="urn:b" xmlns:a="urn:a" z="1" b:y="2" a="3"><a:child/></a:root>"#;
        assert_eq!(
            canonicalize(xml).unwrap(),
            r#"<a:root xmlns:a="urn:a" xmlns:b="urn:b" a="3" z="1" b:y="2"><a:child></a:child></a:root>"#
        );
    }

    #[test]
    fn drops_unused_namespaces() {
        let xml = r#"<root xmlns="urn:r" xmlns:x="urn:x"><child/></root>"#;
        assert_eq!(
            canonicalize(xml).unwrap(),
            r#"<root xmlns="urn:r"><child></child></root>"#
        );
    }

    #[test]
    fn declares_namespace_at_first_use() {
        let xml = r#"<r xmlns:x="urn:x"><x:a><x:b/></x:a></r>"#;
        assert_eq!(
            canonicalize(xml).unwrap(),
            r#"<r><x:a xmlns:x="urn:x"><x:b></x:b></x:a></r>"#
        );
    }

    #[test]
    fn escapes_text_and_cdata() {
        let xml = r#"<r a="x&quot;y&lt;">1 &lt; 2 &amp; 3 &gt; 0<![CDATA[<&>]]></r>"#;
        assert_eq!(
            canonicalize(xml).unwrap(),
            r#"<r a="x&quot;y&lt;">1 &lt; 2 &amp; 3 &gt; 0&lt;&amp;&gt;</r>"#
        );
    }

    #[test]
    fn drops_comments_and_declaration() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- header -->\n<r><!-- c -->t</r>\n";
        assert_eq!(canonicalize(xml).unwrap(), "<r>t</r>");
    }

    #[test]
    fn enveloped_transform_removes_signature() {
        let xml = r#"<r xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><a>1</a><ds:Signature Id="S"><ds:X/></ds:Signature></r>"#;
        assert_eq!(canonicalize_enveloped(xml).unwrap(), "<r><a>1</a></r>");
        assert!(canonicalize(xml).unwrap().contains("ds:Signature"));
    }

    #[test]
    fn element_carries_used_namespaces_only() {
        let xml = r#"<r xmlns="urn:r" xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:Signature><ds:SignedInfo Id="x"><ds:Ref URI=""/></ds:SignedInfo></ds:Signature></r>"#;
        assert_eq!(
            canonicalize_element(xml, ubl_ns::DS, "SignedInfo").unwrap(),
            r#"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#" Id="x"><ds:Ref URI=""></ds:Ref></ds:SignedInfo>"#
        );
    }

    #[test]
    fn element_not_found() {
        let err = canonicalize_element("<r/>", ubl_ns::DS, "SignedInfo").unwrap_err();
        assert!(matches!(err, C14nError::NotFound { .. }));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(canonicalize("<r><a></r>"), Err(C14nError::Xml(_))));
        assert!(canonicalize("<r>").is_err());
    }
}
