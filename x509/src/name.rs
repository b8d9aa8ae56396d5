use std::fmt::Display;

use x509ck::decoder::{DecodableFrom, Decoder};
use x509ck_asn1::{Element, ObjectIdentifier};

use crate::error::{Error, Result};

/*
https://datatracker.ietf.org/doc/html/rfc5280#section-4.1.2.4

Name ::= CHOICE { -- only one possibility for now --
  rdnSequence  RDNSequence }

RDNSequence ::= SEQUENCE OF RelativeDistinguishedName

RelativeDistinguishedName ::=
  SET SIZE (1..MAX) OF AttributeTypeAndValue

AttributeTypeAndValue ::= SEQUENCE {
  type     AttributeType,
  value    AttributeValue }
 */

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name {
    rdn_sequence: Vec<RelativeDistinguishedName>,
}

impl Name {
    pub fn rdn_sequence(&self) -> &[RelativeDistinguishedName] {
        &self.rdn_sequence
    }

    pub fn is_empty(&self) -> bool {
        self.rdn_sequence.is_empty()
    }

    /// First value stored under `attribute_type`, in encoding order.
    pub fn get(&self, attribute_type: &str) -> Option<&str> {
        self.rdn_sequence
            .iter()
            .flat_map(|rdn| rdn.attributes.iter())
            .find(|attribute| attribute.attribute_type == attribute_type)
            .map(|attribute| attribute.value())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.get(AttributeTypeAndValue::OID_COMMON_NAME)
    }
}

impl DecodableFrom<Element> for Name {}

impl Decoder<Element, Name> for Element {
    type Error = Error;

    fn decode(&self) -> Result<Name> {
        let Element::Sequence(elements) = self else {
            return Err(Error::InvalidName("expected sequence".to_string()));
        };
        let rdn_sequence = elements
            .iter()
            .map(|elem| elem.decode())
            .collect::<Result<Vec<RelativeDistinguishedName>>>()?;
        Ok(Name { rdn_sequence })
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rdns = self
            .rdn_sequence
            .iter()
            .map(|rdn| rdn.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", rdns.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    attributes: Vec<AttributeTypeAndValue>,
}

impl RelativeDistinguishedName {
    pub fn attributes(&self) -> &[AttributeTypeAndValue] {
        &self.attributes
    }
}

impl DecodableFrom<Element> for RelativeDistinguishedName {}

impl Decoder<Element, RelativeDistinguishedName> for Element {
    type Error = Error;

    fn decode(&self) -> Result<RelativeDistinguishedName> {
        let Element::Set(elements) = self else {
            return Err(Error::InvalidName(
                "expected set for relative distinguished name".to_string(),
            ));
        };
        if elements.is_empty() {
            return Err(Error::InvalidName(
                "empty relative distinguished name".to_string(),
            ));
        }
        let attributes = elements
            .iter()
            .map(|elem| elem.decode())
            .collect::<Result<Vec<AttributeTypeAndValue>>>()?;
        Ok(RelativeDistinguishedName { attributes })
    }
}

impl Display for RelativeDistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attributes = self
            .attributes
            .iter()
            .map(|attribute| attribute.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", attributes.join(" + "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    attribute_type: ObjectIdentifier,
    attribute_value: String,
}

impl AttributeTypeAndValue {
    pub const OID_COMMON_NAME: &'static str = "2.5.4.3";
    pub const OID_SURNAME: &'static str = "2.5.4.4";
    pub const OID_SERIAL_NUMBER: &'static str = "2.5.4.5";
    pub const OID_COUNTRY_NAME: &'static str = "2.5.4.6";
    pub const OID_LOCALITY_NAME: &'static str = "2.5.4.7";
    pub const OID_STATE_OR_PROVINCE_NAME: &'static str = "2.5.4.8";
    pub const OID_STREET_ADDRESS: &'static str = "2.5.4.9";
    pub const OID_ORGANIZATION_NAME: &'static str = "2.5.4.10";
    pub const OID_ORGANIZATIONAL_UNIT_NAME: &'static str = "2.5.4.11";
    pub const OID_POSTAL_CODE: &'static str = "2.5.4.17";
    pub const OID_DOMAIN_COMPONENT: &'static str = "0.9.2342.19200300.100.1.25";
    pub const OID_EMAIL_ADDRESS: &'static str = "1.2.840.113549.1.9.1";

    pub fn attribute_type(&self) -> &ObjectIdentifier {
        &self.attribute_type
    }

    pub fn value(&self) -> &str {
        &self.attribute_value
    }

    /// Short label used when printing a name, if the type has one.
    pub fn short_name(&self) -> Option<&'static str> {
        let name = match self.attribute_type.to_string().as_str() {
            Self::OID_COMMON_NAME => "CN",
            Self::OID_SURNAME => "SN",
            Self::OID_SERIAL_NUMBER => "serialNumber",
            Self::OID_COUNTRY_NAME => "C",
            Self::OID_LOCALITY_NAME => "L",
            Self::OID_STATE_OR_PROVINCE_NAME => "ST",
            Self::OID_STREET_ADDRESS => "street",
            Self::OID_ORGANIZATION_NAME => "O",
            Self::OID_ORGANIZATIONAL_UNIT_NAME => "OU",
            Self::OID_POSTAL_CODE => "postalCode",
            Self::OID_DOMAIN_COMPONENT => "DC",
            Self::OID_EMAIL_ADDRESS => "emailAddress",
            _ => return None,
        };
        Some(name)
    }
}

impl DecodableFrom<Element> for AttributeTypeAndValue {}

impl Decoder<Element, AttributeTypeAndValue> for Element {
    type Error = Error;

    fn decode(&self) -> Result<AttributeTypeAndValue> {
        let Element::Sequence(seq) = self else {
            return Err(Error::InvalidAttributeTypeAndValue(
                "expected sequence".to_string(),
            ));
        };
        let [Element::ObjectIdentifier(attribute_type), value] = seq.as_slice() else {
            return Err(Error::InvalidAttributeTypeAndValue(
                "expected an object identifier and a value".to_string(),
            ));
        };

        // DirectoryString and friends; anything else is kept in printable form
        let attribute_value = match value {
            Element::Sequence(_) | Element::Set(_) => {
                return Err(Error::InvalidAttributeTypeAndValue(format!(
                    "unsupported value for {attribute_type}"
                )));
            }
            value => value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        };

        Ok(AttributeTypeAndValue {
            attribute_type: attribute_type.clone(),
            attribute_value,
        })
    }
}

impl Display for AttributeTypeAndValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.short_name() {
            Some(name) => write!(f, "{name}={}", self.attribute_value),
            None => write!(f, "{}={}", self.attribute_type, self.attribute_value),
        }
    }
}
