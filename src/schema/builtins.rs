//! XSD built-in simple types
//!
//! The built-in datatypes of XML Schema 1.0 with their derivation from one
//! another. [`crate::schema::SchemaModel`] pre-registers one type per kind
//! so schema documents can reference them as `xs:<name>`.

use serde::Serialize;

/// Built-in simple type of XML Schema
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BuiltinKind {
    AnySimpleType,
    // string family
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NcName,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    NmToken,
    NmTokens,
    // boolean
    Boolean,
    // numbers
    Decimal,
    Integer,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    PositiveInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    NonPositiveInteger,
    NegativeInteger,
    Float,
    Double,
    // date and time
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    // binary
    HexBinary,
    Base64Binary,
    // other
    AnyUri,
    QName,
    Notation,
}

/// Family of a built-in type, driving control selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypeFamily {
    /// Character data
    String,
    /// true/false
    Boolean,
    /// Decimal, integer and floating point types
    Numeric,
    /// Date, time and duration types
    Temporal,
    /// hexBinary and base64Binary
    Binary,
    /// Anything else (anyURI, QName, NOTATION, anySimpleType)
    Other,
}

use BuiltinKind::*;

/// Every built-in kind, with its XSD name and base kind
const BUILTINS: &[(BuiltinKind, &str, Option<BuiltinKind>)] = &[
    (AnySimpleType, "anySimpleType", None),
    (String, "string", Some(AnySimpleType)),
    (NormalizedString, "normalizedString", Some(String)),
    (Token, "token", Some(NormalizedString)),
    (Language, "language", Some(Token)),
    (Name, "Name", Some(Token)),
    (NcName, "NCName", Some(Name)),
    (Id, "ID", Some(NcName)),
    (IdRef, "IDREF", Some(NcName)),
    (IdRefs, "IDREFS", Some(AnySimpleType)),
    (Entity, "ENTITY", Some(NcName)),
    (Entities, "ENTITIES", Some(AnySimpleType)),
    (NmToken, "NMTOKEN", Some(Token)),
    (NmTokens, "NMTOKENS", Some(AnySimpleType)),
    (Boolean, "boolean", Some(AnySimpleType)),
    (Decimal, "decimal", Some(AnySimpleType)),
    (Integer, "integer", Some(Decimal)),
    (Long, "long", Some(Integer)),
    (Int, "int", Some(Long)),
    (Short, "short", Some(Int)),
    (Byte, "byte", Some(Short)),
    (NonNegativeInteger, "nonNegativeInteger", Some(Integer)),
    (PositiveInteger, "positiveInteger", Some(NonNegativeInteger)),
    (UnsignedLong, "unsignedLong", Some(NonNegativeInteger)),
    (UnsignedInt, "unsignedInt", Some(UnsignedLong)),
    (UnsignedShort, "unsignedShort", Some(UnsignedInt)),
    (UnsignedByte, "unsignedByte", Some(UnsignedShort)),
    (NonPositiveInteger, "nonPositiveInteger", Some(Integer)),
    (NegativeInteger, "negativeInteger", Some(NonPositiveInteger)),
    (Float, "float", Some(AnySimpleType)),
    (Double, "double", Some(AnySimpleType)),
    (Duration, "duration", Some(AnySimpleType)),
    (DateTime, "dateTime", Some(AnySimpleType)),
    (Time, "time", Some(AnySimpleType)),
    (Date, "date", Some(AnySimpleType)),
    (GYearMonth, "gYearMonth", Some(AnySimpleType)),
    (GYear, "gYear", Some(AnySimpleType)),
    (GMonthDay, "gMonthDay", Some(AnySimpleType)),
    (GDay, "gDay", Some(AnySimpleType)),
    (GMonth, "gMonth", Some(AnySimpleType)),
    (HexBinary, "hexBinary", Some(AnySimpleType)),
    (Base64Binary, "base64Binary", Some(AnySimpleType)),
    (AnyUri, "anyURI", Some(AnySimpleType)),
    (QName, "QName", Some(AnySimpleType)),
    (Notation, "NOTATION", Some(AnySimpleType)),
];

impl BuiltinKind {
    /// All kinds, bases before the kinds derived from them
    pub fn all() -> impl Iterator<Item = BuiltinKind> {
        BUILTINS.iter().map(|(kind, _, _)| *kind)
    }

    /// Look up a kind by its local XSD name
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(kind, _, _)| *kind)
    }

    fn entry(self) -> &'static (BuiltinKind, &'static str, Option<BuiltinKind>) {
        // every variant has a table row
        BUILTINS
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .unwrap_or(&BUILTINS[0])
    }

    /// Local XSD name
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Kind this one is derived from (None for anySimpleType)
    pub fn base(self) -> Option<BuiltinKind> {
        self.entry().2
    }

    /// Item kind of the built-in list types
    pub fn list_item(self) -> Option<BuiltinKind> {
        match self {
            IdRefs => Some(IdRef),
            Entities => Some(Entity),
            NmTokens => Some(NmToken),
            _ => None,
        }
    }

    /// Family used to pick a control
    pub fn family(self) -> TypeFamily {
        match self {
            Boolean => TypeFamily::Boolean,
            Decimal | Integer | Long | Int | Short | Byte | NonNegativeInteger
            | PositiveInteger | UnsignedLong | UnsignedInt | UnsignedShort | UnsignedByte
            | NonPositiveInteger | NegativeInteger | Float | Double => TypeFamily::Numeric,
            Duration | DateTime | Time | Date | GYearMonth | GYear | GMonthDay | GDay
            | GMonth => TypeFamily::Temporal,
            HexBinary | Base64Binary => TypeFamily::Binary,
            AnySimpleType | AnyUri | QName | Notation => TypeFamily::Other,
            _ => TypeFamily::String,
        }
    }

    /// Name with the conventional `xs` prefix
    pub fn prefixed_name(self) -> std::string::String {
        format!("xs:{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_entry() {
        for kind in BuiltinKind::all() {
            assert_eq!(BuiltinKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(BuiltinKind::all().count(), BUILTINS.len());
    }

    #[test]
    fn test_base_chain_reaches_any_simple_type() {
        let mut kind = BuiltinKind::UnsignedByte;
        let mut steps = 0;
        while let Some(base) = kind.base() {
            kind = base;
            steps += 1;
        }
        assert_eq!(kind, BuiltinKind::AnySimpleType);
        assert_eq!(steps, 7);
    }

    #[test]
    fn test_families() {
        assert_eq!(BuiltinKind::Token.family(), TypeFamily::String);
        assert_eq!(BuiltinKind::Boolean.family(), TypeFamily::Boolean);
        assert_eq!(BuiltinKind::Float.family(), TypeFamily::Numeric);
        assert_eq!(BuiltinKind::GYear.family(), TypeFamily::Temporal);
        assert_eq!(BuiltinKind::Base64Binary.family(), TypeFamily::Binary);
        assert_eq!(BuiltinKind::NmTokens.list_item(), Some(BuiltinKind::NmToken));
        assert_eq!(BuiltinKind::from_name("nonsense"), None);
    }
}
