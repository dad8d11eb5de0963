//! Attribute values attached to datasets and variables.

use indexmap::IndexMap;

/// An attribute value.
///
/// Integer vectors are widened to `Numbers`. Attribute types without a
/// counterpart here are skipped when reading.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Texts(Vec<String>),
    Integer(i64),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar numeric value, also accepting single-element vectors.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Numbers(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    pub(crate) fn from_netcdf(value: netcdf::AttributeValue) -> Option<Self> {
        use netcdf::AttributeValue as V;

        let converted = match value {
            V::Str(s) => Self::Text(s),
            V::Strs(v) => Self::Texts(v),
            V::Schar(v) => Self::Integer(v as i64),
            V::Uchar(v) => Self::Integer(v as i64),
            V::Short(v) => Self::Integer(v as i64),
            V::Ushort(v) => Self::Integer(v as i64),
            V::Int(v) => Self::Integer(v as i64),
            V::Uint(v) => Self::Integer(v as i64),
            V::Longlong(v) => Self::Integer(v),
            V::Float(v) => Self::Number(v as f64),
            V::Double(v) => Self::Number(v),
            V::Shorts(v) => Self::Numbers(v.into_iter().map(f64::from).collect()),
            V::Ints(v) => Self::Numbers(v.into_iter().map(f64::from).collect()),
            V::Floats(v) => Self::Numbers(v.into_iter().map(f64::from).collect()),
            V::Doubles(v) => Self::Numbers(v),
            _ => return None,
        };
        Some(converted)
    }

    pub(crate) fn to_netcdf(&self) -> netcdf::AttributeValue {
        use netcdf::AttributeValue as V;

        match self {
            Self::Text(s) => V::Str(s.clone()),
            Self::Texts(v) => V::Strs(v.clone()),
            Self::Integer(v) => match i32::try_from(*v) {
                Ok(small) => V::Int(small),
                Err(_) => V::Longlong(*v),
            },
            Self::Number(v) => V::Double(*v),
            Self::Numbers(v) => V::Doubles(v.clone()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Named attributes in file order.
pub type Attributes = IndexMap<String, AttrValue>;

/// Text value of attribute `name`, if present and textual.
pub fn text_attr<'a>(attrs: &'a Attributes, name: &str) -> Option<&'a str> {
    attrs.get(name).and_then(AttrValue::as_text)
}

/// Numeric value of attribute `name`, if present and scalar.
pub fn number_attr(attrs: &Attributes, name: &str) -> Option<f64> {
    attrs.get(name).and_then(AttrValue::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let mut attrs = Attributes::new();
        attrs.insert("units".to_string(), "K".into());
        attrs.insert("scale_factor".to_string(), AttrValue::Numbers(vec![0.5]));
        attrs.insert("realization".to_string(), 1i64.into());

        assert_eq!(text_attr(&attrs, "units"), Some("K"));
        assert_eq!(number_attr(&attrs, "scale_factor"), Some(0.5));
        assert_eq!(number_attr(&attrs, "realization"), Some(1.0));
        assert_eq!(text_attr(&attrs, "realization"), None);
        assert_eq!(number_attr(&attrs, "missing"), None);
    }

    #[test]
    fn test_large_integer_written_as_longlong() {
        let value = AttrValue::Integer(i64::MAX);
        assert!(matches!(value.to_netcdf(), netcdf::AttributeValue::Longlong(_)));

        let value = AttrValue::Integer(3);
        assert!(matches!(value.to_netcdf(), netcdf::AttributeValue::Int(3)));
    }
}
