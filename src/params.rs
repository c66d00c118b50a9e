use std::fmt;

/// Query string parameters for a GET request.
///
/// Pairs are sent in insertion order; duplicate keys are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    /// Builds a query from key/value pairs.
    ///
    /// Values only need `ToString`, so numbers can be passed directly.
    pub fn pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string()))
                .collect(),
        )
    }

    /// Appends one pair.
    pub fn push(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

impl From<()> for Query {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl<K, V> From<Vec<(K, V)>> for Query
where
    K: Into<String>,
    V: ToString,
{
    fn from(values: Vec<(K, V)>) -> Self {
        Self::pairs(values)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Query
where
    K: Into<String>,
    V: ToString,
{
    fn from(values: [(K, V); N]) -> Self {
        Self::pairs(values)
    }
}
