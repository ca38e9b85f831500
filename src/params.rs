/// A single option value. `Null` marks an option as explicitly absent; it is pruned before the
/// request goes out, while an empty `Text` is sent as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null)
    }

    /// Wire form of a scalar value; `None` for `Null` and `List`.
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            Param::Text(s) => Some(s.clone()),
            Param::Int(n) => Some(n.to_string()),
            Param::Bool(b) => Some(b.to_string()),
            Param::Null | Param::List(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Param::Null => "null",
            Param::Text(_) => "text",
            Param::Int(_) => "integer",
            Param::Bool(_) => "boolean",
            Param::List(_) => "list",
        }
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

macro_rules! int_param {
    ($($t:ty),*) => {
        $(impl From<$t> for Param {
            fn from(v: $t) -> Self {
                Param::Int(i64::from(v))
            }
        })*
    };
}

int_param!(i8, i16, i32, i64, u8, u16, u32);

impl From<Vec<String>> for Param {
    fn from(v: Vec<String>) -> Self {
        Param::List(v)
    }
}

impl From<Vec<&str>> for Param {
    fn from(v: Vec<&str>) -> Self {
        Param::List(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Param {
    fn from(v: [&str; N]) -> Self {
        Param::List(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

/// The options of one logical call, in insertion order.
///
/// Option names are checked against the operation's whitelist when the request is built, so
/// any name can be set here. Column equality filters for row queries live in a separate list
/// (see [`Params::filter`]) and are never mistaken for SoQL options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    options: Vec<(String, Param)>,
    filters: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any earlier value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Param>) {
        let name = name.into();
        let value = value.into();
        match self.options.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.options.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Param> {
        let idx = self.options.iter().position(|(k, _)| k == name)?;
        Some(self.options.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.options.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds a column equality filter (`?column=value`) to a row query.
    pub fn filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.filters.is_empty()
    }
}

impl<K: Into<String>, V: Into<Param>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
