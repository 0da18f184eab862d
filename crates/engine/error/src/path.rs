use std::fmt;

/// A line/column position in the query text, 1-based like the parser reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub const fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Path of a field in the response, e.g. `user.friends[2].name`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default, Hash)]
pub struct ResponsePath(Vec<ResponsePathSegment>);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum ResponsePathSegment {
    Field(Box<str>),
    Index(usize),
}

impl std::ops::Deref for ResponsePath {
    type Target = Vec<ResponsePathSegment>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ResponsePath {
    pub fn root() -> Self {
        ResponsePath(Vec::new())
    }

    #[must_use]
    pub fn child(&self, key: impl Into<ResponsePathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(key.into());
        ResponsePath(segments)
    }
}

impl From<&str> for ResponsePathSegment {
    fn from(key: &str) -> Self {
        ResponsePathSegment::Field(key.into())
    }
}

impl From<String> for ResponsePathSegment {
    fn from(key: String) -> Self {
        ResponsePathSegment::Field(key.into_boxed_str())
    }
}

impl From<usize> for ResponsePathSegment {
    fn from(index: usize) -> Self {
        ResponsePathSegment::Index(index)
    }
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                ResponsePathSegment::Field(name) if i == 0 => f.write_str(name)?,
                ResponsePathSegment::Field(name) => write!(f, ".{name}")?,
                ResponsePathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl serde::Serialize for ResponsePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            match segment {
                ResponsePathSegment::Field(name) => seq.serialize_element(name.as_ref())?,
                ResponsePathSegment::Index(index) => seq.serialize_element(index)?,
            }
        }
        seq.end()
    }
}

/// Where in the request a message originates: a position in the query text
/// and, once execution started, the response path of the field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct SourceOrigin {
    pub location: Option<Location>,
    pub path: Option<ResponsePath>,
}

impl SourceOrigin {
    pub fn none() -> Self {
        SourceOrigin::default()
    }

    pub fn at(location: Location) -> Self {
        SourceOrigin {
            location: Some(location),
            path: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: ResponsePath) -> Self {
        self.path = Some(path);
        self
    }
}

impl From<Location> for SourceOrigin {
    fn from(location: Location) -> Self {
        SourceOrigin::at(location)
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.location, &self.path) {
            (Some(location), Some(path)) => write!(f, "{path} ({location})"),
            (Some(location), None) => location.fmt(f),
            (None, Some(path)) => path.fmt(f),
            (None, None) => f.write_str("<unknown>"),
        }
    }
}
