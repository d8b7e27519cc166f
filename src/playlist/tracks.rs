use std::ops::Index;

/// Ordered track sources. Length and order never change after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackList(Vec<String>);

impl TrackList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Index<usize> for TrackList {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

impl From<&str> for TrackList {
    fn from(source: &str) -> Self {
        Self(vec![source.to_string()])
    }
}

impl From<String> for TrackList {
    fn from(source: String) -> Self {
        Self(vec![source])
    }
}

impl From<Vec<String>> for TrackList {
    fn from(sources: Vec<String>) -> Self {
        Self(sources)
    }
}

impl From<Vec<&str>> for TrackList {
    fn from(sources: Vec<&str>) -> Self {
        sources.into_iter().collect()
    }
}

impl<const N: usize> From<[&str; N]> for TrackList {
    fn from(sources: [&str; N]) -> Self {
        sources.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for TrackList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
