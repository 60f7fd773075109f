use serde::Serialize;

/// Progress of an asynchronous lookup. `NotFetched` and `Fetching` are never
/// collapsed into a default value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum FetchState<T> {
    NotFetched,
    Fetching,
    Fetched(T),
}

impl<T> FetchState<T> {
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchState::Fetched(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Fetched(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::NotFetched
    }
}

impl<T> From<Option<T>> for FetchState<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FetchState::NotFetched, FetchState::Fetched)
    }
}
