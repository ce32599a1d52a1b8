use serde::{Deserialize, Serialize};

/// `{"id": ...}` body used by delete requests and add responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdDto<I> {
    pub id: I,
}

impl<I> IdDto<I> {
    pub fn new(id: I) -> Self {
        Self { id }
    }
}
