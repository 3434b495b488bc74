use serde::{Deserialize, Serialize};

/// Wire model for one coin row returned by the remote catalog.
///
/// The identity endpoint omits `image`; the paginated markets endpoint
/// includes it. Fields beyond the ones consumed here are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteCoin {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}
