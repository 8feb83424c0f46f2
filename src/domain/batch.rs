use serde::{Deserialize, Serialize};

use super::{Channel, Episode};

/// A channel with the episodes extracted from its feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub channel: Channel,
    pub episodes: Vec<Episode>,
}

impl Pod {
    pub fn new(channel: Channel, episodes: Vec<Episode>) -> Self {
        Self { channel, episodes }
    }
}

/// Working set of one pipeline run, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    pods: Vec<Pod>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    pub fn episode_count(&self) -> usize {
        self.pods.iter().map(|p| p.episodes.len()).sum()
    }

    pub fn pending_channels(&self) -> usize {
        self.pods.iter().filter(|p| !p.channel.is_published()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pod> {
        self.pods.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Pod> {
        self.pods.iter_mut()
    }
}

impl From<Vec<Pod>> for Batch {
    fn from(pods: Vec<Pod>) -> Self {
        Self { pods }
    }
}

impl FromIterator<Pod> for Batch {
    fn from_iter<I: IntoIterator<Item = Pod>>(iter: I) -> Self {
        Self {
            pods: iter.into_iter().collect(),
        }
    }
}
