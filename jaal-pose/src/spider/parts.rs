//! Per-part parameter lists, the common output of every estimator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pose::{NUM_PARTS, SpiderPose};

/// Output keys in node order: root first, then links `l1`..`l8`.
pub const PART_KEYS: [&str; NUM_PARTS] = ["circles", "l1", "l2", "l3", "l4", "l5", "l6", "l7", "l8"];

/// Ordered map from part key to a list of parameter vectors.
///
/// Root vectors are `[x, y, r]`, link vectors `[x, y, theta, w, h]`.
/// Every key is always present, possibly with an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartLists(BTreeMap<String, Vec<Vec<f64>>>);

impl Default for PartLists {
    fn default() -> Self {
        Self::new()
    }
}

impl PartLists {
    /// All nine keys with empty lists.
    pub fn new() -> Self {
        Self(PART_KEYS.iter().map(|k| (k.to_string(), Vec::new())).collect())
    }

    /// One entry per pose under every key.
    pub fn from_poses<'a>(poses: impl IntoIterator<Item = &'a SpiderPose>) -> Self {
        let mut lists = Self::new();
        for pose in poses {
            lists.push_pose(pose);
        }
        lists
    }

    /// Append a pose's part states.
    pub fn push_pose(&mut self, pose: &SpiderPose) {
        for (node, state) in pose.part_states().into_iter().enumerate() {
            self.push(node, state);
        }
    }

    /// Append a parameter vector to the list of node `node` (0 = root).
    ///
    /// Out-of-range nodes are ignored.
    pub fn push(&mut self, node: usize, params: Vec<f64>) {
        if let Some(list) = PART_KEYS.get(node).and_then(|k| self.0.get_mut(*k)) {
            list.push(params);
        }
    }

    /// List for a key.
    pub fn get(&self, key: &str) -> Option<&Vec<Vec<f64>>> {
        self.0.get(key)
    }

    /// Iterate over `(key, list)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Vec<f64>>)> {
        self.0.iter()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no key is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries under the root key.
    pub fn num_entries(&self) -> usize {
        self.get(PART_KEYS[0]).map_or(0, Vec::len)
    }
}
