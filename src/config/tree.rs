use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Shape parameters for every spanning tree created by the registry
///
/// # Example (TOML)
/// ```toml
/// [tree]
/// max_degree = 3
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TreeConfig {
    /// Maximum neighbor count per node, enforced when a node is attached.
    ///
    /// A bound of 3 gives every non-root node one parent and up to two
    /// children. Must be at least 2, otherwise the tree can never grow
    /// past two nodes.
    ///
    /// **Default**: 3
    #[serde(default = "default_max_degree")]
    pub max_degree: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_degree: default_max_degree(),
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_degree < 2 {
            return Err(Error::Config(ConfigError::Message(format!(
                "tree.max_degree must be at least 2 (got {})",
                self.max_degree
            ))));
        }

        if self.max_degree > 64 {
            warn!(
                "tree.max_degree ({}) is very large; the overlay will behave close to a star",
                self.max_degree
            );
        }

        Ok(())
    }
}

const fn default_max_degree() -> usize {
    3
}
