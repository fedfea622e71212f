/*!
Contains configuration information for consensus extraction and insertion scanning.
Typical usage is to the use the builder to construct the config, e.g.
```
use pinch_con::extraction_config::{ExtractionConfig, ExtractionConfigBuilder};
let config: ExtractionConfig = ExtractionConfigBuilder::default()
    .min_consensus_score(500)
    .gap_penalty(2)
    .name_prefix("rep".to_string())
    .build()
    .unwrap();
assert!(config.validate().is_ok());
```
*/

use simple_error::bail;

/**
Contains configuration information for the consensus extraction loop.
Typical usage is to the use the builder to construct the config, e.g.
```
use pinch_con::extraction_config::{ExtractionConfig, ExtractionConfigBuilder};
let config: ExtractionConfig = ExtractionConfigBuilder::default()
    .min_consensus_degree(2.5)
    .build()
    .unwrap();
assert_eq!(config.gap_penalty, 1);
```
*/
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct ExtractionConfig {
    /// Once an accepted consensus scores below this, extraction stops after emitting it
    pub min_consensus_score: i64,
    /// Penalty charged for every ordered block skipped between two chosen path blocks
    pub gap_penalty: i64,
    /// Minimum score per consensus base for a path to be accepted
    pub min_consensus_degree: f64,
    /// Prefix used when naming the output consensus records
    pub name_prefix: String
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_consensus_score: 1000,
            gap_penalty: 1,
            // roughly three supporting copies per base
            min_consensus_degree: 3.0,
            name_prefix: String::new()
        }
    }
}

impl ExtractionConfig {
    /// Sanity checks the parameter values.
    /// # Errors
    /// * if the gap penalty is negative
    /// * if the minimum degree is negative or not finite
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.gap_penalty < 0 {
            bail!("Gap penalty must be non-negative, got {}", self.gap_penalty);
        }
        if !self.min_consensus_degree.is_finite() || self.min_consensus_degree < 0.0 {
            bail!("Minimum consensus degree must be a non-negative number, got {}", self.min_consensus_degree);
        }
        Ok(())
    }
}

/// Controls how insertions are pulled out of a genome tree.
#[derive(derive_builder::Builder, Clone, Debug, Default)]
#[builder(default)]
pub struct InsertionConfig {
    /// Insertions must be strictly longer than this to be reported
    pub min_insertion_size: usize,
    /// If non-zero, short parented segments closer than this get joined into the surrounding insertion
    pub insertion_join_distance: usize
}
