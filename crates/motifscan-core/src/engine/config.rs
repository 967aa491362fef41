use crate::core::models::identifiers::LabelSelection;
use crate::core::models::residue::ResidueType;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const DEFAULT_DISTANCE_TOLERANCE: u8 = 1;
pub const DEFAULT_ANGLE_TOLERANCE: u8 = 1;
pub const DEFAULT_RMSD_CUTOFF: f64 = 2.0;

/// Parameters governing one motif search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Tolerance in buckets applied independently to each distance component.
    pub distance_tolerance: u8,
    /// Tolerance in buckets applied to the angle component.
    pub angle_tolerance: u8,
    /// Hits with an RMSD above this value are dropped, not reported as errors.
    pub rmsd_cutoff: f64,
    /// Cap on the number of returned hits after sorting; `None` keeps all.
    pub limit: Option<usize>,
    /// Cooperative deadline for the whole query.
    pub timeout: Option<Duration>,
    /// Residue types considered interchangeable at a given query position.
    pub exchanges: HashMap<LabelSelection, HashSet<ResidueType>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            rmsd_cutoff: DEFAULT_RMSD_CUTOFF,
            limit: None,
            timeout: None,
            exchanges: HashMap::new(),
        }
    }
}

impl SearchConfig {
    pub fn exact() -> Self {
        Self {
            distance_tolerance: 0,
            angle_tolerance: 0,
            ..Self::default()
        }
    }

    pub fn exchange_set(&self, position: &LabelSelection) -> Option<&HashSet<ResidueType>> {
        self.exchanges.get(position)
    }
}

#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    distance_tolerance: Option<u8>,
    angle_tolerance: Option<u8>,
    rmsd_cutoff: Option<f64>,
    limit: Option<usize>,
    timeout: Option<Duration>,
    exchanges: HashMap<LabelSelection, HashSet<ResidueType>>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_tolerance(mut self, buckets: u8) -> Self {
        self.distance_tolerance = Some(buckets);
        self
    }

    pub fn angle_tolerance(mut self, buckets: u8) -> Self {
        self.angle_tolerance = Some(buckets);
        self
    }

    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = Some(cutoff);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn exchange(
        mut self,
        position: LabelSelection,
        residue_types: impl IntoIterator<Item = ResidueType>,
    ) -> Self {
        self.exchanges
            .entry(position)
            .or_default()
            .extend(residue_types);
        self
    }

    pub fn build(self) -> SearchConfig {
        SearchConfig {
            distance_tolerance: self.distance_tolerance.unwrap_or(DEFAULT_DISTANCE_TOLERANCE),
            angle_tolerance: self.angle_tolerance.unwrap_or(DEFAULT_ANGLE_TOLERANCE),
            rmsd_cutoff: self.rmsd_cutoff.unwrap_or(DEFAULT_RMSD_CUTOFF),
            limit: self.limit,
            timeout: self.timeout,
            exchanges: self.exchanges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_unset_fields_with_defaults() {
        let config = SearchConfigBuilder::new().build();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.distance_tolerance, 1);
        assert_eq!(config.angle_tolerance, 1);
        assert_eq!(config.rmsd_cutoff, 2.0);
        assert!(config.limit.is_none());
    }

    #[test]
    fn exact_config_has_zero_tolerances() {
        let config = SearchConfig::exact();
        assert_eq!(config.distance_tolerance, 0);
        assert_eq!(config.angle_tolerance, 0);
        assert!(config.exchanges.is_empty());
    }

    #[test]
    fn exchange_sets_accumulate_per_position() {
        let position = LabelSelection::new("A", "1", 57);
        let config = SearchConfigBuilder::new()
            .exchange(position.clone(), [ResidueType::GlutamicAcid])
            .exchange(position.clone(), [ResidueType::Asparagine])
            .build();
        let set = config.exchange_set(&position).unwrap();
        assert_eq!(set.len(), 2);
        assert!(config.exchange_set(&LabelSelection::new("B", "1", 1)).is_none());
    }
}
