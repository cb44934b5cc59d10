use crate::player::Position;
use serde::{Deserialize, Serialize};

/// Squad composition and game rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRules {
    pub squad_size:         usize,
    pub starters:           usize,
    pub bench:              usize,
    pub min_defenders:      usize,
    pub min_midfielders:    usize,
    pub min_forwards:       usize,
    /// Maximum squad members from a single club.
    pub club_cap:           usize,
    pub captain_multiplier: i64,
}

impl Default for SquadRules {
    fn default() -> Self {
        Self {
            squad_size:         15,
            starters:           11,
            bench:              4,
            min_defenders:      3,
            min_midfielders:    3,
            min_forwards:       1,
            club_cap:           3,
            captain_multiplier: 2,
        }
    }
}

impl SquadRules {
    /// Fewest starters allowed in `position`.
    pub fn minimum(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => 1,
            Position::Defender   => self.min_defenders,
            Position::Midfielder => self.min_midfielders,
            Position::Forward    => self.min_forwards,
        }
    }

    /// Starting slots left after every positional minimum is filled.
    pub fn flexible_slots(&self) -> usize {
        let floor: usize = Position::ALL.iter().map(|p| self.minimum(*p)).sum();
        self.starters.saturating_sub(floor)
    }
}

/// Transfer policy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// A budget-optimal transfer needs a predicted-points gain strictly
    /// above this value.
    pub improvement_threshold: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { improvement_threshold: 3.0 }
    }
}

/// Batch sweep settings for position-group evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Players per random position group.
    pub group_size: usize,
    /// Random groups simulated per (season, position) task.
    pub iterations: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { group_size: 5, iterations: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub rules:     SquadRules,
    #[serde(default)]
    pub transfers: TransferConfig,
    #[serde(default)]
    pub batch:     BatchConfig,
}

impl SimConfig {
    /// Load from a JSON file. Missing sections fall back to defaults.
    /// In tests, use SimConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rule sets the organizer cannot satisfy.
    pub fn validate(&self) -> anyhow::Result<()> {
        let r = &self.rules;
        if r.starters + r.bench != r.squad_size {
            anyhow::bail!(
                "starters ({}) + bench ({}) must equal squad_size ({})",
                r.starters, r.bench, r.squad_size
            );
        }
        let floor: usize = Position::ALL.iter().map(|p| r.minimum(*p)).sum();
        if floor > r.starters {
            anyhow::bail!("formation minimum ({floor}) exceeds starters ({})", r.starters);
        }
        if self.batch.group_size == 0 {
            anyhow::bail!("batch.group_size must be > 0");
        }
        Ok(())
    }
}
