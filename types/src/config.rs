//! Governance parameters — every tunable of the proposal lifecycle.
//!
//! Each numeric parameter is independently bounded; out-of-range values are
//! rejected at construction and by every setter. The guardian address and
//! the pause flag are freely settable by whatever authority owns the config.

use crate::address::Address;
use crate::amount::TokenAmount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A governance parameter was set outside its allowed bounds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("voting delay must be within [1, 50400] blocks, got {0}")]
    VotingDelayOutOfBounds(u64),

    #[error("voting period must be within [5760, 80640] blocks, got {0}")]
    VotingPeriodOutOfBounds(u64),

    #[error("quorum percentage must be within [1, 20], got {0}")]
    QuorumPercentageOutOfBounds(u32),
}

/// Tunable parameters of the governance process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Blocks between proposal creation and the start of voting.
    pub voting_delay: u64,

    /// Length of the voting window in blocks.
    pub voting_period: u64,

    /// Percentage of the live token supply that `for` votes must reach.
    pub quorum_percentage: u32,

    /// Minimum voting power required to create a proposal. Unrestricted.
    pub proposal_threshold: TokenAmount,

    /// Seconds between queueing and the earliest execution time (eta).
    pub timelock_delay: u64,

    /// Seconds after eta during which execution remains valid.
    pub grace_period: u64,

    /// Address with unilateral cancellation privilege. Zero means unset.
    pub guardian: Address,

    /// While set, disables propose / vote / queue / execute (never cancel
    /// or read-only queries).
    pub paused: bool,
}

impl GovernanceConfig {
    pub const MIN_VOTING_DELAY: u64 = 1;
    pub const MAX_VOTING_DELAY: u64 = 50_400;
    pub const MIN_VOTING_PERIOD: u64 = 5_760;
    pub const MAX_VOTING_PERIOD: u64 = 80_640;
    pub const MIN_QUORUM_PERCENTAGE: u32 = 1;
    pub const MAX_QUORUM_PERCENTAGE: u32 = 20;

    /// Maximum number of actions a single proposal may carry.
    pub const MAX_PROPOSAL_ACTIONS: usize = 10;

    /// Check every bounded parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        bound(
            self.voting_delay,
            Self::MIN_VOTING_DELAY..=Self::MAX_VOTING_DELAY,
            ConfigError::VotingDelayOutOfBounds(self.voting_delay),
        )?;
        bound(
            self.voting_period,
            Self::MIN_VOTING_PERIOD..=Self::MAX_VOTING_PERIOD,
            ConfigError::VotingPeriodOutOfBounds(self.voting_period),
        )?;
        bound(
            self.quorum_percentage,
            Self::MIN_QUORUM_PERCENTAGE..=Self::MAX_QUORUM_PERCENTAGE,
            ConfigError::QuorumPercentageOutOfBounds(self.quorum_percentage),
        )?;
        Ok(())
    }

    pub fn set_voting_delay(&mut self, blocks: u64) -> Result<(), ConfigError> {
        bound(
            blocks,
            Self::MIN_VOTING_DELAY..=Self::MAX_VOTING_DELAY,
            ConfigError::VotingDelayOutOfBounds(blocks),
        )?;
        self.voting_delay = blocks;
        Ok(())
    }

    pub fn set_voting_period(&mut self, blocks: u64) -> Result<(), ConfigError> {
        bound(
            blocks,
            Self::MIN_VOTING_PERIOD..=Self::MAX_VOTING_PERIOD,
            ConfigError::VotingPeriodOutOfBounds(blocks),
        )?;
        self.voting_period = blocks;
        Ok(())
    }

    pub fn set_quorum_percentage(&mut self, percent: u32) -> Result<(), ConfigError> {
        bound(
            percent,
            Self::MIN_QUORUM_PERCENTAGE..=Self::MAX_QUORUM_PERCENTAGE,
            ConfigError::QuorumPercentageOutOfBounds(percent),
        )?;
        self.quorum_percentage = percent;
        Ok(())
    }

    pub fn set_proposal_threshold(&mut self, threshold: TokenAmount) {
        self.proposal_threshold = threshold;
    }

    pub fn set_guardian(&mut self, guardian: Address) {
        self.guardian = guardian;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

fn bound<T: PartialOrd>(
    value: T,
    range: std::ops::RangeInclusive<T>,
    err: ConfigError,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(err)
    }
}

/// The intended live configuration.
impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_delay: 1,
            voting_period: 17_280,           // ~3 days of 15s blocks
            quorum_percentage: 4,
            proposal_threshold: TokenAmount::new(1_000),
            timelock_delay: 2 * 24 * 3600,   // 2 days
            grace_period: 14 * 24 * 3600,    // 14 days
            guardian: Address::ZERO,
            paused: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GovernanceConfig::default().validate().is_ok());
    }

    #[test]
    fn voting_delay_bounds() {
        let mut config = GovernanceConfig::default();
        assert!(config.set_voting_delay(0).is_err());
        assert!(config.set_voting_delay(50_401).is_err());
        assert!(config.set_voting_delay(1).is_ok());
        assert!(config.set_voting_delay(50_400).is_ok());
    }

    #[test]
    fn voting_period_bounds() {
        let mut config = GovernanceConfig::default();
        assert!(config.set_voting_period(5_759).is_err());
        assert!(config.set_voting_period(80_641).is_err());
        assert!(config.set_voting_period(5_760).is_ok());
        assert!(config.set_voting_period(80_640).is_ok());
    }

    #[test]
    fn quorum_percentage_bounds() {
        let mut config = GovernanceConfig::default();
        assert!(config.set_quorum_percentage(0).is_err());
        assert!(config.set_quorum_percentage(21).is_err());
        assert!(config.set_quorum_percentage(1).is_ok());
        assert!(config.set_quorum_percentage(20).is_ok());
    }

    #[test]
    fn validate_reports_bad_field() {
        let config = GovernanceConfig {
            voting_period: 100,
            ..GovernanceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::VotingPeriodOutOfBounds(100))
        );
    }

    #[test]
    fn threshold_and_guardian_unrestricted() {
        let mut config = GovernanceConfig::default();
        config.set_proposal_threshold(TokenAmount::ZERO);
        config.set_guardian(Address::new([9u8; 32]));
        config.set_paused(true);
        assert!(config.validate().is_ok());
        assert!(config.paused);
    }
}
