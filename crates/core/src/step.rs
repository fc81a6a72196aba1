//! Step model - the fixed, ordered deployment sequence.

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};

/// One named unit of the crowdsale deployment sequence.
///
/// Variants are declared in execution order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepName {
    SafeMathLibrary,
    Token,
    PricingStrategy,
    Crowdsale,
    RegisterCrowdsaleAddress,
    FinalizeAgent,
    LastCrowdsale,
    SetReservedTokens,
    UpdateJoinedCrowdsales,
    SetMintAgentCrowdsale,
    SetMintAgentFinalizeAgent,
    Whitelist,
    SetFinalizeAgent,
    SetReleaseAgent,
    TransferOwnership,
}

impl StepName {
    /// All steps in declaration order.
    pub const ALL: [StepName; 15] = [
        StepName::SafeMathLibrary,
        StepName::Token,
        StepName::PricingStrategy,
        StepName::Crowdsale,
        StepName::RegisterCrowdsaleAddress,
        StepName::FinalizeAgent,
        StepName::LastCrowdsale,
        StepName::SetReservedTokens,
        StepName::UpdateJoinedCrowdsales,
        StepName::SetMintAgentCrowdsale,
        StepName::SetMintAgentFinalizeAgent,
        StepName::Whitelist,
        StepName::SetFinalizeAgent,
        StepName::SetReleaseAgent,
        StepName::TransferOwnership,
    ];

    /// Get the wire name of the step.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::SafeMathLibrary => "safeMathLibrary",
            StepName::Token => "token",
            StepName::PricingStrategy => "pricingStrategy",
            StepName::Crowdsale => "crowdsale",
            StepName::RegisterCrowdsaleAddress => "registerCrowdsaleAddress",
            StepName::FinalizeAgent => "finalizeAgent",
            StepName::LastCrowdsale => "lastCrowdsale",
            StepName::SetReservedTokens => "setReservedTokens",
            StepName::UpdateJoinedCrowdsales => "updateJoinedCrowdsales",
            StepName::SetMintAgentCrowdsale => "setMintAgentCrowdsale",
            StepName::SetMintAgentFinalizeAgent => "setMintAgentFinalizeAgent",
            StepName::Whitelist => "whitelist",
            StepName::SetFinalizeAgent => "setFinalizeAgent",
            StepName::SetReleaseAgent => "setReleaseAgent",
            StepName::TransferOwnership => "transferOwnership",
        }
    }

    /// Zero-based position in the deployment sequence.
    pub fn position(&self) -> usize {
        *self as usize
    }

    /// What kind of blockchain action the step performs.
    pub fn kind(&self) -> StepKind {
        match self {
            StepName::SafeMathLibrary
            | StepName::Token
            | StepName::PricingStrategy
            | StepName::Crowdsale
            | StepName::FinalizeAgent => StepKind::ContractDeployment,
            _ => StepKind::MethodCall,
        }
    }

    /// Whether the step's requirement depends on the deployment configuration.
    pub fn is_conditional(&self) -> bool {
        matches!(self, StepName::SetReservedTokens | StepName::Whitelist)
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepName {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepName::ALL
            .iter()
            .find(|step| step.as_str() == s)
            .copied()
            .ok_or_else(|| TrackerError::UnknownStepName(s.to_string()))
    }
}

/// Kind of blockchain action behind a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Deploys a new contract
    ContractDeployment,
    /// Calls a method on an already deployed contract
    MethodCall,
}

/// Required/successful flags of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    /// Whether the step must complete for the deployment to finish
    pub required: bool,

    /// Whether the step's transaction has been confirmed
    pub successful: bool,
}

impl StepState {
    /// A required step that has not run yet.
    pub fn pending() -> Self {
        Self {
            required: true,
            successful: false,
        }
    }

    /// Required and not yet successful.
    pub fn is_pending(&self) -> bool {
        self.required && !self.successful
    }

    /// Successful but no longer required.
    pub fn is_stale(&self) -> bool {
        !self.required && self.successful
    }
}

impl Default for StepState {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order() {
        for (i, step) in StepName::ALL.iter().enumerate() {
            assert_eq!(step.position(), i);
        }
        assert_eq!(StepName::ALL[0], StepName::SafeMathLibrary);
        assert_eq!(StepName::ALL[14], StepName::TransferOwnership);
        assert!(StepName::Crowdsale < StepName::Whitelist);
    }

    #[test]
    fn test_parse_known_names() {
        for step in StepName::ALL {
            let parsed: StepName = step.as_str().parse().unwrap();
            assert_eq!(parsed, step);
        }
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "Whitelist".parse::<StepName>().unwrap_err();
        assert_eq!(err, TrackerError::UnknownStepName("Whitelist".to_string()));
        assert!("".parse::<StepName>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&StepName::SetMintAgentFinalizeAgent).unwrap();
        assert_eq!(json, "\"setMintAgentFinalizeAgent\"");
        let step: StepName = serde_json::from_str("\"registerCrowdsaleAddress\"").unwrap();
        assert_eq!(step, StepName::RegisterCrowdsaleAddress);
    }

    #[test]
    fn test_conditional_steps() {
        let conditional: Vec<_> = StepName::ALL
            .iter()
            .filter(|s| s.is_conditional())
            .collect();
        assert_eq!(conditional, vec![&StepName::SetReservedTokens, &StepName::Whitelist]);
    }

    #[test]
    fn test_step_kind() {
        assert_eq!(StepName::Token.kind(), StepKind::ContractDeployment);
        assert_eq!(StepName::FinalizeAgent.kind(), StepKind::ContractDeployment);
        assert_eq!(StepName::SetFinalizeAgent.kind(), StepKind::MethodCall);
        assert_eq!(StepName::TransferOwnership.kind(), StepKind::MethodCall);
    }

    #[test]
    fn test_step_state_flags() {
        let state = StepState::default();
        assert!(state.required);
        assert!(!state.successful);
        assert!(state.is_pending());

        let stale = StepState { required: false, successful: true };
        assert!(stale.is_stale());
        assert!(!stale.is_pending());
    }
}
