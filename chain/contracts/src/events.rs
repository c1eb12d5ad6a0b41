//! Contract events
//!
//! Events are immutable records emitted by contract operations. Together
//! they carry enough (actor, recipient, gross, net, fee) to rebuild every
//! ledger from scratch.

use serde::{Deserialize, Serialize};
use types::fee::FeeType;
use types::ids::{AccountId, MarketId, TokenId};

/// Base asset deposited, vault units minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub funder: AccountId,
    pub recipient: AccountId,
    pub amount_before_fee: u128,
    pub fee: u128,
    pub amount_after_fee: u128,
    pub minted: u128,
}

/// Vault units burned, base asset paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub funder: AccountId,
    pub recipient: AccountId,
    pub burned: u128,
    pub amount_before_fee: u128,
    pub fee: u128,
    pub amount_after_fee: u128,
}

/// Deposit cap ledger updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecorded {
    pub user: AccountId,
    pub amount_before_fee: u128,
    pub amount_after_fee: u128,
    pub global_net_deposited: u128,
    pub user_gross_deposited: u128,
}

/// Withdrawal recorded against the deposit ledger and the rate window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecorded {
    pub funder: AccountId,
    pub amount: u128,
    pub withdrawn_this_period: u128,
    pub effective_limit: u128,
    pub global_net_deposited: u128,
}

/// Fee forwarded to the treasury and converted into a reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRouted {
    pub token: TokenId,
    pub funder: AccountId,
    pub treasury: AccountId,
    pub fee: u128,
    pub reward: u128,
}

/// Reward token paid (or skipped when `reward == 0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSent {
    pub recipient: AccountId,
    pub unconverted_amount: u128,
    pub scaled_price: u128,
    pub reward: u128,
}

/// Binary-outcome market created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCreated {
    pub market: MarketId,
    pub collateral: TokenId,
    pub floor_payout: u128,
    pub ceiling_payout: u128,
    pub expiry_time: i64,
}

/// Long/short pair minted against collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mint {
    pub market: MarketId,
    pub minter: AccountId,
    pub amount: u128,
}

/// Claim tokens redeemed for collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub market: MarketId,
    pub redeemer: AccountId,
    pub recipient: AccountId,
    pub long_amount: u128,
    pub short_amount: u128,
    pub amount_before_fee: u128,
    pub fee: u128,
    pub amount_after_fee: u128,
}

/// Market settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPayoutSet {
    pub market: MarketId,
    pub payout: u128,
}

/// Admin changed a fee rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateChanged {
    pub fee_type: FeeType,
    pub rate_ppm: u32,
}

/// Admin replaced a hook slot (`hook == None` means disabled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookChanged {
    pub slot: String,
    pub hook: Option<AccountId>,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Deposit(Deposit),
    Withdraw(Withdraw),
    DepositRecorded(DepositRecorded),
    WithdrawalRecorded(WithdrawalRecorded),
    FeeRouted(FeeRouted),
    RewardSent(RewardSent),
    MarketCreated(MarketCreated),
    Mint(Mint),
    Redemption(Redemption),
    FinalPayoutSet(FinalPayoutSet),
    FeeRateChanged(FeeRateChanged),
    HookChanged(HookChanged),
}

impl ContractEvent {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            ContractEvent::Deposit(_) => "deposit",
            ContractEvent::Withdraw(_) => "withdraw",
            ContractEvent::DepositRecorded(_) => "deposit_recorded",
            ContractEvent::WithdrawalRecorded(_) => "withdrawal_recorded",
            ContractEvent::FeeRouted(_) => "fee_routed",
            ContractEvent::RewardSent(_) => "reward_sent",
            ContractEvent::MarketCreated(_) => "market_created",
            ContractEvent::Mint(_) => "mint",
            ContractEvent::Redemption(_) => "redemption",
            ContractEvent::FinalPayoutSet(_) => "final_payout_set",
            ContractEvent::FeeRateChanged(_) => "fee_rate_changed",
            ContractEvent::HookChanged(_) => "hook_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_serialization() {
        let event = Deposit {
            funder: AccountId::new(),
            recipient: AccountId::new(),
            amount_before_fee: 1_000_000,
            fee: 10_000,
            amount_after_fee: 990_000,
            minted: 990_000_000_000_000_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: Deposit = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_contract_event_enum_variant() {
        let event = ContractEvent::FinalPayoutSet(FinalPayoutSet {
            market: MarketId::new("ACME-IPO"),
            payout: 500_000_000_000_000_000,
        });
        assert!(matches!(event, ContractEvent::FinalPayoutSet(_)));
        assert_eq!(event.label(), "final_payout_set");
    }

    #[test]
    fn test_redemption_serialization() {
        let event = ContractEvent::Redemption(Redemption {
            market: MarketId::new("ACME-IPO"),
            redeemer: AccountId::new(),
            recipient: AccountId::new(),
            long_amount: 10,
            short_amount: 0,
            amount_before_fee: 7,
            fee: 0,
            amount_after_fee: 7,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
