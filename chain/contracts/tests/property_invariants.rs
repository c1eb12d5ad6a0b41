//! Property Tests — ledger invariants under generated inputs
//!
//! - Decimal adjustment round trip for vault precision above, equal to and
//!   below the base precision
//! - Deposit caps are never exceeded and rejections change nothing
//! - Withdrawals inside a window never exceed the effective limit
//! - Minting N pairs grows both claim supplies by exactly N

use contracts::config::{ProtocolConfig, TokenSpec};
use contracts::market::{MarketParams, MAX_PAYOUT};
use contracts::protocol::Protocol;
use proptest::prelude::*;
use rust_decimal::Decimal;
use types::fee::{FeeRate, FeeSplit};
use types::ids::{AccountId, MarketId, TokenId};
use types::numeric::{pow10, scale_amount};

// ═══════════════════════════════════════════════════════════════════
// Decimal Adjustment
// ═══════════════════════════════════════════════════════════════════

proptest! {
    /// Vault precision above base: every base unit survives the round trip.
    #[test]
    fn prop_round_trip_higher_vault_precision(amount in 1u128..=1_000_000_000_000u128) {
        let (mut protocol, alice) = vault_with(6, 18, amount);
        let minted = protocol.deposit(alice, alice, amount).unwrap();
        prop_assert_eq!(minted, amount * pow10(12).unwrap());
        let paid = protocol.withdraw(alice, alice, minted).unwrap();
        prop_assert_eq!(paid, amount);
    }

    /// Equal precision: vault units are base units.
    #[test]
    fn prop_round_trip_equal_precision(amount in 1u128..=1_000_000_000_000u128) {
        let (mut protocol, alice) = vault_with(6, 6, amount);
        let minted = protocol.deposit(alice, alice, amount).unwrap();
        prop_assert_eq!(minted, amount);
        prop_assert_eq!(protocol.withdraw(alice, alice, minted).unwrap(), amount);
    }

    /// Vault precision below base: the sub-unit remainder is floored away
    /// and stays in custody; nothing is fabricated.
    #[test]
    fn prop_round_trip_lower_vault_precision(amount in 1_000_000_000_000u128..=1_000_000_000_000_000_000_000u128) {
        let (mut protocol, alice) = vault_with(18, 6, amount);
        let minted = protocol.deposit(alice, alice, amount).unwrap();
        prop_assert_eq!(minted, amount / pow10(12).unwrap());
        let paid = protocol.withdraw(alice, alice, minted).unwrap();
        prop_assert!(paid <= amount);
        prop_assert!(amount - paid < pow10(12).unwrap());
        let custody = protocol.vault().account();
        prop_assert_eq!(
            protocol.balance_of(&TokenId::new("USDC"), &custody).unwrap(),
            amount - paid
        );
    }

    /// With fees, the round trip pays exactly the twice fee-adjusted amount.
    #[test]
    fn prop_round_trip_with_fees(
        amount in 1_000_000u128..=1_000_000_000_000u128,
        deposit_ppm in 0u32..=100_000,
        withdraw_ppm in 0u32..=100_000,
        vault_decimals in prop_oneof![Just(6u8), Just(18u8)],
    ) {
        let (mut protocol, alice) = vault_with(6, vault_decimals, amount);
        let admin = *protocol.admin();
        protocol.set_deposit_fee(&admin, FeeRate::from_ppm(deposit_ppm)).unwrap();
        protocol.set_withdraw_fee(&admin, FeeRate::from_ppm(withdraw_ppm)).unwrap();

        let deposit_split = FeeSplit::compute(amount, FeeRate::from_ppm(deposit_ppm)).unwrap();
        prop_assume!(!deposit_split.is_dust(FeeRate::from_ppm(deposit_ppm)));
        let withdraw_split = FeeSplit::compute(deposit_split.amount_after_fee, FeeRate::from_ppm(withdraw_ppm)).unwrap();
        prop_assume!(!withdraw_split.is_dust(FeeRate::from_ppm(withdraw_ppm)));

        let minted = protocol.deposit(alice, alice, amount).unwrap();
        prop_assert_eq!(minted, scale_amount(deposit_split.amount_after_fee, 6, vault_decimals).unwrap());
        let paid = protocol.withdraw(alice, alice, minted).unwrap();
        prop_assert_eq!(paid, withdraw_split.amount_after_fee);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Ledger Invariants
// ═══════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Caps hold after every deposit; a rejected deposit leaves the ledger
    /// exactly as it was.
    #[test]
    fn prop_caps_never_exceeded(
        deposits in prop::collection::vec((0usize..3, 1u128..60), 1..30),
    ) {
        let mut config = ProtocolConfig::default();
        config.deposit_caps.global_cap = 150;
        config.deposit_caps.user_cap = 70;
        let (mut protocol, users) = protocol_with_users(config, 3, 10_000);

        for (who, amount) in deposits {
            let user = users[who];
            let global_before = protocol.deposit_record().global_net_deposited();
            let user_before = protocol.deposit_record().user_deposits(&user).get();

            if protocol.deposit(user, user, amount).is_err() {
                prop_assert_eq!(protocol.deposit_record().global_net_deposited(), global_before);
                prop_assert_eq!(protocol.deposit_record().user_deposits(&user).get(), user_before);
                prop_assert!(global_before + amount > 150 || user_before + amount > 70);
            }
            prop_assert!(protocol.deposit_record().global_net_deposited() <= 150);
            prop_assert!(protocol.deposit_record().user_deposits(&user).get() <= 70);
        }
    }

    /// The window total never exceeds the limit, and a withdrawal is
    /// admitted exactly when the window model admits it.
    #[test]
    fn prop_rate_window_respected(
        steps in prop::collection::vec((0i64..15, 1u128..120), 1..40),
    ) {
        let mut config = ProtocolConfig::default();
        config.vault.vault_token = TokenSpec::new("preUSDC", 6);
        config.withdraw_limits.period_length = 20;
        config.withdraw_limits.global_limit = 300;
        let (mut protocol, users) = protocol_with_users(config, 1, 1_000_000);
        let alice = users[0];
        protocol.deposit(alice, alice, 1_000_000).unwrap();

        let mut now = 0i64;
        let mut window: Option<(i64, u128)> = None;
        for (advance, amount) in steps {
            now += advance;
            protocol.set_time(now);

            let (reset, used) = match window {
                Some((reset, used)) if now - reset <= 20 => (reset, used),
                _ => (now, 0),
            };
            let admitted = protocol.withdraw(alice, alice, amount).is_ok();
            prop_assert_eq!(admitted, used + amount <= 300);
            if admitted {
                window = Some((reset, used + amount));
            }
            prop_assert!(
                protocol.withdraw_limiter().global_window().amount_withdrawn_this_period() <= 300
            );
        }
    }

    /// Minting N pairs adds N to both supplies; matched redemption before
    /// settlement without a redeem hook returns exactly N.
    #[test]
    fn prop_mint_redeem_pairs(amount in 1u128..=1_000_000_000_000_000_000u128) {
        let (mut protocol, users) = protocol_with_users(ProtocolConfig::default(), 1, 10_000_000_000);
        let alice = users[0];
        let admin = *protocol.admin();
        protocol.deposit(alice, alice, 10_000_000_000).unwrap();

        let market = protocol.create_market(&admin, market_params()).unwrap();
        let custody = protocol.market(&market).unwrap().account();
        protocol.approve(&TokenId::new("preUSDC"), alice, custody, u128::MAX).unwrap();

        protocol.mint(&market, alice, amount).unwrap();
        let m = protocol.market(&market).unwrap();
        prop_assert_eq!(protocol.tokens().total_supply(m.long_token()).unwrap(), amount);
        prop_assert_eq!(protocol.tokens().total_supply(m.short_token()).unwrap(), amount);

        prop_assert_eq!(protocol.redeem(&market, alice, amount, amount, alice).unwrap(), amount);
    }

    /// Settled redemption of a full pair never pays more than the pair's
    /// collateral.
    #[test]
    fn prop_settled_pair_bounded(
        amount in 1u128..=1_000_000_000_000_000_000u128,
        payout in MAX_PAYOUT / 5..=MAX_PAYOUT * 4 / 5,
    ) {
        let (mut protocol, users) = protocol_with_users(ProtocolConfig::default(), 1, 10_000_000_000);
        let alice = users[0];
        let admin = *protocol.admin();
        protocol.deposit(alice, alice, 10_000_000_000).unwrap();
        let market = protocol.create_market(&admin, market_params()).unwrap();
        let custody = protocol.market(&market).unwrap().account();
        protocol.approve(&TokenId::new("preUSDC"), alice, custody, u128::MAX).unwrap();
        protocol.mint(&market, alice, amount).unwrap();
        protocol.set_final_payout(&admin, &market, payout).unwrap();

        match protocol.redeem(&market, alice, amount, amount, alice) {
            Ok(paid) => {
                prop_assert!(paid <= amount);
                // Floor rounding on each side loses at most one unit per side
                prop_assert!(amount - paid <= 2);
            }
            Err(err) => prop_assert!(false, "settled redemption failed: {}", err),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

/// Vault with the given precisions, standard hooks, and one user holding
/// `balance` base units with the vault approved.
fn vault_with(base_decimals: u8, vault_decimals: u8, balance: u128) -> (Protocol, AccountId) {
    let mut config = ProtocolConfig::default();
    config.vault.base_token = TokenSpec::new("USDC", base_decimals);
    config.vault.vault_token = TokenSpec::new("preUSDC", vault_decimals);
    let (protocol, users) = protocol_with_users(config, 1, balance);
    (protocol, users[0])
}

fn protocol_with_users(config: ProtocolConfig, count: usize, balance: u128) -> (Protocol, Vec<AccountId>) {
    let admin = AccountId::new();
    let usdc = TokenId::new("USDC");
    let mut protocol = Protocol::new(admin, config).unwrap();
    protocol.install_vault_hooks(&admin, AccountId::new()).unwrap();
    let vault = protocol.vault().account();

    let users = (0..count)
        .map(|_| {
            let user = AccountId::new();
            protocol.issue(&admin, &usdc, user, balance).unwrap();
            protocol.approve(&usdc, user, vault, u128::MAX).unwrap();
            user
        })
        .collect();
    (protocol, users)
}

fn market_params() -> MarketParams {
    MarketParams {
        id: MarketId::new("ACME-IPO"),
        collateral: TokenId::new("preUSDC"),
        floor_payout: MAX_PAYOUT / 5,
        ceiling_payout: MAX_PAYOUT * 4 / 5,
        floor_valuation: Decimal::new(1_000, 0),
        ceiling_valuation: Decimal::new(5_000, 0),
        expiry_time: 1_000,
        redemption_fee_rate: FeeRate::from_ppm(10_000),
    }
}
