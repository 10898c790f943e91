use std::sync::Arc;

use orbit_assets::{AssetError, FungibleToken, NonFungibleToken, StandardCollection, StandardToken};
use orbit_fees::{FeeRateRegistry, FeeRateSource};
use orbit_ledger::NativeLedger;
use orbit_types::{Address, TokenId};
use orbit_wallet::{CustodyWallet, WalletError};

const UNIT: u128 = 1_000_000_000_000_000_000;

struct Fixture {
    ledger: Arc<NativeLedger>,
    registry: Arc<FeeRateRegistry>,
    wallet: CustodyWallet,
    token: StandardToken,
    token_two: StandardToken,
    collection: StandardCollection,
    collection_two: StandardCollection,
    owner: Address,
    user: Address,
    third_party: Address,
}

fn deploy() -> Fixture {
    let owner = Address::derived("owner");
    let user = Address::derived("user");
    let third_party = Address::derived("third-party");

    let ledger = Arc::new(NativeLedger::new());
    let registry = Arc::new(FeeRateRegistry::new(owner, 0).expect("base fee rate in range"));
    let wallet = CustodyWallet::new(
        Address::derived("custody-wallet"),
        user,
        Arc::clone(&registry) as Arc<dyn FeeRateSource>,
        owner,
        Arc::clone(&ledger),
    )
    .expect("wallet construction");

    Fixture {
        ledger,
        registry,
        wallet,
        token: StandardToken::new("ORB"),
        token_two: StandardToken::new("ORB2"),
        collection: StandardCollection::new("ORBNFT"),
        collection_two: StandardCollection::new("ORBNFT2"),
        owner,
        user,
        third_party,
    }
}

// ── Construction ──────────────────────────────────────────────────────────

#[test]
fn construction_sets_roles_and_sources() {
    let f = deploy();

    assert_eq!(f.wallet.controller(), f.user);
    assert_eq!(f.wallet.fee_sink(), f.owner);
    assert_eq!(f.wallet.fee_registry_address(), f.registry.address());
}

#[test]
fn construction_rejects_zero_fee_sink() {
    let f = deploy();

    let result = CustodyWallet::new(
        Address::derived("second-wallet"),
        f.user,
        Arc::clone(&f.registry) as Arc<dyn FeeRateSource>,
        Address::ZERO,
        Arc::clone(&f.ledger),
    );
    assert!(matches!(
        result,
        Err(WalletError::InvalidConfiguration { .. })
    ));
}

// ── Deposits ──────────────────────────────────────────────────────────────

#[test]
fn native_deposit_retains_full_value_at_zero_fee() {
    let f = deploy();

    f.ledger.fund(f.user, UNIT).unwrap();
    let outcome = f.wallet.deposit(f.user, UNIT).unwrap();

    assert_eq!(outcome.fee, 0);
    assert_eq!(outcome.retained, UNIT);
    assert_eq!(f.wallet.native_balance(), UNIT);
    assert_eq!(f.ledger.balance(&f.owner), 0);
}

#[test]
fn token_and_item_deposits_land_in_custody() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000);
    let item = f.collection.mint(f.wallet.address());

    assert_eq!(f.token.balance_of(&f.wallet.address()), 10_000);
    assert_eq!(f.collection.owner_of(item), Some(f.wallet.address()));
}

// ── Native withdrawals ────────────────────────────────────────────────────

#[test]
fn native_withdrawal_by_controller() {
    let f = deploy();

    f.ledger.fund(f.owner, 10 * UNIT).unwrap();
    f.wallet.deposit(f.owner, 10 * UNIT).unwrap();

    f.wallet.withdraw_native(f.user, f.third_party, UNIT).unwrap();

    assert_eq!(f.wallet.native_balance(), 9 * UNIT);
    assert_eq!(f.ledger.balance(&f.third_party), UNIT);
}

#[test]
fn native_withdrawal_rejected_for_third_party() {
    let f = deploy();

    f.ledger.fund(f.owner, 10 * UNIT).unwrap();
    f.wallet.deposit(f.owner, 10 * UNIT).unwrap();

    let result = f.wallet.withdraw_native(f.third_party, f.third_party, UNIT);
    assert!(matches!(result, Err(WalletError::NotController { .. })));
    assert_eq!(f.wallet.native_balance(), 10 * UNIT);
}

#[test]
fn native_withdrawal_rejects_zero_and_self_recipient() {
    let f = deploy();

    f.ledger.fund(f.owner, 10 * UNIT).unwrap();
    f.wallet.deposit(f.owner, 10 * UNIT).unwrap();

    assert!(matches!(
        f.wallet.withdraw_native(f.user, Address::ZERO, UNIT),
        Err(WalletError::InvalidRecipient { .. })
    ));
    assert!(matches!(
        f.wallet.withdraw_native(f.user, f.wallet.address(), UNIT),
        Err(WalletError::InvalidRecipient { .. })
    ));
    assert_eq!(f.wallet.native_balance(), 10 * UNIT);
}

// ── Fungible withdrawals ──────────────────────────────────────────────────

#[test]
fn fungible_withdrawal_by_controller_needs_no_allowance() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    f.wallet
        .withdraw_fungible(f.user, &f.token, f.user, 10_000 * UNIT)
        .unwrap();

    assert_eq!(f.token.balance_of(&f.wallet.address()), 0);
    assert_eq!(f.token.balance_of(&f.user), 10_000 * UNIT);
}

#[test]
fn fungible_withdrawal_rejected_without_grant() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    let result = f
        .wallet
        .withdraw_fungible(f.third_party, &f.token, f.third_party, 100 * UNIT);

    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
    assert_eq!(f.token.balance_of(&f.wallet.address()), 10_000 * UNIT);
}

#[test]
fn fungible_withdrawal_via_internal_allowance_consumes_it() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    f.wallet
        .grant_fungible_allowance(f.user, f.token.address(), f.third_party, 10_000 * UNIT)
        .unwrap();

    f.wallet
        .withdraw_fungible(f.third_party, &f.token, f.third_party, 10_000 * UNIT)
        .unwrap();

    assert_eq!(f.token.balance_of(&f.third_party), 10_000 * UNIT);
    assert_eq!(
        f.wallet.fungible_allowance(f.token.address(), f.third_party),
        0
    );
}

#[test]
fn fungible_withdrawal_beyond_internal_allowance_fails_cleanly() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    f.wallet
        .grant_fungible_allowance(f.user, f.token.address(), f.third_party, 6_000 * UNIT)
        .unwrap();

    let result = f
        .wallet
        .withdraw_fungible(f.third_party, &f.token, f.third_party, 10_000 * UNIT);

    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
    assert_eq!(f.token.balance_of(&f.wallet.address()), 10_000 * UNIT);
    assert_eq!(
        f.wallet.fungible_allowance(f.token.address(), f.third_party),
        6_000 * UNIT
    );

    // Withdrawing exactly the granted amount drains the entry to zero.
    f.wallet
        .withdraw_fungible(f.third_party, &f.token, f.third_party, 6_000 * UNIT)
        .unwrap();
    assert_eq!(
        f.wallet.fungible_allowance(f.token.address(), f.third_party),
        0
    );
}

#[test]
fn fungible_external_allowance_bypasses_the_engine() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    f.wallet
        .grant_external_fungible_allowance(f.user, &f.token, f.third_party, 10_000 * UNIT)
        .unwrap();

    // The internal book is untouched by an external grant.
    assert_eq!(
        f.wallet.fungible_allowance(f.token.address(), f.third_party),
        0
    );

    // The spender pulls straight from the token contract.
    f.token
        .transfer_from(f.third_party, f.wallet.address(), f.third_party, 10_000 * UNIT)
        .unwrap();
    assert_eq!(f.token.balance_of(&f.third_party), 10_000 * UNIT);
}

#[test]
fn fungible_external_pull_beyond_approval_fails_in_token() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    f.wallet
        .grant_external_fungible_allowance(f.user, &f.token, f.third_party, 6_000 * UNIT)
        .unwrap();

    let result =
        f.token
            .transfer_from(f.third_party, f.wallet.address(), f.third_party, 10_000 * UNIT);
    assert!(matches!(
        result,
        Err(AssetError::InsufficientAllowance { .. })
    ));
}

// ── Non-fungible withdrawals ──────────────────────────────────────────────

#[test]
fn item_withdrawal_by_controller() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    f.wallet
        .withdraw_item(f.user, &f.collection, f.user, item)
        .unwrap();

    assert_eq!(f.collection.owner_of(item), Some(f.user));
    assert_eq!(f.collection.balance_of(&f.wallet.address()), 0);
}

#[test]
fn item_withdrawal_rejected_without_grant() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    let result = f
        .wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, item);

    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
    assert_eq!(f.collection.owner_of(item), Some(f.wallet.address()));
}

#[test]
fn item_withdrawal_via_internal_item_allowance_consumes_it() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, item, true)
        .unwrap();

    f.wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, item)
        .unwrap();

    assert_eq!(f.collection.owner_of(item), Some(f.third_party));
    assert!(!f
        .wallet
        .item_allowance(f.collection.address(), f.third_party, item));
}

#[test]
fn item_allowance_revocation_blocks_withdrawal() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, item, true)
        .unwrap();
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, item, false)
        .unwrap();

    let result = f
        .wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, item);
    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
}

#[test]
fn item_allowance_does_not_cover_other_items() {
    let f = deploy();

    let first = f.collection.mint(f.wallet.address());
    let second = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, first, true)
        .unwrap();

    let result = f
        .wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, second);
    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
}

#[test]
fn collection_allowance_covers_present_and_future_items() {
    let f = deploy();

    let first = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_collection_allowance(f.user, f.collection.address(), f.third_party, true)
        .unwrap();

    f.wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, first)
        .unwrap();

    // An item minted into the wallet after the grant is covered too, and
    // the standing grant survives consumption.
    let second = f.collection.mint(f.wallet.address());
    f.wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, second)
        .unwrap();

    assert_eq!(f.collection.balance_of(&f.third_party), 2);
    assert!(f
        .wallet
        .collection_allowance(f.collection.address(), f.third_party));
}

#[test]
fn collection_revocation_leaves_item_approvals() {
    let f = deploy();

    let first = f.collection.mint(f.wallet.address());
    let second = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, first, true)
        .unwrap();
    f.wallet
        .grant_collection_allowance(f.user, f.collection.address(), f.third_party, true)
        .unwrap();
    f.wallet
        .grant_collection_allowance(f.user, f.collection.address(), f.third_party, false)
        .unwrap();

    // The individually approved item still withdraws; the other does not.
    f.wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, first)
        .unwrap();
    let result = f
        .wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, second);
    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
}

#[test]
fn revoking_consumed_item_allowance_is_noop() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, item, true)
        .unwrap();
    f.wallet
        .withdraw_item(f.third_party, &f.collection, f.third_party, item)
        .unwrap();

    // The approval was consumed with the withdrawal; revoking it again is a
    // no-op, and re-attempting the withdrawal fails because the item is no
    // longer held, not because of authorization.
    f.wallet
        .grant_item_allowance(f.user, f.collection.address(), f.third_party, item, false)
        .unwrap();
    let result = f.wallet.withdraw_item(f.user, &f.collection, f.user, item);
    assert!(matches!(result, Err(WalletError::ItemNotHeld { .. })));
}

#[test]
fn item_external_approvals_bypass_the_engine() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_external_item_allowance(f.user, &f.collection, f.third_party, item)
        .unwrap();

    assert!(!f
        .wallet
        .item_allowance(f.collection.address(), f.third_party, item));

    f.collection
        .transfer_from(f.third_party, f.wallet.address(), f.third_party, item)
        .unwrap();
    assert_eq!(f.collection.owner_of(item), Some(f.third_party));
}

#[test]
fn collection_external_approval_pulls_every_item() {
    let f = deploy();

    let first = f.collection.mint(f.wallet.address());
    let second = f.collection.mint(f.wallet.address());
    f.wallet
        .grant_external_collection_allowance(f.user, &f.collection, f.third_party, true)
        .unwrap();

    f.collection
        .transfer_from(f.third_party, f.wallet.address(), f.third_party, first)
        .unwrap();
    f.collection
        .transfer_from(f.third_party, f.wallet.address(), f.third_party, second)
        .unwrap();
    assert_eq!(f.collection.balance_of(&f.third_party), 2);
}

// ── Fee deposits ──────────────────────────────────────────────────────────

#[test]
fn deposit_fee_split_at_five_percent() {
    let f = deploy();
    f.registry.set_fee_rate(f.owner, 500).unwrap();

    f.ledger.fund(f.user, UNIT).unwrap();
    let outcome = f.wallet.deposit(f.user, UNIT).unwrap();

    assert_eq!(outcome.fee, UNIT / 20);
    assert_eq!(outcome.retained, UNIT - UNIT / 20);
    assert_eq!(f.wallet.native_balance(), UNIT - UNIT / 20);
    assert_eq!(f.ledger.balance(&f.owner), UNIT / 20);
}

#[test]
fn deposit_fee_split_at_thirty_three_percent() {
    let f = deploy();
    f.registry.set_fee_rate(f.owner, 3_300).unwrap();

    f.ledger.fund(f.user, UNIT).unwrap();
    let outcome = f.wallet.deposit(f.user, UNIT).unwrap();

    assert_eq!(outcome.fee, UNIT * 33 / 100);
    assert_eq!(f.wallet.native_balance(), UNIT - UNIT * 33 / 100);
    assert_eq!(f.ledger.balance(&f.owner), UNIT * 33 / 100);
}

#[test]
fn deposit_fee_split_at_full_rate_redirects_everything() {
    let f = deploy();
    f.registry.set_fee_rate(f.owner, 10_000).unwrap();

    f.ledger.fund(f.user, UNIT).unwrap();
    let outcome = f.wallet.deposit(f.user, UNIT).unwrap();

    assert_eq!(outcome.retained, 0);
    assert_eq!(f.wallet.native_balance(), 0);
    assert_eq!(f.ledger.balance(&f.owner), UNIT);
}

#[test]
fn rate_changes_apply_to_subsequent_deposits_only() {
    let f = deploy();

    f.ledger.fund(f.user, 2 * UNIT).unwrap();
    f.wallet.deposit(f.user, UNIT).unwrap();
    assert_eq!(f.ledger.balance(&f.owner), 0);

    f.registry.set_fee_rate(f.owner, 500).unwrap();
    f.wallet.deposit(f.user, UNIT).unwrap();
    assert_eq!(f.ledger.balance(&f.owner), UNIT / 20);
    assert_eq!(f.wallet.native_balance(), 2 * UNIT - UNIT / 20);
}

#[test]
fn conservation_holds_across_rates() {
    let value = 1_234_567_890_123_456_789u128;

    for rate in [1u32, 33, 499, 7_777, 9_999] {
        let f = deploy();
        f.registry.set_fee_rate(f.owner, rate).unwrap();
        f.ledger.fund(f.user, value).unwrap();
        let outcome = f.wallet.deposit(f.user, value).unwrap();

        assert_eq!(outcome.fee + outcome.retained, value);
        assert_eq!(outcome.fee, value * rate as u128 / 10_000);
        assert_eq!(f.wallet.native_balance() + f.ledger.balance(&f.owner), value);
    }
}

// ── Multi-token isolation ─────────────────────────────────────────────────

#[test]
fn fungible_balances_are_isolated_per_token() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 10_000 * UNIT);
    f.token_two.mint(f.wallet.address(), 5_000 * UNIT);

    f.wallet
        .withdraw_fungible(f.user, &f.token, f.user, 5_000 * UNIT)
        .unwrap();

    let result = f
        .wallet
        .withdraw_fungible(f.user, &f.token_two, f.user, 10_000 * UNIT);
    assert!(matches!(
        result,
        Err(WalletError::InsufficientTokenBalance { .. })
    ));
    assert_eq!(f.token_two.balance_of(&f.wallet.address()), 5_000 * UNIT);
}

#[test]
fn item_holdings_are_isolated_per_collection() {
    let f = deploy();

    let item = f.collection.mint(f.wallet.address());
    let foreign = f.collection_two.mint(f.owner);

    f.wallet
        .withdraw_item(f.user, &f.collection, f.user, item)
        .unwrap();

    let result = f
        .wallet
        .withdraw_item(f.user, &f.collection_two, f.user, foreign);
    assert!(matches!(result, Err(WalletError::ItemNotHeld { .. })));
    assert_eq!(f.collection_two.owner_of(foreign), Some(f.owner));
}

#[test]
fn allowances_are_isolated_per_token() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 1_000);
    f.token_two.mint(f.wallet.address(), 1_000);
    f.wallet
        .grant_fungible_allowance(f.user, f.token.address(), f.third_party, 1_000)
        .unwrap();

    let result = f
        .wallet
        .withdraw_fungible(f.third_party, &f.token_two, f.third_party, 1_000);
    assert!(matches!(
        result,
        Err(WalletError::InsufficientAllowance { .. })
    ));
}

// ── Internal vs external path separation ──────────────────────────────────

#[test]
fn internal_grant_does_not_authorize_external_pull() {
    let f = deploy();

    f.token.mint(f.wallet.address(), 1_000);
    f.wallet
        .grant_fungible_allowance(f.user, f.token.address(), f.third_party, 1_000)
        .unwrap();

    // No approval exists inside the token contract itself.
    assert_eq!(f.token.allowance(&f.wallet.address(), &f.third_party), 0);
    let result = f
        .token
        .transfer_from(f.third_party, f.wallet.address(), f.third_party, 1_000);
    assert!(matches!(
        result,
        Err(AssetError::InsufficientAllowance { .. })
    ));
}

#[test]
fn nonexistent_item_is_unavailable_not_unauthorized_for_controller() {
    let f = deploy();

    let result = f
        .wallet
        .withdraw_item(f.user, &f.collection, f.user, TokenId::new(42));
    assert!(matches!(result, Err(WalletError::ItemNotHeld { .. })));
}
