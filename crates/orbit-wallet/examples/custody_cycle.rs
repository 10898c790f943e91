//! Demonstrates the full Orbit custody cycle
//!
//! This example shows:
//! 1. Deposits with a registry-governed fee split
//! 2. Direct withdrawals by the primary controller
//! 3. Internally delegated withdrawals that consume allowance
//! 4. Externally delegated pulls that bypass the engine
//!
//! Run with: cargo run --example custody_cycle

use std::sync::Arc;

use orbit_assets::{FungibleToken, NonFungibleToken, StandardCollection, StandardToken};
use orbit_fees::{FeeRateRegistry, FeeRateSource};
use orbit_ledger::NativeLedger;
use orbit_types::Address;
use orbit_wallet::CustodyWallet;

const UNIT: u128 = 1_000_000_000_000_000_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Orbit Custody Cycle Demonstration               ║");
    println!("║                                                              ║");
    println!("║  Deposit → fee split → grants → delegated withdrawals        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let owner = Address::derived("demo-owner");
    let user = Address::derived("demo-user");
    let agent = Address::derived("demo-agent");

    let ledger = Arc::new(NativeLedger::new());
    let registry = Arc::new(FeeRateRegistry::new(owner, 500).expect("rate in range"));
    let wallet = CustodyWallet::new(
        Address::derived("demo-wallet"),
        user,
        Arc::clone(&registry) as Arc<dyn FeeRateSource>,
        owner,
        Arc::clone(&ledger),
    )
    .expect("wallet construction");

    println!("📊 Initial Setup:");
    println!("   Wallet:     {}", wallet.address());
    println!("   Controller: {}", wallet.controller());
    println!("   Fee sink:   {}", wallet.fee_sink());
    println!("   Fee rate:   5.00% (500 bps)");
    println!();

    // =========================================================================
    // Step 1: Native deposit with fee split
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 1: Deposit 10 units of native currency");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    ledger.fund(user, 10 * UNIT).expect("faucet");
    let outcome = wallet.deposit(user, 10 * UNIT).expect("deposit");

    println!("   Retained in custody: {} base units", outcome.retained);
    println!("   Forwarded as fee:    {} base units", outcome.fee);
    println!("   Fee sink balance:    {} base units", ledger.balance(&owner));
    println!();

    // =========================================================================
    // Step 2: Controller withdraws directly
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 2: Controller withdraws 1 unit to the agent");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    wallet.withdraw_native(user, agent, UNIT).expect("withdrawal");
    println!("   Agent balance:  {} base units", ledger.balance(&agent));
    println!("   Custody left:   {} base units", wallet.native_balance());
    println!();

    // =========================================================================
    // Step 3: Internally delegated fungible withdrawal
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 3: Delegate 600 ORB to the agent, agent withdraws");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let token = StandardToken::new("ORB");
    token.mint(wallet.address(), 1_000);

    wallet
        .grant_fungible_allowance(user, token.address(), agent, 600)
        .expect("grant");

    match wallet.withdraw_fungible(agent, &token, agent, 1_000) {
        Ok(_) => println!("   ⚠ UNEXPECTED: overdrawn withdrawal succeeded"),
        Err(e) => println!("   ✓ Overdrawn withdrawal rejected: {e}"),
    }

    wallet
        .withdraw_fungible(agent, &token, agent, 600)
        .expect("delegated withdrawal");
    println!("   ✓ Agent withdrew 600 ORB");
    println!(
        "   Remaining allowance: {}",
        wallet.fungible_allowance(token.address(), agent)
    );
    println!();

    // =========================================================================
    // Step 4: External delegation bypasses the engine
    // =========================================================================
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(" Step 4: External collection approval, agent pulls an item");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let collection = StandardCollection::new("ORBNFT");
    let item = collection.mint(wallet.address());

    wallet
        .grant_external_collection_allowance(user, &collection, agent, true)
        .expect("external approval");

    collection
        .transfer_from(agent, wallet.address(), agent, item)
        .expect("external pull");
    println!("   ✓ Agent pulled {item} straight from the collection contract");
    println!("   Item holder: {}", collection.owner_of(item).unwrap());
    println!();

    println!("Done. Custody {} base units, fee sink {} base units.",
        wallet.native_balance(),
        ledger.balance(&owner)
    );
}
