use anyhow::Context;
use chrono::{Duration, Utc};
use comfy_table::{presets::UTF8_FULL, Table};
use drawpool_core::{
    generate_seed, AccountId, CreditLedger, DrawConfig, DrawEngine, FixedEntropy,
    InMemoryCreditLedger, OwnershipCapability, SealedSeed,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name the owner account is registered under at init.
const OWNER: &str = "owner";

#[derive(Debug, Serialize, Deserialize)]
struct DrawStorage {
    engine: DrawEngine<InMemoryCreditLedger>,
    accounts: HashMap<String, AccountId>,
}

fn storage_path(data_dir: &Path) -> PathBuf {
    data_dir.join("drawpool_state.json")
}

fn load_storage(data_dir: &Path) -> anyhow::Result<DrawStorage> {
    let path = storage_path(data_dir);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("no draw state at {}; run `drawpool init` first", path.display()))?;
    serde_json::from_str(&content).context("draw state file is corrupt")
}

fn save_storage(data_dir: &Path, storage: &DrawStorage) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(storage)?;
    std::fs::write(storage_path(data_dir), content)?;
    Ok(())
}

fn account_id(storage: &DrawStorage, name: &str) -> anyhow::Result<AccountId> {
    storage.accounts.get(name).copied().with_context(|| {
        format!("unknown account '{name}'; run `drawpool register {name}` first")
    })
}

fn parse_entropy(entropy: Option<&str>) -> anyhow::Result<FixedEntropy> {
    match entropy {
        Some(hex_anchor) => FixedEntropy::from_hex(hex_anchor)
            .context("entropy anchor must be 64 hex characters"),
        None => {
            println!("Warning: no entropy anchor given, using the all-zero anchor");
            Ok(FixedEntropy::default())
        }
    }
}

pub fn init(
    data_dir: &Path,
    ratio: u64,
    price: u64,
    fee: u64,
    seed: Option<String>,
) -> anyhow::Result<()> {
    if storage_path(data_dir).exists() {
        anyhow::bail!(
            "draw state already exists at {}; remove it to start over",
            storage_path(data_dir).display()
        );
    }

    let seed = seed.unwrap_or_else(generate_seed);
    let owner = Uuid::new_v4();
    let config = DrawConfig::new(ratio, price, fee)?;
    let sealed = SealedSeed::seal(owner, &seed);
    let engine = DrawEngine::new(
        config,
        OwnershipCapability::new(owner),
        sealed.clone(),
        InMemoryCreditLedger::new(),
    );

    let mut accounts = HashMap::new();
    accounts.insert(OWNER.to_string(), owner);

    save_storage(data_dir, &DrawStorage { engine, accounts })?;

    println!("Draw deployment created");
    println!("  Owner account:  {}", OWNER);
    println!("  Sealed seed:    {}", sealed.as_hex());
    println!("  Secret seed:    {}", seed);
    println!();
    println!("Keep the secret seed safe; it is required to close every draw");
    println!("and is NOT stored in the state file.");
    Ok(())
}

pub fn register(data_dir: &Path, name: &str) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    if storage.accounts.contains_key(name) {
        anyhow::bail!("account '{}' already exists", name);
    }

    let id = Uuid::new_v4();
    storage.accounts.insert(name.to_string(), id);
    save_storage(data_dir, &storage)?;

    println!("Registered account '{}' ({})", name, id);
    Ok(())
}

pub fn open_draw(data_dir: &Path, minutes: i64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let owner = account_id(&storage, OWNER)?;
    let closing_time = Utc::now() + Duration::minutes(minutes);
    storage.engine.open_draw(owner, closing_time)?;
    save_storage(data_dir, &storage)?;

    println!("Draw open, closing at {}", closing_time.format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}

pub fn close_draw(data_dir: &Path, seed: &str, entropy: Option<&str>) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;
    let entropy = parse_entropy(entropy)?;

    let winner = storage.engine.close_draw(seed, &entropy)?;
    save_storage(data_dir, &storage)?;

    match winner {
        Some(winner) => {
            let name = storage
                .accounts
                .iter()
                .find(|(_, id)| **id == winner)
                .map(|(name, _)| name.as_str())
                .unwrap_or("<unregistered>");
            println!("Draw closed, winner: {} ({})", name, winner);
            println!(
                "Winnings withdrawable: {} credits",
                storage.engine.withdrawable(winner)
            );
        }
        None => println!("Draw closed with no slots filled"),
    }
    Ok(())
}

pub fn buy_credits(data_dir: &Path, account: &str, payment: u64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let buyer = account_id(&storage, account)?;
    let minted = storage.engine.purchase_credits(buyer, payment)?;
    save_storage(data_dir, &storage)?;

    println!(
        "Minted {} credits to '{}' for {} base units",
        minted, account, payment
    );
    Ok(())
}

pub fn approve(data_dir: &Path, account: &str, amount: u64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let owner = account_id(&storage, account)?;
    let pool = storage.engine.pool_account();
    storage.engine.ledger_mut().approve(owner, pool, amount);
    save_storage(data_dir, &storage)?;

    println!("'{}' authorized the pool for {} credits", account, amount);
    Ok(())
}

pub fn place_bets(data_dir: &Path, account: &str, times: u64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let bettor = account_id(&storage, account)?;
    storage.engine.place_bets(bettor, times)?;
    save_storage(data_dir, &storage)?;

    println!(
        "'{}' bought {} slot(s); prize pool {} credits, {} slot(s) total",
        account,
        times,
        storage.engine.prize_pool(),
        storage.engine.slot_count()
    );
    Ok(())
}

pub fn withdraw_prize(data_dir: &Path, account: &str, amount: u64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let caller = account_id(&storage, account)?;
    storage.engine.withdraw_prize(caller, amount)?;
    save_storage(data_dir, &storage)?;

    println!(
        "'{}' withdrew {} credits; {} still withdrawable",
        account,
        amount,
        storage.engine.withdrawable(caller)
    );
    Ok(())
}

pub fn withdraw_owner_pool(data_dir: &Path, amount: u64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let owner = account_id(&storage, OWNER)?;
    storage.engine.withdraw_owner_pool(owner, amount)?;
    save_storage(data_dir, &storage)?;

    println!(
        "Owner withdrew {} credits; {} left in the owner pool",
        amount,
        storage.engine.owner_pool()
    );
    Ok(())
}

pub fn return_credits(data_dir: &Path, account: &str, amount: u64) -> anyhow::Result<()> {
    let mut storage = load_storage(data_dir)?;

    let caller = account_id(&storage, account)?;
    let refund = storage.engine.return_credits(caller, amount)?;
    save_storage(data_dir, &storage)?;

    println!(
        "Burned {} credits from '{}', refunding {} base units",
        amount, account, refund
    );
    Ok(())
}

pub fn preview(data_dir: &Path, seed: &str, entropy: Option<&str>) -> anyhow::Result<()> {
    let storage = load_storage(data_dir)?;
    let entropy = parse_entropy(entropy)?;

    let number = storage.engine.random_number(seed, &entropy);
    println!("Winner number: {}", number);

    match storage.engine.winning_index(seed, &entropy) {
        Some(index) => {
            let winner = storage.engine.slots()[index];
            let name = storage
                .accounts
                .iter()
                .find(|(_, id)| **id == winner)
                .map(|(name, _)| name.as_str())
                .unwrap_or("<unregistered>");
            println!(
                "Would select slot {} of {} ('{}')",
                index,
                storage.engine.slot_count(),
                name
            );
        }
        None => println!("No slots filled; a close would pay nobody"),
    }
    Ok(())
}

pub fn status(data_dir: &Path) -> anyhow::Result<()> {
    let storage = load_storage(data_dir)?;
    let info = storage.engine.get_info();
    let config = storage.engine.config();

    println!("Draw status:");
    println!("  State:       {}", if info.open { "Open" } else { "Closed" });
    if let Some(closing) = info.closing_time {
        println!("  Closing:     {}", closing.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  Prize pool:  {} credits", info.prize_pool);
    println!("  Owner pool:  {} credits", info.owner_pool);
    println!("  Slots:       {}", info.slot_count);
    println!(
        "  Pricing:     ratio {}, price {}, fee {}",
        config.credit_ratio, config.bet_price, config.bet_fee
    );
    println!("  Sealed seed: {}", info.sealed_seed);
    println!();

    let mut names: Vec<&String> = storage.accounts.keys().collect();
    names.sort();

    let pool = storage.engine.pool_account();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Account", "Credits", "Pool allowance", "Withdrawable"]);
    for name in names {
        let id = storage.accounts[name];
        table.add_row(vec![
            name.to_string(),
            storage.engine.ledger().balance_of(id).to_string(),
            storage.engine.ledger().allowance(id, pool).to_string(),
            storage.engine.withdrawable(id).to_string(),
        ]);
    }
    println!("{}", table);

    println!(
        "Pool account holds {} credits",
        storage.engine.ledger().balance_of(pool)
    );
    Ok(())
}
