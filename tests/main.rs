use anyhow::Result;
use near_workspaces::network::Sandbox;
use near_workspaces::{Account, Contract, Worker};
use serde_json::json;

/// Helper function to set up the testing environment.
/// This will:
/// 1. Initialize a sandbox environment.
/// 2. Compile and deploy the lottery contract.
/// 3. Create accounts for the owner and a player.
/// 4. Initialize the contract with placeholder token/oracle accounts.
async fn setup() -> Result<(Worker<Sandbox>, Contract, Account, Account)> {
    let worker = near_workspaces::sandbox().await?;
    let wasm = near_workspaces::compile_project(".").await?;
    let contract = worker.dev_deploy(&wasm).await?;

    let owner = worker.dev_create_account().await?;
    let player = worker.dev_create_account().await?;

    contract
        .call("new")
        .args_json(json!({
            "owner_id": owner.id(),
            "maintainer_id": "maintainer.test.near",
            "donation_id": "donation.test.near",
            "price_feed_id": "feed.test.near",
            "tokens": {
                "jkpt_id": "jkpt.test.near",
                "jkpt_decimals": 8,
                "usdt_id": "usdt.test.near",
                "usdc_id": "usdc.test.near",
                "usd_decimals": 6,
                "xexp_id": "xexp.test.near",
                "xexp_decimals": 18,
            },
            "oracle": {
                "account_id": "vrf.test.near",
                "fee_per_request": "0",
                "credit_threshold": "0",
            },
            // 60k USD per whole JKPT
            "jkpt_price": "60000000000",
        }))
        .transact()
        .await?
        .into_result()?;

    Ok((worker, contract, owner, player))
}

// A relative tier with zero expectation is the only table shape that
// validates against a fresh, empty prize pool.
fn dormant_table() -> serde_json::Value {
    json!({
        "name": "launch-table",
        "tiers": [
            { "kind": "Relative", "expectation": "0", "reward": "100000" },
        ],
        "fee_ratio_ppm": 80000,
    })
}

#[tokio::test]
async fn register_swap_assigns_dense_ids_from_one() -> Result<()> {
    let (_worker, contract, owner, player) = setup().await?;

    let first: u64 = owner
        .call(contract.id(), "register_swap")
        .args_json(json!({ "params": dormant_table() }))
        .transact()
        .await?
        .json()?;
    assert_eq!(first, 1);

    let second: u64 = owner
        .call(contract.id(), "register_swap")
        .args_json(json!({ "params": dormant_table() }))
        .transact()
        .await?
        .json()?;
    assert_eq!(second, 2);

    let ids: Vec<u64> = contract
        .view("list_swap_ids")
        .args_json(json!({ "owner": owner.id() }))
        .await?
        .json()?;
    assert_eq!(ids, vec![1, 2]);

    let swap: serde_json::Value = contract
        .view("get_swap")
        .args_json(json!({ "swap_id": 1 }))
        .await?
        .json()?;
    assert_eq!(swap["id"], 1);
    assert_eq!(swap["owner"], owner.id().as_str());
    assert_eq!(swap["name"], "launch-table");
    assert_eq!(swap["fee_ratio_ppm"], 80000);

    let none: Vec<u64> = contract
        .view("list_swap_ids")
        .args_json(json!({ "owner": player.id() }))
        .await?
        .json()?;
    assert!(none.is_empty());

    Ok(())
}

#[tokio::test]
async fn oversized_tables_are_rejected() -> Result<()> {
    let (_worker, contract, owner, _player) = setup().await?;

    let tier = json!({ "kind": "Relative", "expectation": "0", "reward": "100000" });
    let result = owner
        .call(contract.id(), "register_swap")
        .args_json(json!({ "params": {
            "name": "",
            "tiers": (0..11).map(|_| tier.clone()).collect::<Vec<_>>(),
            "fee_ratio_ppm": 0,
        }}))
        .transact()
        .await?;
    assert!(result.is_failure());
    let err = format!("{:?}", result.into_result().unwrap_err());
    assert!(err.contains("too many branches (> 10)"), "got: {err}");

    Ok(())
}

#[tokio::test]
async fn empty_tables_are_rejected() -> Result<()> {
    let (_worker, contract, owner, _player) = setup().await?;

    let result = owner
        .call(contract.id(), "register_swap")
        .args_json(json!({ "params": {
            "name": "",
            "tiers": [],
            "fee_ratio_ppm": 0,
        }}))
        .transact()
        .await?;
    assert!(result.is_failure());
    let err = format!("{:?}", result.into_result().unwrap_err());
    assert!(err.contains("must have at least one branch"), "got: {err}");

    Ok(())
}

#[tokio::test]
async fn claiming_without_accrued_fees_fails() -> Result<()> {
    let (_worker, contract, owner, _player) = setup().await?;

    let remaining: Vec<String> = contract.view("get_remaining_reward_fee").await?.json()?;
    assert_eq!(remaining, vec!["0", "0"]);

    let result = owner
        .call(contract.id(), "claim_remaining_reward_fee")
        .transact()
        .await?;
    assert!(result.is_failure());
    let err = format!("{:?}", result.into_result().unwrap_err());
    assert!(err.contains("no remaining reward fees"), "got: {err}");

    Ok(())
}

#[tokio::test]
async fn maintenance_calls_are_owner_only() -> Result<()> {
    let (_worker, contract, owner, player) = setup().await?;

    let result = player
        .call(contract.id(), "set_maintainer")
        .args_json(json!({ "maintainer_id": player.id() }))
        .transact()
        .await?;
    assert!(result.is_failure());
    let err = format!("{:?}", result.into_result().unwrap_err());
    assert!(err.contains("Only callable by owner"), "got: {err}");

    owner
        .call(contract.id(), "set_maintainer")
        .args_json(json!({ "maintainer_id": player.id() }))
        .transact()
        .await?
        .into_result()?;
    let maintainer: String = contract.view("get_maintainer").await?.json()?;
    assert_eq!(maintainer, player.id().as_str());

    Ok(())
}

#[tokio::test]
async fn withdrawing_without_shares_fails() -> Result<()> {
    let (_worker, contract, _owner, player) = setup().await?;

    let result = player
        .call(contract.id(), "withdraw")
        .args_json(json!({ "lp_amount": "1" }))
        .transact()
        .await?;
    assert!(result.is_failure());
    let err = format!("{:?}", result.into_result().unwrap_err());
    assert!(err.contains("insufficient LP balance"), "got: {err}");

    Ok(())
}

#[tokio::test]
async fn price_pushes_are_restricted_to_the_feed_account() -> Result<()> {
    let (_worker, contract, owner, _player) = setup().await?;

    let result = owner
        .call(contract.id(), "set_jkpt_price")
        .args_json(json!({ "price": "50000000000" }))
        .transact()
        .await?;
    assert!(result.is_failure());
    let err = format!("{:?}", result.into_result().unwrap_err());
    assert!(err.contains("only callable by the price feed"), "got: {err}");

    Ok(())
}
