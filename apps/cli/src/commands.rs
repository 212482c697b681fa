//! Command handlers. Accounts can be given by stored name or by address;
//! operations that sign use the current account.

use crate::{ClaimableCommand, Command};
use anyhow::{anyhow, bail, Context as _};
use serde::Serialize;
use serde_json::json;
use stellar_payments::{
    is_valid_account_id, AccountSession, Amount, KeyValueStore, Ledger, PaymentRequest, StoredAccount,
    TransactionResponse, TransactionService,
};

pub struct Context<L: Ledger, S: KeyValueStore> {
    pub service: TransactionService<L>,
    pub session: AccountSession<S>,
}

/// Account given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub address: String,
    /// Known only for stored accounts
    pub secret: Option<String>,
}

pub async fn run<L: Ledger, S: KeyValueStore>(
    ctx: &mut Context<L, S>,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::New { name, fund } => {
            if ctx.session.get_account(&name)?.is_some() {
                bail!("Account '{}' already exists", name);
            }

            let keypair = ctx.service.create_keypair();
            ctx.session.save_account(&name, &keypair.to_stored())?;
            if ctx.session.current_account().is_none() {
                ctx.session.set_current_account(&name)?;
            }

            if fund {
                ctx.service.fund_account(&keypair.public_key()).await?;
            }

            print_json(&json!({
                "name": name,
                "publicKey": keypair.public_key(),
                "funded": fund,
            }))
        }

        Command::Use { name } => {
            let account = ctx
                .session
                .get_account(&name)?
                .ok_or_else(|| anyhow!("Unknown account '{}'", name))?;
            ctx.session.set_current_account(&name)?;

            print_json(&json!({ "name": name, "publicKey": account.public_key }))
        }

        Command::Whoami => {
            let account = current(&ctx.session)?;
            print_json(&json!({
                "name": ctx.session.current_account(),
                "publicKey": account.public_key,
                "explorer": ctx.service.config().explorer_account_url(&account.public_key),
            }))
        }

        Command::Accounts => {
            let current = ctx.session.current_account().map(str::to_string);
            let accounts: Vec<_> = ctx
                .session
                .account_names()?
                .into_iter()
                .map(|name| json!({ "current": current.as_deref() == Some(name.as_str()), "name": name }))
                .collect();
            print_json(&accounts)
        }

        Command::Balance { account } => {
            let account = resolve_or_current(&ctx.session, account.as_deref())?;
            let balances = ctx.service.account_balances(&account.address).await?;
            print_json(&balances)
        }

        Command::Fund { account } => {
            let account = resolve_or_current(&ctx.session, account.as_deref())?;
            ctx.service.fund_account(&account.address).await?;
            print_json(&json!({
                "funded": account.address,
                "explorer": ctx.service.config().explorer_account_url(&account.address),
            }))
        }

        Command::Pay {
            to,
            amount,
            asset,
            issuer,
            memo,
        } => {
            let sender = current(&ctx.session)?;
            let receiver = resolve(&ctx.session, &to)?;

            let request = PaymentRequest {
                sender_public: sender.public_key,
                sender_secret: sender.secret_key,
                receiver_public: receiver.address,
                receiver_secret: receiver.secret,
                amount: parse_amount(&amount)?,
                asset_code: asset,
                asset_issuer: issuer,
                memo,
            };

            let response = ctx.service.payment(&request).await?;
            report(ctx, &response)
        }

        Command::Issue {
            code,
            amount,
            distributor,
        } => {
            let issuer = current(&ctx.session)?;
            let distributor = resolve(&ctx.session, &distributor)?;
            let distributor_secret = distributor
                .secret
                .ok_or_else(|| anyhow!("Distributor must be a stored account"))?;

            let issuance = ctx
                .service
                .create_asset(&issuer.secret_key, &distributor_secret, &code, parse_amount(&amount)?)
                .await?;
            ctx.session.set_hash_id(&issuance.payment.hash);

            print_json(&json!({
                "asset": issuance.asset.canonical(),
                "trustlineHash": issuance.trustline.hash,
                "paymentHash": issuance.payment.hash,
            }))
        }

        Command::Claimable(ClaimableCommand::Create { to, amount, asset }) => {
            let sender = current(&ctx.session)?;
            let destination = resolve(&ctx.session, &to)?;

            let created = ctx
                .service
                .create_claimable_balance(
                    &asset,
                    parse_amount(&amount)?,
                    &sender.secret_key,
                    &destination.address,
                )
                .await?;
            ctx.session.set_hash_id(&created.response.hash);

            print_json(&json!({
                "balanceId": created.balance_id,
                "hash": created.response.hash,
            }))
        }

        Command::Claimable(ClaimableCommand::Claim { balance_id }) => {
            let claimant = current(&ctx.session)?;
            let response = ctx
                .service
                .claim_claimable_balance(&claimant.secret_key, &balance_id)
                .await?;
            report(ctx, &response)
        }

        Command::Claimable(ClaimableCommand::List { account }) => {
            let account = resolve_or_current(&ctx.session, account.as_deref())?;
            let balances = ctx.service.claimable_balances(&account.address).await?;
            print_json(&balances)
        }
    }
}

/// A `G...` address as is, otherwise a stored account name
pub fn resolve<S: KeyValueStore>(
    session: &AccountSession<S>,
    reference: &str,
) -> anyhow::Result<AccountRef> {
    if is_valid_account_id(reference) {
        return Ok(AccountRef {
            address: reference.to_string(),
            secret: None,
        });
    }

    match session.get_account(reference)? {
        Some(stored) => Ok(AccountRef {
            address: stored.public_key,
            secret: Some(stored.secret_key),
        }),
        None => bail!("Unknown account '{}': not a stored name or a G... address", reference),
    }
}

fn resolve_or_current<S: KeyValueStore>(
    session: &AccountSession<S>,
    reference: Option<&str>,
) -> anyhow::Result<AccountRef> {
    match reference {
        Some(reference) => resolve(session, reference),
        None => {
            let stored = current(session)?;
            Ok(AccountRef {
                address: stored.public_key,
                secret: Some(stored.secret_key),
            })
        }
    }
}

fn current<S: KeyValueStore>(session: &AccountSession<S>) -> anyhow::Result<StoredAccount> {
    session
        .current_account_data()?
        .ok_or_else(|| anyhow!("No current account; run `stellar-wallet use <name>`"))
}

fn parse_amount(value: &str) -> anyhow::Result<Amount> {
    value
        .parse()
        .with_context(|| format!("Invalid amount '{}'", value))
}

fn report<L: Ledger, S: KeyValueStore>(
    ctx: &mut Context<L, S>,
    response: &TransactionResponse,
) -> anyhow::Result<()> {
    ctx.session.set_hash_id(&response.hash);
    print_json(&json!({
        "hash": response.hash,
        "ledger": response.ledger,
        "explorer": ctx.service.config().explorer_tx_url(&response.hash),
    }))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
