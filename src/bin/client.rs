//! Bank RPC client
//!
//! Command-line front end for a running `bank-server`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bank-client -- create acct1 savings
//! cargo run --bin bank-client -- deposit acct1 100.00
//! cargo run --bin bank-client -- withdraw acct1 30.00
//! cargo run --bin bank-client -- interest acct1 10
//! cargo run --bin bank-client -- balance acct1
//! cargo run --bin bank-client -- stress acct1 --count 200
//! ```
//!
//! Rejected operations print `Error: <reason>` and exit with code 1.

use bank_rpc::cli::{self, ClientCommand};
use bank_rpc::rpc::{BankClient, Receipt};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::process;
use tonic::{Code, Status};

#[tokio::main]
async fn main() {
    let args = cli::parse_client_args();
    cli::init_logging();

    let mut client = match BankClient::connect(&args.server).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: cannot reach {}: {}", args.server, e);
            process::exit(1);
        }
    };

    if let Err(status) = execute(&mut client, args.command).await {
        println!("Error: {}", status.message());
        process::exit(1);
    }
}

async fn execute(client: &mut BankClient, command: ClientCommand) -> Result<(), Status> {
    match command {
        ClientCommand::Create {
            account_id,
            account_type,
        } => println!("{}", client.create_account(&account_id, &account_type).await?),
        ClientCommand::Balance { account_id } => {
            println!("Balance: {}", client.get_balance(&account_id).await?)
        }
        ClientCommand::Deposit { account_id, amount } => {
            print_receipt(client.deposit(&account_id, amount).await?)
        }
        ClientCommand::Withdraw { account_id, amount } => {
            print_receipt(client.withdraw(&account_id, amount).await?)
        }
        ClientCommand::Interest { account_id, rate } => {
            print_receipt(client.calculate_interest(&account_id, rate).await?)
        }
        ClientCommand::Demo { account_id } => demo(client, &account_id).await,
        ClientCommand::Stress { account_id, count } => {
            stress(client, &account_id, count).await?
        }
    }
    Ok(())
}

fn print_receipt(receipt: Receipt) {
    println!("{} | New balance: {}", receipt.message, receipt.balance);
}

fn report<T>(result: Result<T, Status>, show: impl FnOnce(T)) {
    match result {
        Ok(value) => show(value),
        Err(status) => println!("Error: {}", status.message()),
    }
}

/// Walk one account through every operation, reporting each outcome
async fn demo(client: &mut BankClient, account_id: &str) {
    report(client.create_account(account_id, "Savings").await, |message| {
        println!("{}", message)
    });
    report(client.get_balance(account_id).await, |balance| {
        println!("Balance: {}", balance)
    });
    report(
        client.deposit(account_id, Decimal::new(1000, 0)).await,
        print_receipt,
    );
    report(
        client.withdraw(account_id, Decimal::new(200, 0)).await,
        print_receipt,
    );
    report(
        client.calculate_interest(account_id, Decimal::new(5, 0)).await,
        print_receipt,
    );
    report(client.get_balance(account_id).await, |balance| {
        println!("New Balance: {}", balance)
    });
}

/// Fire `count` concurrent deposits of 1 and check none was lost
async fn stress(client: &mut BankClient, account_id: &str, count: usize) -> Result<(), Status> {
    let before = client.get_balance(account_id).await?;

    let deposits = (0..count).map(|_| {
        let mut client = client.clone();
        let account_id = account_id.to_string();
        async move { client.deposit(&account_id, Decimal::ONE).await }
    });
    let results = join_all(deposits).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let aborted = results
        .iter()
        .filter(|r| matches!(r, Err(status) if status.code() == Code::Aborted))
        .count();
    let failed = count - succeeded - aborted;

    let after = client.get_balance(account_id).await?;
    let expected = before + Decimal::from(succeeded);

    println!(
        "Deposits: {} succeeded, {} aborted, {} failed",
        succeeded, aborted, failed
    );
    println!("Balance: {} -> {} (expected {})", before, after, expected);
    if after != expected {
        println!("Lost updates detected");
    }
    Ok(())
}
