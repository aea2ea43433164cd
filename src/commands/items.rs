// ABOUTME: Tracked item commands: list, add, delete, and product lookups
// ABOUTME: Delete asks for confirmation unless --yes is given

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dialoguer::Confirm;

use crate::api::{AddItemRequest, ApiClient, Item, ProductInfo};
use crate::catalog::{discount_percent, format_rub, parse_product_ref};
use crate::config::AppConfig;

#[derive(Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    command: ItemsCommands,
}

#[derive(Subcommand)]
enum ItemsCommands {
    /// List tracked items
    List,
    /// Start tracking a product
    Add {
        /// Product URL or article id
        product: String,
        /// Desired price (defaults to a 10% discount on the backend)
        #[arg(long)]
        desired_price: Option<f64>,
    },
    /// Stop tracking an item
    Delete {
        /// Item id as shown by `items list`
        id: i64,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

pub async fn command(args: ItemsArgs, config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let telegram_id = config.require_telegram_id()?;

    match args.command {
        ItemsCommands::List => {
            let items = client.list_items(telegram_id).await?;
            print_items(&items);
        }
        ItemsCommands::Add {
            product,
            desired_price,
        } => {
            let product = product.trim().to_string();
            // Fail early on input the backend would reject anyway
            parse_product_ref(&product)?;

            let item = client
                .add_item(&AddItemRequest {
                    telegram_id,
                    wb_url: product,
                    desired_price,
                })
                .await
                .context("Failed to add item")?;
            println!("Now tracking #{}: {}", item.id, item.title);
            print_item(&item);
        }
        ItemsCommands::Delete { id, yes } => {
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Stop tracking item #{}?", id))
                    .default(false)
                    .interact()
                    .context("Failed to read confirmation")?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            client.delete_item(id, telegram_id).await?;
            println!("Item #{} deleted.", id);
        }
    }
    Ok(())
}

pub async fn product(product: &str, config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api_url)?;
    let article_id = parse_product_ref(product)?;
    let info = client.product_info(article_id).await?;
    print_product(article_id, &info);
    Ok(())
}

pub fn print_items(items: &[Item]) {
    if items.is_empty() {
        println!("No tracked items yet. Add one with `items add <url-or-article>`.");
        return;
    }
    println!("Tracked items ({}):", items.len());
    for item in items {
        print_item(item);
    }
}

pub fn print_item(item: &Item) {
    println!(
        "  #{:<6} {}  current {}  desired {}  discount {}%",
        item.id,
        item.title,
        format_rub(item.current_price),
        format_rub(item.desired_price),
        discount_percent(item)
    );
    if let Some(url) = &item.url {
        println!("          {}", url);
    }
}

fn print_product(article_id: u64, info: &ProductInfo) {
    println!("Article {}", article_id);
    if let Some(title) = &info.title {
        println!("  Title: {}", title);
    }
    if let Some(brand) = &info.brand {
        println!("  Brand: {}", brand);
    }
    if let Some(price) = info.price {
        println!("  Price: {}", format_rub(price));
    }
}
