use std::path::PathBuf;

use clap::{Args, Subcommand};
use procura_core::{CatalogItem, CatalogItemFields};
use procura_ops::OpsClient;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

/// Optional item fields shared by create and update.
#[derive(Args, Debug, Default)]
pub struct ItemFieldArgs {
    /// Description.
    #[arg(long)]
    pub description: Option<String>,
    /// Units in stock.
    #[arg(long)]
    pub stock: Option<i64>,
    /// Retail price per unit.
    #[arg(long)]
    pub retail_price: Option<f64>,
    /// Quantity at which the bulk price applies.
    #[arg(long)]
    pub threshold: Option<i64>,
    /// Bulk price per unit.
    #[arg(long)]
    pub bulk_price: Option<f64>,
    /// Minimum order quantity.
    #[arg(long)]
    pub minimum_order: Option<i64>,
    /// Unit of measure (kg, pcs, ...).
    #[arg(long)]
    pub unit: Option<String>,
}

impl ItemFieldArgs {
    fn apply(&self, fields: &mut CatalogItemFields) {
        if let Some(ref description) = self.description {
            fields.description.clone_from(description);
        }
        if let Some(stock) = self.stock {
            fields.stock_quantity = stock;
        }
        if let Some(price) = self.retail_price {
            fields.retail_price = price;
        }
        if let Some(threshold) = self.threshold {
            fields.threshold = threshold;
        }
        if let Some(price) = self.bulk_price {
            fields.bulk_price = price;
        }
        if let Some(minimum) = self.minimum_order {
            fields.minimum_order = minimum;
        }
        if let Some(ref unit) = self.unit {
            fields.unit.clone_from(unit);
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List catalog items.
    List,
    /// Show one catalog item.
    Show {
        /// Product ID.
        product_id: String,
    },
    /// Create a catalog item, uploading local pictures.
    Create {
        /// Item name.
        #[arg(long)]
        name: String,
        #[command(flatten)]
        fields: ItemFieldArgs,
        /// Local picture file (repeatable, kept in order).
        #[arg(long = "picture")]
        pictures: Vec<PathBuf>,
    },
    /// Update a catalog item and its pictures.
    Update {
        /// Product ID.
        product_id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ItemFieldArgs,
        /// Local picture file to append (repeatable).
        #[arg(long = "add-picture")]
        add: Vec<PathBuf>,
        /// Existing picture reference to drop (repeatable).
        #[arg(long = "remove-picture")]
        remove: Vec<String>,
    },
    /// Delete a catalog item.
    Delete {
        /// Product ID.
        product_id: String,
    },
}

pub async fn run(
    ops: &mut OpsClient,
    args: &CatalogArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        CatalogCommand::List => {
            ops.catalog().fetch().await?;
            let items = ops.catalog().items();
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(items)?);
                }
                OutputFormat::Text => {
                    println!("{} products:", items.len());
                    for item in items {
                        print_row(item);
                    }
                }
            }
        }
        CatalogCommand::Show { product_id } => {
            ops.catalog().fetch().await?;
            match ops.catalog().find(product_id) {
                Some(item) => print_item(item, format)?,
                None => println!("Product not found: {product_id}"),
            }
        }
        CatalogCommand::Create {
            name,
            fields,
            pictures,
        } => {
            let mut item = CatalogItemFields::new(name);
            fields.apply(&mut item);
            let pictures = ops.new_pictures(pictures).await?;
            let created = ops.catalog().create(item, pictures).await?;
            print_item(&created, format)?;
        }
        CatalogCommand::Update {
            product_id,
            name,
            fields,
            add,
            remove,
        } => {
            let pictures = ops.edit_pictures(product_id, add, remove).await?;
            let mut item = ops
                .catalog()
                .find(product_id)
                .map(|current| current.fields.clone())
                .ok_or_else(|| anyhow::anyhow!("Product not found: {product_id}"))?;
            if let Some(name) = name {
                item.name.clone_from(name);
            }
            fields.apply(&mut item);
            let updated = ops.catalog().update(product_id, item, pictures).await?;
            print_item(&updated, format)?;
        }
        CatalogCommand::Delete { product_id } => {
            ops.catalog().remove(product_id).await?;
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({ "deleted": product_id, "remaining": ops.catalog().items().len() })
                    );
                }
                OutputFormat::Text => {
                    println!("Deleted product {product_id}");
                }
            }
        }
    }
    Ok(())
}

fn print_row(item: &CatalogItem) {
    println!(
        "  {id} | {name} | {stock} {unit} | retail {retail:.2} | {pictures} pictures",
        id = item.product_id().unwrap_or("-"),
        name = item.fields.name,
        stock = item.fields.stock_quantity,
        unit = item.fields.unit,
        retail = item.fields.retail_price,
        pictures = item.picture_url.len(),
    );
}

fn print_item(item: &CatalogItem, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item)?);
        }
        OutputFormat::Text => {
            let f = &item.fields;
            println!("Product ID:    {}", item.product_id().unwrap_or("-"));
            println!("Name:          {}", f.name);
            if !f.description.is_empty() {
                println!("Description:   {}", f.description);
            }
            println!("Stock:         {} {}", f.stock_quantity, f.unit);
            println!("Retail price:  {:.2}", f.retail_price);
            println!("Bulk price:    {:.2} (from {})", f.bulk_price, f.threshold);
            println!("Minimum order: {}", f.minimum_order);
            if !item.picture_url.is_empty() {
                println!("Pictures:");
                for url in &item.picture_url {
                    println!("  - {url}");
                }
            }
        }
    }
    Ok(())
}
