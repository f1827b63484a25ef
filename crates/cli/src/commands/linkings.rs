use clap::{Args, Subcommand, ValueEnum};
use procura_core::{Linking, LinkingResponse};
use procura_ops::OpsClient;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct LinkingsArgs {
    #[command(subcommand)]
    pub command: LinkingsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResponseArg {
    Accepted,
    Rejected,
    Unlinked,
    Pending,
}

impl From<ResponseArg> for LinkingResponse {
    fn from(arg: ResponseArg) -> Self {
        match arg {
            ResponseArg::Accepted => Self::Accepted,
            ResponseArg::Rejected => Self::Rejected,
            ResponseArg::Unlinked => Self::Unlinked,
            ResponseArg::Pending => Self::Pending,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LinkingsCommand {
    /// List linking requests for the company.
    List,
    /// Answer a linking request as the supplier.
    Respond {
        /// Linking ID.
        linking_id: i64,
        /// New status.
        #[arg(long)]
        status: ResponseArg,
    },
}

pub async fn run(
    ops: &mut OpsClient,
    args: &LinkingsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        LinkingsCommand::List => ops.linkings().fetch().await?,
        LinkingsCommand::Respond { linking_id, status } => {
            let response = LinkingResponse::from(*status);
            ops.linkings().respond(*linking_id, response).await?;
            if let OutputFormat::Text = format {
                println!("Linking {linking_id} marked {response}");
            }
        }
    }

    let linkings = ops.linkings().linkings();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(linkings)?);
        }
        OutputFormat::Text => {
            println!("{} linkings:", linkings.len());
            for l in linkings {
                print_row(l);
            }
        }
    }
    Ok(())
}

fn print_row(l: &Linking) {
    let consumer = l
        .consumer_company_name
        .clone()
        .unwrap_or_else(|| l.consumer_company_id.to_string());
    let supplier = l
        .supplier_company_name
        .clone()
        .unwrap_or_else(|| l.supplier_company_id.to_string());
    println!(
        "  {id} | {consumer} -> {supplier} | {status:?} | updated {updated}",
        id = l.linking_id,
        status = l.status,
        updated = l
            .updated_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
    );
}
