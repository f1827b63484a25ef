use clap::Args;
use procura_ops::OpsClient;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct CompanyArgs {
    /// Company ID. Defaults to the signed-in user's company.
    pub company_id: Option<i64>,
}

pub async fn run(ops: &OpsClient, args: &CompanyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let company = ops.company(args.company_id).await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&company)?);
        }
        OutputFormat::Text => {
            println!("Company ID:  {}", company.company_id);
            println!("Name:        {}", company.name);
            println!("Type:        {:?}", company.company_type);
            println!("Location:    {}", company.location);
            println!("Status:      {}", company.status);
            if let Some(ref logo) = company.logo_url {
                println!("Logo:        {logo}");
            }
            if !company.description.is_empty() {
                println!("Description: {}", company.description);
            }
        }
    }
    Ok(())
}
