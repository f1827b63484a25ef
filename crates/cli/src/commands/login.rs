use clap::Args;
use procura_ops::OpsClient;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long)]
    pub email: String,
    /// Account password.
    #[arg(long, env = "PROCURA_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(ops: &OpsClient, args: &LoginArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let session = ops.login(&args.email, &args.password).await?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        OutputFormat::Text => {
            eprintln!(
                "Signed in as {} ({})",
                session.user.email,
                session
                    .user
                    .company_id
                    .map_or_else(|| "no company".to_string(), |id| format!("company {id}")),
            );
            println!("export PROCURA_ACCESS_TOKEN={}", session.access_token);
        }
    }
    Ok(())
}
