use clap::{Args, Subcommand};
use procura_core::{CompanyUserPatch, NewCompanyUser};
use procura_ops::OpsClient;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List company staff.
    List,
    /// Add a staff member.
    Add {
        /// Email address (login).
        email: String,
        /// Initial password.
        #[arg(long, env = "PROCURA_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role (owner, manager, salesman).
        #[arg(long, default_value = "salesman")]
        role: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Update a staff member. Only given fields change.
    Update {
        /// User ID.
        user_id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

pub async fn run(ops: &mut OpsClient, args: &UsersArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match &args.command {
        UsersCommand::List => ops.users().fetch().await?,
        UsersCommand::Add {
            email,
            password,
            role,
            first_name,
            last_name,
            phone,
        } => {
            let mut user = NewCompanyUser::new(email, password, role);
            user.first_name = first_name.clone().unwrap_or_default();
            user.last_name = last_name.clone().unwrap_or_default();
            user.phone_number = phone.clone().unwrap_or_default();
            ops.users().add(user).await?;
        }
        UsersCommand::Update {
            user_id,
            email,
            role,
            first_name,
            last_name,
            phone,
        } => {
            let patch = CompanyUserPatch {
                email: email.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                phone_number: phone.clone(),
                role: role.clone(),
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update for user {user_id}");
            }
            ops.users().update(user_id, &patch).await?;
        }
    }

    // Every branch ends with a fresh staff list.
    let users = ops.users().users();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(users)?);
        }
        OutputFormat::Text => {
            println!("{} users:", users.len());
            for u in users {
                println!(
                    "  {id} | {email} | {role} | {first} {last}",
                    id = u.id,
                    email = u.email,
                    role = u.role,
                    first = u.first_name,
                    last = u.last_name,
                );
            }
        }
    }
    Ok(())
}
