use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::api::UserSummary;
use crate::auth::{PasswordHasher, Role};
use crate::cli::utils::{output_rows, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user account")]
    Create {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password")]
        password: String,
        #[arg(long, help = "Grant ROLE_ADMIN instead of ROLE_USER")]
        admin: bool,
    },

    #[command(about = "List user accounts")]
    List,

    #[command(about = "Delete a user account and all its contacts")]
    Delete {
        #[arg(help = "User id")]
        id: i64,
    },
}

pub async fn handle(
    cmd: UserCommands,
    config: &AppConfig,
    db: &DatabaseManager,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { username, password, admin } => {
            let users = UserService::new(
                db.users(),
                db.contacts(),
                PasswordHasher::new(config.security.bcrypt_cost),
            );
            let role = if admin { Role::Admin } else { Role::User };
            let user = users.create_account(&username, &password, role).await?;

            output_success(
                output_format,
                &format!("Created user '{}' (id {}, {})", user.username, user.id, user.role),
                Some(json!({ "id": user.id, "username": user.username, "role": user.role })),
            )
        }
        UserCommands::List => {
            let users: Vec<UserSummary> = db
                .users()
                .list()
                .await?
                .into_iter()
                .map(|u| UserSummary::new(u, Vec::new()))
                .collect();

            output_rows(output_format, &users, |u| format!("{:>6}  {:<24} {}", u.id, u.username, u.role))
        }
        UserCommands::Delete { id } => {
            if !db.users().delete(id).await? {
                bail!("User {} not found", id);
            }
            output_success(output_format, &format!("Deleted user {}", id), None)
        }
    }
}
