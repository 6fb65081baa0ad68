//! CLI commands

use clap::Subcommand;
use tokenwarden_application::{Credentials, Freshness, LoginOutcome, SessionLifecycle};
use tokenwarden_domain::{AuthResult, UserProfile, UserProfileCreate};
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in with an email and password
    Login {
        /// Account email
        username: String,

        /// Account password
        #[arg(long, env = "TOKENWARDEN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Request a magic login link by email
    Magic {
        /// Account email
        username: String,
    },

    /// Finish a magic link login with the token from the email
    Claim {
        /// Token carried by the emailed link
        token: String,
    },

    /// Complete a two-factor login with an authenticator code
    Totp {
        /// Six-digit authenticator code
        code: String,
    },

    /// Revoke the session and forget the stored tokens
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Renew the access token if it has expired
    Refresh,

    /// Create an account and log in
    Register {
        /// Account email
        email: String,

        /// Initial password
        #[arg(long, env = "TOKENWARDEN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Start a password recovery by email
    Recover {
        /// Account email
        email: String,
    },

    /// Set a new password with the token from the recovery email
    Reset {
        /// Token carried by the recovery link
        token: String,

        /// New password
        #[arg(long, env = "TOKENWARDEN_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

impl Commands {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Magic { .. } => "magic",
            Self::Claim { .. } => "claim",
            Self::Totp { .. } => "totp",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Refresh => "refresh",
            Self::Register { .. } => "register",
            Self::Recover { .. } => "recover",
            Self::Reset { .. } => "reset",
        }
    }

    pub async fn execute(self, session: &SessionLifecycle) -> AuthResult<()> {
        info!(command = self.name(), "Running command");
        match self {
            Self::Login { username, password } => {
                let outcome = session
                    .login(Credentials::password(username, password))
                    .await?;
                report_login(session, outcome).await;
            }
            Self::Magic { username } => {
                let outcome = session.login(Credentials::magic_link(username)).await?;
                report_login(session, outcome).await;
            }
            Self::Claim { token } => {
                let outcome = session.claim(&token).await?;
                report_login(session, outcome).await;
            }
            Self::Totp { code } => {
                let outcome = session.totp_login(&code).await?;
                report_login(session, outcome).await;
            }
            Self::Logout => {
                session.logout().await;
                println!("Logged out");
            }
            Self::Whoami => {
                if !session.context().is_logged_in().await {
                    println!("Not logged in");
                    return Ok(());
                }
                if session.ensure_fresh().await == Freshness::SessionEnded {
                    println!("Session ended");
                    return Ok(());
                }
                let profile = session.fetch_profile().await?;
                print_profile(&profile);
            }
            Self::Refresh => match session.ensure_fresh().await {
                Freshness::Valid => println!("Access token still valid"),
                Freshness::Refreshed => println!("Access token renewed"),
                Freshness::SessionEnded => println!("Session ended"),
            },
            Self::Register {
                email,
                password,
                name,
            } => {
                let create = UserProfileCreate {
                    email,
                    password,
                    full_name: name,
                };
                let profile = session.register(&create).await?;
                print_profile(&profile);
            }
            Self::Recover { email } => {
                session.recover_password(&email).await?;
            }
            Self::Reset { token, password } => {
                session.reset_password(&password, &token).await?;
            }
        }
        Ok(())
    }
}

async fn report_login(session: &SessionLifecycle, outcome: LoginOutcome) {
    match outcome {
        LoginOutcome::Authenticated => match session.context().profile().await {
            Some(profile) => println!("Logged in as {}", profile.email),
            None => println!("Logged in"),
        },
        LoginOutcome::MagicLinkSent => {
            println!("Check your email, then run `tokenwarden claim <token>`");
        }
        LoginOutcome::TotpRequired => {
            println!("Two-factor code required, run `tokenwarden totp <code>`");
        }
    }
}

fn print_profile(profile: &UserProfile) {
    println!("id:              {}", profile.id);
    println!("email:           {}", profile.email);
    if !profile.full_name.is_empty() {
        println!("name:            {}", profile.full_name);
    }
    println!("email validated: {}", profile.email_validated);
    println!("two-factor:      {}", profile.totp_enabled);
    if profile.is_superuser {
        println!("role:            admin");
    }
}
