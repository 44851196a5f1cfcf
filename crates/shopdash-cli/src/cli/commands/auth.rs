//! Session command handlers.

use std::io::{self, Write};

use anyhow::{Context, Result};
use shopdash_core::gateway::{DEFAULT_AUTH_ERROR, DEFAULT_SIGNUP_ERROR};
use shopdash_core::pages::{LoginForm, SignupForm};
use shopdash_core::session::Registration;

use crate::context::AppContext;

pub struct SignupArgs {
    pub email: String,
    pub password: Option<String>,
    pub store_name: String,
    pub shopify_domain: String,
    pub shopify_access_token: String,
}

/// Reads one line from stdin. The prompt goes to stderr so stdout stays clean.
fn read_password() -> Result<String> {
    eprint!("Password: ");
    let _ = io::stderr().flush();

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}

fn print_signed_in(ctx: &AppContext) {
    if let Some(user) = ctx.shell.session().current_user() {
        println!("Logged in as {} ({})", user.display_name(), user.email);
    }
}

pub async fn login(ctx: &mut AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    let mut form = LoginForm::new(email, password);
    if !ctx.shell.login(&mut form).await {
        anyhow::bail!(
            "Login failed: {}",
            form.error().unwrap_or(DEFAULT_AUTH_ERROR)
        );
    }
    print_signed_in(ctx);
    Ok(())
}

pub async fn signup(ctx: &mut AppContext, args: SignupArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => read_password()?,
    };

    let mut form = SignupForm::new(Registration {
        email: args.email,
        password,
        store_name: args.store_name,
        shopify_domain: args.shopify_domain,
        shopify_access_token: args.shopify_access_token,
    });
    if !ctx.shell.signup(&mut form).await {
        anyhow::bail!(
            "Signup failed: {}",
            form.error().unwrap_or(DEFAULT_SIGNUP_ERROR)
        );
    }
    print_signed_in(ctx);
    Ok(())
}

pub fn logout(ctx: &mut AppContext) {
    ctx.shell.logout();
    println!("Logged out.");
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    let Some(user) = ctx.shell.session().current_user() else {
        anyhow::bail!("Not logged in. Run `shopdash login` first.");
    };
    println!("{} <{}>", user.display_name(), user.email);
    Ok(())
}
