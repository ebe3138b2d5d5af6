use anyhow::Result;
use colored::Colorize;
use ritmofit_notifications::{Identifier, SessionUser};
use serde_json::Value;

use crate::cli::LoginArgs;
use crate::config::AppConfig;
use crate::output::{print_error, print_success};

pub async fn login(cfg: &AppConfig, args: &LoginArgs) -> Result<()> {
    let session = super::open_session(cfg)?;

    let mut user = SessionUser::new(Identifier::parse(&args.user_id));
    if let Some(name) = &args.name {
        user.extra.insert("nombre".into(), Value::String(name.clone()));
    }
    session.save_user(&user).await?;
    session.save_token(&args.token).await?;

    print_success(&format!(
        "Session stored for user {} ({})",
        args.user_id.cyan(),
        cfg.api.base_url.cyan()
    ));
    Ok(())
}

pub async fn logout(cfg: &AppConfig) -> Result<()> {
    let service = super::build_service(cfg)?;
    let had_user = service.session().user_id().await.ok().flatten().is_some();
    service.end_session().await?;
    if had_user {
        print_success("Logged out (session removed)");
    } else {
        println!("No stored session");
    }
    Ok(())
}

pub async fn whoami(cfg: &AppConfig) -> Result<()> {
    let session = super::open_session(cfg)?;
    let Some(user) = session.user().await? else {
        print_error("Not logged in");
        return Ok(());
    };

    println!("{}: {}", "Server".cyan(), cfg.api.base_url);
    println!(
        "{}: {}",
        "User".cyan(),
        user.id
            .as_ref()
            .map_or_else(|| "(no id)".to_string(), ToString::to_string)
    );
    if let Some(Value::String(name)) = user.extra.get("nombre") {
        println!("{}: {}", "Name".cyan(), name);
    }
    match session.token().await? {
        Some(token) => println!("{}: Bearer (token: {})", "Auth".cyan(), token_preview(&token)),
        None => println!("{}: none", "Auth".cyan()),
    }
    Ok(())
}

fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{head}...{tail}")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::token_preview;

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("short"), "short");
        assert_eq!(
            token_preview("eyJhbGciOiJIUzI1NiJ9.payload.signature"),
            "eyJhbGci...ignature"
        );
    }
}
