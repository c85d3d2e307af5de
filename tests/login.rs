use anyhow::Result;
use m2u_export::credentials::Credentials;
use m2u_export::error::ScrapeError;
use m2u_export::session::PortalSession;

mod support;
use support::{test_config, El, ScriptedPortal};

#[tokio::test]
async fn login_enters_both_secrets() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let portal = ScriptedPortal::new();
    let config = test_config(dir.path(), Vec::new());
    let credentials = Credentials::new("alice", "hunter2");

    PortalSession::new(&portal, &config)
        .login(&credentials, || Ok(true))
        .await?;

    assert_eq!(portal.visited(), vec!["https://portal.test/login".to_string()]);
    assert_eq!(
        portal.typed(),
        vec![
            (El::Username, "alice".to_string()),
            (El::Password, "hunter2".to_string()),
        ]
    );
    assert_eq!(portal.clicks(), vec![El::Submit, El::Confirm, El::Confirm]);
    Ok(())
}

#[tokio::test]
async fn rejected_security_image_aborts_before_password() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let portal = ScriptedPortal::new();
    let mut config = test_config(dir.path(), Vec::new());
    config.login.confirm_security_image = true;
    let credentials = Credentials::new("alice", "hunter2");

    let err = PortalSession::new(&portal, &config)
        .login(&credentials, || Ok(false))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Aborted(_)));
    assert!(!portal.typed().iter().any(|(el, _)| *el == El::Password));
    Ok(())
}

#[tokio::test]
async fn image_prompt_is_skipped_unless_enabled() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let portal = ScriptedPortal::new();
    let config = test_config(dir.path(), Vec::new());
    let credentials = Credentials::new("alice", "hunter2");

    PortalSession::new(&portal, &config)
        .login(&credentials, || panic!("image prompt should not run"))
        .await?;
    Ok(())
}

#[tokio::test]
async fn login_failure_ends_the_run() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let portal = ScriptedPortal::new().with_card("Visa", Vec::new());
    let mut config = test_config(
        dir.path(),
        vec![m2u_export::models::ExportTarget::card("Visa")],
    );
    config.login.markup.success_text = "Welcome back".to_string();
    let credentials = Credentials::new("alice", "hunter2");

    let err = PortalSession::new(&portal, &config)
        .run(&credentials, || Ok(true))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(!dir.path().join("Visa.qif").exists());
    Ok(())
}
