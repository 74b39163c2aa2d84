use anyhow::Result;
use authwatch::{
    backend::TokenStore,
    cli::actions::watch::{Args, Host},
    watchdog::{AuthFlagSource, WatchdogConfig},
};
use common::{serve, temp_token_path, FakeBackend};
use secrecy::SecretString;
use std::{path::Path, time::Duration};
use tokio::{
    io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader},
    time::timeout,
};

mod common;

async fn start(backend: FakeBackend, token_file: &Path) -> Result<Host> {
    Host::start(Args {
        api_url: serve(backend).await?,
        token_file: token_file.to_path_buf(),
        request_timeout: Duration::from_secs(5),
        remote_log: false,
        status_port: None,
        config: WatchdogConfig::new().with_periodic_interval(None),
    })
    .await
}

async fn store_token(path: &Path, token: &str) -> Result<()> {
    TokenStore::load(path)
        .await?
        .login(SecretString::from(token.to_string()))
        .await?;
    Ok(())
}

#[tokio::test]
async fn expired_session_prints_login_redirect() -> Result<()> {
    let backend = FakeBackend::default().with_session("old", "expired");
    let path = temp_token_path();
    store_token(&path, "old").await?;
    let mut host = start(backend.clone(), &path).await?;

    let (mut input, input_rx) = duplex(1024);
    let (mut output_tx, output_rx) = duplex(1024);

    let driver = host.run(
        BufReader::new(input_rx),
        &mut output_tx,
        std::future::pending::<()>(),
    );
    let script = async move {
        input.write_all(b"/dashboard\n").await?;
        let mut lines = BufReader::new(output_rx).lines();
        let line = timeout(Duration::from_secs(5), lines.next_line()).await??;
        // Closing the input ends the loop.
        drop(input);
        Ok::<_, anyhow::Error>(line)
    };

    let (driven, line) = tokio::join!(driver, script);
    driven?;
    assert_eq!(line?.as_deref(), Some("redirect /login from=/dashboard"));

    assert_eq!(backend.logouts(), 1);
    assert!(!path.exists());
    let status = host.status();
    assert_eq!(status.redirects, 1);
    assert_eq!(status.mismatches, 1);

    host.stop().await;
    Ok(())
}

#[tokio::test]
async fn active_session_prints_nothing_and_stops_on_eof() -> Result<()> {
    let backend = FakeBackend::default().with_session("live", "active");
    let path = temp_token_path();
    store_token(&path, "live").await?;
    let mut host = start(backend, &path).await?;

    let mut output = Vec::new();
    host.run(
        &b"/dashboard\n\ncheck\n"[..],
        &mut output,
        std::future::pending::<()>(),
    )
    .await?;

    assert!(output.is_empty());
    assert!(path.exists());

    host.stop().await;
    Ok(())
}

#[tokio::test]
async fn logout_line_removes_the_token() -> Result<()> {
    let backend = FakeBackend::default().with_session("live", "active");
    let path = temp_token_path();
    store_token(&path, "live").await?;
    let mut host = start(backend, &path).await?;

    let mut output = Vec::new();
    host.run(&b"logout\n"[..], &mut output, std::future::pending::<()>())
        .await?;

    assert!(!path.exists());
    assert!(host.api_state().context.is_authenticated());
    assert!(!host.api_state().store.is_authenticated());

    host.stop().await;
    Ok(())
}

#[tokio::test]
async fn interrupt_stops_the_loop() -> Result<()> {
    let path = temp_token_path();
    let mut host = start(FakeBackend::default(), &path).await?;

    // Input that never ends; only the interrupt can stop the loop.
    let (_input, input_rx) = duplex(64);
    let mut output = Vec::new();
    timeout(
        Duration::from_secs(5),
        host.run(BufReader::new(input_rx), &mut output, async {}),
    )
    .await??;

    host.stop().await;
    Ok(())
}
