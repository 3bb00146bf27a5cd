use anyhow::Context;
use indicatif::HumanBytes;
use reqwest::blocking::Client;

use crate::config::Config;
use crate::progress::Spinner;

pub fn build_client(config: &Config) -> anyhow::Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = config.http_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// GET `url` and return the whole body. There is no retry: a transport error or a
/// non-success status is returned as an error for the caller to treat as fatal.
pub fn fetch_bytes(
    client: &Client,
    url: &str,
    config: &Config,
    prefix: &str,
) -> anyhow::Result<Vec<u8>> {
    let spinner = Spinner::start(config, prefix, url.to_string());

    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("requesting {url}"))?;
    let status = resp.status();
    vprintln!(config.verbose, 1, "GET {} -> {}", url, status);

    if !status.is_success() {
        anyhow::bail!("fetching {url} failed with HTTP status {status}");
    }

    if let Some(len) = resp.content_length() {
        spinner.set_message(format!("{url} ({})", HumanBytes(len)));
    }
    let body = resp
        .bytes()
        .with_context(|| format!("reading response body from {url}"))?;
    spinner.finish();

    Ok(body.to_vec())
}
