// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::borrow::Cow;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use http::{Method, Uri};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use ohttp_client::{OhttpClient, OrchestrationConfig, RequestDescriptor};

#[derive(Debug, Parser)]
#[command(
    version,
    about = "A curl-like tool for making requests through an Oblivious HTTP gateway.",
    long_about = "ohttpc downloads an OHTTP gateway's public key config, seals your request to it, relays it through the gateway, and prints the decrypted response. The gateway sees who you are but not what you asked; the target sees what you asked but not who you are."
)]
struct Arguments {
    #[arg(
        short,
        long,
        help = "Set the log level to WARN. The response is still printed."
    )]
    quiet: bool,

    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Show progress and echo the request. Repeat to raise the log level."
    )]
    verbose: u8,

    #[arg(short, long, value_name = "URL", help = "OHTTP gateway URL.")]
    gateway: String,

    #[arg(
        short,
        long,
        value_name = "URL",
        help = "URL of the gateway's OHTTP public key config."
    )]
    keys: String,

    #[arg(
        short = 'X',
        long = "request",
        value_name = "METHOD",
        default_value = "GET",
        help = "HTTP method of the inner request."
    )]
    method: String,

    #[arg(short, long, value_name = "BODY", help = "Body of the inner request.")]
    data: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "NAME: VALUE",
        action = ArgAction::Append,
        value_parser = parse_header,
        help = "Add a header to the inner request, can be used multiple times."
    )]
    headers: Vec<(String, String)>,

    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        help = "Pretty-print the response body if it is JSON."
    )]
    json: bool,

    #[arg(
        short = 't',
        long = "target",
        value_name = "URL",
        help = "Target URL. Takes precedence over the positional URL."
    )]
    target_flag: Option<String>,

    #[arg(value_name = "URL", help = "Target URL.")]
    target: Option<String>,
}

/// Split `Name: Value` at the first colon, trimming both halves.
fn parse_header(header: &str) -> Result<(String, String), String> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: Value', got {header:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in {header:?}"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

impl Arguments {
    fn target(&self) -> Option<&str> {
        self.target_flag.as_deref().or(self.target.as_deref())
    }

    fn build_request(&self) -> Result<RequestDescriptor> {
        let target = self
            .target()
            .context("target URL not specified, pass it as an argument or with --target")?;
        let method = Method::from_bytes(self.method.as_bytes())
            .with_context(|| format!("invalid method {:?}", self.method))?;
        let url: Uri = target
            .parse()
            .with_context(|| format!("invalid target URL {target:?}"))?;

        let mut request = RequestDescriptor::new(method, url);
        for (name, value) in &self.headers {
            request = request
                .try_header(name, value)
                .with_context(|| format!("invalid header {name:?}"))?;
        }
        if let Some(data) = &self.data {
            request = request.body(data.clone());
        }
        Ok(request)
    }

    fn build_config(&self) -> Result<Config> {
        let request = self.build_request()?;
        let orchestration =
            OrchestrationConfig::new(&self.gateway, &self.keys).verbose(self.verbose > 0);
        let client = OhttpClient::new(orchestration)?;
        Ok(Config {
            client,
            request,
            fmt: OutputFormat {
                echo_request: self.verbose > 0,
                json: self.json,
            },
        })
    }
}

struct Config {
    client: OhttpClient,
    request: RequestDescriptor,
    fmt: OutputFormat,
}

#[derive(Debug, Clone, Copy)]
struct OutputFormat {
    echo_request: bool,
    json: bool,
}

impl OutputFormat {
    fn echo(&self, request: &RequestDescriptor) {
        if !self.echo_request {
            return;
        }
        println!("> {} {}", request.method(), request.url());
        for (name, value) in request.headers() {
            println!("> {name}: {}", String::from_utf8_lossy(value.as_bytes()));
        }
        println!();
    }

    fn body<'a>(&self, body: &'a [u8]) -> Cow<'a, str> {
        if self.json {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
                if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                    return Cow::Owned(pretty);
                }
            }
        }
        String::from_utf8_lossy(body)
    }
}

#[tokio::main]
async fn main() -> ! {
    let cmd = Arguments::command();
    let after_help = format!(
        "{}Examples:{}
# fetch a page through a gateway
ohttpc -g https://gateway.example/ohttp -k https://gateway.example/ohttp-keys \\
    https://example.com/

# post JSON and pretty-print the JSON reply, with progress output
ohttpc -v -j -g https://gateway.example/ohttp -k https://gateway.example/ohttp-keys \\
    -X POST -H 'Content-Type: application/json' -d '{{\"q\": 1}}' \\
    -t https://api.example.com/search
",
        cmd.get_styles().get_header().render(),
        cmd.get_styles().get_header().render_reset()
    );
    let mut cmd = cmd.after_help(after_help);
    cmd.build();

    let mut matches = cmd.get_matches();
    let args = match Arguments::from_arg_matches_mut(&mut matches) {
        Ok(args) => args,
        Err(e) => {
            let e = e.format(&mut Arguments::command());
            e.exit();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_max_level(match (args.quiet, args.verbose) {
            (true, _) => Level::WARN,
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            (false, _) => Level::TRACE,
        })
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install logger: {err}");
    }

    let config = match args.build_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = ohttpc(&config).await {
        error!("{err:#}");
        std::process::exit(1);
    } else {
        std::process::exit(0);
    }
}

async fn ohttpc(config: &Config) -> Result<()> {
    config.fmt.echo(&config.request);

    let response = config
        .client
        .send(&config.request)
        .await
        .with_context(|| format!("requesting {}", config.request.url()))?;

    println!("< HTTP {}", response.status().as_u16());
    println!("{}", config.fmt.body(response.body_bytes()));
    Ok(())
}
