/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use clap::{Parser, Subcommand};
use clap_num::number_range;
use log::*;
use std::process::ExitCode;
use std::time::Duration;

use sns_subscribe::{HandshakeError, SubscriptionOutcome, DEFAULT_PORT};

fn valid_port(s: &str) -> Result<u16, String> {
    number_range(s, 1, u16::MAX)
}

fn between_1_and_86400(s: &str) -> Result<u64, String> {
    number_range(s, 1, 86400)
}

// All our args
#[derive(Parser, Debug)]
#[command(name = "sns-subscribe", version, about = "Subscribe an HTTP(S) endpoint to an AWS SNS topic and confirm the subscription.", long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity of output
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Subscribe the endpoint to the topic, then wait for and answer the confirmation callback
    Subscribe(SubscribeArgs),
}

#[derive(clap::Args, Debug)]
struct SubscribeArgs {
    /// AWS region (required)
    #[arg(short, long, env = "AWS_REGION")]
    region: String,

    /// AWS topic arn (required)
    #[arg(short, long)]
    topic: String,

    /// Endpoint URL SNS delivers to, e.g. https://example.com/sns (required)
    #[arg(short, long)]
    endpoint: String,

    /// Local port to listen on for the confirmation callback
    #[arg(short, long, default_value_t = DEFAULT_PORT, value_parser=valid_port)]
    port: u16,

    /// Give up if no confirmation arrived after this many seconds - minimum 1, maximum 86400, waits indefinitely if not set
    #[arg(long, value_parser=between_1_and_86400)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Setup logging
    std::env::set_var("RUST_LOG", "info,aws_config=warn,aws_smithy_runtime=warn");
    if args.verbose {
        std::env::set_var("RUST_LOG", "trace,hyper=info,aws_smithy_runtime=debug");
    }
    sns_subscribe::init_once();

    let result = match args.command {
        Commands::Subscribe(subscribe_args) => run_subscribe(subscribe_args).await,
    };

    match result {
        Ok(outcome) => {
            debug!(
                "Subscription {} of {} to {} confirmed",
                outcome.subscription, outcome.endpoint, outcome.topic
            );
            println!("Successfully subscribed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_subscribe(args: SubscribeArgs) -> Result<SubscriptionOutcome, HandshakeError> {
    sns_subscribe::subscribe(
        args.region,
        args.topic,
        args.endpoint,
        args.port,
        args.timeout.map(Duration::from_secs),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn subscribe_args(args: &[&str]) -> Result<SubscribeArgs, clap::Error> {
        let Commands::Subscribe(subscribe_args) = Args::try_parse_from(args)?.command;
        Ok(subscribe_args)
    }

    #[test]
    fn test_defaults() {
        let args = subscribe_args(&[
            "sns-subscribe",
            "subscribe",
            "--region",
            "us-east-1",
            "--topic",
            "arn:aws:sns:us-east-1:123456789012:topic",
            "--endpoint",
            "http://localhost:9001/cb",
        ])
        .expect("Expected valid arguments");

        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.topic, "arn:aws:sns:us-east-1:123456789012:topic");
        assert_eq!(args.endpoint, "http://localhost:9001/cb");
        assert_eq!(args.port, 80);
        assert_eq!(args.timeout, None);
    }

    #[test]
    fn test_short_flags() {
        let args = subscribe_args(&[
            "sns-subscribe",
            "subscribe",
            "-r",
            "eu-west-1",
            "-t",
            "arn:topic",
            "-e",
            "https://example.com/sns",
            "-p",
            "9001",
            "--timeout",
            "60",
        ])
        .expect("Expected valid arguments");

        assert_eq!(args.port, 9001);
        assert_eq!(args.timeout, Some(60));
    }

    #[test_case(&["sns-subscribe", "subscribe", "-r", "us-east-1", "-e", "http://localhost/cb"]; "missing topic")]
    #[test_case(&["sns-subscribe", "subscribe", "-r", "us-east-1", "-t", "arn:topic"]; "missing endpoint")]
    #[test_case(&["sns-subscribe", "subscribe", "-r", "us-east-1", "-t", "arn:topic", "-e", "http://localhost/cb", "-p", "0"]; "port zero")]
    #[test_case(&["sns-subscribe", "subscribe", "-r", "us-east-1", "-t", "arn:topic", "-e", "http://localhost/cb", "-p", "70000"]; "port out of range")]
    #[test_case(&["sns-subscribe", "subscribe", "-r", "us-east-1", "-t", "arn:topic", "-e", "http://localhost/cb", "--timeout", "0"]; "zero timeout")]
    #[test_case(&["sns-subscribe", "-r", "us-east-1"]; "missing subcommand")]
    fn test_invalid_arguments(args: &[&str]) {
        assert!(Args::try_parse_from(args).is_err());
    }
}
