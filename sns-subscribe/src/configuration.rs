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

use std::sync::Arc;
use std::time::Duration;

use uriparse::URI;

/// Default port the callback listener binds to when none is given
pub const DEFAULT_PORT: u16 = 80;

/// Endpoint schemes SNS accepts for HTTP(S) subscriptions
const SUPPORTED_PROTOCOLS: [&str; 2] = ["http", "https"];

#[derive(Debug)]
pub struct ConfigurationError(String);

impl ConfigurationError {
    pub fn new<T>(message: T) -> ConfigurationError
    where
        T: Into<String>,
    {
        ConfigurationError(message.into())
    }
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Configuration error: {}", self.0))
    }
}

impl std::error::Error for ConfigurationError {}

/// Everything one subscribe invocation needs. Built once through [`SubscriptionRequest::create`], which validates
/// the parameters and derives the subscription protocol and the callback route from the endpoint URL.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionRequest {
    pub region: String,
    pub topic: String,
    pub endpoint: String,
    pub port: u16,
    pub protocol: String,
    pub path: String,
    pub timeout: Option<Duration>,
}

impl SubscriptionRequest {
    /// Create an "immutable" (Arc) `SubscriptionRequest` object from a set of configuration parameters.
    ///
    /// # Arguments
    ///
    /// * `region` - AWS region the SNS client is scoped to
    /// * `topic` - ARN of the topic to subscribe to, passed on opaquely
    /// * `endpoint` - full URL the topic should deliver to; its scheme becomes the subscription protocol, its path the callback route
    /// * `port` - local port the callback listener binds to
    /// * `timeout` - upper bound on waiting for the confirmation callback, `None` waits indefinitely
    ///
    /// # Errors
    ///
    /// Returns a ConfigurationError if region or topic are blank, if the endpoint is not an absolute http(s) URL with a host,
    /// or if its path cannot be served as a single literal route.
    pub fn create(
        region: String,
        topic: String,
        endpoint: String,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Arc<SubscriptionRequest>, ConfigurationError> {
        let region = region.trim().to_string();
        if region.is_empty() {
            return Err(ConfigurationError::new("Region must not be empty"));
        }
        let topic = topic.trim().to_string();
        if topic.is_empty() {
            return Err(ConfigurationError::new("Topic must not be empty"));
        }
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigurationError::new("Timeout must be greater than zero"));
        }

        let (protocol, path) = parse_endpoint(endpoint.trim())?;

        Ok(Arc::new(SubscriptionRequest {
            region,
            topic,
            endpoint: endpoint.trim().to_string(),
            port,
            protocol,
            path,
            timeout,
        }))
    }
}

// Splits an endpoint URL into (protocol, route path)
fn parse_endpoint(endpoint: &str) -> Result<(String, String), ConfigurationError> {
    let uri = URI::try_from(endpoint)
        .map_err(|e| ConfigurationError::new(format!("Invalid endpoint URL '{endpoint}': {e}")))?;

    let protocol = uri.scheme().as_str().to_ascii_lowercase();
    if !SUPPORTED_PROTOCOLS.contains(&protocol.as_str()) {
        return Err(ConfigurationError::new(format!(
            "Unsupported endpoint scheme '{protocol}', expected one of {SUPPORTED_PROTOCOLS:?}"
        )));
    }
    if uri.host().is_none() {
        return Err(ConfigurationError::new(format!(
            "Endpoint URL '{endpoint}' has no host"
        )));
    }

    let mut path = uri.path().to_string();
    if path.is_empty() {
        path = String::from("/");
    }
    if !path.starts_with('/') {
        return Err(ConfigurationError::new(format!(
            "Endpoint path '{path}' is not absolute"
        )));
    }
    // the router would read these as captures or wildcards instead of literal segments
    if path.contains(['{', '}'])
        || path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err(ConfigurationError::new(format!(
            "Endpoint path '{path}' contains route pattern characters"
        )));
    }

    Ok((protocol, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http://localhost:9001/cb", "http", "/cb"; "http with path")]
    #[test_case("https://example.com/sns/callback", "https", "/sns/callback"; "https with nested path")]
    #[test_case("HTTP://example.com/cb", "http", "/cb"; "upper case scheme")]
    #[test_case("http://example.com", "http", "/"; "no path")]
    #[test_case("http://example.com/cb?token=1", "http", "/cb"; "query is not part of route")]
    fn test_create_derives_protocol_and_path(endpoint: &str, protocol: &str, path: &str) {
        let request = SubscriptionRequest::create(
            String::from("us-east-1"),
            String::from("arn:aws:sns:us-east-1:123456789012:topic"),
            endpoint.to_string(),
            9001,
            None,
        )
        .expect("Expected valid configuration");

        assert_eq!(request.protocol, protocol);
        assert_eq!(request.path, path);
        assert_eq!(request.endpoint, endpoint);
        assert_eq!(request.port, 9001);
    }

    #[test_case("", "arn:topic", "http://localhost/cb"; "empty region")]
    #[test_case("us-east-1", "  ", "http://localhost/cb"; "blank topic")]
    #[test_case("us-east-1", "arn:topic", "not a url"; "not a url")]
    #[test_case("us-east-1", "arn:topic", "/cb"; "relative url")]
    #[test_case("us-east-1", "arn:topic", "ftp://localhost/cb"; "unsupported scheme")]
    #[test_case("us-east-1", "arn:topic", "http://localhost/{id}"; "capture pattern")]
    #[test_case("us-east-1", "arn:topic", "http://localhost/cb/*rest"; "wildcard pattern")]
    fn test_create_rejects_invalid_parameters(region: &str, topic: &str, endpoint: &str) {
        let result = SubscriptionRequest::create(
            region.to_string(),
            topic.to_string(),
            endpoint.to_string(),
            DEFAULT_PORT,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_create_rejects_zero_timeout() {
        let result = SubscriptionRequest::create(
            String::from("us-east-1"),
            String::from("arn:topic"),
            String::from("http://localhost/cb"),
            DEFAULT_PORT,
            Some(Duration::ZERO),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_configuration_error_display() {
        let e = ConfigurationError::new("Region must not be empty");
        assert_eq!(e.to_string(), "Configuration error: Region must not be empty");
    }
}
