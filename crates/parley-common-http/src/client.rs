// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use reqwest::ClientBuilder;

/// `parley/<crate version>`.
pub fn user_agent() -> String {
	format!("parley/{}", env!("CARGO_PKG_VERSION"))
}

/// Client builder with the Parley User-Agent. Callers add timeouts and build.
///
/// ```ignore
/// let client = parley_common_http::builder()
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	reqwest::Client::builder().user_agent(user_agent())
}
