//! HTTP plumbing shared by the inbox and export clients.
//!
//! Every network call in the pipeline goes through the [`HttpClient`] trait so
//! the resolver and retriever can be driven by canned responses in tests.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use reqwest::{Method, Request, Response};
use serde::Serialize;

/// Builds a bare GET request for `url`.
pub fn get_request(url: &str) -> Result<Request> {
    let url = url
        .parse()
        .with_context(|| format!("invalid URL '{url}'"))?;
    Ok(Request::new(Method::GET, url))
}

/// Builds a POST request carrying `form` as a urlencoded body.
pub fn post_form_request<T: Serialize + ?Sized>(url: &str, form: &T) -> Result<Request> {
    reqwest::Client::new()
        .post(url)
        .form(form)
        .build()
        .with_context(|| format!("invalid form request for '{url}'"))
}

/// Sends a GET for `url` through `client` and hands back the response as-is.
///
/// Status codes are not interpreted here; callers decide which ones are soft
/// failures.
pub async fn get<C: HttpClient>(client: &C, url: &str) -> Result<Response> {
    let req = get_request(url)?;
    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("GET {url} failed"))?;
    Ok(resp)
}
